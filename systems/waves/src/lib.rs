#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic wave scheduler emitting spawn requests on a
//! countdown-then-cadence timeline.

use std::iter;

use serde::{Deserialize, Serialize};
use typing_defense_core::{
    GameConfig, GameEvent, SpawnRequest, TierId, WaveConfig, WavePhase, WaveState,
};

/// A spawn scheduled relative to the start of its wave.
#[derive(Clone, Debug, PartialEq)]
struct ScheduledSpawn {
    at: f64,
    tier: TierId,
    lane: Option<u32>,
    shield: Option<f64>,
}

/// Preview of a spawn that has not happened yet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpcomingSpawn {
    /// Wave the spawn belongs to.
    pub wave_index: u32,
    /// Tier that will spawn.
    pub tier: TierId,
    /// Fixed lane, if the wave pins one.
    pub lane: Option<u32>,
    /// Estimated seconds until the spawn.
    pub in_seconds: f64,
}

/// Wave system with schedules precomputed from the wave table.
#[derive(Clone, Debug)]
pub struct Waves {
    waves: Vec<WaveConfig>,
    schedules: Vec<Vec<ScheduledSpawn>>,
}

impl Waves {
    /// Creates the system and flattens every wave into a time-ordered schedule.
    #[must_use]
    pub fn new(config: &GameConfig) -> Self {
        Self {
            waves: config.waves.clone(),
            schedules: config.waves.iter().map(build_schedule).collect(),
        }
    }

    /// Definition used for `index`, repeating the last wave past the table.
    #[must_use]
    pub fn definition(&self, index: u32) -> Option<&WaveConfig> {
        let position = usize::try_from(index).ok()?;
        self.waves.get(position).or_else(|| self.waves.last())
    }

    /// Advances the scheduler by `dt` seconds.
    ///
    /// Spawn requests due this tick are appended to `requests`; wave start and
    /// completion notifications go to `out`. Completion bonuses are scaled by
    /// `reward_multiplier`.
    pub fn update(
        &self,
        wave: &mut WaveState,
        dt: f64,
        reward_multiplier: f64,
        requests: &mut Vec<SpawnRequest>,
        out: &mut Vec<GameEvent>,
    ) {
        let mut remaining = dt;

        if wave.phase == WavePhase::Completed {
            if !wave.loop_waves {
                return;
            }
            self.enter_countdown(wave, wave.index + 1);
        }

        if wave.phase == WavePhase::Countdown {
            wave.countdown_remaining -= remaining;
            if wave.countdown_remaining > 0.0 {
                return;
            }
            remaining = -wave.countdown_remaining;
            wave.countdown_remaining = 0.0;
            wave.phase = WavePhase::Spawning;
            wave.elapsed = 0.0;
            wave.cursor = 0;
            log::info!("wave {} started", wave.index);
            out.push(GameEvent::WaveStarted { index: wave.index });
        }

        wave.elapsed += remaining;
        let schedule = self.schedule(wave.index);
        while let Some(spawn) = schedule.get(wave.cursor) {
            if spawn.at > wave.elapsed {
                break;
            }
            let mut request = SpawnRequest::new(spawn.tier.clone(), wave.index);
            request.lane = spawn.lane;
            request.shield = spawn.shield;
            requests.push(request);
            wave.cursor += 1;
        }

        if wave.cursor < schedule.len() {
            return;
        }

        let bonus = self
            .definition(wave.index)
            .map_or(0, |definition| definition.reward_bonus);
        let reward_bonus = (f64::from(bonus) * reward_multiplier).round().max(0.0) as u32;
        log::info!("wave {} completed", wave.index);
        out.push(GameEvent::WaveCompleted {
            index: wave.index,
            reward_bonus,
        });

        let next = wave.index + 1;
        if next < wave.total || wave.loop_waves {
            self.enter_countdown(wave, next);
        } else {
            wave.phase = WavePhase::Completed;
        }
    }

    /// Lazily previews the next spawns without touching the scheduler.
    pub fn upcoming_spawns<'a>(
        &'a self,
        wave: &WaveState,
        limit: usize,
    ) -> impl Iterator<Item = UpcomingSpawn> + 'a {
        let looping = wave.loop_waves;
        let total = wave.total;
        let first = match wave.phase {
            WavePhase::Countdown => Some((wave.index, 0, wave.countdown_remaining)),
            WavePhase::Spawning => Some((wave.index, wave.cursor, -wave.elapsed)),
            WavePhase::Completed if looping => self
                .definition(wave.index + 1)
                .map(|definition| (wave.index + 1, 0, definition.countdown_seconds)),
            WavePhase::Completed => None,
        };
        let wave_bound = limit.saturating_add(self.waves.len());

        iter::successors(first, move |&(index, _, base)| {
            let next = index + 1;
            if next >= total && !looping {
                return None;
            }
            let span = self.schedule(index).last().map_or(0.0, |spawn| spawn.at);
            let countdown = self
                .definition(next)
                .map_or(0.0, |definition| definition.countdown_seconds);
            Some((next, 0, base + span + countdown))
        })
        .take(wave_bound)
        .flat_map(move |(index, cursor, base)| {
            self.schedule(index)
                .get(cursor..)
                .unwrap_or_default()
                .iter()
                .map(move |spawn| UpcomingSpawn {
                    wave_index: index,
                    tier: spawn.tier.clone(),
                    lane: spawn.lane,
                    in_seconds: (base + spawn.at).max(0.0),
                })
        })
        .take(limit)
    }

    fn enter_countdown(&self, wave: &mut WaveState, index: u32) {
        wave.index = index;
        wave.phase = WavePhase::Countdown;
        wave.countdown_remaining = self
            .definition(index)
            .map_or(0.0, |definition| definition.countdown_seconds);
        wave.elapsed = 0.0;
        wave.cursor = 0;
    }

    fn schedule(&self, index: u32) -> &[ScheduledSpawn] {
        usize::try_from(index)
            .ok()
            .and_then(|position| self.schedules.get(position))
            .or_else(|| self.schedules.last())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

fn build_schedule(wave: &WaveConfig) -> Vec<ScheduledSpawn> {
    let mut schedule: Vec<ScheduledSpawn> = wave
        .spawns
        .iter()
        .flat_map(|entry| {
            (0..entry.count).map(move |ordinal| ScheduledSpawn {
                at: entry.at_seconds + f64::from(ordinal) * entry.cadence_seconds,
                tier: entry.tier.clone(),
                lane: entry.lane,
                shield: entry.shield,
            })
        })
        .collect();
    schedule.sort_by(|left, right| left.at.total_cmp(&right.at));
    schedule
}

#[cfg(test)]
mod tests {
    use super::*;
    use typing_defense_core::{GameMode, GameState, SpawnEntryConfig};

    fn single_wave_config() -> GameConfig {
        let mut config = GameConfig::default();
        config.waves = vec![WaveConfig {
            countdown_seconds: 2.0,
            reward_bonus: 10,
            spawns: vec![
                SpawnEntryConfig {
                    tier: TierId::new("grunt"),
                    count: 2,
                    at_seconds: 0.0,
                    cadence_seconds: 1.0,
                    lane: Some(1),
                    shield: None,
                },
                SpawnEntryConfig {
                    tier: TierId::new("runner"),
                    count: 1,
                    at_seconds: 0.5,
                    cadence_seconds: 0.0,
                    lane: None,
                    shield: Some(4.0),
                },
            ],
        }];
        config
    }

    #[test]
    fn schedule_is_sorted_by_time() {
        let waves = Waves::new(&single_wave_config());
        let times: Vec<f64> = waves.schedule(0).iter().map(|spawn| spawn.at).collect();
        assert_eq!(times, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn countdown_then_spawn_then_complete() {
        let config = single_wave_config();
        let waves = Waves::new(&config);
        let mut state = GameState::new(&config, GameMode::Campaign);
        let mut requests = Vec::new();
        let mut out = Vec::new();

        waves.update(&mut state.wave, 1.5, 1.0, &mut requests, &mut out);
        assert!(requests.is_empty());
        assert!(out.is_empty());

        waves.update(&mut state.wave, 0.5, 1.0, &mut requests, &mut out);
        assert_eq!(out, vec![GameEvent::WaveStarted { index: 0 }]);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].lane, Some(1));

        waves.update(&mut state.wave, 1.0, 2.0, &mut requests, &mut out);
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[1].shield, Some(4.0));
        assert_eq!(
            out[1],
            GameEvent::WaveCompleted {
                index: 0,
                reward_bonus: 20
            }
        );
        assert_eq!(state.wave.phase, WavePhase::Completed);

        out.clear();
        waves.update(&mut state.wave, 10.0, 1.0, &mut requests, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn looping_repeats_last_wave_with_growing_index() {
        let config = single_wave_config();
        let waves = Waves::new(&config);
        let mut state = GameState::new(&config, GameMode::Practice);
        let mut requests = Vec::new();
        let mut out = Vec::new();

        for _ in 0..3 {
            waves.update(&mut state.wave, 3.0, 1.0, &mut requests, &mut out);
        }

        let completed: Vec<u32> = out
            .iter()
            .filter_map(|event| match event {
                GameEvent::WaveCompleted { index, .. } => Some(*index),
                _ => None,
            })
            .collect();
        assert_eq!(completed, vec![0, 1, 2]);
        assert_eq!(state.wave.phase, WavePhase::Countdown);
        assert_eq!(requests.last().map(|request| request.wave_index), Some(2));
    }

    #[test]
    fn upcoming_spawns_preview_is_lazy_and_pure() {
        let config = GameConfig::default();
        let waves = Waves::new(&config);
        let state = GameState::new(&config, GameMode::Campaign);
        let before = state.wave.clone();

        let preview: Vec<UpcomingSpawn> = waves.upcoming_spawns(&state.wave, 6).collect();

        assert_eq!(preview.len(), 6);
        assert_eq!(state.wave, before);
        assert_eq!(preview[0].wave_index, 0);
        assert!((preview[0].in_seconds - 5.0).abs() < f64::EPSILON);
        assert!(preview
            .windows(2)
            .all(|pair| pair[0].in_seconds <= pair[1].in_seconds));
        assert_eq!(preview[4].wave_index, 1);
    }

    #[test]
    fn upcoming_spawns_terminate_when_looping_empty_waves() {
        let mut config = GameConfig::default();
        config.waves = vec![WaveConfig {
            countdown_seconds: 1.0,
            reward_bonus: 0,
            spawns: Vec::new(),
        }];
        let waves = Waves::new(&config);
        let state = GameState::new(&config, GameMode::Practice);
        assert_eq!(waves.upcoming_spawns(&state.wave, 5).count(), 0);
    }
}
