#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system owning the enemy lifecycle: spawning, lane movement, damage,
//! shields, and the defeat/escape transitions.

use typing_defense_core::{
    ActionError, ActionResult, DamageSource, DifficultyBand, EnemyId, EnemyState, EnemyStatus,
    EnemyTierConfig, GameConfig, GameEvent, GameState, Prng, SpawnRequest, Vital, WordBank,
};

/// Result of applying damage to an enemy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DamageOutcome {
    /// The enemy was unknown or already out of play.
    Missed,
    /// The enemy survived; carries the shield and health removed.
    Damaged(f64),
    /// The enemy was defeated; carries the shield and health removed.
    Defeated(f64),
}

/// Enemy system holding the tier table and word bank it draws from.
#[derive(Clone, Debug)]
pub struct Enemies {
    tiers: Vec<EnemyTierConfig>,
    words: WordBank,
    lane_count: u32,
    lane_length: f64,
}

impl Enemies {
    /// Creates the system from the relevant configuration tables.
    #[must_use]
    pub fn new(config: &GameConfig) -> Self {
        Self {
            tiers: config.enemy_tiers.clone(),
            words: config.word_bank.clone(),
            lane_count: config.lanes.count,
            lane_length: config.lanes.length,
        }
    }

    /// Creates an enemy from `request`, scaled by `band`, and appends it to the state.
    pub fn spawn(
        &self,
        state: &mut GameState,
        request: &SpawnRequest,
        band: &DifficultyBand,
        rng: &mut Prng,
        out: &mut Vec<GameEvent>,
    ) -> ActionResult<EnemyId> {
        let tier = self
            .tiers
            .iter()
            .find(|tier| tier.id == request.tier)
            .ok_or(ActionError::InvalidEnemy)?;

        let lane = match request.lane {
            Some(lane) if lane < self.lane_count => lane,
            Some(_) => return Err(ActionError::InvalidEnemy),
            None => rng.next_below(self.lane_count),
        };

        let word = match &request.word {
            Some(word) if !word.is_empty() => word.to_lowercase(),
            _ => self.choose_word(state, tier, None, rng),
        };

        let id = EnemyId::new(state.next_enemy_id);
        state.next_enemy_id += 1;

        let health = tier.health * band.enemy_health_multiplier;
        let shield = request.shield.unwrap_or(tier.shield).max(0.0) * band.enemy_health_multiplier;
        let reward = scale_reward(tier.reward, band.reward_multiplier);

        state.enemies.push(EnemyState {
            id,
            tier: tier.id.clone(),
            lane,
            distance: self.lane_length,
            speed: tier.speed * band.enemy_speed_multiplier,
            health: Vital::full(health),
            shield: Vital::full(shield),
            word: Some(word),
            word_errors: 0,
            status: EnemyStatus::Alive,
            wave_index: request.wave_index,
            damage: tier.damage,
            reward,
            spawned_at: state.time,
        });

        log::debug!("spawned {} as enemy {} in lane {lane}", tier.id, id.get());
        out.push(GameEvent::EnemySpawned {
            enemy: id,
            tier: tier.id.clone(),
            lane,
            wave_index: request.wave_index,
        });
        Ok(id)
    }

    /// Drops enemies that left play during the previous tick, then advances the
    /// survivors and marks those reaching the castle as escaped.
    pub fn update(&self, state: &mut GameState, dt: f64, out: &mut Vec<GameEvent>) {
        state.enemies.retain(EnemyState::is_alive);

        for enemy in &mut state.enemies {
            enemy.distance -= enemy.speed * dt;
            if enemy.distance > 0.0 {
                continue;
            }

            enemy.distance = 0.0;
            enemy.status = EnemyStatus::Escaped;
            enemy.word = None;
            log::debug!("enemy {} reached the castle", enemy.id.get());
            out.push(GameEvent::EnemyEscaped {
                enemy: enemy.id,
                tier: enemy.tier.clone(),
                lane: enemy.lane,
                damage: enemy.damage,
            });
        }
    }

    /// Applies `amount` damage, draining the shield before health.
    pub fn damage(
        &self,
        state: &mut GameState,
        id: EnemyId,
        amount: f64,
        source: DamageSource,
        out: &mut Vec<GameEvent>,
    ) -> DamageOutcome {
        let Some(enemy) = state.enemy_mut(id) else {
            return DamageOutcome::Missed;
        };
        if !enemy.is_alive() || amount <= 0.0 {
            return DamageOutcome::Missed;
        }

        let shielded = enemy.shield.current > 0.0;
        let absorbed = amount.min(enemy.shield.current);
        enemy.shield.current -= absorbed;
        let through = (amount - absorbed).min(enemy.health.current);
        enemy.health.current -= through;
        let applied = absorbed + through;

        out.push(GameEvent::EnemyDamaged {
            enemy: id,
            amount: applied,
            source,
        });
        if shielded && enemy.shield.is_depleted() {
            enemy.shield.current = 0.0;
            out.push(GameEvent::EnemyShieldBroken { enemy: id, source });
        }

        if !enemy.health.is_depleted() {
            return DamageOutcome::Damaged(applied);
        }

        enemy.health.current = 0.0;
        enemy.status = EnemyStatus::Defeated;
        enemy.word = None;
        log::debug!("enemy {} defeated by {source:?}", id.get());
        out.push(GameEvent::EnemyDefeated {
            enemy: id,
            tier: enemy.tier.clone(),
            lane: enemy.lane,
            wave_index: enemy.wave_index,
            reward: enemy.reward,
            source,
        });
        DamageOutcome::Defeated(applied)
    }

    /// Removes an alive enemy's remaining shield.
    pub fn strip_shield(
        &self,
        state: &mut GameState,
        id: EnemyId,
        out: &mut Vec<GameEvent>,
    ) -> ActionResult<()> {
        let enemy = state
            .enemy_mut(id)
            .filter(|enemy| enemy.is_alive())
            .ok_or(ActionError::InvalidEnemy)?;
        if enemy.shield.current > 0.0 {
            enemy.shield.current = 0.0;
            out.push(GameEvent::EnemyShieldBroken {
                enemy: id,
                source: DamageSource::Scripted,
            });
        }
        Ok(())
    }

    /// Gives a surviving enemy a fresh word after its previous one was typed.
    pub fn reassign_word(&self, state: &mut GameState, id: EnemyId, rng: &mut Prng) {
        let Some(tier) = state
            .enemy(id)
            .filter(|enemy| enemy.is_alive())
            .and_then(|enemy| self.tiers.iter().find(|tier| tier.id == enemy.tier))
        else {
            return;
        };
        let word = self.choose_word(state, tier, Some(id), rng);
        if let Some(enemy) = state.enemy_mut(id) {
            enemy.word = Some(word);
            enemy.word_errors = 0;
        }
    }

    /// Distance an enemy travels from spawn to the castle.
    #[must_use]
    pub fn lane_length(&self) -> f64 {
        self.lane_length
    }

    fn choose_word(
        &self,
        state: &GameState,
        tier: &EnemyTierConfig,
        exclude: Option<EnemyId>,
        rng: &mut Prng,
    ) -> String {
        let taken: Vec<char> = state
            .alive_enemies()
            .filter(|enemy| Some(enemy.id) != exclude)
            .filter_map(|enemy| enemy.word.as_deref())
            .filter_map(|word| word.chars().next())
            .collect();

        let pool = self.words.words(tier.word_length);
        let fresh: Vec<&String> = pool
            .iter()
            .filter(|word| {
                word.chars()
                    .next()
                    .map_or(false, |first| !taken.contains(&first))
            })
            .collect();

        let chosen = if fresh.is_empty() {
            rng.pick(pool)
        } else {
            rng.pick(&fresh).copied()
        };
        chosen.cloned().unwrap_or_else(|| tier.id.to_string())
    }
}

fn scale_reward(base: u32, multiplier: f64) -> u32 {
    let scaled = (f64::from(base) * multiplier).round();
    if scaled <= 0.0 {
        0
    } else if scaled >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        scaled as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use typing_defense_core::{GameMode, TierId};

    fn setup() -> (Enemies, GameState, Prng) {
        let config = GameConfig::default();
        (
            Enemies::new(&config),
            GameState::new(&config, GameMode::Campaign),
            Prng::new(7),
        )
    }

    fn spawn(
        enemies: &Enemies,
        state: &mut GameState,
        rng: &mut Prng,
        request: SpawnRequest,
    ) -> EnemyId {
        let mut out = Vec::new();
        enemies
            .spawn(state, &request, &DifficultyBand::default(), rng, &mut out)
            .expect("spawn succeeds")
    }

    #[test]
    fn spawn_scales_by_band() {
        let (enemies, mut state, mut rng) = setup();
        let band = DifficultyBand {
            id: "hard".to_owned(),
            from_wave: 0,
            enemy_health_multiplier: 2.0,
            enemy_speed_multiplier: 1.5,
            reward_multiplier: 1.5,
        };
        let mut out = Vec::new();
        let id = enemies
            .spawn(
                &mut state,
                &SpawnRequest::new(TierId::new("grunt"), 0).with_lane(1),
                &band,
                &mut rng,
                &mut out,
            )
            .expect("spawn succeeds");

        let enemy = state.enemy(id).expect("enemy exists");
        assert!((enemy.health.max - 80.0).abs() < f64::EPSILON);
        assert!((enemy.speed - 10.5).abs() < f64::EPSILON);
        assert_eq!(enemy.reward, 12);
        assert_eq!(enemy.lane, 1);
        assert!((enemy.distance - enemies.lane_length()).abs() < f64::EPSILON);
        assert!(matches!(out[0], GameEvent::EnemySpawned { lane: 1, .. }));
    }

    #[test]
    fn unknown_tier_or_lane_is_rejected() {
        let (enemies, mut state, mut rng) = setup();
        let mut out = Vec::new();
        let band = DifficultyBand::default();
        assert_eq!(
            enemies.spawn(
                &mut state,
                &SpawnRequest::new(TierId::new("dragon"), 0),
                &band,
                &mut rng,
                &mut out
            ),
            Err(ActionError::InvalidEnemy)
        );
        assert_eq!(
            enemies.spawn(
                &mut state,
                &SpawnRequest::new(TierId::new("grunt"), 0).with_lane(9),
                &band,
                &mut rng,
                &mut out
            ),
            Err(ActionError::InvalidEnemy)
        );
        assert!(state.enemies.is_empty());
        assert!(out.is_empty());
    }

    #[test]
    fn shield_absorbs_before_health() {
        let (enemies, mut state, mut rng) = setup();
        let id = spawn(
            &enemies,
            &mut state,
            &mut rng,
            SpawnRequest::new(TierId::new("grunt"), 0).with_shield(10.0),
        );
        let mut out = Vec::new();

        let outcome = enemies.damage(&mut state, id, 6.0, DamageSource::Typing, &mut out);
        assert_eq!(outcome, DamageOutcome::Damaged(6.0));
        let enemy = state.enemy(id).expect("enemy exists");
        assert!((enemy.shield.current - 4.0).abs() < f64::EPSILON);
        assert!((enemy.health.current - 40.0).abs() < f64::EPSILON);

        out.clear();
        let _ = enemies.damage(&mut state, id, 10.0, DamageSource::Typing, &mut out);
        let enemy = state.enemy(id).expect("enemy exists");
        assert!((enemy.shield.current).abs() < f64::EPSILON);
        assert!((enemy.health.current - 34.0).abs() < f64::EPSILON);
        assert!(out
            .iter()
            .any(|event| matches!(event, GameEvent::EnemyShieldBroken { .. })));
    }

    #[test]
    fn lethal_damage_defeats_and_clears_word() {
        let (enemies, mut state, mut rng) = setup();
        let id = spawn(
            &enemies,
            &mut state,
            &mut rng,
            SpawnRequest::new(TierId::new("runner"), 2),
        );
        let mut out = Vec::new();

        let outcome = enemies.damage(&mut state, id, 100.0, DamageSource::Typing, &mut out);
        assert_eq!(outcome, DamageOutcome::Defeated(25.0));
        let enemy = state.enemy(id).expect("enemy kept until next update");
        assert_eq!(enemy.status, EnemyStatus::Defeated);
        assert_eq!(enemy.word, None);
        assert!(out.iter().any(|event| matches!(
            event,
            GameEvent::EnemyDefeated {
                reward: 6,
                wave_index: 2,
                ..
            }
        )));

        out.clear();
        assert_eq!(
            enemies.damage(&mut state, id, 5.0, DamageSource::Typing, &mut out),
            DamageOutcome::Missed
        );
        assert!(out.is_empty());
    }

    #[test]
    fn walking_past_the_castle_escapes_and_prunes_next_tick() {
        let (enemies, mut state, mut rng) = setup();
        let id = spawn(
            &enemies,
            &mut state,
            &mut rng,
            SpawnRequest::new(TierId::new("runner"), 0),
        );
        let mut out = Vec::new();

        enemies.update(&mut state, 5.0, &mut out);
        assert!(out.is_empty());
        enemies.update(&mut state, 5.0, &mut out);
        assert_eq!(
            state.enemy(id).map(|enemy| enemy.status),
            Some(EnemyStatus::Escaped)
        );
        assert!(matches!(
            out.as_slice(),
            [GameEvent::EnemyEscaped { damage, .. }] if (*damage - 5.0).abs() < f64::EPSILON
        ));

        out.clear();
        enemies.update(&mut state, 0.1, &mut out);
        assert!(state.enemies.is_empty());
    }

    #[test]
    fn spawned_words_prefer_unique_first_letters() {
        let (enemies, mut state, mut rng) = setup();
        let mut initials = Vec::new();
        for _ in 0..6 {
            let id = spawn(
                &enemies,
                &mut state,
                &mut rng,
                SpawnRequest::new(TierId::new("grunt"), 0),
            );
            let word = state
                .enemy(id)
                .and_then(|enemy| enemy.word.clone())
                .expect("word assigned");
            initials.push(word.chars().next().expect("non-empty word"));
        }
        let mut unique = initials.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), initials.len());
    }

    #[test]
    fn strip_shield_requires_alive_enemy() {
        let (enemies, mut state, mut rng) = setup();
        let id = spawn(
            &enemies,
            &mut state,
            &mut rng,
            SpawnRequest::new(TierId::new("witch"), 0),
        );
        let mut out = Vec::new();
        enemies
            .strip_shield(&mut state, id, &mut out)
            .expect("alive enemy");
        assert!(state.enemy(id).map_or(false, |enemy| enemy.shield.is_depleted()));
        assert_eq!(out.len(), 1);
        assert_eq!(
            enemies.strip_shield(&mut state, EnemyId::new(99), &mut out),
            Err(ActionError::InvalidEnemy)
        );
    }
}
