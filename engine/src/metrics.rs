use serde::{Deserialize, Serialize};
use typing_defense_core::{GameMode, GameStatus, GameState, WavePhase};

/// Point-in-time figures for HUDs and headless runners.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuntimeMetrics {
    /// Simulated seconds since the run started.
    pub time: f64,
    /// Updates applied so far.
    pub tick: u64,
    /// Run status.
    pub status: GameStatus,
    /// Active mode.
    pub mode: GameMode,
    /// Current wave index.
    pub wave_index: u32,
    /// Configured wave count.
    pub wave_total: u32,
    /// Scheduler phase.
    pub wave_phase: WavePhase,
    /// Seconds until the next wave starts spawning.
    pub countdown_remaining: f64,
    /// Identifier of the active difficulty band.
    pub difficulty_band: String,
    /// Threat rating of the current wave under the active band.
    pub threat_rating: f64,
    /// Gold balance.
    pub gold: u32,
    /// Score.
    pub score: u64,
    /// Castle health.
    pub castle_health: f64,
    /// Castle maximum health.
    pub castle_max_health: f64,
    /// Enemies still in play.
    pub enemies_alive: usize,
    /// Projectiles in flight.
    pub projectiles_in_flight: usize,
    /// Occupied turret slots.
    pub turrets_placed: usize,
    /// Current combo.
    pub combo: u32,
    /// Lifetime keystroke accuracy.
    pub accuracy: f64,
    /// Completed words per simulated minute.
    pub words_per_minute: f64,
    /// Cumulative turret damage.
    pub turret_damage: f64,
    /// Cumulative typing damage.
    pub typing_damage: f64,
}

impl RuntimeMetrics {
    pub(crate) fn capture(
        state: &GameState,
        difficulty_band: String,
        threat_rating: f64,
    ) -> Self {
        let words_per_minute = if state.time > 0.0 {
            f64::from(state.typing.words_completed) * 60.0 / state.time
        } else {
            0.0
        };

        Self {
            time: state.time,
            tick: state.tick,
            status: state.status,
            mode: state.mode,
            wave_index: state.wave.index,
            wave_total: state.wave.total,
            wave_phase: state.wave.phase,
            countdown_remaining: state.wave.countdown_remaining,
            difficulty_band,
            threat_rating,
            gold: state.resources.gold,
            score: state.resources.score,
            castle_health: state.castle.health,
            castle_max_health: state.castle.max_health,
            enemies_alive: state.alive_enemies().count(),
            projectiles_in_flight: state.projectiles.len(),
            turrets_placed: state
                .turrets
                .iter()
                .filter(|slot| slot.turret.is_some())
                .count(),
            combo: state.typing.combo,
            accuracy: state.typing.accuracy,
            words_per_minute,
            turret_damage: state.analytics.turret_damage,
            typing_damage: state.analytics.typing_damage,
        }
    }
}
