//! Mutable simulation state owned by the engine.
//!
//! Every type in this module is plain data. Systems mutate it through the
//! `&mut GameState` lent to them by the engine; external readers only ever see
//! clones.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{
    config::{CastleLevelConfig, GameConfig, TurretSlotConfig},
    ActionError, DefeatBurstMode, EnemyId, EnemyStatus, GameMode, GameStatus, ProjectileId,
    SlotId, TargetingPriority, TierId, TurretTypeId,
};

/// Root of the simulation state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Simulated seconds since the run started.
    pub time: f64,
    /// Number of completed `update` calls.
    pub tick: u64,
    /// Lifecycle of the run.
    pub status: GameStatus,
    /// Active game mode.
    pub mode: GameMode,
    /// Wave progression.
    pub wave: WaveState,
    /// Castle statistics.
    pub castle: CastleState,
    /// Gold and score.
    pub resources: ResourceState,
    /// Typing buffer, combo, and accuracy.
    pub typing: TypingState,
    /// Enemies in play, including those that reached a terminal status this tick.
    pub enemies: Vec<EnemyState>,
    /// Turret slots in configuration order.
    pub turrets: Vec<TurretSlotState>,
    /// Projectiles in flight.
    pub projectiles: Vec<ProjectileState>,
    /// Aggregated analytics.
    pub analytics: AnalyticsState,
    /// Identifier assigned to the next spawned enemy.
    pub next_enemy_id: u32,
    /// Identifier assigned to the next launched projectile.
    pub next_projectile_id: u32,
}

impl GameState {
    /// Builds the initial state of a run described by `config`.
    #[must_use]
    pub fn new(config: &GameConfig, mode: GameMode) -> Self {
        let mut castle = CastleState::default();
        if let Some(level) = config.castle_level(1) {
            castle.apply_level(level, None);
            castle.health = castle.max_health;
        }

        Self {
            time: 0.0,
            tick: 0,
            status: GameStatus::Running,
            mode,
            wave: WaveState {
                index: 0,
                total: config.wave_count(),
                phase: WavePhase::Countdown,
                countdown_remaining: config
                    .waves
                    .first()
                    .map_or(0.0, |wave| wave.countdown_seconds),
                elapsed: 0.0,
                cursor: 0,
                loop_waves: mode == GameMode::Practice,
            },
            castle,
            resources: ResourceState {
                gold: config.starting_gold,
                score: 0,
            },
            typing: TypingState::default(),
            enemies: Vec::new(),
            turrets: config
                .turret_slots
                .iter()
                .map(TurretSlotState::from_config)
                .collect(),
            projectiles: Vec::new(),
            analytics: AnalyticsState::default(),
            next_enemy_id: 1,
            next_projectile_id: 1,
        }
    }

    /// Looks up an enemy by identifier regardless of status.
    #[must_use]
    pub fn enemy(&self, id: EnemyId) -> Option<&EnemyState> {
        self.enemies.iter().find(|enemy| enemy.id == id)
    }

    /// Mutable counterpart of [`GameState::enemy`].
    pub fn enemy_mut(&mut self, id: EnemyId) -> Option<&mut EnemyState> {
        self.enemies.iter_mut().find(|enemy| enemy.id == id)
    }

    /// Iterates over enemies that are still in play.
    pub fn alive_enemies(&self) -> impl Iterator<Item = &EnemyState> {
        self.enemies.iter().filter(|enemy| enemy.is_alive())
    }

    /// Looks up a turret slot.
    #[must_use]
    pub fn slot(&self, id: SlotId) -> Option<&TurretSlotState> {
        self.turrets.iter().find(|slot| slot.id == id)
    }

    /// Mutable counterpart of [`GameState::slot`].
    pub fn slot_mut(&mut self, id: SlotId) -> Option<&mut TurretSlotState> {
        self.turrets.iter_mut().find(|slot| slot.id == id)
    }
}

/// A bounded quantity such as health or shield.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vital {
    /// Remaining amount.
    pub current: f64,
    /// Maximum amount.
    pub max: f64,
}

impl Vital {
    /// Creates a full vital with the given maximum.
    #[must_use]
    pub const fn full(max: f64) -> Self {
        Self { current: max, max }
    }

    /// Reports whether nothing remains.
    #[must_use]
    pub fn is_depleted(&self) -> bool {
        self.current <= 0.0
    }
}

/// Phase of the wave scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WavePhase {
    /// Waiting for the countdown to elapse.
    Countdown,
    /// Emitting the wave's spawns.
    Spawning,
    /// Every wave has been emitted and looping is disabled.
    Completed,
}

/// Wave progression.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveState {
    /// Zero-based index of the current wave; keeps growing while looping.
    pub index: u32,
    /// Number of configured waves.
    pub total: u32,
    /// Scheduler phase.
    pub phase: WavePhase,
    /// Seconds left before the current wave starts spawning.
    pub countdown_remaining: f64,
    /// Seconds since the current wave started spawning.
    pub elapsed: f64,
    /// Position of the next spawn in the current wave's schedule.
    pub cursor: usize,
    /// Whether the last wave repeats once the table is exhausted.
    pub loop_waves: bool,
}

/// Kind of castle passive bonus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CastlePassiveKind {
    /// Health regeneration per second.
    Regen,
    /// Flat breach damage reduction.
    Armor,
    /// Percentage bonus on enemy rewards.
    Gold,
}

/// A passive bonus granted by the current castle level.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CastlePassive {
    /// Kind of bonus.
    pub kind: CastlePassiveKind,
    /// Total bonus at the current level.
    pub total: f64,
    /// Increase relative to the previous level.
    pub delta: f64,
}

/// Castle statistics.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CastleState {
    /// Current level.
    pub level: u32,
    /// Remaining health.
    pub health: f64,
    /// Maximum health.
    pub max_health: f64,
    /// Flat breach damage reduction.
    pub armor: f64,
    /// Health regenerated per second.
    pub regen_per_second: f64,
    /// Percentage added to enemy gold rewards.
    pub gold_bonus_percent: f64,
    /// Seconds before another repair is allowed.
    pub repair_cooldown_remaining: f64,
    /// Passives granted by the current level.
    pub passives: Vec<CastlePassive>,
}

impl CastleState {
    /// Adopts the statistics of `level`, deriving passives relative to `previous`.
    ///
    /// Health is raised by the growth in maximum health and clamped to the new
    /// maximum.
    pub fn apply_level(&mut self, level: &CastleLevelConfig, previous: Option<&CastleLevelConfig>) {
        let growth = (level.max_health - self.max_health).max(0.0);
        self.level = level.level;
        self.max_health = level.max_health;
        self.health = (self.health + growth).min(self.max_health);
        self.armor = level.armor;
        self.regen_per_second = level.regen_per_second;
        self.gold_bonus_percent = level.gold_bonus_percent;

        let baseline = |select: fn(&CastleLevelConfig) -> f64| previous.map_or(0.0, select);
        self.passives = [
            (
                CastlePassiveKind::Regen,
                level.regen_per_second,
                baseline(|entry| entry.regen_per_second),
            ),
            (
                CastlePassiveKind::Armor,
                level.armor,
                baseline(|entry| entry.armor),
            ),
            (
                CastlePassiveKind::Gold,
                level.gold_bonus_percent,
                baseline(|entry| entry.gold_bonus_percent),
            ),
        ]
        .into_iter()
        .filter(|(_, total, _)| *total > 0.0)
        .map(|(kind, total, before)| CastlePassive {
            kind,
            total,
            delta: total - before,
        })
        .collect();
    }
}

/// Gold and score.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceState {
    /// Spendable gold; unsigned so it can never go negative.
    pub gold: u32,
    /// Accumulated score.
    pub score: u64,
}

impl ResourceState {
    /// Adds gold, saturating at the numeric limit, and returns the new balance.
    pub fn credit(&mut self, amount: u32) -> u32 {
        self.gold = self.gold.saturating_add(amount);
        self.gold
    }

    /// Removes gold if the balance covers it and returns the new balance.
    pub fn try_debit(&mut self, amount: u32) -> Result<u32, ActionError> {
        self.gold = self
            .gold
            .checked_sub(amount)
            .ok_or(ActionError::InsufficientGold)?;
        Ok(self.gold)
    }
}

/// Typing buffer, combo, and accuracy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypingState {
    /// Enemy currently being typed.
    pub active_enemy: Option<EnemyId>,
    /// Correctly typed prefix of the active enemy's word.
    pub buffer: String,
    /// Consecutive completed words.
    pub combo: u32,
    /// Highest combo reached during the run.
    pub best_combo: u32,
    /// Seconds before the combo expires.
    pub combo_timer: f64,
    /// Whether the combo-expiry warning is showing.
    pub combo_warning: bool,
    /// Lifetime accuracy in `[0, 1]`.
    pub accuracy: f64,
    /// Keystrokes received.
    pub total_inputs: u64,
    /// Correct keystrokes received.
    pub correct_inputs: u64,
    /// Incorrect keystrokes received.
    pub errors: u64,
    /// Correctness of the most recent keystrokes, oldest first.
    pub recent_inputs: VecDeque<bool>,
    /// Observational difficulty hint in `[-1, 1]` derived from recent accuracy.
    pub dynamic_difficulty_bias: f64,
    /// Words completed during the run.
    pub words_completed: u32,
    /// Words completed without errors.
    pub perfect_words: u32,
}

impl Default for TypingState {
    fn default() -> Self {
        Self {
            active_enemy: None,
            buffer: String::new(),
            combo: 0,
            best_combo: 0,
            combo_timer: 0.0,
            combo_warning: false,
            accuracy: 1.0,
            total_inputs: 0,
            correct_inputs: 0,
            errors: 0,
            recent_inputs: VecDeque::new(),
            dynamic_difficulty_bias: 0.0,
            words_completed: 0,
            perfect_words: 0,
        }
    }
}

/// A single enemy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyState {
    /// Unique identifier.
    pub id: EnemyId,
    /// Tier providing base statistics.
    pub tier: TierId,
    /// Lane the enemy walks along.
    pub lane: u32,
    /// Remaining distance to the castle.
    pub distance: f64,
    /// Speed in lane units per second.
    pub speed: f64,
    /// Health.
    pub health: Vital,
    /// Shield absorbing damage before health.
    pub shield: Vital,
    /// Word the player must type; cleared once the enemy leaves play.
    pub word: Option<String>,
    /// Mistyped letters against the current word, kept until it is replaced.
    pub word_errors: u32,
    /// Lifecycle status.
    pub status: EnemyStatus,
    /// Wave the enemy belongs to.
    pub wave_index: u32,
    /// Raw castle damage on escape.
    pub damage: f64,
    /// Band-scaled gold reward.
    pub reward: u32,
    /// Simulated time at which the enemy spawned.
    pub spawned_at: f64,
}

impl EnemyState {
    /// Reports whether the enemy is still in play.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.status == EnemyStatus::Alive
    }
}

/// A turret occupying a slot.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TurretState {
    /// Archetype of the turret.
    pub type_id: TurretTypeId,
    /// Current level.
    pub level: u32,
}

/// A turret slot and its occupant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurretSlotState {
    /// Slot identifier.
    pub id: SlotId,
    /// Lane covered by the slot.
    pub lane: u32,
    /// Distance of the slot from the castle.
    pub position: f64,
    /// Wave index at which the slot unlocks.
    pub unlock_wave: u32,
    /// Whether turrets may be built here.
    pub unlocked: bool,
    /// Turret placed in the slot.
    pub turret: Option<TurretState>,
    /// Target selection rule.
    pub targeting_priority: TargetingPriority,
    /// Whether the turret may fire.
    pub firing_enabled: bool,
    /// Seconds before the turret may fire again.
    pub cooldown_remaining: f64,
}

impl TurretSlotState {
    /// Builds an empty slot from its configuration.
    #[must_use]
    pub fn from_config(config: &TurretSlotConfig) -> Self {
        Self {
            id: config.id,
            lane: config.lane,
            position: config.position,
            unlock_wave: config.unlock_wave,
            unlocked: config.unlock_wave == 0,
            turret: None,
            targeting_priority: TargetingPriority::default(),
            firing_enabled: true,
            cooldown_remaining: 0.0,
        }
    }
}

/// A projectile in flight.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectileState {
    /// Unique identifier.
    pub id: ProjectileId,
    /// Slot that launched the projectile.
    pub source_slot: SlotId,
    /// Enemy the projectile homes in on.
    pub target: EnemyId,
    /// Lane of travel.
    pub lane: u32,
    /// Current distance from the castle.
    pub position: f64,
    /// Speed in lane units per second.
    pub speed: f64,
    /// Damage applied on arrival.
    pub damage: f64,
}

/// Accumulator for the wave currently being measured.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WaveWindow {
    /// Wave being measured.
    pub index: u32,
    /// Simulated time the window opened.
    pub started_at: f64,
    /// Enemies defeated.
    pub enemies_defeated: u32,
    /// Enemies that reached the castle.
    pub breaches: u32,
    /// Perfect words typed.
    pub perfect_words: u32,
    /// Words completed.
    pub words_completed: u32,
    /// Damage dealt by turrets.
    pub turret_damage: f64,
    /// Damage dealt by typing.
    pub typing_damage: f64,
    /// Gold earned from every source.
    pub gold_earned: u64,
    /// Completion bonus granted for the wave.
    pub gold_bonus: u32,
    /// Highest combo reached.
    pub max_combo: u32,
    /// Castle repairs performed.
    pub repairs: u32,
    /// Sum of target-lock reaction times.
    pub reaction_total: f64,
    /// Number of target locks measured.
    pub reaction_count: u32,
    /// Lifetime keystrokes when the window opened.
    pub inputs_at_start: u64,
    /// Lifetime correct keystrokes when the window opened.
    pub correct_at_start: u64,
}

/// Closed record of a completed wave.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveSummary {
    /// Wave index.
    pub index: u32,
    /// Mode the wave was played in.
    pub mode: GameMode,
    /// Seconds the window stayed open.
    pub duration: f64,
    /// Keystroke accuracy during the wave.
    pub accuracy: f64,
    /// Enemies defeated.
    pub enemies_defeated: u32,
    /// Enemies that reached the castle.
    pub breaches: u32,
    /// Perfect words typed.
    pub perfect_words: u32,
    /// Words completed.
    pub words_completed: u32,
    /// Turret damage per second.
    pub turret_dps: f64,
    /// Typing damage per second.
    pub typing_dps: f64,
    /// Combined damage per second.
    pub total_dps: f64,
    /// Turret damage dealt.
    pub turret_damage: f64,
    /// Typing damage dealt.
    pub typing_damage: f64,
    /// Gold earned from every source.
    pub gold_earned: u64,
    /// Wave completion bonus.
    pub gold_bonus: u32,
    /// Highest combo reached.
    pub max_combo: u32,
    /// Combo when the window closed.
    pub combo_at_end: u32,
    /// Castle repairs performed.
    pub repairs: u32,
    /// Mean seconds between spawn and target lock.
    pub average_reaction: f64,
    /// Simulated time the window closed.
    pub completed_at: f64,
}

/// Entry of the gold ledger.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GoldEvent {
    /// Balance after the change.
    pub gold: u32,
    /// Signed change.
    pub delta: i64,
    /// Simulated time of the change.
    pub timestamp: f64,
}

/// How a combo-warning window closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComboWarningOutcome {
    /// A completed word reset the combo timer.
    Recovered,
    /// The combo ran out.
    Expired,
}

/// A combo-warning window that is still open.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActiveComboWarning {
    /// Simulated time the window opened.
    pub started_at: f64,
    /// Accuracy when the window opened.
    pub baseline_accuracy: f64,
    /// Combo when the window opened.
    pub combo: u32,
}

/// A closed combo-warning window.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComboWarningEntry {
    /// Simulated time the window opened.
    pub started_at: f64,
    /// Simulated time the window closed.
    pub ended_at: f64,
    /// Seconds the window stayed open.
    pub duration: f64,
    /// Combo when the window opened.
    pub combo: u32,
    /// Accuracy when the window opened.
    pub baseline_accuracy: f64,
    /// Accuracy when the window closed.
    pub end_accuracy: f64,
    /// `end_accuracy - baseline_accuracy`.
    pub accuracy_delta: f64,
    /// How the window closed.
    pub outcome: ComboWarningOutcome,
}

/// Combo-warning aggregate.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ComboWarningAnalytics {
    /// Window currently open.
    pub active: Option<ActiveComboWarning>,
    /// Windows closed during the run.
    pub count: u32,
    /// Most recent closed windows.
    pub history: VecDeque<ComboWarningEntry>,
}

/// A classified defeat effect.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DefeatBurstEntry {
    /// Defeated enemy.
    pub enemy: EnemyId,
    /// Tier of the defeated enemy.
    pub tier: TierId,
    /// Chosen style.
    pub mode: DefeatBurstMode,
    /// Simulated time of the defeat.
    pub time: f64,
}

/// Defeat effect counters.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DefeatBurstAnalytics {
    /// Defeats rendered with sprites.
    pub sprite: u32,
    /// Defeats rendered procedurally.
    pub procedural: u32,
    /// Most recent classifications.
    pub history: VecDeque<DefeatBurstEntry>,
}

/// A tutorial step event reported by the scripting layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TutorialEventRecord {
    /// Tutorial step.
    pub step_id: String,
    /// Event name.
    pub event: String,
    /// Simulated time of the report.
    pub time: f64,
}

/// A hint shown by the tutorial.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TutorialAssistRecord {
    /// Tutorial step.
    pub step_id: String,
    /// Hint identifier.
    pub hint: String,
    /// Simulated time of the report.
    pub time: f64,
}

/// Final tutorial outcome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TutorialSummary {
    /// Tutorial script version.
    pub version: String,
    /// Whether every step was completed.
    pub completed: bool,
    /// Seconds spent in the tutorial.
    pub duration: f64,
    /// Accuracy achieved.
    pub accuracy: f64,
    /// Hints shown.
    pub assists_used: u32,
}

/// A skipped tutorial.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TutorialSkipRecord {
    /// Step that was active when skipping.
    pub step_id: String,
    /// Simulated time of the skip.
    pub time: f64,
}

/// Tutorial telemetry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TutorialAnalytics {
    /// Step events.
    pub events: Vec<TutorialEventRecord>,
    /// Hints shown.
    pub assists: Vec<TutorialAssistRecord>,
    /// Summary reported when the tutorial ended.
    pub summary: Option<TutorialSummary>,
    /// Skips reported.
    pub skips: Vec<TutorialSkipRecord>,
}

/// Result of a typing drill.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypingDrillSummary {
    /// Drill mode label.
    pub mode: String,
    /// Words completed.
    pub words_completed: u32,
    /// Keystroke accuracy.
    pub accuracy: f64,
    /// Mistyped keys.
    pub errors: u32,
    /// Highest combo reached.
    pub best_combo: u32,
    /// Seconds the drill lasted.
    pub duration: f64,
    /// Words per minute.
    pub words_per_minute: f64,
    /// Simulated time of the report; stamped by the engine.
    #[serde(default)]
    pub recorded_at: f64,
}

/// Cosmetic starfield parameters mirrored into analytics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StarfieldAnalytics {
    /// Parallax depth.
    pub depth: f64,
    /// Drift speed multiplier.
    pub drift_multiplier: f64,
    /// Progress through the current wave.
    pub wave_progress: f64,
    /// Castle health ratio used for tinting.
    pub castle_ratio: f64,
    /// Tint name.
    pub tint: String,
}

/// Aggregated analytics of a run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsState {
    /// Wave whose window is open.
    pub active_wave_index: Option<u32>,
    /// Accumulator of the open window.
    pub window: WaveWindow,
    /// Most recent summaries for the HUD.
    pub wave_summaries: VecDeque<WaveSummary>,
    /// Long-running summary history.
    pub wave_history: VecDeque<WaveSummary>,
    /// Gold ledger.
    pub gold_events: VecDeque<GoldEvent>,
    /// Combo-warning windows.
    pub combo_warning: ComboWarningAnalytics,
    /// Defeat effect counters.
    pub defeat_bursts: DefeatBurstAnalytics,
    /// Enemies defeated.
    pub enemies_defeated: u32,
    /// Enemies that reached the castle.
    pub breaches: u32,
    /// Damage dealt by turrets.
    pub turret_damage: f64,
    /// Damage dealt by typing.
    pub typing_damage: f64,
    /// Castle repairs performed.
    pub castle_repairs: u32,
    /// Gold earned from every source.
    pub gold_earned: u64,
    /// Tutorial telemetry.
    pub tutorial: TutorialAnalytics,
    /// Most recent typing drills.
    pub typing_drills: VecDeque<TypingDrillSummary>,
    /// Cosmetic starfield mirror.
    pub starfield: Option<StarfieldAnalytics>,
}
