#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Typing Defense engine.
//!
//! This crate defines the vocabulary that connects the orchestrating engine
//! with its pure systems. The engine owns a single [`GameState`] root and
//! lends it to systems by mutable reference for the duration of one call.
//! Systems never keep copies of the state; they report what happened by
//! appending [`GameEvent`] values to an output buffer, which the engine reacts
//! to before dispatching them to [`EventBus`] listeners.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

pub mod bus;
pub mod config;
pub mod rng;
pub mod state;
pub mod telemetry;

pub use bus::{EventBus, SubscriptionId};
pub use config::{
    CastleConfig, CastleLevelConfig, ConfigError, DifficultyBand, EnemyTierConfig, GameConfig,
    LaneConfig, PerfectWordBonus, RepairConfig, SpawnEntryConfig, TurretArchetypeConfig,
    TurretLevelConfig, TurretSlotConfig, TypingConfig, WaveConfig, WordBank, WordLength,
};
pub use rng::Prng;
pub use state::{
    ActiveComboWarning, AnalyticsState, CastlePassive, CastlePassiveKind, CastleState,
    ComboWarningAnalytics, ComboWarningEntry, ComboWarningOutcome, DefeatBurstAnalytics,
    DefeatBurstEntry, EnemyState, GameState, GoldEvent, ProjectileState, ResourceState,
    StarfieldAnalytics, TurretSlotState, TurretState, TutorialAnalytics, TutorialAssistRecord,
    TutorialEventRecord, TutorialSkipRecord, TutorialSummary, TypingDrillSummary, TypingState,
    Vital, WavePhase, WaveState, WaveSummary, WaveWindow,
};
pub use telemetry::{TelemetryClient, TelemetryRecord, TelemetryRecorder};

/// Maximum number of wave summaries retained for the HUD panel.
pub const WAVE_SUMMARY_LIMIT: usize = 12;
/// Maximum number of wave summaries retained in the long-running history.
pub const WAVE_HISTORY_LIMIT: usize = 100;
/// Maximum number of gold ledger entries retained.
pub const GOLD_EVENT_LIMIT: usize = 200;
/// Maximum number of closed combo-warning windows retained.
pub const COMBO_WARNING_HISTORY_LIMIT: usize = 20;
/// Maximum number of defeat-burst classifications retained.
pub const DEFEAT_BURST_HISTORY_LIMIT: usize = 50;
/// Maximum number of typing drill summaries retained.
pub const TYPING_DRILL_LIMIT: usize = 20;

/// Pushes `value` onto a ring buffer, evicting the oldest entries beyond `limit`.
pub fn push_capped<T>(ring: &mut std::collections::VecDeque<T>, value: T, limit: usize) {
    ring.push_back(value);
    while ring.len() > limit {
        let _ = ring.pop_front();
    }
}

/// Overall lifecycle of a simulation run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameStatus {
    /// The simulation advances on every update.
    Running,
    /// The castle fell; updates are ignored.
    Defeat,
    /// Every wave was cleared; updates are ignored.
    Victory,
}

impl GameStatus {
    /// Reports whether the status is terminal.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// Describes how the wave schedule is consumed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameMode {
    /// Endless practice; the last wave repeats.
    Practice,
    /// Finite campaign that ends in victory after the last wave.
    Campaign,
}

impl GameMode {
    /// Stable lowercase label used by telemetry payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Practice => "practice",
            Self::Campaign => "campaign",
        }
    }
}

/// Lifecycle of a single enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnemyStatus {
    /// The enemy is advancing along its lane.
    Alive,
    /// The enemy was destroyed by typing or turret damage.
    Defeated,
    /// The enemy reached the castle.
    Escaped,
}

/// Strategy a turret uses to choose between enemies in range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetingPriority {
    /// Enemy closest to the castle, ties broken by earliest spawn.
    #[default]
    First,
    /// Enemy with the highest remaining health.
    Strongest,
    /// Enemy with the lowest remaining health.
    Weakest,
}

/// Origin of damage applied to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DamageSource {
    /// A completed typed word.
    Typing,
    /// A projectile issued by the given turret slot.
    Turret(SlotId),
    /// Scripted damage applied through the public API.
    Scripted,
}

/// Visual style chosen for an enemy defeat effect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DefeatBurstMode {
    /// Pre-rendered sprite animation.
    Sprite,
    /// Procedurally generated particles.
    #[default]
    Procedural,
}

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectileId(u32);

impl ProjectileId {
    /// Creates a new projectile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of a turret slot, rendered as `slot-<n>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SlotId(u32);

impl SlotId {
    /// Creates a new slot identifier with the provided ordinal.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the slot ordinal.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot-{}", self.0)
    }
}

/// Error returned when a slot label is not of the form `slot-<n>`.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a valid slot identifier")]
pub struct SlotIdParseError(String);

impl FromStr for SlotId {
    type Err = SlotIdParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value
            .trim()
            .strip_prefix("slot-")
            .and_then(|ordinal| ordinal.parse::<u32>().ok())
            .map(Self)
            .ok_or_else(|| SlotIdParseError(value.to_owned()))
    }
}

impl TryFrom<String> for SlotId {
    type Error = SlotIdParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SlotId> for String {
    fn from(value: SlotId) -> Self {
        value.to_string()
    }
}

/// Identifier of a turret archetype such as `arrow`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurretTypeId(String);

impl TurretTypeId {
    /// Creates a new archetype identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrows the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TurretTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of an enemy tier such as `grunt`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TierId(String);

impl TierId {
    /// Creates a new tier identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrows the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Request to create an enemy, issued by the wave schedule or the public API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnRequest {
    /// Tier providing the enemy's base statistics.
    pub tier: TierId,
    /// Lane to spawn on; a seeded lane is chosen when absent.
    pub lane: Option<u32>,
    /// Wave the enemy belongs to.
    pub wave_index: u32,
    /// Shield override replacing the tier's base shield.
    pub shield: Option<f64>,
    /// Word override replacing the word bank selection.
    pub word: Option<String>,
}

impl SpawnRequest {
    /// Creates a request for the given tier with every override unset.
    #[must_use]
    pub fn new(tier: TierId, wave_index: u32) -> Self {
        Self {
            tier,
            lane: None,
            wave_index,
            shield: None,
            word: None,
        }
    }

    /// Pins the request to a lane.
    #[must_use]
    pub fn with_lane(mut self, lane: u32) -> Self {
        self.lane = Some(lane);
        self
    }

    /// Overrides the spawned enemy's shield.
    #[must_use]
    pub fn with_shield(mut self, shield: f64) -> Self {
        self.shield = Some(shield);
        self
    }

    /// Overrides the spawned enemy's word.
    #[must_use]
    pub fn with_word(mut self, word: impl Into<String>) -> Self {
        self.word = Some(word.into());
        self
    }
}

/// Request for a turret to launch a projectile at an enemy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectileRequest {
    /// Slot issuing the projectile.
    pub slot: SlotId,
    /// Enemy the projectile homes in on.
    pub target: EnemyId,
    /// Lane the projectile travels along.
    pub lane: u32,
    /// Launch position measured as distance from the castle.
    pub origin: f64,
    /// Travel speed in lane units per second.
    pub speed: f64,
    /// Damage applied on arrival.
    pub damage: f64,
}

/// Reasons a mutating operation may be refused.
///
/// The serialised form is the kebab-case reason string surfaced to callers.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error,
)]
#[serde(rename_all = "kebab-case")]
pub enum ActionError {
    /// No slot with the requested identifier exists.
    #[error("slot does not exist")]
    InvalidSlot,
    /// The turret type, level, or occupancy does not support the request.
    #[error("turret type or level is not available")]
    InvalidTurret,
    /// The slot has not been unlocked yet.
    #[error("slot is still locked")]
    LockedSlot,
    /// The player cannot afford the operation.
    #[error("not enough gold")]
    InsufficientGold,
    /// A validated operation failed while being applied.
    #[error("validated operation failed to apply")]
    ApplyFailed,
    /// The castle or turret is already at its highest level.
    #[error("already at maximum level")]
    MaxLevel,
    /// The castle repair is still cooling down.
    #[error("repair is cooling down")]
    RepairCooldown,
    /// The castle does not need repairs.
    #[error("castle is already at full health")]
    FullHealth,
    /// No alive enemy with the requested identifier exists.
    #[error("enemy does not exist")]
    InvalidEnemy,
    /// The run reached a terminal status.
    #[error("the game is over")]
    GameOver,
}

impl ActionError {
    /// Kebab-case reason string from the closed failure taxonomy.
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Self::InvalidSlot => "invalid-slot",
            Self::InvalidTurret => "invalid-turret",
            Self::LockedSlot => "locked-slot",
            Self::InsufficientGold => "insufficient-gold",
            Self::ApplyFailed => "apply-failed",
            Self::MaxLevel => "max-level",
            Self::RepairCooldown => "repair-cooldown",
            Self::FullHealth => "full-health",
            Self::InvalidEnemy => "invalid-enemy",
            Self::GameOver => "game-over",
        }
    }
}

/// Outcome of every fallible mutating operation.
pub type ActionResult<T> = Result<T, ActionError>;

/// Receipt describing the gold movement caused by an economy operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EconomyReceipt {
    /// Signed gold change; negative when gold was spent.
    pub delta: i64,
    /// Gold balance after the operation.
    pub gold: u32,
}

/// Topics under which events are published on the bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    /// `enemy:spawned`
    EnemySpawned,
    /// `enemy:damaged`
    EnemyDamaged,
    /// `enemy:shield-broken`
    EnemyShieldBroken,
    /// `enemy:defeated`
    EnemyDefeated,
    /// `enemy:escaped`
    EnemyEscaped,
    /// `castle:damaged`
    CastleDamaged,
    /// `castle:repaired`
    CastleRepaired,
    /// `castle:upgraded`
    CastleUpgraded,
    /// `resources:gold`
    Gold,
    /// `wave:started`
    WaveStarted,
    /// `wave:completed`
    WaveCompleted,
    /// `analytics:wave-summary`
    WaveSummary,
    /// `analytics:typing-drill`
    TypingDrill,
    /// `combat:defeat-burst`
    DefeatBurst,
    /// `typing:target-locked`
    TargetLocked,
    /// `typing:word-completed`
    WordCompleted,
    /// `turret:fired`
    TurretFired,
    /// `turret:changed`
    TurretChanged,
    /// `turret:slot-unlocked`
    SlotUnlocked,
    /// `game:status`
    StatusChanged,
}

impl EventKind {
    /// Canonical `domain:name` label of the topic.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EnemySpawned => "enemy:spawned",
            Self::EnemyDamaged => "enemy:damaged",
            Self::EnemyShieldBroken => "enemy:shield-broken",
            Self::EnemyDefeated => "enemy:defeated",
            Self::EnemyEscaped => "enemy:escaped",
            Self::CastleDamaged => "castle:damaged",
            Self::CastleRepaired => "castle:repaired",
            Self::CastleUpgraded => "castle:upgraded",
            Self::Gold => "resources:gold",
            Self::WaveStarted => "wave:started",
            Self::WaveCompleted => "wave:completed",
            Self::WaveSummary => "analytics:wave-summary",
            Self::TypingDrill => "analytics:typing-drill",
            Self::DefeatBurst => "combat:defeat-burst",
            Self::TargetLocked => "typing:target-locked",
            Self::WordCompleted => "typing:word-completed",
            Self::TurretFired => "turret:fired",
            Self::TurretChanged => "turret:changed",
            Self::SlotUnlocked => "turret:slot-unlocked",
            Self::StatusChanged => "game:status",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notifications produced by systems and the engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// An enemy entered a lane.
    EnemySpawned {
        /// Identifier of the new enemy.
        enemy: EnemyId,
        /// Tier of the new enemy.
        tier: TierId,
        /// Lane the enemy occupies.
        lane: u32,
        /// Wave the enemy belongs to.
        wave_index: u32,
    },
    /// Damage reached an enemy's shield or health.
    EnemyDamaged {
        /// Enemy that was hit.
        enemy: EnemyId,
        /// Combined shield and health points removed.
        amount: f64,
        /// Origin of the damage.
        source: DamageSource,
    },
    /// An enemy's shield was depleted.
    EnemyShieldBroken {
        /// Enemy whose shield broke.
        enemy: EnemyId,
        /// Origin of the breaking blow.
        source: DamageSource,
    },
    /// An enemy was destroyed.
    EnemyDefeated {
        /// Enemy that was defeated.
        enemy: EnemyId,
        /// Tier of the defeated enemy.
        tier: TierId,
        /// Lane the enemy occupied.
        lane: u32,
        /// Wave the enemy belonged to.
        wave_index: u32,
        /// Band-scaled base gold reward before castle bonuses.
        reward: u32,
        /// Origin of the killing blow.
        source: DamageSource,
    },
    /// An enemy reached the castle.
    EnemyEscaped {
        /// Enemy that escaped.
        enemy: EnemyId,
        /// Tier of the escaped enemy.
        tier: TierId,
        /// Lane the enemy occupied.
        lane: u32,
        /// Raw damage dealt to the castle before armor.
        damage: f64,
    },
    /// The castle lost health.
    CastleDamaged {
        /// Health removed after armor.
        amount: f64,
        /// Remaining health.
        health: f64,
    },
    /// The castle was repaired.
    CastleRepaired {
        /// Health restored.
        amount: f64,
        /// Health after the repair.
        health: f64,
        /// Gold spent.
        cost: u32,
    },
    /// The castle advanced to a new level.
    CastleUpgraded {
        /// Level reached.
        level: u32,
        /// Gold spent.
        cost: u32,
    },
    /// The gold balance changed.
    GoldChanged {
        /// Balance after the change.
        gold: u32,
        /// Signed change.
        delta: i64,
    },
    /// A wave finished its countdown and began spawning.
    WaveStarted {
        /// Index of the wave.
        index: u32,
    },
    /// A wave exhausted its spawn list.
    WaveCompleted {
        /// Index of the wave.
        index: u32,
        /// Band-scaled completion bonus in gold.
        reward_bonus: u32,
    },
    /// A wave analytics window closed.
    WaveSummaryRecorded {
        /// The closed summary.
        summary: WaveSummary,
    },
    /// A typing drill result was recorded.
    TypingDrillRecorded {
        /// The drill summary.
        summary: TypingDrillSummary,
    },
    /// A defeat effect style was chosen.
    DefeatBurst {
        /// Enemy whose defeat is being rendered.
        enemy: EnemyId,
        /// Tier of the defeated enemy.
        tier: TierId,
        /// Chosen effect style.
        mode: DefeatBurstMode,
    },
    /// The typing buffer locked onto an enemy.
    TargetLocked {
        /// Enemy now being typed.
        enemy: EnemyId,
        /// Seconds between the enemy spawning and the lock.
        reaction_seconds: f64,
    },
    /// A word was completed.
    WordCompleted {
        /// Enemy the word belonged to.
        enemy: EnemyId,
        /// Number of characters in the word.
        length: u32,
        /// Whether the word was typed without errors.
        perfect: bool,
        /// Damage committed to the enemy.
        damage: f64,
        /// Combo after the completion.
        combo: u32,
    },
    /// A turret launched a projectile.
    TurretFired {
        /// Slot that fired.
        slot: SlotId,
        /// Enemy being targeted.
        enemy: EnemyId,
        /// Identifier of the new projectile.
        projectile: ProjectileId,
    },
    /// A slot's turret occupancy changed.
    TurretChanged {
        /// Slot that changed.
        slot: SlotId,
        /// Turret now occupying the slot.
        turret: Option<TurretState>,
    },
    /// A slot became available for construction.
    SlotUnlocked {
        /// Slot that unlocked.
        slot: SlotId,
    },
    /// The run status changed.
    StatusChanged {
        /// New status.
        status: GameStatus,
    },
}

impl GameEvent {
    /// Topic under which the event is published.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::EnemySpawned { .. } => EventKind::EnemySpawned,
            Self::EnemyDamaged { .. } => EventKind::EnemyDamaged,
            Self::EnemyShieldBroken { .. } => EventKind::EnemyShieldBroken,
            Self::EnemyDefeated { .. } => EventKind::EnemyDefeated,
            Self::EnemyEscaped { .. } => EventKind::EnemyEscaped,
            Self::CastleDamaged { .. } => EventKind::CastleDamaged,
            Self::CastleRepaired { .. } => EventKind::CastleRepaired,
            Self::CastleUpgraded { .. } => EventKind::CastleUpgraded,
            Self::GoldChanged { .. } => EventKind::Gold,
            Self::WaveStarted { .. } => EventKind::WaveStarted,
            Self::WaveCompleted { .. } => EventKind::WaveCompleted,
            Self::WaveSummaryRecorded { .. } => EventKind::WaveSummary,
            Self::TypingDrillRecorded { .. } => EventKind::TypingDrill,
            Self::DefeatBurst { .. } => EventKind::DefeatBurst,
            Self::TargetLocked { .. } => EventKind::TargetLocked,
            Self::WordCompleted { .. } => EventKind::WordCompleted,
            Self::TurretFired { .. } => EventKind::TurretFired,
            Self::TurretChanged { .. } => EventKind::TurretChanged,
            Self::SlotUnlocked { .. } => EventKind::SlotUnlocked,
            Self::StatusChanged { .. } => EventKind::StatusChanged,
        }
    }
}
