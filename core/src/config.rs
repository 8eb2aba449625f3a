//! Read-only configuration tables consumed by the engine and its systems.
//!
//! [`GameConfig::default`] provides a complete built-in campaign. Designers may
//! override it with a TOML document via [`GameConfig::from_toml_str`]; every
//! loaded configuration is checked by [`GameConfig::validate`] so systems can
//! rely on referential integrity without re-checking it on the hot path.

use std::{collections::BTreeSet, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{SlotId, TierId, TurretTypeId};

/// Errors raised while loading or validating a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("could not read configuration: {0}")]
    Io(#[from] std::io::Error),
    /// The TOML document could not be parsed.
    #[error("could not parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// A table that must contain entries is empty.
    #[error("configuration table '{0}' must not be empty")]
    EmptyTable(&'static str),
    /// Two entries share an identifier.
    #[error("duplicate identifier '{id}' in '{table}'")]
    DuplicateId {
        /// Table containing the duplicate.
        table: &'static str,
        /// Identifier that appears twice.
        id: String,
    },
    /// A level table does not count up from one without gaps.
    #[error("levels of '{0}' must be contiguous and start at 1")]
    NonContiguousLevels(String),
    /// A wave references a tier that is not defined.
    #[error("wave {wave} references unknown tier '{tier}'")]
    UnknownTier {
        /// Zero-based wave index.
        wave: usize,
        /// Missing tier.
        tier: String,
    },
    /// A lane index exceeds the configured lane count.
    #[error("lane {lane} referenced by '{owner}' is outside the {count} configured lanes")]
    UnknownLane {
        /// Entry referencing the lane.
        owner: String,
        /// Referenced lane.
        lane: u32,
        /// Configured lane count.
        count: u32,
    },
    /// A tier uses a word length whose word list is empty.
    #[error("tier '{0}' draws from an empty word list")]
    EmptyWordList(String),
    /// A numeric value is outside its permitted range.
    #[error("value '{0}' is out of range")]
    OutOfRange(&'static str),
}

/// Complete configuration of a simulation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Gold available when a run starts.
    pub starting_gold: u32,
    /// Lane geometry.
    pub lanes: LaneConfig,
    /// Castle progression and repair economy.
    pub castle: CastleConfig,
    /// Enemy archetypes.
    pub enemy_tiers: Vec<EnemyTierConfig>,
    /// Ordered wave definitions.
    pub waves: Vec<WaveConfig>,
    /// Turret slot layout.
    pub turret_slots: Vec<TurretSlotConfig>,
    /// Turret archetypes and their level tables.
    pub turret_archetypes: Vec<TurretArchetypeConfig>,
    /// Difficulty bands keyed by starting wave.
    pub difficulty_bands: Vec<DifficultyBand>,
    /// Typing, combo, and bonus tuning.
    pub typing: TypingConfig,
    /// Words assigned to enemies.
    pub word_bank: WordBank,
}

/// Geometry shared by every lane.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LaneConfig {
    /// Number of parallel lanes.
    pub count: u32,
    /// Distance an enemy travels from spawn to the castle.
    pub length: f64,
}

/// Castle level table and repair tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CastleConfig {
    /// Levels in ascending order starting at 1.
    pub levels: Vec<CastleLevelConfig>,
    /// Repair economy.
    pub repair: RepairConfig,
}

/// Statistics of a single castle level.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CastleLevelConfig {
    /// One-based level number.
    pub level: u32,
    /// Gold required to reach this level; ignored for level 1.
    pub upgrade_cost: u32,
    /// Maximum health at this level.
    pub max_health: f64,
    /// Flat damage reduction applied to breaches.
    pub armor: f64,
    /// Health regenerated per second.
    pub regen_per_second: f64,
    /// Percentage added to every enemy gold reward.
    pub gold_bonus_percent: f64,
}

/// Repair economy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RepairConfig {
    /// Gold spent per repair.
    pub cost: u32,
    /// Health restored per repair.
    pub heal_amount: f64,
    /// Seconds before another repair is permitted.
    pub cooldown_seconds: f64,
}

/// Relative length of words assigned to a tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WordLength {
    /// Three to five letters.
    Short,
    /// Five to eight letters.
    Medium,
    /// Eight or more letters.
    Long,
}

/// Base statistics of an enemy archetype.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyTierConfig {
    /// Unique tier identifier.
    pub id: TierId,
    /// Base health.
    pub health: f64,
    /// Base speed in lane units per second.
    pub speed: f64,
    /// Raw castle damage when the enemy escapes.
    pub damage: f64,
    /// Base gold reward.
    pub reward: u32,
    /// Base shield absorbing damage before health.
    #[serde(default)]
    pub shield: f64,
    /// Word list the tier draws from.
    pub word_length: WordLength,
}

/// Definition of a single wave.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveConfig {
    /// Seconds of calm before the first spawn.
    pub countdown_seconds: f64,
    /// Gold granted when the wave's spawn list is exhausted.
    #[serde(default)]
    pub reward_bonus: u32,
    /// Spawn table.
    pub spawns: Vec<SpawnEntryConfig>,
}

/// A group of identical spawns within a wave.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnEntryConfig {
    /// Tier spawned by the entry.
    pub tier: TierId,
    /// Number of enemies.
    pub count: u32,
    /// Offset of the first spawn from the wave start, in seconds.
    #[serde(default)]
    pub at_seconds: f64,
    /// Seconds between consecutive spawns of the entry.
    #[serde(default)]
    pub cadence_seconds: f64,
    /// Fixed lane; a seeded lane is chosen when absent.
    #[serde(default)]
    pub lane: Option<u32>,
    /// Shield override.
    #[serde(default)]
    pub shield: Option<f64>,
}

/// Placement of a turret slot.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurretSlotConfig {
    /// Slot identifier.
    pub id: SlotId,
    /// Lane covered by the slot.
    pub lane: u32,
    /// Distance of the slot from the castle.
    pub position: f64,
    /// Wave index at which the slot unlocks.
    pub unlock_wave: u32,
}

/// A turret archetype and its progression.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurretArchetypeConfig {
    /// Archetype identifier.
    pub id: TurretTypeId,
    /// Human readable name.
    pub name: String,
    /// Levels in ascending order starting at 1.
    pub levels: Vec<TurretLevelConfig>,
}

impl TurretArchetypeConfig {
    /// Returns the statistics of `level`, if configured.
    #[must_use]
    pub fn level(&self, level: u32) -> Option<&TurretLevelConfig> {
        self.levels.iter().find(|entry| entry.level == level)
    }

    /// Highest configured level.
    #[must_use]
    pub fn max_level(&self) -> u32 {
        self.levels.iter().map(|entry| entry.level).max().unwrap_or(0)
    }

    /// Sum of level costs in the half-open range `(from, to]`.
    ///
    /// Returns `None` when `to` is not a configured level.
    #[must_use]
    pub fn cost_between(&self, from: u32, to: u32) -> Option<u32> {
        let _ = self.level(to)?;
        Some(
            self.levels
                .iter()
                .filter(|entry| entry.level > from && entry.level <= to)
                .map(|entry| entry.cost)
                .fold(0_u32, u32::saturating_add),
        )
    }
}

/// Statistics of a turret at a given level.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurretLevelConfig {
    /// One-based level number.
    pub level: u32,
    /// Gold required to reach this level from the previous one.
    pub cost: u32,
    /// Damage per projectile.
    pub damage: f64,
    /// Shots per second.
    pub fire_rate: f64,
    /// Reach measured along the lane.
    pub range: f64,
    /// Projectile speed in lane units per second.
    pub projectile_speed: f64,
}

impl TurretLevelConfig {
    /// Seconds between consecutive shots.
    #[must_use]
    pub fn cooldown_seconds(&self) -> f64 {
        if self.fire_rate <= 0.0 {
            f64::INFINITY
        } else {
            1.0 / self.fire_rate
        }
    }
}

/// Multipliers applied to enemies from a wave onward.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DifficultyBand {
    /// Band identifier.
    pub id: String,
    /// First wave index the band applies to.
    pub from_wave: u32,
    /// Multiplier on enemy health and shield.
    pub enemy_health_multiplier: f64,
    /// Multiplier on enemy speed.
    pub enemy_speed_multiplier: f64,
    /// Multiplier on enemy and wave gold rewards.
    pub reward_multiplier: f64,
}

impl Default for DifficultyBand {
    fn default() -> Self {
        Self {
            id: "baseline".to_owned(),
            from_wave: 0,
            enemy_health_multiplier: 1.0,
            enemy_speed_multiplier: 1.0,
            reward_multiplier: 1.0,
        }
    }
}

/// Perfect-word bonus rule.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerfectWordBonus {
    /// Minimum word length eligible for the bonus.
    pub min_length: u32,
    /// Gold granted for each eligible error-free word.
    pub gold: u32,
}

/// Typing, combo, and damage tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypingConfig {
    /// Seconds a combo survives without a completed word.
    pub combo_decay_seconds: f64,
    /// Remaining combo seconds at which the warning window opens.
    pub combo_warning_seconds: f64,
    /// Flat damage of a completed word.
    pub word_damage_base: f64,
    /// Additional damage per letter of a completed word.
    pub word_damage_per_letter: f64,
    /// Multiplier gained per combo step.
    pub combo_damage_step: f64,
    /// Upper bound on the combo multiplier.
    pub combo_multiplier_cap: f64,
    /// Perfect-word bonus.
    pub perfect_word: PerfectWordBonus,
    /// Number of keystrokes tracked for recent accuracy.
    pub recent_input_window: usize,
}

impl TypingConfig {
    /// Damage and reward multiplier for a combo value.
    #[must_use]
    pub fn combo_multiplier(&self, combo: u32) -> f64 {
        (1.0 + f64::from(combo) * self.combo_damage_step).min(self.combo_multiplier_cap.max(1.0))
    }
}

/// Words assigned to enemies, grouped by length.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WordBank {
    /// Short words.
    pub short: Vec<String>,
    /// Medium words.
    pub medium: Vec<String>,
    /// Long words.
    pub long: Vec<String>,
}

impl WordBank {
    /// Returns the word list for `length`.
    #[must_use]
    pub fn words(&self, length: WordLength) -> &[String] {
        match length {
            WordLength::Short => &self.short,
            WordLength::Medium => &self.medium,
            WordLength::Long => &self.long,
        }
    }
}

impl GameConfig {
    /// Parses a configuration from TOML and validates it.
    ///
    /// Tables omitted from the document keep their built-in defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML configuration file.
    pub fn from_toml_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Looks up an enemy tier.
    #[must_use]
    pub fn tier(&self, id: &TierId) -> Option<&EnemyTierConfig> {
        self.enemy_tiers.iter().find(|tier| &tier.id == id)
    }

    /// Looks up a turret archetype.
    #[must_use]
    pub fn archetype(&self, id: &TurretTypeId) -> Option<&TurretArchetypeConfig> {
        self.turret_archetypes
            .iter()
            .find(|archetype| &archetype.id == id)
    }

    /// Looks up a turret slot.
    #[must_use]
    pub fn slot(&self, id: SlotId) -> Option<&TurretSlotConfig> {
        self.turret_slots.iter().find(|slot| slot.id == id)
    }

    /// Looks up a castle level.
    #[must_use]
    pub fn castle_level(&self, level: u32) -> Option<&CastleLevelConfig> {
        self.castle.levels.iter().find(|entry| entry.level == level)
    }

    /// Resolves the wave definition used for `index`, repeating the last wave
    /// when `index` runs past the table.
    #[must_use]
    pub fn wave_for_index(&self, index: u32) -> Option<&WaveConfig> {
        let position = usize::try_from(index).ok()?;
        self.waves.get(position).or_else(|| self.waves.last())
    }

    /// Number of configured waves.
    #[must_use]
    pub fn wave_count(&self) -> u32 {
        u32::try_from(self.waves.len()).unwrap_or(u32::MAX)
    }

    /// Difficulty bands sorted ascending by starting wave.
    #[must_use]
    pub fn sorted_bands(&self) -> Vec<DifficultyBand> {
        let mut bands = self.difficulty_bands.clone();
        bands.sort_by_key(|band| band.from_wave);
        bands
    }

    /// Checks referential integrity and value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lanes.count == 0 {
            return Err(ConfigError::OutOfRange("lanes.count"));
        }
        if !(self.lanes.length > 0.0) {
            return Err(ConfigError::OutOfRange("lanes.length"));
        }
        if self.enemy_tiers.is_empty() {
            return Err(ConfigError::EmptyTable("enemy_tiers"));
        }
        if self.waves.is_empty() {
            return Err(ConfigError::EmptyTable("waves"));
        }
        if self.castle.levels.is_empty() {
            return Err(ConfigError::EmptyTable("castle.levels"));
        }
        if self.turret_archetypes.is_empty() {
            return Err(ConfigError::EmptyTable("turret_archetypes"));
        }
        if self.typing.combo_decay_seconds <= 0.0 {
            return Err(ConfigError::OutOfRange("typing.combo_decay_seconds"));
        }
        if self.typing.combo_warning_seconds < 0.0
            || self.typing.combo_warning_seconds >= self.typing.combo_decay_seconds
        {
            return Err(ConfigError::OutOfRange("typing.combo_warning_seconds"));
        }

        check_contiguous(
            "castle",
            self.castle.levels.iter().map(|entry| entry.level),
        )?;

        let mut tier_ids = BTreeSet::new();
        for tier in &self.enemy_tiers {
            if !tier_ids.insert(tier.id.as_str()) {
                return Err(ConfigError::DuplicateId {
                    table: "enemy_tiers",
                    id: tier.id.to_string(),
                });
            }
            if self.word_bank.words(tier.word_length).is_empty() {
                return Err(ConfigError::EmptyWordList(tier.id.to_string()));
            }
        }

        let mut archetype_ids = BTreeSet::new();
        for archetype in &self.turret_archetypes {
            if !archetype_ids.insert(archetype.id.as_str()) {
                return Err(ConfigError::DuplicateId {
                    table: "turret_archetypes",
                    id: archetype.id.to_string(),
                });
            }
            check_contiguous(
                archetype.id.as_str(),
                archetype.levels.iter().map(|entry| entry.level),
            )?;
        }

        let mut slot_ids = BTreeSet::new();
        for slot in &self.turret_slots {
            if !slot_ids.insert(slot.id) {
                return Err(ConfigError::DuplicateId {
                    table: "turret_slots",
                    id: slot.id.to_string(),
                });
            }
            if slot.lane >= self.lanes.count {
                return Err(ConfigError::UnknownLane {
                    owner: slot.id.to_string(),
                    lane: slot.lane,
                    count: self.lanes.count,
                });
            }
        }

        for (wave, definition) in self.waves.iter().enumerate() {
            for entry in &definition.spawns {
                if self.tier(&entry.tier).is_none() {
                    return Err(ConfigError::UnknownTier {
                        wave,
                        tier: entry.tier.to_string(),
                    });
                }
                if let Some(lane) = entry.lane {
                    if lane >= self.lanes.count {
                        return Err(ConfigError::UnknownLane {
                            owner: format!("wave {wave}"),
                            lane,
                            count: self.lanes.count,
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

fn check_contiguous(owner: &str, levels: impl Iterator<Item = u32>) -> Result<(), ConfigError> {
    let mut sorted: Vec<u32> = levels.collect();
    sorted.sort_unstable();
    let contiguous = !sorted.is_empty()
        && sorted
            .iter()
            .enumerate()
            .all(|(position, level)| usize::try_from(*level).ok() == Some(position + 1));
    if contiguous {
        Ok(())
    } else {
        Err(ConfigError::NonContiguousLevels(owner.to_owned()))
    }
}

impl Default for LaneConfig {
    fn default() -> Self {
        Self {
            count: 3,
            length: 100.0,
        }
    }
}

impl Default for CastleConfig {
    fn default() -> Self {
        Self {
            levels: vec![
                castle_level(1, 0, 100.0, 0.0, 0.0, 0.0),
                castle_level(2, 150, 130.0, 1.0, 0.5, 5.0),
                castle_level(3, 300, 170.0, 2.0, 1.0, 10.0),
            ],
            repair: RepairConfig {
                cost: 40,
                heal_amount: 25.0,
                cooldown_seconds: 12.0,
            },
        }
    }
}

fn castle_level(
    level: u32,
    upgrade_cost: u32,
    max_health: f64,
    armor: f64,
    regen_per_second: f64,
    gold_bonus_percent: f64,
) -> CastleLevelConfig {
    CastleLevelConfig {
        level,
        upgrade_cost,
        max_health,
        armor,
        regen_per_second,
        gold_bonus_percent,
    }
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            combo_decay_seconds: 4.0,
            combo_warning_seconds: 1.5,
            word_damage_base: 30.0,
            word_damage_per_letter: 8.0,
            combo_damage_step: 0.1,
            combo_multiplier_cap: 2.0,
            perfect_word: PerfectWordBonus {
                min_length: 5,
                gold: 5,
            },
            recent_input_window: 20,
        }
    }
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|word| (*word).to_owned()).collect()
}

impl Default for WordBank {
    fn default() -> Self {
        Self {
            short: words(&[
                "ash", "bolt", "claw", "dusk", "fang", "gale", "hex", "iron", "jolt", "keen",
                "lore", "mist", "nova", "orb", "pyre", "quill", "rune", "sage", "tide", "urn",
                "vale", "wisp", "yew", "zeal",
            ]),
            medium: words(&[
                "valor", "arcane", "bastion", "cinder", "dagger", "eclipse", "fortune", "glacier",
                "harbor", "inferno", "jasper", "kindle", "lantern", "marble", "nimbus", "oracle",
                "phantom", "quarry", "rampart", "sentinel", "tempest", "umbra", "vortex",
                "warden", "zephyr",
            ]),
            long: words(&[
                "avalanche",
                "barricade",
                "cataclysm",
                "dreadnought",
                "everlasting",
                "fortification",
                "guardianship",
                "hinterland",
                "illumination",
                "juggernaut",
                "knighthood",
                "labyrinthine",
                "mountainside",
                "netherworld",
                "overwhelming",
                "quicksilver",
                "reinforcement",
                "stronghold",
                "thunderstorm",
                "underground",
                "vanguard",
                "watchtower",
            ]),
        }
    }
}

fn tier(
    id: &str,
    health: f64,
    speed: f64,
    damage: f64,
    reward: u32,
    shield: f64,
    word_length: WordLength,
) -> EnemyTierConfig {
    EnemyTierConfig {
        id: TierId::new(id),
        health,
        speed,
        damage,
        reward,
        shield,
        word_length,
    }
}

fn spawn(tier: &str, count: u32, at_seconds: f64, cadence_seconds: f64) -> SpawnEntryConfig {
    SpawnEntryConfig {
        tier: TierId::new(tier),
        count,
        at_seconds,
        cadence_seconds,
        lane: None,
        shield: None,
    }
}

fn wave(countdown_seconds: f64, reward_bonus: u32, spawns: Vec<SpawnEntryConfig>) -> WaveConfig {
    WaveConfig {
        countdown_seconds,
        reward_bonus,
        spawns,
    }
}

fn turret_level(
    level: u32,
    cost: u32,
    damage: f64,
    fire_rate: f64,
    range: f64,
    projectile_speed: f64,
) -> TurretLevelConfig {
    TurretLevelConfig {
        level,
        cost,
        damage,
        fire_rate,
        range,
        projectile_speed,
    }
}

fn slot(ordinal: u32, lane: u32, position: f64, unlock_wave: u32) -> TurretSlotConfig {
    TurretSlotConfig {
        id: SlotId::new(ordinal),
        lane,
        position,
        unlock_wave,
    }
}

fn band(
    id: &str,
    from_wave: u32,
    enemy_health_multiplier: f64,
    enemy_speed_multiplier: f64,
    reward_multiplier: f64,
) -> DifficultyBand {
    DifficultyBand {
        id: id.to_owned(),
        from_wave,
        enemy_health_multiplier,
        enemy_speed_multiplier,
        reward_multiplier,
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            starting_gold: 200,
            lanes: LaneConfig::default(),
            castle: CastleConfig::default(),
            enemy_tiers: vec![
                tier("grunt", 40.0, 7.0, 8.0, 8, 0.0, WordLength::Short),
                tier("runner", 25.0, 12.0, 5.0, 6, 0.0, WordLength::Short),
                tier("witch", 60.0, 6.0, 10.0, 12, 30.0, WordLength::Medium),
                tier("brute", 120.0, 4.5, 16.0, 16, 0.0, WordLength::Long),
            ],
            waves: vec![
                wave(5.0, 20, vec![spawn("grunt", 4, 0.0, 2.5)]),
                wave(6.0, 25, vec![spawn("grunt", 4, 0.0, 2.0), spawn("runner", 2, 3.0, 3.0)]),
                wave(6.0, 30, vec![spawn("grunt", 5, 0.0, 1.8), spawn("witch", 1, 6.0, 0.0)]),
                wave(
                    6.0,
                    35,
                    vec![spawn("runner", 4, 0.0, 1.5), spawn("witch", 2, 4.0, 4.0)],
                ),
                wave(
                    7.0,
                    40,
                    vec![
                        spawn("grunt", 6, 0.0, 1.5),
                        spawn("brute", 1, 5.0, 0.0),
                        spawn("runner", 3, 7.0, 1.2),
                    ],
                ),
                wave(
                    7.0,
                    45,
                    vec![spawn("witch", 3, 0.0, 3.0), spawn("brute", 2, 4.0, 5.0)],
                ),
                wave(
                    8.0,
                    55,
                    vec![
                        spawn("grunt", 8, 0.0, 1.2),
                        spawn("runner", 5, 2.0, 1.0),
                        spawn("witch", 2, 6.0, 3.0),
                    ],
                ),
                wave(
                    8.0,
                    70,
                    vec![
                        spawn("brute", 3, 0.0, 4.0),
                        spawn("witch", 3, 2.0, 3.0),
                        spawn("runner", 6, 5.0, 0.8),
                    ],
                ),
            ],
            turret_slots: vec![
                slot(1, 0, 30.0, 0),
                slot(2, 1, 30.0, 0),
                slot(3, 2, 30.0, 1),
                slot(4, 0, 60.0, 2),
                slot(5, 1, 60.0, 3),
                slot(6, 2, 60.0, 4),
            ],
            turret_archetypes: vec![
                TurretArchetypeConfig {
                    id: TurretTypeId::new("arrow"),
                    name: "Arrow Tower".to_owned(),
                    levels: vec![
                        turret_level(1, 50, 8.0, 1.2, 30.0, 60.0),
                        turret_level(2, 60, 12.0, 1.4, 32.0, 65.0),
                        turret_level(3, 90, 18.0, 1.6, 35.0, 70.0),
                    ],
                },
                TurretArchetypeConfig {
                    id: TurretTypeId::new("arcane"),
                    name: "Arcane Spire".to_owned(),
                    levels: vec![
                        turret_level(1, 80, 14.0, 0.8, 40.0, 50.0),
                        turret_level(2, 90, 20.0, 0.9, 42.0, 55.0),
                        turret_level(3, 120, 28.0, 1.0, 45.0, 60.0),
                    ],
                },
                TurretArchetypeConfig {
                    id: TurretTypeId::new("flame"),
                    name: "Flame Thrower".to_owned(),
                    levels: vec![
                        turret_level(1, 70, 5.0, 3.0, 20.0, 45.0),
                        turret_level(2, 80, 7.0, 3.4, 22.0, 50.0),
                        turret_level(3, 110, 10.0, 3.8, 24.0, 55.0),
                    ],
                },
            ],
            difficulty_bands: vec![
                band("calm", 0, 1.0, 1.0, 1.0),
                band("rising", 3, 1.2, 1.1, 1.1),
                band("siege", 6, 1.45, 1.2, 1.25),
            ],
            typing: TypingConfig::default(),
            word_bank: WordBank::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_configuration_is_valid() {
        GameConfig::default().validate().expect("defaults validate");
    }

    #[test]
    fn cost_between_sums_levels_above_current() {
        let config = GameConfig::default();
        let arrow = config
            .archetype(&TurretTypeId::new("arrow"))
            .expect("arrow archetype");
        assert_eq!(arrow.cost_between(0, 3), Some(200));
        assert_eq!(arrow.cost_between(1, 3), Some(150));
        assert_eq!(arrow.cost_between(2, 2), Some(0));
        assert_eq!(arrow.cost_between(0, 4), None);
    }

    #[test]
    fn wave_lookup_repeats_last_wave() {
        let config = GameConfig::default();
        let last = config.waves.last().expect("waves configured");
        assert_eq!(config.wave_for_index(99), Some(last));
    }

    #[test]
    fn combo_multiplier_is_capped() {
        let typing = TypingConfig::default();
        assert!((typing.combo_multiplier(0) - 1.0).abs() < f64::EPSILON);
        assert!((typing.combo_multiplier(5) - 1.5).abs() < 1e-9);
        assert!((typing.combo_multiplier(50) - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn toml_overrides_keep_remaining_defaults() {
        let config = GameConfig::from_toml_str("starting_gold = 15\n").expect("valid toml");
        assert_eq!(config.starting_gold, 15);
        assert_eq!(config.waves, GameConfig::default().waves);
    }

    #[test]
    fn unknown_tier_is_rejected() {
        let mut config = GameConfig::default();
        config.waves[0].spawns[0].tier = TierId::new("dragon");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnknownTier { wave: 0, .. })
        ));
    }

    #[test]
    fn gapped_turret_levels_are_rejected() {
        let mut config = GameConfig::default();
        let _ = config.turret_archetypes[0].levels.remove(1);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonContiguousLevels(_))
        ));
    }
}
