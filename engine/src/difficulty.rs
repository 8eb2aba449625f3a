//! Difficulty band resolution and the observational threat rating of a wave.

use typing_defense_core::{DifficultyBand, GameConfig, WaveConfig};

/// Resolves the band active at `wave_index`.
///
/// `sorted` must be ordered ascending by `from_wave`; the last band whose
/// start has been reached wins. Waves before the first band fall back to the
/// neutral baseline.
#[must_use]
pub fn resolve_band(sorted: &[DifficultyBand], wave_index: u32) -> DifficultyBand {
    sorted
        .iter()
        .take_while(|band| band.from_wave <= wave_index)
        .last()
        .cloned()
        .unwrap_or_default()
}

/// Scores how dangerous `wave` is under `band`.
///
/// Every spawn entry contributes its tier's health, damage, speed, and shield
/// scores multiplied by the entry count; the completion bonus adds a reward
/// term. Entries referencing unknown tiers contribute nothing.
#[must_use]
pub fn threat_rating(config: &GameConfig, wave: &WaveConfig, band: &DifficultyBand) -> f64 {
    let spawns: f64 = wave
        .spawns
        .iter()
        .filter_map(|entry| {
            let tier = config.tier(&entry.tier)?;
            let shield = entry.shield.unwrap_or(tier.shield);
            let health_score = tier.health * band.enemy_health_multiplier / 10.0;
            let damage_score = tier.damage;
            let speed_score = tier.speed * band.enemy_speed_multiplier / 2.0;
            let shield_score = shield * band.enemy_health_multiplier / 10.0;
            Some((health_score + damage_score + speed_score + shield_score) * f64::from(entry.count))
        })
        .sum();

    spawns + f64::from(wave.reward_bonus) * band.reward_multiplier / 20.0
}
