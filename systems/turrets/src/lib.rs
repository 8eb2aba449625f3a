#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system owning turret slots: unlocking, occupancy changes, target
//! selection, and firing cadence.
//!
//! Occupancy operations only check structural validity (the slot exists, the
//! archetype and level are configured). Gold and lock checks belong to the
//! economy layer that calls them.

use typing_defense_core::{
    ActionError, ActionResult, EnemyId, EnemyState, GameConfig, GameEvent, GameState,
    ProjectileRequest, SlotId, TargetingPriority, TurretArchetypeConfig, TurretLevelConfig,
    TurretState, TurretTypeId,
};

/// Turret system holding the archetype table.
#[derive(Clone, Debug)]
pub struct Turrets {
    archetypes: Vec<TurretArchetypeConfig>,
}

impl Turrets {
    /// Creates the system from the configured archetypes.
    #[must_use]
    pub fn new(config: &GameConfig) -> Self {
        Self {
            archetypes: config.turret_archetypes.clone(),
        }
    }

    /// Looks up an archetype.
    #[must_use]
    pub fn archetype(&self, id: &TurretTypeId) -> Option<&TurretArchetypeConfig> {
        self.archetypes.iter().find(|archetype| &archetype.id == id)
    }

    /// Statistics of a placed turret.
    #[must_use]
    pub fn stats(&self, turret: &TurretState) -> Option<&TurretLevelConfig> {
        self.archetype(&turret.type_id)?.level(turret.level)
    }

    /// Unlocks every slot whose unlock wave has been reached.
    pub fn unlock_slots_by_wave(
        &self,
        state: &mut GameState,
        wave_index: u32,
        out: &mut Vec<GameEvent>,
    ) {
        for slot in &mut state.turrets {
            if !slot.unlocked && slot.unlock_wave <= wave_index {
                slot.unlocked = true;
                log::debug!("{} unlocked at wave {wave_index}", slot.id);
                out.push(GameEvent::SlotUnlocked { slot: slot.id });
            }
        }
    }

    /// Places a level-1 turret of `type_id`, replacing any occupant.
    pub fn place(
        &self,
        state: &mut GameState,
        slot: SlotId,
        type_id: &TurretTypeId,
        out: &mut Vec<GameEvent>,
    ) -> ActionResult<()> {
        let _ = self
            .archetype(type_id)
            .and_then(|archetype| archetype.level(1))
            .ok_or(ActionError::InvalidTurret)?;
        let entry = state.slot_mut(slot).ok_or(ActionError::InvalidSlot)?;
        let turret = TurretState {
            type_id: type_id.clone(),
            level: 1,
        };
        entry.turret = Some(turret.clone());
        entry.cooldown_remaining = 0.0;
        out.push(GameEvent::TurretChanged {
            slot,
            turret: Some(turret),
        });
        Ok(())
    }

    /// Raises the occupant by one level and returns the new level.
    pub fn upgrade(
        &self,
        state: &mut GameState,
        slot: SlotId,
        out: &mut Vec<GameEvent>,
    ) -> ActionResult<u32> {
        let (type_id, level) = occupant(state, slot)?;
        let next = level + 1;
        let _ = self
            .archetype(&type_id)
            .ok_or(ActionError::InvalidTurret)?
            .level(next)
            .ok_or(ActionError::MaxLevel)?;
        self.set_level(state, slot, next, out)?;
        Ok(next)
    }

    /// Lowers the occupant by one level, clearing the slot when it was level 1.
    ///
    /// Returns the level that was removed.
    pub fn downgrade(
        &self,
        state: &mut GameState,
        slot: SlotId,
        out: &mut Vec<GameEvent>,
    ) -> ActionResult<u32> {
        let (_, level) = occupant(state, slot)?;
        if level <= 1 {
            let _ = self.clear(state, slot, out)?;
        } else {
            self.set_level(state, slot, level - 1, out)?;
        }
        Ok(level)
    }

    /// Removes the occupant, returning it.
    pub fn clear(
        &self,
        state: &mut GameState,
        slot: SlotId,
        out: &mut Vec<GameEvent>,
    ) -> ActionResult<Option<TurretState>> {
        let entry = state.slot_mut(slot).ok_or(ActionError::InvalidSlot)?;
        let removed = entry.turret.take();
        entry.cooldown_remaining = 0.0;
        if removed.is_some() {
            out.push(GameEvent::TurretChanged { slot, turret: None });
        }
        Ok(removed)
    }

    /// Changes the slot's target selection rule.
    pub fn set_targeting_priority(
        &self,
        state: &mut GameState,
        slot: SlotId,
        priority: TargetingPriority,
    ) -> ActionResult<()> {
        state.slot_mut(slot).ok_or(ActionError::InvalidSlot)?.targeting_priority = priority;
        Ok(())
    }

    /// Enables or disables firing from the slot.
    ///
    /// Projectiles already launched from the slot are not touched here; the
    /// caller is expected to purge them when disabling.
    pub fn set_firing_enabled(
        &self,
        state: &mut GameState,
        slot: SlotId,
        enabled: bool,
    ) -> ActionResult<()> {
        state.slot_mut(slot).ok_or(ActionError::InvalidSlot)?.firing_enabled = enabled;
        Ok(())
    }

    /// Ticks cooldowns and queues a projectile for every ready turret with a
    /// target in range.
    pub fn update(&self, state: &mut GameState, dt: f64, requests: &mut Vec<ProjectileRequest>) {
        let enemies = &state.enemies;
        for slot in &mut state.turrets {
            slot.cooldown_remaining = (slot.cooldown_remaining - dt).max(0.0);
            if !slot.unlocked || !slot.firing_enabled || slot.cooldown_remaining > 0.0 {
                continue;
            }
            let Some(stats) = slot.turret.as_ref().and_then(|turret| self.stats(turret)) else {
                continue;
            };

            let mut best: Option<Candidate> = None;
            for enemy in enemies.iter().filter(|enemy| enemy.is_alive()) {
                if enemy.lane != slot.lane || (enemy.distance - slot.position).abs() > stats.range {
                    continue;
                }
                let current = Candidate::from(enemy);
                match &mut best {
                    Some(existing) => {
                        if current.precedes(existing, slot.targeting_priority) {
                            *existing = current;
                        }
                    }
                    None => best = Some(current),
                }
            }

            if let Some(target) = best {
                slot.cooldown_remaining = stats.cooldown_seconds();
                requests.push(ProjectileRequest {
                    slot: slot.id,
                    target: target.enemy,
                    lane: slot.lane,
                    origin: slot.position,
                    speed: stats.projectile_speed,
                    damage: stats.damage,
                });
            }
        }
    }

    fn set_level(
        &self,
        state: &mut GameState,
        slot: SlotId,
        level: u32,
        out: &mut Vec<GameEvent>,
    ) -> ActionResult<()> {
        let entry = state.slot_mut(slot).ok_or(ActionError::InvalidSlot)?;
        let turret = entry.turret.as_mut().ok_or(ActionError::InvalidTurret)?;
        turret.level = level;
        let snapshot = turret.clone();
        out.push(GameEvent::TurretChanged {
            slot,
            turret: Some(snapshot),
        });
        Ok(())
    }
}

fn occupant(state: &GameState, slot: SlotId) -> ActionResult<(TurretTypeId, u32)> {
    let turret = state
        .slot(slot)
        .ok_or(ActionError::InvalidSlot)?
        .turret
        .as_ref()
        .ok_or(ActionError::InvalidTurret)?;
    Ok((turret.type_id.clone(), turret.level))
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    enemy: EnemyId,
    distance: f64,
    health: f64,
}

impl From<&EnemyState> for Candidate {
    fn from(enemy: &EnemyState) -> Self {
        Self {
            enemy: enemy.id,
            distance: enemy.distance,
            health: enemy.health.current,
        }
    }
}

impl Candidate {
    fn precedes(&self, other: &Self, priority: TargetingPriority) -> bool {
        match priority {
            TargetingPriority::Strongest if self.health != other.health => {
                return self.health > other.health;
            }
            TargetingPriority::Weakest if self.health != other.health => {
                return self.health < other.health;
            }
            _ => {}
        }

        if self.distance != other.distance {
            return self.distance < other.distance;
        }

        self.enemy < other.enemy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use typing_defense_core::{EnemyStatus, GameMode, TierId, Vital};

    fn setup() -> (Turrets, GameState) {
        let config = GameConfig::default();
        (
            Turrets::new(&config),
            GameState::new(&config, GameMode::Campaign),
        )
    }

    fn enemy(id: u32, lane: u32, distance: f64, health: f64) -> EnemyState {
        EnemyState {
            id: EnemyId::new(id),
            tier: TierId::new("grunt"),
            lane,
            distance,
            speed: 0.0,
            health: Vital {
                current: health,
                max: 100.0,
            },
            shield: Vital::default(),
            word: Some("ash".to_owned()),
            word_errors: 0,
            status: EnemyStatus::Alive,
            wave_index: 0,
            damage: 1.0,
            reward: 1,
            spawned_at: 0.0,
        }
    }

    fn arrow() -> TurretTypeId {
        TurretTypeId::new("arrow")
    }

    #[test]
    fn unlocking_follows_wave_index() {
        let (turrets, mut state) = setup();
        let mut out = Vec::new();

        turrets.unlock_slots_by_wave(&mut state, 2, &mut out);

        assert_eq!(
            out,
            vec![
                GameEvent::SlotUnlocked {
                    slot: SlotId::new(3)
                },
                GameEvent::SlotUnlocked {
                    slot: SlotId::new(4)
                },
            ]
        );
        out.clear();
        turrets.unlock_slots_by_wave(&mut state, 2, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn upgrade_stops_at_max_level_and_downgrade_clears_level_one() {
        let (turrets, mut state) = setup();
        let slot = SlotId::new(1);
        let mut out = Vec::new();
        turrets
            .place(&mut state, slot, &arrow(), &mut out)
            .expect("placement");
        assert_eq!(turrets.upgrade(&mut state, slot, &mut out), Ok(2));
        assert_eq!(turrets.upgrade(&mut state, slot, &mut out), Ok(3));
        assert_eq!(
            turrets.upgrade(&mut state, slot, &mut out),
            Err(ActionError::MaxLevel)
        );

        assert_eq!(turrets.downgrade(&mut state, slot, &mut out), Ok(3));
        assert_eq!(turrets.downgrade(&mut state, slot, &mut out), Ok(2));
        assert_eq!(turrets.downgrade(&mut state, slot, &mut out), Ok(1));
        assert_eq!(state.slot(slot).and_then(|entry| entry.turret.clone()), None);
        assert_eq!(
            turrets.downgrade(&mut state, slot, &mut out),
            Err(ActionError::InvalidTurret)
        );
    }

    #[test]
    fn unknown_archetype_or_slot_is_rejected() {
        let (turrets, mut state) = setup();
        let mut out = Vec::new();
        assert_eq!(
            turrets.place(&mut state, SlotId::new(1), &TurretTypeId::new("ballista"), &mut out),
            Err(ActionError::InvalidTurret)
        );
        assert_eq!(
            turrets.place(&mut state, SlotId::new(42), &arrow(), &mut out),
            Err(ActionError::InvalidSlot)
        );
        assert!(out.is_empty());
    }

    #[test]
    fn targeting_priorities_pick_expected_enemy() {
        let (turrets, mut state) = setup();
        let slot = SlotId::new(1);
        let mut out = Vec::new();
        turrets
            .place(&mut state, slot, &arrow(), &mut out)
            .expect("placement");
        state.enemies = vec![
            enemy(1, 0, 40.0, 50.0),
            enemy(2, 0, 20.0, 10.0),
            enemy(3, 0, 55.0, 90.0),
            enemy(4, 1, 25.0, 5.0),
            enemy(5, 0, 95.0, 1.0),
        ];

        for (priority, expected) in [
            (TargetingPriority::First, 2),
            (TargetingPriority::Strongest, 3),
            (TargetingPriority::Weakest, 2),
        ] {
            turrets
                .set_targeting_priority(&mut state, slot, priority)
                .expect("slot exists");
            if let Some(entry) = state.slot_mut(slot) {
                entry.cooldown_remaining = 0.0;
            }
            let mut requests = Vec::new();
            turrets.update(&mut state, 0.0, &mut requests);
            assert_eq!(requests.len(), 1, "{priority:?}");
            assert_eq!(requests[0].target, EnemyId::new(expected), "{priority:?}");
        }
    }

    #[test]
    fn cooldown_and_firing_toggle_gate_shots() {
        let (turrets, mut state) = setup();
        let slot = SlotId::new(1);
        let mut out = Vec::new();
        turrets
            .place(&mut state, slot, &arrow(), &mut out)
            .expect("placement");
        state.enemies = vec![enemy(1, 0, 40.0, 50.0)];
        let mut requests = Vec::new();

        turrets.update(&mut state, 0.1, &mut requests);
        turrets.update(&mut state, 0.1, &mut requests);
        assert_eq!(requests.len(), 1);

        turrets
            .set_firing_enabled(&mut state, slot, false)
            .expect("slot exists");
        turrets.update(&mut state, 5.0, &mut requests);
        assert_eq!(requests.len(), 1);

        turrets
            .set_firing_enabled(&mut state, slot, true)
            .expect("slot exists");
        turrets.update(&mut state, 0.0, &mut requests);
        assert_eq!(requests.len(), 2);
        assert!((requests[1].damage - 8.0).abs() < f64::EPSILON);
    }
}
