#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Gold-gated economy: castle upgrades and repairs, and the turret purchases
//! that delegate slot mutation to the turret system.
//!
//! Every operation validates completely before gold moves. A delegated
//! mutation that fails after validation refunds the debit and reports
//! [`ActionError::ApplyFailed`].

use typing_defense_core::{
    ActionError, ActionResult, CastleConfig, EconomyReceipt, GameConfig, GameEvent, GameState,
    SlotId, TurretTypeId,
};
use typing_defense_system_turrets::Turrets;

/// Removes `amount` gold and reports the change. Zero amounts are silent.
pub fn debit(state: &mut GameState, amount: u32, out: &mut Vec<GameEvent>) -> ActionResult<u32> {
    let gold = state.resources.try_debit(amount)?;
    if amount > 0 {
        out.push(GameEvent::GoldChanged {
            gold,
            delta: -i64::from(amount),
        });
    }
    Ok(gold)
}

/// Adds `amount` gold and reports the change. Zero amounts are silent.
pub fn credit(state: &mut GameState, amount: u32, out: &mut Vec<GameEvent>) -> u32 {
    let before = state.resources.gold;
    let gold = state.resources.credit(amount);
    let delta = i64::from(gold) - i64::from(before);
    if delta != 0 {
        out.push(GameEvent::GoldChanged { gold, delta });
    }
    gold
}

/// Economy system holding the castle progression table.
#[derive(Clone, Debug)]
pub struct Upgrades {
    castle: CastleConfig,
}

impl Upgrades {
    /// Creates the system from the castle configuration.
    #[must_use]
    pub fn new(config: &GameConfig) -> Self {
        Self {
            castle: config.castle.clone(),
        }
    }

    /// Buys the next castle level.
    pub fn upgrade_castle(
        &self,
        state: &mut GameState,
        out: &mut Vec<GameEvent>,
    ) -> ActionResult<EconomyReceipt> {
        let current_level = state.castle.level;
        let current = self
            .castle
            .levels
            .iter()
            .find(|entry| entry.level == current_level)
            .copied();
        let next = self
            .castle
            .levels
            .iter()
            .find(|entry| entry.level == current_level + 1)
            .copied()
            .ok_or(ActionError::MaxLevel)?;

        let gold = debit(state, next.upgrade_cost, out)?;
        state.castle.apply_level(&next, current.as_ref());
        log::info!("castle upgraded to level {}", next.level);
        out.push(GameEvent::CastleUpgraded {
            level: next.level,
            cost: next.upgrade_cost,
        });
        Ok(EconomyReceipt {
            delta: -i64::from(next.upgrade_cost),
            gold,
        })
    }

    /// Restores castle health for gold, subject to a cooldown.
    pub fn repair_castle(
        &self,
        state: &mut GameState,
        out: &mut Vec<GameEvent>,
    ) -> ActionResult<EconomyReceipt> {
        let repair = self.castle.repair;
        if state.castle.repair_cooldown_remaining > 0.0 {
            return Err(ActionError::RepairCooldown);
        }
        if state.castle.health >= state.castle.max_health {
            return Err(ActionError::FullHealth);
        }

        let gold = debit(state, repair.cost, out)?;
        let castle = &mut state.castle;
        let amount = repair.heal_amount.min(castle.max_health - castle.health);
        castle.health += amount;
        castle.repair_cooldown_remaining = repair.cooldown_seconds;
        out.push(GameEvent::CastleRepaired {
            amount,
            health: castle.health,
            cost: repair.cost,
        });
        Ok(EconomyReceipt {
            delta: -i64::from(repair.cost),
            gold,
        })
    }

    /// Buys a level-1 turret for an empty, unlocked slot.
    pub fn place_turret(
        &self,
        state: &mut GameState,
        turrets: &Turrets,
        slot: SlotId,
        type_id: &TurretTypeId,
        out: &mut Vec<GameEvent>,
    ) -> ActionResult<EconomyReceipt> {
        let entry = state.slot(slot).ok_or(ActionError::InvalidSlot)?;
        if !entry.unlocked {
            return Err(ActionError::LockedSlot);
        }
        if entry.turret.is_some() {
            return Err(ActionError::InvalidTurret);
        }
        let cost = turrets
            .archetype(type_id)
            .and_then(|archetype| archetype.level(1))
            .ok_or(ActionError::InvalidTurret)?
            .cost;

        self.purchase(state, cost, out, |state, out| {
            turrets.place(state, slot, type_id, out)
        })
    }

    /// Buys the next level of the turret in `slot`.
    pub fn upgrade_turret(
        &self,
        state: &mut GameState,
        turrets: &Turrets,
        slot: SlotId,
        out: &mut Vec<GameEvent>,
    ) -> ActionResult<EconomyReceipt> {
        let entry = state.slot(slot).ok_or(ActionError::InvalidSlot)?;
        if !entry.unlocked {
            return Err(ActionError::LockedSlot);
        }
        let turret = entry.turret.as_ref().ok_or(ActionError::InvalidTurret)?;
        let cost = turrets
            .archetype(&turret.type_id)
            .ok_or(ActionError::InvalidTurret)?
            .level(turret.level + 1)
            .ok_or(ActionError::MaxLevel)?
            .cost;

        self.purchase(state, cost, out, |state, out| {
            turrets.upgrade(state, slot, out).map(|_| ())
        })
    }

    /// Removes one level from the turret in `slot` and refunds its cost.
    pub fn downgrade_turret(
        &self,
        state: &mut GameState,
        turrets: &Turrets,
        slot: SlotId,
        out: &mut Vec<GameEvent>,
    ) -> ActionResult<EconomyReceipt> {
        let turret = state
            .slot(slot)
            .ok_or(ActionError::InvalidSlot)?
            .turret
            .clone()
            .ok_or(ActionError::InvalidTurret)?;
        let refund = turrets
            .stats(&turret)
            .ok_or(ActionError::InvalidTurret)?
            .cost;

        let _ = turrets.downgrade(state, slot, out)?;
        let gold = credit(state, refund, out);
        Ok(EconomyReceipt {
            delta: i64::from(refund),
            gold,
        })
    }

    fn purchase<F>(
        &self,
        state: &mut GameState,
        cost: u32,
        out: &mut Vec<GameEvent>,
        apply: F,
    ) -> ActionResult<EconomyReceipt>
    where
        F: FnOnce(&mut GameState, &mut Vec<GameEvent>) -> ActionResult<()>,
    {
        let mut staged = Vec::new();
        let gold = debit(state, cost, &mut staged)?;
        if let Err(error) = apply(state, &mut staged) {
            log::warn!("validated purchase failed to apply: {error}");
            let _ = state.resources.credit(cost);
            return Err(ActionError::ApplyFailed);
        }
        out.append(&mut staged);
        Ok(EconomyReceipt {
            delta: -i64::from(cost),
            gold,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use typing_defense_core::GameMode;

    #[test]
    fn failed_purchase_refunds_and_drops_staged_events() {
        let config = GameConfig::default();
        let upgrades = Upgrades::new(&config);
        let mut state = GameState::new(&config, GameMode::Campaign);
        let mut out = Vec::new();

        let result = upgrades.purchase(&mut state, 50, &mut out, |_, staged| {
            staged.push(GameEvent::SlotUnlocked {
                slot: SlotId::new(9),
            });
            Err(ActionError::InvalidSlot)
        });

        assert_eq!(result, Err(ActionError::ApplyFailed));
        assert_eq!(state.resources.gold, config.starting_gold);
        assert!(out.is_empty());
    }
}
