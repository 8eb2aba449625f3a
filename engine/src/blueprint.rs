//! Bulk turret configuration: a pure planner that diffs a blueprint against the
//! current slots and prices the difference, and a commit step that replays a
//! validated plan.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use typing_defense_core::{
    ActionError, ActionResult, GameEvent, GameState, SlotId, TargetingPriority, TurretTypeId,
};
use typing_defense_system_turrets::Turrets;

/// Desired end-state of a set of turret slots.
///
/// Slots that are not listed are cleared when the blueprint is applied.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurretBlueprint {
    /// Target configuration keyed by slot.
    pub slots: BTreeMap<SlotId, BlueprintEntry>,
}

impl TurretBlueprint {
    /// Creates an empty blueprint, which clears every slot when applied.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the target for `slot`.
    #[must_use]
    pub fn with_slot(mut self, slot: SlotId, entry: BlueprintEntry) -> Self {
        let _ = self.slots.insert(slot, entry);
        self
    }
}

/// Target configuration of one slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlueprintEntry {
    /// Archetype to occupy the slot.
    pub type_id: TurretTypeId,
    /// Level to reach.
    #[serde(default = "first_level")]
    pub level: u32,
    /// Targeting priority; `first` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TargetingPriority>,
}

fn first_level() -> u32 {
    1
}

impl BlueprintEntry {
    /// Creates an entry for `type_id` at `level` with the default priority.
    #[must_use]
    pub fn new(type_id: TurretTypeId, level: u32) -> Self {
        Self {
            type_id,
            level,
            priority: None,
        }
    }

    /// Sets the targeting priority.
    #[must_use]
    pub fn with_priority(mut self, priority: TargetingPriority) -> Self {
        self.priority = Some(priority);
        self
    }
}

/// How a slot reaches its target configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlueprintAction {
    /// The slot already holds the requested turret.
    Keep,
    /// The slot holds the same archetype at a lower level.
    Upgrade {
        /// Current level.
        from: u32,
    },
    /// The slot is empty, holds another archetype, or must be downgraded.
    Replace,
}

/// One planned slot change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlueprintStep {
    /// Slot being configured.
    pub slot: SlotId,
    /// Archetype to end up with.
    pub type_id: TurretTypeId,
    /// Level to end up with.
    pub level: u32,
    /// Priority to end up with.
    pub priority: TargetingPriority,
    /// Turret mutation required.
    pub action: BlueprintAction,
    /// Gold charged for this slot.
    pub cost: u32,
}

impl BlueprintStep {
    fn is_unchanged(&self, state: &GameState) -> bool {
        self.action == BlueprintAction::Keep
            && state
                .slot(self.slot)
                .map_or(false, |slot| slot.targeting_priority == self.priority)
    }
}

/// Priced diff between a blueprint and the current slots.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BlueprintPlan {
    /// Per-slot changes for every slot named by the blueprint.
    pub steps: Vec<BlueprintStep>,
    /// Occupied slots the blueprint omits.
    pub clears: Vec<SlotId>,
    /// Slots the blueprint omits whose priority must return to `first`.
    pub resets: Vec<SlotId>,
    /// Total gold charged.
    pub cost: u32,
}

/// Outcome of planning or applying a blueprint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlueprintReport {
    /// Gold charged, or that would be charged in a preview.
    pub cost: u32,
    /// Slots whose turret or priority changes.
    pub applied: Vec<SlotId>,
    /// Occupied slots that are emptied.
    pub cleared: Vec<SlotId>,
    /// Slots that already match.
    pub unchanged: Vec<SlotId>,
    /// Whether the report describes a preview that changed nothing.
    pub preview: bool,
    /// Gold balance after the call.
    pub gold: u32,
}

impl BlueprintPlan {
    /// Partitions the plan's slots for reporting.
    #[must_use]
    pub fn report(&self, state: &GameState, preview: bool) -> BlueprintReport {
        let (unchanged, applied): (Vec<_>, Vec<_>) = self
            .steps
            .iter()
            .partition(|step| step.is_unchanged(state));
        // Reset-only slots change priority without being cleared.
        let resets = self
            .resets
            .iter()
            .filter(|slot| !self.clears.contains(slot))
            .copied();
        BlueprintReport {
            cost: self.cost,
            applied: applied
                .into_iter()
                .map(|step| step.slot)
                .chain(resets)
                .collect(),
            cleared: self.clears.clone(),
            unchanged: unchanged.into_iter().map(|step| step.slot).collect(),
            preview,
            gold: state.resources.gold,
        }
    }
}

/// Validates `blueprint` against the current state and prices it.
///
/// Nothing is mutated. Fails when a slot is unknown or locked, when an
/// archetype or level is not configured, or when the total exceeds the
/// current gold.
pub fn plan(
    state: &GameState,
    turrets: &Turrets,
    blueprint: &TurretBlueprint,
) -> ActionResult<BlueprintPlan> {
    let mut plan = BlueprintPlan::default();

    for (&slot_id, entry) in &blueprint.slots {
        let slot = state.slot(slot_id).ok_or(ActionError::InvalidSlot)?;
        if !slot.unlocked {
            return Err(ActionError::LockedSlot);
        }
        let archetype = turrets
            .archetype(&entry.type_id)
            .ok_or(ActionError::InvalidTurret)?;
        if entry.level == 0 || archetype.level(entry.level).is_none() {
            return Err(ActionError::InvalidTurret);
        }

        let (action, cost) = match &slot.turret {
            Some(current) if current.type_id == entry.type_id && current.level == entry.level => {
                (BlueprintAction::Keep, 0)
            }
            Some(current) if current.type_id == entry.type_id && current.level < entry.level => (
                BlueprintAction::Upgrade {
                    from: current.level,
                },
                archetype
                    .cost_between(current.level, entry.level)
                    .ok_or(ActionError::InvalidTurret)?,
            ),
            _ => (
                BlueprintAction::Replace,
                archetype
                    .cost_between(0, entry.level)
                    .ok_or(ActionError::InvalidTurret)?,
            ),
        };

        plan.cost = plan.cost.saturating_add(cost);
        plan.steps.push(BlueprintStep {
            slot: slot_id,
            type_id: entry.type_id.clone(),
            level: entry.level,
            priority: entry.priority.unwrap_or_default(),
            action,
            cost,
        });
    }

    for slot in &state.turrets {
        if blueprint.slots.contains_key(&slot.id) {
            continue;
        }
        if slot.turret.is_some() {
            plan.clears.push(slot.id);
        }
        if slot.targeting_priority != TargetingPriority::First {
            plan.resets.push(slot.id);
        }
    }

    if plan.cost > state.resources.gold {
        return Err(ActionError::InsufficientGold);
    }
    Ok(plan)
}

/// Replays the turret mutations of a validated plan. Gold is not touched.
///
/// On error the state may be partially mutated; the caller restores it.
pub(crate) fn commit(
    plan: &BlueprintPlan,
    state: &mut GameState,
    turrets: &Turrets,
    out: &mut Vec<GameEvent>,
) -> ActionResult<()> {
    for &slot in &plan.clears {
        let _ = turrets.clear(state, slot, out)?;
    }
    for &slot in &plan.resets {
        turrets.set_targeting_priority(state, slot, TargetingPriority::First)?;
    }

    for step in &plan.steps {
        let start = match step.action {
            BlueprintAction::Keep => step.level,
            BlueprintAction::Upgrade { from } => from,
            BlueprintAction::Replace => {
                turrets.place(state, step.slot, &step.type_id, out)?;
                1
            }
        };
        for _ in start..step.level {
            let _ = turrets.upgrade(state, step.slot, out)?;
        }
        turrets.set_targeting_priority(state, step.slot, step.priority)?;
    }
    Ok(())
}
