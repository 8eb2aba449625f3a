#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that advances in-flight projectiles and resolves their hits.

use std::mem;

use typing_defense_core::{
    DamageSource, GameEvent, GameState, ProjectileId, ProjectileRequest, ProjectileState, SlotId,
};
use typing_defense_system_enemies::Enemies;

/// Projectile system.
#[derive(Debug, Default)]
pub struct Projectiles {
    scratch: Vec<ProjectileState>,
}

impl Projectiles {
    /// Creates a new projectile system with an empty scratch buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Launches a projectile described by `request`.
    pub fn fire(&self, state: &mut GameState, request: &ProjectileRequest) -> ProjectileId {
        let id = ProjectileId::new(state.next_projectile_id);
        state.next_projectile_id += 1;
        state.projectiles.push(ProjectileState {
            id,
            source_slot: request.slot,
            target: request.target,
            lane: request.lane,
            position: request.origin,
            speed: request.speed,
            damage: request.damage,
        });
        id
    }

    /// Moves every projectile towards its target and applies damage on arrival.
    ///
    /// Projectiles whose target left play are discarded without effect.
    pub fn update(
        &mut self,
        state: &mut GameState,
        enemies: &Enemies,
        dt: f64,
        out: &mut Vec<GameEvent>,
    ) {
        self.scratch.clear();
        let in_flight = mem::take(&mut state.projectiles);

        for mut projectile in in_flight {
            let Some(target) = state
                .enemy(projectile.target)
                .filter(|enemy| enemy.is_alive())
                .map(|enemy| enemy.distance)
            else {
                continue;
            };

            let gap = target - projectile.position;
            let step = projectile.speed * dt;
            if gap.abs() <= step {
                let _ = enemies.damage(
                    state,
                    projectile.target,
                    projectile.damage,
                    DamageSource::Turret(projectile.source_slot),
                    out,
                );
                continue;
            }

            projectile.position += step.copysign(gap);
            self.scratch.push(projectile);
        }

        state.projectiles.append(&mut self.scratch);
    }

    /// Removes every projectile launched from `slot` and returns how many were dropped.
    pub fn purge_from_slot(&self, state: &mut GameState, slot: SlotId) -> usize {
        let before = state.projectiles.len();
        state
            .projectiles
            .retain(|projectile| projectile.source_slot != slot);
        let purged = before - state.projectiles.len();
        if purged > 0 {
            log::debug!("purged {purged} projectiles fired from {slot}");
        }
        purged
    }
}
