#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Orchestrates the Typing Defense simulation.
//!
//! [`GameEngine`] owns the only [`GameState`] of a run and lends it to the
//! systems in a fixed order on every update. Systems describe what happened
//! with [`GameEvent`] values; the engine reacts to them (gold, castle damage,
//! typing release, analytics), then hands them to bus listeners and the
//! telemetry client. Readers only ever receive copies of the state.

mod blueprint;
mod difficulty;
mod metrics;

use std::collections::VecDeque;

use serde_json::json;
use typing_defense_core::{
    ActionError, ActionResult, AnalyticsState, ConfigError, DefeatBurstMode, DifficultyBand,
    EconomyReceipt, EnemyId, EnemyState, EventBus, EventKind, GameConfig, GameEvent, GameMode,
    GameState, GameStatus, Prng, SlotId, SpawnRequest, StarfieldAnalytics, SubscriptionId,
    TargetingPriority, TelemetryClient, TurretTypeId, TutorialSummary, TypingDrillSummary,
    WavePhase,
};
use typing_defense_system_analytics::Analytics;
use typing_defense_system_enemies::Enemies;
use typing_defense_system_projectiles::Projectiles;
use typing_defense_system_turrets::Turrets;
use typing_defense_system_typing::{InputOutcome, InputStatus, Typing};
use typing_defense_system_upgrades::{credit, debit, Upgrades};
use typing_defense_system_waves::{UpcomingSpawn, Waves};

pub use blueprint::{
    plan as plan_blueprint, BlueprintAction, BlueprintEntry, BlueprintPlan, BlueprintReport,
    BlueprintStep, TurretBlueprint,
};
pub use difficulty::{resolve_band, threat_rating};
pub use metrics::RuntimeMetrics;

/// Chooses the defeat effect style for an enemy.
pub type DefeatBurstResolver = Box<dyn Fn(&EnemyState) -> DefeatBurstMode>;

/// Parameters of a new engine.
#[derive(Clone, Debug)]
pub struct EngineOptions {
    /// Game rules and content.
    pub config: GameConfig,
    /// Seed of the engine's random stream.
    pub seed: u64,
    /// Mode the run starts in.
    pub mode: GameMode,
}

impl EngineOptions {
    /// Creates campaign options for `config` and `seed`.
    #[must_use]
    pub fn new(config: GameConfig, seed: u64) -> Self {
        Self {
            config,
            seed,
            mode: GameMode::Campaign,
        }
    }

    /// Starts the run in `mode`.
    #[must_use]
    pub fn with_mode(mut self, mode: GameMode) -> Self {
        self.mode = mode;
        self
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::new(GameConfig::default(), 0)
    }
}

/// Single owner of a simulation run.
pub struct GameEngine {
    config: GameConfig,
    bands: Vec<DifficultyBand>,
    seed: u64,
    state: GameState,
    rng: Prng,
    enemies: Enemies,
    projectiles: Projectiles,
    turrets: Turrets,
    typing: Typing,
    waves: Waves,
    upgrades: Upgrades,
    analytics: Analytics,
    bus: EventBus,
    telemetry: Option<Box<dyn TelemetryClient>>,
    defeat_burst_resolver: Option<DefeatBurstResolver>,
}

impl GameEngine {
    /// Validates the configuration and builds a fresh run.
    pub fn new(options: EngineOptions) -> Result<Self, ConfigError> {
        let EngineOptions { config, seed, mode } = options;
        config.validate()?;

        log::info!(
            "engine created with seed {seed} in {} mode",
            mode.as_str()
        );
        Ok(Self {
            bands: config.sorted_bands(),
            seed,
            state: GameState::new(&config, mode),
            rng: Prng::new(seed),
            enemies: Enemies::new(&config),
            projectiles: Projectiles::new(),
            turrets: Turrets::new(&config),
            typing: Typing::new(&config),
            waves: Waves::new(&config),
            upgrades: Upgrades::new(&config),
            analytics: Analytics::new(),
            bus: EventBus::new(),
            telemetry: None,
            defeat_burst_resolver: None,
            config,
        })
    }

    /// Advances the simulation by `dt` seconds.
    ///
    /// Does nothing once the run is over or when `dt` is not a positive,
    /// finite duration.
    pub fn update(&mut self, dt: f64) {
        if self.state.status.is_terminal() || !(dt > 0.0 && dt.is_finite()) {
            return;
        }
        self.state.time += dt;
        self.state.tick += 1;

        let mut events = Vec::new();
        let mut spawns = Vec::new();
        let reward_multiplier = self.current_difficulty_band().reward_multiplier;
        let previous_index = self.state.wave.index;
        self.waves.update(
            &mut self.state.wave,
            dt,
            reward_multiplier,
            &mut spawns,
            &mut events,
        );
        let wave_index = self.state.wave.index;
        if wave_index != previous_index {
            // Slots open with the countdown so the player can build before spawns.
            self.turrets
                .unlock_slots_by_wave(&mut self.state, wave_index, &mut events);
        }
        let wave_completed = events
            .iter()
            .any(|event| matches!(event, GameEvent::WaveCompleted { .. }));
        for request in &spawns {
            let band = resolve_band(&self.bands, request.wave_index);
            if let Err(error) =
                self.enemies
                    .spawn(&mut self.state, request, &band, &mut self.rng, &mut events)
            {
                log::warn!("scheduled spawn of {} rejected: {error}", request.tier);
            }
        }
        self.dispatch(events);

        let mut events = Vec::new();
        self.enemies.update(&mut self.state, dt, &mut events);
        self.projectiles
            .update(&mut self.state, &self.enemies, dt, &mut events);
        let mut requests = Vec::new();
        self.turrets.update(&mut self.state, dt, &mut requests);
        for request in &requests {
            let projectile = self.projectiles.fire(&mut self.state, request);
            events.push(GameEvent::TurretFired {
                slot: request.slot,
                enemy: request.target,
                projectile,
            });
        }
        self.dispatch(events);

        self.typing.decay_combo(&mut self.state, dt);
        self.sync_combo_warning();

        if wave_completed {
            self.finalize_wave();
        }

        let castle = &mut self.state.castle;
        castle.repair_cooldown_remaining = (castle.repair_cooldown_remaining - dt).max(0.0);
        if castle.health > 0.0 && castle.regen_per_second > 0.0 {
            castle.health = (castle.health + castle.regen_per_second * dt).min(castle.max_health);
        }

        self.check_terminal();
    }

    /// Restarts the run with the original seed, keeping the mode, listeners,
    /// telemetry client, and defeat effect resolver.
    pub fn reset(&mut self) {
        self.state = GameState::new(&self.config, self.state.mode);
        self.rng = Prng::new(self.seed);
        log::info!("engine reset");
    }

    /// Deep copy of the whole state.
    #[must_use]
    pub fn state(&self) -> GameState {
        self.state.clone()
    }

    /// Run status.
    #[must_use]
    pub fn status(&self) -> GameStatus {
        self.state.status
    }

    /// Configuration the engine was built with.
    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Seed of the engine's random stream.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Derived figures describing the current moment of the run.
    #[must_use]
    pub fn runtime_metrics(&self) -> RuntimeMetrics {
        let band = self.current_difficulty_band();
        let threat = self
            .waves
            .definition(self.state.wave.index)
            .map_or(0.0, |wave| threat_rating(&self.config, wave, &band));
        RuntimeMetrics::capture(&self.state, band.id, threat)
    }

    /// Deep copy of the analytics aggregate.
    #[must_use]
    pub fn analytics_snapshot(&self) -> AnalyticsState {
        self.state.analytics.clone()
    }

    /// Previews the next `limit` scheduled spawns.
    #[must_use]
    pub fn upcoming_spawns(&self, limit: usize) -> Vec<UpcomingSpawn> {
        self.waves
            .upcoming_spawns(&self.state.wave, limit)
            .collect()
    }

    /// Feeds one keystroke to the typing system.
    pub fn input_character(&mut self, character: char) -> InputOutcome {
        if self.state.status.is_terminal() {
            return InputOutcome {
                status: InputStatus::Ignored,
                enemy: self.state.typing.active_enemy,
                expected: None,
                received: character.to_ascii_lowercase(),
                buffer: self.state.typing.buffer.clone(),
            };
        }

        let mut events = Vec::new();
        let outcome = self.typing.input_character(
            &mut self.state,
            character,
            &self.enemies,
            &mut self.rng,
            &mut events,
        );
        self.dispatch(events);
        self.sync_combo_warning();
        outcome
    }

    /// Removes the last typed letter and returns the buffer.
    pub fn handle_backspace(&mut self) -> String {
        self.typing.handle_backspace(&mut self.state)
    }

    /// Clears the typing buffer without touching the combo.
    pub fn purge_typing_buffer(&mut self) {
        self.typing.purge_buffer(&mut self.state);
    }

    /// Removes an enemy's shield.
    pub fn strip_enemy_shield(&mut self, enemy: EnemyId) -> ActionResult<()> {
        self.perform(|engine, out| engine.enemies.strip_shield(&mut engine.state, enemy, out))
    }

    /// Spawns an enemy outside the wave schedule, scaled by the band of the
    /// request's wave.
    pub fn spawn_enemy(&mut self, request: &SpawnRequest) -> ActionResult<EnemyId> {
        let band = resolve_band(&self.bands, request.wave_index);
        self.perform(|engine, out| {
            engine
                .enemies
                .spawn(&mut engine.state, request, &band, &mut engine.rng, out)
        })
    }

    /// Removes `amount` castle health, bypassing armor, and returns the
    /// remaining health.
    pub fn damage_castle(&mut self, amount: f64) -> ActionResult<f64> {
        let health = self.perform(|engine, out| {
            if amount > 0.0 {
                engine.hurt_castle(amount, out);
            }
            Ok(engine.state.castle.health)
        })?;
        self.check_terminal();
        Ok(health)
    }

    /// Buys the next castle level.
    pub fn upgrade_castle(&mut self) -> ActionResult<EconomyReceipt> {
        self.perform(|engine, out| engine.upgrades.upgrade_castle(&mut engine.state, out))
    }

    /// Repairs the castle for gold.
    pub fn repair_castle(&mut self) -> ActionResult<EconomyReceipt> {
        self.perform(|engine, out| engine.upgrades.repair_castle(&mut engine.state, out))
    }

    /// Buys a level-1 turret for `slot`.
    pub fn place_turret(
        &mut self,
        slot: SlotId,
        type_id: &TurretTypeId,
    ) -> ActionResult<EconomyReceipt> {
        self.perform(|engine, out| {
            engine
                .upgrades
                .place_turret(&mut engine.state, &engine.turrets, slot, type_id, out)
        })
    }

    /// Buys the next level of the turret in `slot`.
    pub fn upgrade_turret(&mut self, slot: SlotId) -> ActionResult<EconomyReceipt> {
        self.perform(|engine, out| {
            engine
                .upgrades
                .upgrade_turret(&mut engine.state, &engine.turrets, slot, out)
        })
    }

    /// Sells one level of the turret in `slot`.
    pub fn downgrade_turret(&mut self, slot: SlotId) -> ActionResult<EconomyReceipt> {
        self.perform(|engine, out| {
            engine
                .upgrades
                .downgrade_turret(&mut engine.state, &engine.turrets, slot, out)
        })
    }

    /// Changes how the turret in `slot` picks targets.
    pub fn set_turret_targeting_priority(
        &mut self,
        slot: SlotId,
        priority: TargetingPriority,
    ) -> ActionResult<()> {
        self.ensure_running()?;
        self.turrets
            .set_targeting_priority(&mut self.state, slot, priority)
    }

    /// Enables or disables firing from `slot`.
    ///
    /// Disabling also discards the slot's projectiles still in flight.
    pub fn set_turret_firing_enabled(&mut self, slot: SlotId, enabled: bool) -> ActionResult<()> {
        self.ensure_running()?;
        self.turrets
            .set_firing_enabled(&mut self.state, slot, enabled)?;
        if !enabled {
            let purged = self.projectiles.purge_from_slot(&mut self.state, slot);
            log::debug!("{slot} disabled, {purged} projectiles discarded");
        }
        Ok(())
    }

    /// Reconfigures many slots as one priced transaction.
    ///
    /// The blueprint is validated and priced first; nothing changes when that
    /// fails. With `preview` set the validated report is returned without
    /// mutating anything. Otherwise omitted slots are cleared, every named slot
    /// is brought to its target, and the total is debited in one gold event.
    /// Should a validated step still fail, turrets and gold are restored and
    /// [`ActionError::ApplyFailed`] is returned.
    pub fn apply_turret_blueprint(
        &mut self,
        blueprint: &TurretBlueprint,
        preview: bool,
    ) -> ActionResult<BlueprintReport> {
        self.ensure_running()?;
        let plan = blueprint::plan(&self.state, &self.turrets, blueprint)?;
        let report = plan.report(&self.state, preview);
        if preview {
            return Ok(report);
        }
        self.commit_blueprint(&plan, report)
    }

    /// Adds gold from outside the simulation, such as a scripted lesson.
    pub fn grant_gold(&mut self, amount: u32) -> ActionResult<EconomyReceipt> {
        self.perform(|engine, out| {
            let before = engine.state.resources.gold;
            let gold = credit(&mut engine.state, amount, out);
            Ok(EconomyReceipt {
                delta: i64::from(gold) - i64::from(before),
                gold,
            })
        })
    }

    /// Switches between practice and campaign; practice loops the waves.
    pub fn set_mode(&mut self, mode: GameMode) {
        self.state.mode = mode;
        self.state.wave.loop_waves = mode == GameMode::Practice;
        log::info!("mode set to {}", mode.as_str());
        self.track("game.mode", json!({ "mode": mode.as_str() }));
    }

    /// Overrides wave looping independently of the mode.
    pub fn set_loop_waves(&mut self, enabled: bool) {
        self.state.wave.loop_waves = enabled;
    }

    /// Current mode.
    #[must_use]
    pub fn mode(&self) -> GameMode {
        self.state.mode
    }

    /// Difficulty band governing the current wave.
    #[must_use]
    pub fn current_difficulty_band(&self) -> DifficultyBand {
        resolve_band(&self.bands, self.state.wave.index)
    }

    /// Mirrors cosmetic starfield parameters into analytics.
    pub fn set_starfield_analytics(&mut self, starfield: Option<StarfieldAnalytics>) {
        self.analytics.set_starfield(&mut self.state, starfield);
    }

    /// Installs the classifier for defeat effects; `None` restores the
    /// procedural default.
    pub fn set_defeat_burst_mode_resolver(&mut self, resolver: Option<DefeatBurstResolver>) {
        self.defeat_burst_resolver = resolver;
    }

    /// Records a tutorial step event.
    pub fn record_tutorial_event(&mut self, step_id: &str, event: &str) {
        self.analytics
            .record_tutorial_event(&mut self.state, step_id, event);
        self.track(
            "tutorial.event",
            json!({ "step_id": step_id, "event": event, "time": self.state.time }),
        );
    }

    /// Records a tutorial hint shown to the player.
    pub fn record_tutorial_assist(&mut self, step_id: &str, hint: &str) {
        self.analytics
            .record_tutorial_assist(&mut self.state, step_id, hint);
        self.track(
            "tutorial.assist",
            json!({ "step_id": step_id, "hint": hint, "time": self.state.time }),
        );
    }

    /// Records the tutorial outcome.
    pub fn record_tutorial_summary(&mut self, summary: TutorialSummary) {
        self.track_serialized("tutorial.summary", &summary);
        self.analytics
            .record_tutorial_summary(&mut self.state, summary);
    }

    /// Records a skipped tutorial step.
    pub fn record_tutorial_skip(&mut self, step_id: &str) {
        self.analytics.record_tutorial_skip(&mut self.state, step_id);
        self.track(
            "tutorial.skip",
            json!({ "step_id": step_id, "time": self.state.time }),
        );
    }

    /// Records a typing drill result and announces it on the bus.
    pub fn record_typing_drill(&mut self, summary: TypingDrillSummary) -> TypingDrillSummary {
        let summary = self.analytics.record_typing_drill(&mut self.state, summary);
        self.dispatch(vec![GameEvent::TypingDrillRecorded {
            summary: summary.clone(),
        }]);
        summary
    }

    /// Registers a listener for one event topic.
    pub fn subscribe(
        &mut self,
        kind: EventKind,
        listener: impl FnMut(&GameEvent) + 'static,
    ) -> SubscriptionId {
        self.bus.subscribe(kind, listener)
    }

    /// Registers a listener for every event.
    pub fn subscribe_all(&mut self, listener: impl FnMut(&GameEvent) + 'static) -> SubscriptionId {
        self.bus.subscribe_all(listener)
    }

    /// Removes a listener; returns `false` for an unknown handle.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Attaches or detaches the telemetry transport.
    pub fn set_telemetry_client(&mut self, client: Option<Box<dyn TelemetryClient>>) {
        self.telemetry = client;
    }

    fn ensure_running(&self) -> ActionResult<()> {
        if self.state.status.is_terminal() {
            Err(ActionError::GameOver)
        } else {
            Ok(())
        }
    }

    fn perform<T>(
        &mut self,
        action: impl FnOnce(&mut Self, &mut Vec<GameEvent>) -> ActionResult<T>,
    ) -> ActionResult<T> {
        self.ensure_running()?;
        let mut events = Vec::new();
        let result = action(self, &mut events);
        self.dispatch(events);
        result
    }

    /// Handles `events` in order; follow-up events raised while reacting are
    /// handled right after their cause.
    fn dispatch(&mut self, events: Vec<GameEvent>) {
        let mut queue = VecDeque::from(events);
        let mut follow_up = Vec::new();
        while let Some(event) = queue.pop_front() {
            self.react(&event, &mut follow_up);
            self.analytics.record_event(&mut self.state, &event);
            self.report(&event);
            let _ = self.bus.publish(&event);
            while let Some(next) = follow_up.pop() {
                queue.push_front(next);
            }
        }
    }

    fn react(&mut self, event: &GameEvent, out: &mut Vec<GameEvent>) {
        match event {
            GameEvent::EnemyDefeated {
                enemy, tier, reward, ..
            } => {
                let bonus = 1.0 + self.state.castle.gold_bonus_percent / 100.0;
                let gold = (f64::from(*reward) * bonus).round().max(0.0) as u32;
                let _ = credit(&mut self.state, gold, out);
                let resources = &mut self.state.resources;
                resources.score = resources.score.saturating_add(u64::from(*reward) * 10);
                self.typing.release_enemy(&mut self.state, *enemy);

                let mode = match (&self.defeat_burst_resolver, self.state.enemy(*enemy)) {
                    (Some(resolve), Some(defeated)) => resolve(defeated),
                    _ => DefeatBurstMode::default(),
                };
                self.analytics
                    .record_defeat_burst(&mut self.state, *enemy, tier.clone(), mode);
                out.push(GameEvent::DefeatBurst {
                    enemy: *enemy,
                    tier: tier.clone(),
                    mode,
                });
            }
            GameEvent::EnemyEscaped { enemy, damage, .. } => {
                self.typing.release_enemy(&mut self.state, *enemy);
                let amount = (damage - self.state.castle.armor).max(1.0);
                self.hurt_castle(amount, out);
            }
            GameEvent::WordCompleted {
                length,
                perfect: true,
                ..
            } => {
                let bonus = self.config.typing.perfect_word;
                if *length >= bonus.min_length {
                    let _ = credit(&mut self.state, bonus.gold, out);
                }
            }
            GameEvent::WaveStarted { index } => {
                if !self.analytics.open_wave(&mut self.state, *index) {
                    log::warn!("wave {index} started while another window was open");
                }
            }
            GameEvent::WaveCompleted { reward_bonus, .. } => {
                let _ = credit(&mut self.state, *reward_bonus, out);
            }
            _ => {}
        }
    }

    fn report(&mut self, event: &GameEvent) {
        if self.telemetry.is_none() {
            return;
        }
        let payload = match event {
            GameEvent::GoldChanged { gold, delta } => json!({ "gold": gold, "delta": delta }),
            GameEvent::EnemyDefeated {
                tier,
                reward,
                wave_index,
                ..
            } => json!({ "tier": tier, "reward": reward, "wave_index": wave_index }),
            GameEvent::EnemyEscaped {
                tier, lane, damage, ..
            } => json!({ "tier": tier, "lane": lane, "damage": damage }),
            GameEvent::CastleRepaired {
                amount,
                health,
                cost,
            } => json!({ "amount": amount, "health": health, "cost": cost }),
            GameEvent::CastleUpgraded { level, cost } => json!({ "level": level, "cost": cost }),
            GameEvent::WaveSummaryRecorded { summary } => {
                return self.track_serialized(event.kind().as_str(), summary);
            }
            GameEvent::TypingDrillRecorded { summary } => {
                return self.track_serialized(event.kind().as_str(), summary);
            }
            GameEvent::StatusChanged { status } => json!({ "status": status }),
            _ => return,
        };
        self.track(event.kind().as_str(), payload);
    }

    fn track(&mut self, event: &str, payload: serde_json::Value) {
        if let Some(client) = self.telemetry.as_mut() {
            client.track(event, payload);
        }
    }

    fn track_serialized<T: serde::Serialize>(&mut self, event: &str, value: &T) {
        if self.telemetry.is_none() {
            return;
        }
        match serde_json::to_value(value) {
            Ok(payload) => self.track(event, payload),
            Err(error) => log::warn!("telemetry payload for {event} dropped: {error}"),
        }
    }

    fn hurt_castle(&mut self, amount: f64, out: &mut Vec<GameEvent>) {
        let castle = &mut self.state.castle;
        let applied = amount.min(castle.health).max(0.0);
        castle.health -= applied;
        out.push(GameEvent::CastleDamaged {
            amount: applied,
            health: castle.health,
        });
    }

    /// Commits a priced plan, restoring slots and resources if any step fails.
    fn commit_blueprint(
        &mut self,
        plan: &BlueprintPlan,
        report: BlueprintReport,
    ) -> ActionResult<BlueprintReport> {
        let slots = self.state.turrets.clone();
        let resources = self.state.resources;
        let mut events = Vec::new();
        let committed = blueprint::commit(plan, &mut self.state, &self.turrets, &mut events)
            .and_then(|()| debit(&mut self.state, plan.cost, &mut events));

        match committed {
            Ok(gold) => {
                log::info!(
                    "blueprint applied: {} changed, {} cleared, {} gold",
                    report.applied.len(),
                    report.cleared.len(),
                    plan.cost
                );
                self.dispatch(events);
                Ok(BlueprintReport { gold, ..report })
            }
            Err(error) => {
                self.state.turrets = slots;
                self.state.resources = resources;
                log::warn!("blueprint commit rolled back: {error}");
                Err(ActionError::ApplyFailed)
            }
        }
    }

    fn sync_combo_warning(&mut self) {
        if let Some(entry) = self.analytics.sync_combo_warning(&mut self.state) {
            self.track_serialized("typing.combo-warning", &entry);
        }
    }

    fn finalize_wave(&mut self) {
        if let Some(summary) = self.analytics.finalize_wave(&mut self.state) {
            self.dispatch(vec![GameEvent::WaveSummaryRecorded { summary }]);
        }
    }

    fn check_terminal(&mut self) {
        if self.state.status.is_terminal() {
            return;
        }
        let wave = &self.state.wave;
        let status = if self.state.castle.health <= 0.0 {
            GameStatus::Defeat
        } else if wave.phase == WavePhase::Completed
            && !wave.loop_waves
            && self.state.alive_enemies().next().is_none()
        {
            GameStatus::Victory
        } else {
            return;
        };

        self.state.status = status;
        log::info!("run ended in {status:?} at {:.1}s", self.state.time);
        self.dispatch(vec![GameEvent::StatusChanged { status }]);
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use super::*;

    #[test]
    fn failed_blueprint_commit_restores_slots_and_gold() {
        let mut engine = GameEngine::new(EngineOptions::default()).expect("default config");
        let gold_events = Rc::new(Cell::new(0));
        let counter = Rc::clone(&gold_events);
        let _ = engine.subscribe(EventKind::Gold, move |_| counter.set(counter.get() + 1));
        let blueprint = TurretBlueprint::new()
            .with_slot(
                SlotId::new(1),
                BlueprintEntry::new(TurretTypeId::new("arrow"), 2),
            )
            .with_slot(
                SlotId::new(2),
                BlueprintEntry::new(TurretTypeId::new("flame"), 1),
            );
        let plan = plan_blueprint(&engine.state, &engine.turrets, &blueprint).expect("affordable");
        let report = plan.report(&engine.state, false);

        // The plan goes stale: slot-1 still commits, slot-2 no longer exists.
        engine
            .state
            .turrets
            .retain(|slot| slot.id != SlotId::new(2));
        let slots = engine.state.turrets.clone();
        let resources = engine.state.resources;

        let result = engine.commit_blueprint(&plan, report);

        assert_eq!(result, Err(ActionError::ApplyFailed));
        assert_eq!(engine.state.turrets, slots);
        assert_eq!(engine.state.resources, resources);
        assert_eq!(gold_events.get(), 0);
    }
}
