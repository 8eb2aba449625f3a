#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Analytics aggregation: per-wave windows closed exactly once, the gold
//! ledger, combo-warning windows, defeat-effect counters, and records pushed by
//! the tutorial and drill layers.
//!
//! The system keeps no state of its own; everything lives in
//! [`GameState::analytics`] so snapshots capture it.

mod metrics;

pub use metrics::{average_reaction, damage_per_second, summarize, window_accuracy};

use typing_defense_core::{
    push_capped, ActiveComboWarning, ComboWarningEntry, ComboWarningOutcome, DamageSource,
    DefeatBurstEntry, DefeatBurstMode, EnemyId, GameEvent, GameState, GoldEvent,
    StarfieldAnalytics, TierId, TutorialAssistRecord, TutorialEventRecord, TutorialSkipRecord,
    TutorialSummary, TypingDrillSummary, WaveSummary, WaveWindow, COMBO_WARNING_HISTORY_LIMIT,
    DEFEAT_BURST_HISTORY_LIMIT, GOLD_EVENT_LIMIT, TYPING_DRILL_LIMIT, WAVE_HISTORY_LIMIT,
    WAVE_SUMMARY_LIMIT,
};

/// Analytics system.
#[derive(Debug, Default)]
pub struct Analytics;

impl Analytics {
    /// Creates a new analytics system.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Opens the measurement window for `index`.
    ///
    /// Returns `false` when a window is already open; the open window keeps
    /// accumulating until it is finalized.
    pub fn open_wave(&self, state: &mut GameState, index: u32) -> bool {
        if state.analytics.active_wave_index.is_some() {
            return false;
        }
        state.analytics.active_wave_index = Some(index);
        state.analytics.window = WaveWindow {
            index,
            started_at: state.time,
            inputs_at_start: state.typing.total_inputs,
            correct_at_start: state.typing.correct_inputs,
            max_combo: state.typing.combo,
            ..WaveWindow::default()
        };
        true
    }

    /// Closes the open window, appending its summary to both rings.
    ///
    /// Returns `None` when no window is open, so a wave can never be
    /// summarized twice.
    pub fn finalize_wave(&self, state: &mut GameState) -> Option<WaveSummary> {
        let _ = state.analytics.active_wave_index.take()?;
        let window = std::mem::take(&mut state.analytics.window);
        let summary = summarize(&window, state);

        let analytics = &mut state.analytics;
        push_capped(
            &mut analytics.wave_summaries,
            summary.clone(),
            WAVE_SUMMARY_LIMIT,
        );
        push_capped(
            &mut analytics.wave_history,
            summary.clone(),
            WAVE_HISTORY_LIMIT,
        );
        log::info!(
            "wave {} summarized: {} defeated, {} breaches",
            summary.index,
            summary.enemies_defeated,
            summary.breaches
        );
        Some(summary)
    }

    /// Folds a simulation event into the running totals and the open window.
    pub fn record_event(&self, state: &mut GameState, event: &GameEvent) {
        let time = state.time;
        let analytics = &mut state.analytics;
        let open = analytics.active_wave_index.is_some();
        let window = &mut analytics.window;

        match event {
            GameEvent::EnemyDamaged { amount, source, .. } => match source {
                DamageSource::Turret(_) => {
                    analytics.turret_damage += amount;
                    if open {
                        window.turret_damage += amount;
                    }
                }
                DamageSource::Typing => {
                    analytics.typing_damage += amount;
                    if open {
                        window.typing_damage += amount;
                    }
                }
                DamageSource::Scripted => {}
            },
            GameEvent::EnemyDefeated { .. } => {
                analytics.enemies_defeated += 1;
                if open {
                    window.enemies_defeated += 1;
                }
            }
            GameEvent::EnemyEscaped { .. } => {
                analytics.breaches += 1;
                if open {
                    window.breaches += 1;
                }
            }
            GameEvent::CastleRepaired { .. } => {
                analytics.castle_repairs += 1;
                if open {
                    window.repairs += 1;
                }
            }
            GameEvent::GoldChanged { gold, delta } => {
                push_capped(
                    &mut analytics.gold_events,
                    GoldEvent {
                        gold: *gold,
                        delta: *delta,
                        timestamp: time,
                    },
                    GOLD_EVENT_LIMIT,
                );
                if let Ok(earned) = u64::try_from(*delta) {
                    analytics.gold_earned += earned;
                    if open {
                        window.gold_earned += earned;
                    }
                }
            }
            GameEvent::WaveCompleted {
                index,
                reward_bonus,
            } if open && window.index == *index => {
                window.gold_bonus = *reward_bonus;
            }
            GameEvent::WordCompleted { perfect, combo, .. } if open => {
                window.words_completed += 1;
                if *perfect {
                    window.perfect_words += 1;
                }
                window.max_combo = window.max_combo.max(*combo);
            }
            GameEvent::TargetLocked {
                reaction_seconds, ..
            } if open => {
                window.reaction_total += reaction_seconds;
                window.reaction_count += 1;
            }
            _ => {}
        }
    }

    /// Reconciles the combo-warning window with the typing warning flag.
    ///
    /// Opens a window when the flag rises and closes the active one when it
    /// drops, classifying the closure by whether the combo survived. Returns
    /// the closed entry, if any.
    pub fn sync_combo_warning(&self, state: &mut GameState) -> Option<ComboWarningEntry> {
        let typing = &state.typing;
        let warning = &mut state.analytics.combo_warning;

        match (typing.combo_warning, warning.active) {
            (true, None) => {
                warning.active = Some(ActiveComboWarning {
                    started_at: state.time,
                    baseline_accuracy: typing.accuracy,
                    combo: typing.combo,
                });
                None
            }
            (false, Some(active)) => {
                warning.active = None;
                let outcome = if typing.combo == 0 {
                    ComboWarningOutcome::Expired
                } else {
                    ComboWarningOutcome::Recovered
                };
                let entry = ComboWarningEntry {
                    started_at: active.started_at,
                    ended_at: state.time,
                    duration: (state.time - active.started_at).max(0.0),
                    combo: active.combo,
                    baseline_accuracy: active.baseline_accuracy,
                    end_accuracy: typing.accuracy,
                    accuracy_delta: typing.accuracy - active.baseline_accuracy,
                    outcome,
                };
                warning.count += 1;
                push_capped(&mut warning.history, entry, COMBO_WARNING_HISTORY_LIMIT);
                Some(entry)
            }
            _ => None,
        }
    }

    /// Counts a defeat effect classification.
    pub fn record_defeat_burst(
        &self,
        state: &mut GameState,
        enemy: EnemyId,
        tier: TierId,
        mode: DefeatBurstMode,
    ) {
        let bursts = &mut state.analytics.defeat_bursts;
        match mode {
            DefeatBurstMode::Sprite => bursts.sprite += 1,
            DefeatBurstMode::Procedural => bursts.procedural += 1,
        }
        push_capped(
            &mut bursts.history,
            DefeatBurstEntry {
                enemy,
                tier,
                mode,
                time: state.time,
            },
            DEFEAT_BURST_HISTORY_LIMIT,
        );
    }

    /// Stores a tutorial step event.
    pub fn record_tutorial_event(&self, state: &mut GameState, step_id: &str, event: &str) {
        let record = TutorialEventRecord {
            step_id: step_id.to_owned(),
            event: event.to_owned(),
            time: state.time,
        };
        state.analytics.tutorial.events.push(record);
    }

    /// Stores a tutorial hint.
    pub fn record_tutorial_assist(&self, state: &mut GameState, step_id: &str, hint: &str) {
        let record = TutorialAssistRecord {
            step_id: step_id.to_owned(),
            hint: hint.to_owned(),
            time: state.time,
        };
        state.analytics.tutorial.assists.push(record);
    }

    /// Stores the final tutorial outcome, replacing an earlier one.
    pub fn record_tutorial_summary(&self, state: &mut GameState, summary: TutorialSummary) {
        state.analytics.tutorial.summary = Some(summary);
    }

    /// Stores a tutorial skip.
    pub fn record_tutorial_skip(&self, state: &mut GameState, step_id: &str) {
        let record = TutorialSkipRecord {
            step_id: step_id.to_owned(),
            time: state.time,
        };
        state.analytics.tutorial.skips.push(record);
    }

    /// Stores a typing drill result stamped with the current time.
    pub fn record_typing_drill(
        &self,
        state: &mut GameState,
        mut summary: TypingDrillSummary,
    ) -> TypingDrillSummary {
        summary.recorded_at = state.time;
        push_capped(
            &mut state.analytics.typing_drills,
            summary.clone(),
            TYPING_DRILL_LIMIT,
        );
        summary
    }

    /// Mirrors cosmetic starfield parameters; `None` clears them.
    pub fn set_starfield(&self, state: &mut GameState, starfield: Option<StarfieldAnalytics>) {
        state.analytics.starfield = starfield;
    }
}
