use typing_defense_core::{GameState, WaveSummary, WaveWindow};

/// Damage per second over `duration`; zero for an empty window.
#[must_use]
pub fn damage_per_second(damage: f64, duration: f64) -> f64 {
    if duration > 0.0 {
        damage / duration
    } else {
        0.0
    }
}

/// Keystroke accuracy since the window opened.
///
/// A window without keystrokes reports the lifetime accuracy instead of a
/// misleading zero.
#[must_use]
pub fn window_accuracy(window: &WaveWindow, state: &GameState) -> f64 {
    let inputs = state
        .typing
        .total_inputs
        .saturating_sub(window.inputs_at_start);
    if inputs == 0 {
        return state.typing.accuracy;
    }
    let correct = state
        .typing
        .correct_inputs
        .saturating_sub(window.correct_at_start);
    correct as f64 / inputs as f64
}

/// Mean seconds between an enemy spawning and the typist locking onto it.
#[must_use]
pub fn average_reaction(window: &WaveWindow) -> f64 {
    if window.reaction_count == 0 {
        0.0
    } else {
        window.reaction_total / f64::from(window.reaction_count)
    }
}

/// Closes `window` into an immutable summary at the current simulated time.
#[must_use]
pub fn summarize(window: &WaveWindow, state: &GameState) -> WaveSummary {
    let duration = (state.time - window.started_at).max(0.0);
    let turret_dps = damage_per_second(window.turret_damage, duration);
    let typing_dps = damage_per_second(window.typing_damage, duration);

    WaveSummary {
        index: window.index,
        mode: state.mode,
        duration,
        accuracy: window_accuracy(window, state),
        enemies_defeated: window.enemies_defeated,
        breaches: window.breaches,
        perfect_words: window.perfect_words,
        words_completed: window.words_completed,
        turret_dps,
        typing_dps,
        total_dps: turret_dps + typing_dps,
        turret_damage: window.turret_damage,
        typing_damage: window.typing_damage,
        gold_earned: window.gold_earned,
        gold_bonus: window.gold_bonus,
        max_combo: window.max_combo.max(state.typing.combo),
        combo_at_end: state.typing.combo,
        repairs: window.repairs,
        average_reaction: average_reaction(window),
        completed_at: state.time,
    }
}
