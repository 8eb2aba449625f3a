#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system translating keystrokes into typing progress, combo, and damage.

use serde::{Deserialize, Serialize};
use typing_defense_core::{
    push_capped, DamageSource, EnemyId, GameConfig, GameEvent, GameState, Prng, TypingConfig,
};
use typing_defense_system_enemies::{DamageOutcome, Enemies};

/// Classification of a keystroke.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputStatus {
    /// The key carries no meaning for typing, such as whitespace.
    Ignored,
    /// The key matched the next letter.
    Progress,
    /// The key finished a word.
    Completed,
    /// The key did not match.
    Error,
}

/// Feedback returned for every keystroke.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InputOutcome {
    /// Classification of the key.
    pub status: InputStatus,
    /// Enemy being typed, if any.
    pub enemy: Option<EnemyId>,
    /// Letter that was expected.
    pub expected: Option<char>,
    /// Letter that was received, lowercased.
    pub received: char,
    /// Buffer after the key was applied.
    pub buffer: String,
}

/// Typing system.
#[derive(Clone, Debug)]
pub struct Typing {
    config: TypingConfig,
}

impl Typing {
    /// Creates the system from the typing configuration.
    #[must_use]
    pub fn new(config: &GameConfig) -> Self {
        Self {
            config: config.typing,
        }
    }

    /// Applies a keystroke to the active word.
    ///
    /// The first letter of a word locks onto the closest alive enemy whose word
    /// starts with it. A wrong key counts as an error but leaves the buffer in
    /// place, so the player has to backspace or keep typing the right letter.
    pub fn input_character(
        &self,
        state: &mut GameState,
        character: char,
        enemies: &Enemies,
        rng: &mut Prng,
        out: &mut Vec<GameEvent>,
    ) -> InputOutcome {
        let received = character.to_ascii_lowercase();
        if received.is_whitespace() || received.is_control() {
            return outcome(state, InputStatus::Ignored, None, received);
        }

        if let Some(active) = state.typing.active_enemy {
            if state.enemy(active).map_or(true, |enemy| !enemy.is_alive()) {
                self.release_enemy(state, active);
            }
        }

        let Some(active) = state.typing.active_enemy else {
            return self.acquire_target(state, received, enemies, rng, out);
        };

        let expected = state
            .enemy(active)
            .and_then(|enemy| enemy.word.as_deref())
            .and_then(|word| word.chars().nth(state.typing.buffer.chars().count()));

        if expected != Some(received) {
            self.record_input(state, false);
            if let Some(enemy) = state.enemy_mut(active) {
                enemy.word_errors += 1;
            }
            return outcome(state, InputStatus::Error, expected, received);
        }

        self.record_input(state, true);
        state.typing.buffer.push(received);
        if self.word_finished(state, active) {
            self.complete_word(state, active, enemies, rng, out);
            return outcome(state, InputStatus::Completed, expected, received);
        }
        outcome(state, InputStatus::Progress, expected, received)
    }

    /// Removes the last typed letter; an emptied buffer releases the target.
    pub fn handle_backspace(&self, state: &mut GameState) -> String {
        let _ = state.typing.buffer.pop();
        if state.typing.buffer.is_empty() {
            state.typing.active_enemy = None;
        }
        state.typing.buffer.clone()
    }

    /// Clears the buffer and releases the target without touching the combo.
    pub fn purge_buffer(&self, state: &mut GameState) {
        state.typing.buffer.clear();
        state.typing.active_enemy = None;
    }

    /// Detaches `enemy` from typing when it leaves play.
    pub fn release_enemy(&self, state: &mut GameState, enemy: EnemyId) {
        if state.typing.active_enemy == Some(enemy) {
            log::debug!("typing target {} released", enemy.get());
            self.purge_buffer(state);
        }
    }

    /// Counts down the combo timer, raising the warning flag near expiry and
    /// dropping the combo when it runs out.
    pub fn decay_combo(&self, state: &mut GameState, dt: f64) {
        let typing = &mut state.typing;
        if typing.combo == 0 {
            typing.combo_timer = 0.0;
            typing.combo_warning = false;
            return;
        }

        typing.combo_timer = (typing.combo_timer - dt).max(0.0);
        if typing.combo_timer <= 0.0 {
            log::debug!("combo of {} expired", typing.combo);
            typing.combo = 0;
            typing.combo_warning = false;
        } else if typing.combo_timer <= self.config.combo_warning_seconds {
            typing.combo_warning = true;
        }
    }

    /// Damage multiplier applied at the current combo.
    #[must_use]
    pub fn combo_multiplier(&self, combo: u32) -> f64 {
        self.config.combo_multiplier(combo)
    }

    fn acquire_target(
        &self,
        state: &mut GameState,
        received: char,
        enemies: &Enemies,
        rng: &mut Prng,
        out: &mut Vec<GameEvent>,
    ) -> InputOutcome {
        let target = state
            .alive_enemies()
            .filter(|enemy| {
                enemy
                    .word
                    .as_deref()
                    .and_then(|word| word.chars().next())
                    == Some(received)
            })
            .min_by(|left, right| {
                left.distance
                    .total_cmp(&right.distance)
                    .then(left.id.cmp(&right.id))
            })
            .map(|enemy| (enemy.id, state.time - enemy.spawned_at));

        let Some((enemy, reaction_seconds)) = target else {
            self.record_input(state, false);
            return outcome(state, InputStatus::Error, None, received);
        };

        self.record_input(state, true);
        state.typing.active_enemy = Some(enemy);
        state.typing.buffer.clear();
        state.typing.buffer.push(received);
        out.push(GameEvent::TargetLocked {
            enemy,
            reaction_seconds,
        });

        if self.word_finished(state, enemy) {
            self.complete_word(state, enemy, enemies, rng, out);
            return outcome(state, InputStatus::Completed, Some(received), received);
        }
        outcome(state, InputStatus::Progress, Some(received), received)
    }

    fn word_finished(&self, state: &GameState, enemy: EnemyId) -> bool {
        state
            .enemy(enemy)
            .and_then(|enemy| enemy.word.as_deref())
            .map_or(false, |word| word == state.typing.buffer)
    }

    fn complete_word(
        &self,
        state: &mut GameState,
        enemy: EnemyId,
        enemies: &Enemies,
        rng: &mut Prng,
        out: &mut Vec<GameEvent>,
    ) {
        let length = u32::try_from(state.typing.buffer.chars().count()).unwrap_or(u32::MAX);
        let perfect = state
            .enemy(enemy)
            .map_or(true, |enemy| enemy.word_errors == 0);
        let multiplier = self.config.combo_multiplier(state.typing.combo);
        let damage = (self.config.word_damage_base
            + self.config.word_damage_per_letter * f64::from(length))
            * multiplier;

        let typing = &mut state.typing;
        typing.combo += 1;
        typing.best_combo = typing.best_combo.max(typing.combo);
        typing.combo_timer = self.config.combo_decay_seconds;
        typing.combo_warning = false;
        typing.words_completed += 1;
        if perfect {
            typing.perfect_words += 1;
        }

        let combo = typing.combo;
        self.purge_buffer(state);

        let points = (f64::from(length) * 5.0 * multiplier).round();
        state.resources.score = state.resources.score.saturating_add(points.max(0.0) as u64);

        out.push(GameEvent::WordCompleted {
            enemy,
            length,
            perfect,
            damage,
            combo,
        });
        let result = enemies.damage(state, enemy, damage, DamageSource::Typing, out);
        if let DamageOutcome::Damaged(_) = result {
            enemies.reassign_word(state, enemy, rng);
        }
    }

    fn record_input(&self, state: &mut GameState, correct: bool) {
        let typing = &mut state.typing;
        typing.total_inputs += 1;
        if correct {
            typing.correct_inputs += 1;
        } else {
            typing.errors += 1;
        }
        typing.accuracy = typing.correct_inputs as f64 / typing.total_inputs as f64;

        let window = self.config.recent_input_window.max(1);
        push_capped(&mut typing.recent_inputs, correct, window);
        let hits = typing.recent_inputs.iter().filter(|hit| **hit).count();
        let recent = hits as f64 / typing.recent_inputs.len() as f64;
        typing.dynamic_difficulty_bias = ((recent - 0.9) * 2.0).clamp(-1.0, 1.0);
    }
}

fn outcome(
    state: &GameState,
    status: InputStatus,
    expected: Option<char>,
    received: char,
) -> InputOutcome {
    InputOutcome {
        status,
        enemy: state.typing.active_enemy,
        expected,
        received,
        buffer: state.typing.buffer.clone(),
    }
}
