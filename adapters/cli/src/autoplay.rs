//! Scripted typist used by the `simulate` command.

use rand::Rng;
use rand_chacha::{rand_core::SeedableRng, ChaCha8Rng};
use typing_defense_core::GameState;
use typing_defense_engine::GameEngine;

/// Types at a fixed rate, aiming at the active word or the closest enemy.
#[derive(Debug)]
pub(crate) struct BotTypist {
    rng: ChaCha8Rng,
    chars_per_second: f64,
    error_rate: f64,
    budget: f64,
    keys: u64,
}

impl BotTypist {
    pub(crate) fn new(seed: u64, chars_per_second: f64, error_rate: f64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            chars_per_second: chars_per_second.max(0.0),
            error_rate: error_rate.clamp(0.0, 1.0),
            budget: 0.0,
            keys: 0,
        }
    }

    /// Number of keys sent so far.
    pub(crate) fn keys(&self) -> u64 {
        self.keys
    }

    /// Spends the keystrokes earned during `dt` seconds.
    pub(crate) fn type_for(&mut self, engine: &mut GameEngine, dt: f64) {
        self.budget += self.chars_per_second * dt;
        while self.budget >= 1.0 {
            self.budget -= 1.0;
            let Some(target) = next_key(&engine.state()) else {
                self.budget = self.budget.min(1.0);
                return;
            };
            let key = if self.rng.gen_bool(self.error_rate) {
                self.rng.gen_range(b'a'..=b'z') as char
            } else {
                target
            };
            let outcome = engine.input_character(key);
            self.keys += 1;
            log::trace!("bot typed {key:?}: {:?}", outcome.status);
        }
    }
}

fn next_key(state: &GameState) -> Option<char> {
    if let Some(active) = state.typing.active_enemy {
        let word = state.enemy(active)?.word.as_deref()?;
        return word.chars().nth(state.typing.buffer.chars().count());
    }
    state
        .alive_enemies()
        .filter(|enemy| enemy.word.is_some())
        .min_by(|left, right| left.distance.total_cmp(&right.distance))
        .and_then(|enemy| enemy.word.as_deref())
        .and_then(|word| word.chars().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use typing_defense_core::{SpawnRequest, TierId};
    use typing_defense_engine::EngineOptions;

    fn engine_with_word(word: &str) -> GameEngine {
        let mut engine = GameEngine::new(EngineOptions::default()).expect("default config");
        let _ = engine
            .spawn_enemy(
                &SpawnRequest::new(TierId::new("grunt"), 0)
                    .with_lane(0)
                    .with_word(word),
            )
            .expect("grunt spawns");
        engine
    }

    #[test]
    fn accurate_bot_finishes_the_word() {
        let mut engine = engine_with_word("valor");
        let mut bot = BotTypist::new(3, 10.0, 0.0);

        bot.type_for(&mut engine, 0.5);

        let state = engine.state();
        assert_eq!(bot.keys(), 5);
        assert_eq!(state.analytics.enemies_defeated, 1);
        assert_eq!(state.typing.errors, 0);
    }

    #[test]
    fn idle_bot_does_not_bank_keystrokes() {
        let mut engine = GameEngine::new(EngineOptions::default()).expect("default config");
        let mut bot = BotTypist::new(3, 10.0, 0.0);

        bot.type_for(&mut engine, 5.0);

        assert_eq!(bot.keys(), 0);
        assert!(bot.budget <= 1.0);
    }
}
