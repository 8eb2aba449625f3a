use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use typing_defense_core::{GameState, SlotId, TurretTypeId};
use typing_defense_engine::{EngineOptions, GameEngine};

#[test]
fn identical_seeds_and_inputs_replay_identically() {
    let first = replay(42);
    let second = replay(42);

    assert_eq!(first, second, "replay diverged");
    assert!(first.defeated > 0, "bot typist never defeated an enemy");
    assert_eq!(first.fingerprint(), second.fingerprint());
}

#[test]
fn reset_replays_the_original_run() {
    let mut engine = GameEngine::new(EngineOptions::default()).expect("default config");
    drive(&mut engine, 200);
    let before = snapshot_json(&engine);

    engine.reset();
    drive(&mut engine, 200);

    assert_eq!(snapshot_json(&engine), before);
}

#[derive(Debug, PartialEq)]
struct ReplayOutcome {
    analytics: String,
    defeated: u32,
    gold: u32,
    score: u64,
}

impl ReplayOutcome {
    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.analytics.hash(&mut hasher);
        self.gold.hash(&mut hasher);
        self.score.hash(&mut hasher);
        hasher.finish()
    }
}

fn replay(seed: u64) -> ReplayOutcome {
    let options = EngineOptions::new(Default::default(), seed);
    let mut engine = GameEngine::new(options).expect("default config");
    let _ = engine
        .place_turret(SlotId::new(1), &TurretTypeId::new("arrow"))
        .expect("affordable");

    drive(&mut engine, 900);

    let state = engine.state();
    ReplayOutcome {
        analytics: snapshot_json(&engine),
        defeated: state.analytics.enemies_defeated,
        gold: state.resources.gold,
        score: state.resources.score,
    }
}

fn drive(engine: &mut GameEngine, ticks: u32) {
    for tick in 0..ticks {
        engine.update(0.1);
        if tick % 47 == 0 {
            let _ = engine.input_character('q');
        } else if tick % 2 == 0 {
            if let Some(key) = next_key(&engine.state()) {
                let _ = engine.input_character(key);
            }
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
        .min_by(|left, right| left.distance.total_cmp(&right.distance))
        .and_then(|enemy| enemy.word.as_deref())
        .and_then(|word| word.chars().next())
}

fn snapshot_json(engine: &GameEngine) -> String {
    serde_json::to_string(&engine.analytics_snapshot()).expect("analytics serialize")
}
