use std::{cell::RefCell, rc::Rc};

use typing_defense_core::{
    ActionError, ComboWarningOutcome, EnemyId, EnemyStatus, EventKind, GameConfig, GameEvent,
    GameMode, GameStatus, SlotId, SpawnEntryConfig, SpawnRequest, TelemetryRecorder, TierId,
    TurretTypeId, WaveConfig, WavePhase,
};
use typing_defense_engine::{EngineOptions, GameEngine};
use typing_defense_system_typing::InputStatus;

fn engine() -> GameEngine {
    GameEngine::new(EngineOptions::default()).expect("default config is valid")
}

fn engine_with(config: GameConfig) -> GameEngine {
    GameEngine::new(EngineOptions::new(config, 11)).expect("config is valid")
}

fn spawn_word(engine: &mut GameEngine, lane: u32, word: &str) -> EnemyId {
    engine
        .spawn_enemy(
            &SpawnRequest::new(TierId::new("grunt"), 0)
                .with_lane(lane)
                .with_word(word),
        )
        .expect("grunt spawns")
}

fn type_word(engine: &mut GameEngine, word: &str) -> InputStatus {
    word.chars()
        .map(|letter| engine.input_character(letter).status)
        .last()
        .unwrap_or(InputStatus::Ignored)
}

fn record<T: 'static>(
    engine: &mut GameEngine,
    kind: EventKind,
    map: impl Fn(&GameEvent) -> Option<T> + 'static,
) -> Rc<RefCell<Vec<T>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let _ = engine.subscribe(kind, move |event| {
        if let Some(value) = map(event) {
            sink.borrow_mut().push(value);
        }
    });
    seen
}

fn single_wave_config() -> GameConfig {
    GameConfig {
        waves: vec![WaveConfig {
            countdown_seconds: 0.5,
            reward_bonus: 10,
            spawns: vec![SpawnEntryConfig {
                tier: TierId::new("runner"),
                count: 1,
                at_seconds: 0.0,
                cadence_seconds: 0.0,
                lane: Some(0),
                shield: None,
            }],
        }],
        ..GameConfig::default()
    }
}

#[test]
fn typing_a_word_defeats_the_enemy_and_pays_gold() {
    let mut engine = engine();
    let deltas = record(&mut engine, EventKind::Gold, |event| match event {
        GameEvent::GoldChanged { delta, .. } => Some(*delta),
        _ => None,
    });
    let enemy = spawn_word(&mut engine, 0, "valor");

    let status = type_word(&mut engine, "valor");

    let state = engine.state();
    assert_eq!(status, InputStatus::Completed);
    assert_eq!(
        state.enemy(enemy).map(|enemy| enemy.status),
        Some(EnemyStatus::Defeated)
    );
    assert_eq!(state.typing.combo, 1);
    assert!(deltas.borrow().iter().any(|delta| *delta > 0));
    assert_eq!(state.typing.active_enemy, None);
}

#[test]
fn placing_without_enough_gold_leaves_slot_empty() {
    let mut engine = engine_with(GameConfig {
        starting_gold: 30,
        ..GameConfig::default()
    });

    let result = engine.place_turret(SlotId::new(1), &TurretTypeId::new("arrow"));

    assert_eq!(result, Err(ActionError::InsufficientGold));
    assert_eq!(
        result.map_err(ActionError::reason),
        Err("insufficient-gold")
    );
    let state = engine.state();
    assert!(state
        .slot(SlotId::new(1))
        .map_or(false, |slot| slot.turret.is_none()));
    assert_eq!(state.resources.gold, 30);
}

#[test]
fn wrong_key_counts_an_error_and_keeps_the_buffer() {
    let mut engine = engine();
    let _ = spawn_word(&mut engine, 1, "valor");
    assert_eq!(engine.input_character('v').status, InputStatus::Progress);
    let combo = engine.state().typing.combo;

    let outcome = engine.input_character('x');

    let typing = engine.state().typing;
    assert_eq!(outcome.status, InputStatus::Error);
    assert_eq!(outcome.expected, Some('a'));
    assert_eq!(outcome.buffer, "v");
    assert_eq!(typing.errors, 1);
    assert_eq!(typing.combo, combo);
}

#[test]
fn escaped_enemy_damages_castle_through_armor() {
    let mut engine = engine();
    let escapes = record(&mut engine, EventKind::EnemyEscaped, |event| match event {
        GameEvent::EnemyEscaped { enemy, .. } => Some(*enemy),
        _ => None,
    });
    let enemy = spawn_word(&mut engine, 2, "valor");

    while escapes.borrow().is_empty() {
        engine.update(0.1);
    }

    let state = engine.state();
    assert_eq!(escapes.borrow().as_slice(), &[enemy]);
    assert!((state.castle.health - 92.0).abs() < 1e-9);
    assert_eq!(state.analytics.breaches, 1);
}

/// Damage of the first breach by a lone grunt after `castle_upgrades` upgrades.
fn first_breach(castle_upgrades: u32, grunt_damage: f64) -> (f64, f64) {
    let mut config = GameConfig::default();
    config.enemy_tiers[0].damage = grunt_damage;
    let mut engine = engine_with(config);
    let _ = engine.grant_gold(1_000).expect("running game");
    for _ in 0..castle_upgrades {
        let _ = engine.upgrade_castle().expect("affordable castle upgrade");
    }
    let armor = engine.state().castle.armor;
    let damage = record(&mut engine, EventKind::CastleDamaged, |event| match event {
        GameEvent::CastleDamaged { amount, .. } => Some(*amount),
        _ => None,
    });
    let _ = spawn_word(&mut engine, 2, "valor");

    while damage.borrow().is_empty() {
        engine.update(0.1);
    }

    let first = damage.borrow()[0];
    (first, armor)
}

#[test]
fn armor_reduces_breach_damage() {
    let (damage, armor) = first_breach(1, 8.0);

    assert!((armor - 1.0).abs() < f64::EPSILON);
    assert!((damage - 7.0).abs() < 1e-9);
}

#[test]
fn breach_damage_never_drops_below_one() {
    let (damage, armor) = first_breach(2, 2.0);
    assert!((armor - 2.0).abs() < f64::EPSILON);
    assert!((damage - 1.0).abs() < 1e-9);

    let (damage, _) = first_breach(2, 0.5);
    assert!((damage - 1.0).abs() < 1e-9);
}

#[test]
fn clearing_the_last_wave_ends_in_victory() {
    let mut engine = engine_with(single_wave_config());
    let statuses = record(&mut engine, EventKind::StatusChanged, |event| match event {
        GameEvent::StatusChanged { status } => Some(*status),
        _ => None,
    });

    engine.update(1.0);
    let word = engine
        .state()
        .alive_enemies()
        .next()
        .and_then(|enemy| enemy.word.clone())
        .expect("runner spawned with a word");
    assert_eq!(engine.status(), GameStatus::Running);

    assert_eq!(type_word(&mut engine, &word), InputStatus::Completed);
    engine.update(0.1);

    assert_eq!(engine.status(), GameStatus::Victory);
    assert_eq!(statuses.borrow().as_slice(), &[GameStatus::Victory]);
    let analytics = engine.analytics_snapshot();
    assert_eq!(analytics.wave_history.len(), 1);
    assert_eq!(analytics.active_wave_index, None);

    let time = engine.state().time;
    engine.update(1.0);
    assert!((engine.state().time - time).abs() < f64::EPSILON);
    assert_eq!(
        engine.place_turret(SlotId::new(1), &TurretTypeId::new("arrow")),
        Err(ActionError::GameOver)
    );
}

#[test]
fn castle_falling_is_terminal() {
    let mut engine = engine();

    let health = engine.damage_castle(500.0).expect("running game");

    assert!(health.abs() < f64::EPSILON);
    assert_eq!(engine.status(), GameStatus::Defeat);
    assert_eq!(engine.input_character('a').status, InputStatus::Ignored);
    assert_eq!(engine.grant_gold(10), Err(ActionError::GameOver));
}

#[test]
fn practice_mode_loops_past_the_last_wave() {
    let mut engine = engine_with(single_wave_config());
    engine.set_mode(GameMode::Practice);
    let completed = record(&mut engine, EventKind::WaveCompleted, |event| match event {
        GameEvent::WaveCompleted { index, .. } => Some(*index),
        _ => None,
    });

    for _ in 0..20 {
        let before = completed.borrow().len();
        engine.update(0.5);
        if completed.borrow().len() > before {
            assert_eq!(engine.analytics_snapshot().active_wave_index, None);
        }
    }

    assert_eq!(engine.status(), GameStatus::Running);
    assert!(engine.state().wave.index >= 1);
    let history: Vec<u32> = engine
        .analytics_snapshot()
        .wave_history
        .iter()
        .map(|summary| summary.index)
        .collect();
    assert!(history.len() >= 2);
    assert_eq!(history, *completed.borrow());
    assert!(history.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn next_wave_slots_unlock_when_its_countdown_begins() {
    let mut engine = engine();
    let slot = SlotId::new(3);
    let unlocked = record(&mut engine, EventKind::SlotUnlocked, |event| match event {
        GameEvent::SlotUnlocked { slot } => Some(*slot),
        _ => None,
    });
    assert!(engine
        .state()
        .slot(slot)
        .map_or(false, |entry| !entry.unlocked));

    for _ in 0..1_000 {
        engine.update(0.1);
        if engine.state().wave.index == 1 {
            break;
        }
    }

    let wave = engine.state().wave;
    assert_eq!(wave.index, 1);
    assert_eq!(wave.phase, WavePhase::Countdown);
    assert_eq!(unlocked.borrow().as_slice(), &[slot]);
    let _ = engine.grant_gold(1_000).expect("running game");
    assert!(engine
        .place_turret(slot, &TurretTypeId::new("arrow"))
        .is_ok());
}

#[test]
fn disabling_a_turret_discards_its_projectiles() {
    let mut engine = engine();
    let slot = SlotId::new(1);
    let _ = engine
        .place_turret(slot, &TurretTypeId::new("arrow"))
        .expect("affordable");
    let _ = spawn_word(&mut engine, 0, "valor");

    for _ in 0..200 {
        engine.update(0.05);
        if !engine.state().projectiles.is_empty() {
            break;
        }
    }
    assert!(engine
        .state()
        .projectiles
        .iter()
        .any(|projectile| projectile.source_slot == slot));

    engine
        .set_turret_firing_enabled(slot, false)
        .expect("slot exists");

    assert!(engine
        .state()
        .projectiles
        .iter()
        .all(|projectile| projectile.source_slot != slot));
}

#[test]
fn every_combo_warning_closes_once() {
    let mut engine = engine();
    let telemetry = TelemetryRecorder::new();
    engine.set_telemetry_client(Some(Box::new(telemetry.clone())));
    let _ = spawn_word(&mut engine, 0, "ash");
    let _ = spawn_word(&mut engine, 1, "bolt");

    assert_eq!(type_word(&mut engine, "ash"), InputStatus::Completed);
    for _ in 0..5 {
        engine.update(0.5);
    }
    assert!(engine.analytics_snapshot().combo_warning.active.is_some());

    assert_eq!(type_word(&mut engine, "bolt"), InputStatus::Completed);
    for _ in 0..10 {
        engine.update(0.5);
    }

    let warning = engine.analytics_snapshot().combo_warning;
    let outcomes: Vec<_> = warning.history.iter().map(|entry| entry.outcome).collect();
    assert_eq!(
        outcomes,
        vec![ComboWarningOutcome::Recovered, ComboWarningOutcome::Expired]
    );
    assert_eq!(warning.count as usize, warning.history.len());
    assert!(warning.active.is_none());
    assert_eq!(engine.state().typing.combo, 0);
    assert_eq!(telemetry.count("typing.combo-warning"), 2);
}

#[test]
fn gold_ledger_matches_balance_after_every_action() {
    let mut engine = engine();
    let deltas = record(&mut engine, EventKind::Gold, |event| match event {
        GameEvent::GoldChanged { delta, .. } => Some(*delta),
        _ => None,
    });
    let arrow = TurretTypeId::new("arrow");
    let start = i64::from(engine.state().resources.gold);

    let check = |engine: &GameEngine| {
        let ledger: i64 = deltas.borrow().iter().sum();
        assert_eq!(i64::from(engine.state().resources.gold), start + ledger);
    };

    let _ = engine.place_turret(SlotId::new(1), &arrow);
    check(&engine);
    let _ = engine.upgrade_turret(SlotId::new(1));
    check(&engine);
    let _ = engine.upgrade_castle();
    check(&engine);
    let _ = engine.grant_gold(300);
    check(&engine);
    let _ = engine.upgrade_castle();
    check(&engine);
    let _ = engine.damage_castle(30.0);
    let _ = engine.repair_castle();
    check(&engine);
    let _ = engine.downgrade_turret(SlotId::new(1));
    check(&engine);
}
