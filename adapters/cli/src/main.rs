#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs headless typing-defense simulations.

mod autoplay;
mod blueprint_transfer;

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use serde_json::json;
use typing_defense_core::{
    GameConfig, GameMode, GameStatus, SlotId, TargetingPriority, TurretTypeId,
};
use typing_defense_engine::{BlueprintEntry, EngineOptions, GameEngine, TurretBlueprint};

use crate::autoplay::BotTypist;

/// Top-level command line.
#[derive(Debug, Parser)]
#[command(name = "typing-defense", about = "Headless typing-defense simulator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Plays a session with a scripted typist and prints the analytics.
    Simulate(SimulateArgs),
    /// Works with shareable turret blueprint strings.
    #[command(subcommand)]
    Blueprint(BlueprintCommand),
}

#[derive(Debug, Args)]
struct SimulateArgs {
    /// Seed for the engine and the typist.
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// Simulated seconds to run before stopping.
    #[arg(long, default_value_t = 120.0)]
    seconds: f64,
    /// Length of a single update step in seconds.
    #[arg(long, default_value_t = 0.1)]
    tick: f64,
    /// Typing speed of the scripted typist.
    #[arg(long, default_value_t = 4.0)]
    chars_per_second: f64,
    /// Chance in [0, 1] that a keystroke is a random letter.
    #[arg(long, default_value_t = 0.05)]
    error_rate: f64,
    /// How the wave schedule is consumed.
    #[arg(long, value_enum, default_value_t = ModeArg::Campaign)]
    mode: ModeArg,
    /// TOML file overriding the default configuration.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Blueprint string applied before the first update.
    #[arg(long)]
    blueprint: Option<String>,
}

#[derive(Debug, Subcommand)]
enum BlueprintCommand {
    /// Builds a blueprint string from `slot-N=type:level[:priority]` entries.
    Encode {
        /// Slot assignment, repeatable.
        #[arg(long = "slot", value_parser = parse_slot_arg, required = true)]
        slots: Vec<SlotArg>,
    },
    /// Prints the JSON document behind a blueprint string.
    Decode {
        /// Encoded blueprint.
        value: String,
    },
    /// Prices a blueprint against a fresh game without applying it.
    Preview {
        /// Encoded blueprint.
        value: String,
        /// TOML file overriding the default configuration.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Practice,
    Campaign,
}

impl From<ModeArg> for GameMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Practice => Self::Practice,
            ModeArg::Campaign => Self::Campaign,
        }
    }
}

/// One `--slot` argument.
#[derive(Clone, Debug, PartialEq, Eq)]
struct SlotArg {
    slot: SlotId,
    entry: BlueprintEntry,
}

fn parse_slot_arg(value: &str) -> Result<SlotArg, String> {
    let (slot, turret) = value
        .split_once('=')
        .ok_or_else(|| format!("expected slot-N=type:level, got '{value}'"))?;
    let slot: SlotId = slot.parse().map_err(|error| format!("{error}"))?;

    let mut fields = turret.split(':');
    let type_id = fields
        .next()
        .filter(|type_id| !type_id.is_empty())
        .ok_or_else(|| format!("missing turret type in '{value}'"))?;
    let level = match fields.next() {
        Some(level) => level
            .parse::<u32>()
            .map_err(|_| format!("invalid level '{level}'"))?,
        None => 1,
    };
    let mut entry = BlueprintEntry::new(TurretTypeId::new(type_id), level);
    if let Some(priority) = fields.next() {
        entry = entry.with_priority(parse_priority(priority)?);
    }
    if fields.next().is_some() {
        return Err(format!("too many fields in '{value}'"));
    }
    Ok(SlotArg { slot, entry })
}

fn parse_priority(value: &str) -> Result<TargetingPriority, String> {
    match value {
        "first" => Ok(TargetingPriority::First),
        "strongest" => Ok(TargetingPriority::Strongest),
        "weakest" => Ok(TargetingPriority::Weakest),
        other => Err(format!("unknown targeting priority '{other}'")),
    }
}

/// Entry point for the typing-defense command-line interface.
fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    match Cli::parse().command {
        Command::Simulate(args) => simulate(&args),
        Command::Blueprint(BlueprintCommand::Encode { slots }) => {
            let blueprint = slots
                .into_iter()
                .fold(TurretBlueprint::new(), |blueprint, arg| {
                    blueprint.with_slot(arg.slot, arg.entry)
                });
            println!("{}", blueprint_transfer::encode(&blueprint)?);
            Ok(())
        }
        Command::Blueprint(BlueprintCommand::Decode { value }) => {
            let blueprint = blueprint_transfer::decode(&value)?;
            println!("{}", serde_json::to_string_pretty(&blueprint)?);
            Ok(())
        }
        Command::Blueprint(BlueprintCommand::Preview { value, config }) => {
            let blueprint = blueprint_transfer::decode(&value)?;
            let options = EngineOptions::new(load_config(config.as_deref())?, 0);
            let mut engine = GameEngine::new(options).context("configuration rejected")?;
            let report = engine
                .apply_turret_blueprint(&blueprint, true)
                .map_err(|error| anyhow!("blueprint rejected ({}): {error}", error.reason()))?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
    }
}

fn simulate(args: &SimulateArgs) -> Result<()> {
    if !(args.tick.is_finite() && args.tick > 0.0) {
        bail!("--tick must be a positive number of seconds");
    }
    let config = load_config(args.config.as_deref())?;
    let options = EngineOptions::new(config, args.seed).with_mode(args.mode.into());
    let mut engine = GameEngine::new(options).context("configuration rejected")?;

    if let Some(encoded) = &args.blueprint {
        let blueprint = blueprint_transfer::decode(encoded)?;
        let report = engine
            .apply_turret_blueprint(&blueprint, false)
            .map_err(|error| anyhow!("blueprint rejected ({}): {error}", error.reason()))?;
        log::info!("blueprint applied for {} gold", report.cost);
    }

    let mut bot = BotTypist::new(args.seed, args.chars_per_second, args.error_rate);
    let mut elapsed = 0.0;
    while elapsed < args.seconds && engine.status() == GameStatus::Running {
        engine.update(args.tick);
        bot.type_for(&mut engine, args.tick);
        elapsed += args.tick;
    }
    log::info!("simulation stopped after {elapsed:.1}s with {:?}", engine.status());

    let report = json!({
        "seed": engine.seed(),
        "keys": bot.keys(),
        "metrics": engine.runtime_metrics(),
        "analytics": engine.analytics_snapshot(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<GameConfig> {
    match path {
        Some(path) => GameConfig::from_toml_path(path)
            .with_context(|| format!("failed to load {}", path.display())),
        None => Ok(GameConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_arg_reads_type_level_and_priority() {
        let arg = parse_slot_arg("slot-2=arrow:3:weakest").expect("valid slot argument");

        assert_eq!(arg.slot, SlotId::new(2));
        assert_eq!(
            arg.entry,
            BlueprintEntry::new(TurretTypeId::new("arrow"), 3)
                .with_priority(TargetingPriority::Weakest)
        );
    }

    #[test]
    fn slot_arg_defaults_to_first_level() {
        let arg = parse_slot_arg("slot-1=flame").expect("valid slot argument");

        assert_eq!(arg.entry, BlueprintEntry::new(TurretTypeId::new("flame"), 1));
    }

    #[test]
    fn slot_arg_rejects_malformed_input() {
        assert!(parse_slot_arg("arrow:1").is_err());
        assert!(parse_slot_arg("tower-1=arrow").is_err());
        assert!(parse_slot_arg("slot-1=arrow:high").is_err());
        assert!(parse_slot_arg("slot-1=arrow:1:nearest").is_err());
        assert!(parse_slot_arg("slot-1=").is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
