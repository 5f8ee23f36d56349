//! Headless Battle Runner
//!
//! Runs a scenario from start to finish and prints a JSON summary.

use std::path::PathBuf;

use arena_combat::battle::ai::{DecisionEngine, DecisionWorker, PredictionScorer};
use arena_combat::battle::{
    BattleEvent, Battlefield, EventListener, FrameClock, RoundController, Scenario,
};
use arena_combat::core::{EngineConfig, Result};
use clap::Parser;
use serde::Serialize;

/// Headless Battle Runner - play an arena scenario to the end
#[derive(Parser, Debug)]
#[command(name = "battle_runner")]
#[command(about = "Run an arena scenario and output the result as JSON")]
struct Args {
    /// Scenario file
    #[arg(long, default_value = "data/scenarios/skirmish.toml")]
    scenario: PathBuf,

    /// Engine config file; defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed for deterministic runs (overrides the config)
    #[arg(long)]
    seed: Option<u64>,

    /// Round cap (overrides the config)
    #[arg(long)]
    round_cap: Option<u32>,

    /// Route AI decisions through the background worker task
    #[arg(long)]
    worker: bool,

    /// Play animation windows in wall-clock time
    #[arg(long)]
    realtime: bool,

    /// Print every dispatched event to stderr
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// JSON output structure
#[derive(Serialize)]
struct RunSummary {
    scenario: String,
    outcome: String,
    winner: Option<String>,
    rounds: u32,
    survivors: Vec<String>,
    score: f32,
    fallback_decisions: u32,
    events: usize,
    seed: u64,
}

/// Echoes events to stderr
struct EventPrinter;

impl EventListener for EventPrinter {
    fn on_event(&mut self, event: &BattleEvent, battlefield: &Battlefield) {
        match serde_json::to_string(event) {
            Ok(json) => eprintln!("[round {}] {}", battlefield.round(), json),
            Err(e) => eprintln!("[round {}] unprintable event: {}", battlefield.round(), e),
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("arena_combat=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args).await {
        Ok(summary) => match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Failed to encode summary: {}", e);
                std::process::exit(1);
            }
        },
        Err(e) => {
            eprintln!("Battle failed: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run(args: &Args) -> Result<RunSummary> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(cap) = args.round_cap {
        config.round_cap = cap;
    }
    config.validate()?;

    let scenario = Scenario::load(&args.scenario)?;
    let field = scenario.build(&config)?;

    let mut controller = RoundController::new(config.clone(), field)
        .add_scorer(PredictionScorer::default());
    if args.worker {
        let handle = DecisionWorker::spawn(DecisionEngine::new(&config), 16);
        controller = controller.with_decision_source(handle);
    }
    if args.realtime {
        controller = controller.with_clock(FrameClock::new(&config));
    }
    if args.verbose {
        controller = controller.add_listener(EventPrinter);
    }

    let result = controller.run().await?;

    let team_name = |id| {
        controller
            .field()
            .team(id)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| id.to_string())
    };
    let survivors = result
        .survivors
        .iter()
        .filter_map(|id| controller.field().unit(*id).map(|u| u.name.clone()))
        .collect();

    Ok(RunSummary {
        scenario: scenario.name.clone(),
        outcome: format!("{:?}", result.outcome),
        winner: result.winner.map(team_name),
        rounds: result.rounds,
        survivors,
        score: controller.scorers().iter().map(|s| s.score()).sum(),
        fallback_decisions: controller.fallback_count(),
        events: controller.bus().log().len(),
        seed: config.seed,
    })
}
