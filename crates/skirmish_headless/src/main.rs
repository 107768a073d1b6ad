//! Headless skirmish runner.
//!
//! Runs matches without graphics: driven by JSON on stdin/stdout, by a
//! scripted autopilot, or in parallel batches.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode - read commands from stdin
//! skirmish_headless play --map waterloo --difficulty hard
//!
//! # One unattended match, report on stdout
//! skirmish_headless simulate --strategy turtle --minutes 3
//!
//! # Batch of seeds
//! skirmish_headless batch --count 200 --output results/batch.json
//! ```
//!
//! # Protocol
//!
//! Input (stdin): JSON commands, one per line
//! Output (stdout): JSON responses, one per line
//! Logs (stderr): Debug information

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use skirmish_core::combat::CombatPolicy;
use skirmish_core::config::{Difficulty, GameplayConfig};
use skirmish_core::map::MapCatalog;
use skirmish_core::session::{MatchMode, MatchSetup, SessionSnapshot};
use skirmish_core::simulation::MatchState;
use skirmish_core::team::Team;

use skirmish_headless::{
    batch::{run_batch, verify_determinism, BatchConfig},
    error::{HeadlessError, Result},
    match_runner::{run_match, MatchConfig},
    runner::{HeadlessConfig, HeadlessRunner},
    strategies::Strategy,
};

#[derive(Parser)]
#[command(name = "skirmish_headless")]
#[command(about = "Headless skirmish runner for bot testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one match over the JSON-lines protocol
    Play {
        #[command(flatten)]
        game: MatchArgs,

        /// Synthetic milliseconds per frame
        #[arg(long, default_value = "50")]
        frame_ms: u64,

        /// Output state after every tick command
        #[arg(long)]
        auto_state: bool,
    },

    /// Run one match with a scripted autopilot and print its report
    Simulate {
        #[command(flatten)]
        game: MatchArgs,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Run many seeds in parallel and print win counts
    Batch {
        #[command(flatten)]
        game: MatchArgs,

        #[command(flatten)]
        run: RunArgs,

        /// Number of matches
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Maximum parallel matches (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Write full results as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Verify determinism by running the same seed several times
    Verify {
        #[command(flatten)]
        game: MatchArgs,

        #[command(flatten)]
        run: RunArgs,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },

    /// List the available maps
    Maps {
        /// Map catalog RON file (default: built-in maps)
        #[arg(long)]
        maps: Option<PathBuf>,
    },

    /// Check gameplay config and map catalog files
    Validate {
        /// Gameplay config RON file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Map catalog RON file
        #[arg(long)]
        maps: Option<PathBuf>,
    },
}

/// Lobby choices shared by every match-running command.
#[derive(Args, Debug, Clone)]
struct MatchArgs {
    /// Map id, or "none" for an empty field
    #[arg(long, default_value = "waterloo")]
    map: String,

    /// Seats per team: 1v1 or 2v2
    #[arg(long, default_value = "1v1", value_parser = parse_mode)]
    mode: MatchMode,

    /// Team of the human seat
    #[arg(long, default_value = "blue", value_parser = parse_team)]
    team: Team,

    /// Bot difficulty: easy, medium or hard
    #[arg(long, default_value = "medium", value_parser = parse_difficulty)]
    difficulty: Difficulty,

    /// Combat rules: melee or ranged
    #[arg(long, default_value = "melee", value_parser = parse_combat)]
    combat: CombatPolicy,

    /// Match length in minutes (default from config)
    #[arg(long)]
    minutes: Option<u32>,

    /// RNG seed (first seed for batches)
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Name of the human seat
    #[arg(long)]
    player: Option<String>,

    /// Starting gold of the human seat
    #[arg(long)]
    gold: Option<u32>,

    /// Allow developer commands such as gold grants
    #[arg(long)]
    developer: bool,

    /// Gameplay config RON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Map catalog RON file (default: built-in maps)
    #[arg(long)]
    maps: Option<PathBuf>,
}

impl MatchArgs {
    fn gameplay(&self) -> Result<GameplayConfig> {
        match &self.config {
            Some(path) => Ok(GameplayConfig::load(path)?),
            None => Ok(GameplayConfig::default()),
        }
    }

    fn catalog(&self) -> Result<MapCatalog> {
        load_catalog(self.maps.as_ref())
    }

    fn setup(&self) -> MatchSetup {
        MatchSetup {
            map_id: (!self.map.eq_ignore_ascii_case("none")).then(|| self.map.clone()),
            mode: self.mode,
            human_team: self.team,
            difficulty: self.difficulty,
            minutes: self.minutes,
            combat: self.combat,
            seed: self.seed,
            ..MatchSetup::default()
        }
    }

    fn session(&self) -> SessionSnapshot {
        SessionSnapshot {
            username: self.player.clone(),
            starting_gold: self.gold,
            developer: self.developer,
        }
    }
}

/// Autopilot and frame settings for unattended matches.
#[derive(Args, Debug, Clone)]
struct RunArgs {
    /// Strategy preset (balanced, rush, turtle, idle) or RON file
    #[arg(long, default_value = "balanced")]
    strategy: String,

    /// Synthetic milliseconds per frame
    #[arg(long, default_value = "50")]
    frame_ms: u64,

    /// Stop after this many ticks (0 = play to the end)
    #[arg(long, default_value = "0")]
    max_ticks: u64,
}

impl RunArgs {
    fn match_config(&self, game: &MatchArgs) -> Result<MatchConfig> {
        let strategy = if Strategy::PRESETS.iter().any(|p| p.eq_ignore_ascii_case(&self.strategy)) {
            Strategy::preset(&self.strategy)?
        } else {
            Strategy::load(&self.strategy)?
        };
        Ok(MatchConfig {
            gameplay: game.gameplay()?,
            setup: game.setup(),
            session: game.session(),
            strategy,
            frame_ms: self.frame_ms,
            max_ticks: self.max_ticks,
        })
    }
}

fn parse_mode(s: &str) -> std::result::Result<MatchMode, String> {
    MatchMode::from_id(s).ok_or_else(|| format!("unknown mode '{s}' (expected 1v1 or 2v2)"))
}

fn parse_team(s: &str) -> std::result::Result<Team, String> {
    Team::from_id(s).ok_or_else(|| format!("unknown team '{s}' (expected blue or red)"))
}

fn parse_difficulty(s: &str) -> std::result::Result<Difficulty, String> {
    Difficulty::from_id(s).ok_or_else(|| format!("unknown difficulty '{s}'"))
}

fn parse_combat(s: &str) -> std::result::Result<CombatPolicy, String> {
    CombatPolicy::from_id(s).ok_or_else(|| format!("unknown combat rules '{s}' (expected melee or ranged)"))
}

fn load_catalog(path: Option<&PathBuf>) -> Result<MapCatalog> {
    match path {
        Some(path) => Ok(MapCatalog::load(path)?),
        None => Ok(MapCatalog::builtin()),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr; stdout is for protocol and reports
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Play {
            game,
            frame_ms,
            auto_state,
        } => cmd_play(&game, HeadlessConfig { frame_ms, auto_state }),
        Commands::Simulate { game, run } => cmd_simulate(&game, &run),
        Commands::Batch {
            game,
            run,
            count,
            parallel,
            output,
        } => cmd_batch(&game, &run, count, parallel, output),
        Commands::Verify { game, run, runs } => cmd_verify(&game, &run, runs),
        Commands::Maps { maps } => cmd_maps(maps.as_ref()),
        Commands::Validate { config, maps } => cmd_validate(config, maps),
    }
}

/// Serve the JSON-lines protocol on stdin/stdout
fn cmd_play(game: &MatchArgs, config: HeadlessConfig) -> Result<()> {
    tracing::info!(map = %game.map, seed = game.seed, "Starting interactive session");
    let state = MatchState::from_setup(game.gameplay()?, &game.setup(), &game.session(), &game.catalog()?)?;
    let mut runner = HeadlessRunner::new(state, config);
    runner.run(io::stdin().lock(), io::stdout().lock())?;
    Ok(())
}

/// Play one scripted match and print the result as JSON
fn cmd_simulate(game: &MatchArgs, run: &RunArgs) -> Result<()> {
    let config = run.match_config(game)?;
    let result = run_match(&config, &game.catalog()?)?;
    match &result.report {
        Some(report) => tracing::info!(
            winner = %report.winner,
            ticks = result.ticks,
            hash = %format!("{:016x}", result.final_state_hash),
            "{}",
            report.reason
        ),
        None => tracing::info!(ticks = result.ticks, "Match stopped at the tick limit"),
    }
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Run a batch and print win counts
fn cmd_batch(
    game: &MatchArgs,
    run: &RunArgs,
    count: u32,
    parallel: u32,
    output: Option<PathBuf>,
) -> Result<()> {
    let config = BatchConfig::new(run.match_config(game)?, count)
        .with_seed(game.seed)
        .with_threads(parallel);
    let results = run_batch(config, &game.catalog()?)?;

    for error in &results.errors {
        tracing::warn!(seed = error.seed, "{}", error.message);
    }
    if let Some(path) = output {
        results.save(&path)?;
        tracing::info!(path = %path.display(), "Results saved");
    }
    println!("{}", serde_json::to_string_pretty(&results.summary)?);
    Ok(())
}

/// Replay one seed and compare final state hashes
fn cmd_verify(game: &MatchArgs, run: &RunArgs, runs: u32) -> Result<()> {
    let template = run.match_config(game)?;
    let (hashes, deterministic) = verify_determinism(&template, game.seed, runs, &game.catalog()?)?;
    for (i, hash) in hashes.iter().enumerate() {
        tracing::info!(run = i + 1, hash = %format!("{hash:016x}"), "Run complete");
    }
    if !deterministic {
        let mut unique = hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        return Err(HeadlessError::Diverged {
            runs: hashes.len(),
            unique: unique.len(),
        });
    }
    println!("Deterministic: {} runs of seed {} agree", hashes.len(), game.seed);
    Ok(())
}

/// Print the map list
fn cmd_maps(path: Option<&PathBuf>) -> Result<()> {
    let catalog = load_catalog(path)?;
    for map in &catalog.maps {
        println!(
            "{:<14} {:<24} {}x{}  {} capture point(s)",
            map.id,
            map.name,
            map.width,
            map.height,
            map.capture_points.len()
        );
    }
    Ok(())
}

/// Check data files
fn cmd_validate(config: Option<PathBuf>, maps: Option<PathBuf>) -> Result<()> {
    if let Some(path) = config {
        GameplayConfig::load(&path)?;
        println!("{}: ok", path.display());
    }
    let catalog = load_catalog(maps.as_ref())?;
    let problems = catalog.validate();
    if !problems.is_empty() {
        return Err(HeadlessError::InvalidMaps(problems));
    }
    println!("{} map(s): ok", catalog.maps.len());
    Ok(())
}
