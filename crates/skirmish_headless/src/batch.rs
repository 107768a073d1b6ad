//! Batch match runner.
//!
//! Plays many seeds of one match template in parallel using rayon and
//! collects win rates across them.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use skirmish_core::map::MapCatalog;
use skirmish_core::team::Team;

use crate::error::{HeadlessError, Result};
use crate::match_runner::{run_match, MatchConfig, MatchResult};

/// Configuration for a batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of matches to play
    pub game_count: u32,
    /// Maximum parallel matches (0 = use rayon default)
    pub parallel_games: u32,
    /// Seed of the first match; match `i` uses `seed_start + i`
    pub seed_start: u64,
    /// Match every seed is applied to
    pub template: MatchConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            game_count: 100,
            parallel_games: 0,
            seed_start: 0,
            template: MatchConfig::default(),
        }
    }
}

impl BatchConfig {
    /// Create config for a match template
    #[must_use]
    pub fn new(template: MatchConfig, game_count: u32) -> Self {
        Self {
            game_count,
            template,
            ..Default::default()
        }
    }

    /// Set seed start
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set thread count
    #[must_use]
    pub fn with_threads(mut self, threads: u32) -> Self {
        self.parallel_games = threads;
        self
    }
}

/// One played match, as stored in the results file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    /// Seed played
    pub seed: u64,
    /// Winner, if the match ended
    pub winner: Option<Team>,
    /// Why the match ended
    pub reason: Option<String>,
    /// Ticks simulated
    pub ticks: u64,
    /// State hash after the last tick
    pub final_state_hash: u64,
}

impl From<&MatchResult> for GameSummary {
    fn from(result: &MatchResult) -> Self {
        Self {
            seed: result.seed,
            winner: result.winner,
            reason: result.report.as_ref().map(|r| r.reason.clone()),
            ticks: result.ticks,
            final_state_hash: result.final_state_hash,
        }
    }
}

/// Aggregate statistics over a batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Matches played
    pub total_games: u32,
    /// Matches won by blue
    pub blue_wins: u32,
    /// Matches won by red
    pub red_wins: u32,
    /// Matches stopped by the tick limit
    pub unfinished: u32,
    /// Mean match length in ticks
    pub avg_ticks: f64,
    /// Win rate per team label
    pub win_rates: BTreeMap<String, f64>,
}

impl BatchSummary {
    /// Summarize played matches
    #[must_use]
    pub fn from_games(games: &[GameSummary]) -> Self {
        let total = games.len() as u32;
        if total == 0 {
            return Self::default();
        }
        let wins = |team| games.iter().filter(|g| g.winner == Some(team)).count() as u32;
        let blue_wins = wins(Team::Blue);
        let red_wins = wins(Team::Red);
        let total_ticks: u64 = games.iter().map(|g| g.ticks).sum();

        let mut win_rates = BTreeMap::new();
        win_rates.insert(Team::Blue.as_str().to_string(), f64::from(blue_wins) / f64::from(total));
        win_rates.insert(Team::Red.as_str().to_string(), f64::from(red_wins) / f64::from(total));

        Self {
            total_games: total,
            blue_wins,
            red_wins,
            unfinished: total - blue_wins - red_wins,
            avg_ticks: total_ticks as f64 / f64::from(total),
            win_rates,
        }
    }
}

/// Results from a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used
    pub config: BatchConfig,
    /// Individual matches, in seed order
    pub games: Vec<GameSummary>,
    /// Aggregate summary
    pub summary: BatchSummary,
    /// Total runtime
    pub duration_seconds: f64,
    /// Errors encountered
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to JSON file
    ///
    /// # Errors
    ///
    /// Fails if the directory cannot be created or the file written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load results from JSON file
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not a results file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Error during batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    /// Match index
    pub game_index: u32,
    /// Seed used
    pub seed: u64,
    /// Error message
    pub message: String,
}

/// Progress tracking for batch runs
#[derive(Debug)]
pub struct BatchProgress {
    /// Total matches
    pub total: u32,
    completed: AtomicU32,
    start_time: Instant,
    partial_wins: Mutex<BTreeMap<Team, u32>>,
}

impl BatchProgress {
    /// Create new progress tracker
    #[must_use]
    pub fn new(total: u32) -> Self {
        Self {
            total,
            completed: AtomicU32::new(0),
            start_time: Instant::now(),
            partial_wins: Mutex::new(BTreeMap::new()),
        }
    }

    /// Record a completed match
    pub fn record_completion(&self, winner: Option<Team>) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        if let Some(team) = winner {
            if let Ok(mut wins) = self.partial_wins.lock() {
                *wins.entry(team).or_insert(0) += 1;
            }
        }
    }

    /// Get current completion count
    #[must_use]
    pub fn current(&self) -> u32 {
        self.completed.load(Ordering::Relaxed)
    }

    /// Get completion percentage
    #[must_use]
    pub fn percentage(&self) -> f64 {
        f64::from(self.current()) / f64::from(self.total.max(1)) * 100.0
    }

    /// Get estimated time remaining
    #[must_use]
    pub fn eta(&self) -> Duration {
        let completed = self.current();
        if completed == 0 {
            return Duration::ZERO;
        }
        let per_game = self.start_time.elapsed().as_secs_f64() / f64::from(completed);
        let remaining = self.total.saturating_sub(completed);
        Duration::from_secs_f64(per_game * f64::from(remaining))
    }

    /// Get current win rates
    #[must_use]
    pub fn current_win_rates(&self) -> BTreeMap<Team, f64> {
        let completed = self.current();
        if completed == 0 {
            return BTreeMap::new();
        }
        self.partial_wins.lock().map_or_else(
            |_| BTreeMap::new(),
            |wins| {
                wins.iter()
                    .map(|(team, won)| (*team, f64::from(*won) / f64::from(completed)))
                    .collect()
            },
        )
    }

    /// Log progress
    pub fn display(&self) {
        let eta = self.eta();
        let rates = self.current_win_rates();
        info!(
            completed = self.current(),
            total = self.total,
            eta_secs = eta.as_secs(),
            blue = rates.get(&Team::Blue).copied().unwrap_or_default(),
            red = rates.get(&Team::Red).copied().unwrap_or_default(),
            "Batch progress {:.1}%",
            self.percentage()
        );
    }
}

/// Run a batch of matches
///
/// # Errors
///
/// Fails only if the worker pool cannot be built. Matches that fail to set
/// up are recorded in [`BatchResults::errors`].
pub fn run_batch(config: BatchConfig, catalog: &MapCatalog) -> Result<BatchResults> {
    let start = Instant::now();
    let progress = Arc::new(BatchProgress::new(config.game_count));

    info!(
        games = config.game_count,
        map = config.template.setup.map_id.as_deref().unwrap_or("none"),
        strategy = %config.template.strategy.name,
        "Starting batch run"
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.parallel_games as usize)
        .build()
        .map_err(|e| HeadlessError::Io(std::io::Error::other(e)))?;

    let results: Vec<std::result::Result<GameSummary, BatchError>> = pool.install(|| {
        (0..config.game_count)
            .into_par_iter()
            .map(|i| {
                let seed = config.seed_start.wrapping_add(u64::from(i));
                let match_config = config.template.clone().with_seed(seed);
                match run_match(&match_config, catalog) {
                    Ok(result) => {
                        progress.record_completion(result.winner);
                        let completed = progress.current();
                        if completed % 10 == 0 {
                            debug!("Progress: {}/{}", completed, config.game_count);
                        }
                        if completed % 100 == 0 {
                            progress.display();
                        }
                        Ok(GameSummary::from(&result))
                    }
                    Err(e) => {
                        warn!("Match {} failed: {}", i, e);
                        Err(BatchError {
                            game_index: i,
                            seed,
                            message: e.to_string(),
                        })
                    }
                }
            })
            .collect()
    });

    let (games, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(std::result::Result::is_ok);
    let games: Vec<GameSummary> = games.into_iter().filter_map(std::result::Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(std::result::Result::err).collect();

    let summary = BatchSummary::from_games(&games);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        "Batch complete: {} matches in {:.1}s ({:.1} matches/sec)",
        games.len(),
        duration_seconds,
        games.len() as f64 / duration_seconds.max(f64::EPSILON)
    );

    Ok(BatchResults {
        config,
        games,
        summary,
        duration_seconds,
        errors,
    })
}

/// Play the same seed `runs` times and compare final state hashes.
///
/// Returns the hashes in run order and whether they all agree.
///
/// # Errors
///
/// Fails if the match cannot be set up.
pub fn verify_determinism(
    template: &MatchConfig,
    seed: u64,
    runs: u32,
    catalog: &MapCatalog,
) -> Result<(Vec<u64>, bool)> {
    let config = template.clone().with_seed(seed);
    let hashes = (0..runs)
        .map(|_| run_match(&config, catalog).map(|r| r.final_state_hash))
        .collect::<skirmish_core::error::Result<Vec<_>>>()?;

    let unique: HashSet<u64> = hashes.iter().copied().collect();
    let deterministic = unique.len() <= 1;
    if !deterministic {
        warn!(seed, runs, unique = unique.len(), "Non-determinism detected");
    }
    Ok((hashes, deterministic))
}
