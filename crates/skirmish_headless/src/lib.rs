//! Headless match runner for agents, batch play and CI verification.
//!
//! This crate drives `skirmish_core` matches without any presentation layer:
//!
//! - **Agent play**: an external controller plays the human seat through
//!   JSON commands on stdin, with responses on stdout
//! - **Unattended matches**: a scripted [`Strategy`] plays the human seat
//!   against the core bots
//! - **Batches**: many seeds in parallel, summarised as win rates
//! - **Determinism checks**: the same seed replayed and its state hash compared
//!
//! # Protocol
//!
//! Communication uses JSON lines (one JSON object per line):
//!
//! - **stdin**: Commands from controller (tick, spawn, stance, etc.)
//! - **stdout**: State updates and responses (JSON)
//! - **stderr**: Logs (human-readable)
//!
//! See [`protocol`] module for the full command/response specification.
//!
//! # Example
//!
//! ```bash
//! # Play interactively on the desert map
//! echo '{"cmd":"tick","count":60}' | skirmish_headless play --map desert_siege
//!
//! # One scripted match, report on stdout
//! skirmish_headless simulate --strategy rush --seed 9
//!
//! # Verify determinism
//! skirmish_headless verify --seed 12345 --runs 5
//! ```

pub mod batch;
pub mod error;
pub mod match_runner;
pub mod protocol;
pub mod runner;
pub mod strategies;

pub use batch::{run_batch, verify_determinism, BatchConfig, BatchResults, BatchSummary};
pub use error::{HeadlessError, Result};
pub use match_runner::{run_match, LogReporter, MatchConfig, MatchResult};
pub use protocol::{Command, Response};
pub use runner::{HeadlessConfig, HeadlessRunner};
pub use strategies::{Strategy, StrategyExecutor};
