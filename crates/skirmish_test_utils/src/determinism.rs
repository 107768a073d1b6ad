//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a match produces identical
//! results given identical setup, seed and frame deltas.
//!
//! # Testing Strategy
//!
//! Sources of non-determinism include:
//!
//! - **Floating-point math**: Different CPUs can produce different results.
//!   We use fixed-point arithmetic via [`skirmish_core::math::Fixed`] throughout.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Units are iterated in spawn order and players in seat order.
//!
//! - **System randomness**: Spawn jitter, melee strength rolls and bot
//!   choices all draw from the match's seeded RNG.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual system determinism (movement, combat, etc.)
//! 2. **Property tests**: Random inputs must still produce deterministic outputs
//! 3. **Integration tests**: Full bot matches are reproducible
//! 4. **Parallel tests**: Running N matches on N threads all match

use std::thread;

use skirmish_core::math::Fixed;
use skirmish_core::simulation::MatchState;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for deterministic simulation).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the simulation was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the simulation produced different hashes across runs.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial simulation state
/// * `step` - Function to advance simulation by one tick
/// * `hash` - Function to compute state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Run a match `runs` times with a constant frame delta and compare hashes.
///
/// # Example
///
/// ```
/// use skirmish_test_utils::determinism::verify_match_determinism;
/// use skirmish_test_utils::fixtures::{frame_50ms, two_bots, MatchBuilder};
///
/// let result = verify_match_determinism(
///     || MatchBuilder::new().players(two_bots(100, 100)).build(),
///     3,
///     200,
///     frame_50ms(),
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_match_determinism<F>(setup_fn: F, runs: usize, ticks: u64, dt: Fixed) -> DeterminismResult
where
    F: Fn() -> MatchState,
{
    verify_determinism(
        runs,
        ticks,
        setup_fn,
        |state| {
            state.step(dt);
        },
        MatchState::state_hash,
    )
}

/// Result of parallel match runs.
#[derive(Debug, Clone)]
pub struct ParallelSimResult {
    /// Final state hash from each match.
    pub hashes: Vec<u64>,
    /// Number of ticks each match ran.
    pub ticks: u64,
    /// Number of matches run.
    pub num_sims: usize,
}

impl ParallelSimResult {
    /// Check if all matches produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all matches agreed.
    ///
    /// # Panics
    ///
    /// Panics if matches produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            let mut unique: Vec<u64> = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Parallel matches diverged!\n\
                 Matches: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {}\n\
                 All hashes: {:?}",
                self.num_sims,
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run N matches on scoped threads and collect final hashes.
///
/// Catches non-determinism that only shows up under thread scheduling or
/// memory layout differences.
///
/// # Panics
///
/// Panics if a worker thread panics.
pub fn run_parallel_matches<F>(setup_fn: F, num_sims: usize, num_ticks: u64, dt: Fixed) -> ParallelSimResult
where
    F: Fn() -> MatchState + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let mut state = setup_fn();
                    for _ in 0..num_ticks {
                        state.step(dt);
                    }
                    state.state_hash()
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    ParallelSimResult {
        hashes,
        ticks: num_ticks,
        num_sims,
    }
}

/// Compare two runs tick-by-tick, finding the first divergence.
///
/// # Returns
///
/// `None` if the runs agree, `Some(tick)` for the first tick whose hashes
/// differ.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64, dt: Fixed) -> Option<u64>
where
    F: Fn() -> MatchState,
{
    let mut a = setup_fn();
    let mut b = setup_fn();

    if a.state_hash() != b.state_hash() {
        tracing::warn!("Runs diverge before the first tick");
        return Some(0);
    }

    for tick in 1..=num_ticks {
        a.step(dt);
        b.step(dt);

        if a.state_hash() != b.state_hash() {
            tracing::warn!(tick, "Runs diverge");
            return Some(tick);
        }
    }

    None
}

/// Verify that a RON round-trip preserves match state exactly, and that the
/// restored match keeps evolving identically.
pub fn verify_serialization_determinism<F>(setup_fn: F, num_ticks: u64, dt: Fixed) -> bool
where
    F: Fn() -> MatchState,
{
    let mut state = setup_fn();
    for _ in 0..num_ticks {
        state.step(dt);
    }

    let Ok(text) = ron::to_string(&state) else {
        return false;
    };
    let Ok(mut restored) = ron::from_str::<MatchState>(&text) else {
        return false;
    };
    if restored.state_hash() != state.state_hash() {
        return false;
    }

    for _ in 0..num_ticks {
        state.step(dt);
        restored.step(dt);
    }
    restored.state_hash() == state.state_hash()
}

/// Proptest strategies for match testing.
pub mod strategies {
    use proptest::prelude::*;
    use skirmish_core::combat::CombatPolicy;
    use skirmish_core::config::Difficulty;
    use skirmish_core::math::{Fixed, Vec2Fixed};
    use skirmish_core::player::Stance;

    /// A whole-number coordinate inside the default world.
    pub fn arb_world_coord() -> impl Strategy<Value = i32> {
        0i32..3000
    }

    /// A position inside the default world.
    pub fn arb_position() -> impl Strategy<Value = Vec2Fixed> {
        (arb_world_coord(), arb_world_coord()).prop_map(|(x, y)| Vec2Fixed::from_ints(x, y))
    }

    /// A frame delta between 1 and 50 ms, in seconds.
    pub fn arb_frame() -> impl Strategy<Value = Fixed> {
        (1i32..=50).prop_map(|ms| Fixed::from_num(ms) / Fixed::from_num(1000))
    }

    /// Melee strength.
    pub fn arb_strength() -> impl Strategy<Value = u32> {
        1u32..=99
    }

    /// Gold amount up to a generous cap.
    pub fn arb_gold() -> impl Strategy<Value = u32> {
        0u32..=400
    }

    /// Either combat rule set.
    pub fn arb_combat() -> impl Strategy<Value = CombatPolicy> {
        prop_oneof![
            Just(CombatPolicy::MeleeProximity),
            Just(CombatPolicy::RangedCooldown)
        ]
    }

    /// Any difficulty.
    pub fn arb_difficulty() -> impl Strategy<Value = Difficulty> {
        prop_oneof![
            Just(Difficulty::Easy),
            Just(Difficulty::Medium),
            Just(Difficulty::Hard)
        ]
    }

    /// Either stance.
    pub fn arb_stance() -> impl Strategy<Value = Stance> {
        prop_oneof![Just(Stance::Attack), Just(Stance::Defense)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{frame_50ms, place_column, two_bots, MatchBuilder, BLUE, RED};
    use proptest::prelude::*;
    use skirmish_core::combat::CombatPolicy;
    use skirmish_core::config::Difficulty;

    fn bot_match(seed: u64, combat: CombatPolicy) -> MatchState {
        MatchBuilder::new()
            .seed(seed)
            .combat(combat)
            .difficulty(Difficulty::Hard)
            .map("waterloo")
            .players(two_bots(100, 100))
            .build()
    }

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 10, || 0u64, |n| *n += 1, |n| *n);
        assert!(result.is_deterministic);
        assert_eq!(result.unique_hashes(), vec![10]);
    }

    #[test]
    fn test_melee_bot_match_is_deterministic() {
        verify_match_determinism(|| bot_match(11, CombatPolicy::MeleeProximity), 3, 600, frame_50ms())
            .assert_deterministic();
    }

    #[test]
    fn test_ranged_bot_match_is_deterministic() {
        verify_match_determinism(|| bot_match(11, CombatPolicy::RangedCooldown), 3, 600, frame_50ms())
            .assert_deterministic();
    }

    #[test]
    fn test_different_seeds_diverge() {
        let a = verify_match_determinism(|| bot_match(1, CombatPolicy::MeleeProximity), 1, 200, frame_50ms());
        let b = verify_match_determinism(|| bot_match(2, CombatPolicy::MeleeProximity), 1, 200, frame_50ms());
        assert_ne!(a.hashes, b.hashes);
    }

    #[test]
    fn test_find_divergence_on_deterministic_match() {
        assert_eq!(
            find_first_divergence(|| bot_match(5, CombatPolicy::MeleeProximity), 200, frame_50ms()),
            None
        );
    }

    #[test]
    fn test_serialization_preserves_state() {
        assert!(verify_serialization_determinism(
            || {
                let mut state = bot_match(3, CombatPolicy::RangedCooldown);
                place_column(&mut state, BLUE, 400, 3, 60);
                place_column(&mut state, RED, 520, 3, 60);
                state
            },
            100,
            frame_50ms()
        ));
    }

    #[test]
    fn test_parallel_matches() {
        run_parallel_matches(|| bot_match(9, CombatPolicy::MeleeProximity), 4, 300, frame_50ms())
            .assert_deterministic();
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        /// Any seed and rule set replays identically.
        #[test]
        fn prop_seeded_matches_replay(
            seed in any::<u64>(),
            combat in strategies::arb_combat(),
            difficulty in strategies::arb_difficulty(),
        ) {
            let setup = move || {
                MatchBuilder::new()
                    .seed(seed)
                    .combat(combat)
                    .difficulty(difficulty)
                    .players(two_bots(100, 100))
                    .build()
            };
            let result = verify_match_determinism(setup, 2, 150, frame_50ms());
            prop_assert!(result.is_deterministic);
        }
    }
}
