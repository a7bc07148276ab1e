//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the simulation
//! produces identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! Replays and batch balance runs both rely on a game being a pure
//! function of its seed, config and commands. Sources of non-determinism
//! include:
//!
//! - **Floating-point math**: positions use [`titan_core::math::Fixed`];
//!   hp, gold and damage are integers.
//!
//! - **System randomness**: every roll comes from the game's own seeded
//!   ChaCha stream.
//!
//! - **Iteration order**: units live in `Vec`s and are processed in
//!   insertion order.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use titan_core::command::PlayerCommand;
use titan_core::simulation::Simulation;

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
        let mut unique = self.hashes.clone();
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
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                self.unique_hashes().len(),
                self.hashes
            );
        }
    }
}

/// Run a state machine multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `ticks` - Number of steps per run
/// * `setup` - Function to create the initial state
/// * `step` - Function to advance the state by one tick
/// * `hash` - Function to compute a state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S, u64),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();
        for tick in 0..ticks {
            step(&mut state, tick);
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

/// Run two copies of a game and compare final state hashes.
///
/// # Example
///
/// ```
/// use titan_core::simulation::Simulation;
/// use titan_test_utils::determinism::verify_simulation_determinism;
///
/// assert!(verify_simulation_determinism(|| Simulation::new(7), 200));
/// ```
pub fn verify_simulation_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> Simulation,
{
    verify_determinism(
        2,
        num_ticks,
        &setup_fn,
        |sim, _| {
            sim.tick();
        },
        Simulation::state_hash,
    )
    .is_deterministic
}

/// Run a scripted game several times.
///
/// `script` is a list of `(tick, command)` pairs; each command is applied
/// right before the tick with that index. Rejected commands are ignored,
/// the same way a player's failed click is.
pub fn verify_scripted_determinism<F>(
    setup_fn: F,
    script: &[(u64, PlayerCommand)],
    runs: usize,
    num_ticks: u64,
) -> DeterminismResult
where
    F: Fn() -> Simulation,
{
    verify_determinism(
        runs,
        num_ticks,
        &setup_fn,
        |sim, tick| {
            for (_, command) in script.iter().filter(|(at, _)| *at == tick) {
                let _ = sim.apply(*command);
            }
            sim.tick();
        },
        Simulation::state_hash,
    )
}

/// Result of parallel simulation runs.
#[derive(Debug, Clone)]
pub struct ParallelSimResult {
    /// Final state hash from each simulation.
    pub hashes: Vec<u64>,
    /// Number of ticks each simulation ran.
    pub ticks: u64,
    /// Number of simulations run.
    pub num_sims: usize,
}

impl ParallelSimResult {
    /// Check if all simulations produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all simulations matched.
    ///
    /// # Panics
    ///
    /// Panics if simulations produced different hashes.
    pub fn assert_deterministic(&self) {
        assert!(
            self.is_deterministic(),
            "Parallel simulations diverged!\n\
             Simulations: {}\n\
             Ticks: {}\n\
             All hashes: {:?}",
            self.num_sims,
            self.ticks,
            self.hashes
        );
    }
}

/// Run N simulations on scoped threads and collect final hashes.
///
/// # Panics
///
/// Panics if a simulation thread panics.
pub fn run_parallel_simulations<F>(setup_fn: F, num_sims: usize, num_ticks: u64) -> ParallelSimResult
where
    F: Fn() -> Simulation + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let mut sim = setup_fn();
                    for _ in 0..num_ticks {
                        sim.tick();
                    }
                    sim.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("simulation thread panicked"))
            .collect()
    });

    ParallelSimResult {
        hashes,
        ticks: num_ticks,
        num_sims,
    }
}

/// Compare two simulation runs tick-by-tick, finding first divergence.
///
/// Returns `None` if the runs agree throughout, `Some(tick)` otherwise.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> Simulation,
{
    let mut sim1 = setup_fn();
    let mut sim2 = setup_fn();

    if sim1.state_hash() != sim2.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        sim1.tick();
        sim2.tick();

        if sim1.state_hash() != sim2.state_hash() {
            tracing::warn!(tick, "Simulations diverged");
            return Some(tick);
        }
    }

    None
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for simulation testing.
pub mod strategies {
    use proptest::prelude::*;
    use titan_core::archetype::ArchetypeId;
    use titan_core::command::PlayerCommand;
    use titan_core::simulation::Difficulty;
    use titan_core::upgrades::UpgradeKind;

    /// Any archetype id in the stock catalog.
    pub fn arb_archetype() -> impl Strategy<Value = ArchetypeId> {
        (0u16..10).prop_map(ArchetypeId)
    }

    /// Any upgrade.
    pub fn arb_upgrade() -> impl Strategy<Value = UpgradeKind> {
        prop::sample::select(UpgradeKind::ALL.to_vec())
    }

    /// Any difficulty.
    pub fn arb_difficulty() -> impl Strategy<Value = Difficulty> {
        prop_oneof![Just(Difficulty::Easy), Just(Difficulty::Normal)]
    }

    /// Any player command except reset and pause, weighted toward deploys.
    pub fn arb_play_command() -> impl Strategy<Value = PlayerCommand> {
        prop_oneof![
            6 => arb_archetype().prop_map(PlayerCommand::Deploy),
            2 => arb_upgrade().prop_map(PlayerCommand::PurchaseUpgrade),
            1 => arb_difficulty().prop_map(PlayerCommand::SetDifficulty),
        ]
    }

    /// A script of `(tick, command)` pairs within `max_tick`.
    pub fn arb_script(
        max_len: usize,
        max_tick: u64,
    ) -> impl Strategy<Value = Vec<(u64, PlayerCommand)>> {
        proptest::collection::vec((0..max_tick, arb_play_command()), 0..max_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{archetypes, quiet_simulation, skirmish};
    use proptest::prelude::*;
    use titan_core::archetype::ArchetypeId;
    use titan_core::simulation::Difficulty;

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 100, || 0u64, |n, _| *n += 1, |n| *n);
        assert!(result.is_deterministic);
        assert_eq!(result.hashes, vec![100, 100, 100]);
    }

    #[test]
    fn test_detects_non_determinism() {
        let counter = std::cell::Cell::new(0u64);
        let result = verify_determinism(
            2,
            1,
            || {
                counter.set(counter.get() + 1);
                counter.get()
            },
            |_, _| {},
            |n| *n,
        );
        assert!(!result.is_deterministic);
        assert_eq!(result.unique_hashes().len(), 2);
    }

    #[test]
    fn test_empty_simulation_determinism() {
        assert!(verify_simulation_determinism(|| Simulation::new(0), 500));
    }

    #[test]
    fn test_skirmish_determinism() {
        assert!(verify_simulation_determinism(
            || skirmish(11, archetypes::MIKASA, 4),
            300
        ));
    }

    #[test]
    fn test_scripted_game_determinism() {
        let script = [
            (0, PlayerCommand::Deploy(archetypes::EREN)),
            (120, PlayerCommand::Deploy(archetypes::CONNIE)),
            (200, PlayerCommand::SetDifficulty(Difficulty::Easy)),
            (400, PlayerCommand::Deploy(ArchetypeId(4))),
        ];
        verify_scripted_determinism(|| Simulation::new(2024), &script, 3, 1500)
            .assert_deterministic();
    }

    #[test]
    fn test_parallel_runs_match() {
        run_parallel_simulations(|| Simulation::new(77), 4, 600).assert_deterministic();
    }

    #[test]
    fn test_no_divergence() {
        assert!(find_first_divergence(|| quiet_simulation(5), 400).is_none());
    }

    #[test]
    fn test_different_seeds_differ() {
        let run = |seed| {
            let mut sim = Simulation::new(seed);
            for _ in 0..400 {
                sim.tick();
            }
            sim.state_hash()
        };
        assert_ne!(run(1), run(2));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_scripted_games_are_deterministic(
            seed in any::<u64>(),
            script in strategies::arb_script(20, 600),
        ) {
            let result = verify_scripted_determinism(|| Simulation::new(seed), &script, 2, 600);
            prop_assert!(result.is_deterministic);
        }
    }
}
