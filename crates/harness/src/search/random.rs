//! Complete random testing (CRT).
//!
//! Every trial draws an independent sequence from [`sequence_strategy`]. No
//! shrinking: the number of draws until the first failure is the metric.

use proptest::strategy::{BoxedStrategy, Strategy, ValueTree};
use proptest::test_runner::{Config, RngAlgorithm, TestRng, TestRunner};

use crate::program::{AddressSet, Bounds, InstructionSequence};
use crate::search::DataWindow;
use crate::search::instr::sequence_strategy;

/// Endless stream of independent random sequences.
pub struct RandomSearch {
    strategy: BoxedStrategy<(InstructionSequence, AddressSet)>,
    runner: TestRunner,
}

impl std::fmt::Debug for RandomSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RandomSearch").finish_non_exhaustive()
    }
}

impl RandomSearch {
    /// Creates a sampler. With a seed the stream is reproducible.
    pub fn new(bounds: Bounds, window: DataWindow, seed: Option<u64>) -> Self {
        Self {
            strategy: sequence_strategy(bounds, window).boxed(),
            runner: seeded_runner(Config::default(), seed),
        }
    }
}

impl Iterator for RandomSearch {
    type Item = (InstructionSequence, AddressSet);

    fn next(&mut self) -> Option<Self::Item> {
        self.strategy
            .new_tree(&mut self.runner)
            .ok()
            .map(|tree| tree.current())
    }
}

/// A test runner whose RNG is derived from `seed`, or randomly seeded.
pub(crate) fn seeded_runner(config: Config, seed: Option<u64>) -> TestRunner {
    match seed {
        Some(seed) => {
            let mut bytes = [0u8; 32];
            for chunk in bytes.chunks_exact_mut(8) {
                chunk.copy_from_slice(&seed.to_le_bytes());
            }
            TestRunner::new_with_rng(config, TestRng::from_seed(RngAlgorithm::ChaCha, &bytes))
        }
        None => TestRunner::new(config),
    }
}
