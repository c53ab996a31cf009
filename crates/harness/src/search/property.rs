//! Property-based search with shrinking.
//!
//! Runs the trial as a proptest property: "the DUT agrees with the
//! reference". Invalid programs are rejected rather than failed. When a case
//! fails, proptest shrinks it toward a minimal reproducer, running further
//! trials along the way; the count reported is the number of trials up to the
//! first failure, not the total.

use std::cell::{Cell, RefCell};

use proptest::test_runner::{Config, TestCaseError, TestError};
use tracing::warn;

use crate::common::HarnessError;
use crate::program::{AddressSet, Bounds, InstructionSequence};
use crate::search::DataWindow;
use crate::search::instr::sequence_strategy;
use crate::search::random::seeded_runner;
use crate::sim::TrialVerdict;

/// The shrunk failing case.
#[derive(Clone, Debug, PartialEq)]
pub struct MinimalFailure {
    /// The minimal sequence.
    pub sequence: InstructionSequence,
    /// Its address set.
    pub addresses: AddressSet,
    /// The verdict it produced.
    pub verdict: TrialVerdict,
}

/// What a property search found.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyOutcome {
    /// Trials run in total, shrinking included.
    pub invocations: u64,
    /// Trial number of the first failure, if any.
    pub first_failure: Option<u64>,
    /// The shrunk reproducer, if a failure was found.
    pub minimal: Option<MinimalFailure>,
    /// The last sequence tried.
    pub last: Option<InstructionSequence>,
}

/// Shrinking search over [`sequence_strategy`].
#[derive(Clone, Copy, Debug)]
pub struct PropertySearch {
    bounds: Bounds,
    window: DataWindow,
    cases: u32,
    seed: Option<u64>,
}

impl PropertySearch {
    /// Creates a search that gives up after `cases` passing cases.
    pub fn new(bounds: Bounds, window: DataWindow, cases: u64, seed: Option<u64>) -> Self {
        Self {
            bounds,
            window,
            cases: u32::try_from(cases).unwrap_or(u32::MAX),
            seed,
        }
    }

    /// Runs the search, calling `trial` once per generated or shrunk case.
    ///
    /// A hard error from `trial` stops the search and is returned.
    pub fn run<F>(&self, trial: F) -> Result<PropertyOutcome, HarnessError>
    where
        F: FnMut(&InstructionSequence, &AddressSet) -> Result<TrialVerdict, HarnessError>,
    {
        let config = Config {
            cases: self.cases,
            max_global_rejects: self.cases,
            failure_persistence: None,
            ..Config::default()
        };
        let mut runner = seeded_runner(config, self.seed);
        let strategy = sequence_strategy(self.bounds, self.window);

        let trial = RefCell::new(trial);
        let invocations = Cell::new(0u64);
        let first_failure = Cell::new(None);
        let last_verdict = RefCell::new(None);
        let last_sequence = RefCell::new(None);
        let hard_error = RefCell::new(None);

        let result = runner.run(&strategy, |(sequence, addresses)| {
            if hard_error.borrow().is_some() {
                return Err(TestCaseError::fail("search aborted"));
            }
            let n = invocations.get() + 1;
            invocations.set(n);
            let verdict = {
                let mut run_one = trial.borrow_mut();
                (*run_one)(&sequence, &addresses)
            };
            *last_sequence.borrow_mut() = Some(sequence);
            match verdict {
                Ok(v) if v.is_invalid() => Err(TestCaseError::reject(v.to_string())),
                Ok(v) if v.is_failure() => {
                    if first_failure.get().is_none() {
                        first_failure.set(Some(n));
                    }
                    let reason = v.to_string();
                    *last_verdict.borrow_mut() = Some(v);
                    Err(TestCaseError::fail(reason))
                }
                Ok(_) => Ok(()),
                Err(e) => {
                    let reason = e.to_string();
                    *hard_error.borrow_mut() = Some(e);
                    Err(TestCaseError::fail(reason))
                }
            }
        });

        if let Some(e) = hard_error.into_inner() {
            return Err(e);
        }

        let minimal = match result {
            Ok(()) => None,
            Err(TestError::Abort(reason)) => {
                warn!(%reason, "property search gave up");
                None
            }
            Err(TestError::Fail(_, (sequence, addresses))) => {
                last_verdict.into_inner().map(|verdict| MinimalFailure {
                    sequence,
                    addresses,
                    verdict,
                })
            }
        };

        Ok(PropertyOutcome {
            invocations: invocations.get(),
            first_failure: first_failure.get(),
            minimal,
            last: last_sequence.into_inner(),
        })
    }
}
