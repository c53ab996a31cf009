//! Search drivers.
//!
//! A driver runs one search strategy until it finds a failing trial or runs
//! out of trials, then records exactly one session entry for it. Invalid test
//! cases count as trials but never end a search. A protocol violation ends
//! the search with an error, after the entry has been recorded.

use std::fmt;

use tracing::{info, warn};

use crate::common::HarnessError;
use crate::core::DutFactory;
use crate::program::{AddressSet, Bounds, InstructionSequence};
use crate::search::{DataWindow, Deepening, PropertySearch, RandomSearch, SearchStrategy};
use crate::session::complexity::complexity;
use crate::session::context::SessionContext;
use crate::session::store::{SessionEntry, SessionStore};
use crate::sim::{TrialVerdict, run_trial};

/// What one search found.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchSummary {
    /// Strategy that ran.
    pub strategy: SearchStrategy,
    /// Trials executed, including invalid ones and shrinking.
    pub trials: u64,
    /// The failing verdict, if a bug was found.
    pub verdict: Option<TrialVerdict>,
    /// The entry recorded in the session file.
    pub entry: SessionEntry,
}

impl SearchSummary {
    /// True when the search ended on a failing trial.
    pub const fn found_bug(&self) -> bool {
        self.verdict.is_some()
    }
}

impl fmt::Display for SearchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = self.strategy.tag();
        match &self.verdict {
            Some(verdict) => {
                writeln!(f, "{tag}: failure after {} trials", self.entry.trial_count)?;
                writeln!(f, "{verdict}")?;
                write!(f, "{}", self.entry.sequence)?;
            }
            None => writeln!(f, "{tag}: no failure in {} trials", self.trials)?,
        }
        write!(
            f,
            "{tag}: {} instructions, complexity {:.3}",
            self.entry.instruction_count, self.entry.complexity
        )
    }
}

/// Runs searches within one session.
pub struct SearchDriver<'a> {
    ctx: &'a mut SessionContext,
    factory: &'a dyn DutFactory,
}

impl fmt::Debug for SearchDriver<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchDriver")
            .field("ctx", &self.ctx)
            .finish_non_exhaustive()
    }
}

impl<'a> SearchDriver<'a> {
    /// Creates a driver elaborating DUTs through `factory`.
    pub const fn new(ctx: &'a mut SessionContext, factory: &'a dyn DutFactory) -> Self {
        Self { ctx, factory }
    }

    /// Runs `strategy` to completion and records the result.
    pub fn run(&mut self, strategy: SearchStrategy) -> Result<SearchSummary, HarnessError> {
        self.ctx.begin_search();
        let config = self.ctx.config();
        let bounds = config.bounds;
        let window = DataWindow::from_memory(&config.memory);
        let seed = config.search.seed;
        info!(strategy = strategy.name(), dut = %self.ctx.variant(), "search started");

        match strategy {
            SearchStrategy::CompleteRandom => {
                self.run_iter(strategy, RandomSearch::new(bounds, window, seed))
            }
            SearchStrategy::IterativeDeepening => {
                self.run_iter(strategy, Deepening::new(bounds, window))
            }
            SearchStrategy::PropertyBased => self.run_property(bounds, window, seed),
        }
    }

    fn run_iter<I>(
        &mut self,
        strategy: SearchStrategy,
        cases: I,
    ) -> Result<SearchSummary, HarnessError>
    where
        I: Iterator<Item = (InstructionSequence, AddressSet)>,
    {
        let max_trials =
            usize::try_from(self.ctx.config().search.max_trials).unwrap_or(usize::MAX);
        let mut last = InstructionSequence::default();

        for (sequence, addresses) in cases.take(max_trials) {
            match run_trial(self.ctx, self.factory, &sequence, &addresses) {
                Ok(verdict) if verdict.is_failure() => {
                    let trials = self.ctx.trial_count();
                    let entry = self.record(strategy, trials, sequence)?;
                    info!(strategy = strategy.name(), trials, "failure found");
                    return Ok(SearchSummary {
                        strategy,
                        trials,
                        verdict: Some(verdict),
                        entry,
                    });
                }
                Ok(_) => last = sequence,
                Err(e) => {
                    let trials = self.ctx.trial_count();
                    let _ = self.record(strategy, trials, sequence)?;
                    return Err(e);
                }
            }
        }

        let trials = self.ctx.trial_count();
        let entry = self.record(strategy, trials, last)?;
        info!(strategy = strategy.name(), trials, "search exhausted without a failure");
        Ok(SearchSummary {
            strategy,
            trials,
            verdict: None,
            entry,
        })
    }

    fn run_property(
        &mut self,
        bounds: Bounds,
        window: DataWindow,
        seed: Option<u64>,
    ) -> Result<SearchSummary, HarnessError> {
        let strategy = SearchStrategy::PropertyBased;
        let max_trials = self.ctx.config().search.max_trials;
        let search = PropertySearch::new(bounds, window, max_trials, seed);

        let mut last = InstructionSequence::default();
        let outcome = {
            let ctx = &mut *self.ctx;
            let factory = self.factory;
            search.run(|sequence, addresses| {
                last = sequence.clone();
                run_trial(ctx, factory, sequence, addresses)
            })
        };

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                let trials = self.ctx.trial_count();
                let _ = self.record(strategy, trials, last)?;
                return Err(e);
            }
        };

        match (outcome.first_failure, outcome.minimal) {
            (Some(first), Some(minimal)) => {
                let entry = self.record(strategy, first, minimal.sequence)?;
                info!(
                    strategy = strategy.name(),
                    trials = first,
                    invocations = outcome.invocations,
                    "failure found and shrunk"
                );
                Ok(SearchSummary {
                    strategy,
                    trials: outcome.invocations,
                    verdict: Some(minimal.verdict),
                    entry,
                })
            }
            (first, _) => {
                if first.is_some() {
                    warn!("failure found but not reproduced after shrinking");
                }
                let sequence = outcome.last.unwrap_or(last);
                let entry = self.record(strategy, outcome.invocations, sequence)?;
                info!(
                    strategy = strategy.name(),
                    trials = outcome.invocations,
                    "search exhausted without a failure"
                );
                Ok(SearchSummary {
                    strategy,
                    trials: outcome.invocations,
                    verdict: None,
                    entry,
                })
            }
        }
    }

    /// Scores `sequence` and appends it to the session file.
    fn record(
        &mut self,
        strategy: SearchStrategy,
        trials: u64,
        sequence: InstructionSequence,
    ) -> Result<SessionEntry, HarnessError> {
        let entry = SessionEntry {
            trial_count: trials,
            instruction_count: sequence.len(),
            complexity: complexity(&sequence, self.ctx.config().session.complexity),
            sequence,
        };
        let store = SessionStore::new(self.ctx.session_path());
        let fresh = self.ctx.take_fresh();
        let _ = store.record(strategy, &entry, fresh)?;
        Ok(entry)
    }
}
