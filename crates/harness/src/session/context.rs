//! Session context.

use std::path::PathBuf;

use crate::config::HarnessConfig;
use crate::core::DutVariant;

/// Mutable session state, owned by the top-level driver.
///
/// Replaces process-wide counters: the trial counter of the running search,
/// whether the DUT has been elaborated yet, and whether the session file
/// should be started over on the next record.
#[derive(Clone, Debug)]
pub struct SessionContext {
    config: HarnessConfig,
    variant: DutVariant,
    elaborated: bool,
    trial_count: u64,
    fresh: bool,
}

impl SessionContext {
    /// Creates a session. With `fresh`, the first record replaces any
    /// existing session file.
    pub const fn new(config: HarnessConfig, variant: DutVariant, fresh: bool) -> Self {
        Self {
            config,
            variant,
            elaborated: false,
            trial_count: 0,
            fresh,
        }
    }

    /// The session configuration.
    pub const fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// The DUT build under test.
    pub const fn variant(&self) -> DutVariant {
        self.variant
    }

    /// Trials started in the current search.
    pub const fn trial_count(&self) -> u64 {
        self.trial_count
    }

    /// True until the first elaboration.
    pub const fn needs_elaboration(&self) -> bool {
        !self.elaborated
    }

    /// Counts a new trial and returns its 1-based number.
    pub const fn begin_trial(&mut self) -> u64 {
        self.trial_count += 1;
        self.trial_count
    }

    /// Starts a new search: the trial counter returns to zero.
    pub const fn begin_search(&mut self) {
        self.trial_count = 0;
    }

    /// Returns true exactly once: the first elaboration must compile.
    pub const fn take_recompile(&mut self) -> bool {
        let recompile = !self.elaborated;
        self.elaborated = true;
        recompile
    }

    /// Returns true exactly once for a fresh session.
    pub const fn take_fresh(&mut self) -> bool {
        let fresh = self.fresh;
        self.fresh = false;
        fresh
    }

    /// Session file for this configuration: `<dir>/<variant>.json`.
    pub fn session_path(&self) -> PathBuf {
        self.config
            .session
            .dir
            .join(format!("{}.json", self.variant.name()))
    }
}
