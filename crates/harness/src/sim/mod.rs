//! Simulation driving.
//!
//! This module runs programs on the two processors and turns what happens
//! into structured results:
//! 1. **Loader:** ELF images for DUT-only runs.
//! 2. **Outcome:** the sum type every DUT run ends in.
//! 3. **Runner:** the budgeted step loops for the DUT and the reference.
//! 4. **Trial:** one reference run, one DUT run and the comparison.

/// ELF image loading.
pub mod loader;

/// Run outcomes.
pub mod outcome;

/// DUT and reference step loops.
pub mod runner;

/// Single-trial driver and verdicts.
pub mod trial;

pub use loader::load_elf;
pub use outcome::SimulationOutcome;
pub use runner::{DualRunner, DutReport, RefReport};
pub use trial::{TrialVerdict, run_trial, run_trial_with};
