//! Session state and result aggregation.
//!
//! A session is one process running one or more searches against one DUT
//! build. This module provides:
//! 1. **Context:** the [`SessionContext`] threaded through every trial.
//! 2. **Complexity:** the score recorded for each searched sequence.
//! 3. **Store:** the JSON session file, rewritten atomically per record.
//! 4. **Driver:** runs a search strategy to completion and records it.

/// Sequence complexity scores.
pub mod complexity;

/// Session-scoped mutable state.
pub mod context;

/// Search drivers.
pub mod driver;

/// Session file persistence.
pub mod store;

pub use complexity::{ComplexityFormula, complexity};
pub use context::SessionContext;
pub use driver::{SearchDriver, SearchSummary};
pub use store::{SessionEntry, SessionRecord, SessionStore, StrategyBucket};
