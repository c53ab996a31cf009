//! Common types and constants shared by every harness component.
//!
//! 1. **Constants:** The memory-mapped wire contract (control and dump
//!    channel addresses, control-channel magic values) and layout defaults.
//! 2. **Errors:** Assembler, reference-model and harness-level error types.

/// Wire-contract constants.
pub mod constants;

/// Error types.
pub mod error;

pub use error::{AsmError, GenerationFailure, HarnessError, RefFault};
