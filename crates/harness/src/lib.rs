//! Differential testing harness for RV32 processors.
//!
//! This crate runs a cycle-level design under test (DUT) and a golden
//! reference model on the same generated program and compares their final
//! architectural state:
//! 1. **SoC:** The memory-mapped test device: memory, control channel and
//!    register-dump channel behind a valid/ready handshake.
//! 2. **Simulation:** The dual runner with independent cycle budgets and the
//!    per-trial verdict.
//! 3. **Comparison:** Report-all register and memory comparison.
//! 4. **Search:** Random, iterative-deepening and shrinking property-based
//!    sequence generators.
//! 5. **Session:** Trial bookkeeping, complexity scoring and the persisted
//!    session file.
//! 6. **Collaborators:** A two-pass assembler, an ELF loader, a functional
//!    reference ISS and a multi-cycle bus-level core.

/// Assembler trait, built-in assembler and memory images.
pub mod asm;
/// Common types and constants (wire contract, error taxonomy).
pub mod common;
/// Final-state comparison.
pub mod compare;
/// Harness configuration (defaults, hierarchical config structures).
pub mod config;
/// Device-under-test interface and the built-in bus core.
pub mod core;
/// RV32IM encodings, decoding and disassembly.
pub mod isa;
/// Instruction sequences, address sets and the dump epilogue.
pub mod program;
/// Reference model interface and the built-in ISS.
pub mod refmodel;
/// Instruction-sequence search strategies.
pub mod search;
/// Session context, complexity scoring and persistence.
pub mod session;
/// ELF loading, run loops and trials.
pub mod sim;
/// Memory-mapped test device.
pub mod soc;

/// Root configuration type; use `HarnessConfig::default()` or parse JSON.
pub use crate::config::HarnessConfig;
/// Built-in DUT and its factory.
pub use crate::core::{BusCore, BusCoreFactory, DutVariant};
/// Session-scoped state threaded through every trial.
pub use crate::session::SessionContext;
/// One differential trial and its verdict.
pub use crate::sim::{TrialVerdict, run_trial};
