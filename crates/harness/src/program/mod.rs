//! Test program shape.
//!
//! Generators produce an [`InstructionSequence`] together with the
//! [`AddressSet`] it is expected to touch, within the [`Bounds`] they are
//! given. Before the DUT runs a sequence, the fixed [`epilogue`] is appended so
//! the device dumps its register file through the dump channel.

/// The register-dump epilogue appended to DUT programs.
pub mod epilogue;

/// Instruction sequences, address sets and generator bounds.
pub mod sequence;

pub use epilogue::{EPILOGUE_INSTRUCTIONS, epilogue_lines};
pub use sequence::{AddressSet, Bounds, InstructionSequence};
