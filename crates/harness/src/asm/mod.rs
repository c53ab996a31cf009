//! Assembler collaborator.
//!
//! Turns instruction-sequence text into a [`MemoryImage`]. The harness only
//! depends on the [`Assembler`] trait; [`Rv32Assembler`] is the built-in
//! two-pass RV32IM assembler used by both simulation paths.

/// Memory images and their sections.
pub mod image;

/// The built-in RV32IM assembler.
pub mod parser;

pub use image::{MemoryImage, Section};
pub use parser::{Rv32Assembler, parse_immediate};

use crate::common::AsmError;

/// Converts program text into a loadable memory image.
pub trait Assembler {
    /// Assembles `program`, one instruction per line.
    fn assemble(&self, program: &str) -> Result<MemoryImage, AsmError>;
}
