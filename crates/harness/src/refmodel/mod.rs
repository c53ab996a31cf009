//! Golden reference processor.
//!
//! The reference executes the same logical program as the DUT, but exposes
//! its register file and memory directly so no dump protocol is needed. The
//! harness only depends on the [`ReferenceModel`] trait; [`Iss`] is the
//! built-in functional RV32IM interpreter.

/// Functional instruction-set simulator.
pub mod iss;

pub use iss::Iss;

use std::ops::Range;

use crate::asm::MemoryImage;
use crate::common::RefFault;

/// A trusted processor model used as the comparison oracle.
pub trait ReferenceModel {
    /// Clears registers and restarts at the loaded entry point. Memory is kept.
    fn reset(&mut self);

    /// Copies an assembled image into memory and adopts its entry point.
    fn load(&mut self, image: &MemoryImage);

    /// Sets every byte in `range` to `value`.
    fn fill(&mut self, range: Range<u32>, value: u8);

    /// Executes one instruction.
    fn step(&mut self) -> Result<(), RefFault>;

    /// True once the end-of-test marker has executed.
    fn is_done(&self) -> bool;

    /// Register `idx`.
    fn reg(&self, idx: usize) -> u32;

    /// Memory byte at `addr`, `None` outside memory.
    fn read_byte(&self, addr: u32) -> Option<u8>;
}
