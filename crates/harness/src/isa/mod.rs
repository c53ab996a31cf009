//! RV32IM instruction set definitions.
//!
//! Everything the harness needs to turn generated instruction text into
//! machine words and back, shared by the assembler, the reference model and
//! the bus-level DUT model:
//!
//! * `rv32i`: base integer opcodes and function codes.
//! * `rv32m`: multiply/divide function codes.
//! * `instruction` / `decode`: field extraction and immediate decoding.
//! * `encode`: R/I/S/B/U/J encoders used by the assembler.
//! * `abi` / `disasm`: register naming and a disassembler for line traces.

/// Register naming (`x0`..`x31` and ABI aliases).
pub mod abi;

/// Instruction decoding for all RV32 instruction formats.
pub mod decode;

/// Disassembler for traces and diagnostics.
pub mod disasm;

/// Instruction word encoders.
pub mod encode;

/// Instruction field extraction and the `Decoded` structure.
pub mod instruction;

/// Base integer instruction set.
pub mod rv32i;

/// Integer multiply/divide extension.
pub mod rv32m;
