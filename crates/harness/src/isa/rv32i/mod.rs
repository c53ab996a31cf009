//! RISC-V Base Integer Instruction Set (RV32I).
//!
//! - `opcodes`: major opcodes (bits 6-0).
//! - `funct3`: minor opcodes distinguishing instructions within a major opcode.
//! - `funct7`: additional opcode bits for R-type instructions.

/// Function code 3 definitions for base integer operations.
pub mod funct3;

/// Function code 7 definitions for base integer operations.
pub mod funct7;

/// Base integer instruction set opcodes.
pub mod opcodes;
