//! RISC-V Multiply/Divide Extension (M).
//!
//! The M instructions share `OP_REG` with base arithmetic and are selected by
//! `funct7 == M_EXTENSION`.

/// Function code 3 definitions for multiply/divide operations.
pub mod funct3;

/// M-extension selector in the funct7 field.
pub const M_EXTENSION: u32 = 0b0000001;
