//! RV32I function codes (funct7, bits 31-25).

/// Default operation (ADD, SRL, etc.).
pub const DEFAULT: u32 = 0b0000000;

/// Alternate operation: SUB, and SRA/SRAI.
pub const ALT: u32 = 0b0100000;
