//! ALU shift operations.
//!
//! Shift amounts are masked to 5 bits.

use crate::core::signals::AluOp;

/// Bit mask for the shift amount (0-31).
const SHAMT_MASK: u32 = 0x1f;

/// Executes a shift operation. Returns `0` for other opcodes.
pub fn execute(op: AluOp, a: u32, b: u32) -> u32 {
    let sh = b & SHAMT_MASK;
    match op {
        AluOp::Sll => a << sh,
        AluOp::Srl => a >> sh,
        AluOp::Sra => ((a as i32) >> sh) as u32,
        _ => 0,
    }
}
