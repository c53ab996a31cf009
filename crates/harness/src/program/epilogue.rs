//! Register-dump epilogue.
//!
//! Points `x31` at the dump channel, then stores `x0`..`x30` to it one by one.
//! The test device ends the run after the 31st store. `x31` itself is
//! clobbered and therefore never compared.

use crate::common::constants::{DUMP_ADDR, DUMP_REGS};
use crate::isa::abi::REG_DUMP_BASE;

/// Instructions in the epilogue: one `lui` plus one store per dumped register.
pub const EPILOGUE_INSTRUCTIONS: usize = 1 + DUMP_REGS;

/// Returns the epilogue source lines, comments included.
pub fn epilogue_lines() -> Vec<String> {
    let mut lines = Vec::with_capacity(EPILOGUE_INSTRUCTIONS + 2);
    lines.push("# END OF PROGRAM".to_string());
    lines.push("# Epilogue:".to_string());
    lines.push(format!("lui x{REG_DUMP_BASE}, {:#x}", DUMP_ADDR >> 12));
    for reg in 0..DUMP_REGS {
        lines.push(format!("sw x{reg}, 0(x{REG_DUMP_BASE})"));
    }
    lines
}
