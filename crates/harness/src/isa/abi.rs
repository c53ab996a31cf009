//! Register naming.
//!
//! Generated sequences always use numeric names (`x5`), but hand-written
//! programs fed to the assembler may use the ABI aliases.

/// Number of architectural integer registers.
pub const NUM_REGS: usize = 32;

/// Scratch register the epilogue clobbers to address the dump channel.
pub const REG_DUMP_BASE: usize = 31;

/// ABI register names for x0-x31.
pub const REG_NAMES: [&str; NUM_REGS] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2", "a3", "a4",
    "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4",
    "t5", "t6",
];

/// Parses a register operand: `x0`..`x31`, an ABI alias, or `fp` (= `s0`).
pub fn parse_register(token: &str) -> Option<usize> {
    let token = token.trim();
    if let Some(num) = token.strip_prefix('x') {
        return num.parse::<usize>().ok().filter(|&idx| idx < NUM_REGS);
    }
    if token == "fp" {
        return Some(8);
    }
    REG_NAMES.iter().position(|&name| name == token)
}
