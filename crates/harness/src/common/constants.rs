//! Wire-contract and layout constants.
//!
//! The control and dump addresses and the control-channel values are fixed by
//! the programs the DUT runs; they are not configurable.

/// Control channel: pass/fail/exit reporting (write-only).
pub const CONTROL_ADDR: u32 = 0x1000_0000;

/// Dump channel: one write per architectural register at program end.
pub const DUMP_ADDR: u32 = 0x2000_0000;

/// Control value that opens a three-word failure report.
pub const CTRL_FAIL_BEGIN: u32 = 0x0002_0001;

/// Control value signalling an explicit PASS.
pub const CTRL_PASS: u32 = 0x0002_0000;

/// Upper half-word tagging a program exit; the lower half is the status.
pub const CTRL_EXIT_TAG: u32 = 0x0001;

/// Number of registers the dump protocol transfers (x0..x30).
pub const DUMP_REGS: usize = 31;

/// Size of one instruction in bytes.
pub const INSTRUCTION_BYTES: u32 = 4;
