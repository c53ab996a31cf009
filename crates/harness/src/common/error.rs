//! Error types.
//!
//! The taxonomy mirrors how a trial can go wrong:
//! 1. **`AsmError`:** the program text could not be assembled.
//! 2. **`RefFault` / `GenerationFailure`:** the reference model could not run
//!    the program to completion, so the test case itself is invalid.
//! 3. **`HarnessError`:** hard errors that are neither verification failures
//!    nor invalid test cases: DUT protocol violations and session I/O.
//!
//! Verification failures (mismatches, explicit DUT failure reports, timeouts)
//! are not errors; they are [`TrialVerdict`](crate::sim::TrialVerdict)s.

use std::path::PathBuf;

use thiserror::Error;

use crate::common::constants::{CONTROL_ADDR, DUMP_ADDR};

/// Assembly errors, tagged with the 1-based source line.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AsmError {
    /// The mnemonic is not part of the supported RV32IM subset.
    #[error("line {line}: unknown mnemonic `{mnemonic}`")]
    UnknownMnemonic {
        /// Source line.
        line: usize,
        /// Offending mnemonic.
        mnemonic: String,
    },

    /// Wrong number of operands for the mnemonic.
    #[error("line {line}: `{mnemonic}` expects {expected} operands, found {found}")]
    OperandCount {
        /// Source line.
        line: usize,
        /// Mnemonic being assembled.
        mnemonic: String,
        /// Operand count the format requires.
        expected: usize,
        /// Operand count present in the source.
        found: usize,
    },

    /// Register operand is not `x0`..`x31` or an ABI name.
    #[error("line {line}: invalid register `{token}`")]
    InvalidRegister {
        /// Source line.
        line: usize,
        /// Offending token.
        token: String,
    },

    /// Immediate operand does not parse as a number or label.
    #[error("line {line}: invalid immediate `{token}`")]
    InvalidImmediate {
        /// Source line.
        line: usize,
        /// Offending token.
        token: String,
    },

    /// Immediate does not fit the instruction format.
    #[error("line {line}: immediate {value} out of range for `{mnemonic}`")]
    ImmediateRange {
        /// Source line.
        line: usize,
        /// Mnemonic being assembled.
        mnemonic: String,
        /// Parsed immediate value.
        value: i64,
    },

    /// Memory operand is not of the form `imm(reg)`.
    #[error("line {line}: malformed memory operand `{token}`")]
    MemoryOperand {
        /// Source line.
        line: usize,
        /// Offending token.
        token: String,
    },

    /// Branch or jump target label is never defined.
    #[error("line {line}: undefined label `{label}`")]
    UndefinedLabel {
        /// Source line.
        line: usize,
        /// Missing label.
        label: String,
    },

    /// The same label is defined twice.
    #[error("line {line}: duplicate label `{label}`")]
    DuplicateLabel {
        /// Source line of the second definition.
        line: usize,
        /// Duplicated label.
        label: String,
    },
}

/// Faults raised by the reference model while executing a program.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RefFault {
    /// Encoding outside the supported RV32IM subset.
    #[error("illegal instruction {inst:#010x} at pc {pc:#x}")]
    IllegalInstruction {
        /// Program counter of the instruction.
        pc: u32,
        /// Raw encoding.
        inst: u32,
    },

    /// Instruction fetch outside reference memory.
    #[error("instruction fetch fault at {0:#x}")]
    FetchFault(u32),

    /// Load outside reference memory.
    #[error("load access fault at {0:#x}")]
    LoadAccessFault(u32),

    /// Store outside reference memory and the harness channels.
    #[error("store access fault at {0:#x}")]
    StoreAccessFault(u32),

    /// Load or store not aligned to its access size.
    #[error("misaligned access to {addr:#x} at pc {pc:#x}")]
    Misaligned {
        /// Effective address.
        addr: u32,
        /// Program counter of the access.
        pc: u32,
    },
}

/// The reference model could not execute the program: an invalid test case.
///
/// Never scored as a DUT bug.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GenerationFailure {
    /// The program text did not assemble.
    #[error("program does not assemble: {0}")]
    Assembly(#[from] AsmError),

    /// The reference model faulted.
    #[error("reference model faulted after {cycles} cycles: {fault}")]
    Fault {
        /// The fault raised.
        fault: RefFault,
        /// Cycles executed before the fault.
        cycles: u64,
    },

    /// The reference model did not reach its end-of-test marker in budget.
    #[error("reference model did not finish within {cycles} cycles")]
    Timeout {
        /// The exhausted budget.
        cycles: u64,
    },

    /// The sequence uses an instruction the harness appends itself.
    #[error("line {line}: `{mnemonic}` is reserved for the end-of-test marker")]
    ReservedInstruction {
        /// 1-based line in the sequence.
        line: usize,
        /// Offending mnemonic.
        mnemonic: String,
    },
}

impl GenerationFailure {
    /// The address the reference stopped on when it left the address map:
    /// neither test memory nor a harness channel.
    ///
    /// The DUT would see the same access as a protocol violation.
    pub const fn unmapped_address(&self) -> Option<u32> {
        match *self {
            Self::Fault {
                fault: RefFault::LoadAccessFault(addr) | RefFault::StoreAccessFault(addr),
                ..
            } if !matches!(addr & !3, CONTROL_ADDR | DUMP_ADDR) => Some(addr),
            _ => None,
        }
    }
}

/// Hard errors: fatal to the run or to the whole session.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The DUT addressed neither memory nor a harness channel.
    #[error("protocol violation: DUT accessed unmapped address {addr:#010x} at cycle {cycle}")]
    ProtocolViolation {
        /// Offending bus address.
        addr: u32,
        /// Cycle of the access.
        cycle: u64,
    },

    /// The DUT program (sequence plus epilogue) did not assemble.
    #[error("DUT program does not assemble: {0}")]
    Assembly(#[from] AsmError),

    /// The session file could not be read or written.
    #[error("session file {}: {source}", path.display())]
    SessionIo {
        /// Session file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The session file exists but is not a valid session record.
    #[error("session file {} is malformed: {source}", path.display())]
    SessionFormat {
        /// Session file path.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// An ELF image could not be parsed.
    #[error("ELF image: {0}")]
    Elf(String),

    /// The harness configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}
