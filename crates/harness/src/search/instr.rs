//! Generated instruction forms and the proptest strategy over them.

use std::fmt;

use proptest::collection::vec;
use proptest::prelude::*;
use proptest::sample::{select, subsequence};
use proptest::strategy::Union;

use crate::isa::abi::REG_DUMP_BASE;
use crate::program::{AddressSet, Bounds, InstructionSequence};
use crate::search::DataWindow;

/// Register-register mnemonics.
pub static REG_OPS: [&str; 18] = [
    "add", "sub", "sll", "slt", "sltu", "xor", "srl", "sra", "or", "and", "mul", "mulh", "mulhsu",
    "mulhu", "div", "divu", "rem", "remu",
];

/// Register-immediate mnemonics (12-bit signed immediate).
pub static IMM_OPS: [&str; 6] = ["addi", "slti", "sltiu", "xori", "ori", "andi"];

/// Shift-immediate mnemonics.
pub static SHIFT_OPS: [&str; 3] = ["slli", "srli", "srai"];

/// Loads and their access size.
pub static LOAD_OPS: [(&str, u32); 5] = [("lb", 1), ("lbu", 1), ("lh", 2), ("lhu", 2), ("lw", 4)];

/// Stores and their access size.
pub static STORE_OPS: [(&str, u32); 3] = [("sb", 1), ("sh", 2), ("sw", 4)];

/// Highest register generated code may use; the epilogue owns the one above.
pub const MAX_GEN_REG: usize = REG_DUMP_BASE - 1;

/// One generated instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Instr {
    /// `op rd, rs1, rs2`
    Reg {
        /// Mnemonic.
        op: &'static str,
        /// Destination.
        rd: usize,
        /// First source.
        rs1: usize,
        /// Second source.
        rs2: usize,
    },
    /// `op rd, rs1, imm`
    Imm {
        /// Mnemonic (including shifts).
        op: &'static str,
        /// Destination.
        rd: usize,
        /// Source.
        rs1: usize,
        /// Immediate.
        imm: i32,
    },
    /// `lui rd, imm`
    Lui {
        /// Destination.
        rd: usize,
        /// 20-bit upper immediate.
        imm: u32,
    },
    /// `op rd, offset(x0)`
    Load {
        /// Mnemonic.
        op: &'static str,
        /// Destination.
        rd: usize,
        /// Absolute byte address.
        offset: u32,
        /// Access size in bytes.
        size: u32,
    },
    /// `op rs2, offset(x0)`
    Store {
        /// Mnemonic.
        op: &'static str,
        /// Stored register.
        rs2: usize,
        /// Absolute byte address.
        offset: u32,
        /// Access size in bytes.
        size: u32,
    },
}

impl Instr {
    /// Bytes of memory the instruction reads or writes.
    pub const fn touched(&self) -> Option<(u32, u32)> {
        match *self {
            Self::Load { offset, size, .. } | Self::Store { offset, size, .. } => {
                Some((offset, size))
            }
            _ => None,
        }
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Reg { op, rd, rs1, rs2 } => write!(f, "{op} x{rd}, x{rs1}, x{rs2}"),
            Self::Imm { op, rd, rs1, imm } => write!(f, "{op} x{rd}, x{rs1}, {imm}"),
            Self::Lui { rd, imm } => write!(f, "lui x{rd}, {imm:#x}"),
            Self::Load { op, rd, offset, .. } => write!(f, "{op} x{rd}, {offset}(x0)"),
            Self::Store {
                op, rs2, offset, ..
            } => write!(f, "{op} x{rs2}, {offset}(x0)"),
        }
    }
}

/// Renders instructions as a sequence and collects the bytes they touch.
pub fn sequence_of(instrs: &[Instr]) -> (InstructionSequence, AddressSet) {
    let mut addresses = AddressSet::new();
    for (addr, len) in instrs.iter().filter_map(Instr::touched) {
        addresses.insert_range(addr, len);
    }
    let sequence = InstructionSequence::new(instrs.iter().map(ToString::to_string));
    (sequence, addresses)
}

/// One instruction over the register `pool`.
pub fn instr_strategy(pool: Vec<usize>, window: DataWindow) -> BoxedStrategy<Instr> {
    let reg = || select(pool.clone());
    let mut arms: Vec<(u32, BoxedStrategy<Instr>)> = vec![
        (
            4,
            (select(&REG_OPS[..]), reg(), reg(), reg())
                .prop_map(|(op, rd, rs1, rs2)| Instr::Reg { op, rd, rs1, rs2 })
                .boxed(),
        ),
        (
            3,
            (select(&IMM_OPS[..]), reg(), reg(), -2048..=2047_i32)
                .prop_map(|(op, rd, rs1, imm)| Instr::Imm { op, rd, rs1, imm })
                .boxed(),
        ),
        (
            1,
            (select(&SHIFT_OPS[..]), reg(), reg(), 0..=31_i32)
                .prop_map(|(op, rd, rs1, imm)| Instr::Imm { op, rd, rs1, imm })
                .boxed(),
        ),
        (
            2,
            (reg(), 0..=0xF_FFFF_u32)
                .prop_map(|(rd, imm)| Instr::Lui { rd, imm })
                .boxed(),
        ),
    ];

    if window.len >= 4 {
        arms.push((
            1,
            (select(&LOAD_OPS[..]), reg(), 0..window.len)
                .prop_map(move |((op, size), rd, raw)| Instr::Load {
                    op,
                    rd,
                    offset: window.base + raw / size * size,
                    size,
                })
                .boxed(),
        ));
        arms.push((
            1,
            (select(&STORE_OPS[..]), reg(), 0..window.len)
                .prop_map(move |((op, size), rs2, raw)| Instr::Store {
                    op,
                    rs2,
                    offset: window.base + raw / size * size,
                    size,
                })
                .boxed(),
        ));
    }

    Union::new_weighted(arms).boxed()
}

/// Sequences within `bounds`, over a register pool whose size lies within
/// the register bounds.
///
/// Registers are drawn from `x1..=x30`; register bounds above 30 are clamped.
pub fn sequence_strategy(
    bounds: Bounds,
    window: DataWindow,
) -> impl Strategy<Value = (InstructionSequence, AddressSet)> {
    let max_regs = bounds.max_registers.clamp(1, MAX_GEN_REG);
    let min_regs = bounds.min_registers.clamp(1, max_regs);
    let max_len = bounds.max_instructions.max(bounds.min_instructions);
    let lengths = bounds.min_instructions..=max_len;
    let candidates: Vec<usize> = (1..=MAX_GEN_REG).collect();

    (min_regs..=max_regs)
        .prop_flat_map(move |k| subsequence(candidates.clone(), k))
        .prop_flat_map(move |pool| vec(instr_strategy(pool, window), lengths.clone()))
        .prop_map(|instrs| sequence_of(&instrs))
}
