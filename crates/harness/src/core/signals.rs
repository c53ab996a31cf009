//! Decoded control signals.

use crate::isa::instruction::Decoded;
use crate::isa::rv32i::{funct3 as f3, funct7 as f7, opcodes as op};
use crate::isa::rv32m::{M_EXTENSION, funct3 as m_f3};

/// Integer ALU operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AluOp {
    /// Default value (no operation).
    #[default]
    Add,
    /// Integer subtraction.
    Sub,
    /// Shift left logical.
    Sll,
    /// Set less than (signed).
    Slt,
    /// Set less than unsigned.
    Sltu,
    /// Bitwise XOR.
    Xor,
    /// Shift right logical.
    Srl,
    /// Shift right arithmetic.
    Sra,
    /// Bitwise OR.
    Or,
    /// Bitwise AND.
    And,
    /// Integer multiply (low bits).
    Mul,
    /// Integer multiply (high bits, signed × signed).
    Mulh,
    /// Integer multiply (high bits, signed × unsigned).
    Mulhsu,
    /// Integer multiply (high bits, unsigned × unsigned).
    Mulhu,
    /// Signed division.
    Div,
    /// Unsigned division.
    Divu,
    /// Signed remainder.
    Rem,
    /// Unsigned remainder.
    Remu,
}

impl AluOp {
    /// ALU operation of an `OP` or `OP-IMM` instruction, `None` for anything else
    /// or for an encoding outside RV32IM.
    pub fn from_decoded(d: &Decoded) -> Option<Self> {
        match d.opcode {
            op::OP_REG => match (d.funct7, d.funct3) {
                (f7::DEFAULT, f3::ADD_SUB) => Some(Self::Add),
                (f7::ALT, f3::ADD_SUB) => Some(Self::Sub),
                (f7::DEFAULT, f3::SLL) => Some(Self::Sll),
                (f7::DEFAULT, f3::SLT) => Some(Self::Slt),
                (f7::DEFAULT, f3::SLTU) => Some(Self::Sltu),
                (f7::DEFAULT, f3::XOR) => Some(Self::Xor),
                (f7::DEFAULT, f3::SRL_SRA) => Some(Self::Srl),
                (f7::ALT, f3::SRL_SRA) => Some(Self::Sra),
                (f7::DEFAULT, f3::OR) => Some(Self::Or),
                (f7::DEFAULT, f3::AND) => Some(Self::And),
                (M_EXTENSION, m_f3::MUL) => Some(Self::Mul),
                (M_EXTENSION, m_f3::MULH) => Some(Self::Mulh),
                (M_EXTENSION, m_f3::MULHSU) => Some(Self::Mulhsu),
                (M_EXTENSION, m_f3::MULHU) => Some(Self::Mulhu),
                (M_EXTENSION, m_f3::DIV) => Some(Self::Div),
                (M_EXTENSION, m_f3::DIVU) => Some(Self::Divu),
                (M_EXTENSION, m_f3::REM) => Some(Self::Rem),
                (M_EXTENSION, m_f3::REMU) => Some(Self::Remu),
                _ => None,
            },
            op::OP_IMM => match d.funct3 {
                f3::ADD_SUB => Some(Self::Add),
                f3::SLT => Some(Self::Slt),
                f3::SLTU => Some(Self::Sltu),
                f3::XOR => Some(Self::Xor),
                f3::OR => Some(Self::Or),
                f3::AND => Some(Self::And),
                f3::SLL if d.funct7 == f7::DEFAULT => Some(Self::Sll),
                f3::SRL_SRA if d.funct7 == f7::DEFAULT => Some(Self::Srl),
                f3::SRL_SRA if d.funct7 == f7::ALT => Some(Self::Sra),
                _ => None,
            },
            _ => None,
        }
    }

    /// True for the four multiply operations.
    pub const fn is_mul(self) -> bool {
        matches!(self, Self::Mul | Self::Mulh | Self::Mulhsu | Self::Mulhu)
    }
}
