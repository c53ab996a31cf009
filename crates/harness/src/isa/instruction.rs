//! Instruction field extraction.
//!
//! Provides bit extraction for the fixed RV32 instruction fields and the
//! `Decoded` structure produced by [`decode`](super::decode::decode).

/// Bit mask for the opcode field (bits 0-6).
pub const OPCODE_MASK: u32 = 0x7F;
/// Bit mask for a 5-bit register field.
pub const REG_MASK: u32 = 0x1F;
/// Bit mask for the funct3 field (bits 12-14).
pub const FUNCT3_MASK: u32 = 0x7;
/// Bit mask for the funct7 field (bits 25-31).
pub const FUNCT7_MASK: u32 = 0x7F;

/// Extraction of the standard RISC-V instruction fields from a raw word.
pub trait InstructionBits {
    /// Opcode field (bits 0-6).
    fn opcode(&self) -> u32;
    /// Destination register (bits 7-11).
    fn rd(&self) -> usize;
    /// First source register (bits 15-19).
    fn rs1(&self) -> usize;
    /// Second source register (bits 20-24).
    fn rs2(&self) -> usize;
    /// funct3 field (bits 12-14).
    fn funct3(&self) -> u32;
    /// funct7 field (bits 25-31).
    fn funct7(&self) -> u32;
}

impl InstructionBits for u32 {
    #[inline(always)]
    fn opcode(&self) -> u32 {
        self & OPCODE_MASK
    }

    #[inline(always)]
    fn rd(&self) -> usize {
        ((self >> 7) & REG_MASK) as usize
    }

    #[inline(always)]
    fn rs1(&self) -> usize {
        ((self >> 15) & REG_MASK) as usize
    }

    #[inline(always)]
    fn rs2(&self) -> usize {
        ((self >> 20) & REG_MASK) as usize
    }

    #[inline(always)]
    fn funct3(&self) -> u32 {
        (self >> 12) & FUNCT3_MASK
    }

    #[inline(always)]
    fn funct7(&self) -> u32 {
        (self >> 25) & FUNCT7_MASK
    }
}

/// Decoded instruction with every field extracted.
///
/// `imm` is already sign-extended according to the instruction format; for
/// U-type instructions it holds the value shifted into bits 31-12.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Decoded {
    /// Raw 32-bit instruction encoding.
    pub raw: u32,
    /// Extracted opcode field.
    pub opcode: u32,
    /// Destination register index.
    pub rd: usize,
    /// First source register index.
    pub rs1: usize,
    /// Second source register index.
    pub rs2: usize,
    /// Function code field 3.
    pub funct3: u32,
    /// Function code field 7.
    pub funct7: u32,
    /// Sign-extended immediate value.
    pub imm: i32,
}

impl Decoded {
    /// Shift amount for shift-immediate instructions (`imm[4:0]`).
    #[inline]
    pub const fn shamt(&self) -> u32 {
        (self.imm as u32) & 0x1F
    }
}
