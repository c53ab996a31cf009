//! Instruction word encoders.
//!
//! The inverse of [`decode`](super::decode::decode) for each format. Callers
//! are responsible for range-checking immediates; out-of-range bits are
//! masked off here.

/// Encodes an R-type instruction.
pub const fn r_type(opcode: u32, rd: usize, funct3: u32, rs1: usize, rs2: usize, funct7: u32) -> u32 {
    ((funct7 & 0x7F) << 25)
        | (((rs2 as u32) & 0x1F) << 20)
        | (((rs1 as u32) & 0x1F) << 15)
        | ((funct3 & 0x7) << 12)
        | (((rd as u32) & 0x1F) << 7)
        | (opcode & 0x7F)
}

/// Encodes an I-type instruction.
pub const fn i_type(opcode: u32, rd: usize, funct3: u32, rs1: usize, imm: i32) -> u32 {
    (((imm as u32) & 0xFFF) << 20)
        | (((rs1 as u32) & 0x1F) << 15)
        | ((funct3 & 0x7) << 12)
        | (((rd as u32) & 0x1F) << 7)
        | (opcode & 0x7F)
}

/// Encodes an S-type instruction.
pub const fn s_type(opcode: u32, funct3: u32, rs1: usize, rs2: usize, imm: i32) -> u32 {
    let v = imm as u32;
    (((v >> 5) & 0x7F) << 25)
        | (((rs2 as u32) & 0x1F) << 20)
        | (((rs1 as u32) & 0x1F) << 15)
        | ((funct3 & 0x7) << 12)
        | ((v & 0x1F) << 7)
        | (opcode & 0x7F)
}

/// Encodes a B-type instruction. `imm` is a byte offset (bit 0 dropped).
pub const fn b_type(opcode: u32, funct3: u32, rs1: usize, rs2: usize, imm: i32) -> u32 {
    let v = imm as u32;
    (((v >> 12) & 1) << 31)
        | (((v >> 5) & 0x3F) << 25)
        | (((rs2 as u32) & 0x1F) << 20)
        | (((rs1 as u32) & 0x1F) << 15)
        | ((funct3 & 0x7) << 12)
        | (((v >> 1) & 0xF) << 8)
        | (((v >> 11) & 1) << 7)
        | (opcode & 0x7F)
}

/// Encodes a U-type instruction. `imm20` is the 20-bit upper immediate.
pub const fn u_type(opcode: u32, rd: usize, imm20: u32) -> u32 {
    ((imm20 & 0xFFFFF) << 12) | (((rd as u32) & 0x1F) << 7) | (opcode & 0x7F)
}

/// Encodes a J-type instruction. `imm` is a byte offset (bit 0 dropped).
pub const fn j_type(opcode: u32, rd: usize, imm: i32) -> u32 {
    let v = imm as u32;
    (((v >> 20) & 1) << 31)
        | (((v >> 1) & 0x3FF) << 21)
        | (((v >> 11) & 1) << 20)
        | (((v >> 12) & 0xFF) << 12)
        | (((rd as u32) & 0x1F) << 7)
        | (opcode & 0x7F)
}
