//! Instruction disassembler for RV32IM.
//!
//! Produces the same textual form the generators emit (`addi x1, x2, -3`,
//! `sw x5, 8(x0)`), which keeps DUT line traces directly comparable with the
//! generated sequence.

use crate::isa::decode::decode;
use crate::isa::instruction::Decoded;
use crate::isa::rv32i::{funct3 as f3, funct7 as f7, opcodes as op};
use crate::isa::rv32m::{M_EXTENSION, funct3 as m_f3};

/// Disassembles a 32-bit RV32IM instruction.
///
/// Returns `"unknown (0x........)"` for encodings outside RV32IM.
pub fn disassemble(inst: u32) -> String {
    let d = decode(inst);
    let (rd, rs1, rs2, imm) = (d.rd, d.rs1, d.rs2, d.imm);

    match d.opcode {
        op::OP_LUI => format!("lui x{rd}, {:#x}", (imm as u32) >> 12),
        op::OP_AUIPC => format!("auipc x{rd}, {:#x}", (imm as u32) >> 12),
        op::OP_JAL => format!("jal x{rd}, {imm}"),
        op::OP_JALR => format!("jalr x{rd}, {imm}(x{rs1})"),
        op::OP_BRANCH => {
            let mn = match d.funct3 {
                f3::BEQ => "beq",
                f3::BNE => "bne",
                f3::BLT => "blt",
                f3::BGE => "bge",
                f3::BLTU => "bltu",
                f3::BGEU => "bgeu",
                _ => return unknown(inst),
            };
            format!("{mn} x{rs1}, x{rs2}, {imm}")
        }
        op::OP_LOAD => {
            let mn = match d.funct3 {
                f3::LB => "lb",
                f3::LH => "lh",
                f3::LW => "lw",
                f3::LBU => "lbu",
                f3::LHU => "lhu",
                _ => return unknown(inst),
            };
            format!("{mn} x{rd}, {imm}(x{rs1})")
        }
        op::OP_STORE => {
            let mn = match d.funct3 {
                f3::SB => "sb",
                f3::SH => "sh",
                f3::SW => "sw",
                _ => return unknown(inst),
            };
            format!("{mn} x{rs2}, {imm}(x{rs1})")
        }
        op::OP_IMM => disasm_op_imm(&d).unwrap_or_else(|| unknown(inst)),
        op::OP_REG => disasm_op_reg(&d).unwrap_or_else(|| unknown(inst)),
        op::OP_SYSTEM if inst == op::ECALL => "ecall".to_string(),
        _ => unknown(inst),
    }
}

fn unknown(inst: u32) -> String {
    format!("unknown ({inst:#010x})")
}

fn disasm_op_imm(d: &Decoded) -> Option<String> {
    let (rd, rs1, imm) = (d.rd, d.rs1, d.imm);
    let mn = match d.funct3 {
        f3::ADD_SUB => "addi",
        f3::SLT => "slti",
        f3::SLTU => "sltiu",
        f3::XOR => "xori",
        f3::OR => "ori",
        f3::AND => "andi",
        f3::SLL => return Some(format!("slli x{rd}, x{rs1}, {}", d.shamt())),
        f3::SRL_SRA => {
            let mn = if d.funct7 == f7::ALT { "srai" } else { "srli" };
            return Some(format!("{mn} x{rd}, x{rs1}, {}", d.shamt()));
        }
        _ => return None,
    };
    Some(format!("{mn} x{rd}, x{rs1}, {imm}"))
}

fn disasm_op_reg(d: &Decoded) -> Option<String> {
    let mn = if d.funct7 == M_EXTENSION {
        match d.funct3 {
            m_f3::MUL => "mul",
            m_f3::MULH => "mulh",
            m_f3::MULHSU => "mulhsu",
            m_f3::MULHU => "mulhu",
            m_f3::DIV => "div",
            m_f3::DIVU => "divu",
            m_f3::REM => "rem",
            m_f3::REMU => "remu",
            _ => return None,
        }
    } else {
        match (d.funct3, d.funct7) {
            (f3::ADD_SUB, f7::DEFAULT) => "add",
            (f3::ADD_SUB, f7::ALT) => "sub",
            (f3::SLL, f7::DEFAULT) => "sll",
            (f3::SLT, f7::DEFAULT) => "slt",
            (f3::SLTU, f7::DEFAULT) => "sltu",
            (f3::XOR, f7::DEFAULT) => "xor",
            (f3::SRL_SRA, f7::DEFAULT) => "srl",
            (f3::SRL_SRA, f7::ALT) => "sra",
            (f3::OR, f7::DEFAULT) => "or",
            (f3::AND, f7::DEFAULT) => "and",
            _ => return None,
        }
    };
    Some(format!("{mn} x{}, x{}, x{}", d.rd, d.rs1, d.rs2))
}
