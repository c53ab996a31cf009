//! Two-pass RV32IM assembler.
//!
//! Syntax accepted, one instruction per line:
//!
//! * `#` starts a comment; blank lines are ignored.
//! * `name:` defines a label at the current address (may precede an
//!   instruction on the same line).
//! * Registers are `x0`..`x31` or ABI names.
//! * Immediates are decimal, `0x` hex or `0b` binary, optionally negative.
//! * Loads, stores and `jalr` take `imm(reg)` memory operands.
//! * Branch and `jal` targets are labels or byte offsets.
//!
//! The first pass assigns addresses and collects labels, the second encodes.

use std::collections::HashMap;
use std::ops::RangeInclusive;

use crate::asm::{Assembler, MemoryImage};
use crate::common::AsmError;
use crate::common::constants::INSTRUCTION_BYTES;
use crate::isa::abi;
use crate::isa::encode::{b_type, i_type, j_type, r_type, s_type, u_type};
use crate::isa::rv32i::{funct3 as f3, funct7 as f7, opcodes as op};
use crate::isa::rv32m::{M_EXTENSION, funct3 as m_f3};

/// Signed 12-bit immediate range (I and S formats).
const IMM12: RangeInclusive<i64> = -2048..=2047;

/// Upper-immediate range. Negative values are accepted and masked to 20 bits.
const IMM20: RangeInclusive<i64> = -(1 << 19)..=0xF_FFFF;

/// Branch offset range (13-bit signed, even).
const BRANCH_RANGE: RangeInclusive<i64> = -4096..=4094;

/// JAL offset range (21-bit signed, even).
const JAL_RANGE: RangeInclusive<i64> = -(1 << 20)..=(1 << 20) - 2;

/// Shift amount range.
const SHAMT: RangeInclusive<i64> = 0..=31;

/// Parses an integer literal: decimal, `0x` hex or `0b` binary, optional sign.
pub fn parse_immediate(token: &str) -> Option<i64> {
    let token = token.trim();
    let (negative, digits) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token.strip_prefix('+').unwrap_or(token)),
    };
    let magnitude = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()?
    } else if let Some(bin) = digits.strip_prefix("0b").or_else(|| digits.strip_prefix("0B")) {
        i64::from_str_radix(bin, 2).ok()?
    } else {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse::<i64>().ok()?
    };
    Some(if negative { -magnitude } else { magnitude })
}

/// The built-in assembler. Places program text at `base`.
#[derive(Debug, Clone, Copy)]
pub struct Rv32Assembler {
    base: u32,
}

impl Rv32Assembler {
    /// Creates an assembler placing text at `base`.
    pub const fn new(base: u32) -> Self {
        Self { base }
    }

    /// Text base address.
    pub const fn base(&self) -> u32 {
        self.base
    }

    fn first_pass<'a>(
        &self,
        program: &'a str,
    ) -> Result<(Vec<SourceLine<'a>>, HashMap<&'a str, u32>), AsmError> {
        let mut labels = HashMap::new();
        let mut lines = Vec::new();
        let mut addr = self.base;

        for (idx, raw) in program.lines().enumerate() {
            let line = idx + 1;
            let mut text = raw.split('#').next().unwrap_or_default().trim();

            while let Some((label, rest)) = text.split_once(':') {
                let label = label.trim();
                if label.is_empty() || label.contains(char::is_whitespace) {
                    break;
                }
                if labels.insert(label, addr).is_some() {
                    return Err(AsmError::DuplicateLabel {
                        line,
                        label: label.to_string(),
                    });
                }
                text = rest.trim();
            }
            if text.is_empty() {
                continue;
            }

            let (mnemonic, rest) = text
                .split_once(char::is_whitespace)
                .map_or((text, ""), |(m, r)| (m, r.trim()));
            let operands = if rest.is_empty() {
                Vec::new()
            } else {
                rest.split(',').map(str::trim).collect()
            };
            lines.push(SourceLine {
                line,
                addr,
                mnemonic,
                operands,
            });
            addr = addr.wrapping_add(INSTRUCTION_BYTES);
        }
        Ok((lines, labels))
    }
}

impl Assembler for Rv32Assembler {
    fn assemble(&self, program: &str) -> Result<MemoryImage, AsmError> {
        let (lines, labels) = self.first_pass(program)?;

        let mut text = Vec::with_capacity(lines.len() * INSTRUCTION_BYTES as usize);
        for src in &lines {
            let word = src.encode(&labels)?;
            text.extend_from_slice(&word.to_le_bytes());
        }

        let mut image = MemoryImage::new(self.base);
        if !text.is_empty() {
            image.push_section(self.base, text);
        }
        Ok(image)
    }
}

/// One instruction line after the first pass.
#[derive(Debug)]
struct SourceLine<'a> {
    line: usize,
    addr: u32,
    mnemonic: &'a str,
    operands: Vec<&'a str>,
}

impl SourceLine<'_> {
    fn encode(&self, labels: &HashMap<&str, u32>) -> Result<u32, AsmError> {
        let mn = self.mnemonic.to_ascii_lowercase();

        if let Some((funct3, funct7)) = reg_op(&mn) {
            self.expect(&mn, 3)?;
            return Ok(r_type(
                op::OP_REG,
                self.reg(0)?,
                funct3,
                self.reg(1)?,
                self.reg(2)?,
                funct7,
            ));
        }
        if let Some(funct3) = imm_op(&mn) {
            self.expect(&mn, 3)?;
            let imm = self.imm(&mn, 2, &IMM12)?;
            return Ok(i_type(op::OP_IMM, self.reg(0)?, funct3, self.reg(1)?, imm as i32));
        }
        if let Some((funct3, funct7)) = shift_op(&mn) {
            self.expect(&mn, 3)?;
            let shamt = self.imm(&mn, 2, &SHAMT)? as i32;
            let imm = ((funct7 << 5) as i32) | shamt;
            return Ok(i_type(op::OP_IMM, self.reg(0)?, funct3, self.reg(1)?, imm));
        }
        if let Some(funct3) = load_op(&mn) {
            self.expect(&mn, 2)?;
            let (offset, base) = self.mem(&mn, 1)?;
            return Ok(i_type(op::OP_LOAD, self.reg(0)?, funct3, base, offset));
        }
        if let Some(funct3) = store_op(&mn) {
            self.expect(&mn, 2)?;
            let (offset, base) = self.mem(&mn, 1)?;
            return Ok(s_type(op::OP_STORE, funct3, base, self.reg(0)?, offset));
        }
        if let Some(funct3) = branch_op(&mn) {
            self.expect(&mn, 3)?;
            let offset = self.target(&mn, 2, labels, &BRANCH_RANGE)?;
            return Ok(b_type(op::OP_BRANCH, funct3, self.reg(0)?, self.reg(1)?, offset));
        }

        match mn.as_str() {
            "lui" | "auipc" => {
                self.expect(&mn, 2)?;
                let opcode = if mn == "lui" { op::OP_LUI } else { op::OP_AUIPC };
                let imm = self.imm(&mn, 1, &IMM20)?;
                Ok(u_type(opcode, self.reg(0)?, imm as u32))
            }
            "jal" => match self.operands.len() {
                1 => Ok(j_type(
                    op::OP_JAL,
                    1,
                    self.target(&mn, 0, labels, &JAL_RANGE)?,
                )),
                _ => {
                    self.expect(&mn, 2)?;
                    let offset = self.target(&mn, 1, labels, &JAL_RANGE)?;
                    Ok(j_type(op::OP_JAL, self.reg(0)?, offset))
                }
            },
            "jalr" => {
                self.expect(&mn, 2)?;
                let (offset, base) = self.mem(&mn, 1)?;
                Ok(i_type(op::OP_JALR, self.reg(0)?, f3::JALR, base, offset))
            }
            "ecall" => {
                self.expect(&mn, 0)?;
                Ok(op::ECALL)
            }
            "nop" => {
                self.expect(&mn, 0)?;
                Ok(op::NOP)
            }
            _ => Err(AsmError::UnknownMnemonic {
                line: self.line,
                mnemonic: self.mnemonic.to_string(),
            }),
        }
    }

    fn expect(&self, mnemonic: &str, expected: usize) -> Result<(), AsmError> {
        if self.operands.len() == expected {
            Ok(())
        } else {
            Err(AsmError::OperandCount {
                line: self.line,
                mnemonic: mnemonic.to_string(),
                expected,
                found: self.operands.len(),
            })
        }
    }

    fn operand(&self, idx: usize) -> &str {
        self.operands.get(idx).copied().unwrap_or_default()
    }

    fn reg(&self, idx: usize) -> Result<usize, AsmError> {
        let token = self.operand(idx);
        abi::parse_register(token).ok_or_else(|| AsmError::InvalidRegister {
            line: self.line,
            token: token.to_string(),
        })
    }

    fn imm(&self, mnemonic: &str, idx: usize, range: &RangeInclusive<i64>) -> Result<i64, AsmError> {
        let token = self.operand(idx);
        let value = parse_immediate(token).ok_or_else(|| AsmError::InvalidImmediate {
            line: self.line,
            token: token.to_string(),
        })?;
        self.check_range(mnemonic, value, range)
    }

    fn check_range(
        &self,
        mnemonic: &str,
        value: i64,
        range: &RangeInclusive<i64>,
    ) -> Result<i64, AsmError> {
        if range.contains(&value) {
            Ok(value)
        } else {
            Err(AsmError::ImmediateRange {
                line: self.line,
                mnemonic: mnemonic.to_string(),
                value,
            })
        }
    }

    /// Parses `imm(reg)`; a bare `(reg)` means offset zero.
    fn mem(&self, mnemonic: &str, idx: usize) -> Result<(i32, usize), AsmError> {
        let token = self.operand(idx);
        let malformed = || AsmError::MemoryOperand {
            line: self.line,
            token: token.to_string(),
        };
        let (offset, rest) = token.split_once('(').ok_or_else(malformed)?;
        let base = rest.strip_suffix(')').ok_or_else(malformed)?;
        let offset = if offset.trim().is_empty() {
            0
        } else {
            let value = parse_immediate(offset).ok_or_else(|| AsmError::InvalidImmediate {
                line: self.line,
                token: offset.to_string(),
            })?;
            self.check_range(mnemonic, value, &IMM12)?
        };
        let base = abi::parse_register(base).ok_or_else(|| AsmError::InvalidRegister {
            line: self.line,
            token: base.to_string(),
        })?;
        Ok((offset as i32, base))
    }

    /// Resolves a branch/jump target: a label, or a literal byte offset.
    fn target(
        &self,
        mnemonic: &str,
        idx: usize,
        labels: &HashMap<&str, u32>,
        range: &RangeInclusive<i64>,
    ) -> Result<i32, AsmError> {
        let token = self.operand(idx);
        let offset = match parse_immediate(token) {
            Some(offset) => offset,
            None => {
                let target = labels.get(token).ok_or_else(|| AsmError::UndefinedLabel {
                    line: self.line,
                    label: token.to_string(),
                })?;
                i64::from(*target) - i64::from(self.addr)
            }
        };
        if offset % 2 != 0 {
            return Err(AsmError::ImmediateRange {
                line: self.line,
                mnemonic: mnemonic.to_string(),
                value: offset,
            });
        }
        Ok(self.check_range(mnemonic, offset, range)? as i32)
    }
}

fn reg_op(mn: &str) -> Option<(u32, u32)> {
    Some(match mn {
        "add" => (f3::ADD_SUB, f7::DEFAULT),
        "sub" => (f3::ADD_SUB, f7::ALT),
        "sll" => (f3::SLL, f7::DEFAULT),
        "slt" => (f3::SLT, f7::DEFAULT),
        "sltu" => (f3::SLTU, f7::DEFAULT),
        "xor" => (f3::XOR, f7::DEFAULT),
        "srl" => (f3::SRL_SRA, f7::DEFAULT),
        "sra" => (f3::SRL_SRA, f7::ALT),
        "or" => (f3::OR, f7::DEFAULT),
        "and" => (f3::AND, f7::DEFAULT),
        "mul" => (m_f3::MUL, M_EXTENSION),
        "mulh" => (m_f3::MULH, M_EXTENSION),
        "mulhsu" => (m_f3::MULHSU, M_EXTENSION),
        "mulhu" => (m_f3::MULHU, M_EXTENSION),
        "div" => (m_f3::DIV, M_EXTENSION),
        "divu" => (m_f3::DIVU, M_EXTENSION),
        "rem" => (m_f3::REM, M_EXTENSION),
        "remu" => (m_f3::REMU, M_EXTENSION),
        _ => return None,
    })
}

fn imm_op(mn: &str) -> Option<u32> {
    Some(match mn {
        "addi" => f3::ADD_SUB,
        "slti" => f3::SLT,
        "sltiu" => f3::SLTU,
        "xori" => f3::XOR,
        "ori" => f3::OR,
        "andi" => f3::AND,
        _ => return None,
    })
}

fn shift_op(mn: &str) -> Option<(u32, u32)> {
    Some(match mn {
        "slli" => (f3::SLL, f7::DEFAULT),
        "srli" => (f3::SRL_SRA, f7::DEFAULT),
        "srai" => (f3::SRL_SRA, f7::ALT),
        _ => return None,
    })
}

fn load_op(mn: &str) -> Option<u32> {
    Some(match mn {
        "lb" => f3::LB,
        "lh" => f3::LH,
        "lw" => f3::LW,
        "lbu" => f3::LBU,
        "lhu" => f3::LHU,
        _ => return None,
    })
}

fn store_op(mn: &str) -> Option<u32> {
    Some(match mn {
        "sb" => f3::SB,
        "sh" => f3::SH,
        "sw" => f3::SW,
        _ => return None,
    })
}

fn branch_op(mn: &str) -> Option<u32> {
    Some(match mn {
        "beq" => f3::BEQ,
        "bne" => f3::BNE,
        "blt" => f3::BLT,
        "bge" => f3::BGE,
        "bltu" => f3::BLTU,
        "bgeu" => f3::BGEU,
        _ => return None,
    })
}
