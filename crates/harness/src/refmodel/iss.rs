//! Functional RV32IM interpreter.
//!
//! One instruction per [`step`](ReferenceModel::step). Execution ends at the
//! first `ecall`. Stores to the control and dump channels are accepted and
//! discarded so hand-written programs that report through them still run;
//! any other access outside memory faults.
//!
//! Arithmetic is evaluated here from the decoded fields and shares no code
//! with the bus core's ALU or multiplier.

use std::ops::Range;

use crate::asm::MemoryImage;
use crate::common::RefFault;
use crate::common::constants::{CONTROL_ADDR, DUMP_ADDR};
use crate::isa::abi::NUM_REGS;
use crate::isa::decode::decode;
use crate::isa::instruction::Decoded;
use crate::isa::rv32i::{funct3 as f3, funct7 as f7, opcodes as op};
use crate::isa::rv32m::{M_EXTENSION, funct3 as m3};
use crate::refmodel::ReferenceModel;
use crate::soc::Memory;

/// Reference instruction-set simulator with private memory.
#[derive(Clone, Debug)]
pub struct Iss {
    regs: [u32; NUM_REGS],
    pc: u32,
    entry: u32,
    memory: Memory,
    done: bool,
    retired: u64,
}

impl Iss {
    /// Creates an interpreter with `mem_size` bytes of zeroed memory,
    /// starting at `entry` unless a loaded image says otherwise.
    pub fn new(mem_size: u32, entry: u32) -> Self {
        Self {
            regs: [0; NUM_REGS],
            pc: entry,
            entry,
            memory: Memory::new(mem_size),
            done: false,
            retired: 0,
        }
    }

    /// Current program counter.
    pub const fn pc(&self) -> u32 {
        self.pc
    }

    /// Instructions retired since reset (the end-of-test marker excluded).
    pub const fn retired(&self) -> u64 {
        self.retired
    }

    /// The reference memory.
    pub const fn memory(&self) -> &Memory {
        &self.memory
    }

    fn write_reg(&mut self, rd: usize, value: u32) {
        if rd == 0 {
            return;
        }
        if let Some(r) = self.regs.get_mut(rd) {
            *r = value;
        }
    }

    fn check_access(&self, addr: u32, size: u32, fault: fn(u32) -> RefFault) -> Result<(), RefFault> {
        if addr % size != 0 {
            return Err(RefFault::Misaligned { addr, pc: self.pc });
        }
        if !self.memory.contains(addr, size) {
            return Err(fault(addr));
        }
        Ok(())
    }

    fn load_data(&self, funct3: u32, addr: u32) -> Result<u32, RefFault> {
        let size = match funct3 {
            f3::LB | f3::LBU => 1,
            f3::LH | f3::LHU => 2,
            f3::LW => 4,
            _ => return Err(self.illegal()),
        };
        self.check_access(addr, size, RefFault::LoadAccessFault)?;
        let mut raw = 0u32;
        for i in (0..size).rev() {
            let byte = self.memory.read_byte(addr + i).unwrap_or(0);
            raw = (raw << 8) | u32::from(byte);
        }
        Ok(match funct3 {
            f3::LB => raw as u8 as i8 as i32 as u32,
            f3::LH => raw as u16 as i16 as i32 as u32,
            _ => raw,
        })
    }

    fn store(&mut self, funct3: u32, addr: u32, value: u32) -> Result<(), RefFault> {
        let size = match funct3 {
            f3::SB => 1,
            f3::SH => 2,
            f3::SW => 4,
            _ => return Err(self.illegal()),
        };
        if matches!(addr & !3, CONTROL_ADDR | DUMP_ADDR) {
            return Ok(());
        }
        self.check_access(addr, size, RefFault::StoreAccessFault)?;
        for (i, byte) in value.to_le_bytes().into_iter().take(size as usize).enumerate() {
            let _ = self.memory.write_byte(addr + i as u32, byte);
        }
        Ok(())
    }

    fn illegal(&self) -> RefFault {
        RefFault::IllegalInstruction {
            pc: self.pc,
            inst: self.memory.read_word(self.pc),
        }
    }

    fn jump_target(&self, target: u32) -> Result<u32, RefFault> {
        if target & 3 == 0 {
            Ok(target)
        } else {
            Err(RefFault::Misaligned {
                addr: target,
                pc: self.pc,
            })
        }
    }
}

impl ReferenceModel for Iss {
    fn reset(&mut self) {
        self.regs = [0; NUM_REGS];
        self.pc = self.entry;
        self.done = false;
        self.retired = 0;
    }

    fn load(&mut self, image: &MemoryImage) {
        let _ = self.memory.load(image);
        self.entry = image.entry();
    }

    fn fill(&mut self, range: Range<u32>, value: u8) {
        self.memory.fill(range, value);
    }

    fn step(&mut self) -> Result<(), RefFault> {
        if self.done {
            return Ok(());
        }
        if self.pc & 3 != 0 || !self.memory.contains(self.pc, 4) {
            return Err(RefFault::FetchFault(self.pc));
        }
        let inst = self.memory.read_word(self.pc);
        let d = decode(inst);
        let rs1 = self.regs[d.rs1];
        let rs2 = self.regs[d.rs2];
        let imm = d.imm as u32;
        let mut next_pc = self.pc.wrapping_add(4);

        match d.opcode {
            op::OP_LUI => self.write_reg(d.rd, imm),
            op::OP_AUIPC => self.write_reg(d.rd, self.pc.wrapping_add(imm)),
            op::OP_JAL => {
                next_pc = self.jump_target(self.pc.wrapping_add(imm))?;
                self.write_reg(d.rd, self.pc.wrapping_add(4));
            }
            op::OP_JALR if d.funct3 == f3::JALR => {
                next_pc = self.jump_target(rs1.wrapping_add(imm) & !1)?;
                self.write_reg(d.rd, self.pc.wrapping_add(4));
            }
            op::OP_BRANCH => {
                let taken = match d.funct3 {
                    f3::BEQ => rs1 == rs2,
                    f3::BNE => rs1 != rs2,
                    f3::BLT => (rs1 as i32) < (rs2 as i32),
                    f3::BGE => (rs1 as i32) >= (rs2 as i32),
                    f3::BLTU => rs1 < rs2,
                    f3::BGEU => rs1 >= rs2,
                    _ => return Err(self.illegal()),
                };
                if taken {
                    next_pc = self.jump_target(self.pc.wrapping_add(imm))?;
                }
            }
            op::OP_LOAD => {
                let value = self.load_data(d.funct3, rs1.wrapping_add(imm))?;
                self.write_reg(d.rd, value);
            }
            op::OP_STORE => self.store(d.funct3, rs1.wrapping_add(imm), rs2)?,
            op::OP_REG => {
                let value = op_reg(&d, rs1, rs2).ok_or_else(|| self.illegal())?;
                self.write_reg(d.rd, value);
            }
            op::OP_IMM => {
                let value = op_imm(&d, rs1, imm).ok_or_else(|| self.illegal())?;
                self.write_reg(d.rd, value);
            }
            op::OP_SYSTEM if inst == op::ECALL => {
                self.done = true;
                return Ok(());
            }
            _ => return Err(self.illegal()),
        }

        self.pc = next_pc;
        self.retired += 1;
        Ok(())
    }

    fn is_done(&self) -> bool {
        self.done
    }

    fn reg(&self, idx: usize) -> u32 {
        self.regs.get(idx).copied().unwrap_or(0)
    }

    fn read_byte(&self, addr: u32) -> Option<u8> {
        self.memory.read_byte(addr)
    }
}

/// Register-immediate arithmetic. `None` for an unassigned encoding.
fn op_imm(d: &Decoded, a: u32, imm: u32) -> Option<u32> {
    let shamt = imm & 0x1F;
    Some(match d.funct3 {
        f3::ADD_SUB => a.wrapping_add(imm),
        f3::SLT => u32::from((a as i32) < (imm as i32)),
        f3::SLTU => u32::from(a < imm),
        f3::XOR => a ^ imm,
        f3::OR => a | imm,
        f3::AND => a & imm,
        f3::SLL if d.funct7 == f7::DEFAULT => a << shamt,
        f3::SRL_SRA if d.funct7 == f7::DEFAULT => a >> shamt,
        f3::SRL_SRA if d.funct7 == f7::ALT => ((a as i32) >> shamt) as u32,
        _ => return None,
    })
}

/// Register-register arithmetic, RV32M included. `None` for an unassigned
/// encoding.
fn op_reg(d: &Decoded, a: u32, b: u32) -> Option<u32> {
    let shamt = b & 0x1F;
    Some(match (d.funct7, d.funct3) {
        (f7::DEFAULT, f3::ADD_SUB) => a.wrapping_add(b),
        (f7::ALT, f3::ADD_SUB) => a.wrapping_sub(b),
        (f7::DEFAULT, f3::SLL) => a << shamt,
        (f7::DEFAULT, f3::SLT) => u32::from((a as i32) < (b as i32)),
        (f7::DEFAULT, f3::SLTU) => u32::from(a < b),
        (f7::DEFAULT, f3::XOR) => a ^ b,
        (f7::DEFAULT, f3::SRL_SRA) => a >> shamt,
        (f7::ALT, f3::SRL_SRA) => ((a as i32) >> shamt) as u32,
        (f7::DEFAULT, f3::OR) => a | b,
        (f7::DEFAULT, f3::AND) => a & b,
        (M_EXTENSION, funct3) => mul_div(funct3, a, b),
        _ => return None,
    })
}

/// RV32M results, division by zero and signed overflow as the ISA defines them.
fn mul_div(funct3: u32, a: u32, b: u32) -> u32 {
    let (sa, sb) = (i64::from(a as i32), i64::from(b as i32));
    let (ua, ub) = (u64::from(a), u64::from(b));
    match funct3 {
        m3::MUL => a.wrapping_mul(b),
        m3::MULH => ((sa * sb) >> 32) as u32,
        m3::MULHSU => ((sa * ub as i64) >> 32) as u32,
        m3::MULHU => ((ua * ub) >> 32) as u32,
        m3::DIV => match b {
            0 => u32::MAX,
            _ => (a as i32).wrapping_div(b as i32) as u32,
        },
        m3::DIVU => a.checked_div(b).unwrap_or(u32::MAX),
        m3::REM => match b {
            0 => a,
            _ => (a as i32).wrapping_rem(b as i32) as u32,
        },
        _ => a.checked_rem(b).unwrap_or(a),
    }
}
