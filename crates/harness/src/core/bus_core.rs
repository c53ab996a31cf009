//! Multi-cycle RV32IM core on the native memory interface.
//!
//! Every instruction walks a small state machine:
//! 1. **Fetch:** drive an instruction fetch and wait for `ready`.
//! 2. **Execute:** decode, run the ALU, resolve branches and jumps.
//! 3. **Multiply:** multiplies retire a few bits per clock in [`Multiplier`].
//! 4. **Memory:** loads and stores drive one word-aligned data access with a
//!    byte strobe and wait for `ready`.
//!
//! Illegal instructions, `ecall` and misaligned accesses or jump targets trap:
//! the core stops issuing requests for good, which the runner sees as a hang.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::core::alu::Alu;
use crate::core::multiplier::Multiplier;
use crate::core::signals::AluOp;
use crate::core::{Dut, DutFactory};
use crate::isa::abi::NUM_REGS;
use crate::isa::decode::decode;
use crate::isa::disasm::disassemble;
use crate::isa::instruction::Decoded;
use crate::isa::rv32i::{funct3 as f3, opcodes as op};
use crate::soc::{BusRequest, BusResponse};

/// Which datapath the core is built with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DutVariant {
    /// Architecturally correct.
    #[default]
    Correct,
    /// The multiplier accumulator drops the carry from bit 31 into bit 32,
    /// corrupting the upper word of `mulh`, `mulhsu` and `mulhu`.
    MulCarryChain,
}

impl DutVariant {
    /// Every variant, in declaration order.
    pub const ALL: [Self; 2] = [Self::Correct, Self::MulCarryChain];

    /// Stable name, also used to key session files.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Correct => "correct",
            Self::MulCarryChain => "mul-carrychain",
        }
    }
}

impl fmt::Display for DutVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DutVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.name() == s)
            .ok_or_else(|| format!("unknown DUT variant `{s}`"))
    }
}

/// Outstanding load: where the loaded bytes go.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct LoadInfo {
    rd: usize,
    funct3: u32,
    shift: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Fetch,
    Execute,
    Multiply { rd: usize },
    Memory { req: BusRequest, load: Option<LoadInfo> },
    Trap,
}

/// The built-in DUT.
#[derive(Clone, Debug)]
pub struct BusCore {
    regs: [u32; NUM_REGS],
    pc: u32,
    reset_vector: u32,
    instr: u32,
    state: State,
    mul: Multiplier,
    retired: u64,
}

impl BusCore {
    /// Creates a core that fetches from `reset_vector` after reset.
    pub fn new(reset_vector: u32, variant: DutVariant) -> Self {
        Self {
            regs: [0; NUM_REGS],
            pc: reset_vector,
            reset_vector,
            instr: 0,
            state: State::Fetch,
            mul: Multiplier::new(variant),
            retired: 0,
        }
    }

    /// Register `idx`; `x0` reads as zero.
    pub fn reg(&self, idx: usize) -> u32 {
        self.regs.get(idx).copied().unwrap_or(0)
    }

    /// Current program counter.
    pub const fn pc(&self) -> u32 {
        self.pc
    }

    /// Instructions retired since reset.
    pub const fn retired(&self) -> u64 {
        self.retired
    }

    fn write_reg(&mut self, rd: usize, value: u32) {
        if rd == 0 {
            return;
        }
        if let Some(r) = self.regs.get_mut(rd) {
            *r = value;
        }
    }

    fn retire(&mut self, next_pc: u32) {
        self.pc = next_pc;
        self.retired += 1;
        self.state = State::Fetch;
    }

    fn trap(&mut self, reason: &str) {
        warn!(
            pc = format_args!("{:#010x}", self.pc),
            instr = %disassemble(self.instr),
            reason,
            "DUT trapped"
        );
        self.state = State::Trap;
    }

    fn jump(&mut self, rd: usize, target: u32) {
        if target & 3 != 0 {
            self.trap("misaligned jump target");
            return;
        }
        let link = self.pc.wrapping_add(4);
        self.write_reg(rd, link);
        self.retire(target);
    }

    fn execute(&mut self) {
        let d = decode(self.instr);
        let rs1 = self.reg(d.rs1);
        let rs2 = self.reg(d.rs2);
        let imm = d.imm as u32;
        let next_pc = self.pc.wrapping_add(4);

        match d.opcode {
            op::OP_LUI => {
                self.write_reg(d.rd, imm);
                self.retire(next_pc);
            }
            op::OP_AUIPC => {
                self.write_reg(d.rd, self.pc.wrapping_add(imm));
                self.retire(next_pc);
            }
            op::OP_JAL => self.jump(d.rd, self.pc.wrapping_add(imm)),
            op::OP_JALR if d.funct3 == f3::JALR => self.jump(d.rd, rs1.wrapping_add(imm) & !1),
            op::OP_BRANCH => match branch_taken(d.funct3, rs1, rs2) {
                Some(true) => {
                    let target = self.pc.wrapping_add(imm);
                    if target & 3 == 0 {
                        self.retire(target);
                    } else {
                        self.trap("misaligned branch target");
                    }
                }
                Some(false) => self.retire(next_pc),
                None => self.trap("illegal branch"),
            },
            op::OP_LOAD => self.load(&d, rs1.wrapping_add(imm)),
            op::OP_STORE => self.store(&d, rs1.wrapping_add(imm), rs2),
            op::OP_REG | op::OP_IMM => {
                let Some(alu_op) = AluOp::from_decoded(&d) else {
                    self.trap("illegal instruction");
                    return;
                };
                let b = if d.opcode == op::OP_REG { rs2 } else { imm };
                if alu_op.is_mul() {
                    self.mul.start(alu_op, rs1, b);
                    self.state = State::Multiply { rd: d.rd };
                } else {
                    self.write_reg(d.rd, Alu::execute(alu_op, rs1, b));
                    self.retire(next_pc);
                }
            }
            op::OP_SYSTEM => self.trap("environment call"),
            _ => self.trap("illegal instruction"),
        }
    }

    fn load(&mut self, d: &Decoded, addr: u32) {
        let size = match d.funct3 {
            f3::LB | f3::LBU => 1,
            f3::LH | f3::LHU => 2,
            f3::LW => 4,
            _ => {
                self.trap("illegal load");
                return;
            }
        };
        if addr % size != 0 {
            self.trap("misaligned load");
            return;
        }
        self.state = State::Memory {
            req: BusRequest::read(addr & !3),
            load: Some(LoadInfo {
                rd: d.rd,
                funct3: d.funct3,
                shift: (addr & 3) * 8,
            }),
        };
    }

    fn store(&mut self, d: &Decoded, addr: u32, value: u32) {
        let (size, wdata, lanes) = match d.funct3 {
            f3::SB => (1, (value & 0xFF) * 0x0101_0101, 0b0001),
            f3::SH => (2, (value & 0xFFFF) * 0x0001_0001, 0b0011),
            f3::SW => (4, value, 0b1111),
            _ => {
                self.trap("illegal store");
                return;
            }
        };
        if addr % size != 0 {
            self.trap("misaligned store");
            return;
        }
        let wstrb = lanes << (addr & 3);
        self.state = State::Memory {
            req: BusRequest::write(addr & !3, wdata, wstrb),
            load: None,
        };
    }
}

impl Dut for BusCore {
    fn reset(&mut self) {
        self.regs = [0; NUM_REGS];
        self.pc = self.reset_vector;
        self.instr = 0;
        self.state = State::Fetch;
        self.retired = 0;
    }

    fn request(&self) -> BusRequest {
        match self.state {
            State::Fetch => BusRequest::fetch(self.pc),
            State::Memory { req, .. } => req,
            State::Execute | State::Multiply { .. } | State::Trap => BusRequest::IDLE,
        }
    }

    fn step(&mut self, resp: BusResponse) {
        match self.state {
            State::Fetch => {
                if resp.ready {
                    self.instr = resp.rdata;
                    self.state = State::Execute;
                }
            }
            State::Execute => self.execute(),
            State::Multiply { rd } => {
                self.mul.step();
                if !self.mul.busy() {
                    self.write_reg(rd, self.mul.result());
                    self.retire(self.pc.wrapping_add(4));
                }
            }
            State::Memory { load, .. } => {
                if resp.ready {
                    if let Some(info) = load {
                        self.write_reg(info.rd, extract_load(info, resp.rdata));
                    }
                    self.retire(self.pc.wrapping_add(4));
                }
            }
            State::Trap => {}
        }
    }

    fn trapped(&self) -> bool {
        self.state == State::Trap
    }
}

fn branch_taken(funct3: u32, a: u32, b: u32) -> Option<bool> {
    Some(match funct3 {
        f3::BEQ => a == b,
        f3::BNE => a != b,
        f3::BLT => (a as i32) < (b as i32),
        f3::BGE => (a as i32) >= (b as i32),
        f3::BLTU => a < b,
        f3::BGEU => a >= b,
        _ => return None,
    })
}

fn extract_load(info: LoadInfo, word: u32) -> u32 {
    let shifted = word >> info.shift;
    match info.funct3 {
        f3::LB => shifted as u8 as i8 as i32 as u32,
        f3::LBU => u32::from(shifted as u8),
        f3::LH => shifted as u16 as i16 as i32 as u32,
        f3::LHU => u32::from(shifted as u16),
        _ => word,
    }
}

/// Elaborates [`BusCore`]s.
#[derive(Clone, Copy, Debug)]
pub struct BusCoreFactory {
    reset_vector: u32,
    variant: DutVariant,
}

impl BusCoreFactory {
    /// Creates a factory for cores resetting to `reset_vector`.
    pub const fn new(reset_vector: u32, variant: DutVariant) -> Self {
        Self {
            reset_vector,
            variant,
        }
    }

    /// The datapath variant built.
    pub const fn variant(&self) -> DutVariant {
        self.variant
    }
}

impl DutFactory for BusCoreFactory {
    fn elaborate(&self, recompile: bool) -> Box<dyn Dut> {
        if recompile {
            debug!(variant = %self.variant, "elaborating bus core");
        }
        Box::new(BusCore::new(self.reset_vector, self.variant))
    }
}
