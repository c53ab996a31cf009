//! Iterative deepening testing (IDT).
//!
//! Enumerates every sequence of length `d` over a fixed catalogue of
//! instruction steps before moving to length `d + 1`, so the first failure
//! found is one of the shortest the catalogue can express. Registers are
//! chained: each step writes a new register and reads the results of the
//! one or two steps before it.

use crate::program::{AddressSet, Bounds, InstructionSequence};
use crate::search::DataWindow;
use crate::search::instr::{Instr, MAX_GEN_REG, REG_OPS, sequence_of};

/// Upper immediates tried by `lui`.
const LUI_POOL: [u32; 4] = [0x1, 0x7_FFFF, 0x8_0000, 0xF_FFFF];

/// Immediates tried by `addi`.
const ADDI_POOL: [i32; 4] = [-2048, -1, 1, 2047];

/// Shift amounts tried by the shift-immediate forms.
const SHAMT_POOL: [i32; 2] = [1, 31];

/// A catalogue entry; registers are filled in by position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    Lui(u32),
    Imm(&'static str, i32),
    Reg(&'static str),
    Load(&'static str, u32, u32),
    Store(&'static str, u32, u32),
}

/// Restartable enumeration of sequences by increasing length.
#[derive(Clone, Debug)]
pub struct Deepening {
    catalogue: Vec<Step>,
    min_depth: usize,
    max_depth: usize,
    pool: usize,
    depth: usize,
    counter: Vec<usize>,
    exhausted: bool,
}

impl Deepening {
    /// Creates an enumeration over `bounds.min_instructions..=bounds.max_instructions`.
    pub fn new(bounds: Bounds, window: DataWindow) -> Self {
        let min_depth = bounds.min_instructions.max(1);
        let max_depth = bounds.max_instructions.max(min_depth);
        let catalogue = catalogue(window);
        Self {
            exhausted: catalogue.is_empty(),
            catalogue,
            min_depth,
            max_depth,
            pool: bounds.max_registers.clamp(1, MAX_GEN_REG),
            depth: min_depth,
            counter: vec![0; min_depth],
        }
    }

    /// Returns to the first sequence of the shortest length.
    pub fn restart(&mut self) {
        self.depth = self.min_depth;
        self.counter = vec![0; self.min_depth];
        self.exhausted = self.catalogue.is_empty();
    }

    /// Length of the sequences currently being enumerated.
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Number of catalogue entries, the branching factor per position.
    pub fn breadth(&self) -> usize {
        self.catalogue.len()
    }

    fn current(&self) -> Vec<Instr> {
        let reg = |i: usize| (i % self.pool) + 1;
        self.counter
            .iter()
            .enumerate()
            .map(|(i, &choice)| {
                let rd = reg(i);
                let rs1 = if i == 0 { 0 } else { reg(i - 1) };
                let rs2 = if i < 2 { rs1 } else { reg(i - 2) };
                match self.catalogue[choice] {
                    Step::Lui(imm) => Instr::Lui { rd, imm },
                    Step::Imm(op, imm) => Instr::Imm { op, rd, rs1, imm },
                    Step::Reg(op) => Instr::Reg { op, rd, rs1, rs2 },
                    Step::Load(op, size, offset) => Instr::Load {
                        op,
                        rd,
                        offset,
                        size,
                    },
                    Step::Store(op, size, offset) => Instr::Store {
                        op,
                        rs2: rs1,
                        offset,
                        size,
                    },
                }
            })
            .collect()
    }

    fn advance(&mut self) {
        for digit in self.counter.iter_mut().rev() {
            *digit += 1;
            if *digit < self.catalogue.len() {
                return;
            }
            *digit = 0;
        }
        self.depth += 1;
        if self.depth > self.max_depth {
            self.exhausted = true;
        } else {
            self.counter = vec![0; self.depth];
        }
    }
}

impl Iterator for Deepening {
    type Item = (InstructionSequence, AddressSet);

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        let item = sequence_of(&self.current());
        self.advance();
        Some(item)
    }
}

/// Value producers first so short prefixes seed registers before they are
/// combined.
fn catalogue(window: DataWindow) -> Vec<Step> {
    let mut steps: Vec<Step> = LUI_POOL.iter().map(|&imm| Step::Lui(imm)).collect();
    steps.extend(ADDI_POOL.iter().map(|&imm| Step::Imm("addi", imm)));
    steps.extend([Step::Imm("xori", -1), Step::Imm("ori", 0x555), Step::Imm("andi", 0x7FF)]);
    for op in ["slli", "srli", "srai"] {
        steps.extend(SHAMT_POOL.iter().map(|&imm| Step::Imm(op, imm)));
    }
    steps.extend(REG_OPS.iter().map(|&op| Step::Reg(op)));

    let word = window.base;
    if window.contains(word, 4) {
        steps.extend([
            Step::Load("lw", 4, word),
            Step::Load("lh", 2, word + 2),
            Step::Load("lbu", 1, word + 1),
            Step::Store("sw", 4, word),
            Step::Store("sb", 1, word + 3),
        ]);
    }
    steps
}
