//! Sequence complexity.
//!
//! Each instruction scores the sum of its register indices plus `log2` of
//! the sum of its numeric operands' magnitudes (0 when that sum is 0). The
//! canonical score averages this per instruction. The older whole-sequence
//! formula is kept for comparing against session files written with it.

use serde::{Deserialize, Serialize};

use crate::asm::parse_immediate;
use crate::isa::abi;
use crate::program::InstructionSequence;

/// Which complexity formula to apply.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityFormula {
    /// Mean of the per-instruction scores.
    #[default]
    PerInstructionAverage,
    /// Register sum over the whole sequence plus `log2` of the whole
    /// sequence's immediate sum.
    SequenceTotal,
}

/// Register-index sum and immediate-magnitude sum of one instruction line.
fn operand_sums(line: &str) -> (u64, u64) {
    let mut regs = 0u64;
    let mut imms = 0u64;
    let operands = line
        .split(|c: char| c.is_whitespace() || matches!(c, ',' | '(' | ')'))
        .filter(|token| !token.is_empty())
        .skip(1);
    for token in operands {
        if let Some(idx) = abi::parse_register(token) {
            regs += idx as u64;
        } else if let Some(value) = parse_immediate(token) {
            imms = imms.saturating_add(value.unsigned_abs());
        }
    }
    (regs, imms)
}

fn log2_or_zero(sum: u64) -> f64 {
    if sum == 0 { 0.0 } else { (sum as f64).log2() }
}

/// Complexity score of `sequence`; `0.0` for the empty sequence.
pub fn complexity(sequence: &InstructionSequence, formula: ComplexityFormula) -> f64 {
    if sequence.is_empty() {
        return 0.0;
    }
    let sums = sequence.lines().iter().map(|line| operand_sums(line));
    match formula {
        ComplexityFormula::PerInstructionAverage => {
            let total: f64 = sums.map(|(regs, imms)| regs as f64 + log2_or_zero(imms)).sum();
            total / sequence.len() as f64
        }
        ComplexityFormula::SequenceTotal => {
            let (regs, imms) = sums.fold((0u64, 0u64), |(r, i), (regs, imms)| {
                (r + regs, i.saturating_add(imms))
            });
            regs as f64 + log2_or_zero(imms)
        }
    }
}
