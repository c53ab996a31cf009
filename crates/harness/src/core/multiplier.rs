//! Iterative shift-add multiplier.
//!
//! Operands are extended to 64 bits (sign or zero, per instruction) and
//! multiplied modulo 2^64, [`BITS_PER_CYCLE`] multiplier bits per clock. The
//! low word of the accumulator is the `MUL` result, the high word the
//! `MULH*` result.

use crate::core::bus_core::DutVariant;
use crate::core::signals::AluOp;

/// Multiplier bits retired per clock.
pub const BITS_PER_CYCLE: u32 = 4;

/// Width of the extended operands.
const OPERAND_BITS: u32 = 64;

/// Multiplier state.
#[derive(Clone, Debug, Default)]
pub struct Multiplier {
    op: AluOp,
    multiplicand: u64,
    multiplier: u64,
    acc: u64,
    remaining: u32,
    variant: DutVariant,
}

impl Multiplier {
    /// Creates an idle multiplier with the given datapath variant.
    pub fn new(variant: DutVariant) -> Self {
        Self {
            variant,
            ..Self::default()
        }
    }

    /// Latches operands and starts a multiply. `op` must be a multiply.
    pub fn start(&mut self, op: AluOp, a: u32, b: u32) {
        let a_signed = matches!(op, AluOp::Mulh | AluOp::Mulhsu);
        let b_signed = op == AluOp::Mulh;
        self.op = op;
        self.multiplicand = extend(a, a_signed);
        self.multiplier = extend(b, b_signed);
        self.acc = 0;
        self.remaining = OPERAND_BITS;
    }

    /// True while bits remain.
    pub const fn busy(&self) -> bool {
        self.remaining > 0
    }

    /// Retires up to [`BITS_PER_CYCLE`] multiplier bits.
    pub fn step(&mut self) {
        for _ in 0..BITS_PER_CYCLE.min(self.remaining) {
            if self.multiplier & 1 != 0 {
                self.acc = self.add(self.acc, self.multiplicand);
            }
            self.multiplicand <<= 1;
            self.multiplier >>= 1;
            self.remaining -= 1;
        }
    }

    /// The result word for the latched operation.
    pub const fn result(&self) -> u32 {
        match self.op {
            AluOp::Mul => self.acc as u32,
            _ => (self.acc >> 32) as u32,
        }
    }

    /// Accumulator adder.
    fn add(&self, a: u64, b: u64) -> u64 {
        match self.variant {
            DutVariant::Correct => a.wrapping_add(b),
            DutVariant::MulCarryChain => {
                // Carry out of bit 31 is lost.
                let low = (a as u32).wrapping_add(b as u32);
                let high = ((a >> 32) as u32).wrapping_add((b >> 32) as u32);
                (u64::from(high) << 32) | u64::from(low)
            }
        }
    }
}

fn extend(value: u32, signed: bool) -> u64 {
    if signed {
        value as i32 as i64 as u64
    } else {
        u64::from(value)
    }
}
