//! Architectural state comparison.
//!
//! Compares the DUT's dumped registers against the reference register file,
//! then every byte of the trial's [`AddressSet`] between the two memories.
//! Every difference is recorded before a verdict is returned.

use std::fmt;

use crate::common::constants::DUMP_REGS;
use crate::program::AddressSet;
use crate::refmodel::ReferenceModel;
use crate::soc::{DumpState, Memory};

/// One divergence between DUT and reference state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mismatch {
    /// Register `index` differs.
    Register {
        /// Register index (0..31).
        index: usize,
        /// Value the DUT dumped.
        dut: u32,
        /// Reference register value.
        reference: u32,
    },
    /// The DUT never dumped register `index`.
    MissingRegister {
        /// Register index (0..31).
        index: usize,
    },
    /// Memory byte at `addr` differs. `None` means the address is outside
    /// that side's memory.
    Memory {
        /// Byte address.
        addr: u32,
        /// DUT memory byte.
        dut: Option<u8>,
        /// Reference memory byte.
        reference: Option<u8>,
    },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Register {
                index,
                dut,
                reference,
            } => write!(
                f,
                "dut_regs[{index:>2}] ({dut:#010x}) != ref_regs[{index:>2}] ({reference:#010x})"
            ),
            Self::MissingRegister { index } => write!(f, "dut_regs[{index:>2}] was never dumped"),
            Self::Memory {
                addr,
                dut,
                reference,
            } => write!(
                f,
                "dut_ram[{addr:#010x}] ({}) != ref_ram[{addr:#010x}] ({})",
                ByteView(dut),
                ByteView(reference)
            ),
        }
    }
}

struct ByteView(Option<u8>);

impl fmt::Display for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(b) => write!(f, "{b:#04x}"),
            None => f.write_str("unmapped"),
        }
    }
}

/// Every mismatch found in one comparison, registers first then memory in
/// ascending address order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Comparison {
    mismatches: Vec<Mismatch>,
}

impl Comparison {
    /// True when DUT and reference agree.
    pub fn is_match(&self) -> bool {
        self.mismatches.is_empty()
    }

    /// The recorded mismatches.
    pub fn mismatches(&self) -> &[Mismatch] {
        &self.mismatches
    }

    /// Consumes the comparison, returning the mismatches.
    pub fn into_mismatches(self) -> Vec<Mismatch> {
        self.mismatches
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_match() {
            return f.write_str("[PASSED]");
        }
        writeln!(f, "[FAILED] {} mismatch(es)", self.mismatches.len())?;
        for m in &self.mismatches {
            writeln!(f, "  {m}")?;
        }
        Ok(())
    }
}

/// Compares x0..x30 and the bytes in `addresses`.
pub fn compare(
    dump: &DumpState,
    dut_memory: &Memory,
    reference: &dyn ReferenceModel,
    addresses: &AddressSet,
) -> Comparison {
    let mut mismatches = Vec::new();

    for index in 0..DUMP_REGS {
        let want = reference.reg(index);
        match dump.get(index) {
            Some(got) if got == want => {}
            Some(got) => mismatches.push(Mismatch::Register {
                index,
                dut: got,
                reference: want,
            }),
            None => mismatches.push(Mismatch::MissingRegister { index }),
        }
    }

    for addr in addresses.iter() {
        let dut = dut_memory.read_byte(addr);
        let want = reference.read_byte(addr);
        if dut != want {
            mismatches.push(Mismatch::Memory {
                addr,
                dut,
                reference: want,
            });
        }
    }

    Comparison { mismatches }
}
