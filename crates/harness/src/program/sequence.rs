//! Instruction sequences and the addresses they touch.

use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;

use crate::isa::abi;
use crate::program::epilogue::{EPILOGUE_INSTRUCTIONS, epilogue_lines};

/// End-of-test marker appended to reference programs.
const REFERENCE_TERMINATOR: &str = "ecall";

/// Generator bounds: instruction count and distinct register count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Bounds {
    /// Minimum number of instructions in a sequence.
    pub min_instructions: usize,
    /// Maximum number of instructions in a sequence.
    pub max_instructions: usize,
    /// Minimum number of distinct registers a sequence uses.
    pub min_registers: usize,
    /// Maximum number of distinct registers a sequence uses.
    pub max_registers: usize,
}

/// An ordered, immutable list of instruction lines (`mnemonic operands`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct InstructionSequence {
    lines: Vec<String>,
}

impl InstructionSequence {
    /// Wraps already-generated lines.
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Re-parses the newline-joined form written to session files.
    ///
    /// Blank lines are dropped and surrounding whitespace trimmed.
    pub fn from_text(text: &str) -> Self {
        Self::new(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty()),
        )
    }

    /// The instruction lines.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// True for the empty sequence.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// First line using the reference end-of-test marker, as a 1-based line
    /// number and the mnemonic.
    ///
    /// Such a sequence stops the reference early while the DUT traps, so it is
    /// not a valid test case.
    pub fn reserved_instruction(&self) -> Option<(usize, &str)> {
        self.lines.iter().enumerate().find_map(|(i, line)| {
            let code = line.split_once('#').map_or(line.as_str(), |(code, _)| code);
            let body = code.split_once(':').map_or(code, |(_, rest)| rest);
            let mnemonic = body.split_whitespace().next()?;
            mnemonic
                .eq_ignore_ascii_case(REFERENCE_TERMINATOR)
                .then_some((i + 1, mnemonic))
        })
    }

    /// Newline-joined form, as persisted in the session file.
    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }

    /// Number of distinct numeric registers (`xN`) referenced.
    pub fn register_count(&self) -> usize {
        let mut seen = BTreeSet::new();
        for line in &self.lines {
            let tokens = line
                .split(|c: char| c.is_whitespace() || c == ',' || c == '(' || c == ')')
                .filter(|token| token.starts_with('x'));
            for token in tokens {
                if let Some(idx) = abi::parse_register(token) {
                    let _ = seen.insert(idx);
                }
            }
        }
        seen.len()
    }

    /// DUT program text: the sequence followed by the register-dump epilogue.
    pub fn dut_program(&self) -> String {
        let mut lines = self.lines.clone();
        lines.extend(epilogue_lines());
        lines.join("\n")
    }

    /// Instruction count of the DUT program, the basis of the DUT cycle budget.
    pub fn dut_instruction_count(&self) -> usize {
        self.lines.len() + EPILOGUE_INSTRUCTIONS
    }

    /// Reference program text: the sequence followed by the end-of-test marker.
    pub fn reference_program(&self) -> String {
        let mut text = self.to_text();
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(REFERENCE_TERMINATOR);
        text
    }
}

impl fmt::Display for InstructionSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Number of instructions = {}", self.len())?;
        writeln!(f, "Number of registers used = {}", self.register_count())?;
        for line in &self.lines {
            writeln!(f, "  {line}")?;
        }
        Ok(())
    }
}

/// Byte addresses a sequence is expected to touch; scopes the memory comparison.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AddressSet {
    addrs: BTreeSet<u32>,
}

impl AddressSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a single byte address.
    pub fn insert(&mut self, addr: u32) {
        let _ = self.addrs.insert(addr);
    }

    /// Adds `len` consecutive byte addresses starting at `addr`.
    pub fn insert_range(&mut self, addr: u32, len: u32) {
        for offset in 0..len {
            self.insert(addr.wrapping_add(offset));
        }
    }

    /// Iterates the addresses in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.addrs.iter().copied()
    }

    /// Number of addresses.
    pub fn len(&self) -> usize {
        self.addrs.len()
    }

    /// True when no address is tracked.
    pub fn is_empty(&self) -> bool {
        self.addrs.is_empty()
    }

    /// Membership test.
    pub fn contains(&self, addr: u32) -> bool {
        self.addrs.contains(&addr)
    }
}

impl FromIterator<u32> for AddressSet {
    fn from_iter<T: IntoIterator<Item = u32>>(iter: T) -> Self {
        Self {
            addrs: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for AddressSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, addr) in self.addrs.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{addr:#x}")?;
        }
        f.write_str("]")
    }
}
