//! Instruction-sequence search strategies.
//!
//! Every strategy produces `(InstructionSequence, AddressSet)` pairs within
//! the configured [`Bounds`](crate::program::Bounds) and is consumed the same
//! way by the trial driver:
//!
//! - [`RandomSearch`]: a fresh uniform sample per trial (CRT).
//! - [`Deepening`]: exhaustive enumeration by increasing length (IDT).
//! - [`PropertySearch`]: proptest search with shrinking toward a minimal case.
//!
//! Generated programs are straight-line code. Loads and stores address the
//! pre-filled data window off `x0`, so every access stays inside test memory.

/// Iterative deepening enumeration.
pub mod deepening;

/// Generated instruction forms.
pub mod instr;

/// Shrinking property-based search.
pub mod property;

/// Uniform random sampling.
pub mod random;

pub use deepening::Deepening;
pub use instr::{Instr, sequence_strategy};
pub use property::{PropertyOutcome, PropertySearch};
pub use random::RandomSearch;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::MemoryConfig;

/// Strategy identity, also the bucket key in session files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Uniform random retrial.
    CompleteRandom,
    /// Iterative deepening.
    IterativeDeepening,
    /// Property-based search with shrinking.
    PropertyBased,
}

impl SearchStrategy {
    /// Every strategy, in session-file order.
    pub const ALL: [Self; 3] = [
        Self::CompleteRandom,
        Self::IterativeDeepening,
        Self::PropertyBased,
    ];

    /// Session-file key.
    pub const fn name(self) -> &'static str {
        match self {
            Self::CompleteRandom => "complete_random",
            Self::IterativeDeepening => "iterative_deepening",
            Self::PropertyBased => "property_based",
        }
    }

    /// Short tag used in log lines.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::CompleteRandom => "CRT",
            Self::IterativeDeepening => "IDT",
            Self::PropertyBased => "PBT",
        }
    }
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SearchStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.name() == s)
            .ok_or_else(|| format!("unknown search strategy `{s}`"))
    }
}

/// The memory window generated loads and stores may touch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DataWindow {
    /// First byte address.
    pub base: u32,
    /// Window size in bytes.
    pub len: u32,
}

impl DataWindow {
    /// The pre-filled window of `memory`.
    pub const fn from_memory(memory: &MemoryConfig) -> Self {
        Self {
            base: 0,
            len: memory.data_fill_bytes,
        }
    }

    /// True when `len` bytes at `addr` stay inside the window.
    pub const fn contains(&self, addr: u32, len: u32) -> bool {
        addr >= self.base && (addr as u64 + len as u64) <= (self.base as u64 + self.len as u64)
    }
}
