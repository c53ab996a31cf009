//! Simulation outcomes.

use std::fmt;

use crate::soc::{DumpState, Termination};

/// How a DUT run ended. Produced once per run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SimulationOutcome {
    /// Explicit PASS on the control channel.
    Passed,
    /// Four-word failure report on the control channel.
    ExplicitFail {
        /// Failing index.
        index: u32,
        /// Value the DUT produced.
        got: u32,
        /// Value the program expected.
        want: u32,
    },
    /// Program exit with a status code.
    ImplicitExit(u16),
    /// All registers dumped; the state to compare.
    Dumped(DumpState),
    /// The cycle budget ran out first.
    Timeout {
        /// The exhausted budget.
        cycles: u64,
    },
    /// The DUT accessed an unmapped address.
    ProtocolViolation {
        /// Offending address.
        addr: u32,
        /// Cycle of the access.
        cycle: u64,
    },
}

impl SimulationOutcome {
    /// Builds the outcome for a channel termination.
    pub fn from_termination(t: Termination, dump: &DumpState) -> Self {
        match t {
            Termination::Passed => Self::Passed,
            Termination::ExplicitFail { index, got, want } => Self::ExplicitFail { index, got, want },
            Termination::ImplicitExit(status) => Self::ImplicitExit(status),
            Termination::Dumped => Self::Dumped(dump.clone()),
        }
    }

    /// True for outcomes the program signalled itself.
    pub const fn is_voluntary(&self) -> bool {
        matches!(
            self,
            Self::Passed | Self::ExplicitFail { .. } | Self::ImplicitExit(_) | Self::Dumped(_)
        )
    }
}

impl fmt::Display for SimulationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => f.write_str("passed"),
            Self::ExplicitFail { index, got, want } => {
                write!(f, "failed: dest[{index}] != ref[{index}] ({got} != {want})")
            }
            Self::ImplicitExit(status) => write!(f, "program exited with status {status}"),
            Self::Dumped(dump) => write!(f, "dumped {} registers", dump.len()),
            Self::Timeout { cycles } => write!(f, "timed out after {cycles} cycles"),
            Self::ProtocolViolation { addr, cycle } => {
                write!(f, "protocol violation at {addr:#010x} (cycle {cycle})")
            }
        }
    }
}
