//! One differential trial.
//!
//! The reference runs first: if it cannot finish the program the test case
//! is invalid and the DUT is never run, unless the reference stopped on an
//! unmapped address. Then the DUT still runs so the access surfaces as a
//! protocol violation. Otherwise the DUT runs the same
//! sequence with the epilogue appended, and only a completed register dump
//! is compared. A program that reports PASS or exits on its own is not
//! compared.

use std::fmt;

use tracing::{debug, info, warn};

use crate::asm::Rv32Assembler;
use crate::common::{GenerationFailure, HarnessError};
use crate::compare::{Comparison, compare};
use crate::core::DutFactory;
use crate::program::{AddressSet, InstructionSequence};
use crate::refmodel::{Iss, ReferenceModel};
use crate::session::SessionContext;
use crate::sim::outcome::SimulationOutcome;
use crate::sim::runner::DualRunner;

/// Result of one trial.
#[derive(Clone, Debug, PartialEq)]
pub enum TrialVerdict {
    /// DUT and reference agree, or the program passed on its own.
    Pass,
    /// Architectural state diverged.
    Mismatch(Comparison),
    /// The program reported a failure through the control channel.
    DutReportedFailure {
        /// Failing index.
        index: u32,
        /// Value the DUT produced.
        got: u32,
        /// Value the program expected.
        want: u32,
    },
    /// The DUT never reached a terminal state.
    Timeout {
        /// The exhausted budget.
        cycles: u64,
    },
    /// The reference could not run the program; not a DUT bug.
    InvalidProgram(GenerationFailure),
}

impl TrialVerdict {
    /// True for verdicts that count as a found bug.
    pub const fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::Mismatch(_) | Self::DutReportedFailure { .. } | Self::Timeout { .. }
        )
    }

    /// True when the test case itself was invalid.
    pub const fn is_invalid(&self) -> bool {
        matches!(self, Self::InvalidProgram(_))
    }
}

impl fmt::Display for TrialVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => f.write_str("[PASSED]"),
            Self::Mismatch(cmp) => write!(f, "{cmp}"),
            Self::DutReportedFailure { index, got, want } => {
                write!(f, "[FAILED] dest[{index}] != ref[{index}] ({got} != {want})")
            }
            Self::Timeout { cycles } => write!(f, "[FAILED] (time out after {cycles} cycles)"),
            Self::InvalidProgram(reason) => write!(f, "[INVALID] {reason}"),
        }
    }
}

/// Runs one trial against the built-in reference model.
pub fn run_trial(
    ctx: &mut SessionContext,
    factory: &dyn DutFactory,
    sequence: &InstructionSequence,
    addresses: &AddressSet,
) -> Result<TrialVerdict, HarnessError> {
    let mem = &ctx.config().memory;
    let mut reference = Iss::new(mem.mem_size, mem.program_base);
    run_trial_with(ctx, factory, &mut reference, sequence, addresses)
}

/// Runs one trial against a caller-supplied reference model.
///
/// `reference` must be freshly constructed; the trial loads it.
pub fn run_trial_with(
    ctx: &mut SessionContext,
    factory: &dyn DutFactory,
    reference: &mut dyn ReferenceModel,
    sequence: &InstructionSequence,
    addresses: &AddressSet,
) -> Result<TrialVerdict, HarnessError> {
    let trial = ctx.begin_trial();
    debug!(trial, "generated instruction sequence\n{sequence}address list: {addresses}");

    if let Some((line, mnemonic)) = sequence.reserved_instruction() {
        let reason = GenerationFailure::ReservedInstruction {
            line,
            mnemonic: mnemonic.to_owned(),
        };
        warn!(trial, %reason, "invalid test case");
        return Ok(TrialVerdict::InvalidProgram(reason));
    }

    let assembler = Rv32Assembler::new(ctx.config().memory.program_base);

    // An unmapped reference access still runs the DUT; its bus access decides.
    let unmapped = match DualRunner::new(ctx.config(), &assembler)
        .run_reference(reference, &sequence.reference_program())
    {
        Ok(_) => None,
        Err(reason) => match reason.unmapped_address() {
            Some(addr) => {
                debug!(
                    trial,
                    addr = format_args!("{addr:#010x}"),
                    "reference left the address map"
                );
                Some(reason)
            }
            None => {
                warn!(trial, %reason, "invalid test case");
                return Ok(TrialVerdict::InvalidProgram(reason));
            }
        },
    };

    let mut dut = factory.elaborate(ctx.take_recompile());
    let report = DualRunner::new(ctx.config(), &assembler).run_dut(
        dut.as_mut(),
        &sequence.dut_program(),
        sequence.dut_instruction_count(),
    )?;

    if let Some(reason) = unmapped {
        if let SimulationOutcome::ProtocolViolation { addr, cycle } = report.outcome {
            return Err(HarnessError::ProtocolViolation { addr, cycle });
        }
        warn!(trial, %reason, "invalid test case");
        return Ok(TrialVerdict::InvalidProgram(reason));
    }

    let verdict = match report.outcome {
        SimulationOutcome::Dumped(dump) => {
            let cmp = compare(&dump, report.device.memory(), reference, addresses);
            if cmp.is_match() {
                TrialVerdict::Pass
            } else {
                TrialVerdict::Mismatch(cmp)
            }
        }
        SimulationOutcome::Passed | SimulationOutcome::ImplicitExit(_) => TrialVerdict::Pass,
        SimulationOutcome::ExplicitFail { index, got, want } => {
            TrialVerdict::DutReportedFailure { index, got, want }
        }
        SimulationOutcome::Timeout { cycles } => TrialVerdict::Timeout { cycles },
        SimulationOutcome::ProtocolViolation { addr, cycle } => {
            return Err(HarnessError::ProtocolViolation { addr, cycle });
        }
    };

    info!(trial, "{verdict}");
    Ok(verdict)
}
