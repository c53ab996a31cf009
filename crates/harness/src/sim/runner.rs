//! DUT and reference step loops.
//!
//! Each run gets a fresh memory image and fresh device state. Both loops
//! reset their processor once, then advance one clock per iteration until a
//! terminal condition or the cycle ceiling.
//!
//! Per DUT cycle the request and the registered response are sampled first,
//! then the DUT and the test device are clocked on the same edge.

use tracing::{Level, debug, enabled, trace};

use crate::asm::{Assembler, MemoryImage};
use crate::common::{GenerationFailure, HarnessError};
use crate::config::HarnessConfig;
use crate::core::Dut;
use crate::refmodel::ReferenceModel;
use crate::sim::outcome::SimulationOutcome;
use crate::soc::TestMemory;

/// Result of a reference run that reached its end-of-test marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RefReport {
    /// Cycles executed, the marker included.
    pub cycles: u64,
}

/// Result of a DUT run.
#[derive(Debug)]
pub struct DutReport {
    /// How the run ended.
    pub outcome: SimulationOutcome,
    /// Cycles simulated.
    pub cycles: u64,
    /// The device after the run, for memory comparison.
    pub device: TestMemory,
}

/// Drives the two simulations under their separate budgets.
#[derive(Debug)]
pub struct DualRunner<'a, A> {
    config: &'a HarnessConfig,
    assembler: &'a A,
}

impl<'a, A: Assembler> DualRunner<'a, A> {
    /// Creates a runner using `config`'s memory layout and budgets.
    pub const fn new(config: &'a HarnessConfig, assembler: &'a A) -> Self {
        Self { config, assembler }
    }

    /// Assembles `program` and runs it on `reference` until `is_done`.
    ///
    /// Any failure here means the test case is invalid, not that the DUT is
    /// wrong.
    pub fn run_reference(
        &self,
        reference: &mut dyn ReferenceModel,
        program: &str,
    ) -> Result<RefReport, GenerationFailure> {
        let image = self.assembler.assemble(program)?;
        let mem = &self.config.memory;
        reference.load(&image);
        reference.fill(0..mem.data_fill_bytes, mem.data_fill_value);
        reference.reset();

        let max_cycles = self.config.budget.ref_max_cycles;
        let mut cycles = 0;
        while !reference.is_done() {
            if cycles == max_cycles {
                return Err(GenerationFailure::Timeout { cycles });
            }
            reference
                .step()
                .map_err(|fault| GenerationFailure::Fault { fault, cycles })?;
            cycles += 1;
        }
        debug!(cycles, "reference run finished");
        Ok(RefReport { cycles })
    }

    /// Assembles `program` and runs it on `dut` with a budget scaled to
    /// `instructions`.
    pub fn run_dut(
        &self,
        dut: &mut dyn Dut,
        program: &str,
        instructions: usize,
    ) -> Result<DutReport, HarnessError> {
        let image = self.assembler.assemble(program)?;
        let max_cycles = self.config.budget.dut_max_cycles(instructions);
        Ok(self.run_image(dut, &image, max_cycles))
    }

    /// Runs `dut` on an already-built image for at most `max_cycles`.
    pub fn run_image(&self, dut: &mut dyn Dut, image: &MemoryImage, max_cycles: u64) -> DutReport {
        let mem = &self.config.memory;
        let mut device = TestMemory::new(mem.mem_size);
        let dropped = device.memory_mut().load(image);
        if dropped > 0 {
            debug!(dropped, "image bytes outside test memory ignored");
        }
        device
            .memory_mut()
            .fill(0..mem.data_fill_bytes, mem.data_fill_value);

        let (outcome, cycles) = drive(dut, &mut device, max_cycles);
        debug!(%outcome, cycles, "DUT run finished");
        DutReport {
            outcome,
            cycles,
            device,
        }
    }
}

fn drive(dut: &mut dyn Dut, device: &mut TestMemory, max_cycles: u64) -> (SimulationOutcome, u64) {
    dut.reset();
    device.reset();

    let tracing_lines = enabled!(Level::TRACE);
    for cycle in 0..max_cycles {
        let req = dut.request();
        let resp = device.response();
        if tracing_lines {
            trace!("{cycle:>4}: {}", device.line_trace(&req));
        }
        dut.step(resp);
        match device.clock(&req) {
            Ok(None) => {}
            Ok(Some(t)) => {
                return (
                    SimulationOutcome::from_termination(t, device.dump()),
                    cycle + 1,
                );
            }
            Err(v) => {
                return (
                    SimulationOutcome::ProtocolViolation {
                        addr: v.addr,
                        cycle: v.cycle,
                    },
                    cycle + 1,
                );
            }
        }
    }

    if dut.trapped() {
        debug!("DUT trapped before reaching a terminal state");
    }
    (SimulationOutcome::Timeout { cycles: max_cycles }, max_cycles)
}
