//! Device-under-test models.
//!
//! The harness drives a DUT purely through its native memory port: every
//! cycle it reads the DUT's [`BusRequest`], hands it the device's registered
//! [`BusResponse`] and clocks it once. Interrupt and co-processor inputs are
//! tied off and never appear here.
//!
//! - [`Dut`]: the port-level interface a hardware model exposes.
//! - [`DutFactory`]: elaborates a fresh DUT for each trial, compiling it once.
//! - [`BusCore`]: the built-in multi-cycle RV32IM core.

/// Integer ALU shared by the reference model and the bus core.
pub mod alu;

/// The built-in multi-cycle core.
pub mod bus_core;

/// Iterative shift-add multiplier.
pub mod multiplier;

/// Decoded control signals.
pub mod signals;

pub use bus_core::{BusCore, BusCoreFactory, DutVariant};

use crate::soc::{BusRequest, BusResponse};

/// A cycle-level processor model with a valid/ready memory port.
pub trait Dut {
    /// Synchronous reset: registers cleared, fetch restarts at the reset vector.
    fn reset(&mut self);

    /// The request the DUT drives during the current cycle.
    fn request(&self) -> BusRequest;

    /// Advances one clock edge, sampling the device's registered response.
    fn step(&mut self, resp: BusResponse);

    /// True once the DUT has trapped and stopped issuing requests.
    fn trapped(&self) -> bool;
}

/// Builds DUT instances.
///
/// `recompile` is true only for the first elaboration of a session; later
/// trials reuse whatever the first call built.
pub trait DutFactory {
    /// Returns a fresh, un-reset DUT.
    fn elaborate(&self, recompile: bool) -> Box<dyn Dut>;
}
