//! Channel trait for the harness reporting addresses.
//!
//! A channel owns a single word-sized address and reacts to writes only.

use crate::soc::test_memory::Termination;

/// A write-only reporting channel at a fixed address.
pub trait Channel {
    /// Short name for traces (e.g. `"CTRL"`).
    fn name(&self) -> &str;

    /// The channel's bus address.
    fn address(&self) -> u32;

    /// Consumes one written word; returns the run termination it causes, if any.
    fn write(&mut self, wdata: u32) -> Option<Termination>;

    /// Returns to the power-on state.
    fn reset(&mut self);
}
