//! Harness reporting channels.
//!
//! Two write-only channels sit beside test memory on the DUT's bus: the
//! control channel (pass/fail/exit reports) and the dump channel (final
//! register values).

/// Control channel state machine.
pub mod control;

/// Architectural-state dump channel.
pub mod dump;

pub use control::{ControlChannel, ControlState};
pub use dump::{DumpChannel, DumpState};

pub use crate::soc::traits::Channel;
