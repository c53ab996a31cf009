//! Memory-mapped test device.
//!
//! This module organizes everything on the DUT side of the bus:
//! 1. **Bus:** the valid/ready request and response the DUT and device exchange.
//! 2. **Memory:** the byte-addressable store with strobed word writes.
//! 3. **Channels:** the control and dump channels the DUT reports through.
//! 4. **Test memory:** the device itself, decoding one request per handshake.

/// Valid/ready bus signals.
pub mod bus;

/// Control and dump channel devices.
pub mod devices;

/// Byte-addressable test memory.
pub mod memory;

/// The memory-mapped test device.
pub mod test_memory;

/// Channel trait definitions.
pub mod traits;

pub use bus::{BusRequest, BusResponse};
pub use devices::{ControlChannel, ControlState, DumpChannel, DumpState};
pub use memory::Memory;
pub use test_memory::{ProtocolViolation, Termination, TestMemory};
pub use traits::Channel;
