//! The memory-mapped test device.
//!
//! Serves one outstanding request at a time. `ready` is a registered output:
//! on a clock edge where the request is valid and `ready` is low, the device
//! decodes the address, performs the access and raises `ready` for exactly
//! one cycle. Address decoding:
//!
//! 1. `addr < mem_size`: word read, or strobed write.
//! 2. [`CONTROL_ADDR`]: control channel.
//! 3. [`DUMP_ADDR`]: dump channel.
//! 4. Anything else: [`ProtocolViolation`].
//!
//! Once a channel terminates the run the device stops responding.

use thiserror::Error;
use tracing::{debug, trace};

use crate::common::constants::{CONTROL_ADDR, DUMP_ADDR};
use crate::soc::bus::{BusRequest, BusResponse};
use crate::soc::devices::{ControlChannel, DumpChannel, DumpState};
use crate::soc::memory::Memory;
use crate::soc::traits::Channel;

/// Voluntary end of a DUT run signalled through a channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    /// Explicit PASS on the control channel.
    Passed,
    /// Completed four-word failure report.
    ExplicitFail {
        /// Failing test index.
        index: u32,
        /// Value the DUT produced.
        got: u32,
        /// Value the program expected.
        want: u32,
    },
    /// Program exit with a status code.
    ImplicitExit(u16),
    /// All 31 registers dumped.
    Dumped,
}

/// The DUT addressed neither memory nor a channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("test memory: invalid address {addr:#010x} at cycle {cycle}")]
pub struct ProtocolViolation {
    /// Offending address.
    pub addr: u32,
    /// Clock edge the access was decoded on.
    pub cycle: u64,
}

/// Test memory with the control and dump channels attached.
#[derive(Clone, Debug)]
pub struct TestMemory {
    memory: Memory,
    control: ControlChannel,
    dump: DumpChannel,
    response: BusResponse,
    cycle: u64,
    terminated: Option<Termination>,
}

impl TestMemory {
    /// Creates a device backed by `mem_size` bytes of zeroed memory.
    pub fn new(mem_size: u32) -> Self {
        Self {
            memory: Memory::new(mem_size),
            control: ControlChannel::new(),
            dump: DumpChannel::new(),
            response: BusResponse::default(),
            cycle: 0,
            terminated: None,
        }
    }

    /// Returns the channels and the handshake to their power-on state.
    ///
    /// Memory contents are kept so an image can be loaded before reset.
    pub fn reset(&mut self) {
        self.control.reset();
        self.dump.reset();
        self.response = BusResponse::default();
        self.cycle = 0;
        self.terminated = None;
    }

    /// Backing memory.
    pub const fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Backing memory, for loading images and pre-filling.
    pub const fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    /// Registers received through the dump channel.
    pub const fn dump(&self) -> &DumpState {
        self.dump.state()
    }

    /// The control channel.
    pub const fn control(&self) -> &ControlChannel {
        &self.control
    }

    /// The response registered on the last clock edge.
    pub const fn response(&self) -> BusResponse {
        self.response
    }

    /// Clock edges seen since reset.
    pub const fn cycle(&self) -> u64 {
        self.cycle
    }

    /// The termination raised so far, if any.
    pub const fn terminated(&self) -> Option<Termination> {
        self.terminated
    }

    /// Advances one clock edge with the DUT's current request.
    ///
    /// Returns the termination raised on this edge, if any.
    pub fn clock(&mut self, req: &BusRequest) -> Result<Option<Termination>, ProtocolViolation> {
        let cycle = self.cycle;
        self.cycle += 1;

        if self.terminated.is_some() || !req.valid || self.response.ready {
            self.response.ready = false;
            return Ok(None);
        }

        let (rdata, termination) = self.access(req, cycle)?;
        self.response = BusResponse { ready: true, rdata };
        if let Some(t) = termination {
            debug!(cycle, termination = ?t, "test memory: run terminated");
            self.terminated = Some(t);
        }
        Ok(termination)
    }

    fn access(
        &mut self,
        req: &BusRequest,
        cycle: u64,
    ) -> Result<(u32, Option<Termination>), ProtocolViolation> {
        let addr = req.addr;
        if addr < self.memory.size() {
            let rdata = self.memory.read_word(addr);
            if req.is_write() {
                let _ = self.memory.write_strobed(addr, req.wdata, req.wstrb);
            }
            return Ok((rdata, None));
        }

        let channel: &mut dyn Channel = match addr {
            CONTROL_ADDR => &mut self.control,
            DUMP_ADDR => &mut self.dump,
            _ => return Err(ProtocolViolation { addr, cycle }),
        };
        if !req.is_write() {
            trace!(channel = channel.name(), cycle, "test memory: read from write-only channel");
            return Ok((0, None));
        }
        trace!(
            channel = channel.name(),
            cycle,
            wdata = format_args!("{:#010x}", req.wdata),
            "test memory: channel write"
        );
        Ok((0, channel.write(req.wdata)))
    }

    /// One-line view of the handshake for the current cycle.
    ///
    /// `#` waiting for the device, ` ` acknowledge after the request dropped,
    /// `.` idle, otherwise the access being acknowledged.
    pub fn line_trace(&self, req: &BusRequest) -> String {
        let ready = self.response.ready;
        let trace = match (req.valid, ready) {
            (true, false) => "#".to_string(),
            (false, true) => " ".to_string(),
            (false, false) => ".".to_string(),
            (true, true) if req.instr => {
                format!("ifetch at {:#010x}: {:#010x}", req.addr, self.response.rdata)
            }
            (true, true) if req.is_write() => {
                format!("write at {:#010x}: {:#010x}", req.addr, req.wdata)
            }
            (true, true) => format!("read at {:#010x}: {:#010x}", req.addr, self.response.rdata),
        };
        format!("{trace:>40}")
    }
}
