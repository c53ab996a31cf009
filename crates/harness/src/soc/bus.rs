//! Native memory interface signals.
//!
//! The DUT drives a [`BusRequest`] every cycle and samples the [`BusResponse`]
//! the device registered on the previous clock edge. A request is outstanding
//! while `valid` is high and stays unchanged until the DUT observes `ready`.

/// Signals driven by the DUT.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BusRequest {
    /// A request is asserted.
    pub valid: bool,
    /// The request is an instruction fetch.
    pub instr: bool,
    /// Word address of the access.
    pub addr: u32,
    /// Store data, already shifted into the selected byte lanes.
    pub wdata: u32,
    /// Byte write enables; zero for reads.
    pub wstrb: u8,
}

impl BusRequest {
    /// No request this cycle.
    pub const IDLE: Self = Self {
        valid: false,
        instr: false,
        addr: 0,
        wdata: 0,
        wstrb: 0,
    };

    /// Instruction fetch from `addr`.
    pub const fn fetch(addr: u32) -> Self {
        Self {
            valid: true,
            instr: true,
            addr,
            wdata: 0,
            wstrb: 0,
        }
    }

    /// Data read from `addr`.
    pub const fn read(addr: u32) -> Self {
        Self {
            valid: true,
            instr: false,
            addr,
            wdata: 0,
            wstrb: 0,
        }
    }

    /// Data write of the lanes selected by `wstrb`.
    pub const fn write(addr: u32, wdata: u32, wstrb: u8) -> Self {
        Self {
            valid: true,
            instr: false,
            addr,
            wdata,
            wstrb: wstrb & 0xF,
        }
    }

    /// True when the request writes.
    pub const fn is_write(&self) -> bool {
        self.wstrb != 0
    }
}

/// Signals registered by the device.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BusResponse {
    /// High for exactly one cycle to acknowledge the outstanding request.
    pub ready: bool,
    /// Read data, valid while `ready` is high.
    pub rdata: u32,
}
