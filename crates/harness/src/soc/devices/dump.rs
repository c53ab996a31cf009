//! Architectural-state dump channel.
//!
//! The epilogue stores x0..x30 to [`DUMP_ADDR`] in order. The channel records
//! each word and ends the run on the 31st.

use crate::common::constants::{DUMP_ADDR, DUMP_REGS};
use crate::soc::test_memory::Termination;
use crate::soc::traits::Channel;

/// Register values received through the dump channel.
///
/// Slot `i` holds the `i`-th word written, which the epilogue makes `x{i}`.
/// The cursor never exceeds [`DUMP_REGS`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DumpState {
    values: [u32; DUMP_REGS],
    cursor: usize,
}

impl Default for DumpState {
    fn default() -> Self {
        Self {
            values: [0; DUMP_REGS],
            cursor: 0,
        }
    }
}

impl DumpState {
    /// Creates an empty dump.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `value` at the cursor. Returns false once all slots are filled.
    pub fn push(&mut self, value: u32) -> bool {
        match self.values.get_mut(self.cursor) {
            Some(slot) => {
                *slot = value;
                self.cursor += 1;
                true
            }
            None => false,
        }
    }

    /// Number of values recorded.
    pub const fn len(&self) -> usize {
        self.cursor
    }

    /// True when nothing was recorded.
    pub const fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    /// True once every slot is filled.
    pub const fn is_complete(&self) -> bool {
        self.cursor == DUMP_REGS
    }

    /// The recorded values, in write order.
    pub fn values(&self) -> &[u32] {
        &self.values[..self.cursor]
    }

    /// Value recorded for register `idx`, if it has been dumped.
    pub fn get(&self, idx: usize) -> Option<u32> {
        self.values().get(idx).copied()
    }
}

/// Dump channel device.
#[derive(Clone, Debug, Default)]
pub struct DumpChannel {
    state: DumpState,
}

impl DumpChannel {
    /// Creates an empty channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// The values received so far.
    pub const fn state(&self) -> &DumpState {
        &self.state
    }
}

impl Channel for DumpChannel {
    fn name(&self) -> &str {
        "DUMP"
    }

    fn address(&self) -> u32 {
        DUMP_ADDR
    }

    fn write(&mut self, wdata: u32) -> Option<Termination> {
        if self.state.push(wdata) && self.state.is_complete() {
            Some(Termination::Dumped)
        } else {
            None
        }
    }

    fn reset(&mut self) {
        self.state = DumpState::default();
    }
}
