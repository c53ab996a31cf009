//! Control channel.
//!
//! The DUT program reports its own verdict by writing words to
//! [`CONTROL_ADDR`]:
//!
//! * `0x0002_0001` opens a failure report; the next three writes carry the
//!   failing index, the produced value and the expected value.
//! * `0x0001_xxxx` exits the program with status `xxxx`.
//! * `0x0002_0000` reports PASS.
//!
//! Any other word written while idle is ignored. Only the opening word starts
//! a failure report, so report payloads sent out of order are never mistaken
//! for one.

use tracing::trace;

use crate::common::constants::{CONTROL_ADDR, CTRL_EXIT_TAG, CTRL_FAIL_BEGIN, CTRL_PASS};
use crate::soc::test_memory::Termination;
use crate::soc::traits::Channel;

/// Control protocol state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ControlState {
    /// Waiting for a report to begin.
    #[default]
    Idle,
    /// Failure report opened; the failing index comes next.
    FailMsg1,
    /// Index received; the produced value comes next.
    FailMsg2,
    /// Produced value received; the expected value comes next.
    FailMsg3,
}

/// Control channel device.
#[derive(Clone, Debug, Default)]
pub struct ControlChannel {
    state: ControlState,
    fail_index: u32,
    fail_got: u32,
    finished: bool,
}

impl ControlChannel {
    /// Creates an idle channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current protocol state.
    pub const fn state(&self) -> ControlState {
        self.state
    }

    /// True once the channel has terminated the run. Later writes are ignored.
    pub const fn finished(&self) -> bool {
        self.finished
    }

    fn finish(&mut self, termination: Termination) -> Option<Termination> {
        self.finished = true;
        Some(termination)
    }
}

impl Channel for ControlChannel {
    fn name(&self) -> &str {
        "CTRL"
    }

    fn address(&self) -> u32 {
        CONTROL_ADDR
    }

    fn write(&mut self, wdata: u32) -> Option<Termination> {
        if self.finished {
            return None;
        }
        match self.state {
            ControlState::Idle => {
                if wdata == CTRL_FAIL_BEGIN {
                    trace!("control: failure report opened");
                    self.state = ControlState::FailMsg1;
                    None
                } else if wdata >> 16 == CTRL_EXIT_TAG {
                    self.finish(Termination::ImplicitExit(wdata as u16))
                } else if wdata == CTRL_PASS {
                    self.finish(Termination::Passed)
                } else {
                    trace!(wdata = format_args!("{wdata:#010x}"), "control: ignored word");
                    None
                }
            }
            ControlState::FailMsg1 => {
                self.fail_index = wdata;
                self.state = ControlState::FailMsg2;
                None
            }
            ControlState::FailMsg2 => {
                self.fail_got = wdata;
                self.state = ControlState::FailMsg3;
                None
            }
            ControlState::FailMsg3 => self.finish(Termination::ExplicitFail {
                index: self.fail_index,
                got: self.fail_got,
                want: wdata,
            }),
        }
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}
