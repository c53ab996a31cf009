//! Test Device Unit Tests.
//!
//! Verifies the valid/ready handshake, address decoding, the control and
//! dump protocols, strobed memory writes and the line trace.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rvdiff_core::asm::MemoryImage;
use rvdiff_core::common::constants::{CONTROL_ADDR, DUMP_ADDR, DUMP_REGS};
use rvdiff_core::soc::{
    BusRequest, Channel, ControlChannel, ControlState, DumpChannel, Memory, ProtocolViolation,
    Termination, TestMemory,
};

const MEM_SIZE: u32 = 1024;

/// Drives one full handshake for `req`, then one idle cycle.
fn access(dev: &mut TestMemory, req: BusRequest) -> Result<Option<Termination>, ProtocolViolation> {
    let result = dev.clock(&req)?;
    let _ = dev.clock(&BusRequest::IDLE)?;
    Ok(result)
}

fn write_control(dev: &mut TestMemory, value: u32) -> Option<Termination> {
    access(dev, BusRequest::write(CONTROL_ADDR, value, 0xF)).unwrap()
}

#[test]
fn ready_is_registered_and_pulses_once() {
    let mut dev = TestMemory::new(MEM_SIZE);
    let _ = dev.memory_mut().write_strobed(0x10, 0xDEAD_BEEF, 0xF);
    let req = BusRequest::read(0x10);

    assert!(!dev.response().ready);
    assert_eq!(dev.clock(&req), Ok(None));
    assert!(dev.response().ready);
    assert_eq!(dev.response().rdata, 0xDEAD_BEEF);

    // A request still held while ready is high is not served again.
    assert_eq!(dev.clock(&req), Ok(None));
    assert!(!dev.response().ready);
    assert_eq!(dev.cycle(), 2);
}

#[test]
fn idle_bus_never_acknowledges() {
    let mut dev = TestMemory::new(MEM_SIZE);
    for _ in 0..4 {
        assert_eq!(dev.clock(&BusRequest::IDLE), Ok(None));
        assert!(!dev.response().ready);
    }
}

#[test]
fn write_returns_the_old_word() {
    let mut dev = TestMemory::new(MEM_SIZE);
    let _ = dev.memory_mut().write_strobed(0x20, 0x1122_3344, 0xF);

    let _ = dev.clock(&BusRequest::write(0x20, 0xAABB_CCDD, 0b0011)).unwrap();
    assert_eq!(dev.response().rdata, 0x1122_3344);
    assert_eq!(dev.memory().read_word(0x20), 0x1122_CCDD);
}

#[test]
fn unmapped_address_is_a_protocol_violation() {
    let mut dev = TestMemory::new(MEM_SIZE);
    let _ = dev.clock(&BusRequest::IDLE).unwrap();
    assert_eq!(
        dev.clock(&BusRequest::read(0x3000_0000)),
        Err(ProtocolViolation {
            addr: 0x3000_0000,
            cycle: 1
        })
    );
}

#[test]
fn first_address_past_memory_is_unmapped() {
    let mut dev = TestMemory::new(MEM_SIZE);
    let err = dev.clock(&BusRequest::read(MEM_SIZE)).unwrap_err();
    assert_eq!(err.addr, MEM_SIZE);
}

#[test]
fn channel_reads_return_zero_without_side_effects() {
    let mut dev = TestMemory::new(MEM_SIZE);
    assert_eq!(access(&mut dev, BusRequest::read(CONTROL_ADDR)), Ok(None));
    assert_eq!(access(&mut dev, BusRequest::read(DUMP_ADDR)), Ok(None));
    assert_eq!(dev.control().state(), ControlState::Idle);
    assert!(dev.dump().is_empty());
}

#[test]
fn pass_terminates_the_run() {
    let mut dev = TestMemory::new(MEM_SIZE);
    assert_eq!(write_control(&mut dev, 0x0002_0000), Some(Termination::Passed));
    assert_eq!(dev.terminated(), Some(Termination::Passed));
}

#[test]
fn exit_carries_the_low_half_word() {
    let mut dev = TestMemory::new(MEM_SIZE);
    assert_eq!(
        write_control(&mut dev, 0x0001_0005),
        Some(Termination::ImplicitExit(5))
    );
}

#[test]
fn explicit_failure_report() {
    let mut dev = TestMemory::new(MEM_SIZE);
    assert_eq!(write_control(&mut dev, 0x0002_0001), None);
    assert_eq!(dev.control().state(), ControlState::FailMsg1);
    assert_eq!(write_control(&mut dev, 3), None);
    assert_eq!(dev.control().state(), ControlState::FailMsg2);
    assert_eq!(write_control(&mut dev, 7), None);
    assert_eq!(dev.control().state(), ControlState::FailMsg3);
    assert_eq!(
        write_control(&mut dev, 9),
        Some(Termination::ExplicitFail {
            index: 3,
            got: 7,
            want: 9
        })
    );
}

#[test]
fn device_stops_responding_after_termination() {
    let mut dev = TestMemory::new(MEM_SIZE);
    let _ = write_control(&mut dev, 0x0002_0000);

    assert_eq!(dev.clock(&BusRequest::fetch(0x200)), Ok(None));
    assert!(!dev.response().ready);
    // Even an unmapped address is no longer decoded.
    assert_eq!(dev.clock(&BusRequest::read(0x3000_0000)), Ok(None));
}

#[test]
fn control_ignores_payload_words_while_idle() {
    let mut ctrl = ControlChannel::new();
    assert_eq!(ctrl.write(3), None);
    assert_eq!(ctrl.write(0xFFFF_FFFF), None);
    assert_eq!(ctrl.state(), ControlState::Idle);
    assert!(!ctrl.finished());
}

#[test]
fn control_latches_after_the_first_verdict() {
    let mut ctrl = ControlChannel::new();
    assert_eq!(ctrl.write(0x0001_0000), Some(Termination::ImplicitExit(0)));
    assert_eq!(ctrl.write(0x0002_0000), None);
    assert_eq!(ctrl.write(0x0002_0001), None);
    assert!(ctrl.finished());

    ctrl.reset();
    assert!(!ctrl.finished());
    assert_eq!(ctrl.write(0x0002_0000), Some(Termination::Passed));
}

#[test]
fn dump_terminates_exactly_on_the_last_register() {
    let mut dump = DumpChannel::new();
    for i in 0..DUMP_REGS - 1 {
        assert_eq!(dump.write(i as u32 * 10), None, "write {i}");
    }
    assert!(!dump.state().is_complete());
    assert_eq!(dump.write(300), Some(Termination::Dumped));

    let state = dump.state();
    assert_eq!(state.len(), DUMP_REGS);
    assert_eq!(state.get(0), Some(0));
    assert_eq!(state.get(29), Some(290));
    assert_eq!(state.get(30), Some(300));
    assert_eq!(state.get(31), None);

    // The cursor never passes the last slot.
    assert_eq!(dump.write(1), None);
    assert_eq!(dump.state().len(), DUMP_REGS);
}

#[test]
fn dump_through_the_device() {
    let mut dev = TestMemory::new(MEM_SIZE);
    let mut last = None;
    for reg in 0..DUMP_REGS as u32 {
        last = access(&mut dev, BusRequest::write(DUMP_ADDR, reg, 0xF)).unwrap();
    }
    assert_eq!(last, Some(Termination::Dumped));
    assert_eq!(dev.dump().values(), (0..DUMP_REGS as u32).collect::<Vec<_>>());
}

#[test]
fn reset_clears_channels_but_keeps_memory() {
    let mut dev = TestMemory::new(MEM_SIZE);
    let _ = dev.memory_mut().write_strobed(0, 0x55AA_55AA, 0xF);
    let _ = write_control(&mut dev, 0x0002_0000);

    dev.reset();
    assert_eq!(dev.terminated(), None);
    assert_eq!(dev.cycle(), 0);
    assert_eq!(dev.memory().read_word(0), 0x55AA_55AA);
}

#[test]
fn line_trace_marks_handshake_phases() {
    let mut dev = TestMemory::new(MEM_SIZE);
    let _ = dev.memory_mut().write_strobed(0x200, 0x0000_0013, 0xF);
    let fetch = BusRequest::fetch(0x200);

    assert_eq!(dev.line_trace(&BusRequest::IDLE), format!("{:>40}", "."));
    assert_eq!(dev.line_trace(&fetch), format!("{:>40}", "#"));
    let _ = dev.clock(&fetch).unwrap();
    assert_eq!(
        dev.line_trace(&fetch).trim_start(),
        "ifetch at 0x00000200: 0x00000013"
    );
    assert_eq!(dev.line_trace(&BusRequest::IDLE), format!("{:>40}", " "));
}

#[test]
fn memory_fill_and_load() {
    let mut mem = Memory::new(16);
    mem.fill(0..8, 0xFF);
    assert_eq!(mem.read_word(0), 0xFFFF_FFFF);
    assert_eq!(mem.read_word(8), 0);

    // Ranges past the end are clamped.
    mem.fill(12..64, 0x11);
    assert_eq!(mem.read_word(12), 0x1111_1111);

    let mut image = MemoryImage::new(0);
    image.push_section(14, vec![1, 2, 3, 4]);
    assert_eq!(mem.load(&image), 2);
    assert_eq!(mem.read_byte(14), Some(1));
    assert_eq!(mem.read_byte(15), Some(2));
    assert_eq!(mem.read_byte(16), None);
}

#[test]
fn strobed_write_past_the_end_keeps_the_lanes_inside() {
    let mut mem = Memory::new(6);
    assert_eq!(mem.write_strobed(4, 0x4433_2211, 0xF), 2);
    assert_eq!(mem.read_byte(4), Some(0x11));
    assert_eq!(mem.read_byte(5), Some(0x22));
    assert_eq!(mem.read_byte(6), None);
    assert_eq!(mem.write_strobed(4, 0x4433_2211, 0b0011), 0);
}

proptest! {
    #[test]
    fn strobed_write_touches_only_enabled_lanes(
        word in 0u32..(MEM_SIZE / 4),
        old in any::<u32>(),
        wdata in any::<u32>(),
        wstrb in 0u8..16,
    ) {
        let addr = word * 4;
        let mut mem = Memory::new(MEM_SIZE);
        let _ = mem.write_strobed(addr, old, 0xF);
        let _ = mem.write_strobed(addr, wdata, wstrb);

        let (old, new) = (old.to_le_bytes(), wdata.to_le_bytes());
        for lane in 0..4u32 {
            let want = if wstrb & (1 << lane) != 0 { new[lane as usize] } else { old[lane as usize] };
            prop_assert_eq!(mem.read_byte(addr + lane), Some(want));
        }
    }
}
