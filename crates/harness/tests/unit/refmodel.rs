//! Reference Interpreter Unit Tests.
//!
//! Verifies execution results, the end-of-test marker and the faults that
//! make a generated program invalid.

use pretty_assertions::assert_eq;
use rstest::rstest;
use rvdiff_core::common::RefFault;
use rvdiff_core::refmodel::{Iss, ReferenceModel};

use crate::common::harness::{PROGRAM_BASE, assemble};

const MEM_SIZE: u32 = 1 << 16;

fn iss_for(program: &str) -> Iss {
    let mut iss = Iss::new(MEM_SIZE, PROGRAM_BASE);
    iss.load(&assemble(program));
    iss.reset();
    iss
}

/// Steps until `ecall`, panicking on fault or runaway.
fn run(program: &str) -> Iss {
    let mut iss = iss_for(program);
    for _ in 0..1000 {
        if iss.is_done() {
            return iss;
        }
        iss.step().unwrap();
    }
    panic!("program did not finish");
}

/// Steps until the first fault.
fn fault(program: &str) -> RefFault {
    let mut iss = iss_for(program);
    for _ in 0..1000 {
        if let Err(f) = iss.step() {
            return f;
        }
        assert!(!iss.is_done(), "program finished without faulting");
    }
    panic!("no fault raised");
}

#[test]
fn arithmetic_and_memory() {
    let iss = run("addi x1, x0, 5\n\
         addi x2, x1, -7\n\
         sw x2, 16(x0)\n\
         lbu x3, 16(x0)\n\
         lb x4, 17(x0)\n\
         lui x5, 0x42\n\
         ecall");
    assert_eq!(iss.reg(1), 5);
    assert_eq!(iss.reg(2), 0xFFFF_FFFE);
    assert_eq!(iss.reg(3), 0xFE);
    assert_eq!(iss.reg(4), 0xFFFF_FFFF);
    assert_eq!(iss.reg(5), 0x42000);
    assert_eq!(iss.read_byte(16), Some(0xFE));
    assert_eq!(iss.read_byte(MEM_SIZE), None);
    assert_eq!(iss.retired(), 6);
}

#[test]
fn multiply_and_divide() {
    let iss = run("addi x1, x0, -1\n\
         mulhu x2, x1, x1\n\
         mul x3, x1, x1\n\
         addi x4, x0, 7\n\
         div x5, x4, x0\n\
         rem x6, x4, x0\n\
         ecall");
    assert_eq!(iss.reg(2), 0xFFFF_FFFE);
    assert_eq!(iss.reg(3), 1);
    assert_eq!(iss.reg(5), u32::MAX);
    assert_eq!(iss.reg(6), 7);
}

#[test]
fn branches_and_jumps() {
    let iss = run("addi x1, x0, 3\n\
         loop: addi x1, x1, -1\n\
         bne x1, x0, loop\n\
         jal x2, done\n\
         addi x3, x0, 1\n\
         done: ecall");
    assert_eq!(iss.reg(1), 0);
    assert_eq!(iss.reg(2), PROGRAM_BASE + 16);
    assert_eq!(iss.reg(3), 0);
}

#[test]
fn x0_stays_zero() {
    let iss = run("addi x0, x0, 5\necall");
    assert_eq!(iss.reg(0), 0);
}

#[test]
fn stays_done_after_ecall() {
    let mut iss = run("ecall\naddi x1, x0, 1");
    iss.step().unwrap();
    assert!(iss.is_done());
    assert_eq!(iss.reg(1), 0);
}

#[test]
fn stores_to_harness_channels_are_ignored() {
    let iss = run("lui x1, 0x10000\n\
         lui x2, 0x20\n\
         sw x2, 0(x1)\n\
         lui x1, 0x20000\n\
         sw x0, 0(x1)\n\
         ecall");
    assert!(iss.is_done());
}

#[test]
fn misaligned_load_faults() {
    assert_eq!(
        fault("lw x1, 2(x0)"),
        RefFault::Misaligned {
            addr: 2,
            pc: PROGRAM_BASE
        }
    );
}

#[rstest]
#[case("mul x3, x1, x1", 1)]
#[case("mulh x3, x1, x1", 0)]
#[case("mulhu x3, x1, x1", 0xFFFF_FFFE)]
#[case("mulhsu x3, x1, x1", 0xFFFF_FFFF)]
#[case("mulh x3, x4, x4", 0x4000_0000)]
#[case("div x3, x5, x0", 0xFFFF_FFFF)]
#[case("divu x3, x5, x0", 0xFFFF_FFFF)]
#[case("rem x3, x5, x0", 7)]
#[case("remu x3, x1, x0", 0xFFFF_FFFF)]
#[case("div x3, x4, x1", 0x8000_0000)]
#[case("rem x3, x4, x1", 0)]
#[case("div x3, x1, x5", 0)]
#[case("rem x3, x1, x5", 0xFFFF_FFFF)]
#[case("divu x3, x1, x5", 0x2492_4924)]
#[case("sra x3, x4, x6", 0xF800_0000)]
#[case("srl x3, x4, x6", 0x0800_0000)]
#[case("srai x3, x4, 31", 0xFFFF_FFFF)]
#[case("sll x3, x5, x1", 0x8000_0000)]
#[case("slt x3, x1, x5", 1)]
#[case("sltu x3, x1, x5", 0)]
#[case("sub x3, x0, x5", 0xFFFF_FFF9)]
fn arithmetic_edge_cases(#[case] op: &str, #[case] expected: u32) {
    // x1 = -1, x4 = i32::MIN, x5 = 7, x6 = 4
    let iss = run(&format!(
        "addi x1, x0, -1\n\
         lui x4, 0x80000\n\
         addi x5, x0, 7\n\
         addi x6, x0, 4\n\
         {op}\n\
         ecall"
    ));
    assert_eq!(iss.reg(3), expected, "{op}");
}

#[test]
fn unmapped_store_faults() {
    assert_eq!(
        fault("lui x1, 0x30000\nsw x0, 0(x1)"),
        RefFault::StoreAccessFault(0x3000_0000)
    );
}

#[test]
fn unmapped_load_faults() {
    assert_eq!(
        fault("lui x1, 0x10000\nlw x2, 0(x1)"),
        RefFault::LoadAccessFault(0x1000_0000)
    );
}

#[test]
fn running_off_the_program_is_illegal() {
    assert_eq!(
        fault("nop"),
        RefFault::IllegalInstruction {
            pc: PROGRAM_BASE + 4,
            inst: 0
        }
    );
}

#[test]
fn fill_and_reset() {
    let mut iss = Iss::new(MEM_SIZE, PROGRAM_BASE);
    iss.load(&assemble("addi x1, x0, 1\necall"));
    iss.fill(0..0x200, 0xFF);
    iss.reset();
    assert_eq!(iss.pc(), PROGRAM_BASE);
    assert_eq!(iss.read_byte(0x1FF), Some(0xFF));
    assert_eq!(iss.read_byte(0x200), Some(0x93));
}
