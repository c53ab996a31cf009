//! Simulation Unit Tests.
//!
//! Verifies the budgeted step loops in isolation with mock processors, then
//! whole trials on the bus core and the built-in reference model.

use mockall::Sequence;
use mockall::predicate::eq;
use pretty_assertions::assert_eq;
use rvdiff_core::asm::{MemoryImage, Rv32Assembler};
use rvdiff_core::common::constants::{CONTROL_ADDR, CTRL_PASS};
use rvdiff_core::common::{GenerationFailure, HarnessError, RefFault};
use rvdiff_core::compare::Mismatch;
use rvdiff_core::config::HarnessConfig;
use rvdiff_core::core::{BusCore, BusCoreFactory, Dut, DutVariant};
use rvdiff_core::program::AddressSet;
use rvdiff_core::sim::{DualRunner, SimulationOutcome, TrialVerdict, run_trial, run_trial_with};
use rvdiff_core::soc::BusRequest;

use crate::common::harness::{PROGRAM_BASE, context, init_logging, sequence, test_config, trial};
use crate::common::mocks::dut::{MockFactory, ScriptedDut, stuck_core};
use crate::common::mocks::reference::{MockReference, finished_reference};

fn run_image(dut: &mut dyn Dut, max_cycles: u64) -> (SimulationOutcome, u64) {
    let config = HarnessConfig::default();
    let assembler = Rv32Assembler::new(PROGRAM_BASE);
    let report = DualRunner::new(&config, &assembler).run_image(
        dut,
        &MemoryImage::new(PROGRAM_BASE),
        max_cycles,
    );
    (report.outcome, report.cycles)
}

#[test]
fn idle_dut_times_out_at_the_budget() {
    let mut core = stuck_core(BusRequest::IDLE);
    let (outcome, cycles) = run_image(&mut core, 10);
    assert_eq!(outcome, SimulationOutcome::Timeout { cycles: 10 });
    assert_eq!(cycles, 10);
}

#[test]
fn unmapped_access_stops_the_run_on_its_cycle() {
    let mut core = stuck_core(BusRequest::read(0x3000_0000));
    let (outcome, cycles) = run_image(&mut core, 10);
    assert_eq!(
        outcome,
        SimulationOutcome::ProtocolViolation {
            addr: 0x3000_0000,
            cycle: 0
        }
    );
    assert_eq!(cycles, 1);
}

#[test]
fn pass_word_ends_the_run() {
    let mut dut = ScriptedDut::new(vec![
        BusRequest::read(PROGRAM_BASE),
        BusRequest::write(CONTROL_ADDR, CTRL_PASS, 0xF),
        BusRequest::read(PROGRAM_BASE),
    ]);
    let (outcome, cycles) = run_image(&mut dut, 100);
    // Fetch issued, acknowledged, then the write decoded on the third edge.
    assert_eq!(outcome, SimulationOutcome::Passed);
    assert_eq!(cycles, 3);
    assert_eq!(dut.acknowledged(), 1);
}

#[test]
fn reference_loop_without_marker_is_invalid() {
    init_logging();
    let mut config = test_config();
    config.budget.ref_max_cycles = 64;
    let mut ctx = context(config, DutVariant::Correct);
    let mut factory = MockFactory::new();
    factory.expect_elaborate().never();

    let verdict = run_trial(&mut ctx, &factory, &sequence(&["jal x0, 0"]), &AddressSet::new())
        .unwrap();
    assert_eq!(
        verdict,
        TrialVerdict::InvalidProgram(GenerationFailure::Timeout { cycles: 64 })
    );
    assert!(verdict.is_invalid());
    assert!(!verdict.is_failure());
}

#[test]
fn reference_fault_is_invalid_and_skips_the_dut() {
    init_logging();
    let mut ctx = context(test_config(), DutVariant::Correct);
    let mut factory = MockFactory::new();
    factory.expect_elaborate().never();

    let fault = RefFault::IllegalInstruction {
        pc: PROGRAM_BASE,
        inst: 0,
    };
    let mut reference = MockReference::new();
    reference.expect_reset().return_const(());
    reference.expect_load().return_const(());
    reference.expect_fill().return_const(());
    reference.expect_is_done().return_const(false);
    reference
        .expect_step()
        .times(1)
        .return_const(Err(fault.clone()));

    let verdict = run_trial_with(
        &mut ctx,
        &factory,
        &mut reference,
        &sequence(&["nop"]),
        &AddressSet::new(),
    )
    .unwrap();
    assert_eq!(
        verdict,
        TrialVerdict::InvalidProgram(GenerationFailure::Fault { fault, cycles: 0 })
    );
    assert_eq!(ctx.trial_count(), 1);
}

#[test]
fn unparseable_program_is_invalid() {
    let verdict = trial(DutVariant::Correct, &["frobnicate x1, x2"], &AddressSet::new());
    assert!(matches!(
        verdict,
        TrialVerdict::InvalidProgram(GenerationFailure::Assembly(_))
    ));
}

#[test]
fn protocol_violation_is_a_hard_error() {
    init_logging();
    let mut ctx = context(test_config(), DutVariant::Correct);
    let factory = BusCoreFactory::new(PROGRAM_BASE, DutVariant::Correct);
    let mut reference = finished_reference(0xFF);

    let err = run_trial_with(
        &mut ctx,
        &factory,
        &mut reference,
        &sequence(&["lui x5, 0x30000", "sw x0, 0(x5)"]),
        &AddressSet::new(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        HarnessError::ProtocolViolation {
            addr: 0x3000_0000,
            ..
        }
    ));
}

#[test]
fn dut_is_elaborated_fresh_only_once_per_session() {
    init_logging();
    let mut ctx = context(test_config(), DutVariant::Correct);
    let mut seq = Sequence::new();
    let mut factory = MockFactory::new();
    factory
        .expect_elaborate()
        .with(eq(true))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Box::new(BusCore::new(PROGRAM_BASE, DutVariant::Correct)));
    factory
        .expect_elaborate()
        .with(eq(false))
        .times(2)
        .in_sequence(&mut seq)
        .returning(|_| Box::new(BusCore::new(PROGRAM_BASE, DutVariant::Correct)));

    let program = sequence(&["addi x1, x0, 5"]);
    for _ in 0..3 {
        let verdict = run_trial(&mut ctx, &factory, &program, &AddressSet::new()).unwrap();
        assert_eq!(verdict, TrialVerdict::Pass);
    }
    assert_eq!(ctx.trial_count(), 3);
}

#[test]
fn single_instruction_bench_passes() {
    let verdict = trial(DutVariant::Correct, &["lui x1, 0x42"], &AddressSet::new());
    assert_eq!(verdict, TrialVerdict::Pass);
}

#[test]
fn program_failure_report_is_surfaced() {
    let verdict = trial(
        DutVariant::Correct,
        &[
            "lui x5, 0x10000",
            "lui x6, 0x20",
            "addi x6, x6, 1",
            "sw x6, 0(x5)",
            "addi x7, x0, 3",
            "sw x7, 0(x5)",
            "addi x7, x0, 7",
            "sw x7, 0(x5)",
            "addi x7, x0, 9",
            "sw x7, 0(x5)",
        ],
        &AddressSet::new(),
    );
    assert_eq!(
        verdict,
        TrialVerdict::DutReportedFailure {
            index: 3,
            got: 7,
            want: 9
        }
    );
    assert_eq!(verdict.to_string(), "[FAILED] dest[3] != ref[3] (7 != 9)");
}

#[test]
fn program_pass_report_skips_the_comparison() {
    let verdict = trial(
        DutVariant::MulCarryChain,
        &[
            "addi x1, x0, -1",
            "mulhu x2, x1, x1",
            "lui x5, 0x10000",
            "lui x6, 0x20",
            "sw x6, 0(x5)",
        ],
        &AddressSet::new(),
    );
    assert_eq!(verdict, TrialVerdict::Pass);
}

#[test]
fn program_exit_counts_as_pass() {
    let verdict = trial(
        DutVariant::Correct,
        &["lui x5, 0x10000", "lui x6, 0x10", "addi x6, x6, 5", "sw x6, 0(x5)"],
        &AddressSet::new(),
    );
    assert_eq!(verdict, TrialVerdict::Pass);
}

#[test]
fn carry_chain_bug_is_a_register_mismatch() {
    let program = ["addi x1, x0, -1", "mulhu x2, x1, x1"];

    assert_eq!(
        trial(DutVariant::Correct, &program, &AddressSet::new()),
        TrialVerdict::Pass
    );

    let verdict = trial(DutVariant::MulCarryChain, &program, &AddressSet::new());
    let TrialVerdict::Mismatch(cmp) = verdict else {
        panic!("expected a mismatch, got {verdict}");
    };
    assert_eq!(cmp.mismatches().len(), 1);
    assert!(matches!(
        cmp.mismatches()[0],
        Mismatch::Register {
            index: 2,
            reference: 0xFFFF_FFFE,
            ..
        }
    ));
}

#[test]
fn silent_dut_times_out_at_the_scaled_budget() {
    init_logging();
    let mut ctx = context(test_config(), DutVariant::Correct);
    let mut factory = MockFactory::new();
    factory
        .expect_elaborate()
        .returning(|_| Box::new(stuck_core(BusRequest::IDLE)));

    let verdict = run_trial(&mut ctx, &factory, &sequence(&["addi x1, x0, 1"]), &AddressSet::new())
        .unwrap();
    // One instruction plus the 32-instruction epilogue, 50 cycles each.
    assert_eq!(verdict, TrialVerdict::Timeout { cycles: 1650 });
    assert!(verdict.is_failure());
}

#[test]
fn end_of_test_marker_in_a_sequence_is_invalid() {
    init_logging();
    let mut ctx = context(test_config(), DutVariant::Correct);
    let mut factory = MockFactory::new();
    factory.expect_elaborate().never();

    let verdict = run_trial(
        &mut ctx,
        &factory,
        &sequence(&["addi x1, x0, 1", "ECALL"]),
        &AddressSet::new(),
    )
    .unwrap();
    assert_eq!(
        verdict,
        TrialVerdict::InvalidProgram(GenerationFailure::ReservedInstruction {
            line: 2,
            mnemonic: "ECALL".into(),
        })
    );
    assert!(verdict.is_invalid());
}

#[test]
fn unmapped_store_is_a_hard_error_with_the_builtin_reference() {
    init_logging();
    let mut ctx = context(test_config(), DutVariant::Correct);
    let factory = BusCoreFactory::new(PROGRAM_BASE, DutVariant::Correct);

    let err = run_trial(
        &mut ctx,
        &factory,
        &sequence(&["lui x5, 0x30000", "sw x0, 0(x5)"]),
        &AddressSet::new(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        HarnessError::ProtocolViolation {
            addr: 0x3000_0000,
            ..
        }
    ));
}

#[test]
fn unmapped_access_the_dut_never_makes_is_invalid() {
    init_logging();
    let mut ctx = context(test_config(), DutVariant::Correct);
    let mut factory = MockFactory::new();
    factory
        .expect_elaborate()
        .times(1)
        .returning(|_| Box::new(stuck_core(BusRequest::IDLE)));

    let verdict = run_trial(
        &mut ctx,
        &factory,
        &sequence(&["lui x5, 0x30000", "lw x6, 0(x5)"]),
        &AddressSet::new(),
    )
    .unwrap();
    assert!(matches!(
        verdict,
        TrialVerdict::InvalidProgram(GenerationFailure::Fault {
            fault: RefFault::LoadAccessFault(0x3000_0000),
            ..
        })
    ));
}

#[test]
fn reference_load_from_the_control_word_stays_invalid() {
    init_logging();
    let mut ctx = context(test_config(), DutVariant::Correct);
    let mut factory = MockFactory::new();
    factory.expect_elaborate().never();

    let verdict = run_trial(
        &mut ctx,
        &factory,
        &sequence(&["lui x5, 0x10000", "lw x6, 0(x5)"]),
        &AddressSet::new(),
    )
    .unwrap();
    assert!(matches!(
        verdict,
        TrialVerdict::InvalidProgram(GenerationFailure::Fault {
            fault: RefFault::LoadAccessFault(0x1000_0000),
            ..
        })
    ));
}

#[test]
fn stored_bytes_are_compared() {
    let addresses: AddressSet = [3u32].into_iter().collect();
    let verdict = trial(
        DutVariant::Correct,
        &["addi x1, x0, 0x55", "sb x1, 3(x0)", "lbu x2, 3(x0)"],
        &addresses,
    );
    assert_eq!(verdict, TrialVerdict::Pass);
}

#[test]
fn prefilled_window_reads_the_same_on_both_sides() {
    let addresses: AddressSet = (0..8).collect();
    let verdict = trial(
        DutVariant::Correct,
        &["lw x1, 0(x0)", "lh x2, 4(x0)", "lbu x3, 7(x0)", "sh x3, 2(x0)"],
        &addresses,
    );
    assert_eq!(verdict, TrialVerdict::Pass);
}
