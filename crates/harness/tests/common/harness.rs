use rvdiff_core::asm::{Assembler, MemoryImage, Rv32Assembler};
use rvdiff_core::config::HarnessConfig;
use rvdiff_core::core::{BusCoreFactory, DutVariant};
use rvdiff_core::program::{AddressSet, InstructionSequence};
use rvdiff_core::session::SessionContext;
use rvdiff_core::sim::{TrialVerdict, run_trial};

/// Base address of program text in the default layout.
pub const PROGRAM_BASE: u32 = 0x200;

/// Routes harness logs to the test output; safe to call repeatedly.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Default configuration with a small trial budget.
pub fn test_config() -> HarnessConfig {
    let mut config = HarnessConfig::default();
    config.search.max_trials = 200;
    config.search.seed = Some(0x5eed);
    config
}

/// A session over `config` that never touches the filesystem unless a
/// search records to it.
pub fn context(config: HarnessConfig, variant: DutVariant) -> SessionContext {
    SessionContext::new(config, variant, true)
}

/// Builds a sequence from literal lines.
pub fn sequence(lines: &[&str]) -> InstructionSequence {
    InstructionSequence::new(lines.iter().copied())
}

/// Assembles `program` at the default base.
pub fn assemble(program: &str) -> MemoryImage {
    Rv32Assembler::new(PROGRAM_BASE)
        .assemble(program)
        .expect("program assembles")
}

/// Runs one trial of `lines` on the built-in core and reference.
pub fn trial(variant: DutVariant, lines: &[&str], addresses: &AddressSet) -> TrialVerdict {
    init_logging();
    let mut ctx = context(test_config(), variant);
    let factory = BusCoreFactory::new(PROGRAM_BASE, variant);
    run_trial(&mut ctx, &factory, &sequence(lines), addresses).expect("trial runs")
}
