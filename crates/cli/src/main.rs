//! Differential testing harness CLI.
//!
//! This binary drives the harness against the built-in bus core. It provides:
//! 1. **Searches:** `random`, `deepening` and `property` run one search
//!    strategy until a failure or the trial budget, and record the result in
//!    the session file.
//! 2. **Single programs:** `simple` runs the `lui x1, 0x42` bench; `check`
//!    runs one trial on a hand-written program.
//! 3. **Images:** `run-elf` runs the DUT alone on an ELF image.
//!
//! The exit status is 0 when nothing failed, 1 when a bug was found or an
//! error stopped the run.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use rvdiff_core::asm::Rv32Assembler;
use rvdiff_core::config::HarnessConfig;
use rvdiff_core::core::{BusCoreFactory, DutFactory, DutVariant};
use rvdiff_core::program::{AddressSet, InstructionSequence};
use rvdiff_core::search::SearchStrategy;
use rvdiff_core::session::{SearchDriver, SessionContext};
use rvdiff_core::sim::{DualRunner, SimulationOutcome, TrialVerdict, load_elf, run_trial};

#[derive(Parser, Debug)]
#[command(
    name = "rvdiff",
    author,
    version,
    about = "Differential testing of an RV32 core against a reference model",
    long_about = "Generate RV32IM instruction sequences, run them on the DUT and on a golden reference model, and compare the final register file and touched memory.\n\nExamples:\n  rvdiff random --max-trials 500\n  rvdiff --dut mul-carrychain property --seed 7\n  rvdiff check tests/add.s --addr 0x10\n  rvdiff run-elf build/ubmark-vvadd.elf --trace"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// DUT build to test.
    #[arg(long, global = true, default_value_t = DutVariant::Correct)]
    dut: DutVariant,

    /// JSON configuration file; unset fields keep their defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the session file.
    #[arg(long, global = true)]
    session_dir: Option<PathBuf>,

    /// Start a new session file instead of appending to the existing one.
    #[arg(long, global = true)]
    fresh: bool,

    /// Trials one search may run.
    #[arg(long, global = true)]
    max_trials: Option<u64>,

    /// Seed for the random and property-based searches.
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// More logging (`-v` per-trial detail, `-vv` per-cycle trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only warnings and errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Complete random testing: a fresh random sequence per trial.
    Random,

    /// Iterative deepening: every catalogue sequence, shortest first.
    Deepening,

    /// Property-based search with shrinking toward a minimal failure.
    Property,

    /// The single-instruction bench: `lui x1, 0x42`.
    Simple,

    /// One trial on a hand-written program, one instruction per line.
    Check {
        /// Assembly file.
        file: PathBuf,

        /// Memory byte address to compare (repeatable; hex with `0x`).
        #[arg(long = "addr", value_parser = parse_u32)]
        addrs: Vec<u32>,
    },

    /// Runs the DUT alone on an ELF image until it signals completion.
    RunElf {
        /// ELF file.
        file: PathBuf,

        /// Cycle ceiling.
        #[arg(long)]
        max_cycles: Option<u64>,

        /// Print the per-cycle device line trace.
        #[arg(long)]
        trace: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let trace = matches!(cli.command, Commands::RunElf { trace: true, .. });
    init_tracing(&cli.global, trace);

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Installs the log subscriber. `RUST_LOG` wins over the verbosity flags.
fn init_tracing(args: &GlobalArgs, trace: bool) {
    let level = match (args.quiet, args.verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let default = if trace && args.verbose < 2 {
        format!("{level},rvdiff_core::sim=trace")
    } else {
        level.to_owned()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

/// Dispatches a subcommand. Returns `Ok(false)` when the DUT failed.
fn run(cli: Cli) -> Result<bool> {
    let config = load_config(&cli.global)?;
    let variant = cli.global.dut;
    let factory = BusCoreFactory::new(config.memory.program_base, variant);
    let mut ctx = SessionContext::new(config, variant, cli.global.fresh);

    match cli.command {
        Commands::Random => cmd_search(&mut ctx, &factory, SearchStrategy::CompleteRandom),
        Commands::Deepening => cmd_search(&mut ctx, &factory, SearchStrategy::IterativeDeepening),
        Commands::Property => cmd_search(&mut ctx, &factory, SearchStrategy::PropertyBased),
        Commands::Simple => {
            let sequence = InstructionSequence::new(["lui x1, 0x42"]);
            cmd_trial(&mut ctx, &factory, &sequence, &AddressSet::new())
        }
        Commands::Check { file, addrs } => {
            let text = fs::read_to_string(&file)
                .with_context(|| format!("cannot read {}", file.display()))?;
            let sequence = InstructionSequence::from_text(&text);
            if sequence.is_empty() {
                bail!("{} holds no instructions", file.display());
            }
            let addresses: AddressSet = addrs.into_iter().collect();
            cmd_trial(&mut ctx, &factory, &sequence, &addresses)
        }
        Commands::RunElf {
            file, max_cycles, ..
        } => cmd_run_elf(&ctx, &factory, &file, max_cycles),
    }
}

/// Reads `--config` and applies the flag overrides on top.
fn load_config(args: &GlobalArgs) -> Result<HarnessConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("cannot read config {}", path.display()))?;
            HarnessConfig::from_json(&json)?
        }
        None => HarnessConfig::default(),
    };
    if let Some(dir) = &args.session_dir {
        config.session.dir.clone_from(dir);
    }
    if let Some(max_trials) = args.max_trials {
        config.search.max_trials = max_trials;
    }
    if args.seed.is_some() {
        config.search.seed = args.seed;
    }
    config.validate()?;
    Ok(config)
}

/// Runs one search strategy and prints its summary.
fn cmd_search(
    ctx: &mut SessionContext,
    factory: &dyn DutFactory,
    strategy: SearchStrategy,
) -> Result<bool> {
    let session = ctx.session_path();
    let summary = SearchDriver::new(ctx, factory)
        .run(strategy)
        .with_context(|| format!("{strategy} search aborted"))?;
    println!("{summary}");
    println!("[*] Session file: {}", session.display());
    Ok(!summary.found_bug())
}

/// Runs one trial and prints its verdict.
fn cmd_trial(
    ctx: &mut SessionContext,
    factory: &dyn DutFactory,
    sequence: &InstructionSequence,
    addresses: &AddressSet,
) -> Result<bool> {
    print!("{sequence}");
    let verdict = run_trial(ctx, factory, sequence, addresses)?;
    println!("{verdict}");
    match verdict {
        TrialVerdict::InvalidProgram(reason) => bail!("invalid program: {reason}"),
        v => Ok(!v.is_failure()),
    }
}

/// Runs the DUT alone on an ELF image.
fn cmd_run_elf(
    ctx: &SessionContext,
    factory: &dyn DutFactory,
    file: &Path,
    max_cycles: Option<u64>,
) -> Result<bool> {
    let image = load_elf(file)?;
    let config = ctx.config();
    let max_cycles = max_cycles.unwrap_or(config.budget.image_max_cycles);
    info!(
        file = %file.display(),
        entry = format_args!("{:#x}", image.entry()),
        max_cycles,
        "running ELF image"
    );

    let assembler = Rv32Assembler::new(config.memory.program_base);
    let mut dut = factory.elaborate(true);
    let report = DualRunner::new(config, &assembler).run_image(dut.as_mut(), &image, max_cycles);
    println!("[*] {} ({} cycles)", report.outcome, report.cycles);

    match report.outcome {
        SimulationOutcome::Passed | SimulationOutcome::ImplicitExit(0) => Ok(true),
        SimulationOutcome::ProtocolViolation { addr, cycle } => {
            bail!("protocol violation: DUT accessed {addr:#010x} at cycle {cycle}")
        }
        _ => Ok(false),
    }
}

/// Parses a decimal or `0x`-prefixed address.
fn parse_u32(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid address `{s}`: {e}"))
}
