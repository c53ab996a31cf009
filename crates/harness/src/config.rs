//! Configuration system for the differential testing harness.
//!
//! This module defines every knob a test session exposes. It provides:
//! 1. **Defaults:** The memory layout, cycle budgets and generator bounds the
//!    harness was tuned with.
//! 2. **Structures:** Hierarchical config for memory, budgets, generator
//!    bounds, session persistence and search limits.
//!
//! Configuration is read from JSON (`--config` on the CLI) or built with
//! `HarnessConfig::default()`. Every field is optional in JSON.

use std::path::PathBuf;

use serde::Deserialize;

use crate::common::HarnessError;
use crate::common::constants::{CONTROL_ADDR, DUMP_REGS};
use crate::program::Bounds;
use crate::session::ComplexityFormula;

/// Default configuration constants.
mod defaults {
    /// Test memory size (1 MiB), shared by the DUT device and the reference model.
    pub const MEM_SIZE: u32 = 1 << 20;

    /// Address the assembled program text is placed at and the DUT resets to.
    pub const PROGRAM_BASE: u32 = 0x200;

    /// Bytes at the bottom of memory pre-filled before each run.
    ///
    /// Generated loads and stores address this window.
    pub const DATA_FILL_BYTES: u32 = 0x200;

    /// Pre-fill byte value.
    pub const DATA_FILL_VALUE: u8 = 0xFF;

    /// Reference model cycle ceiling.
    pub const REF_MAX_CYCLES: u64 = 20_000;

    /// DUT cycle allowance per program instruction (epilogue included).
    pub const DUT_CYCLES_PER_INSTRUCTION: u64 = 50;

    /// Cycle ceiling for DUT-only ELF runs.
    pub const IMAGE_MAX_CYCLES: u64 = 40_000;

    /// Generator bounds.
    pub const MIN_INSTRUCTIONS: usize = 2;
    pub const MAX_INSTRUCTIONS: usize = 100;
    pub const MIN_REGISTERS: usize = 2;
    pub const MAX_REGISTERS: usize = 31;

    /// Trial ceiling for one search.
    pub const MAX_TRIALS: u64 = 10_000;

    /// Largest data window: generated accesses are `offset(x0)` with a
    /// 12-bit signed offset.
    pub const MAX_DATA_FILL_BYTES: u32 = 2048;
}

/// Root configuration structure.
///
/// # Examples
///
/// ```
/// use rvdiff_core::config::HarnessConfig;
///
/// let config = HarnessConfig::from_json(r#"{ "budget": { "ref_max_cycles": 5000 } }"#).unwrap();
/// assert_eq!(config.budget.ref_max_cycles, 5000);
/// assert_eq!(config.budget.dut_cycles_per_instruction, 50);
/// assert_eq!(config.memory.program_base, 0x200);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HarnessConfig {
    /// Memory layout shared by both simulations.
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Cycle budgets.
    #[serde(default)]
    pub budget: BudgetConfig,
    /// Generator bounds.
    #[serde(default)]
    pub bounds: Bounds,
    /// Session file settings.
    #[serde(default)]
    pub session: SessionConfig,
    /// Search limits.
    #[serde(default)]
    pub search: SearchConfig,
}

impl HarnessConfig {
    /// Parses a JSON configuration and validates it.
    pub fn from_json(json: &str) -> Result<Self, HarnessError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| HarnessError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints the individual defaults cannot express.
    pub fn validate(&self) -> Result<(), HarnessError> {
        let m = &self.memory;
        if m.mem_size > CONTROL_ADDR {
            return Err(HarnessError::Config(format!(
                "memory size {:#x} overlaps the control channel at {CONTROL_ADDR:#x}",
                m.mem_size
            )));
        }
        if m.program_base % 4 != 0 || m.program_base >= m.mem_size {
            return Err(HarnessError::Config(format!(
                "program base {:#x} must be word aligned and inside memory",
                m.program_base
            )));
        }
        if m.data_fill_bytes % 4 != 0 {
            return Err(HarnessError::Config(format!(
                "data window of {:#x} bytes is not a whole number of words",
                m.data_fill_bytes
            )));
        }
        if m.data_fill_bytes > defaults::MAX_DATA_FILL_BYTES {
            return Err(HarnessError::Config(format!(
                "data window of {:#x} bytes is beyond the {:#x} bytes an x0-relative offset reaches",
                m.data_fill_bytes,
                defaults::MAX_DATA_FILL_BYTES
            )));
        }
        if m.data_fill_bytes > m.program_base {
            return Err(HarnessError::Config(format!(
                "data window of {:#x} bytes overlaps program text at {:#x}",
                m.data_fill_bytes, m.program_base
            )));
        }

        let b = &self.bounds;
        if b.min_instructions == 0 || b.min_instructions > b.max_instructions {
            return Err(HarnessError::Config(format!(
                "instruction bounds {}..={} are empty",
                b.min_instructions, b.max_instructions
            )));
        }
        if b.min_registers == 0 || b.min_registers > b.max_registers || b.max_registers > DUMP_REGS
        {
            return Err(HarnessError::Config(format!(
                "register bounds {}..={} must lie within 1..={DUMP_REGS}",
                b.min_registers, b.max_registers
            )));
        }
        Ok(())
    }
}

/// Memory layout.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    /// Size of the test memory in bytes.
    #[serde(default = "MemoryConfig::default_mem_size")]
    pub mem_size: u32,

    /// Program text load address and DUT reset vector.
    #[serde(default = "MemoryConfig::default_program_base")]
    pub program_base: u32,

    /// Bytes at address 0 pre-filled before every run.
    #[serde(default = "MemoryConfig::default_data_fill_bytes")]
    pub data_fill_bytes: u32,

    /// Pre-fill value.
    #[serde(default = "MemoryConfig::default_data_fill_value")]
    pub data_fill_value: u8,
}

impl MemoryConfig {
    fn default_mem_size() -> u32 {
        defaults::MEM_SIZE
    }

    fn default_program_base() -> u32 {
        defaults::PROGRAM_BASE
    }

    fn default_data_fill_bytes() -> u32 {
        defaults::DATA_FILL_BYTES
    }

    fn default_data_fill_value() -> u8 {
        defaults::DATA_FILL_VALUE
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            mem_size: defaults::MEM_SIZE,
            program_base: defaults::PROGRAM_BASE,
            data_fill_bytes: defaults::DATA_FILL_BYTES,
            data_fill_value: defaults::DATA_FILL_VALUE,
        }
    }
}

/// Cycle budgets.
///
/// The reference ceiling is fixed while the DUT ceiling scales with program
/// length; both are configurable independently.
#[derive(Debug, Clone, Deserialize)]
pub struct BudgetConfig {
    /// Reference model ceiling.
    #[serde(default = "BudgetConfig::default_ref_max_cycles")]
    pub ref_max_cycles: u64,

    /// DUT cycles allowed per instruction of the DUT program.
    #[serde(default = "BudgetConfig::default_dut_cycles_per_instruction")]
    pub dut_cycles_per_instruction: u64,

    /// Ceiling for DUT-only image runs.
    #[serde(default = "BudgetConfig::default_image_max_cycles")]
    pub image_max_cycles: u64,
}

impl BudgetConfig {
    fn default_ref_max_cycles() -> u64 {
        defaults::REF_MAX_CYCLES
    }

    fn default_dut_cycles_per_instruction() -> u64 {
        defaults::DUT_CYCLES_PER_INSTRUCTION
    }

    fn default_image_max_cycles() -> u64 {
        defaults::IMAGE_MAX_CYCLES
    }

    /// DUT ceiling for a program of `instructions` instructions.
    pub const fn dut_max_cycles(&self, instructions: usize) -> u64 {
        self.dut_cycles_per_instruction * instructions as u64
    }
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            ref_max_cycles: defaults::REF_MAX_CYCLES,
            dut_cycles_per_instruction: defaults::DUT_CYCLES_PER_INSTRUCTION,
            image_max_cycles: defaults::IMAGE_MAX_CYCLES,
        }
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min_instructions: defaults::MIN_INSTRUCTIONS,
            max_instructions: defaults::MAX_INSTRUCTIONS,
            min_registers: defaults::MIN_REGISTERS,
            max_registers: defaults::MAX_REGISTERS,
        }
    }
}

/// Session file settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Directory the per-configuration session file lives in.
    #[serde(default = "SessionConfig::default_dir")]
    pub dir: PathBuf,

    /// Complexity formula applied to recorded sequences.
    #[serde(default)]
    pub complexity: ComplexityFormula,
}

impl SessionConfig {
    fn default_dir() -> PathBuf {
        PathBuf::from(".")
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dir: Self::default_dir(),
            complexity: ComplexityFormula::default(),
        }
    }
}

/// Search limits.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Trials one search may run before giving up.
    #[serde(default = "SearchConfig::default_max_trials")]
    pub max_trials: u64,

    /// Seed for the random and property-based strategies; random when unset.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl SearchConfig {
    fn default_max_trials() -> u64 {
        defaults::MAX_TRIALS
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_trials: defaults::MAX_TRIALS,
            seed: None,
        }
    }
}
