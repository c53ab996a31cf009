//! Session file persistence.
//!
//! One JSON document per DUT configuration, holding one bucket per search
//! strategy. Each bucket keeps parallel arrays: `ntests[i]`, `ntrans[i]`,
//! `avg_v[i]` and `asm[i]` describe the `i`-th recorded search. Every record
//! rewrites the whole file through a temporary in the same directory, so a
//! crash never leaves a truncated session behind. Files without `asm` are
//! padded with empty sequences on the next record so the arrays stay aligned.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::common::HarnessError;
use crate::program::InstructionSequence;
use crate::search::SearchStrategy;

/// Results recorded for one search strategy.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyBucket {
    /// Trials each search ran before stopping.
    #[serde(default)]
    pub ntests: Vec<u64>,
    /// Instruction count of each recorded sequence.
    #[serde(default)]
    pub ntrans: Vec<usize>,
    /// Complexity of each recorded sequence.
    #[serde(default)]
    pub avg_v: Vec<f64>,
    /// Each recorded sequence, newline-joined.
    #[serde(default)]
    pub asm: Vec<String>,
}

impl StrategyBucket {
    /// Number of recorded searches.
    pub fn len(&self) -> usize {
        self.ntests.len()
    }

    /// True when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.ntests.is_empty()
    }

    /// Checks the arrays line up. `asm` may be shorter: files written before
    /// it existed have none.
    fn check_shape(&self) -> Result<(), String> {
        let n = self.ntests.len();
        if self.ntrans.len() != n || self.avg_v.len() != n || self.asm.len() > n {
            return Err(format!(
                "arrays differ in length: ntests {n}, ntrans {}, avg_v {}, asm {}",
                self.ntrans.len(),
                self.avg_v.len(),
                self.asm.len()
            ));
        }
        Ok(())
    }

    fn push(&mut self, entry: &SessionEntry) {
        self.asm.resize(self.ntests.len(), String::new());
        self.ntests.push(entry.trial_count);
        self.ntrans.push(entry.instruction_count);
        self.avg_v.push(entry.complexity);
        self.asm.push(entry.sequence.to_text());
    }

    /// The `idx`-th recorded entry, if all four arrays hold it.
    pub fn entry(&self, idx: usize) -> Option<SessionEntry> {
        Some(SessionEntry {
            trial_count: *self.ntests.get(idx)?,
            instruction_count: *self.ntrans.get(idx)?,
            complexity: *self.avg_v.get(idx)?,
            sequence: InstructionSequence::from_text(self.asm.get(idx)?),
        })
    }
}

/// The whole session document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Random search results.
    #[serde(default)]
    pub complete_random: StrategyBucket,
    /// Iterative deepening results.
    #[serde(default)]
    pub iterative_deepening: StrategyBucket,
    /// Property-based search results.
    #[serde(default)]
    pub property_based: StrategyBucket,
}

impl SessionRecord {
    /// The bucket for `strategy`.
    pub const fn bucket(&self, strategy: SearchStrategy) -> &StrategyBucket {
        match strategy {
            SearchStrategy::CompleteRandom => &self.complete_random,
            SearchStrategy::IterativeDeepening => &self.iterative_deepening,
            SearchStrategy::PropertyBased => &self.property_based,
        }
    }

    /// The bucket for `strategy`, mutably.
    pub const fn bucket_mut(&mut self, strategy: SearchStrategy) -> &mut StrategyBucket {
        match strategy {
            SearchStrategy::CompleteRandom => &mut self.complete_random,
            SearchStrategy::IterativeDeepening => &mut self.iterative_deepening,
            SearchStrategy::PropertyBased => &mut self.property_based,
        }
    }
}

/// One search's result, as recorded.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionEntry {
    /// Trials the search ran.
    pub trial_count: u64,
    /// Instructions in the recorded sequence.
    pub instruction_count: usize,
    /// Complexity of the recorded sequence.
    pub complexity: f64,
    /// The recorded sequence.
    pub sequence: InstructionSequence,
}

/// Reads and appends to one session file.
#[derive(Clone, Debug)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// A store backed by `path`. Nothing is touched until the first access.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The session file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the session, or an empty one if the file does not exist.
    pub fn load(&self) -> Result<SessionRecord, HarnessError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(SessionRecord::default());
            }
            Err(e) => return Err(self.io_error(e)),
        };
        let record: SessionRecord =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| {
                HarnessError::SessionFormat {
                    path: self.path.clone(),
                    source,
                }
            })?;
        for strategy in SearchStrategy::ALL {
            record
                .bucket(strategy)
                .check_shape()
                .map_err(|msg| HarnessError::SessionFormat {
                    path: self.path.clone(),
                    source: serde::de::Error::custom(format!("{strategy}: {msg}")),
                })?;
        }
        Ok(record)
    }

    /// Appends `entry` to the `strategy` bucket and rewrites the file.
    ///
    /// With `fresh`, any existing file is discarded first. Returns the record
    /// as written.
    pub fn record(
        &self,
        strategy: SearchStrategy,
        entry: &SessionEntry,
        fresh: bool,
    ) -> Result<SessionRecord, HarnessError> {
        let mut record = if fresh {
            SessionRecord::default()
        } else {
            self.load()?
        };
        record.bucket_mut(strategy).push(entry);
        self.save(&record)?;
        debug!(
            path = %self.path.display(),
            strategy = strategy.name(),
            recorded = record.bucket(strategy).len(),
            "session updated"
        );
        Ok(record)
    }

    /// Writes `record` atomically.
    pub fn save(&self, record: &SessionRecord) -> Result<(), HarnessError> {
        let parent = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;

        let tmp = NamedTempFile::new_in(parent).map_err(|e| self.io_error(e))?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer_pretty(&mut writer, record).map_err(|source| {
                HarnessError::SessionFormat {
                    path: self.path.clone(),
                    source,
                }
            })?;
            writer.flush().map_err(|e| self.io_error(e))?;
        }
        tmp.as_file().sync_all().map_err(|e| self.io_error(e))?;
        let _ = tmp.persist(&self.path).map_err(|e| self.io_error(e.error))?;
        Ok(())
    }

    fn io_error(&self, source: std::io::Error) -> HarnessError {
        HarnessError::SessionIo {
            path: self.path.clone(),
            source,
        }
    }
}
