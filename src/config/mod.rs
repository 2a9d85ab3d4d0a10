//! Store configuration: open-time options, engine tuning pass-through and
//! validation.


use std::path::PathBuf;
use std::time::Duration;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Configuration used to open a [`crate::RaftStore`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreOptions {
    /// Directory the engine opens or creates.
    pub path: PathBuf,

    /// Tuning pass-through for the underlying engine.
    #[serde(default)]
    pub engine: EngineOptions,

    /// Skip forced durability after each write transaction.
    /// Unsafe: a crash can lose the latest writes. Use with caution.
    #[serde(default)]
    pub skip_sync: bool,

    /// Open the engine for reads only; any write fails with a
    /// read-only violation.
    #[serde(default)]
    pub read_only: bool,

    /// Start the background space-reclamation scheduler.
    #[serde(default)]
    pub enable_compaction: bool,

    /// Period of the conditional reclamation ticker, which runs a pass
    /// only when the value log grew since the last pass.
    #[serde(default = "default_compaction_interval_ms")]
    pub compaction_interval_ms: u64,

    /// Period of the mandatory reclamation ticker, which always runs a
    /// pass.
    #[serde(default = "default_mandatory_compaction_interval_ms")]
    pub mandatory_compaction_interval_ms: u64,

    /// Minimum on-disk growth (bytes) since the last pass before a
    /// conditional tick runs reclamation.
    #[serde(default)]
    pub compaction_growth_threshold: u64,
}

/// Engine tuning knobs forwarded to the adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineOptions {
    /// Page cache budget in bytes.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,

    /// Compress values on disk.
    #[serde(default = "default_use_compression")]
    pub use_compression: bool,

    /// Ceiling on staged operations per write transaction. Ranged
    /// deletes split into multiple commits when a range exceeds this.
    #[serde(default = "default_max_txn_ops")]
    pub max_txn_ops: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            cache_capacity: default_cache_capacity(),
            use_compression: default_use_compression(),
            max_txn_ops: default_max_txn_ops(),
        }
    }
}

impl StoreOptions {
    /// Options opening `path` with every knob at its default.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            engine: EngineOptions::default(),
            skip_sync: false,
            read_only: false,
            enable_compaction: false,
            compaction_interval_ms: default_compaction_interval_ms(),
            mandatory_compaction_interval_ms: default_mandatory_compaction_interval_ms(),
            compaction_growth_threshold: 0,
        }
    }

    /// Loads options from a TOML file, layered under
    /// `RAFT_LOGSTORE_`-prefixed environment overrides.
    pub fn from_file(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix("RAFT_LOGSTORE")
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()?;

        let options: StoreOptions = settings.try_deserialize()?;
        options.validate()?;
        Ok(options)
    }

    pub fn compaction_interval(&self) -> Duration {
        Duration::from_millis(self.compaction_interval_ms)
    }

    pub fn mandatory_compaction_interval(&self) -> Duration {
        Duration::from_millis(self.mandatory_compaction_interval_ms)
    }

    /// Validates the option set before the engine is opened.
    pub fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(Error::Config(ConfigError::Message(
                "path must not be empty".into(),
            )));
        }

        if self.engine.max_txn_ops == 0 {
            return Err(Error::Config(ConfigError::Message(
                "engine.max_txn_ops must be at least 1".into(),
            )));
        }

        if self.enable_compaction {
            if self.read_only {
                return Err(Error::Config(ConfigError::Message(
                    "enable_compaction requires a writable handle".into(),
                )));
            }
            if self.compaction_interval_ms == 0 {
                return Err(Error::Config(ConfigError::Message(
                    "compaction_interval_ms must be at least 1ms".into(),
                )));
            }
            if self.mandatory_compaction_interval_ms == 0 {
                return Err(Error::Config(ConfigError::Message(
                    "mandatory_compaction_interval_ms must be at least 1ms".into(),
                )));
            }
        }

        Ok(())
    }
}

fn default_compaction_interval_ms() -> u64 {
    // 1 minute
    60_000
}
fn default_mandatory_compaction_interval_ms() -> u64 {
    // 10 minutes
    600_000
}
fn default_cache_capacity() -> u64 {
    // 64MB
    64 * 1024 * 1024
}
fn default_use_compression() -> bool {
    true
}
fn default_max_txn_ops() -> usize {
    100_000
}
