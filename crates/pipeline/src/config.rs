//! Pipeline tuning, loadable from TOML.

use std::path::{Path, PathBuf};
use std::time::Duration;

use poimap_diff::{DiffOptions, MoveDetection};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading pipeline configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// Error parsing TOML syntax or shape.
	#[error("TOML parse error: {0}")]
	Parse(#[from] toml::de::Error),

	/// A value is out of range.
	#[error("invalid configuration: {0}")]
	Invalid(String),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Tuning for [`ReactivePipeline`](crate::ReactivePipeline).
///
/// ```toml
/// debounce_ms = 2000
/// offload_threshold = 5000
/// move_tolerance = 3
///
/// [apply]
/// batch_threshold = 1000
/// batch_size = 250
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
	/// Quiet period after the last filter edit before recomputing.
	pub debounce_ms: u64,
	/// Projected item count at which evaluation and diffing move to the blocking pool.
	pub offload_threshold: usize,
	/// Enables move operations for items whose index shifted by more than this.
	pub move_tolerance: Option<usize>,
	/// Changesets buffered for a slow consumer before the pipeline waits.
	pub channel_capacity: usize,
	pub apply: ApplyConfig,
}

impl Default for PipelineConfig {
	fn default() -> Self {
		Self {
			debounce_ms: 2_000,
			offload_threshold: 5_000,
			move_tolerance: None,
			channel_capacity: 16,
			apply: ApplyConfig::default(),
		}
	}
}

/// Batching for [`ChangeApplier`](crate::ChangeApplier).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApplyConfig {
	/// Changesets at least this long are applied in chunks.
	pub batch_threshold: usize,
	/// Operations per chunk.
	pub batch_size: usize,
}

impl Default for ApplyConfig {
	fn default() -> Self {
		Self {
			batch_threshold: 1_000,
			batch_size: 250,
		}
	}
}

impl PipelineConfig {
	/// Reads and validates a TOML file.
	pub fn load(path: &Path) -> Result<Self> {
		let text = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		let config = Self::parse(&text)?;
		tracing::debug!(path = %path.display(), ?config, "pipeline.config.loaded");
		Ok(config)
	}

	/// Parses and validates TOML text. Missing keys take their defaults.
	pub fn parse(text: &str) -> Result<Self> {
		let config: Self = toml::from_str(text)?;
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<()> {
		if self.channel_capacity == 0 {
			return Err(ConfigError::Invalid("channel_capacity must be at least 1".into()));
		}
		if self.apply.batch_size == 0 {
			return Err(ConfigError::Invalid("apply.batch_size must be at least 1".into()));
		}
		Ok(())
	}

	pub fn debounce(&self) -> Duration {
		Duration::from_millis(self.debounce_ms)
	}

	pub fn diff_options(&self) -> DiffOptions {
		DiffOptions {
			moves: self.move_tolerance.map_or(MoveDetection::Off, MoveDetection::Tolerance),
		}
	}
}
