//! Error types for fetching records.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to produce a new record snapshot.
#[derive(Debug, Error)]
pub enum SourceError {
	/// Error reading a data file.
	#[error("I/O error reading {path}: {source}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		#[source]
		source: std::io::Error,
	},

	/// The fetcher reported a failure (network, decoding of the whole payload, ...).
	#[error("fetch failed: {0}")]
	Fetch(String),

	/// A newer refresh replaced this one before it finished.
	#[error("refresh superseded by a newer request")]
	Superseded,
}

/// Result type for fetch operations.
pub type Result<T> = std::result::Result<T, SourceError>;
