//! Error types for filter construction and mutation.

use thiserror::Error;

/// Errors raised by filter sets and filter state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
	/// A selection referenced a value outside the dimension's universe.
	#[error("'{value}' is not a value of filter '{dimension}'")]
	InvalidValue {
		/// Dimension name.
		dimension: String,
		/// The rejected value.
		value: String,
	},

	/// A positional selection was past the end of the universe.
	#[error("index {index} is out of range for filter '{dimension}' ({len} values)")]
	IndexOutOfRange {
		/// Dimension name.
		dimension: String,
		/// The rejected index.
		index: usize,
		/// Universe size.
		len: usize,
	},

	/// The universe passed at construction contained a value twice.
	#[error("duplicate value '{value}' in filter '{dimension}'")]
	DuplicateValue {
		/// Dimension name.
		dimension: String,
		/// The repeated value.
		value: String,
	},

	/// Two dimensions of one filter state share a name.
	#[error("duplicate filter dimension '{0}'")]
	DuplicateDimension(String),

	/// A dimension lookup by name failed.
	#[error("unknown filter dimension '{0}'")]
	UnknownDimension(String),
}

/// Result type for filter operations.
pub type Result<T> = std::result::Result<T, FilterError>;
