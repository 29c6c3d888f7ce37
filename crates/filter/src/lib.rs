//! Inclusion filters over categorical item attributes.
//!
//! A [`FilterSet`] is one dimension: an ordered universe of values and the
//! subset currently selected. A [`FilterState`] composes several named
//! dimensions and re-emits their change notifications through one merged
//! [`ChangeSignal`]. Evaluation runs against an immutable [`FilterSnapshot`]
//! so it can happen away from the thread that mutates the live state.
//!
//! # Notification ordering
//!
//! Every mutation emits its [`ChangeNotice`] *before* the selection changes.
//! A callback that reads the set synchronously observes the pre-change state;
//! a consumer that defers its read to a later scheduling tick observes the
//! post-change state. Consumers that need the new selection must re-read it
//! on their own schedule rather than inside the callback.

/// Built-in dimension names and universes for the restaurant data set.
pub mod catalog;
/// Error types.
pub mod error;
/// Snapshot evaluation.
pub mod evaluate;
/// Single filter dimension.
pub mod set;
/// Change notification primitives.
pub mod signal;
/// Composition of named dimensions.
pub mod state;

pub use error::{FilterError, Result};
pub use evaluate::{FilterEvaluator, Filterable};
pub use set::FilterSet;
pub use signal::{ChangeNotice, ChangeSignal, Mutation, Subscription};
pub use state::{DimensionSnapshot, FilterSnapshot, FilterState};
