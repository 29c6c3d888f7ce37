//! Identity-based sequence diffing.
//!
//! [`diff`] compares a previously displayed [`OrderedCollection`] with the
//! next desired one and returns the [`Change`] operations that turn the first
//! into the second:
//!
//! * identities only in `previous` become [`Change::Delete`]
//! * identities only in `next` become [`Change::Insert`]
//! * identities in both whose content differs become [`Change::Replace`]
//! * unchanged items that only shifted position produce nothing unless move
//!   detection is enabled through [`diff_with`]
//!
//! Deletes and replaces come first, in `previous` order, followed by inserts
//! in `next` order. Operations are keyed by identity so a consumer can apply a
//! whole changeset as one batch without tracking index shifts.
//!
//! The engine is hash-map based and runs in O(n + m). Identical inputs are
//! detected by a pairwise scan and return an unallocated empty `Vec`.

/// Reference changeset interpreter.
pub mod apply;
/// Change operation types.
pub mod change;
/// The diff engine.
pub mod engine;
/// Identity trait and ordered collections.
pub mod item;

pub use apply::apply;
pub use change::{Change, ChangeCounts, ChangeKind};
pub use engine::{DiffOptions, MoveDetection, diff, diff_with};
pub use item::{Diffable, OrderedCollection};
