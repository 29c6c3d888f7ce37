use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use poimap_diff::{Change, ChangeCounts, OrderedCollection};
use poimap_filter::FilterSnapshot;
use poimap_source::Place;

/// Displayed item type.
pub type Item = Arc<Place>;

/// What caused a recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
	/// First fold after subscribing, against an empty baseline.
	Initial,
	/// A new record snapshot was published.
	Data { version: u64 },
	/// The debounced filter selection settled.
	Filter,
}

/// One emission of the pipeline.
#[derive(Debug, Clone)]
pub struct Changeset {
	/// Monotonic per subscription, starting at 1.
	pub generation: u64,
	pub trigger: Trigger,
	pub changes: Vec<Change<Item>>,
	/// The collection the changes lead to; the next fold's baseline.
	pub displayed: OrderedCollection<Item>,
	/// Filter selection `displayed` was evaluated with.
	///
	/// A data fold reads the live selection, so it can already reflect an
	/// edit whose debounced wake-up has not fired yet.
	pub filters: FilterSnapshot,
}

impl Changeset {
	pub fn len(&self) -> usize {
		self.changes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.changes.is_empty()
	}

	pub fn counts(&self) -> ChangeCounts {
		ChangeCounts::of(&self.changes)
	}
}

/// Counters shared between a pipeline task and its stream.
#[derive(Debug, Default)]
pub struct PipelineStats {
	recomputations: AtomicU64,
	skipped: AtomicU64,
	emissions: AtomicU64,
	source_failures: AtomicU64,
}

impl PipelineStats {
	/// Folds performed, including the initial one.
	pub fn recomputations(&self) -> u64 {
		self.recomputations.load(Ordering::Relaxed)
	}

	/// Debounced filter wake-ups that found the selection unchanged.
	pub fn skipped(&self) -> u64 {
		self.skipped.load(Ordering::Relaxed)
	}

	/// Changesets delivered to the stream.
	pub fn emissions(&self) -> u64 {
		self.emissions.load(Ordering::Relaxed)
	}

	/// Data source failures observed.
	pub fn source_failures(&self) -> u64 {
		self.source_failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_recomputation(&self) {
		self.recomputations.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_skip(&self) {
		self.skipped.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_emission(&self) {
		self.emissions.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_source_failure(&self) {
		self.source_failures.fetch_add(1, Ordering::Relaxed);
	}
}
