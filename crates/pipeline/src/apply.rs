use indexmap::IndexMap;
use poimap_diff::{Change, Diffable};

use crate::config::ApplyConfig;

/// The rendering layer's view of displayed items.
///
/// Implementations key items by identity; `remove` receives the instances
/// that were previously added.
pub trait MapSurface<T> {
	fn add(&mut self, items: &[T]);
	fn remove(&mut self, items: &[T]);
}

/// Tally of one application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
	pub added: usize,
	pub removed: usize,
	pub replaced: usize,
	pub moves_ignored: usize,
	/// Remove/add rounds issued to the surface.
	pub chunks: usize,
}

/// Applies changesets to a [`MapSurface`], splitting large ones into chunks.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeApplier {
	config: ApplyConfig,
}

impl ChangeApplier {
	pub fn new(config: ApplyConfig) -> Self {
		Self { config }
	}

	/// Applies `changes` in order.
	///
	/// Changesets of at least `batch_threshold` operations are split into
	/// chunks of `batch_size`, yielding to the runtime between chunks. Within a
	/// chunk, removals are issued before additions, so a replace removes the
	/// old instance before adding the new one.
	pub async fn apply<T, S>(&self, surface: &mut S, changes: &[Change<T>]) -> ApplyReport
	where
		T: Clone,
		S: MapSurface<T> + ?Sized,
	{
		let mut report = ApplyReport::default();
		if changes.is_empty() {
			return report;
		}

		let chunk_size = if changes.len() >= self.config.batch_threshold {
			self.config.batch_size.max(1)
		} else {
			changes.len()
		};

		for (idx, chunk) in changes.chunks(chunk_size).enumerate() {
			if idx > 0 {
				tokio::task::yield_now().await;
			}
			apply_chunk(surface, chunk, &mut report);
		}

		if report.moves_ignored > 0 {
			tracing::warn!(moves = report.moves_ignored, "apply.moves_ignored");
		}
		tracing::debug!(
			added = report.added,
			removed = report.removed,
			replaced = report.replaced,
			chunks = report.chunks,
			"apply.complete"
		);
		report
	}
}

fn apply_chunk<T: Clone, S: MapSurface<T> + ?Sized>(surface: &mut S, chunk: &[Change<T>], report: &mut ApplyReport) {
	let mut removals = Vec::new();
	let mut additions = Vec::new();

	for change in chunk {
		match change {
			Change::Insert { item, .. } => {
				additions.push(item.clone());
				report.added += 1;
			}
			Change::Delete { item, .. } => {
				removals.push(item.clone());
				report.removed += 1;
			}
			Change::Replace { old, new, .. } => {
				removals.push(old.clone());
				additions.push(new.clone());
				report.replaced += 1;
			}
			Change::Move { .. } => report.moves_ignored += 1,
		}
	}

	if !removals.is_empty() {
		surface.remove(&removals);
	}
	if !additions.is_empty() {
		surface.add(&additions);
	}
	report.chunks += 1;
}

/// Identity-keyed surface that keeps items in insertion order.
#[derive(Debug, Clone)]
pub struct InMemorySurface<T: Diffable> {
	items: IndexMap<T::Id, T>,
}

impl<T: Diffable> Default for InMemorySurface<T> {
	fn default() -> Self {
		Self { items: IndexMap::new() }
	}
}

impl<T: Diffable> InMemorySurface<T> {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	pub fn get(&self, id: &T::Id) -> Option<&T> {
		self.items.get(id)
	}

	pub fn contains(&self, id: &T::Id) -> bool {
		self.items.contains_key(id)
	}

	pub fn items(&self) -> impl Iterator<Item = &T> {
		self.items.values()
	}
}

impl<T: Diffable + Clone> MapSurface<T> for InMemorySurface<T> {
	fn add(&mut self, items: &[T]) {
		for item in items {
			if self.items.insert(item.diff_id().clone(), item.clone()).is_some() {
				tracing::debug!(id = ?item.diff_id(), "surface.add.replaced_existing");
			}
		}
	}

	fn remove(&mut self, items: &[T]) {
		for item in items {
			if self.items.shift_remove(item.diff_id()).is_none() {
				tracing::debug!(id = ?item.diff_id(), "surface.remove.missing");
			}
		}
	}
}
