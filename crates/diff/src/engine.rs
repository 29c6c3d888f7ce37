use rustc_hash::{FxHashMap, FxHashSet};

use crate::change::Change;
use crate::item::Diffable;

/// Whether unchanged items that shifted position produce [`Change::Move`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MoveDetection {
	/// Position-only changes are ignored.
	#[default]
	Off,
	/// Emit a move when an unchanged item's index shifts by more than the tolerance.
	///
	/// The shift is measured on raw indices, so a delete near the front of a
	/// long collection moves every later item by one.
	Tolerance(usize),
}

/// Diff engine options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffOptions {
	pub moves: MoveDetection,
}

/// Diffs `previous` against `next` without move detection.
///
/// Both slices are expected to hold unique identities, which
/// [`OrderedCollection`](crate::OrderedCollection) guarantees.
pub fn diff<T: Diffable + Clone>(previous: &[T], next: &[T]) -> Vec<Change<T>> {
	diff_with(previous, next, DiffOptions::default())
}

/// Diffs `previous` against `next`.
///
/// Output order: deletes and replaces in `previous` order, then moves (if
/// enabled), then inserts in `next` order.
pub fn diff_with<T: Diffable + Clone>(previous: &[T], next: &[T], options: DiffOptions) -> Vec<Change<T>> {
	if unchanged(previous, next) {
		return Vec::new();
	}

	if previous.is_empty() {
		return next
			.iter()
			.enumerate()
			.map(|(index, item)| Change::Insert { item: item.clone(), index })
			.collect();
	}

	if next.is_empty() {
		return previous
			.iter()
			.enumerate()
			.map(|(index, item)| Change::Delete { item: item.clone(), index })
			.collect();
	}

	let mut next_index: FxHashMap<&T::Id, usize> = FxHashMap::with_capacity_and_hasher(next.len(), Default::default());
	for (idx, item) in next.iter().enumerate() {
		next_index.entry(item.diff_id()).or_insert(idx);
	}

	let mut changes = Vec::new();
	let mut moves = Vec::new();
	let mut previous_ids: FxHashSet<&T::Id> = FxHashSet::with_capacity_and_hasher(previous.len(), Default::default());

	for (from, old) in previous.iter().enumerate() {
		previous_ids.insert(old.diff_id());
		let Some(&to) = next_index.get(old.diff_id()) else {
			changes.push(Change::Delete { item: old.clone(), index: from });
			continue;
		};

		let new = &next[to];
		if !old.same_content(new) {
			changes.push(Change::Replace {
				old: old.clone(),
				new: new.clone(),
				index: to,
			});
		} else if let MoveDetection::Tolerance(tolerance) = options.moves
			&& from.abs_diff(to) > tolerance
		{
			moves.push(Change::Move { item: new.clone(), from, to });
		}
	}

	changes.append(&mut moves);

	for (index, item) in next.iter().enumerate() {
		if !previous_ids.contains(item.diff_id()) {
			changes.push(Change::Insert { item: item.clone(), index });
		}
	}

	tracing::trace!(previous = previous.len(), next = next.len(), changes = changes.len(), "diff.complete");
	changes
}

/// Pairwise scan for the common "nothing changed" case.
fn unchanged<T: Diffable>(previous: &[T], next: &[T]) -> bool {
	previous.len() == next.len() && previous.iter().zip(next).all(|(old, new)| old.diff_id() == new.diff_id() && old.same_content(new))
}
