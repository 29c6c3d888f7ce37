use std::sync::Arc;

use crate::state::FilterSnapshot;

/// Items that expose categorical attributes by dimension name.
pub trait Filterable {
	/// The attribute value inspected by `dimension`, or `None` when the item has none.
	fn attribute(&self, dimension: &str) -> Option<&str>;
}

impl<T: Filterable + ?Sized> Filterable for Arc<T> {
	fn attribute(&self, dimension: &str) -> Option<&str> {
		(**self).attribute(dimension)
	}
}

/// Applies a [`FilterSnapshot`] to a sequence of items.
///
/// Fully selected dimensions impose no constraint; the remaining dimensions
/// compose by logical AND. Input order is preserved.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterEvaluator;

impl FilterEvaluator {
	pub fn apply<T: Filterable + Clone>(snapshot: &FilterSnapshot, items: &[T]) -> Vec<T> {
		let active: Vec<_> = snapshot.active().collect();
		if active.is_empty() {
			return items.to_vec();
		}

		let kept: Vec<T> = items
			.iter()
			.filter(|item| active.iter().all(|dim| dim.admits(item.attribute(dim.name()))))
			.cloned()
			.collect();
		tracing::trace!(input = items.len(), kept = kept.len(), active = active.len(), "filter.evaluate");
		kept
	}

	/// Whether a single item passes every active dimension.
	pub fn admits<T: Filterable>(snapshot: &FilterSnapshot, item: &T) -> bool {
		snapshot.active().all(|dim| dim.admits(item.attribute(dim.name())))
	}
}
