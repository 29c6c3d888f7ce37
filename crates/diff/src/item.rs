use std::fmt;
use std::hash::Hash;
use std::ops::Deref;
use std::sync::Arc;

use rustc_hash::FxHashSet;

/// An item with a stable identity and a comparable content signature.
///
/// Identity decides whether two items are "the same thing"; content decides
/// whether the thing changed. Two items with equal ids and unequal content
/// diff as a [`Change::Replace`](crate::Change::Replace).
pub trait Diffable {
	/// Identity key, unique within one collection.
	type Id: Eq + Hash + Clone + fmt::Debug;

	fn diff_id(&self) -> &Self::Id;

	/// Returns true when `other` carries the same content as `self`.
	fn same_content(&self, other: &Self) -> bool;
}

impl<T: Diffable + ?Sized> Diffable for Arc<T> {
	type Id = T::Id;

	fn diff_id(&self) -> &Self::Id {
		(**self).diff_id()
	}

	fn same_content(&self, other: &Self) -> bool {
		Arc::ptr_eq(self, other) || (**self).same_content(&**other)
	}
}

/// Immutable ordered sequence of items with unique identities.
///
/// Order is display order. Cloning shares the underlying storage, so a
/// collection can be handed to a consumer and retained as a fold baseline at
/// the same time.
pub struct OrderedCollection<T> {
	items: Arc<[T]>,
}

impl<T: Diffable> OrderedCollection<T> {
	/// Builds a collection, keeping the first occurrence of each identity.
	pub fn new(mut items: Vec<T>) -> Self {
		let mut duplicates = Vec::new();
		{
			let mut seen = FxHashSet::with_capacity_and_hasher(items.len(), Default::default());
			for (idx, item) in items.iter().enumerate() {
				if !seen.insert(item.diff_id()) {
					duplicates.push(idx);
				}
			}
		}

		if !duplicates.is_empty() {
			tracing::warn!(duplicates = duplicates.len(), total = items.len(), "collection.duplicate_identities_dropped");
			let mut idx = 0usize;
			let mut next_dup = duplicates.iter().peekable();
			items.retain(|_| {
				let keep = next_dup.peek().is_none_or(|&&dup| dup != idx);
				if !keep {
					next_dup.next();
				}
				idx += 1;
				keep
			});
		}

		Self { items: items.into() }
	}
}

impl<T> OrderedCollection<T> {
	/// Creates an empty collection.
	pub fn empty() -> Self {
		Self {
			items: Arc::from(Vec::new()),
		}
	}

	pub fn as_slice(&self) -> &[T] {
		&self.items
	}
}

impl<T> Clone for OrderedCollection<T> {
	fn clone(&self) -> Self {
		Self {
			items: Arc::clone(&self.items),
		}
	}
}

impl<T> Default for OrderedCollection<T> {
	fn default() -> Self {
		Self::empty()
	}
}

impl<T> Deref for OrderedCollection<T> {
	type Target = [T];

	fn deref(&self) -> &[T] {
		&self.items
	}
}

impl<T: fmt::Debug> fmt::Debug for OrderedCollection<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list().entries(self.items.iter()).finish()
	}
}

impl<T: PartialEq> PartialEq for OrderedCollection<T> {
	fn eq(&self, other: &Self) -> bool {
		self.items[..] == other.items[..]
	}
}

impl<T: Diffable> FromIterator<T> for OrderedCollection<T> {
	fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
		Self::new(iter.into_iter().collect())
	}
}

impl<T: Diffable> From<Vec<T>> for OrderedCollection<T> {
	fn from(items: Vec<T>) -> Self {
		Self::new(items)
	}
}
