/// One structural operation in a changeset.
///
/// `Delete` and `Replace` reference the collection before the change, `Insert`
/// the collection after it. `index` values are informational for consumers
/// that key by identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change<T> {
	/// `item` is new; `index` is its position in the next collection.
	Insert { item: T, index: usize },
	/// `item` is gone; `index` is its position in the previous collection.
	Delete { item: T, index: usize },
	/// Same identity, different content; `index` is the position in the next collection.
	Replace { old: T, new: T, index: usize },
	/// Unchanged item whose position shifted. Only produced with move detection enabled.
	Move { item: T, from: usize, to: usize },
}

/// Discriminant of a [`Change`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
	Insert,
	Delete,
	Replace,
	Move,
}

impl<T> Change<T> {
	pub fn kind(&self) -> ChangeKind {
		match self {
			Self::Insert { .. } => ChangeKind::Insert,
			Self::Delete { .. } => ChangeKind::Delete,
			Self::Replace { .. } => ChangeKind::Replace,
			Self::Move { .. } => ChangeKind::Move,
		}
	}

	/// The item this operation leaves displayed, or the removed item for deletes.
	pub fn item(&self) -> &T {
		match self {
			Self::Insert { item, .. } | Self::Delete { item, .. } | Self::Move { item, .. } => item,
			Self::Replace { new, .. } => new,
		}
	}

	/// Returns true for operations that reference the previous collection.
	pub fn references_previous(&self) -> bool {
		matches!(self, Self::Delete { .. } | Self::Replace { .. })
	}
}

/// Per-kind operation tally, mostly for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeCounts {
	pub inserts: usize,
	pub deletes: usize,
	pub replaces: usize,
	pub moves: usize,
}

impl ChangeCounts {
	pub fn of<T>(changes: &[Change<T>]) -> Self {
		let mut counts = Self::default();
		for change in changes {
			match change.kind() {
				ChangeKind::Insert => counts.inserts += 1,
				ChangeKind::Delete => counts.deletes += 1,
				ChangeKind::Replace => counts.replaces += 1,
				ChangeKind::Move => counts.moves += 1,
			}
		}
		counts
	}

	pub fn total(&self) -> usize {
		self.inserts + self.deletes + self.replaces + self.moves
	}
}
