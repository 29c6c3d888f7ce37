use rustc_hash::{FxHashMap, FxHashSet};

use crate::change::Change;
use crate::item::Diffable;

/// Applies a changeset to `target` the way an identity-keyed consumer would.
///
/// 1. deletes and replaces are resolved by identity against the current contents
/// 2. inserts are placed at their post-change index, clamped to the length
/// 3. moves relocate the identified item to `to`, clamped
///
/// When every surviving item kept its relative order, the result equals the
/// collection the changeset was computed against. Otherwise it holds the same
/// identities in a possibly different order.
pub fn apply<T: Diffable + Clone>(target: &mut Vec<T>, changes: &[Change<T>]) {
	let mut removed: FxHashSet<&T::Id> = FxHashSet::default();
	let mut replaced: FxHashMap<&T::Id, &T> = FxHashMap::default();
	let mut inserts = Vec::new();
	let mut moves = Vec::new();

	for change in changes {
		match change {
			Change::Delete { item, .. } => {
				removed.insert(item.diff_id());
			}
			Change::Replace { old, new, .. } => {
				replaced.insert(old.diff_id(), new);
			}
			Change::Insert { item, index } => inserts.push((*index, item)),
			Change::Move { item, to, .. } => moves.push((item.diff_id(), *to)),
		}
	}

	if !removed.is_empty() {
		target.retain(|item| !removed.contains(item.diff_id()));
	}
	if !replaced.is_empty() {
		for item in target.iter_mut() {
			if let Some(new) = replaced.get(item.diff_id()) {
				*item = (*new).clone();
			}
		}
	}

	inserts.sort_by_key(|(index, _)| *index);
	for (index, item) in inserts {
		let at = index.min(target.len());
		target.insert(at, item.clone());
	}

	for (id, to) in moves {
		if let Some(from) = target.iter().position(|item| item.diff_id() == id) {
			let item = target.remove(from);
			let at = to.min(target.len());
			target.insert(at, item);
		}
	}
}
