use std::sync::Arc;

use indexmap::IndexSet;
use parking_lot::RwLock;

use crate::error::{FilterError, Result};
use crate::signal::{ChangeNotice, ChangeSignal, Mutation, Subscription};
use crate::state::DimensionSnapshot;

/// Selection bitmap over a dimension's universe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Selection {
	bits: Vec<bool>,
	count: usize,
}

impl Selection {
	fn all(len: usize) -> Self {
		Self {
			bits: vec![true; len],
			count: len,
		}
	}

	fn set(&mut self, idx: usize, selected: bool) {
		if self.bits[idx] != selected {
			self.bits[idx] = selected;
			if selected {
				self.count += 1;
			} else {
				self.count -= 1;
			}
		}
	}

	fn fill(&mut self, selected: bool) {
		self.bits.fill(selected);
		self.count = if selected { self.bits.len() } else { 0 };
	}

	pub(crate) fn contains(&self, idx: usize) -> bool {
		self.bits.get(idx).copied().unwrap_or(false)
	}

	pub(crate) fn count(&self) -> usize {
		self.count
	}
}

/// One filter dimension: a named, ordered universe of distinct values and the
/// currently selected subset.
///
/// Mutators notify subscribers before mutating; see the crate docs.
#[derive(Debug)]
pub struct FilterSet {
	name: Arc<str>,
	universe: Arc<IndexSet<String>>,
	selection: RwLock<Selection>,
	signal: ChangeSignal,
}

impl FilterSet {
	/// Creates a dimension with every value selected, preserving `values` order.
	pub fn new<I, S>(name: &str, values: I) -> Result<Self>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let universe = build_universe(name, values)?;
		let selection = Selection::all(universe.len());
		Ok(Self::from_parts(name, universe, selection))
	}

	/// Creates a dimension with a sorted universe and an explicit selection.
	///
	/// Every selected value must belong to the universe.
	pub fn with_selection<I, S, J, T>(name: &str, values: I, selected: J) -> Result<Self>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
		J: IntoIterator<Item = T>,
		T: AsRef<str>,
	{
		let mut universe = build_universe(name, values)?;
		universe.sort();

		let mut selection = Selection::all(universe.len());
		selection.fill(false);
		for value in selected {
			let value = value.as_ref();
			let Some(idx) = universe.get_index_of(value) else {
				return Err(FilterError::InvalidValue {
					dimension: name.to_owned(),
					value: value.to_owned(),
				});
			};
			selection.set(idx, true);
		}

		Ok(Self::from_parts(name, universe, selection))
	}

	fn from_parts(name: &str, universe: IndexSet<String>, selection: Selection) -> Self {
		Self {
			name: Arc::from(name),
			universe: Arc::new(universe),
			selection: RwLock::new(selection),
			signal: ChangeSignal::new(),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Number of values in the universe.
	pub fn len(&self) -> usize {
		self.universe.len()
	}

	pub fn is_empty(&self) -> bool {
		self.universe.is_empty()
	}

	/// Universe values in order.
	pub fn values(&self) -> impl Iterator<Item = &str> {
		self.universe.iter().map(String::as_str)
	}

	/// Selected values in universe order.
	pub fn selected_values(&self) -> Vec<String> {
		let selection = self.selection.read();
		self.universe
			.iter()
			.enumerate()
			.filter(|(idx, _)| selection.contains(*idx))
			.map(|(_, value)| value.clone())
			.collect()
	}

	pub fn selected_count(&self) -> usize {
		self.selection.read().count()
	}

	/// Returns false for values outside the universe.
	pub fn is_selected(&self, value: &str) -> bool {
		self.universe.get_index_of(value).is_some_and(|idx| self.selection.read().contains(idx))
	}

	pub fn is_index_selected(&self, index: usize) -> Result<bool> {
		self.check_index(index)?;
		Ok(self.selection.read().contains(index))
	}

	/// True when every universe value is selected, which makes the dimension inactive.
	pub fn all_selected(&self) -> bool {
		self.selection.read().count() == self.universe.len()
	}

	/// Selects or deselects `value`.
	///
	/// A value outside the universe is rejected with
	/// [`FilterError::InvalidValue`] without notifying or mutating.
	pub fn select(&self, value: &str, is_selected: bool) -> Result<()> {
		let Some(idx) = self.universe.get_index_of(value) else {
			tracing::debug!(dimension = %self.name, value, "filter.select.rejected");
			return Err(FilterError::InvalidValue {
				dimension: self.name.to_string(),
				value: value.to_owned(),
			});
		};
		self.mutate(
			Mutation::Select {
				value: value.to_owned(),
				selected: is_selected,
			},
			|selection| selection.set(idx, is_selected),
		);
		Ok(())
	}

	/// Selects or deselects the value at `index` in the universe.
	pub fn select_index(&self, index: usize, is_selected: bool) -> Result<()> {
		self.check_index(index)?;
		let value = self.universe[index].clone();
		self.mutate(Mutation::Select { value, selected: is_selected }, |selection| selection.set(index, is_selected));
		Ok(())
	}

	pub fn select_all(&self) {
		self.mutate(Mutation::SelectAll, |selection| selection.fill(true));
	}

	pub fn select_none(&self) {
		self.mutate(Mutation::SelectNone, |selection| selection.fill(false));
	}

	/// Subscribes to will-change notifications of this dimension.
	#[must_use = "dropping the subscription unsubscribes immediately"]
	pub fn subscribe(&self, callback: impl Fn(&ChangeNotice) + Send + Sync + 'static) -> Subscription {
		self.signal.subscribe(callback)
	}

	/// Captures the current selection.
	pub fn snapshot(&self) -> DimensionSnapshot {
		DimensionSnapshot::new(Arc::clone(&self.name), Arc::clone(&self.universe), self.selection.read().clone())
	}

	/// Notify first, then mutate. The selection lock is not held while
	/// callbacks run, so they may read the pre-change state.
	fn mutate(&self, mutation: Mutation, apply: impl FnOnce(&mut Selection)) {
		self.signal.emit(&ChangeNotice {
			dimension: Arc::clone(&self.name),
			mutation,
		});
		let mut selection = self.selection.write();
		apply(&mut selection);
		tracing::trace!(dimension = %self.name, selected = selection.count(), of = self.universe.len(), "filter.mutate");
	}

	fn check_index(&self, index: usize) -> Result<()> {
		if index < self.universe.len() {
			Ok(())
		} else {
			Err(FilterError::IndexOutOfRange {
				dimension: self.name.to_string(),
				index,
				len: self.universe.len(),
			})
		}
	}
}

fn build_universe<I, S>(name: &str, values: I) -> Result<IndexSet<String>>
where
	I: IntoIterator<Item = S>,
	S: Into<String>,
{
	let mut universe = IndexSet::new();
	for value in values {
		let value = value.into();
		if universe.contains(&value) {
			return Err(FilterError::DuplicateValue {
				dimension: name.to_owned(),
				value,
			});
		}
		universe.insert(value);
	}
	Ok(universe)
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

	use pretty_assertions::assert_eq;

	use super::*;

	fn grades() -> FilterSet {
		FilterSet::new("grade", ["A", "B", "C"]).unwrap()
	}

	#[test]
	fn new_selects_everything() {
		let set = grades();
		assert!(set.all_selected());
		assert_eq!(set.selected_values(), vec!["A", "B", "C"]);
		assert_eq!(set.values().collect::<Vec<_>>(), vec!["A", "B", "C"]);
	}

	#[test]
	fn duplicate_universe_values_are_rejected() {
		let err = FilterSet::new("grade", ["A", "B", "A"]).unwrap_err();
		assert_eq!(
			err,
			FilterError::DuplicateValue {
				dimension: "grade".into(),
				value: "A".into(),
			}
		);
	}

	#[test]
	fn with_selection_sorts_universe_and_checks_subset() {
		let set = FilterSet::with_selection("cuisine", ["Thai", "Afghan", "Pizza"], ["Pizza"]).unwrap();
		assert_eq!(set.values().collect::<Vec<_>>(), vec!["Afghan", "Pizza", "Thai"]);
		assert_eq!(set.selected_values(), vec!["Pizza"]);
		assert!(!set.all_selected());

		let err = FilterSet::with_selection("cuisine", ["Thai"], ["Sushi"]).unwrap_err();
		assert!(matches!(err, FilterError::InvalidValue { .. }));
	}

	#[test]
	fn select_toggles_membership() {
		let set = grades();
		set.select("C", false).unwrap();
		assert!(!set.is_selected("C"));
		assert!(!set.all_selected());
		assert_eq!(set.selected_count(), 2);

		set.select("C", true).unwrap();
		assert!(set.all_selected());
	}

	#[test]
	fn out_of_universe_selection_is_rejected_without_notifying() {
		let set = grades();
		let hits = Arc::new(AtomicUsize::new(0));
		let h = Arc::clone(&hits);
		let _sub = set.subscribe(move |_| {
			h.fetch_add(1, Ordering::SeqCst);
		});

		let err = set.select("Z", false).unwrap_err();
		assert!(matches!(err, FilterError::InvalidValue { .. }));
		assert_eq!(hits.load(Ordering::SeqCst), 0);
		assert!(set.all_selected());
		assert!(!set.is_selected("Z"));
	}

	#[test]
	fn index_selection_checks_bounds() {
		let set = grades();
		set.select_index(1, false).unwrap();
		assert_eq!(set.is_index_selected(1), Ok(false));
		assert!(!set.is_selected("B"));
		assert!(matches!(set.select_index(3, true), Err(FilterError::IndexOutOfRange { index: 3, len: 3, .. })));
		assert!(set.is_index_selected(9).is_err());
	}

	#[test]
	fn select_all_and_none_replace_selection() {
		let set = grades();
		set.select_none();
		assert_eq!(set.selected_count(), 0);
		assert!(set.selected_values().is_empty());
		set.select_all();
		assert!(set.all_selected());
	}

	#[test]
	fn notification_precedes_mutation() {
		let set = Arc::new(grades());
		let saw_pre_state = Arc::new(AtomicBool::new(false));

		let weak = Arc::downgrade(&set);
		let saw = Arc::clone(&saw_pre_state);
		let _sub = set.subscribe(move |notice| {
			let set = weak.upgrade().unwrap();
			assert_eq!(
				notice.mutation,
				Mutation::Select {
					value: "B".into(),
					selected: false,
				}
			);
			saw.store(set.is_selected("B"), Ordering::SeqCst);
		});

		set.select("B", false).unwrap();
		assert!(saw_pre_state.load(Ordering::SeqCst), "callback must observe the pre-change selection");
		assert!(!set.is_selected("B"));
	}

	#[test]
	fn every_mutation_notifies_even_without_effect() {
		let set = grades();
		let hits = Arc::new(AtomicUsize::new(0));
		let h = Arc::clone(&hits);
		let _sub = set.subscribe(move |_| {
			h.fetch_add(1, Ordering::SeqCst);
		});

		set.select("A", true).unwrap();
		set.select_all();
		assert_eq!(hits.load(Ordering::SeqCst), 2);
	}

	#[test]
	fn snapshot_is_detached_from_later_mutations() {
		let set = grades();
		let before = set.snapshot();
		set.select("A", false).unwrap();
		assert!(before.all_selected());
		assert!(!set.snapshot().all_selected());
		assert_ne!(before, set.snapshot());
	}
}
