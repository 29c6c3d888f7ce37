use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use crate::catalog;
use crate::error::{FilterError, Result};
use crate::set::{FilterSet, Selection};
use crate::signal::{ChangeNotice, ChangeSignal, Subscription};

/// Immutable copy of one dimension's selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionSnapshot {
	name: Arc<str>,
	universe: Arc<IndexSet<String>>,
	selection: Selection,
}

impl DimensionSnapshot {
	pub(crate) fn new(name: Arc<str>, universe: Arc<IndexSet<String>>, selection: Selection) -> Self {
		Self { name, universe, selection }
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn all_selected(&self) -> bool {
		self.selection.count() == self.universe.len()
	}

	pub fn is_selected(&self, value: &str) -> bool {
		self.universe.get_index_of(value).is_some_and(|idx| self.selection.contains(idx))
	}

	/// Whether an item with attribute `value` passes this dimension.
	///
	/// A fully selected dimension admits everything, including items without
	/// the attribute. Otherwise a missing attribute is excluded.
	pub fn admits(&self, value: Option<&str>) -> bool {
		if self.all_selected() {
			return true;
		}
		value.is_some_and(|value| self.is_selected(value))
	}
}

/// Immutable copy of every dimension of a [`FilterState`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSnapshot {
	dimensions: Vec<DimensionSnapshot>,
}

impl FilterSnapshot {
	pub fn new(dimensions: Vec<DimensionSnapshot>) -> Self {
		Self { dimensions }
	}

	pub fn dimensions(&self) -> &[DimensionSnapshot] {
		&self.dimensions
	}

	pub fn dimension(&self, name: &str) -> Option<&DimensionSnapshot> {
		self.dimensions.iter().find(|dim| dim.name() == name)
	}

	/// Dimensions that constrain the result.
	pub fn active(&self) -> impl Iterator<Item = &DimensionSnapshot> {
		self.dimensions.iter().filter(|dim| !dim.all_selected())
	}

	/// True when no dimension constrains the result.
	pub fn is_inactive(&self) -> bool {
		self.active().next().is_none()
	}
}

/// A fixed set of named filter dimensions with one merged change signal.
///
/// The merged signal fires once for every mutation of any constituent
/// dimension, with the same will-change ordering as [`FilterSet`].
pub struct FilterState {
	dimensions: IndexMap<Arc<str>, Arc<FilterSet>>,
	signal: ChangeSignal,
	_forwarders: Vec<Subscription>,
}

impl std::fmt::Debug for FilterState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FilterState")
			.field("dimensions", &self.dimensions.keys().collect::<Vec<_>>())
			.field("signal", &self.signal)
			.finish()
	}
}

impl FilterState {
	/// Composes `sets` in the given order. Dimension names must be unique.
	pub fn new(sets: impl IntoIterator<Item = FilterSet>) -> Result<Self> {
		let signal = ChangeSignal::new();
		let mut dimensions = IndexMap::new();
		let mut forwarders = Vec::new();

		for set in sets {
			let name: Arc<str> = Arc::from(set.name());
			if dimensions.contains_key(&name) {
				return Err(FilterError::DuplicateDimension(name.to_string()));
			}
			let merged = signal.clone();
			forwarders.push(set.subscribe(move |notice| merged.emit(notice)));
			dimensions.insert(name, Arc::new(set));
		}

		Ok(Self {
			dimensions,
			signal,
			_forwarders: forwarders,
		})
	}

	/// Cuisine and grade dimensions over the restaurant catalog, all selected.
	pub fn restaurants() -> Result<Self> {
		let mut cuisines = catalog::CUISINES.to_vec();
		cuisines.sort_unstable();
		Self::new([
			FilterSet::new(catalog::CUISINE, cuisines)?,
			FilterSet::new(catalog::GRADE, catalog::GRADES.iter().copied())?,
		])
	}

	pub fn dimension(&self, name: &str) -> Option<&Arc<FilterSet>> {
		self.dimensions.get(name)
	}

	/// Dimensions in composition order.
	pub fn dimensions(&self) -> impl Iterator<Item = &Arc<FilterSet>> {
		self.dimensions.values()
	}

	/// Selects or deselects `value` in the named dimension.
	pub fn select(&self, dimension: &str, value: &str, is_selected: bool) -> Result<()> {
		self.dimension(dimension)
			.ok_or_else(|| FilterError::UnknownDimension(dimension.to_owned()))?
			.select(value, is_selected)
	}

	/// Subscribes to will-change notifications from every dimension.
	#[must_use = "dropping the subscription unsubscribes immediately"]
	pub fn subscribe(&self, callback: impl Fn(&ChangeNotice) + Send + Sync + 'static) -> Subscription {
		self.signal.subscribe(callback)
	}

	/// Number of live subscriptions to the merged signal.
	pub fn subscriber_count(&self) -> usize {
		self.signal.subscriber_count()
	}

	/// Captures every dimension's current selection.
	pub fn snapshot(&self) -> FilterSnapshot {
		FilterSnapshot::new(self.dimensions.values().map(|set| set.snapshot()).collect())
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicUsize, Ordering};

	use parking_lot::Mutex;
	use pretty_assertions::assert_eq;

	use super::*;

	fn state() -> FilterState {
		FilterState::new([
			FilterSet::new("cuisine", ["Pizza", "Thai"]).unwrap(),
			FilterSet::new("grade", ["A", "B", "C"]).unwrap(),
		])
		.unwrap()
	}

	#[test]
	fn duplicate_dimension_names_are_rejected() {
		let err = FilterState::new([FilterSet::new("grade", ["A"]).unwrap(), FilterSet::new("grade", ["B"]).unwrap()]).unwrap_err();
		assert_eq!(err, FilterError::DuplicateDimension("grade".into()));
	}

	#[test]
	fn merged_signal_fires_for_every_dimension() {
		let state = state();
		let seen = Arc::new(Mutex::new(Vec::new()));
		let s = Arc::clone(&seen);
		let _sub = state.subscribe(move |notice| s.lock().push(notice.dimension.to_string()));

		state.select("grade", "C", false).unwrap();
		state.dimension("cuisine").unwrap().select_none();
		state.select("grade", "C", true).unwrap();

		assert_eq!(*seen.lock(), vec!["grade", "cuisine", "grade"]);
	}

	#[test]
	fn unknown_dimension_is_reported() {
		let state = state();
		assert_eq!(state.select("borough", "Queens", true), Err(FilterError::UnknownDimension("borough".into())));
	}

	#[test]
	fn snapshot_reflects_each_dimension() {
		let state = state();
		assert!(state.snapshot().is_inactive());

		state.select("grade", "C", false).unwrap();
		let snapshot = state.snapshot();
		assert!(!snapshot.is_inactive());
		assert_eq!(snapshot.active().map(DimensionSnapshot::name).collect::<Vec<_>>(), vec!["grade"]);
		assert!(snapshot.dimension("cuisine").unwrap().all_selected());
		assert!(!snapshot.dimension("grade").unwrap().is_selected("C"));
	}

	#[test]
	fn snapshots_compare_by_selection() {
		let state = state();
		let before = state.snapshot();
		state.select("grade", "A", false).unwrap();
		assert_ne!(before, state.snapshot());
		state.select("grade", "A", true).unwrap();
		assert_eq!(before, state.snapshot());
	}

	#[test]
	fn admits_missing_attribute_only_when_inactive() {
		let state = state();
		assert!(state.snapshot().dimension("grade").unwrap().admits(None));
		state.select("grade", "B", false).unwrap();
		let snapshot = state.snapshot();
		let grade = snapshot.dimension("grade").unwrap();
		assert!(!grade.admits(None));
		assert!(grade.admits(Some("A")));
		assert!(!grade.admits(Some("B")));
		assert!(!grade.admits(Some("Unknown")));
	}

	#[test]
	fn restaurant_catalog_builds_sorted_cuisines() {
		let state = FilterState::restaurants().unwrap();
		let cuisine = state.dimension(catalog::CUISINE).unwrap();
		let values: Vec<_> = cuisine.values().collect();
		let mut sorted = values.clone();
		sorted.sort_unstable();
		assert_eq!(values, sorted);
		assert!(cuisine.all_selected());
		assert_eq!(state.dimension(catalog::GRADE).unwrap().len(), catalog::GRADES.len());
	}

	#[test]
	fn dropping_state_detaches_forwarders() {
		let set_hits = Arc::new(AtomicUsize::new(0));
		let state = state();
		let grade = Arc::clone(state.dimension("grade").unwrap());
		let h = Arc::clone(&set_hits);
		let _direct = grade.subscribe(move |_| {
			h.fetch_add(1, Ordering::SeqCst);
		});

		drop(state);
		grade.select("A", false).unwrap();
		assert_eq!(set_hits.load(Ordering::SeqCst), 1);
	}
}
