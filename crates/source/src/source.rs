use std::sync::Arc;

use poimap_worker::{GenerationSlot, GenerationToken, TaskClass};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::SourceError;
use crate::fetch::RecordFetcher;
use crate::record::RawRecord;

/// One successfully fetched generation of records.
#[derive(Debug, Clone)]
pub struct RecordSnapshot {
	/// 0 for the empty snapshot published before the first fetch.
	pub version: u64,
	pub records: Arc<[RawRecord]>,
	pub malformed: usize,
}

impl RecordSnapshot {
	fn empty() -> Self {
		Self {
			version: 0,
			records: Arc::from(Vec::new()),
			malformed: 0,
		}
	}
}

/// Outcome of a refresh: the published snapshot version, or why nothing was published.
pub type RefreshResult = Result<u64, Arc<SourceError>>;

/// Latest record snapshot plus an out-of-band error channel.
///
/// Clones share the same state. A refresh replaces the snapshot only on
/// success; a failure is published on [`Self::errors`] and the previous
/// snapshot stays current. Starting a refresh cancels any refresh still in
/// flight, so only the most recent request can publish.
#[derive(Clone)]
pub struct DataSource {
	inner: Arc<SourceInner>,
}

struct SourceInner {
	fetcher: Arc<dyn RecordFetcher>,
	label: String,
	snapshots: watch::Sender<RecordSnapshot>,
	errors: watch::Sender<Option<Arc<SourceError>>>,
	refreshes: GenerationSlot,
}

impl std::fmt::Debug for DataSource {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("DataSource")
			.field("fetcher", &self.inner.label)
			.field("version", &self.inner.snapshots.borrow().version)
			.finish()
	}
}

impl DataSource {
	pub fn new(fetcher: impl RecordFetcher) -> Self {
		let label = fetcher.describe();
		let (snapshots, _) = watch::channel(RecordSnapshot::empty());
		let (errors, _) = watch::channel(None);
		Self {
			inner: Arc::new(SourceInner {
				fetcher: Arc::new(fetcher),
				label,
				snapshots,
				errors,
				refreshes: GenerationSlot::new(),
			}),
		}
	}

	/// Receiver of record snapshots. The current value is marked seen.
	pub fn snapshots(&self) -> watch::Receiver<RecordSnapshot> {
		self.inner.snapshots.subscribe()
	}

	/// Receiver of fetch failures. `None` after a successful refresh.
	pub fn errors(&self) -> watch::Receiver<Option<Arc<SourceError>>> {
		self.inner.errors.subscribe()
	}

	pub fn current(&self) -> RecordSnapshot {
		self.inner.snapshots.borrow().clone()
	}

	pub fn last_error(&self) -> Option<Arc<SourceError>> {
		self.inner.errors.borrow().clone()
	}

	/// Starts a background refresh, superseding any refresh in flight.
	///
	/// The task runs to completion even if the handle is dropped.
	pub fn refresh(&self) -> JoinHandle<RefreshResult> {
		let inner = Arc::clone(&self.inner);
		let token = inner.refreshes.begin();
		tracing::debug!(source = %inner.label, generation = token.generation(), "source.refresh.start");
		poimap_worker::spawn(TaskClass::Background, run_refresh(inner, token))
	}

	/// Refreshes on the caller's task, superseding any refresh in flight.
	pub async fn refresh_now(&self) -> RefreshResult {
		let inner = Arc::clone(&self.inner);
		let token = inner.refreshes.begin();
		tracing::debug!(source = %inner.label, generation = token.generation(), "source.refresh.start");
		run_refresh(inner, token).await
	}

	/// Cancels the refresh in flight, if any.
	pub fn cancel_refresh(&self) {
		self.inner.refreshes.cancel();
	}
}

async fn run_refresh(inner: Arc<SourceInner>, token: GenerationToken) -> RefreshResult {
	let outcome = tokio::select! {
		biased;
		_ = token.cancelled() => Err(SourceError::Superseded),
		fetched = inner.fetcher.fetch() => fetched,
	};

	if !inner.refreshes.finish(&token) {
		tracing::debug!(source = %inner.label, generation = token.generation(), "source.refresh.superseded");
		return Err(Arc::new(SourceError::Superseded));
	}

	match outcome {
		Ok(fetched) => {
			let count = fetched.records.len();
			let mut version = 0;
			inner.snapshots.send_modify(|snapshot| {
				version = snapshot.version + 1;
				*snapshot = RecordSnapshot {
					version,
					records: Arc::from(fetched.records),
					malformed: fetched.malformed,
				};
			});
			inner.errors.send_if_modified(|err| err.take().is_some());
			tracing::info!(source = %inner.label, version, records = count, malformed = fetched.malformed, "source.refresh.published");
			Ok(version)
		}
		Err(err) => {
			let err = Arc::new(err);
			tracing::warn!(source = %inner.label, error = %err, "source.refresh.failed");
			inner.errors.send_replace(Some(Arc::clone(&err)));
			Err(err)
		}
	}
}

#[cfg(test)]
mod tests {
	use std::collections::VecDeque;
	use std::time::Duration;

	use async_trait::async_trait;
	use parking_lot::Mutex;
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::error::Result;
	use crate::fetch::{FetchedRecords, StaticRecords};

	/// Replays queued outcomes, each after a delay.
	struct Scripted {
		steps: Mutex<VecDeque<(Duration, std::result::Result<Vec<RawRecord>, String>)>>,
	}

	impl Scripted {
		fn new(steps: impl IntoIterator<Item = (u64, std::result::Result<Vec<RawRecord>, String>)>) -> Self {
			Self {
				steps: Mutex::new(steps.into_iter().map(|(ms, outcome)| (Duration::from_millis(ms), outcome)).collect()),
			}
		}
	}

	#[async_trait]
	impl RecordFetcher for Scripted {
		async fn fetch(&self) -> Result<FetchedRecords> {
			let step = self.steps.lock().pop_front();
			let Some((delay, outcome)) = step else {
				return Err(SourceError::Fetch("script exhausted".into()));
			};
			tokio::time::sleep(delay).await;
			outcome.map(|records| FetchedRecords { records, malformed: 0 }).map_err(SourceError::Fetch)
		}

		fn describe(&self) -> String {
			"scripted".into()
		}
	}

	fn record(id: &str) -> RawRecord {
		RawRecord::new(id, id, "Thai", [-73.9, 40.7])
	}

	fn ids(snapshot: &RecordSnapshot) -> Vec<String> {
		snapshot.records.iter().map(|r| r.restaurant_id.clone()).collect()
	}

	#[tokio::test]
	async fn starts_empty_and_publishes_on_refresh() {
		let source = DataSource::new(StaticRecords::new(vec![record("a"), record("b")]));
		let mut rx = source.snapshots();
		assert_eq!(source.current().version, 0);
		assert!(source.current().records.is_empty());

		assert_eq!(source.refresh().await.unwrap().unwrap(), 1);
		assert!(rx.has_changed().unwrap());
		let snapshot = rx.borrow_and_update().clone();
		assert_eq!(snapshot.version, 1);
		assert_eq!(ids(&snapshot), vec!["a", "b"]);
	}

	#[tokio::test(start_paused = true)]
	async fn failure_keeps_last_good_snapshot() {
		let source = DataSource::new(Scripted::new([(10, Ok(vec![record("a")])), (10, Err("offline".to_owned())), (10, Ok(vec![record("b")]))]));
		let mut errors = source.errors();

		source.refresh_now().await.unwrap();
		let err = source.refresh_now().await.unwrap_err();
		assert_eq!(err.to_string(), "fetch failed: offline");
		assert!(errors.has_changed().unwrap());
		assert!(errors.borrow_and_update().is_some());
		assert_eq!(source.current().version, 1);
		assert_eq!(ids(&source.current()), vec!["a"]);

		source.refresh_now().await.unwrap();
		assert!(source.last_error().is_none());
		assert_eq!(ids(&source.current()), vec!["b"]);
		assert_eq!(source.current().version, 2);
	}

	#[tokio::test(start_paused = true)]
	async fn newer_refresh_supersedes_one_in_flight() {
		let source = DataSource::new(Scripted::new([(10_000, Ok(vec![record("slow")])), (100, Ok(vec![record("fast")]))]));

		let slow = source.refresh();
		tokio::time::sleep(Duration::from_millis(1)).await;
		let fast = source.refresh();

		assert_eq!(fast.await.unwrap().unwrap(), 1);
		let err = slow.await.unwrap().unwrap_err();
		assert!(matches!(*err, SourceError::Superseded));
		assert_eq!(ids(&source.current()), vec!["fast"]);
		assert!(source.last_error().is_none());
	}

	#[tokio::test(start_paused = true)]
	async fn cancelled_refresh_publishes_nothing() {
		let source = DataSource::new(Scripted::new([(1_000, Ok(vec![record("a")]))]));
		let pending = source.refresh();
		tokio::time::sleep(Duration::from_millis(1)).await;
		source.cancel_refresh();
		assert!(matches!(*pending.await.unwrap().unwrap_err(), SourceError::Superseded));
		assert_eq!(source.current().version, 0);
	}

	#[tokio::test]
	async fn clones_share_snapshots() {
		let source = DataSource::new(StaticRecords::new(vec![record("a")]));
		let other = source.clone();
		source.refresh_now().await.unwrap();
		assert_eq!(other.current().version, 1);
	}
}
