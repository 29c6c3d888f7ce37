use std::ops::ControlFlow;
use std::sync::Arc;

use poimap_diff::{Change, DiffOptions, OrderedCollection, diff_with};
use poimap_filter::{FilterEvaluator, FilterSnapshot, FilterState, Subscription};
use poimap_source::{DataSource, Projector, RecordSnapshot, SourceError};
use poimap_worker::{Debouncer, TaskClass};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::changeset::{Changeset, Item, PipelineStats, Trigger};
use crate::config::PipelineConfig;

/// Combines a [`DataSource`] with a [`FilterState`] and folds every
/// recomputation into a [`Changeset`] against the previously displayed set.
#[derive(Debug, Clone)]
pub struct ReactivePipeline {
	source: DataSource,
	filters: Arc<FilterState>,
	config: PipelineConfig,
}

impl ReactivePipeline {
	pub fn new(source: DataSource, filters: Arc<FilterState>, config: PipelineConfig) -> Self {
		Self { source, filters, config }
	}

	pub fn config(&self) -> &PipelineConfig {
		&self.config
	}

	/// Starts a pipeline task and requests a data refresh.
	///
	/// The first changeset is computed immediately from whatever snapshot the
	/// source holds. Filter edits are debounced; new data snapshots are not.
	pub fn subscribe(&self) -> ChangesetStream {
		let cancel = CancellationToken::new();
		let stats = Arc::new(PipelineStats::default());
		let (out, rx) = mpsc::channel(self.config.channel_capacity.max(1));
		let (wake_tx, wakes) = mpsc::unbounded_channel();

		let subscription = self.filters.subscribe(move |notice| {
			let _ = wake_tx.send(Arc::clone(&notice.dimension));
		});

		let task = PipelineTask {
			filters: Arc::clone(&self.filters),
			options: self.config.diff_options(),
			offload_threshold: self.config.offload_threshold,
			snapshots: self.source.snapshots(),
			errors: self.source.errors(),
			wakes,
			_subscription: subscription,
			out,
			cancel: cancel.clone(),
			stats: Arc::clone(&stats),
			debouncer: Debouncer::new(self.config.debounce()),
			fold: Fold::default(),
		};

		let _refresh = self.source.refresh();
		tracing::debug!(debounce_ms = self.config.debounce_ms, "pipeline.subscribe");
		let handle = poimap_worker::spawn(TaskClass::Interactive, task.run());

		ChangesetStream {
			rx,
			cancel,
			stats,
			task: Some(handle),
		}
	}
}

/// Receiving end of a pipeline subscription.
///
/// Dropping the stream cancels the pipeline task.
#[derive(Debug)]
pub struct ChangesetStream {
	rx: mpsc::Receiver<Changeset>,
	cancel: CancellationToken,
	stats: Arc<PipelineStats>,
	task: Option<JoinHandle<()>>,
}

impl ChangesetStream {
	/// Next changeset, or `None` once the pipeline has stopped.
	pub async fn recv(&mut self) -> Option<Changeset> {
		self.rx.recv().await
	}

	pub fn try_recv(&mut self) -> Option<Changeset> {
		self.rx.try_recv().ok()
	}

	pub fn stats(&self) -> &PipelineStats {
		&self.stats
	}

	/// Stops the pipeline task and waits for it to release its resources.
	pub async fn unsubscribe(mut self) {
		self.cancel.cancel();
		if let Some(task) = self.task.take() {
			let _ = task.await;
		}
	}
}

impl Drop for ChangesetStream {
	fn drop(&mut self) {
		self.cancel.cancel();
	}
}

/// Fold state owned by the pipeline task.
#[derive(Default)]
struct Fold {
	baseline: OrderedCollection<Item>,
	/// Filter selection the baseline was evaluated with.
	baseline_filters: Option<FilterSnapshot>,
	/// Projected items of the last data snapshot, keyed by version.
	projected: Option<(u64, Arc<[Item]>)>,
	generation: u64,
}

enum Event {
	Data,
	DataClosed,
	SourceError,
	FilterEdited(Arc<str>),
	FilterSettled(u32),
}

struct PipelineTask {
	filters: Arc<FilterState>,
	options: DiffOptions,
	offload_threshold: usize,
	snapshots: watch::Receiver<RecordSnapshot>,
	errors: watch::Receiver<Option<Arc<SourceError>>>,
	wakes: mpsc::UnboundedReceiver<Arc<str>>,
	_subscription: Subscription,
	out: mpsc::Sender<Changeset>,
	cancel: CancellationToken,
	stats: Arc<PipelineStats>,
	debouncer: Debouncer,
	fold: Fold,
}

impl PipelineTask {
	async fn run(mut self) {
		if self.recompute(Trigger::Initial).await.is_break() {
			return;
		}

		let mut data_open = true;
		let mut errors_open = true;

		loop {
			let event = tokio::select! {
				biased;

				_ = self.cancel.cancelled() => break,

				changed = self.snapshots.changed(), if data_open => match changed {
					Ok(()) => Event::Data,
					Err(_) => Event::DataClosed,
				},

				changed = self.errors.changed(), if errors_open => match changed {
					Ok(()) => Event::SourceError,
					Err(_) => {
						errors_open = false;
						continue;
					}
				},

				Some(dimension) = self.wakes.recv() => Event::FilterEdited(dimension),

				collapsed = self.debouncer.fired() => Event::FilterSettled(collapsed),
			};

			let flow = match event {
				Event::Data => {
					let version = self.snapshots.borrow_and_update().version;
					self.recompute(Trigger::Data { version }).await
				}
				Event::DataClosed => {
					data_open = false;
					ControlFlow::Continue(())
				}
				Event::SourceError => {
					if let Some(err) = self.errors.borrow_and_update().clone() {
						self.stats.record_source_failure();
						tracing::warn!(error = %err, "pipeline.source_error");
					}
					ControlFlow::Continue(())
				}
				Event::FilterEdited(dimension) => {
					self.debouncer.poke();
					tracing::trace!(%dimension, "pipeline.filter.edit");
					ControlFlow::Continue(())
				}
				Event::FilterSettled(collapsed) => {
					let filters = self.filters.snapshot();
					if self.fold.baseline_filters.as_ref() == Some(&filters) {
						self.stats.record_skip();
						tracing::debug!(collapsed, "pipeline.filter.unchanged");
						ControlFlow::Continue(())
					} else {
						tracing::debug!(collapsed, "pipeline.filter.settled");
						self.recompute(Trigger::Filter).await
					}
				}
			};

			if flow.is_break() {
				break;
			}
		}

		self.debouncer.cancel();
		tracing::debug!(generation = self.fold.generation, "pipeline.stop");
	}

	/// Projects, evaluates and diffs against the baseline, then emits.
	///
	/// Breaks when the task is cancelled or the stream is gone.
	async fn recompute(&mut self, trigger: Trigger) -> ControlFlow<()> {
		let snapshot = self.snapshots.borrow().clone();
		let filters = self.filters.snapshot();
		let Some(items) = self.projected(&snapshot).await? else {
			return ControlFlow::Continue(());
		};
		let previous = self.fold.baseline.clone();
		let options = self.options;

		let (changes, displayed) = if items.len() >= self.offload_threshold {
			let eval_filters = filters.clone();
			let job = move || evaluate_and_diff(&eval_filters, &items, &previous, options);
			let Some(result) = offload(&self.cancel, "evaluate", job).await? else {
				return ControlFlow::Continue(());
			};
			result
		} else {
			evaluate_and_diff(&filters, &items, &previous, options)
		};

		self.fold.generation += 1;
		self.fold.baseline = displayed.clone();
		self.fold.baseline_filters = Some(filters.clone());
		self.stats.record_recomputation();

		let changeset = Changeset {
			generation: self.fold.generation,
			trigger,
			changes,
			displayed,
			filters,
		};
		tracing::debug!(
			generation = changeset.generation,
			?trigger,
			changes = changeset.len(),
			displayed = changeset.displayed.len(),
			"pipeline.recompute"
		);

		let sent = tokio::select! {
			biased;
			_ = self.cancel.cancelled() => return ControlFlow::Break(()),
			sent = self.out.send(changeset) => sent,
		};
		if sent.is_err() {
			return ControlFlow::Break(());
		}
		self.stats.record_emission();
		ControlFlow::Continue(())
	}

	/// Projected items for `snapshot`, reused across filter-only recomputations.
	///
	/// `None` when projection failed; nothing is cached in that case.
	async fn projected(&mut self, snapshot: &RecordSnapshot) -> ControlFlow<(), Option<Arc<[Item]>>> {
		if let Some((version, items)) = &self.fold.projected
			&& *version == snapshot.version
		{
			return ControlFlow::Continue(Some(Arc::clone(items)));
		}

		let projection = if snapshot.records.len() >= self.offload_threshold {
			let records = Arc::clone(&snapshot.records);
			let Some(projection) = offload(&self.cancel, "project", move || Projector::project(&records)).await? else {
				return ControlFlow::Continue(None);
			};
			projection
		} else {
			Projector::project(&snapshot.records)
		};

		tracing::debug!(
			version = snapshot.version,
			accepted = projection.report.accepted,
			rejected = projection.report.rejected(),
			"pipeline.project"
		);
		let items: Arc<[Item]> = Arc::from(projection.items);
		self.fold.projected = Some((snapshot.version, Arc::clone(&items)));
		ControlFlow::Continue(Some(items))
	}
}

/// Runs `job` on the blocking pool and waits for it unless cancelled.
///
/// A job that panicked yields `Continue(None)` so the caller can leave its
/// fold state untouched.
async fn offload<F, R>(cancel: &CancellationToken, stage: &'static str, job: F) -> ControlFlow<(), Option<R>>
where
	F: FnOnce() -> R + Send + 'static,
	R: Send + 'static,
{
	let handle = poimap_worker::spawn_blocking(TaskClass::CpuBlocking, job);
	tokio::select! {
		biased;
		_ = cancel.cancelled() => ControlFlow::Break(()),
		joined = handle => match joined {
			Ok(value) => ControlFlow::Continue(Some(value)),
			Err(err) => {
				tracing::error!(stage, error = %err, "pipeline.offload.failed");
				ControlFlow::Continue(None)
			}
		},
	}
}

fn evaluate_and_diff(filters: &FilterSnapshot, items: &[Item], previous: &OrderedCollection<Item>, options: DiffOptions) -> (Vec<Change<Item>>, OrderedCollection<Item>) {
	let next = OrderedCollection::new(FilterEvaluator::apply(filters, items));
	let changes = diff_with(previous, &next, options);
	(changes, next)
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use super::*;

	#[tokio::test]
	async fn panicked_offload_continues_without_result() {
		let cancel = CancellationToken::new();
		let flow = offload(&cancel, "project", || -> u32 { panic!("projection blew up") }).await;
		assert_eq!(flow, ControlFlow::Continue(None));
	}

	#[tokio::test]
	async fn offload_returns_job_result() {
		let cancel = CancellationToken::new();
		let flow = offload(&cancel, "evaluate", || 7u32).await;
		assert_eq!(flow, ControlFlow::Continue(Some(7)));
	}

	#[tokio::test]
	async fn cancelled_offload_breaks() {
		let cancel = CancellationToken::new();
		cancel.cancel();
		let flow = offload(&cancel, "evaluate", || std::thread::sleep(Duration::from_millis(50))).await;
		assert_eq!(flow, ControlFlow::Break(()));
	}
}
