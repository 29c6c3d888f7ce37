use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

/// Monotonic generation clock.
#[derive(Debug, Default, Clone)]
pub struct GenerationClock {
	next: Arc<AtomicU64>,
}

impl GenerationClock {
	/// Creates a new generation clock starting at generation 1.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the next generation ID.
	pub fn next(&self) -> u64 {
		self.next.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
	}
}

/// Generation-scoped cancellation token.
#[derive(Debug, Clone)]
pub struct GenerationToken {
	generation: u64,
	cancel: CancellationToken,
}

impl GenerationToken {
	pub fn new(generation: u64, cancel: CancellationToken) -> Self {
		Self { generation, cancel }
	}

	pub const fn generation(&self) -> u64 {
		self.generation
	}

	pub fn is_cancelled(&self) -> bool {
		self.cancel.is_cancelled()
	}

	pub fn cancel(&self) {
		self.cancel.cancel();
	}

	/// Future resolving when cancellation is requested.
	pub async fn cancelled(&self) {
		self.cancel.cancelled().await;
	}
}

/// Single-occupancy slot where starting a new generation cancels the previous one.
///
/// Used for work where only the latest request matters (a data refresh that is
/// re-requested before the previous one finishes).
#[derive(Debug, Default)]
pub struct GenerationSlot {
	clock: GenerationClock,
	current: Mutex<Option<GenerationToken>>,
}

impl GenerationSlot {
	pub fn new() -> Self {
		Self::default()
	}

	/// Starts a new generation, cancelling whichever one was active.
	pub fn begin(&self) -> GenerationToken {
		let token = GenerationToken::new(self.clock.next(), CancellationToken::new());
		let previous = self.current.lock().replace(token.clone());
		if let Some(previous) = previous {
			tracing::trace!(superseded = previous.generation(), by = token.generation(), "worker.generation.supersede");
			previous.cancel();
		}
		token
	}

	/// Clears the slot if `token` is still the active generation.
	///
	/// Returns `false` when a newer generation has already replaced it.
	pub fn finish(&self, token: &GenerationToken) -> bool {
		let mut current = self.current.lock();
		match current.as_ref() {
			Some(active) if active.generation() == token.generation() => {
				*current = None;
				true
			}
			_ => false,
		}
	}

	/// Cancels the active generation, if any.
	pub fn cancel(&self) {
		if let Some(active) = self.current.lock().take() {
			active.cancel();
		}
	}
}
