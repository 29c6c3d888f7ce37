use std::time::Duration;

use tokio::time::Instant;

/// Resettable quiet-period timer.
///
/// Each [`poke`](Self::poke) pushes the deadline to `now + quiet`; only the
/// latest deadline ever fires, so a burst of events collapses into a single
/// wake-up once the burst goes quiet.
///
/// [`fired`](Self::fired) is cancel-safe: state only changes after the
/// deadline has elapsed, so it can sit in a `tokio::select!` loop next to the
/// event sources that poke it.
#[derive(Debug)]
pub struct Debouncer {
	quiet: Duration,
	deadline: Option<Instant>,
	collapsed: u32,
}

impl Debouncer {
	pub fn new(quiet: Duration) -> Self {
		Self {
			quiet,
			deadline: None,
			collapsed: 0,
		}
	}

	/// Records an event and restarts the quiet period.
	pub fn poke(&mut self) {
		self.deadline = Some(Instant::now() + self.quiet);
		self.collapsed = self.collapsed.saturating_add(1);
	}

	/// Returns true while a deadline is armed.
	pub fn is_pending(&self) -> bool {
		self.deadline.is_some()
	}

	/// Disarms the timer without firing.
	pub fn cancel(&mut self) {
		self.deadline = None;
		self.collapsed = 0;
	}

	/// Waits for the armed deadline and returns how many pokes it collapsed.
	///
	/// Pends forever while nothing is armed.
	pub async fn fired(&mut self) -> u32 {
		match self.deadline {
			Some(deadline) => tokio::time::sleep_until(deadline).await,
			None => std::future::pending::<()>().await,
		}
		self.deadline = None;
		std::mem::take(&mut self.collapsed)
	}
}
