use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

/// The mutation about to be applied to a dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
	Select { value: String, selected: bool },
	SelectAll,
	SelectNone,
}

/// Will-change notification emitted before a dimension mutates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeNotice {
	pub dimension: Arc<str>,
	pub mutation: Mutation,
}

type Callback = Arc<dyn Fn(&ChangeNotice) + Send + Sync>;

#[derive(Default)]
struct SignalInner {
	next_id: AtomicU64,
	subscribers: Mutex<Vec<(u64, Callback)>>,
}

/// Explicit subscriber list delivering [`ChangeNotice`]s synchronously.
///
/// Callbacks run on the emitting thread in registration order, outside the
/// subscriber lock, so a callback may subscribe, unsubscribe or read the
/// emitting object without deadlocking.
#[derive(Clone, Default)]
pub struct ChangeSignal {
	inner: Arc<SignalInner>,
}

impl std::fmt::Debug for ChangeSignal {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ChangeSignal").field("subscribers", &self.subscriber_count()).finish()
	}
}

impl ChangeSignal {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `callback`; it stays registered until the returned guard drops.
	#[must_use = "dropping the subscription unsubscribes immediately"]
	pub fn subscribe(&self, callback: impl Fn(&ChangeNotice) + Send + Sync + 'static) -> Subscription {
		let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
		self.inner.subscribers.lock().push((id, Arc::new(callback)));
		Subscription {
			signal: Arc::downgrade(&self.inner),
			id,
		}
	}

	pub fn emit(&self, notice: &ChangeNotice) {
		let callbacks: Vec<Callback> = self.inner.subscribers.lock().iter().map(|(_, cb)| Arc::clone(cb)).collect();
		tracing::trace!(dimension = %notice.dimension, subscribers = callbacks.len(), "filter.signal.emit");
		for callback in callbacks {
			callback(notice);
		}
	}

	pub fn subscriber_count(&self) -> usize {
		self.inner.subscribers.lock().len()
	}
}

/// RAII guard for a [`ChangeSignal`] registration.
#[derive(Debug)]
pub struct Subscription {
	signal: Weak<SignalInner>,
	id: u64,
}

impl Subscription {
	/// Unsubscribes now. Equivalent to dropping the guard.
	pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(inner) = self.signal.upgrade() {
			inner.subscribers.lock().retain(|(id, _)| *id != self.id);
		}
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::AtomicUsize;

	use super::*;

	fn notice() -> ChangeNotice {
		ChangeNotice {
			dimension: Arc::from("grade"),
			mutation: Mutation::SelectAll,
		}
	}

	#[test]
	fn subscribers_run_in_registration_order() {
		let signal = ChangeSignal::new();
		let order = Arc::new(Mutex::new(Vec::new()));

		let o = Arc::clone(&order);
		let _first = signal.subscribe(move |_| o.lock().push(1));
		let o = Arc::clone(&order);
		let _second = signal.subscribe(move |_| o.lock().push(2));

		signal.emit(&notice());
		assert_eq!(*order.lock(), vec![1, 2]);
	}

	#[test]
	fn dropping_subscription_unsubscribes() {
		let signal = ChangeSignal::new();
		let hits = Arc::new(AtomicUsize::new(0));

		let h = Arc::clone(&hits);
		let sub = signal.subscribe(move |_| {
			h.fetch_add(1, Ordering::SeqCst);
		});
		signal.emit(&notice());
		drop(sub);
		signal.emit(&notice());

		assert_eq!(hits.load(Ordering::SeqCst), 1);
		assert_eq!(signal.subscriber_count(), 0);
	}

	#[test]
	fn callback_may_subscribe_during_emit() {
		let signal = ChangeSignal::new();
		let late = Arc::new(Mutex::new(Vec::new()));

		let s = signal.clone();
		let l = Arc::clone(&late);
		let _outer = signal.subscribe(move |_| {
			l.lock().push(s.subscribe(|_| {}));
		});

		signal.emit(&notice());
		assert_eq!(signal.subscriber_count(), 2);
	}

	#[test]
	fn subscription_outliving_signal_is_inert() {
		let signal = ChangeSignal::new();
		let sub = signal.subscribe(|_| {});
		drop(signal);
		sub.unsubscribe();
	}
}
