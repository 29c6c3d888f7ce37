use std::future::Future;
use std::sync::LazyLock;

use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;

use crate::TaskClass;

/// Shared runtime for spawns issued outside any Tokio context.
static FALLBACK: LazyLock<Runtime> = LazyLock::new(|| {
	tracing::debug!("worker.fallback.start");
	Builder::new_multi_thread()
		.worker_threads(2)
		.thread_name("poimap-worker-fallback")
		.enable_all()
		.build()
		.unwrap_or_else(|err| panic!("cannot start poimap-worker fallback runtime: {err}"))
});

/// The ambient runtime if there is one, else the shared fallback.
fn target() -> (Handle, bool) {
	match Handle::try_current() {
		Ok(handle) => (handle, false),
		Err(_) => (FALLBACK.handle().clone(), true),
	}
}

/// Spawns an async task tagged with a [`TaskClass`].
pub fn spawn<F>(class: TaskClass, fut: F) -> JoinHandle<F::Output>
where
	F: Future + Send + 'static,
	F::Output: Send + 'static,
{
	let (handle, fallback) = target();
	tracing::trace!(worker_class = class.as_str(), fallback, "worker.spawn");
	handle.spawn(fut)
}

/// Runs `f` on the blocking pool, tagged with a [`TaskClass`].
pub fn spawn_blocking<F, R>(class: TaskClass, f: F) -> JoinHandle<R>
where
	F: FnOnce() -> R + Send + 'static,
	R: Send + 'static,
{
	let (handle, fallback) = target();
	tracing::trace!(worker_class = class.as_str(), fallback, "worker.spawn_blocking");
	handle.spawn_blocking(f)
}
