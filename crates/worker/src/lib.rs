//! Worker runtime primitives shared by the poimap crates.
//!
//! * [`TaskClass`] tags spawned work for scheduling and observability.
//! * [`spawn`] / [`spawn_blocking`] route work onto the active Tokio runtime,
//!   falling back to a small shared runtime when called from outside one.
//! * [`GenerationClock`] / [`GenerationToken`] scope cancellation to one
//!   lifecycle generation; [`GenerationSlot`] lets newer work supersede older work.
//! * [`Debouncer`] is a single resettable quiet-period deadline.

mod class;
mod debounce;
mod spawn;
mod token;

pub use class::TaskClass;
pub use debounce::Debouncer;
pub use spawn::{spawn, spawn_blocking};
pub use token::{GenerationClock, GenerationSlot, GenerationToken};
