//! Reactive reconciliation of a filtered data source into changesets.
//!
//! [`ReactivePipeline::subscribe`] starts one task that combines the latest
//! record snapshot with the live filter selection. Filter edits are debounced,
//! data snapshots are not. Every recomputation is diffed against the
//! previously emitted collection and delivered as a [`Changeset`], which a
//! [`ChangeApplier`] replays onto a [`MapSurface`].

mod apply;
mod changeset;
pub mod config;
mod pipeline;


pub use apply::{ApplyReport, ChangeApplier, InMemorySurface, MapSurface};
pub use changeset::{Changeset, Item, PipelineStats, Trigger};
pub use config::{ApplyConfig, ConfigError, PipelineConfig};
pub use pipeline::{ChangesetStream, ReactivePipeline};
