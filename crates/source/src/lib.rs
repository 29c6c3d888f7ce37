//! Data side of the reconciliation pipeline.
//!
//! * [`RawRecord`]: the upstream restaurant schema, decoded from JSON lines.
//! * [`Projector`]: turns raw records into displayable [`Place`] items,
//!   dropping records without an id, a name or a valid coordinate.
//! * [`DataSource`]: holds the latest successfully fetched snapshot and
//!   refreshes it asynchronously through a [`RecordFetcher`]. Failures are
//!   published out of band and never replace the last good snapshot.

/// Error types.
pub mod error;
/// Record fetchers.
pub mod fetch;
/// Displayable items.
pub mod place;
/// Record-to-item projection.
pub mod project;
/// Raw record schema and decoding.
pub mod record;
/// The refreshable data source.
pub mod source;

pub use error::{Result, SourceError};
pub use fetch::{FetchedRecords, JsonLinesFile, RecordFetcher, StaticRecords};
pub use place::{Coordinate, Inspection, Place};
pub use project::{MalformedRecord, Projection, ProjectionReport, Projector};
pub use record::{Address, DecodeReport, InspectionDate, RawInspection, RawRecord, decode_records};
pub use source::{DataSource, RecordSnapshot, RefreshResult};
