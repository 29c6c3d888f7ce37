use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::{Result, SourceError};
use crate::record::{DecodeReport, RawRecord, decode_records};

/// Records produced by one fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchedRecords {
	pub records: Vec<RawRecord>,
	/// Entries in the payload that could not be decoded.
	pub malformed: usize,
}

impl From<DecodeReport> for FetchedRecords {
	fn from(report: DecodeReport) -> Self {
		Self {
			records: report.records,
			malformed: report.malformed,
		}
	}
}

/// Produces a full record snapshot on demand.
#[async_trait]
pub trait RecordFetcher: Send + Sync + 'static {
	async fn fetch(&self) -> Result<FetchedRecords>;

	/// Short label for logs.
	fn describe(&self) -> String;
}

/// Reads a JSON-lines (or JSON array) file on every fetch.
#[derive(Debug, Clone)]
pub struct JsonLinesFile {
	path: PathBuf,
}

impl JsonLinesFile {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}

#[async_trait]
impl RecordFetcher for JsonLinesFile {
	async fn fetch(&self) -> Result<FetchedRecords> {
		let text = tokio::fs::read_to_string(&self.path).await.map_err(|source| SourceError::Io {
			path: self.path.clone(),
			source,
		})?;
		Ok(decode_records(&text).into())
	}

	fn describe(&self) -> String {
		self.path.display().to_string()
	}
}

/// Serves a fixed set of records.
#[derive(Debug, Clone, Default)]
pub struct StaticRecords {
	records: Vec<RawRecord>,
}

impl StaticRecords {
	pub fn new(records: Vec<RawRecord>) -> Self {
		Self { records }
	}
}

#[async_trait]
impl RecordFetcher for StaticRecords {
	async fn fetch(&self) -> Result<FetchedRecords> {
		Ok(FetchedRecords {
			records: self.records.clone(),
			malformed: 0,
		})
	}

	fn describe(&self) -> String {
		format!("static({} records)", self.records.len())
	}
}

#[cfg(test)]
mod tests {
	use std::io::Write;

	use pretty_assertions::assert_eq;

	use super::*;

	#[tokio::test]
	async fn json_lines_file_decodes_contents() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, r#"{{"restaurant_id": "1", "name": "One", "address": {{"coord": [-73.9, 40.7]}}}}"#).unwrap();
		writeln!(file, "garbage").unwrap();
		writeln!(file, r#"{{"restaurant_id": "2", "name": "Two"}}"#).unwrap();

		let fetched = JsonLinesFile::new(file.path()).fetch().await.unwrap();
		assert_eq!(fetched.records.len(), 2);
		assert_eq!(fetched.malformed, 1);
		assert_eq!(fetched.records[1].restaurant_id, "2");
	}

	#[tokio::test]
	async fn missing_file_reports_io_error_with_path() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("absent.json");
		let err = JsonLinesFile::new(&path).fetch().await.unwrap_err();
		match err {
			SourceError::Io { path: reported, .. } => assert_eq!(reported, path),
			other => panic!("expected io error, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn static_records_serve_a_copy_each_time() {
		let fetcher = StaticRecords::new(vec![RawRecord::new("1", "One", "Thai", [-73.9, 40.7])]);
		let first = fetcher.fetch().await.unwrap();
		let second = fetcher.fetch().await.unwrap();
		assert_eq!(first, second);
		assert_eq!(fetcher.describe(), "static(1 records)");
	}
}
