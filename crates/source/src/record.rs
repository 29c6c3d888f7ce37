use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One restaurant as published upstream.
///
/// Decoding is lenient: missing fields fall back to empty values and are
/// judged later by the [`Projector`](crate::Projector).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRecord {
	pub address: Address,
	pub borough: String,
	pub cuisine: String,
	pub grades: Vec<RawInspection>,
	pub name: String,
	pub restaurant_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
	pub building: String,
	/// `[longitude, latitude]`.
	pub coord: Vec<f64>,
	pub street: String,
	pub zipcode: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawInspection {
	pub date: InspectionDate,
	pub grade: String,
	#[serde(default)]
	pub score: Option<i32>,
}

/// Extended-JSON date wrapper: `{ "$date": <epoch millis> }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionDate {
	#[serde(rename = "$date", with = "chrono::serde::ts_milliseconds")]
	pub date: DateTime<Utc>,
}

impl RawRecord {
	/// Minimal record with an id, a name, a cuisine and a `[lon, lat]` coordinate.
	pub fn new(restaurant_id: impl Into<String>, name: impl Into<String>, cuisine: impl Into<String>, lon_lat: [f64; 2]) -> Self {
		Self {
			address: Address {
				coord: lon_lat.to_vec(),
				..Address::default()
			},
			cuisine: cuisine.into(),
			name: name.into(),
			restaurant_id: restaurant_id.into(),
			..Self::default()
		}
	}

	/// Appends an inspection dated `epoch_millis`.
	pub fn with_grade(mut self, grade: impl Into<String>, epoch_millis: i64) -> Self {
		self.grades.push(RawInspection {
			date: InspectionDate {
				date: DateTime::from_timestamp_millis(epoch_millis).unwrap_or_default(),
			},
			grade: grade.into(),
			score: None,
		});
		self
	}
}

/// Records decoded from a payload plus the count of entries that could not be decoded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodeReport {
	pub records: Vec<RawRecord>,
	pub malformed: usize,
}

/// Decodes newline-delimited JSON records, or a single JSON array of records.
///
/// Entries that fail to decode are counted and skipped; one bad line never
/// fails the whole payload.
pub fn decode_records(text: &str) -> DecodeReport {
	let trimmed = text.trim_start();
	if trimmed.starts_with('[') {
		return decode_array(trimmed);
	}

	let mut report = DecodeReport::default();
	for (line_no, line) in text.lines().enumerate() {
		let line = line.trim();
		if line.is_empty() {
			continue;
		}
		match serde_json::from_str::<RawRecord>(line) {
			Ok(record) => report.records.push(record),
			Err(err) => {
				report.malformed += 1;
				tracing::debug!(line = line_no + 1, %err, "source.decode.malformed");
			}
		}
	}
	report
}

fn decode_array(text: &str) -> DecodeReport {
	let values: Vec<serde_json::Value> = match serde_json::from_str(text) {
		Ok(values) => values,
		Err(err) => {
			tracing::debug!(%err, "source.decode.malformed_array");
			return DecodeReport { records: Vec::new(), malformed: 1 };
		}
	};

	let mut report = DecodeReport::default();
	for (idx, value) in values.into_iter().enumerate() {
		match serde_json::from_value::<RawRecord>(value) {
			Ok(record) => report.records.push(record),
			Err(err) => {
				report.malformed += 1;
				tracing::debug!(index = idx, %err, "source.decode.malformed");
			}
		}
	}
	report
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	const LINE: &str = r#"{"address": {"building": "1007", "coord": [-73.856077, 40.848447], "street": "Morris Park Ave", "zipcode": "10462"}, "borough": "Bronx", "cuisine": "Bakery", "grades": [{"date": {"$date": 1393804800000}, "grade": "A", "score": 2}, {"date": {"$date": 1378857600000}, "grade": "A", "score": 6}], "name": "Morris Park Bake Shop", "restaurant_id": "30075445"}"#;

	#[test]
	fn decodes_primer_dataset_line() {
		let report = decode_records(LINE);
		assert_eq!(report.malformed, 0);
		let record = &report.records[0];
		assert_eq!(record.restaurant_id, "30075445");
		assert_eq!(record.address.coord, vec![-73.856077, 40.848447]);
		assert_eq!(record.grades.len(), 2);
		assert_eq!(record.grades[0].score, Some(2));
		assert_eq!(record.grades[0].date.date.timestamp_millis(), 1_393_804_800_000);
	}

	#[test]
	fn missing_fields_default_to_empty() {
		let report = decode_records(r#"{"restaurant_id": "1"}"#);
		let record = &report.records[0];
		assert!(record.name.is_empty());
		assert!(record.address.coord.is_empty());
		assert!(record.grades.is_empty());
	}

	#[test]
	fn bad_lines_are_counted_and_skipped() {
		let text = format!("{LINE}\nnot json\n\n{{\"grades\": [{{\"grade\": \"A\"}}]}}\n{LINE}\n");
		let report = decode_records(&text);
		assert_eq!(report.records.len(), 2);
		assert_eq!(report.malformed, 2);
	}

	#[test]
	fn decodes_json_array_payloads() {
		let text = format!("[{LINE}, 42, {LINE}]");
		let report = decode_records(&text);
		assert_eq!(report.records.len(), 2);
		assert_eq!(report.malformed, 1);
	}

	#[test]
	fn builder_helpers_round_into_schema() {
		let record = RawRecord::new("7", "Corner Deli", "Delicatessen", [-73.9, 40.7]).with_grade("B", 1_000);
		assert_eq!(record.address.coord, vec![-73.9, 40.7]);
		assert_eq!(record.grades[0].grade, "B");
		assert_eq!(record.grades[0].date.date.timestamp_millis(), 1_000);
	}
}
