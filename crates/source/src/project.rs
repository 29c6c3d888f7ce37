use std::sync::Arc;

use thiserror::Error;

use crate::place::{Coordinate, Inspection, Place};
use crate::record::RawRecord;

/// Why a record could not be displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MalformedRecord {
	#[error("record has no identifier")]
	MissingId,
	#[error("record has no display name")]
	MissingName,
	#[error("record has no valid coordinate")]
	InvalidCoordinate,
}

/// Tally of one projection pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectionReport {
	pub accepted: usize,
	pub missing_id: usize,
	pub missing_name: usize,
	pub invalid_coordinate: usize,
}

impl ProjectionReport {
	pub fn rejected(&self) -> usize {
		self.missing_id + self.missing_name + self.invalid_coordinate
	}

	fn record(&mut self, reason: MalformedRecord) {
		match reason {
			MalformedRecord::MissingId => self.missing_id += 1,
			MalformedRecord::MissingName => self.missing_name += 1,
			MalformedRecord::InvalidCoordinate => self.invalid_coordinate += 1,
		}
	}
}

/// Displayable items in source order plus the pass tally.
#[derive(Debug, Clone, Default)]
pub struct Projection {
	pub items: Vec<Arc<Place>>,
	pub report: ProjectionReport,
}

/// Maps raw records to [`Place`] items.
#[derive(Debug, Clone, Copy, Default)]
pub struct Projector;

impl Projector {
	/// Projects every record, dropping the ones that cannot be displayed.
	///
	/// Output order follows input order. Duplicate ids are passed through; the
	/// ordered collection built downstream keeps the first occurrence.
	pub fn project(records: &[RawRecord]) -> Projection {
		let mut projection = Projection {
			items: Vec::with_capacity(records.len()),
			report: ProjectionReport::default(),
		};

		for record in records {
			match Self::project_one(record) {
				Ok(place) => {
					projection.items.push(Arc::new(place));
					projection.report.accepted += 1;
				}
				Err(reason) => {
					tracing::trace!(id = %record.restaurant_id, %reason, "source.project.skip");
					projection.report.record(reason);
				}
			}
		}

		if projection.report.rejected() > 0 {
			tracing::debug!(
				accepted = projection.report.accepted,
				rejected = projection.report.rejected(),
				"source.project.rejected"
			);
		}
		projection
	}

	pub fn project_one(record: &RawRecord) -> Result<Place, MalformedRecord> {
		let id = record.restaurant_id.trim();
		if id.is_empty() {
			return Err(MalformedRecord::MissingId);
		}
		let name = record.name.trim();
		if name.is_empty() {
			return Err(MalformedRecord::MissingName);
		}
		let coordinate = Coordinate::from_lon_lat(&record.address.coord).ok_or(MalformedRecord::InvalidCoordinate)?;

		let subtitle = [record.address.building.trim(), record.address.street.trim()]
			.into_iter()
			.filter(|part| !part.is_empty())
			.collect::<Vec<_>>()
			.join(" ");

		let inspections = record
			.grades
			.iter()
			.map(|raw| Inspection {
				date: raw.date.date,
				grade: raw.grade.clone(),
				score: raw.score,
			})
			.collect();

		Ok(Place::new(
			id.to_owned(),
			name.to_owned(),
			subtitle,
			coordinate,
			record.cuisine.clone(),
			record.borough.clone(),
			record.address.zipcode.clone(),
			inspections,
		))
	}
}

#[cfg(test)]
mod tests {
	use poimap_diff::Diffable;
	use poimap_filter::Filterable;
	use pretty_assertions::assert_eq;

	use super::*;

	fn bakery() -> RawRecord {
		let mut record = RawRecord::new("30075445", "Morris Park Bake Shop", "Bakery", [-73.856077, 40.848447])
			.with_grade("B", 1_378_857_600_000)
			.with_grade("A", 1_393_804_800_000);
		record.address.building = "1007".into();
		record.address.street = "Morris Park Ave".into();
		record.borough = "Bronx".into();
		record
	}

	#[test]
	fn projects_displayable_fields() {
		let place = Projector::project_one(&bakery()).unwrap();
		assert_eq!(place.id(), "30075445");
		assert_eq!(place.name(), "Morris Park Bake Shop");
		assert_eq!(place.subtitle(), "1007 Morris Park Ave");
		assert_eq!(place.coordinate(), Coordinate {
			latitude: 40.848447,
			longitude: -73.856077
		});
		assert_eq!(place.borough(), "Bronx");
	}

	#[test]
	fn latest_grade_is_the_newest_inspection() {
		let place = Projector::project_one(&bakery()).unwrap();
		assert_eq!(place.latest_grade(), Some("A"));
		assert_eq!(place.inspections()[1].grade, "B");
		assert_eq!(place.attribute("grade"), Some("A"));
		assert_eq!(place.attribute("cuisine"), Some("Bakery"));
	}

	#[test]
	fn ungraded_place_has_no_grade_attribute() {
		let place = Projector::project_one(&RawRecord::new("1", "New Spot", "Thai", [-73.9, 40.7])).unwrap();
		assert_eq!(place.latest_grade(), None);
		assert_eq!(place.attribute("grade"), None);
	}

	#[test]
	fn rejects_records_that_cannot_be_displayed() {
		let mut no_name = bakery();
		no_name.name = "  ".into();
		let mut no_id = bakery();
		no_id.restaurant_id.clear();
		let mut short_coord = bakery();
		short_coord.address.coord = vec![-73.8];
		let mut out_of_range = bakery();
		out_of_range.address.coord = vec![-73.8, 140.0];
		let mut nan = bakery();
		nan.address.coord = vec![f64::NAN, 40.0];

		assert_eq!(Projector::project_one(&no_name), Err(MalformedRecord::MissingName));
		assert_eq!(Projector::project_one(&no_id), Err(MalformedRecord::MissingId));
		for bad in [&short_coord, &out_of_range, &nan] {
			assert_eq!(Projector::project_one(bad), Err(MalformedRecord::InvalidCoordinate));
		}

		let projection = Projector::project(&[bakery(), no_name, no_id, short_coord, out_of_range, nan]);
		assert_eq!(projection.items.len(), 1);
		assert_eq!(projection.report, ProjectionReport {
			accepted: 1,
			missing_id: 1,
			missing_name: 1,
			invalid_coordinate: 3,
		});
	}

	#[test]
	fn projection_preserves_input_order() {
		let records = vec![
			RawRecord::new("c", "C", "Thai", [-73.9, 40.7]),
			RawRecord::new("a", "A", "Thai", [-73.9, 40.7]),
			RawRecord::new("b", "B", "Thai", [-73.9, 40.7]),
		];
		let ids: Vec<_> = Projector::project(&records).items.iter().map(|p| p.id().to_owned()).collect();
		assert_eq!(ids, vec!["c", "a", "b"]);
	}

	#[test]
	fn identical_records_project_to_equal_content() {
		let a = Projector::project_one(&bakery()).unwrap();
		let b = Projector::project_one(&bakery()).unwrap();
		assert!(a.same_content(&b));
		assert_eq!(a.diff_id(), b.diff_id());
	}

	#[test]
	fn content_signature_tracks_displayed_fields() {
		let base = Projector::project_one(&bakery()).unwrap();

		let mut renamed = bakery();
		renamed.name = "Morris Park Bakery".into();
		let renamed = Projector::project_one(&renamed).unwrap();
		assert_eq!(base.diff_id(), renamed.diff_id());
		assert!(!base.same_content(&renamed));

		let regraded = Projector::project_one(&bakery().with_grade("C", 1_500_000_000_000)).unwrap();
		assert!(!base.same_content(&regraded));
		assert_eq!(regraded.latest_grade(), Some("C"));
	}
}
