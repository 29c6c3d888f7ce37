use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use poimap_diff::Diffable;
use poimap_filter::{Filterable, catalog};
use rustc_hash::FxHasher;

/// WGS84 position in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
	pub latitude: f64,
	pub longitude: f64,
}

impl Coordinate {
	/// Reads an upstream `[longitude, latitude]` pair.
	///
	/// Returns `None` unless both components are present, finite and in range.
	pub fn from_lon_lat(coord: &[f64]) -> Option<Self> {
		let &[longitude, latitude, ..] = coord else {
			return None;
		};
		let valid = latitude.is_finite() && longitude.is_finite() && (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude);
		valid.then_some(Self { latitude, longitude })
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inspection {
	pub date: DateTime<Utc>,
	pub grade: String,
	pub score: Option<i32>,
}

/// A displayable restaurant.
///
/// Identity is the upstream restaurant id. Content equality is decided by a
/// signature over every displayed field, computed once at projection time.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
	id: String,
	name: String,
	subtitle: String,
	coordinate: Coordinate,
	cuisine: String,
	borough: String,
	zipcode: String,
	/// Newest first.
	inspections: Vec<Inspection>,
	signature: u64,
}

impl Place {
	#[allow(clippy::too_many_arguments)]
	pub(crate) fn new(
		id: String,
		name: String,
		subtitle: String,
		coordinate: Coordinate,
		cuisine: String,
		borough: String,
		zipcode: String,
		mut inspections: Vec<Inspection>,
	) -> Self {
		inspections.sort_by(|a, b| b.date.cmp(&a.date));
		let mut place = Self {
			id,
			name,
			subtitle,
			coordinate,
			cuisine,
			borough,
			zipcode,
			inspections,
			signature: 0,
		};
		place.signature = place.content_signature();
		place
	}

	pub fn id(&self) -> &str {
		&self.id
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// `"<building> <street>"`.
	pub fn subtitle(&self) -> &str {
		&self.subtitle
	}

	pub fn coordinate(&self) -> Coordinate {
		self.coordinate
	}

	pub fn cuisine(&self) -> &str {
		&self.cuisine
	}

	pub fn borough(&self) -> &str {
		&self.borough
	}

	pub fn zipcode(&self) -> &str {
		&self.zipcode
	}

	pub fn inspections(&self) -> &[Inspection] {
		&self.inspections
	}

	/// Grade of the most recent inspection, if it carries one.
	pub fn latest_grade(&self) -> Option<&str> {
		self.inspections.first().map(|i| i.grade.as_str()).filter(|grade| !grade.is_empty())
	}

	pub fn signature(&self) -> u64 {
		self.signature
	}

	fn content_signature(&self) -> u64 {
		let mut h = FxHasher::default();
		self.name.hash(&mut h);
		self.subtitle.hash(&mut h);
		self.coordinate.latitude.to_bits().hash(&mut h);
		self.coordinate.longitude.to_bits().hash(&mut h);
		self.cuisine.hash(&mut h);
		self.borough.hash(&mut h);
		self.zipcode.hash(&mut h);
		for inspection in &self.inspections {
			inspection.date.timestamp_millis().hash(&mut h);
			inspection.grade.hash(&mut h);
			inspection.score.hash(&mut h);
		}
		h.finish()
	}
}

impl Diffable for Place {
	type Id = String;

	fn diff_id(&self) -> &String {
		&self.id
	}

	fn same_content(&self, other: &Self) -> bool {
		self.signature == other.signature && self == other
	}
}

impl Filterable for Place {
	fn attribute(&self, dimension: &str) -> Option<&str> {
		match dimension {
			catalog::CUISINE => Some(self.cuisine.as_str()),
			catalog::GRADE => self.latest_grade(),
			"borough" => Some(self.borough.as_str()),
			_ => None,
		}
	}
}
