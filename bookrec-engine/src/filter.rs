// ---------------------------------------------------------------------------
// Filter queries over the metadata table
// ---------------------------------------------------------------------------
//
// Linear scans. Results hold each matching title once, built from its first
// matching record, in table order.
// ---------------------------------------------------------------------------

use std::collections::HashSet;
use std::sync::Arc;

use crate::catalog::Catalog;
use crate::error::BookrecError;
use crate::types::{DisplayRecord, MetadataRecord};

pub struct FilterQueryEngine {
	catalog: Arc<Catalog>,
}

impl FilterQueryEngine {
	pub fn new(catalog: Arc<Catalog>) -> Self {
		Self { catalog }
	}

	/// Books whose author contains `substring`, ignoring case. An empty
	/// substring matches every record.
	pub fn by_author(&self, substring: &str) -> Vec<DisplayRecord> {
		let needle = substring.to_lowercase();
		self.unique_titles(|r| r.author.to_lowercase().contains(&needle))
	}

	/// Books rated within `[min, max]`, both ends inclusive.
	pub fn by_rating_range(&self, min: f64, max: f64) -> Result<Vec<DisplayRecord>, BookrecError> {
		if min.is_nan() || max.is_nan() {
			return Err(BookrecError::InvalidArgument(
				"Rating bounds must be numbers".into(),
			));
		}
		if min > max {
			return Err(BookrecError::InvalidArgument(format!(
				"Rating range min {} is greater than max {}",
				min, max
			)));
		}
		Ok(self.unique_titles(|r| r.rating >= min && r.rating <= max))
	}

	fn unique_titles<F>(&self, predicate: F) -> Vec<DisplayRecord>
	where
		F: Fn(&MetadataRecord) -> bool,
	{
		let mut seen: HashSet<&str> = HashSet::new();
		self.catalog
			.metadata_table()
			.records()
			.iter()
			.filter(|r| predicate(r))
			.filter(|r| seen.insert(r.title.as_str()))
			.map(DisplayRecord::from)
			.collect()
	}
}
