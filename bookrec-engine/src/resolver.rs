// ---------------------------------------------------------------------------
// Recommendation resolver
// ---------------------------------------------------------------------------
//
// Title -> feature row -> k nearest rows -> titles -> first metadata record.
// The query book is always dropped from its own neighbor list. A neighbor
// with no metadata row is skipped and reported, never an error.
//
// Titles with several metadata records (editions) resolve to the first record
// in table order.
// ---------------------------------------------------------------------------

use std::sync::Arc;

use crate::catalog::Catalog;
use crate::error::BookrecError;
use crate::neighbors::NeighborIndex;
use crate::types::DisplayRecord;

/// Default number of neighbors requested, the query book included.
pub const DEFAULT_NEIGHBOR_COUNT: usize = 6;

/// Output of [`RecommendationResolver::resolve`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
	pub records: Vec<DisplayRecord>,
	/// Neighbor distance for each entry of `records`.
	pub distances: Vec<f64>,
	/// Neighbor titles dropped because no metadata record matched.
	pub missing: Vec<String>,
}

pub struct RecommendationResolver {
	catalog: Arc<Catalog>,
	index: Arc<dyn NeighborIndex>,
	neighbor_count: usize,
}

impl RecommendationResolver {
	pub fn new(catalog: Arc<Catalog>, index: Arc<dyn NeighborIndex>, neighbor_count: usize) -> Self {
		Self {
			catalog,
			index,
			neighbor_count,
		}
	}

	pub fn neighbor_count(&self) -> usize {
		self.neighbor_count
	}

	/// Up to `neighbor_count - 1` books similar to `title`, closest first.
	pub fn recommend(&self, title: &str) -> Result<Vec<DisplayRecord>, BookrecError> {
		self.resolve(title).map(|r| r.records)
	}

	pub fn resolve(&self, title: &str) -> Result<Resolution, BookrecError> {
		let row_id = self
			.catalog
			.lookup_row_id(title)
			.map_err(|_| BookrecError::BookNotFound(title.to_string()))?;
		let vector = self
			.catalog
			.feature_vector(row_id)
			.ok_or_else(|| BookrecError::BookNotFound(title.to_string()))?;

		let neighbors = self.index.query(vector, self.neighbor_count)?;

		let mut resolution = Resolution::default();
		for neighbor in neighbors {
			if neighbor.row_id == row_id {
				continue;
			}
			let Some(neighbor_title) = self.catalog.title_of(neighbor.row_id) else {
				tracing::warn!(row_id = neighbor.row_id, "Neighbor row outside feature matrix");
				continue;
			};

			let record = self
				.catalog
				.find_metadata_indices(neighbor_title)
				.ok()
				.and_then(|indices| indices.first().copied())
				.and_then(|idx| self.catalog.metadata(idx));

			match record {
				Some(record) => {
					resolution.records.push(DisplayRecord::from(record));
					resolution.distances.push(neighbor.distance);
				}
				None => {
					tracing::warn!(
						query = title,
						neighbor = neighbor_title,
						"No metadata for recommended title, skipping"
					);
					resolution.missing.push(neighbor_title.to_string());
				}
			}
		}

		tracing::debug!(
			query = title,
			returned = resolution.records.len(),
			skipped = resolution.missing.len(),
			"Resolved recommendations"
		);

		Ok(resolution)
	}
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
