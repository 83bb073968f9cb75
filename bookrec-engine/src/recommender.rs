// ---------------------------------------------------------------------------
// Recommender - the core API surface
// ---------------------------------------------------------------------------
//
// Owns the shared read-only catalog and neighbor index and wires them into
// the resolver and the filter engine. Everything behind it is immutable, so
// a `Recommender` can be shared across threads behind an `Arc`.
// ---------------------------------------------------------------------------

use std::path::Path;
use std::sync::Arc;

use crate::catalog::Catalog;
use crate::error::BookrecError;
use crate::filter::FilterQueryEngine;
use crate::neighbors::{BruteForceIndex, NeighborIndex};
use crate::resolver::{RecommendationResolver, Resolution, DEFAULT_NEIGHBOR_COUNT};
use crate::snapshot::{self, Snapshot};
use crate::types::{CatalogStats, DisplayRecord};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RecommenderConfig {
	/// Neighbors requested per recommendation, the query book included.
	pub neighbor_count: usize,
}

impl Default for RecommenderConfig {
	fn default() -> Self {
		Self {
			neighbor_count: DEFAULT_NEIGHBOR_COUNT,
		}
	}
}

// ---------------------------------------------------------------------------
// Recommender
// ---------------------------------------------------------------------------

pub struct Recommender {
	catalog: Arc<Catalog>,
	index: Arc<dyn NeighborIndex>,
	resolver: RecommendationResolver,
	filter: FilterQueryEngine,
}

impl Recommender {
	/// Build from an already-loaded catalog and index.
	///
	/// Fails with `InvalidArgument` when `neighbor_count` is zero or larger
	/// than the number of indexed books.
	pub fn new(
		catalog: Arc<Catalog>,
		index: Arc<dyn NeighborIndex>,
		config: RecommenderConfig,
	) -> Result<Self, BookrecError> {
		if config.neighbor_count == 0 {
			return Err(BookrecError::InvalidArgument(
				"neighbor count must be at least 1".into(),
			));
		}
		if config.neighbor_count > index.len() {
			return Err(BookrecError::InvalidArgument(format!(
				"neighbor count {} exceeds catalog size {}",
				config.neighbor_count,
				index.len()
			)));
		}
		let resolver =
			RecommendationResolver::new(Arc::clone(&catalog), Arc::clone(&index), config.neighbor_count);
		let filter = FilterQueryEngine::new(Arc::clone(&catalog));
		Ok(Self {
			catalog,
			index,
			resolver,
			filter,
		})
	}

	/// Build a catalog and brute-force index from a decoded snapshot.
	pub fn from_snapshot(snapshot: Snapshot, config: RecommenderConfig) -> Result<Self, BookrecError> {
		let (catalog, metric) = snapshot.into_catalog()?;
		let catalog = Arc::new(catalog);
		let index = Arc::new(BruteForceIndex::new(catalog.shared_features(), metric));
		Self::new(catalog, index, config)
	}

	pub fn load(path: impl AsRef<Path>, config: RecommenderConfig) -> Result<Self, BookrecError> {
		let path = path.as_ref();
		let snapshot = snapshot::load_from_path(path)?;
		let recommender = Self::from_snapshot(snapshot, config)?;
		tracing::info!(
			path = %path.display(),
			books = recommender.catalog.features().len(),
			records = recommender.catalog.metadata_table().len(),
			metric = recommender.index.metric().as_str(),
			"Catalog loaded"
		);
		Ok(recommender)
	}

	// -- Queries -------------------------------------------------------------

	pub fn recommend(&self, title: &str) -> Result<Vec<DisplayRecord>, BookrecError> {
		self.resolver.recommend(title)
	}

	/// Like [`recommend`](Self::recommend), with distances and skipped titles.
	pub fn resolve(&self, title: &str) -> Result<Resolution, BookrecError> {
		self.resolver.resolve(title)
	}

	pub fn search_by_author(&self, substring: &str) -> Vec<DisplayRecord> {
		self.filter.by_author(substring)
	}

	pub fn search_by_rating(&self, min: f64, max: f64) -> Result<Vec<DisplayRecord>, BookrecError> {
		self.filter.by_rating_range(min, max)
	}

	// -- Catalog info --------------------------------------------------------

	pub fn titles(&self) -> &[String] {
		self.catalog.selectable_titles()
	}

	pub fn stats(&self) -> CatalogStats {
		CatalogStats {
			books: self.catalog.features().len(),
			records: self.catalog.metadata_table().len(),
			dimension: self.catalog.features().dimension(),
			metric: self.index.metric(),
			neighbor_count: self.resolver.neighbor_count(),
		}
	}

	pub fn catalog(&self) -> &Catalog {
		&self.catalog
	}
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
