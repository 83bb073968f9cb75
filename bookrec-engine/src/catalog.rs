// ---------------------------------------------------------------------------
// Catalog - read-only book tables
// ---------------------------------------------------------------------------
//
// Holds the feature matrix (one rating vector per unique title, row order is
// the row id) and the metadata table (one record per edition, titles repeat).
// Built once from a snapshot and never mutated afterwards.
// ---------------------------------------------------------------------------

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::error::BookrecError;
use crate::types::MetadataRecord;

// ---------------------------------------------------------------------------
// FeatureMatrix
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct FeatureMatrix {
	titles: Vec<String>,
	rows: Vec<Vec<f32>>,
	row_by_title: HashMap<String, usize>,
	dimension: usize,
}

impl FeatureMatrix {
	/// Build a matrix from `(title, row)` pairs in row order.
	///
	/// Fails with `Corruption` on a duplicate title, a row whose length
	/// differs from the first row, or a non-finite value.
	pub fn new(rows: Vec<(String, Vec<f32>)>) -> Result<Self, BookrecError> {
		let dimension = rows.first().map_or(0, |(_, r)| r.len());
		let mut titles = Vec::with_capacity(rows.len());
		let mut data = Vec::with_capacity(rows.len());
		let mut row_by_title = HashMap::with_capacity(rows.len());

		for (row_id, (title, row)) in rows.into_iter().enumerate() {
			if row.len() != dimension {
				return Err(BookrecError::Corruption(format!(
					"Row '{}' has dimension {}, expected {}",
					title,
					row.len(),
					dimension
				)));
			}
			if let Some(pos) = row.iter().position(|v| !v.is_finite()) {
				return Err(BookrecError::Corruption(format!(
					"Row '{}' has non-finite value {} at position {}",
					title, row[pos], pos
				)));
			}
			if row_by_title.insert(title.clone(), row_id).is_some() {
				return Err(BookrecError::Corruption(format!(
					"Duplicate title in feature matrix: {}",
					title
				)));
			}
			titles.push(title);
			data.push(row);
		}

		Ok(Self {
			titles,
			rows: data,
			row_by_title,
			dimension,
		})
	}

	pub fn len(&self) -> usize {
		self.rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	pub fn dimension(&self) -> usize {
		self.dimension
	}

	pub fn titles(&self) -> &[String] {
		&self.titles
	}

	pub fn rows(&self) -> &[Vec<f32>] {
		&self.rows
	}

	pub fn row_id(&self, title: &str) -> Option<usize> {
		self.row_by_title.get(title).copied()
	}

	pub fn row(&self, row_id: usize) -> Option<&[f32]> {
		self.rows.get(row_id).map(Vec::as_slice)
	}

	pub fn title_of(&self, row_id: usize) -> Option<&str> {
		self.titles.get(row_id).map(String::as_str)
	}
}

// ---------------------------------------------------------------------------
// MetadataTable
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct MetadataTable {
	records: Vec<MetadataRecord>,
	/// title -> record indices, ascending (table order).
	by_title: HashMap<String, Vec<usize>>,
}

impl MetadataTable {
	pub fn new(records: Vec<MetadataRecord>) -> Result<Self, BookrecError> {
		let mut by_title: HashMap<String, Vec<usize>> = HashMap::new();
		for (idx, record) in records.iter().enumerate() {
			if !record.rating.is_finite() {
				return Err(BookrecError::Corruption(format!(
					"Non-finite rating for '{}' at record {}",
					record.title, idx
				)));
			}
			by_title.entry(record.title.clone()).or_default().push(idx);
		}
		Ok(Self { records, by_title })
	}

	pub fn len(&self) -> usize {
		self.records.len()
	}

	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}

	pub fn records(&self) -> &[MetadataRecord] {
		&self.records
	}

	pub fn get(&self, index: usize) -> Option<&MetadataRecord> {
		self.records.get(index)
	}

	pub fn indices_of(&self, title: &str) -> &[usize] {
		self.by_title.get(title).map(Vec::as_slice).unwrap_or(&[])
	}
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// The catalog store: feature matrix, metadata table and the list of titles
/// offered for selection.
#[derive(Debug, Clone)]
pub struct Catalog {
	features: Arc<FeatureMatrix>,
	metadata: MetadataTable,
	selectable: Vec<String>,
}

impl Catalog {
	/// Assemble a catalog. When `selectable` is `None` the matrix titles are
	/// offered. Selectable titles missing from the matrix are dropped.
	pub fn new(
		features: FeatureMatrix,
		metadata: MetadataTable,
		selectable: Option<Vec<String>>,
	) -> Self {
		let selectable = match selectable {
			Some(list) => {
				let mut seen = HashSet::new();
				let total = list.len();
				let kept: Vec<String> = list
					.into_iter()
					.filter(|t| features.row_id(t).is_some() && seen.insert(t.clone()))
					.collect();
				if kept.len() != total {
					tracing::warn!(
						dropped = total - kept.len(),
						"Selectable titles missing from feature matrix or repeated"
					);
				}
				kept
			}
			None => features.titles().to_vec(),
		};
		Self {
			features: Arc::new(features),
			metadata,
			selectable,
		}
	}

	pub fn features(&self) -> &FeatureMatrix {
		&self.features
	}

	/// Shared handle on the feature matrix, for building a neighbor index.
	pub fn shared_features(&self) -> Arc<FeatureMatrix> {
		Arc::clone(&self.features)
	}

	pub fn metadata_table(&self) -> &MetadataTable {
		&self.metadata
	}

	pub fn selectable_titles(&self) -> &[String] {
		&self.selectable
	}

	/// Row id of `title` in the feature matrix.
	pub fn lookup_row_id(&self, title: &str) -> Result<usize, BookrecError> {
		self.features
			.row_id(title)
			.ok_or_else(|| BookrecError::NotFound(title.to_string()))
	}

	pub fn feature_vector(&self, row_id: usize) -> Option<&[f32]> {
		self.features.row(row_id)
	}

	pub fn title_of(&self, row_id: usize) -> Option<&str> {
		self.features.title_of(row_id)
	}

	/// Metadata indices whose title equals `title` exactly, in table order.
	pub fn find_metadata_indices(&self, title: &str) -> Result<Vec<usize>, BookrecError> {
		let indices = self.metadata.indices_of(title);
		if indices.is_empty() {
			return Err(BookrecError::NotFound(title.to_string()));
		}
		Ok(indices.to_vec())
	}

	pub fn metadata(&self, index: usize) -> Option<&MetadataRecord> {
		self.metadata.get(index)
	}
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
