use serde::{Deserialize, Serialize};

/// One row of the ratings metadata table. Titles repeat across editions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataRecord {
	pub title: String,
	pub author: String,
	pub rating: f64,
	pub image_url: String,
}

/// The record handed back to callers by every query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayRecord {
	pub title: String,
	pub author: String,
	pub rating: f64,
	pub image_url: String,
}

impl From<&MetadataRecord> for DisplayRecord {
	fn from(record: &MetadataRecord) -> Self {
		Self {
			title: record.title.clone(),
			author: record.author.clone(),
			rating: record.rating,
			image_url: record.image_url.clone(),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Neighbor {
	pub row_id: usize,
	pub distance: f64,
}

/// Distance metric used by the neighbor index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
	#[default]
	Euclidean,
	Cosine,
}

impl Metric {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Euclidean => "euclidean",
			Self::Cosine => "cosine",
		}
	}
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
	pub books: usize,
	pub records: usize,
	pub dimension: usize,
	pub metric: Metric,
	pub neighbor_count: usize,
}
