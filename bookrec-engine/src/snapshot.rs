// ---------------------------------------------------------------------------
// Snapshot bundle - offline-produced catalog file
// ---------------------------------------------------------------------------
//
// A single JSON document, optionally gzipped (detected by magic bytes):
//
//   {
//     "version": 1,
//     "metric": "euclidean",
//     "features": { "dimension": 3, "titles": [...], "rows": ["<b64>", ...] },
//     "metadata": [ { "title", "author", "rating", "imageUrl" }, ... ],
//     "titles": [...]
//   }
//
// Each feature row is the base64 (standard alphabet) of its f32 values in
// little-endian byte order. `metric` defaults to euclidean and `titles`
// (the selectable list) defaults to the feature matrix titles.
// ---------------------------------------------------------------------------

use std::io::Read;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::read::{GzDecoder, GzEncoder};
use flate2::Compression;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{Catalog, FeatureMatrix, MetadataTable};
use crate::error::BookrecError;
use crate::types::{MetadataRecord, Metric};

pub const SNAPSHOT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SnapshotError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	#[error("Corruption: {0}")]
	Corruption(String),
	#[error("Serialization: {0}")]
	Serialization(String),
}

// ---------------------------------------------------------------------------
// Row encode / decode
// ---------------------------------------------------------------------------

/// Encode a f32 slice as base64 of its little-endian bytes.
pub fn encode_row(row: &[f32]) -> String {
	let bytes: Vec<u8> = row.iter().flat_map(|f| f.to_le_bytes()).collect();
	STANDARD.encode(&bytes)
}

/// Decode a base64 row back to `Vec<f32>`.
pub fn decode_row(encoded: &str) -> Result<Vec<f32>, SnapshotError> {
	let bytes = STANDARD
		.decode(encoded)
		.map_err(|e| SnapshotError::Corruption(format!("Invalid base64: {}", e)))?;
	if bytes.len() % 4 != 0 {
		return Err(SnapshotError::Corruption(format!(
			"Row byte length {} is not a multiple of 4",
			bytes.len()
		)));
	}
	Ok(bytes
		.chunks_exact(4)
		.map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
		.collect())
}

// ---------------------------------------------------------------------------
// Gzip
// ---------------------------------------------------------------------------

pub fn compress(data: &[u8]) -> Result<Vec<u8>, SnapshotError> {
	let mut encoder = GzEncoder::new(data, Compression::new(6));
	let mut compressed = Vec::new();
	encoder.read_to_end(&mut compressed)?;
	Ok(compressed)
}

pub fn decompress(data: &[u8]) -> Result<Vec<u8>, SnapshotError> {
	let mut decoder = GzDecoder::new(data);
	let mut decompressed = Vec::new();
	decoder.read_to_end(&mut decompressed)?;
	Ok(decompressed)
}

/// Check if data starts with gzip magic bytes (0x1f, 0x8b).
pub fn is_gzipped(data: &[u8]) -> bool {
	data.len() >= 2 && data[0] == 0x1f && data[1] == 0x8b
}

// ---------------------------------------------------------------------------
// File structure
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotFile {
	version: u32,
	#[serde(default)]
	metric: Metric,
	features: FeaturesSection,
	metadata: Vec<MetadataRecord>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	titles: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct FeaturesSection {
	dimension: usize,
	titles: Vec<String>,
	rows: Vec<String>,
}

/// Decoded snapshot, ready to be turned into a [`Catalog`].
#[derive(Debug, Clone)]
pub struct Snapshot {
	pub metric: Metric,
	pub rows: Vec<(String, Vec<f32>)>,
	pub metadata: Vec<MetadataRecord>,
	pub titles: Option<Vec<String>>,
}

impl Snapshot {
	/// Validate the tables and build the catalog. Returns the metric the
	/// neighbor index should use alongside it.
	pub fn into_catalog(self) -> Result<(Catalog, Metric), BookrecError> {
		let features = FeatureMatrix::new(self.rows)?;
		let metadata = MetadataTable::new(self.metadata)?;
		Ok((Catalog::new(features, metadata, self.titles), self.metric))
	}
}

// ---------------------------------------------------------------------------
// Decode / encode
// ---------------------------------------------------------------------------

/// Parse snapshot bytes (gzipped or plain JSON).
pub fn decode(raw: &[u8]) -> Result<Snapshot, SnapshotError> {
	let json_bytes = if is_gzipped(raw) {
		decompress(raw)?
	} else {
		raw.to_vec()
	};

	let file: SnapshotFile = serde_json::from_slice(&json_bytes)
		.map_err(|e| SnapshotError::Corruption(format!("Invalid snapshot JSON: {}", e)))?;

	if file.version != SNAPSHOT_VERSION {
		return Err(SnapshotError::Corruption(format!(
			"Unsupported snapshot version: {}",
			file.version
		)));
	}

	let FeaturesSection {
		dimension,
		titles,
		rows,
	} = file.features;
	if titles.len() != rows.len() {
		return Err(SnapshotError::Corruption(format!(
			"Feature matrix has {} titles but {} rows",
			titles.len(),
			rows.len()
		)));
	}

	let mut decoded = Vec::with_capacity(rows.len());
	for (title, encoded) in titles.into_iter().zip(rows) {
		let row = decode_row(&encoded).map_err(|e| match e {
			SnapshotError::Corruption(msg) => {
				SnapshotError::Corruption(format!("Row '{}': {}", title, msg))
			}
			other => other,
		})?;
		if row.len() != dimension {
			return Err(SnapshotError::Corruption(format!(
				"Row '{}' has dimension {}, expected {}",
				title,
				row.len(),
				dimension
			)));
		}
		decoded.push((title, row));
	}

	Ok(Snapshot {
		metric: file.metric,
		rows: decoded,
		metadata: file.metadata,
		titles: file.titles,
	})
}

/// Serialize a snapshot as gzipped JSON.
pub fn encode(snapshot: &Snapshot) -> Result<Vec<u8>, SnapshotError> {
	let dimension = snapshot.rows.first().map_or(0, |(_, r)| r.len());
	let file = SnapshotFile {
		version: SNAPSHOT_VERSION,
		metric: snapshot.metric,
		features: FeaturesSection {
			dimension,
			titles: snapshot.rows.iter().map(|(t, _)| t.clone()).collect(),
			rows: snapshot.rows.iter().map(|(_, r)| encode_row(r)).collect(),
		},
		metadata: snapshot.metadata.clone(),
		titles: snapshot.titles.clone(),
	};
	let json = serde_json::to_vec(&file)
		.map_err(|e| SnapshotError::Serialization(format!("Failed to serialize snapshot: {}", e)))?;
	compress(&json)
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Snapshot, SnapshotError> {
	let raw = std::fs::read(path.as_ref())?;
	decode(&raw)
}

/// Write `snapshot` to `path` as gzipped JSON, creating parent directories.
pub fn save_to_path(path: impl AsRef<Path>, snapshot: &Snapshot) -> Result<(), SnapshotError> {
	let path = path.as_ref();
	if let Some(parent) = path.parent() {
		if !parent.as_os_str().is_empty() {
			std::fs::create_dir_all(parent)?;
		}
	}
	std::fs::write(path, encode(snapshot)?)?;
	Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
