// ---------------------------------------------------------------------------
// Neighbor index - k-nearest rows of the feature matrix
// ---------------------------------------------------------------------------
//
// The offline model is treated as a capability: given a vector and k, return
// the k closest rows ascending by distance, ties broken by ascending row id.
// `BruteForceIndex` satisfies it with a full scan; catalogs are a few
// thousand rows.
// ---------------------------------------------------------------------------

use std::sync::Arc;

use crate::catalog::FeatureMatrix;
use crate::distance::{compute_magnitude, cosine_distance_with_magnitude, euclidean_distance};
use crate::error::BookrecError;
use crate::types::{Metric, Neighbor};

pub trait NeighborIndex: Send + Sync {
	/// The `k` rows closest to `vector`, including an exact match of the
	/// query itself when it is a row of the index.
	fn query(&self, vector: &[f32], k: usize) -> Result<Vec<Neighbor>, BookrecError>;

	/// Number of indexed rows.
	fn len(&self) -> usize;

	fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn metric(&self) -> Metric;
}

/// Exhaustive distance scan over a shared feature matrix.
pub struct BruteForceIndex {
	features: Arc<FeatureMatrix>,
	metric: Metric,
	/// Row magnitudes, filled only for the cosine metric.
	magnitudes: Vec<f64>,
}

impl BruteForceIndex {
	pub fn new(features: Arc<FeatureMatrix>, metric: Metric) -> Self {
		let magnitudes = match metric {
			Metric::Cosine => features.rows().iter().map(|r| compute_magnitude(r)).collect(),
			Metric::Euclidean => Vec::new(),
		};
		Self {
			features,
			metric,
			magnitudes,
		}
	}

	fn validate(&self, vector: &[f32], k: usize) -> Result<(), BookrecError> {
		let rows = self.features.len();
		if k == 0 || k > rows {
			return Err(BookrecError::InvalidArgument(format!(
				"k must be between 1 and {}, got {}",
				rows, k
			)));
		}
		if vector.len() != self.features.dimension() {
			return Err(BookrecError::InvalidArgument(format!(
				"Query vector has dimension {}, index has {}",
				vector.len(),
				self.features.dimension()
			)));
		}
		Ok(())
	}
}

impl NeighborIndex for BruteForceIndex {
	fn query(&self, vector: &[f32], k: usize) -> Result<Vec<Neighbor>, BookrecError> {
		self.validate(vector, k)?;

		let query_mag = match self.metric {
			Metric::Cosine => compute_magnitude(vector),
			Metric::Euclidean => 0.0,
		};

		let mut scored: Vec<Neighbor> = self
			.features
			.rows()
			.iter()
			.enumerate()
			.map(|(row_id, row)| {
				let distance = match self.metric {
					Metric::Euclidean => euclidean_distance(vector, row),
					Metric::Cosine => cosine_distance_with_magnitude(
						vector,
						row,
						query_mag,
						self.magnitudes[row_id],
					),
				};
				Neighbor { row_id, distance }
			})
			.collect();

		scored.sort_by(|a, b| {
			a.distance
				.total_cmp(&b.distance)
				.then(a.row_id.cmp(&b.row_id))
		});
		scored.truncate(k);

		Ok(scored)
	}

	fn len(&self) -> usize {
		self.features.len()
	}

	fn metric(&self) -> Metric {
		self.metric
	}
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
	use super::*;

	fn features(rows: &[(&str, &[f32])]) -> Arc<FeatureMatrix> {
		Arc::new(
			FeatureMatrix::new(
				rows.iter()
					.map(|(t, r)| (t.to_string(), r.to_vec()))
					.collect(),
			)
			.unwrap(),
		)
	}

	fn line() -> Arc<FeatureMatrix> {
		features(&[
			("A", &[0.0, 0.0]),
			("B", &[1.0, 0.0]),
			("C", &[3.0, 0.0]),
			("D", &[10.0, 0.0]),
		])
	}

	#[test]
	fn query_orders_by_distance() {
		let index = BruteForceIndex::new(line(), Metric::Euclidean);
		let result = index.query(&[0.0, 0.0], 3).unwrap();
		let ids: Vec<usize> = result.iter().map(|n| n.row_id).collect();
		assert_eq!(ids, vec![0, 1, 2]);
		assert_eq!(result[0].distance, 0.0);
		assert!((result[2].distance - 3.0).abs() < 1e-10);
	}

	#[test]
	fn query_includes_self_match() {
		let index = BruteForceIndex::new(line(), Metric::Euclidean);
		let result = index.query(&[3.0, 0.0], 1).unwrap();
		assert_eq!(result, vec![Neighbor { row_id: 2, distance: 0.0 }]);
	}

	#[test]
	fn ties_break_by_row_id() {
		let m = features(&[
			("A", &[1.0, 0.0]),
			("B", &[-1.0, 0.0]),
			("C", &[0.0, 1.0]),
			("D", &[0.0, 0.0]),
		]);
		let index = BruteForceIndex::new(m, Metric::Euclidean);
		let result = index.query(&[0.0, 0.0], 4).unwrap();
		let ids: Vec<usize> = result.iter().map(|n| n.row_id).collect();
		assert_eq!(ids, vec![3, 0, 1, 2]);
	}

	#[test]
	fn k_zero_is_invalid() {
		let index = BruteForceIndex::new(line(), Metric::Euclidean);
		assert!(matches!(
			index.query(&[0.0, 0.0], 0),
			Err(BookrecError::InvalidArgument(_))
		));
	}

	#[test]
	fn k_above_row_count_is_invalid() {
		let index = BruteForceIndex::new(line(), Metric::Euclidean);
		assert!(matches!(
			index.query(&[0.0, 0.0], 5),
			Err(BookrecError::InvalidArgument(_))
		));
		assert_eq!(index.query(&[0.0, 0.0], 4).unwrap().len(), 4);
	}

	#[test]
	fn dimension_mismatch_is_invalid() {
		let index = BruteForceIndex::new(line(), Metric::Euclidean);
		assert!(matches!(
			index.query(&[0.0], 1),
			Err(BookrecError::InvalidArgument(_))
		));
	}

	#[test]
	fn cosine_metric_ignores_magnitude() {
		let m = features(&[
			("A", &[1.0, 0.0]),
			("B", &[100.0, 1.0]),
			("C", &[0.0, 1.0]),
		]);
		let index = BruteForceIndex::new(m, Metric::Cosine);
		assert_eq!(index.metric(), Metric::Cosine);
		let result = index.query(&[2.0, 0.0], 3).unwrap();
		let ids: Vec<usize> = result.iter().map(|n| n.row_id).collect();
		assert_eq!(ids, vec![0, 1, 2]);
	}

	#[test]
	fn repeated_queries_are_identical() {
		let index = BruteForceIndex::new(line(), Metric::Euclidean);
		let first = index.query(&[2.0, 0.0], 4).unwrap();
		let second = index.query(&[2.0, 0.0], 4).unwrap();
		assert_eq!(first, second);
	}
}
