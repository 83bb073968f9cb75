/// Euclidean (L2) distance between two f32 vectors, accumulated in f64.
/// Callers must pass equal-length slices.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f64 {
	let mut sum: f64 = 0.0;
	for (x, y) in a.iter().zip(b) {
		let d = *x as f64 - *y as f64;
		sum += d * d;
	}
	sum.sqrt()
}

/// Compute the magnitude (L2 norm) of a vector.
pub fn compute_magnitude(v: &[f32]) -> f64 {
	let mut sum: f64 = 0.0;
	for &x in v {
		let xf = x as f64;
		sum += xf * xf;
	}
	sum.sqrt()
}

/// Cosine distance `1 - cos(a, b)` using pre-computed magnitudes.
/// A zero-magnitude side yields distance 1.0 (no similarity).
/// Result clamped to [0.0, 2.0].
pub fn cosine_distance_with_magnitude(a: &[f32], b: &[f32], mag_a: f64, mag_b: f64) -> f64 {
	let denom = mag_a * mag_b;
	if denom == 0.0 {
		return 1.0;
	}

	let mut dot: f64 = 0.0;
	for (x, y) in a.iter().zip(b) {
		dot += (*x as f64) * (*y as f64);
	}

	let sim = dot / denom;
	if !sim.is_finite() {
		return 1.0;
	}
	(1.0 - sim.clamp(-1.0, 1.0)).clamp(0.0, 2.0)
}
