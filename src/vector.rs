//! This is the vector math module
//! Provide squared L2 distance, L2 normalization and the distance to score transform

use crate::error::IndexError;

/// Squared Euclidean distance
/// dist = sum((a[i] - b[i])^2) for i = 0..a.len()
/// Can only process vectors with same dimensions
///
/// No square root is taken: the index ranks and scores on squared L2 throughout.
pub fn squared_l2(left: &[f32], right: &[f32]) -> Result<f32, IndexError> {
    if left.len() != right.len() {
        return Err(IndexError::DimensionMismatch {
            expected: left.len(),
            actual: right.len(),
        });
    }

    let dist = left.iter()
        .zip(right.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum();

    Ok(dist)
}

/// In-place L2 normalization
/// vec = vec / ||vec||
///
/// Returns the norm before scaling. A zero vector is left untouched.
pub fn normalize(vector: &mut [f32]) -> f32 {
    let norm = vector.iter()
        .map(|x| x * x)
        .sum::<f32>()
        .sqrt();

    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }

    norm
}

/// Similarity score from a squared L2 distance
/// score = 1 / (1 + dist)
///
/// Distance 0 maps to 1.0; larger distances approach 0.
pub fn score_from_distance(distance: f32) -> f32 {
    1.0 / (1.0 + distance)
}
