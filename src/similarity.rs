//! Similarity math for dense word vectors
//!
//! This module provides the slice-level primitives the rest of the crate is
//! built on: dot product, magnitude, cosine similarity and centroids.
//! Comparing vectors of different dimension is always an error, never a score.

use crate::error::{ClusterError, Result};

fn check_dimensions(a: &[f64], b: &[f64]) -> Result<()> {
    if a.len() != b.len() {
        return Err(ClusterError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    Ok(())
}

/// Compute the dot product of two equal-length vectors
///
/// # Examples
///
/// ```
/// use phrase_clustering::similarity::dot_product;
///
/// let dot = dot_product(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]).unwrap();
/// assert_eq!(dot, 32.0);
/// assert!(dot_product(&[1.0], &[1.0, 2.0]).is_err());
/// ```
pub fn dot_product(a: &[f64], b: &[f64]) -> Result<f64> {
    check_dimensions(a, b)?;
    Ok(a.iter().zip(b).map(|(x, y)| x * y).sum())
}

/// Euclidean norm of a vector
pub fn magnitude(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum::<f64>().sqrt()
}

/// Compute cosine similarity between two equal-length vectors
///
/// The result is `dot(a, b) / (|a| * |b|)`. It is not clamped: callers
/// compare it directly against thresholds. A zero-magnitude input produces
/// NaN, which never satisfies a `>=` comparison.
///
/// # Arguments
/// * `a` - First vector
/// * `b` - Second vector
///
/// # Returns
/// Cosine similarity in [-1, 1], or `DimensionMismatch` when the lengths differ.
///
/// # Examples
///
/// ```
/// use phrase_clustering::similarity::cosine_similarity;
///
/// let sim = cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]).unwrap();
/// assert!((sim - 1.0).abs() < 1e-12);
///
/// let orthogonal = cosine_similarity(&[1.0, 0.0], &[0.0, 3.0]).unwrap();
/// assert_eq!(orthogonal, 0.0);
/// ```
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> Result<f64> {
    let dot = dot_product(a, b)?;
    Ok(dot / (magnitude(a) * magnitude(b)))
}

/// Like [`cosine_similarity`] but with magnitudes the caller already knows
pub(crate) fn cosine_with_magnitudes(
    a: &[f64],
    a_magnitude: f64,
    b: &[f64],
    b_magnitude: f64,
) -> Result<f64> {
    let dot = dot_product(a, b)?;
    Ok(dot / (a_magnitude * b_magnitude))
}

/// Component-wise mean of a set of vectors
///
/// Returns `Ok(None)` for an empty input and `DimensionMismatch` as soon as
/// one vector disagrees with the first one's dimension.
///
/// # Examples
///
/// ```
/// use phrase_clustering::similarity::centroid;
///
/// let rows: Vec<&[f64]> = vec![&[1.0, 0.0], &[0.0, 1.0]];
/// let mean = centroid(rows).unwrap().unwrap();
/// assert_eq!(mean, vec![0.5, 0.5]);
/// ```
pub fn centroid<'a, I>(vectors: I) -> Result<Option<Vec<f64>>>
where
    I: IntoIterator<Item = &'a [f64]>,
{
    let mut iter = vectors.into_iter();
    let Some(first) = iter.next() else {
        return Ok(None);
    };

    let mut sum = first.to_vec();
    let mut count = 1usize;
    for values in iter {
        check_dimensions(&sum, values)?;
        for (acc, v) in sum.iter_mut().zip(values) {
            *acc += v;
        }
        count += 1;
    }

    let n = count as f64;
    for acc in &mut sum {
        *acc /= n;
    }
    Ok(Some(sum))
}
