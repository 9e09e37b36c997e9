//! Distance computation for the matching pipeline.
//!
//! Distances are weighted Euclidean over the encoded covariate space. The
//! accumulation is a plain loop in fixed feature order, so a given pair of
//! vectors always produces the same scalar regardless of how the surrounding
//! matrix is computed.

use rayon::prelude::*;

use crate::encode::encoder::CovariateVector;

/// Weighted Euclidean distance between two covariate vectors
///
/// Both vectors and the weight slice must share the same length and feature
/// order; this is guaranteed by encoding both groups against one schema.
#[must_use]
pub fn weighted_euclidean(a: &[f64], b: &[f64], weights: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    debug_assert_eq!(a.len(), weights.len());

    let mut sum = 0.0;
    for i in 0..a.len() {
        let diff = a[i] - b[i];
        sum += weights[i] * diff * diff;
    }
    sum.sqrt()
}

/// Distances from one treated vector to every control vector
#[must_use]
pub fn distance_row(
    treated: &CovariateVector,
    controls: &[CovariateVector],
    weights: &[f64],
) -> Vec<f64> {
    controls
        .iter()
        .map(|control| weighted_euclidean(treated, control, weights))
        .collect()
}

/// Full treated-by-control distance matrix
///
/// Rows are computed with rayon when `parallel` is set; both paths produce
/// bit-identical output because each cell is an independent fixed-order
/// accumulation.
#[must_use]
pub fn distance_matrix(
    treated: &[CovariateVector],
    controls: &[CovariateVector],
    weights: &[f64],
    parallel: bool,
) -> Vec<Vec<f64>> {
    if parallel {
        treated
            .par_iter()
            .map(|row| distance_row(row, controls, weights))
            .collect()
    } else {
        treated
            .iter()
            .map(|row| distance_row(row, controls, weights))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn test_weighted_euclidean() {
        let a = [1.0, 2.0];
        let b = [4.0, 6.0];
        let unit = [1.0, 1.0];
        assert!((weighted_euclidean(&a, &b, &unit) - 5.0).abs() < 1e-12);

        // Weighting the second feature by 4 doubles its contribution
        let weights = [1.0, 4.0];
        let expected = (9.0f64 + 4.0 * 16.0).sqrt();
        assert!((weighted_euclidean(&a, &b, &weights) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_distance_zero_for_identical_vectors() {
        let a = [5.0, 3.0, 1.0];
        assert_eq!(weighted_euclidean(&a, &a, &[1.0, 1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_permutation_invariance() {
        // Permuting both vectors identically leaves the distance unchanged
        let a = [1.0, 2.0, 3.0];
        let b = [6.0, 5.0, 4.0];
        let a_perm = [3.0, 1.0, 2.0];
        let b_perm = [4.0, 6.0, 5.0];
        let unit = [1.0, 1.0, 1.0];
        assert_eq!(
            weighted_euclidean(&a, &b, &unit),
            weighted_euclidean(&a_perm, &b_perm, &unit)
        );
    }

    #[test]
    fn test_matrix_parallel_matches_sequential() {
        let treated: Vec<CovariateVector> =
            (0..10).map(|i| smallvec![f64::from(i), 1.0]).collect();
        let controls: Vec<CovariateVector> =
            (0..10).map(|i| smallvec![f64::from(i) * 0.5, 2.0]).collect();
        let weights = [1.0, 1.0];

        let sequential = distance_matrix(&treated, &controls, &weights, false);
        let parallel = distance_matrix(&treated, &controls, &weights, true);
        assert_eq!(sequential, parallel);
    }
}
