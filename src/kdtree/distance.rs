//! Distance functions for scoring query candidates.

use crate::r#type::CoordNum;

/// A squared-distance function between two points of equal dimension.
///
/// The search pruning rule compares per-axis splitting-plane offsets against
/// distances returned by this trait. That comparison is only provably correct
/// when the metric is consistent with per-axis coordinate differences
/// (Euclidean-like); the index does not validate the metric it is given.
pub trait DistanceMetric<N: CoordNum> {
    /// Squared distance between `a` and `b`.
    ///
    /// Both slices have the index dimension. The result must be non-negative.
    fn dist_sq(&self, a: &[N], b: &[N]) -> N;
}

/// The default metric: sum of squared per-axis differences, never rooted.
///
/// Staying in squared space preserves every ordering the search needs and
/// avoids a square root per comparison.
#[derive(Debug, Clone, Copy, Default)]
pub struct SquaredEuclidean;

impl<N: CoordNum> DistanceMetric<N> for SquaredEuclidean {
    #[inline]
    fn dist_sq(&self, a: &[N], b: &[N]) -> N {
        a.iter().zip(b).fold(N::zero(), |acc, (&x, &y)| {
            // absolute difference, so unsigned coordinates can't underflow
            let d = if x >= y { x - y } else { y - x };
            acc + d * d
        })
    }
}
