//! An incremental k-d tree over fixed-dimensional points, with exact
//! k-nearest-neighbor, radius and box queries.

#![warn(missing_docs)]

mod builder;
mod distance;
mod index;
mod query;

pub use builder::KdTreeBuilder;
pub use distance::{DistanceMetric, SquaredEuclidean};
pub use index::{Iter, KdTree};
pub use query::Neighbor;
