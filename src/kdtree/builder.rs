use crate::error::{KdIndexError, Result};
use crate::kdtree::distance::SquaredEuclidean;
use crate::kdtree::index::{KdNode, KdTree, NIL};
use crate::r#type::CoordNum;

/// A builder to create a [`KdTree`] from a batch of points.
///
/// Batch construction recursively partitions the points around per-axis
/// medians, so a freshly built tree is balanced and queries descend
/// O(log n) levels. Points added after [`finish`][KdTreeBuilder::finish]
/// via [`KdTree::insert`] do not rebalance.
///
/// The builder copies coordinates into its own flat buffer; the caller's
/// slices are not held onto, and the buffer keeps insertion order so the
/// indices returned by [`add`][KdTreeBuilder::add] remain meaningful on the
/// finished tree. Only an internal scratch of point ids is reordered during
/// the median sort.
pub struct KdTreeBuilder<N: CoordNum, M = SquaredEuclidean> {
    coords: Vec<N>,
    dim: usize,
    metric: M,
}

impl<N: CoordNum> KdTreeBuilder<N> {
    /// Create a new builder for `dim`-dimensional points with the default
    /// [`SquaredEuclidean`] metric.
    ///
    /// Panics if `dim` is zero.
    pub fn new(dim: usize) -> Self {
        Self::new_with_metric(dim, SquaredEuclidean)
    }

    /// Like [`new`][KdTreeBuilder::new], pre-allocating room for `capacity`
    /// points.
    pub fn with_capacity(dim: usize, capacity: usize) -> Self {
        let mut builder = Self::new(dim);
        builder.coords.reserve(capacity * dim);
        builder
    }
}

impl<N: CoordNum, M> KdTreeBuilder<N, M> {
    /// Create a new builder with a caller-supplied distance metric.
    ///
    /// See [`DistanceMetric`][crate::kdtree::DistanceMetric] for the caveat
    /// on non-Euclidean metrics.
    ///
    /// Panics if `dim` is zero.
    pub fn new_with_metric(dim: usize, metric: M) -> Self {
        assert!(dim > 0, "dimension must be positive");
        Self {
            coords: Vec::new(),
            dim,
            metric,
        }
    }

    /// Add a point to the index, returning its insertion index.
    pub fn add(&mut self, point: &[N]) -> Result<u32> {
        if point.len() != self.dim {
            return Err(KdIndexError::DimensionMismatch {
                expected: self.dim,
                actual: point.len(),
            });
        }
        let index = (self.coords.len() / self.dim) as u32;
        self.coords.extend_from_slice(point);
        Ok(index)
    }

    /// Consume this builder, performing the recursive median partition and
    /// producing a [`KdTree`] ready for queries.
    pub fn finish(self) -> KdTree<N, M> {
        let num_items = self.coords.len() / self.dim;
        let mut nodes = Vec::with_capacity(num_items);
        let mut ids: Vec<u32> = (0..num_items as u32).collect();
        let root = build(&mut nodes, &mut ids, &self.coords, self.dim, 0);

        KdTree {
            coords: self.coords,
            nodes,
            root,
            dim: self.dim,
            metric: self.metric,
        }
    }
}

/// Recursive median construction over a scratch range of point ids.
///
/// Sorts `ids` by the coordinate on the current axis, places the median point
/// in a node and recurses into the two halves on the next axis. Returns the
/// arena index of the subtree root, or `NIL` for an empty range.
fn build<N: CoordNum>(
    nodes: &mut Vec<KdNode>,
    ids: &mut [u32],
    coords: &[N],
    dim: usize,
    axis: usize,
) -> u32 {
    match ids.len() {
        0 => return NIL,
        1 => {
            let node = nodes.len() as u32;
            nodes.push(KdNode::leaf(ids[0]));
            return node;
        }
        _ => {}
    }

    // Equal axis values may land on either side of the median; search
    // tolerates that because plane pruning only skips a subtree when the
    // plane is strictly farther than the worst retained candidate.
    ids.sort_unstable_by(|&a, &b| {
        let va = coords[a as usize * dim + axis];
        let vb = coords[b as usize * dim + axis];
        // We don't allow NaN. This should only panic on NaN
        va.partial_cmp(&vb).unwrap()
    });

    let m = ids.len() >> 1;
    let node = nodes.len() as u32;
    nodes.push(KdNode::leaf(ids[m]));

    let next_axis = (axis + 1) % dim;
    let (lower, rest) = ids.split_at_mut(m);
    let left = build(nodes, lower, coords, dim, next_axis);
    let right = build(nodes, &mut rest[1..], coords, dim, next_axis);

    nodes[node as usize].left = left;
    nodes[node as usize].right = right;
    node
}
