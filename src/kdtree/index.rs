use tinyvec::TinyVec;

use crate::error::{KdIndexError, Result};
use crate::kdtree::builder::KdTreeBuilder;
use crate::kdtree::distance::SquaredEuclidean;
use crate::r#type::CoordNum;

/// Sentinel for an absent child or an empty tree.
pub(crate) const NIL: u32 = u32::MAX;

/// One point placed in the tree.
///
/// The split axis is not stored per node; it is `depth % dim`, and every
/// traversal derives it by threading the current axis through its descent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct KdNode {
    /// Insertion index of the stored point.
    pub(crate) point: u32,
    pub(crate) left: u32,
    pub(crate) right: u32,
}

impl KdNode {
    pub(crate) fn leaf(point: u32) -> Self {
        Self {
            point,
            left: NIL,
            right: NIL,
        }
    }
}

/// A k-d tree over `dim`-dimensional points with coordinate scalar `N` and
/// distance metric `M`.
///
/// Created from a batch of points via [`KdTreeBuilder`], or empty via
/// [`KdTree::new`], then optionally grown one point at a time with
/// [`insert`][KdTree::insert]. Coordinates live in one flat, dim-strided
/// buffer; the node arena references them by insertion index.
///
/// Queries never mutate the tree, so concurrent read-only access to a tree
/// that is not being inserted into is safe.
#[derive(Debug, Clone)]
pub struct KdTree<N: CoordNum, M = SquaredEuclidean> {
    pub(crate) coords: Vec<N>,
    pub(crate) nodes: Vec<KdNode>,
    pub(crate) root: u32,
    pub(crate) dim: usize,
    pub(crate) metric: M,
}

impl<N: CoordNum> KdTree<N> {
    /// An empty index with the default metric; grow it with
    /// [`insert`][KdTree::insert].
    ///
    /// Panics if `dim` is zero.
    pub fn new(dim: usize) -> Self {
        KdTreeBuilder::new(dim).finish()
    }
}

impl<N: CoordNum, M> KdTree<N, M> {
    /// The dimension of the indexed points.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// The number of points in this index.
    pub fn num_items(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if this index holds no points.
    pub fn is_empty(&self) -> bool {
        self.root == NIL
    }

    /// Coordinates of the point stored under `index`.
    ///
    /// `index` is the insertion index returned by
    /// [`KdTreeBuilder::add`] or [`insert`][KdTree::insert].
    pub fn point(&self, index: u32) -> &[N] {
        let start = index as usize * self.dim;
        &self.coords[start..start + self.dim]
    }

    /// Single coordinate of a stored point.
    #[inline]
    pub(crate) fn coord(&self, point: u32, axis: usize) -> N {
        self.coords[point as usize * self.dim + axis]
    }

    pub(crate) fn check_dim(&self, point: &[N]) -> Result<()> {
        if point.len() != self.dim {
            return Err(KdIndexError::DimensionMismatch {
                expected: self.dim,
                actual: point.len(),
            });
        }
        Ok(())
    }

    /// Insert a single point, returning its insertion index.
    ///
    /// Descends the existing structure, cycling the axis with depth, and
    /// attaches a new leaf at the first empty child slot: a point whose axis
    /// value is less than or equal to the node's goes left, a greater value
    /// goes right. The tie rule matches the median build, which search
    /// routing relies on for duplicate coordinate values.
    ///
    /// No rebalancing happens, so adversarial insertion orders degrade the
    /// tree toward O(n) depth. Build from a batch with [`KdTreeBuilder`] when
    /// the points are known up front.
    pub fn insert(&mut self, point: &[N]) -> Result<u32> {
        self.check_dim(point)?;

        let index = (self.coords.len() / self.dim) as u32;
        self.coords.extend_from_slice(point);
        let leaf = self.nodes.len() as u32;
        self.nodes.push(KdNode::leaf(index));

        if self.root == NIL {
            self.root = leaf;
            return Ok(index);
        }

        let mut node = self.root as usize;
        let mut axis = 0;
        loop {
            let current = self.nodes[node];
            let go_left = point[axis] <= self.coord(current.point, axis);
            let child = if go_left { current.left } else { current.right };
            if child == NIL {
                if go_left {
                    self.nodes[node].left = leaf;
                } else {
                    self.nodes[node].right = leaf;
                }
                return Ok(index);
            }
            node = child as usize;
            axis = (axis + 1) % self.dim;
        }
    }

    /// Visit every stored point exactly once, in unspecified order.
    ///
    /// Each call restarts the traversal from the root.
    pub fn iter(&self) -> Iter<'_, N, M> {
        let mut stack: TinyVec<[u32; 33]> = TinyVec::new();
        if self.root != NIL {
            stack.push(self.root);
        }
        Iter { tree: self, stack }
    }
}

/// Iterator over the points of a [`KdTree`], in tree-traversal order.
///
/// Yields one coordinate slice per stored point.
pub struct Iter<'a, N: CoordNum, M> {
    tree: &'a KdTree<N, M>,
    stack: TinyVec<[u32; 33]>,
}

impl<'a, N: CoordNum, M> Iterator for Iter<'a, N, M> {
    type Item = &'a [N];

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        let node = &self.tree.nodes[node as usize];
        if node.left != NIL {
            self.stack.push(node.left);
        }
        if node.right != NIL {
            self.stack.push(node.right);
        }
        Some(self.tree.point(node.point))
    }
}
