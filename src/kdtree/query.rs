//! Query surface of the k-d tree: k-nearest-neighbor, radius and box search.

use std::collections::BinaryHeap;

use tinyvec::TinyVec;

use crate::error::Result;
use crate::kdtree::distance::DistanceMetric;
use crate::kdtree::index::{KdTree, NIL};
use crate::r#type::CoordNum;

/// A single nearest-neighbor result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor<N: CoordNum> {
    /// Insertion index of the matched point; pass to [`KdTree::point`] for
    /// its coordinates.
    pub index: u32,
    /// Squared distance from the query to the matched point.
    pub dist: N,
}

/// Heap entry for the bounded candidate set.
///
/// Max-heap on distance, with the traversal visitation sequence as a
/// secondary key so candidate-set membership is deterministic under exact
/// distance ties.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate<N: CoordNum> {
    dist: N,
    seq: u32,
    point: u32,
}

impl<N: CoordNum> Eq for Candidate<N> {}

impl<N: CoordNum> Ord for Candidate<N> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // We don't allow NaN. This should only panic on NaN
        self.dist
            .partial_cmp(&other.dist)
            .unwrap()
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

impl<N: CoordNum> PartialOrd for Candidate<N> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<N: CoordNum, M: DistanceMetric<N>> KdTree<N, M> {
    /// The `k` points nearest to `query`, ordered by ascending squared
    /// distance.
    ///
    /// Returns `min(k, num_items)` results: fewer points than `k` means all
    /// of them come back sorted, and `k == 0` or an empty tree yields an
    /// empty vec. Exact distance ties are broken by traversal order, so
    /// callers comparing against another source should compare distances, not
    /// indices.
    ///
    /// ```
    /// use kd_index::kdtree::KdTreeBuilder;
    ///
    /// let mut builder = KdTreeBuilder::<f64>::new(2);
    /// builder.add(&[0.0, 0.0]).unwrap();
    /// builder.add(&[1.0, 1.0]).unwrap();
    /// builder.add(&[2.0, 2.0]).unwrap();
    /// let tree = builder.finish();
    ///
    /// let results = tree.knn(&[0.2, 0.2], 2).unwrap();
    /// assert_eq!(results[0].index, 0);
    /// assert_eq!(results[1].index, 1);
    /// ```
    pub fn knn(&self, query: &[N], k: usize) -> Result<Vec<Neighbor<N>>> {
        self.check_dim(query)?;
        if k == 0 || self.is_empty() {
            return Ok(vec![]);
        }

        let mut heap: BinaryHeap<Candidate<N>> = BinaryHeap::with_capacity(k);
        let mut seq = 0;
        self.knn_recurse(self.root, query, k, 0, &mut seq, &mut heap);

        // ascending (dist, seq) order
        let results = heap
            .into_sorted_vec()
            .into_iter()
            .map(|c| Neighbor {
                index: c.point,
                dist: c.dist,
            })
            .collect();
        Ok(results)
    }

    fn knn_recurse(
        &self,
        node: u32,
        query: &[N],
        k: usize,
        axis: usize,
        seq: &mut u32,
        heap: &mut BinaryHeap<Candidate<N>>,
    ) {
        if node == NIL {
            return;
        }
        let node = self.nodes[node as usize];

        let dist = self.metric.dist_sq(self.point(node.point), query);
        if heap.len() < k {
            heap.push(Candidate {
                dist,
                seq: *seq,
                point: node.point,
            });
        } else if dist < heap.peek().unwrap().dist {
            // evict the worst retained candidate
            heap.pop();
            heap.push(Candidate {
                dist,
                seq: *seq,
                point: node.point,
            });
        }
        *seq += 1;

        let node_value = self.coord(node.point, axis);
        let query_value = query[axis];
        // same routing rule as insertion: the near side for an axis value
        // less than or equal to the node's is the left child
        let (near, far) = if query_value <= node_value {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };
        let next_axis = (axis + 1) % self.dim;

        self.knn_recurse(near, query, k, next_axis, seq, heap);

        // The far side can only hold a closer point if the squared distance
        // to the splitting plane is strictly below the worst retained
        // distance. With the candidate set not yet full there is nothing to
        // prune against.
        let plane = if node_value >= query_value {
            node_value - query_value
        } else {
            query_value - node_value
        };
        if heap.len() < k || plane * plane < heap.peek().unwrap().dist {
            self.knn_recurse(far, query, k, next_axis, seq, heap);
        }
    }

    /// The single point nearest to `query`, or `None` if the tree is empty.
    pub fn nearest(&self, query: &[N]) -> Result<Option<Neighbor<N>>> {
        Ok(self.knn(query, 1)?.into_iter().next())
    }

    /// Search the index for points within radius `r` of `query`.
    ///
    /// Returns insertion indices of points whose squared distance is at most
    /// `r * r`, in unspecified order. The subtree on one side of a node is
    /// skipped when the query ball cannot reach past the splitting plane.
    pub fn within(&self, query: &[N], r: N) -> Result<Vec<u32>> {
        self.check_dim(query)?;
        let r2 = r * r;

        let mut stack: TinyVec<[(u32, u32); 33]> = TinyVec::new();
        if self.root != NIL {
            stack.push((self.root, 0));
        }
        let mut results = vec![];

        while let Some((node, axis)) = stack.pop() {
            let axis = axis as usize;
            let node = self.nodes[node as usize];

            if self.metric.dist_sq(self.point(node.point), query) <= r2 {
                results.push(node.point);
            }

            let node_value = self.coord(node.point, axis);
            let query_value = query[axis];
            let next_axis = ((axis + 1) % self.dim) as u32;

            // left holds axis values <= node's: reached if query - r <= node
            if node.left != NIL && (query_value <= node_value || query_value - node_value <= r) {
                stack.push((node.left, next_axis));
            }
            // right holds axis values > node's: reached if query + r >= node
            if node.right != NIL && (query_value >= node_value || node_value - query_value <= r) {
                stack.push((node.right, next_axis));
            }
        }

        Ok(results)
    }

    /// Search the index for points within the axis-aligned box spanned by
    /// `min` and `max` (inclusive on both ends).
    ///
    /// Returns insertion indices in unspecified order.
    pub fn range(&self, min: &[N], max: &[N]) -> Result<Vec<u32>> {
        self.check_dim(min)?;
        self.check_dim(max)?;

        let mut stack: TinyVec<[(u32, u32); 33]> = TinyVec::new();
        if self.root != NIL {
            stack.push((self.root, 0));
        }
        let mut results = vec![];

        while let Some((node, axis)) = stack.pop() {
            let axis = axis as usize;
            let node = self.nodes[node as usize];

            let point = self.point(node.point);
            let inside = point
                .iter()
                .enumerate()
                .all(|(a, &v)| min[a] <= v && v <= max[a]);
            if inside {
                results.push(node.point);
            }

            let node_value = self.coord(node.point, axis);
            let next_axis = ((axis + 1) % self.dim) as u32;

            if node.left != NIL && min[axis] <= node_value {
                stack.push((node.left, next_axis));
            }
            if node.right != NIL && max[axis] >= node_value {
                stack.push((node.right, next_axis));
            }
        }

        Ok(results)
    }
}
