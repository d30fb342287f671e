use kiddo::immutable::float::kdtree::ImmutableKdTree;

use crate::{PointCloud, RegistrationError};

/// Result of a single nearest neighbour query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Index of the nearest point in the searched cloud.
    pub index: usize,
    /// Squared Euclidean distance to the nearest point.
    pub distance_sqr: f64,
}

/// k = 1 nearest neighbour search over an immutable point set.
///
/// Implementations must be safe to query from several threads at once.
pub trait NearestNeighborSearch: Sync {
    /// Find the point closest to `point`, or `None` if the set is empty.
    fn nearest(&self, point: &[f64; 3]) -> Option<Neighbor>;
}

impl<T: NearestNeighborSearch + ?Sized> NearestNeighborSearch for &T {
    fn nearest(&self, point: &[f64; 3]) -> Option<Neighbor> {
        (**self).nearest(point)
    }
}

/// Kd-tree over the target point cloud.
pub struct KdTreeIndex {
    tree: ImmutableKdTree<f64, u32, 3, 32>,
    len: usize,
}

impl KdTreeIndex {
    /// Build the kd-tree from a point cloud.
    pub fn new(cloud: &PointCloud) -> Result<Self, RegistrationError> {
        Self::from_points(cloud.points())
    }

    /// Build the kd-tree from raw points.
    pub fn from_points(points: &[[f64; 3]]) -> Result<Self, RegistrationError> {
        if points.is_empty() {
            return Err(RegistrationError::EmptyPointCloud("target"));
        }
        Ok(Self {
            tree: ImmutableKdTree::new_from_slice(points),
            len: points.len(),
        })
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the index holds no point. Always false for a constructed index.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl NearestNeighborSearch for KdTreeIndex {
    fn nearest(&self, point: &[f64; 3]) -> Option<Neighbor> {
        let nn = self.tree.nearest_one::<kiddo::SquaredEuclidean>(point);
        Some(Neighbor {
            index: nn.item as usize,
            distance_sqr: nn.distance,
        })
    }
}
