use glam::DVec3;

use crate::RegistrationError;

/// A point cloud holding 3D points in double precision.
#[derive(Debug, Clone)]
pub struct PointCloud {
    // The points in the point cloud.
    points: Vec<[f64; 3]>,
}

impl PointCloud {
    /// Create a new point cloud from points.
    pub fn new(points: Vec<[f64; 3]>) -> Self {
        Self { points }
    }

    /// Get the number of points in the point cloud.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the point cloud is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Get as reference the points in the point cloud.
    pub fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    /// Get a single point, if the index is valid.
    #[inline]
    pub fn point(&self, index: usize) -> Option<&[f64; 3]> {
        self.points.get(index)
    }

    /// Collect the points at the given indices.
    ///
    /// Returns an error on the first index outside of the cloud.
    pub fn gather(&self, indices: &[usize]) -> Result<Vec<[f64; 3]>, RegistrationError> {
        indices
            .iter()
            .map(|&index| {
                self.point(index)
                    .copied()
                    .ok_or(RegistrationError::IndexOutOfBounds {
                        index,
                        len: self.len(),
                    })
            })
            .collect()
    }

    /// Get the minimum bound of the point cloud.
    pub fn get_min_bound(&self) -> DVec3 {
        let Some(first) = self.points.first() else {
            return DVec3::ZERO;
        };
        self.points
            .iter()
            .map(|p| DVec3::from_array(*p))
            .fold(DVec3::from_array(*first), |a, b| a.min(b))
    }

    /// Get the maximum bound of the point cloud.
    pub fn get_max_bound(&self) -> DVec3 {
        let Some(first) = self.points.first() else {
            return DVec3::ZERO;
        };
        self.points
            .iter()
            .map(|p| DVec3::from_array(*p))
            .fold(DVec3::from_array(*first), |a, b| a.max(b))
    }

    /// Length of the diagonal of the axis aligned bounding box.
    pub fn diameter(&self) -> f64 {
        (self.get_max_bound() - self.get_min_bound()).length()
    }
}
