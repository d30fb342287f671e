use glam::{DMat3, DMat4, DVec3};
use thiserror::Error;

use crate::{
    transform::{rigid_from_parts, transform_points},
    BaseQuadruple, Correspondence, MatchQuadruple, PointCloud,
};

/// Reasons a 4-point correspondence does not yield a rigid transform.
#[derive(Debug, Error, PartialEq)]
pub enum SolveError {
    /// The points do not span enough dimensions to fix a rotation.
    #[error("Degenerate point configuration")]
    Degenerate,

    /// The best rigid fit leaves too large a residual.
    #[error("Fit residual {mse} exceeds the maximum of {max_mse}")]
    ResidualTooLarge {
        /// Mean squared error of the fit.
        mse: f64,
        /// Maximum accepted mean squared error.
        max_mse: f64,
    },

    /// A correspondence refers to a point that does not exist.
    #[error("Point index {index} is out of bounds for a cloud of {len} points")]
    IndexOutOfBounds {
        /// The offending index.
        index: usize,
        /// Number of points in the cloud.
        len: usize,
    },
}

/// Estimates the rigid transform mapping a base quadruple onto a matched quadruple.
pub trait QuadrupleSolver: Sync {
    /// Solve for the transform taking the source points of `base` onto the target points of `matched`.
    ///
    /// An error means the correspondence is not a valid rigid motion and the match must be skipped.
    fn solve(
        &self,
        base: &BaseQuadruple,
        matched: &MatchQuadruple,
        correspondences: &[Correspondence; 4],
    ) -> Result<DMat4, SolveError>;
}

/// Least-squares rigid fit over the four correspondences, gated by the fit residual.
pub struct SvdQuadrupleSolver<'a> {
    source: &'a PointCloud,
    target: &'a PointCloud,
    max_mse: f64,
}

impl<'a> SvdQuadrupleSolver<'a> {
    /// Create a solver over the source and target clouds.
    pub fn new(source: &'a PointCloud, target: &'a PointCloud, max_mse: f64) -> Self {
        Self {
            source,
            target,
            max_mse,
        }
    }

    fn gather(cloud: &PointCloud, indices: impl Iterator<Item = usize>) -> Result<[[f64; 3]; 4], SolveError> {
        let mut points = [[0.0; 3]; 4];
        for (point, index) in points.iter_mut().zip(indices) {
            *point = *cloud.point(index).ok_or(SolveError::IndexOutOfBounds {
                index,
                len: cloud.len(),
            })?;
        }
        Ok(points)
    }
}

impl QuadrupleSolver for SvdQuadrupleSolver<'_> {
    fn solve(
        &self,
        _base: &BaseQuadruple,
        _matched: &MatchQuadruple,
        correspondences: &[Correspondence; 4],
    ) -> Result<DMat4, SolveError> {
        let src = Self::gather(self.source, correspondences.iter().map(|c| c.source_index))?;
        let dst = Self::gather(self.target, correspondences.iter().map(|c| c.target_index))?;

        let transform = fit_transformation(&src, &dst)?;

        // mean squared error of the base points mapped onto the match
        let mut src_fit = [[0.0; 3]; 4];
        transform_points(&src, &transform, &mut src_fit);
        let mse = src_fit
            .iter()
            .zip(dst.iter())
            .map(|(a, b)| DVec3::from_array(*a).distance_squared(DVec3::from_array(*b)))
            .sum::<f64>()
            / src.len() as f64;

        if mse > self.max_mse {
            return Err(SolveError::ResidualTooLarge {
                mse,
                max_mse: self.max_mse,
            });
        }

        Ok(transform)
    }
}

/// Compute the optimal rigid transformation between two sets of corresponding points.
///
/// The algorithm:
/// 1. Compute centroids of both point sets
/// 2. Compute the cross-covariance matrix H = Σ[(p_src - p_src_mean) * (p_dst - p_dst_mean)^T]
/// 3. Compute the SVD of H = U * S * V^T
/// 4. Calculate rotation matrix R = V * U^T, flipping the last axis of V on reflections
/// 5. Calculate translation vector t = p_dst_mean - R * p_src_mean
///
/// For more details, see: Arun, K., Huang, T. S., and Blostein, S. D.
/// "Least-squares fitting of two 3-D point sets." IEEE PAMI, 1987.
///
/// Returns [`SolveError::Degenerate`] when the source points are coincident or collinear.
pub fn fit_transformation(points_src: &[[f64; 3]], points_dst: &[[f64; 3]]) -> Result<DMat4, SolveError> {
    assert_eq!(
        points_src.len(),
        points_dst.len(),
        "Point sets must have same number of points"
    );
    if points_src.len() < 3 {
        return Err(SolveError::Degenerate);
    }

    let (src_centroid, dst_centroid) = compute_centroids(points_src, points_dst);

    // H = Σ[(src - src_mean) * (dst - dst_mean)^T]
    let mut h = [[0.0; 3]; 3];
    let mut spread = 0.0;
    for (p_src, p_dst) in points_src.iter().zip(points_dst.iter()) {
        let s = DVec3::from_array(*p_src) - src_centroid;
        let d = DVec3::from_array(*p_dst) - dst_centroid;
        spread += s.length_squared();
        for (i, row) in h.iter_mut().enumerate() {
            for (j, val) in row.iter_mut().enumerate() {
                *val += s[i] * d[j];
            }
        }
    }
    if spread < 1e-12 {
        return Err(SolveError::Degenerate);
    }

    let svd = faer::Mat::<f64>::from_fn(3, 3, |i, j| h[i][j]).svd();
    let u = faer_to_mat3(svd.u());
    let v = faer_to_mat3(svd.v());

    // collinear source points leave the rotation about their line undetermined
    let mut singular = [0.0; 3];
    for (i, val) in singular.iter_mut().enumerate() {
        *val = svd.s_diagonal().read(i);
    }
    singular.sort_by(|a, b| b.total_cmp(a));
    if singular[1] <= 1e-9 * singular[0] {
        return Err(SolveError::Degenerate);
    }

    let mut r = v * u.transpose();
    if r.determinant() < 0.0 {
        let v_corrected = DMat3::from_cols(v.x_axis, v.y_axis, -v.z_axis);
        r = v_corrected * u.transpose();
    }

    let t = dst_centroid - r * src_centroid;

    Ok(rigid_from_parts(r, t))
}

fn faer_to_mat3(m: faer::MatRef<'_, f64>) -> DMat3 {
    DMat3::from_cols_array_2d(&std::array::from_fn(|j| {
        std::array::from_fn(|i| m.read(i, j))
    }))
}

/// Compute the centroids of two sets of points.
pub fn compute_centroids(points_src: &[[f64; 3]], points_dst: &[[f64; 3]]) -> (DVec3, DVec3) {
    let src_centroid = points_src
        .iter()
        .fold(DVec3::ZERO, |acc, p| acc + DVec3::from_array(*p))
        / points_src.len() as f64;
    let dst_centroid = points_dst
        .iter()
        .fold(DVec3::ZERO, |acc, p| acc + DVec3::from_array(*p))
        / points_dst.len() as f64;
    (src_centroid, dst_centroid)
}
