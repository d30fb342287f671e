#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Merging of per-base candidate lists into a global ranking.
pub mod aggregator;

/// Scoring of every match quadruple found for one base quadruple.
pub mod evaluator;

/// Nearest neighbour search over the target point cloud.
pub mod nearest;

/// Registration parameters and the thresholds derived from them.
pub mod params;

/// End-to-end wiring of the scoring stage.
pub mod pipeline;

/// Point cloud container.
pub mod pointcloud;

/// Random validation subsample of the source cloud.
pub mod sampling;

/// Saturated residual scoring of rigid transforms.
pub mod scoring;

/// Extraction of mutually distinct top candidates.
pub mod selector;

/// Rigid transformation estimation from four correspondences.
pub mod solver;

/// Rigid transform helpers.
pub mod transform;

mod types;

pub use aggregator::{CandidateAggregator, RankedCandidates};
pub use evaluator::CandidateEvaluator;
pub use nearest::{KdTreeIndex, Neighbor, NearestNeighborSearch};
pub use params::{DuplicatePolicy, KeypointTolerances, RegistrationParams, ScoringConfig, TranslationBias};
pub use pipeline::KfpcsScoring;
pub use pointcloud::PointCloud;
pub use sampling::ValidationSample;
pub use scoring::TransformScorer;
pub use solver::{QuadrupleSolver, SolveError, SvdQuadrupleSolver};
pub use types::{BaseQuadruple, CandidateTransform, Correspondence, Fitness, MatchQuadruple};

/// Errors raised while setting up the registration stage.
#[derive(thiserror::Error, Debug)]
pub enum RegistrationError {
    /// A point cloud without points was provided.
    #[error("The {0} point cloud is empty")]
    EmptyPointCloud(&'static str),

    /// The validation sample does not contain any index.
    #[error("The validation sample is empty")]
    EmptyValidationSample,

    /// A point index is outside of the point cloud.
    #[error("Point index {index} is out of bounds for a cloud of {len} points")]
    IndexOutOfBounds {
        /// The offending index.
        index: usize,
        /// Number of points in the cloud.
        len: usize,
    },

    /// A registration parameter has an invalid value.
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Name of the parameter.
        name: &'static str,
        /// Why the value is rejected.
        reason: String,
    },
}
