//! Fitness of rigid transform hypotheses.
//!
//! The score follows the MSAC idea: every validation point contributes its
//! squared distance to the closest target point, saturated at
//! `max_inlier_dist_sqr`, so a transform that leaves most points far from the
//! target is penalized but never discarded outright.

use glam::DMat4;

use crate::{
    nearest::NearestNeighborSearch,
    params::ScoringConfig,
    transform::{transform_points, translation_norm},
    Fitness, RegistrationError,
};

/// Scores candidate transforms against the target cloud on a fixed validation subsample.
pub struct TransformScorer<N> {
    validation_points: Vec<[f64; 3]>,
    index: N,
    config: ScoringConfig,
}

impl<N: NearestNeighborSearch> TransformScorer<N> {
    /// Create a scorer.
    ///
    /// # Arguments
    ///
    /// * `validation_points` - Source points the transforms are validated on.
    /// * `index` - Nearest neighbour search over the target cloud.
    /// * `config` - Saturation distance and optional translation cost.
    pub fn new(
        validation_points: Vec<[f64; 3]>,
        index: N,
        config: ScoringConfig,
    ) -> Result<Self, RegistrationError> {
        if validation_points.is_empty() {
            return Err(RegistrationError::EmptyValidationSample);
        }
        if !(config.max_inlier_dist_sqr.is_finite() && config.max_inlier_dist_sqr > 0.0) {
            return Err(RegistrationError::InvalidParameter {
                name: "max_inlier_dist_sqr",
                reason: format!(
                    "must be positive and finite, got {}",
                    config.max_inlier_dist_sqr
                ),
            });
        }
        Ok(Self {
            validation_points,
            index,
            config,
        })
    }

    /// The scoring constants.
    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Number of validation points.
    pub fn num_validation_points(&self) -> usize {
        self.validation_points.len()
    }

    /// Mean saturated squared residual, normalized to `[0, 1]`.
    ///
    /// NaN when the transform or a neighbour distance is not finite.
    pub fn residual(&self, transform: &DMat4) -> f64 {
        if !transform.is_finite() {
            return f64::NAN;
        }
        let max_dist_sqr = self.config.max_inlier_dist_sqr;

        let mut transformed = vec![[0.0; 3]; self.validation_points.len()];
        transform_points(&self.validation_points, transform, &mut transformed);

        // per-point terms in [0, 1], NaN distances propagate
        let sum = transformed
            .iter()
            .map(|p| {
                self.index.nearest(p).map_or(1.0, |nn| {
                    nn.distance_sqr.clamp(0.0, max_dist_sqr) / max_dist_sqr
                })
            })
            .sum::<f64>();

        sum / transformed.len() as f64
    }

    /// Fitness of `transform`, combining the residual and the optional translation cost.
    pub fn fitness(&self, transform: &DMat4) -> f64 {
        let residual = self.residual(transform);
        match &self.config.translation_bias {
            Some(bias) => {
                let penalty = bias.penalty(translation_norm(transform));
                (residual + bias.lambda * penalty) / (1.0 + bias.lambda)
            }
            None => residual,
        }
    }

    /// Score `transform` against a reference fitness.
    ///
    /// Returns the new fitness only if it strictly improves on `reference`.
    /// An [`Fitness::Unscored`] reference accepts every finite fitness.
    pub fn score(&self, transform: &DMat4, reference: Fitness) -> Option<f64> {
        let fitness = self.fitness(transform);
        if reference.is_improved_by(fitness) {
            Some(fitness)
        } else {
            log::trace!("rejected transform with fitness {fitness}, reference {reference:?}");
            None
        }
    }
}
