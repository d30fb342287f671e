use serde::{Deserialize, Serialize};

use crate::RegistrationError;

/// How two candidates are compared when extracting distinct results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DuplicatePolicy {
    /// A candidate is a duplicate only when it is close in rotation **and** in translation.
    #[default]
    Both,
    /// A candidate is a duplicate when it is close in rotation **or** in translation.
    Either,
}

impl DuplicatePolicy {
    /// Whether a relative motion of `angle` and `translation` marks a duplicate.
    pub fn is_duplicate(
        self,
        angle: f64,
        translation: f64,
        min_angle: f64,
        min_translation: f64,
    ) -> bool {
        let close_angle = angle <= min_angle;
        let close_translation = translation <= min_translation;
        match self {
            DuplicatePolicy::Both => close_angle && close_translation,
            DuplicatePolicy::Either => close_angle || close_translation,
        }
    }
}

/// Parameters of the keypoint-based 4PCS scoring stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationParams {
    /// Expected positional accuracy of the keypoints.
    pub delta: f64,
    /// Approximate overlap between source and target, in `(0, 1]`.
    pub approx_overlap: f64,
    /// Fitness below which the best candidate is considered converged.
    pub score_threshold: f64,
    /// Weight of the translation cost relative to the residual cost.
    pub lambda: f64,
    /// Translation norm at or below which the full translation penalty applies.
    /// `None` disables the translation cost.
    pub lower_trl_boundary: Option<f64>,
    /// Translation norm at or above which no translation penalty applies.
    /// `None` derives it from the target diameter and the overlap.
    pub upper_trl_boundary: Option<f64>,
    /// Number of source points used to validate transforms. 0 uses every point.
    pub validation_samples: usize,
    /// Optional fixed seed for reproducible validation sampling.
    pub random_seed: Option<u64>,
    /// Policy used to detect near-identical candidates.
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for RegistrationParams {
    fn default() -> Self {
        Self {
            delta: 1.0,
            approx_overlap: 0.5,
            score_threshold: f64::INFINITY,
            lambda: 0.5,
            lower_trl_boundary: None,
            upper_trl_boundary: None,
            validation_samples: 1000,
            random_seed: None,
            duplicate_policy: DuplicatePolicy::Both,
        }
    }
}

/// Distance tolerances derived from the keypoint accuracy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeypointTolerances {
    /// Maximum difference between two point distances of `delta` accuracy.
    pub max_pair_diff: f64,
    /// Maximum distance between two intersection points of a congruent set.
    pub coincidation_limit: f64,
    /// Maximum edge length difference, accounting for the quadruple orientation.
    pub max_edge_diff: f64,
    /// Maximum mean squared error of a 4-point fit.
    pub max_mse: f64,
    /// Squared distance at which the scoring residual saturates.
    pub max_inlier_dist_sqr: f64,
}

impl KeypointTolerances {
    /// Derive the tolerances from the keypoint accuracy `delta`.
    pub fn from_delta(delta: f64) -> Self {
        Self {
            max_pair_diff: delta * 1.414,
            coincidation_limit: delta * 2.828,
            max_edge_diff: delta * 3.0,
            max_mse: (delta * 4.0).powi(2),
            max_inlier_dist_sqr: (delta * 8.0).powi(2),
        }
    }
}

/// Smooth penalty on transforms with a small translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TranslationBias {
    /// Translation norm at or below which the penalty is 1.
    pub lower: f64,
    /// Translation norm at or above which the penalty is 0.
    pub upper: f64,
    /// Weight of the penalty in the combined fitness.
    pub lambda: f64,
}

impl TranslationBias {
    /// Penalty in `[0, 1]` for a translation of norm `translation`.
    pub fn penalty(&self, translation: f64) -> f64 {
        let ratio = (translation - self.lower) / (self.upper - self.lower);
        if ratio < 0.0 {
            1.0
        } else if ratio > 1.0 {
            0.0
        } else {
            0.5 * (std::f64::consts::PI * ratio + std::f64::consts::FRAC_PI_2).sin() + 0.5
        }
    }
}

/// Constants used by the transform scorer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringConfig {
    /// Squared distance at which the per-point residual saturates.
    pub max_inlier_dist_sqr: f64,
    /// Optional translation cost.
    pub translation_bias: Option<TranslationBias>,
}

impl ScoringConfig {
    /// Residual-only scoring.
    pub fn new(max_inlier_dist_sqr: f64) -> Self {
        Self {
            max_inlier_dist_sqr,
            translation_bias: None,
        }
    }

    /// Add a translation cost to the scoring.
    pub fn with_translation_bias(mut self, bias: TranslationBias) -> Self {
        self.translation_bias = Some(bias);
        self
    }
}

impl RegistrationParams {
    /// Check that the parameters can be used.
    pub fn validate(&self) -> Result<(), RegistrationError> {
        if !(self.delta.is_finite() && self.delta > 0.0) {
            return Err(RegistrationError::InvalidParameter {
                name: "delta",
                reason: format!("must be positive and finite, got {}", self.delta),
            });
        }
        if !(self.approx_overlap > 0.0 && self.approx_overlap <= 1.0) {
            return Err(RegistrationError::InvalidParameter {
                name: "approx_overlap",
                reason: format!("must lie in (0, 1], got {}", self.approx_overlap),
            });
        }
        if self.lambda.is_nan() || self.lambda < 0.0 {
            return Err(RegistrationError::InvalidParameter {
                name: "lambda",
                reason: format!("must be non-negative, got {}", self.lambda),
            });
        }
        Ok(())
    }

    /// Tolerances derived from [`RegistrationParams::delta`].
    pub fn tolerances(&self) -> KeypointTolerances {
        KeypointTolerances::from_delta(self.delta)
    }

    /// Upper translation boundary, derived from the target diameter when not set.
    pub fn upper_trl_boundary(&self, diameter: f64) -> f64 {
        self.upper_trl_boundary
            .unwrap_or(diameter * (1.0 - self.approx_overlap) * 0.5)
    }

    /// Translation cost, enabled only for a non-negative lower boundary below the upper one.
    pub fn translation_bias(&self, diameter: f64) -> Option<TranslationBias> {
        let lower = self.lower_trl_boundary.filter(|lower| *lower >= 0.0)?;
        let upper = self.upper_trl_boundary(diameter);
        (upper > lower).then_some(TranslationBias {
            lower,
            upper,
            lambda: self.lambda,
        })
    }

    /// Scorer constants for a target cloud of the given diameter.
    pub fn scoring_config(&self, diameter: f64) -> ScoringConfig {
        let config = ScoringConfig::new(self.tolerances().max_inlier_dist_sqr);
        match self.translation_bias(diameter) {
            Some(bias) => config.with_translation_bias(bias),
            None => config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_tolerances_from_delta() {
        let tol = KeypointTolerances::from_delta(0.5);
        assert_relative_eq!(tol.max_pair_diff, 0.707);
        assert_relative_eq!(tol.coincidation_limit, 1.414);
        assert_relative_eq!(tol.max_edge_diff, 1.5);
        assert_relative_eq!(tol.max_mse, 4.0);
        assert_relative_eq!(tol.max_inlier_dist_sqr, 16.0);
    }

    #[test]
    fn test_translation_penalty() {
        let bias = TranslationBias {
            lower: 1.0,
            upper: 3.0,
            lambda: 0.5,
        };
        assert_relative_eq!(bias.penalty(0.0), 1.0);
        assert_relative_eq!(bias.penalty(1.0), 1.0);
        assert_relative_eq!(bias.penalty(2.0), 0.5, epsilon = 1e-12);
        assert_relative_eq!(bias.penalty(3.0), 0.0, epsilon = 1e-12);
        assert_relative_eq!(bias.penalty(10.0), 0.0);

        // monotonically decreasing between the boundaries
        let mut last = bias.penalty(1.0);
        for i in 1..=20 {
            let p = bias.penalty(1.0 + i as f64 * 0.1);
            assert!(p <= last);
            last = p;
        }
    }

    #[test]
    fn test_translation_bias_enabling() {
        let mut params = RegistrationParams::default();
        assert!(params.translation_bias(10.0).is_none());

        // derived upper boundary: 10 * (1 - 0.5) * 0.5
        params.lower_trl_boundary = Some(1.0);
        let bias = params.translation_bias(10.0).expect("bias is enabled");
        assert_relative_eq!(bias.upper, 2.5);
        assert_relative_eq!(bias.lambda, 0.5);

        // upper not above lower disables the cost
        params.upper_trl_boundary = Some(0.5);
        assert!(params.translation_bias(10.0).is_none());

        params.upper_trl_boundary = None;
        params.lower_trl_boundary = Some(-1.0);
        assert!(params.translation_bias(10.0).is_none());
    }

    #[test]
    fn test_scoring_config() {
        let params = RegistrationParams {
            delta: 0.25,
            lower_trl_boundary: Some(0.1),
            upper_trl_boundary: Some(1.0),
            ..Default::default()
        };
        let config = params.scoring_config(5.0);
        assert_relative_eq!(config.max_inlier_dist_sqr, 4.0);
        assert!(config.translation_bias.is_some());
    }

    #[test]
    fn test_validate() {
        assert!(RegistrationParams::default().validate().is_ok());

        let params = RegistrationParams {
            delta: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(RegistrationError::InvalidParameter { name: "delta", .. })
        ));

        let params = RegistrationParams {
            approx_overlap: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(RegistrationError::InvalidParameter {
                name: "approx_overlap",
                ..
            })
        ));
    }

    #[test]
    fn test_duplicate_policy() {
        let both = DuplicatePolicy::Both;
        assert!(both.is_duplicate(0.05, 0.005, 0.1, 0.01));
        assert!(!both.is_duplicate(0.05, 1.0, 0.1, 0.01));
        assert!(!both.is_duplicate(1.0, 0.005, 0.1, 0.01));

        let either = DuplicatePolicy::Either;
        assert!(either.is_duplicate(0.05, 1.0, 0.1, 0.01));
        assert!(either.is_duplicate(1.0, 0.005, 0.1, 0.01));
        assert!(!either.is_duplicate(1.0, 1.0, 0.1, 0.01));
    }

    #[test]
    fn test_params_from_json() -> Result<(), Box<dyn std::error::Error>> {
        let params: RegistrationParams =
            serde_json::from_str(r#"{ "delta": 0.02, "lower_trl_boundary": 0.1, "duplicate_policy": "Either" }"#)?;
        assert_relative_eq!(params.delta, 0.02);
        assert_eq!(params.lower_trl_boundary, Some(0.1));
        assert_eq!(params.duplicate_policy, DuplicatePolicy::Either);
        assert_eq!(params.validation_samples, 1000);
        Ok(())
    }
}
