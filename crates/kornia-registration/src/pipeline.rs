use crate::{
    aggregator::{CandidateAggregator, RankedCandidates},
    evaluator::CandidateEvaluator,
    nearest::KdTreeIndex,
    params::{KeypointTolerances, RegistrationParams},
    sampling::ValidationSample,
    scoring::TransformScorer,
    solver::SvdQuadrupleSolver,
    BaseQuadruple, CandidateTransform, MatchQuadruple, PointCloud, RegistrationError,
};

/// Scoring and selection stage of keypoint-based 4PCS, wired for a source/target pair.
///
/// Building it derives the distance tolerances from the keypoint accuracy,
/// indexes the target cloud, and draws the validation sample once. The
/// congruent set search stays with the caller, which feeds every base
/// quadruple and its matches to [`KfpcsScoring::evaluate`] and hands all
/// resulting lists to [`KfpcsScoring::finalize`].
///
/// Example:
///
/// ```
/// use kornia_registration::{KfpcsScoring, PointCloud, RegistrationParams};
///
/// let points = vec![
///     [0.0, 0.0, 0.0],
///     [1.0, 0.0, 0.0],
///     [0.0, 2.0, 0.0],
///     [0.0, 0.0, 1.5],
///     [1.0, 1.0, 1.0],
/// ];
/// let source = PointCloud::new(points.clone());
/// let target = PointCloud::new(points);
///
/// let params = RegistrationParams {
///     delta: 0.01,
///     score_threshold: 0.1,
///     ..Default::default()
/// };
/// let scoring = KfpcsScoring::new(&source, &target, params)?;
///
/// let candidates = scoring.evaluate(&[0, 1, 2, 3], &[[0, 1, 2, 3], [1, 0, 2, 3]]);
/// let ranked = scoring.finalize(vec![candidates]);
///
/// assert!(ranked.has_converged());
/// assert!(ranked.fitness_score().is_some_and(|f| f < 1e-9));
/// assert_eq!(ranked.len(), 1);
/// # Ok::<(), kornia_registration::RegistrationError>(())
/// ```
pub struct KfpcsScoring<'a> {
    evaluator: CandidateEvaluator<KdTreeIndex, SvdQuadrupleSolver<'a>>,
    params: RegistrationParams,
    tolerances: KeypointTolerances,
}

impl<'a> KfpcsScoring<'a> {
    /// Set up the scoring stage for aligning `source` onto `target`.
    pub fn new(
        source: &'a PointCloud,
        target: &'a PointCloud,
        params: RegistrationParams,
    ) -> Result<Self, RegistrationError> {
        params.validate()?;
        if source.is_empty() {
            return Err(RegistrationError::EmptyPointCloud("source"));
        }
        if target.is_empty() {
            return Err(RegistrationError::EmptyPointCloud("target"));
        }

        let tolerances = params.tolerances();
        let scoring_config = params.scoring_config(target.diameter());

        log::debug!(
            "delta={}, max_inlier_dist_sqr={}, coincidation_limit={}, max_edge_diff={}, max_pair_diff={}",
            params.delta,
            tolerances.max_inlier_dist_sqr,
            tolerances.coincidation_limit,
            tolerances.max_edge_diff,
            tolerances.max_pair_diff,
        );
        if let Some(bias) = &scoring_config.translation_bias {
            log::debug!(
                "translation cost enabled: lower={}, upper={}, lambda={}",
                bias.lower,
                bias.upper,
                bias.lambda
            );
        }

        let sample = ValidationSample::new(source.len(), params.validation_samples, params.random_seed);
        log::debug!(
            "validating candidates on {} of {} source points",
            sample.len(),
            source.len()
        );

        let scorer = TransformScorer::new(
            sample.points(source)?,
            KdTreeIndex::new(target)?,
            scoring_config,
        )?;
        let solver = SvdQuadrupleSolver::new(source, target, tolerances.max_mse);

        Ok(Self {
            evaluator: CandidateEvaluator::new(scorer, solver),
            params,
            tolerances,
        })
    }

    /// Score every match of one base quadruple. See [`CandidateEvaluator::evaluate`].
    pub fn evaluate(&self, base: &BaseQuadruple, matches: &[MatchQuadruple]) -> Vec<CandidateTransform> {
        self.evaluator.evaluate(base, matches)
    }

    /// Rank the candidates of all base quadruples and decide convergence.
    pub fn finalize<I>(&self, candidate_lists: I) -> RankedCandidates
    where
        I: IntoIterator<Item = Vec<CandidateTransform>>,
    {
        let mut aggregator =
            CandidateAggregator::new(self.params.score_threshold, self.params.duplicate_policy);
        aggregator.extend(candidate_lists);
        aggregator.finalize()
    }

    /// The underlying evaluator.
    pub fn evaluator(&self) -> &CandidateEvaluator<KdTreeIndex, SvdQuadrupleSolver<'a>> {
        &self.evaluator
    }

    /// Tolerances derived from the keypoint accuracy, including those of the congruent set search.
    pub fn tolerances(&self) -> &KeypointTolerances {
        &self.tolerances
    }

    /// The registration parameters.
    pub fn params(&self) -> &RegistrationParams {
        &self.params
    }
}
