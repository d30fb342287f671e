use crate::{
    nearest::NearestNeighborSearch, scoring::TransformScorer, solver::QuadrupleSolver, BaseQuadruple,
    CandidateTransform, Correspondence, Fitness, MatchQuadruple,
};

/// Turns the congruent matches of one base quadruple into scored candidate transforms.
///
/// The evaluator only reads shared state, so one instance can serve many
/// base quadruples evaluated on different threads.
pub struct CandidateEvaluator<N, S> {
    scorer: TransformScorer<N>,
    solver: S,
}

impl<N, S> CandidateEvaluator<N, S>
where
    N: NearestNeighborSearch,
    S: QuadrupleSolver,
{
    /// Create an evaluator from a scorer and a 4-point solver.
    pub fn new(scorer: TransformScorer<N>, solver: S) -> Self {
        Self { scorer, solver }
    }

    /// The scorer used to rate transforms.
    pub fn scorer(&self) -> &TransformScorer<N> {
        &self.scorer
    }

    /// Estimate and score a transform for every match of `base`.
    ///
    /// Matches the solver rejects are skipped. Every solved transform is kept,
    /// scored or not, and the candidate with the lowest fitness is moved to the
    /// front so callers can check for early termination on the first element.
    ///
    /// # Arguments
    ///
    /// * `base` - Source indices of the base quadruple.
    /// * `matches` - Target quadruples congruent to the base.
    ///
    /// # Returns
    ///
    /// At most one candidate per match.
    pub fn evaluate(&self, base: &BaseQuadruple, matches: &[MatchQuadruple]) -> Vec<CandidateTransform> {
        let mut candidates = Vec::with_capacity(matches.len());

        for matched in matches {
            let correspondences = Correspondence::from_quadruples(base, matched);

            let transform = match self.solver.solve(base, matched, &correspondences) {
                Ok(transform) => transform,
                Err(err) => {
                    log::trace!("skipping match {matched:?} of base {base:?}: {err}");
                    continue;
                }
            };

            // an unscored reference keeps every candidate, pruning happens on selection
            let fitness = self
                .scorer
                .score(&transform, Fitness::Unscored)
                .map_or(Fitness::Unscored, Fitness::Scored);

            candidates.push(CandidateTransform::new(fitness, correspondences, transform));
        }

        // first minimum wins on ties
        let best = candidates
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, Fitness)>, (i, c)| match best {
                Some((_, fitness)) if c.fitness.total_cmp(&fitness).is_ge() => best,
                _ => Some((i, c.fitness)),
            });
        if let Some((i, _)) = best {
            candidates.swap(0, i);
        }

        candidates
    }
}
