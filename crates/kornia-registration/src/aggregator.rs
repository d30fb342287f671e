use glam::DMat4;

use crate::{params::DuplicatePolicy, CandidateTransform, Correspondence};

/// Collects the candidates of independent base quadruple searches.
///
/// Lists can be pushed in any order, e.g. as they come back from worker
/// threads. [`CandidateAggregator::finalize`] consumes the aggregator and sorts
/// everything once.
#[derive(Debug, Clone)]
pub struct CandidateAggregator {
    candidates: Vec<CandidateTransform>,
    score_threshold: f64,
    duplicate_policy: DuplicatePolicy,
}

impl CandidateAggregator {
    /// Create an empty aggregator.
    ///
    /// # Arguments
    ///
    /// * `score_threshold` - The best candidate converged if its fitness is below this value.
    /// * `duplicate_policy` - Policy used later on to extract distinct candidates.
    pub fn new(score_threshold: f64, duplicate_policy: DuplicatePolicy) -> Self {
        Self {
            candidates: Vec::new(),
            score_threshold,
            duplicate_policy,
        }
    }

    /// Append the candidates of one base quadruple.
    pub fn push(&mut self, candidates: Vec<CandidateTransform>) {
        self.candidates.extend(candidates);
    }

    /// Number of candidates collected so far.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Whether no candidate was collected.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Sort all candidates by fitness and decide convergence.
    ///
    /// The sort is stable, so equal scores keep their insertion order.
    pub fn finalize(self) -> RankedCandidates {
        let mut candidates = self.candidates;
        candidates.sort_by(|a, b| a.fitness.total_cmp(&b.fitness));

        let best_fitness = candidates.first().and_then(|c| c.fitness.value());
        let converged = match best_fitness {
            Some(fitness) => {
                log::debug!(
                    "best score is {fitness}, out of {} candidate solutions",
                    candidates.len()
                );
                fitness < self.score_threshold
            }
            None => {
                log::debug!(
                    "no valid score out of {} candidate solutions",
                    candidates.len()
                );
                false
            }
        };

        RankedCandidates {
            candidates,
            converged,
            duplicate_policy: self.duplicate_policy,
        }
    }
}

impl Extend<Vec<CandidateTransform>> for CandidateAggregator {
    fn extend<I: IntoIterator<Item = Vec<CandidateTransform>>>(&mut self, iter: I) {
        for candidates in iter {
            self.push(candidates);
        }
    }
}

/// All candidates of a run, sorted by ascending fitness. Read only.
#[derive(Debug, Clone)]
pub struct RankedCandidates {
    pub(crate) candidates: Vec<CandidateTransform>,
    pub(crate) converged: bool,
    pub(crate) duplicate_policy: DuplicatePolicy,
}

impl RankedCandidates {
    /// Whether the best candidate has a valid score below the threshold.
    pub fn has_converged(&self) -> bool {
        self.converged
    }

    /// The best scored candidate, if any candidate was scored.
    pub fn best(&self) -> Option<&CandidateTransform> {
        self.candidates.first().filter(|c| c.fitness.is_scored())
    }

    /// Fitness of the best candidate.
    pub fn fitness_score(&self) -> Option<f64> {
        self.best().and_then(|c| c.fitness.value())
    }

    /// Transform of the best candidate.
    pub fn final_transformation(&self) -> Option<DMat4> {
        self.best().map(|c| c.transform)
    }

    /// Correspondences of the best candidate.
    pub fn correspondences(&self) -> Option<&[Correspondence; 4]> {
        self.best().map(|c| &c.correspondences)
    }

    /// All candidates, best first.
    pub fn candidates(&self) -> &[CandidateTransform] {
        &self.candidates
    }

    /// Policy used to detect near-identical candidates.
    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.duplicate_policy
    }

    /// Total number of candidates, scored or not.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Whether there is no candidate at all.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}
