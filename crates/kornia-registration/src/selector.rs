use crate::{
    aggregator::RankedCandidates,
    params::DuplicatePolicy,
    transform::{relative_transform, rotation_angle, translation_norm},
    CandidateTransform,
};

/// Whether `candidate` is distinct from every candidate already `accepted`.
fn is_distinct(
    candidate: &CandidateTransform,
    accepted: &[CandidateTransform],
    min_angle: f64,
    min_translation: f64,
    policy: DuplicatePolicy,
) -> bool {
    accepted.iter().all(|other| {
        let diff = relative_transform(&candidate.transform, &other.transform);
        !policy.is_duplicate(
            rotation_angle(&diff),
            translation_norm(&diff),
            min_angle,
            min_translation,
        )
    })
}

impl RankedCandidates {
    /// Get the `n` best candidates that are mutually distinct.
    ///
    /// Candidates are visited from best to worst and the walk stops at the
    /// first unscored one.
    ///
    /// # Arguments
    ///
    /// * `n` - Maximum number of candidates to return.
    /// * `min_angle` - Relative rotation in radians at or below which two candidates are close.
    /// * `min_translation` - Relative translation at or below which two candidates are close.
    pub fn get_n_best_candidates(
        &self,
        n: usize,
        min_angle: f64,
        min_translation: f64,
    ) -> Vec<CandidateTransform> {
        let mut selected: Vec<CandidateTransform> = Vec::with_capacity(n);
        if n == 0 {
            return selected;
        }

        for candidate in self.candidates.iter() {
            if !candidate.fitness.is_scored() {
                break;
            }

            if is_distinct(
                candidate,
                &selected,
                min_angle,
                min_translation,
                self.duplicate_policy,
            ) {
                selected.push(candidate.clone());
            }

            if selected.len() == n {
                break;
            }
        }

        selected
    }

    /// Get every mutually distinct candidate whose fitness does not exceed `t`.
    ///
    /// # Arguments
    ///
    /// * `t` - Fitness threshold, inclusive.
    /// * `min_angle` - Relative rotation in radians at or below which two candidates are close.
    /// * `min_translation` - Relative translation at or below which two candidates are close.
    pub fn get_t_best_candidates(
        &self,
        t: f64,
        min_angle: f64,
        min_translation: f64,
    ) -> Vec<CandidateTransform> {
        let mut selected: Vec<CandidateTransform> = Vec::new();

        for candidate in self.candidates.iter() {
            // unscored candidates exceed every threshold
            match candidate.fitness.value() {
                Some(fitness) if fitness <= t => {}
                _ => break,
            }

            if is_distinct(
                candidate,
                &selected,
                min_angle,
                min_translation,
                self.duplicate_policy,
            ) {
                selected.push(candidate.clone());
            }
        }

        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        transform::{axis_angle_to_rotation_matrix, rigid_from_parts},
        CandidateAggregator, Correspondence, Fitness,
    };
    use glam::{DMat4, DVec3};

    fn candidate(fitness: Fitness, id: usize, transform: DMat4) -> CandidateTransform {
        CandidateTransform::new(
            fitness,
            Correspondence::from_quadruples(&[id; 4], &[id; 4]),
            transform,
        )
    }

    fn ids(candidates: &[CandidateTransform]) -> Vec<usize> {
        candidates
            .iter()
            .map(|c| c.correspondences[0].source_index)
            .collect()
    }

    fn translation(x: f64, y: f64) -> DMat4 {
        DMat4::from_translation(DVec3::new(x, y, 0.0))
    }

    fn ranked(candidates: Vec<CandidateTransform>, policy: DuplicatePolicy) -> RankedCandidates {
        let mut aggregator = CandidateAggregator::new(1.0, policy);
        aggregator.push(candidates);
        aggregator.finalize()
    }

    fn five_candidates() -> Vec<CandidateTransform> {
        vec![
            candidate(Fitness::Scored(0.1), 1, translation(0.0, 0.0)),
            candidate(Fitness::Scored(0.2), 2, translation(0.005, 0.0)),
            candidate(Fitness::Scored(0.3), 3, translation(1.0, 0.0)),
            candidate(Fitness::Scored(0.4), 4, translation(2.0, 0.0)),
            candidate(Fitness::Scored(0.5), 5, translation(3.0, 0.0)),
        ]
    }

    #[test]
    fn test_n_best_skips_near_duplicates() {
        let ranked = ranked(five_candidates(), DuplicatePolicy::Both);

        let best = ranked.get_n_best_candidates(2, 0.1, 0.01);
        assert_eq!(ids(&best), vec![1, 3]);

        let all = ranked.get_n_best_candidates(10, 0.1, 0.01);
        assert_eq!(ids(&all), vec![1, 3, 4, 5]);

        assert!(ranked.get_n_best_candidates(0, 0.1, 0.01).is_empty());
    }

    #[test]
    fn test_n_best_stops_at_unscored() {
        let mut candidates = five_candidates();
        candidates.push(candidate(Fitness::Unscored, 6, translation(10.0, 0.0)));
        let ranked = ranked(candidates, DuplicatePolicy::Both);

        let best = ranked.get_n_best_candidates(10, 0.1, 0.01);
        assert_eq!(ids(&best), vec![1, 3, 4, 5]);
    }

    #[test]
    fn test_rotation_only_difference() -> Result<(), Box<dyn std::error::Error>> {
        // same translation, rotated by a quarter turn around the origin
        let rotation = axis_angle_to_rotation_matrix(&[0.0, 0.0, 1.0], std::f64::consts::FRAC_PI_2)?;
        let rotated = rigid_from_parts(rotation, DVec3::ZERO);
        let candidates = vec![
            candidate(Fitness::Scored(0.1), 1, DMat4::IDENTITY),
            candidate(Fitness::Scored(0.2), 2, rotated),
        ];

        let both = ranked(candidates.clone(), DuplicatePolicy::Both);
        assert_eq!(ids(&both.get_n_best_candidates(2, 0.1, 0.01)), vec![1, 2]);

        let either = ranked(candidates, DuplicatePolicy::Either);
        assert_eq!(ids(&either.get_n_best_candidates(2, 0.1, 0.01)), vec![1]);
        Ok(())
    }

    #[test]
    fn test_either_policy_on_translation_only() {
        let ranked = ranked(five_candidates(), DuplicatePolicy::Either);

        // every candidate shares the identity rotation with the first one
        let best = ranked.get_n_best_candidates(3, 0.1, 0.01);
        assert_eq!(ids(&best), vec![1]);
    }

    #[test]
    fn test_t_best() {
        let mut candidates = five_candidates();
        candidates.push(candidate(Fitness::Unscored, 6, translation(10.0, 0.0)));
        let ranked = ranked(candidates, DuplicatePolicy::Both);

        assert_eq!(ids(&ranked.get_t_best_candidates(0.3, 0.1, 0.01)), vec![1, 3]);
        assert_eq!(ids(&ranked.get_t_best_candidates(0.35, 0.1, 0.01)), vec![1, 3]);
        assert_eq!(
            ids(&ranked.get_t_best_candidates(f64::INFINITY, 0.1, 0.01)),
            vec![1, 3, 4, 5]
        );
        assert!(ranked.get_t_best_candidates(0.05, 0.1, 0.01).is_empty());
    }

    #[test]
    fn test_selection_is_pairwise_distinct() {
        let candidates = (0..20)
            .map(|i| {
                let x = (i % 7) as f64 * 0.004;
                candidate(Fitness::Scored(i as f64 / 20.0), i, translation(x, 0.0))
            })
            .collect::<Vec<_>>();
        let ranked = ranked(candidates, DuplicatePolicy::Both);

        for selected in [
            ranked.get_n_best_candidates(20, 0.1, 0.01),
            ranked.get_t_best_candidates(1.0, 0.1, 0.01),
        ] {
            assert!(!selected.is_empty());
            for (i, a) in selected.iter().enumerate() {
                for b in selected.iter().skip(i + 1) {
                    let diff = relative_transform(&b.transform, &a.transform);
                    assert!(!DuplicatePolicy::Both.is_duplicate(
                        rotation_angle(&diff),
                        translation_norm(&diff),
                        0.1,
                        0.01
                    ));
                }
            }
        }
    }
}
