use std::cmp::Ordering;

use glam::DMat4;

/// Four indices into the source cloud anchoring one congruent set search.
pub type BaseQuadruple = [usize; 4];

/// Four indices into the target cloud, positionally aligned with a [`BaseQuadruple`].
pub type MatchQuadruple = [usize; 4];

/// A point-to-point correspondence between the source and the target cloud.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correspondence {
    /// Index of the point in the source cloud.
    pub source_index: usize,
    /// Index of the point in the target cloud.
    pub target_index: usize,
    /// Residual distance of the pair. Zero when created by the evaluator.
    pub distance: f64,
}

impl Correspondence {
    /// Create a correspondence with a zero residual.
    pub fn new(source_index: usize, target_index: usize) -> Self {
        Self {
            source_index,
            target_index,
            distance: 0.0,
        }
    }

    /// Pair every base index with the match index at the same position.
    pub fn from_quadruples(base: &BaseQuadruple, matched: &MatchQuadruple) -> [Self; 4] {
        std::array::from_fn(|i| Self::new(base[i], matched[i]))
    }
}

/// Goodness of fit of a candidate transform. Lower is better.
///
/// `Unscored` marks a candidate whose transform could not be scored. It sorts
/// after every scored value and is never reported as an alignment.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Fitness {
    /// No valid score was computed.
    #[default]
    Unscored,
    /// Normalized score in `[0, 1]`.
    Scored(f64),
}

impl Fitness {
    /// The score value, if any.
    pub fn value(self) -> Option<f64> {
        match self {
            Fitness::Scored(v) => Some(v),
            Fitness::Unscored => None,
        }
    }

    /// Whether a score was computed.
    pub fn is_scored(self) -> bool {
        matches!(self, Fitness::Scored(_))
    }

    /// Whether `value` is a strict improvement over `self`.
    pub fn is_improved_by(self, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        match self {
            Fitness::Unscored => true,
            Fitness::Scored(reference) => value < reference,
        }
    }

    /// Total order used for ranking: scored values first, ascending.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Fitness::Scored(a), Fitness::Scored(b)) => a.total_cmp(b),
            (Fitness::Scored(_), Fitness::Unscored) => Ordering::Less,
            (Fitness::Unscored, Fitness::Scored(_)) => Ordering::Greater,
            (Fitness::Unscored, Fitness::Unscored) => Ordering::Equal,
        }
    }
}

impl PartialOrd for Fitness {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.total_cmp(other))
    }
}

/// A rigid transform hypothesis together with its score and the correspondences it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateTransform {
    /// Fitness of the transform against the target cloud.
    pub fitness: Fitness,
    /// The four correspondences the transform was estimated from.
    pub correspondences: [Correspondence; 4],
    /// Rigid transform mapping source points into the target frame.
    pub transform: DMat4,
}

impl CandidateTransform {
    /// Create a new candidate.
    pub fn new(fitness: Fitness, correspondences: [Correspondence; 4], transform: DMat4) -> Self {
        Self {
            fitness,
            correspondences,
            transform,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correspondences_from_quadruples() {
        let corrs = Correspondence::from_quadruples(&[0, 1, 2, 3], &[10, 11, 12, 13]);
        for (i, c) in corrs.iter().enumerate() {
            assert_eq!(c.source_index, i);
            assert_eq!(c.target_index, 10 + i);
            assert_eq!(c.distance, 0.0);
        }
    }

    #[test]
    fn test_fitness_ordering() {
        let mut scores = [
            Fitness::Unscored,
            Fitness::Scored(0.4),
            Fitness::Scored(0.1),
            Fitness::Unscored,
            Fitness::Scored(0.0),
        ];
        scores.sort_by(Fitness::total_cmp);
        assert_eq!(
            scores,
            [
                Fitness::Scored(0.0),
                Fitness::Scored(0.1),
                Fitness::Scored(0.4),
                Fitness::Unscored,
                Fitness::Unscored,
            ]
        );
    }

    #[test]
    fn test_fitness_improvement() {
        assert!(Fitness::Unscored.is_improved_by(1.0));
        assert!(!Fitness::Unscored.is_improved_by(f64::NAN));
        assert!(!Fitness::Unscored.is_improved_by(f64::INFINITY));
        assert!(Fitness::Scored(0.5).is_improved_by(0.2));
        assert!(!Fitness::Scored(0.5).is_improved_by(0.5));
        assert!(!Fitness::Scored(0.5).is_improved_by(0.7));
    }
}
