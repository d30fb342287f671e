use rand::{rngs::StdRng, SeedableRng};

use crate::{PointCloud, RegistrationError};

/// Fixed random subset of source indices on which every candidate transform is validated.
///
/// Computed once per run and shared by every scoring call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationSample {
    indices: Vec<usize>,
}

impl ValidationSample {
    /// Draw `sample_size` distinct indices out of `0..num_points`.
    ///
    /// When `sample_size` is zero or not smaller than `num_points`, every index is used.
    pub fn new(num_points: usize, sample_size: usize, seed: Option<u64>) -> Self {
        if sample_size == 0 || num_points <= sample_size {
            return Self::all(num_points);
        }

        let mut rng: StdRng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut indices = rand::seq::index::sample(&mut rng, num_points, sample_size).into_vec();
        indices.sort_unstable();

        Self { indices }
    }

    /// Use every index of a cloud with `num_points` points.
    pub fn all(num_points: usize) -> Self {
        Self {
            indices: (0..num_points).collect(),
        }
    }

    /// Use an explicit set of indices.
    pub fn from_indices(indices: Vec<usize>) -> Self {
        Self { indices }
    }

    /// The sampled indices.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Number of sampled indices.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Whether the sample is empty.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Collect the sampled points out of the source cloud.
    pub fn points(&self, source: &PointCloud) -> Result<Vec<[f64; 3]>, RegistrationError> {
        if self.is_empty() {
            return Err(RegistrationError::EmptyValidationSample);
        }
        source.gather(&self.indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_all_when_small() {
        let sample = ValidationSample::new(5, 10, Some(0));
        assert_eq!(sample.indices(), &[0, 1, 2, 3, 4]);

        let sample = ValidationSample::new(5, 5, Some(0));
        assert_eq!(sample.len(), 5);

        let sample = ValidationSample::new(7, 0, None);
        assert_eq!(sample.len(), 7);
    }

    #[test]
    fn test_sample_subset() {
        let sample = ValidationSample::new(1000, 50, Some(42));
        assert_eq!(sample.len(), 50);

        let mut dedup = sample.indices().to_vec();
        dedup.dedup();
        assert_eq!(dedup.len(), 50);
        assert!(sample.indices().iter().all(|&i| i < 1000));

        // same seed, same sample
        assert_eq!(sample, ValidationSample::new(1000, 50, Some(42)));
    }

    #[test]
    fn test_sample_points() -> Result<(), RegistrationError> {
        let cloud = PointCloud::new(vec![[0.0; 3], [1.0; 3], [2.0; 3]]);
        let sample = ValidationSample::from_indices(vec![2, 1]);
        assert_eq!(sample.points(&cloud)?, vec![[2.0; 3], [1.0; 3]]);

        let empty = ValidationSample::all(0);
        assert!(matches!(
            empty.points(&cloud),
            Err(RegistrationError::EmptyValidationSample)
        ));
        Ok(())
    }
}
