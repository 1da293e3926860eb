//! Seedable noise source for simulated sensors.

use rand::prelude::*;
use rand::rngs::SmallRng;
use rand_distr::{StandardNormal, Uniform};

/// Gaussian noise generator with optional deterministic seeding.
#[derive(Debug, Clone)]
pub struct NoiseGenerator {
    rng: SmallRng,
}

impl NoiseGenerator {
    /// Seeded generator, or entropy-seeded when `seed` is `None`.
    #[must_use]
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Self { rng }
    }

    /// Zero-mean Gaussian sample with the given standard deviation.
    #[inline]
    pub fn gaussian(&mut self, stddev: f64) -> f64 {
        if stddev == 0.0 {
            return 0.0;
        }
        let n: f64 = self.rng.sample(StandardNormal);
        n * stddev
    }

    /// Standard-normal sample from the polar Box-Muller transform.
    pub fn polar_box_muller(&mut self) -> f64 {
        let unit = Uniform::new(-1.0f64, 1.0);
        loop {
            let x1 = self.rng.sample(unit);
            let x2 = self.rng.sample(unit);
            let w = x1 * x1 + x2 * x2;
            if w > 0.0 && w < 1.0 {
                return x1 * ((-2.0 * w.ln()) / w).sqrt();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_seed() {
        let mut noise1 = NoiseGenerator::new(Some(42));
        let mut noise2 = NoiseGenerator::new(Some(42));

        for _ in 0..100 {
            assert_eq!(noise1.gaussian(1.0), noise2.gaussian(1.0));
            assert_eq!(noise1.polar_box_muller(), noise2.polar_box_muller());
        }
    }

    #[test]
    fn test_zero_stddev() {
        let mut noise = NoiseGenerator::new(Some(42));
        for _ in 0..10 {
            assert_eq!(noise.gaussian(0.0), 0.0);
        }
    }

    #[test]
    fn test_box_muller_moments() {
        let mut noise = NoiseGenerator::new(Some(7));
        let samples: Vec<f64> = (0..20_000).map(|_| noise.polar_box_muller()).collect();
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let var = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / samples.len() as f64;

        assert!(mean.abs() < 0.05, "mean {mean}");
        assert!((var - 1.0).abs() < 0.05, "variance {var}");
    }
}
