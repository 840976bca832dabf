//! Bounded noise source standing in for model variability.
//!
//! The scorer contract is deterministic; noise is an explicit, seedable,
//! bounded parameter that defaults to zero. A production deployment swaps
//! the weighted-sum scorer for a real model and leaves this off.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Uniform jitter in `[-amplitude, +amplitude]`.
pub struct NoiseSource {
    amplitude: f64,
    rng: Option<Mutex<StdRng>>,
}

impl NoiseSource {
    /// Create a noise source. Amplitude 0.0 disables sampling entirely.
    pub fn new(amplitude: f64, seed: Option<u64>) -> Self {
        if amplitude <= 0.0 {
            return Self::disabled();
        }

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            amplitude,
            rng: Some(Mutex::new(rng)),
        }
    }

    /// A source that always returns 0.0.
    pub fn disabled() -> Self {
        Self {
            amplitude: 0.0,
            rng: None,
        }
    }

    /// Draw one jitter sample.
    pub fn sample(&self) -> f64 {
        match &self.rng {
            Some(rng) => rng
                .lock()
                .map(|mut rng| rng.gen_range(-self.amplitude..=self.amplitude))
                .unwrap_or(0.0),
            None => 0.0,
        }
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_source_is_silent() {
        let noise = NoiseSource::disabled();
        for _ in 0..10 {
            assert_eq!(noise.sample(), 0.0);
        }

        let noise = NoiseSource::new(0.0, Some(7));
        assert_eq!(noise.sample(), 0.0);
    }

    #[test]
    fn test_samples_stay_within_bounds() {
        let noise = NoiseSource::new(0.1, Some(42));
        for _ in 0..1000 {
            let sample = noise.sample();
            assert!((-0.1..=0.1).contains(&sample));
        }
    }

    #[test]
    fn test_seeded_sources_reproduce() {
        let a = NoiseSource::new(0.1, Some(42));
        let b = NoiseSource::new(0.1, Some(42));

        for _ in 0..50 {
            assert_eq!(a.sample(), b.sample());
        }
    }
}
