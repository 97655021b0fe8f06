// pluck-synth -- plucked string synthesis from chord charts
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Sources of the initial excitation of a string.

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Produces the burst of energy a string is plucked with.
///
/// Implementations must return exactly `num_samples` samples. Any closure
/// `FnMut(usize, u32) -> Vec<f64>` is a burst generator, which makes it easy to
/// pluck with a fixed shape.
///
/// ```
/// # use pluck_synth::burst::BurstGenerator;
/// let mut impulse = |n: usize, _rate: u32| {
///     let mut burst = vec![0.0; n];
///     burst[0] = 1.0;
///     burst
/// };
/// assert_eq!(impulse.burst(3, 44100), vec![1.0, 0.0, 0.0]);
/// ```
pub trait BurstGenerator {
    fn burst(&mut self, num_samples: usize, sample_rate: u32) -> Vec<f64>;
}

impl<F: FnMut(usize, u32) -> Vec<f64>> BurstGenerator for F {
    fn burst(&mut self, num_samples: usize, sample_rate: u32) -> Vec<f64> {
        self(num_samples, sample_rate)
    }
}

/// Uniformly distributed noise in `[-1, 1]`.
#[derive(Debug, Clone)]
pub struct WhiteNoise {
    rng: StdRng,
}

impl WhiteNoise {
    /// Noise seeded from the operating system.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Noise that is the same on every run.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for WhiteNoise {
    fn default() -> Self {
        Self::new()
    }
}

impl BurstGenerator for WhiteNoise {
    fn burst(&mut self, num_samples: usize, _sample_rate: u32) -> Vec<f64> {
        let range = Uniform::new_inclusive(-1.0, 1.0);
        (0..num_samples).map(|_| range.sample(&mut self.rng)).collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn noise_in_range() {
        let burst = WhiteNoise::new().burst(1000, 44100);
        assert_eq!(burst.len(), 1000);
        assert!(burst.iter().all(|x| (-1.0..=1.0).contains(x)));
        // not all the same value
        assert!(burst.iter().any(|&x| x != burst[0]));
    }

    #[test]
    fn seeded_noise_repeats() {
        let a = WhiteNoise::seeded(7).burst(100, 44100);
        let b = WhiteNoise::seeded(7).burst(100, 44100);
        let c = WhiteNoise::seeded(8).burst(100, 44100);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn empty_burst() {
        assert!(WhiteNoise::seeded(1).burst(0, 44100).is_empty());
    }
}
