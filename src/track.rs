// pluck-synth -- plucked string synthesis from chord charts
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! A growing mono buffer that waveforms are mixed into at given times.

use crate::rational::Rational;
use crate::temporal::Time;

#[derive(Debug, Clone, PartialEq)]
pub struct AudioTrack {
    sampling_rate: u32,
    samples: Vec<f64>,
}

impl AudioTrack {
    /// # Panics
    ///
    /// Panics if the sampling rate is zero.
    pub fn new(sampling_rate: u32) -> Self {
        assert!(sampling_rate > 0, "Sampling rate must be positive");
        Self {
            sampling_rate,
            samples: Vec::new(),
        }
    }

    pub fn sampling_rate(&self) -> u32 {
        self.sampling_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Exact length of the track.
    ///
    /// ```
    /// # use pluck_synth::{temporal::Time, track::AudioTrack};
    /// let mut track = AudioTrack::new(44100);
    /// track.add(&[0.0; 22050]);
    /// assert_eq!(track.duration(), Time::from_millis(500));
    /// ```
    pub fn duration(&self) -> Time {
        Time::from_rational(Rational::new(
            self.samples.len() as i64,
            i64::from(self.sampling_rate),
        ))
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f64> {
        self.samples
    }

    /// Append samples at the end of the track.
    pub fn add(&mut self, samples: &[f64]) {
        self.samples.extend_from_slice(samples);
    }

    /// Mix samples into the track, starting at `instant`.
    ///
    /// Gaps before `instant` are filled with silence. Where the new samples
    /// overlap existing ones, both are added up. Nothing that was written
    /// before is ever cut off.
    pub fn add_at(&mut self, instant: Time, samples: &[f64]) {
        let offset = instant.get_num_samples(self.sampling_rate);
        if offset >= self.samples.len() {
            self.samples.resize(offset, 0.0);
            self.add(samples);
            return;
        }

        let end = offset + samples.len();
        if end > self.samples.len() {
            self.samples.resize(end, 0.0);
        }
        for (target, sample) in self.samples[offset..end].iter_mut().zip(samples) {
            *target += sample;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn track() -> AudioTrack {
        AudioTrack::new(44100)
    }

    #[test]
    fn add_appends() {
        let mut track = track();
        assert!(track.is_empty());
        track.add(&[1.0; 100]);
        assert_eq!(track.len(), 100);
        track.add(&[2.0; 200]);
        assert_eq!(track.len(), 300);
        assert_eq!(track.samples()[99..101], [1.0, 2.0]);
    }

    #[test]
    fn duration() {
        let mut track = track();
        track.add(&[1.0; 44100]);
        assert_eq!(track.duration(), Time::from_secs(1));
    }

    #[test]
    fn add_at_end_and_later() {
        let mut track = track();
        track.add_at(Time::ZERO, &[1.0; 100]);
        assert_eq!(track.samples(), &[1.0; 100][..]);

        track.add_at(Time::from_millis(500), &[2.0; 100]);
        assert_eq!(track.len(), 22150);
        assert!(track.samples()[100..22050].iter().all(|&s| s == 0.0));
        assert!(track.samples()[22050..].iter().all(|&s| s == 2.0));

        track.add_at(Time::from_secs(5), &[3.0; 100]);
        assert_eq!(track.len(), 220600);
        assert!(track.samples()[220500..].iter().all(|&s| s == 3.0));
    }

    #[test]
    fn add_at_earlier_accumulates() {
        let mut track = track();
        track.add_at(Time::ZERO, &[1.0; 100]);
        track.add_at(Time::from_millis(100), &[4.0; 100]);
        track.add_at(Time::from_millis(200), &[5.0; 100]);
        track.add_at(Time::ZERO, &[0.5; 50]);
        assert_eq!(track.len(), 8920);
        assert!(track.samples()[..50].iter().all(|&s| s == 1.5));
        assert!(track.samples()[50..100].iter().all(|&s| s == 1.0));
        assert!(track.samples()[4410..4510].iter().all(|&s| s == 4.0));
        assert!(track.samples()[8820..8920].iter().all(|&s| s == 5.0));
    }

    #[test]
    fn add_at_earlier_extends_past_end() {
        let mut track = track();
        track.add(&[1.0; 10]);
        track.add_at(Time::from_rational(Rational::new(5, 44100)), &[1.0; 10]);
        assert_eq!(track.len(), 15);
        assert_eq!(track.samples()[..5], [1.0; 5]);
        assert_eq!(track.samples()[5..10], [2.0; 5]);
        assert_eq!(track.samples()[10..], [1.0; 5]);
    }

    #[test]
    fn order_does_not_matter() {
        let a = [0.25, 0.5, 0.75];
        let b = [1.0, 2.0, 4.0, 8.0];
        let at_a = Time::from_rational(Rational::new(2, 44100));
        let at_b = Time::from_rational(Rational::new(4, 44100));
        let far = Time::from_millis(10);

        let mut forward = track();
        forward.add_at(at_a, &a);
        forward.add_at(at_b, &b);
        forward.add_at(far, &a);
        let mut backward = track();
        backward.add_at(far, &a);
        backward.add_at(at_b, &b);
        backward.add_at(at_a, &a);
        assert_eq!(forward, backward);
        assert_eq!(forward.samples()[4], 0.75 + 1.0);
    }
}
