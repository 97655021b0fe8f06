// pluck-synth -- plucked string synthesis from chord charts
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Turning strummed chords into waveforms with the Karplus-Strong algorithm.
//!
//! Every string is modelled as a delay line one period long, filled with a
//! burst of noise. Playing back the delay line while low-pass filtering it
//! into itself gives a pitched tone whose higher harmonics die out first,
//! much like a real plucked string.

use std::collections::HashMap;

use log::trace;
use snafu::{ResultExt, Snafu};

use crate::burst::{BurstGenerator, WhiteNoise};
use crate::instrument::{Chord, Instrument, InstrumentError};
use crate::processing;
use crate::stroke::{Direction, Velocity};
use crate::temporal::Time;

/// Sampling rate of audio CDs, used unless configured otherwise.
pub const AUDIO_CD_SAMPLING_RATE: u32 = 44100;

#[derive(Debug, Clone, PartialEq, Snafu)]
pub enum SynthError {
    #[snafu(display("Cannot vibrate at {} Hz, frequency must be positive", frequency))]
    InvalidFrequency { frequency: f64 },
    #[snafu(display("Damping must be between 0 and 0.5, got {}", damping))]
    InvalidDamping { damping: f64 },
    #[snafu(display(
        "{} Hz is too high to be sampled at {} Hz",
        frequency,
        sample_rate
    ))]
    EmptyBurst { frequency: f64, sample_rate: u32 },
    #[snafu(display("Burst generator returned {} samples instead of {}", actual, expected))]
    BurstLength { expected: usize, actual: usize },
    #[snafu(display("Cannot strum chord: {}", source))]
    Fretting { source: InstrumentError },
}

/// Identifies the vibration of one string. Floats are keyed by their bits,
/// which is exact equality for everything but NaN, and NaN never gets here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct VibrationKey {
    frequency: u64,
    duration: Time,
    damping: u64,
}

type StrumKey = (Chord, Velocity, Time);

/// Plays an instrument.
///
/// Results are cached, so strumming the same chord the same way twice yields
/// the very same waveform without computing it again.
pub struct Synthesizer<B = WhiteNoise> {
    instrument: Instrument,
    burst_generator: B,
    sample_rate: u32,
    strums: HashMap<StrumKey, Vec<f64>>,
    vibrations: HashMap<VibrationKey, Vec<f64>>,
}

impl Synthesizer<WhiteNoise> {
    /// A synthesizer plucking with unseeded white noise at CD quality.
    pub fn new(instrument: Instrument) -> Self {
        Self::with_burst_generator(instrument, WhiteNoise::new())
    }
}

impl<B: BurstGenerator> Synthesizer<B> {
    pub fn with_burst_generator(instrument: Instrument, burst_generator: B) -> Self {
        Self {
            instrument,
            burst_generator,
            sample_rate: AUDIO_CD_SAMPLING_RATE,
            strums: HashMap::new(),
            vibrations: HashMap::new(),
        }
    }

    /// # Panics
    ///
    /// Panics if the sample rate is zero.
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        assert!(sample_rate > 0, "Sample rate must be positive");
        self.sample_rate = sample_rate;
        self.clear_cache();
        self
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Forget all previously computed waveforms.
    pub fn clear_cache(&mut self) {
        self.strums.clear();
        self.vibrations.clear();
    }

    /// Strum a chord, letting every string ring for `vibration`, or for the
    /// instrument's default vibration if not given.
    ///
    /// The strings start one `velocity.delay` after another, in the order
    /// given by the direction of the strum.
    pub fn strum_strings(
        &mut self,
        chord: &Chord,
        velocity: Velocity,
        vibration: Option<Time>,
    ) -> Result<Vec<f64>, SynthError> {
        let vibration = vibration.unwrap_or_else(|| self.instrument.vibration());
        let key = (chord.clone(), velocity, vibration);
        if let Some(samples) = self.strums.get(&key) {
            trace!("strum {} {:?}: cached", chord, velocity.direction);
            return Ok(samples.clone());
        }

        let pitches = match velocity.direction {
            Direction::Up => self.instrument.upstroke(chord),
            Direction::Down => self.instrument.downstroke(chord),
        }
        .context(Fretting)?;
        trace!(
            "strum {} {:?} with delay {}: {} strings for {}",
            chord,
            velocity.direction,
            velocity.delay,
            pitches.len(),
            vibration
        );

        let damping = self.instrument.damping();
        let waveforms = pitches
            .iter()
            .map(|pitch| self.vibrate(pitch.frequency(), vibration, damping))
            .collect::<Result<Vec<_>, _>>()?;
        let samples = self.overlay(&waveforms, velocity.delay);

        self.strums.insert(key, samples.clone());
        Ok(samples)
    }

    /// The sound of a single string, `duration` long, normalized to a peak of 1.
    pub fn vibrate(
        &mut self,
        frequency: f64,
        duration: Time,
        damping: f64,
    ) -> Result<Vec<f64>, SynthError> {
        let key = VibrationKey {
            frequency: frequency.to_bits(),
            duration,
            damping: damping.to_bits(),
        };
        if let Some(samples) = self.vibrations.get(&key) {
            return Ok(samples.clone());
        }
        let samples = self.render_vibration(frequency, duration, damping)?;
        self.vibrations.insert(key, samples.clone());
        Ok(samples)
    }

    fn render_vibration(
        &mut self,
        frequency: f64,
        duration: Time,
        damping: f64,
    ) -> Result<Vec<f64>, SynthError> {
        if !(frequency.is_finite() && frequency > 0.0) {
            return Err(SynthError::InvalidFrequency { frequency });
        }
        if !(damping > 0.0 && damping <= 0.5) {
            return Err(SynthError::InvalidDamping { damping });
        }

        let period = (f64::from(self.sample_rate) / frequency).round();
        if period < 1.0 {
            return Err(SynthError::EmptyBurst {
                frequency,
                sample_rate: self.sample_rate,
            });
        }
        let period = period as usize;

        let mut delay_line = self.burst_generator.burst(period, self.sample_rate);
        if delay_line.len() != period {
            return Err(SynthError::BurstLength {
                expected: period,
                actual: delay_line.len(),
            });
        }

        let num_samples = duration.get_num_samples(self.sample_rate);
        trace!(
            "vibrate {:.2} Hz: period {} samples, {} samples total",
            frequency,
            period,
            num_samples
        );
        let mut samples = karplus_strong(&mut delay_line, num_samples, damping);
        processing::remove_dc(&mut samples);
        processing::normalize(&mut samples);
        Ok(samples)
    }

    /// Mix waveforms so that each one starts `delay` after the previous one.
    ///
    /// Overlapping parts are added up. With a zero delay, all waveforms start
    /// at the same time.
    pub fn overlay(&self, waveforms: &[Vec<f64>], delay: Time) -> Vec<f64> {
        let delay_samples = delay.get_num_samples(self.sample_rate);
        let length = waveforms
            .iter()
            .enumerate()
            .map(|(index, waveform)| index * delay_samples + waveform.len())
            .max()
            .unwrap_or(0);

        let mut output = vec![0.0; length];
        for (index, waveform) in waveforms.iter().enumerate() {
            let offset = index * delay_samples;
            for (target, sample) in output[offset..offset + waveform.len()]
                .iter_mut()
                .zip(waveform)
            {
                *target += sample;
            }
        }
        output
    }
}

/// Emit `num_samples` samples from the delay line, replacing every emitted
/// sample with the average of itself and its successor, scaled by
/// `2 * damping`.
///
/// The successor is read before it is overwritten in the same step, so a
/// delay line of length one simply decays by `2 * damping` per sample.
fn karplus_strong(delay_line: &mut [f64], num_samples: usize, damping: f64) -> Vec<f64> {
    let period = delay_line.len();
    let mut output = Vec::with_capacity(num_samples);
    for index in (0..period).cycle().take(num_samples) {
        let current = delay_line[index];
        let next = delay_line[(index + 1) % period];
        output.push(current);
        delay_line[index] = (current + next) * damping;
    }
    output
}
