// pluck-synth -- plucked string synthesis from chord charts
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Whole-buffer post processing.

/// Subtract the mean from every sample.
pub fn remove_dc(samples: &mut [f64]) {
    if samples.is_empty() {
        return;
    }
    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    samples.iter_mut().for_each(|s| *s -= mean);
}

/// The largest absolute sample value, 0 for an empty buffer.
pub fn peak(samples: &[f64]) -> f64 {
    samples.iter().fold(0.0, |peak, s| s.abs().max(peak))
}

/// Scale the samples so that the peak is exactly 1.
///
/// Silence stays silence instead of turning into NaN.
///
/// ```
/// # use pluck_synth::processing::*;
/// let mut samples = vec![0.5, -0.25];
/// normalize(&mut samples);
/// assert_eq!(samples, vec![1.0, -0.5]);
///
/// let mut silence = vec![0.0; 3];
/// normalize(&mut silence);
/// assert_eq!(silence, vec![0.0; 3]);
/// ```
pub fn normalize(samples: &mut [f64]) {
    let peak = peak(samples);
    if peak > 0.0 {
        samples.iter_mut().for_each(|s| *s /= peak);
    }
}

/// Sum weighted tracks of possibly different lengths and normalize the result.
/// Shorter tracks count as silent after their end.
pub fn mix_down(tracks: &[(f64, &[f64])]) -> Vec<f64> {
    let length = tracks.iter().map(|(_, t)| t.len()).max().unwrap_or(0);
    let mut mix = vec![0.0; length];
    for &(weight, track) in tracks {
        for (target, sample) in mix.iter_mut().zip(track) {
            *target += weight * sample;
        }
    }
    normalize(&mut mix);
    mix
}
