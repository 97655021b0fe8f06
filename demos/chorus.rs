// pluck-synth -- plucked string synthesis from chord charts
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Strums a chorus on a ukulele and writes it to `chorus.wav`.

use std::error::Error;
use std::path::Path;

use pluck_synth::instrument::{Chord, Instrument, StringTuning};
use pluck_synth::output;
use pluck_synth::processing;
use pluck_synth::stroke::Velocity;
use pluck_synth::synth::Synthesizer;
use pluck_synth::temporal::{Time, Timeline};
use pluck_synth::track::AudioTrack;

fn main() -> Result<(), Box<dyn Error>> {
    simple_logger::init_with_level(log::Level::Info)?;

    let tuning = StringTuning::from_notes(&["A4", "E4", "C4", "G4"])?;
    let ukulele = Instrument::new(tuning, Time::from_secs(5), 0.498)?;
    let mut synth = Synthesizer::new(ukulele);
    let mut track = AudioTrack::new(synth.sample_rate());
    let mut timeline = Timeline::new();

    for (interval, chord, stroke) in strumming_pattern() {
        let samples = synth.strum_strings(&chord, stroke, None)?;
        track.add_at(timeline.instant(), &samples);
        timeline >>= interval;
    }

    let mut samples = track.into_samples();
    processing::normalize(&mut samples);
    output::write_wav(Path::new("chorus.wav"), synth.sample_rate(), &samples)?;
    Ok(())
}

/// Every chord twice with the same six strokes, moving on by a repeating
/// sequence of intervals.
fn strumming_pattern() -> impl Iterator<Item = (Time, Chord, Velocity)> {
    let chords = vec![
        Chord::played(&[0, 0, 0, 3]),
        Chord::played(&[0, 2, 3, 2]),
        Chord::played(&[2, 0, 0, 0]),
        Chord::played(&[2, 0, 1, 0]),
    ];

    let fast = Time::from_millis(10);
    let slow = Time::from_millis(25);
    let strokes = vec![
        Velocity::down(slow),
        Velocity::down(slow),
        Velocity::up(slow),
        Velocity::up(fast),
        Velocity::down(fast),
        Velocity::up(slow),
    ];

    let intervals = vec![650, 450, 750, 200, 400, 250]
        .into_iter()
        .map(Time::from_millis)
        .cycle();

    chords
        .into_iter()
        .flat_map(move |chord| {
            let strokes = strokes.clone();
            (0..2).flat_map(move |_| {
                let chord = chord.clone();
                strokes.clone().into_iter().map(move |stroke| (chord.clone(), stroke))
            })
        })
        .zip(intervals)
        .map(|((chord, stroke), interval)| (interval, chord, stroke))
}
