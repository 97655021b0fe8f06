// pluck-synth -- plucked string synthesis from chord charts
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Songs written as tablature, and playing them.
//!
//! A song is a JSON document with one or more tracks. Each track names an
//! instrument and a tablature of measures:
//!
//! ```json
//! {
//!   "title": "Chorus",
//!   "tracks": {
//!     "ukulele": {
//!       "instrument": { "tuning": ["A4", "E4", "C4", "G4"], "vibration": 5.0, "damping": 0.498 },
//!       "tablature": {
//!         "beats_per_minute": 75,
//!         "measures": [
//!           { "time_signature": "4/4", "notes": [
//!             { "frets": [0, 0, 0, 3] },
//!             { "frets": [0, 0, 0, 3], "offset": "1/4", "upstroke": true }
//!           ] }
//!         ]
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! The `offset` of a note is the fraction of a whole note since the previous
//! note of the same measure, or since the start of the measure for the first.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{debug, info, trace, warn};
use serde::Deserialize;
use snafu::{ResultExt, Snafu};

use crate::burst::{BurstGenerator, WhiteNoise};
use crate::instrument::{Chord, Instrument, InstrumentError, StringTuning, DEFAULT_DAMPING};
use crate::processing;
use crate::rational::Rational;
use crate::stroke::Velocity;
use crate::synth::{SynthError, Synthesizer};
use crate::temporal::{MeasuredTimeline, Time, TimeError};
use crate::track::AudioTrack;

/// Delay between two strings of a strum when the note does not say otherwise.
pub const DEFAULT_ARPEGGIO_SECONDS: f64 = 0.005;

#[derive(Debug, Snafu)]
pub enum TablatureError {
    #[snafu(display("Could not read song {}: {}", path.display(), source))]
    ReadSong {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Malformed song description: {}", source))]
    ParseSong { source: serde_json::Error },
    #[snafu(display("Track {:?}: beats per minute must be positive", track))]
    InvalidTempo { track: String },
    #[snafu(display("Track {:?}: expected a fraction like 3/4, got {:?}", track, fraction))]
    InvalidFraction { track: String, fraction: String },
    #[snafu(display(
        "Track {:?}: note has {} frets but the tuning has {} strings",
        track,
        actual,
        expected
    ))]
    FretCount {
        track: String,
        expected: usize,
        actual: usize,
    },
    #[snafu(display("Track {:?}: {} out of range: {}", track, what, value))]
    OutOfRange {
        track: String,
        what: &'static str,
        value: f64,
    },
    #[snafu(display("Track {:?}: {}", track, source))]
    InvalidInstrument {
        track: String,
        source: InstrumentError,
    },
    #[snafu(display("Track {:?}: {}", track, source))]
    InvalidTime { track: String, source: TimeError },
    #[snafu(display("Track {:?}: {}", track, source))]
    Synthesis { track: String, source: SynthError },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Song {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub tracks: BTreeMap<String, Track>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Track {
    /// Where the tablature was transcribed from.
    pub url: Option<String>,
    /// Loudness of the track relative to the others in the mix.
    #[serde(default = "default_weight")]
    pub weight: f64,
    pub instrument: InstrumentSpec,
    pub tablature: Tablature,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InstrumentSpec {
    /// Note names, conventionally starting with the highest string.
    pub tuning: Vec<String>,
    /// Seconds a string rings after being plucked.
    pub vibration: f64,
    #[serde(default = "default_damping")]
    pub damping: f64,
    /// Post-processing effects. Accepted for compatibility but not applied.
    #[serde(default)]
    pub effects: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Tablature {
    pub beats_per_minute: u32,
    pub measures: Vec<Measure>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Measure {
    /// Beats per measure and note value of a beat, e.g. `3/4`.
    pub time_signature: String,
    #[serde(default)]
    pub notes: Vec<Note>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Note {
    /// One entry per string, `null` for strings that are not played.
    pub frets: Vec<Option<u32>>,
    /// Fraction of a whole note since the previous note.
    #[serde(default = "default_offset")]
    pub offset: String,
    #[serde(default)]
    pub upstroke: bool,
    /// Seconds between adjacent strings of the strum.
    #[serde(default = "default_arpeggio")]
    pub arpeggio: f64,
    /// Seconds the strings ring, overriding the instrument.
    pub vibration: Option<f64>,
}

fn default_weight() -> f64 {
    1.0
}

fn default_damping() -> f64 {
    DEFAULT_DAMPING
}

fn default_offset() -> String {
    "0/1".to_owned()
}

fn default_arpeggio() -> f64 {
    DEFAULT_ARPEGGIO_SECONDS
}

impl Song {
    /// Parse and validate a song.
    pub fn from_json(json: &str) -> Result<Song, TablatureError> {
        let song: Song = serde_json::from_str(json).context(ParseSong)?;
        song.validate()?;
        Ok(song)
    }

    pub fn load(path: &Path) -> Result<Song, TablatureError> {
        let json = std::fs::read_to_string(path).context(ReadSong { path })?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), TablatureError> {
        for (name, track) in &self.tracks {
            track.validate(name)?;
        }
        Ok(())
    }
}

impl Track {
    /// Check everything that would otherwise only fail halfway through rendering.
    pub fn validate(&self, name: &str) -> Result<(), TablatureError> {
        if !(self.weight >= 0.0 && self.weight.is_finite()) {
            return Err(TablatureError::OutOfRange {
                track: name.to_owned(),
                what: "weight",
                value: self.weight,
            });
        }
        let instrument = self.instrument.build(name)?;

        for (_, note) in schedule(name, &self.tablature)? {
            if note.frets.len() != instrument.num_strings() {
                return Err(TablatureError::FretCount {
                    track: name.to_owned(),
                    expected: instrument.num_strings(),
                    actual: note.frets.len(),
                });
            }
            if !(note.arpeggio >= 0.0 && note.arpeggio.is_finite()) {
                return Err(TablatureError::OutOfRange {
                    track: name.to_owned(),
                    what: "arpeggio",
                    value: note.arpeggio,
                });
            }
            if let Some(vibration) = note.vibration {
                positive(name, "vibration", vibration)?;
            }
            strum_times(name, note)?;
        }
        Ok(())
    }
}

impl InstrumentSpec {
    pub fn build(&self, track: &str) -> Result<Instrument, TablatureError> {
        positive(track, "vibration", self.vibration)?;
        let vibration = Time::new(self.vibration).context(InvalidTime { track })?;
        let tuning = StringTuning::from_notes(&self.tuning[..]).context(InvalidInstrument { track })?;
        Instrument::new(tuning, vibration, self.damping).context(InvalidInstrument { track })
    }
}

fn positive(track: &str, what: &'static str, value: f64) -> Result<(), TablatureError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(TablatureError::OutOfRange {
            track: track.to_owned(),
            what,
            value,
        })
    }
}

/// Split `N/D` into its unreduced parts, where D must not be zero.
fn parse_fraction(fraction: &str) -> Option<(u32, u32)> {
    let (num, denom) = fraction.split_once('/')?;
    let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(num) || !all_digits(denom) {
        return None;
    }
    let denom = denom.parse().ok().filter(|&d| d != 0)?;
    Some((num.parse().ok()?, denom))
}

fn fraction(track: &str, fraction: &str) -> Result<(u32, u32), TablatureError> {
    parse_fraction(fraction).ok_or_else(|| TablatureError::InvalidFraction {
        track: track.to_owned(),
        fraction: fraction.to_owned(),
    })
}

/// The instant every note of a tablature starts at, in order.
fn schedule<'a>(
    name: &str,
    tablature: &'a Tablature,
) -> Result<Vec<(Time, &'a Note)>, TablatureError> {
    if tablature.beats_per_minute == 0 {
        return Err(TablatureError::InvalidTempo {
            track: name.to_owned(),
        });
    }
    let beat = Time::from_rational(Rational::new(60, i64::from(tablature.beats_per_minute)));

    let mut notes = Vec::new();
    let mut timeline = MeasuredTimeline::default();
    for (index, measure) in tablature.measures.iter().enumerate() {
        let (beats_per_measure, note_value) = fraction(name, &measure.time_signature)?;
        let measure_length = beat
            .checked_mul(i64::from(beats_per_measure))
            .context(InvalidTime { track: name })?;
        timeline.set_measure(measure_length);
        let whole_note = beat
            .checked_mul(i64::from(note_value))
            .context(InvalidTime { track: name })?;
        debug!(
            "track {:?}: measure {} at {} in {}",
            name,
            index,
            timeline.instant(),
            measure.time_signature
        );

        for note in &measure.notes {
            let (num, denom) = fraction(name, &note.offset)?;
            let offset = whole_note
                .checked_mul(Rational::new(num.into(), denom.into()))
                .context(InvalidTime { track: name })?;
            let instant = timeline
                .checked_advance(offset)
                .context(InvalidTime { track: name })?
                .instant();
            notes.push((instant, note));
        }
        timeline
            .next_measure()
            .context(InvalidTime { track: name })?;
    }
    Ok(notes)
}

/// How a note is strummed and how long its strings ring, if it says so.
fn strum_times(name: &str, note: &Note) -> Result<(Velocity, Option<Time>), TablatureError> {
    let delay = Time::new(note.arpeggio).context(InvalidTime { track: name })?;
    let velocity = if note.upstroke {
        Velocity::up(delay)
    } else {
        Velocity::down(delay)
    };
    let vibration = note
        .vibration
        .map(|seconds| Time::new(seconds))
        .transpose()
        .context(InvalidTime { track: name })?;
    Ok((velocity, vibration))
}

/// Play every note of a track in order and collect the result.
pub fn play_track<B: BurstGenerator>(
    name: &str,
    track: &Track,
    synth: &mut Synthesizer<B>,
) -> Result<AudioTrack, TablatureError> {
    let mut audio = AudioTrack::new(synth.sample_rate());
    for (instant, note) in schedule(name, &track.tablature)? {
        let (velocity, vibration) = strum_times(name, note)?;
        let chord = Chord::new(note.frets.clone());

        trace!("track {:?}: {} at {}", name, chord, instant);
        let samples = synth
            .strum_strings(&chord, velocity, vibration)
            .context(Synthesis { track: name })?;
        audio.add_at(instant, &samples);
    }
    Ok(audio)
}

/// Render all tracks of a song and mix them down to a single normalized buffer.
///
/// With a seed, every track gets its own reproducible noise source.
pub fn render_song(
    song: &Song,
    sample_rate: u32,
    seed: Option<u64>,
) -> Result<Vec<f64>, TablatureError> {
    let mut rendered = Vec::with_capacity(song.tracks.len());
    for (index, (name, track)) in song.tracks.iter().enumerate() {
        if !track.instrument.effects.is_empty() {
            warn!(
                "track {:?}: ignoring {} effects",
                name,
                track.instrument.effects.len()
            );
        }
        let noise = match seed {
            Some(seed) => WhiteNoise::seeded(seed.wrapping_add(index as u64)),
            None => WhiteNoise::new(),
        };
        let instrument = track.instrument.build(name)?;
        let mut synth =
            Synthesizer::with_burst_generator(instrument, noise).with_sample_rate(sample_rate);
        let audio = play_track(name, track, &mut synth)?;
        info!(
            "rendered track {:?}: {:.2} seconds",
            name,
            audio.duration().as_secs_f64()
        );
        rendered.push((track.weight, audio));
    }

    let tracks: Vec<(f64, &[f64])> = rendered
        .iter()
        .map(|(weight, audio)| (*weight, audio.samples()))
        .collect();
    Ok(processing::mix_down(&tracks))
}
