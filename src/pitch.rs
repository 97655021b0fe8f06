// pluck-synth -- plucked string synthesis from chord charts
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Pitches as frequencies in equal temperament.

use std::fmt;

use snafu::Snafu;

/// Frequency of A4 in concert tuning.
pub const REFERENCE_FREQUENCY: f64 = 440.0;

/// Semitones between C0 and A4, the reference note.
const REFERENCE_OFFSET: i64 = 57;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

#[derive(Debug, Clone, PartialEq, Snafu)]
pub enum PitchError {
    #[snafu(display("Invalid pitch notation: '{}'", notation))]
    InvalidNotation { notation: String },
    #[snafu(display("Frequency must be positive and finite, got {}", frequency))]
    InvalidFrequency { frequency: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Pitch {
    frequency: f64,
}

impl Pitch {
    pub fn new(frequency: f64) -> Result<Pitch, PitchError> {
        if frequency.is_finite() && frequency > 0.0 {
            Ok(Pitch { frequency })
        } else {
            Err(PitchError::InvalidFrequency { frequency })
        }
    }

    /// Parse a name of the format `<letter><sharp><octave>`, e.g. `C#5`.
    ///
    /// Only the twelve names `C C# D D# E F F# G G# A A# B` are known.
    /// The octave may be negative and defaults to 0 when left out.
    ///
    /// # Examples
    ///
    /// ```
    /// # use pluck_synth::pitch::*;
    /// assert_eq!(Pitch::from_scientific_notation("A4").unwrap().frequency(), 440.0);
    /// assert_eq!(Pitch::from_scientific_notation("A3").unwrap().frequency(), 220.0);
    /// assert!(Pitch::from_scientific_notation("H4").is_err());
    /// assert!(Pitch::from_scientific_notation("Db4").is_err());
    /// ```
    pub fn from_scientific_notation(notation: &str) -> Result<Pitch, PitchError> {
        let invalid = || PitchError::InvalidNotation {
            notation: notation.to_owned(),
        };

        let name_len = if notation.get(1..2) == Some("#") { 2 } else { 1 };
        let name = notation.get(..name_len).ok_or_else(invalid)?;
        let semitone = NOTE_NAMES
            .iter()
            .position(|&known| known == name)
            .ok_or_else(invalid)? as i64;

        let octave_str = &notation[name_len..];
        let octave: i64 = if octave_str.is_empty() {
            0
        } else {
            let digits = octave_str.strip_prefix('-').unwrap_or(octave_str);
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            octave_str.parse().map_err(|_| invalid())?
        };

        let index = octave
            .checked_mul(12)
            .and_then(|semitones| semitones.checked_add(semitone - REFERENCE_OFFSET))
            .ok_or_else(invalid)?;
        let frequency = REFERENCE_FREQUENCY * 2f64.powf(index as f64 / 12.0);
        Pitch::new(frequency).map_err(|_| invalid())
    }

    pub fn frequency(self) -> f64 {
        self.frequency
    }

    /// Transpose by the given number of semitones.
    ///
    /// ```
    /// # use pluck_synth::pitch::*;
    /// let a4 = Pitch::new(440.0).unwrap();
    /// assert_eq!(a4.adjust(12).frequency(), 880.0);
    /// assert_eq!(a4.adjust(-12).frequency(), 220.0);
    /// assert_eq!(a4.adjust(0), a4);
    /// ```
    pub fn adjust(self, semitones: i32) -> Pitch {
        Pitch {
            frequency: self.frequency * 2f64.powf(f64::from(semitones) / 12.0),
        }
    }
}

impl std::str::FromStr for Pitch {
    type Err = PitchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pitch::from_scientific_notation(s)
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} Hz", self.frequency)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "{} is not close to {}",
            actual,
            expected
        );
    }

    #[test]
    fn known_frequencies() {
        assert_close("C4".parse::<Pitch>().unwrap().frequency(), 261.625565);
        assert_close("E2".parse::<Pitch>().unwrap().frequency(), 82.406889);
        assert_close("G#4".parse::<Pitch>().unwrap().frequency(), 415.304698);
        assert_close("C#5".parse::<Pitch>().unwrap().frequency(), 554.365262);
        assert_close("A-1".parse::<Pitch>().unwrap().frequency(), 13.75);
        // no octave means octave 0
        assert_close("A".parse::<Pitch>().unwrap().frequency(), 27.5);
    }

    #[test]
    fn sharps_are_one_semitone_up() {
        let c = Pitch::from_scientific_notation("C4").unwrap();
        let c_sharp = Pitch::from_scientific_notation("C#4").unwrap();
        assert_close(c.adjust(1).frequency(), c_sharp.frequency());
    }

    #[test]
    fn invalid_notations() {
        for notation in &["", "#4", "a4", "E#4", "B#3", "Cb4", "A4x", "A-", "A+4", "A 4", "ä4"] {
            assert_eq!(
                notation.parse::<Pitch>(),
                Err(PitchError::InvalidNotation {
                    notation: notation.to_string()
                }),
                "{:?}",
                notation
            );
        }
    }

    #[test]
    fn error_names_notation() {
        let err = Pitch::from_scientific_notation("X4").unwrap_err();
        assert_eq!(err.to_string(), "Invalid pitch notation: 'X4'");
    }

    #[test]
    fn non_positive_frequency() {
        assert!(Pitch::new(0.0).is_err());
        assert!(Pitch::new(-440.0).is_err());
        assert!(Pitch::new(f64::NAN).is_err());
    }
}
