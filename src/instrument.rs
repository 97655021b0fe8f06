// pluck-synth -- plucked string synthesis from chord charts
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Strings, tunings, chord shapes and the instruments combining them.

use std::convert::TryFrom;
use std::fmt;

use snafu::{ResultExt, Snafu};

use crate::pitch::{Pitch, PitchError};
use crate::temporal::Time;

/// Damping used when an instrument does not specify one.
pub const DEFAULT_DAMPING: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Snafu)]
pub enum InstrumentError {
    #[snafu(display("Damping must be between 0 and 0.5, got {}", damping))]
    InvalidDamping { damping: f64 },
    #[snafu(display(
        "Chord has {} strings but the instrument has {}",
        actual,
        expected
    ))]
    ChordLength { expected: usize, actual: usize },
    #[snafu(display("A tuning needs at least one string"))]
    EmptyTuning,
    #[snafu(display("Invalid tuning: {}", source))]
    Tuning { source: PitchError },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VibratingString {
    pitch: Pitch,
}

impl VibratingString {
    pub fn new(pitch: Pitch) -> Self {
        Self { pitch }
    }

    /// The pitch of the string when not pressed down.
    pub fn pitch(&self) -> Pitch {
        self.pitch
    }

    /// The pitch heard when pressing the given fret, or the open string for `None`.
    ///
    /// Frets beyond `i32::MAX` count as `i32::MAX`, which is far above any
    /// frequency the synthesizer accepts.
    pub fn press_fret(&self, fret: Option<u32>) -> Pitch {
        match fret {
            None => self.pitch,
            Some(fret) => self.pitch.adjust(i32::try_from(fret).unwrap_or(i32::MAX)),
        }
    }
}

/// The strings of an instrument, indexed in the same order as chord digits.
#[derive(Debug, Clone, PartialEq)]
pub struct StringTuning {
    strings: Vec<VibratingString>,
}

impl StringTuning {
    /// Build a tuning from note names as they are conventionally written.
    ///
    /// The last name becomes string 0, so the digits of a chord refer to the
    /// notes in reverse order of how they are listed here.
    ///
    /// ```
    /// # use pluck_synth::instrument::*;
    /// let ukulele = StringTuning::from_notes(&["A4", "E4", "C4", "G4"]).unwrap();
    /// assert_eq!(ukulele.strings()[0].pitch(), "G4".parse().unwrap());
    /// assert_eq!(ukulele.strings()[3].pitch(), "A4".parse().unwrap());
    /// ```
    pub fn from_notes<S: AsRef<str>>(notes: &[S]) -> Result<Self, InstrumentError> {
        let strings = notes
            .iter()
            .rev()
            .map(|note| {
                Pitch::from_scientific_notation(note.as_ref()).map(VibratingString::new)
            })
            .collect::<Result<Vec<_>, _>>()
            .context(Tuning)?;
        Self::new(strings)
    }

    /// Build a tuning from strings already in chord-digit order.
    pub fn new(strings: Vec<VibratingString>) -> Result<Self, InstrumentError> {
        if strings.is_empty() {
            return Err(InstrumentError::EmptyTuning);
        }
        Ok(Self { strings })
    }

    pub fn strings(&self) -> &[VibratingString] {
        &self.strings
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

/// A fingering: for each string the pressed fret, or `None` if the string is
/// not played at all.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Chord(Vec<Option<u32>>);

impl Chord {
    pub fn new(frets: Vec<Option<u32>>) -> Self {
        Chord(frets)
    }

    /// A chord where every string is played.
    ///
    /// ```
    /// # use pluck_synth::instrument::Chord;
    /// assert_eq!(Chord::played(&[0, 2]), Chord::new(vec![Some(0), Some(2)]));
    /// ```
    pub fn played(frets: &[u32]) -> Self {
        frets.iter().copied().map(Some).collect()
    }

    pub fn frets(&self) -> &[Option<u32>] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Option<u32>>> for Chord {
    fn from(frets: Vec<Option<u32>>) -> Self {
        Chord(frets)
    }
}

impl std::iter::FromIterator<Option<u32>> for Chord {
    fn from_iter<I: IntoIterator<Item = Option<u32>>>(iter: I) -> Self {
        Chord(iter.into_iter().collect())
    }
}

/// Written like tablature, `x` for strings that are not played.
impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, fret) in self.0.iter().enumerate() {
            if index > 0 {
                write!(f, " ")?;
            }
            match fret {
                Some(fret) => write!(f, "{}", fret)?,
                None => write!(f, "x")?,
            }
        }
        Ok(())
    }
}

/// A plucked string instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct Instrument {
    tuning: StringTuning,
    /// How long a plucked string rings unless told otherwise.
    vibration: Time,
    /// Feedback gain of the string model, in (0, 0.5].
    damping: f64,
}

impl Instrument {
    pub fn new(tuning: StringTuning, vibration: Time, damping: f64) -> Result<Self, InstrumentError> {
        if !(damping > 0.0 && damping <= 0.5) {
            return Err(InstrumentError::InvalidDamping { damping });
        }
        Ok(Self {
            tuning,
            vibration,
            damping,
        })
    }

    pub fn tuning(&self) -> &StringTuning {
        &self.tuning
    }

    pub fn vibration(&self) -> Time {
        self.vibration
    }

    pub fn damping(&self) -> f64 {
        self.damping
    }

    pub fn num_strings(&self) -> usize {
        self.tuning.len()
    }

    /// The pitches of a chord, from string 0 upwards, skipping unplayed strings.
    pub fn upstroke(&self, chord: &Chord) -> Result<Vec<Pitch>, InstrumentError> {
        if chord.len() != self.num_strings() {
            return Err(InstrumentError::ChordLength {
                expected: self.num_strings(),
                actual: chord.len(),
            });
        }
        Ok(self
            .tuning
            .strings()
            .iter()
            .zip(chord.frets())
            .filter(|(_, fret)| fret.is_some())
            .map(|(string, &fret)| string.press_fret(fret))
            .collect())
    }

    /// The upstroke pitches in reverse order.
    pub fn downstroke(&self, chord: &Chord) -> Result<Vec<Pitch>, InstrumentError> {
        let mut pitches = self.upstroke(chord)?;
        pitches.reverse();
        Ok(pitches)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn guitar() -> Instrument {
        let tuning = StringTuning::from_notes(&["E4", "A3", "D4", "G4", "B3", "E2"]).unwrap();
        Instrument::new(tuning, Time::from_secs(1), DEFAULT_DAMPING).unwrap()
    }

    fn pitch(notation: &str) -> Pitch {
        notation.parse().unwrap()
    }

    #[test]
    fn press_fret() {
        let string = VibratingString::new(pitch("A4"));
        assert_eq!(string.press_fret(None), pitch("A4"));
        let b4 = string.press_fret(Some(2));
        assert!((b4.frequency() - pitch("B4").frequency()).abs() < 1e-9);
        for fret in 0..24u32 {
            let expected = 440.0 * 2f64.powf(fret as f64 / 12.0);
            assert_eq!(string.press_fret(Some(fret)).frequency(), expected);
        }
    }

    #[test]
    fn absurd_frets_go_up() {
        let string = VibratingString::new(pitch("E2"));
        let open = string.pitch().frequency();
        for &fret in &[i32::MAX as u32, i32::MAX as u32 + 1, u32::MAX] {
            assert!(string.press_fret(Some(fret)).frequency() > open, "{}", fret);
        }
    }

    #[test]
    fn damping_range() {
        let tuning = StringTuning::from_notes(&["E2"]).unwrap();
        for &damping in &[0.6, 0.0, -0.1, f64::NAN] {
            assert!(matches!(
                Instrument::new(tuning.clone(), Time::from_secs(1), damping),
                Err(InstrumentError::InvalidDamping { .. })
            ));
        }
        assert!(Instrument::new(tuning.clone(), Time::from_secs(1), 0.5).is_ok());
        assert!(Instrument::new(tuning, Time::from_secs(1), 0.001).is_ok());
    }

    #[test]
    fn tuning_is_reversed() {
        let ukulele = StringTuning::from_notes(&["A4", "E4", "C4", "G4"]).unwrap();
        let names: Vec<Pitch> = ukulele.strings().iter().map(|s| s.pitch()).collect();
        assert_eq!(names, vec![pitch("G4"), pitch("C4"), pitch("E4"), pitch("A4")]);

        // C major on ukulele: the 3 is played on the A string, which is listed first.
        let instrument = Instrument::new(ukulele, Time::from_secs(1), 0.5).unwrap();
        let pitches = instrument.upstroke(&Chord::played(&[0, 0, 0, 3])).unwrap();
        assert_eq!(pitches[..3], [pitch("G4"), pitch("C4"), pitch("E4")]);
        assert!((pitches[3].frequency() - pitch("C5").frequency()).abs() < 1e-9);
    }

    #[test]
    fn upstroke_a_major() {
        let guitar = guitar();
        assert_eq!(guitar.num_strings(), 6);
        let strings = guitar.tuning().strings();
        let chord = Chord::played(&[0, 2, 2, 1, 0, 0]);
        let expected: Vec<Pitch> = strings
            .iter()
            .zip(&[0, 2, 2, 1, 0, 0])
            .map(|(string, &fret)| string.pitch().adjust(fret))
            .collect();
        assert_eq!(guitar.upstroke(&chord).unwrap(), expected);
    }

    #[test]
    fn downstroke_is_reversed_upstroke() {
        let guitar = guitar();
        for chord in &[
            Chord::played(&[0, 2, 2, 1, 0, 0]),
            Chord::new(vec![None, Some(3), Some(2), Some(0), Some(1), Some(0)]),
            Chord::new(vec![None; 6]),
        ] {
            let mut up = guitar.upstroke(chord).unwrap();
            up.reverse();
            assert_eq!(guitar.downstroke(chord).unwrap(), up);
            // same chord, same order
            assert_eq!(guitar.downstroke(chord).unwrap(), up);
        }
    }

    #[test]
    fn muted_strings_are_skipped() {
        let guitar = guitar();
        let chord = Chord::new(vec![None, Some(3), None, None, None, Some(0)]);
        let strings = guitar.tuning().strings();
        assert_eq!(
            guitar.upstroke(&chord).unwrap(),
            vec![strings[1].pitch().adjust(3), strings[5].pitch()]
        );
    }

    #[test]
    fn chord_length_mismatch() {
        assert_eq!(
            guitar().upstroke(&Chord::played(&[0, 0, 0, 3])),
            Err(InstrumentError::ChordLength {
                expected: 6,
                actual: 4
            })
        );
        assert!(guitar().downstroke(&Chord::played(&[0; 7])).is_err());
    }

    #[test]
    fn invalid_tunings() {
        assert_eq!(
            StringTuning::from_notes::<&str>(&[]),
            Err(InstrumentError::EmptyTuning)
        );
        assert!(matches!(
            StringTuning::from_notes(&["E2", "H2"]),
            Err(InstrumentError::Tuning { .. })
        ));
    }

    #[test]
    fn chord_display() {
        let chord = Chord::new(vec![None, Some(3), Some(2), Some(0), Some(1), Some(0)]);
        assert_eq!(chord.to_string(), "x 3 2 0 1 0");
    }
}
