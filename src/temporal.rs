// pluck-synth -- plucked string synthesis from chord charts
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Exact time in seconds and cursors moving along it.

use std::convert::TryFrom;
use std::{fmt, ops};

use snafu::{ResultExt, Snafu};

use crate::rational::{ParseRationalError, Rational};

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum TimeError {
    #[snafu(display("Unexpected {} operand in time arithmetic", kind))]
    UnsupportedOperand { kind: &'static str },
    #[snafu(display("Cannot read {:?} as an exact number: {}", literal, source))]
    InvalidLiteral {
        literal: String,
        source: ParseRationalError,
    },
    #[snafu(display("Measure duration must be positive, got {}", measure))]
    NonPositiveMeasure { measure: Time },
    #[snafu(display("Time {} overflowed", operation))]
    Overflow { operation: &'static str },
}

/// The dimensionless scalars that time arithmetic accepts.
///
/// Every kind has exactly one path to an exact value. Floats go through their
/// shortest decimal representation, so `Float(0.1)` means one tenth and not
/// the binary number closest to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    Int(i64),
    /// A value that was written as a decimal literal.
    Decimal(Rational),
    Ratio(Rational),
    Float(f64),
}

impl Numeric {
    pub fn kind(&self) -> &'static str {
        match self {
            Numeric::Int(_) => "integer",
            Numeric::Decimal(_) => "decimal",
            Numeric::Ratio(_) => "ratio",
            Numeric::Float(x) if x.is_finite() => "float",
            Numeric::Float(_) => "non-finite float",
        }
    }

    /// Convert to an exact number.
    ///
    /// ```
    /// # use pluck_synth::rational::Rational;
    /// # use pluck_synth::temporal::Numeric;
    /// assert_eq!(Numeric::Float(0.1).to_exact(), Ok(Rational::new(1, 10)));
    /// assert!(Numeric::Float(f64::NAN).to_exact().is_err());
    /// ```
    pub fn to_exact(self) -> Result<Rational, TimeError> {
        match self {
            Numeric::Int(int) => Ok(Rational::int(int)),
            Numeric::Decimal(value) | Numeric::Ratio(value) => Ok(value),
            Numeric::Float(x) if x.is_finite() => {
                // `Display` for floats is the shortest string that reads back
                // as the same float, and never uses exponent notation.
                let literal = x.to_string();
                literal.parse().context(InvalidLiteral { literal })
            }
            Numeric::Float(_) => Err(TimeError::UnsupportedOperand { kind: self.kind() }),
        }
    }
}

impl From<i64> for Numeric {
    fn from(int: i64) -> Self {
        Numeric::Int(int)
    }
}

impl From<i32> for Numeric {
    fn from(int: i32) -> Self {
        Numeric::Int(int.into())
    }
}

impl From<Rational> for Numeric {
    fn from(ratio: Rational) -> Self {
        Numeric::Ratio(ratio)
    }
}

impl From<f64> for Numeric {
    fn from(x: f64) -> Self {
        Numeric::Float(x)
    }
}

/// Reads `"2"` as an integer, `"0.65"` as a decimal and `"3/2"` as a ratio.
impl std::str::FromStr for Numeric {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: Rational = s.parse().context(InvalidLiteral { literal: s })?;
        Ok(if s.contains('/') {
            Numeric::Ratio(value)
        } else if s.contains('.') {
            Numeric::Decimal(value)
        } else {
            Numeric::Int(value.numerator())
        })
    }
}

/// A point in time or a duration, in exact seconds.
///
/// The operators panic if a result leaves the range of the underlying
/// fraction, the `checked_*` methods report it as [`TimeError::Overflow`].
///
/// Equal durations compare equal no matter how they were computed:
///
/// ```
/// # use pluck_synth::temporal::*;
/// let tenth: Time = "0.1".parse().unwrap();
/// let mut sum = Time::ZERO;
/// for _ in 0..10_000 {
///     sum += tenth;
/// }
/// assert_eq!(sum, Time::from_secs(1000));
/// assert_eq!(Time::from_secs(1) + Time::from_secs(2), Time::from_secs(3));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Time {
    seconds: Rational,
}

impl Time {
    pub const ZERO: Time = Time {
        seconds: Rational::ZERO,
    };

    pub fn new(seconds: impl Into<Numeric>) -> Result<Time, TimeError> {
        seconds.into().to_exact().map(Time::from_rational)
    }

    pub const fn from_rational(seconds: Rational) -> Time {
        Time { seconds }
    }

    pub const fn from_secs(seconds: i64) -> Time {
        Time::from_rational(Rational::int(seconds))
    }

    pub fn from_millis(milliseconds: i64) -> Time {
        Time::from_rational(Rational::new(milliseconds, 1000))
    }

    /// ```
    /// # use pluck_synth::temporal::*;
    /// assert_eq!(Time::from_milliseconds(1000), Ok(Time::from_secs(1)));
    /// assert_eq!(Time::from_milliseconds(2.5), Time::new("0.0025".parse::<Numeric>().unwrap()));
    /// ```
    pub fn from_milliseconds(milliseconds: impl Into<Numeric>) -> Result<Time, TimeError> {
        let ms = milliseconds.into().to_exact()?;
        ms.checked_div(Rational::int(1000))
            .map(Time::from_rational)
            .ok_or(TimeError::Overflow {
                operation: "conversion",
            })
    }

    pub const fn seconds(self) -> Rational {
        self.seconds
    }

    pub fn as_secs_f64(self) -> f64 {
        self.seconds.to_f64()
    }

    pub const fn is_zero(self) -> bool {
        self.seconds.is_zero()
    }

    /// `self + rhs` for a runtime-typed operand.
    pub fn checked_add(self, rhs: impl Into<Numeric>) -> Result<Time, TimeError> {
        let rhs = rhs.into().to_exact()?;
        self.seconds
            .checked_add(rhs)
            .map(Time::from_rational)
            .ok_or(TimeError::Overflow {
                operation: "addition",
            })
    }

    /// Scale a duration by a dimensionless factor, e.g. a note value.
    pub fn checked_mul(self, factor: impl Into<Numeric>) -> Result<Time, TimeError> {
        let factor = factor.into().to_exact()?;
        self.seconds
            .checked_mul(factor)
            .map(Time::from_rational)
            .ok_or(TimeError::Overflow {
                operation: "multiplication",
            })
    }

    /// Number of samples spanned at the given rate, rounding half to even.
    /// Negative times span no samples, counts beyond `usize` saturate.
    ///
    /// ```
    /// # use pluck_synth::temporal::*;
    /// assert_eq!(Time::from_secs(2).get_num_samples(44100), 88200);
    /// assert_eq!("1.5".parse::<Time>().unwrap().get_num_samples(44100), 66150);
    /// assert_eq!(Time::from_millis(25).get_num_samples(44100), 1102);
    /// ```
    pub fn get_num_samples(self, sample_rate: u32) -> usize {
        let samples = self.seconds.mul_round(sample_rate.into());
        if samples < 0 {
            0
        } else {
            usize::try_from(samples).unwrap_or(usize::MAX)
        }
    }
}

impl Default for Time {
    fn default() -> Self {
        Time::ZERO
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.seconds)
    }
}

impl std::str::FromStr for Time {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Time::new(s.parse::<Numeric>()?)
    }
}

impl ops::Add for Time {
    type Output = Time;

    fn add(self, rhs: Time) -> Time {
        Time::from_rational(self.seconds + rhs.seconds)
    }
}

impl ops::Add<Rational> for Time {
    type Output = Time;

    fn add(self, rhs: Rational) -> Time {
        Time::from_rational(self.seconds + rhs)
    }
}

impl ops::Add<i64> for Time {
    type Output = Time;

    fn add(self, rhs: i64) -> Time {
        self + Rational::int(rhs)
    }
}

impl ops::Sub for Time {
    type Output = Time;

    fn sub(self, rhs: Time) -> Time {
        Time::from_rational(self.seconds - rhs.seconds)
    }
}

impl ops::Mul<Rational> for Time {
    type Output = Time;

    fn mul(self, rhs: Rational) -> Time {
        Time::from_rational(self.seconds * rhs)
    }
}

impl ops::Mul<i64> for Time {
    type Output = Time;

    fn mul(self, rhs: i64) -> Time {
        Time::from_rational(self.seconds * rhs)
    }
}

impl ops::AddAssign for Time {
    fn add_assign(&mut self, rhs: Time) {
        *self = *self + rhs;
    }
}

/// A cursor in time that only moves forward when told to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timeline {
    instant: Time,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(instant: Time) -> Self {
        Self { instant }
    }

    pub fn instant(&self) -> Time {
        self.instant
    }

    /// # Panics
    ///
    /// Panics if the instant overflows, see [`Timeline::checked_advance`].
    pub fn advance(&mut self, duration: Time) -> &mut Self {
        self.instant += duration;
        self
    }

    /// Like `advance`, but leaves the cursor in place if it would overflow.
    pub fn checked_advance(&mut self, duration: Time) -> Result<&mut Self, TimeError> {
        self.instant = self.instant.checked_add(duration.seconds)?;
        Ok(self)
    }
}

impl ops::ShrAssign<Time> for Timeline {
    fn shr_assign(&mut self, duration: Time) {
        self.advance(duration);
    }
}

/// `&mut timeline >> duration` advances the cursor and evaluates to the same
/// timeline, so the new instant can be read off directly.
///
/// ```
/// # use pluck_synth::temporal::*;
/// let mut timeline = Timeline::new();
/// let instant = (&mut timeline >> Time::from_millis(650)).instant();
/// assert_eq!(instant, Time::from_millis(650));
/// ```
impl<'a> ops::Shr<Time> for &'a mut Timeline {
    type Output = &'a mut Timeline;

    fn shr(self, duration: Time) -> Self::Output {
        self.advance(duration)
    }
}

/// A timeline that also knows where musical measures begin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeasuredTimeline {
    timeline: Timeline,
    measure: Time,
    last_measure_end: Time,
}

impl MeasuredTimeline {
    pub fn new(measure: Time) -> Self {
        Self::starting_at(Time::ZERO, measure)
    }

    /// Start at an arbitrary instant. The last measure boundary is the largest
    /// multiple of `measure` not after `instant`.
    ///
    /// ```
    /// # use pluck_synth::temporal::*;
    /// let mut timeline = MeasuredTimeline::starting_at(Time::from_secs(5), Time::from_secs(2));
    /// assert_eq!(timeline.last_measure_end(), Time::from_secs(4));
    /// timeline.next_measure().unwrap();
    /// assert_eq!(timeline.instant(), Time::from_secs(6));
    /// ```
    pub fn starting_at(instant: Time, measure: Time) -> Self {
        let last_measure_end = if !instant.is_zero() && measure.seconds.is_positive() {
            let whole_measures = (instant.seconds / measure.seconds).floor();
            measure * whole_measures
        } else {
            Time::ZERO
        };
        Self {
            timeline: Timeline::starting_at(instant),
            measure,
            last_measure_end,
        }
    }

    pub fn measure(&self) -> Time {
        self.measure
    }

    /// Change the measure length, e.g. for a new time signature. Takes effect
    /// at the next boundary.
    pub fn set_measure(&mut self, measure: Time) {
        self.measure = measure;
    }

    pub fn last_measure_end(&self) -> Time {
        self.last_measure_end
    }

    /// Jump to the end of the current measure.
    pub fn next_measure(&mut self) -> Result<&mut Self, TimeError> {
        if !self.measure.seconds.is_positive() {
            return Err(TimeError::NonPositiveMeasure {
                measure: self.measure,
            });
        }
        self.last_measure_end = self.last_measure_end.checked_add(self.measure.seconds)?;
        self.timeline.instant = self.last_measure_end;
        Ok(self)
    }
}

impl ops::Deref for MeasuredTimeline {
    type Target = Timeline;

    fn deref(&self) -> &Timeline {
        &self.timeline
    }
}

impl ops::DerefMut for MeasuredTimeline {
    fn deref_mut(&mut self) -> &mut Timeline {
        &mut self.timeline
    }
}

impl ops::ShrAssign<Time> for MeasuredTimeline {
    fn shr_assign(&mut self, duration: Time) {
        self.timeline.advance(duration);
    }
}

impl<'a> ops::Shr<Time> for &'a mut MeasuredTimeline {
    type Output = &'a mut MeasuredTimeline;

    fn shr(self, duration: Time) -> Self::Output {
        self.timeline.advance(duration);
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn construct_from_numeric_kinds() {
        assert_eq!(Time::new(1), Ok(Time::from_secs(1)));
        assert_eq!(Time::new(1.5), Ok(Time::from_rational(Rational::new(3, 2))));
        assert_eq!(Time::new(Rational::new(3, 2)), Time::new(1.5));
        assert_eq!("1.5".parse::<Time>(), Time::new(1.5));
        assert_eq!(
            Time::new(f64::INFINITY),
            Err(TimeError::UnsupportedOperand {
                kind: "non-finite float"
            })
        );
        assert!(matches!(
            "invalid".parse::<Time>(),
            Err(TimeError::InvalidLiteral { .. })
        ));
    }

    #[test]
    fn numeric_literal_kinds() {
        assert_eq!("2".parse::<Numeric>().map(|n| n.kind()), Ok("integer"));
        assert_eq!("0.65".parse::<Numeric>().map(|n| n.kind()), Ok("decimal"));
        assert_eq!("3/2".parse::<Numeric>().map(|n| n.kind()), Ok("ratio"));
    }

    #[test]
    fn milliseconds() {
        for &(ms, seconds) in &[(1000, "1"), (1500, "1.5"), (2500, "2.5"), (500, "0.5")] {
            assert_eq!(Time::from_milliseconds(ms), seconds.parse());
            assert_eq!(Ok(Time::from_millis(ms)), seconds.parse());
        }
    }

    #[test]
    fn arithmetic_paths_agree() {
        let beat = Time::from_rational(Rational::new(60, 90));
        let by_mul = beat * 4;
        let by_add = beat + beat + beat + beat;
        assert_eq!(by_mul, by_add);
        assert_eq!(beat.checked_mul(4), Ok(by_mul));
        assert_eq!(
            Time::from_secs(1).checked_add(0.5),
            Ok(Time::from_millis(1500))
        );
        assert_eq!(Time::from_secs(1) + 2, Time::from_secs(3));
        assert!(Time::from_secs(1).checked_mul(f64::NAN).is_err());
    }

    #[test]
    fn sample_counts() {
        assert_eq!(Time::from_secs(1).get_num_samples(44100), 44100);
        assert_eq!(Time::from_millis(500).get_num_samples(44100), 22050);
        // 0.5 samples rounds to even
        assert_eq!(Time::from_rational(Rational::new(1, 88200)).get_num_samples(44100), 0);
        assert_eq!(Time::from_rational(Rational::new(3, 88200)).get_num_samples(44100), 2);
        assert_eq!(Time::from_secs(-1).get_num_samples(44100), 0);
    }

    #[test]
    fn long_float_decimals() {
        let third = Time::new(1.0 / 3.0).unwrap();
        assert_eq!(third.get_num_samples(44100), 14700);
        let sum = Time::new(0.1234567891234).unwrap() + third;
        assert_eq!(sum, Time::new("0.4567901224567333".parse::<Numeric>().unwrap()).unwrap());
        assert_eq!(third.checked_mul(3), "0.9999999999999999".parse::<Time>());
    }

    #[test]
    fn overflow() {
        let end_of_time = Time::from_secs(i64::MAX);
        assert_eq!(
            end_of_time.checked_add(1),
            Err(TimeError::Overflow {
                operation: "addition"
            })
        );
        assert!(end_of_time.checked_mul(2).is_err());
        assert_eq!(end_of_time.get_num_samples(44100), usize::MAX);

        let mut timeline = Timeline::starting_at(end_of_time);
        assert!(timeline.checked_advance(Time::from_secs(1)).is_err());
        assert_eq!(timeline.instant(), end_of_time);
        let mut measured = MeasuredTimeline::new(end_of_time);
        assert!(measured.next_measure().is_ok());
        assert!(measured.next_measure().is_err());
    }

    #[test]
    fn timeline_shift() {
        let mut timeline = Timeline::new();
        timeline >>= Time::from_millis(650);
        timeline >>= Time::from_millis(450);
        let instant = (&mut timeline >> Time::from_millis(100)).instant();
        assert_eq!(instant, Time::from_millis(1200));
    }

    #[test]
    fn measured_timeline_from_zero() {
        let mut timeline = MeasuredTimeline::new(Time::from_secs(2));
        timeline >>= Time::from_millis(500);
        timeline.next_measure().unwrap();
        assert_eq!(timeline.instant(), Time::from_secs(2));
        timeline.set_measure(Time::from_secs(3));
        timeline.next_measure().unwrap();
        assert_eq!(timeline.instant(), Time::from_secs(5));
        assert_eq!(timeline.last_measure_end(), Time::from_secs(5));
    }

    #[test]
    fn measured_timeline_on_boundary() {
        let timeline = MeasuredTimeline::starting_at(Time::from_secs(4), Time::from_secs(2));
        assert_eq!(timeline.last_measure_end(), Time::from_secs(4));
    }

    #[test]
    fn measured_timeline_needs_positive_measure() {
        let mut timeline = MeasuredTimeline::default();
        assert_eq!(
            timeline.next_measure().map(|t| t.instant()),
            Err(TimeError::NonPositiveMeasure {
                measure: Time::ZERO
            })
        );
        let mut negative = MeasuredTimeline::new(Time::from_secs(-1));
        assert!(negative.next_measure().is_err());
    }
}
