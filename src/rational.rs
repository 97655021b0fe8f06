// pluck-synth -- plucked string synthesis from chord charts
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Exact fractions, the number type underneath all scheduling.
//!
//! Decimal literals such as `0.65` are read exactly as `13/20`, so repeated
//! additions never drift the way binary floats do.

use std::convert::TryFrom;
use std::error::Error;
use std::fmt;
use std::{cmp::Ordering, ops};

/// Underlying integral type for the rational numbers.
type Int = i64;
/// Headroom for intermediate products, which are reduced before storing.
type Wide = i128;

/// A rational number, always fully normalized.
///
/// Because the representation is canonical, the derived `Eq` and `Hash`
/// agree with numeric equality.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Rational {
    /// Carries the sign of the fraction.
    num: Int,
    /// Always positive.
    denom: Int,
}

impl Rational {
    pub const ZERO: Rational = Rational { num: 0, denom: 1 };

    // ==================== Constructors ====================

    /// Create a new rational from a potentially unnormalized fraction.
    ///
    /// # Panic
    ///
    /// Panics if the denominator is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// # use pluck_synth::rational::*;
    ///
    /// assert_eq!(Rational::new(10, 5), Rational::int(2));
    /// assert_eq!(Rational::new(-6, 8), Rational::new(3, -4));
    /// ```
    pub fn new(num: Int, denom: Int) -> Rational {
        assert_ne!(denom, 0, "Denominator must not be zero");
        Rational::reduce(num.into(), denom.into()).unwrap_or_else(overflow)
    }

    /// Normalize a fraction, or `None` if the reduced fraction does not fit.
    fn reduce(num: Wide, denom: Wide) -> Option<Rational> {
        if denom == 0 {
            return None;
        }
        let div = gcd_wide(num, denom);
        let num = if (num < 0) != (denom < 0) {
            -(num.abs() / div)
        } else {
            num.abs() / div
        };
        Some(Rational {
            num: Int::try_from(num).ok()?,
            denom: Int::try_from(denom.abs() / div).ok()?,
        })
    }

    pub const fn int(int: Int) -> Rational {
        Rational { num: int, denom: 1 }
    }

    pub const fn one() -> Rational {
        Rational::int(1)
    }

    /// The value `mantissa * 10^-scale`, or `None` if the power of ten
    /// does not fit the underlying integer.
    ///
    /// ```
    /// # use pluck_synth::rational::*;
    /// assert_eq!(Rational::decimal(65, 2), Some(Rational::new(13, 20)));
    /// assert_eq!(Rational::decimal(-5, 1), Some(Rational::new(-1, 2)));
    /// assert_eq!(Rational::decimal(1, 40), None);
    /// ```
    pub fn decimal(mantissa: Int, scale: u32) -> Option<Rational> {
        let denom = (10 as Int).checked_pow(scale)?;
        Some(Rational::new(mantissa, denom))
    }

    // ==================== Rounding ====================

    /// Round towards negative infinity.
    ///
    /// ```
    /// # use pluck_synth::rational::*;
    /// assert_eq!(Rational::new(5, 2).floor(), 2);
    /// assert_eq!(Rational::new(-5, 2).floor(), -3);
    /// assert_eq!(Rational::int(4).floor(), 4);
    /// ```
    pub fn floor(self) -> Int {
        self.num.div_euclid(self.denom)
    }

    /// Round to the closest integer, ties to even.
    ///
    /// This matches how exact decimal arithmetic rounds, so sample offsets
    /// computed from the same time always land on the same sample.
    ///
    /// ```
    /// # use pluck_synth::rational::*;
    /// assert_eq!(Rational::new(5, 2).round(), 2);
    /// assert_eq!(Rational::new(7, 2).round(), 4);
    /// assert_eq!(Rational::new(-5, 2).round(), -2);
    /// assert_eq!(Rational::new(3, 7).round(), 0);
    /// assert_eq!(Rational::new(4, 7).round(), 1);
    /// assert_eq!(Rational::new(-4, 7).round(), -1);
    /// ```
    pub fn round(self) -> Int {
        // a normalized fraction rounds to a value within the range of its numerator
        round_wide(self.num.into(), self.denom.into()) as Int
    }

    /// `self * factor` rounded like [`Rational::round`], without any
    /// intermediate overflow.
    ///
    /// ```
    /// # use pluck_synth::rational::*;
    /// let third: Rational = "0.3333333333333333".parse().unwrap();
    /// assert_eq!(third.mul_round(44100), 14700);
    /// assert_eq!(Rational::int(i64::MAX).mul_round(4), 4 * i64::MAX as i128);
    /// ```
    pub fn mul_round(self, factor: Int) -> Wide {
        round_wide(Wide::from(self.num) * Wide::from(factor), self.denom.into())
    }

    // ==================== Checked arithmetic ====================

    /// `self + rhs`, or `None` if the result cannot be represented.
    ///
    /// ```
    /// # use pluck_synth::rational::*;
    /// let a: Rational = "0.1234567891234".parse().unwrap();
    /// let b: Rational = "0.3333333333333333".parse().unwrap();
    /// assert_eq!(a.checked_add(b), "0.4567901224567333".parse().ok());
    /// assert_eq!(Rational::int(i64::MAX).checked_add(Rational::one()), None);
    /// ```
    pub fn checked_add(self, rhs: Rational) -> Option<Rational> {
        self.add_scaled(rhs, 1)
    }

    pub fn checked_sub(self, rhs: Rational) -> Option<Rational> {
        self.add_scaled(rhs, -1)
    }

    /// `self + sign * rhs` over the least common denominator.
    fn add_scaled(self, rhs: Rational, sign: Wide) -> Option<Rational> {
        let div = gcd(self.denom, rhs.denom);
        let lhs_factor = Wide::from(rhs.denom / div);
        let rhs_factor = Wide::from(self.denom / div);
        Rational::reduce(
            Wide::from(self.num) * lhs_factor + sign * Wide::from(rhs.num) * rhs_factor,
            Wide::from(self.denom) * lhs_factor,
        )
    }

    /// `self * rhs`, or `None` if the result cannot be represented.
    ///
    /// Common factors are cancelled first, so products whose result fits
    /// never overflow.
    ///
    /// ```
    /// # use pluck_synth::rational::*;
    /// let third: Rational = "0.3333333333333333".parse().unwrap();
    /// assert_eq!(
    ///     third.checked_mul(Rational::int(44100)),
    ///     Some(Rational::new(1_469_999_999_999_999_853, 100_000_000_000_000))
    /// );
    /// assert_eq!(Rational::new(1, i64::MAX).checked_mul(Rational::new(1, 3)), None);
    /// ```
    pub fn checked_mul(self, rhs: Rational) -> Option<Rational> {
        let left = gcd_wide(self.num.into(), rhs.denom.into()).max(1);
        let right = gcd_wide(rhs.num.into(), self.denom.into()).max(1);
        Rational::reduce(
            (Wide::from(self.num) / left) * (Wide::from(rhs.num) / right),
            (Wide::from(self.denom) / right) * (Wide::from(rhs.denom) / left),
        )
    }

    /// `self / rhs`, or `None` if `rhs` is zero or the result cannot be
    /// represented.
    pub fn checked_div(self, rhs: Rational) -> Option<Rational> {
        if rhs.is_zero() {
            return None;
        }
        self.checked_mul(Rational::reduce(rhs.denom.into(), rhs.num.into())?)
    }

    // ==================== Predicates ====================

    pub const fn is_zero(self) -> bool {
        self.num == 0
    }

    pub const fn is_positive(self) -> bool {
        self.num > 0
    }

    // ==================== Destructors ====================

    pub const fn numerator(self) -> Int {
        self.num
    }

    pub const fn denominator(self) -> Int {
        self.denom
    }

    /// Lossy conversion for display and float interop.
    pub fn to_f64(self) -> f64 {
        self.num as f64 / self.denom as f64
    }
}

#[cold]
fn overflow() -> Rational {
    panic!("Rational arithmetic overflowed")
}

// The operators panic where the checked methods return `None`.

impl ops::Add for Rational {
    type Output = Rational;

    fn add(self, rhs: Rational) -> Self::Output {
        self.checked_add(rhs).unwrap_or_else(overflow)
    }
}

impl ops::Sub for Rational {
    type Output = Rational;

    fn sub(self, rhs: Rational) -> Self::Output {
        self.checked_sub(rhs).unwrap_or_else(overflow)
    }
}

impl ops::Mul for Rational {
    type Output = Rational;

    fn mul(self, rhs: Rational) -> Self::Output {
        self.checked_mul(rhs).unwrap_or_else(overflow)
    }
}

impl ops::Div for Rational {
    type Output = Rational;

    /// # Panic
    ///
    /// Panics when dividing by zero.
    fn div(self, rhs: Rational) -> Self::Output {
        assert!(!rhs.is_zero(), "Division by zero");
        self.checked_div(rhs).unwrap_or_else(overflow)
    }
}

impl ops::Mul<Int> for Rational {
    type Output = Rational;

    fn mul(self, rhs: Int) -> Self::Output {
        self * Rational::int(rhs)
    }
}

impl ops::Neg for Rational {
    type Output = Rational;

    fn neg(self) -> Self::Output {
        Rational::reduce(-Wide::from(self.num), self.denom.into()).unwrap_or_else(overflow)
    }
}

impl ops::AddAssign for Rational {
    fn add_assign(&mut self, rhs: Rational) {
        *self = *self + rhs;
    }
}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Rational) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rational {
    fn cmp(&self, other: &Self) -> Ordering {
        // a / b < c / d  <=>  a * d < c * b, since both denominators are positive
        let l = Wide::from(self.num) * Wide::from(other.denom);
        let r = Wide::from(other.num) * Wide::from(self.denom);
        l.cmp(&r)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.num)?;
        if self.denom != 1 {
            write!(f, "/{}", self.denom)?;
        }
        Ok(())
    }
}

/// An error which can be returned when parsing a rational.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRationalError(RationalErrorKind);

impl ParseRationalError {
    pub fn kind(&self) -> RationalErrorKind {
        self.0
    }
}

impl Error for ParseRationalError {}

impl fmt::Display for ParseRationalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            RationalErrorKind::InvalidInt => write!(f, "invalid integer literal"),
            RationalErrorKind::Zero => write!(f, "denominator is zero"),
            RationalErrorKind::Malformed => write!(f, "malformed number"),
            RationalErrorKind::Overflow => write!(f, "too many digits"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RationalErrorKind {
    /// The numerator or denominator could not be parsed as integer.
    InvalidInt,
    /// The denominator was zero
    Zero,
    /// Not of the form `<int>`, `<int>/<int>` or `<int>.<digits>`.
    Malformed,
    /// A decimal literal had more fractional digits than can be represented.
    Overflow,
}

/// Parses integers, fractions and decimal literals exactly.
///
/// ```
/// # use pluck_synth::rational::*;
/// assert_eq!("3/2".parse(), Ok(Rational::new(3, 2)));
/// assert_eq!("1.5".parse(), Ok(Rational::new(3, 2)));
/// assert_eq!("-0.25".parse(), Ok(Rational::new(-1, 4)));
/// assert_eq!(".5".parse(), Ok(Rational::new(1, 2)));
/// assert_eq!("7".parse(), Ok(Rational::int(7)));
/// assert!("1/0".parse::<Rational>().is_err());
/// assert!("1.2.3".parse::<Rational>().is_err());
/// assert!("abc".parse::<Rational>().is_err());
/// ```
impl std::str::FromStr for Rational {
    type Err = ParseRationalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.contains('.') {
            return parse_decimal(s);
        }

        let mut parts = s.split('/');
        // `split` always yields at least one item
        let numerator_str = parts.next().unwrap_or_default();
        let numerator = numerator_str
            .parse()
            .map_err(|_| ParseRationalError(RationalErrorKind::InvalidInt))?;

        if let Some(denominator_str) = parts.next() {
            let denominator = denominator_str
                .parse()
                .map_err(|_| ParseRationalError(RationalErrorKind::InvalidInt))?;
            if denominator == 0 {
                Err(ParseRationalError(RationalErrorKind::Zero))
            } else if parts.next().is_some() {
                Err(ParseRationalError(RationalErrorKind::Malformed))
            } else {
                Ok(Rational::new(numerator, denominator))
            }
        } else {
            Ok(Rational::int(numerator))
        }
    }
}

fn parse_decimal(s: &str) -> Result<Rational, ParseRationalError> {
    let (negative, unsigned) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let (int_digits, frac_digits) = unsigned
        .split_once('.')
        .ok_or(ParseRationalError(RationalErrorKind::Malformed))?;

    let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if int_digits.len() + frac_digits.len() == 0 || !all_digits(int_digits) || !all_digits(frac_digits)
    {
        return Err(ParseRationalError(RationalErrorKind::Malformed));
    }

    // Trailing zeros carry no value but would cost range.
    let frac_digits = frac_digits.trim_end_matches('0');
    let digits = format!("{}{}", int_digits, frac_digits);
    let mantissa: Int = if digits.is_empty() {
        0
    } else {
        digits
            .parse()
            .map_err(|_| ParseRationalError(RationalErrorKind::Overflow))?
    };
    let value = Rational::decimal(mantissa, frac_digits.len() as u32)
        .ok_or(ParseRationalError(RationalErrorKind::Overflow))?;
    Ok(if negative { -value } else { value })
}

/// Computes the greates common divisor of two numbers using euclids algorithm.
///
/// # Example
///
/// ```
/// use pluck_synth::rational::*;
///
/// assert_eq!(gcd(20, 15), 5);
/// assert_eq!(gcd(10, 0), 10);
/// assert_eq!(gcd(0, 0), 0);
/// assert_eq!(gcd(10, -10), 10);
/// ```
pub fn gcd(a: Int, b: Int) -> Int {
    // the gcd of two i64 only exceeds i64::MAX for gcd(i64::MIN, 0 or i64::MIN)
    Int::try_from(gcd_wide(a.into(), b.into())).unwrap_or(Int::MIN)
}

fn gcd_wide(mut a: Wide, mut b: Wide) -> Wide {
    a = a.abs();
    b = b.abs();
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

/// Round `num / denom` to the closest integer, ties to even. `denom` is positive.
fn round_wide(num: Wide, denom: Wide) -> Wide {
    let floor = num.div_euclid(denom);
    let twice_remainder = 2 * num.rem_euclid(denom);
    match twice_remainder.cmp(&denom) {
        Ordering::Less => floor,
        Ordering::Greater => floor + 1,
        Ordering::Equal if floor % 2 == 0 => floor,
        Ordering::Equal => floor + 1,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn tenths_do_not_drift() {
        let tenth: Rational = "0.1".parse().unwrap();
        let mut sum = Rational::ZERO;
        for _ in 0..10_000 {
            sum += tenth;
        }
        assert_eq!(sum, Rational::int(1000));
    }

    #[test]
    fn decimal_and_fraction_agree() {
        assert_eq!("0.650".parse::<Rational>(), "13/20".parse::<Rational>());
        assert_eq!("2.".parse::<Rational>(), Ok(Rational::int(2)));
        assert_eq!("-0.0".parse::<Rational>(), Ok(Rational::ZERO));
    }

    #[test]
    fn malformed_decimals() {
        for input in &[".", "-.", "1.-5", "1,5", "", "1e3"] {
            assert!(input.parse::<Rational>().is_err(), "{:?}", input);
        }
        assert_eq!(
            "0.00000000000000000000001".parse::<Rational>().map_err(|e| e.kind()),
            Err(RationalErrorKind::Overflow)
        );
    }

    #[test]
    fn long_decimals_stay_exact() {
        let third: Rational = "0.3333333333333333".parse().unwrap();
        let other: Rational = "0.1234567891234".parse().unwrap();
        assert_eq!(third + other, "0.4567901224567333".parse::<Rational>().unwrap());
        assert_eq!(third - third, Rational::ZERO);
        assert_eq!((third * 44100).round(), 14700);
        assert!(third * 3 < Rational::one());
        assert_eq!(third / third, Rational::one());
    }

    #[test]
    fn overflow_is_reported() {
        let max = Rational::int(i64::MAX);
        assert_eq!(max.checked_add(Rational::one()), None);
        assert_eq!(max.checked_sub(-Rational::one()), None);
        assert_eq!(max.checked_mul(Rational::int(2)), None);
        assert_eq!(Rational::one().checked_div(Rational::ZERO), None);
        assert_eq!(max.checked_sub(Rational::one()), Some(Rational::int(i64::MAX - 1)));
        // the result fits even though the naive products do not
        assert_eq!(
            Rational::new(i64::MAX, 3).checked_mul(Rational::new(3, i64::MAX)),
            Some(Rational::one())
        );
        assert!(Rational::new(i64::MAX, 2) > Rational::new(i64::MAX - 2, 2));
    }

    #[test]
    #[should_panic(expected = "overflowed")]
    fn operators_panic_on_overflow() {
        let _ = Rational::int(i64::MAX) + Rational::one();
    }

    #[test]
    fn ordering_and_division() {
        assert!(Rational::new(3, 4) < Rational::new(3, 2));
        assert_eq!(Rational::int(5) / Rational::int(2), Rational::new(5, 2));
        assert_eq!((Rational::int(5) / Rational::int(2)).floor(), 2);
        assert_eq!(Rational::new(-3, 4) * 4, Rational::int(-3));
    }
}
