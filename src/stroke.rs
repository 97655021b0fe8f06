// pluck-synth -- plucked string synthesis from chord charts
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! How a chord is strummed.

use crate::temporal::Time;

/// Which way the hand moves across the strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Towards the floor, starting at the last string of the tuning.
    Down,
    /// Towards the face, starting at string 0.
    Up,
}

/// The direction of a strum together with the delay between two adjacent
/// strings starting to ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Velocity {
    pub direction: Direction,
    pub delay: Time,
}

impl Velocity {
    pub fn down(delay: Time) -> Self {
        Self {
            direction: Direction::Down,
            delay,
        }
    }

    pub fn up(delay: Time) -> Self {
        Self {
            direction: Direction::Up,
            delay,
        }
    }
}
