//! Position tracking for virtual steppers.
//!
//! Position is a modular 32-bit step counter. Stepping below zero wraps to
//! `u32::MAX` and the wire report reinterprets the bits as `i32`; neither end
//! assumes true signed semantics.

use crate::motion::Direction;

/// Absolute step position, wrapping at 32 bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Position(u32);

impl Position {
    /// Origin.
    pub const ZERO: Position = Position(0);

    /// Create a position from its raw counter value.
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw unsigned counter value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Counter reinterpreted as `i32`, as sent in `stepper_position`.
    #[inline]
    pub const fn reported(self) -> i32 {
        self.0 as i32
    }

    /// Move one step in `direction`.
    #[inline]
    pub fn step(&mut self, direction: Direction) {
        self.0 = match direction {
            Direction::Forward => self.0.wrapping_add(1),
            Direction::Reverse => self.0.wrapping_sub(1),
        };
    }
}

impl From<u32> for Position {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl From<Position> for u32 {
    fn from(p: Position) -> Self {
        p.0
    }
}
