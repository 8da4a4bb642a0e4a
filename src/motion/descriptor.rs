//! Move descriptors - one queued linear ramp segment.

/// Direction of stepper motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Position counts up on each step.
    Forward,
    /// Position counts down on each step.
    Reverse,
}

impl Direction {
    /// Get direction from the wire direction bit.
    #[inline]
    pub fn from_bit(bit: bool) -> Self {
        if bit {
            Direction::Forward
        } else {
            Direction::Reverse
        }
    }

    /// The wire direction bit for this direction.
    #[inline]
    pub fn bit(self) -> bool {
        self == Direction::Forward
    }
}

/// One ramp segment as queued by the host.
///
/// `count` steps are taken. The first step fires `interval` ticks after the
/// previous wake time; after every step the interval grows by `add`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    /// Ticks until the first step of this segment.
    pub interval: u32,
    /// Signed per-step interval increment.
    pub add: i16,
    /// Number of steps, never zero once queued.
    pub count: u16,
    /// Direction latched from the stepper's next-direction flag at enqueue time.
    pub direction: Direction,
}

impl Move {
    /// Placeholder contents for a free pool slot.
    pub const EMPTY: Move = Move {
        interval: 0,
        add: 0,
        count: 0,
        direction: Direction::Reverse,
    };

    /// Interval after one application of the ramp increment.
    ///
    /// Arithmetic is modular: `add` is sign-extended and the sum wraps at 32 bits.
    #[inline]
    pub fn ramped_interval(interval: u32, add: i16) -> u32 {
        interval.wrapping_add(add as i32 as u32)
    }
}

impl Default for Move {
    fn default() -> Self {
        Self::EMPTY
    }
}
