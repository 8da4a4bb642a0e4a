//! Stepper run state and direction flags.

use crate::motion::Direction;

/// Run state of a virtual stepper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StepperState {
    /// No active move; the timer is disarmed.
    Idle,
    /// A move is executing; the timer is armed for the stored wake time.
    Active,
}

impl StepperState {
    /// State name for display/debugging.
    pub fn name(self) -> &'static str {
        match self {
            StepperState::Idle => "Idle",
            StepperState::Active => "Active",
        }
    }
}

/// Direction flag bits of a stepper.
///
/// `CURRENT_DIR` belongs to the executing move. `NEXT_DIR` is latched into each
/// move as it is enqueued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepperFlags(u8);

impl StepperFlags {
    /// Direction of the move being executed.
    pub const CURRENT_DIR: u8 = 1 << 0;
    /// Direction applied to the next enqueued move.
    pub const NEXT_DIR: u8 = 1 << 1;

    /// All flags cleared.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Raw bit value.
    #[inline]
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Direction of the executing move.
    #[inline]
    pub fn current_direction(self) -> Direction {
        Direction::from_bit(self.0 & Self::CURRENT_DIR != 0)
    }

    /// Direction latched into the next enqueued move.
    #[inline]
    pub fn next_direction(self) -> Direction {
        Direction::from_bit(self.0 & Self::NEXT_DIR != 0)
    }

    #[inline]
    pub(crate) fn set_current_direction(&mut self, direction: Direction) {
        self.set(Self::CURRENT_DIR, direction.bit());
    }

    #[inline]
    pub(crate) fn set_next_direction(&mut self, direction: Direction) {
        self.set(Self::NEXT_DIR, direction.bit());
    }

    fn set(&mut self, mask: u8, on: bool) {
        self.0 = (self.0 & !mask) | if on { mask } else { 0 };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_are_independent() {
        let mut flags = StepperFlags::empty();
        flags.set_next_direction(Direction::Forward);
        assert_eq!(flags.bits(), StepperFlags::NEXT_DIR);
        assert_eq!(flags.current_direction(), Direction::Reverse);

        flags.set_current_direction(Direction::Forward);
        flags.set_next_direction(Direction::Reverse);
        assert_eq!(flags.bits(), StepperFlags::CURRENT_DIR);
    }
}
