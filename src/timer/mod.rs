//! Timer primitive interface.
//!
//! The firmware's scheduler owns one alarm per stepper oid. Command handlers arm
//! it when a stepper leaves idle and disarm it on stop; after that the alarm is
//! driven by the [`TimerAction`] returned from
//! [`StepperSystem::on_timer`](crate::stepper::StepperSystem::on_timer).

mod soft;

pub use soft::SoftTimer;

/// Outcome of one timer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerAction {
    /// Keep the alarm armed for the given absolute tick.
    Reschedule(u32),
    /// Leave the alarm disarmed; the stepper is idle.
    Done,
}

/// Per-oid alarm scheduling provided by the surrounding firmware.
///
/// Both methods are called with the critical section held and must not block.
pub trait StepTimer {
    /// Arm the alarm for `oid` to fire at absolute tick `waketime`.
    fn arm(&mut self, oid: u8, waketime: u32);

    /// Disarm the alarm for `oid`. Disarming an idle alarm is a no-op.
    fn disarm(&mut self, oid: u8);
}

/// Whether tick `a` comes before tick `b` on the wrapping 32-bit clock.
#[inline]
pub fn is_before(a: u32, b: u32) -> bool {
    (a.wrapping_sub(b) as i32) < 0
}
