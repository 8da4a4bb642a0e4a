//! Software step timer driven by an embedded-hal delay.
//!
//! Useful on hosts and in tests where no hardware alarm exists. The timer keeps
//! its own tick counter, sleeps through [`DelayNs`] until the earliest armed
//! wake time, then invokes the stepper system's timer entry point inside a
//! critical section, just as a hardware alarm interrupt would.

use embedded_hal::delay::DelayNs;

use super::{is_before, StepTimer, TimerAction};
use crate::stepper::StepperSystem;

/// One delivered timer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerEvent {
    /// Stepper the event was delivered to.
    pub oid: u8,
    /// Tick the event was scheduled for.
    pub waketime: u32,
}

/// Delay-driven implementation of [`StepTimer`] for up to `N` oids.
pub struct SoftTimer<D, const N: usize>
where
    D: DelayNs,
{
    delay: D,
    /// Nanoseconds per clock tick; zero runs in simulated time only.
    ns_per_tick: u32,
    now: u32,
    alarms: [Option<u32>; N],
}

impl<D, const N: usize> SoftTimer<D, N>
where
    D: DelayNs,
{
    /// Create a timer whose clock starts at tick 0.
    pub fn new(delay: D, ns_per_tick: u32) -> Self {
        Self {
            delay,
            ns_per_tick,
            now: 0,
            alarms: [None; N],
        }
    }

    /// Current tick.
    #[inline]
    pub fn now(&self) -> u32 {
        self.now
    }

    /// Armed wake time for `oid`, if any.
    #[inline]
    pub fn alarm(&self, oid: u8) -> Option<u32> {
        self.alarms.get(oid as usize).copied().flatten()
    }

    /// Whether no alarm is armed.
    pub fn is_idle(&self) -> bool {
        self.alarms.iter().all(Option::is_none)
    }

    /// Earliest armed alarm relative to the current tick.
    pub fn next_due(&self) -> Option<TimerEvent> {
        let now = self.now;
        self.alarms
            .iter()
            .enumerate()
            .filter_map(|(oid, alarm)| alarm.map(|t| (oid as u8, t)))
            .min_by_key(|&(_, t)| t.wrapping_sub(now) as i32)
            .map(|(oid, waketime)| TimerEvent { oid, waketime })
    }

    /// Wait for and deliver the earliest armed event.
    ///
    /// Returns `None` when nothing is armed.
    pub fn run_once<const S: usize, const M: usize>(
        &mut self,
        system: &StepperSystem<S, M>,
    ) -> Option<TimerEvent> {
        let event = self.next_due()?;
        if is_before(self.now, event.waketime) {
            self.sleep_ticks(event.waketime.wrapping_sub(self.now));
            self.now = event.waketime;
        }
        self.alarms[event.oid as usize] = None;

        let action = critical_section::with(|cs| system.on_timer(cs, event.oid));
        if let TimerAction::Reschedule(waketime) = action {
            self.alarms[event.oid as usize] = Some(waketime);
        }
        Some(event)
    }

    /// Deliver events until every alarm is disarmed or `max_events` were run.
    ///
    /// Returns the number of events delivered.
    pub fn run_until_idle<const S: usize, const M: usize>(
        &mut self,
        system: &StepperSystem<S, M>,
        max_events: usize,
    ) -> usize {
        let mut delivered = 0;
        while delivered < max_events && self.run_once(system).is_some() {
            delivered += 1;
        }
        delivered
    }

    /// Release the delay provider.
    pub fn release(self) -> D {
        self.delay
    }

    fn sleep_ticks(&mut self, ticks: u32) {
        let mut remaining = ticks as u64 * self.ns_per_tick as u64;
        while remaining > 0 {
            let chunk = remaining.min(u32::MAX as u64) as u32;
            self.delay.delay_ns(chunk);
            remaining -= chunk as u64;
        }
    }
}

impl<D, const N: usize> StepTimer for SoftTimer<D, N>
where
    D: DelayNs,
{
    fn arm(&mut self, oid: u8, waketime: u32) {
        if let Some(alarm) = self.alarms.get_mut(oid as usize) {
            *alarm = Some(waketime);
        }
    }

    fn disarm(&mut self, oid: u8) {
        if let Some(alarm) = self.alarms.get_mut(oid as usize) {
            *alarm = None;
        }
    }
}
