//! Per-axis virtual stepper state machine.
//!
//! The stepper holds the ramp state of the executing move inline and keeps
//! later moves in a [`MoveQueue`]. [`VirtualStepper::step_event`] is the timer
//! transition: it runs in interrupt context, takes no lock, never allocates,
//! and does at most one queue pop and one pool release.

use crate::error::ShutdownReason;
use crate::motion::{Direction, Move, MovePool, MoveQueue};
use crate::timer::TimerAction;

use super::position::Position;
use super::state::{StepperFlags, StepperState};

/// State of one virtual stepper axis.
#[derive(Debug, Clone)]
pub struct VirtualStepper {
    /// Absolute tick of the next step (or the base for the next move when idle).
    wake_time: u32,
    /// Delay between the next step and the one after it.
    interval: u32,
    add: i16,
    /// Steps left in the active move; zero means idle.
    count: u16,
    position: Position,
    queue: MoveQueue,
    flags: StepperFlags,
}

impl Default for VirtualStepper {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualStepper {
    /// Create an idle stepper at position zero.
    pub const fn new() -> Self {
        Self {
            wake_time: 0,
            interval: 0,
            add: 0,
            count: 0,
            position: Position::ZERO,
            queue: MoveQueue::new(),
            flags: StepperFlags::empty(),
        }
    }

    /// Current run state.
    #[inline]
    pub fn state(&self) -> StepperState {
        if self.count == 0 {
            StepperState::Idle
        } else {
            StepperState::Active
        }
    }

    /// Whether a move is executing.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.count != 0
    }

    /// Absolute tick of the next step.
    #[inline]
    pub fn wake_time(&self) -> u32 {
        self.wake_time
    }

    /// Delay that will follow the next step.
    #[inline]
    pub fn interval(&self) -> u32 {
        self.interval
    }

    /// Per-step interval increment of the active move.
    #[inline]
    pub fn add(&self) -> i16 {
        self.add
    }

    /// Steps left in the active move.
    #[inline]
    pub fn count(&self) -> u16 {
        self.count
    }

    /// Current position.
    #[inline]
    pub fn position(&self) -> Position {
        self.position
    }

    /// Overwrite the position counter.
    #[inline]
    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    /// Direction flags.
    #[inline]
    pub fn flags(&self) -> StepperFlags {
        self.flags
    }

    /// Pending moves not yet loaded.
    #[inline]
    pub fn queue(&self) -> &MoveQueue {
        &self.queue
    }

    /// Set the direction latched into moves enqueued from now on.
    #[inline]
    pub fn set_next_direction(&mut self, direction: Direction) {
        self.flags.set_next_direction(direction);
    }

    /// Set the absolute tick the next move is timed from.
    ///
    /// Only allowed while idle; an active stepper is left untouched.
    pub fn reset_clock(&mut self, waketime: u32) -> Result<(), ShutdownReason> {
        if self.is_active() {
            return Err(ShutdownReason::ResetWhileActive);
        }
        self.wake_time = waketime;
        Ok(())
    }

    /// Queue a ramp segment, latching the next-direction flag into it.
    ///
    /// Returns `Ok(Some(waketime))` when the stepper left idle and its timer
    /// must be armed. Nothing is mutated on error.
    pub fn queue_move<const N: usize>(
        &mut self,
        pool: &mut MovePool<N>,
        interval: u32,
        count: u16,
        add: i16,
    ) -> Result<Option<u32>, ShutdownReason> {
        if count == 0 {
            return Err(ShutdownReason::InvalidCount);
        }
        let mv = Move {
            interval,
            add,
            count,
            direction: self.flags.next_direction(),
        };
        let handle = pool
            .allocate(mv)
            .ok_or(ShutdownReason::MoveQueueOverflow)?;

        self.queue.push_back(pool, handle);
        if self.is_active() {
            return Ok(None);
        }
        match self.load_next(pool) {
            TimerAction::Reschedule(waketime) => Ok(Some(waketime)),
            TimerAction::Done => Ok(None),
        }
    }

    /// Timer transition: take one step and decide when to fire next.
    ///
    /// Must only be called while active.
    pub fn step_event<const N: usize>(&mut self, pool: &mut MovePool<N>) -> TimerAction {
        debug_assert!(self.is_active(), "timer event on idle stepper");
        self.position.step(self.flags.current_direction());

        let count = self.count.wrapping_sub(1);
        if count != 0 {
            self.count = count;
            self.wake_time = self.wake_time.wrapping_add(self.interval);
            self.interval = Move::ramped_interval(self.interval, self.add);
            return TimerAction::Reschedule(self.wake_time);
        }
        self.load_next(pool)
    }

    /// Install the queue head as the active move, or go idle.
    fn load_next<const N: usize>(&mut self, pool: &mut MovePool<N>) -> TimerAction {
        let Some(handle) = self.queue.pop_front(pool) else {
            self.count = 0;
            return TimerAction::Done;
        };
        let mv = *pool.get(handle);
        pool.release(handle);

        self.wake_time = self.wake_time.wrapping_add(mv.interval);
        self.add = mv.add;
        self.interval = Move::ramped_interval(mv.interval, mv.add);
        self.count = mv.count;
        self.flags.set_current_direction(mv.direction);
        TimerAction::Reschedule(self.wake_time)
    }

    /// Drop the active move and every queued move, returning to idle.
    ///
    /// The caller disarms the timer. Position is kept.
    pub fn stop<const N: usize>(&mut self, pool: &mut MovePool<N>) {
        self.wake_time = 0;
        self.count = 0;
        self.flags = StepperFlags::empty();
        self.queue.clear(pool);
    }
}
