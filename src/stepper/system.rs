//! Stepper system: the shared state of every virtual stepper and the command
//! handlers that operate on it.
//!
//! All shared state sits in one `critical_section::Mutex`. Handlers run in task
//! context and take the critical section for the span of their access. The
//! timer entry point [`StepperSystem::on_timer`] and the `*_raw` accessors run
//! with interrupts already masked and receive the [`CriticalSection`] token
//! instead of taking the lock.
//!
//! Any fault a handler detects shuts the whole system down: every stepper is
//! stopped, its timer disarmed, and later commands are refused until
//! [`StepperSystem::clear_shutdown`].

use core::cell::RefCell;

use critical_section::{CriticalSection, Mutex};

use crate::command::PositionReport;
use crate::config::SystemConfig;
use crate::error::{Error, Result, ShutdownReason};
use crate::fmt::{debug, error, info, warning};
use crate::motion::{Direction, MovePool};
use crate::timer::{StepTimer, TimerAction};

use super::position::Position;
use super::registry::StepperRegistry;
use super::virtual_stepper::VirtualStepper;

struct Shared<const S: usize, const M: usize> {
    registry: StepperRegistry<S>,
    pool: MovePool<M>,
    shutdown: Option<ShutdownReason>,
}

impl<const S: usize, const M: usize> Shared<S, M> {
    /// Disarm and stop one stepper. Returns `false` for an unknown oid.
    fn stop<T: StepTimer>(&mut self, timer: &mut T, oid: u8) -> bool {
        let Some(stepper) = self.registry.get_mut(oid) else {
            return false;
        };
        timer.disarm(oid);
        stepper.stop(&mut self.pool);
        debug!("virtual stepper {} stopped", oid);
        true
    }
}

/// Every virtual stepper of the device plus the move pool they share.
///
/// `S` is the registry capacity (highest oid + 1) and `M` the number of move
/// descriptors. `new` is `const` so the system can live in a `static` shared
/// with the timer interrupt.
pub struct StepperSystem<const S: usize, const M: usize> {
    shared: Mutex<RefCell<Shared<S, M>>>,
}

impl<const S: usize, const M: usize> Default for StepperSystem<S, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const S: usize, const M: usize> StepperSystem<S, M> {
    /// Create a system with no steppers configured.
    pub const fn new() -> Self {
        Self {
            shared: Mutex::new(RefCell::new(Shared {
                registry: StepperRegistry::new(),
                pool: MovePool::new(),
                shutdown: None,
            })),
        }
    }

    /// Configure every stepper listed in `config`.
    ///
    /// The configuration is validated first; invalid configurations change
    /// nothing. Each stepper starts at its configured position with a step clock
    /// of zero, then the init commands run in order.
    pub fn configure<T: StepTimer>(&self, timer: &mut T, config: &SystemConfig) -> Result<()> {
        crate::config::validate_config(config, S)?;
        for stepper in config.steppers.iter() {
            self.config_stepper(timer, stepper.oid)?;
            if let Some(position) = stepper.position {
                critical_section::with(|cs| {
                    self.set_position_raw(cs, stepper.oid, Position::new(position));
                });
            }
        }
        for line in config.init.iter() {
            self.dispatch_line(timer, line)?;
        }
        Ok(())
    }

    /// `config_virtual_stepper`: allocate the stepper for `oid`.
    pub fn config_stepper<T: StepTimer>(&self, timer: &mut T, oid: u8) -> Result<()> {
        self.handle(timer, |shared, _| shared.registry.configure(oid).map(|_| ()))?;
        info!("virtual stepper {} configured", oid);
        Ok(())
    }

    /// `virtual_queue_step`: queue a ramp segment of `count` steps.
    ///
    /// The next-direction flag is latched into the segment now. When the
    /// stepper was idle the segment is loaded at once and the timer armed.
    /// The oid is resolved before the count is checked, so a zero count on an
    /// unknown oid reports the oid.
    pub fn queue_move<T: StepTimer>(
        &self,
        timer: &mut T,
        oid: u8,
        interval: u32,
        count: u16,
        add: i16,
    ) -> Result<()> {
        self.handle(timer, |shared, timer| {
            let Shared { registry, pool, .. } = shared;
            let arm = registry
                .lookup(oid)?
                .queue_move(pool, interval, count, add)
                .map_err(|reason| {
                    if reason == ShutdownReason::MoveQueueOverflow {
                        warning!("move pool exhausted on oid {}", oid);
                    }
                    reason
                })?;
            if let Some(waketime) = arm {
                timer.arm(oid, waketime);
            }
            Ok(())
        })
    }

    /// `virtual_set_next_step_dir`: direction for moves enqueued from now on.
    pub fn set_next_direction<T: StepTimer>(
        &self,
        timer: &mut T,
        oid: u8,
        direction: Direction,
    ) -> Result<()> {
        self.handle(timer, |shared, _| {
            shared.registry.lookup(oid)?.set_next_direction(direction);
            Ok(())
        })
    }

    /// `virtual_reset_step_clock`: time the next move relative to `clock`.
    pub fn reset_clock<T: StepTimer>(&self, timer: &mut T, oid: u8, clock: u32) -> Result<()> {
        self.handle(timer, |shared, _| shared.registry.lookup(oid)?.reset_clock(clock))
    }

    /// `virtual_stepper_get_position`: snapshot the position.
    pub fn get_position<T: StepTimer>(&self, timer: &mut T, oid: u8) -> Result<PositionReport> {
        let position = self.handle(timer, |shared, _| Ok(shared.registry.lookup(oid)?.position()))?;
        Ok(PositionReport { oid, position })
    }

    /// Stop one stepper: disarm its timer and flush its queue. Idempotent.
    pub fn stop<T: StepTimer>(&self, timer: &mut T, oid: u8) -> Result<()> {
        self.handle(timer, |shared, timer| {
            shared.registry.lookup(oid)?;
            shared.stop(timer, oid);
            Ok(())
        })
    }

    /// Raise a fatal fault: stop every stepper and refuse further commands.
    ///
    /// Returns the reason now in effect. A second shutdown keeps the first
    /// reason but still stops everything.
    pub fn shutdown<T: StepTimer>(&self, timer: &mut T, reason: ShutdownReason) -> ShutdownReason {
        critical_section::with(|cs| self.shutdown_raw(cs, timer, reason))
    }

    /// Shutdown with the critical section already held.
    pub fn shutdown_raw<T: StepTimer>(
        &self,
        cs: CriticalSection<'_>,
        timer: &mut T,
        reason: ShutdownReason,
    ) -> ShutdownReason {
        let mut shared = self.shared.borrow_ref_mut(cs);
        let Shared {
            registry,
            pool,
            shutdown,
        } = &mut *shared;
        for (oid, stepper) in registry.iter_mut() {
            timer.disarm(oid);
            stepper.stop(pool);
        }
        let reason = *shutdown.get_or_insert(reason);
        error!("shutdown: {}", reason.as_str());
        reason
    }

    /// Leave the shutdown state. Steppers are already idle.
    pub fn clear_shutdown(&self) {
        critical_section::with(|cs| self.shared.borrow_ref_mut(cs).shutdown = None);
        info!("shutdown cleared");
    }

    /// Reason of the active shutdown, if any.
    pub fn shutdown_reason(&self) -> Option<ShutdownReason> {
        critical_section::with(|cs| self.shared.borrow_ref(cs).shutdown)
    }

    /// Whether `oid` names a configured virtual stepper.
    pub fn verify(&self, oid: u8) -> bool {
        critical_section::with(|cs| self.shared.borrow_ref(cs).registry.verify(oid))
    }

    /// Run `f` on a consistent snapshot of one stepper.
    pub fn inspect<R>(&self, oid: u8, f: impl FnOnce(&VirtualStepper) -> R) -> Option<R> {
        critical_section::with(|cs| self.shared.borrow_ref(cs).registry.get(oid).map(f))
    }

    /// Number of configured steppers.
    pub fn stepper_count(&self) -> usize {
        critical_section::with(|cs| self.shared.borrow_ref(cs).registry.count())
    }

    /// Queued (not yet loaded) moves of one stepper.
    pub fn queued_moves(&self, oid: u8) -> Option<usize> {
        critical_section::with(|cs| {
            let shared = self.shared.borrow_ref(cs);
            shared.registry.get(oid).map(|s| s.queue().len(&shared.pool))
        })
    }

    /// Free move descriptors.
    pub fn pool_available(&self) -> usize {
        critical_section::with(|cs| self.shared.borrow_ref(cs).pool.available())
    }

    /// Timer entry point: one step event for `oid`.
    ///
    /// Runs in interrupt context with interrupts masked; never takes the lock,
    /// allocates, or logs. An event for an unknown or idle stepper is ignored.
    pub fn on_timer(&self, cs: CriticalSection<'_>, oid: u8) -> TimerAction {
        let mut shared = self.shared.borrow_ref_mut(cs);
        let Shared { registry, pool, .. } = &mut *shared;
        match registry.get_mut(oid) {
            Some(stepper) if stepper.is_active() => stepper.step_event(pool),
            _ => TimerAction::Done,
        }
    }

    /// Position of `oid`. Caller holds the critical section.
    pub fn position_raw(&self, cs: CriticalSection<'_>, oid: u8) -> Option<Position> {
        self.shared.borrow_ref(cs).registry.get(oid).map(VirtualStepper::position)
    }

    /// Overwrite the position of `oid`. Caller holds the critical section.
    ///
    /// Returns `false` if `oid` is not a virtual stepper.
    pub fn set_position_raw(&self, cs: CriticalSection<'_>, oid: u8, position: Position) -> bool {
        match self.shared.borrow_ref_mut(cs).registry.get_mut(oid) {
            Some(stepper) => {
                stepper.set_position(position);
                true
            }
            None => false,
        }
    }

    /// Stop `oid`. Caller holds the critical section. Unknown oids are ignored.
    pub fn stop_raw<T: StepTimer>(&self, cs: CriticalSection<'_>, timer: &mut T, oid: u8) {
        self.shared.borrow_ref_mut(cs).stop(timer, oid);
    }

    /// Run a handler body inside the critical section, turning its fault into
    /// a system shutdown.
    fn handle<T, R, F>(&self, timer: &mut T, f: F) -> Result<R>
    where
        T: StepTimer,
        F: FnOnce(&mut Shared<S, M>, &mut T) -> core::result::Result<R, ShutdownReason>,
    {
        critical_section::with(|cs| {
            let outcome = {
                let mut shared = self.shared.borrow_ref_mut(cs);
                if let Some(reason) = shared.shutdown {
                    return Err(Error::IsShutdown(reason));
                }
                f(&mut *shared, &mut *timer)
            };
            outcome.map_err(|reason| Error::Shutdown(self.shutdown_raw(cs, timer, reason)))
        })
    }
}
