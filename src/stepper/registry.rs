//! Oid-indexed table of configured virtual steppers.

use crate::error::ShutdownReason;

use super::virtual_stepper::VirtualStepper;

/// Fixed-capacity registry mapping oids to virtual steppers.
///
/// An oid is configured at most once and then lives for the life of the device.
#[derive(Debug)]
pub struct StepperRegistry<const N: usize> {
    slots: [Option<VirtualStepper>; N],
}

impl<const N: usize> Default for StepperRegistry<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> StepperRegistry<N> {
    const VACANT: Option<VirtualStepper> = None;

    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            slots: [Self::VACANT; N],
        }
    }

    /// Allocate and initialize the stepper for `oid`.
    pub fn configure(&mut self, oid: u8) -> Result<&mut VirtualStepper, ShutdownReason> {
        let slot = self
            .slots
            .get_mut(oid as usize)
            .ok_or(ShutdownReason::OidAssign)?;
        if slot.is_some() {
            return Err(ShutdownReason::OidAssign);
        }
        Ok(slot.insert(VirtualStepper::new()))
    }

    /// Whether `oid` names a configured virtual stepper.
    #[inline]
    pub fn verify(&self, oid: u8) -> bool {
        self.get(oid).is_some()
    }

    /// Stepper for `oid`, if configured.
    #[inline]
    pub fn get(&self, oid: u8) -> Option<&VirtualStepper> {
        self.slots.get(oid as usize).and_then(Option::as_ref)
    }

    /// Mutable stepper for `oid`, if configured.
    #[inline]
    pub fn get_mut(&mut self, oid: u8) -> Option<&mut VirtualStepper> {
        self.slots.get_mut(oid as usize).and_then(Option::as_mut)
    }

    /// Look up a stepper, failing with the shutdown reason for an unknown oid.
    pub fn lookup(&mut self, oid: u8) -> Result<&mut VirtualStepper, ShutdownReason> {
        self.get_mut(oid).ok_or(ShutdownReason::InvalidOid)
    }

    /// Number of configured steppers.
    pub fn count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Every configured stepper with its oid.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &VirtualStepper)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(oid, s)| s.as_ref().map(|s| (oid as u8, s)))
    }

    /// Every configured stepper with its oid, mutably. Used by shutdown.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (u8, &mut VirtualStepper)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(oid, s)| s.as_mut().map(|s| (oid as u8, s)))
    }
}
