//! Stepper module for virtual-stepper.
//!
//! The per-axis state machine, the oid registry, and the system facade that
//! serializes task-context handlers against the timer interrupt.

mod position;
mod registry;
mod state;
mod system;
mod virtual_stepper;

pub use position::Position;
pub use registry::StepperRegistry;
pub use state::{StepperFlags, StepperState};
pub use system::StepperSystem;
pub use virtual_stepper::VirtualStepper;
