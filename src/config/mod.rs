//! Configuration module for virtual-stepper.
//!
//! Describes which virtual steppers exist on the device and which commands run
//! once they are configured. Loaded from TOML files (with `std` feature) or
//! built from pre-parsed data.

#[cfg(feature = "std")]
mod loader;
mod stepper;
mod system;
mod validation;

pub use stepper::StepperConfig;
pub use system::{SystemConfig, MAX_INIT_COMMANDS, MAX_STEPPERS};
pub use validation::validate_config;

#[cfg(feature = "std")]
pub use loader::{load_config, parse_config};
