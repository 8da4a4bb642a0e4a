//! Configuration validation.

use crate::command::Command;
use crate::error::{ConfigError, Error, Result};

use super::SystemConfig;

/// Validate a system configuration against a registry of `capacity` steppers.
///
/// Checks:
/// - No more steppers than the registry holds
/// - Every oid fits in the registry
/// - No oid is used twice
/// - Every init line parses as a command
pub fn validate_config(config: &SystemConfig, capacity: usize) -> Result<()> {
    if config.steppers.len() > capacity {
        return Err(Error::Config(ConfigError::TooManySteppers(
            config.steppers.len(),
        )));
    }

    for (i, stepper) in config.steppers.iter().enumerate() {
        if stepper.oid as usize >= capacity {
            return Err(Error::Config(ConfigError::OidOutOfRange {
                oid: stepper.oid,
                capacity,
            }));
        }
        if config.steppers[..i].iter().any(|s| s.oid == stepper.oid) {
            return Err(Error::Config(ConfigError::DuplicateOid(stepper.oid)));
        }
    }

    for line in config.init.iter() {
        Command::parse(line)?;
    }

    Ok(())
}
