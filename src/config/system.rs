//! System configuration - root configuration structure.

use heapless::{String, Vec};
use serde::Deserialize;

use super::stepper::StepperConfig;

/// Maximum number of stepper entries in a configuration.
pub const MAX_STEPPERS: usize = 16;

/// Maximum number of init command lines in a configuration.
pub const MAX_INIT_COMMANDS: usize = 32;

/// Root configuration structure from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SystemConfig {
    /// Virtual steppers to configure.
    #[serde(default)]
    pub steppers: Vec<StepperConfig, MAX_STEPPERS>,

    /// Wire-format commands dispatched once every stepper is configured.
    #[serde(default)]
    pub init: Vec<String<64>, MAX_INIT_COMMANDS>,
}

impl SystemConfig {
    /// Get a stepper configuration by oid.
    pub fn stepper(&self, oid: u8) -> Option<&StepperConfig> {
        self.steppers.iter().find(|s| s.oid == oid)
    }

    /// Get a stepper configuration by name.
    pub fn stepper_by_name(&self, name: &str) -> Option<&StepperConfig> {
        self.steppers.iter().find(|s| s.name.as_str() == name)
    }

    /// List all configured oids.
    pub fn oids(&self) -> impl Iterator<Item = u8> + '_ {
        self.steppers.iter().map(|s| s.oid)
    }
}
