//! Per-stepper configuration from TOML.

use heapless::String;
use serde::Deserialize;

/// One virtual stepper to configure at start-up.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StepperConfig {
    /// Object id the host addresses the stepper by.
    pub oid: u8,

    /// Human-readable name (max 32 chars).
    #[serde(default)]
    pub name: String<32>,

    /// Initial raw position counter.
    #[serde(default)]
    pub position: Option<u32>,
}
