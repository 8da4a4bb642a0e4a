//! # virtual-stepper
//!
//! Interrupt-driven virtual stepper axes for real-time firmware.
//!
//! A virtual stepper has no STEP/DIR pins. It replays host-computed step timing
//! (`interval`, `count`, `add` ramp segments) into an absolute position
//! counter, one step per timer event. Other firmware modules read that
//! position, for example a servo loop following the commanded motion.
//!
//! ## Features
//!
//! - **Allocation-free timer path**: moves live in a fixed-size [`MovePool`];
//!   each timer event is O(1)
//! - **critical-section**: one interrupt-mask guard serializes command handlers
//!   against the timer interrupt
//! - **no_std compatible**: core library works without standard library
//! - **Fail-fast**: invalid commands shut every stepper down
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use virtual_stepper::{StepperSystem, StepTimer};
//!
//! static STEPPERS: StepperSystem<4, 32> = StepperSystem::new();
//!
//! // Task context
//! STEPPERS.config_stepper(&mut alarm, 0)?;
//! STEPPERS.dispatch_line(&mut alarm, "virtual_queue_step oid=0 interval=1000 count=5 add=0")?;
//!
//! // Timer interrupt for oid 0, interrupts masked
//! let action = STEPPERS.on_timer(cs, 0);
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Enables file I/O and TOML parsing
//! - `defmt`: Enables defmt logging for embedded targets

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
#![allow(clippy::result_large_err)]

mod fmt;

// Core modules
pub mod command;
pub mod config;
pub mod error;
pub mod motion;
pub mod stepper;
pub mod timer;

// Re-exports for ergonomic API
pub use command::{Command, PositionReport, Response};
pub use config::{validate_config, StepperConfig, SystemConfig};
pub use error::{Error, Result, ShutdownReason};
pub use motion::{Direction, Move, MoveHandle, MovePool, MoveQueue};
pub use stepper::{Position, StepperState, StepperSystem, VirtualStepper};
pub use timer::{SoftTimer, StepTimer, TimerAction};

// Configuration loading (std only)
#[cfg(feature = "std")]
pub use config::{load_config, parse_config};
