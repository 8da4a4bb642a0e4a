//! Motion module for virtual-stepper.
//!
//! Move descriptors, the fixed-size pool that stores them, and the per-stepper
//! FIFO that orders them.

mod descriptor;
mod pool;
mod queue;

pub use descriptor::{Direction, Move};
pub use pool::{MoveHandle, MovePool};
pub use queue::MoveQueue;
