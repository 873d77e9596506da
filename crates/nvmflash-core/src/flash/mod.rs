//! Flash algorithm abstractions
//!
//! This module defines the interface a generic download orchestrator uses to
//! size, erase and program on-chip flash, independent of the controller
//! family underneath.

mod algorithm;
mod info;

pub use algorithm::FlashAlgorithm;
pub use info::*;
