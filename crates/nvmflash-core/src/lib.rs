//! nvmflash-core - Core library for on-chip flash algorithms
//!
//! This crate provides the traits that connect a generic flash download
//! orchestrator, a controller-specific flash algorithm and the debug target
//! that gives access to the chip. It is designed to be `no_std` compatible.
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc`)
//! - `alloc` - Enable boxed trait objects
//! - `is_sync` - Compile the `maybe_async` traits as blocking
//!
//! # Example
//!
//! ```ignore
//! use nvmflash_core::{FlashAlgorithm, Result};
//!
//! fn sizing<A: FlashAlgorithm>(algo: &mut A) -> Result<()> {
//!     algo.init()?;
//!     let row = algo.page_info(0)?;
//!     println!("erase unit: {} bytes", row.size);
//!     Ok(())
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
// Allow async fn in traits - we use maybe-async for dual sync/async support
#![allow(async_fn_in_trait)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod error;
pub mod flash;
pub mod target;

pub use error::{Error, Precondition, Result};
pub use flash::{
    FlashAlgorithm, FlashInfo, PageInfo, DEFAULT_PAGE_ERASE_WEIGHT, DEFAULT_PAGE_PROGRAM_WEIGHT,
};
pub use target::{Target, TargetState};
