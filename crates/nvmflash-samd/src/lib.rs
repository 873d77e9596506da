//! nvmflash-samd - SAMD NVMCTRL flash algorithm
//!
//! This crate drives the NVM controller found on Microchip (Atmel) SAMD20,
//! SAMD21 and related parts through a debug [`Target`](nvmflash_core::Target).
//!
//! The controller is register driven: ADDR takes a half-word address, CTRLA
//! takes a command together with the `0xA5` execution key, INTFLAG.READY
//! signals completion and STATUS carries sticky error bits. Flash is erased
//! in rows of four pages and programmed a page at a time through the page
//! buffer.
//!
//! # Features
//!
//! - `std` - Standard library support, RON config loading (includes `alloc`)
//! - `alloc` - Boxed targets
//! - `is_sync` - Blocking API (default)

#![cfg_attr(not(feature = "std"), no_std)]

pub mod config;
mod flash;
pub mod geometry;
pub mod nvmctrl;
pub mod regs;

#[cfg(feature = "std")]
pub use config::ConfigError;
pub use config::SamdConfig;
pub use flash::{pack_words, padded_len, SamdFlash};
pub use geometry::FlashGeometry;
