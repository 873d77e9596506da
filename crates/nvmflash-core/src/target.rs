//! Debug target trait definitions
//!
//! A flash algorithm never talks to a probe directly. It drives the chip
//! through a [`Target`], which provides run control and memory access on the
//! system bus of the device being programmed.
//!
//! These traits use `maybe_async` to support both sync and async modes.
//! - By default, traits are async (suitable for WASM/web, Embassy, tokio)
//! - With the `is_sync` feature, traits become synchronous

use crate::error::Result;
use maybe_async::maybe_async;

/// Device state requested from the target before flash access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState {
    /// Core halted with clocks and flash controller set up for programming
    Program,
    /// Normal execution
    Run,
}

/// Debug target trait (sync or async depending on `is_sync` feature)
///
/// All addresses are 32-bit system bus addresses. Sized accesses must be
/// naturally aligned; implementations are free to reject anything else with
/// [`Error::TargetAccess`](crate::Error::TargetAccess).
#[maybe_async(AFIT)]
pub trait Target {
    /// Halt the core
    async fn halt(&mut self) -> Result<()>;

    /// Transition the device into the given state
    async fn set_state(&mut self, state: TargetState) -> Result<()>;

    /// Read an 8-bit value
    async fn read8(&mut self, addr: u32) -> Result<u8>;

    /// Read a 16-bit value
    async fn read16(&mut self, addr: u32) -> Result<u16>;

    /// Read a 32-bit value
    async fn read32(&mut self, addr: u32) -> Result<u32>;

    /// Write an 8-bit value
    async fn write8(&mut self, addr: u32, value: u8) -> Result<()>;

    /// Write a 16-bit value
    async fn write16(&mut self, addr: u32, value: u16) -> Result<()>;

    /// Write a 32-bit value
    async fn write32(&mut self, addr: u32, value: u32) -> Result<()>;

    /// Write consecutive 32-bit words starting at a word-aligned address
    async fn write_block32(&mut self, addr: u32, words: &[u32]) -> Result<()>;

    /// Delay for the specified number of microseconds
    ///
    /// Flash algorithms use this between polls of a busy flag, so a target
    /// backed by simulated hardware can advance its own clock here.
    async fn delay_us(&mut self, us: u32);
}

// Blanket impl for boxed targets to allow trait objects (sync mode only)
// In async mode, traits with async fn are not object-safe
#[cfg(all(feature = "alloc", feature = "is_sync"))]
impl Target for alloc::boxed::Box<dyn Target + Send> {
    fn halt(&mut self) -> Result<()> {
        (**self).halt()
    }

    fn set_state(&mut self, state: TargetState) -> Result<()> {
        (**self).set_state(state)
    }

    fn read8(&mut self, addr: u32) -> Result<u8> {
        (**self).read8(addr)
    }

    fn read16(&mut self, addr: u32) -> Result<u16> {
        (**self).read16(addr)
    }

    fn read32(&mut self, addr: u32) -> Result<u32> {
        (**self).read32(addr)
    }

    fn write8(&mut self, addr: u32, value: u8) -> Result<()> {
        (**self).write8(addr, value)
    }

    fn write16(&mut self, addr: u32, value: u16) -> Result<()> {
        (**self).write16(addr, value)
    }

    fn write32(&mut self, addr: u32, value: u32) -> Result<()> {
        (**self).write32(addr, value)
    }

    fn write_block32(&mut self, addr: u32, words: &[u32]) -> Result<()> {
        (**self).write_block32(addr, words)
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }
}
