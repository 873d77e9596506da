//! Flash algorithm trait
//!
//! Uses `maybe_async` to support both sync and async modes.

use super::info::{FlashInfo, PageInfo};
use crate::error::Result;
use maybe_async::maybe_async;

/// A controller-specific flash programming algorithm
///
/// The orchestrator decides *what* to erase and program; implementations of
/// this trait know *how* for one flash controller family. Each family gets
/// its own implementation that owns (or borrows) a [`Target`](crate::Target).
///
/// # Lifecycle
///
/// `init()` must succeed before any other method. Metadata methods fail with
/// [`Precondition::NotInitialized`](crate::Precondition::NotInitialized)
/// until then.
///
/// # Example
///
/// ```ignore
/// use nvmflash_core::FlashAlgorithm;
///
/// fn flash_image<A: FlashAlgorithm>(algo: &mut A, image: &[u8]) -> nvmflash_core::Result<()> {
///     algo.init()?;
///     algo.erase_all()?;
///     let page = algo.page_size()? as usize;
///     for (i, chunk) in image.chunks(page).enumerate() {
///         algo.program_page((i * page) as u32, chunk)?;
///     }
///     Ok(())
/// }
/// ```
#[maybe_async(AFIT)]
pub trait FlashAlgorithm {
    /// Prepare the target and discover the flash geometry
    async fn init(&mut self) -> Result<()>;

    /// Get info about the erase unit that contains this address
    fn page_info(&self, addr: u32) -> Result<PageInfo>;

    /// Get info about the whole flash array
    fn flash_info(&self) -> Result<FlashInfo>;

    /// Get the program granularity in bytes
    fn page_size(&self) -> Result<u32>;

    /// Erase the erase unit starting at `addr`
    async fn erase_sector(&mut self, addr: u32) -> Result<()>;

    /// Erase all of program flash
    async fn erase_all(&mut self) -> Result<()>;

    /// Program one page
    ///
    /// `addr` must be aligned to [`page_size`](Self::page_size). `data` may
    /// be shorter than a page; the target region is expected to be erased.
    async fn program_page(&mut self, addr: u32, data: &[u8]) -> Result<()>;
}
