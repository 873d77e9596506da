//! SAMD flash algorithm
//!
//! Erases row by row and programs through the NVMCTRL page buffer. Whole
//! device erase never uses the DSU chip erase, which would also wipe the
//! emulated EEPROM area that shares the NVM array.
//!
//! Uses `maybe_async` to support both sync and async modes.

use crate::config::SamdConfig;
use crate::geometry::FlashGeometry;
use crate::nvmctrl::{Nvmctrl, WaitPolicy};
use crate::regs::{CtrlB, NvmCommand};
use maybe_async::maybe_async;
use nvmflash_core::{
    Error, FlashAlgorithm, FlashInfo, PageInfo, Precondition, Result, Target, TargetState,
};

/// Words packed per block write
const BLOCK_WORDS: usize = 64;

/// Flash algorithm for the SAMD NVMCTRL
///
/// Owns the target for the duration of a programming session. Geometry is
/// read from the controller once in [`FlashAlgorithm::init`].
///
/// # Example
///
/// ```ignore
/// use nvmflash_core::FlashAlgorithm;
/// use nvmflash_samd::SamdFlash;
///
/// let mut flash = SamdFlash::new(target);
/// flash.init()?;
/// flash.erase_all()?;
/// flash.program_page(0, &image[..64])?;
/// ```
pub struct SamdFlash<T: Target> {
    target: T,
    config: SamdConfig,
    nvm: Nvmctrl,
    geometry: Option<FlashGeometry>,
}

impl<T: Target> SamdFlash<T> {
    /// Create a flash algorithm with the default configuration
    pub fn new(target: T) -> Self {
        Self::with_config(target, SamdConfig::default())
    }

    /// Create a flash algorithm with a custom configuration
    pub fn with_config(target: T, config: SamdConfig) -> Self {
        Self {
            target,
            nvm: Nvmctrl::new(config.nvmctrl_base),
            config,
            geometry: None,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &SamdConfig {
        &self.config
    }

    /// Get a reference to the target
    pub fn target(&self) -> &T {
        &self.target
    }

    /// Get a mutable reference to the target
    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    /// Release the target
    pub fn into_target(self) -> T {
        self.target
    }

    /// Whether `init()` has discovered the flash geometry
    pub fn is_initialized(&self) -> bool {
        self.geometry.is_some()
    }

    /// Get the flash geometry discovered by `init()`
    pub fn geometry(&self) -> Result<FlashGeometry> {
        self.geometry.ok_or(Precondition::NotInitialized.into())
    }

    fn erase_policy(&self) -> WaitPolicy {
        WaitPolicy {
            poll_delay_us: self.config.poll_delay_us,
            timeout_us: self.config.erase_timeout_us,
        }
    }

    fn write_policy(&self) -> WaitPolicy {
        WaitPolicy {
            poll_delay_us: self.config.poll_delay_us,
            timeout_us: self.config.write_timeout_us,
        }
    }

    fn check_in_flash(&self, addr: u32, len: u32) -> Result<FlashGeometry> {
        let geometry = self.geometry()?;
        if !geometry.contains(addr, len) {
            return Err(Precondition::OutOfBounds { addr, len }.into());
        }
        Ok(geometry)
    }

    /// Erase the row containing `addr`
    ///
    /// Note that ADDR takes a half-word address, not a byte address.
    #[maybe_async]
    pub async fn erase_row(&mut self, addr: u32) -> Result<()> {
        self.check_in_flash(addr, 1)?;
        log::debug!("SAMD: erase row at 0x{:08X}", addr);

        let policy = self.erase_policy();
        self.nvm.set_addr(&mut self.target, addr).await?;
        self.nvm
            .execute(&mut self.target, NvmCommand::EraseRow, addr, policy)
            .await
    }

    /// Lock the region containing `addr` against erase and write
    #[maybe_async]
    pub async fn lock_region(&mut self, addr: u32) -> Result<()> {
        self.region_command(NvmCommand::LockRegion, addr).await
    }

    /// Unlock the region containing `addr`
    #[maybe_async]
    pub async fn unlock_region(&mut self, addr: u32) -> Result<()> {
        self.region_command(NvmCommand::UnlockRegion, addr).await
    }

    #[maybe_async]
    async fn region_command(&mut self, cmd: NvmCommand, addr: u32) -> Result<()> {
        self.check_in_flash(addr, 1)?;
        log::debug!("SAMD: {:?} at 0x{:08X}", cmd, addr);

        let policy = self.write_policy();
        self.nvm.set_addr(&mut self.target, addr).await?;
        self.nvm.execute(&mut self.target, cmd, addr, policy).await
    }

    /// Discard anything loaded into the page buffer
    #[maybe_async]
    pub async fn clear_page_buffer(&mut self) -> Result<()> {
        self.geometry()?;
        let policy = self.write_policy();
        self.nvm
            .execute(&mut self.target, NvmCommand::PageBufferClear, 0, policy)
            .await
    }

    /// Whether CTRLB.MANW is set
    ///
    /// With manual write enabled a full page buffer is not committed
    /// automatically.
    #[maybe_async]
    pub async fn manual_write_enabled(&mut self) -> Result<bool> {
        let ctrlb = self.nvm.read_ctrlb(&mut self.target).await?;
        Ok(ctrlb.contains(CtrlB::MANW))
    }
}

#[maybe_async(AFIT)]
impl<T: Target> FlashAlgorithm for SamdFlash<T> {
    async fn init(&mut self) -> Result<()> {
        self.target.halt().await.map_err(|e| {
            log::error!("SAMD: halt failed: {}", e);
            Precondition::HaltFailed
        })?;
        self.target
            .set_state(TargetState::Program)
            .await
            .map_err(|e| {
                log::error!("SAMD: entering programming state failed: {}", e);
                Precondition::ProgramStateFailed
            })?;

        let param = self.nvm.read_param(&mut self.target).await?;
        let geometry = FlashGeometry::from_param(param)?;

        log::debug!(
            "SAMD flash: {} pages of {} bytes = {} KiB",
            geometry.num_pages,
            geometry.page_size,
            geometry.total_size() / 1024
        );

        if self.manual_write_enabled().await? {
            log::warn!("SAMD: CTRLB.MANW is set, full pages will not be written automatically");
        }

        self.geometry = Some(geometry);
        Ok(())
    }

    fn page_info(&self, addr: u32) -> Result<PageInfo> {
        let geometry = self.geometry()?;
        // The erase unit is a row of 4 pages, not a page
        Ok(PageInfo {
            base_address: geometry.row_base(addr),
            erase_weight: self.config.erase_weight,
            program_weight: self.config.program_weight,
            size: geometry.row_size(),
        })
    }

    fn flash_info(&self) -> Result<FlashInfo> {
        let geometry = self.geometry()?;
        Ok(FlashInfo {
            rom_start: 0,
            erase_weight: self.config.erase_weight * geometry.num_rows() as f32,
            crc_supported: false,
        })
    }

    fn page_size(&self) -> Result<u32> {
        Ok(self.geometry()?.page_size)
    }

    async fn erase_sector(&mut self, addr: u32) -> Result<()> {
        self.erase_row(addr).await
    }

    async fn erase_all(&mut self) -> Result<()> {
        let geometry = self.geometry()?;
        log::debug!("SAMD: erasing {} rows", geometry.num_rows());

        for row in 0..geometry.num_rows() {
            let addr = geometry.row_address(row);
            if let Err(e) = self.erase_row(addr).await {
                log::error!("SAMD: erase stopped at row {} (0x{:08X}): {}", row, addr, e);
                // Report the row rather than the register that failed
                return Err(match e {
                    Error::TargetAccess { .. } => Error::TargetAccess { addr },
                    e => e,
                });
            }
        }
        Ok(())
    }

    async fn program_page(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        let geometry = self.geometry()?;
        if addr % geometry.page_size != 0 {
            return Err(Precondition::Misaligned {
                addr,
                align: geometry.page_size,
            }
            .into());
        }

        let len = padded_len(data.len()) as u32;
        self.check_in_flash(addr, len)?;
        log::debug!("SAMD: program {} bytes at 0x{:08X}", len, addr);

        let mut words = [0u32; BLOCK_WORDS];
        let mut block_addr = addr;
        for chunk in data.chunks(BLOCK_WORDS * 4) {
            let count = pack_words(chunk, &mut words);
            self.target
                .write_block32(block_addr, &words[..count])
                .await?;
            block_addr += (count * 4) as u32;
        }

        let policy = self.write_policy();
        if len % geometry.page_size == 0 {
            // The last block filled the page buffer and started the write
            self.nvm.wait(&mut self.target, addr, policy).await
        } else {
            self.nvm
                .execute(&mut self.target, NvmCommand::WritePage, addr, policy)
                .await
        }
    }
}

/// Length of `len` bytes padded up to a whole number of 32-bit words
pub const fn padded_len(len: usize) -> usize {
    (len + 3) & !3
}

/// Pack bytes into little-endian words, padding the last word with 0xFF
///
/// Returns the number of words written. `words` must hold at least
/// `padded_len(bytes.len()) / 4` entries.
pub fn pack_words(bytes: &[u8], words: &mut [u32]) -> usize {
    let mut count = 0;
    for (word, chunk) in words.iter_mut().zip(bytes.chunks(4)) {
        let mut buf = [0xFF; 4];
        buf[..chunk.len()].copy_from_slice(chunk);
        *word = u32::from_le_bytes(buf);
        count += 1;
    }
    count
}
