//! nvmflash-dummy - In-memory SAMD NVMCTRL emulator for testing
//!
//! This crate provides a dummy debug target that emulates the NVMCTRL
//! register block and flash array of a SAMD part in memory. It records every
//! access so tests can check exact register sequences, advances a simulated
//! clock on `delay_us`, and can inject faults.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
use alloc::vec;
#[cfg(feature = "alloc")]
use alloc::vec::Vec;

use nvmflash_core::error::{Error, Result};
use nvmflash_core::target::{Target, TargetState};

/// Debug Halting Control and Status Register, reported on run-control faults
pub const DHCSR: u32 = 0xE000_EDF0;

// NVMCTRL register offsets
const CTRLA: u32 = 0x00;
const CTRLB: u32 = 0x04;
const PARAM: u32 = 0x08;
const INTFLAG: u32 = 0x14;
const STATUS: u32 = 0x18;
const ADDR: u32 = 0x1C;
const REG_SPAN: u32 = 0x20;

const CMDEX_KEY: u16 = 0xA5;
const CTRLB_MANW: u32 = 1 << 7;
const INTFLAG_READY: u8 = 1 << 0;

// STATUS bits
const STATUS_PROGE: u8 = 1 << 2;
const STATUS_LOCKE: u8 = 1 << 3;
/// Bits cleared by writing a one
const STATUS_W1C: u8 = 0x1C;

// Commands
const CMD_ER: u8 = 0x02;
const CMD_WP: u8 = 0x04;
const CMD_LR: u8 = 0x40;
const CMD_UR: u8 = 0x41;
const CMD_PBC: u8 = 0x44;
/// Accepted but without visible effect on the emulated array
const CMD_IGNORED: [u8; 8] = [0x05, 0x06, 0x0A, 0x0F, 0x42, 0x43, 0x45, 0x46];

const PAGES_PER_ROW: usize = 4;

/// Configuration for the dummy target
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Value reported by the PARAM register
    pub param: u32,
    /// NVMCTRL base address
    pub base: u32,
    /// Number of lock regions the array is split into
    pub lock_regions: usize,
}

impl Default for DummyConfig {
    fn default() -> Self {
        // SAMD21x18: 4096 pages of 64 bytes
        Self::with_param(0x0003_1000)
    }
}

impl DummyConfig {
    /// Configuration reporting the given PARAM value
    pub fn with_param(param: u32) -> Self {
        Self {
            param,
            base: 0x4100_4000,
            lock_regions: 16,
        }
    }

    /// Move the NVMCTRL register block
    pub fn base(mut self, base: u32) -> Self {
        self.base = base;
        self
    }

    /// Bytes per page encoded in PARAM
    pub fn page_size(&self) -> usize {
        8 << ((self.param >> 16) & 0xF)
    }

    /// Pages encoded in PARAM
    pub fn num_pages(&self) -> usize {
        (self.param & 0xFFFF) as usize
    }

    /// Flash size in bytes
    pub fn size(&self) -> usize {
        self.page_size() * self.num_pages()
    }
}

/// A recorded target access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// `halt()`
    Halt,
    /// `set_state()`
    SetState(TargetState),
    /// 8-bit read
    Read8 { addr: u32 },
    /// 16-bit read
    Read16 { addr: u32 },
    /// 32-bit read
    Read32 { addr: u32 },
    /// 8-bit write
    Write8 { addr: u32, value: u8 },
    /// 16-bit write
    Write16 { addr: u32, value: u16 },
    /// 32-bit write
    Write32 { addr: u32, value: u32 },
    /// Block write of `words` words
    WriteBlock32 { addr: u32, words: usize },
}

/// Dummy SAMD target
///
/// Emulates the NVMCTRL and its page buffer in memory. Flash starts out
/// erased (all 0xFF).
#[cfg(feature = "alloc")]
pub struct DummySamd {
    config: DummyConfig,
    data: Vec<u8>,
    page_buffer: Vec<u8>,
    loaded: Vec<bool>,
    locked: Vec<bool>,
    ctrlb: u32,
    addr_reg: u32,
    status: u8,
    busy: u32,
    busy_polls: u32,
    stuck_busy: bool,
    fail_at: Option<(u32, u8)>,
    fail_halt: bool,
    fail_set_state: bool,
    state: Option<TargetState>,
    elapsed_us: u64,
    log: Vec<Op>,
}

#[cfg(feature = "alloc")]
impl DummySamd {
    /// Create a new dummy target with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        let page_size = config.page_size();
        let data = vec![0xFF; config.size()];
        let locked = vec![false; config.lock_regions.max(1)];
        Self {
            config,
            data,
            page_buffer: vec![0xFF; page_size],
            loaded: vec![false; page_size],
            locked,
            ctrlb: 0,
            addr_reg: 0,
            status: 0,
            busy: 0,
            busy_polls: 0,
            stuck_busy: false,
            fail_at: None,
            fail_halt: false,
            fail_set_state: false,
            state: None,
            elapsed_us: 0,
            log: Vec::new(),
        }
    }

    /// Create a new dummy target with default configuration (SAMD21x18)
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Get a reference to the flash data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get a mutable reference to the flash data
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// All accesses recorded so far
    pub fn log(&self) -> &[Op] {
        &self.log
    }

    /// Forget recorded accesses
    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    /// Simulated time spent in `delay_us`
    pub fn elapsed_us(&self) -> u64 {
        self.elapsed_us
    }

    /// State last requested through `set_state`
    pub fn state(&self) -> Option<TargetState> {
        self.state
    }

    /// Make `halt()` fail
    pub fn fail_halt(&mut self, fail: bool) {
        self.fail_halt = fail;
    }

    /// Make `set_state()` fail
    pub fn fail_set_state(&mut self, fail: bool) {
        self.fail_set_state = fail;
    }

    /// Keep INTFLAG.READY clear forever
    pub fn set_stuck_busy(&mut self, stuck: bool) {
        self.stuck_busy = stuck;
    }

    /// Number of INTFLAG reads that report busy after each operation
    pub fn set_busy_polls(&mut self, polls: u32) {
        self.busy_polls = polls;
    }

    /// Fail the `n`th command from now (0 = next) by raising `status`
    ///
    /// The failing command has no effect on the array.
    pub fn fail_command_at(&mut self, n: u32, status: u8) {
        self.fail_at = Some((n, status));
    }

    /// Set CTRLB directly
    pub fn set_ctrlb(&mut self, value: u32) {
        self.ctrlb = value;
    }

    /// Whether the lock region containing `addr` is locked
    pub fn is_locked(&self, addr: u32) -> bool {
        self.locked[self.region_of(addr as usize)]
    }

    fn region_of(&self, addr: usize) -> usize {
        let row_size = self.config.page_size() * PAGES_PER_ROW;
        let region_size = (self.data.len() / self.locked.len()).max(row_size);
        (addr / region_size).min(self.locked.len() - 1)
    }

    fn reg_offset(&self, addr: u32) -> Option<u32> {
        addr.checked_sub(self.config.base)
            .filter(|offset| *offset < REG_SPAN)
    }

    fn in_flash(&self, addr: u32, len: usize) -> bool {
        addr as usize + len <= self.data.len()
    }

    fn read_reg(&mut self, offset: u32) -> u32 {
        match offset {
            CTRLB => self.ctrlb,
            PARAM => self.config.param,
            INTFLAG => {
                if self.stuck_busy {
                    0
                } else if self.busy > 0 {
                    self.busy -= 1;
                    0
                } else {
                    INTFLAG_READY as u32
                }
            }
            STATUS => self.status as u32,
            ADDR => self.addr_reg,
            _ => 0,
        }
    }

    fn write_reg(&mut self, offset: u32, value: u32) -> Result<()> {
        match offset {
            CTRLA => self.execute(value as u16),
            CTRLB => self.ctrlb = value,
            STATUS => self.status &= !(value as u8 & STATUS_W1C),
            ADDR => self.addr_reg = value & 0x3F_FFFF,
            _ => {
                return Err(Error::TargetAccess {
                    addr: self.config.base + offset,
                })
            }
        }
        Ok(())
    }

    fn execute(&mut self, ctrla: u16) {
        self.busy = self.busy_polls;

        if ctrla >> 8 != CMDEX_KEY {
            log::trace!("dummy: CTRLA write without key: 0x{:04X}", ctrla);
            self.status |= STATUS_PROGE;
            return;
        }

        match self.fail_at {
            Some((0, status)) => {
                self.fail_at = None;
                self.status |= status;
                return;
            }
            Some((n, status)) => self.fail_at = Some((n - 1, status)),
            None => {}
        }

        let cmd = (ctrla & 0x7F) as u8;
        let addr = (self.addr_reg as usize) << 1;
        log::trace!("dummy: command 0x{:02X} at 0x{:08X}", cmd, addr);

        match cmd {
            CMD_ER => {
                let row_size = self.config.page_size() * PAGES_PER_ROW;
                let row = addr - addr % row_size;
                if row + row_size > self.data.len() {
                    self.status |= STATUS_PROGE;
                } else if self.locked[self.region_of(row)] {
                    self.status |= STATUS_LOCKE;
                } else {
                    self.data[row..row + row_size].fill(0xFF);
                }
            }
            CMD_WP => {
                let page_size = self.config.page_size();
                self.commit_page(addr - addr % page_size);
            }
            CMD_LR | CMD_UR => {
                if addr >= self.data.len() {
                    self.status |= STATUS_PROGE;
                } else {
                    let region = self.region_of(addr);
                    self.locked[region] = cmd == CMD_LR;
                }
            }
            CMD_PBC => self.clear_page_buffer(),
            c if CMD_IGNORED.contains(&c) => {}
            _ => self.status |= STATUS_PROGE,
        }
    }

    fn clear_page_buffer(&mut self) {
        self.page_buffer.fill(0xFF);
        self.loaded.fill(false);
    }

    fn commit_page(&mut self, page: usize) {
        let page_size = self.config.page_size();
        if page + page_size > self.data.len() {
            self.status |= STATUS_PROGE;
        } else if self.locked[self.region_of(page)] {
            self.status |= STATUS_LOCKE;
        } else {
            // Flash programming: can only change 1 -> 0
            for (byte, &new) in self.data[page..page + page_size]
                .iter_mut()
                .zip(&self.page_buffer)
            {
                *byte &= new;
            }
        }
        self.clear_page_buffer();
    }

    fn load_page_buffer(&mut self, addr: u32, bytes: &[u8]) {
        let page_size = self.config.page_size();
        let offset = addr as usize % page_size;
        self.page_buffer[offset..offset + bytes.len()].copy_from_slice(bytes);
        self.loaded[offset..offset + bytes.len()].fill(true);
        self.addr_reg = addr >> 1;

        if self.ctrlb & CTRLB_MANW == 0 && self.loaded.iter().all(|&l| l) {
            let page = addr as usize - offset;
            self.busy = self.busy_polls;
            self.commit_page(page);
        }
    }

    fn check_aligned(addr: u32, align: u32) -> Result<()> {
        if addr % align != 0 {
            return Err(Error::TargetAccess { addr });
        }
        Ok(())
    }

    fn read_flash(&self, addr: u32, len: usize) -> Result<&[u8]> {
        if !self.in_flash(addr, len) {
            return Err(Error::TargetAccess { addr });
        }
        Ok(&self.data[addr as usize..addr as usize + len])
    }
}

#[cfg(feature = "alloc")]
impl Target for DummySamd {
    fn halt(&mut self) -> Result<()> {
        self.log.push(Op::Halt);
        if self.fail_halt {
            return Err(Error::TargetAccess { addr: DHCSR });
        }
        Ok(())
    }

    fn set_state(&mut self, state: TargetState) -> Result<()> {
        self.log.push(Op::SetState(state));
        if self.fail_set_state {
            return Err(Error::TargetAccess { addr: DHCSR });
        }
        self.state = Some(state);
        Ok(())
    }

    fn read8(&mut self, addr: u32) -> Result<u8> {
        self.log.push(Op::Read8 { addr });
        match self.reg_offset(addr) {
            Some(offset) => Ok(self.read_reg(offset & !3) as u8),
            None => Ok(self.read_flash(addr, 1)?[0]),
        }
    }

    fn read16(&mut self, addr: u32) -> Result<u16> {
        self.log.push(Op::Read16 { addr });
        Self::check_aligned(addr, 2)?;
        match self.reg_offset(addr) {
            Some(offset) => Ok(self.read_reg(offset & !3) as u16),
            None => {
                let bytes = self.read_flash(addr, 2)?;
                Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
            }
        }
    }

    fn read32(&mut self, addr: u32) -> Result<u32> {
        self.log.push(Op::Read32 { addr });
        Self::check_aligned(addr, 4)?;
        match self.reg_offset(addr) {
            Some(offset) => Ok(self.read_reg(offset)),
            None => {
                let bytes = self.read_flash(addr, 4)?;
                Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
            }
        }
    }

    fn write8(&mut self, addr: u32, value: u8) -> Result<()> {
        self.log.push(Op::Write8 { addr, value });
        match self.reg_offset(addr) {
            Some(offset) if offset % 4 == 0 => self.write_reg(offset, value as u32),
            // The page buffer only takes 16- and 32-bit writes
            _ => Err(Error::TargetAccess { addr }),
        }
    }

    fn write16(&mut self, addr: u32, value: u16) -> Result<()> {
        self.log.push(Op::Write16 { addr, value });
        Self::check_aligned(addr, 2)?;
        match self.reg_offset(addr) {
            Some(offset) => self.write_reg(offset, value as u32),
            None if self.in_flash(addr, 2) => {
                self.load_page_buffer(addr, &value.to_le_bytes());
                Ok(())
            }
            None => Err(Error::TargetAccess { addr }),
        }
    }

    fn write32(&mut self, addr: u32, value: u32) -> Result<()> {
        self.log.push(Op::Write32 { addr, value });
        Self::check_aligned(addr, 4)?;
        match self.reg_offset(addr) {
            Some(offset) => self.write_reg(offset, value),
            None if self.in_flash(addr, 4) => {
                self.load_page_buffer(addr, &value.to_le_bytes());
                Ok(())
            }
            None => Err(Error::TargetAccess { addr }),
        }
    }

    fn write_block32(&mut self, addr: u32, words: &[u32]) -> Result<()> {
        self.log.push(Op::WriteBlock32 {
            addr,
            words: words.len(),
        });
        Self::check_aligned(addr, 4)?;
        if !self.in_flash(addr, words.len() * 4) {
            return Err(Error::TargetAccess { addr });
        }
        for (i, word) in words.iter().enumerate() {
            self.load_page_buffer(addr + i as u32 * 4, &word.to_le_bytes());
        }
        Ok(())
    }

    fn delay_us(&mut self, us: u32) {
        self.elapsed_us += us as u64;
    }
}
