//! SAMD NVMCTRL register definitions
//!
//! Register offsets are relative to the NVMCTRL base address, which is
//! `0x4100_4000` on SAMD20/SAMD21 and compatible parts.

use bitflags::bitflags;

/// Default NVMCTRL base address
pub const NVMCTRL_BASE: u32 = 0x4100_4000;

// ============================================================================
// Register offsets
// ============================================================================

/// Control A register (16 bits): command and execution key
pub const NVMCTRL_CTRLA: u32 = 0x00;
/// Control B register (32 bits)
pub const NVMCTRL_CTRLB: u32 = 0x04;
/// NVM parameter register (32 bits, read-only)
pub const NVMCTRL_PARAM: u32 = 0x08;
/// Interrupt flag status and clear register (8 bits)
pub const NVMCTRL_INTFLAG: u32 = 0x14;
/// Status register (16 bits)
pub const NVMCTRL_STATUS: u32 = 0x18;
/// Address register (32 bits), in units of 16-bit half-words
pub const NVMCTRL_ADDR: u32 = 0x1C;

// ============================================================================
// CTRLA
// ============================================================================

/// Command execution key, must accompany every command write
pub const CTRLA_CMDEX_KEY: u16 = 0xA5 << 8;
/// Command field mask
pub const CTRLA_CMD_MASK: u16 = 0x7F;

/// Build the CTRLA value that executes `cmd`
pub const fn ctrla_exec(cmd: NvmCommand) -> u16 {
    CTRLA_CMDEX_KEY | cmd as u16
}

/// NVMCTRL commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NvmCommand {
    /// Erase Row - erases the row addressed by ADDR
    EraseRow = 0x02,
    /// Write Page - writes the page buffer to the page addressed by ADDR
    WritePage = 0x04,
    /// Erase Auxiliary Row - only the user configuration row, security bit clear
    EraseAuxRow = 0x05,
    /// Write Auxiliary Page - only the user configuration row, security bit clear
    WriteAuxPage = 0x06,
    /// Security flow command
    SecurityFlow = 0x0A,
    /// Write lockbits
    WriteLockbits = 0x0F,
    /// Lock Region - locks the region containing ADDR
    LockRegion = 0x40,
    /// Unlock Region - unlocks the region containing ADDR
    UnlockRegion = 0x41,
    /// Set power reduction mode
    SetPowerReduction = 0x42,
    /// Clear power reduction mode
    ClearPowerReduction = 0x43,
    /// Page Buffer Clear
    PageBufferClear = 0x44,
    /// Set Security Bit
    SetSecurityBit = 0x45,
    /// Invalidate all cache lines
    InvalidateCache = 0x46,
}

impl NvmCommand {
    /// Decode a raw command field
    pub fn from_bits(cmd: u8) -> Option<Self> {
        Some(match cmd {
            0x02 => Self::EraseRow,
            0x04 => Self::WritePage,
            0x05 => Self::EraseAuxRow,
            0x06 => Self::WriteAuxPage,
            0x0A => Self::SecurityFlow,
            0x0F => Self::WriteLockbits,
            0x40 => Self::LockRegion,
            0x41 => Self::UnlockRegion,
            0x42 => Self::SetPowerReduction,
            0x43 => Self::ClearPowerReduction,
            0x44 => Self::PageBufferClear,
            0x45 => Self::SetSecurityBit,
            0x46 => Self::InvalidateCache,
            _ => return None,
        })
    }

    /// Whether the command acts on the address in ADDR
    pub fn uses_addr(self) -> bool {
        matches!(
            self,
            Self::EraseRow
                | Self::WritePage
                | Self::EraseAuxRow
                | Self::WriteAuxPage
                | Self::LockRegion
                | Self::UnlockRegion
        )
    }
}

// ============================================================================
// CTRLB
// ============================================================================

bitflags! {
    /// CTRLB bits modelled by the driver
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CtrlB: u32 {
        /// Manual write: page buffer is only committed by an explicit command
        const MANW = 1 << 7;
    }
}

// ============================================================================
// PARAM
// ============================================================================

/// Page size exponent offset: page size is `8 << PSZ`
pub const PARAM_PSZ_SHIFT: u32 = 16;
/// Page size exponent mask (after shifting)
pub const PARAM_PSZ_MASK: u32 = 0xF;
/// Number of pages mask
pub const PARAM_NVMP_MASK: u32 = 0xFFFF;

// ============================================================================
// INTFLAG / STATUS
// ============================================================================

bitflags! {
    /// Interrupt flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IntFlag: u8 {
        /// NVM ready to accept a new command
        const READY = 1 << 0;
        /// A command completed with an error
        const ERROR = 1 << 1;
    }
}

bitflags! {
    /// Status register error and state bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Status: u8 {
        /// Power reduction mode active
        const PRM = 1 << 0;
        /// NVM page buffer has been loaded
        const LOAD = 1 << 1;
        /// Programming error (invalid command or bad key)
        const PROGE = 1 << 2;
        /// Lock error (operation on a locked region)
        const LOCKE = 1 << 3;
        /// NVM error during programming or erase
        const NVME = 1 << 4;
    }
}

/// Bits of STATUS that fail a command
pub const STATUS_ERROR_MASK: u8 = 0x1F;

/// Pages per row; a row is the erase granularity
pub const PAGES_PER_ROW: u32 = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ctrla_exec() {
        assert_eq!(ctrla_exec(NvmCommand::EraseRow), 0xA502);
        assert_eq!(ctrla_exec(NvmCommand::WritePage), 0xA504);
        assert_eq!(ctrla_exec(NvmCommand::PageBufferClear), 0xA544);
    }

    #[test]
    fn test_command_from_bits() {
        assert_eq!(NvmCommand::from_bits(0x02), Some(NvmCommand::EraseRow));
        assert_eq!(NvmCommand::from_bits(0x46), Some(NvmCommand::InvalidateCache));
        assert_eq!(NvmCommand::from_bits(0x03), None);
        assert!(NvmCommand::UnlockRegion.uses_addr());
        assert!(!NvmCommand::PageBufferClear.uses_addr());
    }

    #[test]
    fn test_status_mask_covers_all_flags() {
        assert_eq!(Status::all().bits(), STATUS_ERROR_MASK);
    }
}
