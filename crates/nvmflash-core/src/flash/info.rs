//! Flash metadata handed to the orchestrator

/// Default relative cost of erasing one erase unit
pub const DEFAULT_PAGE_ERASE_WEIGHT: f32 = 0.048;

/// Default relative cost of programming one page
pub const DEFAULT_PAGE_PROGRAM_WEIGHT: f32 = 0.130;

/// Information about the erase unit containing an address
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageInfo {
    /// Start address of the erase unit
    pub base_address: u32,
    /// Relative cost of erasing this unit
    pub erase_weight: f32,
    /// Relative cost of programming this unit
    pub program_weight: f32,
    /// Size of the erase unit in bytes
    ///
    /// This is what the orchestrator must erase in one go, which is not
    /// necessarily the program granularity.
    pub size: u32,
}

impl PageInfo {
    /// Check whether this unit contains the given address
    pub fn contains(&self, addr: u32) -> bool {
        addr >= self.base_address && (addr - self.base_address) < self.size
    }
}

/// Information about the whole flash array
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlashInfo {
    /// Base address of flash in the target's address space
    pub rom_start: u32,
    /// Estimated cost of erasing the whole array
    pub erase_weight: f32,
    /// Whether the device can checksum flash contents on-chip
    ///
    /// When false the orchestrator has to verify by reading flash back.
    pub crc_supported: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_info_contains() {
        let info = PageInfo {
            base_address: 0x100,
            erase_weight: DEFAULT_PAGE_ERASE_WEIGHT,
            program_weight: DEFAULT_PAGE_PROGRAM_WEIGHT,
            size: 0x80,
        };
        assert!(!info.contains(0xFF));
        assert!(info.contains(0x100));
        assert!(info.contains(0x17F));
        assert!(!info.contains(0x180));
    }
}
