//! Flash geometry decoding

use crate::regs::{PAGES_PER_ROW, PARAM_NVMP_MASK, PARAM_PSZ_MASK, PARAM_PSZ_SHIFT};
use nvmflash_core::{Precondition, Result};

/// Flash array layout as reported by the PARAM register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashGeometry {
    /// Bytes per page (program granularity)
    pub page_size: u32,
    /// Number of pages
    pub num_pages: u32,
}

impl FlashGeometry {
    /// Decode the raw PARAM register value
    ///
    /// Fails if the reported layout is empty, the page count is not a whole
    /// number of rows, or the array would not fit the 32-bit address space.
    pub fn from_param(param: u32) -> Result<Self> {
        let psz = (param >> PARAM_PSZ_SHIFT) & PARAM_PSZ_MASK;
        let geometry = Self {
            page_size: 8 << psz,
            num_pages: param & PARAM_NVMP_MASK,
        };

        if geometry.num_pages == 0
            || geometry.num_pages % PAGES_PER_ROW != 0
            || geometry.page_size.checked_mul(geometry.num_pages).is_none()
        {
            return Err(Precondition::InvalidGeometry { param }.into());
        }
        Ok(geometry)
    }

    /// Bytes per row (erase granularity)
    pub const fn row_size(&self) -> u32 {
        self.page_size * PAGES_PER_ROW
    }

    /// Number of rows
    pub const fn num_rows(&self) -> u32 {
        self.num_pages / PAGES_PER_ROW
    }

    /// Total flash size in bytes
    pub const fn total_size(&self) -> u32 {
        self.page_size * self.num_pages
    }

    /// Start address of row `index`
    pub const fn row_address(&self, index: u32) -> u32 {
        index * PAGES_PER_ROW * self.page_size
    }

    /// Start address of the row containing `addr`
    pub const fn row_base(&self, addr: u32) -> u32 {
        addr - addr % self.row_size()
    }

    /// Check if `addr..addr + len` lies within flash
    pub fn contains(&self, addr: u32, len: u32) -> bool {
        // u64 so a range ending exactly at 4 GiB does not wrap
        addr as u64 + len as u64 <= self.total_size() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nvmflash_core::Error;

    #[test]
    fn test_decode_32_byte_pages() {
        // PSZ = 2 (32 byte pages), 256 pages
        let g = FlashGeometry::from_param(0x0002_0100).unwrap();
        assert_eq!(g.page_size, 32);
        assert_eq!(g.num_pages, 256);
        assert_eq!(g.row_size(), 128);
        assert_eq!(g.num_rows(), 64);
        assert_eq!(g.total_size(), 8192);
    }

    #[test]
    fn test_decode_all_exponents() {
        for psz in 0..16u32 {
            for pages in [4u32, 64, 1024, 4096, 0xFFFC] {
                let param = (psz << 16) | pages;
                let total = (1u64 << (3 + psz)) * pages as u64;
                if total > u32::MAX as u64 {
                    assert!(FlashGeometry::from_param(param).is_err());
                    continue;
                }
                let g = FlashGeometry::from_param(param).unwrap();
                assert_eq!(g.page_size, 1 << (3 + psz));
                assert_eq!(g.num_pages, param & 0xFFFF);
                assert_eq!(g.total_size() % g.row_size(), 0);
            }
        }
    }

    #[test]
    fn test_decode_ignores_upper_bits() {
        let g = FlashGeometry::from_param(0xFFF3_1000).unwrap();
        assert_eq!(g.page_size, 64);
        assert_eq!(g.num_pages, 0x1000);
    }

    #[test]
    fn test_decode_rejects_empty_and_partial_rows() {
        assert_eq!(
            FlashGeometry::from_param(0x0003_0000),
            Err(Error::Precondition(Precondition::InvalidGeometry {
                param: 0x0003_0000
            }))
        );
        assert!(FlashGeometry::from_param(0x0003_0102).is_err());
    }

    #[test]
    fn test_row_addresses() {
        let g = FlashGeometry::from_param(0x0002_0100).unwrap();
        assert_eq!(g.row_address(0), 0);
        assert_eq!(g.row_address(1), 128);
        assert_eq!(g.row_address(63), 8064);
        assert_eq!(g.row_base(0x1FF), 0x180);
        assert!(g.contains(8064, 128));
        assert!(!g.contains(8064, 129));
    }
}
