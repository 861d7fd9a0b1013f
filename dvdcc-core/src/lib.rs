//! Core data layer for GameCube/Wii disc imaging.
//!
//! Pressed GameCube and Wii discs are DVDs whose 2048-byte user areas are
//! XOR-scrambled with a keystream derived from a 15-bit LFSR seed that
//! changes every 16 sectors. This crate holds the pure pieces of the
//! problem:
//!
//! - raw sector layout and field accessors ([`sector`])
//! - the ECMA-267 error detection code used to verify descrambled sectors
//!   and to recognize a correct seed ([`ecma267`])
//! - keystream generation, XOR decoding and the per-block cipher table
//!   ([`cipher`])
//! - disc geometry and identification-header metadata ([`header`])
//!
//! Nothing here performs I/O; the drive protocol lives in `dvdcc-drive` and
//! the imaging pipeline in `dvdcc-lib`.

use std::fmt;

pub mod cipher;
pub mod ecma267;
pub mod header;
pub mod sector;

pub use cipher::{cipher_index, Cipher, CipherTable};
pub use ecma267::edc;
pub use header::DiscMeta;

/// Size of the user-data area of a sector, in bytes.
pub const SECTOR_SIZE: usize = 2048;

/// Size of a raw sector (ID + IED + CPR_MAI + user data + EDC), in bytes.
pub const RAW_SECTOR_SIZE: usize = 2064;

/// Sectors per scrambling block; the LFSR seed is constant within a block.
pub const SECTORS_PER_BLOCK: usize = 16;

/// Blocks held by the drive's internal raw-sector cache.
pub const BLOCKS_PER_CACHE: usize = 5;

/// Sectors held by the drive's internal raw-sector cache.
pub const SECTORS_PER_CACHE: usize = BLOCKS_PER_CACHE * SECTORS_PER_BLOCK;

/// Bytes transferred when the full raw-sector cache is read out.
pub const CACHE_SIZE: usize = SECTORS_PER_CACHE * RAW_SECTOR_SIZE;

/// Disc geometry, identified by total sector count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscType {
    GameCube,
    WiiSingleLayer,
    WiiDualLayer,
    Unknown,
}

impl DiscType {
    /// Known geometries in ascending sector-count order, the order in which
    /// the drive probe tries them.
    pub const CANDIDATES: [DiscType; 3] = [
        DiscType::GameCube,
        DiscType::WiiSingleLayer,
        DiscType::WiiDualLayer,
    ];

    /// Total user sectors for this geometry, if known.
    pub fn sector_count(&self) -> Option<u32> {
        match self {
            DiscType::GameCube => Some(712_880),
            DiscType::WiiSingleLayer => Some(2_294_912),
            DiscType::WiiDualLayer => Some(4_155_840),
            DiscType::Unknown => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            DiscType::GameCube => "GameCube",
            DiscType::WiiSingleLayer => "Wii (single layer)",
            DiscType::WiiDualLayer => "Wii (dual layer)",
            DiscType::Unknown => "unknown",
        }
    }

    pub fn is_wii(&self) -> bool {
        matches!(self, DiscType::WiiSingleLayer | DiscType::WiiDualLayer)
    }
}

impl fmt::Display for DiscType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Everything known about the disc once probing and key recovery are done.
#[derive(Debug)]
pub struct DiscDescriptor {
    pub disc_type: DiscType,
    /// Total user sectors to image.
    pub sector_count: u32,
    /// Physical id of the first raw sector (low 24 bits of its ID field).
    pub first_sector_id: u32,
    pub cipher_table: CipherTable,
    /// Drive model as `vendor/product/revision`.
    pub model: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_geometry() {
        assert_eq!(SECTORS_PER_CACHE, 80);
        assert_eq!(CACHE_SIZE, 165_120);
    }

    #[test]
    fn test_candidate_order_is_ascending() {
        let counts: Vec<u32> = DiscType::CANDIDATES
            .iter()
            .map(|t| t.sector_count().unwrap())
            .collect();
        let mut sorted = counts.clone();
        sorted.sort_unstable();
        assert_eq!(counts, sorted);
    }

    #[test]
    fn test_unknown_has_no_sector_count() {
        assert_eq!(DiscType::Unknown.sector_count(), None);
        assert!(!DiscType::Unknown.is_wii());
    }

    #[test]
    fn test_wii_variants() {
        assert!(DiscType::WiiSingleLayer.is_wii());
        assert!(DiscType::WiiDualLayer.is_wii());
        assert!(!DiscType::GameCube.is_wii());
    }
}
