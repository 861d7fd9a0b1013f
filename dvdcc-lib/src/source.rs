//! The seam between the pipeline and the hardware.
//!
//! Key recovery and backup only ever need two operations from the drive:
//! fill a buffer with the 80-raw-sector cache window containing a sector,
//! and flush that cache so a window can be re-read after a verification
//! failure. Putting those behind a trait lets the whole pipeline run
//! against a simulated disc in tests.

use dvdcc_drive::{Drive, DriveError, Transport};

/// A device (or simulation) that yields raw-sector cache windows.
pub trait RawSectorSource {
    /// Fill `buffer` (165,120 bytes) with the cache window holding
    /// `sector`. Windows are aligned to 80-sector boundaries regardless of
    /// the requested sector.
    fn read_cache_window(&mut self, sector: u32, buffer: &mut [u8]) -> Result<(), DriveError>;

    /// Drop any cached window so the next read hits the medium again.
    fn clear_cache(&mut self, near_sector: u32) -> Result<(), DriveError>;
}

impl<T: Transport> RawSectorSource for Drive<T> {
    fn read_cache_window(&mut self, sector: u32, buffer: &mut [u8]) -> Result<(), DriveError> {
        self.read_raw_sector_cache(sector, buffer)
    }

    fn clear_cache(&mut self, near_sector: u32) -> Result<(), DriveError> {
        Drive::clear_cache(self, near_sector)
    }
}
