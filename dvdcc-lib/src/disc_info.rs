//! Disc-header and update inspection.
//!
//! Once the cipher table is known, the identification header can be decoded
//! from sector 0 and, on Wii discs, the system-update word from sector 160.
//! Both reads go through the same cache-window path the pipeline uses.

use dvdcc_core::{
    header::{DiscMeta, WII_NO_UPDATE_MAGIC, WII_UPDATE_SECTOR},
    sector, CipherTable, CACHE_SIZE, RAW_SECTOR_SIZE, SECTORS_PER_BLOCK, SECTORS_PER_CACHE,
};

use crate::error::BackupError;
use crate::source::RawSectorSource;

/// Descramble one sector out of its cache window and return the window
/// buffer with that sector decoded in place.
fn read_decoded_sector<S: RawSectorSource>(
    source: &mut S,
    table: &CipherTable,
    sector_number: u32,
) -> Result<Vec<u8>, BackupError> {
    let window = sector_number - sector_number % SECTORS_PER_CACHE as u32;
    let mut buffer = vec![0u8; CACHE_SIZE];
    source.read_cache_window(window, &mut buffer)?;

    let block = sector_number as usize / SECTORS_PER_BLOCK;
    let offset = (sector_number - window) as usize * RAW_SECTOR_SIZE;
    let raw_sector = &mut buffer[offset..offset + RAW_SECTOR_SIZE];
    table.cipher_for_block(block).decode(raw_sector, sector::USER_OFFSET);
    if !sector::edc_matches(raw_sector) {
        return Err(BackupError::BlockDecodeFailed { block });
    }
    Ok(buffer[offset..offset + RAW_SECTOR_SIZE].to_vec())
}

/// Decode the identification header from sector 0.
pub fn read_disc_meta<S: RawSectorSource>(
    source: &mut S,
    table: &CipherTable,
) -> Result<DiscMeta, BackupError> {
    let raw_sector = read_decoded_sector(source, table, 0)?;
    let image = &raw_sector[sector::CPR_MAI_OFFSET..];
    Ok(DiscMeta::parse(image).expect("a full sector holds the header"))
}

/// True when a Wii disc carries a system update.
///
/// The update word sits at bytes 4..8 of the image view of sector 160,
/// big-endian; `0xA5BED6AE` marks an update-free disc.
pub fn wii_needs_update<S: RawSectorSource>(
    source: &mut S,
    table: &CipherTable,
) -> Result<bool, BackupError> {
    let raw_sector = read_decoded_sector(source, table, WII_UPDATE_SECTOR)?;
    let image = &raw_sector[sector::CPR_MAI_OFFSET..];
    let word = u32::from_be_bytes([image[4], image[5], image[6], image[7]]);
    Ok(word != WII_NO_UPDATE_MAGIC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::SimulatedDisc;
    use crate::keys;

    #[test]
    fn test_read_disc_meta() {
        let mut disc = SimulatedDisc::gamecube(320, 0x0150, &[0x0101, 0x0102, 0x0103]);
        let keys = keys::recover_cipher_table(&mut disc, 10).unwrap();
        let meta = read_disc_meta(&mut disc, &keys.table).unwrap();
        assert_eq!(meta.system_id, 'G');
        assert_eq!(meta.title, SimulatedDisc::TITLE);
        assert_eq!(meta.system_name(), Some("Gamecube"));
        assert_eq!(meta.publisher_name(), Some("Nintendo"));
    }

    #[test]
    fn test_wii_disc_without_update() {
        let mut disc =
            SimulatedDisc::wii(320, 0x0150, &[0x0101, 0x0102], WII_NO_UPDATE_MAGIC);
        let keys = keys::recover_cipher_table(&mut disc, 10).unwrap();
        assert!(!wii_needs_update(&mut disc, &keys.table).unwrap());
    }

    #[test]
    fn test_wii_disc_with_update() {
        let mut disc = SimulatedDisc::wii(320, 0x0150, &[0x0101, 0x0102], 0x1234_5678);
        let keys = keys::recover_cipher_table(&mut disc, 10).unwrap();
        assert!(wii_needs_update(&mut disc, &keys.table).unwrap());
        let meta = read_disc_meta(&mut disc, &keys.table).unwrap();
        assert_eq!(meta.system_name(), Some("Wii"));
    }
}
