//! Per-block seed recovery.
//!
//! Nothing on the disc states the scrambler seeds; they have to be found.
//! The search space is small (15 bits) and the EDC at the end of every raw
//! sector gives a strong oracle: XOR a candidate keystream over the user
//! area, compute the EDC over bytes 0..2060, and compare with the stored
//! value. A match has roughly 2^-32 false-positive probability per trial,
//! and the remaining fifteen sectors of the block then confirm the seed.
//!
//! Seeds repeat: block 0 has its own cipher, and blocks 1.. cycle through a
//! fixed sequence. Recovery walks blocks in order, searching only until a
//! freshly found seed equals the first repeating cipher's seed; from that
//! point the table is closed and later blocks just verify.

use dvdcc_core::{
    cipher::{keystream_into, SEED_MAX},
    ecma267, sector, Cipher, CipherTable, BLOCKS_PER_CACHE, CACHE_SIZE, RAW_SECTOR_SIZE,
    SECTORS_PER_BLOCK, SECTOR_SIZE,
};

use crate::error::BackupError;
use crate::source::RawSectorSource;

/// Blocks examined by default: enough to close any real seed sequence with
/// room to spare (the cipher table tops out at 20 entries).
pub const DEFAULT_BLOCKS_TO_PROBE: usize = 20;

/// Attempts per block before a decode failure becomes fatal; the cache is
/// flushed and re-read between attempts.
const BLOCK_RETRY_LIMIT: usize = 5;

/// Output of a successful key recovery.
#[derive(Debug)]
pub struct RecoveredKeys {
    pub table: CipherTable,
    /// Physical id of raw sector 0, from the first cache window.
    pub first_sector_id: u32,
}

/// Brute-force the cipher table over the first `blocks_to_probe` blocks.
///
/// Fails if any block resists decoding through every retry, or if the seed
/// sequence has not wrapped by the last probed block (the repeat period
/// would be unknown for the rest of the disc).
pub fn recover_cipher_table<S: RawSectorSource>(
    source: &mut S,
    blocks_to_probe: usize,
) -> Result<RecoveredKeys, BackupError> {
    let mut table = CipherTable::new();
    let mut buffer = vec![0u8; CACHE_SIZE];
    let mut first_sector_id = 0;

    for block in 0..blocks_to_probe {
        let window_sector =
            ((block / BLOCKS_PER_CACHE) * BLOCKS_PER_CACHE * SECTORS_PER_BLOCK) as u32;
        if block % BLOCKS_PER_CACHE == 0 {
            source.read_cache_window(window_sector, &mut buffer)?;
            if block == 0 {
                first_sector_id = sector::sector_id(&buffer);
            }
        }

        let mut attempts = 0;
        loop {
            match decode_block(&mut table, &mut buffer, block) {
                Ok(()) => break,
                Err(
                    err @ (BackupError::SeedSearchExhausted { .. }
                    | BackupError::BlockDecodeFailed { .. }),
                ) => {
                    attempts += 1;
                    if attempts >= BLOCK_RETRY_LIMIT {
                        return Err(err);
                    }
                    log::warn!("{err}; flushing cache and retrying ({attempts}/{BLOCK_RETRY_LIMIT})");
                    source.clear_cache(window_sector)?;
                    source.read_cache_window(window_sector, &mut buffer)?;
                }
                Err(other) => return Err(other),
            }
        }
    }

    if !table.is_complete() {
        return Err(BackupError::CipherSequenceOpen { blocks: blocks_to_probe });
    }

    log::debug!(
        "recovered {} ciphers, period {}, first sector id {first_sector_id:#08X}",
        table.len(),
        table.period()
    );
    Ok(RecoveredKeys { table, first_sector_id })
}

/// Decode and verify one block inside the current cache window, growing the
/// table when the block's seed is new. The table is only modified after the
/// whole block verifies, so a failed attempt leaves it unchanged.
fn decode_block(
    table: &mut CipherTable,
    buffer: &mut [u8],
    block: usize,
) -> Result<(), BackupError> {
    let offset = (block % BLOCKS_PER_CACHE) * SECTORS_PER_BLOCK * RAW_SECTOR_SIZE;
    let block_bytes = &mut buffer[offset..offset + SECTORS_PER_BLOCK * RAW_SECTOR_SIZE];

    if table.is_complete() {
        let cipher = table.get(table.index_for_block(block));
        return verify_block(cipher, block_bytes, block);
    }

    // Blocks arrive in order, so an open table always has exactly `block`
    // entries here.
    debug_assert_eq!(table.len(), block);

    let seed = search_seed(&block_bytes[..RAW_SECTOR_SIZE])
        .ok_or(BackupError::SeedSearchExhausted { block })?;

    if table.len() >= 2 && seed == table.get(1).seed() {
        // The sequence wrapped around to its first repeating cipher.
        let cipher = table.get(1).clone();
        verify_block(&cipher, block_bytes, block)?;
        table.close();
        log::debug!("cipher sequence closed at block {block}; period {}", table.period());
        return Ok(());
    }

    if table.is_full() {
        return Err(BackupError::CipherSequenceOpen { blocks: block });
    }

    let cipher = Cipher::new(seed, SECTOR_SIZE);
    verify_block(&cipher, block_bytes, block)?;
    log::debug!("block {block}: seed {seed:#06X}");
    table.push(cipher);
    Ok(())
}

/// Find the seed whose keystream descrambles `raw_sector`, trying every
/// value in 1..=0x7FFF against the stored EDC. Seed 0 is skipped: its
/// keystream is all zeros and would spuriously match any sector whose user
/// area happens to already verify.
fn search_seed(raw_sector: &[u8]) -> Option<u16> {
    let stored = sector::stored_edc(raw_sector);
    let mut keystream = vec![0u8; SECTOR_SIZE];
    let mut trial = vec![0u8; sector::EDC_OFFSET];

    for seed in 1..=SEED_MAX {
        keystream_into(seed, &mut keystream);
        trial.copy_from_slice(&raw_sector[..sector::EDC_OFFSET]);
        for (byte, key) in trial[sector::USER_OFFSET..].iter_mut().zip(&keystream) {
            *byte ^= key;
        }
        if ecma267::edc(&trial) == stored {
            return Some(seed);
        }
    }
    None
}

/// Descramble every sector of the block in place and check each EDC.
fn verify_block(
    cipher: &Cipher,
    block_bytes: &mut [u8],
    block: usize,
) -> Result<(), BackupError> {
    for raw_sector in block_bytes.chunks_exact_mut(RAW_SECTOR_SIZE) {
        cipher.decode(raw_sector, sector::USER_OFFSET);
        if !sector::edc_matches(raw_sector) {
            return Err(BackupError::BlockDecodeFailed { block });
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/keys_tests.rs"]
mod tests;
