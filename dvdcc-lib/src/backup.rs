//! The backup pipeline: stream, decode, verify, retry, write.
//!
//! Walks the disc sequentially in 80-sector cache windows. Each sector is
//! descrambled with its block's cipher and checked against its EDC; a
//! mismatch means the drive's cache went stale (background activity
//! overwrote it), so the cache is flushed and the window re-read, up to 20
//! attempts per sector. Verified sectors stream into the requested outputs:
//!
//! - **ISO**: 2048 bytes per sector starting at raw offset 6, so byte 0 of
//!   the image is the first header byte the metadata decoder reads.
//! - **raw**: the full 2064-byte sector, header and EDC preserved verbatim
//!   with the user area descrambled.
//!
//! With `resume`, both outputs are reopened for append and the start sector
//! comes from their length; the two must agree.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use dvdcc_core::{
    sector, CipherTable, CACHE_SIZE, RAW_SECTOR_SIZE, SECTORS_PER_BLOCK, SECTORS_PER_CACHE,
    SECTOR_SIZE,
};

use crate::error::BackupError;
use crate::source::RawSectorSource;

/// Decode attempts per sector before the run is abandoned.
pub const SECTOR_RETRY_LIMIT: usize = 20;

/// ISO sectors start at the CPR_MAI field, keeping the 6-byte prefix that
/// the header decoder treats as the start of the image.
const ISO_WRITE_OFFSET: usize = sector::CPR_MAI_OFFSET;

/// Output selection for a backup run.
#[derive(Debug, Clone, Default)]
pub struct BackupOptions {
    /// Descrambled 2048-byte-per-sector image.
    pub iso: Option<PathBuf>,
    /// Descrambled 2064-byte-per-sector raw image.
    pub raw: Option<PathBuf>,
    /// Append to existing outputs instead of starting over.
    pub resume: bool,
}

/// Open an output sink, returning the writer and the sector to resume from.
fn open_sink(
    path: &Path,
    resume: bool,
    sector_size: u64,
) -> Result<(BufWriter<File>, u64), BackupError> {
    if resume {
        if !path.exists() {
            return Err(BackupError::ResumeMissing { path: path.to_owned() });
        }
        let len = std::fs::metadata(path)?.len();
        if len % sector_size != 0 {
            return Err(BackupError::ResumeMisaligned {
                path: path.to_owned(),
                len,
                sector_size,
            });
        }
        let file = OpenOptions::new().append(true).open(path)?;
        Ok((BufWriter::new(file), len / sector_size))
    } else {
        Ok((BufWriter::new(File::create(path)?), 0))
    }
}

/// Image the disc into the requested outputs.
///
/// With no outputs selected this is a pure verification pass. `progress`
/// is called once per finished sector with (done, total).
pub fn run_backup<S: RawSectorSource>(
    source: &mut S,
    sector_count: u32,
    table: &CipherTable,
    options: &BackupOptions,
    progress: &mut dyn FnMut(u64, u64),
) -> Result<(), BackupError> {
    let mut iso = match &options.iso {
        Some(path) => Some(open_sink(path, options.resume, SECTOR_SIZE as u64)?),
        None => None,
    };
    let mut raw = match &options.raw {
        Some(path) => Some(open_sink(path, options.resume, RAW_SECTOR_SIZE as u64)?),
        None => None,
    };

    let resume_sector: u64 = match (&iso, &raw) {
        (Some((_, a)), Some((_, b))) if a != b => {
            return Err(BackupError::ResumeMismatch { iso: *a, raw: *b });
        }
        (Some((_, a)), _) => *a,
        (None, Some((_, b))) => *b,
        (None, None) => 0,
    };
    let start_sector = resume_sector as u32;
    if start_sector > 0 {
        log::debug!("resuming at sector {start_sector}");
    }

    let window = SECTORS_PER_CACHE as u32;
    let mut buffer = vec![0u8; CACHE_SIZE];
    let mut cache_start = 0u32;
    let mut window_loaded = false;

    for s in start_sector..sector_count {
        if s % window == 0 || !window_loaded {
            cache_start = s - s % window;
            source.read_cache_window(cache_start, &mut buffer)?;
            window_loaded = true;
        }

        let cipher = table.cipher_for_block(s as usize / SECTORS_PER_BLOCK);
        let offset = (s - cache_start) as usize * RAW_SECTOR_SIZE;

        let mut attempts = 0;
        loop {
            let raw_sector = &mut buffer[offset..offset + RAW_SECTOR_SIZE];
            cipher.decode(raw_sector, sector::USER_OFFSET);
            if sector::edc_matches(raw_sector) {
                if let Some((writer, _)) = iso.as_mut() {
                    writer.write_all(&raw_sector[ISO_WRITE_OFFSET..ISO_WRITE_OFFSET + SECTOR_SIZE])?;
                }
                if let Some((writer, _)) = raw.as_mut() {
                    writer.write_all(raw_sector)?;
                }
                break;
            }

            attempts += 1;
            if attempts >= SECTOR_RETRY_LIMIT {
                return Err(BackupError::SectorDecodeFailed { sector: s, attempts });
            }
            log::warn!(
                "sector {s}: EDC mismatch, flushing cache and retrying \
                 ({attempts}/{SECTOR_RETRY_LIMIT})"
            );
            source.clear_cache(cache_start)?;
            source.read_cache_window(cache_start, &mut buffer)?;
        }

        progress(u64::from(s) + 1, u64::from(sector_count));
    }

    if let Some((writer, _)) = iso.as_mut() {
        writer.flush()?;
    }
    if let Some((writer, _)) = raw.as_mut() {
        writer.flush()?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/backup_tests.rs"]
mod tests;
