use std::path::PathBuf;

use thiserror::Error;

use dvdcc_drive::DriveError;

/// Errors from key recovery and the backup pipeline.
#[derive(Debug, Error)]
pub enum BackupError {
    /// A drive command failed.
    #[error(transparent)]
    Drive(#[from] DriveError),

    /// Output file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No seed in 1..=0x7FFF descrambles the block.
    #[error("no seed descrambles block {block}")]
    SeedSearchExhausted { block: usize },

    /// A recovered cipher failed to verify across the block's sectors.
    #[error("failed to decode block {block}")]
    BlockDecodeFailed { block: usize },

    /// The seed sequence never wrapped, so the repeat period is unknown.
    #[error("cipher sequence did not repeat within {blocks} blocks")]
    CipherSequenceOpen { blocks: usize },

    /// A sector kept failing EDC verification through every retry.
    #[error("sector {sector} failed to decode after {attempts} attempts")]
    SectorDecodeFailed { sector: u32, attempts: usize },

    /// Resume was requested but the output file is missing.
    #[error("cannot resume: {} does not exist", .path.display())]
    ResumeMissing { path: PathBuf },

    /// Resume was requested but the output length is not sector-aligned.
    #[error(
        "cannot resume: {} length {len} is not a multiple of {sector_size} bytes",
        .path.display()
    )]
    ResumeMisaligned { path: PathBuf, len: u64, sector_size: u64 },

    /// The ISO and raw outputs disagree about where to resume.
    #[error("resume offsets disagree: iso is at sector {iso}, raw at sector {raw}")]
    ResumeMismatch { iso: u64, raw: u64 },
}
