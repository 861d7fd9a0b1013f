//! Imaging pipeline for GameCube/Wii discs.
//!
//! Sits between the drive command layer (`dvdcc-drive`) and the CLI. Three
//! stages, run in order against anything that implements
//! [`RawSectorSource`]:
//!
//! 1. [`keys::recover_cipher_table`] brute-forces the per-block LFSR seeds
//!    using the EDC as an oracle and detects where the seed sequence starts
//!    repeating.
//! 2. [`disc_info`] decodes the identification header (and, for Wii discs,
//!    the system-update word) for display.
//! 3. [`backup::run_backup`] streams every sector through decode → verify →
//!    retry and writes the ISO and/or raw image, resuming partial runs.
//!
//! Tests run the same pipeline against a simulated scrambled disc instead
//! of drive hardware.

pub mod backup;
pub mod disc_info;
pub mod error;
pub mod keys;
pub mod source;

pub use backup::{run_backup, BackupOptions};
pub use error::BackupError;
pub use keys::RecoveredKeys;
pub use source::RawSectorSource;

#[cfg(test)]
#[path = "tests/fixture.rs"]
pub(crate) mod fixture;
