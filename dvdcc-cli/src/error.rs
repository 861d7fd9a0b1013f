use thiserror::Error;

use dvdcc_drive::DriveError;
use dvdcc_lib::BackupError;

/// Errors surfaced to the user by the CLI.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    #[error(transparent)]
    Drive(#[from] DriveError),

    #[error(transparent)]
    Backup(#[from] BackupError),

    /// The probe matched no known geometry.
    #[error("could not identify the disc; only pressed GameCube and Wii discs are supported")]
    UnknownDisc,
}
