use thiserror::Error;

use crate::transport::Sense;

/// Errors reported by the drive command layer.
#[derive(Debug, Error)]
pub enum DriveError {
    /// Transport-level failure: the command never completed.
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),

    /// The drive completed the command but reported a sense error.
    #[error("drive reported sense {sense}")]
    Sense { sense: Sense },

    /// The drive never settled into a quiescent power state.
    #[error("drive still busy after {polls} readiness polls")]
    NotQuiescent { polls: u32 },

    /// A raw-memory read was requested with an unsupported length.
    #[error("raw memory read length {nbyte} out of range (valid: 1-65535)")]
    InvalidTransferLength { nbyte: usize },
}

impl DriveError {
    pub fn from_sense(sense: Sense) -> Self {
        Self::Sense { sense }
    }
}

pub type Result<T> = std::result::Result<T, DriveError>;
