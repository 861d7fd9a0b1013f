//! Packet transport: how a CDB reaches the drive.
//!
//! The [`Transport`] trait is the portability boundary of the whole command
//! layer. Its contract: submit one 12-byte CDB with a data-in buffer, block
//! until completion or timeout, and report the sense triple the drive
//! returned. A negative ioctl status is a transport failure and surfaces as
//! an error; a completed command with nonzero sense comes back as
//! `Ok(sense)` so callers that use sense as an oracle (the disc-geometry
//! probe) can inspect it.

use std::fmt;
use std::time::Duration;

use crate::cdb::Cdb;
use crate::error::Result;

/// Sense triple from the drive: key, additional sense code, qualifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sense {
    pub key: u8,
    pub asc: u8,
    pub ascq: u8,
}

impl Sense {
    pub const NONE: Sense = Sense { key: 0, asc: 0, ascq: 0 };

    /// No error reported.
    pub fn is_ok(&self) -> bool {
        self.key == 0
    }

    /// ILLEGAL REQUEST / LBA OUT OF RANGE, the reply the geometry probe
    /// looks for beyond the last sector.
    pub fn is_lba_out_of_range(&self) -> bool {
        self.key == 0x05 && self.asc == 0x21
    }
}

impl fmt::Display for Sense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}/{:02X}/{:02X}", self.key, self.asc, self.ascq)
    }
}

/// A channel that can carry packet commands to a drive.
pub trait Transport {
    /// Submit `cdb`, reading up to `buffer.len()` bytes back into `buffer`.
    fn execute(&mut self, cdb: &Cdb, buffer: &mut [u8], timeout: Duration) -> Result<Sense>;
}

#[cfg(target_os = "linux")]
mod linux {
    use std::fs::{File, OpenOptions};
    use std::io;
    use std::os::unix::fs::OpenOptionsExt;
    use std::os::unix::io::AsRawFd;
    use std::path::Path;
    use std::ptr;
    use std::time::Duration;

    use super::{Sense, Transport};
    use crate::cdb::Cdb;
    use crate::error::Result;

    const CDROM_SEND_PACKET: libc::c_ulong = 0x5393;
    const CGC_DATA_READ: libc::c_uchar = 2;

    /// Sense buffer image; key in the low nibble of byte 2, ASC/ASCQ at
    /// bytes 12 and 13.
    #[repr(C)]
    struct RequestSense {
        bytes: [u8; 64],
    }

    /// Kernel `cdrom_generic_command` image.
    #[repr(C)]
    struct CdromGenericCommand {
        cmd: [u8; 12],
        buffer: *mut u8,
        buflen: libc::c_uint,
        stat: libc::c_int,
        sense: *mut RequestSense,
        data_direction: libc::c_uchar,
        quiet: libc::c_int,
        timeout: libc::c_int,
        unused: *mut libc::c_void,
    }

    /// Transport over the kernel's generic-packet ioctl on a block device
    /// such as `/dev/sr0`.
    pub struct CdromTransport {
        file: File,
    }

    impl CdromTransport {
        /// Open the device read-only and non-blocking; packet commands do
        /// not need write access.
        pub fn open(path: &Path) -> io::Result<Self> {
            let file = OpenOptions::new()
                .read(true)
                .custom_flags(libc::O_NONBLOCK)
                .open(path)?;
            Ok(Self { file })
        }
    }

    impl Transport for CdromTransport {
        fn execute(&mut self, cdb: &Cdb, buffer: &mut [u8], timeout: Duration) -> Result<Sense> {
            let mut sense = RequestSense { bytes: [0u8; 64] };
            let mut cgc = CdromGenericCommand {
                cmd: *cdb,
                buffer: buffer.as_mut_ptr(),
                buflen: buffer.len() as libc::c_uint,
                stat: 0,
                sense: &mut sense,
                data_direction: CGC_DATA_READ,
                quiet: 0,
                timeout: timeout.as_millis() as libc::c_int,
                unused: ptr::null_mut(),
            };

            log::debug!("submitting cdb {cdb:02X?}");
            let status =
                unsafe { libc::ioctl(self.file.as_raw_fd(), CDROM_SEND_PACKET, &mut cgc) };
            if status < 0 {
                return Err(io::Error::last_os_error().into());
            }

            let sense = Sense {
                key: sense.bytes[2] & 0x0F,
                asc: sense.bytes[12],
                ascq: sense.bytes[13],
            };
            log::debug!("sense {sense} (status {status})");
            Ok(sense)
        }
    }
}

#[cfg(target_os = "linux")]
pub use linux::CdromTransport;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sense_display() {
        let sense = Sense { key: 0x05, asc: 0x21, ascq: 0x00 };
        assert_eq!(sense.to_string(), "05/21/00");
    }

    #[test]
    fn test_sense_predicates() {
        assert!(Sense::NONE.is_ok());
        assert!(!Sense::NONE.is_lba_out_of_range());

        let oor = Sense { key: 0x05, asc: 0x21, ascq: 0x00 };
        assert!(!oor.is_ok());
        assert!(oor.is_lba_out_of_range());

        // Same ASC under a different key is not the probe oracle.
        let other = Sense { key: 0x02, asc: 0x21, ascq: 0x00 };
        assert!(!other.is_lba_out_of_range());
    }
}
