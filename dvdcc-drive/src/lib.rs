//! Drive command layer for Hitachi/LG DVD-ROM drives.
//!
//! These drives normally return only the cleaned 2048-byte user area of each
//! sector. Getting at the 2064-byte raw sectors takes two pieces working
//! together: a streaming READ(12) that makes the drive prefetch five blocks
//! (80 raw sectors) into its internal cache, and the vendor 0xE7 "HIT"
//! command that reads the cache back out of MCU memory. This crate builds
//! the 12-byte command descriptor blocks, submits them through a packet
//! [`Transport`], and wraps the whole drive lifecycle (inquiry, spin
//! up/down, tray control, readiness polling, geometry probing, raw cache
//! reads) in [`Drive`].
//!
//! The [`Transport`] trait is the portability boundary: the Linux
//! implementation goes through the kernel's generic-packet ioctl, and tests
//! drive the same code against a scripted mock.

pub mod cdb;
pub mod device;
pub mod error;
#[cfg(unix)]
pub mod privileges;
pub mod transport;

pub use device::{Drive, PowerState};
pub use error::{DriveError, Result};
pub use transport::{Sense, Transport};

#[cfg(target_os = "linux")]
pub use transport::CdromTransport;
