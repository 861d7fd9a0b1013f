//! Drive lifecycle and the raw-sector cache protocol.
//!
//! [`Drive`] owns the transport and sequences every command the imaging
//! pipeline needs: inquiry at open, spin up/down, tray control, readiness
//! polling, disc-geometry probing, and the streaming-read → raw-memory-read
//! dance that yields 80 raw sectors per cache window.

use std::cmp;
use std::time::Duration;

use dvdcc_core::{DiscType, CACHE_SIZE, SECTOR_SIZE};

use crate::cdb::{self, HITACHI_MEM_BASE, MAX_MCU_TRANSFER};
use crate::error::{DriveError, Result};
use crate::transport::{Sense, Transport};

#[cfg(target_os = "linux")]
use std::path::Path;

#[cfg(target_os = "linux")]
use crate::transport::CdromTransport;

/// Default per-command timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Consecutive good readiness polls required before cache reads may start.
const QUIESCENT_GOOD_POLLS: u32 = 3;

/// Readiness polls before giving up on the drive.
const QUIESCENT_POLL_LIMIT: u32 = 1000;

/// Sectors past a candidate geometry's end probed for the out-of-range
/// sense reply.
const PROBE_OVERSHOOT: u32 = 100;

/// Displacement used to pick a "distant" LBA when flushing the cache; must
/// land well outside the current 80-sector window.
const CACHE_FLUSH_DISTANCE: u32 = 10_000;

/// MMC power states reported by GET EVENT STATUS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    Active,
    Idle,
    Standby,
    Sleep,
    Other(u8),
}

impl PowerState {
    pub fn from_byte(byte: u8) -> PowerState {
        match byte {
            0x01 => PowerState::Active,
            0x02 => PowerState::Idle,
            0x03 => PowerState::Standby,
            0x04 => PowerState::Sleep,
            other => PowerState::Other(other),
        }
    }
}

/// A DVD drive behind a packet transport.
///
/// Commands are strictly ordered: each is submitted and awaited before the
/// next. During a cache read no unrelated command may be interleaved, or
/// the drive overwrites the cache contents.
pub struct Drive<T: Transport> {
    transport: T,
    timeout: Duration,
    poll_interval: Duration,
    model: String,
}

impl<T: Transport> Drive<T> {
    /// Wrap a transport and read the drive's model string.
    pub fn with_transport(transport: T, timeout: Duration) -> Result<Self> {
        let mut drive = Self {
            transport,
            timeout,
            poll_interval: Duration::from_secs(1),
            model: String::new(),
        };
        drive.model = drive.inquiry()?;
        Ok(drive)
    }

    /// Drive model as `vendor/product/revision`.
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Override the readiness-poll interval (tests use a zero interval).
    pub fn set_poll_interval(&mut self, interval: Duration) {
        self.poll_interval = interval;
    }

    fn submit(&mut self, cdb: &cdb::Cdb, buffer: &mut [u8]) -> Result<Sense> {
        self.transport.execute(cdb, buffer, self.timeout)
    }

    fn submit_checked(&mut self, cdb: &cdb::Cdb, buffer: &mut [u8]) -> Result<()> {
        let sense = self.submit(cdb, buffer)?;
        if sense.is_ok() {
            Ok(())
        } else {
            Err(DriveError::from_sense(sense))
        }
    }

    fn inquiry(&mut self) -> Result<String> {
        let mut data = [0u8; 36];
        self.submit_checked(&cdb::inquiry(data.len() as u8), &mut data)?;
        let field = |range: std::ops::Range<usize>| -> String {
            String::from_utf8_lossy(&data[range]).trim_end().to_string()
        };
        Ok(format!("{}/{}/{}", field(8..16), field(16..32), field(32..36)))
    }

    /// Start spinning the disc.
    pub fn start(&mut self) -> Result<()> {
        self.submit_checked(&cdb::start_stop(true, false), &mut [])
    }

    /// Stop spinning the disc.
    pub fn stop(&mut self) -> Result<()> {
        self.submit_checked(&cdb::start_stop(false, false), &mut [])
    }

    /// Close the tray and load the disc.
    pub fn load(&mut self) -> Result<()> {
        self.submit_checked(&cdb::start_stop(true, true), &mut [])
    }

    /// Stop the disc and open the tray.
    pub fn eject(&mut self) -> Result<()> {
        self.submit_checked(&cdb::start_stop(false, true), &mut [])
    }

    /// Lock or unlock the tray for the duration of an imaging run.
    pub fn prevent_removal(&mut self, prevent: bool) -> Result<()> {
        self.submit_checked(&cdb::prevent_allow(prevent), &mut [])
    }

    /// TEST UNIT READY: true when the command completes with no sense.
    pub fn is_ready(&mut self) -> Result<bool> {
        let sense = self.submit(&cdb::test_unit_ready(), &mut [])?;
        Ok(sense.is_ok())
    }

    /// Current power state from a polled GET EVENT STATUS.
    pub fn power_state(&mut self) -> Result<PowerState> {
        let mut data = [0u8; 8];
        let cdb = cdb::get_event_status(cdb::EVENT_CLASS_POWER, data.len() as u16);
        self.submit_checked(&cdb, &mut data)?;
        Ok(PowerState::from_byte(data[5]))
    }

    /// Wait until the drive is ready and out of the Active power state.
    ///
    /// The drive keeps scanning the medium in the background for a while
    /// after spin-up, and any such activity silently overwrites the raw
    /// cache between the streaming read and the 0xE7 readout. Requires
    /// three consecutive good polls; gives up after 1000.
    pub fn wait_for_quiescence(&mut self) -> Result<()> {
        let mut good = 0;
        for _ in 0..QUIESCENT_POLL_LIMIT {
            let ready = self.is_ready()?;
            let power = self.power_state()?;
            if ready && power != PowerState::Active {
                good += 1;
                if good >= QUIESCENT_GOOD_POLLS {
                    return Ok(());
                }
            } else {
                good = 0;
            }
            std::thread::sleep(self.poll_interval);
        }
        Err(DriveError::NotQuiescent { polls: QUIESCENT_POLL_LIMIT })
    }

    /// Identify the disc geometry by probing reads past each candidate's
    /// last sector. A 05/21 (LBA out of range) reply at `count + 100` means
    /// the disc ends at `count`.
    pub fn probe_disc_type(&mut self) -> Result<DiscType> {
        let mut data = vec![0u8; SECTOR_SIZE];
        for candidate in DiscType::CANDIDATES {
            let count = candidate
                .sector_count()
                .expect("candidate geometries have known sizes");
            let cdb = cdb::read12(count + PROBE_OVERSHOOT, 1, false, false);
            let sense = self.submit(&cdb, &mut data)?;
            log::debug!("probe {candidate}: sense {sense}");
            if sense.is_lba_out_of_range() {
                return Ok(candidate);
            }
        }
        Ok(DiscType::Unknown)
    }

    /// Read `count` user sectors at `lba` into `buffer`.
    pub fn read_sectors(
        &mut self,
        lba: u32,
        count: u32,
        streaming: bool,
        fua: bool,
        buffer: &mut [u8],
    ) -> Result<()> {
        self.submit_checked(&cdb::read12(lba, count, streaming, fua), buffer)
    }

    /// Read drive MCU memory at `offset` from the cache base address.
    ///
    /// Requires root for the vendor opcode; privileges are raised for
    /// exactly this command and dropped again on every path out.
    pub fn read_mcu_memory(&mut self, offset: u32, buffer: &mut [u8]) -> Result<()> {
        let nbyte = buffer.len();
        if nbyte == 0 || nbyte > MAX_MCU_TRANSFER {
            return Err(DriveError::InvalidTransferLength { nbyte });
        }
        let cdb = cdb::read_mcu_memory(HITACHI_MEM_BASE + offset, nbyte as u16);

        #[cfg(unix)]
        let _guard = crate::privileges::PrivilegeGuard::elevate();

        self.submit_checked(&cdb, buffer)
    }

    /// Fill `buffer` with the 80 raw sectors of the cache window holding
    /// `sector`.
    ///
    /// Sequence: a one-sector streaming read makes the drive prefetch the
    /// full window (the returned user bytes are discarded), then the cache
    /// is pulled out of MCU memory in chunks of at most 65,535 bytes. No
    /// other command may be issued in between. `sector` should be a
    /// multiple of 80; the drive aligns the window itself either way.
    pub fn read_raw_sector_cache(&mut self, sector: u32, buffer: &mut [u8]) -> Result<()> {
        assert_eq!(buffer.len(), CACHE_SIZE, "cache buffer must hold 80 raw sectors");
        log::debug!("filling raw-sector cache from sector {sector}");

        let mut discard = vec![0u8; SECTOR_SIZE];
        self.read_sectors(sector, 1, true, false, &mut discard)?;

        buffer.fill(0);
        let mut offset = 0;
        while offset < CACHE_SIZE {
            let len = cmp::min(MAX_MCU_TRANSFER, CACHE_SIZE - offset);
            self.read_mcu_memory(offset as u32, &mut buffer[offset..offset + len])?;
            offset += len;
        }
        Ok(())
    }

    /// Flush the raw-sector cache with a zero-length FUA read at an LBA far
    /// from `near_sector`.
    pub fn clear_cache(&mut self, near_sector: u32) -> Result<()> {
        let lba = if near_sector >= CACHE_FLUSH_DISTANCE {
            near_sector - CACHE_FLUSH_DISTANCE
        } else {
            near_sector + CACHE_FLUSH_DISTANCE
        };
        log::debug!("flushing cache via FUA read at sector {lba}");
        self.read_sectors(lba, 0, false, true, &mut [])
    }
}

#[cfg(target_os = "linux")]
impl Drive<CdromTransport> {
    /// Open a drive at `path` (e.g. `/dev/sr0`) and read its model string.
    pub fn open(path: &Path, timeout: Duration) -> Result<Self> {
        let transport = CdromTransport::open(path)?;
        Self::with_transport(transport, timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdb::Cdb;
    use std::collections::VecDeque;

    struct Reply {
        sense: Sense,
        data: Vec<u8>,
    }

    impl Reply {
        fn ok() -> Reply {
            Reply { sense: Sense::NONE, data: Vec::new() }
        }

        fn with_data(data: Vec<u8>) -> Reply {
            Reply { sense: Sense::NONE, data }
        }

        fn with_sense(key: u8, asc: u8) -> Reply {
            Reply { sense: Sense { key, asc, ascq: 0 }, data: Vec::new() }
        }
    }

    /// Scripted transport: pops one reply per command and records the CDBs.
    struct MockTransport {
        script: VecDeque<Reply>,
        log: Vec<Cdb>,
    }

    impl MockTransport {
        fn new(script: Vec<Reply>) -> MockTransport {
            MockTransport { script: script.into(), log: Vec::new() }
        }
    }

    impl Transport for MockTransport {
        fn execute(&mut self, cdb: &Cdb, buffer: &mut [u8], _timeout: Duration) -> Result<Sense> {
            self.log.push(*cdb);
            let reply = self.script.pop_front().expect("unexpected command");
            let n = reply.data.len().min(buffer.len());
            buffer[..n].copy_from_slice(&reply.data[..n]);
            Ok(reply.sense)
        }
    }

    fn inquiry_reply() -> Reply {
        let mut data = vec![0u8; 36];
        data[8..16].copy_from_slice(b"HL-DT-ST");
        data[16..32].copy_from_slice(b"DVD-ROM GDR8164B");
        data[32..36].copy_from_slice(b"0L06");
        Reply::with_data(data)
    }

    fn event_reply(power: u8) -> Reply {
        let mut data = vec![0u8; 8];
        data[5] = power;
        Reply::with_data(data)
    }

    fn open_drive(mut script: Vec<Reply>) -> Drive<MockTransport> {
        script.insert(0, inquiry_reply());
        let mut drive =
            Drive::with_transport(MockTransport::new(script), DEFAULT_TIMEOUT).unwrap();
        drive.set_poll_interval(Duration::ZERO);
        drive
    }

    #[test]
    fn test_open_parses_model_string() {
        let drive = open_drive(vec![]);
        assert_eq!(drive.model(), "HL-DT-ST/DVD-ROM GDR8164B/0L06");
    }

    #[test]
    fn test_start_stop_load_eject_bits() {
        let mut drive = open_drive(vec![Reply::ok(), Reply::ok(), Reply::ok(), Reply::ok()]);
        drive.start().unwrap();
        drive.stop().unwrap();
        drive.load().unwrap();
        drive.eject().unwrap();
        let log = &drive.transport.log[1..];
        assert!(log.iter().all(|cdb| cdb[0] == 0x1B));
        assert_eq!(log[0][4], 0x01);
        assert_eq!(log[1][4], 0x00);
        assert_eq!(log[2][4], 0x03);
        assert_eq!(log[3][4], 0x02);
    }

    #[test]
    fn test_probe_gamecube() {
        // Out-of-range reply at 712980 identifies a GameCube disc.
        let mut drive = open_drive(vec![Reply::with_sense(0x05, 0x21)]);
        assert_eq!(drive.probe_disc_type().unwrap(), DiscType::GameCube);
        let probe_cdb = drive.transport.log[1];
        assert_eq!(probe_cdb[0], 0xA8);
        assert_eq!(&probe_cdb[2..6], &712_980u32.to_be_bytes());
        assert_eq!(probe_cdb[10], 0, "probe reads are not streaming");
    }

    #[test]
    fn test_probe_falls_through_to_wii() {
        // The GameCube overshoot read succeeds (the disc is bigger), the
        // Wii single-layer overshoot reports out of range.
        let mut drive = open_drive(vec![Reply::ok(), Reply::with_sense(0x05, 0x21)]);
        assert_eq!(drive.probe_disc_type().unwrap(), DiscType::WiiSingleLayer);
        assert_eq!(&drive.transport.log[2][2..6], &2_295_012u32.to_be_bytes());
    }

    #[test]
    fn test_probe_ignores_other_sense() {
        // Random sense errors are not the out-of-range oracle.
        let mut drive = open_drive(vec![
            Reply::with_sense(0x02, 0x3A),
            Reply::with_sense(0x02, 0x3A),
            Reply::with_sense(0x02, 0x3A),
        ]);
        assert_eq!(drive.probe_disc_type().unwrap(), DiscType::Unknown);
    }

    #[test]
    fn test_probe_unknown_when_all_reads_succeed() {
        let mut drive = open_drive(vec![Reply::ok(), Reply::ok(), Reply::ok()]);
        assert_eq!(drive.probe_disc_type().unwrap(), DiscType::Unknown);
    }

    #[test]
    fn test_cache_read_sequence() {
        let window: Vec<u8> = (0..CACHE_SIZE).map(|i| (i % 251) as u8).collect();
        let mut drive = open_drive(vec![
            Reply::with_data(vec![0xAA; SECTOR_SIZE]),
            Reply::with_data(window[..65_535].to_vec()),
            Reply::with_data(window[65_535..131_070].to_vec()),
            Reply::with_data(window[131_070..].to_vec()),
        ]);

        let mut buffer = vec![0xFFu8; CACHE_SIZE];
        drive.read_raw_sector_cache(160, &mut buffer).unwrap();
        assert_eq!(buffer, window);

        let log = &drive.transport.log[1..];
        assert_eq!(log.len(), 4);

        // Streaming READ(12) of exactly one sector, no FUA.
        assert_eq!(log[0][0], 0xA8);
        assert_eq!(&log[0][2..6], &160u32.to_be_bytes());
        assert_eq!(&log[0][6..10], &1u32.to_be_bytes());
        assert_eq!(log[0][10], 0x80);
        assert_eq!(log[0][1], 0);

        // Three 0xE7 sweeps at base, base + 65535, base + 131070.
        for (i, expected_offset) in [(1usize, 0u32), (2, 65_535), (3, 131_070)] {
            assert_eq!(log[i][0], 0xE7);
            let address = u32::from_be_bytes(log[i][6..10].try_into().unwrap());
            assert_eq!(address, HITACHI_MEM_BASE + expected_offset);
        }
        let last_len = u16::from_be_bytes(log[3][10..12].try_into().unwrap());
        assert_eq!(last_len as usize, CACHE_SIZE - 2 * 65_535);
    }

    #[test]
    fn test_mcu_transfer_length_limits() {
        let mut drive = open_drive(vec![]);
        let mut empty: [u8; 0] = [];
        assert!(matches!(
            drive.read_mcu_memory(0, &mut empty),
            Err(DriveError::InvalidTransferLength { nbyte: 0 })
        ));
        let mut oversized = vec![0u8; MAX_MCU_TRANSFER + 1];
        assert!(matches!(
            drive.read_mcu_memory(0, &mut oversized),
            Err(DriveError::InvalidTransferLength { nbyte: 65_536 })
        ));
    }

    #[test]
    fn test_clear_cache_is_fua_zero_length() {
        let mut drive = open_drive(vec![Reply::ok(), Reply::ok()]);
        drive.clear_cache(160).unwrap();
        drive.clear_cache(40_000).unwrap();

        let near = drive.transport.log[1];
        assert_eq!(near[0], 0xA8);
        assert_eq!(near[1], 0x08, "FUA set");
        assert_eq!(&near[6..10], &0u32.to_be_bytes(), "zero transfer length");
        assert_eq!(&near[2..6], &10_160u32.to_be_bytes());

        let far = drive.transport.log[2];
        assert_eq!(&far[2..6], &30_000u32.to_be_bytes());
    }

    #[test]
    fn test_quiescence_requires_three_consecutive_goods() {
        // ready+idle, ready+idle, ready+ACTIVE (resets), then three goods.
        let script = vec![
            Reply::ok(), event_reply(0x02),
            Reply::ok(), event_reply(0x02),
            Reply::ok(), event_reply(0x01),
            Reply::ok(), event_reply(0x02),
            Reply::ok(), event_reply(0x03),
            Reply::ok(), event_reply(0x02),
        ];
        let mut drive = open_drive(script);
        drive.wait_for_quiescence().unwrap();
        // inquiry + six poll pairs, nothing more
        assert_eq!(drive.transport.log.len(), 13);
    }

    #[test]
    fn test_quiescence_counts_not_ready_as_bad() {
        let mut script = vec![
            Reply::with_sense(0x02, 0x04), event_reply(0x02), // not ready
        ];
        script.extend([
            Reply::ok(), event_reply(0x02),
            Reply::ok(), event_reply(0x02),
            Reply::ok(), event_reply(0x02),
        ]);
        let mut drive = open_drive(script);
        drive.wait_for_quiescence().unwrap();
        assert_eq!(drive.transport.log.len(), 9);
    }

    #[test]
    fn test_quiescence_gives_up() {
        let mut script = Vec::new();
        for _ in 0..QUIESCENT_POLL_LIMIT {
            script.push(Reply::ok());
            script.push(event_reply(0x01)); // forever Active
        }
        let mut drive = open_drive(script);
        assert!(matches!(
            drive.wait_for_quiescence(),
            Err(DriveError::NotQuiescent { polls: QUIESCENT_POLL_LIMIT })
        ));
    }

    #[test]
    fn test_power_state_decoding() {
        assert_eq!(PowerState::from_byte(0x01), PowerState::Active);
        assert_eq!(PowerState::from_byte(0x02), PowerState::Idle);
        assert_eq!(PowerState::from_byte(0x03), PowerState::Standby);
        assert_eq!(PowerState::from_byte(0x04), PowerState::Sleep);
        assert_eq!(PowerState::from_byte(0x7F), PowerState::Other(0x7F));
    }
}
