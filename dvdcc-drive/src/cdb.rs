//! Command descriptor block builders.
//!
//! Every command travels as a 12-byte CDB with a data-in transfer. The
//! builders here are pure: they only assemble bytes, submission happens in
//! the transport. Multi-byte fields are big-endian throughout; host byte
//! order never touches the wire.

/// A 12-byte command descriptor block.
pub type Cdb = [u8; 12];

pub const SPC_TEST_UNIT_READY: u8 = 0x00;
pub const SPC_INQUIRY: u8 = 0x12;
pub const SBC_START_STOP: u8 = 0x1B;
pub const SPC_PREVENT_ALLOW: u8 = 0x1E;
pub const MMC_GET_EVENT_STATUS: u8 = 0x4A;
pub const MMC_READ_12: u8 = 0xA8;

/// Vendor-specific "read MCU memory" opcode (discovered by DaveX).
pub const HITACHI_READ_MCU: u8 = 0xE7;

/// MCU address where the raw-sector cache starts.
pub const HITACHI_MEM_BASE: u32 = 0x8000_0000;

/// Largest transfer a single 0xE7 read supports.
pub const MAX_MCU_TRANSFER: usize = 65_535;

/// Event-class mask selecting power-management events.
pub const EVENT_CLASS_POWER: u8 = 0x04;

/// INQUIRY: standard inquiry data, `alloc` bytes.
pub fn inquiry(alloc: u8) -> Cdb {
    let mut cdb = [0u8; 12];
    cdb[0] = SPC_INQUIRY;
    cdb[4] = alloc;
    cdb
}

/// START STOP UNIT. `start` spins the disc up or down; `load_eject` moves
/// the tray (with `start` selecting load vs eject).
pub fn start_stop(start: bool, load_eject: bool) -> Cdb {
    let mut cdb = [0u8; 12];
    cdb[0] = SBC_START_STOP;
    cdb[4] = (u8::from(load_eject) << 1) | u8::from(start);
    cdb
}

/// PREVENT ALLOW MEDIUM REMOVAL.
pub fn prevent_allow(prevent: bool) -> Cdb {
    let mut cdb = [0u8; 12];
    cdb[0] = SPC_PREVENT_ALLOW;
    cdb[4] = u8::from(prevent);
    cdb
}

/// GET EVENT STATUS NOTIFICATION, polled mode.
pub fn get_event_status(class_mask: u8, alloc: u16) -> Cdb {
    let mut cdb = [0u8; 12];
    cdb[0] = MMC_GET_EVENT_STATUS;
    cdb[1] = 0x01; // polled
    cdb[4] = class_mask;
    cdb[7..9].copy_from_slice(&alloc.to_be_bytes());
    cdb
}

/// TEST UNIT READY: empty payload, ready iff the command succeeds cleanly.
pub fn test_unit_ready() -> Cdb {
    [0u8; 12]
}

/// READ(12) for 2048-byte user sectors.
///
/// `streaming` requests the continuous-read mode that makes the drive
/// prefetch a full cache window; `fua` bypasses the cache for this command
/// (a zero-length FUA read is the cache-flush idiom).
pub fn read12(lba: u32, count: u32, streaming: bool, fua: bool) -> Cdb {
    let mut cdb = [0u8; 12];
    cdb[0] = MMC_READ_12;
    if fua {
        cdb[1] = 0x08;
    }
    cdb[2..6].copy_from_slice(&lba.to_be_bytes());
    cdb[6..10].copy_from_slice(&count.to_be_bytes());
    if streaming {
        cdb[10] = 0x80;
    }
    cdb
}

/// Vendor 0xE7 read from drive MCU memory. Bytes 1-3 spell "HIT" and byte 4
/// selects the read-memory sub-command.
pub fn read_mcu_memory(address: u32, nbyte: u16) -> Cdb {
    let mut cdb = [0u8; 12];
    cdb[0] = HITACHI_READ_MCU;
    cdb[1] = b'H';
    cdb[2] = b'I';
    cdb[3] = b'T';
    cdb[4] = 0x01;
    cdb[6..10].copy_from_slice(&address.to_be_bytes());
    cdb[10..12].copy_from_slice(&nbyte.to_be_bytes());
    cdb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inquiry() {
        let cdb = inquiry(36);
        assert_eq!(cdb[0], 0x12);
        assert_eq!(cdb[4], 36);
        assert!(cdb[1..4].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_start_stop_bits() {
        assert_eq!(start_stop(true, false)[4], 0x01);
        assert_eq!(start_stop(false, false)[4], 0x00);
        assert_eq!(start_stop(true, true)[4], 0x03);
        assert_eq!(start_stop(false, true)[4], 0x02);
    }

    #[test]
    fn test_prevent_allow() {
        assert_eq!(prevent_allow(true)[4], 1);
        assert_eq!(prevent_allow(false)[4], 0);
    }

    #[test]
    fn test_event_status() {
        let cdb = get_event_status(EVENT_CLASS_POWER, 8);
        assert_eq!(cdb[0], 0x4A);
        assert_eq!(cdb[1], 0x01);
        assert_eq!(cdb[4], 0x04);
        assert_eq!(&cdb[7..9], &[0x00, 0x08]);
    }

    #[test]
    fn test_test_unit_ready_is_empty() {
        assert_eq!(test_unit_ready(), [0u8; 12]);
    }

    #[test]
    fn test_read12_lba_and_count_are_big_endian() {
        let cdb = read12(0x0102_0304, 0x0A0B_0C0D, false, false);
        assert_eq!(cdb[0], 0xA8);
        assert_eq!(&cdb[2..6], &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(&cdb[6..10], &[0x0A, 0x0B, 0x0C, 0x0D]);
        assert_eq!(cdb[1], 0);
        assert_eq!(cdb[10], 0);
    }

    #[test]
    fn test_read12_flag_bits() {
        assert_eq!(read12(0, 1, true, false)[10], 0x80);
        assert_eq!(read12(0, 1, false, true)[1], 0x08);
        let both = read12(0, 1, true, true);
        assert_eq!(both[1], 0x08);
        assert_eq!(both[10], 0x80);
    }

    #[test]
    fn test_read_mcu_memory_layout() {
        let cdb = read_mcu_memory(HITACHI_MEM_BASE + 0xFFFF, 65_535);
        assert_eq!(cdb[0], 0xE7);
        assert_eq!(&cdb[1..4], b"HIT");
        assert_eq!(cdb[4], 0x01);
        assert_eq!(cdb[5], 0);
        assert_eq!(&cdb[6..10], &[0x80, 0x00, 0xFF, 0xFF]);
        assert_eq!(&cdb[10..12], &[0xFF, 0xFF]);
    }
}
