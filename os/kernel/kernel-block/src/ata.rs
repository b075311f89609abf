//! # ATA PIO (LBA28) controller
//!
//! Reads sectors from the legacy IDE controller using programmed I/O. Every
//! wait on the device is bounded by [`AtaPio::POLL_LIMIT`] status reads, so a
//! missing or wedged drive produces an error instead of a hang.
//!
//! ```text
//! bus 0: command block 0x1F0..=0x1F7, control 0x3F6
//! bus 1: command block 0x170..=0x177, control 0x376
//! ```

use crate::ports::{inb, inw, outb};
use crate::{BlockError, DiskController, DriveId, Sector};
use log::trace;

const REG_DATA: u16 = 0;
const REG_SECTOR_COUNT: u16 = 2;
const REG_LBA_LOW: u16 = 3;
const REG_LBA_MID: u16 = 4;
const REG_LBA_HIGH: u16 = 5;
const REG_DRIVE_HEAD: u16 = 6;
const REG_STATUS_COMMAND: u16 = 7;

const CMD_READ_SECTORS: u8 = 0x20;

const STATUS_ERR: u8 = 1 << 0;
const STATUS_DRQ: u8 = 1 << 3;
const STATUS_DF: u8 = 1 << 5;
const STATUS_BSY: u8 = 1 << 7;

/// Highest sector addressable with LBA28.
const LBA28_MAX: u32 = 0x0FFF_FFFF;

/// Legacy ATA controller on the standard ISA ports.
#[derive(Debug, Default)]
pub struct AtaPio {
    _private: (),
}

impl AtaPio {
    /// Maximum number of status polls per wait.
    pub const POLL_LIMIT: u32 = 100_000;

    /// Create a handle to the legacy controller.
    ///
    /// # Safety
    /// The caller must run at CPL0 and must be the only user of the legacy
    /// IDE ports while the handle is alive.
    #[must_use]
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }

    const fn ports(drive: DriveId) -> Option<(u16, u16)> {
        match drive.bus {
            0 => Some((0x1F0, 0x3F6)),
            1 => Some((0x170, 0x376)),
            _ => None,
        }
    }

    /// Wait for BSY to clear, then for DRQ, failing on ERR/DF or a floating bus.
    fn wait_for_data(base: u16) -> Result<(), BlockError> {
        for _ in 0..Self::POLL_LIMIT {
            let status = unsafe { inb(base + REG_STATUS_COMMAND) };
            if status == 0xFF || status == 0x00 {
                return Err(BlockError::NotPresent);
            }
            if status & STATUS_BSY != 0 {
                continue;
            }
            if status & (STATUS_ERR | STATUS_DF) != 0 {
                return Err(BlockError::Io);
            }
            if status & STATUS_DRQ != 0 {
                return Ok(());
            }
        }
        Err(BlockError::Timeout)
    }

    /// Roughly 400ns: four reads of the alternate status register.
    fn settle(control: u16) {
        for _ in 0..4 {
            unsafe {
                inb(control);
            }
        }
    }
}

impl DiskController for AtaPio {
    #[allow(clippy::cast_possible_truncation)]
    fn read_sector(
        &mut self,
        drive: DriveId,
        lba: u32,
        buf: &mut Sector,
    ) -> Result<(), BlockError> {
        let (base, control) = Self::ports(drive).ok_or(BlockError::NotPresent)?;
        if drive.drive > 1 {
            return Err(BlockError::NotPresent);
        }
        if lba > LBA28_MAX {
            return Err(BlockError::OutOfRange(lba));
        }

        // A floating bus reads back all ones.
        if unsafe { inb(base + REG_STATUS_COMMAND) } == 0xFF {
            return Err(BlockError::NotPresent);
        }

        unsafe {
            outb(
                base + REG_DRIVE_HEAD,
                0xE0 | (drive.drive << 4) | ((lba >> 24) as u8 & 0x0F),
            );
            Self::settle(control);
            outb(base + REG_SECTOR_COUNT, 1);
            outb(base + REG_LBA_LOW, lba as u8);
            outb(base + REG_LBA_MID, (lba >> 8) as u8);
            outb(base + REG_LBA_HIGH, (lba >> 16) as u8);
            outb(base + REG_STATUS_COMMAND, CMD_READ_SECTORS);
        }

        if let Err(e) = Self::wait_for_data(base) {
            trace!("ata {drive}: lba {lba}: {e}");
            return Err(e);
        }

        for pair in buf.chunks_exact_mut(2) {
            let word = unsafe { inw(base + REG_DATA) };
            pair.copy_from_slice(&word.to_le_bytes());
        }
        Ok(())
    }
}
