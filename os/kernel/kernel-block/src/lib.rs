//! # Sector-Level Block Access
//!
//! The boot-time filesystem pipeline reads disks one 512-byte sector at a
//! time. This crate defines the two seams it reads through and the drivers
//! that sit behind them:
//!
//! * [`BlockReader`]: a single addressable device (`read_sector(lba)`).
//! * [`DiskController`]: a controller with several drives, addressed by
//!   [`DriveId`] (`read_sector(drive, lba)`).
//!
//! [`DriveReader`] binds a controller and one drive into a [`BlockReader`], so
//! filesystem code never sees bus or drive numbers.
//!
//! ## Drivers
//!
//! | Driver | Backing | Notes |
//! |--------|---------|-------|
//! | [`ata::AtaPio`] | legacy IDE ports `0x1F0`/`0x170` | LBA28, bounded polling, `x86_64` only |
//! | [`MemoryDisk`] | byte slice | disk images in RAM, host tests |
//! | [`MemoryController`] | up to four [`MemoryDisk`]s | stands in for the ATA controller |
//! | [`NoDisks`] | nothing | every read reports [`BlockError::NotPresent`] |
//!
//! ## Scan order
//!
//! The legacy controller exposes two buses with two drives each. Callers that
//! probe for a boot disk walk [`DriveId::LEGACY`] in order:
//! `(0,0)`, `(0,1)`, `(1,0)`, `(1,1)`.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

#[cfg(target_arch = "x86_64")]
pub mod ata;
mod memory;
#[cfg(target_arch = "x86_64")]
mod ports;

pub use memory::{MemoryController, MemoryDisk};

/// Size of one disk sector in bytes.
pub const SECTOR_SIZE: usize = 512;

/// One sector worth of bytes.
pub type Sector = [u8; SECTOR_SIZE];

/// Errors reported by block devices.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum BlockError {
    /// No device answers at this address.
    #[error("no device present")]
    NotPresent,
    /// The device did not become ready within the polling budget.
    #[error("device timed out")]
    Timeout,
    /// The device reported an error or a fault for the transfer.
    #[error("device reported an I/O error")]
    Io,
    /// The sector lies beyond what the device can address.
    #[error("sector {0} is out of range")]
    OutOfRange(u32),
}

/// A device that reads whole sectors by logical block address.
pub trait BlockReader {
    /// Read sector `lba` into `buf`.
    ///
    /// # Errors
    /// Any [`BlockError`]; `buf` contents are unspecified on error.
    fn read_sector(&mut self, lba: u32, buf: &mut Sector) -> Result<(), BlockError>;
}

impl<T: BlockReader + ?Sized> BlockReader for &mut T {
    fn read_sector(&mut self, lba: u32, buf: &mut Sector) -> Result<(), BlockError> {
        (**self).read_sector(lba, buf)
    }
}

/// Address of one drive on a legacy two-bus, two-drive controller.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DriveId {
    /// Bus number, `0` (primary) or `1` (secondary).
    pub bus: u8,
    /// Drive on the bus, `0` (master) or `1` (slave).
    pub drive: u8,
}

impl DriveId {
    /// Drives in probe order.
    pub const LEGACY: [Self; 4] = [
        Self::new(0, 0),
        Self::new(0, 1),
        Self::new(1, 0),
        Self::new(1, 1),
    ];

    #[must_use]
    pub const fn new(bus: u8, drive: u8) -> Self {
        Self { bus, drive }
    }

    /// Position of this drive in [`DriveId::LEGACY`], if it is a legacy address.
    #[must_use]
    pub const fn legacy_index(self) -> Option<usize> {
        if self.bus < 2 && self.drive < 2 {
            Some((self.bus as usize) * 2 + self.drive as usize)
        } else {
            None
        }
    }
}

impl core::fmt::Display for DriveId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.bus, self.drive)
    }
}

/// A controller with several drives.
pub trait DiskController {
    /// Read sector `lba` of `drive` into `buf`.
    ///
    /// # Errors
    /// Any [`BlockError`]. A missing drive must fail instead of hanging.
    fn read_sector(&mut self, drive: DriveId, lba: u32, buf: &mut Sector)
    -> Result<(), BlockError>;
}

impl<T: DiskController + ?Sized> DiskController for &mut T {
    fn read_sector(
        &mut self,
        drive: DriveId,
        lba: u32,
        buf: &mut Sector,
    ) -> Result<(), BlockError> {
        (**self).read_sector(drive, lba, buf)
    }
}

/// One drive of a [`DiskController`], usable wherever a [`BlockReader`] is expected.
pub struct DriveReader<'c, C: DiskController + ?Sized> {
    controller: &'c mut C,
    drive: DriveId,
}

impl<'c, C: DiskController + ?Sized> DriveReader<'c, C> {
    pub const fn new(controller: &'c mut C, drive: DriveId) -> Self {
        Self { controller, drive }
    }

    #[must_use]
    pub const fn drive(&self) -> DriveId {
        self.drive
    }
}

impl<C: DiskController + ?Sized> BlockReader for DriveReader<'_, C> {
    fn read_sector(&mut self, lba: u32, buf: &mut Sector) -> Result<(), BlockError> {
        self.controller.read_sector(self.drive, lba, buf)
    }
}

/// A controller without drives.
#[derive(Debug, Default, Copy, Clone)]
pub struct NoDisks;

impl DiskController for NoDisks {
    fn read_sector(&mut self, _: DriveId, _: u32, _: &mut Sector) -> Result<(), BlockError> {
        Err(BlockError::NotPresent)
    }
}
