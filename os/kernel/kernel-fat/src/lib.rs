//! # FAT Volumes and MBR Partition Tables
//!
//! Just enough FAT to find one file in the root directory of a boot disk and
//! read it into a caller-provided buffer. Everything goes through a
//! [`BlockReader`](kernel_block::BlockReader) one sector at a time; nothing
//! is cached between calls.
//!
//! ## Probing
//!
//! ```text
//! sector 0 ──► MasterBootRecord::parse ──► Some(mbr) ──► FatVolume::probe(p.start_lba) for each used partition
//!                                     └──► None      ──► FatVolume::probe(0)  (superfloppy)
//! ```
//!
//! [`FatVolume::probe`] reads the BIOS parameter block and derives the volume
//! geometry:
//!
//! | Field | FAT12/16 | FAT32 |
//! |-------|----------|-------|
//! | `fat_lba` | `partition + reserved` | `partition + reserved` |
//! | root directory | fixed, `fat_lba + fats * fat_size`, `ceil(entries * 32 / 512)` sectors | cluster chain from `BPB_RootClus` |
//! | `data_lba` | after the root directory | `fat_lba + fats * fat_size` |
//!
//! A zero root-entry count marks FAT32. Otherwise fewer than 4085 data
//! clusters makes the volume FAT12, anything else FAT16.
//!
//! ## Lookups
//!
//! [`FatVolume::find_file`] matches 8.3 short names only. The base name is
//! compared case-insensitively against the target, or against the target
//! with a leading `.` (tools disagree on how to store `.init`). The
//! extension is ignored. Long-name, volume-label, directory and deleted
//! entries are skipped; a free entry (`0x00`) ends the directory.
//!
//! ## Chains
//!
//! Every chain step costs one FAT sector read (two for a FAT12 entry that
//! straddles a sector boundary). Walks stop at the end-of-chain marker of the
//! FAT type, and fail once they visit more clusters than the volume has. The
//! cluster count is capped by what the FAT itself can address, so an
//! inflated sector count in the boot sector cannot stretch a walk. Directory
//! lookups additionally give up after [`MAX_DIR_ENTRIES`] entries.

#![cfg_attr(not(any(test, doctest)), no_std)]

mod chain;
mod dir;
mod mbr;
mod volume;

pub use dir::{DirEntry, FatAttributes, matches_basename};
pub use mbr::{MBR_SIGNATURE, MasterBootRecord, PartitionEntry, PartitionType};
pub use volume::{FatKind, FatVolume, RootDir};

use kernel_block::BlockError;

/// Most entries a directory may hold (2 MiB of entries); lookups stop there.
pub const MAX_DIR_ENTRIES: usize = 65_536;
use le_bytes::OutOfBounds;

/// Reasons a FAT volume cannot be probed or read.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum FatError {
    #[error("disk read failed: {0}")]
    Block(#[from] BlockError),
    #[error("unsupported sector size {0}")]
    BadBytesPerSector(u16),
    #[error("boot sector has zero sectors per cluster")]
    NoSectorsPerCluster,
    #[error("boot sector declares no FATs")]
    NoFats,
    #[error("boot sector declares an empty FAT")]
    NoFatSize,
    #[error("volume has no data clusters")]
    NoClusters,
    #[error("cluster {0} is outside the volume")]
    ClusterOutOfRange(u32),
    #[error("cluster chain does not terminate")]
    ChainLoop,
    #[error("directory exceeds {} entries", crate::MAX_DIR_ENTRIES)]
    DirectoryTooLarge,
    #[error("truncated field: {0}")]
    Truncated(#[from] OutOfBounds),
}
