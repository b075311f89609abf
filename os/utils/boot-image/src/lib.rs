//! # Boot Image Writers
//!
//! Host-side builders for the media the kernel stages its root filesystem
//! from: ZIP archives handed over as boot modules, and FAT disk images,
//! either as a bare volume ("superfloppy") or behind an MBR partition table.
//!
//! Used by the `mkinitramfs` tool and as fixture builders in the kernel
//! crates' tests.

pub mod crc32;
pub mod fat;
pub mod mbr;
pub mod zip;

pub use fat::{DirEntrySpec, FatImageBuilder, FatType};
pub use mbr::MbrImageBuilder;
pub use zip::{Compression, ZipBuilder, ZipEntry};

pub(crate) fn put_u16(buf: &mut [u8], off: usize, v: u16) {
    buf[off..off + 2].copy_from_slice(&v.to_le_bytes());
}

pub(crate) fn put_u32(buf: &mut [u8], off: usize, v: u32) {
    buf[off..off + 4].copy_from_slice(&v.to_le_bytes());
}
