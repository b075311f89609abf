//! # ZIP Initramfs Extraction
//!
//! Turns a ZIP archive that already sits in memory (typically a boot module)
//! into files in a [`FileSink`](kernel_ramfs::FileSink).
//!
//! ## Format subset
//!
//! ```text
//! [local header + name + extra + payload] ...  [central directory]  [EOCD]
//!                                                      ^ cd_offset    ^ last 64 KiB + 22
//! ```
//!
//! * Single-disk archives only; Zip64 and spanned archives are refused.
//! * Method 0 (stored) entries are registered in place, without a copy.
//! * Method 8 (deflate) entries are decoded into a [`DecompressionHeap`].
//! * Any other method, encrypted entries, and entries that fail validation are
//!   skipped one at a time; the rest of the archive is still extracted.
//!
//! The central directory is authoritative for names, methods and sizes; the
//! local header is only used to locate the payload.

#![cfg_attr(not(any(test, doctest)), no_std)]

mod archive;
mod extract;
mod heap;
mod path;

pub use archive::{
    Archive, CentralDirectory, CentralEntry, EOCD_SEARCH_WINDOW, EndOfCentralDirectory, Method,
};
pub use extract::extract_to_store;
pub use heap::DecompressionHeap;
pub use path::{EntryName, normalize_entry_name};

use kernel_inflate::InflateError;
use le_bytes::OutOfBounds;

/// Reasons an archive, or a single entry of it, cannot be extracted.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum ZipError {
    #[error("archive is smaller than an end-of-central-directory record")]
    TooShort,
    #[error("no end-of-central-directory record")]
    NoEndOfCentralDirectory,
    #[error("multi-disk archives are not supported")]
    MultiDisk,
    #[error("Zip64 archives are not supported")]
    Zip64,
    #[error("central directory at {0} lies outside the archive")]
    CentralDirectoryOutOfBounds(u32),
    #[error("bad central directory signature at {0}")]
    BadCentralSignature(usize),
    #[error("bad local header signature at {0}")]
    BadLocalSignature(usize),
    #[error("truncated record: {0}")]
    Truncated(#[from] OutOfBounds),
    #[error("entry name is empty")]
    EmptyName,
    #[error("entry name cannot be mapped to a path")]
    InvalidName,
    #[error("unsupported compression method {0}")]
    UnsupportedMethod(u16),
    #[error("entry is encrypted")]
    Encrypted,
    #[error("inflate failed: {0}")]
    Inflate(#[from] InflateError),
    #[error("decompression heap exhausted: {requested} bytes requested, {available} available")]
    HeapExhausted { requested: usize, available: usize },
}
