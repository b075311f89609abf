//! # RAM-backed File Store
//!
//! The file store the boot pipeline stages the root filesystem into, and the
//! descriptor-based VFS the rest of the kernel reads it through.
//!
//! ## Ownership
//!
//! [`RamFs`] never copies file contents. An entry borrows its bytes for the
//! store's lifetime `'a` from wherever they already live: a boot module, a
//! disk load buffer or the ZIP decompression heap. Tables are fixed-size
//! arrays, so the store works before any allocator exists.
//!
//! ## Tables
//!
//! | Table | Capacity | Holds |
//! |-------|----------|-------|
//! | files | [`MAX_FILES`] | path, borrowed data, size |
//! | nodes | [`MAX_NODES`] | directories, block and char devices |
//!
//! Both tables are append-only. Paths are absolute, unique among files and at
//! most [`MAX_PATH`] bytes long. A file's data and size may be replaced after
//! the fact (see [`RamFs::set_data`]), its path may not.
//!
//! ## Listing
//!
//! Directories are implicit: a "direct child" of `/a` is any file or node
//! whose path is `/a/<name>` with no further `/` in `<name>`.

#![cfg_attr(not(any(test, doctest)), no_std)]

mod path;
mod store;
mod vfs;

pub use path::{PathError, RamPath};
pub use store::{FileEntry, NodeEntry, NodeType, RamFs, RamFsError};
pub use vfs::{Fd, MAX_OPEN_FILES, Vfs, VfsError};

/// Default capacity of the file table.
pub const MAX_FILES: usize = 32;

/// Default capacity of the directory and device node table.
pub const MAX_NODES: usize = 32;

/// Longest accepted path in bytes.
pub const MAX_PATH: usize = 255;

/// Destination for files produced by an archive or disk reader.
pub trait FileSink<'a> {
    /// Register a file whose bytes live for `'a`.
    ///
    /// # Errors
    /// The sink's reason for refusing the file.
    fn add_file(&mut self, path: &str, data: &'a [u8]) -> Result<(), RamFsError>;

    /// Register a directory.
    ///
    /// # Errors
    /// The sink's reason for refusing the directory.
    fn add_directory(&mut self, path: &str) -> Result<(), RamFsError>;

    /// Whether a file is already registered at `path`.
    fn contains(&self, path: &str) -> bool;
}
