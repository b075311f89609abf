//! # Staging Configuration

/// Arena for decompressed ZIP entries. Never reclaimed during a boot.
pub const DECOMPRESSION_HEAP_SIZE: usize = 2 * 1024 * 1024;

/// Buffer a disk-loaded `/init` is read into.
pub const DISK_LOAD_BUFFER_SIZE: usize = 256 * 1024;

/// Path of the init program in the staged filesystem.
pub const DEFAULT_INIT_PATH: &str = "/init";

/// 8.3 base name looked up in the root directory of boot disks.
pub const DISK_INIT_BASENAME: &str = "INIT";

/// Trailing bytes of an archive searched for the end-of-central-directory
/// record: the record itself plus the longest possible comment.
pub const ZIP_EOCD_SEARCH_WINDOW: usize = 22 + 0xFFFF;

/// Where the kernel image is placed in physical memory.
///
/// # Kernel Build
/// This information is sourced in the kernel's `build.rs` to configure
/// the linker.
pub const PHYS_LOAD: u64 = 0x0010_0000; // 1 MiB

/// The size of the kernel stack.
pub const KERNEL_STACK_SIZE: usize = 64 * 1024;

const _: () = {
    assert!(DISK_LOAD_BUFFER_SIZE.is_multiple_of(512));
    assert!(DISK_INIT_BASENAME.len() <= 7);
    assert!(KERNEL_STACK_SIZE.is_multiple_of(4096));
    assert!(PHYS_LOAD.is_multiple_of(4096));
};
