use kernel_info::config::{DEFAULT_INIT_PATH, DISK_INIT_BASENAME};
use kernel_ramfs::RamFs;
use kernel_zip::DecompressionHeap;

/// Runtime policy of a staging run.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct StagingOptions {
    /// Where the init program is expected in the staged filesystem.
    pub init_path: &'static str,
    /// 8.3 base name searched for in the root directory of boot disks.
    pub disk_target: &'static str,
    /// Whether disks are scanned when no module provided the init program.
    pub scan_disks: bool,
}

impl Default for StagingOptions {
    fn default() -> Self {
        Self {
            init_path: DEFAULT_INIT_PATH,
            disk_target: DISK_INIT_BASENAME,
            scan_disks: true,
        }
    }
}

/// Everything one staging run writes to.
///
/// The file store, the decompression arena and the disk load buffer all live
/// here instead of in globals, so every run (and every test) starts from a
/// clean slate. File contents borrow from the module memory and the two
/// arenas for `'a`.
pub struct FilesystemStagingContext<'a> {
    pub(crate) ramfs: RamFs<'a>,
    pub(crate) heap: DecompressionHeap<'a>,
    pub(crate) disk_buffer: Option<&'a mut [u8]>,
    pub(crate) options: StagingOptions,
}

impl<'a> FilesystemStagingContext<'a> {
    /// A context decompressing into `heap`, without a disk load buffer.
    #[must_use]
    pub fn new(heap: &'a mut [u8]) -> Self {
        Self {
            ramfs: RamFs::new(),
            heap: DecompressionHeap::new(heap),
            disk_buffer: None,
            options: StagingOptions::default(),
        }
    }

    /// Use `buffer` to hold an init program loaded from disk.
    ///
    /// The buffer is handed to the file store once a disk load succeeds.
    #[must_use]
    pub fn with_disk_buffer(mut self, buffer: &'a mut [u8]) -> Self {
        self.disk_buffer = Some(buffer);
        self
    }

    #[must_use]
    pub const fn with_options(mut self, options: StagingOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub const fn options(&self) -> &StagingOptions {
        &self.options
    }

    #[must_use]
    pub const fn ramfs(&self) -> &RamFs<'a> {
        &self.ramfs
    }

    pub const fn ramfs_mut(&mut self) -> &mut RamFs<'a> {
        &mut self.ramfs
    }

    /// Give up the arenas and keep the staged files.
    #[must_use]
    pub fn into_ramfs(self) -> RamFs<'a> {
        self.ramfs
    }

    /// Bytes of the decompression arena in use.
    #[must_use]
    pub const fn heap_used(&self) -> usize {
        self.heap.used()
    }

    /// Whether the disk load buffer is still available.
    #[must_use]
    pub const fn has_disk_buffer(&self) -> bool {
        self.disk_buffer.is_some()
    }

    /// Whether the init program has been staged.
    #[must_use]
    pub fn has_init(&self) -> bool {
        self.ramfs.exists(self.options.init_path)
    }
}
