//! # Kernel Boot Information

/// Kernel function pointer.
///
/// # ABI
/// System V: the loader passes the boot information pointer in `RDI`.
pub type KernelEntryFn = extern "sysv64" fn(*const KernelBootInfo) -> !;

/// Information the kernel needs from the loader.
/// Keep this `#[repr(C)]` and stick to fixed-size integers at the ABI boundary.
#[repr(C)]
#[derive(Debug, Clone)]
pub struct KernelBootInfo {
    /// Physical address of the first [`BootModuleDescriptor`], or 0 if there are none.
    pub modules_ptr: u64,

    /// Number of descriptors at `modules_ptr`.
    pub modules_len: u64,

    /// Kernel command line (NUL-terminated), or 0.
    pub cmdline_ptr: u64,
}

impl KernelBootInfo {
    /// Boot information without modules or command line.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            modules_ptr: 0,
            modules_len: 0,
            cmdline_ptr: 0,
        }
    }

    /// Whether the loader handed over any modules.
    #[must_use]
    pub const fn has_modules(&self) -> bool {
        self.modules_ptr != 0 && self.modules_len != 0
    }
}

/// One file loaded by the loader next to the kernel.
#[repr(C)]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BootModuleDescriptor {
    /// Physical address of the first byte.
    pub mod_start: u64,

    /// Physical address one past the last byte.
    pub mod_end: u64,

    /// The module's command line (NUL-terminated), or 0.
    pub cmdline_ptr: u64,
}

impl BootModuleDescriptor {
    /// Size of the module in bytes. A reversed range counts as empty.
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.mod_end.saturating_sub(self.mod_start)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub const fn has_cmdline(&self) -> bool {
        self.cmdline_ptr != 0
    }
}

const _: () = {
    assert!(size_of::<BootModuleDescriptor>() == 24);
    assert!(size_of::<KernelBootInfo>() == 24);
};
