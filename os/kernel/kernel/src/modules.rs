//! Boot module descriptors to byte slices.

use core::ffi::{CStr, c_char};
use kernel_info::boot::{BootModuleDescriptor, KernelBootInfo};
use kernel_initramfs::BootModule;
use log::warn;

/// Modules beyond this count are ignored.
pub const MAX_BOOT_MODULES: usize = 16;

/// Turn the loader's module table into [`BootModule`]s, written to `slots`.
///
/// # Safety
/// Every address in `bi` and in the descriptors it points at must be
/// identity-mapped and stay untouched for the rest of the boot.
pub unsafe fn collect<'s>(
    bi: &KernelBootInfo,
    slots: &'s mut [BootModule<'static>; MAX_BOOT_MODULES],
) -> &'s [BootModule<'static>] {
    if !bi.has_modules() {
        return &[];
    }
    let Ok(count) = usize::try_from(bi.modules_len) else {
        return &[];
    };
    if count > MAX_BOOT_MODULES {
        warn!("boot: {count} modules, using the first {MAX_BOOT_MODULES}");
    }

    let descriptors = unsafe {
        core::slice::from_raw_parts(
            bi.modules_ptr as *const BootModuleDescriptor,
            count.min(MAX_BOOT_MODULES),
        )
    };
    for (slot, descriptor) in slots.iter_mut().zip(descriptors) {
        *slot = unsafe { module(descriptor) };
    }
    &slots[..descriptors.len()]
}

unsafe fn module(descriptor: &BootModuleDescriptor) -> BootModule<'static> {
    let data = match usize::try_from(descriptor.len()) {
        Ok(len) if len > 0 => unsafe {
            core::slice::from_raw_parts(descriptor.mod_start as *const u8, len)
        },
        _ => &[],
    };
    let cmdline = if descriptor.has_cmdline() {
        unsafe { cmdline(descriptor.cmdline_ptr) }
    } else {
        None
    };
    BootModule::new(data, cmdline)
}

/// A NUL-terminated command line; `None` unless it is valid UTF-8.
///
/// # Safety
/// `ptr` is 0 or points at an identity-mapped, NUL-terminated string that
/// outlives the kernel.
pub unsafe fn cmdline(ptr: u64) -> Option<&'static str> {
    if ptr == 0 {
        return None;
    }
    let raw = unsafe { CStr::from_ptr(ptr as *const c_char) };
    raw.to_str().ok()
}
