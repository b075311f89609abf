//! # Kernel Configuration and Boot Interface
//!
//! This crate is the single source of truth for two things the loader, the
//! kernel binary and the boot-time filesystem pipeline must agree on:
//!
//! * the **boot protocol**: the `#[repr(C)]` structures the loader hands to
//!   the kernel entry point ([`boot`]), and
//! * the **compile-time configuration** of the staging pipeline: arena sizes,
//!   default paths and search limits ([`config`]).
//!
//! ## Boot Protocol
//!
//! ```text
//! loader ──► _start(*const KernelBootInfo)
//!                 │
//!                 ├── modules_ptr ──► [BootModuleDescriptor; modules_len]
//!                 │                        │
//!                 │                        ├── mod_start .. mod_end   (module bytes, already mapped)
//!                 │                        └── cmdline_ptr            (NUL-terminated, or 0)
//!                 └── ...
//! ```
//!
//! All addresses are physical addresses that are identity-mapped when the
//! kernel starts. The structures only carry integers so their layout is
//! stable across compilers; turning them into slices is the kernel's job.
//!
//! ## Configuration
//!
//! | Constant | Value | Used by |
//! |----------|-------|---------|
//! | [`DECOMPRESSION_HEAP_SIZE`](config::DECOMPRESSION_HEAP_SIZE) | 2 MiB | ZIP extraction of deflated entries |
//! | [`DISK_LOAD_BUFFER_SIZE`](config::DISK_LOAD_BUFFER_SIZE) | 256 KiB | `/init` loaded from a FAT disk |
//! | [`DEFAULT_INIT_PATH`](config::DEFAULT_INIT_PATH) | `/init` | unnamed boot modules, init discovery |
//! | [`DISK_INIT_BASENAME`](config::DISK_INIT_BASENAME) | `INIT` | FAT root directory lookup |
//!
//! ## Usage
//!
//! ```rust
//! use kernel_info::boot::BootModuleDescriptor;
//! use kernel_info::config::DEFAULT_INIT_PATH;
//!
//! let module = BootModuleDescriptor {
//!     mod_start: 0x0020_0000,
//!     mod_end: 0x0020_1000,
//!     cmdline_ptr: 0,
//! };
//! assert_eq!(module.len(), 4096);
//! assert!(!module.has_cmdline());
//! assert_eq!(DEFAULT_INIT_PATH, "/init");
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

pub mod boot;
pub mod config;
