//! # Boot Filesystem Staging
//!
//! Builds the kernel's initial root filesystem from whatever the machine
//! offers, and works out how to start `/init` from it.
//!
//! ## Sources
//!
//! ```text
//! boot modules ─┬─ "PK.." ─► kernel_zip::extract_to_store ─┐
//!               └─ other  ─► one file, named by cmdline ───┼─► RamFs ─► resolve_init
//!                                                          │
//! disks (only while /init is missing)                      │
//!   for drive in DriveId::LEGACY:                          │
//!     sector 0 ─┬─ MBR ──► FAT probe per used partition ───┤
//!               │          then sector 0 as a FAT volume   │
//!               └─ none ─► sector 0 as a FAT volume ───────┘
//! ```
//!
//! Modules always win over disks: once a module provided `/init`, no disk is
//! touched. Every failure is local. A corrupt archive entry, an unreadable
//! drive or a partition without the file is logged and the next candidate
//! is tried. Only the final [`StagingReport`] says whether `/init` exists.
//!
//! ## State
//!
//! All mutable state of a run lives in a [`FilesystemStagingContext`]: the
//! [`RamFs`](kernel_ramfs::RamFs), the decompression arena for deflated
//! archive entries and the buffer a disk-loaded `/init` is read into. The
//! kernel builds one context from static arenas; tests build a fresh one per
//! case.
//!
//! ## Usage
//!
//! ```rust
//! use kernel_block::NoDisks;
//! use kernel_initramfs::{BootModule, FilesystemStagingContext, InitLaunch, resolve_init};
//!
//! let init = b"\x7FELF\x02\x01\x01";
//! let mut heap = [0u8; 64];
//! let mut ctx = FilesystemStagingContext::new(&mut heap);
//!
//! let report = ctx.stage(&[BootModule::new(init, None)], &mut NoDisks);
//! assert!(report.init_found);
//! assert!(matches!(
//!     resolve_init(ctx.ramfs(), "/init"),
//!     Some(InitLaunch::Elf { .. })
//! ));
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

mod context;
mod disk;
mod module;
pub mod script;
mod stage;
mod state;

pub use context::{FilesystemStagingContext, StagingOptions};
pub use disk::{DiskScanOutcome, ProbeError, SkipReason};
pub use module::{BootModule, ModuleKind, ModuleScanSummary, classify_module, module_path};
pub use script::{
    InitEntrypoint, InitKind, InitLaunch, Script, ScriptCommand, classify_init,
    find_init_entrypoint, resolve_init,
};
pub use stage::StagingReport;
pub use state::StagingState;
