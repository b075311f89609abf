//! # Kernel Entry Point
//!
//! Stages the initial root filesystem from boot modules and legacy ATA disks,
//! reports how `/init` would be started, then halts.

#![no_std]
#![no_main]
#![allow(unsafe_code)]

mod modules;

use crate::modules::MAX_BOOT_MODULES;
use core::arch::{asm, naked_asm};
use kernel_block::AtaPio;
use kernel_info::boot::KernelBootInfo;
use kernel_info::config::{DECOMPRESSION_HEAP_SIZE, DISK_LOAD_BUFFER_SIZE, KERNEL_STACK_SIZE};
use kernel_initramfs::{
    BootModule, FilesystemStagingContext, InitLaunch, Script, find_init_entrypoint, resolve_init,
};
use kernel_qemu::{QemuLogger, qemu_trace};
use kernel_ramfs::RamFs;
use log::{LevelFilter, debug, error, info, warn};

static LOGGER: QemuLogger = QemuLogger::new(LevelFilter::Debug);

/// 16-byte aligned storage.
#[repr(C, align(16))]
struct Aligned<const N: usize>([u8; N]);

#[unsafe(link_section = ".bss.boot")]
#[unsafe(no_mangle)]
static mut BOOT_STACK: Aligned<KERNEL_STACK_SIZE> = Aligned([0; KERNEL_STACK_SIZE]);

static mut DECOMPRESSION_HEAP: Aligned<DECOMPRESSION_HEAP_SIZE> =
    Aligned([0; DECOMPRESSION_HEAP_SIZE]);

static mut DISK_LOAD_BUFFER: Aligned<DISK_LOAD_BUFFER_SIZE> = Aligned([0; DISK_LOAD_BUFFER_SIZE]);

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    qemu_trace!("kernel panic: {info}\n");
    halt()
}

/// The kernel entry point.
///
/// # ABI
/// System V, matching [`KernelEntryFn`](kernel_info::boot::KernelEntryFn):
/// the loader passes the boot information pointer in `RDI`.
///
/// # Naked function & Stack
/// The loader's stack is not trusted. This switches to [`BOOT_STACK`] before
/// any Rust code runs and enters [`kernel_entry`] with a fake return address,
/// so the callee sees a regular call frame.
#[unsafe(no_mangle)]
#[unsafe(naked)]
pub extern "sysv64" fn _start(_boot_info: *const KernelBootInfo) -> ! {
    naked_asm!(
        "cli",
        "mov r12, rdi",
        "lea rax, [rip + {stack_sym}]",
        "add rax, {stack_size}",
        "and rax, -16",
        "mov rsp, rax",
        "push 0",
        "xor rbp, rbp",
        "mov rdi, r12",
        "jmp {rust_entry}",
        stack_sym = sym BOOT_STACK,
        stack_size = const KERNEL_STACK_SIZE,
        rust_entry = sym kernel_entry,
    );
}

extern "sysv64" fn kernel_entry(boot_info: *const KernelBootInfo) -> ! {
    qemu_trace!("Kernel reporting to QEMU!\n");
    if LOGGER.init().is_err() {
        qemu_trace!("logger already installed\n");
    }

    let empty = KernelBootInfo::empty();
    let bi = if boot_info.is_null() {
        warn!("boot: no boot information, staging from disks only");
        &empty
    } else {
        unsafe { &*boot_info }
    };
    kernel_main(bi)
}

fn kernel_main(bi: &KernelBootInfo) -> ! {
    if let Some(cmdline) = unsafe { modules::cmdline(bi.cmdline_ptr) } {
        info!("boot: command line {cmdline:?}");
    }

    let mut slots = [BootModule::new(&[], None); MAX_BOOT_MODULES];
    let modules = unsafe { modules::collect(bi, &mut slots) };
    info!("boot: {} module(s)", modules.len());

    // Only referenced here, once, before anything else could alias them.
    let heap = unsafe { &mut (*(&raw mut DECOMPRESSION_HEAP)).0 };
    let disk_buffer = unsafe { &mut (*(&raw mut DISK_LOAD_BUFFER)).0 };

    let mut controller = unsafe { AtaPio::new() };
    let mut ctx = FilesystemStagingContext::new(heap).with_disk_buffer(disk_buffer);
    let report = ctx.stage(modules, &mut controller);
    debug!("staging: {report:?}");
    info!(
        "staging: {} byte(s) of decompression heap used",
        ctx.heap_used()
    );

    let init_path = ctx.options().init_path;
    let fs = ctx.into_ramfs();
    list_files(&fs);
    report_init(&fs, init_path);
    halt()
}

fn list_files(fs: &RamFs<'_>) {
    for file in fs.files() {
        debug!("ramfs: {} ({} bytes)", file.path.as_str(), file.data().len());
    }
}

/// Log how the init program would be started.
fn report_init(fs: &RamFs<'_>, init_path: &str) {
    if let Some(entrypoint) = find_init_entrypoint(fs) {
        info!(
            "init: entry point {} (script {})",
            entrypoint.path(),
            entrypoint.script
        );
    }

    match resolve_init(fs, init_path) {
        Some(InitLaunch::Elf { image }) => info!("init: ELF image, {} bytes", image.len()),
        Some(InitLaunch::Script { entrypoint, script }) => {
            info!("init: script {} runs {}", entrypoint.script, entrypoint.target);
            log_commands(script);
        }
        Some(InitLaunch::Interpreter { interpreter, image }) => {
            info!("init: {init_path} via {interpreter} ({} bytes)", image.len());
        }
        Some(InitLaunch::CommandScript { script }) => {
            info!("init: command script");
            log_commands(script);
        }
        Some(InitLaunch::Raw { image }) => {
            warn!("init: no header, {} bytes of flat binary", image.len());
        }
        None => error!("init: {init_path} not found"),
    }
}

fn log_commands(script: &[u8]) {
    for command in Script::new(script) {
        debug!("init: {command:?}");
    }
}

fn halt() -> ! {
    loop {
        unsafe { asm!("cli", "hlt", options(nomem, nostack)) };
    }
}
