//! # QEMU Debug Console Logging
//!
//! Early-boot diagnostics for kernels running under QEMU. Output goes to the
//! debug console port `0x402`, one byte per `out` instruction, with no
//! buffering and no allocation, so it works before anything else in the
//! kernel is initialized.
//!
//! ## Output Path
//!
//! ```text
//! log::info!(..)  ──►  QemuLogger (log::Log)  ──►  write_record  ─┐
//! qemu_trace!(..) ─────────────────────────────────────────────────┼─►  QemuSink (fmt::Write)  ──►  port 0x402
//!                                                                  │
//!                                         host: -debugcon stdio ◄──┘
//! ```
//!
//! ## Components
//!
//! * [`QemuLogger`]: a `log::Log` sink with a level threshold. Declare it as a
//!   `static` and call [`QemuLogger::init`] once.
//! * [`write_record`]: the `"[LEVEL] target: message\n"` line format, usable with
//!   any `fmt::Write` (the host tests format into a `String`).
//! * [`qemu_trace!`]: raw `format_args!` output that bypasses the `log` facade,
//!   for panic handlers and code that runs before the logger is installed.
//!
//! ## Features
//!
//! `enabled` (default) compiles the port I/O in. Without it every write is a
//! no-op and nothing touches I/O ports, which keeps the crate usable on
//! machines without a debug console.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use kernel_qemu::QemuLogger;
//! use log::{LevelFilter, info};
//!
//! static LOGGER: QemuLogger = QemuLogger::new(LevelFilter::Debug);
//!
//! LOGGER.init().expect("logger initialization");
//! info!("staging initramfs");
//! ```
//!
//! On the host, capture the output with
//! `qemu-system-x86_64 ... -debugcon stdio` (or `-debugcon file:debug.log`).

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod logger;

pub use logger::{QemuLogger, write_record};

#[cfg(feature = "enabled")]
#[doc(hidden)]
pub mod qemu_fmt {
    use core::fmt::{self, Write};

    /// QEMU's `-debugcon` port.
    const DEBUG_PORT: u16 = 0x402;

    /// Send `bytes` to the debug port, one `out` per byte.
    pub fn write_bytes(bytes: &[u8]) {
        for &byte in bytes {
            // SAFETY: port 0x402 is write-only and has no side effects
            // beyond QEMU capturing the byte.
            unsafe {
                core::arch::asm!(
                    "out dx, al",
                    in("dx") DEBUG_PORT,
                    in("al") byte,
                    options(nomem, nostack, preserves_flags)
                );
            }
        }
    }

    /// `fmt::Write` adapter over the debug port.
    pub struct QemuSink;

    impl Write for QemuSink {
        #[inline]
        fn write_str(&mut self, s: &str) -> fmt::Result {
            write_bytes(s.as_bytes());
            Ok(())
        }
    }

    #[doc(hidden)]
    pub fn qemu_write(args: fmt::Arguments) {
        // Best-effort debug output.
        let _ = fmt::write(&mut QemuSink, args);
    }
}

#[cfg(not(feature = "enabled"))]
#[doc(hidden)]
pub mod qemu_fmt {
    use core::fmt;

    /// Discards everything.
    pub struct QemuSink;

    impl fmt::Write for QemuSink {
        #[inline]
        fn write_str(&mut self, _: &str) -> fmt::Result {
            Ok(())
        }
    }

    #[doc(hidden)]
    pub const fn qemu_write(_: fmt::Arguments) {}
}

/// Write `format_args!`-style output straight to the debug port.
#[macro_export]
macro_rules! qemu_trace {
    ($($arg:tt)*) => {{
        $crate::qemu_fmt::qemu_write(core::format_args!($($arg)*));
    }};
}
