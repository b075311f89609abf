use kernel_info::config::{KERNEL_STACK_SIZE, PHYS_LOAD};
use std::{env, path::PathBuf};

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let ld = manifest_dir.join("kernel.ld");

    // Fail fast during build
    assert_eq!(
        PHYS_LOAD & 0xfff,
        0,
        "PHYS_LOAD must be 4 KiB aligned (got {PHYS_LOAD:#x})"
    );
    assert!(
        KERNEL_STACK_SIZE.is_multiple_of(16),
        "KERNEL_STACK_SIZE must be 16-byte aligned"
    );

    println!("cargo:rerun-if-changed={}", ld.display());
    println!("cargo:rustc-link-arg-bins=-T{}", ld.display());
    println!("cargo:rustc-link-arg-bins=--defsym=PHYS_LOAD={PHYS_LOAD:#x}");
}
