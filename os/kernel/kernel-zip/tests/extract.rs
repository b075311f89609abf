use boot_image::{Compression, ZipBuilder, ZipEntry};
use kernel_ramfs::RamFs;
use kernel_zip::{DecompressionHeap, extract_to_store};

const CENTRAL_SIGNATURE: &[u8] = b"PK\x01\x02";

fn central_offsets(zip: &[u8]) -> Vec<usize> {
    zip.windows(4)
        .enumerate()
        .filter(|(_, w)| *w == CENTRAL_SIGNATURE)
        .map(|(i, _)| i)
        .collect()
}

fn patch_u32(zip: &mut [u8], at: usize, value: u32) {
    zip[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

#[test]
fn stored_entries_point_into_the_archive() {
    let zip = ZipBuilder::new()
        .file("init", b"#!init\necho hi\n", Compression::Stored)
        .file("etc/motd", b"welcome", Compression::Stored)
        .build();
    let mut arena = [0u8; 64];
    let mut heap = DecompressionHeap::new(&mut arena);
    let mut fs: RamFs = RamFs::new();

    assert_eq!(extract_to_store(&zip, &mut heap, &mut fs), 2);
    let init = fs.get("/init").unwrap();
    assert_eq!(init, b"#!init\necho hi\n");
    assert!(zip.as_ptr_range().contains(&init.as_ptr()));
    assert_eq!(fs.get("/etc/motd"), Some(&b"welcome"[..]));
    assert_eq!(heap.used(), 0);
}

#[test]
fn deflated_entries_are_decoded_into_the_heap() {
    let text: Vec<u8> = b"the quick brown fox jumps over the lazy dog\n"
        .iter()
        .copied()
        .cycle()
        .take(5000)
        .collect();
    let binary: Vec<u8> = (0..=255u8).cycle().take(3000).collect();
    let zip = ZipBuilder::new()
        .file("bin/sh", &binary, Compression::Deflated)
        .file("README", &text, Compression::Deflated)
        .build();

    let mut arena = vec![0u8; 16 * 1024];
    let mut heap = DecompressionHeap::new(&mut arena);
    let mut fs: RamFs = RamFs::new();

    assert_eq!(extract_to_store(&zip, &mut heap, &mut fs), 2);
    assert_eq!(fs.get("/bin/sh"), Some(binary.as_slice()));
    assert_eq!(fs.get("/README"), Some(text.as_slice()));
    assert_eq!(heap.used(), 8000);
}

#[test]
fn directories_become_nodes() {
    let zip = ZipBuilder::new()
        .directory("bin/")
        .file("bin/hello", b"ELF?", Compression::Stored)
        .build();
    let mut arena = [0u8; 16];
    let mut heap = DecompressionHeap::new(&mut arena);
    let mut fs: RamFs = RamFs::new();

    assert_eq!(extract_to_store(&zip, &mut heap, &mut fs), 1);
    assert!(fs.dir_exists("/bin"));
    assert!(!fs.exists("/bin"));
    assert_eq!(fs.child_at("/", 0), Some("bin"));
    assert_eq!(fs.list_children("/bin"), 1);
}

#[test]
fn unsupported_and_encrypted_entries_are_skipped() {
    let mut bzip2 = ZipEntry::file("packed", b"BZh91AY&SY", Compression::Stored);
    bzip2.method = 12;
    let mut secret = ZipEntry::file("secret", b"hunter2", Compression::Stored);
    secret.flags = 1;

    let zip = ZipBuilder::new()
        .push(bzip2)
        .push(secret)
        .file("init", b"plain", Compression::Stored)
        .build();
    let mut arena = [0u8; 16];
    let mut heap = DecompressionHeap::new(&mut arena);
    let mut fs: RamFs = RamFs::new();

    assert_eq!(extract_to_store(&zip, &mut heap, &mut fs), 1);
    assert!(!fs.exists("/packed"));
    assert!(!fs.exists("/secret"));
    assert_eq!(fs.get("/init"), Some(&b"plain"[..]));
}

#[test]
fn local_extra_field_is_honoured() {
    let mut entry = ZipEntry::file("init", b"payload", Compression::Stored);
    entry.local_extra = vec![0xAA; 9];
    let zip = ZipBuilder::new().push(entry).build();
    let mut arena = [0u8; 16];
    let mut heap = DecompressionHeap::new(&mut arena);
    let mut fs: RamFs = RamFs::new();

    assert_eq!(extract_to_store(&zip, &mut heap, &mut fs), 1);
    assert_eq!(fs.get("/init"), Some(&b"payload"[..]));
}

#[test]
fn nameless_entries_are_skipped() {
    let zip = ZipBuilder::new()
        .file("", b"orphan", Compression::Stored)
        .file("./init", b"kept", Compression::Stored)
        .build();
    let mut arena = [0u8; 16];
    let mut heap = DecompressionHeap::new(&mut arena);
    let mut fs: RamFs = RamFs::new();

    assert_eq!(extract_to_store(&zip, &mut heap, &mut fs), 1);
    assert_eq!(fs.file_count(), 1);
    assert_eq!(fs.get("/init"), Some(&b"kept"[..]));
}

#[test]
fn out_of_range_entry_is_skipped_and_extraction_continues() {
    let mut zip = ZipBuilder::new()
        .file("broken", b"0123456789", Compression::Stored)
        .file("init", b"ok", Compression::Stored)
        .build();
    let first = central_offsets(&zip)[0];
    // compressed size
    patch_u32(&mut zip, first + 20, 0x00FF_FFFF);

    let mut arena = [0u8; 16];
    let mut heap = DecompressionHeap::new(&mut arena);
    let mut fs: RamFs = RamFs::new();

    assert_eq!(extract_to_store(&zip, &mut heap, &mut fs), 1);
    assert!(!fs.exists("/broken"));
    assert_eq!(fs.get("/init"), Some(&b"ok"[..]));
}

#[test]
fn corrupt_local_header_is_skipped() {
    let mut zip = ZipBuilder::new()
        .file("first", b"aaaa", Compression::Stored)
        .file("second", b"bbbb", Compression::Stored)
        .build();
    zip[0] = b'X';

    let mut arena = [0u8; 16];
    let mut heap = DecompressionHeap::new(&mut arena);
    let mut fs: RamFs = RamFs::new();

    assert_eq!(extract_to_store(&zip, &mut heap, &mut fs), 1);
    assert!(fs.exists("/second"));
}

#[test]
fn bad_central_signature_stops_the_walk() {
    let mut zip = ZipBuilder::new()
        .file("a", b"1", Compression::Stored)
        .file("b", b"2", Compression::Stored)
        .file("c", b"3", Compression::Stored)
        .build();
    let second = central_offsets(&zip)[1];
    zip[second] = 0;

    let mut arena = [0u8; 16];
    let mut heap = DecompressionHeap::new(&mut arena);
    let mut fs: RamFs = RamFs::new();

    assert_eq!(extract_to_store(&zip, &mut heap, &mut fs), 1);
    assert!(fs.exists("/a"));
    assert!(!fs.exists("/b"));
    assert!(!fs.exists("/c"));
}

#[test]
fn missing_end_of_central_directory_loads_nothing() {
    let mut zip = ZipBuilder::new()
        .file("init", b"data", Compression::Stored)
        .build();
    let eocd = zip.len() - 22;
    zip[eocd..eocd + 4].copy_from_slice(b"PK\x00\x00");

    let mut arena = [0u8; 16];
    let mut heap = DecompressionHeap::new(&mut arena);
    let mut fs: RamFs = RamFs::new();

    assert_eq!(extract_to_store(&zip, &mut heap, &mut fs), 0);
    assert_eq!(extract_to_store(b"PK", &mut heap, &mut fs), 0);
    assert_eq!(extract_to_store(&[0u8; 4096], &mut heap, &mut fs), 0);
    assert_eq!(fs.file_count(), 0);
}

#[test]
fn trailing_comment_is_tolerated() {
    let zip = ZipBuilder::new()
        .file("init", b"data", Compression::Stored)
        .comment(b"built for the boot test suite")
        .build();
    let mut arena = [0u8; 16];
    let mut heap = DecompressionHeap::new(&mut arena);
    let mut fs: RamFs = RamFs::new();

    assert_eq!(extract_to_store(&zip, &mut heap, &mut fs), 1);
}

#[test]
fn heap_exhaustion_skips_only_that_entry() {
    let big = vec![7u8; 1000];
    let zip = ZipBuilder::new()
        .file("big", &big, Compression::Deflated)
        .file("small", b"tiny", Compression::Deflated)
        .file("raw", b"stored", Compression::Stored)
        .build();
    let mut arena = [0u8; 64];
    let mut heap = DecompressionHeap::new(&mut arena);
    let mut fs: RamFs = RamFs::new();

    assert_eq!(extract_to_store(&zip, &mut heap, &mut fs), 2);
    assert!(!fs.exists("/big"));
    assert_eq!(fs.get("/small"), Some(&b"tiny"[..]));
    assert_eq!(fs.get("/raw"), Some(&b"stored"[..]));
    assert_eq!(heap.used(), 4);
}

#[test]
fn duplicate_paths_keep_the_first_entry() {
    let zip = ZipBuilder::new()
        .file("init", b"first", Compression::Stored)
        .file("./init", b"second", Compression::Stored)
        .build();
    let mut arena = [0u8; 16];
    let mut heap = DecompressionHeap::new(&mut arena);
    let mut fs: RamFs = RamFs::new();

    assert_eq!(extract_to_store(&zip, &mut heap, &mut fs), 1);
    assert_eq!(fs.get("/init"), Some(&b"first"[..]));
}

#[test]
fn extraction_stops_counting_when_the_store_is_full() {
    let mut builder = ZipBuilder::new();
    for i in 0..6 {
        builder.file(&format!("f{i}"), b"x", Compression::Stored);
    }
    let zip = builder.build();
    let mut arena = [0u8; 16];
    let mut heap = DecompressionHeap::new(&mut arena);
    let mut fs: RamFs<'_, 4, 4> = RamFs::new();

    assert_eq!(extract_to_store(&zip, &mut heap, &mut fs), 4);
    assert!(fs.exists("/f3"));
    assert!(!fs.exists("/f4"));
}
