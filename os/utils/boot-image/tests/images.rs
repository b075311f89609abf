use boot_image::{Compression, DirEntrySpec, FatImageBuilder, FatType, MbrImageBuilder, ZipBuilder};

fn u16_at(b: &[u8], off: usize) -> u16 {
    u16::from_le_bytes([b[off], b[off + 1]])
}

fn u32_at(b: &[u8], off: usize) -> u32 {
    u32::from_le_bytes([b[off], b[off + 1], b[off + 2], b[off + 3]])
}

#[test]
fn zip_ends_with_an_eocd_record() {
    let zip = ZipBuilder::new()
        .file("init", b"#!init\n", Compression::Stored)
        .file("bin/sh", &[0x7F; 300], Compression::Deflated)
        .build();

    let eocd = zip.len() - 22;
    assert_eq!(u32_at(&zip, eocd), 0x0605_4B50);
    assert_eq!(u16_at(&zip, eocd + 10), 2);
    let cd = u32_at(&zip, eocd + 16) as usize;
    assert_eq!(u32_at(&zip, cd), 0x0201_4B50);
    assert_eq!(u32_at(&zip, 0), 0x0403_4B50);
}

#[test]
fn short_names_are_padded_upper_case() {
    assert_eq!(&DirEntrySpec::short_name("init"), b"INIT       ");
    assert_eq!(&DirEntrySpec::short_name("init.bin"), b"INIT    BIN");
    assert_eq!(&DirEntrySpec::short_name(".init"), b".INIT      ");
}

#[test]
fn fat16_boot_sector_describes_the_layout() {
    let img = FatImageBuilder::new(FatType::Fat16, 8192)
        .file("init", b"hello")
        .build();

    assert_eq!(img.len(), 8192 * 512);
    assert_eq!(&img[510..512], &[0x55, 0xAA]);
    assert_eq!(u16_at(&img, 11), 512);
    assert_eq!(u16_at(&img, 17), 512);
    let fat_size = u32::from(u16_at(&img, 22));
    let root_lba = (1 + 2 * fat_size) as usize;
    assert_eq!(&img[root_lba * 512..root_lba * 512 + 11], b"INIT       ");
}

#[test]
fn fat32_root_lives_in_a_cluster() {
    let img = FatImageBuilder::new(FatType::Fat32, 4096)
        .file("init", b"x")
        .build();
    assert_eq!(u16_at(&img, 17), 0);
    assert_eq!(u16_at(&img, 22), 0);
    assert_eq!(&img[82..90], b"FAT32   ");

    // The file takes cluster 2, the root directory follows it.
    let root_cluster = u32_at(&img, 44);
    assert_eq!(root_cluster, 3);
    let data_lba = 32 + 2 * u32_at(&img, 36);
    let root = (data_lba + root_cluster - 2) as usize * 512;
    assert_eq!(&img[root..root + 11], b"INIT       ");
}

#[test]
fn mbr_places_partitions_at_their_lba() {
    let vol = vec![0xABu8; 1024];
    let disk = MbrImageBuilder::new().partition(0x06, 4, vol).build();
    assert_eq!(&disk[510..512], &[0x55, 0xAA]);
    assert_eq!(disk[446 + 4], 0x06);
    assert_eq!(u32_at(&disk, 446 + 8), 4);
    assert_eq!(u32_at(&disk, 446 + 12), 2);
    assert_eq!(disk[4 * 512], 0xAB);
    assert_eq!(disk.len(), 6 * 512);
}
