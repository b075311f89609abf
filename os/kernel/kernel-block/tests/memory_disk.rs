use kernel_block::{
    BlockError, BlockReader, DiskController, DriveId, DriveReader, MemoryController, MemoryDisk,
    SECTOR_SIZE,
};

fn image(sectors: usize) -> Vec<u8> {
    (0..sectors * SECTOR_SIZE)
        .map(|i| u8::try_from(i / SECTOR_SIZE).unwrap())
        .collect()
}

#[test]
fn reads_whole_sectors() {
    let img = image(3);
    let mut disk = MemoryDisk::new(&img);
    let mut buf = [0xEEu8; SECTOR_SIZE];

    disk.read_sector(2, &mut buf).unwrap();
    assert!(buf.iter().all(|&b| b == 2));
    assert_eq!(disk.sectors(), 3);
}

#[test]
fn partial_tail_sector_is_zero_padded() {
    let img = vec![0xAB; SECTOR_SIZE + 10];
    let mut disk = MemoryDisk::new(&img);
    let mut buf = [0xEEu8; SECTOR_SIZE];

    disk.read_sector(1, &mut buf).unwrap();
    assert!(buf[..10].iter().all(|&b| b == 0xAB));
    assert!(buf[10..].iter().all(|&b| b == 0));
}

#[test]
fn reading_past_the_image_fails() {
    let img = image(1);
    let mut disk = MemoryDisk::new(&img);
    let mut buf = [0u8; SECTOR_SIZE];
    assert_eq!(
        disk.read_sector(1, &mut buf),
        Err(BlockError::OutOfRange(1))
    );
    assert_eq!(
        disk.read_sector(u32::MAX, &mut buf),
        Err(BlockError::OutOfRange(u32::MAX))
    );
}

#[test]
fn controller_routes_by_drive() {
    let a = image(1);
    let b = vec![7u8; SECTOR_SIZE];
    let mut ctl = MemoryController::new()
        .with_drive(DriveId::new(0, 0), &a)
        .with_drive(DriveId::new(1, 1), &b);
    let mut buf = [0u8; SECTOR_SIZE];

    ctl.read_sector(DriveId::new(1, 1), 0, &mut buf).unwrap();
    assert!(buf.iter().all(|&x| x == 7));

    // Empty slots behave like absent hardware.
    assert_eq!(
        ctl.read_sector(DriveId::new(0, 1), 0, &mut buf),
        Err(BlockError::NotPresent)
    );
    assert_eq!(ctl.reads(), 2);
}

#[test]
fn drive_reader_binds_one_drive() {
    let b = vec![9u8; SECTOR_SIZE];
    let mut ctl = MemoryController::new().with_drive(DriveId::new(0, 1), &b);
    let mut reader = DriveReader::new(&mut ctl, DriveId::new(0, 1));
    let mut buf = [0u8; SECTOR_SIZE];

    reader.read_sector(0, &mut buf).unwrap();
    assert_eq!(reader.drive(), DriveId::new(0, 1));
    assert!(buf.iter().all(|&x| x == 9));
}
