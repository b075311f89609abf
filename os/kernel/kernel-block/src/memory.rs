use crate::{BlockError, BlockReader, DiskController, DriveId, SECTOR_SIZE, Sector};

/// A disk image held in memory.
///
/// A trailing partial sector reads back zero-padded.
#[derive(Debug, Copy, Clone)]
pub struct MemoryDisk<'a> {
    image: &'a [u8],
}

impl<'a> MemoryDisk<'a> {
    #[must_use]
    pub const fn new(image: &'a [u8]) -> Self {
        Self { image }
    }

    /// Number of (possibly partial) sectors in the image.
    #[must_use]
    pub const fn sectors(&self) -> usize {
        self.image.len().div_ceil(SECTOR_SIZE)
    }
}

impl BlockReader for MemoryDisk<'_> {
    fn read_sector(&mut self, lba: u32, buf: &mut Sector) -> Result<(), BlockError> {
        let start = (lba as usize)
            .checked_mul(SECTOR_SIZE)
            .filter(|&s| s < self.image.len())
            .ok_or(BlockError::OutOfRange(lba))?;
        let end = self.image.len().min(start + SECTOR_SIZE);
        let src = &self.image[start..end];
        buf[..src.len()].copy_from_slice(src);
        buf[src.len()..].fill(0);
        Ok(())
    }
}

/// Four drive slots backed by [`MemoryDisk`]s, addressed like the legacy controller.
#[derive(Debug, Default)]
pub struct MemoryController<'a> {
    drives: [Option<MemoryDisk<'a>>; 4],
    reads: usize,
}

impl<'a> MemoryController<'a> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            drives: [None; 4],
            reads: 0,
        }
    }

    /// Attach `image` at `drive`. Non-legacy addresses are ignored.
    #[must_use]
    pub fn with_drive(mut self, drive: DriveId, image: &'a [u8]) -> Self {
        if let Some(i) = drive.legacy_index() {
            self.drives[i] = Some(MemoryDisk::new(image));
        }
        self
    }

    /// Number of sector reads served or refused so far.
    #[must_use]
    pub const fn reads(&self) -> usize {
        self.reads
    }
}

impl DiskController for MemoryController<'_> {
    fn read_sector(
        &mut self,
        drive: DriveId,
        lba: u32,
        buf: &mut Sector,
    ) -> Result<(), BlockError> {
        self.reads += 1;
        let disk = drive
            .legacy_index()
            .and_then(|i| self.drives[i].as_mut())
            .ok_or(BlockError::NotPresent)?;
        disk.read_sector(lba, buf)
    }
}
