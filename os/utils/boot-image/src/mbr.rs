//! Master boot record writer.

use crate::put_u32;

const SECTOR: usize = 512;

/// Places volume images behind a four-slot MBR partition table.
#[derive(Debug, Default, Clone)]
pub struct MbrImageBuilder {
    partitions: Vec<(u8, u32, Vec<u8>)>,
}

impl MbrImageBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a partition of `kind` starting at `start_lba` holding `image`.
    pub fn partition(&mut self, kind: u8, start_lba: u32, image: Vec<u8>) -> &mut Self {
        self.partitions.push((kind, start_lba, image));
        self
    }

    /// Serialize the disk.
    ///
    /// # Panics
    /// With more than four partitions, or overlapping ones.
    #[must_use]
    pub fn build(&self) -> Vec<u8> {
        assert!(self.partitions.len() <= 4, "MBR holds four partitions");
        let end = self
            .partitions
            .iter()
            .map(|(_, start, img)| *start as usize * SECTOR + img.len().next_multiple_of(SECTOR))
            .max()
            .unwrap_or(SECTOR)
            .max(SECTOR);

        let mut disk = vec![0u8; end];
        for (i, (kind, start, img)) in self.partitions.iter().enumerate() {
            assert!(*start >= 1, "partition overlaps the MBR");
            let e = 446 + i * 16;
            disk[e] = if i == 0 { 0x80 } else { 0 };
            disk[e + 1..e + 4].copy_from_slice(&[0xFE, 0xFF, 0xFF]);
            disk[e + 4] = *kind;
            disk[e + 5..e + 8].copy_from_slice(&[0xFE, 0xFF, 0xFF]);
            put_u32(&mut disk, e + 8, *start);
            let sectors = u32::try_from(img.len().div_ceil(SECTOR)).expect("partition too large");
            put_u32(&mut disk, e + 12, sectors);

            let off = *start as usize * SECTOR;
            assert!(
                disk[off..off + img.len()].iter().all(|&b| b == 0),
                "partitions overlap"
            );
            disk[off..off + img.len()].copy_from_slice(img);
        }
        disk[510] = 0x55;
        disk[511] = 0xAA;
        disk
    }
}
