use crate::FatError;
use kernel_block::{BlockReader, SECTOR_SIZE, Sector};
use le_bytes::{read_u8, read_u16_le, read_u32_le};
use log::debug;

/// Volumes with fewer data clusters than this are FAT12.
const FAT12_MAX_CLUSTERS: u32 = 4085;

#[allow(clippy::cast_possible_truncation)]
const SECTOR_BYTES: u32 = SECTOR_SIZE as u32;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FatKind {
    Fat12,
    Fat16,
    Fat32,
}

impl FatKind {
    /// Width of one FAT entry on disk.
    const fn entry_bits(self) -> u64 {
        match self {
            Self::Fat12 => 12,
            Self::Fat16 => 16,
            Self::Fat32 => 32,
        }
    }

    /// Smallest FAT value that terminates a chain.
    #[must_use]
    pub const fn end_of_chain(self) -> u32 {
        match self {
            Self::Fat12 => 0x0FF8,
            Self::Fat16 => 0xFFF8,
            Self::Fat32 => 0x0FFF_FFF8,
        }
    }
}

/// Where the root directory lives.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RootDir {
    /// FAT12/16: a fixed run of sectors between the FATs and the data area.
    Fixed { lba: u32, sectors: u32 },
    /// FAT32: an ordinary cluster chain.
    Cluster(u32),
}

/// Geometry of one FAT volume, derived from its boot sector.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FatVolume {
    pub kind: FatKind,
    pub partition_lba: u32,
    pub fat_lba: u32,
    pub data_lba: u32,
    pub root: RootDir,
    pub sectors_per_cluster: u32,
    pub cluster_count: u32,
}

impl FatVolume {
    /// Read and validate the boot sector at `partition_lba`.
    ///
    /// # Errors
    /// [`FatError::Block`] if the sector cannot be read, or any boot sector
    /// validation error from [`FatVolume::from_boot_sector`].
    pub fn probe<R: BlockReader + ?Sized>(
        reader: &mut R,
        partition_lba: u32,
    ) -> Result<Self, FatError> {
        let mut sector = [0u8; SECTOR_SIZE];
        reader.read_sector(partition_lba, &mut sector)?;
        let volume = Self::from_boot_sector(&sector, partition_lba)?;
        debug!(
            "fat: {:?} at {partition_lba}: fat_lba={} data_lba={} root={:?} clusters={}",
            volume.kind, volume.fat_lba, volume.data_lba, volume.root, volume.cluster_count
        );
        Ok(volume)
    }

    /// Derive the volume geometry from a boot sector read at `partition_lba`.
    ///
    /// # Errors
    /// [`FatError::BadBytesPerSector`], [`FatError::NoSectorsPerCluster`],
    /// [`FatError::NoFats`], [`FatError::NoFatSize`] or [`FatError::NoClusters`].
    pub fn from_boot_sector(bs: &Sector, partition_lba: u32) -> Result<Self, FatError> {
        let bytes_per_sector = read_u16_le(bs, 11)?;
        if u32::from(bytes_per_sector) != SECTOR_BYTES {
            return Err(FatError::BadBytesPerSector(bytes_per_sector));
        }
        let spc = u32::from(read_u8(bs, 13)?);
        if spc == 0 {
            return Err(FatError::NoSectorsPerCluster);
        }
        let reserved = u32::from(read_u16_le(bs, 14)?);
        let fats = u32::from(read_u8(bs, 16)?);
        if fats == 0 {
            return Err(FatError::NoFats);
        }
        let root_entries = u32::from(read_u16_le(bs, 17)?);
        let total_sectors = match read_u16_le(bs, 19)? {
            0 => read_u32_le(bs, 32)?,
            n => u32::from(n),
        };
        let fat_size = match read_u16_le(bs, 22)? {
            0 => read_u32_le(bs, 36)?,
            n => u32::from(n),
        };
        if fat_size == 0 {
            return Err(FatError::NoFatSize);
        }

        let fat_lba = partition_lba.saturating_add(reserved);
        let fat_area = fats.saturating_mul(fat_size);
        let root_sectors = (root_entries * 32).div_ceil(SECTOR_BYTES);
        let (root, data_lba) = if root_entries == 0 {
            let root_cluster = read_u32_le(bs, 44)? & 0x0FFF_FFFF;
            (RootDir::Cluster(root_cluster), fat_lba.saturating_add(fat_area))
        } else {
            let lba = fat_lba.saturating_add(fat_area);
            (
                RootDir::Fixed {
                    lba,
                    sectors: root_sectors,
                },
                lba.saturating_add(root_sectors),
            )
        };

        let overhead = reserved
            .saturating_add(fat_area)
            .saturating_add(root_sectors);
        let declared = total_sectors.saturating_sub(overhead) / spc;
        if declared == 0 {
            return Err(FatError::NoClusters);
        }

        let kind = if root_entries == 0 {
            FatKind::Fat32
        } else if declared < FAT12_MAX_CLUSTERS {
            FatKind::Fat12
        } else {
            FatKind::Fat16
        };

        // The FAT cannot describe more clusters than it has entries for.
        let fat_entries = u64::from(fat_size) * u64::from(SECTOR_BYTES) * 8 / kind.entry_bits();
        let addressable = u32::try_from(fat_entries.saturating_sub(2)).unwrap_or(u32::MAX);
        let cluster_count = declared.min(addressable);
        if cluster_count == 0 {
            return Err(FatError::NoClusters);
        }
        if cluster_count < declared {
            debug!("fat: {declared} clusters declared, FAT holds {cluster_count}");
        }

        Ok(Self {
            kind,
            partition_lba,
            fat_lba,
            data_lba,
            root,
            sectors_per_cluster: spc,
            cluster_count,
        })
    }

    /// Highest valid cluster number.
    #[must_use]
    pub const fn max_cluster(&self) -> u32 {
        self.cluster_count + 1
    }

    /// First sector of `cluster`. Clusters are numbered from 2.
    #[must_use]
    pub const fn cluster_lba(&self, cluster: u32) -> u32 {
        self.data_lba
            .saturating_add(cluster.saturating_sub(2).saturating_mul(self.sectors_per_cluster))
    }

    /// Whether `cluster` continues a chain (not free, reserved or end of chain).
    #[must_use]
    pub const fn in_chain(&self, cluster: u32) -> bool {
        cluster >= 2 && cluster < self.kind.end_of_chain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boot_sector(root_entries: u16, total: u16, fat_size: u16) -> Sector {
        let mut bs = [0u8; SECTOR_SIZE];
        bs[11..13].copy_from_slice(&512u16.to_le_bytes());
        bs[13] = 4;
        bs[14..16].copy_from_slice(&4u16.to_le_bytes());
        bs[16] = 2;
        bs[17..19].copy_from_slice(&root_entries.to_le_bytes());
        bs[19..21].copy_from_slice(&total.to_le_bytes());
        bs[22..24].copy_from_slice(&fat_size.to_le_bytes());
        bs
    }

    #[test]
    fn fixed_root_geometry() {
        let v = FatVolume::from_boot_sector(&boot_sector(512, 40_000, 40), 100).unwrap();
        assert_eq!(v.fat_lba, 104);
        assert_eq!(
            v.root,
            RootDir::Fixed {
                lba: 184,
                sectors: 32
            }
        );
        assert_eq!(v.data_lba, 216);
        assert_eq!(v.cluster_count, (40_000 - 4 - 80 - 32) / 4);
        assert_eq!(v.kind, FatKind::Fat16);
        assert_eq!(v.cluster_lba(2), 216);
        assert_eq!(v.cluster_lba(5), 228);
    }

    #[test]
    fn cluster_count_is_limited_by_the_fat() {
        // 65000 sectors would be ~16000 clusters; a one-sector FAT16 holds 254.
        let v = FatVolume::from_boot_sector(&boot_sector(512, 65_000, 1), 0).unwrap();
        assert_eq!(v.kind, FatKind::Fat16);
        assert_eq!(v.cluster_count, 512 * 8 / 16 - 2);
        assert_eq!(v.max_cluster(), 255);
    }

    #[test]
    fn small_volumes_are_fat12() {
        let v = FatVolume::from_boot_sector(&boot_sector(224, 2880, 9), 0).unwrap();
        assert_eq!(v.kind, FatKind::Fat12);
        assert!(v.in_chain(0xFF7));
        assert!(!v.in_chain(0xFF8));
        assert!(!v.in_chain(1));
    }

    #[test]
    fn rejects_bad_boot_sectors() {
        let mut bs = boot_sector(512, 40_000, 40);
        bs[11] = 0;
        bs[12] = 4;
        assert_eq!(
            FatVolume::from_boot_sector(&bs, 0),
            Err(FatError::BadBytesPerSector(1024))
        );

        let mut bs = boot_sector(512, 40_000, 40);
        bs[13] = 0;
        assert_eq!(
            FatVolume::from_boot_sector(&bs, 0),
            Err(FatError::NoSectorsPerCluster)
        );

        let mut bs = boot_sector(512, 40_000, 40);
        bs[16] = 0;
        assert_eq!(FatVolume::from_boot_sector(&bs, 0), Err(FatError::NoFats));

        let bs = boot_sector(512, 40_000, 0);
        assert_eq!(FatVolume::from_boot_sector(&bs, 0), Err(FatError::NoFatSize));

        let bs = boot_sector(512, 100, 40);
        assert_eq!(FatVolume::from_boot_sector(&bs, 0), Err(FatError::NoClusters));

        assert_eq!(
            FatVolume::from_boot_sector(&[0u8; SECTOR_SIZE], 0),
            Err(FatError::BadBytesPerSector(0))
        );
    }
}
