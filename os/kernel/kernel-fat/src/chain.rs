use crate::dir::{DIR_ENTRY_LEN, Slot};
use crate::{
    DirEntry, FatError, FatKind, FatVolume, MAX_DIR_ENTRIES, RootDir, matches_basename,
};
use core::ops::ControlFlow;
use kernel_block::{BlockReader, SECTOR_SIZE};
use le_bytes::{read_u16_le, read_u32_le};
use log::{debug, trace};

type Step = Result<ControlFlow<()>, FatError>;

impl FatVolume {
    /// FAT entry of `cluster`, i.e. the next cluster of its chain.
    ///
    /// # Errors
    /// [`FatError::ClusterOutOfRange`] for clusters outside the volume, or
    /// [`FatError::Block`] if a FAT sector cannot be read.
    pub fn next_cluster<R: BlockReader + ?Sized>(
        &self,
        reader: &mut R,
        cluster: u32,
    ) -> Result<u32, FatError> {
        if cluster < 2 || cluster > self.max_cluster() {
            return Err(FatError::ClusterOutOfRange(cluster));
        }
        let byte_offset = match self.kind {
            FatKind::Fat12 => u64::from(cluster) + u64::from(cluster / 2),
            FatKind::Fat16 => u64::from(cluster) * 2,
            FatKind::Fat32 => u64::from(cluster) * 4,
        };
        let lba = u64::from(self.fat_lba) + byte_offset / SECTOR_SIZE as u64;
        let lba = u32::try_from(lba).map_err(|_| FatError::ClusterOutOfRange(cluster))?;
        #[allow(clippy::cast_possible_truncation)]
        let off = (byte_offset % SECTOR_SIZE as u64) as usize;

        let mut sector = [0u8; SECTOR_SIZE];
        reader.read_sector(lba, &mut sector)?;
        let next = match self.kind {
            FatKind::Fat12 => {
                let lo = sector[off];
                // An entry at the last byte continues in the next FAT sector.
                let hi = if off + 1 < SECTOR_SIZE {
                    sector[off + 1]
                } else {
                    reader.read_sector(lba.saturating_add(1), &mut sector)?;
                    sector[0]
                };
                let pair = u16::from_le_bytes([lo, hi]);
                u32::from(if cluster & 1 == 1 { pair >> 4 } else { pair & 0x0FFF })
            }
            FatKind::Fat16 => u32::from(read_u16_le(&sector, off)?),
            FatKind::Fat32 => read_u32_le(&sector, off)? & 0x0FFF_FFFF,
        };
        trace!("fat: {cluster} -> {next:#x}");
        Ok(next)
    }

    /// Call `visit` with the first sector of every cluster of the chain at `start`.
    fn walk_chain<R, F>(&self, reader: &mut R, start: u32, mut visit: F) -> Result<(), FatError>
    where
        R: BlockReader + ?Sized,
        F: FnMut(&mut R, u32) -> Step,
    {
        let mut cluster = start;
        let mut visited = 0u32;
        while self.in_chain(cluster) {
            if cluster > self.max_cluster() {
                return Err(FatError::ClusterOutOfRange(cluster));
            }
            if visited == self.cluster_count {
                return Err(FatError::ChainLoop);
            }
            visited += 1;
            if visit(&mut *reader, self.cluster_lba(cluster))?.is_break() {
                return Ok(());
            }
            cluster = self.next_cluster(&mut *reader, cluster)?;
        }
        Ok(())
    }

    /// Read the chain starting at `start` into `dest`, whole sectors at a time.
    ///
    /// Stops at the end of the chain or when `dest` is full; a final sector that
    /// does not fit is cut short. Returns the number of bytes written.
    ///
    /// # Errors
    /// [`FatError::Block`], [`FatError::ClusterOutOfRange`] or [`FatError::ChainLoop`].
    pub fn read_chain<R: BlockReader + ?Sized>(
        &self,
        reader: &mut R,
        start: u32,
        dest: &mut [u8],
    ) -> Result<usize, FatError> {
        let mut filled = 0;
        let mut sector = [0u8; SECTOR_SIZE];
        self.walk_chain(reader, start, |reader, lba| {
            for s in 0..self.sectors_per_cluster {
                let rest = &mut dest[filled..];
                if rest.is_empty() {
                    return Ok(ControlFlow::Break(()));
                }
                reader.read_sector(lba.saturating_add(s), &mut sector)?;
                let n = rest.len().min(SECTOR_SIZE);
                rest[..n].copy_from_slice(&sector[..n]);
                filled += n;
            }
            Ok(ControlFlow::Continue(()))
        })?;
        Ok(filled)
    }

    /// Read the file described by `entry` into `dest`.
    ///
    /// The result is cut to the recorded size when the entry has one.
    ///
    /// # Errors
    /// See [`FatVolume::read_chain`].
    pub fn read_file<R: BlockReader + ?Sized>(
        &self,
        reader: &mut R,
        entry: &DirEntry,
        dest: &mut [u8],
    ) -> Result<usize, FatError> {
        let read = self.read_chain(reader, entry.first_cluster, dest)?;
        Ok(match usize::try_from(entry.size) {
            Ok(size) if size > 0 => read.min(size),
            _ => read,
        })
    }

    /// Find a regular file in the root directory by its 8.3 base name.
    ///
    /// Unreadable directory sectors are skipped.
    ///
    /// # Errors
    /// Errors from walking the FAT32 root directory chain, or
    /// [`FatError::DirectoryTooLarge`] once [`MAX_DIR_ENTRIES`] entries were
    /// scanned without reaching the end.
    pub fn find_file<R: BlockReader + ?Sized>(
        &self,
        reader: &mut R,
        basename: &str,
    ) -> Result<Option<DirEntry>, FatError> {
        let wide = self.kind == FatKind::Fat32;
        let mut found = None;
        let mut sector = [0u8; SECTOR_SIZE];
        let mut budget = MAX_DIR_ENTRIES * DIR_ENTRY_LEN / SECTOR_SIZE;
        let mut scan = |reader: &mut R, lba: u32| -> Step {
            if budget == 0 {
                return Err(FatError::DirectoryTooLarge);
            }
            budget -= 1;
            if let Err(e) = reader.read_sector(lba, &mut sector) {
                debug!("fat: directory sector {lba}: {e}");
                return Ok(ControlFlow::Continue(()));
            }
            for raw in sector.chunks_exact(DIR_ENTRY_LEN) {
                match DirEntry::parse(raw, wide)? {
                    Slot::End => return Ok(ControlFlow::Break(())),
                    Slot::File(entry) if matches_basename(&entry.name, basename) => {
                        found = Some(entry);
                        return Ok(ControlFlow::Break(()));
                    }
                    Slot::File(_) | Slot::Skip => {}
                }
            }
            Ok(ControlFlow::Continue(()))
        };

        match self.root {
            RootDir::Fixed { lba, sectors } => {
                for s in 0..sectors {
                    if scan(&mut *reader, lba.saturating_add(s))?.is_break() {
                        break;
                    }
                }
            }
            RootDir::Cluster(start) => {
                let spc = self.sectors_per_cluster;
                self.walk_chain(reader, start, |reader, lba| {
                    for s in 0..spc {
                        if scan(&mut *reader, lba.saturating_add(s))?.is_break() {
                            return Ok(ControlFlow::Break(()));
                        }
                    }
                    Ok(ControlFlow::Continue(()))
                })?;
            }
        }

        if let Some(entry) = &found {
            debug!(
                "fat: found {basename}: cluster={} size={}",
                entry.first_cluster, entry.size
            );
        }
        Ok(found)
    }

    /// Probe the volume at `partition_lba` and look `basename` up in its root
    /// directory.
    ///
    /// `Ok(None)` if the volume is valid but has no such file. The entry's
    /// first cluster is where [`FatVolume::read_chain`] starts.
    ///
    /// # Errors
    /// See [`FatVolume::probe`] and [`FatVolume::find_file`].
    pub fn probe_and_load<R: BlockReader + ?Sized>(
        reader: &mut R,
        partition_lba: u32,
        basename: &str,
    ) -> Result<Option<(Self, DirEntry)>, FatError> {
        let volume = Self::probe(&mut *reader, partition_lba)?;
        Ok(volume
            .find_file(reader, basename)?
            .map(|entry| (volume, entry)))
    }
}
