use crate::state::StateMachine;
use crate::{FilesystemStagingContext, StagingState};
use kernel_block::{BlockReader, DiskController, DriveId, DriveReader, SECTOR_SIZE};
use kernel_fat::{FatError, FatVolume, MasterBootRecord};
use kernel_ramfs::RamFsError;
use log::{debug, info, warn};

/// Why the disk scan did not run.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SkipReason {
    /// The init program was already staged from a module.
    InitPresent,
    /// Disabled by [`StagingOptions::scan_disks`](crate::StagingOptions::scan_disks).
    Disabled,
    /// No disk load buffer, or it was used up by an earlier scan.
    NoBuffer,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DiskScanOutcome {
    Skipped(SkipReason),
    /// The init program was loaded from `drive`, from an MBR partition slot
    /// or (`None`) from a volume starting at sector 0.
    Found {
        drive: DriveId,
        partition: Option<usize>,
        size: usize,
    },
    /// A file was loaded but the store refused it.
    Rejected(RamFsError),
    /// No drive had the file.
    NotFound,
}

/// Why one volume did not yield the init program.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum ProbeError {
    #[error(transparent)]
    Fat(#[from] FatError),
    #[error("file not in the root directory")]
    NotFound,
    #[error("file is empty")]
    Empty,
}

impl<'a> FilesystemStagingContext<'a> {
    /// Load the init program from the first disk that has it.
    ///
    /// Only runs while no init program is staged; see [`SkipReason`].
    pub fn scan_disks<C: DiskController + ?Sized>(
        &mut self,
        controller: &mut C,
    ) -> DiskScanOutcome {
        if let Some(reason) = self.disk_skip_reason() {
            debug!("disk: scan skipped: {reason:?}");
            return DiskScanOutcome::Skipped(reason);
        }
        let mut machine = StateMachine::resume(StagingState::ModuleEmpty);
        self.scan_drives(controller, &mut machine)
    }

    pub(crate) fn disk_skip_reason(&self) -> Option<SkipReason> {
        if self.has_init() {
            Some(SkipReason::InitPresent)
        } else if !self.options.scan_disks {
            Some(SkipReason::Disabled)
        } else if self.disk_buffer.is_none() {
            Some(SkipReason::NoBuffer)
        } else {
            None
        }
    }

    pub(crate) fn scan_drives<C: DiskController + ?Sized>(
        &mut self,
        controller: &mut C,
        machine: &mut StateMachine,
    ) -> DiskScanOutcome {
        let Some(buffer) = self.disk_buffer.take() else {
            return DiskScanOutcome::Skipped(SkipReason::NoBuffer);
        };
        let target = self.options.disk_target;
        info!(
            "disk: no {} staged, scanning drives for {target}",
            self.options.init_path
        );

        let mut found = None;
        for drive in DriveId::LEGACY {
            machine.enter(StagingState::DiskScan);
            debug!("disk: probing drive {drive}");
            let mut reader = DriveReader::new(&mut *controller, drive);
            if let Some(hit) = probe_drive(&mut reader, target, &mut *buffer, machine) {
                found = Some((drive, hit));
                break;
            }
        }

        let Some((drive, (partition, size))) = found else {
            info!("disk: {target} not found on any drive");
            self.disk_buffer = Some(buffer);
            return DiskScanOutcome::NotFound;
        };

        let frozen: &'a [u8] = buffer;
        let path = self.options.init_path;
        match self.ramfs.add(path, &frozen[..size]) {
            Ok(()) => {
                info!("disk: loaded {target} from drive {drive} ({size} bytes) -> {path}");
                DiskScanOutcome::Found {
                    drive,
                    partition,
                    size,
                }
            }
            Err(e) => {
                warn!("disk: cannot stage {path}: {e}");
                DiskScanOutcome::Rejected(e)
            }
        }
    }
}

/// Try the partitions of one drive, then the drive as a bare volume.
///
/// Returns the partition slot and the loaded length.
fn probe_drive<R: BlockReader + ?Sized>(
    reader: &mut R,
    target: &str,
    buffer: &mut [u8],
    machine: &mut StateMachine,
) -> Option<(Option<usize>, usize)> {
    let mut sector = [0u8; SECTOR_SIZE];
    if let Err(e) = reader.read_sector(0, &mut sector) {
        debug!("disk: sector 0: {e}");
        return None;
    }

    if let Some(mbr) = MasterBootRecord::parse(&sector) {
        machine.enter(StagingState::MbrFound);
        debug!("disk: MBR signature present, scanning partitions");
        let mut probed_start = false;
        for (slot, partition) in mbr.used() {
            machine.enter(StagingState::PartitionProbe);
            info!(
                "disk: partition {slot} type={:?} lba={}",
                partition.kind, partition.start_lba
            );
            probed_start |= partition.start_lba == 0;
            match load_from_volume(&mut *reader, partition.start_lba, target, buffer) {
                Ok(len) => return Some((Some(slot), len)),
                Err(e) => info!("disk: partition {slot}: {e}"),
            }
        }
        if probed_start {
            return None;
        }
        // Boot sectors carry the same signature.
        debug!("disk: no {target} in partitions, trying sector 0 as a FAT volume");
    } else {
        machine.enter(StagingState::NoMbr);
        debug!("disk: no MBR signature, trying raw FAT");
    }

    machine.enter(StagingState::RawFatProbe);
    match load_from_volume(&mut *reader, 0, target, buffer) {
        Ok(len) => Some((None, len)),
        Err(e) => {
            info!("disk: raw FAT: {e}");
            None
        }
    }
}

/// Find `target` on the FAT volume at `lba` and read it into `buffer`.
fn load_from_volume<R: BlockReader + ?Sized>(
    reader: &mut R,
    lba: u32,
    target: &str,
    buffer: &mut [u8],
) -> Result<usize, ProbeError> {
    let (volume, entry) =
        FatVolume::probe_and_load(&mut *reader, lba, target)?.ok_or(ProbeError::NotFound)?;
    let read = volume.read_chain(reader, entry.first_cluster, buffer)?;
    match loaded_len(&buffer[..read], entry.size) {
        0 => Err(ProbeError::Empty),
        len => Ok(len),
    }
}

/// Length of a file read from a cluster chain.
///
/// The directory entry's size wins when it is known and covered by `data`.
/// Otherwise trailing NUL padding is dropped, keeping at least one byte.
fn loaded_len(data: &[u8], recorded: u32) -> usize {
    match usize::try_from(recorded) {
        Ok(size) if size > 0 && size <= data.len() => size,
        _ => data
            .iter()
            .rposition(|&b| b != 0)
            .map_or(data.len().min(1), |last| last + 1),
    }
}
