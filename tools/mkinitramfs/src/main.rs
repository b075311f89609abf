use boot_image::{Compression, FatImageBuilder, FatType, MbrImageBuilder, ZipBuilder};
use kernel_info::config::DISK_INIT_BASENAME;
use std::path::{Path, PathBuf};
use std::{env, fs, io};

const USAGE: &str = "\
usage: mkinitramfs pack <dir> <out.zip> [--deflate]
       mkinitramfs disk <init-file> <out.img> [--fat12|--fat16|--fat32] [--mbr]";

/// First sector of the partition written with `--mbr`.
const PARTITION_LBA: u32 = 2048;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Pack {
        dir: PathBuf,
        out: PathBuf,
        compression: Compression,
    },
    Disk {
        init: PathBuf,
        out: PathBuf,
        fat_type: FatType,
        mbr: bool,
    },
}

fn main() -> io::Result<()> {
    let command = parse_args(env::args().skip(1)).map_err(|e| {
        eprintln!("{e}\n{USAGE}");
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;

    match command {
        Command::Pack {
            dir,
            out,
            compression,
        } => {
            let mut zip = ZipBuilder::new();
            let files = collect_tree(&dir, &mut zip, compression)?;
            fs::write(&out, zip.build())?;
            eprintln!("packed {files} files into {}", out.display());
        }
        Command::Disk {
            init,
            out,
            fat_type,
            mbr,
        } => {
            let data = fs::read(&init)?;
            let image = disk_image(&data, fat_type, mbr)?;
            fs::write(&out, image)?;
            eprintln!(
                "wrote {fat_type:?} image with {} ({} bytes) to {}",
                DISK_INIT_BASENAME,
                data.len(),
                out.display()
            );
        }
    }
    Ok(())
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Command, String> {
    let mut args = args.into_iter();
    let verb = args.next().ok_or("missing command")?;
    let mut positional = Vec::new();
    let mut flags = Vec::new();
    for arg in args {
        if arg.starts_with("--") {
            flags.push(arg);
        } else {
            positional.push(PathBuf::from(arg));
        }
    }
    let [input, out]: [PathBuf; 2] = positional
        .try_into()
        .map_err(|_| "expected an input and an output path".to_string())?;

    match verb.as_str() {
        "pack" => {
            let mut compression = Compression::Stored;
            for flag in flags {
                match flag.as_str() {
                    "--deflate" => compression = Compression::Deflated,
                    other => return Err(format!("unknown flag {other}")),
                }
            }
            Ok(Command::Pack {
                dir: input,
                out,
                compression,
            })
        }
        "disk" => {
            let mut fat_type = FatType::Fat16;
            let mut mbr = false;
            for flag in flags {
                match flag.as_str() {
                    "--fat12" => fat_type = FatType::Fat12,
                    "--fat16" => fat_type = FatType::Fat16,
                    "--fat32" => fat_type = FatType::Fat32,
                    "--mbr" => mbr = true,
                    other => return Err(format!("unknown flag {other}")),
                }
            }
            Ok(Command::Disk {
                init: input,
                out,
                fat_type,
                mbr,
            })
        }
        other => Err(format!("unknown command {other}")),
    }
}

/// Add everything below `root` to `zip`, directories first, sorted by name.
///
/// Returns the number of files added.
fn collect_tree(root: &Path, zip: &mut ZipBuilder, compression: Compression) -> io::Result<usize> {
    let mut stack = vec![PathBuf::new()];
    let mut files = 0;
    while let Some(rel) = stack.pop() {
        let mut entries = fs::read_dir(root.join(&rel))?.collect::<io::Result<Vec<_>>>()?;
        entries.sort_by_key(fs::DirEntry::file_name);

        let mut subdirs = Vec::new();
        for entry in entries {
            let name = entry.file_name().into_string().map_err(|name| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("non-UTF-8 file name {name:?}"),
                )
            })?;
            let path = rel.join(&name);
            let member = archive_name(&path);
            let kind = entry.file_type()?;
            if kind.is_dir() {
                zip.directory(&format!("{member}/"));
                subdirs.push(path);
            } else if kind.is_file() {
                zip.file(&member, &fs::read(entry.path())?, compression);
                files += 1;
            }
        }
        stack.extend(subdirs.into_iter().rev());
    }
    Ok(files)
}

/// `/`-separated member name for a relative path.
fn archive_name(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Total sectors of a volume that holds `len` bytes.
fn volume_sectors(fat_type: FatType, len: usize) -> io::Result<u32> {
    let data = u32::try_from(len.div_ceil(512))
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "init file too large"))?;
    let (minimum, limit) = match fat_type {
        // Cluster counts keep the volume on the intended side of the
        // FAT12/16/32 thresholds.
        FatType::Fat12 => (2880, 4000),
        FatType::Fat16 => (32_768, 65_000),
        FatType::Fat32 => (70_000, u32::MAX / 2),
    };
    let needed = data.saturating_mul(2).saturating_add(1024).max(minimum);
    if needed > limit && fat_type != FatType::Fat32 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("init file does not fit a {fat_type:?} volume"),
        ));
    }
    Ok(needed.min(limit))
}

fn disk_image(data: &[u8], fat_type: FatType, mbr: bool) -> io::Result<Vec<u8>> {
    let sectors = volume_sectors(fat_type, data.len())?;
    let mut volume = FatImageBuilder::new(fat_type, sectors);
    volume.file(DISK_INIT_BASENAME, data);
    if !mbr {
        return Ok(volume.build());
    }

    volume.hidden_sectors(PARTITION_LBA);
    let kind = match fat_type {
        FatType::Fat12 => 0x01,
        FatType::Fat16 => 0x0E,
        FatType::Fat32 => 0x0C,
    };
    Ok(MbrImageBuilder::new()
        .partition(kind, PARTITION_LBA, volume.build())
        .build())
}
