use crate::{Archive, CentralEntry, DecompressionHeap, Method, ZipError, normalize_entry_name};
use kernel_inflate::inflate;
use kernel_ramfs::FileSink;
use log::{debug, info, warn};

/// Extract every supported entry of `archive` into `sink`.
///
/// Stored entries borrow directly from `archive`; deflated entries are decoded
/// into `heap`. Entries that cannot be extracted are logged and skipped.
/// Directory entries are registered as directories and not counted.
///
/// Returns the number of files the sink accepted.
pub fn extract_to_store<'a, S>(
    archive: &'a [u8],
    heap: &mut DecompressionHeap<'a>,
    sink: &mut S,
) -> usize
where
    S: FileSink<'a> + ?Sized,
{
    let zip = match Archive::parse(archive) {
        Ok(zip) => zip,
        Err(e) => {
            warn!("zip: {e}");
            return 0;
        }
    };
    let eocd = zip.eocd();
    info!(
        "zip: central directory at {}, {} entries ({} bytes)",
        eocd.cd_offset, eocd.entries, eocd.cd_size
    );

    let mut loaded = 0;
    for entry in zip.entries() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("zip: {e}; stopping");
                break;
            }
        };
        match extract_entry(&zip, &entry, heap, sink) {
            Ok(true) => loaded += 1,
            Ok(false) => {}
            Err(ZipError::EmptyName) => debug!("zip: skipping entry without a name"),
            Err(e) => warn!(
                "zip: skipping {}: {e}",
                core::str::from_utf8(entry.name).unwrap_or("<non-utf8 name>")
            ),
        }
    }

    info!("zip: loaded {loaded} files");
    loaded
}

/// Returns whether a file was added.
fn extract_entry<'a, S>(
    zip: &Archive<'a>,
    entry: &CentralEntry<'a>,
    heap: &mut DecompressionHeap<'a>,
    sink: &mut S,
) -> Result<bool, ZipError>
where
    S: FileSink<'a> + ?Sized,
{
    let name = normalize_entry_name(entry.name)?;
    let path = name.path.as_str();

    if name.is_dir {
        if let Err(e) = sink.add_directory(path) {
            warn!("zip: directory {path}: {e}");
        }
        return Ok(false);
    }
    if entry.is_encrypted() {
        return Err(ZipError::Encrypted);
    }

    let payload = zip.payload(entry)?;
    let data = match entry.method {
        Method::Stored => payload,
        Method::Deflated => {
            let size = entry.uncompressed_size as usize;
            heap.fill(size, |out| Ok(inflate(out, payload)?))?
        }
        Method::Other(m) => return Err(ZipError::UnsupportedMethod(m)),
    };

    match sink.add_file(path, data) {
        Ok(()) => {
            info!(
                "zip: {path}: {:?}, {} -> {} bytes",
                entry.method,
                payload.len(),
                data.len()
            );
            Ok(true)
        }
        Err(e) => {
            warn!("zip: {path} not added: {e}");
            Ok(false)
        }
    }
}
