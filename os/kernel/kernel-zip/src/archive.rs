use crate::ZipError;
use le_bytes::{read_u16_le, read_u32_le, slice_at};

const EOCD_SIGNATURE: u32 = 0x0605_4B50;
const CENTRAL_SIGNATURE: u32 = 0x0201_4B50;
const LOCAL_SIGNATURE: u32 = 0x0403_4B50;

const EOCD_LEN: usize = 22;
const CENTRAL_LEN: usize = 46;
const LOCAL_LEN: usize = 30;

/// The EOCD record is searched for in this many trailing bytes.
pub const EOCD_SEARCH_WINDOW: usize = kernel_info::config::ZIP_EOCD_SEARCH_WINDOW;

const _: () = assert!(EOCD_SEARCH_WINDOW >= EOCD_LEN);

/// General-purpose flag bit marking an encrypted entry.
const FLAG_ENCRYPTED: u16 = 1 << 0;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Method {
    Stored,
    Deflated,
    Other(u16),
}

impl From<u16> for Method {
    fn from(v: u16) -> Self {
        match v {
            0 => Self::Stored,
            8 => Self::Deflated,
            other => Self::Other(other),
        }
    }
}

/// The end-of-central-directory record.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct EndOfCentralDirectory {
    /// Offset of the record in the archive.
    pub offset: usize,
    pub entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
}

impl EndOfCentralDirectory {
    /// Find the last EOCD record in the trailing [`EOCD_SEARCH_WINDOW`] bytes.
    ///
    /// # Errors
    /// [`ZipError::TooShort`], [`ZipError::NoEndOfCentralDirectory`],
    /// [`ZipError::MultiDisk`] or [`ZipError::Zip64`].
    pub fn locate(data: &[u8]) -> Result<Self, ZipError> {
        if data.len() < EOCD_LEN {
            return Err(ZipError::TooShort);
        }
        let start = data.len().saturating_sub(EOCD_SEARCH_WINDOW);
        let offset = (start..=data.len() - EOCD_LEN)
            .rev()
            .find(|&i| read_u32_le(data, i) == Ok(EOCD_SIGNATURE))
            .ok_or(ZipError::NoEndOfCentralDirectory)?;

        let disk = read_u16_le(data, offset + 4)?;
        let cd_disk = read_u16_le(data, offset + 6)?;
        let disk_entries = read_u16_le(data, offset + 8)?;
        let entries = read_u16_le(data, offset + 10)?;
        let cd_size = read_u32_le(data, offset + 12)?;
        let cd_offset = read_u32_le(data, offset + 16)?;

        if entries == u16::MAX || cd_size == u32::MAX || cd_offset == u32::MAX {
            return Err(ZipError::Zip64);
        }
        if disk != 0 || cd_disk != 0 || disk_entries != entries {
            return Err(ZipError::MultiDisk);
        }
        if cd_offset as usize > offset {
            return Err(ZipError::CentralDirectoryOutOfBounds(cd_offset));
        }

        Ok(Self {
            offset,
            entries,
            cd_size,
            cd_offset,
        })
    }
}

/// One central directory record.
#[derive(Debug, Copy, Clone)]
pub struct CentralEntry<'a> {
    /// Raw entry name as stored in the archive.
    pub name: &'a [u8],
    pub flags: u16,
    pub method: Method,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub local_header_offset: u32,
}

impl CentralEntry<'_> {
    #[must_use]
    pub const fn is_encrypted(&self) -> bool {
        self.flags & FLAG_ENCRYPTED != 0
    }
}

/// Cursor over the central directory.
///
/// Stops after the advertised entry count, or after the first malformed
/// record (which is yielded as an error).
pub struct CentralDirectory<'a> {
    data: &'a [u8],
    pos: usize,
    remaining: u16,
}

impl<'a> CentralDirectory<'a> {
    fn parse_next(&mut self) -> Result<CentralEntry<'a>, ZipError> {
        let d = self.data;
        let p = self.pos;
        if read_u32_le(d, p)? != CENTRAL_SIGNATURE {
            return Err(ZipError::BadCentralSignature(p));
        }

        let flags = read_u16_le(d, p + 8)?;
        let method = read_u16_le(d, p + 10)?;
        let crc32 = read_u32_le(d, p + 16)?;
        let compressed_size = read_u32_le(d, p + 20)?;
        let uncompressed_size = read_u32_le(d, p + 24)?;
        let name_len = usize::from(read_u16_le(d, p + 28)?);
        let extra_len = usize::from(read_u16_le(d, p + 30)?);
        let comment_len = usize::from(read_u16_le(d, p + 32)?);
        let local_header_offset = read_u32_le(d, p + 42)?;
        let name = slice_at(d, p + CENTRAL_LEN, name_len)?;

        self.pos = p + CENTRAL_LEN + name_len + extra_len + comment_len;
        Ok(CentralEntry {
            name,
            flags,
            method: Method::from(method),
            crc32,
            compressed_size,
            uncompressed_size,
            local_header_offset,
        })
    }
}

impl<'a> Iterator for CentralDirectory<'a> {
    type Item = Result<CentralEntry<'a>, ZipError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let entry = self.parse_next();
        if entry.is_err() {
            self.remaining = 0;
        }
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(usize::from(self.remaining)))
    }
}

/// A validated view over an in-memory archive.
#[derive(Debug, Copy, Clone)]
pub struct Archive<'a> {
    data: &'a [u8],
    eocd: EndOfCentralDirectory,
}

impl<'a> Archive<'a> {
    /// Locate and check the end-of-central-directory record.
    ///
    /// # Errors
    /// See [`EndOfCentralDirectory::locate`].
    pub fn parse(data: &'a [u8]) -> Result<Self, ZipError> {
        let eocd = EndOfCentralDirectory::locate(data)?;
        Ok(Self { data, eocd })
    }

    #[must_use]
    pub const fn eocd(&self) -> &EndOfCentralDirectory {
        &self.eocd
    }

    #[must_use]
    pub const fn entries(&self) -> CentralDirectory<'a> {
        CentralDirectory {
            data: self.data,
            pos: self.eocd.cd_offset as usize,
            remaining: self.eocd.entries,
        }
    }

    /// The raw (possibly compressed) bytes of `entry`.
    ///
    /// # Errors
    /// [`ZipError::BadLocalSignature`] or [`ZipError::Truncated`].
    pub fn payload(&self, entry: &CentralEntry<'_>) -> Result<&'a [u8], ZipError> {
        let local = entry.local_header_offset as usize;
        if read_u32_le(self.data, local)? != LOCAL_SIGNATURE {
            return Err(ZipError::BadLocalSignature(local));
        }
        // The local extra field may differ from the central one.
        let name_len = usize::from(read_u16_le(self.data, local + 26)?);
        let extra_len = usize::from(read_u16_le(self.data, local + 28)?);
        let start = local + LOCAL_LEN + name_len + extra_len;
        Ok(slice_at(
            self.data,
            start,
            entry.compressed_size as usize,
        )?)
    }
}
