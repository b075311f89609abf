//! ZIP archive writer (single disk, no Zip64).

use crate::crc32::crc32;
use crate::{put_u16, put_u32};
use miniz_oxide::deflate::compress_to_vec;

/// 1980-01-01, the earliest DOS date.
const DOS_DATE: u16 = (1 << 5) | 1;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Compression {
    Stored,
    Deflated,
}

/// One archive member with its payload already encoded.
#[derive(Debug, Clone)]
pub struct ZipEntry {
    pub name: Vec<u8>,
    pub method: u16,
    pub flags: u16,
    pub crc32: u32,
    pub payload: Vec<u8>,
    pub uncompressed_size: u32,
    pub local_extra: Vec<u8>,
    pub central_extra: Vec<u8>,
    pub external_attributes: u32,
}

impl ZipEntry {
    /// A file member.
    ///
    /// # Panics
    /// If `data` is larger than 4 GiB.
    #[must_use]
    pub fn file(name: &str, data: &[u8], compression: Compression) -> Self {
        let (method, payload) = match compression {
            Compression::Stored => (0, data.to_vec()),
            Compression::Deflated => (8, compress_to_vec(data, 6)),
        };
        Self {
            name: name.as_bytes().to_vec(),
            method,
            flags: 0,
            crc32: crc32(data),
            payload,
            uncompressed_size: u32::try_from(data.len()).expect("member larger than 4 GiB"),
            local_extra: Vec::new(),
            central_extra: Vec::new(),
            external_attributes: 0,
        }
    }

    /// A directory member; `name` should end in `/`.
    #[must_use]
    pub fn directory(name: &str) -> Self {
        Self {
            external_attributes: 0x10,
            ..Self::file(name, &[], Compression::Stored)
        }
    }
}

/// Collects members and lays them out as an archive.
#[derive(Debug, Default, Clone)]
pub struct ZipBuilder {
    entries: Vec<ZipEntry>,
    comment: Vec<u8>,
}

impl ZipBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: ZipEntry) -> &mut Self {
        self.entries.push(entry);
        self
    }

    pub fn file(&mut self, name: &str, data: &[u8], compression: Compression) -> &mut Self {
        self.push(ZipEntry::file(name, data, compression))
    }

    pub fn directory(&mut self, name: &str) -> &mut Self {
        self.push(ZipEntry::directory(name))
    }

    pub fn comment(&mut self, comment: &[u8]) -> &mut Self {
        self.comment = comment.to_vec();
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize the archive.
    ///
    /// # Panics
    /// If the archive outgrows the 32-bit offsets of the format, or has more
    /// than 65534 members.
    #[must_use]
    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut offsets = Vec::with_capacity(self.entries.len());

        for e in &self.entries {
            offsets.push(offset32(out.len()));
            let mut hdr = [0u8; 30];
            put_u32(&mut hdr, 0, 0x0403_4B50);
            put_u16(&mut hdr, 4, 20);
            put_u16(&mut hdr, 6, e.flags);
            put_u16(&mut hdr, 8, e.method);
            put_u16(&mut hdr, 12, DOS_DATE);
            put_u32(&mut hdr, 14, e.crc32);
            put_u32(&mut hdr, 18, offset32(e.payload.len()));
            put_u32(&mut hdr, 22, e.uncompressed_size);
            put_u16(&mut hdr, 26, len16(e.name.len()));
            put_u16(&mut hdr, 28, len16(e.local_extra.len()));
            out.extend_from_slice(&hdr);
            out.extend_from_slice(&e.name);
            out.extend_from_slice(&e.local_extra);
            out.extend_from_slice(&e.payload);
        }

        let cd_offset = offset32(out.len());
        for (e, &local) in self.entries.iter().zip(&offsets) {
            let mut hdr = [0u8; 46];
            put_u32(&mut hdr, 0, 0x0201_4B50);
            put_u16(&mut hdr, 4, 20);
            put_u16(&mut hdr, 6, 20);
            put_u16(&mut hdr, 8, e.flags);
            put_u16(&mut hdr, 10, e.method);
            put_u16(&mut hdr, 14, DOS_DATE);
            put_u32(&mut hdr, 16, e.crc32);
            put_u32(&mut hdr, 20, offset32(e.payload.len()));
            put_u32(&mut hdr, 24, e.uncompressed_size);
            put_u16(&mut hdr, 28, len16(e.name.len()));
            put_u16(&mut hdr, 30, len16(e.central_extra.len()));
            put_u32(&mut hdr, 38, e.external_attributes);
            put_u32(&mut hdr, 42, local);
            out.extend_from_slice(&hdr);
            out.extend_from_slice(&e.name);
            out.extend_from_slice(&e.central_extra);
        }
        let cd_size = offset32(out.len()) - cd_offset;

        let count = len16(self.entries.len());
        let mut eocd = [0u8; 22];
        put_u32(&mut eocd, 0, 0x0605_4B50);
        put_u16(&mut eocd, 8, count);
        put_u16(&mut eocd, 10, count);
        put_u32(&mut eocd, 12, cd_size);
        put_u32(&mut eocd, 16, cd_offset);
        put_u16(&mut eocd, 20, len16(self.comment.len()));
        out.extend_from_slice(&eocd);
        out.extend_from_slice(&self.comment);
        out
    }
}

fn offset32(v: usize) -> u32 {
    u32::try_from(v).expect("archive exceeds 4 GiB")
}

fn len16(v: usize) -> u16 {
    u16::try_from(v)
        .ok()
        .filter(|&v| v != u16::MAX)
        .expect("field exceeds 16 bits")
}
