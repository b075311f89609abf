//! FAT12/16/32 volume writer.
//!
//! Files are placed in the root directory. Cluster chains are allocated in
//! order, optionally leaving gaps (`cluster_stride`) so readers must follow
//! the FAT instead of assuming contiguous files.

use crate::{put_u16, put_u32};

const SECTOR: usize = 512;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FatType {
    Fat12,
    Fat16,
    Fat32,
}

impl FatType {
    const fn entry_bits(self) -> usize {
        match self {
            Self::Fat12 => 12,
            Self::Fat16 => 16,
            Self::Fat32 => 32,
        }
    }

    const fn end_of_chain(self) -> u32 {
        match self {
            Self::Fat12 => 0xFFF,
            Self::Fat16 => 0xFFFF,
            Self::Fat32 => 0x0FFF_FFFF,
        }
    }

    const fn label(self) -> &'static [u8; 8] {
        match self {
            Self::Fat12 => b"FAT12   ",
            Self::Fat16 => b"FAT16   ",
            Self::Fat32 => b"FAT32   ",
        }
    }
}

/// One root directory entry to write.
#[derive(Debug, Clone)]
pub struct DirEntrySpec {
    /// Raw 8.3 name field.
    pub name: [u8; 11],
    pub attributes: u8,
    pub data: Vec<u8>,
    /// Size written to the entry instead of `data.len()`.
    pub recorded_size: Option<u32>,
    /// Write the entry with the deleted marker.
    pub deleted: bool,
}

impl DirEntrySpec {
    pub const ATTR_VOLUME_ID: u8 = 0x08;
    pub const ATTR_DIRECTORY: u8 = 0x10;
    pub const ATTR_ARCHIVE: u8 = 0x20;
    pub const ATTR_LONG_NAME: u8 = 0x0F;

    /// Encode `name` as an upper-case 8.3 name field.
    ///
    /// A leading dot belongs to the base name, so `.INIT` becomes `".INIT   "`
    /// with an empty extension.
    #[must_use]
    pub fn short_name(name: &str) -> [u8; 11] {
        let (base, ext) = match name.rfind('.') {
            Some(i) if i > 0 => (&name[..i], &name[i + 1..]),
            _ => (name, ""),
        };
        let mut out = [b' '; 11];
        for (dst, b) in out[..8].iter_mut().zip(base.bytes()) {
            *dst = b.to_ascii_uppercase();
        }
        for (dst, b) in out[8..].iter_mut().zip(ext.bytes()) {
            *dst = b.to_ascii_uppercase();
        }
        out
    }

    #[must_use]
    pub fn file(name: &str, data: &[u8]) -> Self {
        Self {
            name: Self::short_name(name),
            attributes: Self::ATTR_ARCHIVE,
            data: data.to_vec(),
            recorded_size: None,
            deleted: false,
        }
    }

    #[must_use]
    pub fn volume_label(label: &str) -> Self {
        let mut name = [b' '; 11];
        for (dst, b) in name.iter_mut().zip(label.bytes()) {
            *dst = b.to_ascii_uppercase();
        }
        Self {
            name,
            attributes: Self::ATTR_VOLUME_ID,
            ..Self::file("", &[])
        }
    }

    #[must_use]
    pub fn subdirectory(name: &str) -> Self {
        Self {
            attributes: Self::ATTR_DIRECTORY,
            // One zeroed cluster: an empty directory.
            data: vec![0; SECTOR],
            ..Self::file(name, &[])
        }
    }

    #[must_use]
    pub fn deleted(name: &str, data: &[u8]) -> Self {
        Self {
            deleted: true,
            ..Self::file(name, data)
        }
    }

    #[must_use]
    pub const fn with_recorded_size(mut self, size: u32) -> Self {
        self.recorded_size = Some(size);
        self
    }
}

/// Lays out a FAT volume with a populated root directory.
#[derive(Debug, Clone)]
pub struct FatImageBuilder {
    fat_type: FatType,
    total_sectors: u32,
    sectors_per_cluster: u8,
    root_entries: u16,
    hidden_sectors: u32,
    cluster_stride: u32,
    entries: Vec<DirEntrySpec>,
}

struct Layout {
    fat_sectors: u32,
    fat_lba: u32,
    root_lba: u32,
    root_sectors: u32,
    data_lba: u32,
    cluster_count: u32,
}

impl FatImageBuilder {
    #[must_use]
    pub fn new(fat_type: FatType, total_sectors: u32) -> Self {
        Self {
            fat_type,
            total_sectors,
            sectors_per_cluster: 1,
            root_entries: if fat_type == FatType::Fat32 { 0 } else { 512 },
            hidden_sectors: 0,
            cluster_stride: 1,
            entries: Vec::new(),
        }
    }

    pub const fn sectors_per_cluster(&mut self, spc: u8) -> &mut Self {
        self.sectors_per_cluster = spc;
        self
    }

    /// Partition start written to the boot sector.
    pub const fn hidden_sectors(&mut self, lba: u32) -> &mut Self {
        self.hidden_sectors = lba;
        self
    }

    /// Distance between consecutive clusters of one chain.
    pub const fn cluster_stride(&mut self, stride: u32) -> &mut Self {
        self.cluster_stride = stride;
        self
    }

    pub fn entry(&mut self, entry: DirEntrySpec) -> &mut Self {
        self.entries.push(entry);
        self
    }

    pub fn file(&mut self, name: &str, data: &[u8]) -> &mut Self {
        self.entry(DirEntrySpec::file(name, data))
    }

    fn reserved_sectors(&self) -> u32 {
        if self.fat_type == FatType::Fat32 { 32 } else { 1 }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn layout(&self) -> Layout {
        let reserved = self.reserved_sectors();
        let root_sectors = (u32::from(self.root_entries) * 32).div_ceil(SECTOR as u32);
        let spc = u32::from(self.sectors_per_cluster);
        let bits = self.fat_type.entry_bits() as u32;

        let mut fat_sectors = 1;
        loop {
            let data = self.total_sectors - reserved - root_sectors - 2 * fat_sectors;
            let clusters = data / spc;
            let fat_bytes = ((clusters + 2) * bits).div_ceil(8);
            if fat_bytes.div_ceil(SECTOR as u32) <= fat_sectors {
                break;
            }
            fat_sectors += 1;
        }

        let fat_lba = reserved;
        let root_lba = fat_lba + 2 * fat_sectors;
        let data_lba = root_lba + root_sectors;
        Layout {
            fat_sectors,
            fat_lba,
            root_lba,
            root_sectors,
            data_lba,
            cluster_count: (self.total_sectors - data_lba) / spc,
        }
    }

    /// Serialize the volume.
    ///
    /// # Panics
    /// If the contents do not fit the volume or the root directory.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::too_many_lines)]
    pub fn build(&self) -> Vec<u8> {
        let layout = self.layout();
        let spc = usize::from(self.sectors_per_cluster);
        let cluster_bytes = spc * SECTOR;
        let mut img = vec![0u8; self.total_sectors as usize * SECTOR];

        let mut fat = vec![0u32; layout.cluster_count as usize + 2];
        let eoc = self.fat_type.end_of_chain();
        fat[0] = eoc & !0xFF | 0xF8;
        fat[1] = eoc;

        let mut next = 2u32;
        let mut alloc = |img: &mut [u8], fat: &mut [u32], data: &[u8]| -> u32 {
            let clusters = data.len().div_ceil(cluster_bytes);
            if clusters == 0 {
                return 0;
            }
            let chain: Vec<u32> = (0..clusters as u32)
                .map(|i| next + i * self.cluster_stride)
                .collect();
            next += clusters as u32 * self.cluster_stride;
            for (i, &c) in chain.iter().enumerate() {
                assert!(c < layout.cluster_count + 2, "volume full");
                fat[c as usize] = chain.get(i + 1).copied().unwrap_or(eoc);
                let lba = layout.data_lba as usize + (c as usize - 2) * spc;
                let chunk = &data[i * cluster_bytes..data.len().min((i + 1) * cluster_bytes)];
                img[lba * SECTOR..lba * SECTOR + chunk.len()].copy_from_slice(chunk);
            }
            chain[0]
        };

        let mut dir = Vec::with_capacity(self.entries.len() * 32);
        for e in &self.entries {
            let cluster = if e.deleted || e.attributes & DirEntrySpec::ATTR_VOLUME_ID != 0 {
                0
            } else {
                alloc(&mut img, &mut fat, &e.data)
            };
            let mut raw = [0u8; 32];
            raw[..11].copy_from_slice(&e.name);
            if e.deleted {
                raw[0] = 0xE5;
            }
            raw[11] = e.attributes;
            put_u16(&mut raw, 20, (cluster >> 16) as u16);
            put_u16(&mut raw, 24, (1 << 5) | 1);
            put_u16(&mut raw, 26, cluster as u16);
            let size = if e.attributes & DirEntrySpec::ATTR_DIRECTORY != 0 {
                0
            } else {
                e.recorded_size.unwrap_or(e.data.len() as u32)
            };
            put_u32(&mut raw, 28, size);
            dir.extend_from_slice(&raw);
        }

        let root_cluster = if self.fat_type == FatType::Fat32 {
            // The root directory needs at least one cluster even when empty.
            let mut root = dir.clone();
            root.resize(root.len().max(cluster_bytes), 0);
            alloc(&mut img, &mut fat, &root)
        } else {
            assert!(
                dir.len() <= layout.root_sectors as usize * SECTOR,
                "root directory full"
            );
            let start = layout.root_lba as usize * SECTOR;
            img[start..start + dir.len()].copy_from_slice(&dir);
            0
        };

        let fat_bytes = self.encode_fat(&fat, layout.fat_sectors as usize * SECTOR);
        for copy in 0..2 {
            let lba = (layout.fat_lba + copy * layout.fat_sectors) as usize;
            img[lba * SECTOR..lba * SECTOR + fat_bytes.len()].copy_from_slice(&fat_bytes);
        }

        self.write_boot_sector(&mut img, &layout, root_cluster);
        img
    }

    #[allow(clippy::cast_possible_truncation)]
    fn encode_fat(&self, fat: &[u32], len: usize) -> Vec<u8> {
        let mut out = vec![0u8; len];
        for (n, &v) in fat.iter().enumerate() {
            match self.fat_type {
                FatType::Fat12 => {
                    let off = n + n / 2;
                    if n % 2 == 0 {
                        out[off] = v as u8;
                        out[off + 1] = (out[off + 1] & 0xF0) | ((v >> 8) as u8 & 0x0F);
                    } else {
                        out[off] = (out[off] & 0x0F) | ((v << 4) as u8 & 0xF0);
                        out[off + 1] = (v >> 4) as u8;
                    }
                }
                FatType::Fat16 => put_u16(&mut out, n * 2, v as u16),
                FatType::Fat32 => put_u32(&mut out, n * 4, v),
            }
        }
        out
    }

    #[allow(clippy::cast_possible_truncation)]
    fn write_boot_sector(&self, img: &mut [u8], layout: &Layout, root_cluster: u32) {
        let label = self
            .entries
            .iter()
            .find(|e| e.attributes == DirEntrySpec::ATTR_VOLUME_ID)
            .map_or(*b"NO NAME    ", |e| e.name);

        let bs = &mut img[..SECTOR];
        bs[..3].copy_from_slice(&[0xEB, 0x58, 0x90]);
        bs[3..11].copy_from_slice(b"MKINITFS");
        put_u16(bs, 11, SECTOR as u16);
        bs[13] = self.sectors_per_cluster;
        put_u16(bs, 14, self.reserved_sectors() as u16);
        bs[16] = 2;
        put_u16(bs, 17, self.root_entries);
        if self.total_sectors < 0x1_0000 && self.fat_type != FatType::Fat32 {
            put_u16(bs, 19, self.total_sectors as u16);
        } else {
            put_u32(bs, 32, self.total_sectors);
        }
        bs[21] = 0xF8;
        put_u16(bs, 24, 63);
        put_u16(bs, 26, 255);
        put_u32(bs, 28, self.hidden_sectors);

        let ext = if self.fat_type == FatType::Fat32 {
            put_u32(bs, 36, layout.fat_sectors);
            put_u32(bs, 44, root_cluster);
            put_u16(bs, 48, 1);
            put_u16(bs, 50, 6);
            64
        } else {
            put_u16(bs, 22, layout.fat_sectors as u16);
            36
        };
        bs[ext] = 0x80;
        bs[ext + 2] = 0x29;
        put_u32(bs, ext + 3, 0x1234_5678);
        bs[ext + 7..ext + 18].copy_from_slice(&label);
        bs[ext + 18..ext + 26].copy_from_slice(self.fat_type.label());
        bs[510] = 0x55;
        bs[511] = 0xAA;

        if self.fat_type == FatType::Fat32 {
            let boot = img[..SECTOR].to_vec();
            img[6 * SECTOR..7 * SECTOR].copy_from_slice(&boot);
            let info = &mut img[SECTOR..2 * SECTOR];
            put_u32(info, 0, 0x4161_5252);
            put_u32(info, 484, 0x6141_7272);
            put_u32(info, 488, u32::MAX);
            put_u32(info, 492, u32::MAX);
            put_u32(info, 508, 0xAA55_0000);
        }
    }
}
