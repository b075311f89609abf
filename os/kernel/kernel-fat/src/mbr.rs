use kernel_block::Sector;
use le_bytes::{read_u8, read_u32_le};

/// Boot signature at offset 510.
pub const MBR_SIGNATURE: [u8; 2] = [0x55, 0xAA];

const TABLE_OFFSET: usize = 446;
const ENTRY_LEN: usize = 16;

/// Partition type byte, grouped by what the boot scan cares about.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PartitionType {
    Empty,
    Fat12,
    Fat16,
    Fat32,
    Extended,
    Linux,
    Other(u8),
}

impl PartitionType {
    #[must_use]
    pub const fn is_fat(self) -> bool {
        matches!(self, Self::Fat12 | Self::Fat16 | Self::Fat32)
    }
}

impl From<u8> for PartitionType {
    fn from(value: u8) -> Self {
        match value {
            0x00 => Self::Empty,
            0x01 => Self::Fat12,
            0x04 | 0x06 | 0x0E => Self::Fat16,
            0x0B | 0x0C => Self::Fat32,
            0x05 | 0x0F => Self::Extended,
            0x83 => Self::Linux,
            other => Self::Other(other),
        }
    }
}

/// One primary partition slot.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PartitionEntry {
    pub bootable: bool,
    pub kind: PartitionType,
    pub start_lba: u32,
    pub sectors: u32,
}

impl PartitionEntry {
    /// Whether the slot describes a partition at all.
    #[must_use]
    pub fn is_used(&self) -> bool {
        self.kind != PartitionType::Empty && self.sectors != 0
    }

    fn parse(raw: &[u8]) -> Self {
        let field = |off| read_u32_le(raw, off).unwrap_or(0);
        Self {
            bootable: read_u8(raw, 0).is_ok_and(|b| b & 0x80 != 0),
            kind: PartitionType::from(read_u8(raw, 4).unwrap_or(0)),
            start_lba: field(8),
            sectors: field(12),
        }
    }
}

/// The classic four-entry partition table.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct MasterBootRecord {
    pub partitions: [PartitionEntry; 4],
}

impl MasterBootRecord {
    /// Parse sector 0 of a disk; `None` if it carries no boot signature.
    #[must_use]
    pub fn parse(sector: &Sector) -> Option<Self> {
        if sector[510..] != MBR_SIGNATURE {
            return None;
        }
        let table = &sector[TABLE_OFFSET..TABLE_OFFSET + 4 * ENTRY_LEN];
        let mut chunks = table.chunks_exact(ENTRY_LEN).map(PartitionEntry::parse);
        let partitions = core::array::from_fn(|_| {
            chunks.next().unwrap_or(PartitionEntry {
                bootable: false,
                kind: PartitionType::Empty,
                start_lba: 0,
                sectors: 0,
            })
        });
        Some(Self { partitions })
    }

    /// Non-empty partitions with their slot index.
    pub fn used(&self) -> impl Iterator<Item = (usize, &PartitionEntry)> {
        self.partitions.iter().enumerate().filter(|(_, p)| p.is_used())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_block::SECTOR_SIZE;

    fn sector_with(entries: &[(usize, u8, u32, u32)]) -> Sector {
        let mut s = [0u8; SECTOR_SIZE];
        s[510] = 0x55;
        s[511] = 0xAA;
        for &(slot, kind, lba, size) in entries {
            let e = TABLE_OFFSET + slot * ENTRY_LEN;
            s[e + 4] = kind;
            s[e + 8..e + 12].copy_from_slice(&lba.to_le_bytes());
            s[e + 12..e + 16].copy_from_slice(&size.to_le_bytes());
        }
        s
    }

    #[test]
    fn requires_signature() {
        let mut s = sector_with(&[(0, 0x06, 63, 1000)]);
        assert!(MasterBootRecord::parse(&s).is_some());
        s[511] = 0;
        assert!(MasterBootRecord::parse(&s).is_none());
    }

    #[test]
    fn skips_empty_slots() {
        let s = sector_with(&[(1, 0x0C, 2048, 4096), (2, 0x83, 8192, 0), (3, 0x01, 1, 8)]);
        let mbr = MasterBootRecord::parse(&s).unwrap();
        let used: Vec<_> = mbr.used().map(|(i, p)| (i, p.kind, p.start_lba)).collect();
        assert_eq!(
            used,
            [(1, PartitionType::Fat32, 2048), (3, PartitionType::Fat12, 1)]
        );
    }

    #[test]
    fn classifies_type_bytes() {
        assert_eq!(PartitionType::from(0x0E), PartitionType::Fat16);
        assert_eq!(PartitionType::from(0x0F), PartitionType::Extended);
        assert_eq!(PartitionType::from(0x83), PartitionType::Linux);
        assert_eq!(PartitionType::from(0xEE), PartitionType::Other(0xEE));
        assert!(PartitionType::Fat12.is_fat());
        assert!(!PartitionType::Linux.is_fat());
    }
}
