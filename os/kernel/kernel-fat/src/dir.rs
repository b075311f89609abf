use bitfield_struct::bitfield;
use le_bytes::{read_array, read_u16_le, read_u32_le};

/// Size of one short directory entry.
pub const DIR_ENTRY_LEN: usize = 32;

const END_OF_DIRECTORY: u8 = 0x00;
const DELETED: u8 = 0xE5;

/// Attribute byte of a directory entry (offset 11).
#[bitfield(u8)]
#[derive(PartialEq, Eq)]
pub struct FatAttributes {
    pub read_only: bool,
    pub hidden: bool,
    pub system: bool,
    /// Volume label, and part of every long-name entry.
    pub volume_id: bool,
    pub directory: bool,
    pub archive: bool,
    #[bits(2)]
    __: u8,
}

/// A regular file entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Space-padded 8.3 name, no dot stored.
    pub name: [u8; 11],
    pub attributes: FatAttributes,
    pub first_cluster: u32,
    /// Recorded file size in bytes.
    pub size: u32,
}

/// Outcome of looking at one 32-byte slot.
pub(crate) enum Slot {
    End,
    Skip,
    File(DirEntry),
}

impl DirEntry {
    /// Classify one raw slot. `wide_clusters` keeps the high cluster half (FAT32).
    pub(crate) fn parse(raw: &[u8], wide_clusters: bool) -> Result<Slot, le_bytes::OutOfBounds> {
        let name: [u8; 11] = read_array(raw, 0)?;
        match name[0] {
            END_OF_DIRECTORY => return Ok(Slot::End),
            DELETED => return Ok(Slot::Skip),
            _ => {}
        }
        let attributes = FatAttributes::from_bits(raw.get(11).copied().unwrap_or(0));
        if attributes.volume_id() || attributes.directory() {
            return Ok(Slot::Skip);
        }

        let hi = u32::from(read_u16_le(raw, 20)?);
        let lo = u32::from(read_u16_le(raw, 26)?);
        let first_cluster = if wide_clusters { (hi << 16) | lo } else { lo };
        Ok(Slot::File(Self {
            name,
            attributes,
            first_cluster,
            size: read_u32_le(raw, 28)?,
        }))
    }
}

/// Whether the 8.3 base name of `name` is `target` or `.` followed by `target`.
///
/// Comparison ignores ASCII case; the extension is not looked at.
#[must_use]
pub fn matches_basename(name: &[u8; 11], target: &str) -> bool {
    let base = &name[..8];
    let target = target.as_bytes();
    padded_eq(base, target) || (base.first() == Some(&b'.') && padded_eq(&base[1..], target))
}

fn padded_eq(field: &[u8], target: &[u8]) -> bool {
    if target.is_empty() || target.len() > field.len() {
        return false;
    }
    let (head, tail) = field.split_at(target.len());
    head.eq_ignore_ascii_case(target) && tail.iter().all(|&b| b == b' ')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_plain_and_dotted_names() {
        assert!(matches_basename(b"INIT       ", "INIT"));
        assert!(matches_basename(b"init    SH ", "INIT"));
        assert!(matches_basename(b".INIT   TXT", "init"));
        assert!(!matches_basename(b"INITRD     ", "INIT"));
        assert!(!matches_basename(b"XINIT      ", "INIT"));
        assert!(!matches_basename(b"..INIT     ", "INIT"));
        assert!(!matches_basename(b"INIT       ", ""));
    }

    #[test]
    fn classifies_slots() {
        let mut raw = [0u8; DIR_ENTRY_LEN];
        assert!(matches!(DirEntry::parse(&raw, false), Ok(Slot::End)));

        raw[..11].copy_from_slice(b"INIT       ");
        raw[11] = 0x20;
        raw[20..22].copy_from_slice(&1u16.to_le_bytes());
        raw[26..28].copy_from_slice(&5u16.to_le_bytes());
        raw[28..32].copy_from_slice(&77u32.to_le_bytes());
        let Ok(Slot::File(narrow)) = DirEntry::parse(&raw, false) else {
            panic!("expected a file");
        };
        assert_eq!(narrow.first_cluster, 5);
        assert_eq!(narrow.size, 77);
        assert!(narrow.attributes.archive());
        let Ok(Slot::File(wide)) = DirEntry::parse(&raw, true) else {
            panic!("expected a file");
        };
        assert_eq!(wide.first_cluster, 0x1_0005);

        raw[11] = 0x0F;
        assert!(matches!(DirEntry::parse(&raw, false), Ok(Slot::Skip)));
        raw[11] = 0x10;
        assert!(matches!(DirEntry::parse(&raw, false), Ok(Slot::Skip)));
        raw[11] = 0x20;
        raw[0] = 0xE5;
        assert!(matches!(DirEntry::parse(&raw, false), Ok(Slot::Skip)));
    }
}
