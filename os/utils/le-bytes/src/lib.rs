//! # Checked little-endian field access
//!
//! Every on-disk format the boot pipeline touches (ZIP records, FAT boot
//! sectors and directory entries, MBR partition tables) stores its integers in
//! little-endian order at fixed offsets inside untrusted buffers. All of those
//! reads go through the helpers in this crate, which never index out of bounds
//! and never overflow while computing an end offset.
//!
//! ```text
//! buf:  [ .. | b0 b1 b2 b3 | .. ]
//!             ^off        ^off + 4 (checked)
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

/// A field read that would reach past the end of its buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
#[error("read of {width} bytes at offset {offset} exceeds buffer of {len} bytes")]
pub struct OutOfBounds {
    /// Offset of the requested field.
    pub offset: usize,
    /// Width of the requested field in bytes.
    pub width: usize,
    /// Length of the buffer that was read from.
    pub len: usize,
}

/// Borrow `N` bytes starting at `off`.
///
/// # Errors
/// Returns [`OutOfBounds`] if `off + N` overflows or exceeds `buf.len()`.
#[inline]
pub fn read_array<const N: usize>(buf: &[u8], off: usize) -> Result<[u8; N], OutOfBounds> {
    let err = OutOfBounds {
        offset: off,
        width: N,
        len: buf.len(),
    };
    let end = off.checked_add(N).ok_or(err)?;
    let s = buf.get(off..end).ok_or(err)?;
    s.try_into().map_err(|_| err)
}

/// Read a single byte at `off`.
///
/// # Errors
/// Returns [`OutOfBounds`] if `off` is not inside `buf`.
#[inline]
pub fn read_u8(buf: &[u8], off: usize) -> Result<u8, OutOfBounds> {
    read_array::<1>(buf, off).map(|[b]| b)
}

/// Read a little-endian `u16` at `off`.
///
/// # Errors
/// Returns [`OutOfBounds`] if the two bytes are not inside `buf`.
#[inline]
pub fn read_u16_le(buf: &[u8], off: usize) -> Result<u16, OutOfBounds> {
    read_array(buf, off).map(u16::from_le_bytes)
}

/// Read a little-endian `u32` at `off`.
///
/// # Errors
/// Returns [`OutOfBounds`] if the four bytes are not inside `buf`.
#[inline]
pub fn read_u32_le(buf: &[u8], off: usize) -> Result<u32, OutOfBounds> {
    read_array(buf, off).map(u32::from_le_bytes)
}

/// Borrow `len` bytes starting at `off`.
///
/// # Errors
/// Returns [`OutOfBounds`] if the range overflows or is not inside `buf`.
#[inline]
pub fn slice_at(buf: &[u8], off: usize, len: usize) -> Result<&[u8], OutOfBounds> {
    let err = OutOfBounds {
        offset: off,
        width: len,
        len: buf.len(),
    };
    let end = off.checked_add(len).ok_or(err)?;
    buf.get(off..end).ok_or(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian() {
        let buf = [0x50, 0x4B, 0x05, 0x06, 0xAA];
        assert_eq!(read_u8(&buf, 4), Ok(0xAA));
        assert_eq!(read_u16_le(&buf, 0), Ok(0x4B50));
        assert_eq!(read_u32_le(&buf, 0), Ok(0x0605_4B50));
    }

    #[test]
    fn rejects_reads_past_the_end() {
        let buf = [0u8; 4];
        assert_eq!(
            read_u32_le(&buf, 1),
            Err(OutOfBounds {
                offset: 1,
                width: 4,
                len: 4
            })
        );
        assert!(read_u16_le(&buf, 3).is_err());
        assert!(read_u8(&buf, 4).is_err());
    }

    #[test]
    fn offset_overflow_is_an_error() {
        let buf = [0u8; 8];
        assert!(read_u32_le(&buf, usize::MAX - 1).is_err());
        assert!(slice_at(&buf, 4, usize::MAX).is_err());
    }

    #[test]
    fn slices_exact_ranges() {
        let buf = *b"hello world";
        assert_eq!(slice_at(&buf, 6, 5), Ok(&b"world"[..]));
        assert_eq!(slice_at(&buf, 11, 0), Ok(&b""[..]));
        assert!(slice_at(&buf, 6, 6).is_err());
    }
}
