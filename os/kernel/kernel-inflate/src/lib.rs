//! # Raw DEFLATE Decoder
//!
//! Decodes RFC 1951 streams (no zlib or gzip wrapper) into a caller-provided
//! buffer without allocating. This is the decoder the initramfs extractor uses
//! for ZIP entries stored with method 8.
//!
//! ## Contract
//!
//! [`inflate`] consumes blocks until the block carrying `BFINAL` ends and
//! returns the number of bytes written. On failure the destination holds
//! whatever was produced up to the failing symbol and the error tells why:
//!
//! | Error | [`InflateStatus`] |
//! |-------|-------------------|
//! | [`InflateError::OutputFull`], [`InflateError::SourceExhausted`] | `BufError` |
//! | everything else | `DataError` |
//!
//! Malformed input never reads outside `src` or writes outside `dest`: a
//! back-reference further back than the bytes already written is rejected,
//! Huffman decoding gives up after 15 bits, and both alphabets are range
//! checked.

#![cfg_attr(not(any(test, doctest)), no_std)]

mod bits;
mod tree;

use bits::BitReader;
use tree::Tree;

/// Coarse classification of an [`inflate`] result.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum InflateStatus {
    Ok,
    /// The stream is malformed.
    DataError,
    /// The destination or the source ran out before the final block ended.
    BufError,
}

/// Why a stream could not be decoded.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum InflateError {
    #[error("reserved block type 3")]
    InvalidBlockType,
    #[error("stored block length does not match its complement")]
    StoredLengthMismatch,
    #[error("too many literal/length or distance codes")]
    TooManyCodes,
    #[error("invalid Huffman code lengths")]
    InvalidCodeLengths,
    #[error("invalid symbol in compressed data")]
    InvalidSymbol,
    #[error("back-reference distance {distance} exceeds the {written} bytes written")]
    DistanceTooFar { distance: usize, written: usize },
    #[error("compressed stream ended before its final block")]
    SourceExhausted,
    #[error("output buffer is full")]
    OutputFull,
}

impl InflateError {
    #[must_use]
    pub const fn status(self) -> InflateStatus {
        match self {
            Self::SourceExhausted | Self::OutputFull => InflateStatus::BufError,
            _ => InflateStatus::DataError,
        }
    }
}

const LENGTH_BITS: [u8; 29] = [
    0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0,
];
const LENGTH_BASE: [u16; 29] = [
    3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31, 35, 43, 51, 59, 67, 83, 99, 115,
    131, 163, 195, 227, 258,
];
const DIST_BITS: [u8; 30] = [
    0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13,
    13,
];
const DIST_BASE: [u16; 30] = [
    1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537,
    2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577,
];

/// Order in which code-length code lengths are transmitted.
const CLC_ORDER: [usize; 19] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

struct Inflater<'s, 'd> {
    bits: BitReader<'s>,
    dest: &'d mut [u8],
    written: usize,
}

/// Decode the raw DEFLATE stream `src` into `dest`.
///
/// # Errors
/// See [`InflateError`]; on error `dest[..n]` holds the partial output.
pub fn inflate(dest: &mut [u8], src: &[u8]) -> Result<usize, InflateError> {
    let mut d = Inflater {
        bits: BitReader::new(src),
        dest,
        written: 0,
    };

    loop {
        let last = d.bits.bits(1) == 1;
        match d.bits.bits(2) {
            0 => d.stored_block()?,
            1 => {
                let (lt, dt) = Tree::fixed();
                d.block_data(&lt, &dt)?;
            }
            2 => {
                let (lt, dt) = d.dynamic_trees()?;
                d.block_data(&lt, &dt)?;
            }
            _ => return Err(InflateError::InvalidBlockType),
        }
        if last {
            break;
        }
    }

    if d.bits.overflowed() {
        return Err(InflateError::SourceExhausted);
    }
    Ok(d.written)
}

impl Inflater<'_, '_> {
    fn decode_symbol(&mut self, t: &Tree) -> Result<u16, InflateError> {
        let mut base = 0usize;
        let mut offs = 0usize;
        for &count in &t.counts[1..] {
            offs = 2 * offs + self.bits.bits(1) as usize;
            let count = usize::from(count);
            if offs < count {
                return t
                    .symbols
                    .get(base + offs)
                    .copied()
                    .ok_or(InflateError::InvalidSymbol);
            }
            base += count;
            offs -= count;
        }
        Err(InflateError::InvalidSymbol)
    }

    fn push(&mut self, byte: u8) -> Result<(), InflateError> {
        let slot = self
            .dest
            .get_mut(self.written)
            .ok_or(InflateError::OutputFull)?;
        *slot = byte;
        self.written += 1;
        Ok(())
    }

    fn stored_block(&mut self) -> Result<(), InflateError> {
        let header = self
            .bits
            .take_aligned(4)
            .ok_or(InflateError::SourceExhausted)?;
        let len = u16::from_le_bytes([header[0], header[1]]);
        let nlen = u16::from_le_bytes([header[2], header[3]]);
        if len != !nlen {
            return Err(InflateError::StoredLengthMismatch);
        }
        let len = usize::from(len);
        let data = self
            .bits
            .take_aligned(len)
            .ok_or(InflateError::SourceExhausted)?;
        let out = self
            .dest
            .get_mut(self.written..self.written + len)
            .ok_or(InflateError::OutputFull)?;
        out.copy_from_slice(data);
        self.written += len;
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn dynamic_trees(&mut self) -> Result<(Tree, Tree), InflateError> {
        let hlit = self.bits.bits_base(5, 257) as usize;
        let hdist = self.bits.bits_base(5, 1) as usize;
        let hclen = self.bits.bits_base(4, 4) as usize;
        if hlit > 286 || hdist > 30 {
            return Err(InflateError::TooManyCodes);
        }

        let mut lengths = [0u8; 288 + 32];
        for &idx in &CLC_ORDER[..hclen] {
            lengths[idx] = self.bits.bits(3) as u8;
        }
        let clt = Tree::build(&lengths[..19])?;
        let Some(clt_max) = clt.max_sym else {
            return Err(InflateError::InvalidCodeLengths);
        };

        let total = hlit + hdist;
        let mut num = 0;
        while num < total {
            let sym = self.decode_symbol(&clt)?;
            if sym > clt_max {
                return Err(InflateError::InvalidSymbol);
            }
            let (value, repeat) = match sym {
                16 => {
                    let prev = *num
                        .checked_sub(1)
                        .and_then(|p| lengths.get(p))
                        .ok_or(InflateError::InvalidCodeLengths)?;
                    (prev, self.bits.bits_base(2, 3))
                }
                17 => (0, self.bits.bits_base(3, 3)),
                18 => (0, self.bits.bits_base(7, 11)),
                len => (len as u8, 1),
            };
            let repeat = repeat as usize;
            if repeat > total - num {
                return Err(InflateError::InvalidCodeLengths);
            }
            lengths[num..num + repeat].fill(value);
            num += repeat;
        }
        if self.bits.overflowed() {
            return Err(InflateError::SourceExhausted);
        }

        if lengths[256] == 0 {
            return Err(InflateError::InvalidCodeLengths);
        }
        let lt = Tree::build(&lengths[..hlit])?;
        let dt = Tree::build(&lengths[hlit..total])?;
        Ok((lt, dt))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn block_data(&mut self, lt: &Tree, dt: &Tree) -> Result<(), InflateError> {
        loop {
            let sym = self.decode_symbol(lt)?;
            if self.bits.overflowed() {
                return Err(InflateError::SourceExhausted);
            }
            if sym < 256 {
                self.push(sym as u8)?;
                continue;
            }
            if sym == 256 {
                return Ok(());
            }

            if lt.max_sym.is_none_or(|m| sym > m) || sym > 285 {
                return Err(InflateError::InvalidSymbol);
            }
            let Some(dt_max) = dt.max_sym else {
                return Err(InflateError::InvalidSymbol);
            };
            let li = usize::from(sym - 257);
            let length = self
                .bits
                .bits_base(u32::from(LENGTH_BITS[li]), u32::from(LENGTH_BASE[li]))
                as usize;

            let dist_sym = self.decode_symbol(dt)?;
            if dist_sym > dt_max || dist_sym > 29 {
                return Err(InflateError::InvalidSymbol);
            }
            let di = usize::from(dist_sym);
            let distance = self
                .bits
                .bits_base(u32::from(DIST_BITS[di]), u32::from(DIST_BASE[di]))
                as usize;
            if distance > self.written {
                return Err(InflateError::DistanceTooFar {
                    distance,
                    written: self.written,
                });
            }
            if self.dest.len() - self.written < length {
                return Err(InflateError::OutputFull);
            }

            // Byte-wise so overlapping references replicate.
            for i in self.written..self.written + length {
                self.dest[i] = self.dest[i - distance];
            }
            self.written += length;
        }
    }
}
