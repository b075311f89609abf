/// LSB-first bit reader over the compressed stream.
///
/// Reads past the end of the source yield zero bits and latch `overflow`.
/// Between calls fewer than eight bits stay buffered, so `pos` always sits
/// on the byte boundary following the partially consumed byte.
pub struct BitReader<'a> {
    src: &'a [u8],
    pos: usize,
    tag: u32,
    bitcount: u32,
    overflow: bool,
}

impl<'a> BitReader<'a> {
    pub const fn new(src: &'a [u8]) -> Self {
        Self {
            src,
            pos: 0,
            tag: 0,
            bitcount: 0,
            overflow: false,
        }
    }

    pub const fn overflowed(&self) -> bool {
        self.overflow
    }

    fn refill(&mut self, num: u32) {
        while self.bitcount < num {
            if let Some(&b) = self.src.get(self.pos) {
                self.tag |= u32::from(b) << self.bitcount;
                self.pos += 1;
            } else {
                self.overflow = true;
            }
            self.bitcount += 8;
        }
    }

    /// Read `num` (at most 16) bits.
    pub fn bits(&mut self, num: u32) -> u32 {
        debug_assert!(num <= 16);
        self.refill(num);
        let v = self.tag & ((1u32 << num) - 1);
        self.tag >>= num;
        self.bitcount -= num;
        v
    }

    /// `base` plus `num` extra bits.
    pub fn bits_base(&mut self, num: u32, base: u32) -> u32 {
        if num == 0 { base } else { base + self.bits(num) }
    }

    /// Drop the buffered partial byte and borrow `len` raw bytes.
    pub fn take_aligned(&mut self, len: usize) -> Option<&'a [u8]> {
        self.tag = 0;
        self.bitcount = 0;
        let end = self.pos.checked_add(len)?;
        let s = self.src.get(self.pos..end)?;
        self.pos = end;
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_lsb_first() {
        let mut r = BitReader::new(&[0b1010_0110, 0xFF]);
        assert_eq!(r.bits(1), 0);
        assert_eq!(r.bits(2), 0b11);
        assert_eq!(r.bits(5), 0b10100);
        assert_eq!(r.bits(8), 0xFF);
        assert!(!r.overflowed());
        assert_eq!(r.bits(1), 0);
        assert!(r.overflowed());
    }

    #[test]
    fn aligned_take_skips_partial_byte() {
        let mut r = BitReader::new(&[0x01, 0xAA, 0xBB]);
        assert_eq!(r.bits(3), 1);
        assert_eq!(r.take_aligned(2), Some(&[0xAA, 0xBB][..]));
        assert_eq!(r.take_aligned(1), None);
    }
}
