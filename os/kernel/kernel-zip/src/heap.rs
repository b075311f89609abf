use crate::ZipError;

/// Bump allocator over a caller-provided arena.
///
/// Blocks are handed out for the arena's lifetime and never freed. Each block
/// advances the arena by its size rounded up to four bytes.
pub struct DecompressionHeap<'a> {
    free: &'a mut [u8],
    used: usize,
}

impl<'a> DecompressionHeap<'a> {
    pub const fn new(arena: &'a mut [u8]) -> Self {
        Self {
            free: arena,
            used: 0,
        }
    }

    /// Bytes handed out so far, including alignment padding.
    #[must_use]
    pub const fn used(&self) -> usize {
        self.used
    }

    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.free.len()
    }

    /// Take the next `size` bytes of the arena.
    pub fn alloc(&mut self, size: usize) -> Option<&'a mut [u8]> {
        if size > self.free.len() {
            return None;
        }
        let step = size.next_multiple_of(4).min(self.free.len());
        let (block, rest) = core::mem::take(&mut self.free).split_at_mut(step);
        self.free = rest;
        self.used += step;
        Some(&mut block[..size])
    }

    /// Let `decode` write up to `capacity` bytes at the head of the arena and
    /// keep only what it reports as written.
    ///
    /// Nothing is consumed when `decode` fails.
    ///
    /// # Errors
    /// [`ZipError::HeapExhausted`] if `capacity` does not fit, or the error of `decode`.
    pub fn fill<F>(&mut self, capacity: usize, decode: F) -> Result<&'a [u8], ZipError>
    where
        F: FnOnce(&mut [u8]) -> Result<usize, ZipError>,
    {
        let available = self.free.len();
        let head = self.free.get_mut(..capacity).ok_or(ZipError::HeapExhausted {
            requested: capacity,
            available,
        })?;
        let written = decode(head)?.min(capacity);
        let block = self.alloc(written).ok_or(ZipError::HeapExhausted {
            requested: written,
            available,
        })?;
        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocations_are_padded_to_four_bytes() {
        let mut arena = [0u8; 16];
        let mut heap = DecompressionHeap::new(&mut arena);

        let a = heap.alloc(3).unwrap();
        a.copy_from_slice(b"abc");
        assert_eq!(heap.used(), 4);
        let b = heap.alloc(8).unwrap();
        assert_eq!(b.len(), 8);
        assert_eq!(heap.used(), 12);
        assert_eq!(heap.remaining(), 4);
        assert!(heap.alloc(5).is_none());
        assert_eq!(heap.alloc(4).map(|s| s.len()), Some(4));
        assert_eq!(heap.remaining(), 0);
    }

    #[test]
    fn unaligned_tail_can_still_be_used() {
        let mut arena = [0u8; 6];
        let mut heap = DecompressionHeap::new(&mut arena);
        heap.alloc(1).unwrap();
        assert_eq!(heap.alloc(2).map(|s| s.len()), Some(2));
        assert_eq!(heap.remaining(), 0);
    }

    #[test]
    fn fill_keeps_only_written_bytes() {
        let mut arena = [0u8; 32];
        let mut heap = DecompressionHeap::new(&mut arena);

        let out = heap
            .fill(16, |buf| {
                buf[..5].copy_from_slice(b"hello");
                Ok(5)
            })
            .unwrap();
        assert_eq!(out, b"hello");
        assert_eq!(heap.used(), 8);
    }

    #[test]
    fn failed_fill_consumes_nothing() {
        let mut arena = [0u8; 32];
        let mut heap = DecompressionHeap::new(&mut arena);

        let err = heap.fill(16, |_| Err(ZipError::InvalidName)).unwrap_err();
        assert_eq!(err, ZipError::InvalidName);
        assert_eq!(heap.used(), 0);

        assert_eq!(
            heap.fill(33, |_| Ok(0)).unwrap_err(),
            ZipError::HeapExhausted {
                requested: 33,
                available: 32
            }
        );
    }
}
