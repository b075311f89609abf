use crate::InflateError;

/// Canonical Huffman decoding table: code counts per length plus the symbols
/// sorted by code.
pub struct Tree {
    pub counts: [u16; 16],
    pub symbols: [u16; 288],
    /// Largest symbol with a non-zero code length.
    pub max_sym: Option<u16>,
}

impl Tree {
    pub const fn empty() -> Self {
        Self {
            counts: [0; 16],
            symbols: [0; 288],
            max_sym: None,
        }
    }

    /// The fixed literal/length and distance trees of block type 1.
    pub fn fixed() -> (Self, Self) {
        let mut lt = Self::empty();
        lt.counts[7] = 24;
        lt.counts[8] = 152;
        lt.counts[9] = 112;
        let order = (256..280).chain(0..144).chain(280..288).chain(144..256);
        for (slot, sym) in lt.symbols.iter_mut().zip(order) {
            *slot = sym;
        }
        lt.max_sym = Some(285);

        let mut dt = Self::empty();
        dt.counts[5] = 32;
        for (slot, sym) in dt.symbols.iter_mut().zip(0..32) {
            *slot = sym;
        }
        dt.max_sym = Some(29);
        (lt, dt)
    }

    /// Build a tree from per-symbol code lengths.
    ///
    /// Over-subscribed sets are rejected, as are incomplete ones unless they
    /// hold a single code. A single code is padded to a complete length-1
    /// table whose second slot decodes to an out-of-range symbol.
    pub fn build(lengths: &[u8]) -> Result<Self, InflateError> {
        let mut t = Self::empty();
        for (sym, &len) in lengths.iter().enumerate() {
            if len != 0 {
                t.max_sym = Some(u16::try_from(sym).map_err(|_| InflateError::InvalidCodeLengths)?);
                let slot = t
                    .counts
                    .get_mut(usize::from(len))
                    .ok_or(InflateError::InvalidCodeLengths)?;
                *slot += 1;
            }
        }

        let mut offs = [0u16; 16];
        let mut available: u32 = 1;
        let mut num_codes: u16 = 0;
        for (len, &used) in t.counts.iter().enumerate() {
            let used32 = u32::from(used);
            if used32 > available {
                return Err(InflateError::InvalidCodeLengths);
            }
            available = 2 * (available - used32);
            offs[len] = num_codes;
            num_codes += used;
        }

        if (num_codes > 1 && available > 0) || (num_codes == 1 && t.counts[1] != 1) {
            return Err(InflateError::InvalidCodeLengths);
        }

        for (sym, &len) in lengths.iter().enumerate() {
            if len != 0 {
                let o = &mut offs[usize::from(len)];
                t.symbols[usize::from(*o)] = u16::try_from(sym).map_err(|_| InflateError::InvalidCodeLengths)?;
                *o += 1;
            }
        }

        if num_codes == 1 {
            t.counts[1] = 2;
            t.symbols[1] = t.max_sym.map_or(0, |m| m + 1);
        }
        Ok(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_over_subscribed_lengths() {
        // Three codes of length one cannot exist.
        assert!(matches!(
            Tree::build(&[1, 1, 1]),
            Err(InflateError::InvalidCodeLengths)
        ));
    }

    #[test]
    fn rejects_incomplete_lengths() {
        assert!(matches!(
            Tree::build(&[1, 2, 0]),
            Err(InflateError::InvalidCodeLengths)
        ));
    }

    #[test]
    fn single_code_is_padded() {
        let t = Tree::build(&[0, 0, 1]).unwrap();
        assert_eq!(t.counts[1], 2);
        assert_eq!(t.symbols[0], 2);
        assert_eq!(t.symbols[1], 3);
        assert_eq!(t.max_sym, Some(2));
    }

    #[test]
    fn fixed_tree_orders_short_codes_first() {
        let (lt, dt) = Tree::fixed();
        assert_eq!(lt.symbols[0], 256);
        assert_eq!(lt.symbols[24], 0);
        assert_eq!(lt.symbols[24 + 144], 280);
        assert_eq!(lt.symbols[287], 255);
        assert_eq!(dt.symbols[31], 31);
    }
}
