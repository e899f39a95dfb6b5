/// Tracks which independently-replicated aspects of an object have
/// changed. Bit `i` covers whatever aspect the object's encoder assigns
/// to it; the replication core only ever moves masks around, it never
/// interprets individual bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiffMask {
    mask: u32,
}

impl DiffMask {
    pub fn empty() -> Self {
        Self { mask: 0 }
    }

    pub fn all() -> Self {
        Self { mask: u32::MAX }
    }

    pub fn from_bits(mask: u32) -> Self {
        Self { mask }
    }

    pub fn bits(&self) -> u32 {
        self.mask
    }

    pub fn bit(&self, index: u8) -> bool {
        debug_assert!(index < 32);
        self.mask & (1 << index) != 0
    }

    pub fn set_bit(&mut self, index: u8) {
        debug_assert!(index < 32);
        self.mask |= 1 << index;
    }

    pub fn is_clear(&self) -> bool {
        self.mask == 0
    }

    pub fn clear(&mut self) {
        self.mask = 0;
    }

    pub fn or(&mut self, other: &DiffMask) {
        self.mask |= other.mask;
    }

    /// Remove from this mask every bit set in `other`.
    pub fn nand(&mut self, other: &DiffMask) {
        self.mask &= !other.mask;
    }
}
