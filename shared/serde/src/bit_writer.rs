pub const MTU_SIZE_BYTES: usize = 508;
pub const MTU_SIZE_BITS: u32 = (MTU_SIZE_BYTES as u32) * 8;

/// Sink for bit-level writes. Implemented both by the real [`BitWriter`]
/// and by [`BitCounter`], which measures instead of writing, so that
/// callers can dry-run a write against the remaining budget first.
pub trait BitWrite {
    fn write_bit(&mut self, bit: bool);
    fn write_byte(&mut self, byte: u8);

    /// Write the low `bits` bits of `value`, least-significant first.
    fn write_bits(&mut self, value: u32, bits: u8) {
        let mut temp = value;
        for _ in 0..bits {
            self.write_bit(temp & 1 != 0);
            temp >>= 1;
        }
    }

    fn count_bits(&mut self, bits: u32);
    fn is_counter(&self) -> bool;
}

/// A fixed-budget bit-packing buffer sized to one outgoing packet.
///
/// The first bit written to a byte lands in that byte's least
/// significant position, so a [`crate::BitReader`] over the produced
/// bytes yields bits back in write order.
pub struct BitWriter {
    scratch: u8,
    scratch_index: u8,
    buffer: [u8; MTU_SIZE_BYTES],
    buffer_index: usize,
    bits_written: u32,
    max_bits: u32,
    reserved_bits: u32,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::with_max_bits(MTU_SIZE_BITS)
    }

    /// A writer with a smaller budget than the MTU. Useful wherever the
    /// caller wants to cap one section of a packet.
    pub fn with_max_bits(max_bits: u32) -> Self {
        debug_assert!(max_bits <= MTU_SIZE_BITS);
        Self {
            scratch: 0,
            scratch_index: 0,
            buffer: [0; MTU_SIZE_BYTES],
            buffer_index: 0,
            bits_written: 0,
            max_bits,
            reserved_bits: 0,
        }
    }

    pub fn bits_written(&self) -> u32 {
        self.bits_written
    }

    pub fn bits_free(&self) -> u32 {
        self.max_bits
            .saturating_sub(self.bits_written + self.reserved_bits)
    }

    /// Set aside budget that a later write (e.g. a section terminator)
    /// is guaranteed to get. Paired with [`Self::release_bits`].
    pub fn reserve_bits(&mut self, bits: u32) {
        self.reserved_bits += bits;
    }

    pub fn release_bits(&mut self, bits: u32) {
        debug_assert!(self.reserved_bits >= bits);
        self.reserved_bits = self.reserved_bits.saturating_sub(bits);
    }

    /// A counter primed with this writer's remaining budget.
    pub fn counter(&self) -> BitCounter {
        BitCounter::new(self.bits_free())
    }

    pub fn to_bytes(mut self) -> Vec<u8> {
        if self.scratch_index > 0 {
            let byte = (self.scratch << (8 - self.scratch_index)).reverse_bits();
            self.buffer[self.buffer_index] = byte;
            self.buffer_index += 1;
        }
        self.buffer[..self.buffer_index].to_vec()
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl BitWrite for BitWriter {
    fn write_bit(&mut self, bit: bool) {
        // callers are expected to have dry-run against a counter first
        assert!(
            self.bits_written < self.max_bits,
            "BitWriter overflow: budget is {} bits",
            self.max_bits
        );

        self.scratch <<= 1;
        if bit {
            self.scratch |= 1;
        }
        self.scratch_index += 1;
        self.bits_written += 1;

        if self.scratch_index >= 8 {
            self.buffer[self.buffer_index] = self.scratch.reverse_bits();
            self.buffer_index += 1;
            self.scratch_index = 0;
            self.scratch = 0;
        }
    }

    fn write_byte(&mut self, byte: u8) {
        let mut temp = byte;
        for _ in 0..8 {
            self.write_bit(temp & 1 != 0);
            temp >>= 1;
        }
    }

    fn count_bits(&mut self, _bits: u32) {
        panic!("BitWriter cannot count bits, use a BitCounter");
    }

    fn is_counter(&self) -> bool {
        false
    }
}

/// Measures a prospective write against a fixed bit budget.
pub struct BitCounter {
    budget: u32,
    counted: u32,
}

impl BitCounter {
    pub fn new(budget: u32) -> Self {
        Self { budget, counted: 0 }
    }

    pub fn overflowed(&self) -> bool {
        self.counted > self.budget
    }

    pub fn bits_needed(&self) -> u32 {
        self.counted
    }
}

impl BitWrite for BitCounter {
    fn write_bit(&mut self, _bit: bool) {
        self.counted += 1;
    }

    fn write_byte(&mut self, _byte: u8) {
        self.counted += 8;
    }

    fn count_bits(&mut self, bits: u32) {
        self.counted += bits;
    }

    fn is_counter(&self) -> bool {
        true
    }
}
