use crate::error::SerdeErr;

/// Reads bits back out of a buffer in the order a
/// [`crate::BitWriter`] wrote them.
pub struct BitReader<'b> {
    buffer: &'b [u8],
    byte_index: usize,
    bit_index: u8,
}

impl<'b> BitReader<'b> {
    pub fn new(buffer: &'b [u8]) -> Self {
        Self {
            buffer,
            byte_index: 0,
            bit_index: 0,
        }
    }

    pub fn read_bit(&mut self) -> Result<bool, SerdeErr> {
        if self.byte_index >= self.buffer.len() {
            return Err(SerdeErr::BufferExhausted);
        }
        let bit = (self.buffer[self.byte_index] >> self.bit_index) & 1 != 0;
        self.bit_index += 1;
        if self.bit_index >= 8 {
            self.bit_index = 0;
            self.byte_index += 1;
        }
        Ok(bit)
    }

    pub fn read_byte(&mut self) -> Result<u8, SerdeErr> {
        let mut byte = 0u8;
        for i in 0..8 {
            if self.read_bit()? {
                byte |= 1 << i;
            }
        }
        Ok(byte)
    }

    /// Read `bits` bits, least-significant first, mirroring
    /// [`crate::BitWrite::write_bits`].
    pub fn read_bits(&mut self, bits: u8) -> Result<u32, SerdeErr> {
        debug_assert!(bits <= 32);
        let mut value = 0u32;
        for i in 0..bits {
            if self.read_bit()? {
                value |= 1 << i;
            }
        }
        Ok(value)
    }
}
