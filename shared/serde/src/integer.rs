use crate::{
    bit_reader::BitReader, bit_writer::BitWrite, error::SerdeErr, serde::ConstBitLength,
    serde::Serde,
};

/// An unsigned integer serialized with a fixed width of `BITS` bits.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct UnsignedInteger<const BITS: u8> {
    value: u64,
}

impl<const BITS: u8> UnsignedInteger<BITS> {
    pub fn new<T: Into<u64>>(value: T) -> Self {
        let value = value.into();
        debug_assert!(BITS > 0 && BITS <= 64);
        debug_assert!(
            BITS == 64 || value < (1u64 << BITS),
            "value {} does not fit in {} bits",
            value,
            BITS
        );
        Self { value }
    }

    pub fn get(&self) -> u64 {
        self.value
    }
}

impl<const BITS: u8> Serde for UnsignedInteger<BITS> {
    fn ser(&self, writer: &mut dyn BitWrite) {
        let mut temp = self.value;
        for _ in 0..BITS {
            writer.write_bit(temp & 1 != 0);
            temp >>= 1;
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let mut value = 0u64;
        for i in 0..BITS {
            if reader.read_bit()? {
                value |= 1u64 << i;
            }
        }
        Ok(Self { value })
    }

    fn bit_length(&self) -> u32 {
        Self::const_bit_length()
    }
}

impl<const BITS: u8> ConstBitLength for UnsignedInteger<BITS> {
    fn const_bit_length() -> u32 {
        BITS as u32
    }
}

/// An unsigned integer serialized in chunks of `BITS` bits, each chunk
/// followed by a continuation bit. Small values stay small on the wire
/// while large values remain representable.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct UnsignedVariableInteger<const BITS: u8> {
    value: u64,
}

impl<const BITS: u8> UnsignedVariableInteger<BITS> {
    pub fn new<T: Into<u64>>(value: T) -> Self {
        debug_assert!(BITS > 0 && BITS < 64);
        Self {
            value: value.into(),
        }
    }

    pub fn get(&self) -> u64 {
        self.value
    }
}

impl<const BITS: u8> Serde for UnsignedVariableInteger<BITS> {
    fn ser(&self, writer: &mut dyn BitWrite) {
        let mut temp = self.value;
        loop {
            let mut chunk = temp;
            for _ in 0..BITS {
                writer.write_bit(chunk & 1 != 0);
                chunk >>= 1;
            }
            temp >>= BITS;
            let more = temp != 0;
            writer.write_bit(more);
            if !more {
                break;
            }
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let mut value = 0u64;
        let mut shift = 0u32;
        loop {
            if shift >= 64 {
                return Err(SerdeErr::ValueOutOfRange);
            }
            let mut chunk = 0u64;
            for i in 0..BITS {
                if reader.read_bit()? {
                    chunk |= 1u64 << i;
                }
            }
            let shifted = (chunk as u128) << shift;
            if shifted > u64::MAX as u128 {
                return Err(SerdeErr::ValueOutOfRange);
            }
            value |= shifted as u64;
            shift += BITS as u32;
            if !reader.read_bit()? {
                break;
            }
        }
        Ok(Self { value })
    }

    fn bit_length(&self) -> u32 {
        let mut length = 0;
        let mut temp = self.value;
        loop {
            length += BITS as u32 + 1;
            temp >>= BITS;
            if temp == 0 {
                break;
            }
        }
        length
    }
}
