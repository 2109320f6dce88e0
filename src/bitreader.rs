//! MSB-first bit-stream cursor over a byte buffer.
//!
//! HAS message bodies are a flat stream of bits, read most-significant-bit
//! first, field after field, with no byte alignment guaranteed between
//! fields. This mirrors the `get_bits` helper of the reference decoder: a
//! cursor tracks how many bits have been consumed so far, and each read
//! advances it.

use crate::error::DecodeError;
use crate::types::BitSlice;
use bitvec::field::BitField;

/// A cursor for sequential MSB-first reads over a byte buffer.
pub struct BitReader<'a> {
    bits: &'a BitSlice,
    pos: usize,
}

impl<'a> BitReader<'a> {
    /// Builds a new reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        BitReader {
            bits: BitSlice::from_slice(data),
            pos: 0,
        }
    }

    /// Number of bits remaining to be read.
    pub fn remaining(&self) -> usize {
        self.bits.len() - self.pos
    }

    /// Reads `num_bits` (at most 64) as an unsigned integer, MSB-first.
    ///
    /// Returns [`DecodeError::BitOverrun`] if fewer than `num_bits` bits
    /// remain.
    pub fn read_u64(&mut self, num_bits: usize) -> Result<u64, DecodeError> {
        assert!(num_bits <= 64 && num_bits > 0);
        if self.remaining() < num_bits {
            return Err(DecodeError::BitOverrun);
        }
        let val = self.bits[self.pos..self.pos + num_bits].load_be::<u64>();
        self.pos += num_bits;
        Ok(val)
    }

    /// Reads `num_bits` (at most 32) as an unsigned integer, MSB-first.
    pub fn read_u32(&mut self, num_bits: usize) -> Result<u32, DecodeError> {
        assert!(num_bits <= 32);
        Ok(self.read_u64(num_bits)? as u32)
    }

    /// Reads `num_bits` (at most 16) as an unsigned integer, MSB-first.
    pub fn read_u16(&mut self, num_bits: usize) -> Result<u16, DecodeError> {
        assert!(num_bits <= 16);
        Ok(self.read_u64(num_bits)? as u16)
    }

    /// Reads `num_bits` (at most 8) as an unsigned integer, MSB-first.
    pub fn read_u8(&mut self, num_bits: usize) -> Result<u8, DecodeError> {
        assert!(num_bits <= 8);
        Ok(self.read_u64(num_bits)? as u8)
    }

    /// Reads a single bit as a `bool`.
    pub fn read_bit(&mut self) -> Result<bool, DecodeError> {
        Ok(self.read_u8(1)? != 0)
    }
}

/// Interprets an unsigned value of `nbits` bits as a two's-complement
/// signed integer.
///
/// # Panics
///
/// Panics if `nbits` is zero, greater than 64, or `val` does not fit in
/// `nbits` bits.
pub fn two_complement(val: u64, nbits: u32) -> i64 {
    assert!(nbits > 0 && nbits <= 64);
    assert!(nbits == 64 || val < (1u64 << nbits));
    if nbits < 64 && (val >> (nbits - 1)) & 1 == 1 {
        val as i64 - (1i64 << nbits)
    } else {
        val as i64
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sequential_reads_cross_byte_boundaries() {
        // 0b1011_0010 0b1100_1111
        let data = [0xb2, 0xcf];
        let mut r = BitReader::new(&data);
        assert_eq!(r.read_u8(4).unwrap(), 0b1011);
        assert_eq!(r.read_u8(4).unwrap(), 0b0010);
        assert_eq!(r.read_u8(8).unwrap(), 0b1100_1111);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn overrun_is_reported() {
        let data = [0xffu8];
        let mut r = BitReader::new(&data);
        assert_eq!(r.read_u16(9), Err(DecodeError::BitOverrun));
    }

    #[test]
    fn two_complement_positive_and_negative() {
        assert_eq!(two_complement(0b0000, 4), 0);
        assert_eq!(two_complement(0b0111, 4), 7);
        assert_eq!(two_complement(0b1000, 4), -8);
        assert_eq!(two_complement(0b1111, 4), -1);
    }

    #[test]
    fn two_complement_13_bit_delta_radial_sentinel_is_not_confused() {
        // 4096 = 0b1_0000000000000 is the "not available" sentinel for a
        // 13-bit delta radial field and is handled separately by callers;
        // this only checks the raw two's complement arithmetic around it.
        assert_eq!(two_complement(4096, 13), -4096);
        assert_eq!(two_complement(4095, 13), 4095);
    }
}
