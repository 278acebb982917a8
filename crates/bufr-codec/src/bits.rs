//! Position-tracked bit buffer for the data section.

use bitvec::prelude::*;

/// A position-tracked bit-level read/write buffer, most significant bit first.
#[derive(Default)]
pub struct BitBuffer {
    bits: BitVec<u8, Msb0>,
    position: usize,
}

impl BitBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            bits: BitVec::from_slice(bytes),
            position: 0,
        }
    }

    /// Read `n` bits (at most 64) as an unsigned value and advance.
    pub fn read_bits(&mut self, n: usize) -> Option<u64> {
        if n > 64 || self.position + n > self.bits.len() {
            return None;
        }
        let value = self.bits[self.position..self.position + n]
            .iter()
            .by_vals()
            .fold(0u64, |acc, bit| (acc << 1) | u64::from(bit));
        self.position += n;
        Some(value)
    }

    /// Read `n_bits` (a multiple of 8) as bytes and advance.
    pub fn read_bytes(&mut self, n_bits: usize) -> Option<Vec<u8>> {
        if !n_bits.is_multiple_of(8) || self.position + n_bits > self.bits.len() {
            return None;
        }
        (0..n_bits / 8)
            .map(|_| self.read_bits(8).map(|byte| byte as u8))
            .collect()
    }

    /// Append the low `n` bits of `value`.
    pub fn write_bits(&mut self, value: u64, n: usize) {
        for i in (0..n).rev() {
            self.bits.push((value >> i) & 1 == 1);
        }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.bits
            .extend_from_bitslice(BitSlice::<_, Msb0>::from_slice(bytes));
    }

    /// Zero-fill up to the next byte boundary.
    pub fn pad_to_byte(&mut self) {
        while !self.bits.len().is_multiple_of(8) {
            self.bits.push(false);
        }
    }

    pub fn remaining(&self) -> usize {
        self.bits.len().saturating_sub(self.position)
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Bytes written so far, zero padded to a whole byte.
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.pad_to_byte();
        self.bits.into_vec()
    }
}
