//! Fixed-size bit sets.
//!
//! Joint enables and digital IO travel as packed bitmasks. Bit `n` lives in
//! byte `n / 8` at position `n % 8` (LSB = lowest index).

use crate::consts::{MAX_DIGITAL_BYTES, MAX_JOINT_ENABLE_BYTES};

/// Number of bytes needed to hold `bits` flags.
#[inline]
pub const fn bytes_for_bits(bits: usize) -> usize {
    bits.div_ceil(8)
}

/// Packed bit set backed by `BYTES` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitBank<const BYTES: usize> {
    bytes: [u8; BYTES],
}

/// Joint enable bitmask.
pub type JointEnableBits = BitBank<MAX_JOINT_ENABLE_BYTES>;

/// Digital output or input bitmask.
pub type DigitalBits = BitBank<MAX_DIGITAL_BYTES>;

impl<const BYTES: usize> Default for BitBank<BYTES> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const BYTES: usize> BitBank<BYTES> {
    /// Number of addressable bits.
    pub const CAPACITY: usize = BYTES * 8;

    /// All bits cleared.
    pub const fn new() -> Self {
        Self { bytes: [0; BYTES] }
    }

    /// Build from raw bytes. Missing bytes are zero, extra bytes are ignored.
    pub fn from_bytes(raw: &[u8]) -> Self {
        let mut bank = Self::new();
        let n = raw.len().min(BYTES);
        bank.bytes[..n].copy_from_slice(&raw[..n]);
        bank
    }

    /// Read bit `index`. Out-of-range indices read as `false`.
    #[inline]
    pub fn get(&self, index: usize) -> bool {
        if index >= Self::CAPACITY {
            return false;
        }
        self.bytes[index / 8] & (1 << (index % 8)) != 0
    }

    /// Write bit `index`. Out-of-range indices are ignored.
    #[inline]
    pub fn set(&mut self, index: usize, value: bool) {
        if index >= Self::CAPACITY {
            return;
        }
        let mask = 1u8 << (index % 8);
        if value {
            self.bytes[index / 8] |= mask;
        } else {
            self.bytes[index / 8] &= !mask;
        }
    }

    /// Replace the contents with `flags`, clearing every other bit.
    pub fn pack(&mut self, flags: &[bool]) {
        self.bytes = [0; BYTES];
        for (i, &flag) in flags.iter().take(Self::CAPACITY).enumerate() {
            self.set(i, flag);
        }
    }

    /// Copy the first `out.len()` bits into `out`.
    pub fn unpack(&self, out: &mut [bool]) {
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.get(i);
        }
    }

    pub fn as_bytes(&self) -> &[u8; BYTES] {
        &self.bytes
    }

    pub fn count_set(&self) -> u32 {
        self.bytes.iter().map(|b| b.count_ones()).sum()
    }
}
