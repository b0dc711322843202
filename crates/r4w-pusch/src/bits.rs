//! Bit Packing and Unpacking
//!
//! Transport blocks travel as packed bytes while codeblocks, CRCs and the
//! LDPC chain work on unpacked bits (one bit per byte, value 0 or 1).
//! Both directions use MSB-first order, as the 3GPP bit sequences do.
//!
//! ## Example
//!
//! ```rust
//! use r4w_pusch::bits::{pack_bits, unpack_bytes};
//!
//! let bits = unpack_bytes(&[0b1011_0010]);
//! assert_eq!(bits, vec![1, 0, 1, 1, 0, 0, 1, 0]);
//!
//! let mut packed = [0u8; 1];
//! pack_bits(&mut packed, &bits);
//! assert_eq!(packed, [0b1011_0010]);
//! ```

/// Unpack bytes into a new vector of bits, MSB first.
pub fn unpack_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut bits = vec![0u8; bytes.len() * 8];
    unpack_into(&mut bits, bytes);
    bits
}

/// Unpack bytes into `bits`, MSB first.
///
/// Only `min(bits.len(), 8 * bytes.len())` bits are written.
pub fn unpack_into(bits: &mut [u8], bytes: &[u8]) {
    for (chunk, &byte) in bits.chunks_mut(8).zip(bytes) {
        for (i, bit) in chunk.iter_mut().enumerate() {
            *bit = (byte >> (7 - i)) & 1;
        }
    }
}

/// Pack bits (one per byte, LSB significant) into `bytes`, MSB first.
///
/// A trailing partial byte is zero-padded.
pub fn pack_bits(bytes: &mut [u8], bits: &[u8]) {
    for (byte, chunk) in bytes.iter_mut().zip(bits.chunks(8)) {
        let mut value = 0u8;
        for (i, &bit) in chunk.iter().enumerate() {
            value |= (bit & 1) << (7 - i);
        }
        *byte = value;
    }
}

/// Write the `width` least significant bits of `value` into `bits`, MSB first.
pub fn write_value(bits: &mut [u8], value: u32, width: usize) {
    for (i, bit) in bits.iter_mut().take(width).enumerate() {
        *bit = ((value >> (width - 1 - i)) & 1) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpack_msb_first() {
        assert_eq!(unpack_bytes(&[0x80, 0x01]), vec![1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn test_pack_partial_byte() {
        let mut out = [0xffu8; 2];
        pack_bits(&mut out, &[1, 1, 0, 1, 0, 0, 0, 0, 1, 0, 1]);
        assert_eq!(out, [0b1101_0000, 0b1010_0000]);
    }

    #[test]
    fn test_write_value() {
        let mut bits = [0u8; 6];
        write_value(&mut bits, 0b101101, 6);
        assert_eq!(bits, [1, 0, 1, 1, 0, 1]);
    }
}
