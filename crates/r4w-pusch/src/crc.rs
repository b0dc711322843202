//! CRC (Cyclic Redundancy Check) Engine for the shared channel
//!
//! Table-driven CRC computation for the 3GPP TS 38.212 §5.1 generator
//! polynomials used by UL-SCH, plus the transport block CRC selection rule.
//!
//! ## Supported Polynomials
//!
//! - CRC16 (0x1021): transport blocks up to 3824 bits
//! - CRC24A (0x864CFB): larger transport blocks
//! - CRC24B (0x800063): codeblocks of a segmented transport block
//!
//! All calculators start from a zero register and apply no output XOR, so the
//! residue of a message followed by its own CRC is zero.
//!
//! ## Example
//!
//! ```rust
//! use r4w_pusch::crc::{CrcCalculator, CrcPolynomial, TableCrc};
//!
//! let crc = TableCrc::new(CrcPolynomial::Crc16);
//! assert_eq!(crc.calculate_bytes(b"123456789"), 0x31C3);
//! ```

use serde::{Deserialize, Serialize};

/// Largest transport block size, in bits, protected by a 16-bit CRC.
pub const MAX_BITS_CRC16: usize = 3824;

/// Length of the long CRC attached to large transport blocks and to codeblocks.
pub const LONG_CRC_LENGTH: usize = 24;

/// CRC generator polynomials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrcPolynomial {
    Crc16,
    Crc24A,
    Crc24B,
}

impl CrcPolynomial {
    /// Number of CRC bits.
    pub fn order(self) -> usize {
        match self {
            CrcPolynomial::Crc16 => 16,
            CrcPolynomial::Crc24A | CrcPolynomial::Crc24B => 24,
        }
    }

    /// Generator without the leading term.
    pub fn generator(self) -> u32 {
        match self {
            CrcPolynomial::Crc16 => 0x1021,
            CrcPolynomial::Crc24A => 0x86_4CFB,
            CrcPolynomial::Crc24B => 0x80_0063,
        }
    }
}

/// Trait for CRC computation.
pub trait CrcCalculator: Send + Sync {
    /// Polynomial implemented by this calculator.
    fn polynomial(&self) -> CrcPolynomial;

    /// CRC of unpacked bits (one bit per byte).
    fn calculate_bits(&self, bits: &[u8]) -> u32;

    /// CRC of packed bytes.
    fn calculate_bytes(&self, bytes: &[u8]) -> u32;
}

/// Byte-wise table CRC.
#[derive(Clone)]
pub struct TableCrc {
    polynomial: CrcPolynomial,
    table: [u32; 256],
    order: usize,
    mask: u32,
}

impl std::fmt::Debug for TableCrc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableCrc")
            .field("polynomial", &self.polynomial)
            .finish()
    }
}

impl TableCrc {
    /// Build the lookup table for `polynomial`.
    pub fn new(polynomial: CrcPolynomial) -> Self {
        let order = polynomial.order();
        let mask = (1u32 << order) - 1;
        let poly = polynomial.generator();
        let top = 1u32 << (order - 1);

        let mut table = [0u32; 256];
        for (i, entry) in table.iter_mut().enumerate() {
            let mut crc = (i as u32) << (order - 8);
            for _ in 0..8 {
                crc = if crc & top != 0 { (crc << 1) ^ poly } else { crc << 1 };
            }
            *entry = crc & mask;
        }

        Self {
            polynomial,
            table,
            order,
            mask,
        }
    }

    #[inline]
    fn update_byte(&self, crc: u32, byte: u8) -> u32 {
        let idx = ((crc >> (self.order - 8)) as u8 ^ byte) as usize;
        ((crc << 8) ^ self.table[idx]) & self.mask
    }

    #[inline]
    fn update_bit(&self, crc: u32, bit: u8) -> u32 {
        let feedback = ((crc >> (self.order - 1)) as u8 ^ bit) & 1;
        let crc = (crc << 1) & self.mask;
        if feedback != 0 {
            crc ^ self.polynomial.generator()
        } else {
            crc
        }
    }
}

impl CrcCalculator for TableCrc {
    fn polynomial(&self) -> CrcPolynomial {
        self.polynomial
    }

    fn calculate_bits(&self, bits: &[u8]) -> u32 {
        let mut chunks = bits.chunks_exact(8);
        let mut crc = 0u32;
        for chunk in &mut chunks {
            let byte = chunk.iter().fold(0u8, |acc, &b| (acc << 1) | (b & 1));
            crc = self.update_byte(crc, byte);
        }
        for &bit in chunks.remainder() {
            crc = self.update_bit(crc, bit);
        }
        crc
    }

    fn calculate_bytes(&self, bytes: &[u8]) -> u32 {
        bytes.iter().fold(0u32, |crc, &b| self.update_byte(crc, b))
    }
}

/// Calculators for every UL-SCH CRC.
#[derive(Debug, Clone)]
pub struct CrcSet {
    pub crc16: TableCrc,
    pub crc24a: TableCrc,
    pub crc24b: TableCrc,
}

impl Default for CrcSet {
    fn default() -> Self {
        Self::new()
    }
}

impl CrcSet {
    /// Build all calculators.
    pub fn new() -> Self {
        Self {
            crc16: TableCrc::new(CrcPolynomial::Crc16),
            crc24a: TableCrc::new(CrcPolynomial::Crc24A),
            crc24b: TableCrc::new(CrcPolynomial::Crc24B),
        }
    }

    /// Calculator for a given polynomial.
    pub fn get(&self, polynomial: CrcPolynomial) -> &TableCrc {
        match polynomial {
            CrcPolynomial::Crc16 => &self.crc16,
            CrcPolynomial::Crc24A => &self.crc24a,
            CrcPolynomial::Crc24B => &self.crc24b,
        }
    }

    /// Calculator for the inner (codeblock) check of a transport block.
    pub fn select(&self, tbs: usize, nof_codeblocks: usize) -> &TableCrc {
        self.get(select_crc(tbs, nof_codeblocks))
    }
}

/// Select the codeblock CRC from the TBS (bits) and number of codeblocks.
///
/// Segmented transport blocks always use CRC24B. A single codeblock carries
/// the transport block CRC: CRC24A above [`MAX_BITS_CRC16`] bits, CRC16 otherwise.
pub fn select_crc(tbs: usize, nof_codeblocks: usize) -> CrcPolynomial {
    if nof_codeblocks > 1 {
        return CrcPolynomial::Crc24B;
    }
    if tbs > MAX_BITS_CRC16 {
        return CrcPolynomial::Crc24A;
    }
    CrcPolynomial::Crc16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::{unpack_bytes, write_value};

    #[test]
    fn test_check_values() {
        let set = CrcSet::new();
        assert_eq!(set.crc16.calculate_bytes(b"123456789"), 0x31C3);
        assert_eq!(set.crc24a.calculate_bytes(b"123456789"), 0xCD_E703);
        assert_eq!(set.crc24b.calculate_bytes(b"123456789"), 0x23_EF52);
    }

    #[test]
    fn test_bits_match_bytes() {
        let crc = TableCrc::new(CrcPolynomial::Crc24A);
        let data = b"uplink shared channel";
        assert_eq!(crc.calculate_bits(&unpack_bytes(data)), crc.calculate_bytes(data));
    }

    #[test]
    fn test_residue_is_zero_with_attached_crc() {
        for poly in [CrcPolynomial::Crc16, CrcPolynomial::Crc24A, CrcPolynomial::Crc24B] {
            let crc = TableCrc::new(poly);
            // Odd length exercises the bitwise tail.
            let mut bits: Vec<u8> = (0..101).map(|i| ((i * 7 + 3) % 5 == 0) as u8).collect();
            let value = crc.calculate_bits(&bits);
            let n = bits.len();
            bits.resize(n + poly.order(), 0);
            write_value(&mut bits[n..], value, poly.order());
            assert_eq!(crc.calculate_bits(&bits), 0, "{:?}", poly);

            bits[17] ^= 1;
            assert_ne!(crc.calculate_bits(&bits), 0, "{:?}", poly);
        }
    }

    #[test]
    fn test_select_crc_boundary() {
        assert_eq!(select_crc(3824, 1), CrcPolynomial::Crc16);
        assert_eq!(select_crc(3825, 1), CrcPolynomial::Crc24A);
        assert_eq!(select_crc(320, 3), CrcPolynomial::Crc24B);
        assert_eq!(select_crc(1_000_000, 2), CrcPolynomial::Crc24B);
    }

    #[test]
    fn test_crc_set_select() {
        let set = CrcSet::new();
        assert_eq!(set.select(320, 1).polynomial(), CrcPolynomial::Crc16);
        assert_eq!(set.select(8000, 1).polynomial(), CrcPolynomial::Crc24A);
        assert_eq!(set.select(8000, 3).polynomial(), CrcPolynomial::Crc24B);
    }
}
