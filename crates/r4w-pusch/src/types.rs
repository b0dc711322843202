//! Core types for uplink shared channel processing
//!
//! This module defines the fundamental types shared by the PUSCH decoding
//! chain, most importantly the soft bit representation.
//!
//! ## Soft Bits
//!
//! A log-likelihood ratio (LLR) carries both the estimate of a transmitted
//! bit and its reliability:
//!
//! ```text
//!   bit 1 likely        unknown         bit 0 likely
//!   -127 ... -1            0            +1 ... +127
//!    ^                                            ^
//!    known 1 (infinity)            known 0 (infinity)
//! ```
//!
//! LLRs are stored as saturated 8-bit integers so that a softbuffer for a
//! full HARQ process stays small. Values of magnitude [`LLR_INFINITY`] mark
//! bits whose value is known with certainty (e.g. LDPC filler bits).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest finite LLR magnitude.
pub const LLR_MAX: i8 = 120;

/// LLR magnitude reserved for bits with a known value.
pub const LLR_INFINITY: i8 = 127;

/// Soft bit estimate. Positive values favour bit 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LogLikelihoodRatio(i8);

impl LogLikelihoodRatio {
    /// Erasure: no information about the bit.
    pub const ZERO: Self = Self(0);
    /// Bit is known to be 0.
    pub const INFINITY: Self = Self(LLR_INFINITY);
    /// Bit is known to be 1.
    pub const NEG_INFINITY: Self = Self(-LLR_INFINITY);

    /// Create an LLR, clamping finite values to `[-LLR_MAX, LLR_MAX]`.
    pub fn new(value: i8) -> Self {
        if value.unsigned_abs() == LLR_INFINITY as u8 {
            return Self(value);
        }
        Self(value.clamp(-LLR_MAX, LLR_MAX))
    }

    /// Quantise a floating point LLR.
    pub fn from_f32(value: f32) -> Self {
        Self(value.round().clamp(-(LLR_MAX as f32), LLR_MAX as f32) as i8)
    }

    /// Raw value.
    #[inline]
    pub fn value(self) -> i8 {
        self.0
    }

    /// Value as `f32` for the decoder arithmetic.
    #[inline]
    pub fn to_f32(self) -> f32 {
        self.0 as f32
    }

    /// Whether the magnitude marks a known bit.
    #[inline]
    pub fn is_infinite(self) -> bool {
        self.0.unsigned_abs() == LLR_INFINITY as u8
    }

    /// Hard decision: 1 for negative LLRs, 0 otherwise.
    #[inline]
    pub fn hard_decision(self) -> u8 {
        u8::from(self.0 < 0)
    }

    /// Combine two soft estimates of the same bit.
    ///
    /// Finite sums saturate at `±LLR_MAX`. Infinite operands dominate; two
    /// opposite infinities cancel to an erasure.
    pub fn promotion_sum(self, other: Self) -> Self {
        match (self.is_infinite(), other.is_infinite()) {
            (true, true) if self.0 != other.0 => Self::ZERO,
            (true, _) => self,
            (_, true) => other,
            _ => {
                let sum = self.0 as i16 + other.0 as i16;
                Self(sum.clamp(-(LLR_MAX as i16), LLR_MAX as i16) as i8)
            }
        }
    }
}

impl From<i8> for LogLikelihoodRatio {
    fn from(value: i8) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for LogLikelihoodRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Modulation scheme of the shared channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modulation {
    /// π/2-BPSK (transform precoding only)
    Pi2Bpsk,
    /// QPSK
    Qpsk,
    /// 16-QAM
    Qam16,
    /// 64-QAM
    Qam64,
    /// 256-QAM
    Qam256,
}

impl Modulation {
    /// Number of bits carried by one modulated symbol (Qm).
    pub fn bits_per_symbol(self) -> usize {
        match self {
            Modulation::Pi2Bpsk => 1,
            Modulation::Qpsk => 2,
            Modulation::Qam16 => 4,
            Modulation::Qam64 => 6,
            Modulation::Qam256 => 8,
        }
    }
}

impl fmt::Display for Modulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modulation::Pi2Bpsk => write!(f, "pi/2-BPSK"),
            Modulation::Qpsk => write!(f, "QPSK"),
            Modulation::Qam16 => write!(f, "16QAM"),
            Modulation::Qam64 => write!(f, "64QAM"),
            Modulation::Qam256 => write!(f, "256QAM"),
        }
    }
}

/// OFDM cyclic prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CyclicPrefix {
    #[default]
    Normal,
    Extended,
}

impl CyclicPrefix {
    /// OFDM symbols in one slot.
    pub fn nof_symbols_per_slot(self) -> usize {
        match self {
            CyclicPrefix::Normal => 14,
            CyclicPrefix::Extended => 12,
        }
    }
}

/// DM-RS configuration type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DmrsType {
    #[default]
    Type1,
    Type2,
}

impl DmrsType {
    /// Resource elements per PRB occupied by one CDM group.
    pub fn nof_re_per_cdm_group(self) -> usize {
        match self {
            DmrsType::Type1 => 6,
            DmrsType::Type2 => 4,
        }
    }
}

/// Number of subcarriers in a resource block.
pub const NRE: usize = 12;
