//! # Receive Softbuffer
//!
//! Per-HARQ-process storage for soft combining. A softbuffer is an arena of
//! codeblock slots indexed by codeblock id; each slot keeps
//!
//! - the combined soft bits of the codeblock (N LLRs),
//! - the last decoded message bits (K bits),
//! - the codeblock CRC state.
//!
//! Storage of a slot keeps its content across decode attempts until the
//! softbuffer is dropped. A change in the number of codeblocks needs a new
//! softbuffer; slots are never added or removed in place.
//!
//! ## Example
//!
//! ```rust
//! use r4w_pusch::softbuffer::RxSoftbuffer;
//! use r4w_pusch::LogLikelihoodRatio;
//!
//! let mut buffer = RxSoftbuffer::new(2);
//! buffer.get_soft_bits(1, 8)[3] = LogLikelihoodRatio::new(-20);
//! assert_eq!(buffer.get_soft_bits(1, 8)[3].value(), -20);
//! assert!(buffer.get_pass_flags().iter().all(|f| !f.is_passed()));
//! ```

use serde::{Deserialize, Serialize};

use crate::types::LogLikelihoodRatio;

/// CRC state of one codeblock.
///
/// `Unknown → Passed` when the codeblock CRC checks within an attempt,
/// `Passed → Unknown` on a fresh transmission or when the transport block
/// CRC proves the pass a false positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CodeblockCrc {
    #[default]
    Unknown,
    Passed,
}

impl CodeblockCrc {
    pub fn is_passed(self) -> bool {
        self == CodeblockCrc::Passed
    }

    /// Record a codeblock CRC pass.
    pub fn mark_passed(&mut self) {
        debug_assert_eq!(*self, CodeblockCrc::Unknown, "codeblock already passed");
        *self = CodeblockCrc::Passed;
    }

    /// Forget a previous pass.
    pub fn reset(&mut self) {
        *self = CodeblockCrc::Unknown;
    }
}

#[derive(Debug, Clone, Default)]
struct CodeblockSlot {
    soft_bits: Vec<LogLikelihoodRatio>,
    message: Vec<u8>,
}

/// Mutable view of one codeblock slot.
#[derive(Debug)]
pub struct CodeblockView<'a> {
    pub soft_bits: &'a mut [LogLikelihoodRatio],
    pub message: &'a mut [u8],
    pub crc: &'a mut CodeblockCrc,
}

/// Soft combining storage of one HARQ process.
#[derive(Debug, Clone)]
pub struct RxSoftbuffer {
    slots: Vec<CodeblockSlot>,
    crc: Vec<CodeblockCrc>,
}

impl RxSoftbuffer {
    /// Create a softbuffer for `nof_codeblocks` codeblocks.
    pub fn new(nof_codeblocks: usize) -> Self {
        Self {
            slots: vec![CodeblockSlot::default(); nof_codeblocks],
            crc: vec![CodeblockCrc::Unknown; nof_codeblocks],
        }
    }

    pub fn get_nof_codeblocks(&self) -> usize {
        self.slots.len()
    }

    /// Soft bits of codeblock `cb_id`, at least `len` long.
    ///
    /// # Panics
    ///
    /// If `cb_id` is not below [`get_nof_codeblocks`](Self::get_nof_codeblocks).
    pub fn get_soft_bits(&mut self, cb_id: usize, len: usize) -> &mut [LogLikelihoodRatio] {
        let soft_bits = &mut self.slots[cb_id].soft_bits;
        if soft_bits.len() < len {
            soft_bits.resize(len, LogLikelihoodRatio::ZERO);
        }
        &mut soft_bits[..len]
    }

    /// Decoded message bits of codeblock `cb_id`, at least `len` long.
    ///
    /// # Panics
    ///
    /// If `cb_id` is out of range.
    pub fn get_message_bits(&mut self, cb_id: usize, len: usize) -> &mut [u8] {
        let message = &mut self.slots[cb_id].message;
        if message.len() < len {
            message.resize(len, 0);
        }
        &mut message[..len]
    }

    pub fn get_pass_flags(&mut self) -> &mut [CodeblockCrc] {
        &mut self.crc
    }

    /// Reset every codeblock CRC state.
    pub fn clear_pass_flags(&mut self) {
        self.crc.iter_mut().for_each(CodeblockCrc::reset);
    }

    /// Soft bits, message bits and CRC state of a codeblock at once.
    pub fn codeblock(&mut self, cb_id: usize, cb_len: usize, msg_len: usize) -> CodeblockView<'_> {
        let slot = &mut self.slots[cb_id];
        if slot.soft_bits.len() < cb_len {
            slot.soft_bits.resize(cb_len, LogLikelihoodRatio::ZERO);
        }
        if slot.message.len() < msg_len {
            slot.message.resize(msg_len, 0);
        }
        CodeblockView {
            soft_bits: &mut slot.soft_bits[..cb_len],
            message: &mut slot.message[..msg_len],
            crc: &mut self.crc[cb_id],
        }
    }
}
