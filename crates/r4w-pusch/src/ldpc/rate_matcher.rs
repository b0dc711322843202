//! LDPC Rate Matching (TS 38.212 §5.4.2)
//!
//! Circular-buffer bit selection followed by the modulation-order bit
//! interleaver. The transmitter reads `E` bits out of the codeblock's
//! circular buffer starting at the redundancy version offset `k0`, skipping
//! filler bits; the receiver writes LLRs back onto the same positions.
//!
//! ```text
//! circular buffer (Ncb)
//! ┌──────────────┬────────┬───────────────────────────┐
//! │ message bits │ filler │ parity bits               │
//! └──────────────┴────────┴───────────────────────────┘
//!        ▲ k0(rv)  → read E bits, wrapping at Ncb
//! ```
//!
//! On reception with `new_data` the soft buffer is cleared first; on a
//! retransmission the LLRs are accumulated with saturation (chase combining
//! or incremental redundancy depending on the redundancy version).

use super::{BaseGraph, CodeblockMetadata, LdpcRateDematcher};
use crate::types::LogLikelihoodRatio;

/// Starting position k0 of the circular buffer for a redundancy version.
pub fn compute_k0(rv: u8, base_graph: BaseGraph, ncb: usize, lifting_size: usize) -> usize {
    let (numerator, nb) = match (base_graph, rv % 4) {
        (_, 0) => return 0,
        (BaseGraph::Bg1, 1) => (17, 66),
        (BaseGraph::Bg1, 2) => (33, 66),
        (BaseGraph::Bg1, _) => (56, 66),
        (BaseGraph::Bg2, 1) => (13, 50),
        (BaseGraph::Bg2, 2) => (25, 50),
        (BaseGraph::Bg2, _) => (43, 50),
    };
    (numerator * ncb / (nb * lifting_size)) * lifting_size
}

/// Circular buffer length Ncb of a codeblock.
fn circular_buffer_length(metadata: &CodeblockMetadata) -> usize {
    let n = metadata.cb_specific.full_length;
    match metadata.tb_common.cb_buffer_limit {
        0 => n,
        limit => n.min(limit),
    }
}

/// Codeblock positions read by bit selection, in transmission order.
///
/// Yields `rm_length` positions in `[0, Ncb)`, never a filler position.
fn selected_positions(metadata: &CodeblockMetadata) -> impl Iterator<Item = usize> {
    let ncb = circular_buffer_length(metadata);
    let common = &metadata.tb_common;
    let k = metadata.message_length();
    let filler = (k - metadata.cb_specific.nof_filler_bits.min(k))..k;
    let k0 = compute_k0(common.rv, common.base_graph, ncb, common.lifting_size);
    let usable = ncb.saturating_sub(filler.clone().filter(|&p| p < ncb).count());
    let count = if usable == 0 { 0 } else { metadata.cb_specific.rm_length };

    (0..)
        .map(move |j| (k0 + j) % ncb.max(1))
        .filter(move |pos| !filler.contains(pos))
        .take(count)
}

/// Index of rate-matched bit `e` after interleaving with `qm` bits per symbol.
#[inline]
fn interleaved_index(e: usize, rm_length: usize, qm: usize) -> usize {
    let rows = (rm_length / qm).max(1);
    let (i, j) = (e / rows, e % rows);
    i + j * qm
}

/// Transmit-side rate matcher.
#[derive(Debug, Default, Clone)]
pub struct LdpcRateMatcher;

impl LdpcRateMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Select and interleave `rm_length` bits of `codeblock` into `output`.
    pub fn rate_match(&self, output: &mut [u8], codeblock: &[u8], metadata: &CodeblockMetadata) {
        let e_len = metadata.cb_specific.rm_length;
        let qm = metadata.tb_common.modulation.bits_per_symbol();
        for (e, pos) in selected_positions(metadata).enumerate() {
            output[interleaved_index(e, e_len, qm)] = codeblock.get(pos).copied().unwrap_or(0);
        }
    }
}

/// Receive-side rate dematcher with saturating soft combining.
#[derive(Debug, Default, Clone)]
pub struct LdpcSoftRateDematcher;

impl LdpcSoftRateDematcher {
    pub fn new() -> Self {
        Self
    }
}

impl LdpcRateDematcher for LdpcSoftRateDematcher {
    fn rate_dematch(
        &mut self,
        output: &mut [LogLikelihoodRatio],
        input: &[LogLikelihoodRatio],
        new_data: bool,
        metadata: &CodeblockMetadata,
    ) {
        if new_data {
            output.fill(LogLikelihoodRatio::ZERO);
        }

        let e_len = metadata.cb_specific.rm_length.min(input.len());
        let qm = metadata.tb_common.modulation.bits_per_symbol();
        for (e, pos) in selected_positions(metadata).take(e_len).enumerate() {
            let idx = interleaved_index(e, metadata.cb_specific.rm_length, qm);
            if let (Some(slot), Some(&llr)) = (output.get_mut(pos), input.get(idx)) {
                *slot = slot.promotion_sum(llr);
            }
        }

        let k = metadata.message_length().min(output.len());
        let nof_filler = metadata.cb_specific.nof_filler_bits.min(k);
        output[k - nof_filler..k].fill(LogLikelihoodRatio::INFINITY);
    }
}
