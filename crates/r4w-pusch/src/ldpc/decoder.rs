//! Scaled min-sum LDPC decoder
//!
//! Flooding belief propagation over the lifted parity-check graph. Check
//! node messages use the min-sum approximation with a scaling factor; after
//! every iteration the systematic bits are sliced and, when a CRC is
//! supplied, checked so that decoding can stop early.
//!
//! ## Example
//!
//! ```rust
//! use r4w_pusch::crc::{CrcPolynomial, TableCrc};
//! use r4w_pusch::ldpc::{LdpcEncoder, MinSumDecoder, BaseGraph};
//!
//! let mut encoder = LdpcEncoder::new();
//! let message = vec![0u8; 10 * 4];
//! let mut codeword = vec![0u8; 50 * 4];
//! encoder.encode(&mut codeword, &message, BaseGraph::Bg2, 4);
//!
//! let mut decoder = MinSumDecoder::new(0.8);
//! let llrs: Vec<f32> = codeword.iter().map(|&b| if b == 1 { -8.0 } else { 8.0 }).collect();
//! let mut decoded = vec![0u8; message.len()];
//! let crc = TableCrc::new(CrcPolynomial::Crc16);
//! let iterations = decoder.decode_f32(&mut decoded, &llrs, BaseGraph::Bg2, 4, 0, Some(&crc), 10);
//! assert_eq!(iterations, Some(1));
//! ```

use std::collections::HashMap;

use super::graph::ParityCheckGraph;
use super::{BaseGraph, LdpcDecoder, LdpcDecoderConfig};
use crate::crc::CrcCalculator;
use crate::types::LogLikelihoodRatio;

/// Channel LLR given to bits whose value is known (filler bits).
const KNOWN_BIT_LLR: f32 = 1.0e4;

/// Min-sum decoder with reusable message buffers.
#[derive(Debug)]
pub struct MinSumDecoder {
    scaling: f32,
    graphs: HashMap<(BaseGraph, usize), ParityCheckGraph>,
    channel: Vec<f32>,
    posterior: Vec<f32>,
    c2v: Vec<f32>,
    v2c: Vec<f32>,
}

impl Default for MinSumDecoder {
    fn default() -> Self {
        Self::new(0.8)
    }
}

impl MinSumDecoder {
    /// Create a decoder with the given check node scaling factor.
    pub fn new(scaling: f32) -> Self {
        Self {
            scaling,
            graphs: HashMap::new(),
            channel: Vec::new(),
            posterior: Vec::new(),
            c2v: Vec::new(),
            v2c: Vec::new(),
        }
    }

    /// Check node scaling factor.
    pub fn scaling(&self) -> f32 {
        self.scaling
    }

    /// Decode floating point channel LLRs.
    ///
    /// `nof_filler_bits` trailing message bits are excluded from the CRC.
    #[allow(clippy::too_many_arguments)]
    pub fn decode_f32(
        &mut self,
        output: &mut [u8],
        llrs: &[f32],
        base_graph: BaseGraph,
        lifting_size: usize,
        nof_filler_bits: usize,
        crc: Option<&dyn CrcCalculator>,
        max_iterations: u32,
    ) -> Option<u32> {
        let Self {
            scaling,
            graphs,
            channel,
            posterior,
            c2v,
            v2c,
        } = self;
        let graph = graphs
            .entry((base_graph, lifting_size))
            .or_insert_with(|| ParityCheckGraph::new(base_graph, lifting_size));

        let n = graph.nof_vars();
        let k = graph.nof_message_bits();
        channel.clear();
        channel.extend((0..n).map(|v| llrs.get(v).copied().unwrap_or(0.0)));
        posterior.clear();
        posterior.extend_from_slice(channel);
        c2v.clear();
        c2v.resize(graph.nof_edges(), 0.0);
        v2c.clear();
        v2c.resize(graph.nof_edges(), 0.0);

        let out_len = output.len().min(k);
        let nof_significant = out_len.saturating_sub(nof_filler_bits);

        for iteration in 1..=max_iterations.max(1) {
            for c in 0..graph.nof_checks() {
                let edges = graph.check_edges(c);

                let mut min1 = f32::MAX;
                let mut min2 = f32::MAX;
                let mut min_edge = edges.start;
                let mut negative = false;
                for e in edges.clone() {
                    let msg = posterior[graph.edge_var(e)] - c2v[e];
                    v2c[e] = msg;
                    negative ^= msg < 0.0;
                    let magnitude = msg.abs();
                    if magnitude < min1 {
                        min2 = min1;
                        min1 = magnitude;
                        min_edge = e;
                    } else if magnitude < min2 {
                        min2 = magnitude;
                    }
                }

                for e in edges {
                    let magnitude = if e == min_edge { min2 } else { min1 };
                    let sign_negative = negative ^ (v2c[e] < 0.0);
                    let value = *scaling * magnitude;
                    c2v[e] = if sign_negative { -value } else { value };
                }
            }

            posterior.copy_from_slice(channel);
            for c in 0..graph.nof_checks() {
                for e in graph.check_edges(c) {
                    posterior[graph.edge_var(e)] += c2v[e];
                }
            }

            for (bit, &llr) in output[..out_len].iter_mut().zip(posterior.iter()) {
                *bit = u8::from(llr < 0.0);
            }

            if let Some(crc) = crc {
                if crc.calculate_bits(&output[..nof_significant]) == 0 {
                    return Some(iteration);
                }
            }
        }

        None
    }
}

impl LdpcDecoder for MinSumDecoder {
    fn decode(
        &mut self,
        output: &mut [u8],
        input: &[LogLikelihoodRatio],
        crc: Option<&dyn CrcCalculator>,
        config: &LdpcDecoderConfig,
    ) -> Option<u32> {
        let llrs: Vec<f32> = input
            .iter()
            .map(|llr| {
                if llr.is_infinite() {
                    KNOWN_BIT_LLR.copysign(llr.to_f32())
                } else {
                    llr.to_f32()
                }
            })
            .collect();

        let common = &config.metadata.tb_common;
        self.decode_f32(
            output,
            &llrs,
            common.base_graph,
            common.lifting_size,
            config.metadata.cb_specific.nof_filler_bits,
            crc,
            config.max_iterations,
        )
    }
}
