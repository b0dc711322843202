//! Systematic LDPC encoder
//!
//! Encodes a K-bit message into an N-bit codeword `[message | parity]` by
//! walking the staircase of the parity-check graph: check row `c` leaves
//! parity bit `K + c` as its only unknown.

use std::collections::HashMap;

use super::graph::ParityCheckGraph;
use super::BaseGraph;

/// LDPC encoder with a per-lifting-size graph cache.
#[derive(Debug, Default)]
pub struct LdpcEncoder {
    graphs: HashMap<(BaseGraph, usize), ParityCheckGraph>,
}

impl LdpcEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode `message` (K bits, filler bits as 0) into `codeword` (N bits).
    ///
    /// Messages shorter than K are zero-extended; only the first N codeword
    /// bits are written.
    pub fn encode(&mut self, codeword: &mut [u8], message: &[u8], base_graph: BaseGraph, lifting_size: usize) {
        let graph = self
            .graphs
            .entry((base_graph, lifting_size))
            .or_insert_with(|| ParityCheckGraph::new(base_graph, lifting_size));

        let k = graph.nof_message_bits();
        let n = graph.nof_vars();
        let mut word = vec![0u8; n];
        let copy_len = message.len().min(k);
        word[..copy_len].copy_from_slice(&message[..copy_len]);

        for c in 0..graph.nof_checks() {
            let parity_idx = k + c;
            let mut sum = 0u8;
            for e in graph.check_edges(c) {
                let v = graph.edge_var(e);
                if v != parity_idx {
                    sum ^= word[v];
                }
            }
            word[parity_idx] = sum;
        }

        let out_len = codeword.len().min(n);
        codeword[..out_len].copy_from_slice(&word[..out_len]);
    }
}
