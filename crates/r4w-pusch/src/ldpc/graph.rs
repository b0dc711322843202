//! Quasi-cyclic parity-check graph
//!
//! Lifted parity-check matrix in CSR form. The base matrix has the NR
//! dimensions (`mb = nb - kb` block rows, `nb` = 66 or 50 block columns,
//! `kb` = 22 or 10 message columns) and is split as `H = [A | T]`:
//!
//! ```text
//!        message (kb)      parity (mb)
//!      ┌───────────────┬──────────────────┐
//!      │ 3 circulants  │ I                │
//!      │   per row     │ I I              │
//!      │               │   I I            │
//!      │               │      ...         │
//!      └───────────────┴──────────────────┘
//! ```
//!
//! The staircase `T` makes the code systematically encodable in one pass,
//! parity bit `c` being solved by check row `c`.

use super::BaseGraph;

/// Sparse lifted parity-check matrix.
#[derive(Debug, Clone)]
pub struct ParityCheckGraph {
    base_graph: BaseGraph,
    lifting_size: usize,
    nof_vars: usize,
    nof_message_bits: usize,
    /// Edge range of each check node (`nof_checks + 1` entries).
    check_offsets: Vec<usize>,
    /// Variable node of each edge.
    edge_vars: Vec<usize>,
}

impl ParityCheckGraph {
    /// Lift the base graph `bg` by `lifting_size`.
    pub fn new(base_graph: BaseGraph, lifting_size: usize) -> Self {
        let z = lifting_size;
        let kb = base_graph.nof_message_columns();
        let nb = base_graph.nof_codeword_columns();
        let mb = nb - kb;

        let mut check_offsets = Vec::with_capacity(mb * z + 1);
        let mut edge_vars = Vec::with_capacity(mb * z * 5);
        check_offsets.push(0);

        for i in 0..mb {
            let columns = message_columns(i, kb);
            for r in 0..z {
                for &j in &columns {
                    let shift = circulant_shift(i, j, z);
                    edge_vars.push(j * z + (r + shift) % z);
                }
                if i > 0 {
                    edge_vars.push((kb + i - 1) * z + r);
                }
                edge_vars.push((kb + i) * z + r);
                check_offsets.push(edge_vars.len());
            }
        }

        Self {
            base_graph,
            lifting_size,
            nof_vars: nb * z,
            nof_message_bits: kb * z,
            check_offsets,
            edge_vars,
        }
    }

    pub fn base_graph(&self) -> BaseGraph {
        self.base_graph
    }

    pub fn lifting_size(&self) -> usize {
        self.lifting_size
    }

    /// Codeword length N.
    pub fn nof_vars(&self) -> usize {
        self.nof_vars
    }

    /// Number of parity checks, N - K.
    pub fn nof_checks(&self) -> usize {
        self.check_offsets.len() - 1
    }

    /// Message length K.
    pub fn nof_message_bits(&self) -> usize {
        self.nof_message_bits
    }

    /// Total number of edges.
    pub fn nof_edges(&self) -> usize {
        self.edge_vars.len()
    }

    /// Edge index range of check `c`.
    #[inline]
    pub fn check_edges(&self, c: usize) -> std::ops::Range<usize> {
        self.check_offsets[c]..self.check_offsets[c + 1]
    }

    /// Variable node attached to edge `e`.
    #[inline]
    pub fn edge_var(&self, e: usize) -> usize {
        self.edge_vars[e]
    }

    /// Whether `codeword` satisfies every parity check.
    pub fn is_codeword(&self, codeword: &[u8]) -> bool {
        (0..self.nof_checks()).all(|c| {
            self.check_edges(c)
                .fold(0u8, |acc, e| acc ^ codeword.get(self.edge_vars[e]).copied().unwrap_or(0))
                == 0
        })
    }
}

/// Message block columns connected to block row `i`.
fn message_columns(i: usize, kb: usize) -> Vec<usize> {
    let mut columns = vec![i % kb, (3 * i + 1) % kb, (7 * i + 5) % kb];
    columns.sort_unstable();
    columns.dedup();
    columns
}

fn circulant_shift(i: usize, j: usize, z: usize) -> usize {
    (37 * i + 11 * j + 5) % z
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions() {
        let g = ParityCheckGraph::new(BaseGraph::Bg2, 44);
        assert_eq!(g.nof_vars(), 50 * 44);
        assert_eq!(g.nof_message_bits(), 10 * 44);
        assert_eq!(g.nof_checks(), 40 * 44);

        let g = ParityCheckGraph::new(BaseGraph::Bg1, 8);
        assert_eq!(g.nof_vars(), 66 * 8);
        assert_eq!(g.nof_message_bits(), 22 * 8);
        assert_eq!(g.nof_checks(), 44 * 8);
    }

    #[test]
    fn test_every_variable_is_checked() {
        let g = ParityCheckGraph::new(BaseGraph::Bg2, 12);
        let mut degree = vec![0usize; g.nof_vars()];
        for e in 0..g.nof_edges() {
            degree[g.edge_var(e)] += 1;
        }
        assert!(degree.iter().all(|&d| d > 0));
    }

    #[test]
    fn test_all_zero_is_codeword() {
        let g = ParityCheckGraph::new(BaseGraph::Bg1, 4);
        assert!(g.is_codeword(&vec![0u8; g.nof_vars()]));
        let mut word = vec![0u8; g.nof_vars()];
        word[3] = 1;
        assert!(!g.is_codeword(&word));
    }
}
