//! PUSCH transmission descriptor
//!
//! Everything the processor needs to know about one uplink shared channel
//! reception: where it sits in the resource grid, how it is modulated and
//! coded, and which uplink control fields are multiplexed onto it.

use serde::{Deserialize, Serialize};

use crate::ldpc::BaseGraph;
use crate::types::{CyclicPrefix, DmrsType, Modulation};

/// Frequency domain allocation relative to the BWP start.
///
/// Allocations are never interleaved, so VRB and PRB indices coincide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RbAllocation {
    /// Type 1: `nof_rb` contiguous blocks starting at `start`
    Contiguous { start: usize, nof_rb: usize },
    /// Type 0: one flag per BWP resource block
    Bitmap(Vec<bool>),
}

impl RbAllocation {
    pub fn contiguous(start: usize, nof_rb: usize) -> Self {
        RbAllocation::Contiguous { start, nof_rb }
    }

    /// Allocated resource blocks.
    pub fn get_nof_rb(&self) -> usize {
        match self {
            RbAllocation::Contiguous { nof_rb, .. } => *nof_rb,
            RbAllocation::Bitmap(mask) => mask.iter().filter(|&&rb| rb).count(),
        }
    }

    /// Whether the allocation is non-empty and fits a BWP of `bwp_size_rb`.
    pub fn is_bwp_valid(&self, _bwp_start_rb: usize, bwp_size_rb: usize) -> bool {
        match self {
            RbAllocation::Contiguous { start, nof_rb } => *nof_rb > 0 && start + nof_rb <= bwp_size_rb,
            RbAllocation::Bitmap(mask) => {
                let last = mask.iter().rposition(|&rb| rb);
                last.map_or(false, |last| last < bwp_size_rb)
            }
        }
    }

    /// Allocated resource blocks relative to point A.
    ///
    /// The mask covers `bwp_start_rb + bwp_size_rb` resource blocks.
    pub fn get_prb_mask(&self, bwp_start_rb: usize, bwp_size_rb: usize) -> Vec<bool> {
        let mut mask = vec![false; bwp_start_rb + bwp_size_rb];
        match self {
            RbAllocation::Contiguous { start, nof_rb } => {
                let begin = (bwp_start_rb + start).min(mask.len());
                let end = (begin + nof_rb).min(mask.len());
                mask[begin..end].iter_mut().for_each(|rb| *rb = true);
            }
            RbAllocation::Bitmap(bits) => {
                for (rb, &used) in mask[bwp_start_rb..].iter_mut().zip(bits) {
                    *rb = used;
                }
            }
        }
        mask
    }
}

/// Codeword parameters, present when the PUSCH carries UL-SCH data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuschCodeword {
    /// Redundancy version (0..=3)
    pub rv: u8,
    pub ldpc_base_graph: BaseGraph,
    /// First transmission of the transport block
    pub new_data: bool,
}

/// Uplink control information multiplexed on the PUSCH.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UciDescription {
    pub nof_harq_ack: usize,
    pub nof_csi_part1: usize,
    pub nof_csi_part2: usize,
    /// Scaling α bounding the resources taken by UCI
    pub alpha_scaling: f32,
    pub beta_offset_harq_ack: f32,
    pub beta_offset_csi_part1: f32,
    pub beta_offset_csi_part2: f32,
}

impl Default for UciDescription {
    fn default() -> Self {
        Self {
            nof_harq_ack: 0,
            nof_csi_part1: 0,
            nof_csi_part2: 0,
            alpha_scaling: 1.0,
            beta_offset_harq_ack: 20.0,
            beta_offset_csi_part1: 6.25,
            beta_offset_csi_part2: 6.25,
        }
    }
}

impl UciDescription {
    pub fn has_uci(&self) -> bool {
        self.nof_harq_ack + self.nof_csi_part1 + self.nof_csi_part2 > 0
    }
}

/// PUSCH reception descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PuschPdu {
    /// Slot counter of the reception
    pub slot: u64,
    pub rnti: u16,
    pub bwp_start_rb: usize,
    pub bwp_size_rb: usize,
    pub cp: CyclicPrefix,
    pub modulation: Modulation,
    /// Target code rate R (0..1)
    pub target_code_rate: f32,
    pub codeword: Option<PuschCodeword>,
    /// Data scrambling identity
    pub n_id: u16,
    pub nof_tx_layers: usize,
    /// Receive antenna ports used for the reception
    pub rx_ports: Vec<u8>,
    /// One flag per slot symbol, set where DM-RS is transmitted
    pub dmrs_symbol_mask: Vec<bool>,
    pub dmrs: DmrsType,
    /// DM-RS scrambling identity
    pub scrambling_id: u16,
    pub n_scid: bool,
    pub nof_cdm_groups_without_data: usize,
    pub freq_alloc: RbAllocation,
    pub start_symbol_index: usize,
    pub nof_symbols: usize,
    /// Transport block size for limited buffer rate matching, 0 if disabled
    pub tbs_lbrm_bytes: usize,
    /// Subcarrier of the direct current, relative to point A
    pub dc_position: Option<usize>,
    pub uci: UciDescription,
}

impl PuschPdu {
    /// Symbols per slot for the descriptor's cyclic prefix.
    pub fn nof_symbols_per_slot(&self) -> usize {
        self.cp.nof_symbols_per_slot()
    }

    /// Indices of the DM-RS symbols.
    pub fn dmrs_symbols(&self) -> impl Iterator<Item = usize> + '_ {
        self.dmrs_symbol_mask
            .iter()
            .enumerate()
            .filter_map(|(i, &dmrs)| dmrs.then_some(i))
    }

    /// Symbol mask from DM-RS symbol indices.
    pub fn dmrs_mask_from_symbols(nof_symbols_per_slot: usize, symbols: &[usize]) -> Vec<bool> {
        let mut mask = vec![false; nof_symbols_per_slot];
        for &s in symbols {
            if let Some(slot) = mask.get_mut(s) {
                *slot = true;
            }
        }
        mask
    }
}
