//! # UL-SCH Resource Sizing
//!
//! Splits the resource elements of a PUSCH allocation between UL-SCH data,
//! HARQ-ACK and CSI Part 1 (TS 38.212 §6.3.2.4):
//!
//! ```text
//! Q'_ACK  = min( ⌈(O_ACK + L_ACK)·β_ACK·ΣM_UCI / ΣK_r⌉ , ⌈α·ΣM_UCI(l ≥ l0)⌉ )
//! Q'_CSI1 = min( ⌈(O_CSI1 + L_CSI1)·β_CSI1·ΣM_UCI / ΣK_r⌉ , ⌈α·ΣM_UCI⌉ − Q'_ACK )
//! E_x     = N_L · Q'_x · Q_m
//! G       = N_L · Q_m · N_RE(data) − E_CSI1 − E_ACK
//! ```
//!
//! UCI never occupies DM-RS symbols, and l0 is the first symbol without
//! DM-RS after the first DM-RS symbol. HARQ-ACK of up to two bits punctures
//! the data instead of rate matching around it: REs are reserved as if two
//! bits were sent, CSI Part 1 avoids them, and G is not reduced.

use serde::{Deserialize, Serialize};

use crate::error::PuschResult;
use crate::ldpc::{BaseGraph, CodeblockSizing};
use crate::types::{DmrsType, Modulation, NRE};

/// HARQ-ACK fields up to this size puncture the data.
pub const MAX_PUNCTURED_HARQ_ACK_BITS: usize = 2;

/// Inputs of the UL-SCH sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UlschConfiguration {
    /// Transport block size in bits, 0 without UL-SCH data
    pub tbs: usize,
    pub modulation: Modulation,
    pub target_code_rate: f32,
    pub nof_harq_ack_bits: usize,
    pub nof_csi_part1_bits: usize,
    pub nof_csi_part2_bits: usize,
    pub alpha_scaling: f32,
    pub beta_offset_harq_ack: f32,
    pub beta_offset_csi_part1: f32,
    pub beta_offset_csi_part2: f32,
    pub nof_rb: usize,
    pub start_symbol_index: usize,
    pub nof_symbols: usize,
    pub dmrs_type: DmrsType,
    pub dmrs_symbol_mask: Vec<bool>,
    pub nof_cdm_groups_without_data: usize,
    pub nof_layers: usize,
}

/// Resource split of a PUSCH transmission, in bits unless noted.
#[derive(Debug, Clone, PartialEq)]
pub struct UlschInformation {
    /// Segmentation of the transport block, if any
    pub sch: Option<CodeblockSizing>,
    /// Codeword bits available to UL-SCH data (G)
    pub nof_ul_sch_bits: usize,
    /// Encoded HARQ-ACK bits (E_ACK)
    pub nof_harq_ack_bits: usize,
    /// Reserved HARQ-ACK bits when HARQ-ACK punctures the data
    pub nof_harq_ack_rvd: usize,
    /// Encoded CSI Part 1 bits (E_CSI1)
    pub nof_csi_part1_bits: usize,
    pub nof_csi_part2_bits: usize,
    pub nof_dmrs_symbols: usize,
    /// Resource elements taken by DM-RS and its empty CDM groups
    pub nof_dmrs_re: usize,
}

/// CRC attached to a UCI field of `nof_bits` (TS 38.212 §6.3.1.2.1).
pub fn uci_crc_length(nof_bits: usize) -> usize {
    match nof_bits {
        0..=11 => 0,
        12..=19 => 6,
        _ => 11,
    }
}

/// PUSCH to DM-RS EPRE ratio in dB (TS 38.214 Table 6.2.2-1).
pub fn sch_to_dmrs_ratio_db(nof_cdm_groups_without_data: usize) -> f32 {
    match nof_cdm_groups_without_data {
        0 | 1 => 0.0,
        2 => -3.0,
        _ => -4.77,
    }
}

struct UciResources {
    /// UCI-capable REs over the allocation
    total: usize,
    /// UCI-capable REs from l0 on
    from_l0: usize,
    /// Σ K_r of the UL-SCH codeblocks, 0 without data
    sum_k_r: usize,
}

impl UciResources {
    /// Coded modulation symbols for a UCI field of `nof_bits`, before the α bound.
    fn nof_re(&self, nof_bits: usize, beta_offset: f32, config: &UlschConfiguration) -> usize {
        let payload = (nof_bits + uci_crc_length(nof_bits)) as f64 * f64::from(beta_offset);
        let nof_re = if self.sum_k_r > 0 {
            payload * self.total as f64 / self.sum_k_r as f64
        } else {
            payload / (f64::from(config.target_code_rate) * config.modulation.bits_per_symbol() as f64)
        };
        // Saturates to usize::MAX when the rate is zero; the α bound applies.
        nof_re.ceil() as usize
    }

    fn nof_re_harq_ack(&self, nof_bits: usize, config: &UlschConfiguration) -> usize {
        if nof_bits == 0 {
            return 0;
        }
        let bound = (f64::from(config.alpha_scaling) * self.from_l0 as f64).ceil() as usize;
        self.nof_re(nof_bits, config.beta_offset_harq_ack, config).min(bound)
    }

    fn nof_re_csi_part1(&self, ack_re: usize, config: &UlschConfiguration) -> usize {
        let nof_bits = config.nof_csi_part1_bits;
        if nof_bits == 0 {
            return 0;
        }
        if self.sum_k_r == 0 && config.nof_csi_part2_bits == 0 {
            return self.total.saturating_sub(ack_re);
        }
        let bound = if self.sum_k_r > 0 {
            ((f64::from(config.alpha_scaling) * self.total as f64).ceil() as usize).saturating_sub(ack_re)
        } else {
            self.total.saturating_sub(ack_re)
        };
        self.nof_re(nof_bits, config.beta_offset_csi_part1, config).min(bound)
    }
}

/// Size the UL-SCH, HARQ-ACK and CSI Part 1 fields of a transmission.
pub fn get_ulsch_information(config: &UlschConfiguration) -> PuschResult<UlschInformation> {
    let qm = config.modulation.bits_per_symbol();
    let nof_layers = config.nof_layers;
    let is_dmrs = |symbol: usize| config.dmrs_symbol_mask.get(symbol).copied().unwrap_or(false);
    let symbols = config.start_symbol_index..config.start_symbol_index + config.nof_symbols;

    let dmrs_re_per_prb = (config.nof_cdm_groups_without_data * config.dmrs_type.nof_re_per_cdm_group()).min(NRE);
    let nof_dmrs_symbols = symbols.clone().filter(|&l| is_dmrs(l)).count();
    let nof_data_re: usize = symbols
        .clone()
        .map(|l| {
            if is_dmrs(l) {
                config.nof_rb * (NRE - dmrs_re_per_prb)
            } else {
                config.nof_rb * NRE
            }
        })
        .sum();

    let uci_re = |l: usize| if is_dmrs(l) { 0 } else { config.nof_rb * NRE };
    let first_dmrs = symbols.clone().find(|&l| is_dmrs(l));
    let l0 = first_dmrs
        .and_then(|d| (d + 1..symbols.end).find(|&l| !is_dmrs(l)))
        .unwrap_or(symbols.start);

    let sch = if config.tbs > 0 {
        let base_graph = BaseGraph::select(config.tbs, config.target_code_rate);
        Some(CodeblockSizing::new(config.tbs, base_graph)?)
    } else {
        None
    };

    let resources = UciResources {
        total: symbols.clone().map(uci_re).sum(),
        from_l0: (l0..symbols.end).map(uci_re).sum(),
        sum_k_r: sch.map_or(0, |s| s.nof_codeblocks * s.k_prime),
    };

    let punctured = config.nof_harq_ack_bits <= MAX_PUNCTURED_HARQ_ACK_BITS;
    let ack_re = resources.nof_re_harq_ack(config.nof_harq_ack_bits, config);
    let ack_rvd_re = if punctured && config.nof_harq_ack_bits > 0 {
        resources.nof_re_harq_ack(MAX_PUNCTURED_HARQ_ACK_BITS, config)
    } else {
        0
    };
    let csi1_re = resources.nof_re_csi_part1(if punctured { ack_rvd_re } else { ack_re }, config);

    let to_bits = |nof_re: usize| nof_layers * nof_re * qm;
    let nof_harq_ack_bits = to_bits(ack_re);
    let nof_csi_part1_bits = to_bits(csi1_re);
    let nof_ul_sch_bits = if sch.is_some() {
        let uci_bits = nof_csi_part1_bits + if punctured { 0 } else { nof_harq_ack_bits };
        to_bits(nof_data_re).saturating_sub(uci_bits)
    } else {
        0
    };

    Ok(UlschInformation {
        sch,
        nof_ul_sch_bits,
        nof_harq_ack_bits,
        nof_harq_ack_rvd: to_bits(ack_rvd_re),
        nof_csi_part1_bits,
        nof_csi_part2_bits: 0,
        nof_dmrs_symbols,
        nof_dmrs_re: nof_dmrs_symbols * config.nof_rb * dmrs_re_per_prb,
    })
}
