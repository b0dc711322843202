//! Codeblock Segmentation (TS 38.212 §5.2.2, §5.4.2.1)
//!
//! Splits a transport block into LDPC codeblocks and computes the
//! per-codeblock rate-matched lengths.
//!
//! | Quantity | Meaning |
//! |----------|---------|
//! | L        | transport block CRC length (16 or 24) |
//! | B        | TBS + L |
//! | C        | number of codeblocks |
//! | K'       | bits per codeblock (data + CRC) |
//! | Zc       | lifting size, smallest with Kb·Zc ≥ K' |
//! | K, F     | message length and filler bits, F = K − K' |
//! | E_r      | rate-matched length of codeblock r |
//!
//! With a single codeblock the transport block CRC doubles as codeblock CRC.
//! With several codeblocks each one carries its own CRC24B; the last codeblock
//! is zero padded when B + 24C does not split evenly.

use tracing::trace;

use super::{
    find_lifting_size, BaseGraph, CbSpecificMetadata, CodeblockMetadata, DescribedRxCodeblock, LdpcSegmenterRx,
    SegmenterConfig, TbCommonMetadata,
};
use crate::bits::write_value;
use crate::crc::{select_crc, CrcCalculator, CrcPolynomial, CrcSet, LONG_CRC_LENGTH, MAX_BITS_CRC16};
use crate::error::{PuschError, PuschResult};
use crate::types::LogLikelihoodRatio;

/// Number of codeblocks of a transport block of `tbs` bits.
pub fn compute_nof_codeblocks(tbs: usize, base_graph: BaseGraph) -> usize {
    let b = tbs + tb_crc_length(tbs);
    let kcb = base_graph.max_codeblock_size();
    if b <= kcb {
        1
    } else {
        b.div_ceil(kcb - LONG_CRC_LENGTH)
    }
}

fn tb_crc_length(tbs: usize) -> usize {
    if tbs > MAX_BITS_CRC16 {
        LONG_CRC_LENGTH
    } else {
        16
    }
}

/// Rate-matched lengths E_r of `nof_codeblocks` codeblocks sharing `nof_bits`
/// codeword bits over `nof_layers` layers with `qm` bits per symbol.
pub fn codeblock_rate_matched_lengths(
    nof_bits: usize,
    nof_codeblocks: usize,
    nof_layers: usize,
    qm: usize,
) -> Vec<usize> {
    let step = nof_layers * qm;
    if nof_codeblocks == 0 || step == 0 {
        return Vec::new();
    }
    let q = nof_bits / step;
    let c = nof_codeblocks;
    (0..c)
        .map(|r| {
            if r + (q % c) < c {
                step * (q / c)
            } else {
                step * q.div_ceil(c)
            }
        })
        .collect()
}

/// Segmentation parameters shared by every codeblock of a transport block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeblockSizing {
    pub tbs: usize,
    pub base_graph: BaseGraph,
    /// Transport block CRC length L.
    pub nof_tb_crc_bits: usize,
    pub nof_codeblocks: usize,
    /// Data plus CRC bits per codeblock K'.
    pub k_prime: usize,
    /// CRC bits counted inside each codeblock.
    pub nof_cb_crc_bits: usize,
    pub lifting_size: usize,
    /// Message length K.
    pub message_length: usize,
    /// Codeblock length N.
    pub full_length: usize,
}

impl CodeblockSizing {
    pub fn new(tbs: usize, base_graph: BaseGraph) -> PuschResult<Self> {
        if tbs == 0 {
            return Err(PuschError::Segmentation("empty transport block".into()));
        }
        let nof_tb_crc_bits = tb_crc_length(tbs);
        let b = tbs + nof_tb_crc_bits;
        let nof_codeblocks = compute_nof_codeblocks(tbs, base_graph);

        let (k_prime, nof_cb_crc_bits) = if nof_codeblocks == 1 {
            (b, nof_tb_crc_bits)
        } else {
            ((b + nof_codeblocks * LONG_CRC_LENGTH).div_ceil(nof_codeblocks), LONG_CRC_LENGTH)
        };

        let kb = base_graph.nof_info_columns(b);
        let lifting_size = find_lifting_size(kb, k_prime).ok_or_else(|| {
            PuschError::Segmentation(format!("no lifting size fits K' = {} with Kb = {}", k_prime, kb))
        })?;

        Ok(Self {
            tbs,
            base_graph,
            nof_tb_crc_bits,
            nof_codeblocks,
            k_prime,
            nof_cb_crc_bits,
            lifting_size,
            message_length: base_graph.nof_message_columns() * lifting_size,
            full_length: base_graph.nof_codeword_columns() * lifting_size,
        })
    }

    pub fn nof_filler_bits(&self) -> usize {
        self.message_length - self.k_prime
    }

    /// Transport block data bits carried per codeblock (the last one may
    /// carry fewer, the rest being zero padding).
    pub fn data_bits_per_codeblock(&self) -> usize {
        self.k_prime - self.nof_cb_crc_bits
    }

    /// Circular buffer limit for limited-buffer rate matching, 0 when disabled.
    ///
    /// `nref` is TBS_LBRM in bits; R_LBRM = 2/3.
    pub fn cb_buffer_limit(&self, nref: usize) -> usize {
        if nref == 0 {
            0
        } else {
            nref * 3 / (2 * self.nof_codeblocks)
        }
    }

    fn metadata(&self, config: &SegmenterConfig, rm_length: usize, cw_offset: usize) -> CodeblockMetadata {
        CodeblockMetadata {
            tb_common: TbCommonMetadata {
                base_graph: self.base_graph,
                lifting_size: self.lifting_size,
                rv: config.rv,
                modulation: config.modulation,
                cb_buffer_limit: self.cb_buffer_limit(config.nref),
            },
            cb_specific: CbSpecificMetadata {
                full_length: self.full_length,
                rm_length,
                nof_crc_bits: self.nof_cb_crc_bits,
                nof_filler_bits: self.nof_filler_bits(),
                cw_offset,
            },
        }
    }
}

/// A transmit codeblock: K message bits (data, CRC, zero filler).
#[derive(Debug, Clone)]
pub struct TxCodeblock {
    pub message: Vec<u8>,
    pub metadata: CodeblockMetadata,
}

/// Software segmenter for both link directions.
#[derive(Debug, Clone, Default)]
pub struct LdpcSegmenter {
    crcs: CrcSet,
}

impl LdpcSegmenter {
    pub fn new() -> Self {
        Self::default()
    }

    fn layout(&self, tbs: usize, config: &SegmenterConfig) -> PuschResult<(CodeblockSizing, Vec<usize>)> {
        let sizing = CodeblockSizing::new(tbs, config.base_graph)?;
        let qm = config.modulation.bits_per_symbol();
        let nof_bits = config.nof_ch_symbols * qm;
        let lengths = codeblock_rate_matched_lengths(nof_bits, sizing.nof_codeblocks, config.nof_layers, qm);
        if lengths.iter().any(|&e| e == 0) {
            return Err(PuschError::Segmentation(format!(
                "{} codeword bits cannot carry {} codeblocks",
                nof_bits, sizing.nof_codeblocks
            )));
        }
        Ok((sizing, lengths))
    }

    /// Segment transport block bits (one bit per byte) into CRC-protected
    /// codeblocks ready for LDPC encoding.
    pub fn segment_tx(&self, tb_bits: &[u8], config: &SegmenterConfig) -> PuschResult<Vec<TxCodeblock>> {
        let tbs = tb_bits.len();
        let (sizing, lengths) = self.layout(tbs, config)?;

        let tb_crc = self.crcs.get(select_crc(tbs, 1));
        let mut with_crc = Vec::with_capacity(tbs + sizing.nof_tb_crc_bits);
        with_crc.extend_from_slice(tb_bits);
        with_crc.resize(tbs + sizing.nof_tb_crc_bits, 0);
        write_value(&mut with_crc[tbs..], tb_crc.calculate_bits(tb_bits), sizing.nof_tb_crc_bits);

        if sizing.nof_codeblocks == 1 {
            with_crc.resize(sizing.message_length, 0);
            return Ok(vec![TxCodeblock {
                message: with_crc,
                metadata: sizing.metadata(config, lengths[0], 0),
            }]);
        }

        let cb_crc = self.crcs.get(CrcPolynomial::Crc24B);
        let data_bits = sizing.data_bits_per_codeblock();
        let mut codeblocks = Vec::with_capacity(sizing.nof_codeblocks);
        let mut cw_offset = 0;
        for (r, &rm_length) in lengths.iter().enumerate() {
            let start = (r * data_bits).min(with_crc.len());
            let end = (start + data_bits).min(with_crc.len());

            let mut message = vec![0u8; sizing.message_length];
            message[..end - start].copy_from_slice(&with_crc[start..end]);
            let crc = cb_crc.calculate_bits(&message[..data_bits]);
            write_value(&mut message[data_bits..sizing.k_prime], crc, LONG_CRC_LENGTH);

            codeblocks.push(TxCodeblock {
                message,
                metadata: sizing.metadata(config, rm_length, cw_offset),
            });
            cw_offset += rm_length;
        }
        Ok(codeblocks)
    }
}

impl LdpcSegmenterRx for LdpcSegmenter {
    fn segment<'a>(
        &mut self,
        llrs: &'a [LogLikelihoodRatio],
        tbs: usize,
        config: &SegmenterConfig,
    ) -> PuschResult<Vec<DescribedRxCodeblock<'a>>> {
        let (sizing, lengths) = self.layout(tbs, config)?;
        let total: usize = lengths.iter().sum();
        if llrs.len() < total {
            return Err(PuschError::Segmentation(format!(
                "{} soft bits do not cover {} rate-matched bits",
                llrs.len(),
                total
            )));
        }

        trace!(
            tbs,
            nof_codeblocks = sizing.nof_codeblocks,
            lifting_size = sizing.lifting_size,
            "segmented codeword"
        );

        let mut cw_offset = 0;
        Ok(lengths
            .into_iter()
            .map(|rm_length| {
                let cb = DescribedRxCodeblock {
                    llrs: &llrs[cw_offset..cw_offset + rm_length],
                    metadata: sizing.metadata(config, rm_length, cw_offset),
                };
                cw_offset += rm_length;
                cb
            })
            .collect())
    }
}
