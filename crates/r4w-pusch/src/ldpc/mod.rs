//! # LDPC Channel Coding for UL-SCH
//!
//! Codeblock segmentation, rate (de)matching and LDPC coding as used by the
//! PUSCH decoder. The decoder only talks to the traits defined here:
//!
//! - [`LdpcSegmenterRx`]: splits a codeword's LLRs into rate-matched codeblock views
//! - [`LdpcRateDematcher`]: maps rate-matched LLRs back onto the codeblock,
//!   combining with earlier transmissions
//! - [`LdpcDecoder`]: iterative decoding with optional CRC early stop
//!
//! Software implementations of all three are provided ([`LdpcSegmenter`],
//! [`LdpcSoftRateDematcher`], [`MinSumDecoder`]) together with the transmit
//! side counterparts used for loopback ([`SchEncoder`]).
//!
//! ## Signal Flow
//!
//! ```text
//! TX: TB → CRC → Segment → CB CRC + filler → LDPC encode → Rate match → codeword
//! RX: codeword LLRs → Segment → Rate dematch (+HARQ combine) → LDPC decode → CRC
//! ```
//!
//! The software code is a quasi-cyclic repeat-accumulate construction with the
//! dimensions of the NR base graphs (K = 22Zc or 10Zc systematic bits,
//! N = 66Zc or 50Zc coded bits), so every length and offset computed by the
//! segmenter is the one a hardware NR decoder would see.

pub mod decoder;
pub mod encoder;
pub mod graph;
pub mod rate_matcher;
pub mod sch_encoder;
pub mod segmenter;

pub use decoder::MinSumDecoder;
pub use encoder::LdpcEncoder;
pub use graph::ParityCheckGraph;
pub use rate_matcher::{compute_k0, LdpcRateMatcher, LdpcSoftRateDematcher};
pub use sch_encoder::{SchEncoder, SchEncoderConfig};
pub use segmenter::{
    codeblock_rate_matched_lengths, compute_nof_codeblocks, CodeblockSizing, LdpcSegmenter, TxCodeblock,
};

use serde::{Deserialize, Serialize};

use crate::crc::CrcCalculator;
use crate::error::PuschResult;
use crate::types::{LogLikelihoodRatio, Modulation};

/// LDPC base graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaseGraph {
    /// Large blocks and high code rates
    Bg1,
    /// Small blocks and low code rates
    Bg2,
}

impl BaseGraph {
    /// Base graph for a transport block of `tbs` bits at code rate `target_code_rate`
    /// (TS 38.212 §6.2.2).
    pub fn select(tbs: usize, target_code_rate: f32) -> Self {
        if tbs <= 292 || (tbs <= 3824 && target_code_rate <= 0.67) || target_code_rate <= 0.25 {
            BaseGraph::Bg2
        } else {
            BaseGraph::Bg1
        }
    }

    /// Ratio between codeblock length and message length.
    pub fn inverse_rate(self) -> usize {
        match self {
            BaseGraph::Bg1 => 3,
            BaseGraph::Bg2 => 5,
        }
    }

    /// Maximum codeblock size K_cb.
    pub fn max_codeblock_size(self) -> usize {
        match self {
            BaseGraph::Bg1 => 8448,
            BaseGraph::Bg2 => 3840,
        }
    }

    /// Message columns of the lifted graph (K / Zc).
    pub fn nof_message_columns(self) -> usize {
        match self {
            BaseGraph::Bg1 => 22,
            BaseGraph::Bg2 => 10,
        }
    }

    /// Coded columns of the lifted graph (N / Zc).
    pub fn nof_codeword_columns(self) -> usize {
        match self {
            BaseGraph::Bg1 => 66,
            BaseGraph::Bg2 => 50,
        }
    }

    /// Information columns K_b used to pick the lifting size, given the
    /// transport block size including its CRC.
    pub fn nof_info_columns(self, tb_and_crc_bits: usize) -> usize {
        match self {
            BaseGraph::Bg1 => 22,
            BaseGraph::Bg2 => match tb_and_crc_bits {
                b if b > 640 => 10,
                b if b > 560 => 9,
                b if b > 192 => 8,
                _ => 6,
            },
        }
    }
}

/// All lifting sizes Zc of TS 38.212 Table 5.3.2-1, ascending.
pub const LIFTING_SIZES: [usize; 51] = [
    2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 18, 20, 22, 24, 26, 28, 30, 32, 36, 40, 44, 48, 52,
    56, 60, 64, 72, 80, 88, 96, 104, 112, 120, 128, 144, 160, 176, 192, 208, 224, 240, 256, 288, 320, 352,
    384,
];

/// Smallest lifting size with `kb * Zc >= k_prime`.
pub fn find_lifting_size(kb: usize, k_prime: usize) -> Option<usize> {
    LIFTING_SIZES.iter().copied().find(|&z| kb * z >= k_prime)
}

/// Parameters shared by every codeblock of a transport block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TbCommonMetadata {
    pub base_graph: BaseGraph,
    pub lifting_size: usize,
    pub rv: u8,
    pub modulation: Modulation,
    /// Limited-buffer rate matching bound on the circular buffer, 0 if unlimited.
    pub cb_buffer_limit: usize,
}

/// Parameters of a single codeblock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CbSpecificMetadata {
    /// Codeblock length N before rate matching.
    pub full_length: usize,
    /// Rate-matched length E.
    pub rm_length: usize,
    /// CRC bits inside the message.
    pub nof_crc_bits: usize,
    /// Filler bits at the end of the message.
    pub nof_filler_bits: usize,
    /// Offset of the rate-matched codeblock inside the codeword.
    pub cw_offset: usize,
}

/// Everything needed to rate dematch and decode one codeblock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeblockMetadata {
    pub tb_common: TbCommonMetadata,
    pub cb_specific: CbSpecificMetadata,
}

impl CodeblockMetadata {
    /// Systematic (message) length K.
    pub fn message_length(&self) -> usize {
        self.cb_specific.full_length / self.tb_common.base_graph.inverse_rate()
    }
}

/// Segmentation parameters of one transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmenterConfig {
    pub base_graph: BaseGraph,
    pub rv: u8,
    pub modulation: Modulation,
    /// Limited-buffer reference size in bits, 0 if LBRM is off.
    pub nref: usize,
    pub nof_layers: usize,
    /// Modulated symbols carrying the codeword.
    pub nof_ch_symbols: usize,
}

/// A rate-matched codeblock view into the codeword LLRs.
#[derive(Debug, Clone, Copy)]
pub struct DescribedRxCodeblock<'a> {
    pub llrs: &'a [LogLikelihoodRatio],
    pub metadata: CodeblockMetadata,
}

/// Receive-side codeblock segmentation.
pub trait LdpcSegmenterRx: Send {
    /// Split `llrs` (the whole codeword) for a transport block of `tbs` bits.
    fn segment<'a>(
        &mut self,
        llrs: &'a [LogLikelihoodRatio],
        tbs: usize,
        config: &SegmenterConfig,
    ) -> PuschResult<Vec<DescribedRxCodeblock<'a>>>;
}

/// Rate dematching with soft combining.
pub trait LdpcRateDematcher: Send {
    /// Map `input` (E rate-matched LLRs) onto `output` (N codeblock LLRs).
    ///
    /// With `new_data` the previous content of `output` is discarded,
    /// otherwise the new LLRs are accumulated onto it.
    fn rate_dematch(
        &mut self,
        output: &mut [LogLikelihoodRatio],
        input: &[LogLikelihoodRatio],
        new_data: bool,
        metadata: &CodeblockMetadata,
    );
}

/// LDPC decoding parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LdpcDecoderConfig {
    pub metadata: CodeblockMetadata,
    pub max_iterations: u32,
}

/// Iterative LDPC decoder.
pub trait LdpcDecoder: Send {
    /// Decode `input` (N LLRs) into `output` (K message bits).
    ///
    /// With a CRC, decoding stops as soon as the message (without filler
    /// bits) passes the check and the iteration count is returned; `None`
    /// means the CRC never passed. Without a CRC every iteration runs and
    /// the result is always `None`.
    fn decode(
        &mut self,
        output: &mut [u8],
        input: &[LogLikelihoodRatio],
        crc: Option<&dyn CrcCalculator>,
        config: &LdpcDecoderConfig,
    ) -> Option<u32>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifting_size_selection() {
        assert_eq!(find_lifting_size(8, 336), Some(44));
        assert_eq!(find_lifting_size(22, 8448), Some(384));
        assert_eq!(find_lifting_size(22, 8449), None);
        assert_eq!(find_lifting_size(6, 10), Some(2));
    }

    #[test]
    fn test_base_graph_selection() {
        assert_eq!(BaseGraph::select(292, 0.9), BaseGraph::Bg2);
        assert_eq!(BaseGraph::select(3000, 0.5), BaseGraph::Bg2);
        assert_eq!(BaseGraph::select(3000, 0.8), BaseGraph::Bg1);
        assert_eq!(BaseGraph::select(20_000, 0.2), BaseGraph::Bg2);
        assert_eq!(BaseGraph::select(20_000, 0.5), BaseGraph::Bg1);
    }

    #[test]
    fn test_bg2_info_columns() {
        assert_eq!(BaseGraph::Bg2.nof_info_columns(100), 6);
        assert_eq!(BaseGraph::Bg2.nof_info_columns(336), 8);
        assert_eq!(BaseGraph::Bg2.nof_info_columns(600), 9);
        assert_eq!(BaseGraph::Bg2.nof_info_columns(3840), 10);
        assert_eq!(BaseGraph::Bg1.nof_info_columns(100), 22);
    }

    #[test]
    fn test_message_length() {
        let metadata = CodeblockMetadata {
            tb_common: TbCommonMetadata {
                base_graph: BaseGraph::Bg2,
                lifting_size: 44,
                rv: 0,
                modulation: Modulation::Qpsk,
                cb_buffer_limit: 0,
            },
            cb_specific: CbSpecificMetadata {
                full_length: 2200,
                rm_length: 2100,
                nof_crc_bits: 16,
                nof_filler_bits: 104,
                cw_offset: 0,
            },
        };
        assert_eq!(metadata.message_length(), 440);
    }
}
