//! Test doubles for the decoder collaborators.
//!
//! The scripted segmenter cuts the codeword into fixed [`ScriptedCodeblock::RM_LENGTH`]
//! slices, the spy decoder writes a scripted message per codeblock and passes
//! or fails its CRC on command, and the dematcher only records its calls.
//! The remaining doubles stand in for the grid, the UCI decoder and the
//! downstream soft bit consumers of the processor.

use std::sync::{Arc, Mutex};

use num_complex::Complex32;

use crate::bits::{unpack_bytes, write_value};
use crate::crc::{CrcCalculator, CrcSet, LONG_CRC_LENGTH};
use crate::error::{PuschError, PuschResult};
use crate::ldpc::{
    BaseGraph, CbSpecificMetadata, CodeblockMetadata, DescribedRxCodeblock, LdpcDecoder, LdpcDecoderConfig,
    LdpcRateDematcher, LdpcSegmenterRx, SegmenterConfig, TbCommonMetadata,
};
use crate::types::{CyclicPrefix, DmrsType, LogLikelihoodRatio, Modulation};

use super::channel_estimate::ResourceGridReader;
use super::decoder::{PuschDecoder, PuschDecoderNotifier, PuschDecoderResult, SoftbitSink};
use super::pdu::{PuschCodeword, PuschPdu, RbAllocation, UciDescription};
use super::uci::{UciDecoder, UciDecoderConfig, UciStatus};

/// Shared script and call log.
#[derive(Debug, Default)]
pub(crate) struct Script {
    /// Message bits written by the decoder, per codeblock.
    pub messages: Vec<Vec<u8>>,
    /// CRC outcome reported by the decoder, per codeblock.
    pub pass: Vec<bool>,
    /// Codeblock ids in decode order.
    pub calls: Vec<usize>,
    /// `new_data` flag of every dematcher call.
    pub dematch_new_data: Vec<bool>,
    /// Codeblock whose rate-matched view is cut short by the segmenter.
    pub short_codeblock: Option<usize>,
}

pub(crate) type SharedScript = Arc<Mutex<Script>>;

/// Geometry of scripted codeblocks.
pub(crate) struct ScriptedCodeblock;

impl ScriptedCodeblock {
    pub const RM_LENGTH: usize = 100;
    pub const ITERATIONS: u32 = 3;

    /// Lifting size, CRC bits and filler bits. A single codeblock carries
    /// a 320-bit transport block, several carry 120 data bits each.
    fn shape(nof_codeblocks: usize) -> (usize, usize, usize) {
        if nof_codeblocks == 1 {
            (40, 16, 64)
        } else {
            (16, LONG_CRC_LENGTH, 16)
        }
    }

    pub fn metadata(nof_codeblocks: usize, cb_id: usize) -> CodeblockMetadata {
        let (lifting_size, nof_crc_bits, nof_filler_bits) = Self::shape(nof_codeblocks);
        let base_graph = BaseGraph::Bg2;
        CodeblockMetadata {
            tb_common: TbCommonMetadata {
                base_graph,
                lifting_size,
                rv: 0,
                modulation: Modulation::Qpsk,
                cb_buffer_limit: 0,
            },
            cb_specific: CbSpecificMetadata {
                full_length: base_graph.nof_codeword_columns() * lifting_size,
                rm_length: Self::RM_LENGTH,
                nof_crc_bits,
                nof_filler_bits,
                cw_offset: cb_id * Self::RM_LENGTH,
            },
        }
    }

    /// Soft bits covering `nof_codeblocks` scripted codeblocks.
    pub fn codeword(nof_codeblocks: usize) -> Vec<LogLikelihoodRatio> {
        (0..nof_codeblocks * Self::RM_LENGTH)
            .map(|i| LogLikelihoodRatio::new(if i % 3 == 0 { -7 } else { 7 }))
            .collect()
    }

    /// Correct codeblock messages for `tb`: the transport block bits (plus
    /// CRC24A when segmented) spread over the codeblocks, zero padded.
    pub fn messages(tb: &[u8], nof_codeblocks: usize) -> Vec<Vec<u8>> {
        let mut bits = unpack_bytes(tb);
        if nof_codeblocks > 1 {
            let crc = CrcSet::new().crc24a.calculate_bits(&bits);
            let tbs = bits.len();
            bits.resize(tbs + LONG_CRC_LENGTH, 0);
            write_value(&mut bits[tbs..], crc, LONG_CRC_LENGTH);
        }

        let metadata = Self::metadata(nof_codeblocks, 0);
        let msg_length = metadata.message_length();
        let data_bits = msg_length - metadata.cb_specific.nof_crc_bits - metadata.cb_specific.nof_filler_bits;
        (0..nof_codeblocks)
            .map(|cb_id| {
                let mut message = vec![0u8; msg_length];
                let start = (cb_id * data_bits).min(bits.len());
                let end = (start + data_bits).min(bits.len());
                message[..end - start].copy_from_slice(&bits[start..end]);
                message
            })
            .collect()
    }
}

pub(crate) struct ScriptedSegmenter {
    nof_codeblocks: usize,
    script: SharedScript,
}

impl LdpcSegmenterRx for ScriptedSegmenter {
    fn segment<'a>(
        &mut self,
        llrs: &'a [LogLikelihoodRatio],
        _tbs: usize,
        _config: &SegmenterConfig,
    ) -> PuschResult<Vec<DescribedRxCodeblock<'a>>> {
        let rm_length = ScriptedCodeblock::RM_LENGTH;
        if llrs.len() < self.nof_codeblocks * rm_length {
            return Err(PuschError::Segmentation("codeword too short".into()));
        }
        let short = self.script.lock().unwrap().short_codeblock;
        Ok((0..self.nof_codeblocks)
            .map(|cb_id| {
                let start = cb_id * rm_length;
                let len = if short == Some(cb_id) { rm_length - 2 } else { rm_length };
                DescribedRxCodeblock {
                    llrs: &llrs[start..start + len],
                    metadata: ScriptedCodeblock::metadata(self.nof_codeblocks, cb_id),
                }
            })
            .collect())
    }
}

pub(crate) struct RecordingDematcher {
    script: SharedScript,
}

impl LdpcRateDematcher for RecordingDematcher {
    fn rate_dematch(
        &mut self,
        _output: &mut [LogLikelihoodRatio],
        _input: &[LogLikelihoodRatio],
        new_data: bool,
        _metadata: &CodeblockMetadata,
    ) {
        self.script.lock().unwrap().dematch_new_data.push(new_data);
    }
}

pub(crate) struct SpyDecoder {
    script: SharedScript,
}

impl LdpcDecoder for SpyDecoder {
    fn decode(
        &mut self,
        output: &mut [u8],
        _input: &[LogLikelihoodRatio],
        crc: Option<&dyn CrcCalculator>,
        config: &LdpcDecoderConfig,
    ) -> Option<u32> {
        let cb_id = config.metadata.cb_specific.cw_offset / ScriptedCodeblock::RM_LENGTH;
        let mut script = self.script.lock().unwrap();
        script.calls.push(cb_id);
        output.copy_from_slice(&script.messages[cb_id]);
        (crc.is_some() && script.pass[cb_id]).then_some(ScriptedCodeblock::ITERATIONS)
    }
}

/// Decoder wired to scripted doubles for `nof_codeblocks` codeblocks of `tb`.
///
/// The script starts with correct messages and every codeblock passing.
pub(crate) fn scripted_decoder(tb: &[u8], nof_codeblocks: usize) -> (PuschDecoder, SharedScript) {
    let script = Arc::new(Mutex::new(Script {
        messages: ScriptedCodeblock::messages(tb, nof_codeblocks),
        pass: vec![true; nof_codeblocks],
        ..Default::default()
    }));
    let decoder = PuschDecoder::new(
        Box::new(ScriptedSegmenter {
            nof_codeblocks,
            script: Arc::clone(&script),
        }),
        Box::new(RecordingDematcher {
            script: Arc::clone(&script),
        }),
        Box::new(SpyDecoder {
            script: Arc::clone(&script),
        }),
        4096,
    );
    (decoder, script)
}

/// Notifier keeping every result.
#[derive(Debug, Default)]
pub(crate) struct RecordingNotifier {
    pub results: Vec<PuschDecoderResult>,
}

impl PuschDecoderNotifier for RecordingNotifier {
    fn on_sch_data(&mut self, result: &PuschDecoderResult) {
        self.results.push(result.clone());
    }
}

/// Sink keeping every soft bit.
#[derive(Debug, Default)]
pub(crate) struct CollectingSink {
    pub llrs: Vec<LogLikelihoodRatio>,
    pub ended: bool,
}

impl SoftbitSink for CollectingSink {
    fn on_new_softbits(&mut self, softbits: &[LogLikelihoodRatio]) -> PuschResult<()> {
        self.llrs.extend_from_slice(softbits);
        Ok(())
    }

    fn on_end_softbits(&mut self) -> PuschResult<()> {
        self.ended = true;
        Ok(())
    }
}

/// Reads the first soft bits back as the message, one per bit.
#[derive(Debug, Default)]
pub(crate) struct HardDecisionUciDecoder;

impl UciDecoder for HardDecisionUciDecoder {
    fn decode(&self, message: &mut [u8], llrs: &[LogLikelihoodRatio], _config: &UciDecoderConfig) -> UciStatus {
        if llrs.len() < message.len() {
            return UciStatus::Invalid;
        }
        for (bit, llr) in message.iter_mut().zip(llrs) {
            *bit = llr.hard_decision();
        }
        UciStatus::Valid
    }
}

/// Empty resource grid.
#[derive(Debug, Default)]
pub(crate) struct ZeroGrid;

impl ResourceGridReader for ZeroGrid {
    fn get(&self, _port: u8, _symbol: usize, _subcarrier: usize) -> Complex32 {
        Complex32::new(0.0, 0.0)
    }
}

/// Single-layer QPSK over 5 PRB of a full slot, DM-RS on symbols 2 and 11.
pub(crate) fn test_pdu() -> PuschPdu {
    PuschPdu {
        slot: 0,
        rnti: 0x4601,
        bwp_start_rb: 0,
        bwp_size_rb: 10,
        cp: CyclicPrefix::Normal,
        modulation: Modulation::Qpsk,
        target_code_rate: 0.3,
        codeword: Some(PuschCodeword {
            rv: 0,
            ldpc_base_graph: BaseGraph::Bg2,
            new_data: true,
        }),
        n_id: 1,
        nof_tx_layers: 1,
        rx_ports: vec![0],
        dmrs_symbol_mask: PuschPdu::dmrs_mask_from_symbols(14, &[2, 11]),
        dmrs: DmrsType::Type1,
        scrambling_id: 1,
        n_scid: false,
        nof_cdm_groups_without_data: 2,
        freq_alloc: RbAllocation::contiguous(0, 5),
        start_symbol_index: 0,
        nof_symbols: 14,
        tbs_lbrm_bytes: 0,
        dc_position: None,
        uci: UciDescription::default(),
    }
}
