//! # PUSCH Transport Block Decoder
//!
//! Streaming UL-SCH decoder with HARQ soft combining.
//!
//! A decode is a short session:
//!
//! ```text
//!            new_data()                 on_end_softbits()
//!   Idle ───────────────▶ Accumulating ───────────────────▶ Finalizing ──▶ Idle
//!     ▲                    │  on_new_softbits()/append_with()                │
//!     │                    │  overflow, misalignment or drop                 │
//!     └────────────────────┴─────────────────────────────────────────────────┘
//! ```
//!
//! [`PuschDecoder::new_data`] returns a [`PuschDecoderBuffer`] that borrows
//! the decoder, the output buffer, the HARQ softbuffer and the result
//! notifier for the duration of the session, so at most one transport block
//! is in flight per decoder.
//!
//! Finalizing segments the accumulated codeword, rate dematches every
//! codeblock into the softbuffer (combining with earlier transmissions),
//! decodes the codeblocks whose CRC has not passed yet and reassembles the
//! transport block. With several codeblocks the transport block CRC24A is
//! checked as well; if it fails, every codeblock pass is discarded. The
//! output buffer is written only when the transport block CRC passes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace, warn};

use crate::bits::pack_bits;
use crate::config::DecoderSettings;
use crate::crc::{CrcCalculator, CrcSet, LONG_CRC_LENGTH};
use crate::error::{PuschError, PuschResult};
use crate::ldpc::{
    BaseGraph, CodeblockMetadata, LdpcDecoder, LdpcDecoderConfig, LdpcRateDematcher, LdpcSegmenter,
    LdpcSegmenterRx, LdpcSoftRateDematcher, MinSumDecoder, SegmenterConfig,
};
use crate::observe::DecoderMetrics;
use crate::softbuffer::RxSoftbuffer;
use crate::stats::SampleStatistics;
use crate::types::{LogLikelihoodRatio, Modulation};

/// Largest transport block size in bits.
pub const MAX_TBS: usize = 1_277_992;

const BITS_PER_BYTE: usize = 8;

/// Decoder session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecoderState {
    /// No transport block in progress
    Idle,
    /// Soft bits are being appended
    Accumulating,
    /// Segmentation and decoding in progress
    Finalizing,
}

/// Parameters of one transport block decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuschDecoderConfig {
    pub base_graph: BaseGraph,
    pub rv: u8,
    pub modulation: Modulation,
    /// Limited-buffer rate matching reference size in bits, 0 if disabled.
    pub nref: usize,
    pub nof_layers: usize,
    /// LDPC iteration cap per codeblock.
    pub nof_ldpc_iterations: u32,
    /// Let the LDPC decoder stop as soon as the codeblock CRC passes.
    pub use_early_stop: bool,
    /// Fresh transmission; otherwise combine with the softbuffer content.
    pub new_data: bool,
}

/// Outcome of a transport block decode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PuschDecoderResult {
    pub nof_codeblocks_total: usize,
    /// LDPC iterations of the codeblocks decoded in this attempt. Failed
    /// codeblocks count the iteration cap.
    pub ldpc_decoder_stats: SampleStatistics<u32>,
    pub tb_crc_ok: bool,
}

/// Receives the result of every completed decode.
pub trait PuschDecoderNotifier {
    fn on_sch_data(&mut self, result: &PuschDecoderResult);
}

/// Consumer of a demodulated soft bit stream.
pub trait SoftbitSink {
    fn on_new_softbits(&mut self, softbits: &[LogLikelihoodRatio]) -> PuschResult<()>;

    fn on_end_softbits(&mut self) -> PuschResult<()>;
}

/// Sink discarding every soft bit.
#[derive(Debug, Default, Clone, Copy)]
pub struct DummySink;

impl SoftbitSink for DummySink {
    fn on_new_softbits(&mut self, _softbits: &[LogLikelihoodRatio]) -> PuschResult<()> {
        Ok(())
    }

    fn on_end_softbits(&mut self) -> PuschResult<()> {
        Ok(())
    }
}

/// Codeblock length N, message length K and data bits of a codeblock.
///
/// Data bits exclude CRC and filler bits but may include zero padding.
pub fn get_cblk_bit_breakdown(metadata: &CodeblockMetadata) -> (usize, usize, usize) {
    let cb_length = metadata.cb_specific.full_length;
    let msg_length = metadata.message_length();
    let nof_data_bits = msg_length
        .saturating_sub(metadata.cb_specific.nof_crc_bits)
        .saturating_sub(metadata.cb_specific.nof_filler_bits);
    (cb_length, msg_length, nof_data_bits)
}

/// Transport block size plus the outer CRC, present only with several codeblocks.
pub fn get_tb_and_crc_size(tbs: usize, nof_codeblocks: usize) -> usize {
    if nof_codeblocks > 1 {
        tbs + LONG_CRC_LENGTH
    } else {
        tbs
    }
}

/// Decode one codeblock, returning the iterations it took if its CRC passed.
fn decode_codeblock(
    decoder: &mut dyn LdpcDecoder,
    message: &mut [u8],
    soft_bits: &[LogLikelihoodRatio],
    crc: &dyn CrcCalculator,
    metadata: &CodeblockMetadata,
    config: &PuschDecoderConfig,
) -> Option<u32> {
    let ldpc_config = LdpcDecoderConfig {
        metadata: *metadata,
        max_iterations: config.nof_ldpc_iterations,
    };

    if config.use_early_stop {
        return decoder.decode(message, soft_bits, Some(crc), &ldpc_config);
    }

    decoder.decode(message, soft_bits, None, &ldpc_config);
    let nof_significant = message.len().saturating_sub(metadata.cb_specific.nof_filler_bits);
    (crc.calculate_bits(&message[..nof_significant]) == 0).then_some(config.nof_ldpc_iterations)
}

/// UL-SCH transport block decoder.
pub struct PuschDecoder {
    segmenter: Box<dyn LdpcSegmenterRx>,
    dematcher: Box<dyn LdpcRateDematcher>,
    decoder: Box<dyn LdpcDecoder>,
    crcs: CrcSet,
    /// Accumulated codeword soft bits.
    softbits: Vec<LogLikelihoodRatio>,
    softbits_count: usize,
    /// Reassembled transport block (and outer CRC) bits.
    tb_bits: Vec<u8>,
    state: DecoderState,
    metrics: Arc<DecoderMetrics>,
}

impl std::fmt::Debug for PuschDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PuschDecoder")
            .field("state", &self.state)
            .field("capacity", &self.softbits.len())
            .field("softbits_count", &self.softbits_count)
            .finish()
    }
}

impl PuschDecoder {
    /// Create a decoder accepting codewords of up to `max_codeword_size` soft bits.
    pub fn new(
        segmenter: Box<dyn LdpcSegmenterRx>,
        dematcher: Box<dyn LdpcRateDematcher>,
        decoder: Box<dyn LdpcDecoder>,
        max_codeword_size: usize,
    ) -> Self {
        Self {
            segmenter,
            dematcher,
            decoder,
            crcs: CrcSet::new(),
            softbits: vec![LogLikelihoodRatio::ZERO; max_codeword_size],
            softbits_count: 0,
            tb_bits: Vec::new(),
            state: DecoderState::Idle,
            metrics: Arc::new(DecoderMetrics::new()),
        }
    }

    /// Decoder built from the software segmenter, dematcher and min-sum decoder.
    pub fn software(settings: &DecoderSettings) -> Self {
        Self::new(
            Box::new(LdpcSegmenter::new()),
            Box::new(LdpcSoftRateDematcher::new()),
            Box::new(MinSumDecoder::new(settings.min_sum_scaling)),
            settings.max_codeword_size,
        )
    }

    /// Report into a shared metrics instance.
    pub fn with_metrics(mut self, metrics: Arc<DecoderMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<DecoderMetrics> {
        &self.metrics
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    pub fn max_codeword_size(&self) -> usize {
        self.softbits.len()
    }

    /// Return to Idle, discarding a session left behind by a leaked buffer.
    pub fn abort(&mut self) {
        self.state = DecoderState::Idle;
        self.softbits_count = 0;
    }

    /// Start decoding a transport block into `transport_block`.
    ///
    /// The transport block size is `8 * transport_block.len()` bits.
    pub fn new_data<'a>(
        &'a mut self,
        transport_block: &'a mut [u8],
        softbuffer: &'a mut RxSoftbuffer,
        notifier: &'a mut dyn PuschDecoderNotifier,
        config: PuschDecoderConfig,
    ) -> PuschResult<PuschDecoderBuffer<'a>> {
        if self.state != DecoderState::Idle {
            return Err(PuschError::InvalidState {
                expected: DecoderState::Idle,
                actual: self.state,
            });
        }
        let tbs = transport_block.len() * BITS_PER_BYTE;
        if tbs > MAX_TBS {
            return Err(PuschError::TransportBlockTooLarge { tbs, max: MAX_TBS });
        }
        if tbs == 0 {
            return Err(PuschError::InvalidDecoderConfig("empty transport block".into()));
        }
        if config.nof_ldpc_iterations == 0 {
            return Err(PuschError::InvalidDecoderConfig(
                "at least one LDPC iteration is required".into(),
            ));
        }

        self.state = DecoderState::Accumulating;
        self.softbits_count = 0;
        Ok(PuschDecoderBuffer {
            decoder: self,
            transport_block,
            softbuffer,
            notifier,
            config,
        })
    }

    fn protocol_fault(&mut self, err: PuschError) -> PuschError {
        error!(error = %err, "PUSCH decode aborted");
        self.metrics.protocol_faults.inc();
        self.abort();
        err
    }

    fn finalize(
        &mut self,
        transport_block: &mut [u8],
        softbuffer: &mut RxSoftbuffer,
        config: &PuschDecoderConfig,
    ) -> PuschResult<PuschDecoderResult> {
        let Self {
            segmenter,
            dematcher,
            decoder,
            crcs,
            softbits,
            softbits_count,
            tb_bits,
            metrics,
            ..
        } = self;

        let qm = config.modulation.bits_per_symbol();
        if *softbits_count % qm != 0 {
            return Err(PuschError::Misaligned {
                nof_softbits: *softbits_count,
                modulation_order: qm,
            });
        }

        let segmenter_config = SegmenterConfig {
            base_graph: config.base_graph,
            rv: config.rv,
            modulation: config.modulation,
            nref: config.nref,
            nof_layers: config.nof_layers,
            nof_ch_symbols: *softbits_count / qm,
        };
        let tbs = transport_block.len() * BITS_PER_BYTE;
        let codeblocks = segmenter.segment(&softbits[..*softbits_count], tbs, &segmenter_config)?;

        let nof_cbs = codeblocks.len();
        if nof_cbs != softbuffer.get_nof_codeblocks() {
            return Err(PuschError::CodeblockCountMismatch {
                segmented: nof_cbs,
                softbuffer: softbuffer.get_nof_codeblocks(),
            });
        }

        let tb_and_crc_size = get_tb_and_crc_size(tbs, nof_cbs);
        let mut nof_data_bits = 0;
        for (cb_id, cb) in codeblocks.iter().enumerate() {
            if cb.llrs.len() != cb.metadata.cb_specific.rm_length {
                return Err(PuschError::RateMatchedLengthMismatch {
                    cb_id,
                    expected: cb.metadata.cb_specific.rm_length,
                    actual: cb.llrs.len(),
                });
            }
            nof_data_bits += get_cblk_bit_breakdown(&cb.metadata).2;
        }
        if nof_data_bits < tb_and_crc_size {
            return Err(PuschError::Segmentation(format!(
                "codeblocks carry {} data bits, transport block needs {}",
                nof_data_bits, tb_and_crc_size
            )));
        }

        tb_bits.clear();
        tb_bits.resize(tb_and_crc_size, 0);

        let block_crc = crcs.select(tbs, nof_cbs);
        if config.new_data {
            softbuffer.clear_pass_flags();
        }

        let mut result = PuschDecoderResult {
            nof_codeblocks_total: nof_cbs,
            ..Default::default()
        };

        let mut tb_offset = 0;
        for (cb_id, cb) in codeblocks.iter().enumerate() {
            let (cb_length, msg_length, nof_data_bits) = get_cblk_bit_breakdown(&cb.metadata);
            let nof_new_bits = (tb_and_crc_size - tb_offset).min(nof_data_bits);
            let view = softbuffer.codeblock(cb_id, cb_length, msg_length);

            // Combine even when the codeblock already passed: a later outer CRC
            // failure makes it decode again.
            dematcher.rate_dematch(view.soft_bits, cb.llrs, config.new_data, &cb.metadata);

            if view.crc.is_passed() {
                trace!(cb_id, "codeblock already decoded");
                metrics.cb_skipped.inc();
            } else {
                let nof_iters = decode_codeblock(
                    decoder.as_mut(),
                    view.message,
                    view.soft_bits,
                    block_crc,
                    &cb.metadata,
                    config,
                );
                metrics.cb_decoded.inc();
                match nof_iters {
                    Some(iters) => {
                        view.crc.mark_passed();
                        result.ldpc_decoder_stats.update(iters);
                        metrics.ldpc_iterations.observe(u64::from(iters));
                    }
                    None => {
                        result.ldpc_decoder_stats.update(config.nof_ldpc_iterations);
                        metrics.ldpc_iterations.observe(u64::from(config.nof_ldpc_iterations));
                    }
                }
                trace!(cb_id, crc_ok = view.crc.is_passed(), "codeblock decoded");
            }

            tb_bits[tb_offset..tb_offset + nof_new_bits].copy_from_slice(&view.message[..nof_new_bits]);
            tb_offset += nof_new_bits;
        }

        let pass_flags = softbuffer.get_pass_flags();
        if nof_cbs == 1 {
            result.tb_crc_ok = pass_flags[0].is_passed();
        } else if pass_flags.iter().all(|f| f.is_passed()) {
            if crcs.crc24a.calculate_bits(tb_bits) == 0 {
                result.tb_crc_ok = true;
            } else {
                warn!(tbs, nof_cbs, "codeblock CRCs passed but transport block CRC failed");
                metrics.outer_crc_false_positives.inc();
                softbuffer.clear_pass_flags();
            }
        }

        if result.tb_crc_ok {
            pack_bits(transport_block, &tb_bits[..tbs]);
            metrics.tb_ok.inc();
        } else {
            metrics.tb_ko.inc();
        }

        debug!(
            tbs,
            nof_cbs,
            rv = config.rv,
            new_data = config.new_data,
            crc_ok = result.tb_crc_ok,
            "transport block decoded"
        );
        Ok(result)
    }
}

/// Streaming input of one transport block decode.
///
/// Dropping the buffer before [`on_end_softbits`](Self::on_end_softbits)
/// abandons the decode.
pub struct PuschDecoderBuffer<'a> {
    decoder: &'a mut PuschDecoder,
    transport_block: &'a mut [u8],
    softbuffer: &'a mut RxSoftbuffer,
    notifier: &'a mut dyn PuschDecoderNotifier,
    config: PuschDecoderConfig,
}

impl std::fmt::Debug for PuschDecoderBuffer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PuschDecoderBuffer")
            .field("decoder", &self.decoder)
            .field("tb_bytes", &self.transport_block.len())
            .field("config", &self.config)
            .finish()
    }
}

impl PuschDecoderBuffer<'_> {
    pub fn config(&self) -> &PuschDecoderConfig {
        &self.config
    }

    /// Soft bits accumulated so far.
    pub fn nof_softbits(&self) -> usize {
        self.decoder.softbits_count
    }

    fn require_accumulating(&self) -> PuschResult<()> {
        match self.decoder.state {
            DecoderState::Accumulating => Ok(()),
            actual => Err(PuschError::InvalidState {
                expected: DecoderState::Accumulating,
                actual,
            }),
        }
    }

    /// Append `len` soft bits written in place by `fill`.
    ///
    /// On overflow nothing is written and the session is aborted.
    pub fn append_with<F>(&mut self, len: usize, fill: F) -> PuschResult<()>
    where
        F: FnOnce(&mut [LogLikelihoodRatio]),
    {
        self.require_accumulating()?;
        let offset = self.decoder.softbits_count;
        let capacity = self.decoder.softbits.len();
        if offset + len > capacity {
            let err = PuschError::Overflow { offset, len, capacity };
            return Err(self.decoder.protocol_fault(err));
        }

        fill(&mut self.decoder.softbits[offset..offset + len]);
        self.decoder.softbits_count += len;
        Ok(())
    }
}

impl SoftbitSink for PuschDecoderBuffer<'_> {
    fn on_new_softbits(&mut self, softbits: &[LogLikelihoodRatio]) -> PuschResult<()> {
        self.append_with(softbits.len(), |block| block.copy_from_slice(softbits))
    }

    /// Decode the accumulated codeword and notify the result.
    fn on_end_softbits(&mut self) -> PuschResult<()> {
        self.require_accumulating()?;
        self.decoder.state = DecoderState::Finalizing;

        let outcome = self
            .decoder
            .finalize(self.transport_block, self.softbuffer, &self.config);
        match outcome {
            Ok(result) => {
                self.decoder.abort();
                self.notifier.on_sch_data(&result);
                Ok(())
            }
            Err(err) => Err(self.decoder.protocol_fault(err)),
        }
    }
}

impl Drop for PuschDecoderBuffer<'_> {
    fn drop(&mut self) {
        if self.decoder.state == DecoderState::Accumulating {
            debug!(nof_softbits = self.decoder.softbits_count, "PUSCH decode abandoned");
            self.decoder.abort();
        }
    }
}
