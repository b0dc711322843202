//! # PUSCH Processor
//!
//! Receives one PUSCH transmission from the resource grid:
//!
//! ```text
//!  PuschPdu ─▶ validate ─▶ UL-SCH sizing ─▶ DM-RS estimate ─▶ DC null ─▶ CSI
//!                                                                       │
//!   grid ─▶ demodulator ─▶ demultiplexer ─┬─▶ HARQ-ACK buffer ─┐        │
//!                                         ├─▶ CSI-1 buffer ────┼─▶ on_uci()
//!                                         └─▶ PuschDecoder ────┴─▶ on_sch()
//! ```
//!
//! Invalid descriptors are rejected before anything runs. UCI results are
//! notified before the UL-SCH result.

use tracing::{debug, warn};

use crate::config::PuschRxConfig;
use crate::error::{PuschError, PuschResult};
use crate::softbuffer::RxSoftbuffer;

use super::channel_estimate::{
    ChannelEstimate, ChannelEstimateDimensions, ChannelStateInformation, DemodulatorConfig, DmrsEstimatorConfig,
    DmrsPuschEstimator, PuschDemodulator, ResourceGridReader,
};
use super::decoder::{
    DummySink, PuschDecoder, PuschDecoderConfig, PuschDecoderNotifier, PuschDecoderResult, SoftbitSink, MAX_TBS,
};
use super::demultiplex::{DemultiplexConfig, UlschDemultiplexer};
use super::pdu::PuschPdu;
use super::uci::{UciBuffer, UciDecoder, UciPayload};
use super::ulsch_info::{get_ulsch_information, sch_to_dmrs_ratio_db, UlschConfiguration};
use super::validator::PuschPduValidator;
use super::CODEWORD_MAX_SIZE;

/// UCI fields of a reception.
#[derive(Debug, Clone, PartialEq)]
pub struct PuschProcessorUciResult {
    pub harq_ack: Option<UciPayload>,
    pub csi_part1: Option<UciPayload>,
    pub csi: ChannelStateInformation,
}

/// UL-SCH outcome of a reception.
#[derive(Debug, Clone, PartialEq)]
pub struct PuschProcessorSchResult {
    pub data: PuschDecoderResult,
    pub csi: ChannelStateInformation,
}

/// Receives the results of [`PuschProcessor::process`].
pub trait PuschProcessorResultNotifier {
    fn on_uci(&mut self, result: &PuschProcessorUciResult);

    fn on_sch(&mut self, result: &PuschProcessorSchResult);
}

/// Processor components and limits.
pub struct PuschProcessorConfig {
    pub estimator: Box<dyn DmrsPuschEstimator>,
    pub demodulator: Box<dyn PuschDemodulator>,
    pub decoder: PuschDecoder,
    pub uci_decoder: Box<dyn UciDecoder>,
    pub ce_dims: ChannelEstimateDimensions,
    pub nof_ldpc_iterations: u32,
    pub early_stop: bool,
}

impl PuschProcessorConfig {
    /// Components around a software decoder built from `config`.
    pub fn from_rx_config(
        config: &PuschRxConfig,
        estimator: Box<dyn DmrsPuschEstimator>,
        demodulator: Box<dyn PuschDemodulator>,
        uci_decoder: Box<dyn UciDecoder>,
    ) -> Self {
        Self {
            estimator,
            demodulator,
            decoder: PuschDecoder::software(&config.decoder),
            uci_decoder,
            ce_dims: config.channel_estimate,
            nof_ldpc_iterations: config.decoder.nof_ldpc_iterations,
            early_stop: config.decoder.early_stop,
        }
    }
}

#[derive(Default)]
struct SchCollector {
    result: Option<PuschDecoderResult>,
}

impl PuschDecoderNotifier for SchCollector {
    fn on_sch_data(&mut self, result: &PuschDecoderResult) {
        self.result = Some(result.clone());
    }
}

/// PUSCH receive chain.
pub struct PuschProcessor {
    estimator: Box<dyn DmrsPuschEstimator>,
    demodulator: Box<dyn PuschDemodulator>,
    decoder: PuschDecoder,
    uci_decoder: Box<dyn UciDecoder>,
    validator: PuschPduValidator,
    ch_estimate: ChannelEstimate,
    nof_ldpc_iterations: u32,
    early_stop: bool,
}

impl std::fmt::Debug for PuschProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PuschProcessor")
            .field("decoder", &self.decoder)
            .field("ce_dims", self.ch_estimate.size())
            .field("nof_ldpc_iterations", &self.nof_ldpc_iterations)
            .field("early_stop", &self.early_stop)
            .finish()
    }
}

impl PuschProcessor {
    pub fn new(config: PuschProcessorConfig) -> PuschResult<Self> {
        if config.nof_ldpc_iterations == 0 {
            return Err(PuschError::InvalidDecoderConfig(
                "the decoder number of iterations must be non-zero".into(),
            ));
        }
        Ok(Self {
            estimator: config.estimator,
            demodulator: config.demodulator,
            decoder: config.decoder,
            uci_decoder: config.uci_decoder,
            validator: PuschPduValidator::new(config.ce_dims),
            ch_estimate: ChannelEstimate::new(config.ce_dims),
            nof_ldpc_iterations: config.nof_ldpc_iterations,
            early_stop: config.early_stop,
        })
    }

    pub fn validator(&self) -> &PuschPduValidator {
        &self.validator
    }

    pub fn decoder(&self) -> &PuschDecoder {
        &self.decoder
    }

    /// Channel estimate of the last processed transmission.
    pub fn channel_estimate(&self) -> &ChannelEstimate {
        &self.ch_estimate
    }

    /// Process one transmission, decoding its transport block into `data`.
    pub fn process(
        &mut self,
        data: &mut [u8],
        softbuffer: &mut RxSoftbuffer,
        notifier: &mut dyn PuschProcessorResultNotifier,
        grid: &dyn ResourceGridReader,
        pdu: &PuschPdu,
    ) -> PuschResult<()> {
        if let Err(err) = self.validator.validate(pdu) {
            warn!(rnti = pdu.rnti, slot = pdu.slot, error = %err, "PUSCH descriptor rejected");
            return Err(err.into());
        }

        // The transport block size is the length of `data`; reject it before
        // any per-slot work is spent on channel estimation.
        if pdu.codeword.is_some() {
            let tbs = data.len() * 8;
            let err = if tbs == 0 {
                Some(PuschError::InvalidDecoderConfig("empty transport block".into()))
            } else if tbs > MAX_TBS {
                Some(PuschError::TransportBlockTooLarge { tbs, max: MAX_TBS })
            } else {
                None
            };
            if let Some(err) = err {
                warn!(rnti = pdu.rnti, slot = pdu.slot, error = %err, "PUSCH transport block buffer rejected");
                return Err(err);
            }
        }

        let nof_rb = pdu.freq_alloc.get_nof_rb();
        let rb_mask = pdu.freq_alloc.get_prb_mask(pdu.bwp_start_rb, pdu.bwp_size_rb);
        let modulation = pdu.modulation;

        let ulsch_config = UlschConfiguration {
            tbs: if pdu.codeword.is_some() { data.len() * 8 } else { 0 },
            modulation,
            target_code_rate: pdu.target_code_rate,
            nof_harq_ack_bits: pdu.uci.nof_harq_ack,
            nof_csi_part1_bits: pdu.uci.nof_csi_part1,
            nof_csi_part2_bits: pdu.uci.nof_csi_part2,
            alpha_scaling: pdu.uci.alpha_scaling,
            beta_offset_harq_ack: pdu.uci.beta_offset_harq_ack,
            beta_offset_csi_part1: pdu.uci.beta_offset_csi_part1,
            beta_offset_csi_part2: pdu.uci.beta_offset_csi_part2,
            nof_rb,
            start_symbol_index: pdu.start_symbol_index,
            nof_symbols: pdu.nof_symbols,
            dmrs_type: pdu.dmrs,
            dmrs_symbol_mask: pdu.dmrs_symbol_mask.clone(),
            nof_cdm_groups_without_data: pdu.nof_cdm_groups_without_data,
            nof_layers: pdu.nof_tx_layers,
        };
        let info = get_ulsch_information(&ulsch_config)?;

        let estimator_config = DmrsEstimatorConfig {
            slot: pdu.slot,
            dmrs_type: pdu.dmrs,
            scrambling_id: pdu.scrambling_id,
            n_scid: pdu.n_scid,
            scaling: 10f32.powf(-sch_to_dmrs_ratio_db(pdu.nof_cdm_groups_without_data) / 20.0),
            cp: pdu.cp,
            symbols_mask: pdu.dmrs_symbol_mask.clone(),
            rb_mask: rb_mask.clone(),
            first_symbol: pdu.start_symbol_index,
            nof_symbols: pdu.nof_symbols,
            nof_tx_layers: pdu.nof_tx_layers,
            rx_ports: pdu.rx_ports.clone(),
        };
        self.estimator.estimate(&mut self.ch_estimate, grid, &estimator_config);

        if let Some(dc_position) = pdu.dc_position {
            let symbols = pdu.start_symbol_index..pdu.start_symbol_index + pdu.nof_symbols;
            self.ch_estimate
                .zero_dc(dc_position, pdu.rx_ports.len(), pdu.nof_tx_layers, symbols);
        }

        let csi = self.ch_estimate.get_channel_state_information();

        let demux_config = DemultiplexConfig::new(
            &info,
            modulation,
            pdu.nof_tx_layers,
            pdu.uci.nof_harq_ack,
            pdu.uci.nof_csi_part1,
        );
        let demod_config = DemodulatorConfig {
            rnti: pdu.rnti,
            rb_mask,
            modulation,
            start_symbol_index: pdu.start_symbol_index,
            nof_symbols: pdu.nof_symbols,
            dmrs_symbol_mask: pdu.dmrs_symbol_mask.clone(),
            dmrs_type: pdu.dmrs,
            nof_cdm_groups_without_data: pdu.nof_cdm_groups_without_data,
            n_id: pdu.n_id,
            nof_tx_layers: pdu.nof_tx_layers,
            rx_ports: pdu.rx_ports.clone(),
        };

        let uci_decoder: &dyn UciDecoder = self.uci_decoder.as_ref();
        let mut harq_ack_buffer = (pdu.uci.nof_harq_ack > 0)
            .then(|| UciBuffer::new(uci_decoder, pdu.uci.nof_harq_ack, modulation, CODEWORD_MAX_SIZE));
        let mut csi_part1_buffer = (pdu.uci.nof_csi_part1 > 0)
            .then(|| UciBuffer::new(uci_decoder, pdu.uci.nof_csi_part1, modulation, CODEWORD_MAX_SIZE));

        let mut sch = SchCollector::default();
        {
            let mut decoder_buffer = match pdu.codeword {
                Some(codeword) => {
                    let decoder_config = PuschDecoderConfig {
                        base_graph: codeword.ldpc_base_graph,
                        rv: codeword.rv,
                        modulation,
                        nref: pdu.tbs_lbrm_bytes * 8,
                        nof_layers: pdu.nof_tx_layers,
                        nof_ldpc_iterations: self.nof_ldpc_iterations,
                        use_early_stop: self.early_stop,
                        new_data: codeword.new_data,
                    };
                    Some(self.decoder.new_data(data, softbuffer, &mut sch, decoder_config)?)
                }
                None => None,
            };

            let (mut no_data, mut no_harq_ack, mut no_csi_part1) = (DummySink, DummySink, DummySink);
            let data_sink: &mut dyn SoftbitSink = match decoder_buffer.as_mut() {
                Some(buffer) => buffer,
                None => &mut no_data,
            };
            let harq_ack_sink: &mut dyn SoftbitSink = match harq_ack_buffer.as_mut() {
                Some(buffer) => buffer,
                None => &mut no_harq_ack,
            };
            let csi_part1_sink: &mut dyn SoftbitSink = match csi_part1_buffer.as_mut() {
                Some(buffer) => buffer,
                None => &mut no_csi_part1,
            };

            let mut demux = UlschDemultiplexer::new(data_sink, harq_ack_sink, csi_part1_sink, demux_config);
            self.demodulator
                .demodulate(&mut demux, grid, &self.ch_estimate, &demod_config)?;
            demux.on_end_softbits()?;
            debug!(
                rnti = pdu.rnti,
                slot = pdu.slot,
                counts = ?demux.counts(),
                nof_ul_sch_bits = info.nof_ul_sch_bits,
                "PUSCH demultiplexed"
            );
        }

        if pdu.uci.has_uci() {
            notifier.on_uci(&PuschProcessorUciResult {
                harq_ack: harq_ack_buffer.and_then(UciBuffer::into_payload),
                csi_part1: csi_part1_buffer.and_then(UciBuffer::into_payload),
                csi,
            });
        }
        if let Some(result) = sch.result {
            notifier.on_sch(&PuschProcessorSchResult { data: result, csi });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DecoderSettings;
    use crate::error::PduValidationError;
    use crate::ldpc::{BaseGraph, SchEncoder, SchEncoderConfig};
    use crate::pusch::testing::{test_pdu, HardDecisionUciDecoder, ZeroGrid};
    use crate::pusch::uci::UciStatus;
    use crate::types::{LogLikelihoodRatio, Modulation};
    use approx::assert_relative_eq;
    use num_complex::Complex32;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const TB_BYTES: usize = 40;

    /// Unit channel on the used ports, 10 dB SINR.
    struct UnitEstimator {
        calls: Arc<AtomicUsize>,
    }

    impl DmrsPuschEstimator for UnitEstimator {
        fn estimate(&mut self, estimate: &mut ChannelEstimate, _grid: &dyn ResourceGridReader, config: &DmrsEstimatorConfig) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            estimate.reset();
            for port in 0..config.rx_ports.len() {
                for layer in 0..config.nof_tx_layers {
                    for symbol in config.first_symbol..config.first_symbol + config.nof_symbols {
                        estimate
                            .get_symbol_ch_estimate_mut(symbol, port, layer)
                            .fill(Complex32::new(1.0, 0.0));
                    }
                    estimate.set_rsrp(port, layer, 1.0);
                }
                estimate.set_noise_variance(port, 0.1);
            }
        }
    }

    /// Replays a fixed soft bit stream.
    struct ReplayDemodulator {
        stream: Vec<LogLikelihoodRatio>,
    }

    impl PuschDemodulator for ReplayDemodulator {
        fn demodulate(
            &mut self,
            sink: &mut dyn SoftbitSink,
            _grid: &dyn ResourceGridReader,
            _estimate: &ChannelEstimate,
            _config: &DemodulatorConfig,
        ) -> PuschResult<()> {
            for chunk in self.stream.chunks(120) {
                sink.on_new_softbits(chunk)?;
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        events: Vec<&'static str>,
        uci: Option<PuschProcessorUciResult>,
        sch: Option<PuschProcessorSchResult>,
    }

    impl PuschProcessorResultNotifier for RecordingNotifier {
        fn on_uci(&mut self, result: &PuschProcessorUciResult) {
            self.events.push("uci");
            self.uci = Some(result.clone());
        }

        fn on_sch(&mut self, result: &PuschProcessorSchResult) {
            self.events.push("sch");
            self.sch = Some(result.clone());
        }
    }

    fn processor(stream: Vec<LogLikelihoodRatio>) -> (PuschProcessor, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let processor = PuschProcessor::new(PuschProcessorConfig {
            estimator: Box::new(UnitEstimator {
                calls: Arc::clone(&calls),
            }),
            demodulator: Box::new(ReplayDemodulator { stream }),
            decoder: PuschDecoder::software(&DecoderSettings {
                max_codeword_size: 4096,
                ..Default::default()
            }),
            uci_decoder: Box::new(HardDecisionUciDecoder),
            ce_dims: ChannelEstimateDimensions {
                nof_prb: 25,
                nof_symbols: 14,
                nof_rx_ports: 2,
                nof_tx_layers: 1,
            },
            nof_ldpc_iterations: 6,
            early_stop: true,
        })
        .unwrap();
        (processor, calls)
    }

    fn random_tb(seed: u64) -> Vec<u8> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..TB_BYTES).map(|_| rng.gen()).collect()
    }

    /// Soft bits of `tb` encoded over `nof_bits` QPSK codeword bits.
    fn encoded_llrs(tb: &[u8], nof_bits: usize) -> Vec<LogLikelihoodRatio> {
        let config = SchEncoderConfig {
            base_graph: BaseGraph::Bg2,
            rv: 0,
            modulation: Modulation::Qpsk,
            nref: 0,
            nof_layers: 1,
            nof_ch_symbols: nof_bits / 2,
        };
        SchEncoder::new()
            .encode(tb, &config)
            .unwrap()
            .into_iter()
            .map(|b| LogLikelihoodRatio::new(if b == 1 { -10 } else { 10 }))
            .collect()
    }

    #[test]
    fn test_data_only_reception() {
        let tb = random_tb(21);
        // 5 PRB, 12 data symbols, QPSK.
        let (mut processor, calls) = processor(encoded_llrs(&tb, 1440));
        let mut data = vec![0u8; TB_BYTES];
        let mut softbuffer = RxSoftbuffer::new(1);
        let mut notifier = RecordingNotifier::default();

        processor
            .process(&mut data, &mut softbuffer, &mut notifier, &ZeroGrid, &test_pdu())
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(notifier.events, vec!["sch"]);
        let sch = notifier.sch.unwrap();
        assert!(sch.data.tb_crc_ok);
        assert_eq!(sch.data.nof_codeblocks_total, 1);
        assert_relative_eq!(sch.csi.sinr_db.unwrap(), 10.0, epsilon = 1e-4);
        assert_eq!(data, tb);
    }

    #[test]
    fn test_uci_notified_before_data() {
        let tb = random_tb(22);
        let mut pdu = test_pdu();
        pdu.uci.nof_harq_ack = 4;
        pdu.uci.beta_offset_harq_ack = 2.0;

        // E_ACK = 36 bits ahead of G = 1404 data bits.
        let mut stream: Vec<LogLikelihoodRatio> = [-5, 5, -5, -5]
            .into_iter()
            .chain(std::iter::repeat(5).take(32))
            .map(LogLikelihoodRatio::new)
            .collect();
        stream.extend(encoded_llrs(&tb, 1404));

        let (mut processor, _) = processor(stream);
        let mut data = vec![0u8; TB_BYTES];
        let mut softbuffer = RxSoftbuffer::new(1);
        let mut notifier = RecordingNotifier::default();
        processor
            .process(&mut data, &mut softbuffer, &mut notifier, &ZeroGrid, &pdu)
            .unwrap();

        assert_eq!(notifier.events, vec!["uci", "sch"]);
        let uci = notifier.uci.unwrap();
        let harq_ack = uci.harq_ack.unwrap();
        assert_eq!(harq_ack.bits, vec![1, 0, 1, 1]);
        assert_eq!(harq_ack.status, UciStatus::Valid);
        assert!(uci.csi_part1.is_none());
        assert!(notifier.sch.unwrap().data.tb_crc_ok);
        assert_eq!(data, tb);
    }

    #[test]
    fn test_uci_without_codeword() {
        let mut pdu = test_pdu();
        pdu.codeword = None;
        pdu.uci.nof_csi_part1 = 3;

        // CSI Part 1 takes every data RE.
        let stream: Vec<LogLikelihoodRatio> = [5, -5, -5]
            .into_iter()
            .chain(std::iter::repeat(5).take(1437))
            .map(LogLikelihoodRatio::new)
            .collect();
        let (mut processor, _) = processor(stream);
        let mut data = vec![0xAAu8; TB_BYTES];
        let mut softbuffer = RxSoftbuffer::new(1);
        let mut notifier = RecordingNotifier::default();
        processor
            .process(&mut data, &mut softbuffer, &mut notifier, &ZeroGrid, &pdu)
            .unwrap();

        assert_eq!(notifier.events, vec!["uci"]);
        assert_eq!(notifier.uci.unwrap().csi_part1.unwrap().bits, vec![0, 1, 1]);
        assert_eq!(data, vec![0xAAu8; TB_BYTES]);
    }

    #[test]
    fn test_invalid_descriptor_runs_nothing() {
        let mut pdu = test_pdu();
        pdu.nof_cdm_groups_without_data = 1;

        let (mut processor, calls) = processor(Vec::new());
        let mut data = vec![0u8; TB_BYTES];
        let mut softbuffer = RxSoftbuffer::new(1);
        let mut notifier = RecordingNotifier::default();
        let err = processor
            .process(&mut data, &mut softbuffer, &mut notifier, &ZeroGrid, &pdu)
            .unwrap_err();

        assert_eq!(
            err,
            PuschError::DescriptorRejected(PduValidationError::UnsupportedCdmGroups(1))
        );
        assert!(err.is_configuration());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(notifier.events.is_empty());
    }

    #[test]
    fn test_unusable_transport_block_buffer_runs_nothing() {
        let (mut processor, calls) = processor(Vec::new());
        let mut softbuffer = RxSoftbuffer::new(1);
        let mut notifier = RecordingNotifier::default();

        let err = processor
            .process(&mut [], &mut softbuffer, &mut notifier, &ZeroGrid, &test_pdu())
            .unwrap_err();
        assert!(matches!(err, PuschError::InvalidDecoderConfig(_)));
        assert!(err.is_configuration());

        let mut oversized = vec![0u8; MAX_TBS / 8 + 1];
        let err = processor
            .process(&mut oversized, &mut softbuffer, &mut notifier, &ZeroGrid, &test_pdu())
            .unwrap_err();
        assert_eq!(
            err,
            PuschError::TransportBlockTooLarge {
                tbs: oversized.len() * 8,
                max: MAX_TBS
            }
        );

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(notifier.events.is_empty());
        assert_eq!(processor.decoder.state(), crate::pusch::DecoderState::Idle);
    }

    #[test]
    fn test_dc_is_nulled_in_estimate() {
        let tb = random_tb(23);
        let mut pdu = test_pdu();
        pdu.dc_position = Some(7);

        let (mut processor, _) = processor(encoded_llrs(&tb, 1440));
        let mut data = vec![0u8; TB_BYTES];
        let mut softbuffer = RxSoftbuffer::new(1);
        let mut notifier = RecordingNotifier::default();
        processor
            .process(&mut data, &mut softbuffer, &mut notifier, &ZeroGrid, &pdu)
            .unwrap();

        let ce = processor.channel_estimate();
        for symbol in 0..14 {
            assert_eq!(ce.get_symbol_ch_estimate(symbol, 0, 0)[7], Complex32::new(0.0, 0.0));
            assert_eq!(ce.get_symbol_ch_estimate(symbol, 0, 0)[6], Complex32::new(1.0, 0.0));
        }
        assert!(notifier.sch.unwrap().data.tb_crc_ok);
    }

    #[test]
    fn test_decoder_fault_is_reported() {
        // One soft bit short of a whole QPSK symbol.
        let tb = random_tb(24);
        let mut stream = encoded_llrs(&tb, 1440);
        stream.pop();

        let (mut processor, _) = processor(stream);
        let mut data = vec![0u8; TB_BYTES];
        let mut softbuffer = RxSoftbuffer::new(1);
        let mut notifier = RecordingNotifier::default();
        let err = processor
            .process(&mut data, &mut softbuffer, &mut notifier, &ZeroGrid, &test_pdu())
            .unwrap_err();
        assert!(matches!(err, PuschError::Misaligned { .. }));
        assert!(notifier.events.is_empty());
        assert_eq!(processor.decoder().metrics().protocol_faults.get(), 1);
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let result = PuschProcessor::new(PuschProcessorConfig {
            estimator: Box::new(UnitEstimator {
                calls: Arc::new(AtomicUsize::new(0)),
            }),
            demodulator: Box::new(ReplayDemodulator { stream: Vec::new() }),
            decoder: PuschDecoder::software(&DecoderSettings::default()),
            uci_decoder: Box::new(HardDecisionUciDecoder),
            ce_dims: ChannelEstimateDimensions::default(),
            nof_ldpc_iterations: 0,
            early_stop: true,
        });
        assert!(matches!(result, Err(PuschError::InvalidDecoderConfig(_))));
    }
}
