//! # UL-SCH Demultiplexer
//!
//! Routes the demodulated codeword soft bits to their decoders:
//!
//! ```text
//!  codeword  ┌──────────── E_ACK ───────────┬──── E_CSI1 ────┬──── rest ────┐
//!            ▼                              ▼                ▼
//!        HARQ-ACK sink                 CSI Part 1 sink   UL-SCH data sink
//! ```
//!
//! A HARQ-ACK field of at most two bits punctures the data: its soft bits
//! also occupy data positions, so the data sink receives erasures (zero
//! LLRs) in their place and sees the full G bits.

use crate::error::PuschResult;
use crate::types::{LogLikelihoodRatio, Modulation};

use super::decoder::SoftbitSink;
use super::ulsch_info::{UlschInformation, MAX_PUNCTURED_HARQ_ACK_BITS};

/// Field sizes of one codeword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemultiplexConfig {
    pub modulation: Modulation,
    pub nof_layers: usize,
    /// HARQ-ACK payload bits
    pub nof_harq_ack_bits: usize,
    /// Encoded HARQ-ACK bits E_ACK
    pub nof_enc_harq_ack_bits: usize,
    pub nof_harq_ack_rvd: usize,
    /// CSI Part 1 payload bits
    pub nof_csi_part1_bits: usize,
    /// Encoded CSI Part 1 bits E_CSI1
    pub nof_enc_csi_part1_bits: usize,
}

impl DemultiplexConfig {
    pub fn new(
        info: &UlschInformation,
        modulation: Modulation,
        nof_layers: usize,
        nof_harq_ack_bits: usize,
        nof_csi_part1_bits: usize,
    ) -> Self {
        Self {
            modulation,
            nof_layers,
            nof_harq_ack_bits,
            nof_enc_harq_ack_bits: info.nof_harq_ack_bits,
            nof_harq_ack_rvd: info.nof_harq_ack_rvd,
            nof_csi_part1_bits,
            nof_enc_csi_part1_bits: info.nof_csi_part1_bits,
        }
    }

    /// HARQ-ACK soft bits stand in for data soft bits.
    pub fn harq_ack_punctures_data(&self) -> bool {
        self.nof_harq_ack_bits > 0 && self.nof_harq_ack_bits <= MAX_PUNCTURED_HARQ_ACK_BITS
    }

    /// Codeword length for `nof_ul_sch_bits` of data.
    pub fn codeword_length(&self, nof_ul_sch_bits: usize) -> usize {
        let ack = if self.harq_ack_punctures_data() {
            0
        } else {
            self.nof_enc_harq_ack_bits
        };
        ack + self.nof_enc_csi_part1_bits + nof_ul_sch_bits
    }
}

/// Soft bits delivered to each destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DemultiplexCounts {
    pub harq_ack: usize,
    pub csi_part1: usize,
    /// Data soft bits, erasures included
    pub sch_data: usize,
    pub erasures: usize,
}

#[derive(Clone, Copy)]
enum Destination {
    HarqAck,
    CsiPart1,
    SchData,
}

/// Splits one codeword stream between the data and UCI sinks.
pub struct UlschDemultiplexer<'s> {
    sch_data: &'s mut dyn SoftbitSink,
    harq_ack: &'s mut dyn SoftbitSink,
    csi_part1: &'s mut dyn SoftbitSink,
    config: DemultiplexConfig,
    offset: usize,
    erasures: Vec<LogLikelihoodRatio>,
    counts: DemultiplexCounts,
}

impl std::fmt::Debug for UlschDemultiplexer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UlschDemultiplexer")
            .field("config", &self.config)
            .field("offset", &self.offset)
            .field("counts", &self.counts)
            .finish()
    }
}

impl<'s> UlschDemultiplexer<'s> {
    pub fn new(
        sch_data: &'s mut dyn SoftbitSink,
        harq_ack: &'s mut dyn SoftbitSink,
        csi_part1: &'s mut dyn SoftbitSink,
        config: DemultiplexConfig,
    ) -> Self {
        Self {
            sch_data,
            harq_ack,
            csi_part1,
            config,
            offset: 0,
            erasures: Vec::new(),
            counts: DemultiplexCounts::default(),
        }
    }

    pub fn counts(&self) -> &DemultiplexCounts {
        &self.counts
    }

    fn destination(&self) -> (Destination, usize) {
        let ack_end = self.config.nof_enc_harq_ack_bits;
        let csi_end = ack_end + self.config.nof_enc_csi_part1_bits;
        if self.offset < ack_end {
            (Destination::HarqAck, ack_end - self.offset)
        } else if self.offset < csi_end {
            (Destination::CsiPart1, csi_end - self.offset)
        } else {
            (Destination::SchData, usize::MAX)
        }
    }
}

impl SoftbitSink for UlschDemultiplexer<'_> {
    fn on_new_softbits(&mut self, softbits: &[LogLikelihoodRatio]) -> PuschResult<()> {
        let mut rest = softbits;
        while !rest.is_empty() {
            let (destination, remaining) = self.destination();
            let (block, tail) = rest.split_at(remaining.min(rest.len()));
            match destination {
                Destination::HarqAck => {
                    self.harq_ack.on_new_softbits(block)?;
                    self.counts.harq_ack += block.len();
                    if self.config.harq_ack_punctures_data() {
                        self.erasures.clear();
                        self.erasures.resize(block.len(), LogLikelihoodRatio::ZERO);
                        self.sch_data.on_new_softbits(&self.erasures)?;
                        self.counts.sch_data += block.len();
                        self.counts.erasures += block.len();
                    }
                }
                Destination::CsiPart1 => {
                    self.csi_part1.on_new_softbits(block)?;
                    self.counts.csi_part1 += block.len();
                }
                Destination::SchData => {
                    self.sch_data.on_new_softbits(block)?;
                    self.counts.sch_data += block.len();
                }
            }
            self.offset += block.len();
            rest = tail;
        }
        Ok(())
    }

    /// End every stream, control fields first.
    fn on_end_softbits(&mut self) -> PuschResult<()> {
        self.harq_ack.on_end_softbits()?;
        self.csi_part1.on_end_softbits()?;
        self.sch_data.on_end_softbits()
    }
}
