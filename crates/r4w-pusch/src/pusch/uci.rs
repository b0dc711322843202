//! Uplink control information carried on the PUSCH
//!
//! A [`UciBuffer`] collects the encoded soft bits of one UCI field
//! (HARQ-ACK or CSI Part 1) as they leave the demultiplexer and runs the
//! short-block decoder once the stream ends.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{PuschError, PuschResult};
use crate::types::{LogLikelihoodRatio, Modulation};

use super::decoder::SoftbitSink;

/// Outcome of a UCI field decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UciStatus {
    /// Not decoded
    #[default]
    Unknown,
    Valid,
    /// Decoding failed the detection threshold or CRC
    Invalid,
}

/// Decoded UCI field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UciPayload {
    /// Message bits, one per byte
    pub bits: Vec<u8>,
    pub status: UciStatus,
}

/// UCI decoder parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UciDecoderConfig {
    pub modulation: Modulation,
}

/// Short-block and polar decoding of UCI fields.
pub trait UciDecoder: Send + Sync {
    /// Decode `llrs` into `message`, whose length is the field size.
    fn decode(&self, message: &mut [u8], llrs: &[LogLikelihoodRatio], config: &UciDecoderConfig) -> UciStatus;
}

/// Soft bit sink of one UCI field.
pub struct UciBuffer<'a> {
    decoder: &'a dyn UciDecoder,
    llrs: Vec<LogLikelihoodRatio>,
    capacity: usize,
    nof_bits: usize,
    config: UciDecoderConfig,
    payload: Option<UciPayload>,
}

impl std::fmt::Debug for UciBuffer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UciBuffer")
            .field("nof_llrs", &self.llrs.len())
            .field("capacity", &self.capacity)
            .field("nof_bits", &self.nof_bits)
            .field("payload", &self.payload)
            .finish()
    }
}

impl<'a> UciBuffer<'a> {
    /// Buffer for a field of `nof_bits` accepting up to `capacity` soft bits.
    pub fn new(decoder: &'a dyn UciDecoder, nof_bits: usize, modulation: Modulation, capacity: usize) -> Self {
        Self {
            decoder,
            llrs: Vec::new(),
            capacity,
            nof_bits,
            config: UciDecoderConfig { modulation },
            payload: None,
        }
    }

    pub fn nof_softbits(&self) -> usize {
        self.llrs.len()
    }

    /// Decoded field, available after the stream ended.
    pub fn payload(&self) -> Option<&UciPayload> {
        self.payload.as_ref()
    }

    pub fn into_payload(self) -> Option<UciPayload> {
        self.payload
    }
}

impl SoftbitSink for UciBuffer<'_> {
    fn on_new_softbits(&mut self, softbits: &[LogLikelihoodRatio]) -> PuschResult<()> {
        if self.llrs.len() + softbits.len() > self.capacity {
            return Err(PuschError::Overflow {
                offset: self.llrs.len(),
                len: softbits.len(),
                capacity: self.capacity,
            });
        }
        self.llrs.extend_from_slice(softbits);
        Ok(())
    }

    fn on_end_softbits(&mut self) -> PuschResult<()> {
        let mut bits = vec![0u8; self.nof_bits];
        let status = self.decoder.decode(&mut bits, &self.llrs, &self.config);
        trace!(nof_bits = self.nof_bits, nof_llrs = self.llrs.len(), ?status, "UCI field decoded");
        self.payload = Some(UciPayload { bits, status });
        Ok(())
    }
}
