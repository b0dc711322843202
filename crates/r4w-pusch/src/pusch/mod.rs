//! # PUSCH Reception
//!
//! Everything between the resource grid and the MAC for one uplink shared
//! channel transmission:
//!
//! - [`PuschPdu`] and [`PuschPduValidator`]: what to receive and whether it
//!   fits the receiver
//! - [`get_ulsch_information`]: split of the codeword between UCI and data
//! - [`UlschDemultiplexer`]: routes demodulated soft bits to their decoders
//! - [`PuschDecoder`]: streaming transport block decoder with HARQ combining
//! - [`PuschProcessor`]: the chain above behind a single `process()` call
//!
//! ## Decoder lifecycle
//!
//! ```text
//!          new_data()            on_end_softbits()
//!   Idle ─────────────▶ Accumulating ─────────────▶ Finalizing ──▶ Idle
//!     ▲                     │  drop / overflow                       │
//!     └─────────────────────┴──────────────── notify ◀───────────────┘
//! ```

pub mod channel_estimate;
pub mod decoder;
pub mod demultiplex;
pub mod pdu;
pub mod processor;
pub mod uci;
pub mod ulsch_info;
pub mod validator;

#[cfg(test)]
pub(crate) mod testing;

pub use channel_estimate::{
    ChannelEstimate, ChannelEstimateDimensions, ChannelStateInformation, DemodulatorConfig, DmrsEstimatorConfig,
    DmrsPuschEstimator, PuschDemodulator, ResourceGridReader,
};
pub use decoder::{
    DecoderState, DummySink, PuschDecoder, PuschDecoderBuffer, PuschDecoderConfig, PuschDecoderNotifier,
    PuschDecoderResult, SoftbitSink,
};
pub use demultiplex::{DemultiplexConfig, DemultiplexCounts, UlschDemultiplexer};
pub use pdu::{PuschCodeword, PuschPdu, RbAllocation, UciDescription};
pub use processor::{
    PuschProcessor, PuschProcessorConfig, PuschProcessorResultNotifier, PuschProcessorSchResult,
    PuschProcessorUciResult,
};
pub use uci::{UciBuffer, UciDecoder, UciDecoderConfig, UciPayload, UciStatus};
pub use ulsch_info::{get_ulsch_information, UlschConfiguration, UlschInformation};
pub use validator::PuschPduValidator;

use crate::types::NRE;

/// Largest carrier in resource blocks.
pub const MAX_NOF_PRB: usize = 275;

/// Symbols per slot with normal cyclic prefix.
pub const MAX_NSYMB_PER_SLOT: usize = 14;

/// Largest number of transmission layers.
pub const MAX_NOF_LAYERS: usize = 4;

/// Largest codeword in soft bits: every RE of a full carrier and slot at
/// 256-QAM on every layer.
pub const CODEWORD_MAX_SIZE: usize = MAX_NOF_PRB * NRE * MAX_NSYMB_PER_SLOT * 8 * MAX_NOF_LAYERS;
