//! # PUSCH Transport Block Decoding
//!
//! This crate implements the receive side of the NR physical uplink shared
//! channel (PUSCH) from demodulated soft bits up to the decoded transport
//! block, with HARQ soft combining across retransmissions.
//!
//! ## Overview
//!
//! - **CRC**: CRC16, CRC24A and CRC24B and the rule choosing between them
//! - **LDPC**: codeblock segmentation, rate dematching with soft combining,
//!   min-sum decoding with CRC early stop
//! - **Softbuffers**: per-HARQ-process storage of soft bits, decoded
//!   messages and codeblock CRC flags, pooled by RNTI and HARQ id
//! - **PUSCH decoder**: a streaming state machine accepting soft bits in
//!   chunks and reporting the transport block outcome on completion
//! - **PUSCH processor**: descriptor validation, UL-SCH sizing, channel
//!   estimation glue, UCI/data demultiplexing and result notification
//!
//! ## Signal Flow
//!
//! ```text
//! grid → DM-RS estimate → demodulate → demultiplex ─┬─▶ HARQ-ACK / CSI-1 → on_uci()
//!                                                   └─▶ segment → dematch (+softbuffer)
//!                                                        → LDPC decode → CB CRC → TB CRC → on_sch()
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use r4w_pusch::config::DecoderSettings;
//! use r4w_pusch::ldpc::BaseGraph;
//! use r4w_pusch::pusch::{PuschDecoder, PuschDecoderConfig, PuschDecoderNotifier, PuschDecoderResult, SoftbitSink};
//! use r4w_pusch::softbuffer::RxSoftbuffer;
//! use r4w_pusch::types::{LogLikelihoodRatio, Modulation};
//!
//! struct Print;
//!
//! impl PuschDecoderNotifier for Print {
//!     fn on_sch_data(&mut self, result: &PuschDecoderResult) {
//!         println!("TB CRC ok: {}", result.tb_crc_ok);
//!     }
//! }
//!
//! let mut decoder = PuschDecoder::software(&DecoderSettings::default());
//! let mut softbuffer = RxSoftbuffer::new(1);
//! let mut transport_block = vec![0u8; 40];
//! let mut notifier = Print;
//! let config = PuschDecoderConfig {
//!     base_graph: BaseGraph::Bg2,
//!     rv: 0,
//!     modulation: Modulation::Qpsk,
//!     nref: 0,
//!     nof_layers: 1,
//!     nof_ldpc_iterations: 6,
//!     use_early_stop: true,
//!     new_data: true,
//! };
//!
//! let llrs = vec![LogLikelihoodRatio::ZERO; 2100];
//! let mut buffer = decoder
//!     .new_data(&mut transport_block, &mut softbuffer, &mut notifier, config)
//!     .unwrap();
//! for chunk in llrs.chunks(300) {
//!     buffer.on_new_softbits(chunk).unwrap();
//! }
//! buffer.on_end_softbits().unwrap();
//! ```

pub mod bits;
pub mod config;
pub mod crc;
pub mod error;
pub mod ldpc;
pub mod observe;
pub mod pusch;
pub mod softbuffer;
pub mod softbuffer_pool;
pub mod stats;
pub mod types;

pub use config::{ConfigError, DecoderSettings, PuschRxConfig};
pub use crc::{select_crc, CrcCalculator, CrcPolynomial, CrcSet};
pub use error::{PduValidationError, PuschError, PuschResult, SoftbufferPoolError};
pub use pusch::{
    PuschDecoder, PuschDecoderBuffer, PuschDecoderConfig, PuschDecoderNotifier, PuschDecoderResult, PuschPdu,
    PuschProcessor, SoftbitSink,
};
pub use softbuffer::RxSoftbuffer;
pub use softbuffer_pool::{RxSoftbufferPool, SoftbufferIdentifier, SoftbufferPoolConfig};
pub use types::{CyclicPrefix, DmrsType, LogLikelihoodRatio, Modulation};
