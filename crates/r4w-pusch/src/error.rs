//! PUSCH error types

use thiserror::Error;

use crate::pusch::decoder::DecoderState;

/// Result type for PUSCH operations
pub type PuschResult<T> = Result<T, PuschError>;

/// Errors raised by the uplink decoding chain.
///
/// CRC failures are not errors: they are reported through
/// [`PuschDecoderResult`](crate::pusch::PuschDecoderResult).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PuschError {
    /// The PUSCH descriptor failed validation
    #[error("PUSCH descriptor rejected: {0}")]
    DescriptorRejected(#[from] PduValidationError),

    /// Transport block exceeds the maximum TBS
    #[error("transport block of {tbs} bits exceeds the maximum of {max} bits")]
    TransportBlockTooLarge { tbs: usize, max: usize },

    /// Decoder or processor configuration is not usable
    #[error("invalid decoder configuration: {0}")]
    InvalidDecoderConfig(String),

    /// Operation called in the wrong decoder state
    #[error("invalid decoder state: expected {expected:?}, found {actual:?}")]
    InvalidState {
        expected: DecoderState,
        actual: DecoderState,
    },

    /// Soft bits exceed the accumulation buffer
    #[error("soft bit overflow: offset {offset} + block {len} exceeds capacity {capacity}")]
    Overflow {
        offset: usize,
        len: usize,
        capacity: usize,
    },

    /// Accumulated soft bits do not form whole modulation symbols
    #[error("{nof_softbits} soft bits are not a multiple of the modulation order {modulation_order}")]
    Misaligned {
        nof_softbits: usize,
        modulation_order: usize,
    },

    /// Segmentation and softbuffer disagree on the number of codeblocks
    #[error("segmentation produced {segmented} codeblocks but the softbuffer holds {softbuffer}")]
    CodeblockCountMismatch { segmented: usize, softbuffer: usize },

    /// A rate-matched codeblock view has the wrong length
    #[error("codeblock {cb_id}: rate-matched length {actual} differs from metadata {expected}")]
    RateMatchedLengthMismatch {
        cb_id: usize,
        expected: usize,
        actual: usize,
    },

    /// Segmentation parameters are inconsistent
    #[error("segmentation failed: {0}")]
    Segmentation(String),
}

impl PuschError {
    /// Errors detected while validating a descriptor or configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            PuschError::DescriptorRejected(_)
                | PuschError::TransportBlockTooLarge { .. }
                | PuschError::InvalidDecoderConfig(_)
        )
    }

    /// Internal-consistency faults caused by a caller or upstream bug.
    pub fn is_protocol(&self) -> bool {
        !self.is_configuration()
    }
}

/// Reasons a PUSCH descriptor is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PduValidationError {
    #[error("BWP start {start} + size {size} exceeds the grid of {max} PRB")]
    BwpOutOfGrid { start: usize, size: usize, max: usize },

    #[error("{nof_layers} transmit layers exceed the supported {max}")]
    TooManyLayers { nof_layers: usize, max: usize },

    #[error("{nof_ports} receive ports exceed the supported {max}")]
    TooManyRxPorts { nof_ports: usize, max: usize },

    #[error("frequency allocation does not fit in the BWP")]
    FrequencyAllocationOutsideBwp,

    #[error("HARQ-ACK field of {0} bits exceeds the supported maximum")]
    HarqAckTooLong(usize),

    #[error("CSI Part 1 field of {0} bits exceeds the supported maximum")]
    CsiPart1TooLong(usize),

    #[error("CSI Part 2 multiplexing is not supported")]
    CsiPart2NotSupported,

    #[error("DM-RS symbol mask has {actual} entries, slot has {expected} symbols")]
    DmrsMaskSize { expected: usize, actual: usize },

    #[error("DM-RS symbol mask is empty")]
    DmrsMaskEmpty,

    #[error("first DM-RS symbol {dmrs} precedes the allocation start {start}")]
    DmrsBeforeAllocation { dmrs: usize, start: usize },

    #[error("last DM-RS symbol {dmrs} is beyond the allocation end {end}")]
    DmrsAfterAllocation { dmrs: usize, end: usize },

    #[error("allocation ends at symbol {end}, slot has {nof_symbols} symbols")]
    AllocationOutsideSlot { end: usize, nof_symbols: usize },

    #[error("only DM-RS type 1 is supported")]
    UnsupportedDmrsType,

    #[error("{0} CDM groups without data; only 2 are supported")]
    UnsupportedCdmGroups(usize),

    #[error("DC position {position} is outside [0, {limit})")]
    DcOutOfRange { position: usize, limit: usize },
}

/// Errors from the softbuffer pool.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoftbufferPoolError {
    /// All softbuffers are reserved
    #[error("softbuffer pool exhausted")]
    Exhausted,

    /// Requested codeblock count exceeds the configured maximum
    #[error("{requested} codeblocks exceed the pool limit of {max}")]
    TooManyCodeblocks { requested: usize, max: usize },
}
