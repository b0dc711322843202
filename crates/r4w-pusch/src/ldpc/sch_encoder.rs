//! Shared channel encoder
//!
//! Transmit chain used for loopback testing of the receiver:
//! TB CRC → segmentation → codeblock CRC → LDPC encoding → rate matching,
//! concatenating every rate-matched codeblock into one codeword.

use super::{LdpcEncoder, LdpcRateMatcher, LdpcSegmenter, SegmenterConfig};
use crate::bits::unpack_bytes;
use crate::error::PuschResult;

/// Encoder parameters, identical to the receive-side segmentation ones.
pub type SchEncoderConfig = SegmenterConfig;

/// UL-SCH transport block encoder.
#[derive(Debug, Default)]
pub struct SchEncoder {
    segmenter: LdpcSegmenter,
    encoder: LdpcEncoder,
    matcher: LdpcRateMatcher,
}

impl SchEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode a transport block into codeword bits (one bit per byte).
    pub fn encode(&mut self, transport_block: &[u8], config: &SchEncoderConfig) -> PuschResult<Vec<u8>> {
        let tb_bits = unpack_bytes(transport_block);
        let codeblocks = self.segmenter.segment_tx(&tb_bits, config)?;

        let total: usize = codeblocks.iter().map(|cb| cb.metadata.cb_specific.rm_length).sum();
        let mut codeword = vec![0u8; total];
        let mut encoded = Vec::new();
        for cb in &codeblocks {
            let common = &cb.metadata.tb_common;
            let specific = &cb.metadata.cb_specific;
            encoded.clear();
            encoded.resize(specific.full_length, 0);
            self.encoder
                .encode(&mut encoded, &cb.message, common.base_graph, common.lifting_size);

            let range = specific.cw_offset..specific.cw_offset + specific.rm_length;
            self.matcher.rate_match(&mut codeword[range], &encoded, &cb.metadata);
        }
        Ok(codeword)
    }
}
