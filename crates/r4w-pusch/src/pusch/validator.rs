//! PUSCH descriptor validation
//!
//! Rejects descriptors the processor cannot handle before any processing
//! starts. Rules are checked in a fixed order and the first violation is
//! reported.

use crate::error::PduValidationError;
use crate::types::{DmrsType, NRE};

use super::channel_estimate::ChannelEstimateDimensions;
use super::pdu::PuschPdu;

/// Largest HARQ-ACK or CSI Part 1 field, in bits.
pub const MAX_UCI_FIELD_LEN: usize = 11;

/// Checks descriptors against the channel estimate dimensions.
#[derive(Debug, Clone)]
pub struct PuschPduValidator {
    ce_dims: ChannelEstimateDimensions,
}

impl PuschPduValidator {
    pub fn new(ce_dims: ChannelEstimateDimensions) -> Self {
        Self { ce_dims }
    }

    pub fn ce_dims(&self) -> &ChannelEstimateDimensions {
        &self.ce_dims
    }

    pub fn is_valid(&self, pdu: &PuschPdu) -> bool {
        self.validate(pdu).is_ok()
    }

    pub fn validate(&self, pdu: &PuschPdu) -> Result<(), PduValidationError> {
        let dims = &self.ce_dims;
        let nof_symbols_slot = pdu.nof_symbols_per_slot();

        if pdu.bwp_start_rb + pdu.bwp_size_rb > dims.nof_prb {
            return Err(PduValidationError::BwpOutOfGrid {
                start: pdu.bwp_start_rb,
                size: pdu.bwp_size_rb,
                max: dims.nof_prb,
            });
        }

        if pdu.nof_tx_layers > dims.nof_tx_layers {
            return Err(PduValidationError::TooManyLayers {
                nof_layers: pdu.nof_tx_layers,
                max: dims.nof_tx_layers,
            });
        }

        if pdu.rx_ports.len() > dims.nof_rx_ports {
            return Err(PduValidationError::TooManyRxPorts {
                nof_ports: pdu.rx_ports.len(),
                max: dims.nof_rx_ports,
            });
        }

        if !pdu.freq_alloc.is_bwp_valid(pdu.bwp_start_rb, pdu.bwp_size_rb) {
            return Err(PduValidationError::FrequencyAllocationOutsideBwp);
        }

        if pdu.uci.nof_harq_ack > MAX_UCI_FIELD_LEN {
            return Err(PduValidationError::HarqAckTooLong(pdu.uci.nof_harq_ack));
        }
        if pdu.uci.nof_csi_part1 > MAX_UCI_FIELD_LEN {
            return Err(PduValidationError::CsiPart1TooLong(pdu.uci.nof_csi_part1));
        }
        if pdu.uci.nof_csi_part2 != 0 {
            return Err(PduValidationError::CsiPart2NotSupported);
        }

        if pdu.dmrs_symbol_mask.len() != nof_symbols_slot {
            return Err(PduValidationError::DmrsMaskSize {
                expected: nof_symbols_slot,
                actual: pdu.dmrs_symbol_mask.len(),
            });
        }

        let (Some(first_dmrs), Some(last_dmrs)) = (pdu.dmrs_symbols().next(), pdu.dmrs_symbols().last()) else {
            return Err(PduValidationError::DmrsMaskEmpty);
        };

        if first_dmrs < pdu.start_symbol_index {
            return Err(PduValidationError::DmrsBeforeAllocation {
                dmrs: first_dmrs,
                start: pdu.start_symbol_index,
            });
        }

        let end = pdu.start_symbol_index + pdu.nof_symbols;
        if last_dmrs >= end {
            return Err(PduValidationError::DmrsAfterAllocation { dmrs: last_dmrs, end });
        }

        if end > nof_symbols_slot {
            return Err(PduValidationError::AllocationOutsideSlot {
                end,
                nof_symbols: nof_symbols_slot,
            });
        }

        if pdu.dmrs != DmrsType::Type1 {
            return Err(PduValidationError::UnsupportedDmrsType);
        }

        if pdu.nof_cdm_groups_without_data != 2 {
            return Err(PduValidationError::UnsupportedCdmGroups(pdu.nof_cdm_groups_without_data));
        }

        if let Some(position) = pdu.dc_position {
            let limit = dims.nof_prb * NRE;
            if position >= limit {
                return Err(PduValidationError::DcOutOfRange { position, limit });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pusch::testing::test_pdu;
    use crate::types::CyclicPrefix;

    fn validator() -> PuschPduValidator {
        PuschPduValidator::new(ChannelEstimateDimensions {
            nof_prb: 25,
            nof_symbols: 14,
            nof_rx_ports: 2,
            nof_tx_layers: 1,
        })
    }

    fn check(edit: impl FnOnce(&mut PuschPdu)) -> Result<(), PduValidationError> {
        let mut pdu = test_pdu();
        edit(&mut pdu);
        validator().validate(&pdu)
    }

    #[test]
    fn test_valid_descriptor() {
        assert_eq!(check(|_| {}), Ok(()));
        assert!(validator().is_valid(&test_pdu()));
    }

    #[test]
    fn test_grid_and_antenna_limits() {
        assert!(matches!(
            check(|p| p.bwp_start_rb = 20),
            Err(PduValidationError::BwpOutOfGrid { start: 20, .. })
        ));
        assert_eq!(
            check(|p| p.nof_tx_layers = 2),
            Err(PduValidationError::TooManyLayers { nof_layers: 2, max: 1 })
        );
        assert_eq!(
            check(|p| p.rx_ports = vec![0, 1, 2]),
            Err(PduValidationError::TooManyRxPorts { nof_ports: 3, max: 2 })
        );
        assert_eq!(
            check(|p| p.freq_alloc = crate::pusch::RbAllocation::contiguous(8, 4)),
            Err(PduValidationError::FrequencyAllocationOutsideBwp)
        );
    }

    #[test]
    fn test_uci_limits() {
        assert_eq!(check(|p| p.uci.nof_harq_ack = 11), Ok(()));
        assert_eq!(check(|p| p.uci.nof_harq_ack = 12), Err(PduValidationError::HarqAckTooLong(12)));
        assert_eq!(check(|p| p.uci.nof_csi_part1 = 13), Err(PduValidationError::CsiPart1TooLong(13)));
        assert_eq!(check(|p| p.uci.nof_csi_part2 = 1), Err(PduValidationError::CsiPart2NotSupported));
    }

    #[test]
    fn test_dmrs_rules() {
        assert_eq!(
            check(|p| p.cp = CyclicPrefix::Extended),
            Err(PduValidationError::DmrsMaskSize { expected: 12, actual: 14 })
        );
        assert_eq!(
            check(|p| p.dmrs_symbol_mask = vec![false; 14]),
            Err(PduValidationError::DmrsMaskEmpty)
        );
        assert_eq!(
            check(|p| {
                p.start_symbol_index = 3;
                p.nof_symbols = 11;
            }),
            Err(PduValidationError::DmrsBeforeAllocation { dmrs: 2, start: 3 })
        );
        assert_eq!(
            check(|p| p.nof_symbols = 11),
            Err(PduValidationError::DmrsAfterAllocation { dmrs: 11, end: 11 })
        );
        assert_eq!(check(|p| p.dmrs = DmrsType::Type2), Err(PduValidationError::UnsupportedDmrsType));
        assert_eq!(
            check(|p| p.nof_cdm_groups_without_data = 1),
            Err(PduValidationError::UnsupportedCdmGroups(1))
        );
    }

    #[test]
    fn test_allocation_outside_slot() {
        assert_eq!(
            check(|p| p.nof_symbols = 15),
            Err(PduValidationError::AllocationOutsideSlot { end: 15, nof_symbols: 14 })
        );
    }

    #[test]
    fn test_dc_position() {
        assert_eq!(check(|p| p.dc_position = Some(299)), Ok(()));
        assert_eq!(
            check(|p| p.dc_position = Some(300)),
            Err(PduValidationError::DcOutOfRange { position: 300, limit: 300 })
        );
    }

    #[test]
    fn test_first_violation_wins() {
        let result = check(|p| {
            p.nof_tx_layers = 4;
            p.dmrs = DmrsType::Type2;
        });
        assert!(matches!(result, Err(PduValidationError::TooManyLayers { .. })));
    }
}
