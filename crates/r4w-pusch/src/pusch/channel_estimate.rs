//! # PUSCH Channel Estimate
//!
//! Storage for the DM-RS based channel estimate of one reception, plus the
//! interfaces of the external estimator and demodulator.
//!
//! Coefficients are kept per receive port, transmit layer and OFDM symbol,
//! one per subcarrier:
//!
//! ```text
//!   port 0 ─┬─ layer 0 ─┬─ symbol 0  [sc 0 .. nof_prb·12)
//!           │           ├─ symbol 1
//!           │           └─ ...
//!           └─ layer 1 ── ...
//!   port 1 ── ...
//! ```
//!
//! Noise variance is tracked per port and RSRP per port and layer; the
//! ratio of their averages gives the SINR reported with the results.

use num_complex::Complex32;
use serde::{Deserialize, Serialize};

use crate::error::PuschResult;
use crate::types::{CyclicPrefix, DmrsType, Modulation, NRE};

use super::decoder::SoftbitSink;

/// Maximum dimensions of a channel estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelEstimateDimensions {
    pub nof_prb: usize,
    pub nof_symbols: usize,
    pub nof_rx_ports: usize,
    pub nof_tx_layers: usize,
}

impl Default for ChannelEstimateDimensions {
    fn default() -> Self {
        Self {
            nof_prb: 275,
            nof_symbols: 14,
            nof_rx_ports: 4,
            nof_tx_layers: 1,
        }
    }
}

impl ChannelEstimateDimensions {
    pub fn nof_subcarriers(&self) -> usize {
        self.nof_prb * NRE
    }
}

/// Channel quality derived from an estimate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelStateInformation {
    /// None if no noise or signal power was measured.
    pub sinr_db: Option<f32>,
}

/// Channel coefficients and measurements of one reception.
#[derive(Debug, Clone)]
pub struct ChannelEstimate {
    dims: ChannelEstimateDimensions,
    coefficients: Vec<Complex32>,
    noise_variance: Vec<f32>,
    rsrp: Vec<f32>,
}

impl ChannelEstimate {
    pub fn new(dims: ChannelEstimateDimensions) -> Self {
        let nof_coefficients = dims.nof_rx_ports * dims.nof_tx_layers * dims.nof_symbols * dims.nof_subcarriers();
        Self {
            dims,
            coefficients: vec![Complex32::new(0.0, 0.0); nof_coefficients],
            noise_variance: vec![0.0; dims.nof_rx_ports],
            rsrp: vec![0.0; dims.nof_rx_ports * dims.nof_tx_layers],
        }
    }

    pub fn size(&self) -> &ChannelEstimateDimensions {
        &self.dims
    }

    fn symbol_range(&self, symbol: usize, port: usize, layer: usize) -> std::ops::Range<usize> {
        let nof_sc = self.dims.nof_subcarriers();
        let index = (port * self.dims.nof_tx_layers + layer) * self.dims.nof_symbols + symbol;
        index * nof_sc..(index + 1) * nof_sc
    }

    /// Coefficients of one symbol, port and layer.
    ///
    /// # Panics
    ///
    /// If any index exceeds the dimensions.
    pub fn get_symbol_ch_estimate(&self, symbol: usize, port: usize, layer: usize) -> &[Complex32] {
        &self.coefficients[self.symbol_range(symbol, port, layer)]
    }

    pub fn get_symbol_ch_estimate_mut(&mut self, symbol: usize, port: usize, layer: usize) -> &mut [Complex32] {
        let range = self.symbol_range(symbol, port, layer);
        &mut self.coefficients[range]
    }

    pub fn set_noise_variance(&mut self, port: usize, variance: f32) {
        self.noise_variance[port] = variance;
    }

    pub fn get_noise_variance(&self, port: usize) -> f32 {
        self.noise_variance[port]
    }

    pub fn set_rsrp(&mut self, port: usize, layer: usize, rsrp: f32) {
        self.rsrp[port * self.dims.nof_tx_layers + layer] = rsrp;
    }

    pub fn get_rsrp(&self, port: usize, layer: usize) -> f32 {
        self.rsrp[port * self.dims.nof_tx_layers + layer]
    }

    /// Null the coefficient at subcarrier `dc_position` over the given
    /// symbols for the first `nof_ports` ports and `nof_layers` layers.
    pub fn zero_dc(&mut self, dc_position: usize, nof_ports: usize, nof_layers: usize, symbols: std::ops::Range<usize>) {
        for port in 0..nof_ports {
            for layer in 0..nof_layers {
                for symbol in symbols.clone() {
                    if let Some(ce) = self.get_symbol_ch_estimate_mut(symbol, port, layer).get_mut(dc_position) {
                        *ce = Complex32::new(0.0, 0.0);
                    }
                }
            }
        }
    }

    /// SINR from the average RSRP over the average noise variance.
    pub fn get_channel_state_information(&self) -> ChannelStateInformation {
        let mean = |v: &[f32]| v.iter().sum::<f32>() / v.len().max(1) as f32;
        let noise = mean(&self.noise_variance);
        let signal = mean(&self.rsrp);
        let sinr_db = (noise > 0.0 && signal > 0.0).then(|| 10.0 * (signal / noise).log10());
        ChannelStateInformation { sinr_db }
    }

    /// Forget every coefficient and measurement.
    pub fn reset(&mut self) {
        self.coefficients.fill(Complex32::new(0.0, 0.0));
        self.noise_variance.fill(0.0);
        self.rsrp.fill(0.0);
    }
}

/// Read access to the received resource grid.
pub trait ResourceGridReader {
    /// Resource element of `port` at `symbol` and `subcarrier`.
    fn get(&self, port: u8, symbol: usize, subcarrier: usize) -> Complex32;
}

/// DM-RS estimator parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct DmrsEstimatorConfig {
    pub slot: u64,
    pub dmrs_type: DmrsType,
    pub scrambling_id: u16,
    pub n_scid: bool,
    /// Linear amplitude of DM-RS relative to data
    pub scaling: f32,
    pub cp: CyclicPrefix,
    pub symbols_mask: Vec<bool>,
    /// Allocated resource blocks relative to point A
    pub rb_mask: Vec<bool>,
    pub first_symbol: usize,
    pub nof_symbols: usize,
    pub nof_tx_layers: usize,
    pub rx_ports: Vec<u8>,
}

/// DM-RS based channel estimator.
pub trait DmrsPuschEstimator: Send {
    fn estimate(&mut self, estimate: &mut ChannelEstimate, grid: &dyn ResourceGridReader, config: &DmrsEstimatorConfig);
}

/// Demodulator parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct DemodulatorConfig {
    pub rnti: u16,
    pub rb_mask: Vec<bool>,
    pub modulation: Modulation,
    pub start_symbol_index: usize,
    pub nof_symbols: usize,
    pub dmrs_symbol_mask: Vec<bool>,
    pub dmrs_type: DmrsType,
    pub nof_cdm_groups_without_data: usize,
    pub n_id: u16,
    pub nof_tx_layers: usize,
    pub rx_ports: Vec<u8>,
}

/// Equalizes, demaps and descrambles the data resource elements.
pub trait PuschDemodulator: Send {
    /// Stream the codeword soft bits into `sink`.
    ///
    /// The caller ends the stream once this returns.
    fn demodulate(
        &mut self,
        sink: &mut dyn SoftbitSink,
        grid: &dyn ResourceGridReader,
        estimate: &ChannelEstimate,
        config: &DemodulatorConfig,
    ) -> PuschResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn dims() -> ChannelEstimateDimensions {
        ChannelEstimateDimensions {
            nof_prb: 2,
            nof_symbols: 14,
            nof_rx_ports: 2,
            nof_tx_layers: 1,
        }
    }

    #[test]
    fn test_symbol_views_are_disjoint() {
        let mut ce = ChannelEstimate::new(dims());
        ce.get_symbol_ch_estimate_mut(3, 1, 0)[5] = Complex32::new(1.0, -1.0);
        assert_eq!(ce.get_symbol_ch_estimate(3, 1, 0).len(), 24);
        assert_eq!(ce.get_symbol_ch_estimate(3, 1, 0)[5], Complex32::new(1.0, -1.0));
        assert_eq!(ce.get_symbol_ch_estimate(3, 0, 0)[5], Complex32::new(0.0, 0.0));
        assert_eq!(ce.get_symbol_ch_estimate(4, 1, 0)[5], Complex32::new(0.0, 0.0));
    }

    #[test]
    fn test_zero_dc() {
        let mut ce = ChannelEstimate::new(dims());
        for port in 0..2 {
            for symbol in 0..14 {
                ce.get_symbol_ch_estimate_mut(symbol, port, 0).fill(Complex32::new(1.0, 0.0));
            }
        }
        ce.zero_dc(7, 2, 1, 2..12);
        assert_eq!(ce.get_symbol_ch_estimate(2, 0, 0)[7], Complex32::new(0.0, 0.0));
        assert_eq!(ce.get_symbol_ch_estimate(11, 1, 0)[7], Complex32::new(0.0, 0.0));
        assert_eq!(ce.get_symbol_ch_estimate(12, 0, 0)[7], Complex32::new(1.0, 0.0));
        assert_eq!(ce.get_symbol_ch_estimate(5, 0, 0)[6], Complex32::new(1.0, 0.0));

        // Out of range positions are ignored.
        ce.zero_dc(1000, 2, 1, 0..14);
    }

    #[test]
    fn test_channel_state_information() {
        let mut ce = ChannelEstimate::new(dims());
        assert_eq!(ce.get_channel_state_information().sinr_db, None);

        ce.set_noise_variance(0, 0.01);
        ce.set_noise_variance(1, 0.03);
        ce.set_rsrp(0, 0, 1.5);
        ce.set_rsrp(1, 0, 2.5);
        let sinr = ce.get_channel_state_information().sinr_db.unwrap();
        assert_relative_eq!(sinr, 20.0, epsilon = 1e-4);

        ce.reset();
        assert_eq!(ce.get_rsrp(1, 0), 0.0);
        assert_eq!(ce.get_channel_state_information().sinr_db, None);
    }
}
