//! # Decoder Metrics
//!
//! Lock-free counters shared between decoder instances and an exporter:
//!
//! - **Counters**: transport blocks decoded and failed, codeblocks decoded
//!   and skipped, outer CRC false positives, protocol faults
//! - **Histogram**: LDPC iterations per decoded codeblock
//!
//! ## Example
//!
//! ```rust
//! use r4w_pusch::observe::DecoderMetrics;
//!
//! let metrics = DecoderMetrics::new();
//! metrics.tb_ok.inc();
//! metrics.ldpc_iterations.observe(3);
//!
//! let snapshot = metrics.snapshot();
//! assert_eq!(snapshot.tb_ok, 1);
//! assert!(metrics.to_prometheus().contains("r4w_pusch_tb_ok_total 1"));
//! ```

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic atomic counter.
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_by(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn reset(&self) {
        self.value.store(0, Ordering::Relaxed);
    }
}

/// Integer histogram with fixed upper bucket bounds.
#[derive(Debug)]
pub struct Histogram {
    /// Inclusive upper bound of each bucket; one extra overflow bucket follows.
    bounds: Vec<u64>,
    buckets: Vec<AtomicU64>,
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::iterations()
    }
}

impl Histogram {
    pub fn new(bounds: Vec<u64>) -> Self {
        let nof_buckets = bounds.len() + 1;
        Self {
            bounds,
            buckets: (0..nof_buckets).map(|_| AtomicU64::new(0)).collect(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Buckets suited to LDPC iteration counts.
    pub fn iterations() -> Self {
        Self::new(vec![1, 2, 3, 4, 6, 8, 12, 16, 25])
    }

    pub fn observe(&self, value: u64) {
        let idx = self
            .bounds
            .iter()
            .position(|&b| value <= b)
            .unwrap_or(self.bounds.len());
        self.buckets[idx].fetch_add(1, Ordering::Relaxed);
        self.sum.fetch_add(value, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn bucket_counts(&self) -> Vec<u64> {
        self.buckets.iter().map(|b| b.load(Ordering::Relaxed)).collect()
    }

    pub fn bounds(&self) -> &[u64] {
        &self.bounds
    }

    pub fn reset(&self) {
        self.buckets.iter().for_each(|b| b.store(0, Ordering::Relaxed));
        self.sum.store(0, Ordering::Relaxed);
        self.count.store(0, Ordering::Relaxed);
    }
}

/// Transport block decoder metrics.
#[derive(Debug, Default)]
pub struct DecoderMetrics {
    /// Transport blocks with a passing CRC
    pub tb_ok: Counter,
    /// Transport blocks with a failing CRC
    pub tb_ko: Counter,
    /// Codeblocks run through the LDPC decoder
    pub cb_decoded: Counter,
    /// Codeblocks skipped because an earlier attempt passed
    pub cb_skipped: Counter,
    /// Transport blocks whose codeblocks all passed but the outer CRC did not
    pub outer_crc_false_positives: Counter,
    /// Overflows, misalignments and segmentation mismatches
    pub protocol_faults: Counter,
    pub ldpc_iterations: Histogram,
}

impl DecoderMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> DecoderMetricsSnapshot {
        DecoderMetricsSnapshot {
            tb_ok: self.tb_ok.get(),
            tb_ko: self.tb_ko.get(),
            cb_decoded: self.cb_decoded.get(),
            cb_skipped: self.cb_skipped.get(),
            outer_crc_false_positives: self.outer_crc_false_positives.get(),
            protocol_faults: self.protocol_faults.get(),
            ldpc_iterations_count: self.ldpc_iterations.count(),
            ldpc_iterations_sum: self.ldpc_iterations.sum(),
        }
    }

    pub fn reset(&self) {
        self.tb_ok.reset();
        self.tb_ko.reset();
        self.cb_decoded.reset();
        self.cb_skipped.reset();
        self.outer_crc_false_positives.reset();
        self.protocol_faults.reset();
        self.ldpc_iterations.reset();
    }

    /// Export in Prometheus text format.
    pub fn to_prometheus(&self) -> String {
        let s = self.snapshot();
        let mut out = String::new();

        let counters = [
            ("tb_ok_total", "Transport blocks decoded with a passing CRC", s.tb_ok),
            ("tb_ko_total", "Transport blocks with a failing CRC", s.tb_ko),
            ("cb_decoded_total", "Codeblocks decoded", s.cb_decoded),
            ("cb_skipped_total", "Codeblocks skipped after an earlier pass", s.cb_skipped),
            (
                "outer_crc_false_positives_total",
                "Codeblock CRC passes rejected by the transport block CRC",
                s.outer_crc_false_positives,
            ),
            ("protocol_faults_total", "Decoder protocol faults", s.protocol_faults),
        ];
        for (name, help, value) in counters {
            let _ = writeln!(out, "# HELP r4w_pusch_{} {}", name, help);
            let _ = writeln!(out, "# TYPE r4w_pusch_{} counter", name);
            let _ = writeln!(out, "r4w_pusch_{} {}", name, value);
        }

        let _ = writeln!(out, "# HELP r4w_pusch_ldpc_iterations LDPC iterations per codeblock");
        let _ = writeln!(out, "# TYPE r4w_pusch_ldpc_iterations histogram");
        let mut cumulative = 0;
        let counts = self.ldpc_iterations.bucket_counts();
        for (bound, count) in self.ldpc_iterations.bounds().iter().zip(&counts) {
            cumulative += count;
            let _ = writeln!(out, "r4w_pusch_ldpc_iterations_bucket{{le=\"{}\"}} {}", bound, cumulative);
        }
        cumulative += counts.last().copied().unwrap_or(0);
        let _ = writeln!(out, "r4w_pusch_ldpc_iterations_bucket{{le=\"+Inf\"}} {}", cumulative);
        let _ = writeln!(out, "r4w_pusch_ldpc_iterations_sum {}", s.ldpc_iterations_sum);
        let _ = writeln!(out, "r4w_pusch_ldpc_iterations_count {}", s.ldpc_iterations_count);

        out
    }
}

/// Point-in-time copy of [`DecoderMetrics`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecoderMetricsSnapshot {
    pub tb_ok: u64,
    pub tb_ko: u64,
    pub cb_decoded: u64,
    pub cb_skipped: u64,
    pub outer_crc_false_positives: u64,
    pub protocol_faults: u64,
    pub ldpc_iterations_count: u64,
    pub ldpc_iterations_sum: u64,
}

impl DecoderMetricsSnapshot {
    /// Transport block success ratio, 1.0 before any decode.
    pub fn tb_success_rate(&self) -> f64 {
        let total = self.tb_ok + self.tb_ko;
        if total == 0 {
            1.0
        } else {
            self.tb_ok as f64 / total as f64
        }
    }

    pub fn avg_iterations(&self) -> f64 {
        if self.ldpc_iterations_count == 0 {
            0.0
        } else {
            self.ldpc_iterations_sum as f64 / self.ldpc_iterations_count as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_counter() {
        let counter = Counter::new();
        counter.inc();
        counter.inc_by(4);
        assert_eq!(counter.get(), 5);
        counter.reset();
        assert_eq!(counter.get(), 0);
    }

    #[test]
    fn test_histogram_buckets() {
        let hist = Histogram::new(vec![1, 4, 8]);
        for v in [1, 2, 4, 5, 30] {
            hist.observe(v);
        }
        assert_eq!(hist.bucket_counts(), vec![1, 2, 1, 1]);
        assert_eq!(hist.count(), 5);
        assert_eq!(hist.sum(), 42);

        hist.reset();
        assert_eq!(hist.count(), 0);
        assert_eq!(hist.bucket_counts(), vec![0; 4]);
    }

    #[test]
    fn test_snapshot_rates() {
        let metrics = DecoderMetrics::new();
        metrics.tb_ok.inc_by(3);
        metrics.tb_ko.inc();
        metrics.ldpc_iterations.observe(2);
        metrics.ldpc_iterations.observe(4);

        let s = metrics.snapshot();
        assert_relative_eq!(s.tb_success_rate(), 0.75);
        assert_relative_eq!(s.avg_iterations(), 3.0);

        metrics.reset();
        assert_eq!(metrics.snapshot(), DecoderMetricsSnapshot::default());
    }

    #[test]
    fn test_prometheus_export() {
        let metrics = DecoderMetrics::new();
        metrics.cb_skipped.inc_by(2);
        metrics.ldpc_iterations.observe(3);

        let out = metrics.to_prometheus();
        assert!(out.contains("# TYPE r4w_pusch_cb_skipped_total counter"));
        assert!(out.contains("r4w_pusch_cb_skipped_total 2"));
        assert!(out.contains("r4w_pusch_ldpc_iterations_bucket{le=\"2\"} 0"));
        assert!(out.contains("r4w_pusch_ldpc_iterations_bucket{le=\"3\"} 1"));
        assert!(out.contains("r4w_pusch_ldpc_iterations_bucket{le=\"+Inf\"} 1"));
        assert!(out.contains("r4w_pusch_ldpc_iterations_count 1"));
    }
}
