//! # Observability
//!
//! - **Logging**: structured events via `tracing`
//! - **Metrics**: Prometheus-compatible decoder counters
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ PuschDecoder / PuschProcessor / pool        │
//! │   debug!(), warn!(), metrics.tb_ok.inc()    │
//! └──────────────────────┬──────────────────────┘
//!            ┌───────────┴───────────┐
//!            ▼                       ▼
//!      ┌───────────┐        ┌────────────────┐
//!      │  Logging  │        │ DecoderMetrics │
//!      └───────────┘        └────────────────┘
//!       stdout/file          to_prometheus()
//! ```

pub mod logging;
pub mod metrics;

use std::sync::Arc;

pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
pub use metrics::{Counter, DecoderMetrics, DecoderMetricsSnapshot, Histogram};

/// Set up logging and create a shared metrics instance.
pub fn init(log_config: &LogConfig) -> std::io::Result<Arc<DecoderMetrics>> {
    init_logging(log_config)?;
    Ok(Arc::new(DecoderMetrics::new()))
}
