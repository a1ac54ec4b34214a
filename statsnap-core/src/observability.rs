/*!
Observability for the statsnap core.

- Structured logging through `tracing`, with a JSON subscriber installed by
  [`init_observability`]
- Prometheus counters for the codec behind the `metrics` feature
*/

#[cfg(feature = "metrics")]
use prometheus::{Histogram, HistogramOpts, IntCounter, Registry, TextEncoder};
#[cfg(feature = "metrics")]
use std::sync::OnceLock;
use tracing::subscriber::set_global_default;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry as TracingRegistry};

use crate::{Result, StatsError};

/// Default filter directive when `RUST_LOG` is unset
pub const DEFAULT_LOG_DIRECTIVE: &str = "statsnap=info";

#[cfg(feature = "metrics")]
static METRICS: OnceLock<CodecMetrics> = OnceLock::new();

/// Counters describing what the codec did and what it silently discarded
#[cfg(feature = "metrics")]
#[derive(Debug)]
pub struct CodecMetrics {
    pub archives_encoded_total: IntCounter,
    pub archives_decoded_total: IntCounter,
    pub decode_failures_total: IntCounter,
    pub dropped_records_total: IntCounter,
    pub skipped_chunks_total: IntCounter,
    pub archive_size_bytes: Histogram,

    registry: Registry,
}

#[cfg(feature = "metrics")]
fn int_counter(registry: &Registry, name: &str, help: &str) -> Result<IntCounter> {
    let counter = IntCounter::new(name, help)
        .map_err(|e| StatsError::storage(format!("Failed to create {name} metric: {e}")))?;
    registry
        .register(Box::new(counter.clone()))
        .map_err(|e| StatsError::storage(format!("Failed to register {name}: {e}")))?;
    Ok(counter)
}

#[cfg(feature = "metrics")]
impl CodecMetrics {
    fn new() -> Result<Self> {
        let registry = Registry::new();

        let archives_encoded_total = int_counter(
            &registry,
            "statsnap_archives_encoded_total",
            "Total archives produced by the codec",
        )?;
        let archives_decoded_total = int_counter(
            &registry,
            "statsnap_archives_decoded_total",
            "Total archives decoded successfully",
        )?;
        let decode_failures_total = int_counter(
            &registry,
            "statsnap_decode_failures_total",
            "Total archives rejected as truncated or oversized",
        )?;
        let dropped_records_total = int_counter(
            &registry,
            "statsnap_dropped_records_total",
            "Decoded records discarded because their identifier is unknown",
        )?;
        let skipped_chunks_total = int_counter(
            &registry,
            "statsnap_skipped_chunks_total",
            "Chunks skipped because their kind is unknown",
        )?;

        let archive_size_bytes = Histogram::with_opts(
            HistogramOpts::new("statsnap_archive_size_bytes", "Size of archives in bytes")
                .buckets(prometheus::exponential_buckets(64.0, 4.0, 10).map_err(|e| {
                    StatsError::storage(format!("Failed to build size buckets: {e}"))
                })?),
        )
        .map_err(|e| {
            StatsError::storage(format!("Failed to create archive_size_bytes metric: {e}"))
        })?;
        registry
            .register(Box::new(archive_size_bytes.clone()))
            .map_err(|e| {
                StatsError::storage(format!("Failed to register archive_size_bytes: {e}"))
            })?;

        Ok(Self {
            archives_encoded_total,
            archives_decoded_total,
            decode_failures_total,
            dropped_records_total,
            skipped_chunks_total,
            archive_size_bytes,
            registry,
        })
    }

    /// Get or initialize the global metrics instance
    ///
    /// Returns `None` only if the registry could not be built, in which case
    /// recording is skipped rather than failing the codec.
    pub fn global() -> Option<&'static CodecMetrics> {
        if let Some(metrics) = METRICS.get() {
            return Some(metrics);
        }
        match Self::new() {
            Ok(metrics) => Some(METRICS.get_or_init(|| metrics)),
            Err(e) => {
                tracing::warn!(error = %e, "codec metrics unavailable");
                None
            }
        }
    }

    pub fn record_encoded(&self, size_bytes: usize) {
        self.archives_encoded_total.inc();
        self.archive_size_bytes.observe(size_bytes as f64);
    }

    pub fn record_decoded(&self, size_bytes: usize) {
        self.archives_decoded_total.inc();
        self.archive_size_bytes.observe(size_bytes as f64);
    }

    pub fn record_decode_failure(&self) {
        self.decode_failures_total.inc();
    }

    pub fn record_dropped_records(&self, count: u64) {
        self.dropped_records_total.inc_by(count);
    }

    pub fn record_skipped_chunk(&self) {
        self.skipped_chunks_total.inc();
    }

    /// Gather metrics in Prometheus text format
    pub fn gather_metrics(&self) -> Result<String> {
        TextEncoder::new()
            .encode_to_string(&self.registry.gather())
            .map_err(|e| StatsError::storage(format!("Failed to encode metrics: {e}")))
    }
}

/// Install the global tracing subscriber with JSON output.
///
/// `RUST_LOG` is honored; `statsnap=info` is always added on top of it.
pub fn init_observability() -> Result<()> {
    #[cfg(feature = "metrics")]
    CodecMetrics::global();

    let fmt_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_target(true)
        .with_current_span(false);

    let directive = DEFAULT_LOG_DIRECTIVE
        .parse()
        .map_err(|e| StatsError::validation(format!("Bad log directive: {e}")))?;
    let subscriber = TracingRegistry::default()
        .with(EnvFilter::from_default_env().add_directive(directive))
        .with(fmt_layer);

    set_global_default(subscriber).map_err(|e| {
        StatsError::storage(format!("Failed to set global tracing subscriber: {e}"))
    })?;

    tracing::info!("statsnap observability initialized");
    Ok(())
}
