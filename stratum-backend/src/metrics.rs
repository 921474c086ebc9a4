//! Tier composition metrics.
//!
//! Enable the `metrics` feature to record these; without it every function
//! here is a no-op.
//!
//! ## Metrics
//!
//! - `stratum_tier_reads_total` - reads per tier, labelled with `tier` and `result` (hit/miss/error)
//! - `stratum_tier_promotions_total` - remote hits copied into the local tier
//! - `stratum_tier_degraded_writes_total` - writes that reached the local tier only

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Metric name for per-tier read counter.
    pub static ref TIER_READS: &'static str = {
        metrics::describe_counter!(
            "stratum_tier_reads_total",
            "Total number of reads served by each cache tier."
        );
        "stratum_tier_reads_total"
    };

    /// Metric name for promotion counter.
    pub static ref TIER_PROMOTIONS: &'static str = {
        metrics::describe_counter!(
            "stratum_tier_promotions_total",
            "Total number of remote hits copied into the local tier."
        );
        "stratum_tier_promotions_total"
    };

    /// Metric name for degraded write counter.
    pub static ref TIER_DEGRADED_WRITES: &'static str = {
        metrics::describe_counter!(
            "stratum_tier_degraded_writes_total",
            "Total number of writes that reached the local tier only."
        );
        "stratum_tier_degraded_writes_total"
    };
}

/// Outcome of a single tier read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The tier returned a value.
    Hit,
    /// The tier had no live entry.
    Miss,
    /// The tier failed.
    Error,
}

impl ReadOutcome {
    #[cfg(feature = "metrics")]
    fn as_str(self) -> &'static str {
        match self {
            ReadOutcome::Hit => "hit",
            ReadOutcome::Miss => "miss",
            ReadOutcome::Error => "error",
        }
    }
}

/// Record a read against one tier.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_read(tier: &str, outcome: ReadOutcome) {
    metrics::counter!(*TIER_READS, "tier" => tier.to_string(), "result" => outcome.as_str())
        .increment(1);
}

/// Record a read against one tier (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_read(_tier: &str, _outcome: ReadOutcome) {}

/// Record a promotion into the local tier.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_promotion(backend: &str) {
    metrics::counter!(*TIER_PROMOTIONS, "backend" => backend.to_string()).increment(1);
}

/// Record a promotion into the local tier (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_promotion(_backend: &str) {}

/// Record a degraded write.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_degraded_write(backend: &str) {
    metrics::counter!(*TIER_DEGRADED_WRITES, "backend" => backend.to_string()).increment(1);
}

/// Record a degraded write (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_degraded_write(_backend: &str) {}
