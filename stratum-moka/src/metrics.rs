//! Local tier metrics, recorded only with the `metrics` feature.
//!
//! - `stratum_local_entries` (gauge): live entries after the last mutation
//! - `stratum_local_size_bytes` (gauge): weighted size after the last mutation
//! - `stratum_local_evictions_total` (counter): entries dropped by the tier,
//!   labelled with `cause`: `expired` (caller TTL or max age reached), `size`
//!   (capacity pressure), `explicit` (evict or clear) or `replaced` (overwrite)
//!
//! Every metric carries a `backend` label with the tier's label.

use moka::notification::RemovalCause;

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Entry count gauge.
    pub static ref LOCAL_ENTRIES: &'static str = {
        metrics::describe_gauge!(
            "stratum_local_entries",
            "Live entries in the local tier."
        );
        "stratum_local_entries"
    };

    /// Weighted size gauge.
    pub static ref LOCAL_SIZE_BYTES: &'static str = {
        metrics::describe_gauge!(
            "stratum_local_size_bytes",
            "Weighted size of the local tier."
        );
        "stratum_local_size_bytes"
    };

    /// Eviction counter.
    pub static ref LOCAL_EVICTIONS: &'static str = {
        metrics::describe_counter!(
            "stratum_local_evictions_total",
            "Entries dropped by the local tier, by cause."
        );
        "stratum_local_evictions_total"
    };
}

/// Label value of a removal cause.
pub fn cause_label(cause: RemovalCause) -> &'static str {
    match cause {
        RemovalCause::Expired => "expired",
        RemovalCause::Size => "size",
        RemovalCause::Explicit => "explicit",
        RemovalCause::Replaced => "replaced",
    }
}

/// Records the tier size after a write, evict or clear.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_size(backend: &str, entries: u64, size_bytes: u64) {
    metrics::gauge!(*LOCAL_ENTRIES, "backend" => backend.to_string()).set(entries as f64);
    metrics::gauge!(*LOCAL_SIZE_BYTES, "backend" => backend.to_string()).set(size_bytes as f64);
}

/// Records the tier size (no-op without the `metrics` feature).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_size(_backend: &str, _entries: u64, _size_bytes: u64) {}

/// Records one entry dropped by the tier.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_eviction(backend: &str, cause: RemovalCause) {
    metrics::counter!(
        *LOCAL_EVICTIONS,
        "backend" => backend.to_string(),
        "cause" => cause_label(cause)
    )
    .increment(1);
}

/// Records one dropped entry (no-op without the `metrics` feature).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_eviction(_backend: &str, _cause: RemovalCause) {}
