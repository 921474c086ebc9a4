//! Local tier gauges and eviction counters.

#![cfg(feature = "metrics")]

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use metrics_util::{CompositeKey, MetricKind};
use stratum_backend::Backend;
use stratum_core::{CacheKey, CacheValue};
use stratum_moka::MokaBackend;

type SnapshotEntry = (
    CompositeKey,
    Option<metrics::Unit>,
    Option<metrics::SharedString>,
    DebugValue,
);

/// Runs `test` on a single-threaded runtime with a local recorder installed.
fn recorded<F>(test: impl FnOnce() -> F) -> Vec<SnapshotEntry>
where
    F: Future<Output = ()>,
{
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(test());
    });

    snapshotter.snapshot().into_vec()
}

fn has_label(key: &CompositeKey, name: &str, value: &str) -> bool {
    key.key()
        .labels()
        .any(|label| label.key() == name && label.value() == value)
}

fn gauge(entries: &[SnapshotEntry], name: &str, backend: &str) -> Option<f64> {
    entries.iter().find_map(|(key, _, _, value)| match value {
        DebugValue::Gauge(v)
            if key.kind() == MetricKind::Gauge
                && key.key().name() == name
                && has_label(key, "backend", backend) =>
        {
            Some(v.into_inner())
        }
        _ => None,
    })
}

fn evictions(entries: &[SnapshotEntry], backend: &str, cause: &str) -> Option<u64> {
    entries.iter().find_map(|(key, _, _, value)| match value {
        DebugValue::Counter(v)
            if key.kind() == MetricKind::Counter
                && key.key().name() == "stratum_local_evictions_total"
                && has_label(key, "backend", backend)
                && has_label(key, "cause", cause) =>
        {
            Some(*v)
        }
        _ => None,
    })
}

fn value() -> CacheValue<Bytes> {
    CacheValue::with_ttl(Bytes::from_static(b"payload"), Duration::from_secs(60))
}

#[test]
fn test_clear_resets_size_gauges() {
    let entries = recorded(|| async {
        let backend = MokaBackend::builder().label("gauges").max_entries(100).build();
        for id in 0..3 {
            backend
                .write(&CacheKey::from(format!("entry:{id}")), value())
                .await
                .unwrap();
        }
        backend.clear().await.unwrap();
    });

    assert_eq!(gauge(&entries, "stratum_local_entries", "gauges"), Some(0.0));
    assert_eq!(gauge(&entries, "stratum_local_size_bytes", "gauges"), Some(0.0));
}

#[test]
fn test_remove_updates_entry_gauge() {
    let entries = recorded(|| async {
        let backend = MokaBackend::builder().label("remove").max_entries(100).build();
        let key = CacheKey::from("entry:1");
        backend.write(&key, value()).await.unwrap();
        backend.cache().run_pending_tasks().await;
        backend.remove(&key).await.unwrap();
        // entry_count settles during maintenance; the second remove records it
        backend.cache().run_pending_tasks().await;
        backend.remove(&key).await.unwrap();
    });

    assert_eq!(gauge(&entries, "stratum_local_entries", "remove"), Some(0.0));
}

#[test]
fn test_evictions_are_counted_by_cause() {
    let entries = recorded(|| async {
        let backend = MokaBackend::builder().label("causes").max_entries(100).build();
        let evicted = CacheKey::from("entry:evicted");
        let replaced = CacheKey::from("entry:replaced");

        backend.write(&evicted, value()).await.unwrap();
        backend.remove(&evicted).await.unwrap();
        backend.write(&replaced, value()).await.unwrap();
        backend.write(&replaced, value()).await.unwrap();
        backend.cache().run_pending_tasks().await;
    });

    assert_eq!(evictions(&entries, "causes", "explicit"), Some(1));
    assert_eq!(evictions(&entries, "causes", "replaced"), Some(1));
}

#[test]
fn test_capacity_evictions_are_counted() {
    let entries = recorded(|| async {
        let backend = MokaBackend::builder().label("capacity").max_entries(2).build();
        for id in 0..5 {
            backend
                .write(&CacheKey::from(format!("entry:{id}")), value())
                .await
                .unwrap();
            backend.cache().run_pending_tasks().await;
        }
    });

    assert_eq!(evictions(&entries, "capacity", "size"), Some(3));
}
