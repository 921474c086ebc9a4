use std::time::Duration;

use stratum_backend::{Backend, BackendError, Compose};
use stratum_core::CacheKey;

use crate::common::{ErrorBackend, TestBackend, raw};

#[tokio::test]
async fn test_write_reaches_both_tiers() {
    let local = TestBackend::new("local");
    let remote = TestBackend::new("remote");
    let tiered = local.clone().compose(remote.clone());

    tiered
        .write(&CacheKey::from("k"), raw("v", Duration::from_secs(60)))
        .await
        .unwrap();

    assert!(local.has("k"));
    assert!(remote.has("k"));
}

#[tokio::test]
async fn test_write_overwrites_existing_entry() {
    let local = TestBackend::new("local");
    let remote = TestBackend::new("remote");
    let tiered = local.clone().compose(remote.clone());
    let key = CacheKey::from("k");

    tiered
        .write(&key, raw("first", Duration::from_secs(60)))
        .await
        .unwrap();
    tiered
        .write(&key, raw("second", Duration::from_secs(60)))
        .await
        .unwrap();

    assert_eq!(remote.get_raw("k").unwrap().data().as_ref(), b"second");
    assert_eq!(local.get_raw("k").unwrap().data().as_ref(), b"second");
}

#[tokio::test]
async fn test_remote_failure_is_degraded_write() {
    let local = TestBackend::new("local");
    let tiered = local.clone().compose(ErrorBackend::unreachable());

    let error = tiered
        .write(&CacheKey::from("k"), raw("v", Duration::from_secs(60)))
        .await
        .unwrap_err();

    assert!(error.is_degraded_write());
    assert!(error.is_connectivity());
    // the local copy is still readable
    assert!(local.has("k"));
}

#[tokio::test]
async fn test_local_failure_still_writes_remote() {
    let remote = TestBackend::new("remote");
    let tiered = ErrorBackend::broken().compose(remote.clone());

    let error = tiered
        .write(&CacheKey::from("k"), raw("v", Duration::from_secs(60)))
        .await
        .unwrap_err();

    assert!(!error.is_degraded_write());
    assert!(matches!(error, BackendError::InternalError(_)));
    assert!(remote.has("k"));
}

#[tokio::test]
async fn test_both_tiers_failing() {
    let tiered = ErrorBackend::broken().compose(ErrorBackend::unreachable());

    let error = tiered
        .write(&CacheKey::from("k"), raw("v", Duration::from_secs(60)))
        .await
        .unwrap_err();

    assert!(matches!(error, BackendError::BothLayersFailed { .. }));
    assert!(error.is_connectivity());
}
