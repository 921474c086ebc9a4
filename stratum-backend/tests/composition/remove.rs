use std::time::Duration;

use stratum_backend::{Backend, BackendError, Compose, DeleteStatus};
use stratum_core::CacheKey;

use crate::common::{ErrorBackend, TestBackend, raw};

#[tokio::test]
async fn test_remove_from_both_tiers() {
    let local = TestBackend::new("local");
    let remote = TestBackend::new("remote");
    let tiered = local.clone().compose(remote.clone());
    let key = CacheKey::from("k");

    tiered
        .write(&key, raw("v", Duration::from_secs(60)))
        .await
        .unwrap();

    assert_eq!(tiered.remove(&key).await.unwrap(), DeleteStatus::Deleted(2));
    assert!(!local.has("k"));
    assert!(!remote.has("k"));
    assert!(tiered.read(&key).await.unwrap().is_none());
}

#[tokio::test]
async fn test_remove_absent_key_is_missing() {
    let tiered = TestBackend::new("local").compose(TestBackend::new("remote"));
    assert_eq!(
        tiered.remove(&CacheKey::from("nope")).await.unwrap(),
        DeleteStatus::Missing
    );
}

#[tokio::test]
async fn test_remove_reports_remote_failure() {
    let local = TestBackend::new("local");
    let tiered = local.clone().compose(ErrorBackend::unreachable());
    let key = CacheKey::from("k");

    local
        .write(&key, raw("v", Duration::from_secs(60)))
        .await
        .unwrap();

    let error = tiered.remove(&key).await.unwrap_err();
    assert!(error.is_connectivity());
    // local removal happened anyway
    assert!(!local.has("k"));
}

#[tokio::test]
async fn test_clear_empties_both_tiers() {
    let local = TestBackend::new("local");
    let remote = TestBackend::new("remote");
    let tiered = local.clone().compose(remote.clone());

    for key in ["a", "b", "c"] {
        tiered
            .write(&CacheKey::from(key), raw("v", Duration::from_secs(60)))
            .await
            .unwrap();
    }

    tiered.clear().await.unwrap();
    assert_eq!(local.len(), 0);
    assert_eq!(remote.len(), 0);
}

#[tokio::test]
async fn test_clear_both_failing() {
    let tiered = ErrorBackend::broken().compose(ErrorBackend::broken());
    let error = tiered.clear().await.unwrap_err();
    assert!(matches!(error, BackendError::BothLayersFailed { .. }));
}
