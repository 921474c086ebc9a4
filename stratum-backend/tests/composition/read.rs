use std::time::Duration;

use chrono::Utc;
use stratum_backend::{Backend, Compose, RefillPolicy};
use stratum_core::CacheKey;

use crate::common::{ErrorBackend, TestBackend, raw};

#[tokio::test]
async fn test_local_hit_skips_remote() {
    let local = TestBackend::new("local");
    let remote = TestBackend::new("remote");
    let tiered = local.clone().compose(remote.clone());
    let key = CacheKey::from("user:alice");

    local
        .write(&key, raw("cached", Duration::from_secs(60)))
        .await
        .unwrap();

    let value = tiered.read(&key).await.unwrap().unwrap();
    assert_eq!(value.data().as_ref(), b"cached");
    assert_eq!(remote.reads(), 0);
}

#[tokio::test]
async fn test_remote_hit_promotes_into_local() {
    let local = TestBackend::new("local");
    let remote = TestBackend::new("remote");
    let tiered = local.clone().compose(remote.clone());
    let key = CacheKey::from("user:bob");

    let stored = raw("shared", Duration::from_secs(120));
    let expire = stored.expire();
    remote.write(&key, stored).await.unwrap();

    let value = tiered.read(&key).await.unwrap().unwrap();
    assert_eq!(value.data().as_ref(), b"shared");
    assert!(local.has("user:bob"));
    // promoted entry keeps the remote expiration
    assert_eq!(local.get_raw("user:bob").unwrap().expire(), expire);

    let again = tiered.read(&key).await.unwrap().unwrap();
    assert_eq!(again.data().as_ref(), b"shared");
    assert_eq!(remote.reads(), 1);
}

#[tokio::test]
async fn test_refill_never_leaves_local_untouched() {
    let local = TestBackend::new("local");
    let remote = TestBackend::new("remote");
    let tiered = local
        .clone()
        .compose_with(remote.clone(), RefillPolicy::Never);
    let key = CacheKey::from("k");

    remote
        .write(&key, raw("v", Duration::from_secs(60)))
        .await
        .unwrap();

    assert!(tiered.read(&key).await.unwrap().is_some());
    assert!(!local.has("k"));
    assert_eq!(local.writes(), 0);
}

#[tokio::test]
async fn test_miss_in_both_tiers() {
    let tiered = TestBackend::new("local").compose(TestBackend::new("remote"));
    assert!(tiered.read(&CacheKey::from("nope")).await.unwrap().is_none());
}

#[tokio::test]
async fn test_expired_remote_entry_is_a_miss() {
    let local = TestBackend::new("local");
    let remote = TestBackend::new("remote");
    let tiered = local.clone().compose(remote.clone());
    let key = CacheKey::from("old");

    let past = Utc::now() - chrono::Duration::seconds(1);
    remote
        .write(
            &key,
            stratum_core::CacheValue::new(bytes::Bytes::from_static(b"v"), Some(past)),
        )
        .await
        .unwrap();

    assert!(tiered.read(&key).await.unwrap().is_none());
    assert!(!local.has("old"));
}

#[tokio::test]
async fn test_remote_error_propagates_on_local_miss() {
    let tiered = TestBackend::new("local").compose(ErrorBackend::unreachable());
    let error = tiered.read(&CacheKey::from("k")).await.unwrap_err();
    assert!(error.is_connectivity());
}

#[tokio::test]
async fn test_local_hit_served_while_remote_is_down() {
    let local = TestBackend::new("local");
    let tiered = local.clone().compose(ErrorBackend::unreachable());
    let key = CacheKey::from("k");

    local
        .write(&key, raw("v", Duration::from_secs(60)))
        .await
        .unwrap();
    assert!(tiered.read(&key).await.unwrap().is_some());
}

#[tokio::test]
async fn test_local_error_falls_back_to_remote() {
    let remote = TestBackend::new("remote");
    let tiered = ErrorBackend::broken().compose(remote.clone());
    let key = CacheKey::from("k");

    remote
        .write(&key, raw("v", Duration::from_secs(60)))
        .await
        .unwrap();

    // refill into the broken local tier fails but the read still succeeds
    let value = tiered.read(&key).await.unwrap().unwrap();
    assert_eq!(value.data().as_ref(), b"v");
}
