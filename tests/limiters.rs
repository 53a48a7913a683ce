//! Cross-module integration tests for the periodic and GCRA limiters,
//! covering the seed scenarios from the decision engine's test matrix.

use std::time::Duration;

use rush_rs::{GCRALimiter, MemoryStore, PeriodicLimiter, Quota, Throttle};

#[tokio::test]
async fn s1_five_requests_exhaust_a_quota_of_five() {
    let throttle = Throttle::new(
        Quota::per_minute(5, 0),
        PeriodicLimiter::new(MemoryStore::new()),
    );

    let mut last = None;
    for _ in 0..5 {
        let result = throttle.check("k", 1).await.unwrap();
        assert!(!result.limited);
        last = Some(result);
    }
    assert_eq!(last.unwrap().remaining, 0);
}

#[tokio::test]
async fn s2_sixth_request_in_window_is_limited() {
    let throttle = Throttle::new(
        Quota::per_minute(5, 0),
        PeriodicLimiter::new(MemoryStore::new()),
    );
    for _ in 0..5 {
        throttle.check("k", 1).await.unwrap();
    }
    let result = throttle.check("k", 1).await.unwrap();
    assert!(result.limited);
    assert_eq!(result.remaining, 0);
}

#[tokio::test]
async fn s4_fresh_gcra_key_admits_first_request() {
    let throttle = Throttle::new(
        Quota::new(Duration::from_secs(60), 50, 0).unwrap(),
        GCRALimiter::new(MemoryStore::new()),
    );
    let result = throttle.check("k", 1).await.unwrap();
    assert!(!result.limited);
    assert_eq!(result.remaining, 49);
    assert_eq!(result.retry_after, None);
}

#[tokio::test]
async fn s5_second_request_within_one_emission_interval() {
    let throttle = Throttle::new(
        Quota::new(Duration::from_secs(60), 50, 0).unwrap(),
        GCRALimiter::new(MemoryStore::new()),
    );
    throttle.check("k", 1).await.unwrap();
    let result = throttle.check("k", 1).await.unwrap();

    assert!(!result.limited);
    assert_eq!(result.remaining, 48);
    let reset_after = result.reset_after.unwrap();
    assert!(reset_after > Duration::ZERO);
    assert!(reset_after <= Duration::from_secs_f64(60.0 / 50.0));
}

#[tokio::test]
async fn s7_cas_mismatch_surfaces_observed_value() {
    use rush_rs::storage::{MemoryStore as Store, Store as StoreTrait};

    let store = Store::new();
    let before = StoreTrait::get(&store, "k").await.unwrap();
    assert!(before.is_none());

    // A stale compare_and_swap against a value that was never the
    // current state for "k" must fail with CompareAndSwapMismatch.
    let stale = rush_rs::LimitData::new(1, 9, chrono::Utc::now());
    let fresh = rush_rs::LimitData::new(2, 8, chrono::Utc::now());
    StoreTrait::set(&store, "k", fresh.clone()).await.unwrap();

    let err = StoreTrait::compare_and_swap(&store, "k", Some(stale), fresh.clone())
        .await
        .unwrap_err();

    match err {
        rush_rs::RateLimitError::Storage(rush_rs::StorageError::CompareAndSwapMismatch {
            observed,
        }) => assert_eq!(observed, Some(fresh)),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn reset_then_peek_reports_full_headroom() {
    let throttle = Throttle::new(
        Quota::per_minute(5, 0),
        PeriodicLimiter::new(MemoryStore::new()),
    );
    throttle.check("k", 5).await.unwrap();
    throttle.clear("k").await.unwrap();

    let result = throttle.peek("k").await.unwrap();
    assert!(!result.limited);
    assert_eq!(result.remaining, 5);
}
