//! Integration tests for quota configuration.

use rush_rs::Quota;
use std::time::Duration;

#[test]
fn test_quota_per_second() {
    let quota = Quota::per_second(10, 0);
    assert_eq!(quota.count(), 10);
    assert_eq!(quota.period(), Duration::from_secs(1));
}

#[test]
fn test_quota_per_minute() {
    let quota = Quota::per_minute(60, 0);
    assert_eq!(quota.count(), 60);
    assert_eq!(quota.period(), Duration::from_secs(60));
}

#[test]
fn test_quota_per_hour() {
    let quota = Quota::per_hour(3600, 0);
    assert_eq!(quota.period(), Duration::from_secs(3600));
}

#[test]
fn test_quota_with_burst() {
    let quota = Quota::per_second(10, 20);
    assert_eq!(quota.count(), 10);
    assert_eq!(quota.maximum_burst(), 20);
    assert_eq!(quota.limit(), 30);
}

#[test]
fn test_quota_custom_period() {
    let quota = Quota::new(Duration::from_secs(300), 100, 0).unwrap();
    assert_eq!(quota.count(), 100);
    assert_eq!(quota.period(), Duration::from_secs(300));
}

#[test]
fn test_quota_zero_period_rejected() {
    assert!(Quota::new(Duration::ZERO, 100, 0).is_err());
}
