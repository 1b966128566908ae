use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

#[tokio::test]
async fn test_networking_manager_creation() {
    let manager = NetworkingManager::new(NetworkingConfig::default()).unwrap();
    assert_eq!(manager.jobs(), 1);
}

#[test]
fn test_default_config_is_sequential_without_timeout() {
    let config = NetworkingConfig::default();
    assert_eq!(config.max_jobs, 1);
    assert_eq!(config.timeout, None);
}

#[tokio::test]
async fn test_zero_jobs_rejected() {
    let config = NetworkingConfig {
        max_jobs: 0,
        ..Default::default()
    };

    assert!(matches!(
        NetworkingManager::new(config),
        Err(NetworkingError::InvalidJobCount { count: 0 })
    ));
}

#[test]
fn test_zero_timeout_means_no_timeout() {
    assert_eq!(NetworkingConfig::from_settings(2, 0).timeout, None);
    assert_eq!(
        NetworkingConfig::from_settings(2, 15).timeout,
        Some(Duration::from_secs(15))
    );
}

#[tokio::test]
async fn test_spawn_bounded_preserves_submission_order() {
    let manager = NetworkingManager::new(NetworkingConfig::from_settings(3, 0)).unwrap();

    let handles: Vec<_> = (0..8u64)
        .map(|i| {
            manager.spawn_bounded(async move {
                // Later tasks finish first
                tokio::time::sleep(Duration::from_millis(40 - i * 5)).await;
                i
            })
        })
        .collect();

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap().unwrap());
    }
    assert_eq!(results, (0..8).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_spawn_bounded_respects_job_limit() {
    let manager = NetworkingManager::new(NetworkingConfig::from_settings(2, 0)).unwrap();
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            manager.spawn_bounded(async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap();
    }
    assert!(peak.load(Ordering::SeqCst) <= 2);
}
