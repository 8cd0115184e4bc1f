use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use storefront_api::{cache::ListingCache, error::AppResult};

async fn load(calls: &AtomicUsize) -> AppResult<Vec<u32>> {
    let n = calls.fetch_add(1, Ordering::SeqCst) as u32;
    Ok(vec![n])
}

#[tokio::test(start_paused = true)]
async fn hit_until_ttl_expires() {
    let cache = ListingCache::new(Duration::from_secs(300));
    let calls = AtomicUsize::new(0);

    let first = cache.get_or_load(|| load(&calls)).await.unwrap();
    let second = cache.get_or_load(|| load(&calls)).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(Arc::ptr_eq(&first, &second));

    tokio::time::advance(Duration::from_secs(301)).await;
    let third = cache.get_or_load(|| load(&calls)).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(*third, vec![1]);
}

#[tokio::test]
async fn invalidate_forces_a_reload() {
    let cache = ListingCache::new(Duration::from_secs(300));
    let calls = AtomicUsize::new(0);

    cache.get_or_load(|| load(&calls)).await.unwrap();
    cache.invalidate().await;
    let items = cache.get_or_load(|| load(&calls)).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(*items, vec![1]);
}

#[tokio::test]
async fn load_racing_with_invalidation_is_not_stored() {
    let cache = ListingCache::new(Duration::from_secs(300));
    let calls = AtomicUsize::new(0);

    let racing = cache.clone();
    cache
        .get_or_load(|| async {
            racing.invalidate().await;
            load(&calls).await
        })
        .await
        .unwrap();

    cache.get_or_load(|| load(&calls)).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn disabled_cache_always_loads() {
    let cache: ListingCache<u32> = ListingCache::disabled();
    let calls = AtomicUsize::new(0);
    assert!(!cache.is_enabled());

    cache.get_or_load(|| load(&calls)).await.unwrap();
    cache.get_or_load(|| load(&calls)).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
