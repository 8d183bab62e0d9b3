// Capacity pruning never loses data: pruned assets come back from the store.

use super::test_harness::Harness;
use std::time::Duration;
use wikistore::assets::PAGE;
use wikistore::cache::{AssetKey, LayeredCache};

#[tokio::test]
async fn test_pruned_assets_fall_back_to_store() {
    let h = Harness::with_cache(LayeredCache::new(10, 3), Duration::from_secs(300)).await;

    for i in 0..11 {
        h.service
            .save_asset(PAGE, &format!("page-{i}"), &format!("body {i}"))
            .await
            .unwrap();
    }

    // 11 > 10 triggered one batch of 3: the three oldest are gone
    assert_eq!(h.service.cache().len(), 8);
    for i in 0..3 {
        assert!(!h.service.cache().contains(&AssetKey::new(PAGE, format!("page-{i}"))));
    }
    assert_eq!(h.service.cache_stats().evictions, 3);

    assert_eq!(h.service.get_asset(PAGE, "page-0").await.unwrap(), "body 0");
    assert_eq!(h.store.gets(), 1);

    // recently written entries are still cached
    assert_eq!(h.service.get_asset(PAGE, "page-10").await.unwrap(), "body 10");
    assert_eq!(h.store.gets(), 1);
}

#[tokio::test]
async fn test_reads_refresh_recency() {
    let h = Harness::with_cache(LayeredCache::new(5, 1), Duration::from_secs(300)).await;
    for i in 0..5 {
        h.service
            .save_asset(PAGE, &format!("p{i}"), "body")
            .await
            .unwrap();
    }

    // touch p0 so p1 becomes the least recently used
    h.service.get_asset(PAGE, "p0").await.unwrap();
    h.service.save_asset(PAGE, "p5", "body").await.unwrap();

    assert!(h.service.cache().contains(&AssetKey::new(PAGE, "p0")));
    assert!(!h.service.cache().contains(&AssetKey::new(PAGE, "p1")));
}
