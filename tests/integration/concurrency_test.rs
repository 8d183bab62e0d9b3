// Many tasks sharing one service through an Arc.

use super::test_harness::Harness;
use std::sync::Arc;
use wikistore::assets::PAGE;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_saves_and_reads_of_distinct_assets() {
    let h = Arc::new(Harness::new().await);

    let tasks: Vec<_> = (0..16)
        .map(|t| {
            let h = Arc::clone(&h);
            tokio::spawn(async move {
                for i in 0..5 {
                    let path = format!("task-{t}/page-{i}");
                    let body = format!("body {t}.{i}");
                    h.service.save_asset(PAGE, &path, &body).await.unwrap();
                    assert_eq!(h.service.get_asset(PAGE, &path).await.unwrap(), body);
                }
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap();
    }

    for t in 0..16 {
        assert_eq!(h.store.row_count(&format!("task-{t}/page-4")).await, 1);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writers_to_one_asset_last_commit_wins() {
    let h = Arc::new(Harness::new().await);

    let tasks: Vec<_> = (0..8)
        .map(|t| {
            let h = Arc::clone(&h);
            tokio::spawn(async move {
                h.service
                    .save_asset(PAGE, "shared", &format!("writer {t}"))
                    .await
                    .unwrap();
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(h.store.row_count("shared").await, 1);
    let content = h.service.get_asset(PAGE, "shared").await.unwrap();
    assert!(content.starts_with("writer "));
}
