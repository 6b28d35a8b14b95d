use kanpan_core::store::port::WatchlistStore;
use kanpan_store::watchlist::SqliteWatchlistStore;
use tempfile::tempdir;

/// # Summary
/// 自选股 SQLite 存储的基本增删查。
#[tokio::test]
async fn test_watchlist_crud() {
    let tmp_dir = tempdir().expect("Failed to create temp dir");
    let store = SqliteWatchlistStore::open(tmp_dir.path().join("test.db"))
        .await
        .expect("Failed to open store");

    // 初始为空
    assert!(store.list().await.unwrap().is_empty());

    // 追加
    assert!(store.add("sh600519", "贵州茅台").await.unwrap());
    assert!(store.add("sz000001", "平安银行").await.unwrap());

    // 幂等：重复代码不落盘
    assert!(!store.add("sh600519", "贵州茅台").await.unwrap());

    let entries = store.list().await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].code, "sh600519");
    assert_eq!(entries[0].name, "贵州茅台");

    // 移除
    assert!(store.remove("sh600519").await.unwrap());
    assert!(!store.remove("sh600519").await.unwrap());
    let entries = store.list().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].code, "sz000001");
}

/// # Summary
/// 重开数据库后列表内容与顺序完整保留。
#[tokio::test]
async fn test_reload_preserves_order() {
    let tmp_dir = tempdir().expect("Failed to create temp dir");
    let db_path = tmp_dir.path().join("test.db");

    {
        let store = SqliteWatchlistStore::open(db_path.clone())
            .await
            .expect("Failed to open store");
        store.add("sh600519", "贵州茅台").await.unwrap();
        store.add("sz300750", "宁德时代").await.unwrap();
        store.add("sz000858", "五粮液").await.unwrap();
        store.remove("sz300750").await.unwrap();
    }

    // 新实例重读同一个库
    let store = SqliteWatchlistStore::open(db_path)
        .await
        .expect("Failed to reopen store");
    let entries = store.list().await.unwrap();

    let codes: Vec<&str> = entries.iter().map(|e| e.code.as_str()).collect();
    assert_eq!(codes, vec!["sh600519", "sz000858"]);
    assert_eq!(entries[1].name, "五粮液");
}

/// # Summary
/// 并发追加不丢更新，且互不重复。
#[tokio::test]
async fn test_concurrent_adds() {
    let tmp_dir = tempdir().expect("Failed to create temp dir");
    let store = std::sync::Arc::new(
        SqliteWatchlistStore::open(tmp_dir.path().join("test.db"))
            .await
            .expect("Failed to open store"),
    );

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let store = store.clone();
            tokio::spawn(async move { store.add(&format!("sz00000{}", i), "并发").await })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().unwrap());
    }
    assert_eq!(store.list().await.unwrap().len(), 10);
}
