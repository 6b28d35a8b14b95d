use kanpan_cache::mem::MemCache;
use kanpan_core::cache::port::{Cache, CacheExt};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
struct TestItem {
    id: u32,
    name: String,
}

#[tokio::test]
async fn test_mem_cache_raw_ops() {
    let cache = MemCache::new();
    let key = "raw_key";
    let value = vec![1, 2, 3, 4];

    // 测试存取
    cache
        .set_raw(key, value.clone(), Duration::from_secs(10))
        .await
        .unwrap();
    let result = cache.get_raw(key).await.unwrap().unwrap();
    assert_eq!(result, value);

    // 测试删除
    cache.del(key).await.unwrap();
    let result = cache.get_raw(key).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_mem_cache_typed_ops() {
    let cache = MemCache::new();
    let key = "typed_key";
    let item = TestItem {
        id: 42,
        name: "kanpan".to_string(),
    };

    // 使用 CacheExt 提供的 set 方法
    cache.set(key, &item, Duration::from_secs(10)).await.unwrap();

    // 使用 CacheExt 提供的 get 方法
    let result: TestItem = cache.get(key).await.unwrap().unwrap();
    assert_eq!(result, item);
}

#[tokio::test]
async fn test_mem_cache_ttl_expiry() {
    let cache = MemCache::new();
    let key = "ttl_key";

    cache
        .set_raw(key, vec![9, 9], Duration::from_millis(30))
        .await
        .unwrap();

    // TTL 内可读
    assert!(cache.get_raw(key).await.unwrap().is_some());

    // 过期后不可读
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(cache.get_raw(key).await.unwrap().is_none());
}

#[tokio::test]
async fn test_mem_cache_overwrite_resets_ttl() {
    let cache = MemCache::new();
    let key = "reset_key";

    cache
        .set_raw(key, vec![1], Duration::from_millis(30))
        .await
        .unwrap();
    cache
        .set_raw(key, vec![2], Duration::from_secs(10))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(60)).await;
    // 覆盖写入延长了生存期
    assert_eq!(cache.get_raw(key).await.unwrap(), Some(vec![2]));
}
