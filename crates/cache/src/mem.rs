use async_trait::async_trait;
use dashmap::DashMap;
use kanpan_core::cache::error::CacheError;
use kanpan_core::cache::port::Cache;
use std::time::{Duration, Instant};

/// # Summary
/// 基于 DashMap 的 TTL 内存缓存实现。
///
/// # Invariants
/// - 所有操作均通过并发哈希表 `DashMap` 执行，保证多线程安全。
/// - 过期条目在读取路径上惰性回收，没有后台清理任务；
///   键空间由业务层限定（操作名 + 参数），规模有界。
pub struct MemCache {
    // 线程安全的 KV 存储容器，值为 (字节, 过期时刻)
    storage: DashMap<String, (Vec<u8>, Instant)>,
}

impl MemCache {
    /// # Summary
    /// 创建一个新的 MemCache 实例。
    ///
    /// # Logic
    /// 初始化底层的 DashMap 存储引擎。
    ///
    /// # Returns
    /// * `Self` - 初始化的缓存实例。
    pub fn new() -> Self {
        Self {
            storage: DashMap::new(),
        }
    }
}

impl Default for MemCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for MemCache {
    /// # Summary
    /// 写入原始字节数据并记录过期时刻。
    ///
    /// # Logic
    /// 以当前时刻加 TTL 计算过期时刻，与 Value 一并插入哈希表。
    /// 若存在同名 Key 则覆盖（包括其过期时刻）。
    ///
    /// # Arguments
    /// * `key`: 唯一索引。
    /// * `value`: 待存入的字节序列。
    /// * `ttl`: 条目生存期。
    ///
    /// # Returns
    /// * `Result<(), CacheError>` - 始终返回 Ok，除非内存分配失败。
    async fn set_raw(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        self.storage
            .insert(key.to_string(), (value, Instant::now() + ttl));
        Ok(())
    }

    /// # Summary
    /// 读取原始字节数据，过期条目视同不存在并顺手移除。
    ///
    /// # Arguments
    /// * `key`: 唯一索引。
    ///
    /// # Returns
    /// * `Result<Option<Vec<u8>>, CacheError>` - 未过期则返回克隆的数据。
    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let expired = match self.storage.get(key) {
            Some(entry) => {
                let (value, deadline) = entry.value();
                if Instant::now() < *deadline {
                    return Ok(Some(value.clone()));
                }
                true
            }
            None => false,
        };
        if expired {
            self.storage.remove(key);
        }
        Ok(None)
    }

    /// # Summary
    /// 删除指定键。
    ///
    /// # Returns
    /// * `Result<(), CacheError>` - 无论键是否存在均返回 Ok。
    async fn del(&self, key: &str) -> Result<(), CacheError> {
        self.storage.remove(key);
        Ok(())
    }
}
