use async_trait::async_trait;
use kanpan_core::store::error::StoreError;
use kanpan_core::store::port::{WatchlistEntry, WatchlistStore};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::fs;
use tokio::sync::Mutex;

/// 默认数据库文件名
const DEFAULT_DB: &str = "kanpan.db";
/// 列表文档在 KV 表中的键
const WATCHLIST_KEY: &str = "watchlist";

/// WatchlistStore 的 SQLite 实现。
///
/// # Summary
/// 整张自选股列表序列化为一份 JSON 文档，存在 `kv` 表的单个键下。
/// 单用户场景下无并发冲突问题，列表顺序天然保持，字段演进由
/// serde 默认值兜住，无需表结构迁移。
///
/// # Invariants
/// * 数据库结构在存储实例创建时初始化。
/// * 读改写序列在进程内互斥，保证 add/remove 不丢更新。
pub struct SqliteWatchlistStore {
    pool: SqlitePool,
    // 读改写互斥锁，只锁修改路径，list 走无锁读
    write_lock: Mutex<()>,
}

impl SqliteWatchlistStore {
    /// 在配置的数据根目录下创建/打开数据库并初始化表结构。
    ///
    /// # Logic
    /// 1. 获取配置的数据根目录并确保其存在。
    /// 2. 配置 SQLite 连接选项，开启 `create_if_missing`。
    /// 3. 连接到数据库并执行 DDL 初始化 KV 表。
    pub async fn new() -> Result<Self, StoreError> {
        let root = crate::config::get_root_dir();
        fs::create_dir_all(&root).map_err(|e| StoreError::InitError(e.to_string()))?;
        Self::open(root.join(DEFAULT_DB)).await
    }

    /// 在指定路径打开数据库（测试用临时目录时走这里）
    pub async fn open(db_path: std::path::PathBuf) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            pool,
            write_lock: Mutex::new(()),
        })
    }

    /// 读取整份列表文档，键不存在视为空列表
    async fn load(&self) -> Result<Vec<WatchlistEntry>, StoreError> {
        let row = sqlx::query_scalar::<_, String>("SELECT value FROM kv WHERE key = ?")
            .bind(WATCHLIST_KEY)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        match row {
            Some(json) => {
                serde_json::from_str(&json).map_err(|e| StoreError::Serialization(e.to_string()))
            }
            None => Ok(Vec::new()),
        }
    }

    /// 整份覆写列表文档
    async fn save(&self, entries: &[WatchlistEntry]) -> Result<(), StoreError> {
        let json =
            serde_json::to_string(entries).map_err(|e| StoreError::Serialization(e.to_string()))?;

        sqlx::query("INSERT OR REPLACE INTO kv (key, value) VALUES (?, ?)")
            .bind(WATCHLIST_KEY)
            .bind(json)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl WatchlistStore for SqliteWatchlistStore {
    /// # Summary
    /// 读取完整的有序自选股列表。
    async fn list(&self) -> Result<Vec<WatchlistEntry>, StoreError> {
        self.load().await
    }

    /// # Summary
    /// 幂等追加一只自选股到列表尾部。
    ///
    /// # Logic
    /// 1. 持互斥锁做读改写，防止并发修改丢更新。
    /// 2. 代码已存在则不落盘，返回 `false`。
    async fn add(&self, code: &str, name: &str) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut entries = self.load().await?;
        if entries.iter().any(|e| e.code == code) {
            return Ok(false);
        }

        entries.push(WatchlistEntry {
            code: code.to_string(),
            name: name.to_string(),
        });
        self.save(&entries).await?;
        Ok(true)
    }

    /// # Summary
    /// 移除一只自选股，其余条目保持原有顺序。
    async fn remove(&self, code: &str) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut entries = self.load().await?;
        let before = entries.len();
        entries.retain(|e| e.code != code);
        if entries.len() == before {
            return Ok(false);
        }

        self.save(&entries).await?;
        Ok(true)
    }
}
