use crate::store::error::StoreError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// # Summary
/// 自选股条目。
///
/// # Invariants
/// - `code` 在整张列表内唯一。
/// - 通过 serde 默认值容忍持久化载荷中缺失/多余的字段，
///   列表格式演进无需迁移。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WatchlistEntry {
    // 带交易所前缀的完整代码，如 "sh600519"
    pub code: String,
    #[serde(default)]
    pub name: String,
}

/// # Summary
/// 自选股列表持久化接口 (Port)。
///
/// # Invariants
/// - 单写者：同一时刻只有一个会话在修改列表，无需冲突解决。
/// - 列表有序，`add` 追加到尾部，重排不在本接口职责内。
#[async_trait]
pub trait WatchlistStore: Send + Sync {
    /// # Summary
    /// 读取完整的有序自选股列表。
    async fn list(&self) -> Result<Vec<WatchlistEntry>, StoreError>;

    /// # Summary
    /// 追加一只自选股。
    ///
    /// # Logic
    /// 1. 若 `code` 已存在，不做任何修改。
    /// 2. 否则追加到列表尾部并持久化。
    ///
    /// # Returns
    /// `true` 表示新增成功，`false` 表示代码已存在（幂等空操作）。
    async fn add(&self, code: &str, name: &str) -> Result<bool, StoreError>;

    /// # Summary
    /// 移除一只自选股。
    ///
    /// # Returns
    /// `true` 表示确有移除，`false` 表示代码本就不在列表中。
    async fn remove(&self, code: &str) -> Result<bool, StoreError>;
}
