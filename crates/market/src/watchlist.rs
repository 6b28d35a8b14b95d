//! # 自选股服务
//!
//! 在持久化列表之上叠加行情刷新：按列表顺序并发抓取各股行情，
//! 单只失败只跳过不拖垮整批；轮询周期用序号器防止过期结果
//! 覆盖新快照。

use crate::cycle::PollSequencer;
use crate::hub::MarketHub;
use futures::future::join_all;
use kanpan_core::market::entity::Quote;
use kanpan_core::store::error::StoreError;
use kanpan_core::store::port::{WatchlistEntry, WatchlistStore};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// # Summary
/// 自选股领域服务。
///
/// # Invariants
/// - 列表顺序由存储层维护，刷新结果按列表顺序排列。
/// - 快照只接受比水位新的轮询周期，过期结果丢弃。
/// - 添加时尽力解析股票名称，行情失败不阻塞添加。
pub struct WatchlistService {
    store: Arc<dyn WatchlistStore>,
    hub: Arc<MarketHub>,
    sequencer: PollSequencer,
    // 最近一次成功提交的行情快照
    last_snapshot: RwLock<Vec<Quote>>,
}

impl WatchlistService {
    /// # Arguments
    /// * `store`: 自选股持久化实现。
    /// * `hub`: 该列表所属市场的行情编排中枢。
    pub fn new(store: Arc<dyn WatchlistStore>, hub: Arc<MarketHub>) -> Self {
        Self {
            store,
            hub,
            sequencer: PollSequencer::new(),
            last_snapshot: RwLock::new(Vec::new()),
        }
    }

    /// 读取完整的有序自选股列表
    pub async fn list(&self) -> Result<Vec<WatchlistEntry>, StoreError> {
        self.store.list().await
    }

    /// # Summary
    /// 添加一只自选股。
    ///
    /// # Logic
    /// 1. 先抓一次行情以解析股票名称；失败记警告，名称留空。
    /// 2. 交由存储层幂等追加。
    ///
    /// # Returns
    /// `true` 表示新增，`false` 表示已在列表中。
    pub async fn add(&self, code: &str) -> Result<bool, StoreError> {
        let name = match self.hub.quote(code).await {
            Ok(quote) => quote.name,
            Err(e) => {
                warn!("could not resolve name for {}: {}", code, e);
                String::new()
            }
        };
        self.store.add(code, &name).await
    }

    /// # Summary
    /// 移除一只自选股。
    ///
    /// # Returns
    /// `true` 表示确有移除，`false` 表示本就不在列表中。
    pub async fn remove(&self, code: &str) -> Result<bool, StoreError> {
        self.store.remove(code).await
    }

    /// # Summary
    /// 刷新整张列表的实时行情。
    ///
    /// # Logic
    /// 1. 领取轮询周期序号，读取当前列表。
    /// 2. 并发抓取各股行情，失败的条目记警告后跳过。
    /// 3. 提交周期：被采纳则更新快照并返回新结果；
    ///    过期（已有更新周期提交）则丢弃本批结果，返回最新快照。
    pub async fn refresh(&self) -> Result<Vec<Quote>, StoreError> {
        let cycle = self.sequencer.begin();
        let entries = self.store.list().await?;

        let fetches = entries.iter().map(|entry| {
            let code = entry.code.clone();
            async move { (code.clone(), self.hub.quote(&code).await) }
        });

        let mut quotes = Vec::with_capacity(entries.len());
        for (code, result) in join_all(fetches).await {
            match result {
                Ok(quote) => quotes.push(quote),
                Err(e) => warn!("watchlist refresh skipped {}: {}", code, e),
            }
        }

        if self.sequencer.try_commit(cycle) {
            *self.last_snapshot.write().await = quotes.clone();
            Ok(quotes)
        } else {
            debug!("discarding stale watchlist cycle {}", cycle);
            Ok(self.last_snapshot.read().await.clone())
        }
    }
}
