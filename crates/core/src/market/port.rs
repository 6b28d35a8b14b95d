use crate::common::{HotListKind, KlinePeriod};
use crate::market::entity::{
    CapitalFlowRecord, HotStock, KlineBar, MarketIndex, OrderBook, Quote, SearchHit,
};
use crate::market::error::MarketError;
use async_trait::async_trait;

/// # Summary
/// 指数快照数据源接口。
///
/// # Invariants
/// - 实现者自身不做重试与回退，失败直接返回错误交由编排层处理。
#[async_trait]
pub trait IndexSource: Send + Sync {
    /// 数据源名称（用于日志与回退链排障）
    fn name(&self) -> &'static str;

    /// # Summary
    /// 抓取该数据源覆盖的全部市场指数。
    ///
    /// # Returns
    /// 成功返回非空指数列表；空列表视同失败，由编排层回退。
    async fn fetch_indices(&self) -> Result<Vec<MarketIndex>, MarketError>;
}

/// # Summary
/// 个股实时行情数据源接口。
#[async_trait]
pub trait QuoteSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// # Summary
    /// 抓取单只证券的实时行情。
    ///
    /// # Arguments
    /// * `code`: 证券代码（可带 sh/sz 前缀或为美股 ticker）。
    ///
    /// # Returns
    /// 标的不存在时必须返回 `MarketError::NotFound`，
    /// 绝不允许返回全零的伪行情。
    async fn fetch_quote(&self, code: &str) -> Result<Quote, MarketError>;
}

/// # Summary
/// K 线历史数据源接口。
#[async_trait]
pub trait KlineSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// # Summary
    /// 抓取指定证券的 K 线序列。
    ///
    /// # Arguments
    /// * `code`: 证券代码。
    /// * `period`: K 线周期。
    /// * `count`: 期望的 K 线数量上限。
    ///
    /// # Returns
    /// 按日期升序排列的 K 线列表。
    async fn fetch_kline(
        &self,
        code: &str,
        period: KlinePeriod,
        count: usize,
    ) -> Result<Vec<KlineBar>, MarketError>;
}

/// # Summary
/// 热门榜单数据源接口。
#[async_trait]
pub trait HotListSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// # Summary
    /// 抓取热门榜单。
    ///
    /// # Arguments
    /// * `kind`: 榜单口径（涨幅/跌幅/成交量）。
    /// * `limit`: 条目数上限。
    async fn fetch_hot(&self, kind: HotListKind, limit: usize)
    -> Result<Vec<HotStock>, MarketError>;
}

/// # Summary
/// 五档盘口数据源接口。
#[async_trait]
pub trait OrderBookSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// # Summary
    /// 抓取单只证券的五档买卖盘口。
    async fn fetch_order_book(&self, code: &str) -> Result<OrderBook, MarketError>;
}

/// # Summary
/// 资金流向数据源接口。
#[async_trait]
pub trait CapitalFlowSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// # Summary
    /// 抓取按主力净流入降序排列的资金流向列表。
    async fn fetch_capital_flow(&self, limit: usize)
    -> Result<Vec<CapitalFlowRecord>, MarketError>;
}

/// # Summary
/// 证券搜索数据源接口。
#[async_trait]
pub trait SearchSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// # Summary
    /// 按代码子串、名称子串或拼音首字母前缀搜索证券。
    ///
    /// # Returns
    /// 无命中时返回空列表而非错误。
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, MarketError>;
}

/// # Summary
/// 合成占位数据生成器接口。
///
/// # Invariants
/// - 产出与真实数据形状兼容、数值范围合理的占位数据。
/// - 只允许生成 K 线、热门榜、指数三类；行情与盘口绝不合成
///   （对用户可能据此交易的数据，宁可报错也不造假）。
pub trait SyntheticSource: Send + Sync {
    /// 生成一段占位 K 线序列（日期升序，OHLC 包络关系恒成立）
    fn synth_kline(&self, count: usize) -> Vec<KlineBar>;

    /// 生成占位热门榜
    fn synth_hot(&self, limit: usize) -> Vec<HotStock>;

    /// 生成占位美股指数
    fn synth_us_indices(&self) -> Vec<MarketIndex>;
}
