//! # 多上游回退编排
//!
//! 每个市场一个 `MarketHub`，持有各操作的有序上游链。链内逐个尝试，
//! 失败、超时或空结果都落到下一个上游；链耗尽后，允许合成兜底的
//! 操作产出 `Sourced::Synthetic`，其余操作返回 `AllVendorsExhausted`。

use kanpan_core::cache::port::{Cache, CacheExt};
use kanpan_core::common::{HotListKind, KlinePeriod, Market};
use kanpan_core::market::entity::{
    CapitalFlowRecord, HotStock, KlineBar, MarketIndex, OrderBook, Quote, SearchHit, Sourced,
};
use kanpan_core::market::error::MarketError;
use kanpan_core::market::port::{
    CapitalFlowSource, HotListSource, IndexSource, KlineSource, OrderBookSource, QuoteSource,
    SearchSource, SyntheticSource,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// 允许合成兜底的操作集合，随 Hub 构造时声明
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticOps {
    pub indices: bool,
    pub kline: bool,
    pub hot: bool,
}

/// # Summary
/// 单一市场的行情编排中枢。
///
/// # Invariants
/// - 链内顺序即回退优先级，构造后不再变化，同样输入走同样的尝试序列。
/// - 逐上游套用统一超时；慢源不拖垮整条链。
/// - 只有真实上游数据进缓存；合成数据每次现生成，绝不缓存。
/// - 行情与盘口没有合成兜底（用户可能据此交易的数据宁缺毋假）。
pub struct MarketHub {
    market: Market,
    vendor_timeout: Duration,
    cache: Arc<dyn Cache>,
    cache_ttl: Duration,
    index_chain: Vec<Arc<dyn IndexSource>>,
    quote_chain: Vec<Arc<dyn QuoteSource>>,
    kline_chain: Vec<Arc<dyn KlineSource>>,
    hot_chain: Vec<Arc<dyn HotListSource>>,
    order_book_chain: Vec<Arc<dyn OrderBookSource>>,
    capital_flow_chain: Vec<Arc<dyn CapitalFlowSource>>,
    search_chain: Vec<Arc<dyn SearchSource>>,
    synthetic: Option<Arc<dyn SyntheticSource>>,
    synthetic_ops: SyntheticOps,
}

impl MarketHub {
    /// # Summary
    /// 创建空链 Hub，随后用 `with_*` 方法按优先级挂上游。
    ///
    /// # Arguments
    /// * `market`: 该 Hub 服务的市场。
    /// * `vendor_timeout`: 单个上游调用的时限。
    /// * `cache`: 真实结果的短时缓存。
    /// * `cache_ttl`: 缓存条目生存期，须不大于前端轮询间隔。
    pub fn new(
        market: Market,
        vendor_timeout: Duration,
        cache: Arc<dyn Cache>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            market,
            vendor_timeout,
            cache,
            cache_ttl,
            index_chain: Vec::new(),
            quote_chain: Vec::new(),
            kline_chain: Vec::new(),
            hot_chain: Vec::new(),
            order_book_chain: Vec::new(),
            capital_flow_chain: Vec::new(),
            search_chain: Vec::new(),
            synthetic: None,
            synthetic_ops: SyntheticOps::default(),
        }
    }

    pub fn with_index_source(mut self, source: Arc<dyn IndexSource>) -> Self {
        self.index_chain.push(source);
        self
    }

    pub fn with_quote_source(mut self, source: Arc<dyn QuoteSource>) -> Self {
        self.quote_chain.push(source);
        self
    }

    pub fn with_kline_source(mut self, source: Arc<dyn KlineSource>) -> Self {
        self.kline_chain.push(source);
        self
    }

    pub fn with_hot_source(mut self, source: Arc<dyn HotListSource>) -> Self {
        self.hot_chain.push(source);
        self
    }

    pub fn with_order_book_source(mut self, source: Arc<dyn OrderBookSource>) -> Self {
        self.order_book_chain.push(source);
        self
    }

    pub fn with_capital_flow_source(mut self, source: Arc<dyn CapitalFlowSource>) -> Self {
        self.capital_flow_chain.push(source);
        self
    }

    pub fn with_search_source(mut self, source: Arc<dyn SearchSource>) -> Self {
        self.search_chain.push(source);
        self
    }

    /// 挂合成兜底生成器，并声明哪些操作允许兜底
    pub fn with_synthetic(mut self, source: Arc<dyn SyntheticSource>, ops: SyntheticOps) -> Self {
        self.synthetic = Some(source);
        self.synthetic_ops = ops;
        self
    }

    /// 该 Hub 服务的市场
    pub fn market(&self) -> Market {
        self.market
    }

    /// 对单个上游调用套统一超时
    async fn timed<T, F>(&self, fut: F) -> Result<T, MarketError>
    where
        F: Future<Output = Result<T, MarketError>>,
    {
        tokio::time::timeout(self.vendor_timeout, fut)
            .await
            .unwrap_or(Err(MarketError::Timeout))
    }

    /// 命中缓存的真实结果直接返回，未命中返回 None。
    /// 缓存读写失败只降级为未命中，不影响主链路。
    async fn cached<T: serde::de::DeserializeOwned + Send>(&self, key: &str) -> Option<T> {
        match self.cache.get(key).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!("cache read failed for {}: {}", key, e);
                None
            }
        }
    }

    async fn store<T: serde::Serialize + Send + Sync>(&self, key: &str, value: &T) {
        if let Err(e) = self.cache.set(key, value, self.cache_ttl).await {
            warn!("cache write failed for {}: {}", key, e);
        }
    }

    // ========================================================
    //  操作入口
    // ========================================================

    /// # Summary
    /// 市场指数快照，链耗尽后按声明决定是否合成兜底。
    ///
    /// # Logic
    /// 1. 查缓存，命中直接返回真实数据。
    /// 2. 按链序逐个上游尝试（带超时），空结果视同失败。
    /// 3. 首个成功者入缓存并返回 `Real`。
    /// 4. 链耗尽且允许兜底时返回 `Synthetic`，否则报错。
    pub async fn indices(&self) -> Result<Sourced<Vec<MarketIndex>>, MarketError> {
        let key = format!("indices:{}", self.market);
        if let Some(hit) = self.cached::<Vec<MarketIndex>>(&key).await {
            return Ok(Sourced::Real(hit));
        }

        for source in &self.index_chain {
            match self.timed(source.fetch_indices()).await {
                Ok(indices) if !indices.is_empty() => {
                    debug!("indices served by {}", source.name());
                    self.store(&key, &indices).await;
                    return Ok(Sourced::Real(indices));
                }
                Ok(_) => warn!("{} returned empty indices, falling through", source.name()),
                Err(e) => warn!("{} indices failed: {}, falling through", source.name(), e),
            }
        }

        if self.synthetic_ops.indices
            && let Some(synth) = &self.synthetic
        {
            warn!("indices chain exhausted for {}, serving synthetic", self.market);
            return Ok(Sourced::Synthetic(synth.synth_us_indices()));
        }
        Err(MarketError::AllVendorsExhausted)
    }

    /// # Summary
    /// 单只证券实时行情。没有合成兜底。
    ///
    /// # Logic
    /// 1. 按链序尝试；`NotFound` 同样落到下一个上游
    ///    （主源覆盖不全时备源可能认识该代码）。
    /// 2. 全链 `NotFound` 时返回 `NotFound` 而非耗尽，
    ///    便于 API 层映射 404。
    pub async fn quote(&self, code: &str) -> Result<Quote, MarketError> {
        let key = format!("quote:{}:{}", self.market, code);
        if let Some(hit) = self.cached::<Quote>(&key).await {
            return Ok(hit);
        }

        let mut all_not_found = !self.quote_chain.is_empty();
        for source in &self.quote_chain {
            match self.timed(source.fetch_quote(code)).await {
                Ok(quote) => {
                    debug!("quote {} served by {}", code, source.name());
                    self.store(&key, &quote).await;
                    return Ok(quote);
                }
                Err(e) => {
                    if !matches!(e, MarketError::NotFound) {
                        all_not_found = false;
                    }
                    warn!("{} quote {} failed: {}, falling through", source.name(), code, e);
                }
            }
        }

        if all_not_found {
            return Err(MarketError::NotFound);
        }
        Err(MarketError::AllVendorsExhausted)
    }

    /// # Summary
    /// K 线序列，链耗尽后按声明决定是否合成兜底。
    pub async fn kline(
        &self,
        code: &str,
        period: KlinePeriod,
        count: usize,
    ) -> Result<Sourced<Vec<KlineBar>>, MarketError> {
        let key = format!("kline:{}:{}:{}:{}", self.market, code, period, count);
        if let Some(hit) = self.cached::<Vec<KlineBar>>(&key).await {
            return Ok(Sourced::Real(hit));
        }

        for source in &self.kline_chain {
            match self.timed(source.fetch_kline(code, period, count)).await {
                Ok(bars) if !bars.is_empty() => {
                    debug!("kline {} served by {}", code, source.name());
                    self.store(&key, &bars).await;
                    return Ok(Sourced::Real(bars));
                }
                Ok(_) => warn!("{} returned empty kline, falling through", source.name()),
                Err(e) => warn!("{} kline {} failed: {}, falling through", source.name(), code, e),
            }
        }

        if self.synthetic_ops.kline
            && let Some(synth) = &self.synthetic
        {
            warn!("kline chain exhausted for {}, serving synthetic", code);
            return Ok(Sourced::Synthetic(synth.synth_kline(count)));
        }
        Err(MarketError::AllVendorsExhausted)
    }

    /// # Summary
    /// 热门榜单，链耗尽后按声明决定是否合成兜底。
    pub async fn hot(
        &self,
        kind: HotListKind,
        limit: usize,
    ) -> Result<Sourced<Vec<HotStock>>, MarketError> {
        let key = format!("hot:{}:{}:{}", self.market, kind, limit);
        if let Some(hit) = self.cached::<Vec<HotStock>>(&key).await {
            return Ok(Sourced::Real(hit));
        }

        for source in &self.hot_chain {
            match self.timed(source.fetch_hot(kind, limit)).await {
                Ok(stocks) if !stocks.is_empty() => {
                    debug!("hot {} served by {}", kind, source.name());
                    self.store(&key, &stocks).await;
                    return Ok(Sourced::Real(stocks));
                }
                Ok(_) => warn!("{} returned empty hot list, falling through", source.name()),
                Err(e) => warn!("{} hot {} failed: {}, falling through", source.name(), kind, e),
            }
        }

        if self.synthetic_ops.hot
            && let Some(synth) = &self.synthetic
        {
            warn!("hot chain exhausted for {}, serving synthetic", kind);
            return Ok(Sourced::Synthetic(synth.synth_hot(limit)));
        }
        Err(MarketError::AllVendorsExhausted)
    }

    /// # Summary
    /// 五档盘口。没有合成兜底，盘口数据宁缺毋假。
    pub async fn order_book(&self, code: &str) -> Result<OrderBook, MarketError> {
        let key = format!("orderbook:{}:{}", self.market, code);
        if let Some(hit) = self.cached::<OrderBook>(&key).await {
            return Ok(hit);
        }

        for source in &self.order_book_chain {
            match self.timed(source.fetch_order_book(code)).await {
                Ok(book) => {
                    self.store(&key, &book).await;
                    return Ok(book);
                }
                Err(e) => {
                    warn!("{} order book {} failed: {}, falling through", source.name(), code, e);
                }
            }
        }
        Err(MarketError::AllVendorsExhausted)
    }

    /// # Summary
    /// 资金流向榜。没有合成兜底。
    pub async fn capital_flow(&self, limit: usize) -> Result<Vec<CapitalFlowRecord>, MarketError> {
        let key = format!("capitalflow:{}:{}", self.market, limit);
        if let Some(hit) = self.cached::<Vec<CapitalFlowRecord>>(&key).await {
            return Ok(hit);
        }

        for source in &self.capital_flow_chain {
            match self.timed(source.fetch_capital_flow(limit)).await {
                Ok(records) if !records.is_empty() => {
                    self.store(&key, &records).await;
                    return Ok(records);
                }
                Ok(_) => warn!("{} returned empty capital flow, falling through", source.name()),
                Err(e) => warn!("{} capital flow failed: {}, falling through", source.name(), e),
            }
        }
        Err(MarketError::AllVendorsExhausted)
    }

    /// # Summary
    /// 证券搜索：首个给出非空命中的上游胜出。
    ///
    /// # Logic
    /// 1. 命中结果按相关性过滤（代码/名称子串、拼音前缀）。
    /// 2. 某上游出错或过滤后为空都落到下一个上游。
    /// 3. 全链无命中返回空列表（搜不到不算错误）。
    pub async fn search(&self, query: &str) -> Result<Vec<SearchHit>, MarketError> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        for source in &self.search_chain {
            match self.timed(source.search(trimmed)).await {
                Ok(hits) => {
                    let filtered: Vec<SearchHit> = hits
                        .into_iter()
                        .filter(|hit| matches_query(hit, trimmed))
                        .collect();
                    if !filtered.is_empty() {
                        debug!("search '{}' served by {}", trimmed, source.name());
                        return Ok(filtered);
                    }
                    debug!("{} had no hits for '{}', falling through", source.name(), trimmed);
                }
                Err(e) => {
                    warn!("{} search '{}' failed: {}, falling through", source.name(), trimmed, e);
                }
            }
        }
        Ok(Vec::new())
    }
}

/// 命中判定：代码子串、名称子串或拼音首字母前缀（大小写不敏感）
fn matches_query(hit: &SearchHit, query: &str) -> bool {
    let q = query.to_lowercase();
    if hit.code.to_lowercase().contains(&q) || hit.name.contains(query) {
        return true;
    }
    hit.pinyin
        .as_deref()
        .is_some_and(|p| p.to_lowercase().starts_with(&q))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(code: &str, name: &str, pinyin: Option<&str>) -> SearchHit {
        SearchHit {
            code: code.to_string(),
            name: name.to_string(),
            pinyin: pinyin.map(|p| p.to_string()),
        }
    }

    #[test]
    fn test_matches_query() {
        let maotai = hit("sh600519", "贵州茅台", Some("gzmt"));

        // 名称子串
        assert!(matches_query(&maotai, "茅台"));
        // 代码子串
        assert!(matches_query(&maotai, "600519"));
        assert!(matches_query(&maotai, "SH600519"));
        // 拼音前缀
        assert!(matches_query(&maotai, "gz"));
        assert!(matches_query(&maotai, "GZMT"));
        // 不相关
        assert!(!matches_query(&maotai, "平安"));
        // 拼音是前缀匹配而非子串匹配
        assert!(!matches_query(&maotai, "zmt"));
    }
}
