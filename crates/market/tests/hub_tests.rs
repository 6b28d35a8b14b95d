use async_trait::async_trait;
use kanpan_cache::mem::MemCache;
use kanpan_core::common::{HotListKind, KlinePeriod, Market};
use kanpan_core::market::entity::{
    HotStock, KlineBar, MarketIndex, OrderBook, OrderLevel, Quote, SearchHit,
};
use kanpan_core::market::error::MarketError;
use kanpan_core::market::port::{
    HotListSource, IndexSource, KlineSource, OrderBookSource, QuoteSource, SearchSource,
    SyntheticSource,
};
use kanpan_market::hub::{MarketHub, SyntheticOps};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

// ============================================================
//  测试桩
// ============================================================

fn sample_quote(code: &str, price: f64) -> Quote {
    Quote {
        code: code.to_string(),
        name: "测试股".to_string(),
        current_price: price,
        change: 0.5,
        change_percent: 0.5,
        open: price,
        high: price + 1.0,
        low: price - 1.0,
        prev_close: price - 0.5,
        volume: 10000.0,
        amount: 10000.0 * price,
        timestamp: chrono::Utc::now(),
    }
}

fn sample_bars(n: usize) -> Vec<KlineBar> {
    (0..n)
        .map(|i| KlineBar {
            date: format!("2026-08-{:02}", i + 1),
            open: 10.0,
            high: 11.0,
            low: 9.0,
            close: 10.5,
            volume: 1000.0,
            amount: 10500.0,
        })
        .collect()
}

/// 桩行为：成功 / 各类失败 / 慢响应
enum StubBehavior {
    Ok(f64),
    NetworkError,
    NotFound,
    Slow(Duration, f64),
}

struct QuoteStub {
    vendor: &'static str,
    behavior: StubBehavior,
    calls: AtomicUsize,
}

impl QuoteStub {
    fn new(vendor: &'static str, behavior: StubBehavior) -> Arc<Self> {
        Arc::new(Self {
            vendor,
            behavior,
            calls: AtomicUsize::new(0),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteSource for QuoteStub {
    fn name(&self) -> &'static str {
        self.vendor
    }

    async fn fetch_quote(&self, code: &str) -> Result<Quote, MarketError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            StubBehavior::Ok(price) => Ok(sample_quote(code, *price)),
            StubBehavior::NetworkError => Err(MarketError::Network("connection refused".into())),
            StubBehavior::NotFound => Err(MarketError::NotFound),
            StubBehavior::Slow(delay, price) => {
                tokio::time::sleep(*delay).await;
                Ok(sample_quote(code, *price))
            }
        }
    }
}

struct FailingKline {
    calls: AtomicUsize,
}

#[async_trait]
impl KlineSource for FailingKline {
    fn name(&self) -> &'static str {
        "failing-kline"
    }

    async fn fetch_kline(
        &self,
        _code: &str,
        _period: KlinePeriod,
        _count: usize,
    ) -> Result<Vec<KlineBar>, MarketError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(MarketError::Network("upstream down".into()))
    }
}

struct OkKline;

#[async_trait]
impl KlineSource for OkKline {
    fn name(&self) -> &'static str {
        "ok-kline"
    }

    async fn fetch_kline(
        &self,
        _code: &str,
        _period: KlinePeriod,
        count: usize,
    ) -> Result<Vec<KlineBar>, MarketError> {
        Ok(sample_bars(count))
    }
}

struct FailingOrderBook;

#[async_trait]
impl OrderBookSource for FailingOrderBook {
    fn name(&self) -> &'static str {
        "failing-orderbook"
    }

    async fn fetch_order_book(&self, _code: &str) -> Result<OrderBook, MarketError> {
        Err(MarketError::Network("upstream down".into()))
    }
}

struct OkOrderBook;

#[async_trait]
impl OrderBookSource for OkOrderBook {
    fn name(&self) -> &'static str {
        "ok-orderbook"
    }

    async fn fetch_order_book(&self, _code: &str) -> Result<OrderBook, MarketError> {
        let level = |l: u8| OrderLevel {
            price: 10.0,
            volume: 100.0,
            level: l,
        };
        Ok(OrderBook {
            buy: (1..=5).map(level).collect(),
            sell: (1..=5).map(level).collect(),
        })
    }
}

struct EmptyHot;

#[async_trait]
impl HotListSource for EmptyHot {
    fn name(&self) -> &'static str {
        "empty-hot"
    }

    async fn fetch_hot(
        &self,
        _kind: HotListKind,
        _limit: usize,
    ) -> Result<Vec<HotStock>, MarketError> {
        // 空结果应视同失败落到下一个上游
        Ok(Vec::new())
    }
}

struct EmptyIndices;

#[async_trait]
impl IndexSource for EmptyIndices {
    fn name(&self) -> &'static str {
        "empty-indices"
    }

    async fn fetch_indices(&self) -> Result<Vec<MarketIndex>, MarketError> {
        Ok(Vec::new())
    }
}

struct StubSearch {
    vendor: &'static str,
    hits: Vec<SearchHit>,
}

#[async_trait]
impl SearchSource for StubSearch {
    fn name(&self) -> &'static str {
        self.vendor
    }

    async fn search(&self, _query: &str) -> Result<Vec<SearchHit>, MarketError> {
        Ok(self.hits.clone())
    }
}

struct StubSynthetic;

impl SyntheticSource for StubSynthetic {
    fn synth_kline(&self, count: usize) -> Vec<KlineBar> {
        sample_bars(count)
    }

    fn synth_hot(&self, limit: usize) -> Vec<HotStock> {
        (0..limit)
            .map(|i| HotStock {
                code: format!("60000{}", i),
                name: "占位".to_string(),
                current_price: 10.0,
                change_percent: 1.0,
                open: 10.0,
                high: 10.5,
                low: 9.5,
                prev_close: 9.9,
                volume: 1000.0,
                amount: 10000.0,
                turnover_rate: 1.0,
            })
            .collect()
    }

    fn synth_us_indices(&self) -> Vec<MarketIndex> {
        Vec::new()
    }
}

fn bare_hub() -> MarketHub {
    MarketHub::new(
        Market::AShare,
        Duration::from_millis(200),
        Arc::new(MemCache::new()),
        Duration::from_secs(5),
    )
}

// ============================================================
//  回退链
// ============================================================

/// # Summary
/// 主源网络失败时备源接管，且两源各被调用一次。
#[tokio::test]
async fn test_quote_fallback_to_secondary() {
    let primary = QuoteStub::new("primary", StubBehavior::NetworkError);
    let secondary = QuoteStub::new("secondary", StubBehavior::Ok(42.0));

    let hub = bare_hub()
        .with_quote_source(primary.clone())
        .with_quote_source(secondary.clone());

    let quote = hub.quote("600519").await.expect("secondary should win");
    assert!((quote.current_price - 42.0).abs() < 1e-9);
    assert_eq!(primary.call_count(), 1);
    assert_eq!(secondary.call_count(), 1);
}

/// # Summary
/// 主源超过单上游时限时按超时落到备源。
#[tokio::test]
async fn test_quote_slow_primary_times_out() {
    let primary = QuoteStub::new("slow", StubBehavior::Slow(Duration::from_secs(5), 1.0));
    let secondary = QuoteStub::new("fast", StubBehavior::Ok(2.0));

    let hub = bare_hub()
        .with_quote_source(primary.clone())
        .with_quote_source(secondary.clone());

    let quote = hub.quote("600519").await.expect("fast vendor should win");
    assert!((quote.current_price - 2.0).abs() < 1e-9);
    assert_eq!(secondary.call_count(), 1);
}

/// # Summary
/// 全链都报标的不存在时返回 NotFound 而非耗尽。
#[tokio::test]
async fn test_quote_all_not_found() {
    let a = QuoteStub::new("a", StubBehavior::NotFound);
    let b = QuoteStub::new("b", StubBehavior::NotFound);

    let hub = bare_hub().with_quote_source(a).with_quote_source(b);

    assert!(matches!(
        hub.quote("999999").await,
        Err(MarketError::NotFound)
    ));
}

/// # Summary
/// 混合失败（网络错误 + 不存在）最终归为链耗尽。
#[tokio::test]
async fn test_quote_mixed_failures_exhausted() {
    let a = QuoteStub::new("a", StubBehavior::NetworkError);
    let b = QuoteStub::new("b", StubBehavior::NotFound);

    let hub = bare_hub().with_quote_source(a).with_quote_source(b);

    assert!(matches!(
        hub.quote("600519").await,
        Err(MarketError::AllVendorsExhausted)
    ));
}

// ============================================================
//  合成兜底
// ============================================================

/// # Summary
/// K 线链耗尽后产出打上合成标记的占位序列。
#[tokio::test]
async fn test_kline_exhaustion_serves_synthetic() {
    let failing = Arc::new(FailingKline {
        calls: AtomicUsize::new(0),
    });
    let hub = bare_hub()
        .with_kline_source(failing.clone())
        .with_synthetic(
            Arc::new(StubSynthetic),
            SyntheticOps {
                kline: true,
                ..Default::default()
            },
        );

    let result = hub
        .kline("600519", KlinePeriod::Day, 10)
        .await
        .expect("synthetic tail should serve");

    assert!(result.is_synthetic(), "exhausted chain must be tagged synthetic");
    assert_eq!(result.inner().len(), 10);
    assert_eq!(failing.calls.load(Ordering::SeqCst), 1);
}

/// # Summary
/// 真实上游成功时结果标记为 Real。
#[tokio::test]
async fn test_kline_real_vendor_not_tagged() {
    let hub = bare_hub().with_kline_source(Arc::new(OkKline)).with_synthetic(
        Arc::new(StubSynthetic),
        SyntheticOps {
            kline: true,
            ..Default::default()
        },
    );

    let result = hub.kline("600519", KlinePeriod::Day, 5).await.expect("kline");
    assert!(!result.is_synthetic());
    assert_eq!(result.inner().len(), 5);
}

/// # Summary
/// 盘口没有合成兜底：链耗尽必须报错，即使挂了合成生成器。
#[tokio::test]
async fn test_order_book_never_synthetic() {
    let hub = bare_hub()
        .with_order_book_source(Arc::new(FailingOrderBook))
        .with_synthetic(
            Arc::new(StubSynthetic),
            SyntheticOps {
                indices: true,
                kline: true,
                hot: true,
            },
        );

    assert!(matches!(
        hub.order_book("600519").await,
        Err(MarketError::AllVendorsExhausted)
    ));
}

/// # Summary
/// 空的热门榜结果视同失败，落到合成兜底。
#[tokio::test]
async fn test_empty_hot_falls_to_synthetic() {
    let hub = bare_hub().with_hot_source(Arc::new(EmptyHot)).with_synthetic(
        Arc::new(StubSynthetic),
        SyntheticOps {
            hot: true,
            ..Default::default()
        },
    );

    let result = hub.hot(HotListKind::Rise, 5).await.expect("synthetic hot");
    assert!(result.is_synthetic());
    assert_eq!(result.inner().len(), 5);
}

/// # Summary
/// 指数链耗尽且未声明兜底时报错。
#[tokio::test]
async fn test_indices_without_synthetic_exhausted() {
    let hub = bare_hub().with_index_source(Arc::new(EmptyIndices));

    assert!(matches!(
        hub.indices().await,
        Err(MarketError::AllVendorsExhausted)
    ));
}

// ============================================================
//  缓存
// ============================================================

/// # Summary
/// 生存期内重复请求由缓存供给，上游只被调用一次。
#[tokio::test]
async fn test_cache_suppresses_duplicate_vendor_calls() {
    let vendor = QuoteStub::new("cached", StubBehavior::Ok(10.0));
    let hub = bare_hub().with_quote_source(vendor.clone());

    let first = hub.quote("600519").await.expect("first call");
    let second = hub.quote("600519").await.expect("second call");

    assert!((first.current_price - second.current_price).abs() < 1e-9);
    assert_eq!(vendor.call_count(), 1, "second request must hit cache");

    // 不同代码不共享缓存条目
    let _ = hub.quote("000001").await.expect("different code");
    assert_eq!(vendor.call_count(), 2);
}

// ============================================================
//  搜索
// ============================================================

/// # Summary
/// 首个上游无命中时落到备源，命中按相关性过滤。
#[tokio::test]
async fn test_search_falls_through_and_filters() {
    let maotai = SearchHit {
        code: "sh600519".to_string(),
        name: "贵州茅台".to_string(),
        pinyin: Some("gzmt".to_string()),
    };
    let pingan = SearchHit {
        code: "sz000001".to_string(),
        name: "平安银行".to_string(),
        pinyin: Some("payh".to_string()),
    };

    let empty = Arc::new(StubSearch {
        vendor: "empty",
        hits: Vec::new(),
    });
    let full = Arc::new(StubSearch {
        vendor: "full",
        hits: vec![maotai, pingan],
    });

    let hub = bare_hub().with_search_source(empty).with_search_source(full);

    let hits = hub.search("茅台").await.expect("search");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].code, "sh600519");

    // 全链无命中返回空列表而非错误
    let none = hub.search("不存在的股票").await.expect("no hits");
    assert!(none.is_empty());

    // 空白查询直接短路
    let blank = hub.search("   ").await.expect("blank");
    assert!(blank.is_empty());
}
