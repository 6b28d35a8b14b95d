use std::sync::Arc;
use std::time::Duration;

use kanpan_api::server::{AppState, start_server};
use kanpan_cache::mem::MemCache;
use kanpan_core::common::Market;
use kanpan_feed::build_http_client;
use kanpan_feed::eastmoney::EastmoneyFeed;
use kanpan_feed::sina::SinaFeed;
use kanpan_feed::synthetic::SyntheticFeed;
use kanpan_feed::tencent::TencentFeed;
use kanpan_market::hub::{MarketHub, SyntheticOps};
use kanpan_market::watchlist::WatchlistService;
use kanpan_store::watchlist::SqliteWatchlistStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod settings;

/// # Summary
/// 应用启动入口，纯粹的 DI 容器。
/// 负责实例化所有具体上游适配器并按市场组装编排中枢，最后交给 API 层监听。
///
/// # Logic
/// 1. 初始化全局日志与配置。
/// 2. 实例化基础设施层（HTTP 客户端、各上游 Feed、缓存、存储）。
/// 3. 按降级顺序组装 A 股与美股两个 MarketHub。
/// 4. 构造自选股服务并启动 HTTP 服务，直到收到关停信号。
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 初始化日志与配置
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = settings::Settings::load()?;
    info!("Kanpan starting on {}...", settings.bind_addr());

    kanpan_store::config::set_root_dir(settings.database.data_dir.clone().into());

    // 2. 实例化基础设施层
    let client = build_http_client(Duration::from_millis(settings.market.http_timeout_ms))?;

    let eastmoney = Arc::new(EastmoneyFeed::new(client.clone()));
    let tencent_cn = Arc::new(TencentFeed::a_share(client.clone()));
    let tencent_us = Arc::new(TencentFeed::us(client.clone()));
    let sina = Arc::new(SinaFeed::new(client));
    let synthetic = Arc::new(SyntheticFeed::new());

    let cache = Arc::new(MemCache::new());
    let vendor_timeout = Duration::from_millis(settings.market.vendor_timeout_ms);
    let cache_ttl = Duration::from_millis(settings.market.cache_ttl_ms);

    // 3. 组装 A 股中枢：东方财富主源，腾讯备源；K 线/盘口走新浪。
    //    盘口与资金流向绝不使用合成兜底。
    let a_share = Arc::new(
        MarketHub::new(Market::AShare, vendor_timeout, cache.clone(), cache_ttl)
            .with_index_source(eastmoney.clone())
            .with_index_source(tencent_cn.clone())
            .with_quote_source(eastmoney.clone())
            .with_quote_source(tencent_cn)
            .with_kline_source(sina.clone())
            .with_hot_source(eastmoney.clone())
            .with_order_book_source(sina.clone())
            .with_capital_flow_source(eastmoney.clone())
            .with_search_source(eastmoney)
            .with_search_source(sina.clone())
            .with_synthetic(
                synthetic.clone(),
                SyntheticOps {
                    kline: true,
                    hot: true,
                    ..Default::default()
                },
            ),
    );

    // 美股中枢：腾讯主源，美股日 K 走新浪；指数/K 线/热门榜允许合成兜底。
    let us = Arc::new(
        MarketHub::new(Market::Us, vendor_timeout, cache, cache_ttl)
            .with_index_source(tencent_us.clone())
            .with_quote_source(tencent_us.clone())
            .with_kline_source(sina)
            .with_hot_source(tencent_us)
            .with_synthetic(
                synthetic,
                SyntheticOps {
                    indices: true,
                    kline: true,
                    hot: true,
                },
            ),
    );

    // 4. 自选股服务跟随 A 股中枢（自选股均为 A 股代码）
    let store = Arc::new(SqliteWatchlistStore::new().await?);
    let watchlist = Arc::new(WatchlistService::new(store, a_share.clone()));

    let state = AppState {
        a_share,
        us,
        watchlist,
    };

    start_server(state, &settings.bind_addr()).await
}
