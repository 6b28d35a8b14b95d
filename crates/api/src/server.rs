//! # API 服务启动器
//!
//! 组装 axum 路由、挂载 Swagger UI、配置 CORS 并绑定 TCP 端口对外提供服务。
//! 本模块不直接启动 `main()`, 而是由 `crates/app` 的 DI 容器持有并调用。

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use utoipa_swagger_ui::SwaggerUi;

use kanpan_market::hub::MarketHub;
use kanpan_market::watchlist::WatchlistService;

use crate::routes::{a_share, capital, us_market, watchlist};

// ============================================================
//  共享应用状态
// ============================================================

/// 全局应用状态，通过 axum 的 `State` 提取器注入到每个 Handler 中。
///
/// # Invariants
/// - 两个 Hub 与自选股服务在启动前由 DI 容器注入，生命周期与进程等同。
#[derive(Clone)]
pub struct AppState {
    /// A 股行情编排中枢
    pub a_share: Arc<MarketHub>,
    /// 美股行情编排中枢
    pub us: Arc<MarketHub>,
    /// 自选股服务
    pub watchlist: Arc<WatchlistService>,
}

// ============================================================
//  OpenAPI 文档定义
// ============================================================

/// 全局 OpenAPI 文档结构
#[derive(OpenApi)]
#[openapi(
    info(
        title = "看盘行情聚合 API",
        version = "0.1.0",
        description = "多上游股票行情聚合服务的 RESTful API。提供 A 股/美股指数、个股行情、K 线、热门榜、资金流向与自选股管理。",
        license(name = "MIT")
    ),
    tags(
        (name = "A股行情 (A-Share)", description = "A 股指数、个股详情、K 线、热门榜与搜索"),
        (name = "美股行情 (US)", description = "美股指数、个股行情、K 线与中概股热门榜"),
        (name = "资金流向 (CapitalFlow)", description = "A 股主力资金流向榜"),
        (name = "自选股 (Watchlist)", description = "自选股列表维护与行情刷新")
    )
)]
pub struct ApiDoc;

// ============================================================
//  服务构建与启动
// ============================================================

/// 构建完整的 axum 应用（含 Swagger UI 与 CORS）。
///
/// 拆出独立函数以便测试在任意 Listener 上直接 serve。
pub fn build_router(state: AppState) -> Router {
    let api_router = OpenApiRouter::new()
        .routes(routes!(a_share::get_indices))
        .routes(routes!(a_share::get_quote))
        .routes(routes!(a_share::get_kline))
        .routes(routes!(a_share::get_hot))
        .routes(routes!(a_share::search))
        .routes(routes!(capital::get_capital_flow))
        .routes(routes!(us_market::get_indices))
        .routes(routes!(us_market::get_quote))
        .routes(routes!(us_market::get_kline))
        .routes(routes!(us_market::get_hot))
        .routes(routes!(watchlist::get_watchlist))
        .routes(routes!(watchlist::add_to_watchlist))
        .routes(routes!(watchlist::remove_from_watchlist))
        .routes(routes!(watchlist::get_watchlist_quotes));

    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(api_router)
        .with_state(state)
        .split_for_parts();

    // CORS: 本服务只对本地前端开放，开发阶段允许所有来源
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api))
        .layer(cors)
}

/// 绑定 TCP 端口并启动 HTTP 监听，直到收到关停信号。
///
/// # Arguments
/// * `state` - 由外部 DI 容器注入的共享状态
/// * `bind_addr` - 监听的地址与端口，如 `"0.0.0.0:8080"`
pub async fn start_server(
    state: AppState,
    bind_addr: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_router(state);

    tracing::info!("🚀 Kanpan API Server listening on {}", bind_addr);
    tracing::info!("📖 Swagger UI: http://{}/swagger-ui/", bind_addr);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// 等待 Ctrl-C 关停信号
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("shutdown signal received, draining connections");
}
