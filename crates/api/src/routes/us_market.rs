//! 美股行情路由：三大指数、个股行情、日/周/月 K 线、中概股热门榜。

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::routes::{DEFAULT_KLINE_COUNT, MAX_KLINE_COUNT, MAX_LIST_LIMIT, clamp_limit, parse_period};
use crate::server::AppState;
use crate::types::{
    ApiResponse, HotStockResponse, IndexResponse, KlineBarResponse, QuoteResponse, TaggedItems,
};

/// 获取美股三大指数（道琼斯、纳斯达克、标普500）
#[utoipa::path(
    get,
    path = "/api/v1/us/indices",
    tag = "美股行情 (US)",
    responses(
        (status = 200, description = "获取成功", body = ApiResponse<TaggedItems<IndexResponse>>)
    )
)]
pub async fn get_indices(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<TaggedItems<IndexResponse>>>, ApiError> {
    let indices = state.us.indices().await?;
    Ok(Json(ApiResponse::ok(TaggedItems::from_sourced(indices))))
}

/// 获取单只美股实时行情
#[utoipa::path(
    get,
    path = "/api/v1/us/quote/{ticker}",
    tag = "美股行情 (US)",
    params(
        ("ticker" = String, Path, description = "美股 ticker，如 AAPL")
    ),
    responses(
        (status = 200, description = "获取成功", body = ApiResponse<QuoteResponse>),
        (status = 404, description = "证券不存在"),
        (status = 502, description = "行情上游不可用")
    )
)]
pub async fn get_quote(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Json<ApiResponse<QuoteResponse>>, ApiError> {
    let quote = state.us.quote(&ticker).await?;
    Ok(Json(ApiResponse::ok(quote.into())))
}

#[derive(Deserialize, ToSchema)]
pub struct UsKlineQuery {
    /// K 线周期: day/week/month，缺省 day（美股不支持分钟级）
    pub period: Option<String>,
    /// 条数上限，缺省 100，最大 500
    pub count: Option<usize>,
}

/// 获取美股 K 线（仅日/周/月）
#[utoipa::path(
    get,
    path = "/api/v1/us/kline/{ticker}",
    tag = "美股行情 (US)",
    params(
        ("ticker" = String, Path, description = "美股 ticker"),
        ("period" = Option<String>, Query, description = "周期 day/week/month"),
        ("count" = Option<usize>, Query, description = "条数，1..=500")
    ),
    responses(
        (status = 200, description = "获取成功", body = ApiResponse<TaggedItems<KlineBarResponse>>),
        (status = 400, description = "周期参数非法或为分钟级")
    )
)]
pub async fn get_kline(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(query): Query<UsKlineQuery>,
) -> Result<Json<ApiResponse<TaggedItems<KlineBarResponse>>>, ApiError> {
    let period = parse_period(query.period.as_deref())?;
    if period.is_intraday() {
        return Err(ApiError::BadRequest(
            "美股 K 线不支持分钟级周期".to_string(),
        ));
    }
    let count = clamp_limit(query.count, DEFAULT_KLINE_COUNT, MAX_KLINE_COUNT);

    let bars = state.us.kline(&ticker, period, count).await?;
    Ok(Json(ApiResponse::ok(TaggedItems::from_sourced(bars))))
}

#[derive(Deserialize, ToSchema)]
pub struct UsHotQuery {
    /// 条数，缺省 20，最大 100
    pub limit: Option<usize>,
}

/// 获取中概股热门榜（按涨跌幅降序）
#[utoipa::path(
    get,
    path = "/api/v1/us/hot",
    tag = "美股行情 (US)",
    params(
        ("limit" = Option<usize>, Query, description = "条数，1..=100")
    ),
    responses(
        (status = 200, description = "获取成功", body = ApiResponse<TaggedItems<HotStockResponse>>)
    )
)]
pub async fn get_hot(
    State(state): State<AppState>,
    Query(query): Query<UsHotQuery>,
) -> Result<Json<ApiResponse<TaggedItems<HotStockResponse>>>, ApiError> {
    let limit = clamp_limit(query.limit, 20, MAX_LIST_LIMIT);

    // 美股热门榜只有涨幅口径
    let stocks = state
        .us
        .hot(kanpan_core::common::HotListKind::Rise, limit)
        .await?;
    Ok(Json(ApiResponse::ok(TaggedItems::from_sourced(stocks))))
}
