//! A 股行情路由：指数、个股详情（行情 + 盘口）、K 线、热门榜、搜索。

use axum::Json;
use axum::extract::{Path, Query, State};
use kanpan_core::common::HotListKind;
use serde::Deserialize;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::routes::{DEFAULT_KLINE_COUNT, MAX_KLINE_COUNT, MAX_LIST_LIMIT, clamp_limit, parse_period};
use crate::server::AppState;
use crate::types::{
    ApiResponse, HotStockResponse, IndexResponse, KlineBarResponse, QuoteDetailResponse,
    SearchHitResponse, TaggedItems,
};

/// 获取 A 股三大指数
#[utoipa::path(
    get,
    path = "/api/v1/a/indices",
    tag = "A股行情 (A-Share)",
    responses(
        (status = 200, description = "获取成功", body = ApiResponse<TaggedItems<IndexResponse>>),
        (status = 502, description = "行情上游不可用")
    )
)]
pub async fn get_indices(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<TaggedItems<IndexResponse>>>, ApiError> {
    let indices = state.a_share.indices().await?;
    Ok(Json(ApiResponse::ok(TaggedItems::from_sourced(indices))))
}

/// 获取 A 股个股详情：实时行情 + 五档盘口
///
/// 行情与盘口并发取数；盘口源失败只置 null，不拖垮行情主体。
#[utoipa::path(
    get,
    path = "/api/v1/a/quote/{code}",
    tag = "A股行情 (A-Share)",
    params(
        ("code" = String, Path, description = "股票代码，可带 sh/sz 前缀")
    ),
    responses(
        (status = 200, description = "获取成功", body = ApiResponse<QuoteDetailResponse>),
        (status = 404, description = "证券不存在"),
        (status = 502, description = "行情上游不可用")
    )
)]
pub async fn get_quote(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<QuoteDetailResponse>>, ApiError> {
    let (quote, order_book) = tokio::join!(
        state.a_share.quote(&code),
        state.a_share.order_book(&code)
    );

    let quote = quote?;
    let order_book = match order_book {
        Ok(book) => Some(book.into()),
        Err(e) => {
            tracing::warn!("order book unavailable for {}: {}", code, e);
            None
        }
    };

    Ok(Json(ApiResponse::ok(QuoteDetailResponse {
        quote: quote.into(),
        order_book,
    })))
}

#[derive(Deserialize, ToSchema)]
pub struct KlineQuery {
    /// K 线周期: day/week/month/60m/30m/15m/5m，缺省 day
    pub period: Option<String>,
    /// 条数上限，缺省 100，最大 500
    pub count: Option<usize>,
}

/// 获取 A 股 K 线
#[utoipa::path(
    get,
    path = "/api/v1/a/kline/{code}",
    tag = "A股行情 (A-Share)",
    params(
        ("code" = String, Path, description = "股票代码"),
        ("period" = Option<String>, Query, description = "周期 day/week/month/60m/30m/15m/5m"),
        ("count" = Option<usize>, Query, description = "条数，1..=500")
    ),
    responses(
        (status = 200, description = "获取成功", body = ApiResponse<TaggedItems<KlineBarResponse>>),
        (status = 400, description = "周期参数非法")
    )
)]
pub async fn get_kline(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(query): Query<KlineQuery>,
) -> Result<Json<ApiResponse<TaggedItems<KlineBarResponse>>>, ApiError> {
    let period = parse_period(query.period.as_deref())?;
    let count = clamp_limit(query.count, DEFAULT_KLINE_COUNT, MAX_KLINE_COUNT);

    let bars = state.a_share.kline(&code, period, count).await?;
    Ok(Json(ApiResponse::ok(TaggedItems::from_sourced(bars))))
}

#[derive(Deserialize, ToSchema)]
pub struct HotQuery {
    /// 榜单口径: rise/fall/volume，缺省 rise
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// 条数，缺省 20，最大 100
    pub limit: Option<usize>,
}

/// 获取 A 股热门榜
#[utoipa::path(
    get,
    path = "/api/v1/a/hot",
    tag = "A股行情 (A-Share)",
    params(
        ("type" = Option<String>, Query, description = "榜单口径 rise/fall/volume"),
        ("limit" = Option<usize>, Query, description = "条数，1..=100")
    ),
    responses(
        (status = 200, description = "获取成功", body = ApiResponse<TaggedItems<HotStockResponse>>),
        (status = 400, description = "榜单口径非法")
    )
)]
pub async fn get_hot(
    State(state): State<AppState>,
    Query(query): Query<HotQuery>,
) -> Result<Json<ApiResponse<TaggedItems<HotStockResponse>>>, ApiError> {
    let kind = match query.kind.as_deref() {
        None => HotListKind::Rise,
        Some(s) => HotListKind::from_str(s).map_err(ApiError::BadRequest)?,
    };
    let limit = clamp_limit(query.limit, 20, MAX_LIST_LIMIT);

    let stocks = state.a_share.hot(kind, limit).await?;
    Ok(Json(ApiResponse::ok(TaggedItems::from_sourced(stocks))))
}

#[derive(Deserialize, ToSchema)]
pub struct SearchQuery {
    /// 搜索关键字：代码子串、名称子串或拼音首字母
    pub q: String,
}

/// 搜索 A 股证券
#[utoipa::path(
    get,
    path = "/api/v1/a/search",
    tag = "A股行情 (A-Share)",
    params(
        ("q" = String, Query, description = "搜索关键字")
    ),
    responses(
        (status = 200, description = "获取成功（无命中时为空列表）", body = ApiResponse<Vec<SearchHitResponse>>)
    )
)]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<Vec<SearchHitResponse>>>, ApiError> {
    let hits = state.a_share.search(&query.q).await?;
    Ok(Json(ApiResponse::ok(
        hits.into_iter().map(Into::into).collect(),
    )))
}
