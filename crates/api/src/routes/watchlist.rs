//! 自选股路由：列表维护与整列表行情刷新。

use axum::Json;
use axum::extract::{Path, State};

use crate::error::ApiError;
use crate::server::AppState;
use crate::types::{ApiResponse, QuoteResponse, WatchlistAddRequest, WatchlistEntryResponse};

/// 获取自选股列表
#[utoipa::path(
    get,
    path = "/api/v1/watchlist",
    tag = "自选股 (Watchlist)",
    responses(
        (status = 200, description = "获取成功", body = ApiResponse<Vec<WatchlistEntryResponse>>),
        (status = 500, description = "服务器内部错误")
    )
)]
pub async fn get_watchlist(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<WatchlistEntryResponse>>>, ApiError> {
    let entries = state.watchlist.list().await?;
    Ok(Json(ApiResponse::ok(
        entries.into_iter().map(Into::into).collect(),
    )))
}

/// 添加自选股（幂等：重复代码返回 false）
#[utoipa::path(
    post,
    path = "/api/v1/watchlist",
    tag = "自选股 (Watchlist)",
    request_body = WatchlistAddRequest,
    responses(
        (status = 200, description = "添加结果，true 表示新增", body = ApiResponse<bool>),
        (status = 400, description = "代码为空"),
        (status = 500, description = "服务器内部错误")
    )
)]
pub async fn add_to_watchlist(
    State(state): State<AppState>,
    Json(req): Json<WatchlistAddRequest>,
) -> Result<Json<ApiResponse<bool>>, ApiError> {
    let code = req.code.trim();
    if code.is_empty() {
        return Err(ApiError::BadRequest("股票代码不能为空".to_string()));
    }

    let added = state.watchlist.add(code).await?;
    Ok(Json(ApiResponse::ok(added)))
}

/// 删除自选股
#[utoipa::path(
    delete,
    path = "/api/v1/watchlist/{code}",
    tag = "自选股 (Watchlist)",
    params(
        ("code" = String, Path, description = "带交易所前缀的完整代码")
    ),
    responses(
        (status = 200, description = "删除结果，true 表示确有移除", body = ApiResponse<bool>),
        (status = 500, description = "服务器内部错误")
    )
)]
pub async fn remove_from_watchlist(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<bool>>, ApiError> {
    let removed = state.watchlist.remove(&code).await?;
    Ok(Json(ApiResponse::ok(removed)))
}

/// 刷新整张自选股列表的实时行情
///
/// 单只失败只跳过；过期轮询的结果会被丢弃并返回最新快照。
#[utoipa::path(
    get,
    path = "/api/v1/watchlist/quotes",
    tag = "自选股 (Watchlist)",
    responses(
        (status = 200, description = "按列表顺序的行情", body = ApiResponse<Vec<QuoteResponse>>),
        (status = 500, description = "服务器内部错误")
    )
)]
pub async fn get_watchlist_quotes(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<QuoteResponse>>>, ApiError> {
    let quotes = state.watchlist.refresh().await?;
    Ok(Json(ApiResponse::ok(
        quotes.into_iter().map(Into::into).collect(),
    )))
}
