//! 资金流向路由。

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::routes::{MAX_LIST_LIMIT, clamp_limit};
use crate::server::AppState;
use crate::types::{ApiResponse, CapitalFlowResponse};

#[derive(Deserialize, ToSchema)]
pub struct CapitalFlowQuery {
    /// 条数，缺省 50，最大 100
    pub limit: Option<usize>,
}

/// 获取 A 股资金流向榜（按主力净流入降序）
#[utoipa::path(
    get,
    path = "/api/v1/a/capital-flow",
    tag = "资金流向 (CapitalFlow)",
    params(
        ("limit" = Option<usize>, Query, description = "条数，1..=100")
    ),
    responses(
        (status = 200, description = "获取成功", body = ApiResponse<Vec<CapitalFlowResponse>>),
        (status = 502, description = "行情上游不可用")
    )
)]
pub async fn get_capital_flow(
    State(state): State<AppState>,
    Query(query): Query<CapitalFlowQuery>,
) -> Result<Json<ApiResponse<Vec<CapitalFlowResponse>>>, ApiError> {
    let limit = clamp_limit(query.limit, 50, MAX_LIST_LIMIT);

    let records = state.a_share.capital_flow(limit).await?;
    Ok(Json(ApiResponse::ok(
        records.into_iter().map(Into::into).collect(),
    )))
}
