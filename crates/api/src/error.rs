//! # API 统一错误处理
//!
//! 将下层各 crate 的错误类型统一映射到 HTTP 状态码与 JSON 响应体。

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kanpan_core::market::error::MarketError;
use kanpan_core::store::error::StoreError;
use thiserror::Error;

use crate::types::ApiErrorResponse;

/// API 层统一错误枚举
#[derive(Error, Debug)]
pub enum ApiError {
    /// 请求参数错误 (400)
    #[error("请求参数错误: {0}")]
    BadRequest(String),

    /// 资源未找到 (404)
    #[error("资源未找到: {0}")]
    NotFound(String),

    /// 上游行情全部不可用 (502)
    #[error("行情上游不可用: {0}")]
    Upstream(String),

    /// 下层业务错误 (500)
    #[error("内部服务错误: {0}")]
    Internal(String),
}

/// 将 `ApiError` 转换为 axum 的 HTTP 响应
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Upstream(msg) => {
                tracing::warn!("行情上游不可用: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "行情上游暂时不可用".to_string(),
                )
            }
            ApiError::Internal(msg) => {
                // 内部错误只记录日志，不向客户端透传细节
                tracing::error!("内部服务错误: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "服务器内部错误".to_string(),
                )
            }
        };

        let body = Json(ApiErrorResponse::from_msg(message));
        (status, body).into_response()
    }
}

/// 从 `MarketError` 转换
impl From<MarketError> for ApiError {
    fn from(err: MarketError) -> Self {
        match &err {
            MarketError::NotFound => ApiError::NotFound("该证券不存在".to_string()),
            MarketError::AllVendorsExhausted => ApiError::Upstream(err.to_string()),
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

/// 从 `StoreError` 转换
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match &err {
            StoreError::NotFound => ApiError::NotFound("记录不存在".to_string()),
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_error_mapping() {
        assert!(matches!(
            ApiError::from(MarketError::NotFound),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from(MarketError::AllVendorsExhausted),
            ApiError::Upstream(_)
        ));
        assert!(matches!(
            ApiError::from(MarketError::Network("x".into())),
            ApiError::Internal(_)
        ));
    }

    #[test]
    fn test_store_error_mapping() {
        assert!(matches!(
            ApiError::from(StoreError::NotFound),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from(StoreError::Database("x".into())),
            ApiError::Internal(_)
        ));
    }
}
