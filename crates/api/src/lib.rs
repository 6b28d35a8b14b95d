//! # `kanpan-api` - HTTP API 层
//!
//! 看盘行情聚合服务的 HTTP/REST 入口。
//! 使用 `axum` 构建路由与控制器，通过 `utoipa` 自动生成 OpenAPI 3.0 Swagger 文档。
//!
//! ## 架构职责
//! - 接收来自 Web 前端的 HTTP 请求，做参数校验与默认值/上限收敛
//! - 调用 `MarketHub` 编排层取数，调用 `WatchlistService` 维护自选股
//! - 将领域模型转换为 DTO，统一包进 `{success, data|error}` 信封
//! - 合成占位数据的标记透传到响应，供前端渲染"演示数据"横幅

pub mod error;
pub mod routes;
pub mod server;
pub mod types;
