use thiserror::Error;

/// # Summary
/// 行情域错误枚举，覆盖网络、解析、数据缺失与回退链耗尽。
///
/// # Invariants
/// - 适配器只产生 `Network` / `MalformedResponse` / `NotFound`；
///   `Timeout` 由编排层的超时包装产生；
///   `AllVendorsExhausted` 只在整条回退链走完后由编排层产生。
#[derive(Error, Debug)]
pub enum MarketError {
    // 网络层错误，包含底层 HTTP 客户端错误信息
    #[error("Network error: {0}")]
    Network(String),
    // 上游载荷未按字段表解析成功（编码错误、字段缺失、格式不符）
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    // 上游有响应但标的不存在（名称为空或全零字段）
    #[error("Symbol not found")]
    NotFound,
    // 单次上游调用超出时限
    #[error("Vendor call timed out")]
    Timeout,
    // 回退链所有候选上游均失败，且该操作没有合成兜底
    #[error("All vendors exhausted")]
    AllVendorsExhausted,
}
