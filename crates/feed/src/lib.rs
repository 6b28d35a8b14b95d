//! # `kanpan-feed` - 上游行情适配器
//!
//! 每个上游一个模块：腾讯 (qt.gtimg.cn)、东方财富 (push2.eastmoney.com)、
//! 新浪财经，外加一个合成占位数据生成器。
//!
//! ## 分层约定
//! - 解析是纯函数：`(字节/文本, 字段表) -> 归一化记录`，不做 I/O、不做重试，
//!   单元测试无需网络。
//! - `*Feed` 结构体只负责发请求、解码字节，然后委托给纯解析函数。
//! - 单位换算只存在于字段表 (`codec::ScaleRule`) 及各模块顶部的换算常量中，
//!   调用点不允许再出现 "除以 100" 之类的散落逻辑。

pub mod codec;
pub mod eastmoney;
pub mod sina;
pub mod synthetic;
pub mod tencent;

use std::time::Duration;

/// 上游请求伪装的浏览器 User-Agent，降低被风控拦截的概率
pub(crate) const BROWSER_UA: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// # Summary
/// 构建一个带连接池上限与统一超时的共享 HTTP 客户端。
///
/// # Logic
/// 1. 设置伪装浏览器 User-Agent。
/// 2. 限制每主机空闲连接数，避免扇出时出站连接无界增长。
/// 3. 设置兜底请求超时（编排层另有更细的逐上游超时）。
///
/// # Arguments
/// * `timeout`: 单请求兜底超时。
///
/// # Returns
/// 配置完成的 `reqwest::Client`，构建失败返回错误。
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    let mut headers = reqwest::header::HeaderMap::new();
    if let Ok(ua) = BROWSER_UA.parse() {
        headers.insert(reqwest::header::USER_AGENT, ua);
    }

    reqwest::Client::builder()
        .timeout(timeout)
        .pool_max_idle_per_host(8)
        .default_headers(headers)
        .build()
}
