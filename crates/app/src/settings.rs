//! 应用配置：默认值 + 可选配置文件 + 环境变量三层覆盖。
//!
//! 覆盖优先级从低到高：内置默认值 < `config/default.toml` < `KANPAN__*` 环境变量
//! （如 `KANPAN__SERVER__PORT=9090`）。

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub market: MarketSettings,
    pub database: DatabaseSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarketSettings {
    /// HTTP 客户端的兜底请求超时（毫秒）
    pub http_timeout_ms: u64,
    /// 编排层逐上游超时（毫秒），应明显小于 `http_timeout_ms`
    pub vendor_timeout_ms: u64,
    /// 真实行情的缓存存活时长（毫秒）
    pub cache_ttl_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub data_dir: String,
}

impl Settings {
    /// # Summary
    /// 加载应用配置。
    ///
    /// # Logic
    /// 1. 注入内置默认值。
    /// 2. 叠加可选的 `config/default.toml`。
    /// 3. 叠加 `KANPAN__` 前缀的环境变量（`__` 分层）。
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("market.http_timeout_ms", 10_000)?
            .set_default("market.vendor_timeout_ms", 5_000)?
            .set_default("market.cache_ttl_ms", 3_000)?
            .set_default("database.data_dir", "data")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(Environment::with_prefix("KANPAN").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// 监听地址，如 `"0.0.0.0:8080"`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
