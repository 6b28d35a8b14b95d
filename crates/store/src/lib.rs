//! # `kanpan-store` - 持久化层
//!
//! 自选股列表的 SQLite 实现。单用户场景，整张列表作为一份 JSON
//! 文档存在 KV 表里，读改写在进程内互斥，格式演进无需迁移。

pub mod config;
pub mod watchlist;
