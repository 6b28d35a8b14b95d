//! # `kanpan-core` - 领域核心
//!
//! 定义看盘系统的领域实体、错误分类与端口契约 (Port)。
//! 本 crate 不做任何 I/O：行情适配、缓存、持久化均由外层 crate
//! 通过实现这里的 trait 接入。

pub mod cache;
pub mod common;
pub mod market;
pub mod store;
