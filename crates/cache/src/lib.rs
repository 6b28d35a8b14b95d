//! # `kanpan-cache` - 短时内存缓存
//!
//! 基于 `DashMap` 的 TTL 缓存实现，供行情编排层在轮询间隔内
//! 抑制重叠 UI 组件触发的重复抓取。不做持久化。

pub mod mem;
