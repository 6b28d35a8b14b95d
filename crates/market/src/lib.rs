//! # `kanpan-market` - 行情编排层
//!
//! 把多上游适配器组织成确定性的回退链：主源失败或超时走备源，
//! 备源也失败则按操作类型决定是产出打标的合成占位数据还是报错。
//! 另含自选股服务与轮询周期序号器。

pub mod cycle;
pub mod hub;
pub mod watchlist;
