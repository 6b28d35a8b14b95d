//! 路由控制器：按市场与功能域分模块。

pub mod a_share;
pub mod capital;
pub mod us_market;
pub mod watchlist;

use kanpan_core::common::KlinePeriod;
use std::str::FromStr;

use crate::error::ApiError;

/// K 线条数默认值与上限
pub(crate) const DEFAULT_KLINE_COUNT: usize = 100;
pub(crate) const MAX_KLINE_COUNT: usize = 500;
/// 榜单条数上限
pub(crate) const MAX_LIST_LIMIT: usize = 100;

/// 解析周期参数，缺省为日线
pub(crate) fn parse_period(raw: Option<&str>) -> Result<KlinePeriod, ApiError> {
    match raw {
        None => Ok(KlinePeriod::Day),
        Some(s) => KlinePeriod::from_str(s).map_err(ApiError::BadRequest),
    }
}

/// 把条数参数收敛到 [1, max]，缺省取 default
pub(crate) fn clamp_limit(raw: Option<usize>, default: usize, max: usize) -> usize {
    raw.unwrap_or(default).clamp(1, max)
}
