use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// # Summary
/// 市场枚举，区分 A 股与美股两套行情链路。
///
/// # Invariants
/// - 无特定约束。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Market {
    // 中国 A 股 (沪/深/北)
    AShare,
    // 美股
    Us,
}

impl std::fmt::Display for Market {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Market::AShare => write!(f, "a-share"),
            Market::Us => write!(f, "us"),
        }
    }
}

/// # Summary
/// K 线周期枚举，定义蜡烛图的时间跨度。
///
/// # Invariants
/// - 美股链路只支持 Day / Week / Month，分钟级周期仅对 A 股有效。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum KlinePeriod {
    // 日K
    Day,
    // 周K
    Week,
    // 月K
    Month,
    // 60分钟
    Min60,
    // 30分钟
    Min30,
    // 15分钟
    Min15,
    // 5分钟
    Min5,
}

impl KlinePeriod {
    /// 该周期是否为分钟级（美股不支持）
    pub fn is_intraday(&self) -> bool {
        matches!(
            self,
            KlinePeriod::Min60 | KlinePeriod::Min30 | KlinePeriod::Min15 | KlinePeriod::Min5
        )
    }
}

impl FromStr for KlinePeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "day" => Ok(KlinePeriod::Day),
            "week" => Ok(KlinePeriod::Week),
            "month" => Ok(KlinePeriod::Month),
            "60m" => Ok(KlinePeriod::Min60),
            "30m" => Ok(KlinePeriod::Min30),
            "15m" => Ok(KlinePeriod::Min15),
            "5m" => Ok(KlinePeriod::Min5),
            _ => Err(format!("Unknown KlinePeriod: {}", s)),
        }
    }
}

impl std::fmt::Display for KlinePeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KlinePeriod::Day => write!(f, "day"),
            KlinePeriod::Week => write!(f, "week"),
            KlinePeriod::Month => write!(f, "month"),
            KlinePeriod::Min60 => write!(f, "60m"),
            KlinePeriod::Min30 => write!(f, "30m"),
            KlinePeriod::Min15 => write!(f, "15m"),
            KlinePeriod::Min5 => write!(f, "5m"),
        }
    }
}

/// # Summary
/// 热门榜单类型枚举。
///
/// # Invariants
/// - 美股热门榜只有涨幅一种口径，Rise 之外的取值仅对 A 股有效。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum HotListKind {
    // 涨幅榜
    Rise,
    // 跌幅榜
    Fall,
    // 成交量榜
    Volume,
}

impl FromStr for HotListKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rise" => Ok(HotListKind::Rise),
            "fall" => Ok(HotListKind::Fall),
            "volume" => Ok(HotListKind::Volume),
            _ => Err(format!("Unknown HotListKind: {}", s)),
        }
    }
}

impl std::fmt::Display for HotListKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HotListKind::Rise => write!(f, "rise"),
            HotListKind::Fall => write!(f, "fall"),
            HotListKind::Volume => write!(f, "volume"),
        }
    }
}

/// # Summary
/// 去除 A 股代码的交易所前缀 (sh/sz/bj)，返回六位纯数字代码。
///
/// # Logic
/// 1. 统一转小写后匹配已知前缀。
/// 2. 命中则截去前两位，否则原样返回。
///
/// # Arguments
/// * `code`: 可能带前缀的股票代码，如 "sh600519"。
///
/// # Returns
/// 纯数字代码，如 "600519"。
pub fn strip_exchange_prefix(code: &str) -> &str {
    let lower_prefix = code.get(..2).map(|p| p.to_ascii_lowercase());
    match lower_prefix.as_deref() {
        Some("sh") | Some("sz") | Some("bj") => &code[2..],
        _ => code,
    }
}

/// # Summary
/// 根据 A 股纯数字代码推断交易所前缀。
///
/// # Logic
/// 1. 6 开头为上海，其余（含北交所 4/8 开头）归入深圳前缀。
///
/// # Arguments
/// * `code`: 六位纯数字代码。
///
/// # Returns
/// "sh" 或 "sz"。
pub fn exchange_prefix(code: &str) -> &'static str {
    if code.starts_with('6') { "sh" } else { "sz" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_roundtrip() {
        for s in ["day", "week", "month", "60m", "30m", "15m", "5m"] {
            let p: KlinePeriod = s.parse().expect("parse period");
            assert_eq!(p.to_string(), s);
        }
        assert!("hour".parse::<KlinePeriod>().is_err());
    }

    #[test]
    fn test_intraday_flag() {
        assert!(KlinePeriod::Min5.is_intraday());
        assert!(!KlinePeriod::Day.is_intraday());
    }

    #[test]
    fn test_code_prefix_helpers() {
        assert_eq!(strip_exchange_prefix("sh600519"), "600519");
        assert_eq!(strip_exchange_prefix("SZ000001"), "000001");
        assert_eq!(strip_exchange_prefix("600519"), "600519");
        assert_eq!(exchange_prefix("600519"), "sh");
        assert_eq!(exchange_prefix("000001"), "sz");
        assert_eq!(exchange_prefix("830799"), "sz");
    }
}
