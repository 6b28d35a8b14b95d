use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// # Summary
/// 个股实时行情快照。
///
/// # Invariants
/// - 当上游直接提供 `change` / `change_percent` 时以上游为准；
///   仅在缺失时由 `current_price - prev_close` 派生。
/// - `volume` 单位为股，`amount` 单位为元（或美元）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    // 股票代码（A 股为六位数字，美股为 ticker）
    pub code: String,
    // 股票名称
    pub name: String,
    // 最新价
    pub current_price: f64,
    // 涨跌额
    pub change: f64,
    // 涨跌幅 (%)
    pub change_percent: f64,
    // 开盘价
    pub open: f64,
    // 最高价
    pub high: f64,
    // 最低价
    pub low: f64,
    // 昨收价
    pub prev_close: f64,
    // 成交量（股）
    pub volume: f64,
    // 成交额
    pub amount: f64,
    // 快照时间
    pub timestamp: DateTime<Utc>,
}

/// # Summary
/// 市场指数快照，结构与个股行情一致但表示的是指数点位，
/// 不存在买卖盘口。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketIndex {
    // 指数代码（如 000001 上证指数, .DJI 道指）
    pub code: String,
    // 指数名称
    pub name: String,
    // 最新点位
    pub current_value: f64,
    // 涨跌额
    pub change: f64,
    // 涨跌幅 (%)
    pub change_percent: f64,
    // 开盘点位
    pub open: f64,
    // 最高点位
    pub high: f64,
    // 最低点位
    pub low: f64,
    // 昨收点位
    pub prev_close: f64,
    // 成交量（股）
    pub volume: f64,
    // 成交额
    pub amount: f64,
    // 快照时间
    pub timestamp: DateTime<Utc>,
}

/// # Summary
/// 单根 K 线（蜡烛图）数据。
///
/// # Invariants
/// - 正常数据满足 `low <= min(open, close)` 且 `high >= max(open, close)`；
///   个别上游在盘中会短暂违反，归一层原样透传，不做修正。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KlineBar {
    // 自然日或分钟桶时间戳（取决于周期），如 "2026-08-28" / "2026-08-28 14:30:00"
    pub date: String,
    // 开盘价
    pub open: f64,
    // 最高价
    pub high: f64,
    // 最低价
    pub low: f64,
    // 收盘价
    pub close: f64,
    // 成交量（股）
    pub volume: f64,
    // 成交额；上游缺失时按 volume * close 估算
    pub amount: f64,
}

impl KlineBar {
    /// 校验 OHLC 包络关系是否成立（用于数据质量检查，不用于修正）
    pub fn ohlc_consistent(&self) -> bool {
        self.low <= self.open.min(self.close) && self.high >= self.open.max(self.close)
    }
}

/// # Summary
/// 盘口单档委托。
///
/// # Invariants
/// - `level` 取值 1..=5，1 档为最优买/卖价。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLevel {
    // 委托价
    pub price: f64,
    // 委托量（股）
    pub volume: f64,
    // 档位 1..=5
    pub level: u8,
}

/// # Summary
/// 五档买卖盘口。
///
/// # Invariants
/// - 买卖两侧各恰好 5 档，按档位升序排列。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBook {
    // 买盘五档
    pub buy: Vec<OrderLevel>,
    // 卖盘五档
    pub sell: Vec<OrderLevel>,
}

/// # Summary
/// 个股资金流向记录，按单笔规模拆分为超大/大/中/小四档，
/// 每档分别给出流入与流出。
///
/// # Invariants
/// - `main_net = main_inflow - main_outflow`。
/// - 主力 (main) 口径 = 超大单 + 大单。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapitalFlowRecord {
    pub code: String,
    pub name: String,
    // 主力流入/流出/净额（元）
    pub main_inflow: f64,
    pub main_outflow: f64,
    pub main_net: f64,
    // 超大单
    pub super_large_inflow: f64,
    pub super_large_outflow: f64,
    // 大单
    pub large_inflow: f64,
    pub large_outflow: f64,
    // 中单
    pub medium_inflow: f64,
    pub medium_outflow: f64,
    // 小单
    pub small_inflow: f64,
    pub small_outflow: f64,
    // 当日涨跌幅 (%)
    pub change_percent: f64,
    pub timestamp: DateTime<Utc>,
}

/// # Summary
/// 热门榜单条目，是行情快照的简化形态。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotStock {
    pub code: String,
    pub name: String,
    pub current_price: f64,
    pub change_percent: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub prev_close: f64,
    pub volume: f64,
    pub amount: f64,
    // 换手率 (%)，部分上游不提供
    pub turnover_rate: f64,
}

/// # Summary
/// 证券搜索命中条目。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    // 带交易所前缀的完整代码，如 "sh600519"
    pub code: String,
    pub name: String,
    // 拼音首字母（上游提供时）
    pub pinyin: Option<String>,
}

/// # Summary
/// 数据来源标记：真实上游数据或占位合成数据。
///
/// # Invariants
/// - 合成数据与真实数据形状完全兼容，下游渲染无需分支；
///   但标记必须一路透传到 API 层，供展示层渲染"演示数据"横幅。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Sourced<T> {
    // 来自真实上游
    Real(T),
    // 全部上游失败后生成的占位数据
    Synthetic(T),
}

impl<T> Sourced<T> {
    /// 是否为合成占位数据
    pub fn is_synthetic(&self) -> bool {
        matches!(self, Sourced::Synthetic(_))
    }

    /// 取出内部数据，丢弃来源标记
    pub fn into_inner(self) -> T {
        match self {
            Sourced::Real(v) | Sourced::Synthetic(v) => v,
        }
    }

    /// 借用内部数据
    pub fn inner(&self) -> &T {
        match self {
            Sourced::Real(v) | Sourced::Synthetic(v) => v,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ohlc_consistency() {
        let good = KlineBar {
            date: "2026-08-28".to_string(),
            open: 10.0,
            high: 11.0,
            low: 9.5,
            close: 10.5,
            volume: 1000.0,
            amount: 10500.0,
        };
        assert!(good.ohlc_consistent());

        let bad = KlineBar { high: 10.2, ..good };
        assert!(!bad.ohlc_consistent());
    }

    #[test]
    fn test_sourced_tagging() {
        let real = Sourced::Real(vec![1, 2, 3]);
        let fake = Sourced::Synthetic(vec![4, 5]);
        assert!(!real.is_synthetic());
        assert!(fake.is_synthetic());
        assert_eq!(real.into_inner(), vec![1, 2, 3]);
        assert_eq!(fake.inner().len(), 2);
    }
}
