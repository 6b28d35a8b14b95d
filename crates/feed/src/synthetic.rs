//! # 合成占位数据生成器
//!
//! 全部上游失败时的最后兜底。产出形状与真实数据完全兼容、数值范围
//! 合理的占位数据，由编排层打上合成标记后透传给展示层。
//! 只覆盖 K 线、热门榜、美股指数三类；行情与盘口绝不合成。

use chrono::{Days, Utc};
use kanpan_core::market::entity::{HotStock, KlineBar, MarketIndex};
use kanpan_core::market::port::SyntheticSource;
use rand::RngExt;

/// 占位热门榜的候选池（真实存在的大盘蓝筹，降低违和感）
const HOT_POOL: &[(&str, &str)] = &[
    ("600519", "贵州茅台"),
    ("300750", "宁德时代"),
    ("601318", "中国平安"),
    ("600036", "招商银行"),
    ("000858", "五粮液"),
    ("601899", "紫金矿业"),
    ("002594", "比亚迪"),
    ("600900", "长江电力"),
    ("601012", "隆基绿能"),
    ("000333", "美的集团"),
    ("600030", "中信证券"),
    ("601166", "兴业银行"),
    ("600276", "恒瑞医药"),
    ("000651", "格力电器"),
    ("601888", "中国中免"),
    ("603259", "药明康德"),
    ("600887", "伊利股份"),
    ("601601", "中国太保"),
    ("000568", "泸州老窖"),
    ("601088", "中国神华"),
];

/// 占位美股指数的基准点位：道琼斯、纳斯达克、标普500
const US_INDEX_BASE: &[(&str, &str, f64)] = &[
    ("DJI", "道琼斯", 44000.0),
    ("IXIC", "纳斯达克", 19000.0),
    ("INX", "标普500", 6200.0),
];

/// # Summary
/// 随机游走式占位数据生成器。
///
/// # Invariants
/// - K 线的 OHLC 包络关系按构造恒成立。
/// - 无内部状态，每次调用独立取随机数。
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticFeed;

impl SyntheticFeed {
    pub fn new() -> Self {
        Self
    }
}

impl SyntheticSource for SyntheticFeed {
    /// # Summary
    /// 生成一段日期升序的随机游走 K 线。
    ///
    /// # Logic
    /// 1. 以 100 为起点，逐日 ±2% 漂移，开盘接昨收。
    /// 2. `high` 取当日开/收较大者再上浮，`low` 取较小者再下探，
    ///    包络关系按构造成立。
    /// 3. 日期自今日向前回推，升序排列。
    fn synth_kline(&self, count: usize) -> Vec<KlineBar> {
        let mut rng = rand::rng();
        let today = Utc::now().date_naive();
        let mut close = 100.0_f64;
        let mut bars = Vec::with_capacity(count);

        for i in 0..count {
            let back = (count - 1 - i) as u64;
            let date = today
                .checked_sub_days(Days::new(back))
                .unwrap_or(today)
                .format("%Y-%m-%d")
                .to_string();

            let open = close;
            close = open * (1.0 + rng.random_range(-0.02..0.02));
            let high = open.max(close) * (1.0 + rng.random_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.random_range(0.0..0.01));
            let volume = rng.random_range(500_000.0..5_000_000.0_f64).floor();

            bars.push(KlineBar {
                date,
                open,
                high,
                low,
                close,
                volume,
                amount: volume * close,
            });
        }
        bars
    }

    /// # Summary
    /// 从蓝筹候选池生成占位热门榜，涨跌幅在 ±5% 内随机。
    fn synth_hot(&self, limit: usize) -> Vec<HotStock> {
        let mut rng = rand::rng();

        HOT_POOL
            .iter()
            .take(limit)
            .map(|(code, name)| {
                let prev_close = rng.random_range(10.0..600.0_f64);
                let change_percent = rng.random_range(-5.0..5.0_f64);
                let current_price = prev_close * (1.0 + change_percent / 100.0);
                let volume = rng.random_range(1_000_000.0..50_000_000.0_f64).floor();

                HotStock {
                    code: (*code).to_string(),
                    name: (*name).to_string(),
                    current_price,
                    change_percent,
                    open: prev_close * (1.0 + rng.random_range(-0.01..0.01)),
                    high: current_price.max(prev_close) * 1.01,
                    low: current_price.min(prev_close) * 0.99,
                    prev_close,
                    volume,
                    amount: volume * current_price,
                    turnover_rate: rng.random_range(0.1..8.0),
                }
            })
            .collect()
    }

    /// # Summary
    /// 生成占位美股三大指数，围绕基准点位 ±1% 浮动。
    fn synth_us_indices(&self) -> Vec<MarketIndex> {
        let mut rng = rand::rng();
        let now = Utc::now();

        US_INDEX_BASE
            .iter()
            .map(|(code, name, base)| {
                let prev_close = *base;
                let change_percent = rng.random_range(-1.0..1.0_f64);
                let current_value = prev_close * (1.0 + change_percent / 100.0);

                MarketIndex {
                    code: (*code).to_string(),
                    name: (*name).to_string(),
                    current_value,
                    change: current_value - prev_close,
                    change_percent,
                    open: prev_close,
                    high: current_value.max(prev_close),
                    low: current_value.min(prev_close),
                    prev_close,
                    volume: rng.random_range(1e8..5e8_f64).floor(),
                    amount: 0.0,
                    timestamp: now,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synth_kline_invariants() {
        let feed = SyntheticFeed::new();
        let bars = feed.synth_kline(30);

        assert_eq!(bars.len(), 30);
        // 日期严格升序
        assert!(bars.windows(2).all(|w| w[0].date < w[1].date));
        // OHLC 包络按构造成立
        assert!(bars.iter().all(KlineBar::ohlc_consistent));
        // 开盘接昨收
        assert!(
            bars.windows(2)
                .all(|w| (w[1].open - w[0].close).abs() < 1e-9)
        );
    }

    #[test]
    fn test_synth_hot_respects_limit() {
        let feed = SyntheticFeed::new();
        assert_eq!(feed.synth_hot(5).len(), 5);
        // 候选池上限
        assert_eq!(feed.synth_hot(100).len(), HOT_POOL.len());

        for stock in feed.synth_hot(10) {
            assert!(!stock.code.is_empty());
            assert!(stock.current_price > 0.0);
            assert!(stock.change_percent.abs() <= 5.0);
            assert!(stock.low <= stock.current_price && stock.current_price <= stock.high);
        }
    }

    #[test]
    fn test_synth_us_indices_shape() {
        let feed = SyntheticFeed::new();
        let indices = feed.synth_us_indices();

        assert_eq!(indices.len(), 3);
        assert_eq!(indices[0].code, "DJI");
        for index in &indices {
            assert!(index.current_value > 0.0);
            assert!(index.change_percent.abs() <= 1.0);
            // 涨跌额与点位自洽
            assert!(((index.current_value - index.prev_close) - index.change).abs() < 1e-6);
        }
    }
}
