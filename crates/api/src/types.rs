//! # DTO (Data Transfer Object) 层
//!
//! 将内部领域模型转化为面向前端 JSON 输出的轻量结构体。
//! 所有 DTO 必须派生 `utoipa::ToSchema` 以自动进入 Swagger 文档。

use kanpan_core::market::entity::{
    CapitalFlowRecord, HotStock, KlineBar, MarketIndex, OrderBook, OrderLevel, Quote, SearchHit,
    Sourced,
};
use kanpan_core::store::port::WatchlistEntry;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============================================================
//  行情相关 DTO
// ============================================================

/// 市场指数 DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IndexResponse {
    /// 指数代码
    #[schema(example = "000001")]
    pub code: String,
    /// 指数名称
    #[schema(example = "上证指数")]
    pub name: String,
    /// 最新点位
    #[schema(example = 3870.02)]
    pub current_value: f64,
    /// 涨跌额
    #[schema(example = 20.02)]
    pub change: f64,
    /// 涨跌幅 (%)
    #[schema(example = 0.52)]
    pub change_percent: f64,
    /// 开盘点位
    pub open: f64,
    /// 最高点位
    pub high: f64,
    /// 最低点位
    pub low: f64,
    /// 昨收点位
    pub prev_close: f64,
    /// 成交量 (股)
    pub volume: f64,
    /// 成交额
    pub amount: f64,
    /// 快照时间 (ISO 8601)
    #[schema(example = "2026-08-28T07:00:00Z")]
    pub timestamp: String,
}

/// 个股行情 DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuoteResponse {
    /// 股票代码
    #[schema(example = "600519")]
    pub code: String,
    /// 股票名称
    #[schema(example = "贵州茅台")]
    pub name: String,
    /// 最新价
    #[schema(example = 596.00)]
    pub current_price: f64,
    /// 涨跌额
    #[schema(example = 1.50)]
    pub change: f64,
    /// 涨跌幅 (%)
    #[schema(example = 0.25)]
    pub change_percent: f64,
    /// 开盘价
    pub open: f64,
    /// 最高价
    pub high: f64,
    /// 最低价
    pub low: f64,
    /// 昨收价
    pub prev_close: f64,
    /// 成交量 (股)
    pub volume: f64,
    /// 成交额
    pub amount: f64,
    /// 快照时间 (ISO 8601)
    #[schema(example = "2026-08-28T07:00:00Z")]
    pub timestamp: String,
}

/// 盘口单档委托 DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderLevelResponse {
    /// 委托价
    #[schema(example = 595.99)]
    pub price: f64,
    /// 委托量 (股)
    #[schema(example = 100.0)]
    pub volume: f64,
    /// 档位 1..=5
    #[schema(example = 1)]
    pub level: u8,
}

/// 五档买卖盘口 DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderBookResponse {
    /// 买盘五档
    pub buy: Vec<OrderLevelResponse>,
    /// 卖盘五档
    pub sell: Vec<OrderLevelResponse>,
}

/// 个股行情详情 DTO：行情 + 可选的五档盘口。
/// 盘口接口失败不拖垮行情主体，此时 `order_book` 为 null。
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuoteDetailResponse {
    /// 行情快照
    #[serde(flatten)]
    pub quote: QuoteResponse,
    /// 五档盘口 (仅 A 股，且盘口源可用时)
    pub order_book: Option<OrderBookResponse>,
}

/// K 线 DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct KlineBarResponse {
    /// 日期或分钟桶时间
    #[schema(example = "2026-08-28")]
    pub date: String,
    /// 开盘价
    pub open: f64,
    /// 最高价
    pub high: f64,
    /// 最低价
    pub low: f64,
    /// 收盘价
    pub close: f64,
    /// 成交量 (股)
    pub volume: f64,
    /// 成交额
    pub amount: f64,
}

/// 热门榜条目 DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HotStockResponse {
    /// 股票代码
    #[schema(example = "600519")]
    pub code: String,
    /// 股票名称
    #[schema(example = "贵州茅台")]
    pub name: String,
    /// 最新价
    pub current_price: f64,
    /// 涨跌幅 (%)
    pub change_percent: f64,
    /// 开盘价
    pub open: f64,
    /// 最高价
    pub high: f64,
    /// 最低价
    pub low: f64,
    /// 昨收价
    pub prev_close: f64,
    /// 成交量 (股)
    pub volume: f64,
    /// 成交额
    pub amount: f64,
    /// 换手率 (%)
    pub turnover_rate: f64,
}

/// 资金流向 DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CapitalFlowResponse {
    /// 股票代码
    #[schema(example = "600519")]
    pub code: String,
    /// 股票名称
    pub name: String,
    /// 主力流入 (元)
    pub main_inflow: f64,
    /// 主力流出 (元)
    pub main_outflow: f64,
    /// 主力净额 (元)
    pub main_net: f64,
    /// 超大单流入/流出
    pub super_large_inflow: f64,
    pub super_large_outflow: f64,
    /// 大单流入/流出
    pub large_inflow: f64,
    pub large_outflow: f64,
    /// 中单流入/流出
    pub medium_inflow: f64,
    pub medium_outflow: f64,
    /// 小单流入/流出
    pub small_inflow: f64,
    pub small_outflow: f64,
    /// 当日涨跌幅 (%)
    pub change_percent: f64,
    /// 快照时间 (ISO 8601)
    pub timestamp: String,
}

/// 搜索命中 DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SearchHitResponse {
    /// 带交易所前缀的完整代码
    #[schema(example = "sh600519")]
    pub code: String,
    /// 股票名称
    #[schema(example = "贵州茅台")]
    pub name: String,
    /// 拼音首字母 (上游提供时)
    #[schema(example = "gzmt")]
    pub pinyin: Option<String>,
}

/// 自选股条目 DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WatchlistEntryResponse {
    /// 带交易所前缀的完整代码
    #[schema(example = "sh600519")]
    pub code: String,
    /// 股票名称 (添加时解析，可能为空)
    #[schema(example = "贵州茅台")]
    pub name: String,
}

/// 添加自选股请求体
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WatchlistAddRequest {
    /// 带交易所前缀的完整代码
    #[schema(example = "sh600519")]
    pub code: String,
}

// ============================================================
//  通用响应 DTO
// ============================================================

/// 带来源标记的列表载荷：全部上游失败时 `synthetic` 为 true，
/// 前端据此渲染"演示数据"横幅。
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TaggedItems<T: Serialize + ToSchema> {
    /// 数据条目
    pub items: Vec<T>,
    /// 是否为合成占位数据
    pub synthetic: bool,
}

impl<T: Serialize + ToSchema> TaggedItems<T> {
    /// 从编排层的来源标记结果构建
    pub fn from_sourced<S>(sourced: Sourced<Vec<S>>) -> Self
    where
        T: From<S>,
    {
        let synthetic = sourced.is_synthetic();
        Self {
            items: sourced.into_inner().into_iter().map(Into::into).collect(),
            synthetic,
        }
    }
}

/// 统一 API 响应包装器
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T: Serialize + ToSchema> {
    /// 是否成功
    pub success: bool,
    /// 数据载荷 (成功时)
    pub data: Option<T>,
    /// 错误信息 (失败时)
    pub error: Option<String>,
}

impl<T: Serialize + ToSchema> ApiResponse<T> {
    /// 构建成功响应
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// 构建失败响应 (不含泛型载荷)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// 固定为 false
    pub success: bool,
    /// 错误描述信息
    pub error: String,
}

impl ApiErrorResponse {
    /// 从错误信息构建
    pub fn from_msg(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: msg.into(),
        }
    }
}

// ============================================================
//  领域模型 → DTO 惯用转换 (impl From<T>)
// ============================================================

impl From<MarketIndex> for IndexResponse {
    fn from(i: MarketIndex) -> Self {
        Self {
            code: i.code,
            name: i.name,
            current_value: i.current_value,
            change: i.change,
            change_percent: i.change_percent,
            open: i.open,
            high: i.high,
            low: i.low,
            prev_close: i.prev_close,
            volume: i.volume,
            amount: i.amount,
            timestamp: i.timestamp.to_rfc3339(),
        }
    }
}

impl From<Quote> for QuoteResponse {
    fn from(q: Quote) -> Self {
        Self {
            code: q.code,
            name: q.name,
            current_price: q.current_price,
            change: q.change,
            change_percent: q.change_percent,
            open: q.open,
            high: q.high,
            low: q.low,
            prev_close: q.prev_close,
            volume: q.volume,
            amount: q.amount,
            timestamp: q.timestamp.to_rfc3339(),
        }
    }
}

impl From<OrderLevel> for OrderLevelResponse {
    fn from(l: OrderLevel) -> Self {
        Self {
            price: l.price,
            volume: l.volume,
            level: l.level,
        }
    }
}

impl From<OrderBook> for OrderBookResponse {
    fn from(b: OrderBook) -> Self {
        Self {
            buy: b.buy.into_iter().map(Into::into).collect(),
            sell: b.sell.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<KlineBar> for KlineBarResponse {
    fn from(k: KlineBar) -> Self {
        Self {
            date: k.date,
            open: k.open,
            high: k.high,
            low: k.low,
            close: k.close,
            volume: k.volume,
            amount: k.amount,
        }
    }
}

impl From<HotStock> for HotStockResponse {
    fn from(h: HotStock) -> Self {
        Self {
            code: h.code,
            name: h.name,
            current_price: h.current_price,
            change_percent: h.change_percent,
            open: h.open,
            high: h.high,
            low: h.low,
            prev_close: h.prev_close,
            volume: h.volume,
            amount: h.amount,
            turnover_rate: h.turnover_rate,
        }
    }
}

impl From<CapitalFlowRecord> for CapitalFlowResponse {
    fn from(r: CapitalFlowRecord) -> Self {
        Self {
            code: r.code,
            name: r.name,
            main_inflow: r.main_inflow,
            main_outflow: r.main_outflow,
            main_net: r.main_net,
            super_large_inflow: r.super_large_inflow,
            super_large_outflow: r.super_large_outflow,
            large_inflow: r.large_inflow,
            large_outflow: r.large_outflow,
            medium_inflow: r.medium_inflow,
            medium_outflow: r.medium_outflow,
            small_inflow: r.small_inflow,
            small_outflow: r.small_outflow,
            change_percent: r.change_percent,
            timestamp: r.timestamp.to_rfc3339(),
        }
    }
}

impl From<SearchHit> for SearchHitResponse {
    fn from(h: SearchHit) -> Self {
        Self {
            code: h.code,
            name: h.name,
            pinyin: h.pinyin,
        }
    }
}

impl From<WatchlistEntry> for WatchlistEntryResponse {
    fn from(e: WatchlistEntry) -> Self {
        Self {
            code: e.code,
            name: e.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_tagged_items_preserves_synthetic_flag() {
        let bars = vec![KlineBar {
            date: "2026-08-28".to_string(),
            open: 10.0,
            high: 11.0,
            low: 9.0,
            close: 10.5,
            volume: 1000.0,
            amount: 10500.0,
        }];

        let real: TaggedItems<KlineBarResponse> =
            TaggedItems::from_sourced(Sourced::Real(bars.clone()));
        assert!(!real.synthetic);
        assert_eq!(real.items.len(), 1);

        let synthetic: TaggedItems<KlineBarResponse> =
            TaggedItems::from_sourced(Sourced::Synthetic(bars));
        assert!(synthetic.synthetic);
    }

    #[test]
    fn test_quote_dto_conversion() {
        let quote = Quote {
            code: "600519".to_string(),
            name: "贵州茅台".to_string(),
            current_price: 596.0,
            change: 1.5,
            change_percent: 0.25,
            open: 593.0,
            high: 599.0,
            low: 591.0,
            prev_close: 594.5,
            volume: 1_234_500.0,
            amount: 735_000_000.0,
            timestamp: Utc::now(),
        };

        let dto = QuoteResponse::from(quote);
        assert_eq!(dto.code, "600519");
        assert!((dto.current_price - 596.0).abs() < 1e-9);
        // 时间戳序列化为 ISO 8601
        assert!(dto.timestamp.contains('T'));
    }
}
