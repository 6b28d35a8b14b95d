//! # 东方财富行情适配器 (push2.eastmoney.com)
//!
//! JSON 接口，字段名为 f 系列编号。覆盖 A 股链路：指数、个股行情、
//! 热门榜、资金流向，以及证券搜索 (searcha.eastmoney.com)。
//!
//! ## 单位约定（本模块唯一出处）
//! - `qt/stock/get`：价格与涨跌额以"分"计 (÷100)，涨跌幅以 0.01% 计 (÷100)，
//!   成交量以"手"计 (×100 归一为股)，成交额已是元。
//! - `qt/clist/get` 统一带 `fltt=2` 请求服务端预换算，价格/涨跌幅原样使用
//!   （原实现两处口径不一，这里固定为 Identity 并由单测钉死）；
//!   成交量仍以"手"计 (×100)。

use crate::codec::ScaleRule;
use async_trait::async_trait;
use chrono::Utc;
use kanpan_core::common::{HotListKind, strip_exchange_prefix};
use kanpan_core::market::entity::{CapitalFlowRecord, HotStock, MarketIndex, Quote, SearchHit};
use kanpan_core::market::error::MarketError;
use kanpan_core::market::port::{
    CapitalFlowSource, HotListSource, IndexSource, QuoteSource, SearchSource,
};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

const STOCK_GET_URL: &str = "https://push2.eastmoney.com/api/qt/stock/get";
const CLIST_URL: &str = "https://push2.eastmoney.com/api/qt/clist/get";
const SEARCH_URL: &str = "https://searcha.eastmoney.com/bussearch";

/// A 股三大指数的 secid：上证指数、深证成指、北证50
const A_SHARE_INDICES: &[(&str, &str, &str)] = &[
    ("1.000001", "000001", "上证指数"),
    ("0.399001", "399001", "深证成指"),
    ("0.899050", "899050", "北证50"),
];

/// 行情接口请求的字段集合
const QUOTE_FIELDS: &str = "f57,f58,f43,f169,f170,f46,f44,f45,f60,f47,f48";
/// 指数接口请求的字段集合（代码/名称由本地常量表提供）
const INDEX_FIELDS: &str = "f43,f44,f45,f46,f47,f48,f60,f169,f170";
/// 榜单接口请求的字段集合
const HOT_FIELDS: &str = "f12,f14,f2,f3,f5,f6,f8,f15,f16,f17,f18";
/// 资金流向接口请求的字段集合
const FLOW_FIELDS: &str = "f12,f14,f3,f62,f66,f72,f78,f84";
/// A 股全市场筛选串（沪深主板 + 创业板 + 科创板 + 北交所）
const A_SHARE_FILTER: &str = "m:0+t:6,m:0+t:80,m:1+t:2,m:1+t:23";

// stock/get 的换算规则
const PRICE_SCALE: ScaleRule = ScaleRule::DivHundred;
const PERCENT_SCALE: ScaleRule = ScaleRule::DivHundred;
const LOT_SCALE: ScaleRule = ScaleRule::MulHundred;
// clist/get 带 fltt=2，价格已预换算
const CLIST_PRICE_SCALE: ScaleRule = ScaleRule::Identity;

/// # Summary
/// 东方财富行情提供者。
///
/// # Invariants
/// - 共享外部注入的 `reqwest::Client`。
/// - 解析全部委托给本模块的纯函数，单元测试无需网络。
#[derive(Clone)]
pub struct EastmoneyFeed {
    client: Client,
}

impl EastmoneyFeed {
    /// 用共享 HTTP 客户端创建实例
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn get_text(&self, url: &str, query: &[(&str, String)]) -> Result<String, MarketError> {
        let resp = self
            .client
            .get(url)
            .query(query)
            .header(reqwest::header::REFERER, "https://data.eastmoney.com/")
            .send()
            .await
            .map_err(|e| MarketError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(MarketError::Network(format!("HTTP {}", resp.status())));
        }
        resp.text()
            .await
            .map_err(|e| MarketError::Network(e.to_string()))
    }

    /// code 形如 "600519" / "sh600519"，转为东财 secid "1.600519"
    fn secid(code: &str) -> String {
        let pure = strip_exchange_prefix(code);
        // 6 开头为沪市；深市与北交所 (4/8 开头) 均用 0
        let market_id = if pure.starts_with('6') { "1" } else { "0" };
        format!("{}.{}", market_id, pure)
    }
}

// ============================================================
//  纯解析函数
// ============================================================

#[derive(Deserialize)]
struct PushEnvelope {
    data: Option<Value>,
}

#[derive(Deserialize)]
struct ClistEnvelope {
    data: Option<ClistData>,
}

#[derive(Deserialize)]
struct ClistData {
    diff: Option<Vec<Value>>,
}

/// 宽容取数值字段：数字直接用，停牌时的 "-" 等占位符视为 0
fn num(value: &Value, key: &str) -> f64 {
    match value.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn text(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

/// # Summary
/// 解析 `qt/stock/get` 的个股行情响应。
///
/// # Logic
/// 1. `data: null` 即标的不存在。
/// 2. 按模块顶部的换算常量归一单位；f169/f170 为上游直接给出的
///    涨跌额/涨跌幅，权威优先，不再派生。
///
/// # Arguments
/// * `body`: 响应 JSON 文本。
/// * `fallback_code`: 上游未携带 f57 时使用的代码。
pub fn parse_push_quote(body: &str, fallback_code: &str) -> Result<Quote, MarketError> {
    let envelope: PushEnvelope = serde_json::from_str(body)
        .map_err(|e| MarketError::MalformedResponse(format!("push2 json: {}", e)))?;
    let data = envelope.data.ok_or(MarketError::NotFound)?;

    let name = text(&data, "f58");
    let current_price = PRICE_SCALE.apply(num(&data, "f43"));
    let volume = LOT_SCALE.apply(num(&data, "f47"));
    if name.is_empty() && current_price == 0.0 && volume == 0.0 {
        return Err(MarketError::NotFound);
    }

    let code = {
        let c = text(&data, "f57");
        if c.is_empty() {
            fallback_code.to_string()
        } else {
            c
        }
    };

    Ok(Quote {
        code,
        name,
        current_price,
        change: PRICE_SCALE.apply(num(&data, "f169")),
        change_percent: PERCENT_SCALE.apply(num(&data, "f170")),
        open: PRICE_SCALE.apply(num(&data, "f46")),
        high: PRICE_SCALE.apply(num(&data, "f44")),
        low: PRICE_SCALE.apply(num(&data, "f45")),
        prev_close: PRICE_SCALE.apply(num(&data, "f60")),
        volume,
        amount: num(&data, "f48"),
        timestamp: Utc::now(),
    })
}

/// # Summary
/// 解析单个指数的 `qt/stock/get` 响应，代码与名称来自本地常量表。
pub fn parse_push_index(body: &str, code: &str, name: &str) -> Result<MarketIndex, MarketError> {
    let envelope: PushEnvelope = serde_json::from_str(body)
        .map_err(|e| MarketError::MalformedResponse(format!("push2 json: {}", e)))?;
    let data = envelope.data.ok_or(MarketError::NotFound)?;

    let current_value = PRICE_SCALE.apply(num(&data, "f43"));
    if current_value == 0.0 {
        return Err(MarketError::NotFound);
    }

    Ok(MarketIndex {
        code: code.to_string(),
        name: name.to_string(),
        current_value,
        change: PRICE_SCALE.apply(num(&data, "f169")),
        change_percent: PERCENT_SCALE.apply(num(&data, "f170")),
        open: PRICE_SCALE.apply(num(&data, "f46")),
        high: PRICE_SCALE.apply(num(&data, "f44")),
        low: PRICE_SCALE.apply(num(&data, "f45")),
        prev_close: PRICE_SCALE.apply(num(&data, "f60")),
        volume: LOT_SCALE.apply(num(&data, "f47")),
        amount: num(&data, "f48"),
        timestamp: Utc::now(),
    })
}

/// # Summary
/// 解析 `qt/clist/get` 的热门榜响应（fltt=2，价格 Identity）。
pub fn parse_clist_hot(body: &str) -> Result<Vec<HotStock>, MarketError> {
    let envelope: ClistEnvelope = serde_json::from_str(body)
        .map_err(|e| MarketError::MalformedResponse(format!("clist json: {}", e)))?;
    let diff = envelope
        .data
        .and_then(|d| d.diff)
        .ok_or(MarketError::NotFound)?;

    let stocks = diff
        .iter()
        .map(|item| HotStock {
            code: text(item, "f12"),
            name: text(item, "f14"),
            current_price: CLIST_PRICE_SCALE.apply(num(item, "f2")),
            change_percent: CLIST_PRICE_SCALE.apply(num(item, "f3")),
            volume: LOT_SCALE.apply(num(item, "f5")),
            amount: num(item, "f6"),
            turnover_rate: num(item, "f8"),
            high: CLIST_PRICE_SCALE.apply(num(item, "f15")),
            low: CLIST_PRICE_SCALE.apply(num(item, "f16")),
            open: CLIST_PRICE_SCALE.apply(num(item, "f17")),
            prev_close: CLIST_PRICE_SCALE.apply(num(item, "f18")),
        })
        .collect::<Vec<_>>();

    if stocks.is_empty() {
        return Err(MarketError::NotFound);
    }
    Ok(stocks)
}

/// # Summary
/// 解析 `qt/clist/get` 的资金流向响应。
///
/// # Logic
/// 上游给出各档净额 (f62 主力, f66 超大, f72 大, f78 中, f84 小)，
/// 按符号拆分为流入/流出两列：净额为正记流入，为负记流出绝对值。
pub fn parse_clist_capital_flow(body: &str) -> Result<Vec<CapitalFlowRecord>, MarketError> {
    let envelope: ClistEnvelope = serde_json::from_str(body)
        .map_err(|e| MarketError::MalformedResponse(format!("clist json: {}", e)))?;
    let diff = envelope
        .data
        .and_then(|d| d.diff)
        .ok_or(MarketError::NotFound)?;

    let split = |net: f64| -> (f64, f64) {
        if net > 0.0 { (net, 0.0) } else { (0.0, net.abs()) }
    };

    let records = diff
        .iter()
        .map(|item| {
            let main_net = num(item, "f62");
            let (main_inflow, main_outflow) = split(main_net);
            let (super_large_inflow, super_large_outflow) = split(num(item, "f66"));
            let (large_inflow, large_outflow) = split(num(item, "f72"));
            let (medium_inflow, medium_outflow) = split(num(item, "f78"));
            let (small_inflow, small_outflow) = split(num(item, "f84"));

            CapitalFlowRecord {
                code: text(item, "f12"),
                name: text(item, "f14"),
                main_inflow,
                main_outflow,
                main_net,
                super_large_inflow,
                super_large_outflow,
                large_inflow,
                large_outflow,
                medium_inflow,
                medium_outflow,
                small_inflow,
                small_outflow,
                change_percent: num(item, "f3"),
                timestamp: Utc::now(),
            }
        })
        .collect::<Vec<_>>();

    if records.is_empty() {
        return Err(MarketError::NotFound);
    }
    Ok(records)
}

/// # Summary
/// 解析 `bussearch` 的搜索响应。
///
/// # Logic
/// MktNum "1" 为沪市 (sh)，"0" 为深市 (sz)；代码或名称为空的条目丢弃。
pub fn parse_search(body: &str) -> Result<Vec<SearchHit>, MarketError> {
    let root: Value = serde_json::from_str(body)
        .map_err(|e| MarketError::MalformedResponse(format!("bussearch json: {}", e)))?;
    let Some(items) = root.get("Data").and_then(|d| d.as_array()) else {
        return Ok(Vec::new());
    };

    let hits = items
        .iter()
        .filter_map(|item| {
            let code = text(item, "Code");
            let mut name = text(item, "Name");
            if name.is_empty() {
                name = text(item, "SecurityName");
            }
            if code.is_empty() || name.is_empty() {
                return None;
            }

            let mkt = item
                .get("MktNum")
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .unwrap_or_default();
            let prefix = if mkt == "0" { "sz" } else { "sh" };

            let pinyin = {
                let p = text(item, "PinYin").to_lowercase();
                if p.is_empty() { None } else { Some(p) }
            };

            Some(SearchHit {
                code: format!("{}{}", prefix, code),
                name,
                pinyin,
            })
        })
        .collect();

    Ok(hits)
}

// ============================================================
//  端口实现
// ============================================================

#[async_trait]
impl IndexSource for EastmoneyFeed {
    fn name(&self) -> &'static str {
        "eastmoney"
    }

    /// # Summary
    /// 并发抓取 A 股三大指数，扇出后聚合。
    ///
    /// # Logic
    /// 1. 每个 secid 一个请求，`join_all` 扇出。
    /// 2. 单个指数失败只记日志并跳过；全部失败才算本源失败。
    async fn fetch_indices(&self) -> Result<Vec<MarketIndex>, MarketError> {
        let fetches = A_SHARE_INDICES.iter().map(|(secid, code, name)| async move {
            let body = self
                .get_text(
                    STOCK_GET_URL,
                    &[
                        ("secid", secid.to_string()),
                        ("fields", INDEX_FIELDS.to_string()),
                    ],
                )
                .await?;
            parse_push_index(&body, code, name)
        });

        let mut indices = Vec::new();
        for result in futures::future::join_all(fetches).await {
            match result {
                Ok(index) => indices.push(index),
                Err(e) => tracing::warn!("eastmoney index fetch failed: {}", e),
            }
        }

        if indices.is_empty() {
            return Err(MarketError::NotFound);
        }
        Ok(indices)
    }
}

#[async_trait]
impl QuoteSource for EastmoneyFeed {
    fn name(&self) -> &'static str {
        "eastmoney"
    }

    /// # Summary
    /// 抓取单只 A 股实时行情。
    async fn fetch_quote(&self, code: &str) -> Result<Quote, MarketError> {
        let pure = strip_exchange_prefix(code).to_string();
        let body = self
            .get_text(
                STOCK_GET_URL,
                &[
                    ("secid", Self::secid(code)),
                    ("fields", QUOTE_FIELDS.to_string()),
                ],
            )
            .await?;
        parse_push_quote(&body, &pure)
    }
}

#[async_trait]
impl HotListSource for EastmoneyFeed {
    fn name(&self) -> &'static str {
        "eastmoney"
    }

    /// # Summary
    /// 抓取 A 股热门榜。
    ///
    /// # Logic
    /// 1. 涨幅/跌幅按 f3 排序，成交量按 f5 排序。
    /// 2. 跌幅榜取升序（最深跌幅在前），其余取降序。
    async fn fetch_hot(
        &self,
        kind: HotListKind,
        limit: usize,
    ) -> Result<Vec<HotStock>, MarketError> {
        let (sort_field, sort_order) = match kind {
            HotListKind::Rise => ("f3", "1"),
            HotListKind::Fall => ("f3", "0"),
            HotListKind::Volume => ("f5", "1"),
        };

        let body = self
            .get_text(
                CLIST_URL,
                &[
                    ("pn", "1".to_string()),
                    ("pz", limit.to_string()),
                    ("po", sort_order.to_string()),
                    ("np", "1".to_string()),
                    ("fltt", "2".to_string()),
                    ("invt", "2".to_string()),
                    ("fid", sort_field.to_string()),
                    ("fs", A_SHARE_FILTER.to_string()),
                    ("fields", HOT_FIELDS.to_string()),
                ],
            )
            .await?;
        parse_clist_hot(&body)
    }
}

#[async_trait]
impl CapitalFlowSource for EastmoneyFeed {
    fn name(&self) -> &'static str {
        "eastmoney"
    }

    /// # Summary
    /// 抓取按主力净流入降序的资金流向榜。
    async fn fetch_capital_flow(
        &self,
        limit: usize,
    ) -> Result<Vec<CapitalFlowRecord>, MarketError> {
        let body = self
            .get_text(
                CLIST_URL,
                &[
                    ("pn", "1".to_string()),
                    ("pz", limit.to_string()),
                    ("po", "1".to_string()),
                    ("np", "1".to_string()),
                    ("fltt", "2".to_string()),
                    ("invt", "2".to_string()),
                    ("fid", "f62".to_string()),
                    ("fs", A_SHARE_FILTER.to_string()),
                    ("fields", FLOW_FIELDS.to_string()),
                ],
            )
            .await?;

        let mut records = parse_clist_capital_flow(&body)?;
        records.sort_by(|a, b| {
            b.main_net
                .partial_cmp(&a.main_net)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(records)
    }
}

#[async_trait]
impl SearchSource for EastmoneyFeed {
    fn name(&self) -> &'static str {
        "eastmoney"
    }

    /// # Summary
    /// 按关键字搜索证券（代码/名称/拼音）。
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, MarketError> {
        let body = self
            .get_text(
                SEARCH_URL,
                &[
                    ("name", query.to_string()),
                    ("type", "8".to_string()),
                    ("count", "30".to_string()),
                ],
            )
            .await?;
        parse_search(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_push_quote_scaling() {
        // f43 现价 59600 分 = 596.00 元; f47 成交量 12345 手 = 1234500 股
        let body = r#"{"data":{"f57":"600519","f58":"贵州茅台","f43":59600,
            "f169":150,"f170":25,"f46":59300,"f44":59900,"f45":59100,
            "f60":59450,"f47":12345,"f48":735000000}}"#;
        let quote = parse_push_quote(body, "600519").unwrap();

        assert_eq!(quote.code, "600519");
        assert_eq!(quote.name, "贵州茅台");
        assert!((quote.current_price - 596.00).abs() < 1e-9);
        assert!((quote.change - 1.50).abs() < 1e-9);
        assert!((quote.change_percent - 0.25).abs() < 1e-9);
        assert!((quote.prev_close - 594.50).abs() < 1e-9);
        assert!((quote.volume - 1_234_500.0).abs() < 1e-9);
        assert!((quote.amount - 735_000_000.0).abs() < 1e-9);
        // 上游权威的涨跌额与价格差自洽（容忍上游自身舍入）
        assert!(((quote.current_price - quote.prev_close) - quote.change).abs() < 0.01);
    }

    #[test]
    fn test_parse_push_quote_null_data_is_not_found() {
        assert!(matches!(
            parse_push_quote(r#"{"data":null}"#, "999999"),
            Err(MarketError::NotFound)
        ));
    }

    #[test]
    fn test_parse_push_quote_halted_dash_fields() {
        // 停牌标的部分字段为 "-"，宽容解析为 0，但名称与昨收在即不算空壳
        let body = r#"{"data":{"f57":"600000","f58":"某停牌股","f43":"-",
            "f169":"-","f170":"-","f46":"-","f44":"-","f45":"-",
            "f60":1000,"f47":100,"f48":"-"}}"#;
        let quote = parse_push_quote(body, "600000").unwrap();
        assert_eq!(quote.current_price, 0.0);
        assert!((quote.prev_close - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_push_index() {
        let body = r#"{"data":{"f43":387002,"f44":387500,"f45":385500,
            "f46":386000,"f47":123456789,"f48":512000000000,
            "f60":385000,"f169":2002,"f170":52}}"#;
        let index = parse_push_index(body, "000001", "上证指数").unwrap();

        assert_eq!(index.code, "000001");
        assert!((index.current_value - 3870.02).abs() < 1e-9);
        assert!((index.prev_close - 3850.00).abs() < 1e-9);
        assert!((index.change - 20.02).abs() < 1e-9);
        assert!((index.change_percent - 0.52).abs() < 1e-9);
    }

    #[test]
    fn hot_list_prices_not_rescaled() {
        // fltt=2 后 f2/f15..f18 已是元，固定 Identity：596.0 就是 596.00 元
        let body = r#"{"data":{"diff":[
            {"f12":"600519","f14":"贵州茅台","f2":596.0,"f3":1.25,
             "f5":98765,"f6":5880000000.0,"f8":0.23,
             "f15":599.0,"f16":591.0,"f17":593.0,"f18":588.64}
        ]}}"#;
        let hot = parse_clist_hot(body).unwrap();
        assert_eq!(hot.len(), 1);
        assert!((hot[0].current_price - 596.0).abs() < 1e-9);
        assert!((hot[0].change_percent - 1.25).abs() < 1e-9);
        // 成交量统一归一为股
        assert!((hot[0].volume - 9_876_500.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_capital_flow_decomposition() {
        let body = r#"{"data":{"diff":[
            {"f12":"600519","f14":"贵州茅台","f3":1.25,
             "f62":150000000.0,"f66":90000000.0,"f72":60000000.0,
             "f78":-20000000.0,"f84":-130000000.0}
        ]}}"#;
        let records = parse_clist_capital_flow(body).unwrap();
        let r = &records[0];

        assert!((r.main_net - 150_000_000.0).abs() < 1e-9);
        assert!((r.main_inflow - 150_000_000.0).abs() < 1e-9);
        assert_eq!(r.main_outflow, 0.0);
        // main = 超大单 + 大单
        assert!(
            ((r.super_large_inflow - r.super_large_outflow)
                + (r.large_inflow - r.large_outflow)
                - r.main_net)
                .abs()
                < 1e-6
        );
        // 负净额进流出列
        assert_eq!(r.medium_inflow, 0.0);
        assert!((r.medium_outflow - 20_000_000.0).abs() < 1e-9);
        assert!((r.small_outflow - 130_000_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_search_prefixes() {
        let body = r#"{"Data":[
            {"Code":"600519","Name":"贵州茅台","MktNum":"1","PinYin":"GZMT"},
            {"Code":"000001","Name":"平安银行","MktNum":"0","PinYin":"PAYH"},
            {"Code":"","Name":"脏数据","MktNum":"1"}
        ]}"#;
        let hits = parse_search(body).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].code, "sh600519");
        assert_eq!(hits[0].pinyin.as_deref(), Some("gzmt"));
        assert_eq!(hits[1].code, "sz000001");
    }

    #[test]
    fn test_secid_mapping() {
        assert_eq!(EastmoneyFeed::secid("600519"), "1.600519");
        assert_eq!(EastmoneyFeed::secid("sh600519"), "1.600519");
        assert_eq!(EastmoneyFeed::secid("000001"), "0.000001");
        assert_eq!(EastmoneyFeed::secid("sz300750"), "0.300750");
        assert_eq!(EastmoneyFeed::secid("830799"), "0.830799");
    }
}
