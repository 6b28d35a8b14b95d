//! # 新浪财经行情适配器
//!
//! 三个接口、三种载荷形态：
//! - K 线 (quotes.sina.cn / stock.finance.sina.com.cn)：JSON 或 JSONP，
//!   A 股与美股共用同一周期参数体系 (`scale`)。
//! - 五档盘口 (hq.sinajs.cn)：GBK 编码的 `var hq_str_xxx="..,..";`，
//!   逗号定界的位置字段。
//! - 证券搜索建议 (suggest3.sinajs.cn)：GBK 编码，分号分条、逗号分字段。

use crate::codec::{TextEncoding, decode_text, percent_encode_utf8};
use async_trait::async_trait;
use kanpan_core::common::{KlinePeriod, exchange_prefix, strip_exchange_prefix};
use kanpan_core::market::entity::{KlineBar, OrderBook, OrderLevel, SearchHit};
use kanpan_core::market::error::MarketError;
use kanpan_core::market::port::{KlineSource, OrderBookSource, SearchSource};
use reqwest::Client;
use serde::Deserialize;

const CN_KLINE_URL: &str =
    "https://quotes.sina.cn/cn/api/json_v2.php/CN_MarketDataService.getKLineData";
const US_KLINE_URL: &str =
    "https://stock.finance.sina.com.cn/usstock/api/jsonp_v2.php/_/US_MinKService.getDailyK";
const HQ_URL: &str = "https://hq.sinajs.cn/list=";
const SUGGEST_URL: &str = "https://suggest3.sinajs.cn/suggest/type=11&key=";

/// 盘口字段表：买盘五档的 (量, 价) 下标，档位按最优价到次优价排列
const BUY_LEVELS: &[(usize, usize)] = &[(10, 11), (12, 13), (14, 15), (16, 17), (18, 19)];
/// 卖盘五档的 (量, 价) 下标
const SELL_LEVELS: &[(usize, usize)] = &[(20, 21), (22, 23), (24, 25), (26, 27), (28, 29)];

/// K 线周期到新浪 `scale` 参数的映射（分钟数，日线以上为折算值）
fn scale_for(period: KlinePeriod) -> u32 {
    match period {
        KlinePeriod::Day => 240,
        KlinePeriod::Week => 1200,
        KlinePeriod::Month => 7200,
        KlinePeriod::Min60 => 60,
        KlinePeriod::Min30 => 30,
        KlinePeriod::Min15 => 15,
        KlinePeriod::Min5 => 5,
    }
}

/// # Summary
/// 新浪财经行情提供者。
///
/// # Invariants
/// - 共享外部注入的 `reqwest::Client`。
/// - A 股与美股的 K 线按代码形态自动分流：去前缀后全数字走 A 股接口，
///   否则按美股 ticker 处理。
#[derive(Clone)]
pub struct SinaFeed {
    client: Client,
}

impl SinaFeed {
    /// 用共享 HTTP 客户端创建实例
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, MarketError> {
        let resp = self
            .client
            .get(url)
            .header(reqwest::header::REFERER, "https://finance.sina.com.cn/")
            .send()
            .await
            .map_err(|e| MarketError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(MarketError::Network(format!("HTTP {}", resp.status())));
        }
        Ok(resp
            .bytes()
            .await
            .map_err(|e| MarketError::Network(e.to_string()))?
            .to_vec())
    }

    /// code 形如 "600519" / "sh600519"，归一为带前缀的新浪代码
    fn cn_symbol(code: &str) -> String {
        let pure = strip_exchange_prefix(code);
        format!("{}{}", exchange_prefix(pure), pure)
    }
}

// ============================================================
//  纯解析函数
// ============================================================

#[derive(Deserialize)]
struct CnKlineItem {
    day: String,
    open: String,
    high: String,
    low: String,
    close: String,
    volume: String,
    #[serde(default)]
    amount: Option<String>,
}

#[derive(Deserialize)]
struct UsKlineItem {
    d: String,
    o: String,
    h: String,
    l: String,
    c: String,
    v: String,
}

fn lenient(s: &str) -> f64 {
    s.trim().parse().unwrap_or(0.0)
}

/// # Summary
/// 解析 A 股 K 线响应（字段值全是字符串的 JSON 数组）。
///
/// # Logic
/// 1. 上游已按日期升序返回，原样保序。
/// 2. `amount` 缺失时按 `volume * close` 估算。
/// 3. 空数组视为标的不存在。
pub fn parse_cn_kline(body: &str) -> Result<Vec<KlineBar>, MarketError> {
    let items: Vec<CnKlineItem> = serde_json::from_str(body)
        .map_err(|e| MarketError::MalformedResponse(format!("cn kline json: {}", e)))?;
    if items.is_empty() {
        return Err(MarketError::NotFound);
    }

    Ok(items
        .into_iter()
        .map(|item| {
            let close = lenient(&item.close);
            let volume = lenient(&item.volume);
            let amount = item
                .amount
                .as_deref()
                .map(lenient)
                .filter(|a| *a > 0.0)
                .unwrap_or(volume * close);
            KlineBar {
                date: item.day,
                open: lenient(&item.open),
                high: lenient(&item.high),
                low: lenient(&item.low),
                close,
                volume,
                amount,
            }
        })
        .collect())
}

/// # Summary
/// 解析美股日 K 的 JSONP 响应：剥掉 `_((...))` 包装后按 JSON 数组处理。
///
/// # Logic
/// 1. 取第一个 `(` 与最后一个 `)` 之间的载荷。
/// 2. 上游按日期升序返回全量历史，截取末尾 `count` 根。
pub fn parse_us_kline(body: &str, count: usize) -> Result<Vec<KlineBar>, MarketError> {
    let start = body
        .find('(')
        .ok_or_else(|| MarketError::MalformedResponse("jsonp: no opening paren".to_string()))?;
    let end = body
        .rfind(')')
        .filter(|e| *e > start)
        .ok_or_else(|| MarketError::MalformedResponse("jsonp: no closing paren".to_string()))?;

    let items: Vec<UsKlineItem> = serde_json::from_str(&body[start + 1..end])
        .map_err(|e| MarketError::MalformedResponse(format!("us kline json: {}", e)))?;
    if items.is_empty() {
        return Err(MarketError::NotFound);
    }

    let skip = items.len().saturating_sub(count);
    Ok(items
        .into_iter()
        .skip(skip)
        .map(|item| {
            let close = lenient(&item.c);
            let volume = lenient(&item.v);
            KlineBar {
                date: item.d,
                open: lenient(&item.o),
                high: lenient(&item.h),
                low: lenient(&item.l),
                close,
                volume,
                amount: volume * close,
            }
        })
        .collect())
}

/// # Summary
/// 解析 hq.sinajs.cn 的五档盘口（逗号定界的位置字段）。
///
/// # Logic
/// 1. 截取引号内载荷；空载荷即标的不存在。
/// 2. 按 `BUY_LEVELS` / `SELL_LEVELS` 下标表抽取各档 (量, 价)。
/// 3. 字段不足以覆盖卖五档即判定载荷与字段表不符。
pub fn parse_order_book(text: &str) -> Result<OrderBook, MarketError> {
    let start = text
        .find('"')
        .ok_or_else(|| MarketError::MalformedResponse("hq: no payload".to_string()))?;
    let end = text
        .rfind('"')
        .filter(|e| *e > start)
        .ok_or_else(|| MarketError::MalformedResponse("hq: unterminated payload".to_string()))?;
    let payload = &text[start + 1..end];
    if payload.trim().is_empty() {
        return Err(MarketError::NotFound);
    }

    let fields: Vec<&str> = payload.split(',').collect();
    let highest = SELL_LEVELS[SELL_LEVELS.len() - 1].1;
    if fields.len() <= highest {
        return Err(MarketError::MalformedResponse(format!(
            "hq: {} fields, need at least {}",
            fields.len(),
            highest + 1
        )));
    }

    let pick = |table: &[(usize, usize)]| -> Vec<OrderLevel> {
        table
            .iter()
            .zip(1u8..)
            .map(|((vol_idx, price_idx), level)| OrderLevel {
                price: lenient(fields[*price_idx]),
                volume: lenient(fields[*vol_idx]),
                level,
            })
            .collect()
    };

    Ok(OrderBook {
        buy: pick(BUY_LEVELS),
        sell: pick(SELL_LEVELS),
    })
}

/// # Summary
/// 解析 suggest3 的搜索建议响应。
///
/// # Logic
/// 分号分条、逗号分字段：`parts[3]` 为带前缀代码，`parts[4]` 为名称。
/// 无引号载荷或无有效条目时返回空列表（搜索无命中不算错误）。
pub fn parse_suggest(text: &str) -> Vec<SearchHit> {
    let Some(start) = text.find('"') else {
        return Vec::new();
    };
    let Some(end) = text.rfind('"').filter(|e| *e > start) else {
        return Vec::new();
    };

    text[start + 1..end]
        .split(';')
        .filter_map(|entry| {
            let parts: Vec<&str> = entry.split(',').collect();
            let code = parts.get(3).map(|s| s.trim()).unwrap_or("");
            let name = parts.get(4).map(|s| s.trim()).unwrap_or("");
            if code.is_empty() || name.is_empty() {
                return None;
            }
            Some(SearchHit {
                code: code.to_string(),
                name: name.to_string(),
                pinyin: None,
            })
        })
        .collect()
}

// ============================================================
//  端口实现
// ============================================================

#[async_trait]
impl KlineSource for SinaFeed {
    fn name(&self) -> &'static str {
        "sina"
    }

    /// # Summary
    /// 抓取 K 线序列，A 股与美股按代码形态分流。
    ///
    /// # Logic
    /// 1. 去前缀后全数字 => A 股 getKLineData（`datalen` 即条数）。
    /// 2. 否则按美股 ticker 走 getDailyK（仅日线粒度，周/月由
    ///    编排层限制，分钟周期直接判定不支持）。
    async fn fetch_kline(
        &self,
        code: &str,
        period: KlinePeriod,
        count: usize,
    ) -> Result<Vec<KlineBar>, MarketError> {
        let pure = strip_exchange_prefix(code);
        let is_cn = !pure.is_empty() && pure.chars().all(|c| c.is_ascii_digit());

        if is_cn {
            let url = format!(
                "{}?symbol={}&scale={}&ma=no&datalen={}",
                CN_KLINE_URL,
                Self::cn_symbol(code),
                scale_for(period),
                count
            );
            let bytes = self.get_bytes(&url).await?;
            let body = decode_text(&bytes, TextEncoding::Utf8)?;
            parse_cn_kline(&body)
        } else {
            if period.is_intraday() {
                return Err(MarketError::NotFound);
            }
            let url = format!("{}?symbol={}", US_KLINE_URL, code.to_lowercase());
            let bytes = self.get_bytes(&url).await?;
            let body = decode_text(&bytes, TextEncoding::Utf8)?;
            parse_us_kline(&body, count)
        }
    }
}

#[async_trait]
impl OrderBookSource for SinaFeed {
    fn name(&self) -> &'static str {
        "sina"
    }

    /// # Summary
    /// 抓取 A 股五档盘口。
    async fn fetch_order_book(&self, code: &str) -> Result<OrderBook, MarketError> {
        let url = format!("{}{}", HQ_URL, Self::cn_symbol(code));
        let bytes = self.get_bytes(&url).await?;
        let text = decode_text(&bytes, TextEncoding::Gbk)?;
        parse_order_book(&text)
    }
}

#[async_trait]
impl SearchSource for SinaFeed {
    fn name(&self) -> &'static str {
        "sina"
    }

    /// # Summary
    /// 按关键字取搜索建议（中文关键字需手工百分号编码进裸 URL）。
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, MarketError> {
        let url = format!("{}{}", SUGGEST_URL, percent_encode_utf8(query));
        let bytes = self.get_bytes(&url).await?;
        let text = decode_text(&bytes, TextEncoding::Gbk)?;
        Ok(parse_suggest(&text))
    }
}
