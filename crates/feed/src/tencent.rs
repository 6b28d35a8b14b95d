//! # 腾讯行情适配器 (qt.gtimg.cn)
//!
//! 返回 GBK 编码的 `v_sh600519="..~..~..";` 变量块，`~` 定界的位置字段。
//! A 股与美股共用同一套变量块形态，但字段表不同：A 股成交量以"手"计
//! 且上游直接给出涨跌额/涨跌幅；美股价格已是美元，涨跌由昨收派生。
//! 本适配器按构造时声明的市场选择字段表与代码前缀。

use crate::codec::{FieldMap, FieldRole, FieldRule, ScaleRule, TextEncoding, decode_text};
use async_trait::async_trait;
use kanpan_core::common::{HotListKind, Market, exchange_prefix, strip_exchange_prefix};
use kanpan_core::market::entity::{HotStock, MarketIndex, Quote};
use kanpan_core::market::error::MarketError;
use kanpan_core::market::port::{HotListSource, IndexSource, QuoteSource};
use reqwest::Client;

const BASE_URL: &str = "https://qt.gtimg.cn/q=";

/// A 股指数的腾讯代码：上证指数、深证成指
const CN_INDEX_SYMBOLS: &str = "sh000001,sz399001";
/// 美股三大指数的腾讯代码：道琼斯、纳斯达克、标普500
const US_INDEX_SYMBOLS: &str = "usDJI,usIXIC,usINX";

/// 热门榜固定候选池：在美上市的中概股（美股链路专用）
const US_HOT_UNIVERSE: &[&str] = &[
    "BABA", "JD", "PDD", "BIDU", "NIO", "XPEV", "LI", "BILI", "IQ", "NTES", "TME", "YMM",
    "VIPS", "DIDI", "EDU", "TAL", "YUMC", "WB", "ATHM", "TIGR",
];

/// 腾讯 A 股行情的字段表。价格已是元 (Identity)；
/// 成交量以"手"计 (×100)；涨跌额/涨跌幅由上游直接给出。
const CN_QUOTE_MAP: FieldMap = FieldMap {
    delimiter: '~',
    rules: &[
        FieldRule { index: 1, role: FieldRole::Name, scale: ScaleRule::Identity },
        FieldRule { index: 2, role: FieldRole::Code, scale: ScaleRule::Identity },
        FieldRule { index: 3, role: FieldRole::Price, scale: ScaleRule::Identity },
        FieldRule { index: 4, role: FieldRole::PrevClose, scale: ScaleRule::Identity },
        FieldRule { index: 5, role: FieldRole::Open, scale: ScaleRule::Identity },
        FieldRule { index: 6, role: FieldRole::Volume, scale: ScaleRule::MulHundred },
        FieldRule { index: 30, role: FieldRole::Timestamp, scale: ScaleRule::Identity },
        FieldRule { index: 31, role: FieldRole::Change, scale: ScaleRule::Identity },
        FieldRule { index: 32, role: FieldRole::ChangePercent, scale: ScaleRule::Identity },
        FieldRule { index: 33, role: FieldRole::High, scale: ScaleRule::Identity },
        FieldRule { index: 34, role: FieldRole::Low, scale: ScaleRule::Identity },
    ],
};

/// 腾讯美股行情的字段表。价格已是美元，Identity 换算；
/// 涨跌额/涨跌幅上游不提供，由现价与昨收派生。
const US_QUOTE_MAP: FieldMap = FieldMap {
    delimiter: '~',
    rules: &[
        FieldRule { index: 1, role: FieldRole::Name, scale: ScaleRule::Identity },
        FieldRule { index: 2, role: FieldRole::Code, scale: ScaleRule::Identity },
        FieldRule { index: 3, role: FieldRole::Price, scale: ScaleRule::Identity },
        FieldRule { index: 4, role: FieldRole::PrevClose, scale: ScaleRule::Identity },
        FieldRule { index: 5, role: FieldRole::Open, scale: ScaleRule::Identity },
        FieldRule { index: 6, role: FieldRole::Volume, scale: ScaleRule::Identity },
        FieldRule { index: 30, role: FieldRole::Timestamp, scale: ScaleRule::Identity },
        FieldRule { index: 33, role: FieldRole::High, scale: ScaleRule::Identity },
        FieldRule { index: 34, role: FieldRole::Low, scale: ScaleRule::Identity },
    ],
};

/// # Summary
/// 腾讯财经行情提供者，按市场声明选择字段表与代码前缀。
///
/// # Invariants
/// - 共享外部注入的 `reqwest::Client`（连接池有界）。
/// - 只做抓取与解码，解析委托给本模块的纯函数。
#[derive(Clone)]
pub struct TencentFeed {
    client: Client,
    market: Market,
}

impl TencentFeed {
    /// A 股链路实例（东方财富的备源）
    pub fn a_share(client: Client) -> Self {
        Self {
            client,
            market: Market::AShare,
        }
    }

    /// 美股链路实例（美股的主源）
    pub fn us(client: Client) -> Self {
        Self {
            client,
            market: Market::Us,
        }
    }

    fn field_map(&self) -> &'static FieldMap {
        match self.market {
            Market::AShare => &CN_QUOTE_MAP,
            Market::Us => &US_QUOTE_MAP,
        }
    }

    /// code 转为腾讯代码："600519"/"sh600519" -> "sh600519"，"AAPL" -> "usAAPL"
    fn symbol(&self, code: &str) -> String {
        match self.market {
            Market::AShare => {
                let pure = strip_exchange_prefix(code);
                format!("{}{}", exchange_prefix(pure), pure)
            }
            Market::Us => format!("us{}", code.to_uppercase()),
        }
    }

    /// # Summary
    /// 批量抓取并解析一组腾讯代码的行情。
    ///
    /// # Logic
    /// 1. GET `q=<symbols>`，拿到 GBK 字节。
    /// 2. 解码为 UTF-8 后按本市场的字段表交给 `parse_quote_blocks`。
    async fn fetch_blocks(&self, symbols: &str) -> Result<Vec<Quote>, MarketError> {
        let url = format!("{}{}", BASE_URL, symbols);
        let resp = self
            .client
            .get(&url)
            .header(reqwest::header::REFERER, "https://gu.qq.com/")
            .send()
            .await
            .map_err(|e| MarketError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(MarketError::Network(format!("HTTP {}", resp.status())));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| MarketError::Network(e.to_string()))?;
        let text = decode_text(&bytes, TextEncoding::Gbk)?;
        parse_quote_blocks(&text, self.field_map())
    }
}

/// # Summary
/// 解析腾讯返回的变量块文本，每个 `v_xxx="...";` 产出一条行情。
///
/// # Logic
/// 1. 以 `;` 切分变量块，截取引号内的载荷。
/// 2. 空载荷（不存在的标的）跳过。
/// 3. 按字段表抽取并构造 `Quote`；美股代码形如 "AAPL.OQ"，
///    取 `.` 前的主体（A 股代码无点号，原样保留）。
///
/// # Arguments
/// * `text`: 解码后的完整响应文本。
/// * `map`: 该市场的字段表。
///
/// # Returns
/// 行情列表；整个响应无任何可用块时返回 `NotFound`。
pub fn parse_quote_blocks(text: &str, map: &FieldMap) -> Result<Vec<Quote>, MarketError> {
    let mut quotes = Vec::new();

    for block in text.split(';') {
        let Some(start) = block.find("=\"") else {
            continue;
        };
        let Some(end) = block.rfind('"') else {
            continue;
        };
        if end <= start + 1 {
            continue;
        }
        let payload = &block[start + 2..end];
        if payload.trim().is_empty() {
            continue;
        }

        match map.extract(payload).and_then(|raw| raw.into_quote(None)) {
            Ok(mut quote) => {
                // "AAPL.OQ" -> "AAPL"，".DJI" -> "DJI"
                if let Some(main) = quote.code.split('.').find(|s| !s.is_empty()) {
                    quote.code = main.to_string();
                }
                quotes.push(quote);
            }
            // 单块的空壳/残缺不拖垮整批，常见于停牌标的
            Err(MarketError::NotFound) => continue,
            Err(e) => return Err(e),
        }
    }

    if quotes.is_empty() {
        return Err(MarketError::NotFound);
    }
    Ok(quotes)
}

fn quote_to_index(quote: Quote) -> MarketIndex {
    MarketIndex {
        code: quote.code,
        name: quote.name,
        current_value: quote.current_price,
        change: quote.change,
        change_percent: quote.change_percent,
        open: quote.open,
        high: quote.high,
        low: quote.low,
        prev_close: quote.prev_close,
        volume: quote.volume,
        amount: quote.amount,
        timestamp: quote.timestamp,
    }
}

fn quote_to_hot(quote: Quote) -> HotStock {
    HotStock {
        code: quote.code,
        name: quote.name,
        current_price: quote.current_price,
        change_percent: quote.change_percent,
        open: quote.open,
        high: quote.high,
        low: quote.low,
        prev_close: quote.prev_close,
        volume: quote.volume,
        amount: quote.amount,
        turnover_rate: 0.0,
    }
}

#[async_trait]
impl IndexSource for TencentFeed {
    fn name(&self) -> &'static str {
        "tencent"
    }

    /// # Summary
    /// 抓取本市场的指数组合（A 股两大指数 / 美股三大指数）。
    async fn fetch_indices(&self) -> Result<Vec<MarketIndex>, MarketError> {
        let symbols = match self.market {
            Market::AShare => CN_INDEX_SYMBOLS,
            Market::Us => US_INDEX_SYMBOLS,
        };
        let quotes = self.fetch_blocks(symbols).await?;
        Ok(quotes.into_iter().map(quote_to_index).collect())
    }
}

#[async_trait]
impl QuoteSource for TencentFeed {
    fn name(&self) -> &'static str {
        "tencent"
    }

    /// # Summary
    /// 抓取单只证券的实时行情。
    ///
    /// # Logic
    /// 1. 按市场拼代码前缀（A 股 sh/sz，美股 us + 大写 ticker）。
    /// 2. 批量解析结果取第一条；空结果即标的不存在。
    async fn fetch_quote(&self, code: &str) -> Result<Quote, MarketError> {
        let mut quotes = self.fetch_blocks(&self.symbol(code)).await?;
        if quotes.is_empty() {
            return Err(MarketError::NotFound);
        }
        Ok(quotes.remove(0))
    }
}

#[async_trait]
impl HotListSource for TencentFeed {
    fn name(&self) -> &'static str {
        "tencent"
    }

    /// # Summary
    /// 抓取中概股热门榜，按涨跌幅降序（美股链路专用）。
    ///
    /// # Logic
    /// 1. 从固定候选池取前 `limit` 只，批量查询。
    /// 2. 美股热门榜只有涨幅口径，`kind` 参数被忽略。
    async fn fetch_hot(
        &self,
        _kind: HotListKind,
        limit: usize,
    ) -> Result<Vec<HotStock>, MarketError> {
        let symbols = US_HOT_UNIVERSE
            .iter()
            .take(limit)
            .map(|s| format!("us{}", s))
            .collect::<Vec<_>>()
            .join(",");

        let quotes = self.fetch_blocks(&symbols).await?;
        let mut hot: Vec<HotStock> = quotes.into_iter().map(quote_to_hot).collect();
        hot.sort_by(|a, b| {
            b.change_percent
                .partial_cmp(&a.change_percent)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(hot)
    }
}
