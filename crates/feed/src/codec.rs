//! # 字段表解码器
//!
//! 把上游的定界文本响应按"声明式字段表"翻译为归一化行情记录。
//! 字段表是每个上游唯一的单位换算出处：某个位置该除以 100 还是乘以 100，
//! 只在这里声明一次，调用点不再重复推导。

use chrono::Utc;
use kanpan_core::market::entity::{MarketIndex, Quote};
use kanpan_core::market::error::MarketError;

/// # Summary
/// 文本编码声明。部分上游（腾讯、新浪）返回 GBK 双字节编码。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Gbk,
}

/// # Summary
/// 按声明的编码把原始字节解码为 UTF-8 文本。
///
/// # Logic
/// 1. UTF-8 直接校验转换。
/// 2. GBK 通过 encoding_rs 解码，出现非法序列即判定载荷损坏。
///
/// # Arguments
/// * `bytes`: 上游原始响应体。
/// * `encoding`: 上游声明（约定）的编码。
///
/// # Returns
/// 解码后的文本；解码失败返回 `MalformedResponse`。
pub fn decode_text(bytes: &[u8], encoding: TextEncoding) -> Result<String, MarketError> {
    match encoding {
        TextEncoding::Utf8 => std::str::from_utf8(bytes)
            .map(|s| s.to_string())
            .map_err(|e| MarketError::MalformedResponse(format!("invalid utf-8: {}", e))),
        TextEncoding::Gbk => {
            let (text, _, had_errors) = encoding_rs::GBK.decode(bytes);
            if had_errors {
                return Err(MarketError::MalformedResponse(
                    "invalid gbk byte sequence".to_string(),
                ));
            }
            Ok(text.into_owned())
        }
    }
}

/// # Summary
/// 单位换算规则。整个仓库里"除以 100 / 乘以 100"只允许出现在这里。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleRule {
    // 原样使用
    Identity,
    // 上游以"分"或 0.01% 为单位，除以 100 归一
    DivHundred,
    // 上游以"手"为单位，乘以 100 归一为股
    MulHundred,
}

impl ScaleRule {
    /// 对上游原始数值应用换算
    pub fn apply(&self, value: f64) -> f64 {
        match self {
            ScaleRule::Identity => value,
            ScaleRule::DivHundred => value / 100.0,
            ScaleRule::MulHundred => value * 100.0,
        }
    }
}

/// # Summary
/// 位置字段的语义角色。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    Code,
    Name,
    Price,
    PrevClose,
    Open,
    High,
    Low,
    Volume,
    Amount,
    Change,
    ChangePercent,
    Timestamp,
}

/// # Summary
/// 一条字段规则：该上游响应的第 `index` 个字段是什么、怎么换算。
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub index: usize,
    pub role: FieldRole,
    pub scale: ScaleRule,
}

/// # Summary
/// 某上游某接口的完整字段表。
///
/// # Invariants
/// - 每个上游+接口对只声明一张表；表是该接口单位换算的唯一出处。
#[derive(Debug, Clone, Copy)]
pub struct FieldMap {
    // 字段定界符
    pub delimiter: char,
    // 规则列表
    pub rules: &'static [FieldRule],
}

impl FieldMap {
    /// # Summary
    /// 按字段表抽取一条定界文本记录。
    ///
    /// # Logic
    /// 1. 以定界符切分文本。
    /// 2. 逐条规则取位置字段：文本角色直接保留，数值角色宽容解析
    ///    （不可解析视为 0，与上游空字段习惯一致）后应用换算规则。
    /// 3. 任一规则的下标越界即判定载荷与字段表不符。
    ///
    /// # Arguments
    /// * `line`: 单条定界记录（不含引号与变量名包装）。
    ///
    /// # Returns
    /// 抽取出的原始记录；下标越界返回 `MalformedResponse`。
    pub fn extract(&self, line: &str) -> Result<RawQuote, MarketError> {
        let fields: Vec<&str> = line.split(self.delimiter).collect();
        let mut raw = RawQuote::default();

        for rule in self.rules {
            let field = fields.get(rule.index).ok_or_else(|| {
                MarketError::MalformedResponse(format!(
                    "field index {} out of range ({} fields)",
                    rule.index,
                    fields.len()
                ))
            })?;

            match rule.role {
                FieldRole::Code => raw.code = Some(field.to_string()),
                FieldRole::Name => raw.name = Some(field.trim().to_string()),
                FieldRole::Timestamp => raw.timestamp = Some(field.to_string()),
                numeric => {
                    let value = rule.scale.apply(field.trim().parse::<f64>().unwrap_or(0.0));
                    match numeric {
                        FieldRole::Price => raw.price = Some(value),
                        FieldRole::PrevClose => raw.prev_close = Some(value),
                        FieldRole::Open => raw.open = Some(value),
                        FieldRole::High => raw.high = Some(value),
                        FieldRole::Low => raw.low = Some(value),
                        FieldRole::Volume => raw.volume = Some(value),
                        FieldRole::Amount => raw.amount = Some(value),
                        FieldRole::Change => raw.change = Some(value),
                        FieldRole::ChangePercent => raw.change_percent = Some(value),
                        _ => {}
                    }
                }
            }
        }

        Ok(raw)
    }
}

/// # Summary
/// 字段表抽取后的中间记录：各语义角色的换算后取值。
///
/// # Invariants
/// - 仅作为 `Quote` / `MarketIndex` 构造的原料，不对外暴露。
#[derive(Debug, Clone, Default)]
pub struct RawQuote {
    pub code: Option<String>,
    pub name: Option<String>,
    pub price: Option<f64>,
    pub prev_close: Option<f64>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub volume: Option<f64>,
    pub amount: Option<f64>,
    pub change: Option<f64>,
    pub change_percent: Option<f64>,
    pub timestamp: Option<String>,
}

impl RawQuote {
    /// 名称为空且数值全零：上游对不存在的标的就返回这种空壳
    fn looks_absent(&self) -> bool {
        let name_empty = self.name.as_deref().unwrap_or("").is_empty();
        let all_zero = self.price.unwrap_or(0.0) == 0.0
            && self.prev_close.unwrap_or(0.0) == 0.0
            && self.volume.unwrap_or(0.0) == 0.0;
        name_empty || all_zero
    }

    /// # Summary
    /// 构造归一化个股行情。
    ///
    /// # Logic
    /// 1. 空壳记录判定为 `NotFound`，绝不返回 ¥0.00 的伪行情。
    /// 2. 上游直接给出的涨跌额/涨跌幅优先；缺失时由现价与昨收派生。
    /// 3. 成交额缺失时按 volume * price 估算。
    ///
    /// # Arguments
    /// * `fallback_code`: 上游未携带代码字段时使用的代码。
    ///
    /// # Returns
    /// 归一化行情记录或 `NotFound`。
    pub fn into_quote(self, fallback_code: Option<&str>) -> Result<Quote, MarketError> {
        if self.looks_absent() {
            return Err(MarketError::NotFound);
        }

        let current_price = self.price.unwrap_or(0.0);
        let prev_close = self.prev_close.unwrap_or(0.0);
        let change = self
            .change
            .unwrap_or_else(|| current_price - prev_close);
        let change_percent = self.change_percent.unwrap_or_else(|| {
            if prev_close > 0.0 {
                (current_price - prev_close) / prev_close * 100.0
            } else {
                0.0
            }
        });
        let volume = self.volume.unwrap_or(0.0);

        Ok(Quote {
            code: self
                .code
                .filter(|c| !c.is_empty())
                .or_else(|| fallback_code.map(|c| c.to_string()))
                .unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            current_price,
            change,
            change_percent,
            open: self.open.unwrap_or(0.0),
            high: self.high.unwrap_or(0.0),
            low: self.low.unwrap_or(0.0),
            prev_close,
            volume,
            amount: self.amount.unwrap_or(volume * current_price),
            timestamp: Utc::now(),
        })
    }

    /// # Summary
    /// 构造归一化指数快照，派生规则与 `into_quote` 一致。
    pub fn into_index(self, fallback_code: Option<&str>) -> Result<MarketIndex, MarketError> {
        let quote = self.into_quote(fallback_code)?;
        Ok(MarketIndex {
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
        })
    }
}

/// # Summary
/// 极简 UTF-8 百分号编码，用于把中文关键字拼进新浪建议接口的裸 URL。
/// 该接口的查询串不在标准 `?key=value` 位置，reqwest 的 query 编码用不上。
pub(crate) fn percent_encode_utf8(input: &str) -> String {
    let mut out = String::with_capacity(input.len() * 3);
    for byte in input.bytes() {
        match byte {
            b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'-' | b'_' | b'.' | b'~' => {
                out.push(char::from(byte));
            }
            _ => {
                out.push('%');
                out.push_str(&format!("{:02X}", byte));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    // 规格化场景：四个 ÷100 字段的指数字段表
    const TEST_INDEX_MAP: FieldMap = FieldMap {
        delimiter: '~',
        rules: &[
            FieldRule { index: 1, role: FieldRole::Name, scale: ScaleRule::Identity },
            FieldRule { index: 2, role: FieldRole::Code, scale: ScaleRule::Identity },
            FieldRule { index: 3, role: FieldRole::Price, scale: ScaleRule::DivHundred },
            FieldRule { index: 4, role: FieldRole::PrevClose, scale: ScaleRule::DivHundred },
            FieldRule { index: 33, role: FieldRole::High, scale: ScaleRule::DivHundred },
            FieldRule { index: 34, role: FieldRole::Low, scale: ScaleRule::DivHundred },
        ],
    };

    fn sample_line() -> String {
        // 35 个字段，3/4/33/34 为分单位价格
        let mut fields = vec!["0".to_string(); 36];
        fields[1] = "上证指数".to_string();
        fields[2] = "000001".to_string();
        fields[3] = "387002".to_string();
        fields[4] = "385000".to_string();
        fields[5] = "386000".to_string();
        fields[6] = "12345".to_string();
        fields[33] = "387500".to_string();
        fields[34] = "385500".to_string();
        fields.join("~")
    }

    #[test]
    fn test_field_map_div_hundred_scaling() {
        let raw = TEST_INDEX_MAP.extract(&sample_line()).unwrap();
        let index = raw.into_index(None).unwrap();

        assert_eq!(index.code, "000001");
        assert_eq!(index.name, "上证指数");
        assert!((index.current_value - 3870.02).abs() < 1e-9);
        assert!((index.prev_close - 3850.00).abs() < 1e-9);
        assert!((index.high - 3875.00).abs() < 1e-9);
        assert!((index.low - 3855.00).abs() < 1e-9);
    }

    #[test]
    fn test_field_map_index_out_of_range() {
        let result = TEST_INDEX_MAP.extract("1~只有~三个字段");
        assert!(matches!(result, Err(MarketError::MalformedResponse(_))));
    }

    #[test]
    fn test_derived_change_matches_prices() {
        let raw = TEST_INDEX_MAP.extract(&sample_line()).unwrap();
        let index = raw.into_index(None).unwrap();

        // 上游未给涨跌额时，派生值与价格自洽
        assert!(((index.current_value - index.prev_close) - index.change).abs() < 0.01);
    }

    #[test]
    fn test_vendor_supplied_change_is_authoritative() {
        let raw = RawQuote {
            name: Some("测试".to_string()),
            price: Some(10.50),
            prev_close: Some(10.00),
            // 上游直接给出的涨跌额（含上游自己的舍入）
            change: Some(0.50),
            change_percent: Some(5.00),
            volume: Some(100.0),
            ..Default::default()
        };
        let quote = raw.into_quote(Some("600000")).unwrap();
        assert!((quote.change - 0.50).abs() < 1e-9);
        assert!((quote.change_percent - 5.00).abs() < 1e-9);
        assert!(((quote.current_price - quote.prev_close) - quote.change).abs() < 0.01);
    }

    #[test]
    fn test_absent_symbol_is_not_found() {
        // 名称为空
        let empty_name = RawQuote {
            name: Some(String::new()),
            price: Some(10.0),
            volume: Some(1.0),
            ..Default::default()
        };
        assert!(matches!(
            empty_name.into_quote(None),
            Err(MarketError::NotFound)
        ));

        // 全零数值
        let all_zero = RawQuote {
            name: Some("某股".to_string()),
            price: Some(0.0),
            prev_close: Some(0.0),
            volume: Some(0.0),
            ..Default::default()
        };
        assert!(matches!(
            all_zero.into_quote(None),
            Err(MarketError::NotFound)
        ));
    }

    #[test]
    fn test_decode_gbk_text() {
        // "上证指数" 的 GBK 编码
        let bytes = encoding_rs::GBK.encode("上证指数").0.into_owned();
        assert_eq!(decode_text(&bytes, TextEncoding::Gbk).unwrap(), "上证指数");

        // 非法 UTF-8 字节
        assert!(matches!(
            decode_text(&[0xff, 0xfe, 0x80], TextEncoding::Utf8),
            Err(MarketError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_amount_estimated_from_volume() {
        let raw = RawQuote {
            name: Some("测试".to_string()),
            price: Some(2.0),
            prev_close: Some(1.9),
            volume: Some(300.0),
            ..Default::default()
        };
        let quote = raw.into_quote(None).unwrap();
        assert!((quote.amount - 600.0).abs() < 1e-9);
    }

    #[test]
    fn test_percent_encode_utf8() {
        assert_eq!(percent_encode_utf8("abc123"), "abc123");
        assert_eq!(percent_encode_utf8("茅台"), "%E8%8C%85%E5%8F%B0");
    }
}
