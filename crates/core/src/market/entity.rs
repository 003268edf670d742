use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// 单个榜单最多保留的条目数。
pub const MAX_MOVERS: usize = 5;

/// # Summary
/// 单只股票在某一抓取时刻的报价快照。
///
/// # Invariants
/// - 返回后不可变；`symbol` 与 `name` 均为大写代码。
/// - `timestamp` 为 Unix 秒。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    #[schema(example = "AAPL")]
    pub symbol: String,
    #[schema(example = "AAPL")]
    pub name: String,
    #[schema(example = 150.0)]
    pub price: f64,
    #[schema(example = 2.0)]
    pub change: f64,
    #[schema(example = 1.35)]
    pub change_percent: f64,
    pub high: f64,
    pub low: f64,
    pub open: f64,
    pub previous_close: f64,
    #[schema(example = 1710000000_i64)]
    pub timestamp: i64,
}

impl Quote {
    /// # Summary
    /// 构造零值报价，用于上游限流时的降级占位。
    ///
    /// # Arguments
    /// * `symbol`: 已规范化的证券代码。
    /// * `timestamp`: 生成时刻 (Unix 秒)。
    ///
    /// # Returns
    /// 所有数值字段为 0 的报价。
    pub fn zeroed(symbol: &str, timestamp: i64) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            price: 0.0,
            change: 0.0,
            change_percent: 0.0,
            high: 0.0,
            low: 0.0,
            open: 0.0,
            previous_close: 0.0,
            timestamp,
        }
    }
}

/// # Summary
/// 图表中的单根 K 线。
///
/// # Invariants
/// - `low <= min(open, close)` 且 `high >= max(open, close)`。
/// - 一个图表结果按 `time` 严格升序排列。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChartPoint {
    // Unix 秒
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// # Summary
/// 图表的逻辑周期。
///
/// # Invariants
/// - 解析永不失败：未知标记一律回落到 `5min`。
/// - `1D` 映射为上游的 `60min`，并非日线请求。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChartInterval {
    Minute1,
    #[default]
    Minute5,
    Minute15,
    Minute30,
    Minute60,
    Day1,
}

impl ChartInterval {
    /// 解析请求中的周期标记
    pub fn parse(token: &str) -> Self {
        match token.trim() {
            "1min" => ChartInterval::Minute1,
            "5min" => ChartInterval::Minute5,
            "15min" => ChartInterval::Minute15,
            "30min" => ChartInterval::Minute30,
            "60min" => ChartInterval::Minute60,
            "1D" => ChartInterval::Day1,
            _ => ChartInterval::Minute5,
        }
    }

    /// 网关对外使用的周期标记
    pub fn token(&self) -> &'static str {
        match self {
            ChartInterval::Minute1 => "1min",
            ChartInterval::Minute5 => "5min",
            ChartInterval::Minute15 => "15min",
            ChartInterval::Minute30 => "30min",
            ChartInterval::Minute60 => "60min",
            ChartInterval::Day1 => "1D",
        }
    }

    /// 上游图表接口识别的周期字符串
    pub fn provider_interval(&self) -> &'static str {
        match self {
            ChartInterval::Day1 => "60min",
            other => other.token(),
        }
    }
}

impl fmt::Display for ChartInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// # Summary
/// 涨跌榜类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoverKind {
    Gainers,
    Losers,
    Active,
}

impl MoverKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MoverKind::Gainers => "gainers",
            MoverKind::Losers => "losers",
            MoverKind::Active => "active",
        }
    }

    /// # Summary
    /// 对一批报价排序并截取榜单。
    ///
    /// # Logic
    /// 1. `Gainers`: 按 `change_percent` 降序。
    /// 2. `Losers`: 按 `change_percent` 升序。
    /// 3. `Active`: 按 `|change|` 降序。
    /// 4. 稳定排序，相等键保持抓取顺序；截取前 `MAX_MOVERS` 条。
    ///
    /// # Arguments
    /// * `quotes`: 按抓取顺序排列的报价。
    ///
    /// # Returns
    /// 长度不超过 `MAX_MOVERS` 的榜单。
    pub fn rank(&self, mut quotes: Vec<Quote>) -> Vec<Quote> {
        match self {
            MoverKind::Gainers => {
                quotes.sort_by(|a, b| b.change_percent.total_cmp(&a.change_percent))
            }
            MoverKind::Losers => {
                quotes.sort_by(|a, b| a.change_percent.total_cmp(&b.change_percent))
            }
            MoverKind::Active => quotes.sort_by(|a, b| b.change.abs().total_cmp(&a.change.abs())),
        }
        quotes.truncate(MAX_MOVERS);
        quotes
    }
}

impl fmt::Display for MoverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// # Summary
/// 证券搜索命中项。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SymbolMatch {
    #[schema(example = "AAPL")]
    pub symbol: String,
    #[schema(example = "APPLE INC")]
    pub description: String,
    #[serde(rename = "type")]
    #[schema(example = "Common Stock")]
    pub kind: String,
}

/// # Summary
/// 新闻条目，原样透传上游字段。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NewsArticle {
    pub id: i64,
    pub headline: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub source: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    // Unix 秒
    pub datetime: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related: Option<String>,
}

/// # Summary
/// 加密货币现价，保留上游的原始键名。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CryptoQuote {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = 64000.5)]
    pub usd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usd_24h_change: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usd_24h_vol: Option<f64>,
}

/// # Summary
/// 市场概览：三个榜单的组合。
///
/// # Invariants
/// - 每个列表长度不超过 `MAX_MOVERS`。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarketOverview {
    pub top_gainers: Vec<Quote>,
    pub top_losers: Vec<Quote>,
    pub most_active: Vec<Quote>,
}

/// # Summary
/// 图表上游失败时的处理策略。
///
/// # Invariants
/// - 对所有降级情形 (网络错误、限流、缺失数据) 统一生效，不得混用。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpstreamFailurePolicy {
    // 将错误原样抛给调用方
    Propagate,
    // 生成合成数据代替
    #[default]
    Synthesize,
}
