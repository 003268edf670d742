//! Finnhub 客户端：报价、涨跌榜、证券搜索与市场新闻。
//!
//! 免费档每分钟 60 次调用，所有请求经由客户端共享的令牌桶。
//! 接口文档: https://finnhub.io/docs/api

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use quotedeck_core::common::normalize_symbol;
use quotedeck_core::config::ProvidersConfig;
use quotedeck_core::market::entity::{MoverKind, NewsArticle, Quote, SymbolMatch};
use quotedeck_core::market::error::MarketError;
use quotedeck_core::market::port::{NewsProvider, QuoteProvider};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

use crate::http::{build_client, send_json};
use crate::limiter::{RateLimitConfig, RateLimiter};

pub const PROVIDER_ID: &str = "FINNHUB";

/// 计算涨跌榜使用的观察列表，按抓取顺序排列
pub const WATCHLIST: [&str; 6] = ["AAPL", "MSFT", "GOOGL", "AMZN", "TSLA", "META"];

/// # Summary
/// `/quote` 响应体。
///
/// # Invariants
/// - 字段均可缺失，缺失时按 0 处理。
#[derive(Debug, Deserialize)]
struct QuoteResponse {
    /// 现价
    c: Option<f64>,
    /// 涨跌额
    d: Option<f64>,
    /// 涨跌幅 (%)
    dp: Option<f64>,
    /// 当日最高
    h: Option<f64>,
    /// 当日最低
    l: Option<f64>,
    /// 当日开盘
    o: Option<f64>,
    /// 昨收
    pc: Option<f64>,
    /// Unix 秒
    t: Option<i64>,
}

impl QuoteResponse {
    fn into_quote(self, symbol: &str) -> Quote {
        Quote {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            price: self.c.unwrap_or(0.0),
            change: self.d.unwrap_or(0.0),
            change_percent: self.dp.unwrap_or(0.0),
            high: self.h.unwrap_or(0.0),
            low: self.l.unwrap_or(0.0),
            open: self.o.unwrap_or(0.0),
            previous_close: self.pc.unwrap_or(0.0),
            timestamp: self.t.unwrap_or(0),
        }
    }
}

/// `/search` 响应体
#[derive(Debug, Deserialize)]
struct SearchResponse {
    result: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    symbol: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "type", default)]
    security_type: String,
}

/// # Summary
/// Finnhub 报价、涨跌榜、搜索与新闻客户端。
///
/// # Invariants
/// - 所有请求在发送前从共享令牌桶取令牌。
/// - API Key 通过 `X-Finnhub-Token` 请求头传递。
pub struct FinnhubClient {
    client: Client,
    base_url: String,
    api_key: String,
    limiter: Arc<RateLimiter>,
    watchlist: Vec<String>,
}

impl FinnhubClient {
    /// # Summary
    /// 根据注入的上游配置创建客户端。
    ///
    /// # Arguments
    /// * `config`: 上游地址、API Key、超时与限流参数。
    ///
    /// # Returns
    /// 成功返回客户端；HTTP 客户端构建失败返回 `MarketError::Network`。
    pub fn new(config: &ProvidersConfig) -> Result<Self, MarketError> {
        let limiter = RateLimiter::new(
            PROVIDER_ID,
            RateLimitConfig::new(
                config.finnhub_requests_per_minute,
                config.finnhub_burst,
                Duration::from_secs(config.backoff_after_429_secs),
            ),
        );

        Ok(Self {
            client: build_client(Duration::from_secs(config.timeout_secs))?,
            base_url: config.finnhub_base_url.trim_end_matches('/').to_string(),
            api_key: config.finnhub_api_key.clone(),
            limiter: Arc::new(limiter),
            watchlist: WATCHLIST.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// 替换涨跌榜使用的观察列表
    pub fn with_watchlist(mut self, symbols: Vec<String>) -> Self {
        self.watchlist = symbols;
        self
    }

    pub fn limiter(&self) -> Arc<RateLimiter> {
        self.limiter.clone()
    }

    // 先取令牌再发送 GET 请求
    async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, MarketError> {
        self.limiter.acquire().await;

        let url = format!("{}{}", self.base_url, endpoint);
        debug!("Finnhub request: {} with {} params", endpoint, params.len());

        let request = self
            .client
            .get(&url)
            .header("X-Finnhub-Token", &self.api_key)
            .query(params);

        send_json(PROVIDER_ID, request, &self.limiter).await
    }
}

#[async_trait]
impl QuoteProvider for FinnhubClient {
    /// # Summary
    /// 获取单只证券报价。
    ///
    /// # Logic
    /// 1. 代码去空格并转大写。
    /// 2. 上游限流时返回全零报价并记录告警，其余错误原样返回。
    async fn get_quote(&self, symbol: &str) -> Result<Quote, MarketError> {
        let symbol = normalize_symbol(symbol);

        match self
            .fetch::<QuoteResponse>("/quote", &[("symbol", symbol.as_str())])
            .await
        {
            Ok(resp) => Ok(resp.into_quote(&symbol)),
            Err(MarketError::RateLimited { .. }) => {
                warn!("Rate limit exceeded for {}, returning zero quote", symbol);
                Ok(Quote::zeroed(&symbol, Utc::now().timestamp()))
            }
            Err(e) => {
                error!("Error fetching quote for {}: {}", symbol, e);
                Err(e)
            }
        }
    }

    async fn get_market_movers(&self, kind: MoverKind) -> Result<Vec<Quote>, MarketError> {
        // 顺序抓取，节奏由共享令牌桶控制；单只失败则跳过
        let mut quotes = Vec::with_capacity(self.watchlist.len());
        for symbol in &self.watchlist {
            match self.get_quote(symbol).await {
                Ok(quote) => quotes.push(quote),
                Err(e) => warn!("Failed to fetch {} for {} movers, skipping: {}", symbol, kind, e),
            }
        }

        debug!(
            "Fetched {}/{} watch-list quotes for {} movers",
            quotes.len(),
            self.watchlist.len(),
            kind
        );
        Ok(kind.rank(quotes))
    }

    async fn search_symbol(&self, query: &str) -> Result<Vec<SymbolMatch>, MarketError> {
        let resp = self
            .fetch::<SearchResponse>("/search", &[("q", query)])
            .await
            .inspect_err(|e| error!("Error searching for {}: {}", query, e))?;

        Ok(resp
            .result
            .into_iter()
            .map(|item| SymbolMatch {
                symbol: item.symbol,
                description: item.description,
                kind: item.security_type,
            })
            .collect())
    }
}

#[async_trait]
impl NewsProvider for FinnhubClient {
    async fn get_news(&self, category: &str) -> Result<Vec<NewsArticle>, MarketError> {
        self.fetch::<Vec<NewsArticle>>("/news", &[("category", category)])
            .await
            .inspect_err(|e| error!("Error fetching {} news: {}", category, e))
    }
}
