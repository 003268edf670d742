//! # 测试辅助
//!
//! 为各上游端口提供可编程的内存 Mock，供 market / api 等 crate 的测试复用。
//! 仅在启用 `test-utils` feature 时编译。

use crate::common::normalize_symbol;
use crate::market::entity::{
    ChartInterval, ChartPoint, CryptoQuote, MoverKind, NewsArticle, Quote, SymbolMatch,
    UpstreamFailurePolicy,
};
use crate::market::error::MarketError;
use crate::market::port::{ChartProvider, CryptoProvider, NewsProvider, QuoteProvider};
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// 构造一个只关心价格与涨跌的报价
pub fn sample_quote(symbol: &str, price: f64, change: f64, change_percent: f64) -> Quote {
    Quote {
        price,
        change,
        change_percent,
        high: price,
        low: price,
        open: price - change,
        previous_close: price - change,
        ..Quote::zeroed(symbol, 1_710_000_000)
    }
}

/// # Summary
/// 可编程的报价数据源 Mock。
///
/// # Invariants
/// - 观察列表顺序即报价的插入顺序。
/// - 每个调用都会计数，供缓存命中断言使用。
#[derive(Default)]
pub struct MockQuoteProvider {
    quotes: Mutex<Vec<Quote>>,
    failing: DashSet<String>,
    search_hits: Mutex<Vec<SymbolMatch>>,
    latency: Mutex<Option<Duration>>,
    quote_calls: DashMap<String, usize>,
    mover_calls: AtomicUsize,
    search_calls: AtomicUsize,
}

impl MockQuoteProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入或替换某只股票的报价
    pub fn set_quote(&self, quote: Quote) {
        let mut quotes = self.quotes.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(existing) = quotes.iter_mut().find(|q| q.symbol == quote.symbol) {
            *existing = quote;
        } else {
            quotes.push(quote);
        }
    }

    /// 令某只股票的请求失败
    pub fn fail_symbol(&self, symbol: &str) {
        self.failing.insert(normalize_symbol(symbol));
    }

    pub fn set_search_hits(&self, hits: Vec<SymbolMatch>) {
        *self.search_hits.lock().unwrap_or_else(|p| p.into_inner()) = hits;
    }

    /// 为每次报价请求增加人为延迟
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap_or_else(|p| p.into_inner()) = Some(latency);
    }

    pub fn quote_calls(&self, symbol: &str) -> usize {
        self.quote_calls
            .get(&normalize_symbol(symbol))
            .map(|c| *c)
            .unwrap_or(0)
    }

    pub fn mover_calls(&self) -> usize {
        self.mover_calls.load(Ordering::SeqCst)
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    fn lookup(&self, symbol: &str) -> Result<Quote, MarketError> {
        if self.failing.contains(symbol) {
            return Err(MarketError::Network(format!("mock failure for {}", symbol)));
        }
        self.quotes
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .iter()
            .find(|q| q.symbol == symbol)
            .cloned()
            .ok_or(MarketError::NotFound)
    }
}

#[async_trait]
impl QuoteProvider for MockQuoteProvider {
    async fn get_quote(&self, symbol: &str) -> Result<Quote, MarketError> {
        let symbol = normalize_symbol(symbol);
        *self.quote_calls.entry(symbol.clone()).or_insert(0) += 1;

        let latency = *self.latency.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        self.lookup(&symbol)
    }

    async fn get_market_movers(&self, kind: MoverKind) -> Result<Vec<Quote>, MarketError> {
        self.mover_calls.fetch_add(1, Ordering::SeqCst);
        let symbols: Vec<String> = self
            .quotes
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .iter()
            .map(|q| q.symbol.clone())
            .collect();
        let fetched = symbols
            .iter()
            .filter_map(|s| self.lookup(s).ok())
            .collect();
        Ok(kind.rank(fetched))
    }

    async fn search_symbol(&self, _query: &str) -> Result<Vec<SymbolMatch>, MarketError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .search_hits
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone())
    }
}

/// # Summary
/// 可编程的图表数据源 Mock，默认采用严格 (Propagate) 策略。
#[derive(Default)]
pub struct MockChartProvider {
    points: Mutex<Vec<ChartPoint>>,
    rate_limited: DashSet<String>,
    calls: AtomicUsize,
}

impl MockChartProvider {
    pub fn new(points: Vec<ChartPoint>) -> Self {
        Self {
            points: Mutex::new(points),
            ..Self::default()
        }
    }

    /// 令某只股票的图表请求返回限流错误
    pub fn rate_limit_symbol(&self, symbol: &str) {
        self.rate_limited.insert(normalize_symbol(symbol));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChartProvider for MockChartProvider {
    async fn get_intraday(
        &self,
        symbol: &str,
        _interval: ChartInterval,
    ) -> Result<Vec<ChartPoint>, MarketError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.rate_limited.contains(&normalize_symbol(symbol)) {
            return Err(MarketError::RateLimited {
                provider: "MOCK".to_string(),
            });
        }
        Ok(self.points.lock().unwrap_or_else(|p| p.into_inner()).clone())
    }

    fn failure_policy(&self) -> UpstreamFailurePolicy {
        UpstreamFailurePolicy::Propagate
    }
}

/// # Summary
/// 可编程的加密货币数据源 Mock。
#[derive(Default)]
pub struct MockCryptoProvider {
    quotes: DashMap<String, CryptoQuote>,
    trending: Mutex<serde_json::Value>,
    quote_calls: AtomicUsize,
    trending_calls: AtomicUsize,
}

impl MockCryptoProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_quote(&self, coin_id: &str, quote: CryptoQuote) {
        self.quotes.insert(coin_id.to_lowercase(), quote);
    }

    pub fn set_trending(&self, trending: serde_json::Value) {
        *self.trending.lock().unwrap_or_else(|p| p.into_inner()) = trending;
    }

    pub fn quote_calls(&self) -> usize {
        self.quote_calls.load(Ordering::SeqCst)
    }

    pub fn trending_calls(&self) -> usize {
        self.trending_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CryptoProvider for MockCryptoProvider {
    async fn get_quote(&self, symbol: &str) -> Result<CryptoQuote, MarketError> {
        self.quote_calls.fetch_add(1, Ordering::SeqCst);
        self.quotes
            .get(&symbol.to_lowercase())
            .map(|q| q.value().clone())
            .ok_or(MarketError::NotFound)
    }

    async fn get_trending(&self) -> Result<serde_json::Value, MarketError> {
        self.trending_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.trending.lock().unwrap_or_else(|p| p.into_inner()).clone())
    }
}

/// # Summary
/// 按分类返回预设新闻的 Mock。
#[derive(Default)]
pub struct MockNewsProvider {
    articles: DashMap<String, Vec<NewsArticle>>,
    calls: DashMap<String, usize>,
}

impl MockNewsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_articles(&self, category: &str, articles: Vec<NewsArticle>) {
        self.articles.insert(category.to_string(), articles);
    }

    pub fn calls(&self, category: &str) -> usize {
        self.calls.get(category).map(|c| *c).unwrap_or(0)
    }
}

#[async_trait]
impl NewsProvider for MockNewsProvider {
    async fn get_news(&self, category: &str) -> Result<Vec<NewsArticle>, MarketError> {
        *self.calls.entry(category.to_string()).or_insert(0) += 1;
        Ok(self
            .articles
            .get(category)
            .map(|a| a.value().clone())
            .unwrap_or_default())
    }
}
