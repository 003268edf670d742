use crate::cached::CacheAside;
use crate::keys;
use quotedeck_core::cache::port::Cache;
use quotedeck_core::common::normalize_symbol;
use quotedeck_core::market::entity::{ChartInterval, ChartPoint, MoverKind, Quote, SymbolMatch};
use quotedeck_core::market::error::MarketError;
use quotedeck_core::market::port::{ChartProvider, QuoteProvider};
use std::sync::Arc;
use tracing::debug;

/// # Summary
/// 股票服务：报价、涨跌榜、搜索与图表。
///
/// # Invariants
/// - 独占 `quote:` / `chart:` / `movers:` 键前缀。
/// - 搜索不经过缓存。
pub struct StocksService {
    quotes: Arc<dyn QuoteProvider>,
    charts: Arc<dyn ChartProvider>,
    cache: CacheAside,
}

impl StocksService {
    pub fn new(
        quotes: Arc<dyn QuoteProvider>,
        charts: Arc<dyn ChartProvider>,
        cache: Arc<dyn Cache>,
    ) -> Self {
        Self {
            quotes,
            charts,
            cache: CacheAside::new(cache),
        }
    }

    /// 单只股票报价，缓存 15 秒
    pub async fn get_quote(&self, symbol: &str) -> Result<Quote, MarketError> {
        let symbol = normalize_symbol(symbol);
        self.cache
            .get_or_fetch(&keys::quote(&symbol), keys::QUOTE_TTL, || {
                self.quotes.get_quote(&symbol)
            })
            .await
    }

    /// # Summary
    /// 获取指定类型的涨跌榜，每种榜单独立缓存 5 分钟。
    ///
    /// # Arguments
    /// * `kind`: 榜单类型。
    ///
    /// # Returns
    /// 长度不超过 5 的报价列表。
    pub async fn get_movers(&self, kind: MoverKind) -> Result<Vec<Quote>, MarketError> {
        self.cache
            .get_or_fetch(&keys::movers(kind), keys::MOVERS_TTL, || {
                self.quotes.get_market_movers(kind)
            })
            .await
    }

    pub async fn get_top_gainers(&self) -> Result<Vec<Quote>, MarketError> {
        self.get_movers(MoverKind::Gainers).await
    }

    pub async fn get_top_losers(&self) -> Result<Vec<Quote>, MarketError> {
        self.get_movers(MoverKind::Losers).await
    }

    pub async fn get_most_active(&self) -> Result<Vec<Quote>, MarketError> {
        self.get_movers(MoverKind::Active).await
    }

    pub async fn search(&self, query: &str) -> Result<Vec<SymbolMatch>, MarketError> {
        debug!("Symbol search: {}", query);
        self.quotes.search_symbol(query).await
    }

    /// # Summary
    /// 获取日内图表，按 (代码, 周期) 缓存 5 分钟。
    ///
    /// # Logic
    /// 1. 键使用规范化后的周期标记，未知周期与 `5min` 共用条目。
    /// 2. 上游失败的处理由图表数据源的策略决定；合成数据同样会被缓存。
    ///
    /// # Returns
    /// 按时间严格升序的 K 线列表。
    pub async fn get_chart(
        &self,
        symbol: &str,
        interval: ChartInterval,
    ) -> Result<Vec<ChartPoint>, MarketError> {
        let symbol = normalize_symbol(symbol);
        self.cache
            .get_or_fetch(&keys::chart(&symbol, interval), keys::CHART_TTL, || {
                self.charts.get_intraday(&symbol, interval)
            })
            .await
    }
}
