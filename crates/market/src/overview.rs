use crate::stocks::StocksService;
use chrono::Utc;
use futures::future::join_all;
use quotedeck_core::market::entity::{MAX_MOVERS, MarketOverview, Quote};
use quotedeck_core::market::error::MarketError;
use std::sync::Arc;
use tracing::warn;

/// 指数 ETF 篮子，输出顺序固定
pub const INDEX_BASKET: [&str; 4] = ["SPY", "DIA", "QQQ", "IWM"];

fn or_empty(section: &str, result: Result<Vec<Quote>, MarketError>) -> Vec<Quote> {
    match result {
        Ok(mut quotes) => {
            quotes.truncate(MAX_MOVERS);
            quotes
        }
        Err(e) => {
            warn!("Market overview: {} unavailable, using empty list: {}", section, e);
            Vec::new()
        }
    }
}

/// # Summary
/// 市场聚合服务：基于股票服务组合出概览与指数，不持有自己的缓存键。
///
/// # Invariants
/// - 子请求并发执行，全部完成后再组装；单个子请求失败只降级该部分。
pub struct MarketService {
    stocks: Arc<StocksService>,
}

impl MarketService {
    pub fn new(stocks: Arc<StocksService>) -> Self {
        Self { stocks }
    }

    /// # Summary
    /// 市场概览：并发获取三个榜单。
    ///
    /// # Logic
    /// 1. 使用 `tokio::join!` 并发请求涨幅榜、跌幅榜与活跃榜。
    /// 2. 失败的榜单降级为空列表，其余榜单截取前 5 条。
    pub async fn get_overview(&self) -> MarketOverview {
        let (gainers, losers, active) = tokio::join!(
            self.stocks.get_top_gainers(),
            self.stocks.get_top_losers(),
            self.stocks.get_most_active(),
        );

        MarketOverview {
            top_gainers: or_empty("top gainers", gainers),
            top_losers: or_empty("top losers", losers),
            most_active: or_empty("most active", active),
        }
    }

    /// # Summary
    /// 获取指数 ETF 报价。
    ///
    /// # Logic
    /// 1. 并发请求篮子中的每只 ETF。
    /// 2. 单只失败时以零值报价占位，结果保持篮子顺序。
    ///
    /// # Returns
    /// 长度恒为 4 的报价列表。
    pub async fn get_indices(&self) -> Vec<Quote> {
        let results = join_all(INDEX_BASKET.iter().map(|s| self.stocks.get_quote(s))).await;

        INDEX_BASKET
            .iter()
            .zip(results)
            .map(|(symbol, result)| {
                result.unwrap_or_else(|e| {
                    warn!("Index quote for {} unavailable, using zero quote: {}", symbol, e);
                    Quote::zeroed(symbol, Utc::now().timestamp())
                })
            })
            .collect()
    }
}
