//! 缓存键与存活时间。每个服务独占自己的键前缀。

use quotedeck_core::common::normalize_symbol;
use quotedeck_core::market::entity::{ChartInterval, MoverKind};
use std::time::Duration;

pub const QUOTE_TTL: Duration = Duration::from_secs(15);
pub const CHART_TTL: Duration = Duration::from_secs(300);
pub const MOVERS_TTL: Duration = Duration::from_secs(300);
pub const NEWS_TTL: Duration = Duration::from_secs(300);
pub const CRYPTO_QUOTE_TTL: Duration = Duration::from_secs(30);
pub const CRYPTO_TRENDING_TTL: Duration = Duration::from_secs(300);

pub fn quote(symbol: &str) -> String {
    format!("quote:{}", normalize_symbol(symbol))
}

pub fn chart(symbol: &str, interval: ChartInterval) -> String {
    format!("chart:{}:{}", normalize_symbol(symbol), interval.token())
}

pub fn movers(kind: MoverKind) -> String {
    format!("movers:{}", kind.as_str())
}

pub fn news(category: &str) -> String {
    format!("news:{}", category)
}

/// 币种 id 与上游保持一致，统一小写
pub fn crypto_quote(coin_id: &str) -> String {
    format!("crypto:quote:{}", coin_id.trim().to_lowercase())
}

pub const CRYPTO_TRENDING: &str = "crypto:trending";
