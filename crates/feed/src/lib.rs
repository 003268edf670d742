//! # `quotedeck-feed` - 上游数据源客户端
//!
//! - [`finnhub::FinnhubClient`]: 报价、涨跌榜、证券搜索与新闻。
//! - [`alpha_vantage::AlphaVantageClient`]: 日内图表，失败时按策略抛错或合成数据。
//! - [`coingecko::CoinGeckoClient`]: 加密货币现价与热门币种。
//!
//! 每个客户端持有自己上游的 [`limiter::RateLimiter`]，同一客户端的所有调用共享配额。

pub mod alpha_vantage;
pub mod coingecko;
pub mod finnhub;
mod http;
pub mod limiter;
pub mod synthetic;

pub use alpha_vantage::AlphaVantageClient;
pub use coingecko::CoinGeckoClient;
pub use finnhub::FinnhubClient;
