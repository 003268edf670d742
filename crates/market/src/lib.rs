//! # `quotedeck-market` - 行情聚合服务
//!
//! 服务层按旁路缓存模式访问上游：先查缓存，未命中时调用一次数据源并按固定 TTL 回填。
//!
//! | 服务 | 键前缀 | TTL |
//! |---|---|---|
//! | [`StocksService`] | `quote:` / `movers:` / `chart:` | 15s / 300s / 300s |
//! | [`CryptoService`] | `crypto:quote:` / `crypto:trending` | 30s / 300s |
//! | [`NewsService`] | `news:` | 300s |
//! | [`MarketService`] | 无 (复用股票服务) | - |

pub mod cached;
pub mod crypto;
pub mod keys;
pub mod news;
pub mod overview;
pub mod stocks;

pub use crypto::CryptoService;
pub use news::NewsService;
pub use overview::MarketService;
pub use stocks::StocksService;
