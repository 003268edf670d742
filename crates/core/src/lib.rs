//! # `quotedeck-core` - 领域模型与端口定义
//!
//! 本 crate 只包含与具体实现无关的部分：
//! - 行情实体 (`Quote`, `ChartPoint`, `NewsArticle` ...)
//! - 上游数据源端口 (`QuoteProvider`, `ChartProvider`, `CryptoProvider`, `NewsProvider`)
//! - 缓存端口 (`Cache` / `CacheExt`)
//! - 全局配置 `AppConfig` 与时钟抽象 `TimeProvider`
//!
//! 其余 crate 通过 `Arc<dyn Trait>` 依赖这里的端口，由 `quotedeck-app` 负责装配。

pub mod cache;
pub mod common;
pub mod config;
pub mod market;

#[cfg(feature = "test-utils")]
pub mod test_utils;
