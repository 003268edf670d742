//! CoinGecko 公共接口客户端：现价与热门币种。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use quotedeck_core::config::ProvidersConfig;
use quotedeck_core::market::entity::CryptoQuote;
use quotedeck_core::market::error::MarketError;
use quotedeck_core::market::port::CryptoProvider;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::http::{build_client, send_json};
use crate::limiter::{RateLimitConfig, RateLimiter};

pub const PROVIDER_ID: &str = "COINGECKO";

/// # Summary
/// CoinGecko 现价与热门币种客户端。
///
/// # Invariants
/// - 币种 id 一律小写，不做代码映射。
pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
    limiter: Arc<RateLimiter>,
}

impl CoinGeckoClient {
    /// # Summary
    /// 根据注入的上游配置创建客户端。
    ///
    /// # Returns
    /// 成功返回客户端；HTTP 客户端构建失败返回 `MarketError::Network`。
    pub fn new(config: &ProvidersConfig) -> Result<Self, MarketError> {
        let limiter = RateLimiter::new(
            PROVIDER_ID,
            RateLimitConfig::new(
                config.coingecko_requests_per_minute,
                config.coingecko_burst,
                Duration::from_secs(config.backoff_after_429_secs),
            ),
        );

        Ok(Self {
            client: build_client(Duration::from_secs(config.timeout_secs))?,
            base_url: config.coingecko_base_url.trim_end_matches('/').to_string(),
            limiter: Arc::new(limiter),
        })
    }

    pub fn limiter(&self) -> Arc<RateLimiter> {
        self.limiter.clone()
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, MarketError> {
        self.limiter.acquire().await;
        debug!("CoinGecko request: {}", endpoint);

        let request = self
            .client
            .get(format!("{}{}", self.base_url, endpoint))
            .query(params);
        send_json(PROVIDER_ID, request, &self.limiter).await
    }
}

#[async_trait]
impl CryptoProvider for CoinGeckoClient {
    async fn get_quote(&self, symbol: &str) -> Result<CryptoQuote, MarketError> {
        // 不做代码到 coin id 的映射，小写后直接作为 id
        let coin_id = symbol.trim().to_lowercase();

        let mut prices = self
            .fetch::<HashMap<String, CryptoQuote>>(
                "/simple/price",
                &[
                    ("ids", coin_id.as_str()),
                    ("vs_currencies", "usd"),
                    ("include_24hr_change", "true"),
                    ("include_24hr_vol", "true"),
                ],
            )
            .await
            .inspect_err(|e| error!("Error fetching crypto quote for {}: {}", coin_id, e))?;

        prices.remove(&coin_id).ok_or(MarketError::NotFound)
    }

    async fn get_trending(&self) -> Result<serde_json::Value, MarketError> {
        self.fetch("/search/trending", &[])
            .await
            .inspect_err(|e| error!("Error fetching trending crypto: {}", e))
    }
}
