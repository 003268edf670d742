use crate::cached::CacheAside;
use crate::keys;
use quotedeck_core::cache::port::Cache;
use quotedeck_core::market::entity::CryptoQuote;
use quotedeck_core::market::error::MarketError;
use quotedeck_core::market::port::CryptoProvider;
use std::sync::Arc;

/// 加密货币服务，独占 `crypto:` 键前缀
pub struct CryptoService {
    provider: Arc<dyn CryptoProvider>,
    cache: CacheAside,
}

impl CryptoService {
    pub fn new(provider: Arc<dyn CryptoProvider>, cache: Arc<dyn Cache>) -> Self {
        Self {
            provider,
            cache: CacheAside::new(cache),
        }
    }

    pub async fn get_quote(&self, symbol: &str) -> Result<CryptoQuote, MarketError> {
        self.cache
            .get_or_fetch(&keys::crypto_quote(symbol), keys::CRYPTO_QUOTE_TTL, || {
                self.provider.get_quote(symbol)
            })
            .await
    }

    pub async fn get_trending(&self) -> Result<serde_json::Value, MarketError> {
        self.cache
            .get_or_fetch(keys::CRYPTO_TRENDING, keys::CRYPTO_TRENDING_TTL, || {
                self.provider.get_trending()
            })
            .await
    }
}
