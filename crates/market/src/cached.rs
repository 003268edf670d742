use quotedeck_cache::flight::FlightGroup;
use quotedeck_core::cache::port::{Cache, CacheExt};
use quotedeck_core::market::error::MarketError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// # Summary
/// 旁路缓存 (cache-aside) 执行器，所有带缓存的服务操作都经由它访问上游。
///
/// # Invariants
/// - 命中时原样返回缓存值，不做新鲜度校验。
/// - 同一个键的并发未命中只会触发一次上游调用。
/// - 上游错误不写入缓存；缓存读写故障只记录日志，不影响请求结果。
pub struct CacheAside {
    cache: Arc<dyn Cache>,
    flights: FlightGroup,
}

impl CacheAside {
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self {
            cache,
            flights: FlightGroup::new(),
        }
    }

    async fn lookup<T: DeserializeOwned + Send>(&self, key: &str) -> Option<T> {
        match self.cache.get::<T>(key).await {
            Ok(Some(value)) => {
                debug!("Cache hit: {}", key);
                Some(value)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Cache read failed for {}, treating as miss: {}", key, e);
                None
            }
        }
    }

    /// # Summary
    /// 读取缓存，未命中时调用上游并回填。
    ///
    /// # Logic
    /// 1. 读取缓存，命中直接返回。
    /// 2. 获取该键的执行权后再次读取缓存 (等待期间可能已被其他调用方回填)。
    /// 3. 仍未命中则调用 `fetch`，成功结果按 `ttl` 写回缓存。
    ///
    /// # Arguments
    /// * `key`: 确定性的缓存键。
    /// * `ttl`: 写回时的存活时间。
    /// * `fetch`: 恰好执行一次的上游调用。
    ///
    /// # Returns
    /// 缓存值或上游结果；上游错误原样返回。
    pub async fn get_or_fetch<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        fetch: F,
    ) -> Result<T, MarketError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, MarketError>>,
    {
        if let Some(value) = self.lookup(key).await {
            return Ok(value);
        }

        let _flight = self.flights.acquire(key).await;
        if let Some(value) = self.lookup(key).await {
            return Ok(value);
        }

        debug!("Cache miss: {}", key);
        let value = fetch().await?;
        if let Err(e) = self.cache.set(key, &value, ttl).await {
            warn!("Cache write failed for {}: {}", key, e);
        }
        Ok(value)
    }
}
