use crate::cached::CacheAside;
use crate::keys;
use quotedeck_core::cache::port::Cache;
use quotedeck_core::market::entity::NewsArticle;
use quotedeck_core::market::error::MarketError;
use quotedeck_core::market::port::NewsProvider;
use std::sync::Arc;

/// 未指定分类时使用的新闻分类
pub const DEFAULT_CATEGORY: &str = "general";

/// 新闻服务，独占 `news:` 键前缀，每个分类缓存 5 分钟
pub struct NewsService {
    provider: Arc<dyn NewsProvider>,
    cache: CacheAside,
}

impl NewsService {
    pub fn new(provider: Arc<dyn NewsProvider>, cache: Arc<dyn Cache>) -> Self {
        Self {
            provider,
            cache: CacheAside::new(cache),
        }
    }

    pub async fn get_news(&self, category: &str) -> Result<Vec<NewsArticle>, MarketError> {
        let category = match category.trim() {
            "" => DEFAULT_CATEGORY,
            c => c,
        };
        self.cache
            .get_or_fetch(&keys::news(category), keys::NEWS_TTL, || {
                self.provider.get_news(category)
            })
            .await
    }

    pub async fn get_market_news(&self) -> Result<Vec<NewsArticle>, MarketError> {
        self.get_news(DEFAULT_CATEGORY).await
    }
}
