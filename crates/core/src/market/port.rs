use crate::market::entity::{
    ChartInterval, ChartPoint, CryptoQuote, MoverKind, NewsArticle, Quote, SymbolMatch,
    UpstreamFailurePolicy,
};
use crate::market::error::MarketError;
use async_trait::async_trait;

/// # Summary
/// 股票报价 / 涨跌榜 / 证券搜索数据源接口。
///
/// # Invariants
/// - 实现者在两次调用之间不持有请求状态 (共享的限流器除外)。
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// # Summary
    /// 获取单只股票的报价。
    ///
    /// # Logic
    /// 1. 请求上游报价接口并规范化字段。
    /// 2. 上游限流时返回零值报价而非错误。
    ///
    /// # Arguments
    /// * `symbol`: 证券代码。
    ///
    /// # Returns
    /// 成功返回 Quote，其余上游错误返回 MarketError。
    async fn get_quote(&self, symbol: &str) -> Result<Quote, MarketError>;

    /// # Summary
    /// 基于固定观察列表计算涨跌榜。
    ///
    /// # Logic
    /// 1. 顺序抓取观察列表中每只股票的报价，单只失败则跳过。
    /// 2. 按榜单类型排序并截取前 5 条。
    ///
    /// # Arguments
    /// * `kind`: 榜单类型。
    ///
    /// # Returns
    /// 长度不超过 5 的报价列表，允许部分结果。
    async fn get_market_movers(&self, kind: MoverKind) -> Result<Vec<Quote>, MarketError>;

    /// # Summary
    /// 证券代码模糊搜索。
    ///
    /// # Arguments
    /// * `query`: 搜索关键字。
    ///
    /// # Returns
    /// 命中列表，错误直接抛出。
    async fn search_symbol(&self, query: &str) -> Result<Vec<SymbolMatch>, MarketError>;
}

/// # Summary
/// 日内图表数据源接口。
#[async_trait]
pub trait ChartProvider: Send + Sync {
    /// # Summary
    /// 获取日内 K 线序列。
    ///
    /// # Logic
    /// 1. 将逻辑周期映射为上游周期。
    /// 2. 解析上游时间序列并按时间升序输出。
    /// 3. 上游降级时依据 `failure_policy` 抛出错误或返回合成数据。
    ///
    /// # Arguments
    /// * `symbol`: 证券代码。
    /// * `interval`: 逻辑周期。
    ///
    /// # Returns
    /// 按时间严格升序的 K 线列表。
    async fn get_intraday(
        &self,
        symbol: &str,
        interval: ChartInterval,
    ) -> Result<Vec<ChartPoint>, MarketError>;

    /// 上游失败时采用的处理策略 (能力标记)
    fn failure_policy(&self) -> UpstreamFailurePolicy;
}

/// # Summary
/// 加密货币价格数据源接口。
#[async_trait]
pub trait CryptoProvider: Send + Sync {
    /// # Summary
    /// 获取单个币种的现价、24h 涨跌幅与成交额。
    ///
    /// # Arguments
    /// * `symbol`: 币种标识，转小写后直接作为上游 coin id。
    ///
    /// # Returns
    /// 成功返回 CryptoQuote；上游无此币种返回 `MarketError::NotFound`。
    async fn get_quote(&self, symbol: &str) -> Result<CryptoQuote, MarketError>;

    /// # Summary
    /// 获取上游热门币种快照，原样透传。
    async fn get_trending(&self) -> Result<serde_json::Value, MarketError>;
}

/// # Summary
/// 市场新闻数据源接口。
#[async_trait]
pub trait NewsProvider: Send + Sync {
    /// # Summary
    /// 获取指定分类的新闻列表。
    ///
    /// # Arguments
    /// * `category`: 新闻分类 (如 general, forex, crypto)。
    ///
    /// # Returns
    /// 新闻列表，错误直接抛出。
    async fn get_news(&self, category: &str) -> Result<Vec<NewsArticle>, MarketError>;
}
