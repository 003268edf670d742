use async_trait::async_trait;
use chrono::Utc;
use quotedeck_cache::mem::MemCache;
use quotedeck_core::cache::error::CacheError;
use quotedeck_core::cache::port::Cache;
use quotedeck_core::common::time::FakeClockProvider;
use quotedeck_core::market::entity::{
    ChartInterval, ChartPoint, CryptoQuote, MoverKind, NewsArticle, Quote, SymbolMatch,
};
use quotedeck_core::market::error::MarketError;
use quotedeck_core::market::port::QuoteProvider;
use quotedeck_core::test_utils::{
    MockChartProvider, MockCryptoProvider, MockNewsProvider, MockQuoteProvider, sample_quote,
};
use quotedeck_market::{CryptoService, MarketService, NewsService, StocksService};
use std::sync::Arc;
use std::time::Duration;

struct Fixture {
    quotes: Arc<MockQuoteProvider>,
    charts: Arc<MockChartProvider>,
    stocks: Arc<StocksService>,
}

fn points() -> Vec<ChartPoint> {
    (0..3)
        .map(|i| ChartPoint {
            time: 1_710_000_000 + i * 300,
            open: 100.0,
            high: 101.0,
            low: 99.0,
            close: 100.5,
            volume: 1_000,
        })
        .collect()
}

fn fixture_with_cache(cache: Arc<dyn Cache>) -> Fixture {
    let quotes = Arc::new(MockQuoteProvider::new());
    let charts = Arc::new(MockChartProvider::new(points()));
    let stocks = Arc::new(StocksService::new(quotes.clone(), charts.clone(), cache));
    Fixture {
        quotes,
        charts,
        stocks,
    }
}

fn fixture() -> Fixture {
    fixture_with_cache(Arc::new(MemCache::new()))
}

fn symbols(quotes: &[Quote]) -> Vec<&str> {
    quotes.iter().map(|q| q.symbol.as_str()).collect()
}

/// 所有操作均失败的报价源
struct DownQuoteProvider;

#[async_trait]
impl QuoteProvider for DownQuoteProvider {
    async fn get_quote(&self, _symbol: &str) -> Result<Quote, MarketError> {
        Err(MarketError::Network("connection refused".into()))
    }

    async fn get_market_movers(&self, _kind: MoverKind) -> Result<Vec<Quote>, MarketError> {
        Err(MarketError::Timeout {
            provider: "DOWN".into(),
        })
    }

    async fn search_symbol(&self, _query: &str) -> Result<Vec<SymbolMatch>, MarketError> {
        Err(MarketError::Network("connection refused".into()))
    }
}

/// 读写都失败的缓存
struct BrokenCache;

#[async_trait]
impl Cache for BrokenCache {
    async fn set_raw(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::Storage("disk on fire".into()))
    }

    async fn get_raw(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Err(CacheError::Storage("disk on fire".into()))
    }

    async fn del(&self, _key: &str) -> Result<(), CacheError> {
        Ok(())
    }
}

#[tokio::test]
async fn test_quote_is_served_from_cache_within_ttl() {
    let f = fixture();
    f.quotes.set_quote(sample_quote("AAPL", 150.0, 2.0, 1.35));

    let first = f.stocks.get_quote("AAPL").await.unwrap();
    f.quotes.set_quote(sample_quote("AAPL", 999.0, 0.0, 0.0));
    let second = f.stocks.get_quote("aapl").await.unwrap();

    assert_eq!(f.quotes.quote_calls("AAPL"), 1);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
    assert_eq!(second.price, 150.0);
}

#[tokio::test]
async fn test_quote_refetched_after_ttl() {
    let clock = Arc::new(FakeClockProvider::new(Utc::now()));
    let f = fixture_with_cache(Arc::new(MemCache::with_config(64, clock.clone())));
    f.quotes.set_quote(sample_quote("MSFT", 400.0, 1.0, 0.25));

    f.stocks.get_quote("MSFT").await.unwrap();
    clock.advance(chrono::Duration::seconds(14));
    f.stocks.get_quote("MSFT").await.unwrap();
    assert_eq!(f.quotes.quote_calls("MSFT"), 1);

    clock.advance(chrono::Duration::seconds(1));
    f.stocks.get_quote("MSFT").await.unwrap();
    assert_eq!(f.quotes.quote_calls("MSFT"), 2);
}

#[tokio::test]
async fn test_provider_errors_are_not_cached() {
    let f = fixture();
    f.quotes.fail_symbol("NFLX");

    assert!(f.stocks.get_quote("NFLX").await.is_err());
    assert!(f.stocks.get_quote("NFLX").await.is_err());
    assert_eq!(f.quotes.quote_calls("NFLX"), 2);
}

#[tokio::test]
async fn test_concurrent_misses_coalesce_into_one_fetch() {
    let f = fixture();
    f.quotes.set_quote(sample_quote("TSLA", 200.0, -4.0, -2.0));
    f.quotes.set_latency(Duration::from_millis(50));

    let calls = (0..10).map(|_| f.stocks.get_quote("TSLA"));
    let results = futures::future::join_all(calls).await;

    assert!(results.iter().all(|r| r.as_ref().is_ok_and(|q| q.price == 200.0)));
    assert_eq!(f.quotes.quote_calls("TSLA"), 1);
}

#[tokio::test]
async fn test_movers_ranked_and_cached_per_kind() {
    let f = fixture();
    f.quotes.set_quote(sample_quote("AAPL", 150.0, 7.5, 5.0));
    f.quotes.set_quote(sample_quote("MSFT", 400.0, -12.0, -3.0));
    f.quotes.set_quote(sample_quote("GOOGL", 140.0, 1.4, 1.0));

    let gainers = f.stocks.get_top_gainers().await.unwrap();
    assert_eq!(symbols(&gainers), vec!["AAPL", "GOOGL", "MSFT"]);

    let losers = f.stocks.get_top_losers().await.unwrap();
    assert_eq!(symbols(&losers), vec!["MSFT", "GOOGL", "AAPL"]);

    let active = f.stocks.get_most_active().await.unwrap();
    assert_eq!(symbols(&active), vec!["MSFT", "AAPL", "GOOGL"]);

    // 每种榜单各抓取一次，重复请求命中缓存
    f.stocks.get_movers(MoverKind::Gainers).await.unwrap();
    assert_eq!(f.quotes.mover_calls(), 3);
}

#[tokio::test]
async fn test_movers_tolerate_a_failing_symbol() {
    let f = fixture();
    f.quotes.set_quote(sample_quote("AAPL", 150.0, 7.5, 5.0));
    f.quotes.set_quote(sample_quote("MSFT", 400.0, -12.0, -3.0));
    f.quotes.fail_symbol("MSFT");

    let gainers = f.stocks.get_top_gainers().await.unwrap();
    assert_eq!(symbols(&gainers), vec!["AAPL"]);
}

#[tokio::test]
async fn test_search_is_not_cached() {
    let f = fixture();
    f.quotes.set_search_hits(vec![SymbolMatch {
        symbol: "AAPL".into(),
        description: "APPLE INC".into(),
        kind: "Common Stock".into(),
    }]);

    f.stocks.search("apple").await.unwrap();
    let hits = f.stocks.search("apple").await.unwrap();
    assert_eq!(hits[0].symbol, "AAPL");
    assert_eq!(f.quotes.search_calls(), 2);
}

#[tokio::test]
async fn test_chart_cached_per_symbol_and_interval() {
    let f = fixture();

    let chart = f.stocks.get_chart("ibm", ChartInterval::Day1).await.unwrap();
    assert!(chart.windows(2).all(|w| w[0].time < w[1].time));
    f.stocks.get_chart("IBM", ChartInterval::Day1).await.unwrap();
    assert_eq!(f.charts.calls(), 1);

    f.stocks.get_chart("IBM", ChartInterval::Minute15).await.unwrap();
    assert_eq!(f.charts.calls(), 2);
}

#[tokio::test]
async fn test_chart_rate_limit_propagates_in_strict_mode() {
    let f = fixture();
    f.charts.rate_limit_symbol("TSLA");

    let err = f
        .stocks
        .get_chart("TSLA", ChartInterval::Minute5)
        .await
        .unwrap_err();
    assert!(err.is_rate_limited());

    // 错误不缓存
    assert!(f.stocks.get_chart("TSLA", ChartInterval::Minute5).await.is_err());
    assert_eq!(f.charts.calls(), 2);
}

#[tokio::test]
async fn test_broken_cache_never_fails_requests() {
    let f = fixture_with_cache(Arc::new(BrokenCache));
    f.quotes.set_quote(sample_quote("AMZN", 180.0, 0.9, 0.5));

    assert_eq!(f.stocks.get_quote("AMZN").await.unwrap().price, 180.0);
    assert_eq!(f.stocks.get_quote("AMZN").await.unwrap().price, 180.0);
    assert_eq!(f.quotes.quote_calls("AMZN"), 2);
}

#[tokio::test]
async fn test_overview_combines_three_lists() {
    let f = fixture();
    for (i, symbol) in ["A", "B", "C", "D", "E", "F", "G"].iter().enumerate() {
        let pct = f64::from(u32::try_from(i).unwrap()) - 3.0;
        f.quotes.set_quote(sample_quote(symbol, 10.0, pct, pct));
    }

    let market = MarketService::new(f.stocks.clone());
    let overview = market.get_overview().await;

    assert_eq!(overview.top_gainers.len(), 5);
    assert_eq!(overview.top_gainers[0].symbol, "G");
    assert_eq!(overview.top_losers[0].symbol, "A");
    assert_eq!(overview.most_active.len(), 5);
    assert_eq!(overview.most_active[0].symbol, "A");
}

#[tokio::test]
async fn test_overview_degrades_to_empty_lists() {
    let stocks = Arc::new(StocksService::new(
        Arc::new(DownQuoteProvider),
        Arc::new(MockChartProvider::new(Vec::new())),
        Arc::new(MemCache::new()),
    ));
    let market = MarketService::new(stocks);

    let overview = market.get_overview().await;
    assert!(overview.top_gainers.is_empty());
    assert!(overview.top_losers.is_empty());
    assert!(overview.most_active.is_empty());

    let indices = market.get_indices().await;
    assert_eq!(symbols(&indices), vec!["SPY", "DIA", "QQQ", "IWM"]);
    assert!(indices.iter().all(|q| q.price == 0.0));
}

#[tokio::test]
async fn test_indices_keep_basket_order_with_partial_failure() {
    let f = fixture();
    f.quotes.set_quote(sample_quote("IWM", 200.0, 1.0, 0.5));
    f.quotes.set_quote(sample_quote("SPY", 510.0, 2.0, 0.4));
    f.quotes.set_quote(sample_quote("DIA", 390.0, -1.0, -0.3));
    f.quotes.fail_symbol("DIA");
    // QQQ 未设置，数据源返回 NotFound

    let indices = MarketService::new(f.stocks.clone()).get_indices().await;
    assert_eq!(symbols(&indices), vec!["SPY", "DIA", "QQQ", "IWM"]);
    assert_eq!(indices[0].price, 510.0);
    assert_eq!(indices[1].price, 0.0);
    assert_eq!(indices[2].price, 0.0);
    assert_eq!(indices[3].price, 200.0);
}

#[tokio::test]
async fn test_crypto_quote_and_trending_cached() {
    let provider = Arc::new(MockCryptoProvider::new());
    provider.set_quote(
        "bitcoin",
        CryptoQuote {
            usd: Some(64000.5),
            usd_24h_change: Some(-1.25),
            usd_24h_vol: None,
        },
    );
    provider.set_trending(serde_json::json!({"coins": [{"item": {"id": "pepe"}}]}));
    let crypto = CryptoService::new(provider.clone(), Arc::new(MemCache::new()));

    assert_eq!(crypto.get_quote("Bitcoin").await.unwrap().usd, Some(64000.5));
    crypto.get_quote("bitcoin").await.unwrap();
    assert_eq!(provider.quote_calls(), 1);

    let trending = crypto.get_trending().await.unwrap();
    crypto.get_trending().await.unwrap();
    assert_eq!(trending["coins"][0]["item"]["id"], "pepe");
    assert_eq!(provider.trending_calls(), 1);

    assert!(matches!(
        crypto.get_quote("BTC").await.unwrap_err(),
        MarketError::NotFound
    ));
}

#[tokio::test]
async fn test_news_default_category_and_alias_share_entry() {
    let provider = Arc::new(MockNewsProvider::new());
    provider.set_articles(
        "general",
        vec![NewsArticle {
            id: 1,
            headline: "Stocks rally".into(),
            summary: String::new(),
            source: "Reuters".into(),
            url: "https://example.com/1".into(),
            image: None,
            datetime: 1_710_000_000,
            category: Some("general".into()),
            related: None,
        }],
    );
    let news = NewsService::new(provider.clone(), Arc::new(MemCache::new()));

    assert_eq!(news.get_news("").await.unwrap().len(), 1);
    assert_eq!(news.get_market_news().await.unwrap()[0].headline, "Stocks rally");
    assert_eq!(provider.calls("general"), 1);

    assert!(news.get_news("forex").await.unwrap().is_empty());
    news.get_news("forex").await.unwrap();
    assert_eq!(provider.calls("forex"), 1);
}
