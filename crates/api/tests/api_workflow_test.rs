use mockito::{Matcher, Server, ServerGuard};
use quotedeck_api::server::{AppState, serve};
use quotedeck_api::types::ApiErrorResponse;
use quotedeck_cache::mem::MemCache;
use quotedeck_core::cache::port::Cache;
use quotedeck_core::common::install_crypto_provider;
use quotedeck_core::config::ProvidersConfig;
use quotedeck_core::market::entity::{
    ChartPoint, MarketOverview, Quote, SymbolMatch, UpstreamFailurePolicy,
};
use quotedeck_feed::{AlphaVantageClient, CoinGeckoClient, FinnhubClient};
use quotedeck_market::{CryptoService, MarketService, NewsService, StocksService};
use reqwest::StatusCode;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;

// 帮助函数：以 mockito 作为全部上游，装配真实客户端与服务
fn state_for(server: &ServerGuard, policy: UpstreamFailurePolicy) -> AppState {
    let config = ProvidersConfig {
        finnhub_base_url: server.url(),
        alpha_vantage_base_url: format!("{}/query", server.url()),
        coingecko_base_url: server.url(),
        finnhub_api_key: "test".to_string(),
        alpha_vantage_api_key: "test".to_string(),
        finnhub_burst: 100,
        ..ProvidersConfig::default()
    };

    let finnhub = Arc::new(FinnhubClient::new(&config).unwrap());
    let alpha_vantage = Arc::new(AlphaVantageClient::new(&config, policy).unwrap());
    let coingecko = Arc::new(CoinGeckoClient::new(&config).unwrap());
    let cache: Arc<dyn Cache> = Arc::new(MemCache::new());

    let stocks = Arc::new(StocksService::new(
        finnhub.clone(),
        alpha_vantage,
        cache.clone(),
    ));
    AppState {
        stocks: stocks.clone(),
        crypto: Arc::new(CryptoService::new(coingecko, cache.clone())),
        news: Arc::new(NewsService::new(finnhub, cache)),
        market: Arc::new(MarketService::new(stocks)),
    }
}

// 帮助函数：在随机端口启动测试服务器
async fn spawn_test_server(state: AppState) -> String {
    let _ = tracing_subscriber::fmt().with_env_filter("debug").try_init();
    install_crypto_provider();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        serve(state, listener, std::future::pending()).await.unwrap();
    });
    addr
}

async fn mock_quote(server: &mut ServerGuard, symbol: &str, price: f64, change: f64, pct: f64) {
    server
        .mock("GET", "/quote")
        .match_query(Matcher::UrlEncoded("symbol".into(), symbol.into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"c": price, "d": change, "dp": pct, "h": price, "l": price,
                   "o": price - change, "pc": price - change, "t": 1_710_000_000})
            .to_string(),
        )
        .create_async()
        .await;
}

#[tokio::test]
async fn test_quote_second_call_is_served_from_cache() {
    let mut server = Server::new_async().await;
    let upstream = server
        .mock("GET", "/quote")
        .match_query(Matcher::UrlEncoded("symbol".into(), "AAPL".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"c": 150.0, "d": 2.0, "dp": 1.35, "t": 1_710_000_000}).to_string())
        .expect(1)
        .create_async()
        .await;

    let base_url = spawn_test_server(state_for(&server, UpstreamFailurePolicy::Synthesize)).await;
    let client = reqwest::Client::new();

    let first = client
        .get(format!("{}/stocks/quote/AAPL", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let first: Value = first.json().await.unwrap();
    assert_eq!(first["symbol"], "AAPL");
    assert_eq!(first["price"], 150.0);
    assert_eq!(first["change"], 2.0);
    assert_eq!(first["changePercent"], 1.35);

    let second: Value = client
        .get(format!("{}/stocks/quote/aapl", base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(first, second);
    upstream.assert_async().await;
}

#[tokio::test]
async fn test_movers_ranking_over_http() {
    let mut server = Server::new_async().await;
    mock_quote(&mut server, "AAPL", 150.0, 7.5, 5.0).await;
    mock_quote(&mut server, "MSFT", 400.0, -12.0, -3.0).await;
    mock_quote(&mut server, "GOOGL", 140.0, 1.4, 1.0).await;
    for symbol in ["AMZN", "TSLA", "META"] {
        server
            .mock("GET", "/quote")
            .match_query(Matcher::UrlEncoded("symbol".into(), symbol.into()))
            .with_status(500)
            .create_async()
            .await;
    }

    let base_url = spawn_test_server(state_for(&server, UpstreamFailurePolicy::Synthesize)).await;
    let client = reqwest::Client::new();

    let gainers: Vec<Quote> = client
        .get(format!("{}/stocks/top-gainers", base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let symbols: Vec<_> = gainers.iter().map(|q| q.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["AAPL", "GOOGL", "MSFT"]);

    let active: Vec<Quote> = client
        .get(format!("{}/stocks/most-active", base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(active[0].symbol, "MSFT");

    // 概览复用已缓存的榜单
    let overview: MarketOverview = client
        .get(format!("{}/market/overview", base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(overview.top_gainers, gainers);
    assert_eq!(overview.top_losers[0].symbol, "MSFT");
    assert!(overview.most_active.len() <= 5);
}

#[tokio::test]
async fn test_chart_rate_limited_serves_synthetic_series() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/query")
        .match_query(Matcher::UrlEncoded("symbol".into(), "TSLA".into()))
        .with_status(429)
        .create_async()
        .await;

    let base_url = spawn_test_server(state_for(&server, UpstreamFailurePolicy::Synthesize)).await;
    let res = reqwest::Client::new()
        .get(format!("{}/stocks/chart/TSLA", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let points: Vec<ChartPoint> = res.json().await.unwrap();
    assert_eq!(points.len(), 30);
    assert_eq!(points[29].time - points[0].time, 29 * 86_400);
    assert!((chrono::Utc::now().timestamp() - points[29].time).abs() < 60);
    for w in points.windows(2) {
        assert!(w[0].time < w[1].time);
        assert_eq!(w[1].open, w[0].close);
    }
}

#[tokio::test]
async fn test_chart_rate_limited_in_strict_mode_is_429() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/query")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"Note": "API call frequency exceeded"}).to_string())
        .create_async()
        .await;

    let base_url = spawn_test_server(state_for(&server, UpstreamFailurePolicy::Propagate)).await;
    let res = reqwest::Client::new()
        .get(format!("{}/stocks/chart/TSLA?interval=5min", base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: ApiErrorResponse = res.json().await.unwrap();
    assert!(!body.success);
}

#[tokio::test]
async fn test_search_requires_query() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/search")
        .match_query(Matcher::UrlEncoded("q".into(), "tesla".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"count": 1, "result": [{"description": "TESLA INC", "symbol": "TSLA", "type": "Common Stock"}]})
                .to_string(),
        )
        .create_async()
        .await;

    let base_url = spawn_test_server(state_for(&server, UpstreamFailurePolicy::Synthesize)).await;
    let client = reqwest::Client::new();

    let missing = client
        .get(format!("{}/stocks/search", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    let body: ApiErrorResponse = missing.json().await.unwrap();
    assert!(!body.success);

    let hits: Vec<SymbolMatch> = client
        .get(format!("{}/stocks/search?q=tesla", base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].kind, "Common Stock");
}

#[tokio::test]
async fn test_crypto_quote_trending_and_not_found() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/simple/price")
        .match_query(Matcher::UrlEncoded("ids".into(), "bitcoin".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"bitcoin": {"usd": 64000.5, "usd_24h_change": 2.5, "usd_24h_vol": 1.0e10}}).to_string())
        .create_async()
        .await;
    server
        .mock("GET", "/simple/price")
        .match_query(Matcher::UrlEncoded("ids".into(), "btc".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("{}")
        .create_async()
        .await;
    server
        .mock("GET", "/search/trending")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"coins": [{"item": {"id": "pepe"}}]}).to_string())
        .create_async()
        .await;

    let base_url = spawn_test_server(state_for(&server, UpstreamFailurePolicy::Synthesize)).await;
    let client = reqwest::Client::new();

    let quote: Value = client
        .get(format!("{}/crypto/quote/bitcoin", base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(quote["usd"], 64000.5);
    assert_eq!(quote["usd_24h_change"], 2.5);

    let missing = client
        .get(format!("{}/crypto/quote/BTC", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let trending: Value = client
        .get(format!("{}/crypto/trending", base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(trending["coins"][0]["item"]["id"], "pepe");
}

#[tokio::test]
async fn test_news_default_category_and_market_alias() {
    let mut server = Server::new_async().await;
    let general = server
        .mock("GET", "/news")
        .match_query(Matcher::UrlEncoded("category".into(), "general".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([{"id": 1, "headline": "Fed holds rates", "summary": "", "source": "CNBC",
                    "url": "https://example.com/fed", "datetime": 1_710_000_000, "category": "general"}])
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let base_url = spawn_test_server(state_for(&server, UpstreamFailurePolicy::Synthesize)).await;
    let client = reqwest::Client::new();

    let news: Value = client
        .get(format!("{}/news", base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(news[0]["headline"], "Fed holds rates");

    let market: Value = client
        .get(format!("{}/news/market", base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(news, market);
    general.assert_async().await;
}

#[tokio::test]
async fn test_indices_degrade_and_upstream_errors_map_to_502() {
    let mut server = Server::new_async().await;
    mock_quote(&mut server, "SPY", 510.0, 2.0, 0.4).await;
    mock_quote(&mut server, "QQQ", 440.0, -1.0, -0.2).await;
    for symbol in ["DIA", "IWM"] {
        server
            .mock("GET", "/quote")
            .match_query(Matcher::UrlEncoded("symbol".into(), symbol.into()))
            .with_status(503)
            .create_async()
            .await;
    }

    let base_url = spawn_test_server(state_for(&server, UpstreamFailurePolicy::Synthesize)).await;
    let client = reqwest::Client::new();

    let indices: Vec<Quote> = client
        .get(format!("{}/market/indices", base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let symbols: Vec<_> = indices.iter().map(|q| q.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["SPY", "DIA", "QQQ", "IWM"]);
    assert_eq!(indices[0].price, 510.0);
    assert_eq!(indices[1].price, 0.0);
    assert_eq!(indices[3].price, 0.0);

    let res = client
        .get(format!("{}/stocks/quote/DIA", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let body: ApiErrorResponse = res.json().await.unwrap();
    assert!(!body.error.contains("503"));
}

#[tokio::test]
async fn test_openapi_document_lists_routes() {
    let server = Server::new_async().await;
    let base_url = spawn_test_server(state_for(&server, UpstreamFailurePolicy::Synthesize)).await;

    let doc: Value = reqwest::Client::new()
        .get(format!("{}/api-docs/openapi.json", base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let paths = doc["paths"].as_object().unwrap();
    for path in [
        "/stocks/quote/{symbol}",
        "/stocks/top-gainers",
        "/stocks/top-losers",
        "/stocks/most-active",
        "/stocks/search",
        "/stocks/chart/{symbol}",
        "/crypto/quote/{symbol}",
        "/crypto/trending",
        "/news",
        "/news/market",
        "/market/overview",
        "/market/indices",
    ] {
        assert!(paths.contains_key(path), "missing {path}");
    }
}
