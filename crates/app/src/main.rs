mod settings;

use std::sync::Arc;
use std::time::Duration;

use quotedeck_api::server::{AppState, start_server};
use quotedeck_cache::mem::{MemCache, spawn_sweeper};
use quotedeck_core::cache::port::Cache;
use quotedeck_core::common::time::RealTimeProvider;
use quotedeck_feed::{AlphaVantageClient, CoinGeckoClient, FinnhubClient};
use quotedeck_market::{CryptoService, MarketService, NewsService, StocksService};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received. Exiting..."),
        Err(e) => {
            warn!("Failed to listen for ctrl-c, running until killed: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

/// # Summary
/// 应用启动入口，纯粹的装配容器。
/// 负责实例化所有具体实现并通过 `Arc<dyn Trait>` 注入各服务。
///
/// # Logic
/// 1. 读取 `.env` 并初始化日志。
/// 2. 加载分层配置。
/// 3. 实例化基础设施层 (缓存、上游客户端)。
/// 4. 构造聚合服务并启动 HTTP 服务，直到收到退出信号。
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. .env 需在日志初始化前加载，以便其中的 RUST_LOG 生效
    let dotenv = dotenvy::dotenv();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    if let Err(e) = dotenv
        && !e.not_found()
    {
        warn!("Failed to load .env: {}", e);
    }
    info!("QuoteDeck gateway starting...");

    // 2. 配置
    let config = settings::load(settings::DEFAULT_CONFIG_FILE, None)?;
    if config.providers.finnhub_api_key.is_empty() {
        warn!("Finnhub API key is not set; upstream calls will be rejected");
    }
    if config.providers.alpha_vantage_api_key.is_empty() {
        warn!("Alpha Vantage API key is not set; charts will follow the failure policy");
    }

    // 3. 基础设施层
    let mem_cache = Arc::new(MemCache::with_config(
        config.cache.max_entries,
        Arc::new(RealTimeProvider),
    ));
    let _sweeper = (config.cache.sweep_interval_secs > 0).then(|| {
        spawn_sweeper(
            &mem_cache,
            Duration::from_secs(config.cache.sweep_interval_secs),
        )
    });
    let cache: Arc<dyn Cache> = mem_cache;

    let finnhub = Arc::new(FinnhubClient::new(&config.providers)?);
    let alpha_vantage = Arc::new(AlphaVantageClient::new(
        &config.providers,
        config.chart.on_upstream_failure,
    )?);
    let coingecko = Arc::new(CoinGeckoClient::new(&config.providers)?);
    info!(
        "Chart upstream failure policy: {:?}",
        config.chart.on_upstream_failure
    );

    // 4. 服务层
    let stocks = Arc::new(StocksService::new(
        finnhub.clone(),
        alpha_vantage,
        cache.clone(),
    ));
    let state = AppState {
        stocks: stocks.clone(),
        crypto: Arc::new(CryptoService::new(coingecko, cache.clone())),
        news: Arc::new(NewsService::new(finnhub, cache)),
        market: Arc::new(MarketService::new(stocks)),
    };

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    start_server(state, &bind_addr, shutdown_signal()).await?;

    info!("QuoteDeck gateway stopped");
    Ok(())
}
