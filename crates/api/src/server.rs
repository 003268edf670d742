//! # API 服务启动器
//!
//! 组装 axum 路由、挂载 Swagger UI、配置 CORS 并绑定 TCP 端口对外提供服务。
//! 本模块不直接启动 `main()`, 而是由 `crates/app` 装配好服务后调用。

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use utoipa_swagger_ui::SwaggerUi;

use quotedeck_market::{CryptoService, MarketService, NewsService, StocksService};

use crate::routes::{crypto, market, news, stocks};

// ============================================================
//  共享应用状态
// ============================================================

/// 全局应用状态，通过 axum 的 `State` 提取器注入到每个 Handler 中。
///
/// # Invariants
/// - 所有服务在服务启动前由 app 装配，生命周期与进程等同。
#[derive(Clone)]
pub struct AppState {
    pub stocks: Arc<StocksService>,
    pub crypto: Arc<CryptoService>,
    pub news: Arc<NewsService>,
    pub market: Arc<MarketService>,
}

// ============================================================
//  OpenAPI 文档定义
// ============================================================

/// 全局 OpenAPI 文档结构
#[derive(OpenApi)]
#[openapi(
    info(
        title = "QuoteDeck 行情网关 API",
        version = "0.1.0",
        description = "聚合股票、加密货币与新闻数据的只读网关，带 TTL 缓存与上游限流保护。"
    ),
    tags(
        (name = "股票 (Stocks)", description = "报价、涨跌榜、搜索与日内图表"),
        (name = "加密货币 (Crypto)", description = "币种现价与热门币种"),
        (name = "新闻 (News)", description = "分类市场新闻"),
        (name = "市场 (Market)", description = "市场概览与指数")
    )
)]
pub struct ApiDoc;

/// # Summary
/// 构建完整的路由树 (含 Swagger UI 与 CORS)。
///
/// # Arguments
/// * `state` - 由 app 注入的共享状态
///
/// # Returns
/// 可直接交给 `axum::serve` 的 Router。
pub fn build_router(state: AppState) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .routes(routes!(stocks::get_quote))
        .routes(routes!(stocks::get_top_gainers))
        .routes(routes!(stocks::get_top_losers))
        .routes(routes!(stocks::get_most_active))
        .routes(routes!(stocks::search_stocks))
        .routes(routes!(stocks::get_chart))
        .routes(routes!(crypto::get_crypto_quote))
        .routes(routes!(crypto::get_trending))
        .routes(routes!(news::get_news))
        .routes(routes!(news::get_market_news))
        .routes(routes!(market::get_overview))
        .routes(routes!(market::get_indices))
        .with_state(state)
        .split_for_parts();

    // 仪表盘运行在其他源上，允许跨域
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api))
        .layer(cors)
}

/// # Summary
/// 在已绑定的监听器上提供服务，直到 `shutdown` 完成。
///
/// # Arguments
/// * `state` - 共享状态
/// * `listener` - 已绑定的 TCP 监听器
/// * `shutdown` - 完成时触发优雅退出
pub async fn serve(
    state: AppState,
    listener: TcpListener,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let app = build_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

/// 绑定地址并启动 HTTP 服务。
///
/// # Arguments
/// * `state` - 共享状态
/// * `bind_addr` - 监听的地址与端口，如 `"0.0.0.0:3001"`
/// * `shutdown` - 完成时触发优雅退出
pub async fn start_server(
    state: AppState,
    bind_addr: &str,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(bind_addr).await?;

    tracing::info!("QuoteDeck API Server listening on {}", bind_addr);
    tracing::info!("Swagger UI: http://{}/swagger-ui/", bind_addr);

    serve(state, listener, shutdown).await?;
    Ok(())
}
