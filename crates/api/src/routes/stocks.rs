use axum::Json;
use axum::extract::{Path, Query, State};
use quotedeck_core::market::entity::{ChartInterval, ChartPoint, Quote, SymbolMatch};

use crate::error::ApiError;
use crate::server::AppState;
use crate::types::{ApiErrorResponse, ChartQuery, SearchQuery};

/// 图表请求未携带周期时使用的默认值
const DEFAULT_CHART_INTERVAL: &str = "1D";

/// 获取单只股票报价 (缓存 15 秒)
#[utoipa::path(
    get,
    path = "/stocks/quote/{symbol}",
    tag = "股票 (Stocks)",
    params(
        ("symbol" = String, Path, description = "股票代码")
    ),
    responses(
        (status = 200, description = "获取成功", body = Quote),
        (status = 502, description = "上游不可用", body = ApiErrorResponse)
    )
)]
pub async fn get_quote(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<Quote>, ApiError> {
    Ok(Json(state.stocks.get_quote(&symbol).await?))
}

/// 涨幅榜 (至多 5 条)
#[utoipa::path(
    get,
    path = "/stocks/top-gainers",
    tag = "股票 (Stocks)",
    responses(
        (status = 200, description = "获取成功", body = Vec<Quote>),
        (status = 502, description = "上游不可用", body = ApiErrorResponse)
    )
)]
pub async fn get_top_gainers(State(state): State<AppState>) -> Result<Json<Vec<Quote>>, ApiError> {
    Ok(Json(state.stocks.get_top_gainers().await?))
}

/// 跌幅榜 (至多 5 条)
#[utoipa::path(
    get,
    path = "/stocks/top-losers",
    tag = "股票 (Stocks)",
    responses(
        (status = 200, description = "获取成功", body = Vec<Quote>),
        (status = 502, description = "上游不可用", body = ApiErrorResponse)
    )
)]
pub async fn get_top_losers(State(state): State<AppState>) -> Result<Json<Vec<Quote>>, ApiError> {
    Ok(Json(state.stocks.get_top_losers().await?))
}

/// 活跃榜，按涨跌额绝对值排序 (至多 5 条)
#[utoipa::path(
    get,
    path = "/stocks/most-active",
    tag = "股票 (Stocks)",
    responses(
        (status = 200, description = "获取成功", body = Vec<Quote>),
        (status = 502, description = "上游不可用", body = ApiErrorResponse)
    )
)]
pub async fn get_most_active(State(state): State<AppState>) -> Result<Json<Vec<Quote>>, ApiError> {
    Ok(Json(state.stocks.get_most_active().await?))
}

/// 证券代码搜索 (不缓存)
#[utoipa::path(
    get,
    path = "/stocks/search",
    tag = "股票 (Stocks)",
    params(
        ("q" = String, Query, description = "搜索关键字")
    ),
    responses(
        (status = 200, description = "搜索成功", body = Vec<SymbolMatch>),
        (status = 400, description = "缺少关键字", body = ApiErrorResponse),
        (status = 502, description = "上游不可用", body = ApiErrorResponse)
    )
)]
pub async fn search_stocks(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<SymbolMatch>>, ApiError> {
    let q = query
        .q
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing query parameter 'q'".to_string()))?;
    Ok(Json(state.stocks.search(&q).await?))
}

/// 日内图表
///
/// 上游失败时按配置的策略返回错误或合成数据。
#[utoipa::path(
    get,
    path = "/stocks/chart/{symbol}",
    tag = "股票 (Stocks)",
    params(
        ("symbol" = String, Path, description = "股票代码"),
        ("interval" = Option<String>, Query, description = "周期: 1min, 5min, 15min, 30min, 60min, 1D (默认 1D)")
    ),
    responses(
        (status = 200, description = "按时间升序的 K 线", body = Vec<ChartPoint>),
        (status = 404, description = "代码不存在 (严格模式)", body = ApiErrorResponse),
        (status = 429, description = "上游限流 (严格模式)", body = ApiErrorResponse),
        (status = 502, description = "上游不可用 (严格模式)", body = ApiErrorResponse)
    )
)]
pub async fn get_chart(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<ChartQuery>,
) -> Result<Json<Vec<ChartPoint>>, ApiError> {
    let interval =
        ChartInterval::parse(query.interval.as_deref().unwrap_or(DEFAULT_CHART_INTERVAL));
    Ok(Json(state.stocks.get_chart(&symbol, interval).await?))
}
