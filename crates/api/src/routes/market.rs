use axum::Json;
use axum::extract::State;
use quotedeck_core::market::entity::{MarketOverview, Quote};

use crate::server::AppState;

/// 市场概览
///
/// 三个榜单并发获取，单个榜单失败时降级为空列表，因此本接口总是返回 200。
#[utoipa::path(
    get,
    path = "/market/overview",
    tag = "市场 (Market)",
    responses(
        (status = 200, description = "获取成功", body = MarketOverview)
    )
)]
pub async fn get_overview(State(state): State<AppState>) -> Json<MarketOverview> {
    Json(state.market.get_overview().await)
}

/// 指数 ETF 报价 (SPY, DIA, QQQ, IWM)，失败项以零值报价占位
#[utoipa::path(
    get,
    path = "/market/indices",
    tag = "市场 (Market)",
    responses(
        (status = 200, description = "按篮子顺序的 4 条报价", body = Vec<Quote>)
    )
)]
pub async fn get_indices(State(state): State<AppState>) -> Json<Vec<Quote>> {
    Json(state.market.get_indices().await)
}
