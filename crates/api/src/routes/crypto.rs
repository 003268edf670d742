use axum::Json;
use axum::extract::{Path, State};
use quotedeck_core::market::entity::CryptoQuote;

use crate::error::ApiError;
use crate::server::AppState;
use crate::types::ApiErrorResponse;

/// 加密货币现价
///
/// 代码小写后直接作为 CoinGecko coin id (如 `bitcoin`)。
#[utoipa::path(
    get,
    path = "/crypto/quote/{symbol}",
    tag = "加密货币 (Crypto)",
    params(
        ("symbol" = String, Path, description = "CoinGecko coin id")
    ),
    responses(
        (status = 200, description = "获取成功", body = CryptoQuote),
        (status = 404, description = "币种不存在", body = ApiErrorResponse),
        (status = 502, description = "上游不可用", body = ApiErrorResponse)
    )
)]
pub async fn get_crypto_quote(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<CryptoQuote>, ApiError> {
    Ok(Json(state.crypto.get_quote(&symbol).await?))
}

/// 热门币种，原样透传上游结构
#[utoipa::path(
    get,
    path = "/crypto/trending",
    tag = "加密货币 (Crypto)",
    responses(
        (status = 200, description = "上游原始 JSON"),
        (status = 502, description = "上游不可用", body = ApiErrorResponse)
    )
)]
pub async fn get_trending(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(state.crypto.get_trending().await?))
}
