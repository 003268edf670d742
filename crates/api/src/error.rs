//! # API 统一错误处理
//!
//! 将行情域错误映射到 HTTP 状态码与 JSON 响应体。

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use quotedeck_core::market::error::MarketError;
use thiserror::Error;

use crate::types::ApiErrorResponse;

/// API 层统一错误枚举
#[derive(Error, Debug)]
pub enum ApiError {
    /// 资源未找到 (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// 请求参数错误 (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// 上游限流 (429)，仅在严格图表模式下可达
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// 上游不可用或返回异常 (502)
    #[error("Upstream error: {0}")]
    Upstream(String),
}

/// 将 `ApiError` 转换为 axum 的 HTTP 响应
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::RateLimited(msg) => (StatusCode::TOO_MANY_REQUESTS, msg.clone()),
            ApiError::Upstream(msg) => {
                // 上游细节只记录日志，不向客户端透传
                tracing::error!("Upstream failure: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "Upstream data provider unavailable".to_string(),
                )
            }
        };

        let body = Json(ApiErrorResponse::from_msg(message));
        (status, body).into_response()
    }
}

/// 从 `MarketError` 转换
impl From<MarketError> for ApiError {
    fn from(err: MarketError) -> Self {
        match &err {
            MarketError::NotFound => ApiError::NotFound(err.to_string()),
            MarketError::RateLimited { provider } => {
                ApiError::RateLimited(format!("{} rate limit reached, retry later", provider))
            }
            _ => ApiError::Upstream(err.to_string()),
        }
    }
}
