use crate::limiter::RateLimiter;
use quotedeck_core::common::install_crypto_provider;
use quotedeck_core::market::error::MarketError;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// # Summary
/// 构建带超时的 reqwest 客户端。
///
/// # Logic
/// 1. 安装 rustls 加密提供者 (幂等)。
/// 2. 所有上游调用共用同一超时，超时按上游错误处理。
pub(crate) fn build_client(timeout: Duration) -> Result<Client, MarketError> {
    install_crypto_provider();
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("quotedeck/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| MarketError::Network(format!("Failed to build HTTP client: {}", e)))
}

fn transport_error(provider: &str, err: reqwest::Error) -> MarketError {
    if err.is_timeout() {
        MarketError::Timeout {
            provider: provider.to_string(),
        }
    } else {
        MarketError::Network(format!("{}: {}", provider, err))
    }
}

/// # Summary
/// 发送请求并将 JSON 响应解析为目标类型。
///
/// # Logic
/// 1. 传输层错误区分超时与网络错误。
/// 2. HTTP 429 触发限流器退避并返回 `RateLimited`。
/// 3. 其余非 2xx 状态返回 `Http`。
/// 4. 响应体解析失败返回 `Parse`。
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: &str,
    request: RequestBuilder,
    limiter: &RateLimiter,
) -> Result<T, MarketError> {
    let response = request
        .send()
        .await
        .map_err(|e| transport_error(provider, e))?;

    let status = response.status();
    debug!("{} responded with {}", provider, status);

    if status == StatusCode::TOO_MANY_REQUESTS {
        limiter.backoff();
        return Err(MarketError::RateLimited {
            provider: provider.to_string(),
        });
    }

    if !status.is_success() {
        return Err(MarketError::Http {
            provider: provider.to_string(),
            status: status.as_u16(),
        });
    }

    response.json::<T>().await.map_err(|e| {
        if e.is_timeout() {
            transport_error(provider, e)
        } else {
            MarketError::Parse(format!("{}: {}", provider, e))
        }
    })
}
