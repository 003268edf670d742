//! Alpha Vantage 日内图表客户端。
//!
//! 免费档每分钟仅几次调用，客户端不等待令牌：本地配额耗尽与上游限流同等处理，
//! 交由失败策略决定抛错还是合成数据。
//! 接口文档: https://www.alphavantage.co/documentation/

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDateTime, TimeZone};
use chrono_tz::America::New_York;
use quotedeck_core::common::normalize_symbol;
use quotedeck_core::common::time::{RealTimeProvider, TimeProvider};
use quotedeck_core::config::ProvidersConfig;
use quotedeck_core::market::entity::{ChartInterval, ChartPoint, UpstreamFailurePolicy};
use quotedeck_core::market::error::MarketError;
use quotedeck_core::market::port::ChartProvider;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::http::{build_client, send_json};
use crate::limiter::{RateLimitConfig, RateLimiter};
use crate::synthetic::{self, FALLBACK_DAYS};

pub const PROVIDER_ID: &str = "ALPHA_VANTAGE";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// # Summary
/// `Time Series (...)` 中的一根 K 线。
///
/// # Invariants
/// - 上游以字符串形式返回数值。
#[derive(Debug, Deserialize)]
struct IntradayBar {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. volume")]
    volume: String,
}

fn parse_number<T: std::str::FromStr>(field: &str, raw: &str) -> Result<T, MarketError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| MarketError::Parse(format!("Invalid {} value '{}'", field, raw)))
}

/// 交易所本地时间 (美东) 转 Unix 秒
fn parse_timestamp(raw: &str) -> Result<i64, MarketError> {
    let naive = NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map_err(|e| MarketError::Parse(format!("Invalid timestamp '{}': {}", raw, e)))?;
    New_York
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.timestamp())
        .ok_or_else(|| MarketError::Parse(format!("Nonexistent local time '{}'", raw)))
}

impl IntradayBar {
    fn into_point(self, time: i64) -> Result<ChartPoint, MarketError> {
        Ok(ChartPoint {
            time,
            open: parse_number("open", &self.open)?,
            high: parse_number("high", &self.high)?,
            low: parse_number("low", &self.low)?,
            close: parse_number("close", &self.close)?,
            volume: parse_number("volume", &self.volume)?,
        })
    }
}

/// # Summary
/// 将上游响应体解析为升序 K 线序列。
///
/// # Logic
/// 1. `Error Message` 视为代码不存在；`Note` / `Information` 视为限流标记。
/// 2. 缺失 `Time Series ({interval})` 键视为格式错误。
/// 3. 按时间戳排序输出，与上游 JSON 对象的键顺序无关。
fn parse_series(body: Value, provider_interval: &str) -> Result<Vec<ChartPoint>, MarketError> {
    if let Some(message) = body.get("Error Message").and_then(Value::as_str) {
        debug!("Alpha Vantage error message: {}", message);
        return Err(MarketError::NotFound);
    }
    if body.get("Note").is_some() || body.get("Information").is_some() {
        return Err(MarketError::RateLimited {
            provider: PROVIDER_ID.to_string(),
        });
    }

    let series_key = format!("Time Series ({})", provider_interval);
    let series = body
        .get(&series_key)
        .cloned()
        .ok_or_else(|| MarketError::Parse(format!("Missing '{}' in response", series_key)))?;
    let bars: BTreeMap<String, IntradayBar> = serde_json::from_value(series)
        .map_err(|e| MarketError::Parse(format!("{}: {}", PROVIDER_ID, e)))?;

    let mut points = bars
        .into_iter()
        .map(|(ts, bar)| bar.into_point(parse_timestamp(&ts)?))
        .collect::<Result<Vec<_>, _>>()?;
    if points.is_empty() {
        return Err(MarketError::NotFound);
    }

    points.sort_by_key(|p| p.time);
    points.dedup_by_key(|p| p.time);
    Ok(points)
}

/// # Summary
/// Alpha Vantage 日内图表客户端。
///
/// # Invariants
/// - 返回序列按时间严格升序。
/// - 合成数据以注入的时钟为终点。
pub struct AlphaVantageClient {
    client: Client,
    base_url: String,
    api_key: String,
    limiter: Arc<RateLimiter>,
    policy: UpstreamFailurePolicy,
    clock: Arc<dyn TimeProvider>,
}

impl AlphaVantageClient {
    /// # Summary
    /// 根据注入的上游配置与失败策略创建客户端。
    ///
    /// # Arguments
    /// * `config`: 上游地址、API Key、超时与限流参数。
    /// * `policy`: 上游不可用时抛错或返回合成数据。
    ///
    /// # Returns
    /// 成功返回客户端；HTTP 客户端构建失败返回 `MarketError::Network`。
    pub fn new(
        config: &ProvidersConfig,
        policy: UpstreamFailurePolicy,
    ) -> Result<Self, MarketError> {
        let limiter = RateLimiter::new(
            PROVIDER_ID,
            RateLimitConfig::new(
                config.alpha_vantage_requests_per_minute,
                config.alpha_vantage_burst,
                Duration::from_secs(config.backoff_after_429_secs),
            ),
        );

        Ok(Self {
            client: build_client(Duration::from_secs(config.timeout_secs))?,
            base_url: config.alpha_vantage_base_url.clone(),
            api_key: config.alpha_vantage_api_key.clone(),
            limiter: Arc::new(limiter),
            policy,
            clock: Arc::new(RealTimeProvider),
        })
    }

    /// 替换合成序列使用的时钟
    pub fn with_clock(mut self, clock: Arc<dyn TimeProvider>) -> Self {
        self.clock = clock;
        self
    }

    pub fn limiter(&self) -> Arc<RateLimiter> {
        self.limiter.clone()
    }

    /// # Summary
    /// 请求并解析一次日内序列。
    ///
    /// # Logic
    /// 1. 非阻塞取令牌，失败即返回 `RateLimited`。
    /// 2. 发送 `TIME_SERIES_INTRADAY` 请求并解析。
    /// 3. 响应体中的限流标记同样触发退避。
    async fn fetch_series(
        &self,
        symbol: &str,
        interval: ChartInterval,
    ) -> Result<Vec<ChartPoint>, MarketError> {
        if !self.limiter.try_acquire() {
            return Err(MarketError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            });
        }

        let provider_interval = interval.provider_interval();
        debug!(
            "Alpha Vantage request: {} interval {} ({})",
            symbol, interval, provider_interval
        );

        let request = self.client.get(&self.base_url).query(&[
            ("function", "TIME_SERIES_INTRADAY"),
            ("symbol", symbol),
            ("interval", provider_interval),
            ("apikey", self.api_key.as_str()),
        ]);
        let body: Value = send_json(PROVIDER_ID, request, &self.limiter).await?;

        let parsed = parse_series(body, provider_interval);
        if parsed.as_ref().is_err_and(MarketError::is_rate_limited) {
            self.limiter.backoff();
        }
        parsed
    }
}

#[async_trait]
impl ChartProvider for AlphaVantageClient {
    async fn get_intraday(
        &self,
        symbol: &str,
        interval: ChartInterval,
    ) -> Result<Vec<ChartPoint>, MarketError> {
        let symbol = normalize_symbol(symbol);

        match self.fetch_series(&symbol, interval).await {
            Ok(points) => Ok(points),
            Err(e) => match self.policy {
                UpstreamFailurePolicy::Propagate => Err(e),
                UpstreamFailurePolicy::Synthesize => {
                    warn!(
                        "Chart data unavailable for {} ({}), serving synthetic series: {}",
                        symbol, interval, e
                    );
                    Ok(synthetic::daily_candles(
                        self.clock.now(),
                        FALLBACK_DAYS,
                        &mut rand::rng(),
                    ))
                }
            },
        }
    }

    fn failure_policy(&self) -> UpstreamFailurePolicy {
        self.policy
    }
}
