use crate::market::entity::UpstreamFailurePolicy;
use serde::{Deserialize, Serialize};

/// 全局应用配置
///
/// 所有字段都有默认值，配置文件与环境变量只需覆盖关心的部分。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub providers: ProvidersConfig,
    pub cache: CacheConfig,
    pub chart: ChartConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
        }
    }
}

/// 上游数据源配置，构造时注入各客户端
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    // 为空时按原样发送，由上游返回鉴权失败
    pub finnhub_api_key: String,
    pub alpha_vantage_api_key: String,
    pub finnhub_base_url: String,
    pub alpha_vantage_base_url: String,
    pub coingecko_base_url: String,
    // 每次上游调用的超时 (秒)
    pub timeout_secs: u64,
    pub finnhub_requests_per_minute: u32,
    pub finnhub_burst: u32,
    pub alpha_vantage_requests_per_minute: u32,
    pub alpha_vantage_burst: u32,
    pub coingecko_requests_per_minute: u32,
    pub coingecko_burst: u32,
    // 收到 429 后暂停该上游的时长 (秒)
    pub backoff_after_429_secs: u64,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            finnhub_api_key: String::new(),
            alpha_vantage_api_key: String::new(),
            finnhub_base_url: "https://finnhub.io/api/v1".to_string(),
            alpha_vantage_base_url: "https://www.alphavantage.co/query".to_string(),
            coingecko_base_url: "https://api.coingecko.com/api/v3".to_string(),
            timeout_secs: 10,
            finnhub_requests_per_minute: 60,
            finnhub_burst: 10,
            alpha_vantage_requests_per_minute: 5,
            alpha_vantage_burst: 5,
            coingecko_requests_per_minute: 30,
            coingecko_burst: 5,
            backoff_after_429_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    // 容量上限，超出后按 LRU 淘汰
    pub max_entries: usize,
    // 后台清扫周期 (秒)，0 表示只做读时回收
    pub sweep_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1024,
            sweep_interval_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub on_upstream_failure: UpstreamFailurePolicy,
}
