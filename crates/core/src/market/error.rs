use thiserror::Error;

/// # Summary
/// 市场数据域错误枚举，覆盖限流、网络、解析及数据缺失等上游故障。
///
/// # Invariants
/// - 必须通过 `thiserror` 派生 `Error` trait。
/// - 超时与网络错误在降级策略中与其他上游故障同等处理。
#[derive(Error, Debug)]
pub enum MarketError {
    // 上游返回限流信号 (HTTP 429 或等价的业务标记)，或本地配额已耗尽
    #[error("Rate limited: {provider}")]
    RateLimited { provider: String },
    // 上游请求超时
    #[error("Timeout: {provider}")]
    Timeout { provider: String },
    // 网络层错误，包含底层 HTTP 客户端错误信息
    #[error("Network error: {0}")]
    Network(String),
    // 上游返回非成功状态码
    #[error("HTTP {status} from {provider}")]
    Http { provider: String, status: u16 },
    // 数据解析错误，如 JSON 格式不匹配或缺少字段
    #[error("Parse error: {0}")]
    Parse(String),
    // 请求的数据未找到
    #[error("Data not found")]
    NotFound,
}

impl MarketError {
    /// 是否为限流类错误
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, MarketError::RateLimited { .. })
    }
}
