pub mod time;

/// # Summary
/// 规范化证券代码：去除首尾空白并转为大写。
///
/// # Arguments
/// * `symbol`: 请求中携带的原始代码。
///
/// # Returns
/// 规范化后的代码，用于缓存键与上游请求。
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// # Summary
/// 为 rustls 安装进程级加密提供者 (ring)。
///
/// # Logic
/// 1. reqwest 以 `rustls-no-provider` 方式编译，构建客户端前必须先安装提供者。
/// 2. 重复安装会返回 Err，此时说明已有提供者，直接忽略。
pub fn install_crypto_provider() {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        tracing::trace!("rustls crypto provider already installed");
    }
}
