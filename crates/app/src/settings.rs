//! 分层配置加载：内置默认值 < 配置文件 < `QUOTEDECK__` 环境变量。

use std::collections::HashMap;

use config::{Config, ConfigError, Environment, File};
use quotedeck_core::config::AppConfig;

/// 默认配置文件 (扩展名由 `config` 自动识别)，不存在时忽略
pub const DEFAULT_CONFIG_FILE: &str = "config/quotedeck";

const ENV_PREFIX: &str = "QUOTEDECK";

/// 约定俗成的 API Key 环境变量，优先级低于配置文件与带前缀的变量
const API_KEY_VARS: [(&str, &str); 2] = [
    ("FINNHUB_API_KEY", "providers.finnhub_api_key"),
    ("ALPHA_VANTAGE_API_KEY", "providers.alpha_vantage_api_key"),
];

/// # Summary
/// 加载应用配置。
///
/// # Logic
/// 1. 以约定的 API Key 变量作为对应键的默认值。
/// 2. 叠加可选的配置文件。
/// 3. 叠加 `QUOTEDECK__SECTION__KEY` 形式的环境变量。
/// 4. 反序列化为 `AppConfig`，未出现的字段取结构体默认值。
///
/// # Arguments
/// * `file`: 配置文件路径。
/// * `env`: 环境变量来源，`None` 表示读取进程环境。
///
/// # Returns
/// 合并后的配置。
pub fn load(file: &str, env: Option<HashMap<String, String>>) -> Result<AppConfig, ConfigError> {
    let vars: HashMap<String, String> = env.unwrap_or_else(|| std::env::vars().collect());

    let mut builder = Config::builder();
    for (var, key) in API_KEY_VARS {
        if let Some(value) = vars.get(var) {
            builder = builder.set_default(key, value.as_str())?;
        }
    }

    builder
        .add_source(File::with_name(file).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .source(Some(vars)),
        )
        .build()?
        .try_deserialize()
}
