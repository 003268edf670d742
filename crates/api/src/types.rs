//! # 请求参数与错误响应结构
//!
//! 成功响应直接使用 `quotedeck-core` 中的实体 (已派生 `ToSchema`)，这里只定义查询参数与错误体。

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 证券搜索参数
#[derive(Debug, Deserialize, ToSchema)]
pub struct SearchQuery {
    /// 搜索关键字，缺失时返回 400
    pub q: Option<String>,
}

/// 图表参数
#[derive(Debug, Deserialize, ToSchema)]
pub struct ChartQuery {
    /// 周期标记，默认 `1D`，未知值按 `5min` 处理
    pub interval: Option<String>,
}

/// 新闻参数
#[derive(Debug, Deserialize, ToSchema)]
pub struct NewsQuery {
    /// 新闻分类，默认 `general`
    pub category: Option<String>,
}

/// 失败响应体
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// 固定为 false
    pub success: bool,
    /// 错误描述信息
    pub error: String,
}

impl ApiErrorResponse {
    /// 从错误信息构建
    pub fn from_msg(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: msg.into(),
        }
    }
}
