//! # `quotedeck-api` - HTTP API 网关
//!
//! 使用 `axum` 构建路由，通过 `utoipa` 自动生成 OpenAPI 3.0 文档。
//!
//! ## 架构职责
//! - 接收来自仪表盘前端的只读 GET 请求
//! - 调用 `quotedeck-market` 的聚合服务
//! - 成功时直接返回载荷本身 (无外层包裹)，失败时返回 `{success: false, error}`

pub mod error;
pub mod routes;
pub mod server;
pub mod types;
