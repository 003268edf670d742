//! # `quotedeck-cache` - 缓存存储实现
//!
//! - [`mem::MemCache`]: 实现 `Cache` 端口的 TTL + LRU 内存缓存。
//! - [`flight::FlightGroup`]: 按键合并并发未命中的 single-flight 协调器。

pub mod flight;
pub mod mem;
