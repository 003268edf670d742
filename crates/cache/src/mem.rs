use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use quotedeck_core::cache::error::CacheError;
use quotedeck_core::cache::port::Cache;
use quotedeck_core::common::time::{RealTimeProvider, TimeProvider};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// 默认容量上限
pub const DEFAULT_MAX_ENTRIES: usize = 1024;

/// # Summary
/// 单个缓存条目。
///
/// # Invariants
/// - `value` 写入后不可变，刷新时整体替换条目。
/// - `last_access` 为单调递增的访问序号，仅用于 LRU 淘汰。
struct Entry {
    value: Vec<u8>,
    expires_at: DateTime<Utc>,
    last_access: AtomicU64,
}

impl Entry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// # Summary
/// 基于 DashMap 的带 TTL 内存缓存实现。
///
/// # Invariants
/// - 所有操作均通过并发哈希表 `DashMap` 执行，保证多线程安全。
/// - 过期条目在读取时惰性回收，亦可由 `purge_expired` / 后台清扫回收。
/// - 条目数量不超过 `max_entries`：写入新键时先清理过期条目，仍满则淘汰最久未访问的条目。
pub struct MemCache {
    // 线程安全的 KV 存储容器
    storage: DashMap<String, Entry>,
    // 过期判断使用的时钟
    clock: Arc<dyn TimeProvider>,
    // 容量上限
    max_entries: usize,
    // 访问序号发生器
    tick: AtomicU64,
}

impl MemCache {
    /// # Summary
    /// 使用系统时钟与默认容量创建 MemCache。
    pub fn new() -> Self {
        Self::with_config(DEFAULT_MAX_ENTRIES, Arc::new(RealTimeProvider))
    }

    /// # Summary
    /// 创建一个指定容量与时钟的 MemCache 实例。
    ///
    /// # Arguments
    /// * `max_entries`: 容量上限，至少为 1。
    /// * `clock`: 过期判断使用的时钟。
    ///
    /// # Returns
    /// * `Self` - 初始化的缓存实例。
    pub fn with_config(max_entries: usize, clock: Arc<dyn TimeProvider>) -> Self {
        Self {
            storage: DashMap::new(),
            clock,
            max_entries: max_entries.max(1),
            tick: AtomicU64::new(0),
        }
    }

    /// 当前存储的条目数量 (包含尚未回收的过期条目)
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// # Summary
    /// 回收所有已过期的条目。
    ///
    /// # Returns
    /// 本次回收的条目数量。
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(self.clock.now())
    }

    fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let before = self.storage.len();
        self.storage.retain(|_, entry| entry.is_live(now));
        before.saturating_sub(self.storage.len())
    }

    fn next_tick(&self) -> u64 {
        self.tick.fetch_add(1, Ordering::Relaxed)
    }

    /// # Summary
    /// 为新键腾出空间。
    ///
    /// # Logic
    /// 1. 先回收过期条目。
    /// 2. 若仍达到上限，淘汰 `last_access` 最小的条目。
    fn make_room(&self, now: DateTime<Utc>) {
        let purged = self.purge_expired_at(now);
        if purged > 0 {
            debug!("MemCache: reclaimed {} expired entries", purged);
        }

        while self.storage.len() >= self.max_entries {
            let victim = self
                .storage
                .iter()
                .min_by_key(|e| e.value().last_access.load(Ordering::Relaxed))
                .map(|e| e.key().clone());

            match victim {
                Some(key) => {
                    debug!("MemCache: evicting least recently used key {}", key);
                    self.storage.remove(&key);
                }
                None => break,
            }
        }
    }
}

impl Default for MemCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for MemCache {
    /// # Summary
    /// 设置原始字节数据。
    ///
    /// # Logic
    /// 1. 计算过期时刻，TTL 超出可表示范围时返回 `CacheError::Storage`。
    /// 2. 新键且容量已满时先腾出空间。
    /// 3. 插入哈希表，覆盖同名键。
    async fn set_raw(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let now = self.clock.now();
        let ttl = chrono::Duration::from_std(ttl).map_err(|e| CacheError::Storage(e.to_string()))?;
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| CacheError::Storage(format!("TTL overflow for key {}", key)))?;

        if !self.storage.contains_key(key) && self.storage.len() >= self.max_entries {
            self.make_room(now);
        }

        self.storage.insert(
            key.to_string(),
            Entry {
                value,
                expires_at,
                last_access: AtomicU64::new(self.next_tick()),
            },
        );
        Ok(())
    }

    /// # Summary
    /// 获取原始字节数据。
    ///
    /// # Logic
    /// 1. 命中且未过期：刷新访问序号并返回克隆的数据。
    /// 2. 命中但已过期：移除条目并按未命中处理。
    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let now = self.clock.now();

        match self.storage.get(key) {
            None => return Ok(None),
            Some(entry) if entry.is_live(now) => {
                entry.last_access.store(self.next_tick(), Ordering::Relaxed);
                return Ok(Some(entry.value.clone()));
            }
            Some(_) => {}
        }

        // 读锁已释放，此时才能移除
        self.storage.remove_if(key, |_, entry| !entry.is_live(now));
        debug!("MemCache: lazily reclaimed expired key {}", key);
        Ok(None)
    }

    /// # Summary
    /// 删除指定键，无论键是否存在均返回 Ok。
    async fn del(&self, key: &str) -> Result<(), CacheError> {
        self.storage.remove(key);
        Ok(())
    }
}

/// # Summary
/// 启动后台清扫任务，周期性回收过期条目。
///
/// # Logic
/// 1. 仅持有缓存的弱引用，缓存被释放后任务自动退出。
/// 2. 每个周期调用一次 `purge_expired`。
///
/// # Arguments
/// * `cache`: 需要清扫的缓存。
/// * `period`: 清扫周期。
///
/// # Returns
/// 后台任务句柄。
pub fn spawn_sweeper(cache: &Arc<MemCache>, period: Duration) -> JoinHandle<()> {
    let weak: Weak<MemCache> = Arc::downgrade(cache);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // 第一个 tick 立即返回，跳过
        interval.tick().await;
        loop {
            interval.tick().await;
            let Some(cache) = weak.upgrade() else {
                debug!("MemCache sweeper: cache dropped, stopping");
                return;
            };
            let purged = cache.purge_expired();
            if purged > 0 {
                debug!("MemCache sweeper: reclaimed {} expired entries", purged);
            }
        }
    })
}
