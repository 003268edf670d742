use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// # Summary
/// 按键合并并发上游请求的协调器 (single-flight)。
///
/// # Invariants
/// - 同一个键同一时刻至多存在一个存活的 `FlightGuard`。
/// - 没有任何调用方持有或等待某个键时，该键的锁会从表中移除。
#[derive(Default)]
pub struct FlightGroup {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl FlightGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Summary
    /// 获取某个键的独占执行权。
    ///
    /// # Logic
    /// 1. 取出 (或创建) 该键对应的异步互斥锁。
    /// 2. 等待锁释放后返回守卫；调用方应在持有守卫时重新检查缓存。
    ///
    /// # Arguments
    /// * `key`: 逻辑请求的缓存键。
    ///
    /// # Returns
    /// 守卫被 drop 时释放执行权。
    pub async fn acquire(&self, key: &str) -> FlightGuard<'_> {
        let lock = self
            .locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = lock.clone().lock_owned().await;

        FlightGuard {
            group: self,
            key: key.to_string(),
            lock: Some(lock),
            guard: Some(guard),
        }
    }

    /// 当前登记的键数量 (持有或等待中)
    pub fn in_flight(&self) -> usize {
        self.locks.len()
    }
}

/// # Summary
/// 单个键的执行权守卫。
pub struct FlightGuard<'a> {
    group: &'a FlightGroup,
    key: String,
    lock: Option<Arc<Mutex<()>>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        self.lock.take();
        // 只剩表内一份引用时说明无人等待
        self.group
            .locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}
