//! 单个上游共享的令牌桶限流器。
//!
//! 桶容量为 `burst_capacity`，按 `requests_per_minute / 60` 每秒补充令牌。
//! 上游返回限流信号后清空令牌并暂停 `backoff_after_429`。

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

/// # Summary
/// 单个上游的限流参数。
#[derive(Clone, Debug)]
pub struct RateLimitConfig {
    /// 每分钟持续请求上限
    pub requests_per_minute: u32,
    /// 突发容量
    pub burst_capacity: u32,
    /// 收到 429 后的暂停时长
    pub backoff_after_429: Duration,
}

impl RateLimitConfig {
    pub fn new(requests_per_minute: u32, burst_capacity: u32, backoff_after_429: Duration) -> Self {
        Self {
            requests_per_minute,
            burst_capacity,
            backoff_after_429,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::new(60, 10, Duration::from_secs(10))
    }
}

#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
    // 每秒补充的令牌数
    rate: f64,
    capacity: f64,
    paused_until: Option<Instant>,
}

impl TokenBucket {
    fn new(config: &RateLimitConfig) -> Self {
        let capacity = f64::from(config.burst_capacity.max(1));
        Self {
            tokens: capacity,
            last_update: Instant::now(),
            rate: f64::from(config.requests_per_minute.max(1)) / 60.0,
            capacity,
            paused_until: None,
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate).min(self.capacity);
        self.last_update = now;
    }

    fn is_paused(&mut self) -> bool {
        match self.paused_until {
            Some(until) if Instant::now() < until => true,
            Some(_) => {
                self.paused_until = None;
                false
            }
            None => false,
        }
    }

    fn try_acquire(&mut self) -> bool {
        self.refill();
        if self.is_paused() {
            return false;
        }
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn time_until_available(&mut self) -> Duration {
        self.refill();
        if let Some(until) = self.paused_until {
            let now = Instant::now();
            if now < until {
                return until - now;
            }
        }
        if self.tokens >= 1.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64((1.0 - self.tokens) / self.rate)
        }
    }
}

/// # Summary
/// 令牌桶限流器，同一客户端的所有调用共享。
///
/// # Invariants
/// - 令牌数始终位于 `[0, burst_capacity]`。
/// - 暂停期间 `try_acquire` 一律失败，`acquire` 等待至暂停结束。
pub struct RateLimiter {
    provider: &'static str,
    config: RateLimitConfig,
    bucket: Mutex<TokenBucket>,
}

impl RateLimiter {
    pub fn new(provider: &'static str, config: RateLimitConfig) -> Self {
        let bucket = Mutex::new(TokenBucket::new(&config));
        Self {
            provider,
            config,
            bucket,
        }
    }

    // 锁中毒时直接恢复，最多导致节奏略有偏差
    fn lock_bucket(&self) -> MutexGuard<'_, TokenBucket> {
        self.bucket.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter bucket for '{}' was poisoned, recovering", self.provider);
            poisoned.into_inner()
        })
    }

    /// # Summary
    /// 异步等待直到取得一个令牌。
    ///
    /// # Logic
    /// 1. 尝试取令牌，成功立即返回。
    /// 2. 否则计算到下一个令牌 (或暂停结束) 的时间并休眠，然后重试。
    pub async fn acquire(&self) {
        loop {
            let wait_time = {
                let mut bucket = self.lock_bucket();
                if bucket.try_acquire() {
                    return;
                }
                bucket.time_until_available()
            };

            debug!(
                "Rate limiter: waiting {:?} for provider '{}'",
                wait_time, self.provider
            );
            // 浮点误差可能算出 0，至少休眠 1ms
            tokio::time::sleep(wait_time.max(Duration::from_millis(1))).await;
        }
    }

    /// 非阻塞取令牌，配额耗尽或处于暂停期时返回 `false`
    pub fn try_acquire(&self) -> bool {
        self.lock_bucket().try_acquire()
    }

    /// 清空令牌并按配置的退避时长暂停
    pub fn backoff(&self) {
        self.backoff_for(self.config.backoff_after_429);
    }

    /// # Summary
    /// 清空令牌并暂停指定时长。
    ///
    /// # Arguments
    /// * `pause`: 暂停时长，期间所有调用方等待。
    pub fn backoff_for(&self, pause: Duration) {
        warn!(
            "Rate limiter: provider '{}' throttled us, backing off for {:?}",
            self.provider, pause
        );
        let mut bucket = self.lock_bucket();
        bucket.refill();
        bucket.tokens = 0.0;
        bucket.paused_until = Some(Instant::now() + pause);
    }

    /// 补充后的剩余令牌数
    pub fn remaining_tokens(&self) -> f64 {
        let mut bucket = self.lock_bucket();
        bucket.refill();
        bucket.tokens
    }
}
