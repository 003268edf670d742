//! 图表上游不可用时使用的合成日 K 线。

use chrono::{DateTime, Duration, Utc};
use quotedeck_core::market::entity::ChartPoint;
use rand::Rng;

/// 合成序列的天数
pub const FALLBACK_DAYS: usize = 30;

const SECONDS_PER_DAY: i64 = 86_400;

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// [-half, half) 内均匀取值
fn jitter<R: Rng>(rng: &mut R, half: f64) -> f64 {
    (rng.random::<f64>() * 2.0 - 1.0) * half
}

/// # Summary
/// 生成以 `now` 结尾、每日一根的随机游走 K 线。
///
/// # Logic
/// 1. 基准价在 [100, 500) 内均匀取值，波动率为当前基准价的 2%。
/// 2. 首根开盘价 = 基准价 ± 波动率/2；其后每根开盘价等于上一根收盘价。
/// 3. 收盘价 = 开盘价 ± 波动率/2；最高/最低在开收盘两端外扩 [0, 波动率/2)。
/// 4. 价格保留两位小数，成交量在 [1,000,000, 6,000,000) 内均匀取值。
///
/// # Arguments
/// * `now`: 序列最后一根 K 线的时间。
/// * `days`: K 线数量。
/// * `rng`: 随机源，测试中可注入固定种子。
///
/// # Returns
/// 按时间严格升序的 K 线列表。
///
/// # Invariants
/// - `low <= min(open, close)` 且 `high >= max(open, close)`。
/// - `open[i] == close[i - 1]`。
pub fn daily_candles<R: Rng>(
    now: DateTime<Utc>,
    days: usize,
    rng: &mut R,
) -> Vec<ChartPoint> {
    let mut points = Vec::with_capacity(days);
    let mut base: f64 = rng.random_range(100.0..500.0);
    let mut previous_close: Option<f64> = None;

    for day in (0..days).rev() {
        let offset = i64::try_from(day).unwrap_or(i64::MAX / SECONDS_PER_DAY);
        let time = (now - Duration::days(offset)).timestamp();
        let half = base * 0.02 / 2.0;

        let open = match previous_close {
            Some(close) => close,
            None => round_cents(base + jitter(rng, half)),
        };
        let close = round_cents(open + jitter(rng, half));
        let high = round_cents(open.max(close) + rng.random::<f64>() * half);
        let low = round_cents(open.min(close) - rng.random::<f64>() * half);
        let volume = rng.random_range(1_000_000..6_000_000);

        points.push(ChartPoint {
            time,
            open,
            high,
            low,
            close,
            volume,
        });

        previous_close = Some(close);
        base = close;
    }

    points
}
