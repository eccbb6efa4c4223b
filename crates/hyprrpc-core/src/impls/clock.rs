//! Clock implementations.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Instant;

use chrono::Utc;

use crate::ports::Clock;

const SECONDS_PER_DAY: i64 = 86_400;

/// SystemClock は本番用
///
/// `monotonic_ms()` は clock 作成時点からの経過ミリ秒です。
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn monotonic_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn epoch_day(&self) -> i64 {
        Utc::now().timestamp().div_euclid(SECONDS_PER_DAY)
    }
}

/// ManualClock はテスト用（明示的に進めない限り止まっている）
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicU64,
    epoch_day: AtomicI64,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(start_ms),
            epoch_day: AtomicI64::new(0),
        }
    }

    pub fn advance_ms(&self, ms: u64) {
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn set_epoch_day(&self, day: i64) {
        self.epoch_day.store(day, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn monotonic_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }

    fn epoch_day(&self) -> i64 {
        self.epoch_day.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.monotonic_ms();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = clock.monotonic_ms();
        assert!(b >= a);
    }

    #[test]
    fn system_clock_epoch_day_is_after_2024() {
        // 2024-01-01 is day 19723
        assert!(SystemClock::new().epoch_day() > 19_723);
    }

    #[test]
    fn manual_clock_only_moves_when_told() {
        let clock = ManualClock::new(100);
        assert_eq!(clock.monotonic_ms(), 100);
        clock.advance_ms(50);
        assert_eq!(clock.monotonic_ms(), 150);
        clock.set_epoch_day(42);
        assert_eq!(clock.epoch_day(), 42);
    }
}
