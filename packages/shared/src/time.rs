//! Time-related utilities with clock abstraction for testability.
//!
//! Logical time in Tandem is expressed as `f64` seconds since the Unix epoch.
//! Server bookkeeping (join and creation times) uses integer milliseconds.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, SecondsFormat, Utc};

/// Clock trait for dependency injection and testing
pub trait Clock: Send + Sync {
    /// Current Unix time in seconds (microsecond resolution)
    fn now_secs(&self) -> f64;
}

/// System clock implementation (uses actual system time)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> f64 {
        micros_to_secs(Utc::now().timestamp_micros())
    }
}

/// Fixed clock implementation for testing (returns a fixed time)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    fixed_time: f64,
}

impl FixedClock {
    /// Create a new fixed clock with the given time in seconds
    pub fn new(fixed_time_secs: f64) -> Self {
        Self {
            fixed_time: fixed_time_secs,
        }
    }
}

impl Clock for FixedClock {
    fn now_secs(&self) -> f64 {
        self.fixed_time
    }
}

/// Manually driven clock for tests that need time to pass.
///
/// Stored as integer microseconds so that repeated `advance` calls do not
/// accumulate floating point error.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_micros: AtomicI64,
}

impl ManualClock {
    /// Create a manual clock starting at `start_secs`
    pub fn new(start_secs: f64) -> Self {
        Self {
            now_micros: AtomicI64::new(secs_to_micros(start_secs)),
        }
    }

    /// Jump to an absolute time
    pub fn set(&self, secs: f64) {
        self.now_micros.store(secs_to_micros(secs), Ordering::SeqCst);
    }

    /// Move the clock forward (or backward for negative values)
    pub fn advance(&self, secs: f64) {
        self.now_micros
            .fetch_add(secs_to_micros(secs), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> f64 {
        micros_to_secs(self.now_micros.load(Ordering::SeqCst))
    }
}

/// Get current Unix timestamp (milliseconds)
pub fn get_timestamp_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert Unix timestamp (milliseconds) to UTC RFC 3339 format
///
/// Timestamps outside chrono's representable range are rendered as the raw number.
pub fn timestamp_to_rfc3339(timestamp_millis: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(timestamp_millis) {
        Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
        None => timestamp_millis.to_string(),
    }
}

fn micros_to_secs(micros: i64) -> f64 {
    micros as f64 / 1_000_000.0
}

fn secs_to_micros(secs: f64) -> i64 {
    (secs * 1_000_000.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_returns_non_zero_time() {
        // テスト項目: SystemClock が 0 以外の時刻を返す
        // given (前提条件):
        let clock = SystemClock;

        // when (操作):
        let now = clock.now_secs();

        // then (期待する結果):
        assert!(now > 0.0);
    }

    #[test]
    fn test_system_clock_returns_increasing_time() {
        // テスト項目: SystemClock が呼び出すたびに増加する時刻を返す
        // given (前提条件):
        let clock = SystemClock;

        // when (操作):
        let t1 = clock.now_secs();
        std::thread::sleep(std::time::Duration::from_millis(10));
        let t2 = clock.now_secs();

        // then (期待する結果):
        assert!(t2 >= t1);
    }

    #[test]
    fn test_fixed_clock_returns_fixed_time() {
        // テスト項目: FixedClock が複数回呼び出しても同じ時刻を返す
        // given (前提条件):
        let clock = FixedClock::new(1234.5);

        // when (操作):
        let t1 = clock.now_secs();
        let t2 = clock.now_secs();

        // then (期待する結果):
        assert_eq!(t1, 1234.5);
        assert_eq!(t2, 1234.5);
    }

    #[test]
    fn test_manual_clock_advance_and_set() {
        // テスト項目: ManualClock は advance で進み、set で指定時刻に移動する
        // given (前提条件):
        let clock = ManualClock::new(1000.0);

        // when (操作):
        clock.advance(0.25);
        let advanced = clock.now_secs();
        clock.set(42.0);
        let jumped = clock.now_secs();

        // then (期待する結果):
        assert!((advanced - 1000.25).abs() < 1e-9);
        assert_eq!(jumped, 42.0);
    }

    #[test]
    fn test_manual_clock_many_small_steps_do_not_drift() {
        // テスト項目: 細かい advance を繰り返しても誤差が蓄積しない
        // given (前提条件):
        let clock = ManualClock::new(0.0);

        // when (操作):
        for _ in 0..1000 {
            clock.advance(0.001);
        }

        // then (期待する結果):
        assert_eq!(clock.now_secs(), 1.0);
    }

    #[test]
    fn test_timestamp_to_rfc3339_format() {
        // テスト項目: タイムスタンプが UTC の RFC 3339 形式に変換される
        // given (前提条件):
        // 2023-01-01 00:00:00.123 UTC in milliseconds
        let timestamp = 1672531200123;

        // when (操作):
        let result = timestamp_to_rfc3339(timestamp);

        // then (期待する結果):
        assert_eq!(result, "2023-01-01T00:00:00.123Z");
    }

    #[test]
    fn test_timestamp_to_rfc3339_out_of_range() {
        // テスト項目: 範囲外のタイムスタンプは数値のまま表示される
        // given (前提条件):
        let timestamp = i64::MAX;

        // when (操作):
        let result = timestamp_to_rfc3339(timestamp);

        // then (期待する結果):
        assert_eq!(result, i64::MAX.to_string());
    }

    #[test]
    fn test_get_timestamp_millis_returns_positive_value() {
        // テスト項目: get_timestamp_millis が正の値を返す
        // given (前提条件):

        // when (操作):
        let timestamp = get_timestamp_millis();

        // then (期待する結果):
        assert!(timestamp > 0);
    }
}
