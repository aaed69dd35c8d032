use crate::core::{Clock, SystemClock};
use crate::utils::error::{ProbeError, Result};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

pub const DEFAULT_WINDOW: Duration = Duration::from_secs(5);

/// Per-caller cooldown. Every allowed call restarts the caller's window.
///
/// Entries are never evicted; the map grows with the number of distinct callers.
pub struct RateLimiter<C: Clock = SystemClock> {
    window: Duration,
    clock: C,
    last_request: Mutex<HashMap<String, Instant>>,
}

impl RateLimiter<SystemClock> {
    pub fn new(window: Duration) -> Self {
        Self::with_clock(window, SystemClock)
    }
}

impl Default for RateLimiter<SystemClock> {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl<C: Clock> RateLimiter<C> {
    pub fn with_clock(window: Duration, clock: C) -> Self {
        Self {
            window,
            clock,
            last_request: Mutex::new(HashMap::new()),
        }
    }

    pub fn allow(&self, caller: &str) -> bool {
        self.check(caller).is_ok()
    }

    /// 檢查與更新在同一把鎖內完成
    pub fn check(&self, caller: &str) -> Result<()> {
        let now = self.clock.now();
        let mut last_request = self.entries();

        let elapsed = last_request
            .get(caller)
            .map(|last| now.saturating_duration_since(*last));

        match elapsed {
            Some(elapsed) if elapsed <= self.window => {
                let retry_after = self.window - elapsed;
                tracing::warn!("⏳ Caller {} rate limited for {:?}", caller, retry_after);
                Err(ProbeError::RateLimited {
                    caller: caller.to_string(),
                    retry_after,
                })
            }
            _ => {
                last_request.insert(caller.to_string(), now);
                Ok(())
            }
        }
    }

    pub fn tracked_callers(&self) -> usize {
        self.entries().len()
    }

    /// 鎖被毒化時仍沿用既有資料
    fn entries(&self) -> MutexGuard<'_, HashMap<String, Instant>> {
        self.last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Clone)]
    struct ManualClock {
        now: Arc<Mutex<Instant>>,
    }

    impl ManualClock {
        fn new() -> Self {
            Self {
                now: Arc::new(Mutex::new(Instant::now())),
            }
        }

        fn advance(&self, by: Duration) {
            *self.now.lock().unwrap() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            *self.now.lock().unwrap()
        }
    }

    #[test]
    fn test_first_call_allowed_then_blocked_within_window() {
        let clock = ManualClock::new();
        let limiter = RateLimiter::with_clock(Duration::from_secs(5), clock.clone());

        assert!(limiter.allow("user-1"));
        clock.advance(Duration::from_secs(2));
        assert!(!limiter.allow("user-1"));
    }

    #[test]
    fn test_allowed_after_window_and_window_resets() {
        let clock = ManualClock::new();
        let limiter = RateLimiter::with_clock(Duration::from_secs(5), clock.clone());

        assert!(limiter.allow("user-1"));
        clock.advance(Duration::from_millis(5_001));
        assert!(limiter.allow("user-1"));
        assert!(!limiter.allow("user-1"));
    }

    #[test]
    fn test_exactly_window_is_still_blocked() {
        let clock = ManualClock::new();
        let limiter = RateLimiter::with_clock(Duration::from_secs(5), clock.clone());

        assert!(limiter.allow("user-1"));
        clock.advance(Duration::from_secs(5));
        assert!(!limiter.allow("user-1"));
    }

    #[test]
    fn test_rejected_call_does_not_extend_window() {
        let clock = ManualClock::new();
        let limiter = RateLimiter::with_clock(Duration::from_secs(5), clock.clone());

        assert!(limiter.allow("user-1"));
        clock.advance(Duration::from_secs(4));
        assert!(!limiter.allow("user-1"));
        clock.advance(Duration::from_secs(2));
        assert!(limiter.allow("user-1"));
    }

    #[test]
    fn test_callers_are_independent() {
        let clock = ManualClock::new();
        let limiter = RateLimiter::with_clock(Duration::from_secs(5), clock);

        assert!(limiter.allow("user-1"));
        assert!(limiter.allow("user-2"));
        assert!(!limiter.allow("user-1"));
        assert_eq!(limiter.tracked_callers(), 2);
    }

    #[test]
    fn test_state_survives_poisoned_lock() {
        let clock = ManualClock::new();
        let limiter = Arc::new(RateLimiter::with_clock(Duration::from_secs(5), clock));
        assert!(limiter.allow("user-1"));

        let poisoner = Arc::clone(&limiter);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.last_request.lock().unwrap();
            panic!("holder panicked");
        })
        .join();

        assert!(limiter.last_request.is_poisoned());
        assert_eq!(limiter.tracked_callers(), 1);
        assert!(!limiter.allow("user-1"));
        assert!(limiter.allow("user-2"));
        assert_eq!(limiter.tracked_callers(), 2);
    }

    #[test]
    fn test_check_reports_retry_after() {
        let clock = ManualClock::new();
        let limiter = RateLimiter::with_clock(Duration::from_secs(5), clock.clone());

        limiter.check("user-1").unwrap();
        clock.advance(Duration::from_secs(3));

        match limiter.check("user-1") {
            Err(ProbeError::RateLimited { retry_after, .. }) => {
                assert_eq!(retry_after, Duration::from_secs(2))
            }
            other => panic!("expected rate limit, got {:?}", other),
        }
    }
}
