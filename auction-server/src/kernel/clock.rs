use {
    std::{
        fmt::Debug,
        sync::Arc,
        time::Duration,
    },
    time::OffsetDateTime,
};

/// Less than this much time left on a window counts as the closing ("final")
/// window; a bid landing inside it pushes the end time out.
pub const FINAL_WINDOW: Duration = Duration::from_secs(60);
/// Less than this much time left counts as the last day of an auction.
pub const LAST_DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Time source capability. Every time-sensitive operation reads the clock
/// through this trait so tests can simulate races deterministically.
pub trait Clock: Debug + Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

pub type SharedClock = Arc<dyn Clock>;

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Time left until `end`, saturating at zero.
pub fn remaining(now: OffsetDateTime, end: OffsetDateTime) -> Duration {
    if now >= end {
        Duration::ZERO
    } else {
        (end - now).unsigned_abs()
    }
}

pub fn is_expired(now: OffsetDateTime, end: OffsetDateTime) -> bool {
    now >= end
}

pub fn is_last_day(now: OffsetDateTime, end: OffsetDateTime) -> bool {
    !is_expired(now, end) && remaining(now, end) < LAST_DAY
}

/// Settable clock for tests.
#[cfg(test)]
pub mod test {
    use {
        super::*,
        std::sync::Mutex,
    };

    #[derive(Debug)]
    pub struct ManualClock(Mutex<OffsetDateTime>);

    impl ManualClock {
        pub fn new(now: OffsetDateTime) -> Arc<Self> {
            Arc::new(Self(Mutex::new(now)))
        }

        pub fn set(&self, now: OffsetDateTime) {
            *self.0.lock().expect("clock lock poisoned") = now;
        }

        pub fn advance(&self, by: Duration) {
            let mut guard = self.0.lock().expect("clock lock poisoned");
            *guard += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> OffsetDateTime {
            *self.0.lock().expect("clock lock poisoned")
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        time::macros::datetime,
    };

    #[test]
    fn remaining_saturates_at_zero() {
        let end = datetime!(2025-06-01 12:00:00 UTC);
        assert_eq!(
            remaining(datetime!(2025-06-01 11:59:10 UTC), end),
            Duration::from_secs(50)
        );
        assert_eq!(remaining(end, end), Duration::ZERO);
        assert_eq!(remaining(datetime!(2025-06-01 12:00:01 UTC), end), Duration::ZERO);
    }

    #[test]
    fn expiry_is_inclusive_of_the_end_instant() {
        let end = datetime!(2025-06-01 12:00:00 UTC);
        assert!(!is_expired(datetime!(2025-06-01 11:59:59 UTC), end));
        assert!(is_expired(end, end));
        assert!(is_expired(datetime!(2025-06-01 12:00:01 UTC), end));
    }

    #[test]
    fn final_window_is_strictly_under_sixty_seconds() {
        let end = datetime!(2025-06-01 12:00:00 UTC);
        assert!(remaining(datetime!(2025-06-01 11:59:00 UTC), end) >= FINAL_WINDOW);
        assert!(remaining(datetime!(2025-06-01 11:59:01 UTC), end) < FINAL_WINDOW);
    }

    #[test]
    fn last_day_threshold() {
        let end = datetime!(2025-06-02 12:00:00 UTC);
        assert!(!is_last_day(datetime!(2025-06-01 11:00:00 UTC), end));
        assert!(is_last_day(datetime!(2025-06-01 13:00:00 UTC), end));
        assert!(!is_last_day(datetime!(2025-06-02 12:00:00 UTC), end));
    }
}
