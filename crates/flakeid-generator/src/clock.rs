use jiff::Timestamp;
use std::time::Duration;

pub trait Clock: Send + Sync {
    /// Returns the current time of the clock
    fn now(&self) -> Timestamp;
    /// Block and wait until the clock reaches the target time.
    fn wait_until(&self, target: Timestamp);
}

/// Wall clock backed by [`Timestamp::now`] and [`std::thread::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }

    fn wait_until(&self, target: Timestamp) {
        // `thread::sleep` may wake early, so re-check the clock after each sleep.
        loop {
            let now = Timestamp::now();
            if now >= target {
                return;
            }
            let remaining_ns = target.as_nanosecond() - now.as_nanosecond();
            let remaining_ns = u64::try_from(remaining_ns).unwrap_or(u64::MAX);
            std::thread::sleep(Duration::from_nanos(remaining_ns));
        }
    }
}

#[cfg(test)]
pub(crate) mod test_clock {
    use crate::clock::Clock;
    use jiff::{SignedDuration, Timestamp};
    use std::sync::{Arc, Mutex};

    /// Manually driven clock. `wait_until` jumps straight to the target and
    /// records it so tests can assert where the generator chose to wake up.
    #[derive(Clone)]
    pub(crate) struct TestClock {
        inner: Arc<Mutex<TestClockState>>,
    }

    struct TestClockState {
        now: Timestamp,
        waits: Vec<Timestamp>,
    }

    impl TestClock {
        pub(crate) fn new(now: Timestamp) -> Self {
            Self {
                inner: Arc::new(Mutex::new(TestClockState {
                    now,
                    waits: Vec::new(),
                })),
            }
        }

        pub(crate) fn set(&self, now: Timestamp) {
            self.state().now = now;
        }

        pub(crate) fn advance(&self, by: SignedDuration) {
            let mut state = self.state();
            state.now = state
                .now
                .checked_add(by)
                .expect("test clock advanced out of range");
        }

        pub(crate) fn waits(&self) -> Vec<Timestamp> {
            self.state().waits.clone()
        }

        fn state(&self) -> std::sync::MutexGuard<'_, TestClockState> {
            self.inner
                .lock()
                .expect("test clock lock should not be poisoned")
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> Timestamp {
            self.state().now
        }

        fn wait_until(&self, target: Timestamp) {
            let mut state = self.state();
            state.waits.push(target);
            if target > state.now {
                state.now = target;
            }
        }
    }

    #[test]
    fn test_clock_works() {
        let base = Timestamp::from_second(0).unwrap();
        let clock = TestClock::new(base);
        assert_eq!(clock.now(), base);

        let target = Timestamp::from_second(1000).unwrap();
        clock.wait_until(target);
        assert_eq!(clock.now(), target);
        assert_eq!(clock.waits(), vec![target]);

        clock.advance(SignedDuration::from_millis(10));
        assert_eq!(clock.now().as_millisecond(), 1_000_010);

        clock.set(base);
        assert_eq!(clock.now(), base);
    }

    #[test]
    fn system_clock_waits_until_target() {
        use super::SystemClock;

        let clock = SystemClock;
        let target = clock
            .now()
            .checked_add(SignedDuration::from_millis(20))
            .unwrap();
        clock.wait_until(target);
        assert!(clock.now() >= target);
    }
}
