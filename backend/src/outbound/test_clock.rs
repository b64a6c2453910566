//! Manually advanced clock for adapter tests.

use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use mockable::Clock;

/// A [`Clock`] whose time only moves when a test advances it.
pub(crate) struct TestClock {
    now: Mutex<DateTime<Utc>>,
}

impl TestClock {
    /// Start the clock at a fixed instant.
    pub fn new() -> Self {
        Self {
            now: Mutex::new(
                DateTime::from_timestamp(1_700_000_000, 0).expect("valid timestamp"),
            ),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock lock");
        *now += chrono::Duration::from_std(by).expect("in-range duration");
    }
}

impl Clock for TestClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock")
    }
}
