use std::sync::Mutex;

use chrono::{DateTime, Datelike, Timelike, Utc};

type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Generates order ids laid out as `YYMMDDHH` followed by a process-lifetime
/// counter padded to four digits.
///
/// The counter is never reset or persisted: ids are unique within one running
/// process only. Past 9999 the counter simply adds digits.
pub struct OrderIdGenerator {
    counter: Mutex<u64>,
    clock: Clock,
}

impl Default for OrderIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderIdGenerator {
    pub fn new() -> Self {
        Self::with_clock(Utc::now)
    }

    pub fn with_clock<F>(clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        Self {
            counter: Mutex::new(0),
            clock: Box::new(clock),
        }
    }

    #[cfg(test)]
    pub(crate) fn starting_at(self, counter: u64) -> Self {
        Self {
            counter: Mutex::new(counter),
            ..self
        }
    }

    /// Returns `0` when the id cannot be produced; callers must treat that as
    /// a failure.
    pub fn next_order_id(&self) -> i64 {
        let mut counter = match self.counter.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let now = (self.clock)();
        *counter += 1;

        let raw = format!(
            "{:02}{:02}{:02}{:02}{:04}",
            now.year() % 100,
            now.month(),
            now.day(),
            now.hour(),
            *counter
        );

        match raw.parse::<i64>() {
            Ok(id) => id,
            Err(e) => {
                log::error!("Failed to convert order id '{}' to i64: {}", raw, e);
                0
            }
        }
    }
}
