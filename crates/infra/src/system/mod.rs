use calgate_domain::start_of_day;
use chrono::{DateTime, Utc};

// Mocking out time so that it is possible to run tests that depend on time.
pub trait ISys: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;

    /// Midnight of the current day in the local timezone.
    fn start_of_today(&self) -> DateTime<Utc> {
        start_of_day(self.now())
    }
}

/// System that gets the real time and is used when not testing
pub struct RealSys {}

impl ISys for RealSys {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
