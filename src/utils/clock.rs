use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use tokio::time::Instant;

/// Represents an entity responsible for providing dates across application. This can allow it to
/// be used for testing
#[async_trait]
pub trait Clock: Sync + Send + 'static {
    fn time(&self) -> DateTime<Utc>;

    fn instant(&self) -> Instant;

    /// Offset of the local timezone in minutes, following the browser `getTimezoneOffset`
    /// convention: UTC minus local time. A machine at UTC+2 yields `-120`.
    fn timezone_offset_minutes(&self) -> i32;

    async fn sleep_until(&self, instant: tokio::time::Instant);
}

pub struct DefaultClock;

#[async_trait]
impl Clock for DefaultClock {
    fn time(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }

    fn timezone_offset_minutes(&self) -> i32 {
        -Local::now().offset().local_minus_utc() / 60
    }

    async fn sleep_until(&self, instant: tokio::time::Instant) {
        tokio::time::sleep_until(instant).await;
    }
}

#[cfg(test)]
pub mod test_clock {
    use std::{
        sync::{
            atomic::{AtomicI64, Ordering},
            Arc,
        },
    };

    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use tokio::time::Instant;

    use super::Clock;

    /// Clock with a manually driven wall time. Sleeping still goes through tokio so paused
    /// runtimes can advance it.
    #[derive(Clone)]
    pub struct ManualClock {
        millis: Arc<AtomicI64>,
        offset_minutes: i32,
    }

    impl ManualClock {
        pub fn new(millis: i64, offset_minutes: i32) -> Self {
            Self {
                millis: Arc::new(AtomicI64::new(millis)),
                offset_minutes,
            }
        }

        pub fn set_millis(&self, millis: i64) {
            self.millis.store(millis, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl Clock for ManualClock {
        fn time(&self) -> DateTime<Utc> {
            Utc.timestamp_millis_opt(self.millis.load(Ordering::SeqCst))
                .unwrap()
        }

        fn instant(&self) -> Instant {
            Instant::now()
        }

        fn timezone_offset_minutes(&self) -> i32 {
            self.offset_minutes
        }

        async fn sleep_until(&self, instant: tokio::time::Instant) {
            tokio::time::sleep_until(instant).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Local;

    use super::{Clock, DefaultClock};

    #[test]
    fn default_offset_matches_local_timezone() {
        let expected = -Local::now().offset().local_minus_utc() / 60;
        assert_eq!(DefaultClock.timezone_offset_minutes(), expected);
    }
}
