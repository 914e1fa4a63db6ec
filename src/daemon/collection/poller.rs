use std::{sync::Arc, time::Duration};

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{error, trace};

use crate::{activity::ActivityHub, input_api::IdleTimeProvider, utils::clock::Clock};

use super::input::InputDetector;

/// Turns OS idle time readings into activity signals on the hub.
pub struct ActivityPoller {
    hub: Arc<ActivityHub>,
    provider: Box<dyn IdleTimeProvider>,
    shutdown: CancellationToken,
    detector: InputDetector,
    poll_interval: Duration,
    time_provider: Box<dyn Clock>,
}

impl ActivityPoller {
    pub fn new(
        hub: Arc<ActivityHub>,
        provider: Box<dyn IdleTimeProvider>,
        shutdown: CancellationToken,
        poll_interval: Duration,
        time_provider: Box<dyn Clock>,
    ) -> Self {
        let interval_ms = u32::try_from(poll_interval.as_millis()).unwrap_or(u32::MAX);
        Self {
            hub,
            provider,
            shutdown,
            detector: InputDetector::new(interval_ms),
            poll_interval,
            time_provider,
        }
    }

    fn poll(&mut self) -> Result<bool> {
        let idle_ms = self.provider.idle_time()?;
        trace!("User idle for {idle_ms}ms");
        Ok(self.detector.observe(idle_ms))
    }

    /// Executes the polling loop until shutdown is requested.
    pub async fn run(mut self) -> Result<()> {
        let mut poll_point = self.time_provider.instant();
        loop {
            poll_point += self.poll_interval;

            match self.poll() {
                Ok(true) => self.hub.emit(),
                Ok(false) => (),
                Err(e) => {
                    error!("Encountered an error while reading idle time {:?}", e)
                }
            }

            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    return Ok(())
                }
                _ = self.time_provider.sleep_until(poll_point) => ()
            }
        }
    }
}
