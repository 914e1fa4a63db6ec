use std::{
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::{runtime::Handle, task::JoinHandle};
use tokio_util::task::TaskTracker;
use tracing::{debug, info, trace, warn};

use crate::{client::ConnectivityReporter, utils::clock::Clock};

pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60);

/// Forwards activity to the reporter at most once per cooldown window. The window starts at the
/// last dispatched ping, no matter how often activity arrives in between.
pub struct ActivityGate {
    /// Epoch milliseconds of the last dispatched ping, 0 until the first one.
    last_activity_ms: AtomicI64,
    cooldown_ms: i64,
    reporter: Arc<dyn ConnectivityReporter>,
    clock: Arc<dyn Clock>,
    /// Runtime the gate was built on. Pings go there even when activity arrives from a thread
    /// outside of it.
    runtime: Option<Handle>,
    pending: TaskTracker,
}

impl ActivityGate {
    pub fn new(
        reporter: Arc<dyn ConnectivityReporter>,
        clock: Arc<dyn Clock>,
        cooldown: Duration,
    ) -> Self {
        Self {
            last_activity_ms: AtomicI64::new(0),
            cooldown_ms: i64::try_from(cooldown.as_millis()).unwrap_or(i64::MAX),
            reporter,
            clock,
            runtime: Handle::try_current().ok(),
            pending: TaskTracker::new(),
        }
    }

    pub fn last_activity(&self) -> i64 {
        self.last_activity_ms.load(Ordering::SeqCst)
    }

    /// Handles one activity signal. When the window has elapsed the ping is spawned and its
    /// handle returned. The task never fails: reporter errors are dropped inside it. Without a
    /// runtime to run the ping on the signal is ignored and the window stays open.
    pub fn on_activity(&self) -> Option<JoinHandle<()>> {
        let Some(runtime) = self.runtime.clone().or_else(|| Handle::try_current().ok()) else {
            warn!("No async runtime available, ignoring activity");
            return None;
        };

        let now = self.clock.time().timestamp_millis();
        if !self.try_claim(now) {
            trace!("Activity inside cooldown window, skipping");
            return None;
        }

        info!("Reporting user as connected");
        let reporter = self.reporter.clone();
        Some(self.pending.spawn_on(
            async move { report_best_effort(reporter.as_ref()).await },
            &runtime,
        ))
    }

    /// Waits for every dispatched ping to finish. Pings are never cancelled, so shutdown goes
    /// through here.
    pub async fn finish_pending(&self) {
        self.pending.close();
        self.pending.wait().await;
        self.pending.reopen();
    }

    /// Moves the window start to `now` if the previous window has elapsed. Only one caller can
    /// win a given window.
    fn try_claim(&self, now: i64) -> bool {
        let mut last = self.last_activity_ms.load(Ordering::SeqCst);
        loop {
            if now.saturating_sub(last) <= self.cooldown_ms {
                return false;
            }
            match self.last_activity_ms.compare_exchange(
                last,
                now,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return true,
                Err(actual) => last = actual,
            }
        }
    }
}

/// Pings are advisory, failures are logged and otherwise discarded. No retry happens, the next
/// window gets a fresh attempt.
async fn report_best_effort(reporter: &dyn ConnectivityReporter) {
    match reporter.report_connected().await {
        Ok(response) => debug!("Connected ping accepted {response}"),
        Err(e) => debug!("Discarding failed connected ping: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{atomic::Ordering, Arc},
        time::Duration,
    };

    use anyhow::Result;
    use serde_json::json;

    use super::{ActivityGate, DEFAULT_COOLDOWN};
    use crate::{
        client::{error::ClientError, test_reporter::SlowReporter, MockConnectivityReporter},
        utils::{clock::test_clock::ManualClock, logging::TEST_LOGGING},
    };

    const START: i64 = 1_700_000_000_000;

    fn gate(reporter: MockConnectivityReporter, clock: &ManualClock) -> ActivityGate {
        ActivityGate::new(Arc::new(reporter), Arc::new(clock.clone()), DEFAULT_COOLDOWN)
    }

    fn ok_reporter(times: usize) -> MockConnectivityReporter {
        let mut reporter = MockConnectivityReporter::new();
        reporter
            .expect_report_connected()
            .times(times)
            .returning(|| Ok(json!({"status": "ok"})));
        reporter
    }

    fn failing_reporter(times: usize) -> MockConnectivityReporter {
        let mut reporter = MockConnectivityReporter::new();
        reporter
            .expect_report_connected()
            .times(times)
            .returning(|| {
                Err(ClientError::Status {
                    server_url: "http://chat.example.com/".into(),
                    url: "http://chat.example.com/plugins/p/".into(),
                    status_code: 500,
                    message: "boom".into(),
                })
            });
        reporter
    }

    #[tokio::test]
    async fn activity_inside_window_sends_once() -> Result<()> {
        *TEST_LOGGING;
        let clock = ManualClock::new(START, 0);
        let gate = gate(ok_reporter(1), &clock);

        gate.on_activity().expect("first activity pings").await?;
        clock.set_millis(START + 30_000);
        assert!(gate.on_activity().is_none());
        assert_eq!(gate.last_activity(), START);
        Ok(())
    }

    #[tokio::test]
    async fn activity_after_window_sends_again() -> Result<()> {
        let clock = ManualClock::new(START, 0);
        let gate = gate(ok_reporter(2), &clock);

        gate.on_activity().expect("first activity pings").await?;
        clock.set_millis(START + 61_000);
        gate.on_activity().expect("window elapsed").await?;
        assert_eq!(gate.last_activity(), START + 61_000);
        Ok(())
    }

    #[tokio::test]
    async fn window_boundary_is_exclusive() -> Result<()> {
        let clock = ManualClock::new(START, 0);
        let gate = gate(ok_reporter(2), &clock);

        gate.on_activity().expect("first activity pings").await?;
        clock.set_millis(START + 60_000);
        assert!(gate.on_activity().is_none());
        clock.set_millis(START + 60_001);
        gate.on_activity().expect("window elapsed").await?;
        Ok(())
    }

    #[tokio::test]
    async fn failed_ping_is_swallowed_and_keeps_cooldown() -> Result<()> {
        let clock = ManualClock::new(START, 0);
        let gate = gate(failing_reporter(2), &clock);

        // The task completes normally even though the reporter failed.
        gate.on_activity().expect("first activity pings").await?;
        assert_eq!(gate.last_activity(), START);

        clock.set_millis(START + 30_000);
        assert!(gate.on_activity().is_none());

        clock.set_millis(START + 61_000);
        gate.on_activity().expect("window elapsed").await?;
        Ok(())
    }

    #[tokio::test]
    async fn burst_of_activity_respects_rolling_window() -> Result<()> {
        let clock = ManualClock::new(START, 0);
        let mut reporter = MockConnectivityReporter::new();
        reporter
            .expect_report_connected()
            .returning(|| Ok(json!({})));
        let gate = gate(reporter, &clock);

        let mut now = START;
        let mut seed = 42u64;
        let mut dispatched = Vec::new();
        for _ in 0..2_000 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            now += (seed >> 33) as i64 % 5_000;
            clock.set_millis(now);
            if let Some(handle) = gate.on_activity() {
                handle.await?;
                dispatched.push(now);
            }
        }

        assert!(dispatched.len() > 1);
        for pair in dispatched.windows(2) {
            assert!(pair[1] - pair[0] > 60_000, "pings too close: {pair:?}");
        }
        Ok(())
    }

    #[test]
    fn concurrent_claims_win_once() {
        let clock = ManualClock::new(START, 0);
        let gate = gate(MockConnectivityReporter::new(), &clock);

        let wins = std::thread::scope(|scope| {
            let handles = (0..8)
                .map(|_| scope.spawn(|| gate.try_claim(START)))
                .collect::<Vec<_>>();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .filter(|won| *won)
                .count()
        });
        assert_eq!(wins, 1);
    }

    #[test]
    fn custom_cooldown_is_used() {
        let clock = ManualClock::new(START, 0);
        let gate = ActivityGate::new(
            Arc::new(MockConnectivityReporter::new()),
            Arc::new(clock),
            Duration::from_secs(5),
        );
        assert!(gate.try_claim(START));
        assert!(!gate.try_claim(START + 5_000));
        assert!(gate.try_claim(START + 5_001));
    }

    #[test]
    fn activity_without_runtime_keeps_window_open() {
        let clock = ManualClock::new(START, 0);
        let gate = gate(MockConnectivityReporter::new(), &clock);

        assert!(gate.on_activity().is_none());
        assert_eq!(gate.last_activity(), 0);
    }

    #[tokio::test]
    async fn activity_from_foreign_thread_runs_on_gate_runtime() -> Result<()> {
        let clock = ManualClock::new(START, 0);
        let gate = Arc::new(gate(ok_reporter(1), &clock));

        let handle = std::thread::spawn({
            let gate = gate.clone();
            move || gate.on_activity()
        })
        .join()
        .unwrap();

        handle.expect("first activity pings").await?;
        assert_eq!(gate.last_activity(), START);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn finish_pending_waits_for_in_flight_ping() {
        let clock = ManualClock::new(START, 0);
        let reporter = SlowReporter::new(Duration::from_secs(30));
        let completed = reporter.completed();
        let gate = ActivityGate::new(Arc::new(reporter), Arc::new(clock), DEFAULT_COOLDOWN);

        let started = tokio::time::Instant::now();
        drop(gate.on_activity());
        assert_eq!(completed.load(Ordering::SeqCst), 0);

        gate.finish_pending().await;
        assert_eq!(completed.load(Ordering::SeqCst), 1);
        assert!(started.elapsed() >= Duration::from_secs(30));
    }
}
