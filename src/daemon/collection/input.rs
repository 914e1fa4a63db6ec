/// Decides from consecutive idle time readings whether the user touched the machine since the
/// previous poll.
pub struct InputDetector {
    poll_interval_ms: u32,
    last_idle_ms: Option<u32>,
}

impl InputDetector {
    pub fn new(poll_interval_ms: u32) -> Self {
        Self {
            poll_interval_ms,
            last_idle_ms: None,
        }
    }

    /// Input happened when the idle counter is younger than one poll interval, or when it went
    /// backwards since the last reading.
    pub fn observe(&mut self, idle_ms: u32) -> bool {
        let reset = self.last_idle_ms.is_some_and(|last| idle_ms < last);
        self.last_idle_ms = Some(idle_ms);
        reset || idle_ms < self.poll_interval_ms
    }
}
