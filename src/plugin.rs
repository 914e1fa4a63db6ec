use std::sync::Arc;

use tracing::{debug, info};

use crate::activity::{gate::ActivityGate, ActivitySource, ListenerId};

/// Presence plugin as seen by the host: one activity listener bound to one gate for as long as
/// the plugin is initialized.
pub struct PresencePlugin {
    gate: Arc<ActivityGate>,
    subscription: Option<ListenerId>,
}

impl PresencePlugin {
    pub fn new(gate: ActivityGate) -> Self {
        Self {
            gate: Arc::new(gate),
            subscription: None,
        }
    }

    pub fn gate(&self) -> &ActivityGate {
        &self.gate
    }

    pub fn is_initialized(&self) -> bool {
        self.subscription.is_some()
    }

    /// Registers the activity listener. A second call while initialized does nothing.
    pub fn initialize(&mut self, source: &dyn ActivitySource) {
        if self.subscription.is_some() {
            debug!("Plugin already initialized");
            return;
        }

        let gate = self.gate.clone();
        let id = source.subscribe(Arc::new(move || {
            gate.on_activity();
        }));
        info!("Presence plugin initialized");
        self.subscription = Some(id);
    }

    /// Removes exactly the listener added by [Self::initialize].
    pub fn deinitialize(&mut self, source: &dyn ActivitySource) {
        if let Some(id) = self.subscription.take() {
            source.unsubscribe(id);
            info!("Presence plugin deinitialized");
        }
    }
}
