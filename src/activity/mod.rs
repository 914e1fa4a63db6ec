//! Activity signals and the subscription surface listeners attach to.
//! [ActivityHub] is the in-process source, [gate::ActivityGate] turns signals into pings.

pub mod gate;

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};

use tracing::trace;

pub type ActivityListener = Arc<dyn Fn() + Send + Sync>;

/// Identifies a single registration. Unsubscribing needs the exact id that was handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Something that produces "user is present" signals and lets listeners attach to them.
pub trait ActivitySource: Send + Sync {
    fn subscribe(&self, listener: ActivityListener) -> ListenerId;

    /// Removes the listener registered under `id`. Returns false if it wasn't registered.
    fn unsubscribe(&self, id: ListenerId) -> bool;

    fn listener_count(&self) -> usize;
}

#[derive(Default)]
pub struct ActivityHub {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(ListenerId, ActivityListener)>>,
}

impl ActivityHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers one activity signal to every listener in subscription order.
    pub fn emit(&self) {
        // Listeners are called outside of the lock so they are free to unsubscribe.
        let listeners = self
            .lock_listeners()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect::<Vec<_>>();
        trace!("Emitting activity to {} listeners", listeners.len());
        for listener in listeners {
            listener();
        }
    }

    fn lock_listeners(&self) -> std::sync::MutexGuard<'_, Vec<(ListenerId, ActivityListener)>> {
        // A panicking listener never runs under the lock, the data can't be left half updated.
        self.listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ActivitySource for ActivityHub {
    fn subscribe(&self, listener: ActivityListener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock_listeners().push((id, listener));
        id
    }

    fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.lock_listeners();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        before != listeners.len()
    }

    fn listener_count(&self) -> usize {
        self.lock_listeners().len()
    }
}
