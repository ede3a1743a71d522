//! In-process lifecycle host
//!
//! A `Document` owns a ready state and a listener registry, and dispatches
//! in browser order:
//!
//! ```text
//! loading ──→ interactive ──────────────────────→ complete
//!             readystatechange, DOMContentLoaded   readystatechange, load
//! ```
//!
//! Listeners are snapshotted under the registry lock and called outside
//! it, so a listener may freely register or remove listeners.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use tokio::sync::broadcast;

use crate::capability::{
    DocumentLifecycle, Listener, ListenerAction, ListenerId, ListenerOptions,
};
use crate::events::{EventBus, LifecycleEvent, Notification, ReadyState};

/// Document configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    pub initial_state: ReadyState,
    /// Capacity of the broadcast channel behind `subscribe()`
    pub event_capacity: usize,
    /// Only CDP lifecycle events for this frame are applied (all if unset)
    pub frame_id: Option<String>,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            initial_state: ReadyState::Loading,
            event_capacity: 64,
            frame_id: None,
        }
    }
}

struct Registration {
    id: ListenerId,
    listener: Listener,
    once: bool,
}

pub struct Document {
    config: DocumentConfig,
    state: AtomicU8,
    next_id: AtomicU64,

    /// Key: event, Value: registrations in insertion order
    listeners: DashMap<LifecycleEvent, Vec<Registration>>,

    bus: EventBus,
}

impl Document {
    pub fn new() -> Self {
        Self::with_config(DocumentConfig::default())
    }

    pub fn with_config(config: DocumentConfig) -> Self {
        Self {
            state: AtomicU8::new(config.initial_state as u8),
            next_id: AtomicU64::new(1),
            listeners: DashMap::new(),
            bus: EventBus::new(config.event_capacity),
            config,
        }
    }

    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    /// Advance to `target`, one state at a time, dispatching the events of
    /// every state passed through. Moving backwards is a no-op.
    pub fn set_ready_state(&self, target: ReadyState) {
        loop {
            let current = self.ready_state();
            if current >= target {
                return;
            }

            let step = current.successor();
            if self
                .state
                .compare_exchange(current as u8, step as u8, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                // Someone else advanced it; re-sample.
                continue;
            }

            tracing::debug!("readyState: {} -> {}", current, step);
            self.dispatch(LifecycleEvent::ReadyStateChange);
            match step {
                ReadyState::Interactive => self.dispatch(LifecycleEvent::DomContentLoaded),
                ReadyState::Complete => self.dispatch(LifecycleEvent::Load),
                ReadyState::Loading => {}
            }
        }
    }

    /// Back to `loading` for a new navigation. Dispatches nothing and
    /// keeps registered listeners.
    pub fn reset(&self) {
        let previous = ReadyState::from_repr(self.state.swap(ReadyState::Loading as u8, Ordering::SeqCst));
        tracing::debug!("readyState reset: {} -> loading", previous);
    }

    /// Dispatch `event` with the current state, without changing it
    pub fn dispatch(&self, event: LifecycleEvent) {
        let notification = Notification {
            event,
            ready_state: self.ready_state(),
        };

        let snapshot: Vec<(ListenerId, Listener)> = match self.listeners.get_mut(&event) {
            Some(mut registrations) => {
                let snapshot = registrations
                    .iter()
                    .map(|r| (r.id, r.listener.clone()))
                    .collect();
                registrations.retain(|r| !r.once);
                snapshot
            }
            None => Vec::new(),
        };

        tracing::trace!(
            "dispatch {} ({}) to {} listeners",
            event,
            notification.ready_state,
            snapshot.len()
        );

        for (id, listener) in snapshot {
            if listener(&notification) == ListenerAction::Remove {
                self.remove_listener(id);
            }
        }

        self.bus.publish(notification);
    }

    /// Every notification dispatched from now on
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.bus.subscribe()
    }

    /// Number of registered listeners, across all events
    pub fn listener_count(&self) -> usize {
        self.listeners.iter().map(|entry| entry.value().len()).sum()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentLifecycle for Document {
    fn ready_state(&self) -> ReadyState {
        ReadyState::from_repr(self.state.load(Ordering::SeqCst))
    }

    fn add_listener(
        &self,
        event: LifecycleEvent,
        listener: Listener,
        options: ListenerOptions,
    ) -> ListenerId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.listeners.entry(event).or_default().push(Registration {
            id,
            listener,
            once: options.once,
        });
        tracing::debug!("Registered {} listener {} (once: {})", event, id, options.once);
        id
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        let mut removed = false;
        for mut entry in self.listeners.iter_mut() {
            let before = entry.len();
            entry.retain(|r| r.id != id);
            removed |= entry.len() != before;
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder(doc: &Document, event: LifecycleEvent, log: &Arc<Mutex<Vec<String>>>) {
        let log = log.clone();
        doc.add_listener(
            event,
            Arc::new(move |n: &Notification| {
                log.lock().unwrap().push(format!("{}:{}", n.event, n.ready_state));
                ListenerAction::Keep
            }),
            ListenerOptions::default(),
        );
    }

    #[test]
    fn test_transitions_dispatch_in_browser_order() {
        let doc = Document::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        recorder(&doc, LifecycleEvent::ReadyStateChange, &log);
        recorder(&doc, LifecycleEvent::DomContentLoaded, &log);
        recorder(&doc, LifecycleEvent::Load, &log);

        // jumping straight to complete still passes through interactive
        doc.set_ready_state(ReadyState::Complete);

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "readystatechange:interactive",
                "DOMContentLoaded:interactive",
                "readystatechange:complete",
                "load:complete",
            ]
        );

        // no going back, no duplicate events
        doc.set_ready_state(ReadyState::Interactive);
        doc.set_ready_state(ReadyState::Complete);
        assert_eq!(log.lock().unwrap().len(), 4);
    }

    #[test]
    fn test_once_listener_removed_before_call() {
        let doc = Document::new();
        let calls = Arc::new(AtomicU64::new(0));
        let counter = calls.clone();
        doc.add_listener(
            LifecycleEvent::DomContentLoaded,
            Arc::new(move |_: &Notification| {
                counter.fetch_add(1, Ordering::SeqCst);
                ListenerAction::Keep
            }),
            ListenerOptions::once(),
        );

        doc.dispatch(LifecycleEvent::DomContentLoaded);
        doc.dispatch(LifecycleEvent::DomContentLoaded);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(doc.listener_count(), 0);
    }

    #[test]
    fn test_listener_may_register_during_dispatch() {
        let doc = Arc::new(Document::new());
        let inner = doc.clone();
        doc.add_listener(
            LifecycleEvent::ReadyStateChange,
            Arc::new(move |_: &Notification| {
                inner.add_listener(
                    LifecycleEvent::Load,
                    Arc::new(|_: &Notification| ListenerAction::Keep),
                    ListenerOptions::default(),
                );
                ListenerAction::Remove
            }),
            ListenerOptions::default(),
        );

        doc.dispatch(LifecycleEvent::ReadyStateChange);

        assert_eq!(doc.listener_count(), 1);
        assert!(!doc.remove_listener(1));
    }

    #[test]
    fn test_reset_keeps_listeners() {
        let doc = Document::with_config(DocumentConfig {
            initial_state: ReadyState::Complete,
            ..Default::default()
        });
        doc.add_listener(
            LifecycleEvent::Load,
            Arc::new(|_: &Notification| ListenerAction::Keep),
            ListenerOptions::default(),
        );

        doc.reset();

        assert_eq!(doc.ready_state(), ReadyState::Loading);
        assert_eq!(doc.listener_count(), 1);
    }

    #[tokio::test]
    async fn test_subscribe_sees_transitions() {
        let doc = Document::new();
        let mut rx = doc.subscribe();

        doc.set_ready_state(ReadyState::Interactive);

        let first = rx.recv().await.unwrap();
        assert_eq!(first.event, LifecycleEvent::ReadyStateChange);
        let second = rx.recv().await.unwrap();
        assert_eq!(second.event, LifecycleEvent::DomContentLoaded);
        assert_eq!(second.ready_state, ReadyState::Interactive);
    }
}
