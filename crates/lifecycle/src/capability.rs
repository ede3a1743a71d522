//! The document lifecycle capability
//!
//! The gates never touch a global document. They sample `ready_state()`
//! and register listeners through this trait, so anything that can report
//! a ready state and deliver notifications can host them: the in-process
//! [`Document`](crate::Document), a CDP-driven one, or a test double.

use std::sync::Arc;

use crate::events::{LifecycleEvent, Notification, ReadyState};

pub type ListenerId = u64;

/// What the host should do with a listener after calling it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerAction {
    Keep,
    Remove,
}

/// Listener callback. Hosts may call it from any thread.
pub type Listener = Arc<dyn Fn(&Notification) -> ListenerAction + Send + Sync>;

/// `addEventListener` options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    /// Remove the listener before its first invocation
    pub once: bool,
}

impl ListenerOptions {
    pub fn once() -> Self {
        Self { once: true }
    }
}

pub trait DocumentLifecycle: Send + Sync {
    fn ready_state(&self) -> ReadyState;

    fn add_listener(
        &self,
        event: LifecycleEvent,
        listener: Listener,
        options: ListenerOptions,
    ) -> ListenerId;

    /// Returns false if the listener was already gone
    fn remove_listener(&self, id: ListenerId) -> bool;
}

impl<T: DocumentLifecycle + ?Sized> DocumentLifecycle for Arc<T> {
    fn ready_state(&self) -> ReadyState {
        (**self).ready_state()
    }

    fn add_listener(
        &self,
        event: LifecycleEvent,
        listener: Listener,
        options: ListenerOptions,
    ) -> ListenerId {
        (**self).add_listener(event, listener, options)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        (**self).remove_listener(id)
    }
}
