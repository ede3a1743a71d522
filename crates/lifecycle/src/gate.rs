//! Readiness gates
//!
//! Each gate is a two-state machine, `Pending → Satisfied`. The initial
//! state is sampled from the host at call time; if the milestone has
//! already passed the callback runs before the gate returns, otherwise it
//! runs later from the host's dispatch.
//!
//! Both gates are one-shot. The callback sits in a take-once slot and the
//! listener asks to be removed once it has fired, so re-dispatched or
//! racing notifications cannot run it twice.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::oneshot;

use crate::capability::{DocumentLifecycle, ListenerAction, ListenerOptions};
use crate::error::{LifecycleError, Result};
use crate::events::{LifecycleEvent, Notification, ReadyState};

type Callback = Box<dyn FnOnce() + Send>;

/// Take-once holder for a deferred callback
struct Pending(Mutex<Option<Callback>>);

impl Pending {
    fn new<F>(callback: F) -> Arc<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        Arc::new(Self(Mutex::new(Some(Box::new(callback)))))
    }

    /// Run the callback if nobody has yet. Called outside the lock.
    fn fire(&self) {
        let callback = self.0.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(callback) = callback {
            callback();
        }
    }
}

/// Run `callback` once the document has been parsed (`DOMContentLoaded`),
/// sub-resources may still be loading.
///
/// If the document is no longer `loading`, `callback` runs immediately,
/// before this function returns.
pub fn document_ready<D, F>(document: &D, callback: F)
where
    D: DocumentLifecycle + ?Sized,
    F: FnOnce() + Send + 'static,
{
    if document.ready_state() != ReadyState::Loading {
        callback();
        return;
    }

    let pending = Pending::new(callback);
    let slot = pending.clone();
    let id = document.add_listener(
        LifecycleEvent::DomContentLoaded,
        Arc::new(move |_: &Notification| {
            slot.fire();
            ListenerAction::Remove
        }),
        ListenerOptions::once(),
    );
    tracing::debug!("documentReady deferred (listener {})", id);

    // The milestone may have passed between sampling and registering.
    if document.ready_state() != ReadyState::Loading {
        document.remove_listener(id);
        pending.fire();
    }
}

/// Run `callback` once the document and all sub-resources have finished
/// loading (`readyState == "complete"`).
///
/// If the document is already complete, `callback` runs immediately,
/// before this function returns.
pub fn document_complete<D, F>(document: &D, callback: F)
where
    D: DocumentLifecycle + ?Sized,
    F: FnOnce() + Send + 'static,
{
    if document.ready_state() == ReadyState::Complete {
        callback();
        return;
    }

    let pending = Pending::new(callback);
    let slot = pending.clone();
    let id = document.add_listener(
        LifecycleEvent::ReadyStateChange,
        Arc::new(move |notification: &Notification| {
            if notification.ready_state != ReadyState::Complete {
                return ListenerAction::Keep;
            }
            slot.fire();
            ListenerAction::Remove
        }),
        ListenerOptions::default(),
    );
    tracing::debug!("documentComplete deferred (listener {})", id);

    if document.ready_state() == ReadyState::Complete {
        document.remove_listener(id);
        pending.fire();
    }
}

/// Resolves when [`document_ready`] would fire
pub async fn ready<D>(document: &D) -> Result<()>
where
    D: DocumentLifecycle + ?Sized,
{
    let (tx, rx) = oneshot::channel();
    document_ready(document, move || {
        let _ = tx.send(());
    });
    rx.await.map_err(|_| LifecycleError::Closed)
}

/// Resolves when [`document_complete`] would fire
pub async fn complete<D>(document: &D) -> Result<()>
where
    D: DocumentLifecycle + ?Sized,
{
    let (tx, rx) = oneshot::channel();
    document_complete(document, move || {
        let _ = tx.send(());
    });
    rx.await.map_err(|_| LifecycleError::Closed)
}
