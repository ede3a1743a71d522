//! Lifecycle states and events
//!
//! Names follow the DOM: `document.readyState` values and the
//! `readystatechange` / `DOMContentLoaded` / `load` events.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tokio::sync::broadcast;

use crate::error::LifecycleError;

/// `document.readyState`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum ReadyState {
    Loading = 0,
    Interactive = 1,
    Complete = 2,
}

impl ReadyState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadyState::Loading => "loading",
            ReadyState::Interactive => "interactive",
            ReadyState::Complete => "complete",
        }
    }

    /// The state a document moves to next. `Complete` is terminal.
    pub fn successor(&self) -> Self {
        match self {
            ReadyState::Loading => ReadyState::Interactive,
            ReadyState::Interactive | ReadyState::Complete => ReadyState::Complete,
        }
    }

    pub(crate) fn from_repr(value: u8) -> Self {
        match value {
            0 => ReadyState::Loading,
            1 => ReadyState::Interactive,
            _ => ReadyState::Complete,
        }
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReadyState {
    type Err = LifecycleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "loading" => Ok(ReadyState::Loading),
            "interactive" => Ok(ReadyState::Interactive),
            "complete" => Ok(ReadyState::Complete),
            other => Err(LifecycleError::UnknownReadyState(other.to_string())),
        }
    }
}

/// Events a document dispatches while it loads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleEvent {
    #[serde(rename = "readystatechange")]
    ReadyStateChange,
    #[serde(rename = "DOMContentLoaded")]
    DomContentLoaded,
    #[serde(rename = "load")]
    Load,
}

impl LifecycleEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleEvent::ReadyStateChange => "readystatechange",
            LifecycleEvent::DomContentLoaded => "DOMContentLoaded",
            LifecycleEvent::Load => "load",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a listener receives: the event and the state at dispatch time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub event: LifecycleEvent,
    pub ready_state: ReadyState,
}

/// Fan-out of every dispatched notification to async observers
pub struct EventBus {
    tx: broadcast::Sender<Notification>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, notification: Notification) {
        let _ = self.tx.send(notification); // Ignore error if no subscribers
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_state_order_and_names() {
        assert!(ReadyState::Loading < ReadyState::Interactive);
        assert!(ReadyState::Interactive < ReadyState::Complete);
        assert_eq!(ReadyState::Loading.successor(), ReadyState::Interactive);
        assert_eq!(ReadyState::Complete.successor(), ReadyState::Complete);

        assert_eq!("interactive".parse::<ReadyState>().unwrap(), ReadyState::Interactive);
        assert!(matches!(
            "done".parse::<ReadyState>(),
            Err(LifecycleError::UnknownReadyState(s)) if s == "done"
        ));
        assert_eq!(
            serde_json::to_string(&ReadyState::Complete).unwrap(),
            "\"complete\""
        );
        assert_eq!(
            serde_json::to_string(&LifecycleEvent::DomContentLoaded).unwrap(),
            "\"DOMContentLoaded\""
        );
    }

    #[tokio::test]
    async fn test_event_bus() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        let notification = Notification {
            event: LifecycleEvent::Load,
            ready_state: ReadyState::Complete,
        };
        bus.publish(notification);

        assert_eq!(rx.recv().await.unwrap(), notification);
    }
}
