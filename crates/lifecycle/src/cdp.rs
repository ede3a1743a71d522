//! Driving a [`Document`] from Chrome DevTools Protocol page events
//!
//! Only the `Page` domain is consumed:
//!
//! - `Page.lifecycleEvent` with `name` `init`, `DOMContentLoaded` or `load`
//! - `Page.domContentEventFired`
//! - `Page.loadEventFired`

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::Document;
use crate::error::Result;
use crate::events::ReadyState;

/// CDP event from the browser (no request ID)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CdpEvent {
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<String>,
}

impl CdpEvent {
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    fn param(&self, key: &str) -> Option<&str> {
        self.params.as_ref()?.get(key)?.as_str()
    }
}

impl Document {
    /// Apply a CDP page event. Returns the state the event moved the
    /// document towards, or `None` if it was ignored.
    ///
    /// When `frame_id` is configured, `Page.lifecycleEvent`s for other
    /// frames are ignored.
    pub fn handle_cdp_event(&self, event: &CdpEvent) -> Option<ReadyState> {
        let target = match event.method.as_str() {
            "Page.domContentEventFired" => ReadyState::Interactive,
            "Page.loadEventFired" => ReadyState::Complete,
            "Page.lifecycleEvent" => {
                if let (Some(expected), Some(frame)) =
                    (self.config().frame_id.as_deref(), event.param("frameId"))
                {
                    if expected != frame {
                        tracing::trace!("Ignoring lifecycle event for frame {}", frame);
                        return None;
                    }
                }

                match event.param("name") {
                    Some("init") => {
                        self.reset();
                        return Some(ReadyState::Loading);
                    }
                    Some("DOMContentLoaded") => ReadyState::Interactive,
                    Some("load") => ReadyState::Complete,
                    other => {
                        tracing::trace!("Ignoring lifecycle event {:?}", other);
                        return None;
                    }
                }
            }
            _ => {
                tracing::trace!("Ignoring CDP event {}", event.method);
                return None;
            }
        };

        self.set_ready_state(target);
        Some(target)
    }
}
