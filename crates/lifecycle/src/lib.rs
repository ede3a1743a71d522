//! Document readiness
//!
//! Two one-shot gates, [`document_ready`] and [`document_complete`], over an
//! injected [`DocumentLifecycle`] host, plus an in-process [`Document`] host
//! that can be driven by CDP page events.

pub mod capability;
pub mod cdp;
pub mod document;
pub mod error;
pub mod events;
pub mod gate;

pub use capability::{DocumentLifecycle, Listener, ListenerAction, ListenerId, ListenerOptions};
pub use cdp::CdpEvent;
pub use document::{Document, DocumentConfig};
pub use error::{LifecycleError, Result};
pub use events::{EventBus, LifecycleEvent, Notification, ReadyState};
pub use gate::{complete, document_complete, document_ready, ready};
