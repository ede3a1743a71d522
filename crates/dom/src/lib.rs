//! DOM selector engine
//!
//! Query and walk an element tree by CSS selector, without ever
//! mutating it.
//!
//! ## Core Design
//!
//! ```text
//! CDP JSON ─→ DomService ─→ DomArena (owned) ─┐
//! DomNode builders ─────────→ DomArena ───────┤
//!                                             ↓ impl ElementTree
//!                                      SelectorEngine ─→ Element<K>
//! ```
//!
//! The engine only talks to the [`ElementTree`] trait, so any tree that
//! can answer parent/child/sibling links and a `matches` predicate can be
//! queried the same way.

pub mod arena;
pub mod element;
pub mod engine;
pub mod error;
pub mod selector;
pub mod service;
pub mod tree;
pub mod types;
pub mod utils;

pub use arena::DomArena;
pub use element::{Element, ElementKind, HtmlElement};
pub use engine::SelectorEngine;
pub use error::{DomError, Result};
pub use selector::SelectorList;
pub use service::{DomService, DomServiceConfig};
pub use tree::ElementTree;
pub use types::*;
