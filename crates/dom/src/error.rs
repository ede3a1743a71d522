//! Error types for DOM operations
//!
//! Simple, flat error hierarchy. "Not found" is never an error here:
//! lookups return `Option`, multi-result queries return an empty `Vec`.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DomError>;

#[derive(Debug, Error)]
pub enum DomError {
    #[error("Node not found: {0}")]
    NodeNotFound(u32),

    #[error("Node {0} already has a parent")]
    AlreadyAttached(u32),

    #[error("Appending node {child} under node {parent} would create a cycle")]
    WouldCycle { parent: u32, child: u32 },

    #[error("Node {0} is not an element")]
    NotAnElement(u32),

    #[error("Invalid node type: expected {expected}, got {actual}")]
    InvalidNodeType { expected: String, actual: String },

    #[error("'{0}' is not a valid selector")]
    InvalidSelector(String),

    #[error("CDP protocol error: {0}")]
    CdpError(String),

    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),
}
