//! DOM Service - builds an arena from CDP and hands out selector engines
//!
//! Input format matches CDP's `DOM.getDocument` response (with `depth: -1`):
//! ```json
//! {
//!   "root": {
//!     "nodeId": 1,
//!     "backendNodeId": 1,
//!     "nodeType": 9,
//!     "nodeName": "#document",
//!     "children": [...]
//!   }
//! }
//! ```

use crate::arena::DomArena;
use crate::engine::SelectorEngine;
use crate::error::{DomError, Result};
use crate::types::*;
use serde_json::Value;
use smallvec::SmallVec;

/// Configuration for DOM service
#[derive(Debug, Clone)]
pub struct DomServiceConfig {
    /// Load `shadowRoots` into the arena (detached from ordinary traversal)
    pub include_shadow_roots: bool,
    /// Load iframe `contentDocument`s into the arena
    pub include_content_documents: bool,
}

impl Default for DomServiceConfig {
    fn default() -> Self {
        Self {
            include_shadow_roots: true,
            include_content_documents: true,
        }
    }
}

/// Main DOM service
pub struct DomService {
    config: DomServiceConfig,
    arena: DomArena,
}

impl DomService {
    pub fn new() -> Self {
        Self::with_config(DomServiceConfig::default())
    }

    pub fn with_config(config: DomServiceConfig) -> Self {
        Self {
            config,
            arena: DomArena::new(),
        }
    }

    pub fn arena(&self) -> &DomArena {
        &self.arena
    }

    /// Selector engine over the current tree
    pub fn engine(&self) -> SelectorEngine<'_, DomArena> {
        SelectorEngine::new(&self.arena)
    }

    /// Parse CDP DOM tree response and replace the arena with it.
    ///
    /// On error the previously loaded tree is kept as it was.
    pub fn parse_cdp_dom_tree(&mut self, cdp_response: &Value) -> Result<NodeId> {
        let root = cdp_response
            .get("root")
            .ok_or_else(|| DomError::CdpError("Missing 'root' in CDP response".to_string()))?;

        let mut arena = DomArena::new();
        let root_id = Self::parse_node(&self.config, &mut arena, root)?;
        arena.set_root(root_id)?;
        self.arena = arena;

        tracing::debug!(
            "Loaded CDP DOM tree: {} nodes, document element {:?}",
            self.arena.len(),
            self.arena.document_element()
        );

        Ok(root_id)
    }

    /// Parse CDP DOM tree from raw JSON text
    pub fn parse_cdp_json(&mut self, json: &str) -> Result<NodeId> {
        let value: Value = serde_json::from_str(json)?;
        self.parse_cdp_dom_tree(&value)
    }

    /// Recursively parse a CDP node; returns it detached
    fn parse_node(config: &DomServiceConfig, arena: &mut DomArena, cdp_node: &Value) -> Result<NodeId> {
        let backend_node_id = cdp_node["backendNodeId"]
            .as_u64()
            .ok_or_else(|| DomError::CdpError("Missing backendNodeId".to_string()))?;
        let backend_node_id = u32::try_from(backend_node_id).map_err(|_| {
            DomError::CdpError(format!("backendNodeId {} out of range", backend_node_id))
        })?;

        let node_type_val = cdp_node["nodeType"]
            .as_u64()
            .ok_or_else(|| DomError::CdpError("Missing nodeType".to_string()))?;
        let node_type = u8::try_from(node_type_val)
            .ok()
            .and_then(NodeType::from_u8)
            .ok_or_else(|| DomError::InvalidNodeType {
                expected: "valid NodeType".to_string(),
                actual: node_type_val.to_string(),
            })?;

        let mut node = DomNode::new(node_type, cdp_node["nodeName"].as_str().unwrap_or(""));
        node.backend_node_id = backend_node_id;
        node.node_value = cdp_node["nodeValue"].as_str().unwrap_or("").to_string();

        // CDP sends attributes as a flat [name, value, name, value, ...] list
        if let Some(attrs) = cdp_node["attributes"].as_array() {
            for pair in attrs.chunks_exact(2) {
                if let (Some(key), Some(value)) = (pair[0].as_str(), pair[1].as_str()) {
                    node.attributes.insert(key.to_string(), value.to_string());
                }
            }
        }

        let current_node_id = arena.add_node(node);

        if let Some(children) = cdp_node["children"].as_array() {
            for child in children {
                let child_id = Self::parse_node(config, arena, child)?;
                arena.append_child(current_node_id, child_id)?;
            }
        }

        if config.include_content_documents {
            if let Some(content_doc) = cdp_node.get("contentDocument") {
                let doc_id = Self::parse_node(config, arena, content_doc)?;
                arena.get_mut(current_node_id)?.content_document_id = Some(doc_id);
            }
        }

        if config.include_shadow_roots {
            if let Some(shadow_roots) = cdp_node["shadowRoots"].as_array() {
                let mut shadow_ids = SmallVec::new();
                for shadow in shadow_roots {
                    shadow_ids.push(Self::parse_node(config, arena, shadow)?);
                }
                arena.get_mut(current_node_id)?.shadow_root_ids = Some(shadow_ids);
            }
        }

        Ok(current_node_id)
    }
}

impl Default for DomService {
    fn default() -> Self {
        Self::new()
    }
}
