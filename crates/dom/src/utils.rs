//! Utility functions for DOM processing

use crate::arena::DomArena;
use crate::error::Result;
use crate::types::{NodeId, NodeType};

/// Concatenated text of a node and its descendants (`textContent`), trimmed
pub fn get_text_content(arena: &DomArena, node_id: NodeId) -> Result<String> {
    let mut text = String::new();

    arena.traverse_df(node_id, |node| {
        if matches!(node.node_type, NodeType::Text | NodeType::CdataSection) {
            text.push_str(&node.node_value);
        }
        Ok(())
    })?;

    Ok(text.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DomNode;

    #[test]
    fn test_text_content() {
        let mut arena = DomArena::new();
        let h1 = arena.add_node(DomNode::element("h1"));
        arena.append(h1, DomNode::text("  Hello ")).unwrap();
        let b = arena.append(h1, DomNode::element("b")).unwrap();
        arena.append(b, DomNode::text("world!  ")).unwrap();

        assert_eq!(get_text_content(&arena, h1).unwrap(), "Hello world!");
    }
}
