//! Arena-based DOM tree storage
//!
//! Every node lives in one `Vec<DomNode>` and refers to its relatives by
//! 4-byte index. No Rc/RefCell, no parent back-pointers to keep alive,
//! traversal is a loop over indices.
//!
//! ```text
//! Arena: Vec<DomNode>
//!        [Node0][Node1][Node2]...
//!         ↑ 4-byte index, not 8-byte pointer
//! ```

use crate::error::{DomError, Result};
use crate::types::{DomNode, NodeId, NodeType};
use ahash::AHashMap;

/// Direction of a sibling walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Sibling {
    Previous,
    Next,
}

/// Arena allocator for DOM nodes
#[derive(Debug)]
pub struct DomArena {
    nodes: Vec<DomNode>,

    /// Backend node ID → NodeId lookup (for CDP integration)
    backend_id_map: AHashMap<u32, NodeId>,

    root_id: Option<NodeId>,
}

impl DomArena {
    pub fn new() -> Self {
        Self::with_capacity(1024) // Pre-allocate for typical page
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            backend_id_map: AHashMap::with_capacity(capacity),
            root_id: None,
        }
    }

    /// Add a detached node to the arena, returns its ID
    pub fn add_node(&mut self, mut node: DomNode) -> NodeId {
        let node_id = self.nodes.len() as NodeId;
        node.node_id = node_id;
        if node.backend_node_id != 0 {
            self.backend_id_map.insert(node.backend_node_id, node_id);
        }
        self.nodes.push(node);
        node_id
    }

    /// Attach `child` as the last child of `parent`
    pub fn append_child(&mut self, parent_id: NodeId, child_id: NodeId) -> Result<()> {
        self.get(parent_id)?;
        if self.get(child_id)?.parent_id.is_some() {
            return Err(DomError::AlreadyAttached(child_id));
        }
        // `child` must not be `parent` or one of its ancestors
        let mut cursor = Some(parent_id);
        while let Some(id) = cursor {
            if id == child_id {
                return Err(DomError::WouldCycle {
                    parent: parent_id,
                    child: child_id,
                });
            }
            cursor = self.get(id)?.parent_id;
        }

        self.get_mut(child_id)?.parent_id = Some(parent_id);
        self.get_mut(parent_id)?.children_ids.push(child_id);
        Ok(())
    }

    /// `add_node` + `append_child` in one step
    pub fn append(&mut self, parent_id: NodeId, node: DomNode) -> Result<NodeId> {
        self.get(parent_id)?;
        let child_id = self.add_node(node);
        self.append_child(parent_id, child_id)?;
        Ok(child_id)
    }

    pub fn get(&self, node_id: NodeId) -> Result<&DomNode> {
        self.nodes
            .get(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    pub fn get_mut(&mut self, node_id: NodeId) -> Result<&mut DomNode> {
        self.nodes
            .get_mut(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Get node by backend node ID (from CDP)
    pub fn get_by_backend_id(&self, backend_id: u32) -> Result<&DomNode> {
        let node_id = self
            .backend_id_map
            .get(&backend_id)
            .ok_or(DomError::NodeNotFound(backend_id))?;
        self.get(*node_id)
    }

    pub fn set_root(&mut self, node_id: NodeId) -> Result<()> {
        self.get(node_id)?;
        self.root_id = Some(node_id);
        Ok(())
    }

    pub fn root(&self) -> Result<&DomNode> {
        let root_id = self
            .root_id
            .ok_or_else(|| DomError::CdpError("No root node set".to_string()))?;
        self.get(root_id)
    }

    /// The top element of the tree
    ///
    /// For a document root this is its first element child (`<html>`); an
    /// element root is its own document element.
    pub fn document_element(&self) -> Option<NodeId> {
        let root = self.root().ok()?;
        match root.node_type {
            NodeType::Element => Some(root.node_id),
            NodeType::Document => root
                .children_ids
                .iter()
                .copied()
                .find(|&id| self.is_element(id)),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get parent of a node (any node type)
    pub fn parent(&self, node_id: NodeId) -> Result<Option<&DomNode>> {
        let node = self.get(node_id)?;
        match node.parent_id {
            Some(parent_id) => Ok(Some(self.get(parent_id)?)),
            None => Ok(None),
        }
    }

    /// Traverse tree depth-first, pre-order (document order)
    pub fn traverse_df<F>(&self, start_id: NodeId, mut visit: F) -> Result<()>
    where
        F: FnMut(&DomNode) -> Result<()>,
    {
        let mut stack = vec![start_id];

        while let Some(node_id) = stack.pop() {
            let node = self.get(node_id)?;
            visit(node)?;

            // Push children in reverse order (so they're visited left-to-right)
            for &child_id in node.children_ids.iter().rev() {
                stack.push(child_id);
            }
        }

        Ok(())
    }

    /// Element descendants of `root` in document order, `root` excluded
    pub fn descendant_elements(&self, root_id: NodeId) -> Result<Vec<NodeId>> {
        let mut found = Vec::new();
        self.traverse_df(root_id, |node| {
            if node.node_id != root_id && node.is_element() {
                found.push(node.node_id);
            }
            Ok(())
        })?;
        Ok(found)
    }

    /// Find nodes matching predicate, in arena order
    pub fn find<F>(&self, predicate: F) -> Vec<NodeId>
    where
        F: Fn(&DomNode) -> bool,
    {
        self.nodes
            .iter()
            .filter(|node| predicate(node))
            .map(|node| node.node_id)
            .collect()
    }

    /// Find all elements by tag name
    pub fn find_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.find(|node| node.is_element() && node.node_name.eq_ignore_ascii_case(tag))
    }

    pub(crate) fn is_element(&self, node_id: NodeId) -> bool {
        self.nodes
            .get(node_id as usize)
            .is_some_and(DomNode::is_element)
    }

    /// Parent, if it is an element (`parentElement`)
    pub(crate) fn element_parent(&self, node_id: NodeId) -> Option<NodeId> {
        self.nodes
            .get(node_id as usize)?
            .parent_id
            .filter(|&id| self.is_element(id))
    }

    /// Nearest element sibling in the given direction
    /// (`previousElementSibling` / `nextElementSibling`)
    pub(crate) fn element_sibling(&self, node_id: NodeId, direction: Sibling) -> Option<NodeId> {
        let parent_id = self.nodes.get(node_id as usize)?.parent_id?;
        let siblings = &self.nodes.get(parent_id as usize)?.children_ids;
        let position = siblings.iter().position(|&id| id == node_id)?;

        match direction {
            Sibling::Previous => siblings[..position]
                .iter()
                .rev()
                .copied()
                .find(|&id| self.is_element(id)),
            Sibling::Next => siblings[position + 1..]
                .iter()
                .copied()
                .find(|&id| self.is_element(id)),
        }
    }

    /// Element children in order (`children`)
    pub(crate) fn element_children_of(&self, node_id: NodeId) -> Vec<NodeId> {
        match self.nodes.get(node_id as usize) {
            Some(node) => node
                .children_ids
                .iter()
                .copied()
                .filter(|&id| self.is_element(id))
                .collect(),
            None => Vec::new(),
        }
    }
}

impl Default for DomArena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_basic() {
        let mut arena = DomArena::new();

        let mut node = DomNode::element("div");
        node.backend_node_id = 100;

        let id = arena.add_node(node);
        assert_eq!(id, 0);

        let retrieved = arena.get(id).unwrap();
        assert_eq!(retrieved.node_name, "div");
        assert_eq!(retrieved.node_id, 0);
        assert_eq!(arena.get_by_backend_id(100).unwrap().node_id, id);
        assert!(matches!(arena.get(9), Err(DomError::NodeNotFound(9))));
    }

    #[test]
    fn test_append_child_rejects_attached_node() {
        let mut arena = DomArena::new();
        let a = arena.add_node(DomNode::element("div"));
        let b = arena.add_node(DomNode::element("div"));
        let c = arena.append(a, DomNode::element("span")).unwrap();

        assert!(arena.append_child(b, c).is_err());
        assert_eq!(arena.parent(c).unwrap().unwrap().node_id, a);
    }

    #[test]
    fn test_append_child_rejects_cycles() {
        let mut arena = DomArena::new();
        let a = arena.add_node(DomNode::element("div"));
        let b = arena.append(a, DomNode::element("p")).unwrap();
        let c = arena.append(b, DomNode::element("span")).unwrap();

        assert!(matches!(
            arena.append_child(c, a),
            Err(DomError::WouldCycle { parent, child }) if parent == c && child == a
        ));
        assert!(matches!(arena.append_child(a, a), Err(DomError::WouldCycle { .. })));

        // tree is unchanged and still terminates
        assert_eq!(arena.parent(a).unwrap(), None);
        assert!(arena.get(c).unwrap().children_ids.is_empty());
        assert_eq!(arena.descendant_elements(a).unwrap(), vec![b, c]);
    }

    #[test]
    fn test_traverse_df() {
        let mut arena = DomArena::new();

        // root -> [child1 -> [grandchild], child2]
        let root = arena.add_node(DomNode::element("div"));
        let child1 = arena.append(root, DomNode::element("span")).unwrap();
        arena.append(child1, DomNode::element("b")).unwrap();
        arena.append(root, DomNode::element("p")).unwrap();

        let mut visited = Vec::new();
        arena
            .traverse_df(root, |node| {
                visited.push(node.node_name.clone());
                Ok(())
            })
            .unwrap();

        assert_eq!(visited, vec!["div", "span", "b", "p"]);
    }

    #[test]
    fn test_element_links_skip_text_nodes() {
        let mut arena = DomArena::new();
        let doc = arena.add_node(DomNode::document());
        arena.set_root(doc).unwrap();
        let html = arena.append(doc, DomNode::element("html")).unwrap();
        let a = arena.append(html, DomNode::element("a")).unwrap();
        arena.append(html, DomNode::text("\n  ")).unwrap();
        let b = arena.append(html, DomNode::element("b")).unwrap();

        assert_eq!(arena.document_element(), Some(html));
        assert_eq!(arena.element_sibling(b, Sibling::Previous), Some(a));
        assert_eq!(arena.element_sibling(a, Sibling::Next), Some(b));
        assert_eq!(arena.element_sibling(a, Sibling::Previous), None);
        assert_eq!(arena.element_children_of(html), vec![a, b]);
        // the document node is not an element
        assert_eq!(arena.element_parent(html), None);
        assert_eq!(arena.element_parent(a), Some(html));
    }

    #[test]
    fn test_descendant_elements_excludes_root() {
        let mut arena = DomArena::new();
        let root = arena.add_node(DomNode::element("div"));
        let a = arena.append(root, DomNode::element("a")).unwrap();
        let b = arena.append(a, DomNode::element("b")).unwrap();
        arena.append(a, DomNode::text("x")).unwrap();
        let c = arena.append(root, DomNode::element("c")).unwrap();

        assert_eq!(arena.descendant_elements(root).unwrap(), vec![a, b, c]);
        assert_eq!(arena.find_by_tag("B"), vec![b]);
    }
}
