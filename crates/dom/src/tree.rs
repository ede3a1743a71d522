//! The host capability the selector engine walks
//!
//! Everything the engine needs from a tree, and nothing more: element
//! links, a `matches` predicate, and a subtree query. The engine forwards
//! selector patterns verbatim; parsing and validating them is the tree's
//! business, and so are the errors that come out of it.

use crate::arena::{DomArena, Sibling};
use crate::error::{DomError, Result};
use crate::selector::SelectorList;
use crate::types::NodeId;

pub trait ElementTree {
    /// Default query root (`document.documentElement`)
    fn document_element(&self) -> Option<NodeId>;

    /// `parentElement`
    fn parent_element(&self, node: NodeId) -> Result<Option<NodeId>>;

    /// `children`: element children in order
    fn element_children(&self, node: NodeId) -> Result<Vec<NodeId>>;

    /// `previousElementSibling`
    fn previous_element_sibling(&self, node: NodeId) -> Result<Option<NodeId>>;

    /// `nextElementSibling`
    fn next_element_sibling(&self, node: NodeId) -> Result<Option<NodeId>>;

    /// `Element.matches`
    fn matches(&self, node: NodeId, pattern: &str) -> Result<bool>;

    /// `querySelectorAll`: matching descendants of `root` in document order
    fn query_selector_all(&self, root: NodeId, pattern: &str) -> Result<Vec<NodeId>>;

    /// `querySelector`: first matching descendant of `root`
    fn query_selector(&self, root: NodeId, pattern: &str) -> Result<Option<NodeId>> {
        Ok(self.query_selector_all(root, pattern)?.into_iter().next())
    }
}

impl ElementTree for DomArena {
    fn document_element(&self) -> Option<NodeId> {
        DomArena::document_element(self)
    }

    fn parent_element(&self, node: NodeId) -> Result<Option<NodeId>> {
        self.get(node)?;
        Ok(self.element_parent(node))
    }

    fn element_children(&self, node: NodeId) -> Result<Vec<NodeId>> {
        self.get(node)?;
        Ok(self.element_children_of(node))
    }

    fn previous_element_sibling(&self, node: NodeId) -> Result<Option<NodeId>> {
        self.get(node)?;
        Ok(self.element_sibling(node, Sibling::Previous))
    }

    fn next_element_sibling(&self, node: NodeId) -> Result<Option<NodeId>> {
        self.get(node)?;
        Ok(self.element_sibling(node, Sibling::Next))
    }

    fn matches(&self, node: NodeId, pattern: &str) -> Result<bool> {
        if !self.get(node)?.is_element() {
            return Err(DomError::NotAnElement(node));
        }
        let selector = SelectorList::parse(pattern)?;
        Ok(selector.matches(self, node))
    }

    fn query_selector_all(&self, root: NodeId, pattern: &str) -> Result<Vec<NodeId>> {
        let selector = SelectorList::parse(pattern)?;
        let found: Vec<NodeId> = self
            .descendant_elements(root)?
            .into_iter()
            .filter(|&id| selector.matches(self, id))
            .collect();
        tracing::trace!("query_selector_all({:?}) under {} -> {} nodes", pattern, root, found.len());
        Ok(found)
    }

    fn query_selector(&self, root: NodeId, pattern: &str) -> Result<Option<NodeId>> {
        let selector = SelectorList::parse(pattern)?;
        Ok(self
            .descendant_elements(root)?
            .into_iter()
            .find(|&id| selector.matches(self, id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DomNode;

    #[test]
    fn test_query_is_scoped_but_selector_is_not() {
        // <section class="outer"><div class="inner"><p/></div></section><p/>
        let mut arena = DomArena::new();
        let body = arena.add_node(DomNode::element("body"));
        arena.set_root(body).unwrap();
        let section = arena
            .append(body, DomNode::element("section").with_attr("class", "outer"))
            .unwrap();
        let inner = arena
            .append(section, DomNode::element("div").with_attr("class", "inner"))
            .unwrap();
        let p = arena.append(inner, DomNode::element("p")).unwrap();
        arena.append(body, DomNode::element("p")).unwrap();

        // Ancestors outside the root may satisfy combinators...
        assert_eq!(arena.query_selector_all(inner, ".outer p").unwrap(), vec![p]);
        // ...but the root itself is never a result.
        assert!(arena.query_selector_all(inner, "div").unwrap().is_empty());
        assert_eq!(arena.query_selector(body, "p").unwrap(), Some(p));
    }

    #[test]
    fn test_matches_rejects_text_nodes() {
        let mut arena = DomArena::new();
        let div = arena.add_node(DomNode::element("div"));
        let text = arena.append(div, DomNode::text("x")).unwrap();

        assert!(matches!(
            arena.matches(text, "div"),
            Err(DomError::NotAnElement(id)) if id == text
        ));
        assert!(matches!(
            arena.matches(div, "div["),
            Err(DomError::InvalidSelector(_))
        ));
        assert!(matches!(arena.parent_element(99), Err(DomError::NodeNotFound(99))));
    }
}
