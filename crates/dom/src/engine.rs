//! Selector engine - query and walk an element tree by selector
//!
//! `find`/`find_one` hand the pattern to the tree's own query primitive.
//! `childrens`, `parents`, `prev` and `next` are single-direction walks
//! that test each visited element with the tree's `matches` and stop at
//! the first hit. Nothing is cached; every call walks the tree as it is
//! now.
//!
//! Results are plain [`Element`] handles. Call [`Element::cast`] to view
//! one as a more specific element kind.

use crate::element::{Element, ElementKind};
use crate::error::Result;
use crate::tree::ElementTree;
use crate::types::NodeId;

/// Read-only query helper over an [`ElementTree`]
pub struct SelectorEngine<'a, T: ElementTree + ?Sized> {
    tree: &'a T,
}

impl<'a, T: ElementTree + ?Sized> SelectorEngine<'a, T> {
    pub fn new(tree: &'a T) -> Self {
        Self { tree }
    }

    /// All elements under the document element matching `selectors`.
    ///
    /// Empty when nothing matches, or when the tree has no document element.
    pub fn find(&self, selectors: &str) -> Result<Vec<Element>> {
        match self.tree.document_element() {
            Some(root) => self.query_all(root, selectors),
            None => Ok(Vec::new()),
        }
    }

    /// All elements under `root` matching `selectors`, in document order.
    /// `root` itself is never part of the result.
    pub fn find_in<K: ElementKind>(&self, selectors: &str, root: Element<K>) -> Result<Vec<Element>> {
        self.query_all(root.id(), selectors)
    }

    /// [`find`](Self::find) with the results viewed as kind `R`. The kind is
    /// not checked against the matched elements.
    pub fn find_as<R: ElementKind>(&self, selectors: &str) -> Result<Vec<Element<R>>> {
        Ok(self.find(selectors)?.into_iter().map(Element::cast).collect())
    }

    /// First element under the document element matching `selectors`
    pub fn find_one(&self, selectors: &str) -> Result<Option<Element>> {
        match self.tree.document_element() {
            Some(root) => self.query_one(root, selectors),
            None => Ok(None),
        }
    }

    /// [`find_one`](Self::find_one) with the result viewed as kind `R`
    pub fn find_one_as<R: ElementKind>(&self, selectors: &str) -> Result<Option<Element<R>>> {
        Ok(self.find_one(selectors)?.map(Element::cast))
    }

    /// First element under `root` matching `selectors`
    pub fn find_one_in<K: ElementKind>(
        &self,
        selectors: &str,
        root: Element<K>,
    ) -> Result<Option<Element>> {
        self.query_one(root.id(), selectors)
    }

    /// Direct children of `element` matching `selector`. Grandchildren are
    /// never considered.
    pub fn childrens<K: ElementKind>(&self, element: Element<K>, selector: &str) -> Result<Vec<Element>> {
        let mut matched = Vec::new();
        for child in self.tree.element_children(element.id())? {
            if self.tree.matches(child, selector)? {
                matched.push(Element::new(child));
            }
        }
        Ok(matched)
    }

    /// Closest ancestor matching `selector`. The walk starts at the parent;
    /// `element` itself is never tested.
    pub fn parents<K: ElementKind>(&self, element: Element<K>, selector: &str) -> Result<Option<Element>> {
        self.walk(element.id(), selector, |tree, id| tree.parent_element(id))
    }

    /// The parent element, `None` at the top of the tree
    pub fn parent<K: ElementKind>(&self, element: Element<K>) -> Result<Option<Element>> {
        Ok(self.tree.parent_element(element.id())?.map(Element::new))
    }

    /// Nearest preceding sibling matching `selector`
    pub fn prev<K: ElementKind>(&self, element: Element<K>, selector: &str) -> Result<Option<Element>> {
        self.walk(element.id(), selector, |tree, id| tree.previous_element_sibling(id))
    }

    /// Nearest following sibling matching `selector`
    pub fn next<K: ElementKind>(&self, element: Element<K>, selector: &str) -> Result<Option<Element>> {
        self.walk(element.id(), selector, |tree, id| tree.next_element_sibling(id))
    }

    fn query_all(&self, root: NodeId, selectors: &str) -> Result<Vec<Element>> {
        Ok(self
            .tree
            .query_selector_all(root, selectors)?
            .into_iter()
            .map(Element::new)
            .collect())
    }

    fn query_one(&self, root: NodeId, selectors: &str) -> Result<Option<Element>> {
        Ok(self.tree.query_selector(root, selectors)?.map(Element::new))
    }

    /// Follow `step` from `start` (exclusive) until an element matches.
    fn walk<F>(&self, start: NodeId, selector: &str, step: F) -> Result<Option<Element>>
    where
        F: Fn(&T, NodeId) -> Result<Option<NodeId>>,
    {
        let mut cursor = step(self.tree, start)?;

        while let Some(id) = cursor {
            if self.tree.matches(id, selector)? {
                return Ok(Some(Element::new(id)));
            }
            cursor = step(self.tree, id)?;
        }

        Ok(None)
    }
}

impl<T: ElementTree + ?Sized> Clone for SelectorEngine<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ElementTree + ?Sized> Copy for SelectorEngine<'_, T> {}
