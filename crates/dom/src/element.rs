//! Typed element handles
//!
//! An [`Element<K>`] is a `NodeId` tagged with a caller-declared element
//! kind. The kind is a zero-sized marker: re-typing a handle with
//! [`Element::cast`] performs no runtime check, the caller vouches that the
//! node really is that kind of element.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::arena::DomArena;
use crate::error::Result;
use crate::types::{DomNode, NodeId};

/// Marker for a family of elements
pub trait ElementKind {
    /// Interface name, for debug output only
    const NAME: &'static str;
}

macro_rules! element_kinds {
    ($($(#[$meta:meta])* $kind:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            pub enum $kind {}

            impl ElementKind for $kind {
                const NAME: &'static str = stringify!($kind);
            }
        )*
    };
}

element_kinds! {
    /// Any element. The default kind.
    HtmlElement,
    HtmlDivElement,
    HtmlSpanElement,
    HtmlInputElement,
    HtmlImageElement,
    HtmlFormElement,
    HtmlButtonElement,
    HtmlAnchorElement,
}

/// Handle to an element node, typed by the caller
pub struct Element<K: ElementKind = HtmlElement> {
    id: NodeId,
    _kind: PhantomData<fn() -> K>,
}

impl<K: ElementKind> Element<K> {
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            _kind: PhantomData,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Re-type the handle. Unchecked.
    pub fn cast<T: ElementKind>(self) -> Element<T> {
        Element::new(self.id)
    }

    /// Resolve the handle against the arena that produced it
    pub fn node<'a>(&self, arena: &'a DomArena) -> Result<&'a DomNode> {
        arena.get(self.id)
    }
}

impl<K: ElementKind> Clone for Element<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K: ElementKind> Copy for Element<K> {}

impl<K: ElementKind, T: ElementKind> PartialEq<Element<T>> for Element<K> {
    fn eq(&self, other: &Element<T>) -> bool {
        self.id == other.id
    }
}

impl<K: ElementKind> Eq for Element<K> {}

impl<K: ElementKind> Hash for Element<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<K: ElementKind> fmt::Debug for Element<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", K::NAME, self.id)
    }
}

impl<K: ElementKind> From<Element<K>> for NodeId {
    fn from(element: Element<K>) -> Self {
        element.id
    }
}
