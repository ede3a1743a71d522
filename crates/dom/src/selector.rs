//! CSS selector parsing and matching
//!
//! Supported grammar:
//!
//! ```text
//! list      := complex ( ',' complex )*
//! complex   := compound ( combinator? compound )*      (whitespace = descendant)
//! combinator:= '>' | '+' | '~'
//! compound  := ( '*' | tag )? ( '#id' | '.class' | '[attr]' | ':pseudo' )*
//! pseudo    := first-child | last-child | only-child | empty | not( list )
//! ```
//!
//! Anything else is rejected with [`DomError::InvalidSelector`] carrying the
//! full pattern, the way a browser throws `SyntaxError` from
//! `querySelectorAll`.

use std::str::FromStr;

use crate::arena::{DomArena, Sibling};
use crate::error::{DomError, Result};
use crate::types::{DomNode, NodeId, NodeType};

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrOperator {
    Exists,
    /// `=`
    Equals(String),
    /// `~=`
    Includes(String),
    /// `|=`
    DashMatch(String),
    /// `^=`
    Prefix(String),
    /// `$=`
    Suffix(String),
    /// `*=`
    Substring(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrSelector {
    name: String,
    operator: AttrOperator,
}

impl AttrSelector {
    fn matches(&self, node: &DomNode) -> bool {
        let Some(value) = node.attr(&self.name) else {
            return false;
        };

        match &self.operator {
            AttrOperator::Exists => true,
            AttrOperator::Equals(expected) => value == expected,
            AttrOperator::Includes(expected) => {
                !expected.is_empty() && value.split_ascii_whitespace().any(|v| v == expected)
            }
            AttrOperator::DashMatch(expected) => {
                value == expected
                    || value
                        .strip_prefix(expected.as_str())
                        .is_some_and(|rest| rest.starts_with('-'))
            }
            AttrOperator::Prefix(expected) => !expected.is_empty() && value.starts_with(expected),
            AttrOperator::Suffix(expected) => !expected.is_empty() && value.ends_with(expected),
            AttrOperator::Substring(expected) => !expected.is_empty() && value.contains(expected),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PseudoClass {
    FirstChild,
    LastChild,
    OnlyChild,
    Empty,
    Not(Vec<ComplexSelector>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct CompoundSelector {
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
    attrs: Vec<AttrSelector>,
    pseudo_classes: Vec<PseudoClass>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
    AdjacentSibling,
    GeneralSibling,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SelectorPart {
    compound: CompoundSelector,
    // Relation to the part on the left; None for the leftmost part.
    combinator: Option<Combinator>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ComplexSelector {
    parts: Vec<SelectorPart>,
}

/// A parsed, comma-separated selector group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    selectors: Vec<ComplexSelector>,
}

impl SelectorList {
    pub fn parse(pattern: &str) -> Result<Self> {
        let mut parser = Parser::new(pattern);
        let selectors = parser.parse_list(false)?;
        if parser.peek().is_some() {
            return Err(parser.error());
        }
        Ok(Self { selectors })
    }

    /// Does the element `node_id` match any selector in the group?
    ///
    /// Non-elements and unknown ids never match.
    pub fn matches(&self, arena: &DomArena, node_id: NodeId) -> bool {
        arena.is_element(node_id)
            && self
                .selectors
                .iter()
                .any(|selector| matches_complex(arena, node_id, &selector.parts))
    }
}

impl FromStr for SelectorList {
    type Err = DomError;

    fn from_str(pattern: &str) -> Result<Self> {
        Self::parse(pattern)
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Right-to-left match with backtracking over descendant/sibling combinators.
fn matches_complex(arena: &DomArena, node_id: NodeId, parts: &[SelectorPart]) -> bool {
    let Some((last, rest)) = parts.split_last() else {
        return false;
    };
    if !matches_compound(arena, node_id, &last.compound) {
        return false;
    }
    if rest.is_empty() {
        return true;
    }

    match last.combinator.unwrap_or(Combinator::Descendant) {
        Combinator::Child => arena
            .element_parent(node_id)
            .is_some_and(|parent| matches_complex(arena, parent, rest)),
        Combinator::Descendant => {
            let mut cursor = arena.element_parent(node_id);
            while let Some(ancestor) = cursor {
                if matches_complex(arena, ancestor, rest) {
                    return true;
                }
                cursor = arena.element_parent(ancestor);
            }
            false
        }
        Combinator::AdjacentSibling => arena
            .element_sibling(node_id, Sibling::Previous)
            .is_some_and(|sibling| matches_complex(arena, sibling, rest)),
        Combinator::GeneralSibling => {
            let mut cursor = arena.element_sibling(node_id, Sibling::Previous);
            while let Some(sibling) = cursor {
                if matches_complex(arena, sibling, rest) {
                    return true;
                }
                cursor = arena.element_sibling(sibling, Sibling::Previous);
            }
            false
        }
    }
}

fn matches_compound(arena: &DomArena, node_id: NodeId, compound: &CompoundSelector) -> bool {
    let Ok(node) = arena.get(node_id) else {
        return false;
    };

    if let Some(tag) = &compound.tag {
        if !node.node_name.eq_ignore_ascii_case(tag) {
            return false;
        }
    }
    if !compound.ids.iter().all(|id| node.attr("id") == Some(id.as_str())) {
        return false;
    }
    if !compound.classes.iter().all(|class| node.has_class(class)) {
        return false;
    }
    if !compound.attrs.iter().all(|attr| attr.matches(node)) {
        return false;
    }

    compound
        .pseudo_classes
        .iter()
        .all(|pseudo| matches_pseudo(arena, node, pseudo))
}

fn matches_pseudo(arena: &DomArena, node: &DomNode, pseudo: &PseudoClass) -> bool {
    let is_edge = |direction| {
        node.parent_id.is_some() && arena.element_sibling(node.node_id, direction).is_none()
    };

    match pseudo {
        PseudoClass::FirstChild => is_edge(Sibling::Previous),
        PseudoClass::LastChild => is_edge(Sibling::Next),
        PseudoClass::OnlyChild => is_edge(Sibling::Previous) && is_edge(Sibling::Next),
        PseudoClass::Empty => node.children_ids.iter().all(|&id| {
            arena.get(id).map_or(true, |child| match child.node_type {
                NodeType::Element => false,
                NodeType::Text | NodeType::CdataSection => child.node_value.is_empty(),
                _ => true,
            })
        }),
        PseudoClass::Not(selectors) => !selectors
            .iter()
            .any(|selector| matches_complex(arena, node.node_id, &selector.parts)),
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self) -> DomError {
        DomError::InvalidSelector(self.source.to_string())
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error())
        }
    }

    /// Returns whether any whitespace was consumed
    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.pos += 1;
        }
        self.pos > start
    }

    /// `nested` lists end at `)`, top-level lists at end of input.
    fn parse_list(&mut self, nested: bool) -> Result<Vec<ComplexSelector>> {
        let mut selectors = Vec::new();

        loop {
            self.skip_whitespace();
            selectors.push(self.parse_complex()?);
            self.skip_whitespace();

            match self.peek() {
                Some(',') => {
                    self.pos += 1;
                }
                Some(')') if nested => return Ok(selectors),
                None if !nested => return Ok(selectors),
                _ => return Err(self.error()),
            }
        }
    }

    fn parse_complex(&mut self) -> Result<ComplexSelector> {
        let mut parts = Vec::new();
        let mut combinator = None;

        loop {
            let compound = self.parse_compound()?;
            parts.push(SelectorPart {
                compound,
                combinator,
            });

            let had_whitespace = self.skip_whitespace();
            combinator = match self.peek() {
                Some('>') => Some(Combinator::Child),
                Some('+') => Some(Combinator::AdjacentSibling),
                Some('~') => Some(Combinator::GeneralSibling),
                Some(',') | Some(')') | None => break,
                Some(_) if had_whitespace => Some(Combinator::Descendant),
                Some(_) => return Err(self.error()),
            };

            if combinator != Some(Combinator::Descendant) {
                self.pos += 1;
                self.skip_whitespace();
            }
        }

        Ok(ComplexSelector { parts })
    }

    fn parse_compound(&mut self) -> Result<CompoundSelector> {
        let start = self.pos;
        let mut compound = CompoundSelector::default();

        if self.eat('*') {
            // universal: no constraint
        } else if self.peek().is_some_and(is_ident_start) {
            compound.tag = Some(self.parse_ident()?);
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    let id = self.parse_ident()?;
                    compound.ids.push(id);
                }
                Some('.') => {
                    self.pos += 1;
                    let class = self.parse_ident()?;
                    compound.classes.push(class);
                }
                Some('[') => {
                    self.pos += 1;
                    let attr = self.parse_attr()?;
                    compound.attrs.push(attr);
                }
                Some(':') => {
                    self.pos += 1;
                    let pseudo = self.parse_pseudo()?;
                    compound.pseudo_classes.push(pseudo);
                }
                _ => break,
            }
        }

        if self.pos == start {
            return Err(self.error());
        }
        Ok(compound)
    }

    fn parse_ident(&mut self) -> Result<String> {
        if !self.peek().is_some_and(is_ident_start) {
            return Err(self.error());
        }
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.pos += 1;
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    /// After `[`
    fn parse_attr(&mut self) -> Result<AttrSelector> {
        self.skip_whitespace();
        let name = self.parse_ident()?;
        self.skip_whitespace();

        let op = match self.bump() {
            Some(']') => {
                return Ok(AttrSelector {
                    name,
                    operator: AttrOperator::Exists,
                })
            }
            Some('=') => '=',
            Some(op @ ('~' | '|' | '^' | '$' | '*')) => {
                self.expect('=')?;
                op
            }
            _ => return Err(self.error()),
        };

        self.skip_whitespace();
        let value = self.parse_attr_value()?;
        self.skip_whitespace();
        self.expect(']')?;

        let operator = match op {
            '=' => AttrOperator::Equals(value),
            '~' => AttrOperator::Includes(value),
            '|' => AttrOperator::DashMatch(value),
            '^' => AttrOperator::Prefix(value),
            '$' => AttrOperator::Suffix(value),
            _ => AttrOperator::Substring(value),
        };
        Ok(AttrSelector { name, operator })
    }

    fn parse_attr_value(&mut self) -> Result<String> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let mut value = String::new();
                loop {
                    match self.bump() {
                        Some(c) if c == quote => return Ok(value),
                        Some('\\') | None => return Err(self.error()),
                        Some(c) => value.push(c),
                    }
                }
            }
            _ => self.parse_ident(),
        }
    }

    /// After `:`
    fn parse_pseudo(&mut self) -> Result<PseudoClass> {
        let name = self.parse_ident()?.to_ascii_lowercase();

        match name.as_str() {
            "first-child" => Ok(PseudoClass::FirstChild),
            "last-child" => Ok(PseudoClass::LastChild),
            "only-child" => Ok(PseudoClass::OnlyChild),
            "empty" => Ok(PseudoClass::Empty),
            "not" => {
                self.expect('(')?;
                let selectors = self.parse_list(true)?;
                self.expect(')')?;
                Ok(PseudoClass::Not(selectors))
            }
            _ => Err(self.error()),
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '-' || !c.is_ascii()
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || !c.is_ascii()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DomNode;

    /// `<div id="main" class="box wide" data-kind="en-US">`
    /// `  <p class="lead">text</p><span></span><p lang="fr"></p>`
    /// `</div>`
    fn sample() -> (DomArena, [NodeId; 4]) {
        let mut arena = DomArena::new();
        let div = arena.add_node(
            DomNode::element("DIV")
                .with_attr("id", "main")
                .with_attr("class", "box wide")
                .with_attr("data-kind", "en-US"),
        );
        arena.set_root(div).unwrap();
        let p1 = arena
            .append(div, DomNode::element("P").with_attr("class", "lead"))
            .unwrap();
        arena.append(p1, DomNode::text("text")).unwrap();
        let span = arena.append(div, DomNode::element("SPAN")).unwrap();
        let p2 = arena
            .append(div, DomNode::element("P").with_attr("lang", "fr"))
            .unwrap();
        (arena, [div, p1, span, p2])
    }

    fn matches(arena: &DomArena, pattern: &str, node: NodeId) -> bool {
        SelectorList::parse(pattern).unwrap().matches(arena, node)
    }

    #[test]
    fn test_compound_selectors() {
        let (arena, [div, p1, span, _]) = sample();

        assert!(matches(&arena, "div", div));
        assert!(matches(&arena, "*", span));
        assert!(matches(&arena, "div#main.box.wide", div));
        assert!(!matches(&arena, "div.box.narrow", div));
        assert!(matches(&arena, "p.lead", p1));
        assert!(!matches(&arena, "#main", p1));
        // repeated ids are valid and all must hold
        assert!(matches(&arena, "#main#main", div));
        assert!(!matches(&arena, "#main#other", div));
    }

    #[test]
    fn test_attribute_operators() {
        let (arena, [div, ..]) = sample();

        assert!(matches(&arena, "[data-kind]", div));
        assert!(matches(&arena, "[data-kind=en-US]", div));
        assert!(matches(&arena, "[data-kind='en-US']", div));
        assert!(matches(&arena, "[data-kind|=en]", div));
        assert!(matches(&arena, "[class~=wide]", div));
        assert!(matches(&arena, "[class^=bo]", div));
        assert!(matches(&arena, "[class$=ide]", div));
        assert!(matches(&arena, "[class*=\"x w\"]", div));
        assert!(!matches(&arena, "[class~=wi]", div));
        assert!(!matches(&arena, "[class^='']", div));
    }

    #[test]
    fn test_combinators() {
        let (arena, [_, p1, span, p2]) = sample();

        assert!(matches(&arena, "div > p", p1));
        assert!(matches(&arena, "#main span", span));
        assert!(matches(&arena, "p + span", span));
        assert!(matches(&arena, "p.lead ~ p", p2));
        assert!(!matches(&arena, "p.lead + p", p2));
        assert!(!matches(&arena, "span > p", p2));
    }

    #[test]
    fn test_descendant_backtracks() {
        // <a class="x"><b class="x"><c/></b></a>: "a.x c" needs to skip b.x
        let mut arena = DomArena::new();
        let a = arena.add_node(DomNode::element("a").with_attr("class", "x"));
        let b = arena
            .append(a, DomNode::element("b").with_attr("class", "x"))
            .unwrap();
        let c = arena.append(b, DomNode::element("c")).unwrap();

        assert!(matches(&arena, "a.x c", c));
        assert!(matches(&arena, "a > .x > c", c));
        assert!(!matches(&arena, "a > c", c));
    }

    #[test]
    fn test_pseudo_classes() {
        let (arena, [div, p1, span, p2]) = sample();

        assert!(matches(&arena, "p:first-child", p1));
        assert!(matches(&arena, "p:last-child", p2));
        assert!(!matches(&arena, "span:first-child", span));
        assert!(matches(&arena, "span:empty", span));
        assert!(!matches(&arena, "p:empty", p1));
        assert!(matches(&arena, "p:not(.lead)", p2));
        assert!(!matches(&arena, "p:not(.lead, [lang])", p2));
        // the root has no parent, so it is nobody's first child
        assert!(!matches(&arena, ":first-child", div));
    }

    #[test]
    fn test_groups() {
        let (arena, [_, p1, span, _]) = sample();

        assert!(matches(&arena, "span, p.lead", p1));
        assert!(matches(&arena, "  span ,p.lead  ", span));
    }

    #[test]
    fn test_invalid_selectors() {
        for pattern in [
            "", "   ", ".", "#", "div >", "> div", "div,", "[", "[=x]", "[a=]", "[a='x]",
            "p:hover", "p::before", ":not(p", "a b)", "div!",
        ] {
            match SelectorList::parse(pattern) {
                Err(DomError::InvalidSelector(p)) => assert_eq!(p, pattern),
                other => panic!("{:?} should be invalid, got {:?}", pattern, other),
            }
        }
    }
}
