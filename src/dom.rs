//! In-memory element/text tree used by [`DocumentSurface`](crate::editor::DocumentSurface).
//!
//! Positions follow DOM boundary-point rules: a [`Position`] whose path names
//! a text node counts characters, one naming an element counts children.
//! Range removal mirrors `Range.deleteContents`/`extractContents`: partially
//! covered containers are split and kept, fully covered children are moved
//! out, and a partially covered mention element goes as a whole.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::directory::Category;
use crate::error::SurfaceError;
use crate::surface::{MentionToken, NodePath, NodeWalk, Position, WalkedNode};

pub const MENTION_CLASS: &str = "mention";

const BLOCK_TAGS: &[&str] = &[
    "div",
    "p",
    "li",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "blockquote",
    "pre",
];
const LIST_TAGS: &[&str] = &["ul", "ol"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    pub fn is_mention(&self) -> bool {
        self.as_element().is_some_and(Element::is_mention)
    }

    pub fn text_content(&self) -> String {
        match self {
            Node::Text(text) => text.clone(),
            Node::Element(element) => element.text_content(),
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    pub styles: BTreeMap<String, String>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Self::default()
        }
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn with_text(self, text: &str) -> Self {
        self.with_children(vec![Node::text(text)])
    }

    pub fn with_style(mut self, property: &str, value: &str) -> Self {
        self.styles
            .insert(property.to_string(), value.to_string());
        self
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    /// Non-editable inline element carrying a mention token.
    pub fn mention(token: &MentionToken) -> Self {
        Element::new("span")
            .with_attribute("class", MENTION_CLASS)
            .with_attribute("contenteditable", "false")
            .with_attribute("data-type", token.category.tag())
            .with_attribute("data-id", &token.referenced_id.to_string())
            .with_text(&token.display_label)
    }

    pub fn is_mention(&self) -> bool {
        self.attributes
            .get("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == MENTION_CLASS))
    }

    pub fn mention_token(&self) -> Option<MentionToken> {
        if !self.is_mention() {
            return None;
        }
        let category = Category::from_tag(self.attributes.get("data-type")?)?;
        let referenced_id = self.attributes.get("data-id")?.parse().ok()?;
        Some(MentionToken {
            category,
            referenced_id,
            display_label: self.text_content(),
        })
    }

    pub fn is_block(&self) -> bool {
        BLOCK_TAGS.contains(&self.tag.as_str())
    }

    pub fn is_list(&self) -> bool {
        LIST_TAGS.contains(&self.tag.as_str())
    }

    /// Blocks and list containers; neither may sit inside an inline wrapper.
    pub fn is_block_level(&self) -> bool {
        self.is_block() || self.is_list()
    }

    pub fn style(&self, property: &str) -> Option<&str> {
        self.styles.get(property).map(String::as_str)
    }

    pub fn marks_bold(&self) -> bool {
        matches!(self.tag.as_str(), "b" | "strong")
            || self.style("font-weight").is_some_and(|weight| {
                weight == "bold" || weight == "bolder" || weight.parse::<u32>().is_ok_and(|w| w >= 600)
            })
    }

    pub fn marks_italic(&self) -> bool {
        matches!(self.tag.as_str(), "i" | "em")
            || self
                .style("font-style")
                .is_some_and(|style| style == "italic" || style == "oblique")
    }

    pub fn marks_underline(&self) -> bool {
        self.tag == "u"
            || self
                .style("text-decoration")
                .is_some_and(|decoration| decoration.contains("underline"))
    }

    /// Font named by this element, either as a style or a `<font face>`.
    pub fn font_family(&self) -> Option<&str> {
        self.style("font-family").or_else(|| {
            (self.tag == "font")
                .then(|| self.attributes.get("face").map(String::as_str))
                .flatten()
        })
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            match child {
                Node::Text(text) => out.push_str(text),
                Node::Element(element) => out.push_str(&element.text_content()),
            }
        }
        out
    }

    /// Copy of this element without its children.
    pub fn shallow_clone(&self) -> Self {
        Self {
            tag: self.tag.clone(),
            attributes: self.attributes.clone(),
            styles: self.styles.clone(),
            children: Vec::new(),
        }
    }

    fn same_shape(&self, other: &Element) -> bool {
        self.tag == other.tag && self.attributes == other.attributes && self.styles == other.styles
    }

    pub fn node_at(&self, path: &[usize]) -> Option<&Node> {
        let (first, rest) = path.split_first()?;
        let mut node = self.children.get(*first)?;
        for idx in rest {
            node = node.as_element()?.children.get(*idx)?;
        }
        Some(node)
    }

    pub fn node_at_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        let (first, rest) = path.split_first()?;
        let mut node = self.children.get_mut(*first)?;
        for idx in rest {
            node = node.as_element_mut()?.children.get_mut(*idx)?;
        }
        Some(node)
    }

    /// The element at `path`; the empty path is `self`.
    pub fn element_at(&self, path: &[usize]) -> Option<&Element> {
        if path.is_empty() {
            return Some(self);
        }
        self.node_at(path)?.as_element()
    }

    pub fn element_at_mut(&mut self, path: &[usize]) -> Option<&mut Element> {
        if path.is_empty() {
            return Some(self);
        }
        self.node_at_mut(path)?.as_element_mut()
    }

    /// Outermost mention element on `path`, if the path runs through one.
    pub fn mention_ancestor(&self, path: &NodePath) -> Option<NodePath> {
        let indices = path.indices();
        for depth in 1..=indices.len() {
            let prefix = &indices[..depth];
            if self.node_at(prefix).is_some_and(Node::is_mention) {
                return Some(NodePath::new(prefix.to_vec()));
            }
        }
        None
    }

    /// Deepest block element that is `path` itself or one of its ancestors.
    pub fn block_ancestor(&self, path: &NodePath) -> Option<NodePath> {
        let indices = path.indices();
        (1..=indices.len()).rev().find_map(|depth| {
            let prefix = &indices[..depth];
            self.node_at(prefix)
                .and_then(Node::as_element)
                .filter(|element| element.is_block())
                .map(|_| NodePath::new(prefix.to_vec()))
        })
    }

    /// Paths of every element on `path` (excluding `self`), innermost first.
    pub fn element_ancestors(&self, path: &NodePath) -> Vec<NodePath> {
        let indices = path.indices();
        (1..=indices.len())
            .rev()
            .filter(|depth| {
                self.node_at(&indices[..*depth])
                    .is_some_and(|node| node.as_element().is_some())
            })
            .map(|depth| NodePath::new(indices[..depth].to_vec()))
            .collect()
    }
}

pub(crate) fn char_to_byte_idx(text: &str, char_idx: usize) -> usize {
    if char_idx == 0 {
        return 0;
    }
    text.char_indices()
        .nth(char_idx)
        .map(|(byte_idx, _)| byte_idx)
        .unwrap_or(text.len())
}

pub(crate) fn split_text(text: &str, char_idx: usize) -> (String, String) {
    let byte_idx = char_to_byte_idx(text, char_idx);
    (text[..byte_idx].to_string(), text[byte_idx..].to_string())
}

/// Document order of two boundary points.
pub fn compare_positions(a: &Position, b: &Position) -> Ordering {
    let left = a.path.indices();
    let right = b.path.indices();
    let common = left
        .iter()
        .zip(right.iter())
        .take_while(|(l, r)| l == r)
        .count();
    match (left.get(common), right.get(common)) {
        (None, None) => a.offset.cmp(&b.offset),
        // `a` is an ancestor container of `b`.
        (None, Some(child)) => {
            if a.offset <= *child {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        }
        (Some(child), None) => {
            if b.offset <= *child {
                Ordering::Greater
            } else {
                Ordering::Less
            }
        }
        (Some(l), Some(r)) => l.cmp(r),
    }
}

/// Boundary point relative to some element on the way down.
#[derive(Clone, Copy)]
struct Bound<'a> {
    path: &'a [usize],
    offset: usize,
}

impl<'a> Bound<'a> {
    fn of(position: &'a Position) -> Self {
        Self {
            path: position.path.indices(),
            offset: position.offset,
        }
    }

    fn descend(self) -> Self {
        Self {
            path: &self.path[1..],
            offset: self.offset,
        }
    }
}

enum Taken {
    Part(Option<Node>),
    Whole,
}

fn take_from_child(child: &mut Node, start: Option<Bound<'_>>, end: Option<Bound<'_>>) -> Taken {
    match child {
        Node::Text(text) => {
            let len = text.chars().count();
            let from = start.map_or(0, |bound| bound.offset.min(len));
            let to = end.map_or(len, |bound| bound.offset.min(len)).max(from);
            let from_byte = char_to_byte_idx(text, from);
            let to_byte = char_to_byte_idx(text, to);
            let taken: String = text.drain(from_byte..to_byte).collect();
            Taken::Part((!taken.is_empty()).then(|| Node::Text(taken)))
        }
        Node::Element(element) if element.is_mention() => Taken::Whole,
        Node::Element(element) => {
            let mut clone = element.shallow_clone();
            clone.children = extract_between(element, start, end);
            Taken::Part(Some(Node::Element(clone)))
        }
    }
}

fn extract_between(
    element: &mut Element,
    start: Option<Bound<'_>>,
    end: Option<Bound<'_>>,
) -> Vec<Node> {
    let len = element.children.len();
    let (first_full, start_partial) = match start {
        None => (0, None),
        Some(bound) if bound.path.is_empty() => (bound.offset.min(len), None),
        Some(bound) => (bound.path[0] + 1, Some((bound.path[0], bound.descend()))),
    };
    let (end_full, end_partial) = match end {
        None => (len, None),
        Some(bound) if bound.path.is_empty() => (bound.offset.min(len), None),
        Some(bound) => (bound.path[0], Some((bound.path[0], bound.descend()))),
    };

    if let (Some((start_idx, start_bound)), Some((end_idx, end_bound))) = (start_partial, end_partial) {
        if start_idx == end_idx {
            let Some(child) = element.children.get_mut(start_idx) else {
                return Vec::new();
            };
            return match take_from_child(child, Some(start_bound), Some(end_bound)) {
                Taken::Part(node) => node.into_iter().collect(),
                Taken::Whole => vec![element.children.remove(start_idx)],
            };
        }
    }

    let mut tail = Vec::new();
    if let Some((idx, bound)) = end_partial {
        if let Some(child) = element.children.get_mut(idx) {
            match take_from_child(child, None, Some(bound)) {
                Taken::Part(node) => tail.extend(node),
                Taken::Whole => tail.push(element.children.remove(idx)),
            }
        }
    }

    let end_full = end_full.min(element.children.len());
    let middle: Vec<Node> = if first_full < end_full {
        element.children.drain(first_full..end_full).collect()
    } else {
        Vec::new()
    };

    let mut head = Vec::new();
    if let Some((idx, bound)) = start_partial {
        if let Some(child) = element.children.get_mut(idx) {
            match take_from_child(child, Some(bound), None) {
                Taken::Part(node) => head.extend(node),
                Taken::Whole => head.push(element.children.remove(idx)),
            }
        }
    }

    head.extend(middle);
    head.extend(tail);
    head
}

/// Moves the contents between `start` and `end` out of the tree. `start`
/// stays a valid position afterwards.
pub fn extract_range(root: &mut Element, start: &Position, end: &Position) -> Vec<Node> {
    if compare_positions(start, end) != Ordering::Less {
        return Vec::new();
    }
    extract_between(root, Some(Bound::of(start)), Some(Bound::of(end)))
}

/// Inserts `node` at `at`, splitting a text node when needed. Returns the
/// position right after the inserted node.
pub fn insert_node(root: &mut Element, at: &Position, node: Node) -> Result<Position, SurfaceError> {
    match root.node_at_mut(at.path.indices()) {
        Some(Node::Text(text)) => {
            let Some(parent_path) = at.path.parent() else {
                return Err(SurfaceError::InvalidPosition(format!("{at:?}")));
            };
            let idx = at.path.last().unwrap_or(0);
            let (left, right) = split_text(text, at.offset);
            *text = left;
            let Some(parent) = root.element_at_mut(parent_path.indices()) else {
                return Err(SurfaceError::InvalidPosition(format!("{at:?}")));
            };
            parent.children.insert(idx + 1, node);
            if !right.is_empty() {
                parent.children.insert(idx + 2, Node::Text(right));
            }
            Ok(Position::new(parent_path, idx + 2))
        }
        _ => {
            let Some(parent) = root.element_at_mut(at.path.indices()) else {
                return Err(SurfaceError::InvalidPosition(format!("{at:?}")));
            };
            if at.offset > parent.children.len() {
                return Err(SurfaceError::InvalidPosition(format!("{at:?}")));
            }
            parent.children.insert(at.offset, node);
            Ok(Position::new(at.path.clone(), at.offset + 1))
        }
    }
}

/// Replaces the element at `parent_path` with up to three copies holding the
/// children before, at, and after `child_idx`. Returns the path of the copy
/// holding `child_idx`.
pub fn split_around(root: &mut Element, parent_path: &NodePath, child_idx: usize) -> Option<NodePath> {
    let grand_path = parent_path.parent()?;
    let slot = parent_path.last()?;
    let grand = root.element_at_mut(grand_path.indices())?;
    let Some(Node::Element(parent)) = grand.children.get_mut(slot) else {
        return None;
    };
    if child_idx >= parent.children.len() {
        return None;
    }

    let right: Vec<Node> = parent.children.drain(child_idx + 1..).collect();
    let middle = parent.children.pop()?;
    let left: Vec<Node> = std::mem::take(&mut parent.children);
    let shape = parent.shallow_clone();

    let mut replacement = Vec::new();
    let mut middle_slot = slot;
    if !left.is_empty() {
        replacement.push(Node::Element(shape.clone().with_children(left)));
        middle_slot += 1;
    }
    replacement.push(Node::Element(shape.clone().with_children(vec![middle])));
    if !right.is_empty() {
        replacement.push(Node::Element(shape.with_children(right)));
    }
    grand.children.splice(slot..=slot, replacement);
    Some(grand_path.child(middle_slot))
}

/// Replaces the element at `path` with its children.
pub fn unwrap_element(root: &mut Element, path: &NodePath) -> bool {
    let Some(parent_path) = path.parent() else {
        return false;
    };
    let Some(slot) = path.last() else {
        return false;
    };
    let Some(parent) = root.element_at_mut(parent_path.indices()) else {
        return false;
    };
    let Some(Node::Element(element)) = parent.children.get_mut(slot) else {
        return false;
    };
    let children = std::mem::take(&mut element.children);
    parent.children.splice(slot..=slot, children);
    true
}

/// Drops empty text and empty inline wrappers, then merges adjacent text
/// nodes and adjacent inline elements of identical shape.
pub fn prune_and_merge(children: &mut Vec<Node>) {
    for child in children.iter_mut() {
        if let Node::Element(element) = child {
            if !element.is_mention() {
                prune_and_merge(&mut element.children);
            }
        }
    }

    children.retain(|node| match node {
        Node::Text(text) => !text.is_empty(),
        Node::Element(element) => {
            element.is_mention()
                || element.is_block_level()
                || element.tag == "br"
                || !element.children.is_empty()
        }
    });

    let mut merged: Vec<Node> = Vec::with_capacity(children.len());
    for node in children.drain(..) {
        match (merged.last_mut(), node) {
            (Some(Node::Text(previous)), Node::Text(text)) => previous.push_str(&text),
            (Some(Node::Element(previous)), Node::Element(element))
                if mergeable(previous) && mergeable(&element) && previous.same_shape(&element) =>
            {
                previous.children.extend(element.children);
                prune_and_merge(&mut previous.children);
            }
            (_, node) => merged.push(node),
        }
    }
    *children = merged;
}

fn mergeable(element: &Element) -> bool {
    !element.is_mention() && !element.is_block_level() && element.tag != "br"
}

pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            ch => out.push(ch),
        }
    }
    out
}

pub fn style_attribute(styles: &BTreeMap<String, String>) -> String {
    styles
        .iter()
        .map(|(property, value)| format!("{property}: {value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Serializes `children` as HTML markup.
pub fn to_html(children: &[Node]) -> String {
    let mut out = String::new();
    for child in children {
        write_node(&mut out, child);
    }
    out
}

fn write_node(out: &mut String, node: &Node) {
    match node {
        Node::Text(text) => out.push_str(&escape_text(text)),
        Node::Element(element) => {
            out.push('<');
            out.push_str(&element.tag);
            for (name, value) in &element.attributes {
                out.push_str(&format!(" {name}=\"{}\"", escape_text(value)));
            }
            if !element.styles.is_empty() {
                out.push_str(&format!(
                    " style=\"{}\"",
                    escape_text(&style_attribute(&element.styles))
                ));
            }
            out.push('>');
            if element.tag == "br" {
                return;
            }
            for child in &element.children {
                write_node(out, child);
            }
            out.push_str(&format!("</{}>", element.tag));
        }
    }
}

/// Pre-order walk over every node below a root element.
pub struct DomWalk<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> DomWalk<'a> {
    pub fn new(root: &'a Element) -> Self {
        Self {
            stack: root.children.iter().rev().collect(),
        }
    }
}

impl NodeWalk for DomWalk<'_> {
    fn next_node(&mut self) -> Option<WalkedNode> {
        let node = self.stack.pop()?;
        match node {
            Node::Text(text) => Some(WalkedNode::text(text)),
            Node::Element(element) => {
                self.stack.extend(element.children.iter().rev());
                let mut attributes: Vec<(String, String)> = element
                    .attributes
                    .iter()
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect();
                if !element.styles.is_empty() {
                    attributes.push(("style".to_string(), style_attribute(&element.styles)));
                }
                Some(WalkedNode::element(
                    &element.tag,
                    attributes,
                    element.text_content(),
                ))
            }
        }
    }
}

#[cfg(test)]
#[path = "dom_tests.rs"]
mod dom_tests;
