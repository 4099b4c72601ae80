//! Capabilities the editing core consumes.
//!
//! The core never owns the document. It reads and mutates it through
//! [`EditableSurface`], asks [`CommandExecutor`] to apply or report native
//! formatting, and walks nodes through [`NodeWalk`]. Everything here is plain
//! data or a trait so the core runs the same against a browser binding, the
//! in-memory [`DocumentSurface`](crate::editor::DocumentSurface), or a test
//! double.

use crate::directory::Category;
use crate::error::SurfaceError;
use crate::format::FormatKind;

/// Child-index path from the surface root to a node. The empty path is the
/// root itself.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodePath {
    indices: Vec<usize>,
}

impl NodePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn new(indices: Vec<usize>) -> Self {
        Self { indices }
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn is_root(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.indices.len()
    }

    pub fn child(&self, idx: usize) -> Self {
        let mut indices = self.indices.clone();
        indices.push(idx);
        Self { indices }
    }

    pub fn parent(&self) -> Option<Self> {
        let (_, prefix) = self.indices.split_last()?;
        Some(Self {
            indices: prefix.to_vec(),
        })
    }

    pub fn last(&self) -> Option<usize> {
        self.indices.last().copied()
    }

    pub fn push(&mut self, idx: usize) {
        self.indices.push(idx);
    }

    pub fn pop(&mut self) -> Option<usize> {
        self.indices.pop()
    }

    pub fn starts_with(&self, prefix: &NodePath) -> bool {
        self.indices.starts_with(&prefix.indices)
    }
}

impl From<Vec<usize>> for NodePath {
    fn from(indices: Vec<usize>) -> Self {
        Self { indices }
    }
}

/// A boundary point. `offset` counts characters when `path` names a text
/// node and children when it names an element.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Position {
    pub path: NodePath,
    pub offset: usize,
}

impl Position {
    pub fn new(path: impl Into<NodePath>, offset: usize) -> Self {
        Self {
            path: path.into(),
            offset,
        }
    }
}

/// Ordered start/end pair. Serves both as the live selection and as an
/// ad-hoc range handed to surface operations.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    pub start: Position,
    pub end: Position,
}

impl Selection {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn collapsed(position: Position) -> Self {
        Self {
            start: position.clone(),
            end: position,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// Box in viewport coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub top: f32,
    pub left: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// A caret at some boundary positions measures as a zero box.
    pub fn is_degenerate(&self) -> bool {
        self.width == 0.0 && self.height == 0.0
    }
}

/// Page-coordinate anchor for the mention picker.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AnchorPosition {
    pub top: f32,
    pub left: f32,
}

/// Atomic reference unit spliced into the document by a mention commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MentionToken {
    pub category: Category,
    pub referenced_id: u64,
    pub display_label: String,
}

/// Inline container used to carry durable annotations (e.g. a font).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContainerSpec {
    pub tag: String,
    pub styles: Vec<(String, String)>,
}

impl ContainerSpec {
    pub fn styled(tag: &str, property: &str, value: &str) -> Self {
        Self {
            tag: tag.to_string(),
            styles: vec![(property.to_string(), value.to_string())],
        }
    }
}

/// Node handed to [`EditableSurface::insert_node`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SurfaceNode {
    Text(String),
    Mention(MentionToken),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
}

/// One node yielded by a [`NodeWalk`], detached from the tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalkedNode {
    kind: NodeKind,
    tag: Option<String>,
    attributes: Vec<(String, String)>,
    text_content: String,
}

impl WalkedNode {
    pub fn element(tag: &str, attributes: Vec<(String, String)>, text_content: String) -> Self {
        Self {
            kind: NodeKind::Element,
            tag: Some(tag.to_string()),
            attributes,
            text_content,
        }
    }

    pub fn text(text: &str) -> Self {
        Self {
            kind: NodeKind::Text,
            tag: None,
            attributes: Vec::new(),
            text_content: text.to_string(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .map(|classes| classes.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn text_content(&self) -> &str {
        &self.text_content
    }
}

/// Document-order traversal bounded by the editable root.
pub trait NodeWalk {
    fn next_node(&mut self) -> Option<WalkedNode>;
}

/// Stands in for a mention in [`EditableSurface::text_before`], so every
/// token is one character there and can never look like part of a trigger.
pub const ATOM_PLACEHOLDER: char = '\u{FFFC}';

/// The host's mutable, tree-structured editing region.
pub trait EditableSurface {
    /// Linear text content from the start of the surface up to `position`.
    /// Mentions appear as [`ATOM_PLACEHOLDER`].
    fn text_before(&self, position: &Position) -> String;

    fn selection(&self) -> Option<Selection>;

    /// Box of `range` in viewport coordinates.
    fn measure_bounding_box(&self, range: &Selection) -> Rect;

    /// Horizontal and vertical scroll, added to viewport coordinates to get
    /// page coordinates.
    fn scroll_offset(&self) -> (f32, f32);

    /// The position `chars` text characters before `position`.
    fn position_before(&self, position: &Position, chars: usize) -> Option<Position>;

    /// Removes the contents of `range`; returns the collapsed position where
    /// the range was.
    fn delete_range(&mut self, range: &Selection) -> Result<Position, SurfaceError>;

    /// Inserts `node` at `at`; returns the position immediately after it.
    fn insert_node(&mut self, at: &Position, node: SurfaceNode) -> Result<Position, SurfaceError>;

    fn set_cursor(&mut self, position: Position);

    fn focus(&mut self);

    fn has_focus(&self) -> bool;

    fn html_snapshot(&self) -> String;

    fn text_content(&self) -> String;

    fn walk(&self) -> Box<dyn NodeWalk + '_>;

    /// Moves exactly the contents of `range` into a new container; returns
    /// the range spanning the container's contents.
    fn wrap_range(
        &mut self,
        range: &Selection,
        container: ContainerSpec,
    ) -> Result<Selection, SurfaceError>;

    /// Nearest element containing `position`, or `None` when that is the
    /// surface root.
    fn enclosing_element(&self, position: &Position) -> Option<NodePath>;

    fn set_element_style(
        &mut self,
        path: &NodePath,
        property: &str,
        value: &str,
    ) -> Result<(), SurfaceError>;

    /// Removes `property` from every element strictly inside `path`.
    fn clear_nested_style(&mut self, path: &NodePath, property: &str);

    /// Moves all of the root's children into one new container.
    fn wrap_root_content(&mut self, container: ContainerSpec) -> Result<(), SurfaceError>;

    /// Style on the surface root itself; inherited by newly typed text.
    fn set_root_style(&mut self, property: &str, value: &str);
}

/// Named native operation understood by a [`CommandExecutor`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    Format(FormatKind),
    FontName,
    InsertText,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Format(kind) => kind.command_name(),
            Command::FontName => "fontName",
            Command::InsertText => "insertText",
        }
    }
}

/// Applies and reports native formatting at the current selection.
pub trait CommandExecutor {
    fn apply(&mut self, command: Command, value: Option<&str>) -> bool;

    fn is_active(&self, kind: FormatKind) -> bool;

    /// Turns `kind` off. The default re-issues the toggle primitive, which is
    /// all some executors offer.
    fn deactivate(&mut self, kind: FormatKind) {
        self.apply(Command::Format(kind), None);
    }
}
