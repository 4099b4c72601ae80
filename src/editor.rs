//! In-memory editable surface.
//!
//! [`DocumentSurface`] keeps an element/text tree plus a live selection and
//! implements [`EditableSurface`] and [`CommandExecutor`] over it, so the
//! mention and formatting core can run without a browser. The terminal host
//! drives it through the movement and typing operations in the submodules.

use tracing::trace;

use crate::dom::{self, DomWalk, Element, Node};
use crate::error::SurfaceError;
use crate::format::FormatKind;
use crate::render::render_document;
use crate::surface::{
    ATOM_PLACEHOLDER, Command, CommandExecutor, ContainerSpec, EditableSurface, NodePath, NodeWalk,
    Position, Rect, Selection, SurfaceNode,
};

mod content;
mod cursor;
mod inspect;
mod structure;
mod styles;

pub use cursor::{Affinity, SegmentKind, SegmentRef, collect_segments};

use cursor::{Side, escape_atom, position_in, unit_in};

pub const DEFAULT_WRAP_WIDTH: usize = 80;

/// Formatting armed at a collapsed caret, applied to the next typed text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct TypingStyle {
    toggles: Vec<FormatKind>,
    font: Option<String>,
}

impl TypingStyle {
    fn clear(&mut self) {
        self.toggles.clear();
        self.font = None;
    }

    fn is_empty(&self) -> bool {
        self.toggles.is_empty() && self.font.is_none()
    }

    fn toggle(&mut self, kind: FormatKind) {
        if let Some(idx) = self.toggles.iter().position(|pending| *pending == kind) {
            self.toggles.remove(idx);
        } else {
            self.toggles.push(kind);
        }
    }

    fn has_toggle(&self, kind: FormatKind) -> bool {
        self.toggles.contains(&kind)
    }
}

#[derive(Clone, Copy)]
enum AtomText {
    Label,
    Placeholder,
}

pub struct DocumentSurface {
    root: Element,
    selection: Option<Selection>,
    anchor_unit: Option<usize>,
    focus_unit: Option<usize>,
    focused: bool,
    scroll_top: usize,
    wrap_width: usize,
    typing: TypingStyle,
}

impl Default for DocumentSurface {
    fn default() -> Self {
        Self::new(Element::new("div"))
    }
}

impl DocumentSurface {
    /// Wraps `root` as the editable region. The caret starts at the end.
    pub fn new(root: Element) -> Self {
        let mut surface = Self {
            root,
            selection: None,
            anchor_unit: None,
            focus_unit: None,
            focused: false,
            scroll_top: 0,
            wrap_width: DEFAULT_WRAP_WIDTH,
            typing: TypingStyle::default(),
        };
        surface.move_to_end();
        surface
    }

    pub fn from_text(text: &str) -> Self {
        let mut surface = Self::default();
        surface.paste_plain_text(text);
        surface.move_to_end();
        surface
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn replace_root(&mut self, root: Element) {
        self.root = root;
        self.scroll_top = 0;
        self.move_to_end();
    }

    pub fn wrap_width(&self) -> usize {
        self.wrap_width
    }

    pub fn set_wrap_width(&mut self, width: usize) {
        self.wrap_width = width.max(1);
    }

    pub fn scroll_top(&self) -> usize {
        self.scroll_top
    }

    pub fn set_scroll_top(&mut self, top: usize) {
        self.scroll_top = top;
    }

    pub fn blur(&mut self) {
        self.focused = false;
    }

    pub fn set_selection(&mut self, selection: Option<Selection>) {
        self.selection = selection;
        self.anchor_unit = None;
        self.focus_unit = None;
        self.typing.clear();
    }

    /// Scrolls so the caret's line is inside a viewport of `height` rows.
    pub fn ensure_cursor_visible(&mut self, height: usize) {
        let Some(unit) = self.cursor_unit() else {
            return;
        };
        let result = render_document(&self.root, self.wrap_width, &[unit], None);
        let Some(position) = result.unit_positions.get(&unit) else {
            return;
        };
        let height = height.max(1);
        if position.line < self.scroll_top {
            self.scroll_top = position.line;
        } else if position.line >= self.scroll_top + height {
            self.scroll_top = position.line + 1 - height;
        }
    }

    /// Linear text up to `limit` units, with a newline between blocks.
    /// Mentions contribute their label or a single placeholder character.
    fn linear_text(&self, limit: Option<usize>, atoms: AtomText) -> String {
        let segments = self.segments();
        let mut out = String::new();
        let mut previous: Option<&SegmentRef> = None;
        for segment in &segments {
            if let Some(previous) = previous {
                if previous.block != segment.block {
                    if limit.is_some_and(|limit| segment.start > limit) {
                        break;
                    }
                    out.push('\n');
                }
            }
            if limit.is_some_and(|limit| segment.start >= limit) {
                break;
            }
            let take = limit.map_or(segment.len, |limit| (limit - segment.start).min(segment.len));
            match segment.kind {
                SegmentKind::Text => {
                    if let Some(Node::Text(text)) = self.root.node_at(segment.path.indices()) {
                        out.extend(text.chars().take(take));
                    }
                }
                SegmentKind::Atom => match atoms {
                    AtomText::Placeholder => out.push(ATOM_PLACEHOLDER),
                    AtomText::Label => {
                        if let Some(node) = self.root.node_at(segment.path.indices()) {
                            out.push_str(&node.text_content());
                        }
                    }
                },
                SegmentKind::Empty => {}
            }
            previous = Some(segment);
        }
        out
    }

    fn check_position(&self, position: &Position) -> Result<(), SurfaceError> {
        match self.root.node_at(position.path.indices()) {
            Some(Node::Text(text)) if position.offset <= text.chars().count() => Ok(()),
            Some(Node::Element(element)) if position.offset <= element.children.len() => Ok(()),
            None if position.path.is_root() && position.offset <= self.root.children.len() => {
                Ok(())
            }
            _ => Err(SurfaceError::InvalidPosition(format!("{position:?}"))),
        }
    }
}

impl EditableSurface for DocumentSurface {
    fn text_before(&self, position: &Position) -> String {
        let unit = self.unit_of(position);
        self.linear_text(Some(unit), AtomText::Placeholder)
    }

    fn selection(&self) -> Option<Selection> {
        self.selection.clone()
    }

    fn measure_bounding_box(&self, range: &Selection) -> Rect {
        let start = self.unit_of(&range.start);
        let end = self.unit_of(&range.end);
        let result = render_document(&self.root, self.wrap_width, &[start, end], None);
        let (Some(first), Some(last)) = (
            result.unit_positions.get(&start),
            result.unit_positions.get(&end),
        ) else {
            return Rect::default();
        };
        let width = if first.line == last.line {
            last.column.saturating_sub(first.column)
        } else {
            (self.wrap_width as u16).saturating_sub(first.column)
        };
        Rect {
            top: first.line as f32 - self.scroll_top as f32,
            left: f32::from(first.column),
            width: f32::from(width),
            height: (last.line.saturating_sub(first.line) + 1) as f32,
        }
    }

    fn scroll_offset(&self) -> (f32, f32) {
        (0.0, self.scroll_top as f32)
    }

    fn position_before(&self, position: &Position, chars: usize) -> Option<Position> {
        let unit = self.unit_of(position).checked_sub(chars)?;
        Some(self.position_at_unit(unit, Affinity::Forward))
    }

    fn delete_range(&mut self, range: &Selection) -> Result<Position, SurfaceError> {
        let start = escape_atom(&self.root, &range.start, Side::Before);
        let end = escape_atom(&self.root, &range.end, Side::After);
        self.check_position(&start)?;
        self.check_position(&end)?;
        let (start, end) = match dom::compare_positions(&start, &end) {
            std::cmp::Ordering::Greater => (end, start),
            _ => (start, end),
        };
        let unit = self.unit_of(&start);
        let removed = dom::extract_range(&mut self.root, &start, &end);
        trace!(nodes = removed.len(), "range deleted");
        // Wrappers emptied by the cut go too; paths shift, units don't.
        dom::prune_and_merge(&mut self.root.children);
        let at = self.position_at_unit(unit, Affinity::Backward);
        self.set_selection(Some(Selection::collapsed(at.clone())));
        Ok(at)
    }

    fn insert_node(&mut self, at: &Position, node: SurfaceNode) -> Result<Position, SurfaceError> {
        let at = escape_atom(&self.root, at, Side::After);
        self.check_position(&at)?;
        let after = match node {
            SurfaceNode::Text(text) => match self.root.node_at_mut(at.path.indices()) {
                Some(Node::Text(existing)) => {
                    let byte_idx = dom::char_to_byte_idx(existing, at.offset);
                    existing.insert_str(byte_idx, &text);
                    Position::new(at.path.clone(), at.offset + text.chars().count())
                }
                _ => dom::insert_node(&mut self.root, &at, Node::Text(text))?,
            },
            SurfaceNode::Mention(token) => {
                dom::insert_node(&mut self.root, &at, Element::mention(&token).into())?
            }
        };
        self.set_selection(Some(Selection::collapsed(after.clone())));
        Ok(after)
    }

    fn set_cursor(&mut self, position: Position) {
        let position = escape_atom(&self.root, &position, Side::After);
        self.set_selection(Some(Selection::collapsed(position)));
    }

    fn focus(&mut self) {
        self.focused = true;
    }

    fn has_focus(&self) -> bool {
        self.focused
    }

    fn html_snapshot(&self) -> String {
        dom::to_html(&self.root.children)
    }

    fn text_content(&self) -> String {
        self.linear_text(None, AtomText::Label)
    }

    fn walk(&self) -> Box<dyn NodeWalk + '_> {
        Box::new(DomWalk::new(&self.root))
    }

    fn wrap_range(
        &mut self,
        range: &Selection,
        container: ContainerSpec,
    ) -> Result<Selection, SurfaceError> {
        let start = escape_atom(&self.root, &range.start, Side::Before);
        let end = escape_atom(&self.root, &range.end, Side::After);
        self.check_position(&start)?;
        self.check_position(&end)?;

        let segments = self.segments();
        let first = unit_in(&self.root, &segments, &start);
        let last = unit_in(&self.root, &segments, &end);
        let mut blocks = segments
            .iter()
            .filter(|segment| segment.start < last.max(first + 1) && segment.end() > first)
            .map(|segment| &segment.block);
        if let Some(block) = blocks.next() {
            if blocks.any(|other| other != block) {
                return Err(SurfaceError::StructuralInsertFailure(
                    "range crosses a block boundary".to_string(),
                ));
            }
        }

        let fragment = dom::extract_range(&mut self.root, &start, &end);
        let mut wrapper = Element::new(&container.tag);
        for (property, value) in &container.styles {
            wrapper.styles.insert(property.clone(), value.clone());
        }
        let count = fragment.len();
        let after = dom::insert_node(&mut self.root, &start, wrapper.with_children(fragment).into())?;
        let Some(slot) = after.offset.checked_sub(1) else {
            return Err(SurfaceError::StructuralInsertFailure(
                "container was not inserted".to_string(),
            ));
        };
        let path = after.path.child(slot);
        let inner = Selection::new(Position::new(path.clone(), 0), Position::new(path, count));
        self.set_selection(Some(inner.clone()));
        Ok(inner)
    }

    fn enclosing_element(&self, position: &Position) -> Option<NodePath> {
        let position = escape_atom(&self.root, position, Side::After);
        let path = match self.root.node_at(position.path.indices()) {
            Some(Node::Text(_)) => position.path.parent()?,
            _ => position.path,
        };
        (!path.is_root()).then_some(path)
    }

    fn set_element_style(
        &mut self,
        path: &NodePath,
        property: &str,
        value: &str,
    ) -> Result<(), SurfaceError> {
        if path.is_root() {
            return Err(SurfaceError::InvalidPosition("root is not an element target".to_string()));
        }
        let Some(element) = self.root.element_at_mut(path.indices()) else {
            return Err(SurfaceError::InvalidPosition(format!("{path:?}")));
        };
        if element.is_mention() {
            return Err(SurfaceError::AtomicNode);
        }
        element.styles.insert(property.to_string(), value.to_string());
        Ok(())
    }

    fn clear_nested_style(&mut self, path: &NodePath, property: &str) {
        if let Some(element) = self.root.element_at_mut(path.indices()) {
            styles::strip_nested(element, property);
        }
    }

    fn wrap_root_content(&mut self, container: ContainerSpec) -> Result<(), SurfaceError> {
        let units = self.selection_units();
        let mut wrapper = Element::new(&container.tag);
        for (property, value) in container.styles {
            wrapper.styles.insert(property, value);
        }
        wrapper.children = std::mem::take(&mut self.root.children);
        self.root.children.push(wrapper.into());
        self.restore_units(units);
        Ok(())
    }

    fn set_root_style(&mut self, property: &str, value: &str) {
        self.root
            .styles
            .insert(property.to_string(), value.to_string());
    }
}

impl CommandExecutor for DocumentSurface {
    fn apply(&mut self, command: Command, value: Option<&str>) -> bool {
        let applied = match command {
            Command::Format(kind) if kind.is_inline() => self.toggle_inline(kind),
            Command::Format(kind) if kind.is_alignment() => self.set_alignment(kind),
            Command::Format(kind) => self.toggle_list(kind),
            Command::FontName => value.is_some_and(|family| self.apply_font_face(family)),
            Command::InsertText => value.is_some_and(|text| self.paste_plain_text(text)),
        };
        trace!(command = command.name(), applied, "command applied");
        applied
    }

    fn is_active(&self, kind: FormatKind) -> bool {
        if kind.is_inline() {
            self.inline_active(kind)
        } else if kind.is_alignment() {
            self.alignment_active(kind)
        } else {
            self.list_active(kind)
        }
    }

    fn deactivate(&mut self, kind: FormatKind) {
        if kind.is_alignment() {
            self.clear_alignment(kind);
        } else if self.is_active(kind) {
            self.apply(Command::Format(kind), None);
        }
    }
}

#[cfg(test)]
#[path = "editor_tests.rs"]
mod editor_tests;

#[cfg(test)]
#[path = "editor/cursor_tests.rs"]
mod cursor_tests;


#[cfg(test)]
#[path = "editor/style_tests.rs"]
mod style_tests;
