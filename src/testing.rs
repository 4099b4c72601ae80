//! Flat-text surface double for exercising the core without a tree.

use std::cell::RefCell;
use std::collections::HashSet;

use crate::error::SurfaceError;
use crate::format::FormatKind;
use crate::surface::{
    Command, CommandExecutor, ContainerSpec, EditableSurface, MentionToken, NodePath, NodeWalk,
    Position, Rect, Selection, SurfaceNode, WalkedNode,
};

/// Text addressed by character offsets at the root; tokens are spliced in
/// as their labels. The executor toggles kinds independently, so nothing
/// keeps alignments exclusive on its own.
#[derive(Default)]
pub(crate) struct FakeSurface {
    pub text: String,
    pub selection: Option<(usize, usize)>,
    pub focused: bool,
    pub active: HashSet<FormatKind>,
    pub calls: Vec<String>,
    pub tokens: Vec<MentionToken>,
    pub scroll: (f32, f32),
    pub rect: Rect,
    /// Served, in order, before falling back to `rect`.
    pub measurements: RefCell<Vec<Rect>>,
    pub measured: RefCell<Vec<Selection>>,
    pub enclosing: Option<NodePath>,
    pub wrap_fails: bool,
}

impl FakeSurface {
    pub fn with_text(text: &str) -> Self {
        let len = text.chars().count();
        Self {
            text: text.to_string(),
            selection: Some((len, len)),
            focused: true,
            rect: Rect {
                top: 10.0,
                left: 4.0,
                width: 1.0,
                height: 1.0,
            },
            ..Self::default()
        }
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    fn byte_idx(&self, offset: usize) -> usize {
        self.text
            .char_indices()
            .nth(offset)
            .map(|(idx, _)| idx)
            .unwrap_or(self.text.len())
    }
}

struct NoNodes;

impl NodeWalk for NoNodes {
    fn next_node(&mut self) -> Option<WalkedNode> {
        None
    }
}

impl EditableSurface for FakeSurface {
    fn text_before(&self, position: &Position) -> String {
        self.text.chars().take(position.offset).collect()
    }

    fn selection(&self) -> Option<Selection> {
        self.selection
            .map(|(start, end)| Selection::new(Position::new(vec![], start), Position::new(vec![], end)))
    }

    fn measure_bounding_box(&self, range: &Selection) -> Rect {
        self.measured.borrow_mut().push(range.clone());
        let mut queued = self.measurements.borrow_mut();
        if queued.is_empty() {
            self.rect
        } else {
            queued.remove(0)
        }
    }

    fn scroll_offset(&self) -> (f32, f32) {
        self.scroll
    }

    fn position_before(&self, position: &Position, chars: usize) -> Option<Position> {
        let offset = position.offset.checked_sub(chars)?;
        Some(Position::new(vec![], offset))
    }

    fn delete_range(&mut self, range: &Selection) -> Result<Position, SurfaceError> {
        let (start, end) = (range.start.offset, range.end.offset);
        if start > end || end > self.char_len() {
            return Err(SurfaceError::InvalidPosition(format!("{start}..{end}")));
        }
        let (from, to) = (self.byte_idx(start), self.byte_idx(end));
        self.text.replace_range(from..to, "");
        self.calls.push(format!("delete {start}..{end}"));
        Ok(range.start.clone())
    }

    fn insert_node(&mut self, at: &Position, node: SurfaceNode) -> Result<Position, SurfaceError> {
        if at.offset > self.char_len() {
            return Err(SurfaceError::InvalidPosition(format!("{}", at.offset)));
        }
        let inserted = match node {
            SurfaceNode::Text(text) => text,
            SurfaceNode::Mention(token) => {
                let label = token.display_label.clone();
                self.tokens.push(token);
                label
            }
        };
        let idx = self.byte_idx(at.offset);
        self.text.insert_str(idx, &inserted);
        self.calls.push(format!("insert {inserted:?}"));
        Ok(Position::new(vec![], at.offset + inserted.chars().count()))
    }

    fn set_cursor(&mut self, position: Position) {
        self.selection = Some((position.offset, position.offset));
    }

    fn focus(&mut self) {
        self.focused = true;
        self.calls.push("focus".to_string());
    }

    fn has_focus(&self) -> bool {
        self.focused
    }

    fn html_snapshot(&self) -> String {
        self.text.clone()
    }

    fn text_content(&self) -> String {
        self.text.clone()
    }

    fn walk(&self) -> Box<dyn NodeWalk + '_> {
        Box::new(NoNodes)
    }

    fn wrap_range(
        &mut self,
        range: &Selection,
        container: ContainerSpec,
    ) -> Result<Selection, SurfaceError> {
        if self.wrap_fails {
            return Err(SurfaceError::StructuralInsertFailure("crosses blocks".to_string()));
        }
        self.calls.push(format!("wrap {}", container.tag));
        Ok(Selection::new(
            Position::new(vec![0], 0),
            Position::new(vec![0], range.end.offset - range.start.offset),
        ))
    }

    fn enclosing_element(&self, _position: &Position) -> Option<NodePath> {
        self.enclosing.clone()
    }

    fn set_element_style(
        &mut self,
        path: &NodePath,
        property: &str,
        value: &str,
    ) -> Result<(), SurfaceError> {
        self.calls
            .push(format!("style {:?} {property}={value}", path.indices()));
        Ok(())
    }

    fn clear_nested_style(&mut self, path: &NodePath, property: &str) {
        self.calls
            .push(format!("clear {:?} {property}", path.indices()));
    }

    fn wrap_root_content(&mut self, container: ContainerSpec) -> Result<(), SurfaceError> {
        self.calls.push(format!("wrap-root {}", container.tag));
        Ok(())
    }

    fn set_root_style(&mut self, property: &str, value: &str) {
        self.calls.push(format!("root {property}={value}"));
    }
}

impl CommandExecutor for FakeSurface {
    fn apply(&mut self, command: Command, value: Option<&str>) -> bool {
        self.calls.push(match value {
            Some(value) => format!("{} {value}", command.name()),
            None => command.name().to_string(),
        });
        if let Command::Format(kind) = command {
            if !self.active.remove(&kind) {
                self.active.insert(kind);
            }
        }
        true
    }

    fn is_active(&self, kind: FormatKind) -> bool {
        self.active.contains(&kind)
    }

    fn deactivate(&mut self, kind: FormatKind) {
        self.calls.push(format!("deactivate {}", kind.command_name()));
        self.active.remove(&kind);
    }
}
