use std::cmp::Ordering;

use super::DocumentSurface;
use crate::dom::{Element, Node, compare_positions};
use crate::render::render_document;
use crate::surface::{NodePath, Position, Selection};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SegmentKind {
    Text,
    /// A mention element; one unit wide, never entered.
    Atom,
    /// A block with nothing inside it.
    Empty,
}

/// Which segment wins when a unit sits on the boundary of two.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Affinity {
    Backward,
    Forward,
}

/// Which side of a mention a position inside it is moved to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Side {
    Before,
    After,
}

/// One cursor-addressable run of the document.
///
/// Units number every caret stop in document order: a text segment spans
/// one unit per character, a mention one unit, and consecutive segments in
/// different blocks are separated by one extra unit for the line break.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentRef {
    pub path: NodePath,
    pub kind: SegmentKind,
    pub len: usize,
    pub start: usize,
    pub block: Option<NodePath>,
}

impl SegmentRef {
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn position_at(&self, local: usize) -> Position {
        match self.kind {
            SegmentKind::Text => Position::new(self.path.clone(), local.min(self.len)),
            SegmentKind::Atom => {
                let parent = self.path.parent().unwrap_or_default();
                let idx = self.path.last().unwrap_or(0);
                Position::new(parent, idx + local.min(1))
            }
            SegmentKind::Empty => Position::new(self.path.clone(), 0),
        }
    }

    fn start_position(&self) -> Position {
        self.position_at(0)
    }

    fn end_position(&self) -> Position {
        self.position_at(self.len)
    }
}

pub fn collect_segments(root: &Element) -> Vec<SegmentRef> {
    let mut segments = Vec::new();
    let mut path = NodePath::root();
    collect_into(root, &mut path, None, &mut segments);

    let mut unit = 0;
    let mut previous_block: Option<Option<NodePath>> = None;
    for segment in &mut segments {
        if let Some(previous) = &previous_block {
            if *previous != segment.block {
                unit += 1;
            }
        }
        segment.start = unit;
        unit += segment.len;
        previous_block = Some(segment.block.clone());
    }
    segments
}

fn collect_into(
    element: &Element,
    path: &mut NodePath,
    block: Option<&NodePath>,
    out: &mut Vec<SegmentRef>,
) {
    for (idx, child) in element.children.iter().enumerate() {
        path.push(idx);
        match child {
            Node::Text(text) => out.push(SegmentRef {
                path: path.clone(),
                kind: SegmentKind::Text,
                len: text.chars().count(),
                start: 0,
                block: block.cloned(),
            }),
            Node::Element(inner) if inner.is_mention() => out.push(SegmentRef {
                path: path.clone(),
                kind: SegmentKind::Atom,
                len: 1,
                start: 0,
                block: block.cloned(),
            }),
            Node::Element(inner) => {
                let inner_block = if inner.is_block() {
                    Some(path.clone())
                } else {
                    block.cloned()
                };
                let before = out.len();
                collect_into(inner, path, inner_block.as_ref(), out);
                if out.len() == before && inner.is_block() {
                    out.push(SegmentRef {
                        path: path.clone(),
                        kind: SegmentKind::Empty,
                        len: 0,
                        start: 0,
                        block: inner_block,
                    });
                }
            }
        }
        path.pop();
    }
}

/// Moves a position that points into a mention to one side of it.
pub(crate) fn escape_atom(root: &Element, position: &Position, side: Side) -> Position {
    match root.mention_ancestor(&position.path) {
        Some(mention) => {
            let parent = mention.parent().unwrap_or_default();
            let idx = mention.last().unwrap_or(0);
            match side {
                Side::Before => Position::new(parent, idx),
                Side::After => Position::new(parent, idx + 1),
            }
        }
        None => position.clone(),
    }
}

pub(crate) fn unit_in(root: &Element, segments: &[SegmentRef], position: &Position) -> usize {
    let position = escape_atom(root, position, Side::After);
    if let Some(Node::Text(_)) = root.node_at(position.path.indices()) {
        if let Some(segment) = segments
            .iter()
            .find(|segment| segment.kind == SegmentKind::Text && segment.path == position.path)
        {
            return segment.start + position.offset.min(segment.len);
        }
    }

    let block = root.block_ancestor(&position.path);
    let previous = segments
        .iter()
        .rev()
        .find(|segment| compare_positions(&segment.end_position(), &position) != Ordering::Greater);
    if let Some(previous) = previous {
        if previous.block == block {
            return previous.end();
        }
    }
    segments
        .iter()
        .find(|segment| compare_positions(&segment.start_position(), &position) != Ordering::Less)
        .map(|segment| segment.start)
        .or(previous.map(SegmentRef::end))
        .unwrap_or(0)
}

pub(crate) fn position_in(segments: &[SegmentRef], unit: usize, affinity: Affinity) -> Position {
    let candidates: Vec<&SegmentRef> = segments
        .iter()
        .filter(|segment| segment.start <= unit && unit <= segment.end())
        .collect();
    let editable: Vec<&SegmentRef> = candidates
        .iter()
        .copied()
        .filter(|segment| segment.kind != SegmentKind::Atom)
        .collect();
    let pick = |list: &[&SegmentRef]| -> Option<SegmentRef> {
        match affinity {
            Affinity::Backward => list.first().map(|segment| (*segment).clone()),
            Affinity::Forward => list.last().map(|segment| (*segment).clone()),
        }
    };

    match pick(&editable).or_else(|| pick(&candidates)) {
        Some(segment) => segment.position_at(unit - segment.start),
        None => segments
            .last()
            .map(SegmentRef::end_position)
            .unwrap_or_default(),
    }
}

impl DocumentSurface {
    pub fn segments(&self) -> Vec<SegmentRef> {
        collect_segments(&self.root)
    }

    /// Number of the last caret stop.
    pub fn unit_len(&self) -> usize {
        self.segments().last().map_or(0, SegmentRef::end)
    }

    pub fn unit_of(&self, position: &Position) -> usize {
        unit_in(&self.root, &self.segments(), position)
    }

    pub fn position_at_unit(&self, unit: usize, affinity: Affinity) -> Position {
        position_in(&self.segments(), unit, affinity)
    }

    pub fn cursor_unit(&self) -> Option<usize> {
        let selection = self.selection.as_ref()?;
        Some(self.unit_of(&selection.end))
    }

    /// Selection as ordered `(start, end)` units.
    pub fn selection_units(&self) -> Option<(usize, usize)> {
        let selection = self.selection.as_ref()?;
        let a = self.unit_of(&selection.start);
        let b = self.unit_of(&selection.end);
        Some((a.min(b), a.max(b)))
    }

    pub fn set_cursor_unit(&mut self, unit: usize) {
        let unit = unit.min(self.unit_len());
        let position = self.position_at_unit(unit, Affinity::Backward);
        self.selection = Some(Selection::collapsed(position));
        self.anchor_unit = None;
        self.focus_unit = None;
        self.typing.clear();
    }

    pub fn select_units(&mut self, start: usize, end: usize) {
        if start == end {
            self.set_cursor_unit(start);
            return;
        }
        let len = self.unit_len();
        let (start, end) = (start.min(end).min(len), start.max(end).min(len));
        let segments = self.segments();
        self.selection = Some(Selection::new(
            position_in(&segments, start, Affinity::Forward),
            position_in(&segments, end, Affinity::Backward),
        ));
        self.typing.clear();
    }

    /// Re-establishes the selection at the same units after a tree change.
    pub(crate) fn restore_units(&mut self, units: Option<(usize, usize)>) {
        if let Some((start, end)) = units {
            let typing = self.typing.clone();
            self.select_units(start, end);
            self.typing = typing;
        }
    }

    pub fn move_left(&mut self) -> bool {
        let Some((start, end)) = self.selection_units() else {
            return false;
        };
        if start != end {
            self.set_cursor_unit(start);
            return true;
        }
        if start == 0 {
            return false;
        }
        self.set_cursor_unit(start - 1);
        true
    }

    pub fn move_right(&mut self) -> bool {
        let Some((start, end)) = self.selection_units() else {
            return false;
        };
        if start != end {
            self.set_cursor_unit(end);
            return true;
        }
        if end >= self.unit_len() {
            return false;
        }
        self.set_cursor_unit(end + 1);
        true
    }

    /// Shift+arrow: grows or shrinks the selection from a fixed anchor.
    pub fn extend_selection(&mut self, delta: isize) -> bool {
        let Some(focus) = self.focus_unit.or_else(|| self.cursor_unit()) else {
            return false;
        };
        let anchor = self.anchor_unit.unwrap_or_else(|| {
            self.selection
                .as_ref()
                .map_or(focus, |selection| self.unit_of(&selection.start))
        });
        let target = focus.saturating_add_signed(delta).min(self.unit_len());
        if target == focus {
            return false;
        }
        self.select_units(anchor, target);
        self.anchor_unit = Some(anchor);
        self.focus_unit = Some(target);
        true
    }

    pub fn move_to_start(&mut self) -> bool {
        self.set_cursor_unit(0);
        true
    }

    pub fn move_to_end(&mut self) -> bool {
        self.set_cursor_unit(self.unit_len());
        true
    }

    pub fn move_up(&mut self) -> bool {
        self.move_vertically(-1)
    }

    pub fn move_down(&mut self) -> bool {
        self.move_vertically(1)
    }

    pub fn move_to_line_start(&mut self) -> bool {
        self.move_within_line(true)
    }

    pub fn move_to_line_end(&mut self) -> bool {
        self.move_within_line(false)
    }

    fn visual_stops(&self) -> Vec<(usize, usize, u16)> {
        let units: Vec<usize> = (0..=self.unit_len()).collect();
        let result = render_document(&self.root, self.wrap_width, &units, None);
        let mut stops: Vec<(usize, usize, u16)> = result
            .unit_positions
            .iter()
            .map(|(unit, position)| (*unit, position.line, position.column))
            .collect();
        stops.sort();
        stops
    }

    fn move_vertically(&mut self, delta: isize) -> bool {
        let Some(current) = self.cursor_unit() else {
            return false;
        };
        let stops = self.visual_stops();
        let Some(&(_, line, column)) = stops.iter().find(|(unit, _, _)| *unit == current) else {
            return false;
        };
        let Some(target_line) = line.checked_add_signed(delta) else {
            return false;
        };
        let target = stops
            .iter()
            .filter(|(_, stop_line, _)| *stop_line == target_line)
            .min_by_key(|(unit, _, stop_column)| (stop_column.abs_diff(column), *unit))
            .map(|(unit, _, _)| *unit);
        match target {
            Some(unit) => {
                self.set_cursor_unit(unit);
                true
            }
            None => false,
        }
    }

    fn move_within_line(&mut self, to_start: bool) -> bool {
        let Some(current) = self.cursor_unit() else {
            return false;
        };
        let stops = self.visual_stops();
        let Some(&(_, line, _)) = stops.iter().find(|(unit, _, _)| *unit == current) else {
            return false;
        };
        let on_line = stops.iter().filter(|(_, stop_line, _)| *stop_line == line);
        let target = if to_start {
            on_line.map(|(unit, _, _)| *unit).min()
        } else {
            on_line.map(|(unit, _, _)| *unit).max()
        };
        match target {
            Some(unit) if unit != current => {
                self.set_cursor_unit(unit);
                true
            }
            _ => false,
        }
    }
}
