use super::{Affinity, DocumentSurface, SegmentKind};
use crate::dom::{self, Element, Node, split_text};
use crate::format::FormatKind;
use crate::surface::{NodePath, Position};

/// Characters `from..to` of the text node at `path`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct TextSlice {
    pub path: NodePath,
    pub from: usize,
    pub to: usize,
}

fn wrapper_tag(kind: FormatKind) -> &'static str {
    match kind {
        FormatKind::Bold => "b",
        FormatKind::Italic => "i",
        _ => "u",
    }
}

fn style_property(kind: FormatKind) -> &'static str {
    match kind {
        FormatKind::Bold => "font-weight",
        FormatKind::Italic => "font-style",
        _ => "text-decoration",
    }
}

/// `Some(true)` when `element` turns `kind` on, `Some(false)` when it
/// explicitly turns it off.
fn mark_state(element: &Element, kind: FormatKind) -> Option<bool> {
    let marks = match kind {
        FormatKind::Bold => element.marks_bold(),
        FormatKind::Italic => element.marks_italic(),
        FormatKind::Underline => element.marks_underline(),
        _ => false,
    };
    if marks {
        return Some(true);
    }
    let reset = match element.style(style_property(kind)) {
        Some(value) => matches!(value, "normal" | "400" | "none"),
        None => false,
    };
    reset.then_some(false)
}

fn is_plain_wrapper(element: &Element, kind: FormatKind) -> bool {
    let tag_marks = match kind {
        FormatKind::Bold => matches!(element.tag.as_str(), "b" | "strong"),
        FormatKind::Italic => matches!(element.tag.as_str(), "i" | "em"),
        _ => element.tag == "u",
    };
    tag_marks && element.styles.is_empty()
}

/// Removes `property` from everything below `element`. For fonts this also
/// drops `face` attributes and unwraps `<font>` elements left bare.
pub(crate) fn strip_nested(element: &mut Element, property: &str) {
    for child in element.children.iter_mut() {
        if let Node::Element(inner) = child {
            if inner.is_mention() {
                continue;
            }
            strip_nested(inner, property);
            inner.styles.remove(property);
            if property == "font-family" && inner.tag == "font" {
                inner.attributes.remove("face");
            }
        }
    }

    let children = std::mem::take(&mut element.children);
    for child in children {
        match child {
            Node::Element(inner)
                if inner.tag == "font" && inner.attributes.is_empty() && inner.styles.is_empty() =>
            {
                element.children.extend(inner.children);
            }
            other => element.children.push(other),
        }
    }
}

impl DocumentSurface {
    /// Text pieces covered by the units `start..end`.
    pub(crate) fn text_slices(&self, start: usize, end: usize) -> Vec<TextSlice> {
        self.segments()
            .into_iter()
            .filter(|segment| segment.kind == SegmentKind::Text)
            .filter(|segment| segment.start < end && segment.end() > start)
            .map(|segment| TextSlice {
                from: start.max(segment.start) - segment.start,
                to: end.min(segment.end()) - segment.start,
                path: segment.path,
            })
            .filter(|slice| slice.from < slice.to)
            .collect()
    }

    fn marked_ancestor(&self, path: &NodePath, kind: FormatKind) -> Option<NodePath> {
        for ancestor in self.root.element_ancestors(path) {
            let Some(element) = self.root.element_at(ancestor.indices()) else {
                continue;
            };
            match mark_state(element, kind) {
                Some(true) => return Some(ancestor),
                Some(false) => return None,
                None => {}
            }
        }
        None
    }

    pub(crate) fn path_marked(&self, path: &NodePath, kind: FormatKind) -> bool {
        self.marked_ancestor(path, kind).is_some()
            || (self.root.element_ancestors(path).iter().all(|ancestor| {
                self.root
                    .element_at(ancestor.indices())
                    .is_none_or(|element| mark_state(element, kind).is_none())
            }) && mark_state(&self.root, kind) == Some(true))
    }

    pub(crate) fn inline_active(&self, kind: FormatKind) -> bool {
        let Some((start, end)) = self.selection_units() else {
            return false;
        };
        if start == end {
            let position = self.position_at_unit(start, Affinity::Backward);
            return self.path_marked(&position.path, kind) != self.typing.has_toggle(kind);
        }
        let slices = self.text_slices(start, end);
        !slices.is_empty()
            && slices
                .iter()
                .all(|slice| self.path_marked(&slice.path, kind))
    }

    /// Bold, italic or underline over the selection. A collapsed caret arms
    /// the toggle for the next typed text instead.
    pub(crate) fn toggle_inline(&mut self, kind: FormatKind) -> bool {
        let Some((start, end)) = self.selection_units() else {
            return false;
        };
        if start == end {
            self.typing.toggle(kind);
            return true;
        }

        let slices = self.text_slices(start, end);
        if slices.is_empty() {
            return false;
        }
        let remove = slices
            .iter()
            .all(|slice| self.path_marked(&slice.path, kind));
        for slice in slices.iter().rev() {
            if remove {
                self.unmark_slice(slice, kind);
            } else if !self.path_marked(&slice.path, kind) {
                self.wrap_slice(slice, Element::new(wrapper_tag(kind)));
            }
        }
        dom::prune_and_merge(&mut self.root.children);
        self.restore_units(Some((start, end)));
        true
    }

    /// Presentational font over the selection, like `fontName` in a browser.
    pub(crate) fn apply_font_face(&mut self, family: &str) -> bool {
        let Some((start, end)) = self.selection_units() else {
            return false;
        };
        if start == end {
            self.typing.font = Some(family.to_string());
            return true;
        }
        let slices = self.text_slices(start, end);
        if slices.is_empty() {
            return false;
        }
        for slice in slices.iter().rev() {
            self.wrap_slice(slice, Element::new("font").with_attribute("face", family));
        }
        dom::prune_and_merge(&mut self.root.children);
        self.restore_units(Some((start, end)));
        true
    }

    /// Splits the text node so the slice stands alone; returns its path.
    fn isolate_slice(&mut self, slice: &TextSlice) -> Option<NodePath> {
        let parent_path = slice.path.parent()?;
        let idx = slice.path.last()?;
        let parent = self.root.element_at_mut(parent_path.indices())?;
        let Some(Node::Text(text)) = parent.children.get(idx) else {
            return None;
        };
        let (head, rest) = split_text(text, slice.from);
        let (middle, tail) = split_text(&rest, slice.to - slice.from);

        let mut replacement = Vec::new();
        let mut middle_idx = idx;
        if !head.is_empty() {
            replacement.push(Node::Text(head));
            middle_idx += 1;
        }
        replacement.push(Node::Text(middle));
        if !tail.is_empty() {
            replacement.push(Node::Text(tail));
        }
        parent.children.splice(idx..=idx, replacement);
        Some(parent_path.child(middle_idx))
    }

    fn wrap_slice(&mut self, slice: &TextSlice, wrapper: Element) {
        let Some(path) = self.isolate_slice(slice) else {
            return;
        };
        if let Some(node) = self.root.node_at_mut(path.indices()) {
            let text = std::mem::replace(node, Node::Text(String::new()));
            *node = wrapper.with_children(vec![text]).into();
        }
    }

    /// Lifts the slice out of every ancestor that applies `kind`, splitting
    /// those ancestors around it. Returns the slice's final path.
    pub(crate) fn unmark_slice(&mut self, slice: &TextSlice, kind: FormatKind) -> Option<NodePath> {
        let mut path = self.isolate_slice(slice)?;
        while let Some(ancestor) = self.marked_ancestor(&path, kind) {
            if ancestor.is_root() {
                break;
            }
            let is_block = self
                .root
                .element_at(ancestor.indices())
                .is_some_and(Element::is_block_level);
            if is_block {
                // Blocks are never split for inline formatting; override instead.
                let reset = if kind == FormatKind::Underline { "none" } else { "normal" };
                self.wrap_slice(
                    &TextSlice {
                        path: path.clone(),
                        from: 0,
                        to: slice.to - slice.from,
                    },
                    Element::new("span").with_style(style_property(kind), reset),
                );
                return Some(path.child(0));
            }

            let below = path.depth() - ancestor.depth();
            let mut current = path.clone();
            loop {
                let parent = current.parent()?;
                let idx = current.last()?;
                let reached = parent.depth() <= ancestor.depth();
                current = dom::split_around(&mut self.root, &parent, idx)?;
                if reached {
                    break;
                }
            }

            let plain = self
                .root
                .element_at(current.indices())
                .is_some_and(|element| is_plain_wrapper(element, kind));
            if plain {
                dom::unwrap_element(&mut self.root, &current);
                path = current;
                for _ in 1..below {
                    path.push(0);
                }
            } else {
                if let Some(element) = self.root.element_at_mut(current.indices()) {
                    element.styles.remove(style_property(kind));
                    if element.tag == wrapper_tag(kind)
                        || (kind == FormatKind::Bold && element.tag == "strong")
                        || (kind == FormatKind::Italic && element.tag == "em")
                    {
                        element.tag = "span".to_string();
                    }
                }
                path = current;
                for _ in 0..below {
                    path.push(0);
                }
            }
        }
        Some(path)
    }

    /// Inserts `text` at `at` under the formatting armed at the caret.
    pub(crate) fn insert_with_typing_style(&mut self, at: &Position, text: &str) -> bool {
        let typing = std::mem::take(&mut self.typing);
        let mut node = Node::text(text);
        let mut lift = Vec::new();
        for kind in &typing.toggles {
            if self.path_marked(&at.path, *kind) {
                lift.push(*kind);
            } else {
                node = Element::new(wrapper_tag(*kind))
                    .with_children(vec![node])
                    .into();
            }
        }
        if let Some(font) = &typing.font {
            node = Element::new("font")
                .with_attribute("face", font)
                .with_children(vec![node])
                .into();
        }

        let Ok(after) = dom::insert_node(&mut self.root, at, node) else {
            return false;
        };
        let Some(slot) = after.offset.checked_sub(1) else {
            return false;
        };
        let mut path = after.path.child(slot);
        while let Some(Node::Element(_)) = self.root.node_at(path.indices()) {
            path.push(0);
        }

        let len = text.chars().count();
        for kind in lift {
            let slice = TextSlice {
                path: path.clone(),
                from: 0,
                to: len,
            };
            match self.unmark_slice(&slice, kind) {
                Some(lifted) => path = lifted,
                None => break,
            }
        }
        true
    }
}
