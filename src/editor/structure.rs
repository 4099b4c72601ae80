use tracing::trace;

use super::{Affinity, DocumentSurface, SegmentKind};
use crate::dom::{self, Element, Node, split_text};
use crate::format::FormatKind;
use crate::surface::NodePath;

/// Moves the children of the element at `path` from `index` on into a copy
/// placed right after it. Returns the copy's path.
fn split_element(root: &mut Element, path: &NodePath, index: usize) -> Option<NodePath> {
    let parent_path = path.parent()?;
    let slot = path.last()?;
    let element = root.element_at_mut(path.indices())?;
    let index = index.min(element.children.len());
    let right_children: Vec<Node> = element.children.drain(index..).collect();
    let right = element.shallow_clone().with_children(right_children);
    let parent = root.element_at_mut(parent_path.indices())?;
    parent.children.insert(slot + 1, right.into());
    Some(parent_path.child(slot + 1))
}

fn is_block_node(node: &Node) -> bool {
    node.as_element().is_some_and(Element::is_block_level)
}

/// Bounds of the run of inline siblings around `idx`.
fn inline_run(children: &[Node], idx: usize) -> (usize, usize) {
    let mut lo = idx;
    while lo > 0 && !is_block_node(&children[lo - 1]) {
        lo -= 1;
    }
    let mut hi = (idx + 1).min(children.len());
    while hi < children.len() && !is_block_node(&children[hi]) {
        hi += 1;
    }
    (lo, hi)
}

fn list_tag(kind: FormatKind) -> Option<&'static str> {
    match kind {
        FormatKind::BulletList => Some("ul"),
        FormatKind::NumberList => Some("ol"),
        _ => None,
    }
}

impl DocumentSurface {
    /// Whether the step from `unit - 1` to `unit` moves through content
    /// rather than across a block boundary.
    pub(crate) fn step_in_segment(&self, unit: usize) -> bool {
        self.segments()
            .iter()
            .any(|segment| segment.start < unit && unit <= segment.end())
    }

    fn block_at_unit(&self, unit: usize) -> Option<NodePath> {
        self.segments()
            .into_iter()
            .find(|segment| segment.start <= unit && unit <= segment.end())
            .and_then(|segment| segment.block)
    }

    /// Block holding caret stop `unit`. Inline content sitting directly in
    /// the root is wrapped in a `div` first.
    pub(crate) fn ensure_block_at(&mut self, unit: usize) -> Option<NodePath> {
        let segments = self.segments();
        if segments.is_empty() {
            self.root.children.push(Element::new("div").into());
            let path = NodePath::new(vec![self.root.children.len() - 1]);
            self.set_cursor_unit(0);
            return Some(path);
        }
        let segment = segments
            .iter()
            .find(|segment| segment.start <= unit && unit <= segment.end())?;
        if let Some(block) = &segment.block {
            return Some(block.clone());
        }

        let units = self.selection_units();
        let top = *segment.path.indices().first()?;
        let (lo, hi) = inline_run(&self.root.children, top);
        let run: Vec<Node> = self.root.children.drain(lo..hi).collect();
        self.root
            .children
            .insert(lo, Element::new("div").with_children(run).into());
        self.restore_units(units);
        Some(NodePath::new(vec![lo]))
    }

    /// Distinct blocks touched by the units `start..=end`, in order.
    fn blocks_in_range(&mut self, start: usize, end: usize) -> Vec<NodePath> {
        loop {
            let segments = self.segments();
            let touched: Vec<_> = segments
                .iter()
                .filter(|segment| segment.start <= end && segment.end() >= start)
                .collect();
            if let Some(bare) = touched.iter().find(|segment| segment.block.is_none()) {
                let unit = bare.start;
                if self.ensure_block_at(unit).is_none() {
                    return Vec::new();
                }
                continue;
            }
            if touched.is_empty() {
                return self.ensure_block_at(start).into_iter().collect();
            }
            let mut blocks: Vec<NodePath> = Vec::new();
            for segment in touched {
                if let Some(block) = &segment.block {
                    if !blocks.contains(block) {
                        blocks.push(block.clone());
                    }
                }
            }
            return blocks;
        }
    }

    pub(crate) fn set_alignment(&mut self, kind: FormatKind) -> bool {
        let Some(value) = kind.alignment_value() else {
            return false;
        };
        let Some((start, end)) = self.selection_units() else {
            return false;
        };
        let blocks = self.blocks_in_range(start, end);
        for block in &blocks {
            if let Some(element) = self.root.element_at_mut(block.indices()) {
                element
                    .styles
                    .insert("text-align".to_string(), value.to_string());
            }
        }
        self.restore_units(Some((start, end)));
        !blocks.is_empty()
    }

    /// Removes `kind`'s `text-align` wherever it applies to the selection.
    pub(crate) fn clear_alignment(&mut self, kind: FormatKind) {
        let Some(value) = kind.alignment_value() else {
            return;
        };
        let Some((start, end)) = self.selection_units() else {
            return;
        };
        let paths: Vec<NodePath> = self
            .segments()
            .iter()
            .filter(|segment| segment.start <= end && segment.end() >= start)
            .flat_map(|segment| self.root.element_ancestors(&segment.path))
            .collect();
        for path in paths {
            if let Some(element) = self.root.element_at_mut(path.indices()) {
                if element.style("text-align") == Some(value) {
                    element.styles.remove("text-align");
                }
            }
        }
        if self.root.style("text-align") == Some(value) {
            self.root.styles.remove("text-align");
        }
    }

    /// Wraps the selected blocks in a list of `kind`, converts an enclosing
    /// list of the other kind, or dissolves an enclosing list of this kind.
    pub(crate) fn toggle_list(&mut self, kind: FormatKind) -> bool {
        let Some(tag) = list_tag(kind) else {
            return false;
        };
        let Some((start, end)) = self.selection_units() else {
            return false;
        };
        let blocks = self.blocks_in_range(start, end);
        let Some(first) = blocks.first() else {
            return false;
        };

        if let Some(list_path) = self.list_ancestor(first) {
            let Some(list) = self.root.element_at_mut(list_path.indices()) else {
                return false;
            };
            if list.tag == tag {
                for child in list.children.iter_mut() {
                    if let Node::Element(item) = child {
                        if item.tag == "li" {
                            item.tag = "div".to_string();
                        }
                    }
                }
                dom::unwrap_element(&mut self.root, &list_path);
                trace!(tag, "list removed");
            } else {
                list.tag = tag.to_string();
                trace!(tag, "list retagged");
            }
            self.restore_units(Some((start, end)));
            return true;
        }

        let segments = self.segments();
        let anchors: Vec<usize> = blocks
            .iter()
            .filter_map(|block| {
                segments
                    .iter()
                    .find(|segment| segment.block.as_ref() == Some(block))
                    .map(|segment| segment.start)
            })
            .collect();
        for unit in anchors {
            if let Some(block) = self.block_at_unit(unit) {
                self.convert_block_to_item(&block, tag);
            }
        }
        trace!(tag, "list created");
        self.restore_units(Some((start, end)));
        true
    }

    fn convert_block_to_item(&mut self, block: &NodePath, tag: &str) {
        let (Some(parent_path), Some(slot)) = (block.parent(), block.last()) else {
            return;
        };
        let Some(parent) = self.root.element_at_mut(parent_path.indices()) else {
            return;
        };
        if !matches!(parent.children.get(slot), Some(Node::Element(_))) {
            return;
        }
        let Node::Element(element) = parent.children.remove(slot) else {
            return;
        };
        let item = if matches!(element.tag.as_str(), "div" | "p") {
            let mut item = element;
            item.tag = "li".to_string();
            item
        } else {
            Element::new("li").with_children(vec![element.into()])
        };

        if slot > 0 {
            if let Some(Node::Element(previous)) = parent.children.get_mut(slot - 1) {
                if previous.tag == tag {
                    previous.children.push(item.into());
                    return;
                }
            }
        }
        parent.children.insert(
            slot,
            Element::new(tag).with_children(vec![item.into()]).into(),
        );
    }

    /// Enter: splits the caret's block in two and moves to the second half.
    pub fn insert_paragraph_break(&mut self) -> bool {
        self.delete_selection();
        let Some(unit) = self.cursor_unit() else {
            return false;
        };
        let typing = self.typing.clone();
        let Some(block) = self.ensure_block_at(unit) else {
            return false;
        };
        let position = self.position_at_unit(unit, Affinity::Backward);

        let (mut parent, mut index) = match self.root.node_at(position.path.indices()) {
            Some(Node::Text(text)) => {
                let (left, right) = split_text(text, position.offset);
                let (Some(parent), Some(idx)) = (position.path.parent(), position.path.last()) else {
                    return false;
                };
                if let Some(Node::Text(text)) = self.root.node_at_mut(position.path.indices()) {
                    *text = left;
                }
                if let Some(element) = self.root.element_at_mut(parent.indices()) {
                    element.children.insert(idx + 1, Node::Text(right));
                }
                (parent, idx + 1)
            }
            _ => (position.path.clone(), position.offset),
        };

        loop {
            let Some(right) = split_element(&mut self.root, &parent, index) else {
                return false;
            };
            if parent.depth() <= block.depth() {
                break;
            }
            let (Some(grand), Some(slot)) = (right.parent(), right.last()) else {
                break;
            };
            parent = grand;
            index = slot;
        }

        dom::prune_and_merge(&mut self.root.children);
        self.set_cursor_unit(unit + 1);
        self.typing = typing;
        true
    }

    /// Backspace across a block boundary: the content run at `unit` joins
    /// the end of the previous block.
    pub(crate) fn merge_with_previous_block(&mut self, unit: usize) -> bool {
        let segments = self.segments();
        let Some(current) = segments.iter().find(|segment| segment.start == unit).cloned() else {
            return false;
        };
        let Some(previous) = segments
            .iter()
            .rev()
            .find(|segment| segment.end() + 1 == unit)
            .cloned()
        else {
            return false;
        };

        let container = current.block.clone().unwrap_or_default();
        let Some(element) = self.root.element_at_mut(container.indices()) else {
            return false;
        };
        let run: Vec<Node> = if current.kind == SegmentKind::Empty {
            Vec::new()
        } else {
            let Some(&top) = current.path.indices().get(container.depth()) else {
                return false;
            };
            let (lo, hi) = inline_run(&element.children, top);
            element.children.drain(lo..hi).collect()
        };
        let container_empty = element.children.is_empty();
        if container_empty && !container.is_root() {
            self.remove_with_empty_lists(&container);
        }

        match &previous.block {
            Some(block) => {
                let Some(target) = self.root.element_at_mut(block.indices()) else {
                    return false;
                };
                target.children.extend(run);
            }
            None => {
                let Some(&top) = previous.path.indices().first() else {
                    return false;
                };
                let at = (top + 1).min(self.root.children.len());
                self.root.children.splice(at..at, run);
            }
        }

        dom::prune_and_merge(&mut self.root.children);
        self.set_cursor_unit(unit - 1);
        true
    }

    fn remove_with_empty_lists(&mut self, path: &NodePath) {
        let mut path = path.clone();
        loop {
            let (Some(parent_path), Some(slot)) = (path.parent(), path.last()) else {
                return;
            };
            let Some(parent) = self.root.element_at_mut(parent_path.indices()) else {
                return;
            };
            if slot < parent.children.len() {
                parent.children.remove(slot);
            }
            if parent_path.is_root() || !parent.is_list() || !parent.children.is_empty() {
                return;
            }
            path = parent_path;
        }
    }
}
