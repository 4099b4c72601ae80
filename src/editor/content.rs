use tracing::debug;

use super::cursor::position_in;
use super::{Affinity, DocumentSurface};
use crate::dom;
use crate::surface::{EditableSurface, Selection, SurfaceNode};

/// Drops control characters other than tabs from pasted text.
pub(crate) fn sanitize_line(line: &str) -> String {
    line.chars()
        .filter(|ch| !ch.is_control() || *ch == '\t')
        .collect()
}

impl DocumentSurface {
    /// Types `text` at the caret, replacing any selection.
    pub fn insert_text(&mut self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        if text.contains(['\n', '\r']) {
            return self.paste_plain_text(text);
        }
        self.delete_selection();
        let Some(unit) = self.cursor_unit() else {
            return false;
        };
        let at = self.position_at_unit(unit, Affinity::Backward);

        if !self.typing.is_empty() {
            if !self.insert_with_typing_style(&at, text) {
                return false;
            }
        } else if let Err(err) = self.insert_node(&at, SurfaceNode::Text(text.to_string())) {
            debug!(%err, "text insert failed");
            return false;
        }

        dom::prune_and_merge(&mut self.root.children);
        self.set_cursor_unit(unit + text.chars().count());
        true
    }

    pub fn insert_char(&mut self, ch: char) -> bool {
        let mut buffer = [0u8; 4];
        self.insert_text(ch.encode_utf8(&mut buffer))
    }

    /// Removes the selected content. Returns `false` for a collapsed caret.
    pub fn delete_selection(&mut self) -> bool {
        let Some((start, end)) = self.selection_units() else {
            return false;
        };
        if start == end {
            return false;
        }
        let crosses_blocks = (start + 1..=end).any(|unit| !self.step_in_segment(unit));
        let segments = self.segments();
        let range = Selection::new(
            position_in(&segments, start, Affinity::Forward),
            position_in(&segments, end, Affinity::Backward),
        );
        if let Err(err) = self.delete_range(&range) {
            debug!(%err, "selection delete failed");
            return false;
        }
        self.set_cursor_unit(start);

        if crosses_blocks && start < self.unit_len() && !self.step_in_segment(start + 1) {
            self.merge_with_previous_block(start + 1);
        }
        true
    }

    pub fn backspace(&mut self) -> bool {
        if self.delete_selection() {
            return true;
        }
        let Some(unit) = self.cursor_unit() else {
            return false;
        };
        if unit == 0 {
            return false;
        }
        if !self.step_in_segment(unit) {
            return self.merge_with_previous_block(unit);
        }

        let segments = self.segments();
        let range = Selection::new(
            position_in(&segments, unit - 1, Affinity::Forward),
            position_in(&segments, unit, Affinity::Backward),
        );
        if let Err(err) = self.delete_range(&range) {
            debug!(%err, "backspace failed");
            return false;
        }
        self.set_cursor_unit(unit - 1);
        true
    }

    pub fn delete_forward(&mut self) -> bool {
        if self.delete_selection() {
            return true;
        }
        let Some(unit) = self.cursor_unit() else {
            return false;
        };
        if unit >= self.unit_len() {
            return false;
        }
        self.set_cursor_unit(unit + 1);
        self.backspace()
    }

    /// Inserts plain text, turning each line break into a block break.
    pub fn paste_plain_text(&mut self, text: &str) -> bool {
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        let mut changed = self.delete_selection();
        for (idx, line) in text.split('\n').enumerate() {
            if idx > 0 {
                changed |= self.insert_paragraph_break();
            }
            let line = sanitize_line(line);
            if !line.is_empty() {
                changed |= self.insert_text(&line);
            }
        }
        changed
    }
}
