use std::sync::OnceLock;

use regex::Regex;
use tracing::trace;

use crate::surface::{AnchorPosition, EditableSurface, Selection};

/// Rows (or pixels, for hosts that measure in pixels) between the caret's
/// bottom edge and the picker.
pub const DEFAULT_PICKER_OFFSET: f32 = 5.0;

fn trigger_pattern() -> &'static Regex {
    static TRIGGER: OnceLock<Regex> = OnceLock::new();
    TRIGGER.get_or_init(|| Regex::new(r"@([A-Za-z0-9_]*)$").unwrap())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TriggerMatch {
    /// Identifier characters after the `@`.
    pub query: String,
    /// `@` plus the query.
    pub matched_text: String,
    /// Byte offset of the `@` in the scanned text.
    pub start: usize,
}

/// Finds a trigger ending exactly at the end of `text`. The `@` must open
/// the text or follow whitespace or another `@`; anything else (an email
/// address, text glued to a word) is not a trigger.
pub fn find_trigger(text: &str) -> Option<TriggerMatch> {
    let captures = trigger_pattern().captures(text)?;
    let whole = captures.get(0)?;
    let query = captures.get(1).map_or("", |group| group.as_str());

    if let Some(before) = text[..whole.start()].chars().next_back() {
        if !before.is_whitespace() && before != '@' {
            trace!(%before, "'@' glued to preceding text; not a trigger");
            return None;
        }
    }

    Some(TriggerMatch {
        query: query.to_string(),
        matched_text: whole.as_str().to_string(),
        start: whole.start(),
    })
}

#[derive(Clone, Debug, PartialEq)]
pub struct SessionUpdate {
    pub query: String,
    pub anchor: AnchorPosition,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ScanOutcome {
    Open(SessionUpdate),
    Close,
}

/// Reads the text before the cursor and decides whether a mention session
/// should be open. Never mutates the surface.
#[derive(Clone, Copy, Debug)]
pub struct TriggerScanner {
    picker_offset: f32,
}

impl Default for TriggerScanner {
    fn default() -> Self {
        Self::new(DEFAULT_PICKER_OFFSET)
    }
}

impl TriggerScanner {
    pub fn new(picker_offset: f32) -> Self {
        Self { picker_offset }
    }

    pub fn scan<S>(&self, surface: &S) -> ScanOutcome
    where
        S: EditableSurface + ?Sized,
    {
        let Some(selection) = surface.selection() else {
            return ScanOutcome::Close;
        };
        let text = surface.text_before(&selection.start);
        let Some(found) = find_trigger(&text) else {
            return ScanOutcome::Close;
        };
        ScanOutcome::Open(SessionUpdate {
            query: found.query,
            anchor: self.anchor_for(surface, &selection),
        })
    }

    /// Page-coordinate anchor below the selection. A zero-sized box falls
    /// back to measuring a collapsed range at the selection end.
    fn anchor_for<S>(&self, surface: &S, selection: &Selection) -> AnchorPosition
    where
        S: EditableSurface + ?Sized,
    {
        let mut rect = surface.measure_bounding_box(selection);
        if rect.is_degenerate() {
            rect = surface.measure_bounding_box(&Selection::collapsed(selection.end.clone()));
        }
        let (scroll_x, scroll_y) = surface.scroll_offset();
        AnchorPosition {
            top: rect.bottom() + scroll_y + self.picker_offset,
            left: rect.left + scroll_x,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{Position, Rect};
    use crate::testing::FakeSurface;

    fn query_of(text: &str) -> Option<String> {
        find_trigger(text).map(|found| found.query)
    }

    #[test]
    fn trigger_after_whitespace_or_at_start() {
        assert_eq!(query_of("Hello @al"), Some("al".to_string()));
        assert_eq!(query_of("@"), Some(String::new()));
        assert_eq!(query_of("line\n@x_1"), Some("x_1".to_string()));
        assert_eq!(query_of("tab\t@Q"), Some("Q".to_string()));
    }

    #[test]
    fn trigger_glued_to_text_is_rejected() {
        assert_eq!(query_of("foo@bar"), None);
        assert_eq!(query_of("mail me at a@b"), None);
        assert_eq!(query_of("x.@y"), None);
    }

    #[test]
    fn trigger_after_another_at_is_accepted() {
        let found = find_trigger("@@bob").unwrap();
        assert_eq!(found.query, "bob");
        assert_eq!(found.matched_text, "@bob");
        assert_eq!(found.start, 1);
    }

    #[test]
    fn anything_after_identifier_closes() {
        assert_eq!(query_of("@al "), None);
        assert_eq!(query_of("@al-"), None);
        assert_eq!(query_of("@é"), None);
        assert_eq!(query_of("plain text"), None);
    }

    #[test]
    fn matched_text_covers_at_and_query() {
        let found = find_trigger("say hi to @carol").unwrap();
        assert_eq!(found.matched_text, "@carol");
        assert_eq!(found.start, 10);
    }

    #[test]
    fn scan_uses_selection_start() {
        let mut surface = FakeSurface::with_text("@ab cd");
        surface.selection = Some((3, 6));
        match TriggerScanner::default().scan(&surface) {
            ScanOutcome::Open(update) => assert_eq!(update.query, "ab"),
            ScanOutcome::Close => panic!("expected open"),
        }
    }

    #[test]
    fn scan_without_selection_closes() {
        let mut surface = FakeSurface::with_text("@ab");
        surface.selection = None;
        assert_eq!(TriggerScanner::default().scan(&surface), ScanOutcome::Close);
    }

    #[test]
    fn anchor_adds_scroll_and_offset() {
        let mut surface = FakeSurface::with_text("hi @");
        surface.scroll = (2.0, 30.0);
        let ScanOutcome::Open(update) = TriggerScanner::new(5.0).scan(&surface) else {
            panic!("expected open");
        };
        // rect: top 10, height 1, left 4
        assert_eq!(update.anchor, AnchorPosition { top: 46.0, left: 6.0 });
    }

    #[test]
    fn zero_sized_box_falls_back_to_collapsed_end() {
        let mut surface = FakeSurface::with_text("@ab");
        surface.selection = Some((1, 3));
        surface.measurements.borrow_mut().push(Rect::default());
        let ScanOutcome::Open(update) = TriggerScanner::new(0.0).scan(&surface) else {
            panic!("expected open");
        };

        let measured = surface.measured.borrow();
        assert_eq!(measured.len(), 2);
        assert_eq!(measured[1], Selection::collapsed(Position::new(vec![], 3)));
        assert_eq!(update.anchor, AnchorPosition { top: 11.0, left: 4.0 });
    }
}
