use tracing::debug;

use super::MentionQuery;
use super::filter::filter;
use super::scanner::{ScanOutcome, SessionUpdate};
use crate::directory::{Category, Directory, DirectoryEntry};
use crate::surface::AnchorPosition;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionTransition {
    Opened,
    Updated,
    Closed,
    Unchanged,
}

/// Lifecycle of one `@mention` interaction: `Closed` or `Open`.
///
/// While open, `selected_index` is a valid index into `candidates` whenever
/// there are any. Candidates are recomputed from `(query, category)` on every
/// change and never cached across changes.
#[derive(Clone, Debug, PartialEq)]
pub struct MentionSession {
    is_open: bool,
    query: MentionQuery,
    anchor: AnchorPosition,
    default_category: Category,
    selected_index: usize,
    candidates: Vec<DirectoryEntry>,
}

impl Default for MentionSession {
    fn default() -> Self {
        Self::new(Category::Person)
    }
}

impl MentionSession {
    pub fn new(default_category: Category) -> Self {
        Self {
            is_open: false,
            query: MentionQuery {
                raw_text: String::new(),
                category: default_category,
            },
            anchor: AnchorPosition::default(),
            default_category,
            selected_index: 0,
            candidates: Vec::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn query(&self) -> &MentionQuery {
        &self.query
    }

    pub fn anchor(&self) -> AnchorPosition {
        self.anchor
    }

    pub fn active_category(&self) -> Category {
        self.query.category
    }

    pub fn selected_index(&self) -> usize {
        self.selected_index
    }

    pub fn candidates(&self) -> &[DirectoryEntry] {
        &self.candidates
    }

    pub fn selected_entry(&self) -> Option<&DirectoryEntry> {
        if !self.is_open {
            return None;
        }
        self.candidates.get(self.selected_index)
    }

    pub fn apply_scan(&mut self, outcome: ScanOutcome, directory: &Directory) -> SessionTransition {
        match outcome {
            ScanOutcome::Open(update) => self.open_or_update(update, directory),
            ScanOutcome::Close => {
                let was_open = self.is_open;
                self.close();
                if was_open {
                    SessionTransition::Closed
                } else {
                    SessionTransition::Unchanged
                }
            }
        }
    }

    fn open_or_update(&mut self, update: SessionUpdate, directory: &Directory) -> SessionTransition {
        self.anchor = update.anchor;
        if !self.is_open {
            self.is_open = true;
            self.query = MentionQuery {
                raw_text: update.query,
                category: self.default_category,
            };
            self.selected_index = 0;
            self.candidates = filter(&self.query.raw_text, self.query.category, directory);
            debug!(query = %self.query.raw_text, candidates = self.candidates.len(), "mention session opened");
            return SessionTransition::Opened;
        }

        self.query.raw_text = update.query;
        self.recompute(directory);
        SessionTransition::Updated
    }

    pub fn set_category(&mut self, category: Category, directory: &Directory) {
        if !self.is_open {
            return;
        }
        self.query.category = category;
        self.selected_index = 0;
        self.recompute(directory);
    }

    pub fn select_next(&mut self) {
        let count = self.candidates.len();
        if !self.is_open || count == 0 {
            return;
        }
        self.selected_index = (self.selected_index + 1) % count;
    }

    pub fn select_previous(&mut self) {
        let count = self.candidates.len();
        if !self.is_open || count == 0 {
            return;
        }
        self.selected_index = (self.selected_index + count - 1) % count;
    }

    /// Pointer hover. Out-of-range indices are ignored.
    pub fn select_index(&mut self, index: usize) -> bool {
        if !self.is_open || index >= self.candidates.len() {
            return false;
        }
        self.selected_index = index;
        true
    }

    /// Back to `Closed`. Safe to call any number of times.
    pub fn close(&mut self) {
        if self.is_open {
            debug!("mention session closed");
        }
        self.is_open = false;
        self.query.raw_text.clear();
        self.selected_index = 0;
        self.candidates.clear();
    }

    pub fn cancel(&mut self) {
        self.close();
    }

    fn recompute(&mut self, directory: &Directory) {
        let candidates = filter(&self.query.raw_text, self.query.category, directory);
        let same_list = candidates.len() == self.candidates.len()
            && candidates
                .iter()
                .zip(&self.candidates)
                .all(|(new, old)| new.id == old.id);
        if !same_list {
            self.selected_index = 0;
        }
        self.candidates = candidates;
    }
}
