//! Wires the scanner, mention session, format tracker and dispatcher to one
//! surface and exposes the picker and toolbar views a host draws.

use crossterm::event::{KeyCode, KeyModifiers};
use tracing::{debug, trace};

use crate::config::EditorConfig;
use crate::directory::{Category, Directory, DirectoryEntry};
use crate::editor::DocumentSurface;
use crate::error::MentionError;
use crate::extract::{self, ParsedContent};
use crate::format::dispatcher::{CommandDispatcher, FontAnnotation};
use crate::format::{FormatKind, FormatState, FormatTracker};
use crate::mention::{self, Committed, MentionSession, SessionTransition, TriggerScanner};
use crate::snapshot;
use crate::surface::{AnchorPosition, Command, CommandExecutor, EditableSurface};

/// What a host needs to draw the mention picker.
#[derive(Clone, Debug, PartialEq)]
pub struct PickerView {
    pub anchor: AnchorPosition,
    pub active_category: Category,
    pub selected_index: usize,
    pub candidates: Vec<DirectoryEntry>,
}

type ContentListener = Box<dyn FnMut(&str)>;

pub struct MentionEditor<S = DocumentSurface> {
    surface: S,
    directory: Directory,
    config: EditorConfig,
    scanner: TriggerScanner,
    session: MentionSession,
    tracker: FormatTracker,
    dispatcher: CommandDispatcher,
    listeners: Vec<ContentListener>,
}

impl<S> MentionEditor<S>
where
    S: EditableSurface + CommandExecutor,
{
    pub fn new(surface: S, directory: Directory, config: EditorConfig) -> Self {
        let mut tracker = FormatTracker::new();
        tracker.refresh(&surface);
        Self {
            scanner: TriggerScanner::new(config.picker_offset),
            session: MentionSession::new(config.default_category),
            dispatcher: CommandDispatcher::new(&config.default_font),
            tracker,
            surface,
            directory,
            config,
            listeners: Vec::new(),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Direct access for host-driven edits. Follow up with
    /// [`handle_input`](Self::handle_input) or
    /// [`handle_selection_change`](Self::handle_selection_change).
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Registers a listener called with the font-preserving snapshot after
    /// every content change.
    pub fn on_content_change(&mut self, listener: impl FnMut(&str) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Completes a queued format-state re-read. Hosts call this after every
    /// event; every entry point below calls it first.
    pub fn run_deferred(&mut self) -> bool {
        self.tracker.run_deferred(&self.surface).is_some()
    }

    /// Content-mutating input: rescans for a trigger, refreshes the format
    /// state and notifies listeners.
    pub fn handle_input(&mut self) -> SessionTransition {
        self.run_deferred();
        let transition = self.rescan();
        self.tracker.refresh(&self.surface);
        self.notify();
        transition
    }

    /// Cursor movement, clicks and key releases.
    pub fn handle_selection_change(&mut self) -> SessionTransition {
        self.run_deferred();
        let transition = self.rescan();
        self.tracker.refresh(&self.surface);
        transition
    }

    fn rescan(&mut self) -> SessionTransition {
        let outcome = self.scanner.scan(&self.surface);
        let transition = self.session.apply_scan(outcome, &self.directory);
        trace!(?transition, "scan applied");
        transition
    }

    fn notify(&mut self) {
        if self.listeners.is_empty() {
            return;
        }
        let html = self.snapshot();
        for listener in &mut self.listeners {
            listener(&html);
        }
    }

    pub fn snapshot(&self) -> String {
        snapshot::with_font(&self.surface.html_snapshot(), self.dispatcher.selected_font())
    }

    pub fn parse_content(&self) -> ParsedContent {
        extract::parse_content(&self.surface)
    }

    pub fn is_picker_open(&self) -> bool {
        self.session.is_open()
    }

    pub fn picker(&self) -> Option<PickerView> {
        if !self.session.is_open() {
            return None;
        }
        Some(PickerView {
            anchor: self.session.anchor(),
            active_category: self.session.active_category(),
            selected_index: self.session.selected_index(),
            candidates: self.session.candidates().to_vec(),
        })
    }

    pub fn select_next(&mut self) {
        self.run_deferred();
        self.session.select_next();
    }

    pub fn select_previous(&mut self) {
        self.run_deferred();
        self.session.select_previous();
    }

    /// Pointer hover over a picker row.
    pub fn select_index(&mut self, index: usize) -> bool {
        self.run_deferred();
        self.session.select_index(index)
    }

    /// Pointer click on a picker tab.
    pub fn set_category(&mut self, category: Category) {
        self.run_deferred();
        self.session.set_category(category, &self.directory);
    }

    pub fn commit_selected(&mut self) -> Result<Committed, MentionError> {
        self.run_deferred();
        let Some(entry) = self.session.selected_entry().cloned() else {
            debug!("commit requested with no candidates");
            return Err(MentionError::EmptyCandidateList);
        };
        self.commit_entry(&entry)
    }

    /// Pointer click on a picker row.
    pub fn commit_entry(&mut self, entry: &DirectoryEntry) -> Result<Committed, MentionError> {
        self.run_deferred();
        let category = if self.session.is_open() {
            self.session.active_category()
        } else {
            entry.category
        };
        match mention::commit(&mut self.surface, entry, category) {
            Ok(committed) => {
                self.session.close();
                // Listeners and the tracker see the insertion as typed input.
                self.handle_input();
                Ok(committed)
            }
            Err(err) => {
                debug!(%err, "mention commit skipped");
                Err(err)
            }
        }
    }

    /// Closes the picker without touching the document.
    pub fn cancel(&mut self) {
        self.run_deferred();
        self.session.cancel();
        self.surface.focus();
    }

    pub fn format_state(&self) -> FormatState {
        self.tracker.state()
    }

    pub fn selected_font(&self) -> &str {
        self.dispatcher.selected_font()
    }

    pub fn apply_format(&mut self, kind: FormatKind) -> bool {
        self.run_deferred();
        let applied = self
            .dispatcher
            .apply(&mut self.surface, &mut self.tracker, kind, None);
        self.notify();
        applied
    }

    pub fn select_font(&mut self, family: &str) -> FontAnnotation {
        self.run_deferred();
        let annotation = self
            .dispatcher
            .apply_font(&mut self.surface, &mut self.tracker, family);
        trace!(?annotation, family, "font selected");
        self.notify();
        annotation
    }

    /// Inserts clipboard content as plain text through the executor.
    pub fn paste(&mut self, text: &str) -> bool {
        self.run_deferred();
        let pasted = self.surface.apply(Command::InsertText, Some(text));
        if pasted {
            self.handle_input();
        }
        pasted
    }

    /// Picker navigation and formatting shortcuts. Returns `false` for keys
    /// the host should handle as ordinary editing.
    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        self.run_deferred();
        if self.session.is_open() && self.handle_picker_key(code) {
            return true;
        }
        if modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::SUPER) {
            let kind = match code {
                KeyCode::Char('b') | KeyCode::Char('B') => FormatKind::Bold,
                KeyCode::Char('i') | KeyCode::Char('I') => FormatKind::Italic,
                KeyCode::Char('u') | KeyCode::Char('U') => FormatKind::Underline,
                _ => return false,
            };
            self.apply_format(kind);
            return true;
        }
        false
    }

    fn handle_picker_key(&mut self, code: KeyCode) -> bool {
        if code == KeyCode::Esc {
            self.cancel();
            return true;
        }
        // With nothing to pick, the remaining keys fall through to the text.
        if self.session.candidates().is_empty() {
            return false;
        }
        match code {
            KeyCode::Down => self.select_next(),
            KeyCode::Up => self.select_previous(),
            KeyCode::Enter | KeyCode::Tab => {
                let _ = self.commit_selected();
            }
            _ => return false,
        }
        true
    }
}

impl MentionEditor<DocumentSurface> {
    /// Handles `code` as picker navigation, a shortcut or an edit of the
    /// in-memory surface. Returns whether anything happened.
    pub fn handle_edit_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        if self.handle_key(code, modifiers) {
            return true;
        }
        if modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
            return false;
        }
        let shift = modifiers.contains(KeyModifiers::SHIFT);
        let surface = &mut self.surface;
        let edited = match code {
            KeyCode::Char(ch) => surface.insert_char(ch),
            KeyCode::Tab => surface.insert_char('\t'),
            KeyCode::Enter => surface.insert_paragraph_break(),
            KeyCode::Backspace => surface.backspace(),
            KeyCode::Delete => surface.delete_forward(),
            _ => {
                let moved = match code {
                    KeyCode::Left if shift => surface.extend_selection(-1),
                    KeyCode::Right if shift => surface.extend_selection(1),
                    KeyCode::Left => surface.move_left(),
                    KeyCode::Right => surface.move_right(),
                    KeyCode::Up => surface.move_up(),
                    KeyCode::Down => surface.move_down(),
                    KeyCode::Home => surface.move_to_line_start(),
                    KeyCode::End => surface.move_to_line_end(),
                    _ => return false,
                };
                if moved {
                    self.handle_selection_change();
                }
                return moved;
            }
        };
        if edited {
            self.handle_input();
        }
        edited
    }

    /// Types `text` one character at a time, as a user would.
    pub fn type_text(&mut self, text: &str) {
        for ch in text.chars() {
            if self.surface.insert_char(ch) {
                self.handle_input();
            }
        }
    }

    pub fn focus(&mut self) {
        self.surface.focus();
        self.handle_selection_change();
    }

    pub fn blur(&mut self) {
        self.surface.blur();
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod controller_tests;
