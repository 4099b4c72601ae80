//! Format kinds and the tracker that mirrors their state at the selection.

use tracing::trace;

use crate::surface::{CommandExecutor, EditableSurface};

pub mod dispatcher;

pub use dispatcher::{CommandDispatcher, FontAnnotation};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormatKind {
    Bold,
    Italic,
    Underline,
    AlignLeft,
    AlignCenter,
    AlignRight,
    Justify,
    BulletList,
    NumberList,
}

impl FormatKind {
    pub const ALL: [FormatKind; 9] = [
        FormatKind::Bold,
        FormatKind::Italic,
        FormatKind::Underline,
        FormatKind::AlignLeft,
        FormatKind::AlignCenter,
        FormatKind::AlignRight,
        FormatKind::Justify,
        FormatKind::BulletList,
        FormatKind::NumberList,
    ];

    pub const ALIGNMENTS: [FormatKind; 4] = [
        FormatKind::AlignLeft,
        FormatKind::AlignCenter,
        FormatKind::AlignRight,
        FormatKind::Justify,
    ];

    pub fn command_name(&self) -> &'static str {
        match self {
            FormatKind::Bold => "bold",
            FormatKind::Italic => "italic",
            FormatKind::Underline => "underline",
            FormatKind::AlignLeft => "justifyLeft",
            FormatKind::AlignCenter => "justifyCenter",
            FormatKind::AlignRight => "justifyRight",
            FormatKind::Justify => "justifyFull",
            FormatKind::BulletList => "insertUnorderedList",
            FormatKind::NumberList => "insertOrderedList",
        }
    }

    pub fn from_command_name(name: &str) -> Option<Self> {
        FormatKind::ALL
            .into_iter()
            .find(|kind| kind.command_name() == name)
    }

    pub fn is_alignment(&self) -> bool {
        FormatKind::ALIGNMENTS.contains(self)
    }

    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            FormatKind::Bold | FormatKind::Italic | FormatKind::Underline
        )
    }

    /// `text-align` value for alignment kinds.
    pub fn alignment_value(&self) -> Option<&'static str> {
        match self {
            FormatKind::AlignLeft => Some("left"),
            FormatKind::AlignCenter => Some("center"),
            FormatKind::AlignRight => Some("right"),
            FormatKind::Justify => Some("justify"),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FormatKind::Bold => "B",
            FormatKind::Italic => "I",
            FormatKind::Underline => "U",
            FormatKind::AlignLeft => "Left",
            FormatKind::AlignCenter => "Center",
            FormatKind::AlignRight => "Right",
            FormatKind::Justify => "Justify",
            FormatKind::BulletList => "• List",
            FormatKind::NumberList => "1. List",
        }
    }
}

/// Whether each format kind is active at the selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FormatState {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub align_left: bool,
    pub align_center: bool,
    pub align_right: bool,
    pub justify: bool,
    pub bullet_list: bool,
    pub number_list: bool,
}

impl FormatState {
    pub fn get(&self, kind: FormatKind) -> bool {
        match kind {
            FormatKind::Bold => self.bold,
            FormatKind::Italic => self.italic,
            FormatKind::Underline => self.underline,
            FormatKind::AlignLeft => self.align_left,
            FormatKind::AlignCenter => self.align_center,
            FormatKind::AlignRight => self.align_right,
            FormatKind::Justify => self.justify,
            FormatKind::BulletList => self.bullet_list,
            FormatKind::NumberList => self.number_list,
        }
    }

    pub fn set(&mut self, kind: FormatKind, active: bool) {
        let slot = match kind {
            FormatKind::Bold => &mut self.bold,
            FormatKind::Italic => &mut self.italic,
            FormatKind::Underline => &mut self.underline,
            FormatKind::AlignLeft => &mut self.align_left,
            FormatKind::AlignCenter => &mut self.align_center,
            FormatKind::AlignRight => &mut self.align_right,
            FormatKind::Justify => &mut self.justify,
            FormatKind::BulletList => &mut self.bullet_list,
            FormatKind::NumberList => &mut self.number_list,
        };
        *slot = active;
    }

    pub fn active_kinds(&self) -> Vec<FormatKind> {
        FormatKind::ALL
            .into_iter()
            .filter(|kind| self.get(*kind))
            .collect()
    }
}

/// Keeps the last known [`FormatState`]. Reads only while the surface has
/// focus, so clicking into a toolbar never blanks the highlighting.
#[derive(Debug, Default)]
pub struct FormatTracker {
    state: FormatState,
    refresh_pending: bool,
}

impl FormatTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> FormatState {
        self.state
    }

    pub fn refresh<S>(&mut self, surface: &S) -> FormatState
    where
        S: EditableSurface + CommandExecutor + ?Sized,
    {
        if !surface.has_focus() {
            trace!("surface unfocused; keeping previous format state");
            return self.state;
        }
        let mut state = FormatState::default();
        for kind in FormatKind::ALL {
            state.set(kind, surface.is_active(kind));
        }
        self.state = state;
        state
    }

    /// Queues a re-read for the next [`run_deferred`](Self::run_deferred).
    pub fn schedule_refresh(&mut self) {
        self.refresh_pending = true;
    }

    pub fn has_pending_refresh(&self) -> bool {
        self.refresh_pending
    }

    pub fn run_deferred<S>(&mut self, surface: &S) -> Option<FormatState>
    where
        S: EditableSurface + CommandExecutor + ?Sized,
    {
        if !std::mem::take(&mut self.refresh_pending) {
            return None;
        }
        Some(self.refresh(surface))
    }
}

#[cfg(test)]
#[path = "format_tests.rs"]
mod format_tests;
