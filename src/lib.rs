//! Rich-text editing with `@mention` autocomplete and live format state.
//!
//! The core ([`mention`], [`format`]) only talks to the document through the
//! traits in [`surface`]. [`editor::DocumentSurface`] implements them over an
//! in-memory tree, and [`controller::MentionEditor`] ties everything together
//! for a host.

pub mod config;
pub mod controller;
pub mod directory;
pub mod dom;
pub mod editor;
pub mod error;
pub mod extract;
pub mod format;
pub mod interchange;
pub mod mention;
pub mod render;
pub mod snapshot;
pub mod surface;
pub mod theme;

#[cfg(test)]
mod testing;

pub use controller::{MentionEditor, PickerView};
pub use directory::{Category, Directory, DirectoryEntry};
pub use editor::DocumentSurface;
pub use format::{FormatKind, FormatState};
