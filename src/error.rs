//! Error types for the editing core.
//!
//! None of these ever reach the user. Every core path that can fail degrades
//! to a no-op; the variants exist so callers and tests can tell the silent
//! outcomes apart.

use thiserror::Error;

/// Failures of the editable surface's structural operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("position does not address a node in the surface: {0}")]
    InvalidPosition(String),

    #[error("range cannot be wrapped: {0}")]
    StructuralInsertFailure(String),

    #[error("position lies inside an atomic node")]
    AtomicNode,
}

/// Outcomes of a mention commit that leave the document untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MentionError {
    #[error("no active selection inside the surface")]
    NoActiveSelection,

    #[error("cursor is no longer after a mention trigger")]
    TriggerLost,

    #[error("no candidate to commit")]
    EmptyCandidateList,

    #[error("surface error: {0}")]
    Surface(#[from] SurfaceError),
}

/// Errors raised while loading documents, directories or configuration.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("FTML error: {0}")]
    Ftml(String),
}
