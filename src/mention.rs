//! `@mention` detection, candidate lookup, session lifecycle and token
//! insertion.

use crate::directory::Category;

pub mod filter;
pub mod inserter;
pub mod scanner;
pub mod session;

pub use filter::filter;
pub use inserter::{Committed, commit};
pub use scanner::{ScanOutcome, SessionUpdate, TriggerMatch, TriggerScanner, find_trigger};
pub use session::{MentionSession, SessionTransition};

/// Query derived from the text before the cursor.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MentionQuery {
    pub raw_text: String,
    pub category: Category,
}
