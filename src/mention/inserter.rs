use tracing::debug;

use super::scanner::find_trigger;
use crate::directory::{Category, DirectoryEntry};
use crate::error::MentionError;
use crate::surface::{EditableSurface, MentionToken, Position, Selection, SurfaceNode};

/// Result of a successful commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Committed {
    pub token: MentionToken,
    /// Cursor after the trailing space.
    pub cursor: Position,
}

pub fn token_for(entry: &DirectoryEntry, category: Category) -> MentionToken {
    let display_label = match category {
        Category::Person => entry.secondary_text.clone(),
        Category::Object => entry.display_name.clone(),
    };
    MentionToken {
        category,
        referenced_id: entry.id,
        display_label,
    }
}

/// Replaces the trigger before the cursor with a mention token and a
/// single space, leaving the cursor after the space.
///
/// The trigger is derived again from the live cursor: if there is no
/// selection, or the text before it no longer ends in a trigger, the
/// document is left untouched.
pub fn commit<S>(
    surface: &mut S,
    entry: &DirectoryEntry,
    category: Category,
) -> Result<Committed, MentionError>
where
    S: EditableSurface + ?Sized,
{
    let Some(selection) = surface.selection() else {
        return Err(MentionError::NoActiveSelection);
    };
    let text = surface.text_before(&selection.start);
    let Some(found) = find_trigger(&text) else {
        return Err(MentionError::TriggerLost);
    };

    let matched_len = found.matched_text.chars().count();
    let Some(trigger_start) = surface.position_before(&selection.start, matched_len) else {
        return Err(MentionError::TriggerLost);
    };

    let at = surface.delete_range(&Selection::new(trigger_start, selection.end))?;
    let token = token_for(entry, category);
    let after_token = surface.insert_node(&at, SurfaceNode::Mention(token.clone()))?;
    let after_space = surface.insert_node(&after_token, SurfaceNode::Text(" ".to_string()))?;
    surface.set_cursor(after_space.clone());
    surface.focus();

    debug!(
        category = category.tag(),
        id = entry.id,
        label = %token.display_label,
        "mention committed"
    );
    Ok(Committed {
        token,
        cursor: after_space,
    })
}
