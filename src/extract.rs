//! Reading mentions back out of a surface.

use serde::Serialize;

use crate::directory::Category;
use crate::dom::MENTION_CLASS;
use crate::surface::{EditableSurface, NodeKind, NodeWalk};

/// One mention found in the document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MentionRef {
    pub category: Category,
    pub id: u64,
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ParsedContent {
    pub text: String,
    pub mentions: Vec<MentionRef>,
}

/// Mention elements in document order. Elements without a numeric `data-id`
/// are skipped; an unknown or missing `data-type` counts as a person.
pub fn collect_mentions<W>(walk: &mut W) -> Vec<MentionRef>
where
    W: NodeWalk + ?Sized,
{
    let mut mentions = Vec::new();
    while let Some(node) = walk.next_node() {
        if node.kind() != NodeKind::Element || !node.has_class(MENTION_CLASS) {
            continue;
        }
        let Some(id) = node.attribute("data-id").and_then(|id| id.trim().parse().ok()) else {
            continue;
        };
        let category = node
            .attribute("data-type")
            .and_then(Category::from_tag)
            .unwrap_or(Category::Person);
        mentions.push(MentionRef {
            category,
            id,
            name: node.text_content().trim().to_string(),
        });
    }
    mentions
}

pub fn parse_content<S>(surface: &S) -> ParsedContent
where
    S: EditableSurface + ?Sized,
{
    let mut walk = surface.walk();
    ParsedContent {
        text: surface.text_content(),
        mentions: collect_mentions(walk.as_mut()),
    }
}
