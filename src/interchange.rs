//! FTML import and export.
//!
//! FTML has no notion of fonts, alignment or atomic tokens. Mentions travel as
//! links whose target is `mention:<category>:<id>`; fonts and alignment are
//! dropped on export. Checklists arrive as bullet lists with `[ ]`/`[x]`
//! markers.

use std::io::Read;

use tdoc::writer::Writer;
use tdoc::{ChecklistItem, Document, InlineStyle, Paragraph, Span};
use tracing::debug;

use crate::directory::Category;
use crate::dom::{Element, Node};
use crate::error::ImportError;
use crate::surface::MentionToken;

const MENTION_SCHEME: &str = "mention:";

pub fn mention_target(token: &MentionToken) -> String {
    format!(
        "{MENTION_SCHEME}{}:{}",
        token.category.tag(),
        token.referenced_id
    )
}

/// Parses a `mention:<category>:<id>` link target.
pub fn parse_mention_target(target: &str, label: &str) -> Option<MentionToken> {
    let rest = target.strip_prefix(MENTION_SCHEME)?;
    let (category, id) = rest.split_once(':')?;
    Some(MentionToken {
        category: Category::from_tag(category)?,
        referenced_id: id.parse().ok()?,
        display_label: label.to_string(),
    })
}

/// Reads an FTML document into a surface root.
pub fn import_ftml<R: Read>(reader: R) -> Result<Element, ImportError> {
    let document = tdoc::parse(reader).map_err(|err| ImportError::Ftml(err.to_string()))?;
    Ok(document_to_root(&document))
}

pub fn import_ftml_str(source: &str) -> Result<Element, ImportError> {
    import_ftml(std::io::Cursor::new(source.to_string()))
}

pub fn export_ftml(root: &Element) -> Result<String, ImportError> {
    let document = root_to_document(root);
    Writer::new()
        .write_to_string(&document)
        .map_err(|err| ImportError::Ftml(err.to_string()))
}

pub fn document_to_root(document: &Document) -> Element {
    let mut children = Vec::new();
    for paragraph in &document.paragraphs {
        push_paragraph(&mut children, paragraph);
    }
    Element::new("div").with_children(children)
}

fn push_paragraph(out: &mut Vec<Node>, paragraph: &Paragraph) {
    let element = match paragraph {
        Paragraph::Text { content } => block("div", content),
        Paragraph::Header1 { content } => block("h1", content),
        Paragraph::Header2 { content } => block("h2", content),
        Paragraph::Header3 { content } => block("h3", content),
        Paragraph::CodeBlock { content } => block("pre", content),
        Paragraph::Quote { children } => {
            let mut nested = Vec::new();
            for child in children {
                push_paragraph(&mut nested, child);
            }
            Element::new("blockquote").with_children(nested)
        }
        Paragraph::UnorderedList { entries } => list("ul", entries),
        Paragraph::OrderedList { entries } => list("ol", entries),
        Paragraph::Checklist { items } => checklist(items),
    };
    out.push(element.into());
}

fn block(tag: &str, content: &[Span]) -> Element {
    Element::new(tag).with_children(inline_nodes(content))
}

fn list(tag: &str, entries: &[Vec<Paragraph>]) -> Element {
    let items = entries
        .iter()
        .map(|entry| {
            let mut children = Vec::new();
            match entry.as_slice() {
                // A lone text paragraph becomes the item's own inline content.
                [Paragraph::Text { content }] => children = inline_nodes(content),
                paragraphs => {
                    for paragraph in paragraphs {
                        push_paragraph(&mut children, paragraph);
                    }
                }
            }
            Element::new("li").with_children(children).into()
        })
        .collect();
    Element::new(tag).with_children(items)
}

fn checklist(items: &[ChecklistItem]) -> Element {
    let entries = items
        .iter()
        .map(|item| {
            let marker = if item.checked { "[x] " } else { "[ ] " };
            let mut children = vec![Node::text(marker)];
            children.extend(inline_nodes(&item.content));
            if !item.children.is_empty() {
                children.push(checklist(&item.children).into());
            }
            Element::new("li").with_children(children).into()
        })
        .collect();
    Element::new("ul").with_children(entries)
}

fn inline_nodes(spans: &[Span]) -> Vec<Node> {
    spans.iter().filter_map(inline_node).collect()
}

fn inline_node(span: &Span) -> Option<Node> {
    let mut children = Vec::new();
    if !span.text.is_empty() {
        children.push(Node::text(span.text.clone()));
    }
    children.extend(inline_nodes(&span.children));

    let tag = match span.style {
        InlineStyle::None => {
            return match children.len() {
                0 => None,
                1 => children.pop(),
                _ => Some(Element::new("span").with_children(children).into()),
            };
        }
        InlineStyle::Bold => "b",
        InlineStyle::Italic => "i",
        InlineStyle::Underline => "u",
        InlineStyle::Strike => "s",
        InlineStyle::Highlight => "mark",
        InlineStyle::Code => "code",
        InlineStyle::Link => {
            let target = span.link_target.as_deref().unwrap_or_default();
            let label: String = children.iter().map(Node::text_content).collect();
            if let Some(token) = parse_mention_target(target, &label) {
                return Some(Element::mention(&token).into());
            }
            return Some(
                Element::new("a")
                    .with_attribute("href", target)
                    .with_children(children)
                    .into(),
            );
        }
    };
    Some(Element::new(tag).with_children(children).into())
}

pub fn root_to_document(root: &Element) -> Document {
    Document::new().with_paragraphs(blocks_of(&root.children))
}

/// Converts a mix of inline nodes and blocks into paragraphs. Runs of
/// inline nodes become text paragraphs.
fn blocks_of(nodes: &[Node]) -> Vec<Paragraph> {
    let mut paragraphs = Vec::new();
    let mut run: Vec<Span> = Vec::new();
    for node in nodes {
        match node {
            Node::Element(element) if element.is_block_level() => {
                if !run.is_empty() {
                    paragraphs.push(Paragraph::Text {
                        content: std::mem::take(&mut run),
                    });
                }
                paragraphs.extend(block_paragraphs(element));
            }
            Node::Element(element) if element.tag == "br" => {
                paragraphs.push(Paragraph::Text {
                    content: std::mem::take(&mut run),
                });
            }
            node => run.extend(spans_of(node)),
        }
    }
    if !run.is_empty() {
        paragraphs.push(Paragraph::Text { content: run });
    }
    paragraphs
}

fn block_paragraphs(element: &Element) -> Vec<Paragraph> {
    let has_nested_blocks = element
        .children
        .iter()
        .any(|child| child.as_element().is_some_and(Element::is_block_level));

    match element.tag.as_str() {
        "ul" | "ol" => {
            let entries = element
                .children
                .iter()
                .map(|child| match child {
                    Node::Element(item) if item.tag == "li" => {
                        let mut entry = blocks_of(&item.children);
                        if entry.is_empty() {
                            entry.push(Paragraph::Text {
                                content: vec![Span::new_text("")],
                            });
                        }
                        entry
                    }
                    other => blocks_of(std::slice::from_ref(other)),
                })
                .collect();
            if element.tag == "ol" {
                vec![Paragraph::OrderedList { entries }]
            } else {
                vec![Paragraph::UnorderedList { entries }]
            }
        }
        "blockquote" => vec![Paragraph::Quote {
            children: blocks_of(&element.children),
        }],
        _ if has_nested_blocks => blocks_of(&element.children),
        tag => {
            let content = element.children.iter().flat_map(spans_of).collect();
            let paragraph = match tag {
                "h1" => Paragraph::Header1 { content },
                "h2" => Paragraph::Header2 { content },
                "h3" | "h4" | "h5" | "h6" => Paragraph::Header3 { content },
                "pre" => Paragraph::CodeBlock { content },
                _ => Paragraph::Text { content },
            };
            vec![paragraph]
        }
    }
}

fn inline_style(element: &Element) -> InlineStyle {
    if element.marks_bold() {
        InlineStyle::Bold
    } else if element.marks_italic() {
        InlineStyle::Italic
    } else if element.marks_underline() {
        InlineStyle::Underline
    } else {
        match element.tag.as_str() {
            "s" | "strike" | "del" => InlineStyle::Strike,
            "mark" => InlineStyle::Highlight,
            "code" => InlineStyle::Code,
            "a" => InlineStyle::Link,
            _ => InlineStyle::None,
        }
    }
}

fn spans_of(node: &Node) -> Vec<Span> {
    let element = match node {
        Node::Text(text) if text.is_empty() => return Vec::new(),
        Node::Text(text) => return vec![Span::new_text(text)],
        Node::Element(element) => element,
    };

    if let Some(token) = element.mention_token() {
        let mut span = Span::new_text(&token.display_label);
        span.style = InlineStyle::Link;
        span.link_target = Some(mention_target(&token));
        return vec![span];
    }

    let children: Vec<Span> = element.children.iter().flat_map(spans_of).collect();
    let style = inline_style(element);
    if style == InlineStyle::None {
        if element.font_family().is_some() {
            debug!(tag = %element.tag, "font annotation dropped on export");
        }
        return children;
    }

    let mut span = Span::new_text("");
    span.style = style;
    if style == InlineStyle::Link {
        span.link_target = element.attributes.get("href").cloned();
    }
    span.children = children;
    vec![span]
}
