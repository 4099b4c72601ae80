//! HTML snapshots that keep the selected font when the content carries none.

use std::sync::OnceLock;

use regex::Regex;

const WRAPPER_PREFIX: &str = "<div style=\"font-family:";

fn wrapper_pattern() -> &'static Regex {
    static WRAPPER: OnceLock<Regex> = OnceLock::new();
    WRAPPER.get_or_init(|| Regex::new(r#"(?i)^<div style="font-family:[^"]*""#).unwrap())
}

fn font_tag_pattern() -> &'static Regex {
    static FONT_TAG: OnceLock<Regex> = OnceLock::new();
    FONT_TAG.get_or_init(|| Regex::new(r"(?i)<font[^>]*>").unwrap())
}

fn has_font_annotation(html: &str) -> bool {
    html.contains("font-family") || html.contains("face=") || font_tag_pattern().is_match(html)
}

/// Serializes `html` so that `font` survives outside the editor.
///
/// Content already wrapped in a font block has that block's font replaced.
/// Content without any font annotation is wrapped in a new block. Content
/// that annotates fonts itself, and blank content, are returned as is.
/// Applying this twice gives the same result as applying it once.
pub fn with_font(html: &str, font: &str) -> String {
    let trimmed = html.trim();
    if font.is_empty() || trimmed.is_empty() {
        return html.to_string();
    }

    if trimmed.starts_with(WRAPPER_PREFIX) {
        let replacement = format!("<div style=\"font-family: {font}\"");
        return wrapper_pattern()
            .replace(trimmed, regex::NoExpand(&replacement))
            .into_owned();
    }
    if has_font_annotation(html) {
        return html.to_string();
    }
    format!("<div style=\"font-family: {font}\">{html}</div>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_plain_content() {
        assert_eq!(
            with_font("hello <b>there</b>", "Georgia"),
            "<div style=\"font-family: Georgia\">hello <b>there</b></div>"
        );
    }

    #[test]
    fn rewrites_existing_wrapper() {
        let html = "<div style=\"font-family: Arial\">hi</div>";
        assert_eq!(
            with_font(html, "Impact"),
            "<div style=\"font-family: Impact\">hi</div>"
        );
    }

    #[test]
    fn second_application_changes_nothing() {
        let once = with_font("plain", "Verdana");
        assert_eq!(with_font(&once, "Verdana"), once);
    }

    #[test]
    fn inner_annotations_are_left_alone() {
        let span = "a <span style=\"font-family: Impact\">b</span>";
        assert_eq!(with_font(span, "Arial"), span);
        let legacy = "<font face=\"Georgia\">x</font>";
        assert_eq!(with_font(legacy, "Arial"), legacy);
    }

    #[test]
    fn blank_content_is_not_wrapped() {
        assert_eq!(with_font("", "Arial"), "");
        assert_eq!(with_font("  ", "Arial"), "  ");
    }

    #[test]
    fn font_names_are_not_treated_as_patterns() {
        let html = "<div style=\"font-family: Arial\">x</div>";
        assert_eq!(
            with_font(html, "$0 Sans"),
            "<div style=\"font-family: $0 Sans\">x</div>"
        );
    }
}
