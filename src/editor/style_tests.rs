use super::*;

fn selected(root: Element, start: usize, end: usize) -> DocumentSurface {
    let mut surface = DocumentSurface::new(root);
    surface.select_units(start, end);
    surface
}

#[test]
fn bold_wraps_and_unwraps_a_selection() {
    let mut surface = selected(Element::new("div").with_text("hello world"), 0, 5);
    assert!(surface.toggle_inline(FormatKind::Bold));
    assert_eq!(surface.html_snapshot(), "<b>hello</b> world");
    assert!(surface.inline_active(FormatKind::Bold));
    assert_eq!(surface.selection_units(), Some((0, 5)));

    assert!(surface.toggle_inline(FormatKind::Bold));
    assert_eq!(surface.html_snapshot(), "hello world");
    assert!(!surface.inline_active(FormatKind::Bold));
}

#[test]
fn unbolding_the_middle_splits_the_wrapper() {
    let root = Element::new("div")
        .with_children(vec![Element::new("b").with_text("hello").into()]);
    let mut surface = selected(root, 1, 3);
    assert!(surface.inline_active(FormatKind::Bold));
    surface.toggle_inline(FormatKind::Bold);
    assert_eq!(surface.html_snapshot(), "<b>h</b>el<b>lo</b>");
    assert!(!surface.inline_active(FormatKind::Bold));
}

#[test]
fn mixed_selection_is_bolded_throughout() {
    let root = Element::new("div").with_children(vec![
        Element::new("b").with_text("ab").into(),
        Node::text("cd"),
    ]);
    let mut surface = selected(root, 0, 4);
    assert!(!surface.inline_active(FormatKind::Bold));
    surface.toggle_inline(FormatKind::Bold);
    assert_eq!(surface.html_snapshot(), "<b>abcd</b>");
}

#[test]
fn bold_blocks_are_overridden_not_split() {
    let root = Element::new("div").with_children(vec![
        Element::new("div")
            .with_style("font-weight", "bold")
            .with_text("abc")
            .into(),
    ]);
    let mut surface = selected(root, 0, 1);
    surface.toggle_inline(FormatKind::Bold);
    assert_eq!(
        surface.html_snapshot(),
        "<div style=\"font-weight: bold\"><span style=\"font-weight: normal\">a</span>bc</div>"
    );
    assert!(!surface.inline_active(FormatKind::Bold));
}

#[test]
fn styled_wrappers_keep_their_other_styles() {
    let root = Element::new("div").with_children(vec![
        Element::new("span")
            .with_style("font-style", "italic")
            .with_style("font-weight", "bold")
            .with_text("ab")
            .into(),
    ]);
    let mut surface = selected(root, 0, 2);
    surface.toggle_inline(FormatKind::Bold);
    assert_eq!(
        surface.html_snapshot(),
        "<span style=\"font-style: italic\">ab</span>"
    );
    assert!(surface.inline_active(FormatKind::Italic));
}

#[test]
fn underline_on_a_mention_only_selection_does_nothing() {
    let token = crate::surface::MentionToken {
        category: crate::directory::Category::Object,
        referenced_id: 1,
        display_label: "Alpha".to_string(),
    };
    let root = Element::new("div").with_children(vec![Element::mention(&token).into()]);
    let mut surface = selected(root, 0, 1);
    assert!(!surface.toggle_inline(FormatKind::Underline));
    assert!(!surface.inline_active(FormatKind::Underline));
}

#[test]
fn font_face_wraps_each_text_piece() {
    let root = Element::new("div").with_children(vec![
        Node::text("ab"),
        Element::new("i").with_text("cd").into(),
    ]);
    let mut surface = selected(root, 1, 3);
    assert!(surface.apply_font_face("Georgia"));
    assert_eq!(
        surface.html_snapshot(),
        "a<font face=\"Georgia\">b</font><i><font face=\"Georgia\">c</font>d</i>"
    );
    assert_eq!(
        surface.fonts_in_selection(),
        vec![Some("Georgia".to_string())]
    );
}

#[test]
fn strip_nested_leaves_the_element_itself() {
    let mut element = Element::new("div")
        .with_style("font-family", "Georgia")
        .with_children(vec![
            Element::new("font")
                .with_attribute("face", "Impact")
                .with_attribute("color", "red")
                .with_text("a")
                .into(),
            Element::new("font").with_attribute("face", "Impact").with_text("b").into(),
        ]);
    styles::strip_nested(&mut element, "font-family");

    assert_eq!(element.style("font-family"), Some("Georgia"));
    assert_eq!(
        dom::to_html(&element.children),
        "<font color=\"red\">a</font>b"
    );
}

#[test]
fn text_slices_skip_mentions_and_clip_to_the_range() {
    let token = crate::surface::MentionToken {
        category: crate::directory::Category::Person,
        referenced_id: 3,
        display_label: "carol".to_string(),
    };
    let surface = DocumentSurface::new(Element::new("div").with_children(vec![
        Node::text("abc"),
        Element::mention(&token).into(),
        Node::text("de"),
    ]));
    let slices = surface.text_slices(1, 5);
    let shape: Vec<(Vec<usize>, usize, usize)> = slices
        .iter()
        .map(|slice| (slice.path.indices().to_vec(), slice.from, slice.to))
        .collect();
    assert_eq!(shape, vec![(vec![0], 1, 3), (vec![2], 0, 1)]);
}
