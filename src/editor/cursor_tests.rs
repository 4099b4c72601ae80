use super::*;
use crate::directory::Category;
use crate::surface::MentionToken;

fn mention(label: &str) -> Node {
    Element::mention(&MentionToken {
        category: Category::Person,
        referenced_id: 1,
        display_label: label.to_string(),
    })
    .into()
}

fn blocks(texts: &[&str]) -> DocumentSurface {
    DocumentSurface::new(
        Element::new("div").with_children(
            texts
                .iter()
                .map(|text| {
                    if text.is_empty() {
                        Element::new("div").into()
                    } else {
                        Element::new("div").with_text(text).into()
                    }
                })
                .collect(),
        ),
    )
}

#[test]
fn segments_number_caret_stops() {
    let surface = DocumentSurface::new(Element::new("div").with_children(vec![
        Element::new("p")
            .with_children(vec![Node::text("ab"), mention("bob"), Node::text("c")])
            .into(),
        Element::new("p").into(),
        Element::new("p").with_text("xyz").into(),
    ]));
    let segments = surface.segments();
    let shape: Vec<(SegmentKind, usize, usize)> = segments
        .iter()
        .map(|segment| (segment.kind, segment.start, segment.len))
        .collect();
    assert_eq!(
        shape,
        vec![
            (SegmentKind::Text, 0, 2),
            (SegmentKind::Atom, 2, 1),
            (SegmentKind::Text, 3, 1),
            (SegmentKind::Empty, 5, 0),
            (SegmentKind::Text, 6, 3),
        ]
    );
    assert_eq!(segments[1].block, Some(NodePath::new(vec![0])));
    assert_eq!(surface.unit_len(), 9);
}

#[test]
fn affinity_picks_the_text_side_of_a_boundary() {
    let surface = DocumentSurface::new(Element::new("div").with_children(vec![
        Node::text("ab"),
        Element::new("b").with_text("cd").into(),
    ]));
    assert_eq!(
        surface.position_at_unit(2, Affinity::Backward),
        Position::new(vec![0], 2)
    );
    assert_eq!(
        surface.position_at_unit(2, Affinity::Forward),
        Position::new(vec![1, 0], 0)
    );
}

#[test]
fn mentions_are_stepped_over_as_one_unit() {
    let mut surface = DocumentSurface::new(Element::new("div").with_children(vec![
        Node::text("a"),
        mention("carol"),
        Node::text("b"),
    ]));
    surface.set_cursor_unit(1);
    assert!(surface.move_right());
    assert_eq!(surface.cursor_unit(), Some(2));
    assert!(surface.move_left());
    assert!(surface.move_left());
    assert_eq!(surface.cursor_unit(), Some(0));
    assert!(!surface.move_left());
}

#[test]
fn arrows_collapse_a_selection_to_its_edge() {
    let mut surface = blocks(&["hello"]);
    surface.select_units(1, 4);
    assert!(surface.move_left());
    assert_eq!(surface.selection_units(), Some((1, 1)));

    surface.select_units(1, 4);
    assert!(surface.move_right());
    assert_eq!(surface.selection_units(), Some((4, 4)));
    assert!(surface.move_right());
    assert!(!surface.move_right());
}

#[test]
fn extending_keeps_the_anchor_fixed() {
    let mut surface = blocks(&["hello"]);
    surface.set_cursor_unit(2);
    assert!(surface.extend_selection(1));
    assert!(surface.extend_selection(1));
    assert_eq!(surface.selection_units(), Some((2, 4)));

    assert!(surface.extend_selection(-1));
    assert!(surface.extend_selection(-1));
    assert!(surface.extend_selection(-1));
    assert_eq!(surface.selection_units(), Some((1, 2)));
    assert!(surface.move_left());
    assert_eq!(surface.cursor_unit(), Some(1));
}

#[test]
fn start_and_end_jump_across_blocks() {
    let mut surface = blocks(&["one", "two"]);
    assert!(surface.move_to_start());
    assert_eq!(surface.cursor_unit(), Some(0));
    assert!(surface.move_to_end());
    assert_eq!(surface.cursor_unit(), Some(7));
}

#[test]
fn vertical_moves_keep_the_column() {
    let mut surface = blocks(&["first line", "third"]);
    surface.set_cursor_unit(4);
    assert!(surface.move_down());
    assert_eq!(surface.cursor_unit(), Some(15));
    assert!(!surface.move_down());
    assert!(surface.move_up());
    assert_eq!(surface.cursor_unit(), Some(4));
    assert!(!surface.move_up());
}

#[test]
fn empty_blocks_are_a_caret_stop() {
    let mut surface = blocks(&["ab", "", "cd"]);
    surface.set_cursor_unit(0);
    assert!(surface.move_down());
    assert_eq!(surface.cursor_unit(), Some(3));
    assert!(surface.move_right());
    assert_eq!(surface.cursor_unit(), Some(4));
}

#[test]
fn line_start_and_end_follow_wrapping() {
    let mut surface = blocks(&["aaaa bbbb"]);
    surface.set_wrap_width(6);
    surface.set_cursor_unit(7);
    assert!(surface.move_to_line_start());
    assert_eq!(surface.cursor_unit(), Some(5));
    assert!(surface.move_to_line_end());
    assert_eq!(surface.cursor_unit(), Some(9));
    assert!(!surface.move_to_line_end());
}

#[test]
fn cursor_scrolls_into_view() {
    let mut surface = blocks(&["1", "2", "3", "4", "5"]);
    surface.move_to_end();
    surface.ensure_cursor_visible(2);
    assert_eq!(surface.scroll_top(), 3);
    surface.move_to_start();
    surface.ensure_cursor_visible(2);
    assert_eq!(surface.scroll_top(), 0);
}

#[test]
fn explicit_selection_clears_extension_state() {
    let mut surface = blocks(&["hello"]);
    surface.set_cursor_unit(1);
    surface.extend_selection(2);
    surface.set_selection(Some(Selection::collapsed(Position::new(vec![0, 0], 4))));
    assert!(surface.extend_selection(1));
    assert_eq!(surface.selection_units(), Some((4, 5)));
}
