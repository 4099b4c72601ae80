use super::*;
use crate::testing::FakeSurface;

#[test]
fn alignment_deactivates_every_other_active_member_first() {
    let mut surface = FakeSurface::with_text("text");
    surface.active.insert(FormatKind::AlignLeft);
    surface.active.insert(FormatKind::Justify);
    let mut tracker = FormatTracker::new();
    let mut dispatcher = CommandDispatcher::new("Arial");

    assert!(dispatcher.apply(&mut surface, &mut tracker, FormatKind::AlignCenter, None));

    assert_eq!(
        surface.calls,
        vec![
            "deactivate justifyLeft",
            "deactivate justifyFull",
            "justifyCenter",
            "focus",
        ]
    );
    for kind in [FormatKind::AlignLeft, FormatKind::AlignRight, FormatKind::Justify] {
        assert!(!surface.is_active(kind));
    }
    assert!(surface.is_active(FormatKind::AlignCenter));
}

#[test]
fn reapplying_active_alignment_touches_no_other_member() {
    let mut surface = FakeSurface::with_text("text");
    surface.active.insert(FormatKind::AlignRight);
    let mut tracker = FormatTracker::new();
    let mut dispatcher = CommandDispatcher::new("Arial");

    dispatcher.apply(&mut surface, &mut tracker, FormatKind::AlignRight, None);

    assert!(!surface.calls.iter().any(|call| call.starts_with("deactivate")));
}

#[test]
fn non_alignment_kinds_skip_exclusivity() {
    let mut surface = FakeSurface::with_text("text");
    surface.active.insert(FormatKind::AlignLeft);
    let mut tracker = FormatTracker::new();
    let mut dispatcher = CommandDispatcher::new("Arial");

    dispatcher.apply(&mut surface, &mut tracker, FormatKind::Bold, None);

    assert_eq!(surface.calls, vec!["bold", "focus"]);
    assert!(surface.is_active(FormatKind::AlignLeft));
}

#[test]
fn apply_defers_the_format_refresh() {
    let mut surface = FakeSurface::with_text("text");
    let mut tracker = FormatTracker::new();
    let mut dispatcher = CommandDispatcher::new("Arial");

    dispatcher.apply(&mut surface, &mut tracker, FormatKind::Italic, None);
    assert!(!tracker.state().italic);
    assert!(tracker.has_pending_refresh());

    tracker.run_deferred(&surface);
    assert!(tracker.state().italic);
}

#[test]
fn font_on_range_wraps_and_strips_nested_fonts() {
    let mut surface = FakeSurface::with_text("hello");
    surface.selection = Some((1, 4));
    let mut tracker = FormatTracker::new();
    let mut dispatcher = CommandDispatcher::new("Arial");

    let annotation = dispatcher.apply_font(&mut surface, &mut tracker, "Georgia");

    assert_eq!(annotation, FontAnnotation::Wrapped(NodePath::new(vec![0])));
    assert_eq!(
        surface.calls,
        vec!["fontName Georgia", "wrap span", "clear [0] font-family", "focus"]
    );
    assert_eq!(surface.selection, Some((3, 3)));
    assert_eq!(dispatcher.selected_font(), "Georgia");
}

#[test]
fn font_falls_back_to_generic_command_when_wrapping_fails() {
    let mut surface = FakeSurface::with_text("hello");
    surface.selection = Some((0, 5));
    surface.wrap_fails = true;
    let mut tracker = FormatTracker::new();
    let mut dispatcher = CommandDispatcher::new("Arial");

    let annotation = dispatcher.apply_font(&mut surface, &mut tracker, "Impact");

    assert_eq!(annotation, FontAnnotation::CommandOnly);
    assert_eq!(surface.calls, vec!["fontName Impact", "focus"]);
    assert_eq!(dispatcher.selected_font(), "Impact");
    assert!(tracker.has_pending_refresh());
}

#[test]
fn collapsed_font_annotates_enclosing_element() {
    let mut surface = FakeSurface::with_text("hello");
    surface.enclosing = Some(NodePath::new(vec![2]));
    let mut tracker = FormatTracker::new();
    let mut dispatcher = CommandDispatcher::new("Arial");

    let annotation = dispatcher.apply_font(&mut surface, &mut tracker, "Verdana");

    assert_eq!(annotation, FontAnnotation::Element(NodePath::new(vec![2])));
    assert!(surface.calls.contains(&"style [2] font-family=Verdana".to_string()));
}

#[test]
fn collapsed_font_at_root_depends_on_content() {
    let mut tracker = FormatTracker::new();
    let mut dispatcher = CommandDispatcher::new("Arial");

    let mut empty = FakeSurface::with_text("  ");
    assert_eq!(
        dispatcher.apply_font(&mut empty, &mut tracker, "Garamond"),
        FontAnnotation::RootDefault
    );
    assert!(empty.calls.contains(&"root font-family=Garamond".to_string()));

    let mut filled = FakeSurface::with_text("words");
    assert_eq!(
        dispatcher.apply_font(&mut filled, &mut tracker, "Garamond"),
        FontAnnotation::RootWrapped
    );
    assert!(filled.calls.contains(&"wrap-root div".to_string()));
}

#[test]
fn font_without_selection_only_issues_command() {
    let mut surface = FakeSurface::with_text("hello");
    surface.selection = None;
    let mut tracker = FormatTracker::new();
    let mut dispatcher = CommandDispatcher::new("Arial");

    let annotation = dispatcher.apply_font(&mut surface, &mut tracker, "Georgia");
    assert_eq!(annotation, FontAnnotation::CommandOnly);
    assert_eq!(surface.calls, vec!["fontName Georgia", "focus"]);
}
