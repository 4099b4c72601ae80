use std::collections::{HashMap, HashSet};

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use unicode_width::UnicodeWidthChar;

use crate::dom::{Element, Node};
use crate::editor::collect_segments;
use crate::surface::NodePath;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CursorVisualPosition {
    pub line: usize,
    pub column: u16,
}

#[derive(Debug)]
pub struct RenderResult {
    pub lines: Vec<Line<'static>>,
    pub cursor: Option<CursorVisualPosition>,
    pub total_lines: usize,
    /// Where each requested caret stop landed.
    pub unit_positions: HashMap<usize, CursorVisualPosition>,
}

/// Lays the tree out as wrapped terminal lines. `markers` are caret stops
/// whose screen positions should be reported; `cursor` is drawn.
pub fn render_document(
    root: &Element,
    width: usize,
    markers: &[usize],
    cursor: Option<usize>,
) -> RenderResult {
    let mut renderer = Renderer::new(width.max(1), root, markers, cursor);
    let mut path = NodePath::root();
    renderer.render_container(root, &mut path, "", "", None, Style::default());
    renderer.finish()
}

struct Renderer {
    wrap_width: usize,
    unit_starts: HashMap<NodePath, usize>,
    markers: HashSet<usize>,
    cursor_unit: Option<usize>,
    marker_positions: HashMap<usize, CursorVisualPosition>,
    cursor: Option<CursorVisualPosition>,
    lines: Vec<Line<'static>>,
    current_line_index: usize,
}

impl Renderer {
    fn new(wrap_width: usize, root: &Element, markers: &[usize], cursor_unit: Option<usize>) -> Self {
        let unit_starts = collect_segments(root)
            .into_iter()
            .map(|segment| (segment.path, segment.start))
            .collect();
        Self {
            wrap_width,
            unit_starts,
            markers: markers.iter().copied().collect(),
            cursor_unit,
            marker_positions: HashMap::new(),
            cursor: None,
            lines: Vec::new(),
            current_line_index: 0,
        }
    }

    fn events_for(&self, start: usize, len: usize) -> Vec<TextEvent> {
        let mut events = Vec::new();
        for offset in 0..=len {
            let unit = start + offset;
            if self.markers.contains(&unit) {
                events.push(TextEvent {
                    offset,
                    kind: TextEventKind::Marker(unit),
                });
            }
            if self.cursor_unit == Some(unit) {
                events.push(TextEvent {
                    offset,
                    kind: TextEventKind::Cursor,
                });
            }
        }
        events
    }

    fn render_container(
        &mut self,
        element: &Element,
        path: &mut NodePath,
        first_prefix: &str,
        continuation_prefix: &str,
        inherited_align: Option<&str>,
        base: Style,
    ) {
        let align = element.style("text-align").or(inherited_align);
        let lines_before = self.lines.len();
        let mut fragments = Vec::new();
        let mut prefix = first_prefix.to_string();

        for (idx, child) in element.children.iter().enumerate() {
            path.push(idx);
            match child {
                Node::Element(inner) if inner.is_block_level() => {
                    if !fragments.is_empty() {
                        self.flush(&mut fragments, &prefix, continuation_prefix, align);
                        prefix = continuation_prefix.to_string();
                    }
                    self.render_block(inner, path, &prefix, continuation_prefix, align, base);
                    if self.lines.len() > lines_before {
                        prefix = continuation_prefix.to_string();
                    }
                }
                _ => self.collect_inline(child, path, base, &mut fragments),
            }
            path.pop();
        }

        if !fragments.is_empty() {
            self.flush(&mut fragments, &prefix, continuation_prefix, align);
        } else if self.lines.len() == lines_before && (element.is_block() || path.is_root()) {
            let unit = self
                .unit_starts
                .get(path)
                .copied()
                .or_else(|| path.is_root().then_some(0));
            let events = unit.map(|unit| self.events_for(unit, 0)).unwrap_or_default();
            fragments.push(FragmentItem::Token(Fragment {
                text: String::new(),
                style: base,
                kind: FragmentKind::Word,
                width: 0,
                events,
            }));
            self.flush(&mut fragments, &prefix, continuation_prefix, align);
        }
    }

    fn render_block(
        &mut self,
        block: &Element,
        path: &mut NodePath,
        first_prefix: &str,
        continuation_prefix: &str,
        align: Option<&str>,
        base: Style,
    ) {
        match block.tag.as_str() {
            "ul" | "ol" => self.render_list(block, path, continuation_prefix, align, base),
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => self.render_container(
                block,
                path,
                first_prefix,
                continuation_prefix,
                align,
                base.add_modifier(Modifier::BOLD),
            ),
            "blockquote" => {
                let quote_first = format!("{first_prefix}| ");
                let quote_rest = format!("{continuation_prefix}| ");
                self.render_container(block, path, &quote_first, &quote_rest, align, base);
            }
            _ => self.render_container(block, path, first_prefix, continuation_prefix, align, base),
        }
    }

    fn render_list(
        &mut self,
        list: &Element,
        path: &mut NodePath,
        prefix: &str,
        align: Option<&str>,
        base: Style,
    ) {
        let align = list.style("text-align").or(align);
        let mut number = 0;
        for (idx, child) in list.children.iter().enumerate() {
            path.push(idx);
            match child {
                Node::Element(item) if item.tag == "li" => {
                    number += 1;
                    let marker = if list.tag == "ol" {
                        format!("{number}. ")
                    } else {
                        "• ".to_string()
                    };
                    let first_prefix = format!("{prefix}{marker}");
                    let continuation_prefix =
                        format!("{prefix}{}", " ".repeat(marker.chars().count()));
                    self.render_container(item, path, &first_prefix, &continuation_prefix, align, base);
                }
                Node::Element(inner) if inner.is_block_level() => {
                    self.render_block(inner, path, prefix, prefix, align, base);
                }
                _ => {
                    let mut fragments = Vec::new();
                    self.collect_inline(child, path, base, &mut fragments);
                    self.flush(&mut fragments, prefix, prefix, align);
                }
            }
            path.pop();
        }
    }

    fn collect_inline(
        &self,
        node: &Node,
        path: &mut NodePath,
        style: Style,
        fragments: &mut Vec<FragmentItem>,
    ) {
        match node {
            Node::Text(text) => {
                let events = self
                    .unit_starts
                    .get(path)
                    .map(|start| self.events_for(*start, text.chars().count()))
                    .unwrap_or_default();
                tokenize_text(text, style, events, fragments);
            }
            Node::Element(element) if element.is_mention() => {
                let label = element.text_content();
                let width = visible_width(&label);
                let mut events = self
                    .unit_starts
                    .get(path)
                    .map(|start| self.events_for(*start, 1))
                    .unwrap_or_default();
                for event in &mut events {
                    event.offset *= width;
                }
                fragments.push(FragmentItem::Token(Fragment {
                    text: label,
                    style: mention_style(style),
                    kind: FragmentKind::Word,
                    width,
                    events,
                }));
            }
            Node::Element(element) if element.tag == "br" => fragments.push(FragmentItem::LineBreak),
            Node::Element(element) => {
                let style = merge_style(style, element);
                for (idx, child) in element.children.iter().enumerate() {
                    path.push(idx);
                    self.collect_inline(child, path, style, fragments);
                    path.pop();
                }
            }
        }
    }

    fn flush(
        &mut self,
        fragments: &mut Vec<FragmentItem>,
        first_prefix: &str,
        continuation_prefix: &str,
        align: Option<&str>,
    ) {
        let mut lines = wrap_fragments(fragments, first_prefix, continuation_prefix, self.wrap_width);
        fragments.clear();
        if let Some(align) = align {
            align_lines(&mut lines, align, self.wrap_width);
        }
        self.consume_lines(lines);
    }

    fn consume_lines(&mut self, outputs: Vec<LineOutput>) {
        for output in outputs {
            let mut spans: Vec<Span<'static>> = Vec::with_capacity(output.spans.len());
            for segment in output.spans {
                spans.push(Span::styled(segment.text, segment.style));
            }
            let line = Line::from(spans);
            for event in output.events {
                let position = CursorVisualPosition {
                    line: self.current_line_index,
                    column: event.column,
                };
                match event.kind {
                    TextEventKind::Cursor => {
                        self.cursor = Some(position);
                    }
                    TextEventKind::Marker(unit) => {
                        self.marker_positions.insert(unit, position);
                    }
                }
            }
            self.lines.push(line);
            self.current_line_index += 1;
        }
    }

    fn finish(mut self) -> RenderResult {
        if self.lines.is_empty() {
            self.lines.push(Line::from(""));
        }
        let total_lines = self.lines.len();
        RenderResult {
            lines: self.lines,
            cursor: self.cursor,
            total_lines,
            unit_positions: self.marker_positions,
        }
    }
}

fn mention_style(base: Style) -> Style {
    base.fg(Color::Cyan).add_modifier(Modifier::BOLD)
}

fn merge_style(base: Style, element: &Element) -> Style {
    let mut style = base;
    if element.marks_bold() {
        style = style.add_modifier(Modifier::BOLD);
    }
    if element.marks_italic() {
        style = style.add_modifier(Modifier::ITALIC);
    }
    if element.marks_underline() {
        style = style.add_modifier(Modifier::UNDERLINED);
    }
    match element.tag.as_str() {
        "s" | "strike" | "del" => style.add_modifier(Modifier::CROSSED_OUT),
        "code" => style.add_modifier(Modifier::DIM),
        "mark" => style.add_modifier(Modifier::REVERSED),
        "a" => style.add_modifier(Modifier::UNDERLINED).fg(Color::Blue),
        _ => style,
    }
}

fn align_lines(lines: &mut [LineOutput], align: &str, width: usize) {
    for line in lines {
        let used: usize = line.spans.iter().map(|span| visible_width(&span.text)).sum();
        let free = width.saturating_sub(used);
        let pad = match align {
            "center" => free / 2,
            "right" => free,
            _ => 0,
        };
        if pad == 0 {
            continue;
        }
        line.spans.insert(
            0,
            LineSegment {
                text: " ".repeat(pad),
                style: Style::default(),
            },
        );
        for event in &mut line.events {
            event.column = event.column.saturating_add(pad as u16);
        }
    }
}

#[derive(Clone)]
struct LineSegment {
    text: String,
    style: Style,
}

#[derive(Clone)]
struct LineOutput {
    spans: Vec<LineSegment>,
    events: Vec<LocatedEvent>,
}

#[derive(Clone, Copy)]
struct LocatedEvent {
    column: u16,
    kind: TextEventKind,
}

#[derive(Clone)]
struct Fragment {
    text: String,
    style: Style,
    kind: FragmentKind,
    width: usize,
    events: Vec<TextEvent>,
}

#[derive(Clone, Copy)]
enum FragmentKind {
    Word,
    Whitespace,
}

#[derive(Clone)]
enum FragmentItem {
    Token(Fragment),
    LineBreak,
}

#[derive(Clone, Copy)]
struct TextEvent {
    offset: usize,
    kind: TextEventKind,
}

#[derive(Clone, Copy)]
enum TextEventKind {
    Marker(usize),
    Cursor,
}

/// Splits `text` into word and whitespace tokens. Event offsets are
/// character offsets into `text` on the way in.
fn tokenize_text(
    text: &str,
    style: Style,
    events: Vec<TextEvent>,
    fragments: &mut Vec<FragmentItem>,
) {
    let mut builder: Option<TokenBuilder> = None;
    let mut pending_events: Vec<TextEvent> = Vec::new();
    let mut upcoming = events.into_iter().peekable();
    let mut buffer: Vec<char> = Vec::new();

    for (char_idx, ch) in text.chars().enumerate() {
        while let Some(event) = upcoming.next_if(|event| event.offset <= char_idx) {
            pending_events.push(event);
        }
        if ch == '\r' {
            continue;
        }
        if ch == '\n' {
            if let Some(mut token) = builder.take() {
                token.add_events(&mut pending_events);
                fragments.push(FragmentItem::Token(token.finish()));
            } else if !pending_events.is_empty() {
                fragments.push(FragmentItem::Token(Fragment {
                    text: String::new(),
                    style,
                    kind: FragmentKind::Word,
                    width: 0,
                    events: pending_events.drain(..).collect(),
                }));
            }
            fragments.push(FragmentItem::LineBreak);
            continue;
        }

        buffer.clear();
        if ch == '\t' {
            buffer.extend_from_slice(&[' '; 4]);
        } else {
            buffer.push(ch);
        }

        for actual in &buffer {
            let is_whitespace = actual.is_whitespace();
            if builder
                .as_ref()
                .map(|existing| existing.kind_matches(is_whitespace))
                .unwrap_or(false)
            {
                if let Some(current) = builder.as_mut() {
                    current.add_events(&mut pending_events);
                    current.push_char(*actual);
                }
            } else {
                if let Some(mut existing) = builder.take() {
                    // Events at this character open the new token.
                    let (mut finishing, opening): (Vec<_>, Vec<_>) = pending_events
                        .drain(..)
                        .partition(|event| event.offset < char_idx);
                    existing.add_events(&mut finishing);
                    fragments.push(FragmentItem::Token(existing.finish()));
                    pending_events = opening;
                }
                let mut new_builder = TokenBuilder::new(style, is_whitespace);
                new_builder.add_events(&mut pending_events);
                new_builder.push_char(*actual);
                builder = Some(new_builder);
            }
        }
    }
    pending_events.extend(upcoming);

    if let Some(mut token) = builder {
        token.add_events(&mut pending_events);
        fragments.push(FragmentItem::Token(token.finish()));
    } else if !pending_events.is_empty() {
        fragments.push(FragmentItem::Token(Fragment {
            text: String::new(),
            style,
            kind: FragmentKind::Word,
            width: 0,
            events: pending_events,
        }));
    }
}

struct TokenBuilder {
    text: String,
    style: Style,
    kind: FragmentKind,
    width: usize,
    events: Vec<TextEvent>,
}

impl TokenBuilder {
    fn new(style: Style, is_whitespace: bool) -> Self {
        Self {
            text: String::new(),
            style,
            kind: if is_whitespace {
                FragmentKind::Whitespace
            } else {
                FragmentKind::Word
            },
            width: 0,
            events: Vec::new(),
        }
    }

    fn kind_matches(&self, is_whitespace: bool) -> bool {
        matches!(
            (self.kind, is_whitespace),
            (FragmentKind::Whitespace, true) | (FragmentKind::Word, false)
        )
    }

    fn add_events(&mut self, pending: &mut Vec<TextEvent>) {
        for mut event in pending.drain(..) {
            event.offset = self.width;
            self.events.push(event);
        }
    }

    fn push_char(&mut self, ch: char) {
        self.text.push(ch);
        self.width += UnicodeWidthChar::width(ch).unwrap_or(0);
    }

    fn finish(self) -> Fragment {
        Fragment {
            text: self.text,
            style: self.style,
            kind: self.kind,
            width: self.width,
            events: self.events,
        }
    }
}

fn wrap_fragments(
    fragments: &[FragmentItem],
    first_prefix: &str,
    continuation_prefix: &str,
    width: usize,
) -> Vec<LineOutput> {
    let mut outputs = Vec::new();
    let mut builder = LineBuilder::new(first_prefix);
    let mut pending_whitespace: Vec<Fragment> = Vec::new();

    for fragment in fragments {
        match fragment {
            FragmentItem::LineBreak => {
                builder.consume_pending(&mut pending_whitespace);
                outputs.push(builder.build_line());
                builder = LineBuilder::new(continuation_prefix);
            }
            FragmentItem::Token(token) => match token.kind {
                FragmentKind::Whitespace => {
                    pending_whitespace.push(token.clone());
                }
                FragmentKind::Word => {
                    let whitespace_width: usize =
                        pending_whitespace.iter().map(|item| item.width).sum();
                    if builder.current_width() > builder.prefix_width
                        && builder.current_width() + whitespace_width + token.width > width
                    {
                        builder.consume_pending(&mut pending_whitespace);
                        outputs.push(builder.build_line());
                        builder = LineBuilder::new(continuation_prefix);
                    }

                    builder.append_with_pending(token.clone(), &mut pending_whitespace);
                }
            },
        }
    }

    builder.consume_pending(&mut pending_whitespace);
    outputs.push(builder.build_line());
    outputs
}

struct LineBuilder {
    segments: Vec<LineSegment>,
    events: Vec<LocatedEvent>,
    width: usize,
    prefix_width: usize,
}

impl LineBuilder {
    fn new(prefix: &str) -> Self {
        let prefix_width = visible_width(prefix);
        let mut segments = Vec::new();
        if !prefix.is_empty() {
            segments.push(LineSegment {
                text: prefix.to_string(),
                style: Style::default(),
            });
        }
        Self {
            segments,
            events: Vec::new(),
            width: prefix_width,
            prefix_width,
        }
    }

    fn current_width(&self) -> usize {
        self.width
    }

    fn append_with_pending(&mut self, token: Fragment, pending_whitespace: &mut Vec<Fragment>) {
        self.consume_pending(pending_whitespace);
        self.append_token(token);
    }

    fn consume_pending(&mut self, pending_whitespace: &mut Vec<Fragment>) {
        for fragment in pending_whitespace.drain(..) {
            self.append_token(fragment);
        }
    }

    fn append_token(&mut self, fragment: Fragment) {
        let base = self.width;
        if !fragment.text.is_empty() {
            self.segments.push(LineSegment {
                text: fragment.text,
                style: fragment.style,
            });
            self.width += fragment.width;
        }

        for event in fragment.events {
            self.events.push(LocatedEvent {
                column: (base + event.offset) as u16,
                kind: event.kind,
            });
        }
    }

    fn build_line(mut self) -> LineOutput {
        if self.segments.is_empty() {
            self.segments.push(LineSegment {
                text: String::new(),
                style: Style::default(),
            });
        }
        self.events.sort_by_key(|event| event.column);
        LineOutput {
            spans: self.segments,
            events: self.events,
        }
    }
}

fn visible_width(text: &str) -> usize {
    text.chars()
        .map(|ch| UnicodeWidthChar::width(ch).unwrap_or(0))
        .sum()
}
