use std::{
    cell::Cell,
    env,
    fs::{self, File},
    io,
    path::{Path, PathBuf},
    rc::Rc,
    sync::Mutex,
    time::{Duration, Instant},
};

use anyhow::{Context, Result, bail};
use crossterm::{
    event::{
        self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, Clear, List, ListItem, ListState, Paragraph, Scrollbar,
        ScrollbarOrientation, ScrollbarState,
    },
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use unicode_width::UnicodeWidthStr;

use mentionpad::{
    Category, Directory, DocumentSurface, FormatKind, MentionEditor, PickerView,
    config::EditorConfig,
    dom::Element,
    interchange,
    render::{RenderResult, render_document},
    surface::EditableSurface,
    theme::Theme,
};

const STATUS_TIMEOUT: Duration = Duration::from_secs(4);
const LOG_ENV: &str = "MENTIONPAD_LOG";
const PICKER_MAX_ROWS: usize = 8;

fn main() -> Result<()> {
    run()
}

struct Args {
    path: PathBuf,
    directory: Option<PathBuf>,
    config: Option<PathBuf>,
}

fn parse_args() -> Result<Option<Args>> {
    let mut args = env::args().skip(1);
    let mut path = None;
    let mut directory = None;
    let mut config = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--directory" => {
                let Some(value) = args.next() else {
                    bail!("--directory needs a file argument");
                };
                directory = Some(PathBuf::from(value));
            }
            "--config" => {
                let Some(value) = args.next() else {
                    bail!("--config needs a file argument");
                };
                config = Some(PathBuf::from(value));
            }
            _ if path.is_none() => path = Some(PathBuf::from(&arg)),
            other => bail!("unexpected argument {other}"),
        }
    }
    Ok(path.map(|path| Args {
        path,
        directory,
        config,
    }))
}

/// Logs go to the file named by `MENTIONPAD_LOG`; the terminal is in raw
/// mode, so nothing is written to stdout.
fn init_logging() -> Result<()> {
    let Some(path) = env::var_os(LOG_ENV) else {
        return Ok(());
    };
    let file = File::create(&path)
        .with_context(|| format!("failed to create log file {}", Path::new(&path).display()))?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mentionpad=debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn run() -> Result<()> {
    let Some(args) = parse_args()? else {
        eprintln!(
            "Usage: cargo run -- <file.ftml> [--directory <people.json>] [--config <editor.json>]"
        );
        return Ok(());
    };
    init_logging()?;

    let directory = match &args.directory {
        Some(path) => Directory::load(path)
            .with_context(|| format!("failed to load directory {}", path.display()))?,
        None => Directory::sample(),
    };
    let config = match &args.config {
        Some(path) => EditorConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        // Terminal rows, not pixels: the picker sits right below the line.
        None => EditorConfig {
            picker_offset: 0.0,
            ..EditorConfig::default()
        },
    };

    let (root, initial_status) = load_document(&args.path)?;
    let mut app = App::new(root, args.path, directory, config, initial_status);

    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)
        .context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    terminal.clear().ok();

    let res = run_app(&mut terminal, &mut app).context("application error");

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), DisableBracketedPaste, LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();

    res
}

fn load_document(path: &Path) -> Result<(Element, Option<String>)> {
    if path.exists() {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        match interchange::import_ftml_str(&content) {
            Ok(root) => Ok((root, None)),
            Err(err) => {
                let message = format!("Parse error: {err}. Starting with empty document.");
                Ok((Element::new("div"), Some(message)))
            }
        }
    } else {
        Ok((Element::new("div"), Some("New document".to_string())))
    }
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    while !app.should_quit() {
        terminal
            .draw(|frame| app.draw(frame))
            .context("failed to draw frame")?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout).context("event poll failed")? {
            let evt = event::read().context("failed to read event")?;
            app.handle_event(evt)?;
        }

        if last_tick.elapsed() >= tick_rate {
            app.on_tick();
            last_tick = Instant::now();
        }
    }

    Ok(())
}

#[derive(Clone, Copy)]
enum MenuAction {
    Format(FormatKind),
    /// Index into the configured font list.
    Font(usize),
}

#[derive(Clone)]
struct MenuItem {
    label: String,
    action: MenuAction,
    shortcut: Option<char>,
}

enum MenuEntry {
    Section(&'static str),
    Separator,
    Item(MenuItem),
}

struct FormatMenuState {
    entries: Vec<MenuEntry>,
    selected_index: usize,
}

impl FormatMenuState {
    fn new(fonts: &[String]) -> Self {
        let entries = build_format_menu_entries(fonts);
        let selected_index = entries
            .iter()
            .position(|entry| matches!(entry, MenuEntry::Item(_)))
            .unwrap_or(0);
        Self {
            entries,
            selected_index,
        }
    }

    fn move_selection(&mut self, delta: i32) {
        if self.entries.is_empty() {
            return;
        }

        let len = self.entries.len() as i32;
        let mut idx = self.selected_index as i32;

        for _ in 0..len {
            idx = (idx + delta).rem_euclid(len);
            if matches!(self.entries[idx as usize], MenuEntry::Item(_)) {
                self.selected_index = idx as usize;
                break;
            }
        }
    }

    fn current_action(&self) -> Option<MenuAction> {
        match self.entries.get(self.selected_index) {
            Some(MenuEntry::Item(item)) => Some(item.action),
            _ => None,
        }
    }

    fn shortcut_action(&mut self, ch: char) -> Option<MenuAction> {
        for (idx, entry) in self.entries.iter().enumerate() {
            if let MenuEntry::Item(item) = entry {
                if item.shortcut == Some(ch) {
                    self.selected_index = idx;
                    return Some(item.action);
                }
            }
        }
        None
    }
}

fn build_format_menu_entries(fonts: &[String]) -> Vec<MenuEntry> {
    let format_item = |kind: FormatKind, label: &str, shortcut: char| {
        MenuEntry::Item(MenuItem {
            label: label.to_string(),
            action: MenuAction::Format(kind),
            shortcut: Some(shortcut),
        })
    };
    let mut entries = vec![
        MenuEntry::Section("Inline style"),
        format_item(FormatKind::Bold, "Bold", 'b'),
        format_item(FormatKind::Italic, "Italic", 'i'),
        format_item(FormatKind::Underline, "Underline", 'u'),
        MenuEntry::Separator,
        MenuEntry::Section("Alignment"),
        format_item(FormatKind::AlignLeft, "Align Left", 'l'),
        format_item(FormatKind::AlignCenter, "Center", 'c'),
        format_item(FormatKind::AlignRight, "Align Right", 'r'),
        format_item(FormatKind::Justify, "Justify", 'j'),
        MenuEntry::Separator,
        MenuEntry::Section("Lists"),
        format_item(FormatKind::NumberList, "Numbered List", '7'),
        format_item(FormatKind::BulletList, "Bullet List", '8'),
        MenuEntry::Separator,
        MenuEntry::Section("Font"),
    ];
    entries.extend(fonts.iter().enumerate().map(|(idx, font)| {
        MenuEntry::Item(MenuItem {
            label: font.clone(),
            action: MenuAction::Font(idx),
            shortcut: None,
        })
    }));
    entries
}

fn is_format_menu_shortcut(code: KeyCode, modifiers: KeyModifiers) -> bool {
    match code {
        KeyCode::Char(' ') | KeyCode::Char('p') => modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

struct App {
    editor: MentionEditor,
    theme: Theme,
    file_path: PathBuf,
    last_view_height: usize,
    should_quit: bool,
    dirty: Rc<Cell<bool>>,
    status_message: Option<(String, Instant)>,
    format_menu: Option<FormatMenuState>,
}

impl App {
    fn new(
        root: Element,
        path: PathBuf,
        directory: Directory,
        config: EditorConfig,
        initial_status: Option<String>,
    ) -> Self {
        let mut editor = MentionEditor::new(DocumentSurface::new(root), directory, config);
        editor.focus();

        let dirty = Rc::new(Cell::new(false));
        let flag = Rc::clone(&dirty);
        editor.on_content_change(move |_| flag.set(true));

        Self {
            editor,
            theme: Theme::new(),
            file_path: path,
            last_view_height: 1,
            should_quit: false,
            dirty,
            status_message: initial_status.map(|msg| (msg, Instant::now())),
            format_menu: None,
        }
    }

    fn should_quit(&self) -> bool {
        self.should_quit
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        if area.height < 3 || area.width == 0 {
            return;
        }

        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(1),
                Constraint::Length(2),
            ])
            .split(area);

        let toolbar_area = vertical[0];
        let editor_area = vertical[1];
        let status_area = vertical[2];

        let horizontal = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(editor_area);
        let text_area = horizontal[0];
        let scrollbar_area = horizontal[1];

        let viewport_height = text_area.height as usize;
        self.last_view_height = viewport_height.max(1);
        let surface = self.editor.surface_mut();
        surface.set_wrap_width(text_area.width.max(1) as usize);
        surface.ensure_cursor_visible(viewport_height);
        let scroll_top = surface.scroll_top();

        let render = self.render_document();

        frame.render_widget(Paragraph::new(self.toolbar_line()), toolbar_area);

        let paragraph = Paragraph::new(Text::from(render.lines.clone()))
            .style(Style::default().bg(self.theme.background))
            .block(Block::default().borders(Borders::NONE))
            .scroll((scroll_top as u16, 0));
        frame.render_widget(paragraph, text_area);

        let mut scrollbar_state = ScrollbarState::new(render.total_lines).position(scroll_top);
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight);
        frame.render_stateful_widget(scrollbar, scrollbar_area, &mut scrollbar_state);

        if let Some(cursor) = render.cursor {
            if cursor.line >= scroll_top
                && cursor.line < scroll_top + viewport_height
                && text_area.width > 0
            {
                let cursor_y = text_area.y + (cursor.line - scroll_top) as u16;
                let cursor_x = text_area.x + cursor.column.min(text_area.width - 1);
                frame.set_cursor_position(Position::new(cursor_x, cursor_y));
            }
        }

        let status_widget = Paragraph::new(self.status_line(&render))
            .style(self.theme.status_bar_style())
            .block(Block::default().borders(Borders::TOP));
        frame.render_widget(status_widget, status_area);

        if let Some(picker) = self.editor.picker() {
            self.render_picker(frame, text_area, scroll_top, &picker);
        }

        if self.format_menu.is_some() {
            self.render_format_menu(frame, area);
        }
    }

    fn render_document(&self) -> RenderResult {
        let surface = self.editor.surface();
        let cursor = if surface.has_focus() {
            surface.cursor_unit()
        } else {
            None
        };
        render_document(surface.root(), surface.wrap_width(), &[], cursor)
    }

    fn toolbar_line(&self) -> Line<'static> {
        let state = self.editor.format_state();
        let mut spans = Vec::new();
        for kind in FormatKind::ALL {
            spans.push(Span::styled(
                format!(" {} ", kind.label()),
                self.theme.toolbar_style(state.get(kind)),
            ));
            spans.push(Span::raw(" "));
        }
        spans.push(Span::styled(
            format!("Font: {}", self.editor.selected_font()),
            self.theme.toolbar_style(false),
        ));
        Line::from(spans)
    }

    fn render_picker(&self, frame: &mut Frame, area: Rect, scroll_top: usize, picker: &PickerView) {
        if area.width < 10 || area.height < 4 {
            return;
        }

        let rows = picker.candidates.len().clamp(1, PICKER_MAX_ROWS);
        let height = (rows as u16 + 3).min(area.height);
        let content_width = picker
            .candidates
            .iter()
            .map(|entry| entry.display_name.width() + entry.secondary_text.width() + 2)
            .max()
            .unwrap_or(0)
            .max(20);
        let width = (content_width as u16 + 2).min(area.width);

        // Anchor coordinates are document lines/columns; flip above the line
        // when there is no room below.
        let anchor_line = (picker.anchor.top.max(0.0) as usize).saturating_sub(scroll_top);
        let mut y = area.y + (anchor_line as u16).min(area.height);
        if y + height > area.y + area.height {
            y = (y.saturating_sub(height + 1)).max(area.y);
        }
        let mut x = area.x + (picker.anchor.left.max(0.0) as u16).min(area.width);
        if x + width > area.x + area.width {
            x = (area.x + area.width).saturating_sub(width);
        }
        let popup_area = Rect::new(x, y, width, height);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .title("Mention (Ctrl-T switch)")
            .style(self.theme.picker_style())
            .border_style(Style::default().fg(Color::Gray));
        let inner = block.inner(popup_area);
        frame.render_widget(block, popup_area);
        if inner.height == 0 {
            return;
        }

        let tabs: Vec<Span> = Category::ALL
            .iter()
            .flat_map(|category| {
                [
                    Span::styled(
                        category.title(),
                        self.theme
                            .picker_tab_style(*category == picker.active_category),
                    ),
                    Span::styled("  ", self.theme.picker_style()),
                ]
            })
            .collect();
        frame.render_widget(
            Paragraph::new(Line::from(tabs)),
            Rect::new(inner.x, inner.y, inner.width, 1),
        );

        let list_area = Rect::new(
            inner.x,
            inner.y + 1,
            inner.width,
            inner.height.saturating_sub(1),
        );
        if picker.candidates.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled("No matches", self.theme.picker_secondary_style())),
                list_area,
            );
            return;
        }

        let items: Vec<ListItem> = picker
            .candidates
            .iter()
            .map(|entry| {
                ListItem::new(Line::from(vec![
                    Span::styled(entry.display_name.clone(), self.theme.picker_style()),
                    Span::styled("  ", self.theme.picker_style()),
                    Span::styled(
                        entry.secondary_text.clone(),
                        self.theme.picker_secondary_style(),
                    ),
                ]))
            })
            .collect();

        let mut state = ListState::default();
        state.select(Some(picker.selected_index));
        let list = List::new(items)
            .style(self.theme.picker_style())
            .highlight_style(self.theme.picker_selected_style());
        frame.render_stateful_widget(list, list_area, &mut state);
    }

    fn render_format_menu(&self, frame: &mut Frame, area: Rect) {
        let Some(menu) = &self.format_menu else {
            return;
        };

        if area.width < 3 || area.height < 3 {
            return;
        }

        let mut max_label_width = 0usize;
        let mut max_section_width = 0usize;
        for entry in &menu.entries {
            match entry {
                MenuEntry::Item(item) => {
                    max_label_width = max_label_width.max(item.label.width());
                }
                MenuEntry::Section(title) => {
                    max_section_width = max_section_width.max(title.width());
                }
                MenuEntry::Separator => {}
            }
        }

        let content_width = (max_label_width + 3).max(max_section_width) as u16;
        let min_width = 10.min(area.width);
        let width = (content_width + 4).min(area.width).max(min_width);
        let desired_height = (menu.entries.len() as u16 + 2).min(area.height);
        let height = desired_height.max(3.min(area.height));

        let popup_area = Rect::new(
            area.x + (area.width.saturating_sub(width)) / 2,
            area.y + (area.height.saturating_sub(height)) / 2,
            width,
            height,
        );

        frame.render_widget(Clear, popup_area);

        let separator_width = popup_area.width.saturating_sub(4).max(4) as usize;
        let popup_style = Style::default().bg(Color::Black).fg(Color::White);
        let state = self.editor.format_state();
        let selected_font = self.editor.selected_font();
        let fonts = &self.editor.config().fonts;

        let mut items = Vec::new();
        for entry in &menu.entries {
            match entry {
                MenuEntry::Section(title) => {
                    items.push(ListItem::new(Line::from(Span::styled(
                        *title,
                        popup_style.add_modifier(Modifier::BOLD),
                    ))));
                }
                MenuEntry::Separator => {
                    let line = "─".repeat(separator_width);
                    items.push(ListItem::new(Line::from(Span::styled(
                        line,
                        Style::default().fg(Color::DarkGray),
                    ))));
                }
                MenuEntry::Item(item) => {
                    let active = match item.action {
                        MenuAction::Format(kind) => state.get(kind),
                        MenuAction::Font(idx) => {
                            fonts.get(idx).is_some_and(|font| font == selected_font)
                        }
                    };
                    let marker = if active { "✓" } else { " " };
                    let shortcut = item.shortcut.unwrap_or(' ');
                    let content = format!(
                        "{marker} {label:<label_width$} {shortcut}",
                        label = item.label,
                        label_width = max_label_width,
                    );
                    items.push(ListItem::new(Line::from(content)));
                }
            }
        }

        let mut list_state = ListState::default();
        list_state.select(Some(menu.selected_index));

        let list = List::new(items)
            .highlight_style(Style::default().bg(Color::White).fg(Color::Black))
            .style(popup_style)
            .block(
                Block::default()
                    .title("Format")
                    .borders(Borders::ALL)
                    .style(popup_style)
                    .border_style(Style::default().fg(Color::Gray)),
            );

        frame.render_stateful_widget(list, popup_area, &mut list_state);
    }

    fn handle_format_menu_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        let Some(menu) = self.format_menu.as_mut() else {
            return false;
        };

        match code {
            KeyCode::Esc => {
                self.format_menu = None;
            }
            KeyCode::Up => menu.move_selection(-1),
            KeyCode::Down => menu.move_selection(1),
            KeyCode::Enter => {
                if let Some(action) = menu.current_action() {
                    self.execute_menu_action(action);
                }
                self.format_menu = None;
            }
            _ if is_format_menu_shortcut(code, modifiers) => {
                self.format_menu = None;
            }
            KeyCode::Char(ch) if modifiers.is_empty() => {
                if let Some(action) = menu.shortcut_action(ch) {
                    self.execute_menu_action(action);
                    self.format_menu = None;
                }
            }
            _ => {}
        }
        true
    }

    fn execute_menu_action(&mut self, action: MenuAction) {
        match action {
            MenuAction::Format(kind) => {
                self.editor.apply_format(kind);
            }
            MenuAction::Font(idx) => {
                let Some(font) = self.editor.config().fonts.get(idx).cloned() else {
                    return;
                };
                let annotation = self.editor.select_font(&font);
                debug!(?annotation, font = %font, "font applied from menu");
            }
        }
    }

    fn status_line(&mut self, render: &RenderResult) -> Line<'static> {
        self.prune_status_message();
        let position = match render.cursor {
            Some(cursor) => format!("[{},{}]", cursor.line + 1, cursor.column + 1),
            None => "[?,?]".to_string(),
        };
        let mut spans = vec![Span::raw(format!("{position} | "))];

        let surface = self.editor.surface();
        if let Some((start, end)) = surface.selection_units() {
            if start != end {
                spans.push(Span::styled(
                    format!("sel {start}-{end}"),
                    self.theme.selection_style(),
                ));
                spans.push(Span::raw(" | "));
            }
        }

        if let Some((message, _)) = &self.status_message {
            spans.push(Span::raw(message.clone()));
            return Line::from(spans);
        }

        let marker = if self.dirty.get() { "*" } else { "" };
        spans.push(Span::styled(
            format!("{}{}", self.file_path.display(), marker),
            self.theme.filename_style(),
        ));
        spans.push(Span::raw(format!(
            " | Lines: {} | Ctrl-P format | Ctrl-S save | Ctrl-Q quit",
            render.total_lines
        )));
        Line::from(spans)
    }

    fn prune_status_message(&mut self) {
        if let Some((_, instant)) = &self.status_message {
            if instant.elapsed() > STATUS_TIMEOUT {
                self.status_message = None;
            }
        }
    }

    fn move_by_page(&mut self, down: bool) {
        let surface = self.editor.surface_mut();
        for _ in 0..self.last_view_height {
            let moved = if down {
                surface.move_down()
            } else {
                surface.move_up()
            };
            if !moved {
                break;
            }
        }
        self.editor.handle_selection_change();
    }

    fn handle_event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Key(KeyEvent {
                code,
                modifiers,
                kind: KeyEventKind::Press,
                ..
            }) => self.handle_key(code, modifiers)?,
            Event::Paste(text) => {
                if self.format_menu.is_none() {
                    self.editor.paste(&text);
                }
            }
            Event::FocusGained => self.editor.focus(),
            Event::FocusLost => self.editor.blur(),
            _ => {}
        }
        self.editor.run_deferred();
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> Result<()> {
        if self.handle_format_menu_key(code, modifiers) {
            return Ok(());
        }

        if is_format_menu_shortcut(code, modifiers) {
            self.format_menu = Some(FormatMenuState::new(&self.editor.config().fonts));
            return Ok(());
        }

        let control = modifiers.contains(KeyModifiers::CONTROL);
        match code {
            KeyCode::Char('q') | KeyCode::Char('c') if control => {
                self.should_quit = true;
            }
            KeyCode::Char('s') if control => {
                self.save()?;
            }
            KeyCode::Char('t') if control => {
                if let Some(picker) = self.editor.picker() {
                    self.editor.set_category(picker.active_category.other());
                }
            }
            KeyCode::PageUp => self.move_by_page(false),
            KeyCode::PageDown => self.move_by_page(true),
            _ => {
                self.editor.handle_edit_key(code, modifiers);
            }
        }
        Ok(())
    }

    fn on_tick(&mut self) {
        self.prune_status_message();
    }

    fn save(&mut self) -> Result<()> {
        let contents = interchange::export_ftml(self.editor.surface().root())
            .context("failed to render FTML")?;
        fs::write(&self.file_path, contents)
            .with_context(|| format!("failed to write {}", self.file_path.display()))?;

        info!(path = %self.file_path.display(), "document saved");
        self.dirty.set(false);
        self.status_message = Some(("Saved".to_string(), Instant::now()));
        Ok(())
    }
}
