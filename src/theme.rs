use ratatui::style::{Color, Modifier, Style};

/// Colors for the terminal host.
#[derive(Clone, Debug)]
pub struct Theme {
    /// Background color for the editor
    pub background: Color,

    /// Foreground (text) color for the status bar
    pub status_bar_fg: Color,

    /// Background color for the status bar
    pub status_bar_bg: Color,

    /// Color for the current file name in the status bar
    pub filename_color: Color,

    /// Foreground color for active selection
    pub selection_fg: Color,

    /// Background color for active selection
    pub selection_bg: Color,

    /// Toolbar buttons whose format is active at the selection
    pub toolbar_active_fg: Color,
    pub toolbar_active_bg: Color,

    pub toolbar_fg: Color,
    pub toolbar_bg: Color,

    /// Foreground color for picker rows
    pub picker_fg: Color,

    /// Background color for the picker
    pub picker_bg: Color,

    /// Secondary text (username, description) in picker rows
    pub picker_secondary_fg: Color,

    pub picker_selected_fg: Color,
    pub picker_selected_bg: Color,

    /// Category tab that is not active
    pub picker_tab_fg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color::Reset,
            status_bar_fg: Color::White,
            status_bar_bg: Color::Blue,
            filename_color: Color::LightYellow,
            selection_fg: Color::White,
            selection_bg: Color::LightBlue,
            toolbar_active_fg: Color::Black,
            toolbar_active_bg: Color::LightCyan,
            toolbar_fg: Color::Gray,
            toolbar_bg: Color::Reset,
            picker_fg: Color::White,
            picker_bg: Color::Black,
            picker_secondary_fg: Color::DarkGray,
            picker_selected_fg: Color::White,
            picker_selected_bg: Color::LightBlue,
            picker_tab_fg: Color::Gray,
        }
    }
}

impl Theme {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status_bar_style(&self) -> Style {
        Style::default()
            .fg(self.status_bar_fg)
            .bg(self.status_bar_bg)
    }

    pub fn filename_style(&self) -> Style {
        Style::default().fg(self.filename_color)
    }

    pub fn selection_style(&self) -> Style {
        Style::default().fg(self.selection_fg).bg(self.selection_bg)
    }

    pub fn toolbar_style(&self, active: bool) -> Style {
        if active {
            Style::default()
                .fg(self.toolbar_active_fg)
                .bg(self.toolbar_active_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.toolbar_fg).bg(self.toolbar_bg)
        }
    }

    pub fn picker_style(&self) -> Style {
        Style::default().fg(self.picker_fg).bg(self.picker_bg)
    }

    pub fn picker_secondary_style(&self) -> Style {
        Style::default()
            .fg(self.picker_secondary_fg)
            .bg(self.picker_bg)
    }

    pub fn picker_selected_style(&self) -> Style {
        Style::default()
            .fg(self.picker_selected_fg)
            .bg(self.picker_selected_bg)
    }

    pub fn picker_tab_style(&self, active: bool) -> Style {
        if active {
            self.picker_style().add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(self.picker_tab_fg).bg(self.picker_bg)
        }
    }
}
