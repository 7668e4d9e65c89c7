//! Footer widget with keybindings

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::Widget,
};

use crate::core::state::{AppMode, AppState, DashboardTab, Screen};
use crate::ui::theme::Theme;

pub struct Footer<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> Footer<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    fn bindings(&self) -> Vec<(&'static str, &'static str)> {
        if self.state.mode == AppMode::Help {
            return vec![("Esc", "Close"), ("?", "Close")];
        }

        let tab = self.state.dashboard.as_ref().map(|d| d.tab);
        match (self.state.screen, tab) {
            (Screen::Dashboard, Some(DashboardTab::Command)) => vec![
                ("Enter", "Send"),
                ("Ctrl-R", "Refresh output"),
                ("Tab", "Next tab"),
                ("Esc", "Back"),
            ],
            (Screen::Dashboard, Some(DashboardTab::Processes)) => vec![
                ("↑/↓", "Scroll"),
                ("Tab", "Next tab"),
                ("r", "Poll now"),
                ("Esc", "Back"),
                ("?", "Help"),
                ("q", "Quit"),
            ],
            (Screen::Dashboard, _) => vec![
                ("Tab", "Next tab"),
                ("r", "Poll now"),
                ("t", "Theme"),
                ("Esc", "Back"),
                ("?", "Help"),
                ("q", "Quit"),
            ],
            (Screen::UserSelection, _) => vec![
                ("↑/↓", "Select"),
                ("Enter", "Open"),
                ("a", "All users"),
                ("r", "Reload"),
                ("t", "Theme"),
                ("?", "Help"),
                ("q", "Quit"),
            ],
        }
    }
}

impl<'a> Widget for Footer<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, self.theme.styles.footer);

        let mut spans = Vec::new();
        for (i, (key, action)) in self.bindings().iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled("  ", self.theme.styles.keybind));
            }
            spans.push(Span::styled(
                format!("[{}]", key),
                self.theme.styles.keybind_key,
            ));
            spans.push(Span::styled(
                format!(" {}", action),
                self.theme.styles.keybind,
            ));
        }

        let line = Line::from(spans);
        buf.set_line(area.x + 1, area.y, &line, area.width.saturating_sub(2));
    }
}
