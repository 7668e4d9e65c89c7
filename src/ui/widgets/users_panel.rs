//! User selection list

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

use crate::core::state::AppState;
use crate::telemetry::{SystemStatus, UserSummary};
use crate::ui::format::{fit, text_or_na};
use crate::ui::theme::Theme;

const USER_COLUMN: usize = 24;
const IP_COLUMN: usize = 18;

pub struct UsersPanel<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> UsersPanel<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    fn render_user_row(&self, user: &UserSummary, selected: bool) -> Line<'a> {
        let status_icon = match user.status {
            SystemStatus::Active => "●",
            SystemStatus::Inactive => "○",
            SystemStatus::Unknown => "?",
        };

        let base_style = if selected {
            self.theme.styles.list_item_selected
        } else {
            self.theme.styles.list_item
        };

        let indicator = if selected { "▸" } else { " " };

        Line::from(vec![
            Span::styled(indicator, base_style),
            Span::styled(format!(" {} ", status_icon), self.theme.status(user.status)),
            Span::styled(fit(text_or_na(user.user.as_deref()), USER_COLUMN), base_style),
            Span::styled(" ", base_style),
            Span::styled(
                fit(text_or_na(user.ip_address.as_deref()), IP_COLUMN),
                base_style.fg(self.theme.colors.info),
            ),
            Span::styled(" ", base_style),
            Span::styled(user.status.to_string(), self.theme.status(user.status)),
        ])
    }
}

impl<'a> Widget for UsersPanel<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let list = &self.state.users;

        let block = Block::default()
            .title(Span::styled(
                format!(" USERS ({}) ", list.users.len()),
                self.theme.styles.panel_title,
            ))
            .borders(Borders::ALL)
            .border_style(self.theme.styles.panel_border_focused)
            .style(Style::default().bg(self.theme.colors.bg_primary));

        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height == 0 {
            return;
        }

        let mut y = inner.y;
        if let Some(error) = &list.error {
            let span = Span::styled(
                format!("Failed to load users: {}", error),
                self.theme.styles.notification_error,
            );
            buf.set_span(inner.x + 1, y, &span, inner.width.saturating_sub(2));
            y += 1;
        }

        if list.users.is_empty() {
            let msg = if list.loading {
                "Loading..."
            } else {
                "No users reported. Press r to reload."
            };
            let span = Span::styled(msg, Style::default().fg(self.theme.colors.fg_muted));
            buf.set_span(inner.x + 1, y, &span, inner.width.saturating_sub(2));
            return;
        }

        // Keep the selection on screen
        let rows = (inner.y + inner.height).saturating_sub(y) as usize;
        let start = (list.selected_index + 1).saturating_sub(rows);

        for (i, user) in list.users.iter().enumerate().skip(start).take(rows) {
            let line = self.render_user_row(user, i == list.selected_index);
            buf.set_line(inner.x, y, &line, inner.width);
            y += 1;
        }
    }
}
