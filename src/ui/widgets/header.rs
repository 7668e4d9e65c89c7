//! Header widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};
use unicode_width::UnicodeWidthStr;

use crate::core::state::{AppState, Screen};
use crate::telemetry::TelemetryView;
use crate::ui::theme::Theme;

pub struct Header<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> Header<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    /// Right-hand poll indicator for a mounted view
    fn poll_status(&self, view: &TelemetryView) -> (String, Style) {
        let now = chrono::Utc::now();
        let stale = view.is_stale(now, self.state.session.poll_interval);

        match view.last_success {
            None if view.loading => ("loading…".to_string(), self.theme.styles.muted),
            None => ("no data".to_string(), self.theme.styles.notification_error),
            Some(at) => {
                let time = at
                    .with_timezone(&chrono::Local)
                    .format("%H:%M:%S")
                    .to_string();
                if stale {
                    (
                        format!("STALE · last update {}", time),
                        self.theme.styles.notification_warning,
                    )
                } else {
                    (format!("updated {}", time), self.theme.styles.muted)
                }
            }
        }
    }
}

impl<'a> Widget for Header<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Background
        buf.set_style(area, self.theme.styles.header);

        let separator = Span::styled(" │ ", Style::default().fg(self.theme.colors.fg_muted));

        let mut spans = vec![Span::styled(
            " TELEMON ",
            Style::default()
                .fg(self.theme.colors.accent_primary)
                .add_modifier(Modifier::BOLD),
        )];

        let dashboard = self
            .state
            .dashboard
            .as_ref()
            .filter(|_| self.state.screen == Screen::Dashboard);

        match dashboard {
            Some(dashboard) => {
                spans.push(separator.clone());
                spans.push(Span::styled(
                    dashboard.telemetry.context.label().to_string(),
                    Style::default()
                        .fg(self.theme.colors.fg_primary)
                        .add_modifier(Modifier::BOLD),
                ));
            }
            None => {
                spans.push(separator.clone());
                spans.push(Span::styled(
                    "Select a user",
                    Style::default().fg(self.theme.colors.fg_primary),
                ));
            }
        }

        spans.push(separator);
        spans.push(Span::styled(
            self.state.session.endpoint.base_url(),
            Style::default().fg(self.theme.colors.info),
        ));

        buf.set_line(area.x, area.y, &Line::from(spans), area.width);

        if let Some(dashboard) = dashboard {
            let (status, style) = self.poll_status(&dashboard.telemetry);
            let width = status.width() as u16;
            let x = area.x + area.width.saturating_sub(width + 1);
            buf.set_span(x, area.y, &Span::styled(status, style), width);
        }
    }
}
