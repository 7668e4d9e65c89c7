//! Process table

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Row, Table, Widget},
};

use crate::core::state::DashboardState;
use crate::ui::format::process_row;
use crate::ui::theme::Theme;

pub struct ProcessesPanel<'a> {
    dashboard: &'a DashboardState,
    theme: &'a Theme,
}

impl<'a> ProcessesPanel<'a> {
    pub fn new(dashboard: &'a DashboardState, theme: &'a Theme) -> Self {
        Self { dashboard, theme }
    }
}

impl<'a> Widget for ProcessesPanel<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let processes = &self.dashboard.telemetry.processes;

        let block = Block::default()
            .title(Span::styled(
                format!(" PROCESSES ({}) ", processes.len()),
                self.theme.styles.panel_title,
            ))
            .borders(Borders::ALL)
            .border_style(self.theme.styles.panel_border_focused)
            .style(Style::default().bg(self.theme.colors.bg_primary));

        if processes.is_empty() {
            let inner = block.inner(area);
            block.render(area, buf);
            let msg = if self.dashboard.telemetry.loading {
                "Loading..."
            } else {
                "No processes reported"
            };
            let span = Span::styled(msg, self.theme.styles.muted);
            buf.set_span(inner.x + 1, inner.y, &span, inner.width.saturating_sub(2));
            return;
        }

        let header = Row::new(vec!["Process", "User", "CPU", "Memory"]).style(
            Style::default()
                .fg(self.theme.colors.accent_primary)
                .add_modifier(Modifier::BOLD),
        );

        let rows = processes
            .iter()
            .skip(self.dashboard.process_scroll)
            .map(|p| Row::new(process_row(p)).style(self.theme.styles.list_item));

        let table = Table::new(
            rows,
            [
                Constraint::Min(20),
                Constraint::Length(16),
                Constraint::Length(10),
                Constraint::Length(14),
            ],
        )
        .header(header)
        .column_spacing(2)
        .block(block);

        Widget::render(table, area, buf);
    }
}
