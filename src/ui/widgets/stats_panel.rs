//! Latest-snapshot cards

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Widget},
};

use crate::telemetry::{StatSnapshot, TelemetryView};
use crate::ui::format::{cpu_percent, disk_usage, memory_usage, text_or_na, truncate};
use crate::ui::theme::Theme;

pub struct StatsPanel<'a> {
    view: &'a TelemetryView,
    theme: &'a Theme,
}

impl<'a> StatsPanel<'a> {
    pub fn new(view: &'a TelemetryView, theme: &'a Theme) -> Self {
        Self { view, theme }
    }

    fn render_card(&self, title: &str, value: &str, value_style: Style, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(Span::styled(format!(" {} ", title), self.theme.styles.panel_title))
            .borders(Borders::ALL)
            .border_style(self.theme.styles.panel_border)
            .style(Style::default().bg(self.theme.colors.bg_primary));

        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height == 0 {
            return;
        }

        let width = inner.width.saturating_sub(2);
        let span = Span::styled(truncate(value, width as usize), value_style);
        buf.set_span(inner.x + 1, inner.y + inner.height / 2, &span, width);
    }
}

impl<'a> Widget for StatsPanel<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let empty = StatSnapshot::default();
        let latest = self.view.latest().unwrap_or(&empty);

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(16),
                Constraint::Percentage(16),
                Constraint::Percentage(14),
                Constraint::Percentage(27),
                Constraint::Percentage(27),
            ])
            .split(area);

        let value = Style::default()
            .fg(self.theme.colors.fg_primary)
            .add_modifier(Modifier::BOLD);

        let user = text_or_na(latest.user.as_deref());
        let ip = text_or_na(latest.ip_address.as_deref());
        let status = latest.status.to_string();

        self.render_card("User", user, value, chunks[0], buf);
        self.render_card(&format!("IP · {}", status), ip, self.theme.status(latest.status), chunks[1], buf);
        self.render_card("CPU", &cpu_percent(latest), self.theme.styles.chart_cpu, chunks[2], buf);
        self.render_card("Memory", &memory_usage(latest), self.theme.styles.chart_memory, chunks[3], buf);
        self.render_card("Disk", &disk_usage(latest), self.theme.styles.chart_disk, chunks[4], buf);
    }
}
