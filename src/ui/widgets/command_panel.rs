//! Remote command input and transcript

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

use crate::core::state::{DashboardState, TranscriptKind};
use crate::ui::format::truncate;
use crate::ui::theme::Theme;

pub struct CommandPanel<'a> {
    dashboard: &'a DashboardState,
    theme: &'a Theme,
}

impl<'a> CommandPanel<'a> {
    pub fn new(dashboard: &'a DashboardState, theme: &'a Theme) -> Self {
        Self { dashboard, theme }
    }

    /// Transcript wrapped to `width`, one entry per terminal row.
    fn wrapped_lines(&self, width: usize) -> Vec<(String, Style)> {
        let width = width.max(1);
        let mut out = Vec::new();
        for line in &self.dashboard.command.transcript {
            let style = match line.kind {
                TranscriptKind::Command => self.theme.styles.transcript_command,
                TranscriptKind::Output => self.theme.styles.transcript_output,
                TranscriptKind::Error => self.theme.styles.transcript_error,
            };
            for raw in line.content.lines() {
                if raw.is_empty() {
                    out.push((String::new(), style));
                    continue;
                }
                for piece in textwrap::wrap(raw, width) {
                    out.push((piece.into_owned(), style));
                }
            }
        }
        out
    }

    fn render_transcript(&self, area: Rect, buf: &mut Buffer) {
        let target = self.dashboard.telemetry.context.label();
        let block = Block::default()
            .title(Span::styled(
                format!(" COMMAND → {} ", target),
                self.theme.styles.panel_title,
            ))
            .borders(Borders::ALL)
            .border_style(self.theme.styles.panel_border)
            .style(Style::default().bg(self.theme.colors.bg_primary));

        let inner = block.inner(area);
        block.render(area, buf);

        let lines = self.wrapped_lines(inner.width.saturating_sub(1) as usize);
        if lines.is_empty() {
            let span = Span::styled(
                "Type a command and press Enter. Output appears here.",
                self.theme.styles.muted,
            );
            buf.set_span(inner.x + 1, inner.y, &span, inner.width.saturating_sub(2));
            return;
        }

        // Follow the tail
        let visible = inner.height as usize;
        let start = lines.len().saturating_sub(visible);
        for (i, (content, style)) in lines.iter().skip(start).enumerate() {
            buf.set_span(
                inner.x + 1,
                inner.y + i as u16,
                &Span::styled(content.as_str(), *style),
                inner.width.saturating_sub(1),
            );
        }
    }

    fn render_input(&self, area: Rect, buf: &mut Buffer) {
        let command = &self.dashboard.command;
        let title = if command.busy { " INPUT · waiting… " } else { " INPUT " };

        let block = Block::default()
            .title(Span::styled(title, self.theme.styles.panel_title))
            .borders(Borders::ALL)
            .border_style(self.theme.styles.panel_border_focused)
            .style(Style::default().bg(self.theme.colors.bg_primary));

        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height == 0 {
            return;
        }

        let max = inner.width.saturating_sub(4) as usize;
        // Keep the end of a long input visible
        let shown: String = if command.input.chars().count() > max {
            let skip = command.input.chars().count() - max;
            command.input.chars().skip(skip).collect()
        } else {
            truncate(&command.input, max)
        };

        let line = Line::from(vec![
            Span::styled("$ ", self.theme.styles.keybind_key),
            Span::styled(shown, self.theme.styles.list_item),
            Span::styled("█", Style::default().fg(self.theme.colors.accent_primary)),
        ]);
        buf.set_line(inner.x + 1, inner.y, &line, inner.width.saturating_sub(1));
    }
}

impl<'a> Widget for CommandPanel<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(3)])
            .split(area);

        self.render_transcript(chunks[0], buf);
        self.render_input(chunks[1], buf);
    }
}
