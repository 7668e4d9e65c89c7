//! CPU, memory and disk history charts

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Widget},
};

use crate::telemetry::chart::{ChartData, CPU_BOUND_PERCENT};
use crate::telemetry::TelemetryView;
use crate::ui::theme::Theme;

pub struct ChartsPanel<'a> {
    view: &'a TelemetryView,
    theme: &'a Theme,
}

impl<'a> ChartsPanel<'a> {
    pub fn new(view: &'a TelemetryView, theme: &'a Theme) -> Self {
        Self { view, theme }
    }

    fn block(&self, title: &str) -> Block<'static> {
        Block::default()
            .title(Span::styled(format!(" {} ", title), self.theme.styles.panel_title))
            .borders(Borders::ALL)
            .border_style(self.theme.styles.panel_border)
            .style(Style::default().bg(self.theme.colors.bg_primary))
    }

    #[allow(clippy::too_many_arguments)]
    fn render_series(
        &self,
        title: &str,
        points: &[(f64, f64)],
        x_bound: f64,
        y_bound: f64,
        unit: &str,
        style: Style,
        area: Rect,
        buf: &mut Buffer,
    ) {
        let dataset = Dataset::default()
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(style)
            .data(points);

        let latest = points.last().map(|(_, y)| *y).unwrap_or_default();
        let title = format!("{} {:.2}{}", title, latest, unit);

        let chart = Chart::new(vec![dataset])
            .block(self.block(&title))
            .x_axis(
                Axis::default()
                    .bounds([0.0, x_bound])
                    .style(self.theme.styles.muted),
            )
            .y_axis(
                Axis::default()
                    .bounds([0.0, y_bound])
                    .labels(vec!["0".to_string(), format!("{}", y_bound)])
                    .style(self.theme.styles.muted),
            );

        chart.render(area, buf);
    }
}

impl<'a> Widget for ChartsPanel<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(data) = ChartData::from_history(&self.view.history) else {
            let block = self.block("History");
            let inner = block.inner(area);
            block.render(area, buf);
            let msg = if self.view.loading {
                "Waiting for the first poll..."
            } else {
                "No samples yet"
            };
            let span = Span::styled(msg, self.theme.styles.muted);
            buf.set_span(inner.x + 1, inner.y, &span, inner.width.saturating_sub(2));
            return;
        };

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
            ])
            .split(area);

        let x_bound = data.x_bound();
        self.render_series(
            "CPU",
            &data.cpu,
            x_bound,
            CPU_BOUND_PERCENT,
            "%",
            self.theme.styles.chart_cpu,
            chunks[0],
            buf,
        );
        self.render_series(
            "Memory",
            &data.memory,
            x_bound,
            data.memory_bound,
            " GB",
            self.theme.styles.chart_memory,
            chunks[1],
            buf,
        );
        self.render_series(
            "Disk",
            &data.disk,
            x_bound,
            data.disk_bound,
            " GB",
            self.theme.styles.chart_disk,
            chunks[2],
            buf,
        );
    }
}
