//! Dashboard tab strip

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::Widget,
};

use crate::core::state::{DashboardState, DashboardTab};
use crate::ui::theme::Theme;

pub struct TabBar<'a> {
    dashboard: &'a DashboardState,
    theme: &'a Theme,
}

impl<'a> TabBar<'a> {
    pub fn new(dashboard: &'a DashboardState, theme: &'a Theme) -> Self {
        Self { dashboard, theme }
    }
}

impl<'a> Widget for TabBar<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut spans = vec![Span::raw(" ")];
        let tabs = DashboardTab::available(&self.dashboard.telemetry.context);

        for (i, tab) in tabs.iter().enumerate() {
            let style = if *tab == self.dashboard.tab {
                self.theme.styles.tab_active
            } else {
                self.theme.styles.tab_inactive
            };
            spans.push(Span::styled(format!(" {} {} ", i + 1, tab.title()), style));
            spans.push(Span::raw(" "));
        }

        buf.set_line(area.x, area.y, &Line::from(spans), area.width);

        let history = &self.dashboard.telemetry.history;
        let samples = format!("samples {}/{} ", history.len(), history.capacity());
        let width = samples.len() as u16;
        if area.width > width + 40 {
            buf.set_string(
                area.x + area.width - width,
                area.y,
                samples,
                self.theme.styles.muted,
            );
        }
    }
}
