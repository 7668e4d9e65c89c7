//! Main UI renderer

use ratatui::{layout::Rect, style::Style, text::Span, widgets::Paragraph, Frame};
use unicode_width::UnicodeWidthStr;

use crate::core::state::{AppMode, AppState, NotificationLevel};
use crate::ui::format::truncate;
use crate::ui::layout::LayoutManager;
use crate::ui::widgets::*;

pub struct Renderer;

impl Renderer {
    pub fn render(frame: &mut Frame, state: &AppState) {
        let area = frame.area();
        let theme = &state.theme;

        // Clear background
        frame.render_widget(
            ratatui::widgets::Block::default().style(Style::default().bg(theme.colors.bg_primary)),
            area,
        );

        let layout = LayoutManager::compute(area, state);

        frame.render_widget(Header::new(state, theme), layout.header);
        frame.render_widget(Footer::new(state, theme), layout.footer);

        if let Some(users_area) = layout.users_panel {
            frame.render_widget(UsersPanel::new(state, theme), users_area);
        }

        if let Some(dashboard) = &state.dashboard {
            if let Some(tabs_area) = layout.tabs {
                frame.render_widget(TabBar::new(dashboard, theme), tabs_area);
            }
            if let Some(stats_area) = layout.stats_panel {
                frame.render_widget(StatsPanel::new(&dashboard.telemetry, theme), stats_area);
            }
            if let Some(charts_area) = layout.charts_panel {
                frame.render_widget(ChartsPanel::new(&dashboard.telemetry, theme), charts_area);
            }
            if let Some(processes_area) = layout.processes_panel {
                frame.render_widget(ProcessesPanel::new(dashboard, theme), processes_area);
            }
            if let Some(command_area) = layout.command_panel {
                frame.render_widget(CommandPanel::new(dashboard, theme), command_area);
            }
        }

        if state.mode == AppMode::Help {
            frame.render_widget(HelpOverlay::new(theme), layout.overlay_area);
        }

        Self::render_notifications(frame, state);
    }

    fn render_notifications(frame: &mut Frame, state: &AppState) {
        let theme = &state.theme;
        let area = frame.area();

        // Top-right corner, below the header
        let mut y = 2;
        for notification in state.notifications.iter().take(3) {
            if y >= area.height {
                break;
            }

            let (style, icon) = match notification.level {
                NotificationLevel::Info => (theme.styles.notification_info, "ℹ"),
                NotificationLevel::Success => (theme.styles.notification_success, "✓"),
                NotificationLevel::Warning => (theme.styles.notification_warning, "⚠"),
                NotificationLevel::Error => (theme.styles.notification_error, "✗"),
            };

            let msg = truncate(&format!(" {} {} ", icon, notification.message), 48);
            let width = (msg.width() as u16).min(area.width);
            let x = area.width.saturating_sub(width + 2);

            let notification_area = Rect {
                x,
                y,
                width,
                height: 1,
            };

            frame.render_widget(
                Paragraph::new(Span::styled(msg, style))
                    .style(Style::default().bg(theme.colors.bg_highlight)),
                notification_area,
            );

            y += 2;
        }
    }
}
