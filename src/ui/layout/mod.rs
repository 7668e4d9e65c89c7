//! Layout management system

use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::core::state::{AppState, DashboardTab, Screen};

/// Computed layout rects for the mounted screen
#[derive(Debug, Clone, Default)]
pub struct ComputedLayout {
    pub header: Rect,
    pub tabs: Option<Rect>,
    pub footer: Rect,
    pub users_panel: Option<Rect>,
    pub stats_panel: Option<Rect>,
    pub charts_panel: Option<Rect>,
    pub processes_panel: Option<Rect>,
    pub command_panel: Option<Rect>,
    pub overlay_area: Rect,
}

pub struct LayoutManager;

impl LayoutManager {
    /// Compute all panel rects based on terminal size and the mounted screen
    pub fn compute(area: Rect, state: &AppState) -> ComputedLayout {
        match (state.screen, state.dashboard.as_ref()) {
            (Screen::Dashboard, Some(dashboard)) => Self::dashboard_layout(area, dashboard.tab),
            _ => Self::user_selection_layout(area),
        }
    }

    fn user_selection_layout(area: Rect) -> ComputedLayout {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Header
                Constraint::Min(5),    // User list
                Constraint::Length(1), // Footer
            ])
            .split(area);

        ComputedLayout {
            header: chunks[0],
            footer: chunks[2],
            users_panel: Some(chunks[1]),
            overlay_area: Self::centered_rect(60, 70, area),
            ..Default::default()
        }
    }

    fn dashboard_layout(area: Rect, tab: DashboardTab) -> ComputedLayout {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Header
                Constraint::Length(1), // Tabs
                Constraint::Min(8),    // Body
                Constraint::Length(1), // Footer
            ])
            .split(area);

        let mut layout = ComputedLayout {
            header: chunks[0],
            tabs: Some(chunks[1]),
            footer: chunks[3],
            overlay_area: Self::centered_rect(60, 70, area),
            ..Default::default()
        };

        let body = chunks[2];
        match tab {
            DashboardTab::Overview => {
                let body_chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Length(5), // Stat cards
                        Constraint::Min(6),    // Charts
                    ])
                    .split(body);
                layout.stats_panel = Some(body_chunks[0]);
                layout.charts_panel = Some(body_chunks[1]);
            }
            DashboardTab::Processes => layout.processes_panel = Some(body),
            DashboardTab::Command => layout.command_panel = Some(body),
        }

        layout
    }

    /// Create a centered rect with given percentage width/height
    pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
        let popup_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ])
            .split(area);

        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ])
            .split(popup_layout[1])[1]
    }
}
