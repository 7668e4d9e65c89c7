//! Help overlay widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Widget},
};

use crate::ui::theme::Theme;

pub struct HelpOverlay<'a> {
    theme: &'a Theme,
}

impl<'a> HelpOverlay<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self { theme }
    }
}

impl<'a> Widget for HelpOverlay<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        let block = Block::default()
            .title(Span::styled(" Telemon Help ", self.theme.styles.panel_title))
            .borders(Borders::ALL)
            .border_style(self.theme.styles.panel_border_focused)
            .style(Style::default().bg(self.theme.colors.bg_secondary));

        let inner = block.inner(area);
        block.render(area, buf);

        let keybindings = [
            ("General", vec![
                ("q", "Quit"),
                ("Ctrl-C", "Quit from anywhere"),
                ("?", "Toggle help"),
                ("t", "Toggle dark/light theme"),
                ("Esc", "Back / close overlay"),
            ]),
            ("User selection", vec![
                ("↑/k ↓/j", "Move selection"),
                ("Enter", "Open the user's dashboard"),
                ("a", "Open the all-users dashboard"),
                ("r", "Reload the user list"),
            ]),
            ("Dashboard", vec![
                ("Tab", "Next tab"),
                ("Shift-Tab", "Previous tab"),
                ("1/2/3", "Overview / Processes / Command"),
                ("r", "Poll now"),
                ("↑/↓", "Scroll processes"),
            ]),
            ("Command", vec![
                ("Enter", "Send command to the system"),
                ("Ctrl-R", "Refresh command output"),
            ]),
        ];

        let mut y = inner.y;

        for (section, bindings) in &keybindings {
            if y >= inner.y + inner.height {
                break;
            }

            // Section header
            let header = Line::from(vec![Span::styled(
                format!("─── {} ", section),
                Style::default()
                    .fg(self.theme.colors.accent_primary)
                    .add_modifier(Modifier::BOLD),
            )]);
            buf.set_line(inner.x + 1, y, &header, inner.width.saturating_sub(2));
            y += 1;

            for (key, desc) in bindings {
                if y >= inner.y + inner.height {
                    break;
                }

                let line = Line::from(vec![
                    Span::styled(
                        format!("  {:>10}  ", key),
                        self.theme.styles.keybind_key,
                    ),
                    Span::styled(*desc, self.theme.styles.keybind),
                ]);
                buf.set_line(inner.x + 1, y, &line, inner.width.saturating_sub(2));
                y += 1;
            }

            y += 1; // Space between sections
        }

        let hint = " Press Esc or ? to close ";
        let hint_width = hint.len() as u16;
        if area.width > hint_width && area.height > 0 {
            let footer = Span::styled(hint, Style::default().fg(self.theme.colors.fg_muted));
            buf.set_span(
                area.x + (area.width - hint_width) / 2,
                area.y + area.height - 1,
                &footer,
                hint_width,
            );
        }
    }
}
