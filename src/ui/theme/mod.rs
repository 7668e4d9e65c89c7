//! Dark and light palettes for the dashboard

use ratatui::style::{Color, Modifier, Style};

use crate::telemetry::SystemStatus;

/// Complete theme definition
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,
    pub colors: ThemeColors,
    pub styles: ThemeStyles,
}

#[derive(Debug, Clone)]
pub struct ThemeColors {
    // Base colors
    pub bg_primary: Color,
    pub bg_secondary: Color,
    pub bg_highlight: Color,

    pub fg_primary: Color,
    pub fg_secondary: Color,
    pub fg_muted: Color,

    // Accent colors
    pub accent_primary: Color,
    pub accent_secondary: Color,

    // Semantic colors
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,

    // Special
    pub border: Color,
    pub border_focused: Color,
    pub selection: Color,
}

#[derive(Debug, Clone)]
pub struct ThemeStyles {
    pub header: Style,
    pub footer: Style,
    pub panel_title: Style,
    pub panel_border: Style,
    pub panel_border_focused: Style,
    pub list_item: Style,
    pub list_item_selected: Style,
    pub muted: Style,
    pub status_active: Style,
    pub status_inactive: Style,
    pub status_unknown: Style,
    pub tab_active: Style,
    pub tab_inactive: Style,
    pub chart_cpu: Style,
    pub chart_memory: Style,
    pub chart_disk: Style,
    pub transcript_command: Style,
    pub transcript_output: Style,
    pub transcript_error: Style,
    pub keybind: Style,
    pub keybind_key: Style,
    pub notification_info: Style,
    pub notification_success: Style,
    pub notification_warning: Style,
    pub notification_error: Style,
}

// Series colours stay the same in both palettes.
const CPU_SERIES: Color = Color::Rgb(0xff, 0x4d, 0x4d);
const MEMORY_SERIES: Color = Color::Rgb(0x4c, 0xaf, 0x50);
const DISK_SERIES: Color = Color::Rgb(0xff, 0xa5, 0x00);

impl Theme {
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "light" => Self::light(),
            _ => Self::dark(), // Default
        }
    }

    /// Dark theme (default)
    pub fn dark() -> Self {
        let colors = ThemeColors {
            bg_primary: Color::Rgb(26, 27, 38),
            bg_secondary: Color::Rgb(36, 40, 59),
            bg_highlight: Color::Rgb(47, 53, 73),

            fg_primary: Color::Rgb(192, 202, 245),
            fg_secondary: Color::Rgb(169, 177, 214),
            fg_muted: Color::Rgb(86, 95, 137),

            accent_primary: Color::Rgb(122, 162, 247),
            accent_secondary: Color::Rgb(187, 154, 247),

            success: Color::Rgb(158, 206, 106),
            warning: Color::Rgb(224, 175, 104),
            error: Color::Rgb(247, 118, 142),
            info: Color::Rgb(125, 207, 255),

            border: Color::Rgb(41, 46, 66),
            border_focused: Color::Rgb(122, 162, 247),
            selection: Color::Rgb(52, 59, 88),
        };

        Self::from_colors("dark", colors)
    }

    pub fn light() -> Self {
        let colors = ThemeColors {
            bg_primary: Color::Rgb(245, 246, 250),
            bg_secondary: Color::Rgb(225, 228, 236),
            bg_highlight: Color::Rgb(210, 215, 228),

            fg_primary: Color::Rgb(36, 41, 56),
            fg_secondary: Color::Rgb(68, 76, 98),
            fg_muted: Color::Rgb(120, 128, 150),

            accent_primary: Color::Rgb(46, 92, 196),
            accent_secondary: Color::Rgb(132, 72, 190),

            success: Color::Rgb(46, 125, 50),
            warning: Color::Rgb(176, 112, 0),
            error: Color::Rgb(198, 40, 40),
            info: Color::Rgb(2, 119, 189),

            border: Color::Rgb(190, 196, 210),
            border_focused: Color::Rgb(46, 92, 196),
            selection: Color::Rgb(200, 214, 240),
        };

        Self::from_colors("light", colors)
    }

    pub fn toggled(&self) -> Self {
        if self.name == "light" {
            Self::dark()
        } else {
            Self::light()
        }
    }

    pub fn status(&self, status: SystemStatus) -> Style {
        match status {
            SystemStatus::Active => self.styles.status_active,
            SystemStatus::Inactive => self.styles.status_inactive,
            SystemStatus::Unknown => self.styles.status_unknown,
        }
    }

    fn from_colors(name: &str, colors: ThemeColors) -> Self {
        let styles = ThemeStyles {
            header: Style::default()
                .bg(colors.bg_secondary)
                .fg(colors.fg_primary),
            footer: Style::default().bg(colors.bg_secondary).fg(colors.fg_muted),
            panel_title: Style::default()
                .fg(colors.accent_primary)
                .add_modifier(Modifier::BOLD),
            panel_border: Style::default().fg(colors.border),
            panel_border_focused: Style::default().fg(colors.border_focused),
            list_item: Style::default().fg(colors.fg_primary),
            list_item_selected: Style::default()
                .fg(colors.fg_primary)
                .bg(colors.selection)
                .add_modifier(Modifier::BOLD),
            muted: Style::default().fg(colors.fg_muted),
            status_active: Style::default().fg(colors.success),
            status_inactive: Style::default().fg(colors.error),
            status_unknown: Style::default().fg(colors.fg_muted),
            tab_active: Style::default()
                .fg(colors.bg_primary)
                .bg(colors.accent_primary)
                .add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(colors.fg_secondary),
            chart_cpu: Style::default().fg(CPU_SERIES),
            chart_memory: Style::default().fg(MEMORY_SERIES),
            chart_disk: Style::default().fg(DISK_SERIES),
            transcript_command: Style::default()
                .fg(colors.accent_secondary)
                .add_modifier(Modifier::BOLD),
            transcript_output: Style::default().fg(colors.fg_primary),
            transcript_error: Style::default().fg(colors.error),
            keybind: Style::default().fg(colors.fg_muted),
            keybind_key: Style::default()
                .fg(colors.accent_secondary)
                .add_modifier(Modifier::BOLD),
            notification_info: Style::default().fg(colors.info),
            notification_success: Style::default().fg(colors.success),
            notification_warning: Style::default().fg(colors.warning),
            notification_error: Style::default().fg(colors.error),
        };

        Self {
            name: name.to_string(),
            colors,
            styles,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_names_fall_back_to_dark() {
        assert_eq!(Theme::from_name("LIGHT").name, "light");
        assert_eq!(Theme::from_name("solarized").name, "dark");
    }

    #[test]
    fn toggle_flips_between_palettes() {
        let theme = Theme::dark();
        assert_eq!(theme.toggled().name, "light");
        assert_eq!(theme.toggled().toggled().name, "dark");
    }

    #[test]
    fn status_colours_differ() {
        let theme = Theme::dark();
        assert_ne!(
            theme.status(SystemStatus::Active),
            theme.status(SystemStatus::Inactive)
        );
        assert_eq!(theme.styles.chart_cpu.fg, Some(CPU_SERIES));
    }
}
