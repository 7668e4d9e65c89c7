//! UI Widgets

pub mod charts_panel;
pub mod command_panel;
pub mod footer;
pub mod header;
pub mod help_overlay;
pub mod processes_panel;
pub mod stats_panel;
pub mod tab_bar;
pub mod users_panel;

pub use charts_panel::ChartsPanel;
pub use command_panel::CommandPanel;
pub use footer::Footer;
pub use header::Header;
pub use help_overlay::HelpOverlay;
pub use processes_panel::ProcessesPanel;
pub use stats_panel::StatsPanel;
pub use tab_bar::TabBar;
pub use users_panel::UsersPanel;
