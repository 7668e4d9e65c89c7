//! Application state machine with fine-grained reactive updates

use parking_lot::RwLock;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::debug;

use crate::integrations::api::ApiEndpoint;
use crate::telemetry::{ApiError, PollBatch, PollContext, TelemetryView, UserSummary};
use crate::ui::theme::Theme;

/// Which screen is mounted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    UserSelection,
    Dashboard,
}

/// Overlay mode on top of the current screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppMode {
    #[default]
    Normal,
    Help,
}

/// Dashboard tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DashboardTab {
    #[default]
    Overview,
    Processes,
    Command,
}

impl DashboardTab {
    /// Tabs available for a context. The command tab needs a target user.
    pub fn available(context: &PollContext) -> &'static [DashboardTab] {
        match context {
            PollContext::All => &[Self::Overview, Self::Processes],
            PollContext::User(_) => &[Self::Overview, Self::Processes, Self::Command],
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Overview => "Overview",
            Self::Processes => "Processes",
            Self::Command => "Command",
        }
    }

    pub fn next(self, context: &PollContext) -> Self {
        let tabs = Self::available(context);
        let pos = tabs.iter().position(|t| *t == self).unwrap_or(0);
        tabs[(pos + 1) % tabs.len()]
    }

    pub fn prev(self, context: &PollContext) -> Self {
        let tabs = Self::available(context);
        let pos = tabs.iter().position(|t| *t == self).unwrap_or(0);
        tabs[(pos + tabs.len() - 1) % tabs.len()]
    }
}

/// User selection screen state
#[derive(Debug, Clone, Default)]
pub struct UserListState {
    pub users: Vec<UserSummary>,
    pub selected_index: usize,
    pub loading: bool,
    pub error: Option<String>,
}

impl UserListState {
    pub fn selected(&self) -> Option<&UserSummary> {
        self.users.get(self.selected_index)
    }

    pub fn select_next(&mut self) {
        if !self.users.is_empty() {
            self.selected_index = (self.selected_index + 1).min(self.users.len() - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    pub fn apply(&mut self, result: Result<Vec<UserSummary>, ApiError>) {
        self.loading = false;
        match result {
            Ok(users) => {
                self.users = users;
                self.error = None;
                if self.selected_index >= self.users.len() {
                    self.selected_index = self.users.len().saturating_sub(1);
                }
            }
            Err(e) => self.error = Some(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptKind {
    Command,
    Output,
    Error,
}

#[derive(Debug, Clone)]
pub struct TranscriptLine {
    pub content: String,
    pub kind: TranscriptKind,
}

/// Command panel state
#[derive(Debug, Clone)]
pub struct CommandPanelState {
    pub input: String,
    pub transcript: VecDeque<TranscriptLine>,
    /// A send or an output fetch is outstanding
    pub busy: bool,
    pub max_lines: usize,
}

impl Default for CommandPanelState {
    fn default() -> Self {
        Self {
            input: String::new(),
            transcript: VecDeque::new(),
            busy: false,
            max_lines: 500,
        }
    }
}

impl CommandPanelState {
    pub fn push(&mut self, content: impl Into<String>, kind: TranscriptKind) {
        self.transcript.push_back(TranscriptLine {
            content: content.into(),
            kind,
        });
        while self.transcript.len() > self.max_lines {
            self.transcript.pop_front();
        }
    }

    /// Take the trimmed input for sending. `None` if blank or a call is outstanding.
    pub fn take_command(&mut self) -> Option<String> {
        if self.busy {
            return None;
        }
        let command = self.input.trim().to_string();
        if command.is_empty() {
            return None;
        }
        self.input.clear();
        self.push(format!("$ {}", command), TranscriptKind::Command);
        self.busy = true;
        Some(command)
    }

    pub fn push_error(&mut self, err: &ApiError) {
        self.push(format!("Error: {}", err.display_body()), TranscriptKind::Error);
    }
}

/// One mounted dashboard
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub telemetry: TelemetryView,
    pub tab: DashboardTab,
    pub process_scroll: usize,
    pub command: CommandPanelState,
}

impl DashboardState {
    pub fn new(telemetry: TelemetryView) -> Self {
        Self {
            telemetry,
            tab: DashboardTab::default(),
            process_scroll: 0,
            command: CommandPanelState::default(),
        }
    }

    pub fn view_id(&self) -> uuid::Uuid {
        self.telemetry.id
    }

    pub fn scroll_processes(&mut self, down: bool) {
        let max = self.telemetry.processes.len().saturating_sub(1);
        self.process_scroll = if down {
            (self.process_scroll + 1).min(max)
        } else {
            self.process_scroll.saturating_sub(1)
        };
    }

    /// Keep the scroll offset on a row after the process list is replaced.
    fn clamp_process_scroll(&mut self) {
        let max = self.telemetry.processes.len().saturating_sub(1);
        self.process_scroll = self.process_scroll.min(max);
    }
}

/// Per-session settings handed to every screen
#[derive(Debug, Clone)]
pub struct Session {
    pub endpoint: ApiEndpoint,
    pub poll_interval: Duration,
    pub history_capacity: usize,
    pub output_delay: Duration,
}

/// Notification
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: uuid::Uuid,
    pub message: String,
    pub level: NotificationLevel,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Main application state
#[derive(Debug, Clone)]
pub struct AppState {
    pub screen: Screen,
    pub mode: AppMode,
    pub users: UserListState,
    pub dashboard: Option<DashboardState>,
    pub theme: Theme,
    pub session: Session,
    pub notifications: Vec<Notification>,
}

impl AppState {
    pub fn new(session: Session, theme: Theme) -> Self {
        Self {
            screen: Screen::UserSelection,
            mode: AppMode::Normal,
            users: UserListState::default(),
            dashboard: None,
            theme,
            session,
            notifications: Vec::new(),
        }
    }

    pub fn add_notification(&mut self, message: String, level: NotificationLevel) -> uuid::Uuid {
        let notification = Notification {
            id: uuid::Uuid::new_v4(),
            message,
            level,
            created_at: chrono::Utc::now(),
            duration_ms: 5000,
        };
        let id = notification.id;
        self.notifications.push(notification);
        id
    }

    pub fn remove_expired_notifications(&mut self) {
        let now = chrono::Utc::now();
        self.notifications.retain(|n| {
            let elapsed = now.signed_duration_since(n.created_at).num_milliseconds() as u64;
            elapsed < n.duration_ms
        });
    }

    /// Dashboard with this view id, if it is still the mounted one.
    pub fn mounted(&mut self, view_id: uuid::Uuid) -> Option<&mut DashboardState> {
        self.dashboard.as_mut().filter(|d| d.view_id() == view_id)
    }

    pub fn mount_dashboard(&mut self, telemetry: TelemetryView) -> StateChange {
        let view_id = telemetry.id;
        self.dashboard = Some(DashboardState::new(telemetry));
        self.screen = Screen::Dashboard;
        StateChange::ViewMounted(view_id)
    }

    pub fn unmount_dashboard(&mut self) -> Option<StateChange> {
        let dashboard = self.dashboard.take()?;
        self.screen = Screen::UserSelection;
        Some(StateChange::ViewUnmounted(dashboard.view_id()))
    }

    /// Route a poll result to its view. Results for a view that is no longer
    /// mounted are discarded.
    pub fn apply_poll(
        &mut self,
        view_id: uuid::Uuid,
        result: Result<PollBatch, ApiError>,
    ) -> Option<StateChange> {
        let Some(dashboard) = self.mounted(view_id) else {
            debug!(%view_id, "poll result for unmounted view discarded");
            return None;
        };

        match result {
            Ok(batch) => {
                if !dashboard.telemetry.apply(batch) {
                    return None;
                }
                dashboard.clamp_process_scroll();
                Some(StateChange::TelemetryUpdated(view_id))
            }
            Err(e) => {
                let first_failure = dashboard.telemetry.last_error.is_none();
                dashboard.telemetry.record_failure(&e);
                // One toast per outage, not one per tick.
                if first_failure {
                    self.add_notification(format!("Poll failed: {}", e), NotificationLevel::Error);
                }
                Some(StateChange::PollFailed(view_id))
            }
        }
    }

    pub fn toggle_theme(&mut self) -> StateChange {
        self.theme = self.theme.toggled();
        StateChange::ThemeChanged
    }
}

/// Reactive state changes via broadcast channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateChange {
    ScreenChanged(Screen),
    ModeChanged(AppMode),
    UsersUpdated,
    ViewMounted(uuid::Uuid),
    ViewUnmounted(uuid::Uuid),
    TelemetryUpdated(uuid::Uuid),
    PollFailed(uuid::Uuid),
    TranscriptAppended,
    NotificationAdded(uuid::Uuid),
    ThemeChanged,
}

/// Thread-safe state store
pub struct StateStore {
    state: RwLock<AppState>,
    change_tx: broadcast::Sender<StateChange>,
}

impl StateStore {
    pub fn new(initial: AppState) -> Self {
        let (change_tx, _) = broadcast::channel(256);
        Self {
            state: RwLock::new(initial),
            change_tx,
        }
    }

    /// Subscribe to state changes
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.change_tx.subscribe()
    }

    /// Atomic state mutation with change notification
    pub fn update<F, R>(&self, mutator: F) -> R
    where
        F: FnOnce(&mut AppState) -> (R, Option<StateChange>),
    {
        let mut state = self.state.write();
        let (result, change) = mutator(&mut state);
        if let Some(change) = change {
            let _ = self.change_tx.send(change);
        }
        result
    }

    /// Read current state
    pub fn read(&self) -> parking_lot::RwLockReadGuard<'_, AppState> {
        self.state.read()
    }
}
