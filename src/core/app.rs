//! Main application orchestrator

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::Terminal;
use std::io::Stdout;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, trace, warn};

use crate::core::events::{Event, EventHandler, EventResult, KeyBindings};
use crate::core::scheduler::PollScheduler;
use crate::core::state::{
    AppMode, AppState, DashboardTab, NotificationLevel, Screen, Session, StateChange, StateStore,
    TranscriptKind,
};
use crate::telemetry::{ApiError, PollContext, TelemetryAggregator, TelemetryView, UserSummary};
use crate::ui::renderer::Renderer;
use crate::ui::theme::Theme;

pub struct App<B: Backend> {
    terminal: Terminal<B>,
    state: StateStore,
    changes: broadcast::Receiver<StateChange>,
    event_tx: mpsc::UnboundedSender<Event>,
    aggregator: Arc<TelemetryAggregator>,
    scheduler: Option<PollScheduler>,
}

impl App<CrosstermBackend<Stdout>> {
    pub fn new(session: Session, theme: Theme, aggregator: Arc<TelemetryAggregator>) -> Result<Self> {
        let backend = CrosstermBackend::new(std::io::stdout());
        let terminal = Terminal::new(backend)?;
        Ok(Self::with_terminal(terminal, session, theme, aggregator))
    }

    pub async fn run(&mut self) -> Result<()> {
        self.setup_terminal()?;

        let (mut event_handler, event_tx) = EventHandler::new();
        self.event_tx = event_tx.clone();
        EventHandler::spawn_sources(event_tx);

        // The selection screen loads its list on mount
        self.load_users();
        self.render()?;

        let result = self.event_loop(&mut event_handler).await;

        self.close_dashboard();
        self.shutdown()?;
        result
    }

    fn setup_terminal(&mut self) -> Result<()> {
        crossterm::terminal::enable_raw_mode()?;
        crossterm::execute!(
            std::io::stdout(),
            crossterm::terminal::EnterAlternateScreen,
            crossterm::cursor::Hide,
        )?;
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        crossterm::terminal::disable_raw_mode()?;
        crossterm::execute!(
            std::io::stdout(),
            crossterm::terminal::LeaveAlternateScreen,
            crossterm::cursor::Show,
        )?;
        Ok(())
    }

    async fn event_loop(&mut self, event_handler: &mut EventHandler) -> Result<()> {
        loop {
            let Some(event) = event_handler.next().await else {
                break;
            };

            match self.handle_event(event)? {
                EventResult::Continue => {}
                EventResult::Quit => break,
            }
        }
        Ok(())
    }
}

impl<B: Backend> App<B> {
    pub fn with_terminal(
        terminal: Terminal<B>,
        session: Session,
        theme: Theme,
        aggregator: Arc<TelemetryAggregator>,
    ) -> Self {
        let state = StateStore::new(AppState::new(session, theme));
        let changes = state.subscribe();

        // Placeholder sender, replaced once the event handler exists
        let (event_tx, _) = mpsc::unbounded_channel::<Event>();

        Self {
            terminal,
            state,
            changes,
            event_tx,
            aggregator,
            scheduler: None,
        }
    }

    pub fn state(&self) -> &StateStore {
        &self.state
    }

    fn handle_event(&mut self, event: Event) -> Result<EventResult> {
        match event {
            Event::Key(key) => {
                let result = self.handle_key(key)?;
                if result == EventResult::Continue {
                    self.render()?;
                }
                Ok(result)
            }
            Event::Resize(w, h) => {
                trace!(width = w, height = h, "terminal resized");
                self.render()?;
                Ok(EventResult::Continue)
            }
            Event::Tick => {
                self.state.update(|s| {
                    s.remove_expired_notifications();
                    ((), None)
                });
                self.render()?;
                Ok(EventResult::Continue)
            }
            Event::PollCompleted { view_id, result } => {
                self.state.update(|s| ((), s.apply_poll(view_id, result)));
                self.render_if_changed()?;
                Ok(EventResult::Continue)
            }
            Event::UsersLoaded(result) => {
                self.on_users_loaded(result);
                self.render_if_changed()?;
                Ok(EventResult::Continue)
            }
            Event::CommandSent { view_id, result } => {
                self.on_command_sent(view_id, result);
                self.render_if_changed()?;
                Ok(EventResult::Continue)
            }
            Event::CommandOutput { view_id, result } => {
                self.on_command_output(view_id, result);
                self.render_if_changed()?;
                Ok(EventResult::Continue)
            }
            Event::Quit => Ok(EventResult::Quit),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<EventResult> {
        if KeyBindings::quit_alt().matches(&key) {
            return Ok(EventResult::Quit);
        }

        let (mode, screen, tab) = {
            let state = self.state.read();
            (state.mode, state.screen, state.dashboard.as_ref().map(|d| d.tab))
        };

        match (mode, screen, tab) {
            (AppMode::Help, _, _) => self.handle_help_key(key),
            (_, Screen::UserSelection, _) => self.handle_user_selection_key(key),
            (_, Screen::Dashboard, Some(DashboardTab::Command)) => self.handle_command_key(key),
            (_, Screen::Dashboard, _) => self.handle_dashboard_key(key),
        }
    }

    /// Keys every non-text screen shares. `None` if the key was not one of them.
    fn handle_global_key(&mut self, key: &KeyEvent) -> Option<EventResult> {
        if KeyBindings::quit().matches(key) {
            return Some(EventResult::Quit);
        }

        if KeyBindings::help().matches(key) {
            self.set_mode(AppMode::Help);
            return Some(EventResult::Continue);
        }

        if KeyBindings::theme().matches(key) {
            self.state.update(|s| ((), Some(s.toggle_theme())));
            return Some(EventResult::Continue);
        }

        None
    }

    fn handle_help_key(&mut self, key: KeyEvent) -> Result<EventResult> {
        if KeyBindings::escape().matches(&key)
            || KeyBindings::help().matches(&key)
            || KeyBindings::quit().matches(&key)
        {
            self.set_mode(AppMode::Normal);
        }
        Ok(EventResult::Continue)
    }

    fn handle_user_selection_key(&mut self, key: KeyEvent) -> Result<EventResult> {
        if let Some(result) = self.handle_global_key(&key) {
            return Ok(result);
        }

        if KeyBindings::up().matches(&key) || KeyBindings::vim_up().matches(&key) {
            self.state.update(|s| {
                s.users.select_prev();
                ((), None)
            });
        } else if KeyBindings::down().matches(&key) || KeyBindings::vim_down().matches(&key) {
            self.state.update(|s| {
                s.users.select_next();
                ((), None)
            });
        } else if KeyBindings::refresh().matches(&key) {
            self.load_users();
        } else if KeyBindings::all_users().matches(&key) {
            self.open_dashboard(PollContext::All);
        } else if KeyBindings::enter().matches(&key) {
            let selected = self.state.read().users.selected().cloned();
            match selected {
                Some(UserSummary {
                    user: Some(name), ..
                }) => self.open_dashboard(PollContext::user(name)),
                Some(_) => self.notify(
                    "This entry has no user name to filter on".to_string(),
                    NotificationLevel::Warning,
                ),
                None => {}
            }
        }

        Ok(EventResult::Continue)
    }

    fn handle_dashboard_key(&mut self, key: KeyEvent) -> Result<EventResult> {
        if let Some(result) = self.handle_global_key(&key) {
            return Ok(result);
        }

        if KeyBindings::escape().matches(&key) {
            self.back_to_user_selection();
        } else if KeyBindings::tab().matches(&key) {
            self.switch_tab(true);
        } else if KeyBindings::backtab().matches(&key) {
            self.switch_tab(false);
        } else if KeyBindings::refresh().matches(&key) {
            if let Some(scheduler) = &self.scheduler {
                scheduler.poll_now();
            }
        } else if KeyBindings::up().matches(&key) || KeyBindings::vim_up().matches(&key) {
            self.with_dashboard(|d| d.scroll_processes(false));
        } else if KeyBindings::down().matches(&key) || KeyBindings::vim_down().matches(&key) {
            self.with_dashboard(|d| d.scroll_processes(true));
        } else if let KeyCode::Char(c @ '1'..='3') = key.code {
            let tab = match c {
                '1' => DashboardTab::Overview,
                '2' => DashboardTab::Processes,
                _ => DashboardTab::Command,
            };
            self.with_dashboard(|d| {
                if DashboardTab::available(&d.telemetry.context).contains(&tab) {
                    d.tab = tab;
                }
            });
        }

        Ok(EventResult::Continue)
    }

    /// The command tab owns the keyboard for text entry.
    fn handle_command_key(&mut self, key: KeyEvent) -> Result<EventResult> {
        if KeyBindings::escape().matches(&key) {
            self.back_to_user_selection();
        } else if KeyBindings::tab().matches(&key) {
            self.switch_tab(true);
        } else if KeyBindings::backtab().matches(&key) {
            self.switch_tab(false);
        } else if KeyBindings::enter().matches(&key) {
            self.send_command();
        } else if KeyBindings::refresh_output().matches(&key) {
            self.refresh_output();
        } else if key.code == KeyCode::Backspace {
            self.with_dashboard(|d| {
                d.command.input.pop();
            });
        } else if let KeyCode::Char(c) = key.code {
            if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
                self.with_dashboard(|d| d.command.input.push(c));
            }
        }

        Ok(EventResult::Continue)
    }

    fn set_mode(&mut self, mode: AppMode) {
        self.state.update(|s| {
            s.mode = mode;
            ((), Some(StateChange::ModeChanged(mode)))
        });
    }

    fn notify(&mut self, message: String, level: NotificationLevel) {
        self.state.update(|s| {
            let id = s.add_notification(message, level);
            ((), Some(StateChange::NotificationAdded(id)))
        });
    }

    fn with_dashboard<F>(&mut self, f: F)
    where
        F: FnOnce(&mut crate::core::state::DashboardState),
    {
        self.state.update(|s| {
            if let Some(dashboard) = s.dashboard.as_mut() {
                f(dashboard);
            }
            ((), None)
        });
    }

    fn switch_tab(&mut self, forward: bool) {
        self.with_dashboard(|d| {
            let context = &d.telemetry.context;
            d.tab = if forward {
                d.tab.next(context)
            } else {
                d.tab.prev(context)
            };
        });
    }

    fn load_users(&mut self) {
        self.state.update(|s| {
            s.users.loading = true;
            ((), None)
        });

        let aggregator = Arc::clone(&self.aggregator);
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = aggregator.users().await;
            let _ = tx.send(Event::UsersLoaded(result));
        });
    }

    fn on_users_loaded(&mut self, result: Result<Vec<UserSummary>, ApiError>) {
        if let Err(e) = &result {
            warn!(error = %e, "failed to load users");
        }
        let failed = result.is_err();
        self.state.update(|s| {
            s.users.apply(result);
            ((), Some(StateChange::UsersUpdated))
        });
        if failed {
            self.notify("Could not load users".to_string(), NotificationLevel::Error);
        }
    }

    /// Mount a dashboard for `context`, replacing any mounted one.
    fn open_dashboard(&mut self, context: PollContext) {
        self.close_dashboard();

        let (capacity, period) = {
            let state = self.state.read();
            (state.session.history_capacity, state.session.poll_interval)
        };

        let view = TelemetryView::new(context.clone(), capacity);
        info!(context = context.label(), view_id = %view.id, "opening dashboard");

        let scheduler = PollScheduler::mount(
            view.id,
            context,
            Arc::clone(&self.aggregator),
            period,
            self.event_tx.clone(),
        );
        self.state.update(|s| ((), Some(s.mount_dashboard(view))));
        self.scheduler = Some(scheduler);
    }

    fn close_dashboard(&mut self) {
        if let Some(scheduler) = self.scheduler.take() {
            debug!(
                view_id = %scheduler.view_id(),
                in_flight = scheduler.is_in_flight(),
                skipped_ticks = scheduler.skipped_ticks(),
                "closing dashboard"
            );
            scheduler.unmount();
        }
        self.state.update(|s| ((), s.unmount_dashboard()));
    }

    fn back_to_user_selection(&mut self) {
        self.close_dashboard();
        self.state.update(|s| ((), Some(StateChange::ScreenChanged(Screen::UserSelection))));
        self.load_users();
    }

    fn send_command(&mut self) {
        let request = self.state.update(|s| {
            let request = s.dashboard.as_mut().and_then(|d| {
                let system = d.telemetry.context.target()?.to_string();
                let command = d.command.take_command()?;
                Some((d.view_id(), system, command))
            });
            let change = request.as_ref().map(|_| StateChange::TranscriptAppended);
            (request, change)
        });

        let Some((view_id, system, command)) = request else {
            return;
        };

        debug!(%system, %command, "sending command");
        let api = Arc::clone(self.aggregator.api());
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = api.send_command(&system, &command).await;
            let _ = tx.send(Event::CommandSent { view_id, result });
        });
    }

    fn on_command_sent(&mut self, view_id: uuid::Uuid, result: Result<(), ApiError>) {
        match result {
            Ok(()) => {
                let (system, delay) = {
                    let state = self.state.read();
                    let system = state
                        .dashboard
                        .as_ref()
                        .filter(|d| d.view_id() == view_id)
                        .and_then(|d| d.telemetry.context.target().map(str::to_string));
                    (system, state.session.output_delay)
                };
                if let Some(system) = system {
                    self.fetch_output(view_id, system, delay);
                }
            }
            Err(e) => {
                warn!(error = %e, "command failed");
                self.state.update(|s| {
                    let change = s.mounted(view_id).map(|d| {
                        d.command.push_error(&e);
                        d.command.busy = false;
                        StateChange::TranscriptAppended
                    });
                    ((), change)
                });
            }
        }
    }

    fn refresh_output(&mut self) {
        let request = self.state.update(|s| {
            let request = s.dashboard.as_mut().and_then(|d| {
                if d.command.busy {
                    return None;
                }
                let system = d.telemetry.context.target()?.to_string();
                d.command.busy = true;
                Some((d.view_id(), system))
            });
            (request, None)
        });

        if let Some((view_id, system)) = request {
            self.fetch_output(view_id, system, Duration::ZERO);
        }
    }

    fn fetch_output(&self, view_id: uuid::Uuid, system: String, delay: Duration) {
        let api = Arc::clone(self.aggregator.api());
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let result = api.command_output(&system).await;
            let _ = tx.send(Event::CommandOutput { view_id, result });
        });
    }

    fn on_command_output(&mut self, view_id: uuid::Uuid, result: Result<String, ApiError>) {
        if let Err(e) = &result {
            warn!(error = %e, "failed to fetch command output");
        }
        self.state.update(|s| {
            let change = s.mounted(view_id).map(|d| {
                match result {
                    Ok(output) if output.trim().is_empty() => {
                        d.command.push("(no output)", TranscriptKind::Output)
                    }
                    Ok(output) => d.command.push(output.trim_end(), TranscriptKind::Output),
                    Err(e) => d.command.push_error(&e),
                }
                d.command.busy = false;
                StateChange::TranscriptAppended
            });
            ((), change)
        });
    }

    /// Redraw only when the store broadcast something since the last frame.
    fn render_if_changed(&mut self) -> Result<()> {
        let mut dirty = false;
        loop {
            match self.changes.try_recv() {
                Ok(change) => {
                    trace!(?change, "state changed");
                    dirty = true;
                }
                Err(broadcast::error::TryRecvError::Lagged(_)) => dirty = true,
                Err(_) => break,
            }
        }
        if dirty {
            self.render()?;
        }
        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        // Anything queued is about to be drawn
        while self.changes.try_recv().is_ok() {}

        let state = self.state.read();
        self.terminal.draw(|frame| {
            Renderer::render(frame, &state);
        })?;
        Ok(())
    }

    #[cfg(test)]
    fn connect(&mut self) -> mpsc::UnboundedReceiver<Event> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.event_tx = tx;
        rx
    }
}
