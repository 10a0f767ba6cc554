//! App — component-based event loop for the remote panel.
//!
//! Architecture:
//! - `App` owns all components, `AppState`, and the volume debouncer.
//! - A `tokio::mpsc` channel carries `AppMessage` events in from the terminal
//!   reader and the bridge-core broadcast forwarder.
//! - The loop draws, then waits on messages, the UI tick, and the debounce
//!   deadline, whichever comes first.
//! - Components return `Vec<Action>`; App dispatches each Action.
//! - Requests to the bridge core go out through `bridge_tx`.

use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use ratatui::crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    Terminal,
};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use droidremote_proto::protocol::{parse_percent, TransportKey, VolumeStream};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    components::{
        connect_bar::ConnectBar, hit, log_panel::format_log_line, log_panel::LogPanel,
        transport_panel::TransportPanel, volume_panel::VolumePanel,
    },
    core::BridgeEvent,
    debounce::{Expiry, VolumeDebouncer},
    focus::FocusRing,
    widgets::{
        status_bar::{draw_keys_bar, InputMode},
        toast::{Severity, ToastManager},
    },
    BroadcastMessage, LogLine,
};

/// Slider step for the global +/- keys.
const VOLUME_KEY_STEP: i16 = 5;

enum AppMessage {
    Event(Event),
    Bridge(BroadcastMessage),
    /// The broadcast receiver fell behind; some bridge messages were lost.
    BridgeLagged(u64),
}

/// Where each pane was drawn last frame, for mouse hit-testing.
#[derive(Default, Clone, Copy)]
struct PaneAreas {
    connect_bar: Rect,
    volume: Rect,
    transport: Rect,
    log: Rect,
}

pub struct App {
    state: AppState,
    focus: FocusRing,
    connect_bar: ConnectBar,
    volume_panel: VolumePanel,
    transport_panel: TransportPanel,
    log_panel: LogPanel,
    toast: ToastManager,
    debouncer: VolumeDebouncer,
    bridge_tx: mpsc::Sender<BridgeEvent>,
    pane_areas: PaneAreas,
    /// Connect once at startup (an address was remembered).
    autoconnect: bool,
    should_quit: bool,
}

impl App {
    pub fn new(
        address: String,
        remember: bool,
        stream: VolumeStream,
        debounce: Duration,
        log_path: PathBuf,
        bridge_tx: mpsc::Sender<BridgeEvent>,
    ) -> Self {
        Self {
            state: AppState::new(address.clone(), remember, stream, log_path),
            focus: FocusRing::new(vec![
                ComponentId::ConnectBar,
                ComponentId::VolumePanel,
                ComponentId::TransportPanel,
                ComponentId::LogPanel,
            ]),
            connect_bar: ConnectBar::new(address),
            volume_panel: VolumePanel::new(),
            transport_panel: TransportPanel::new(),
            log_panel: LogPanel::new(),
            toast: ToastManager::new(),
            debouncer: VolumeDebouncer::new(stream, debounce),
            bridge_tx,
            pane_areas: PaneAreas::default(),
            autoconnect: remember,
            should_quit: false,
        }
    }

    // ── Main run loop ─────────────────────────────────────────────────────────

    pub async fn run(
        mut self,
        mut broadcast_rx: broadcast::Receiver<BroadcastMessage>,
    ) -> anyhow::Result<()> {
        debug!("run(): enabling raw mode");
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("run(): terminal created, size={:?}", terminal.size());

        let (tx, mut rx) = mpsc::channel::<AppMessage>(1024);

        // ── Background task: keyboard/mouse events ────────────────────────────
        let event_tx = tx.clone();
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if event_tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        // ── Background task: broadcast receiver (BridgeCore → AppMessage) ─────
        let bc_tx = tx.clone();
        tokio::spawn(async move {
            loop {
                match broadcast_rx.recv().await {
                    Ok(msg) => {
                        if bc_tx.send(AppMessage::Bridge(msg)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("broadcast receiver lagged by {} messages", n);
                        if bc_tx.send(AppMessage::BridgeLagged(n)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        self.state.push_log(LogLine::info("droidremote started"));
        if self.autoconnect {
            let address = self.connect_bar.address().to_string();
            info!("autoconnect to remembered address {}", address);
            self.dispatch(Action::Connect(address)).await;
        }

        // Toast expiry + spinner animation.
        let mut ui_tick = tokio::time::interval(Duration::from_millis(100));
        ui_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // ── Main loop ─────────────────────────────────────────────────────────
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal.draw(|f| self.draw(f))?;
            }
            needs_redraw = false;

            if self.should_quit {
                break;
            }

            let deadline = self.debouncer.deadline();
            tokio::select! {
                Some(msg) = rx.recv() => {
                    needs_redraw = self.handle_message(msg).await;
                    // Drain a burst (mouse drags) before redrawing.
                    while let Ok(next) = rx.try_recv() {
                        needs_redraw |= self.handle_message(next).await;
                    }
                }

                _ = wait_for(deadline) => {
                    self.fire_volume().await;
                    needs_redraw = true;
                }

                _ = ui_tick.tick() => {
                    let tick_actions: Vec<Action> = {
                        let s = &self.state;
                        let mut all = Vec::new();
                        all.extend(self.connect_bar.tick(s));
                        all.extend(self.volume_panel.tick(s));
                        all.extend(self.transport_panel.tick(s));
                        all.extend(self.log_panel.tick(s));
                        all
                    };
                    for action in tick_actions {
                        self.dispatch(action).await;
                    }
                    if !self.toast.is_empty() {
                        self.toast.tick();
                        needs_redraw = true;
                    }
                }
            }
        }

        // ── Teardown ──────────────────────────────────────────────────────────
        self.send(BridgeEvent::Shutdown).await;
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;
        info!("droidremote exiting");

        Ok(())
    }

    // ── Message handling ──────────────────────────────────────────────────────

    /// Returns whether a redraw is needed.
    async fn handle_message(&mut self, msg: AppMessage) -> bool {
        match msg {
            AppMessage::Event(Event::Key(key)) => {
                if key.kind == KeyEventKind::Release {
                    return false;
                }
                for action in self.handle_key(key) {
                    self.dispatch(action).await;
                }
                true
            }
            AppMessage::Event(Event::Mouse(mouse)) => {
                let actions = self.handle_mouse(mouse);
                let redraw = !actions.is_empty()
                    || !matches!(mouse.kind, MouseEventKind::Moved);
                for action in actions {
                    self.dispatch(action).await;
                }
                redraw
            }
            AppMessage::Event(Event::Resize(..)) => true,
            AppMessage::Event(_) => false,
            AppMessage::Bridge(msg) => {
                self.on_bridge_message(msg);
                true
            }
            AppMessage::BridgeLagged(n) => {
                // Lost completions would leave volume commands looking in flight.
                self.debouncer.forget_in_flight();
                self.sync_volume_state();
                self.state.push_log(LogLine::warn(format!(
                    "Missed {} bridge updates; volume state reset",
                    n
                )));
                true
            }
        }
    }

    fn on_bridge_message(&mut self, msg: BroadcastMessage) {
        match msg {
            BroadcastMessage::ConnectionChanged(conn) => {
                self.state.connection = conn;
            }
            BroadcastMessage::ConnectFinished { address, error } => match error {
                None => self
                    .toast
                    .resolve(Severity::Success, format!("Connected to {}", address)),
                Some(e) => self
                    .toast
                    .resolve(Severity::Error, format!("Connection failed: {}", e)),
            },
            BroadcastMessage::VolumeSettled {
                stream,
                level,
                applied,
            } => {
                self.debouncer.settle(stream, level, applied);
                self.sync_volume_state();
            }
            BroadcastMessage::Log(line) => {
                debug!("panel: {}", format_log_line(&line));
                self.state.push_log(line);
            }
        }
    }

    // ── Input → actions ───────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return vec![Action::Quit];
        }

        // Tab / Shift-Tab always cycle focus; leaving a field restores its
        // value from before the edit.
        let editing = self.state.input_mode == InputMode::Editing;
        match key.code {
            KeyCode::Tab if editing => return vec![Action::EndEdit, Action::FocusNext],
            KeyCode::BackTab if editing => return vec![Action::EndEdit, Action::FocusPrev],
            KeyCode::Tab => return vec![Action::FocusNext],
            KeyCode::BackTab => return vec![Action::FocusPrev],
            _ => {}
        }

        // Global keys (Normal mode only)
        if !editing {
            let stream = self.state.stream;
            match key.code {
                KeyCode::Char('q') => return vec![Action::Quit],
                KeyCode::Char(' ') => return vec![Action::Transport(TransportKey::PlayPause)],
                KeyCode::Char('s') => return vec![Action::Transport(TransportKey::Stop)],
                KeyCode::Char('n') => return vec![Action::Transport(TransportKey::Next)],
                KeyCode::Char('p') => return vec![Action::Transport(TransportKey::Previous)],
                KeyCode::Char('c') => return vec![Action::ConnectRequested],
                KeyCode::Char('r') => return vec![Action::ToggleRemember],
                KeyCode::Char('e') => {
                    return vec![Action::FocusPane(ComponentId::ConnectBar), Action::EditAddress]
                }
                KeyCode::Char('=') => {
                    return vec![
                        Action::FocusPane(ComponentId::VolumePanel),
                        Action::OpenVolumeEntry,
                    ]
                }
                KeyCode::Char('[') => return vec![Action::SelectStream(stream.prev())],
                KeyCode::Char(']') => return vec![Action::SelectStream(stream.next())],
                KeyCode::Char('+') => return vec![Action::NudgeVolume(VOLUME_KEY_STEP)],
                KeyCode::Char('-') => return vec![Action::NudgeVolume(-VOLUME_KEY_STEP)],
                KeyCode::Char(c @ '1'..='4') => {
                    let pos = c as usize - '1' as usize;
                    if let Some(id) = self.focus.set_by_position(pos) {
                        return vec![Action::FocusPane(id)];
                    }
                    return vec![];
                }
                _ => {}
            }
        }

        // Route to the focused component.
        let s = &self.state;
        match self.focus.current() {
            Some(ComponentId::ConnectBar) => self.connect_bar.handle_key(key, s),
            Some(ComponentId::VolumePanel) => self.volume_panel.handle_key(key, s),
            Some(ComponentId::TransportPanel) => self.transport_panel.handle_key(key, s),
            Some(ComponentId::LogPanel) => self.log_panel.handle_key(key, s),
            None => vec![],
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent) -> Vec<Action> {
        let areas = self.pane_areas;
        let s = &self.state;

        // A slider drag owns the mouse until the button comes up.
        if self.volume_panel.is_dragging()
            && matches!(event.kind, MouseEventKind::Drag(_) | MouseEventKind::Up(_))
        {
            return self.volume_panel.handle_mouse(event, areas.volume, s);
        }
        if !matches!(
            event.kind,
            MouseEventKind::Down(_) | MouseEventKind::ScrollUp | MouseEventKind::ScrollDown
        ) {
            return vec![];
        }

        let (col, row) = (event.column, event.row);
        let (id, mut actions) = if hit(areas.connect_bar, col, row) {
            (
                self.connect_bar.id(),
                self.connect_bar.handle_mouse(event, areas.connect_bar, s),
            )
        } else if hit(areas.volume, col, row) {
            (
                self.volume_panel.id(),
                self.volume_panel.handle_mouse(event, areas.volume, s),
            )
        } else if hit(areas.transport, col, row) {
            (
                self.transport_panel.id(),
                self.transport_panel.handle_mouse(event, areas.transport, s),
            )
        } else if hit(areas.log, col, row) {
            (
                self.log_panel.id(),
                self.log_panel.handle_mouse(event, areas.log, s),
            )
        } else {
            return vec![];
        };

        // Focus follows clicks.
        if matches!(event.kind, MouseEventKind::Down(_)) && !self.focus.is_focused(id) {
            actions.insert(0, Action::FocusPane(id));
        }
        actions
    }

    // ── Action dispatcher ─────────────────────────────────────────────────────

    async fn dispatch(&mut self, action: Action) {
        // Components see every action first (field activation, drag reset).
        let secondary: Vec<Action> = {
            let s = &self.state;
            let mut out = Vec::new();
            out.extend(self.connect_bar.on_action(&action, s));
            out.extend(self.volume_panel.on_action(&action, s));
            out.extend(self.transport_panel.on_action(&action, s));
            out.extend(self.log_panel.on_action(&action, s));
            out
        };

        self.apply_action(action).await;

        for a in secondary {
            self.apply_action(a).await;
        }
    }

    async fn apply_action(&mut self, action: Action) {
        match action {
            Action::Connect(address) => {
                self.toast.spinner(format!("Connecting to {}…", address));
                self.send(BridgeEvent::Connect {
                    address,
                    remember: self.state.remember,
                })
                .await;
            }
            Action::ToggleRemember => {
                self.state.remember = !self.state.remember;
                debug!("remember toggled: {}", self.state.remember);
            }
            Action::SetVolume(percent) => self.move_slider(percent),
            Action::NudgeVolume(delta) => {
                let percent = (i16::from(self.state.volume_percent) + delta).clamp(0, 100);
                self.move_slider(percent as u8);
            }
            Action::SelectStream(stream) => {
                if stream != self.state.stream {
                    self.debouncer.select_stream(stream);
                    self.state.stream = stream;
                    self.state.volume_percent = 0;
                    self.sync_volume_state();
                }
            }
            Action::VolumeEntry(text) => {
                let percent = parse_percent(&text);
                debug!("typed volume {:?} -> {}%", text, percent);
                self.state.volume_percent = percent.round() as u8;
                self.debouncer.set_percent(percent, Instant::now());
                self.sync_volume_state();
            }
            Action::Transport(key) => {
                if !self.state.connection.connected {
                    self.toast.warning("Not connected");
                }
                self.send(BridgeEvent::Transport(key)).await;
            }
            Action::FocusNext => {
                self.focus.next();
            }
            Action::FocusPrev => {
                self.focus.prev();
            }
            Action::FocusPane(id) => self.focus.set(id),
            Action::BeginEdit => self.state.input_mode = InputMode::Editing,
            Action::EndEdit => self.state.input_mode = InputMode::Normal,
            Action::Quit => self.should_quit = true,
            // Handled by components in `dispatch`.
            Action::ConnectRequested | Action::EditAddress | Action::OpenVolumeEntry => {}
        }
    }

    // ── Volume helpers ────────────────────────────────────────────────────────

    fn move_slider(&mut self, percent: u8) {
        let percent = percent.min(100);
        self.state.volume_percent = percent;
        self.debouncer
            .set_percent(f64::from(percent), Instant::now());
        self.sync_volume_state();
    }

    async fn fire_volume(&mut self) {
        match self
            .debouncer
            .fire(Instant::now(), self.state.connection.connected)
        {
            Expiry::NotDue => {}
            Expiry::Dispatch(d) => {
                debug!("volume: dispatch {} level {}", d.stream, d.level);
                self.send(BridgeEvent::SetVolume {
                    stream: d.stream,
                    level: d.level,
                })
                .await;
            }
            Expiry::Unchanged(d) => {
                debug!("volume: {} already at level {}, skipped", d.stream, d.level);
            }
            Expiry::Offline => {
                self.state
                    .push_log(LogLine::warn("Volume not sent: not connected"));
            }
        }
        self.sync_volume_state();
    }

    fn sync_volume_state(&mut self) {
        self.state.volume_phase = self.debouncer.phase();
        self.state.applied_level = self.debouncer.last_level(self.state.stream);
    }

    async fn send(&self, event: BridgeEvent) {
        if self.bridge_tx.send(event).await.is_err() {
            warn!("bridge core is gone; request dropped");
        }
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut ratatui::Frame) {
        let area = frame.area();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(5),
                Constraint::Length(3),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .split(area);

        self.pane_areas = PaneAreas {
            connect_bar: rows[0],
            volume: rows[1],
            transport: rows[2],
            log: rows[3],
        };

        let s = &self.state;
        let f = &self.focus;
        self.connect_bar
            .draw(frame, rows[0], f.is_focused(ComponentId::ConnectBar), s);
        self.volume_panel
            .draw(frame, rows[1], f.is_focused(ComponentId::VolumePanel), s);
        self.transport_panel
            .draw(frame, rows[2], f.is_focused(ComponentId::TransportPanel), s);
        self.log_panel
            .draw(frame, rows[3], f.is_focused(ComponentId::LogPanel), s);
        draw_keys_bar(frame, rows[4], s.input_mode, &s.connection);

        self.toast.draw(frame, area);
    }
}

/// Resolve at `deadline`, or never when there is none.
async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(d) => tokio::time::sleep_until(tokio::time::Instant::from_std(d)).await,
        None => std::future::pending::<()>().await,
    }
}
