//! BridgeCore — single-owner event loop for connection state.
//!
//! The TUI sends `BridgeEvent` requests; lane workers report finished
//! commands back on a second channel.  Only this loop reads or writes
//! `ConnectionState` and the remembered-address file.  Every change is
//! broadcast as a `BroadcastMessage` so the UI never touches shared fields.

use std::sync::Arc;

use droidremote_proto::protocol::{BridgeCommand, TransportKey, VolumeStream};
use droidremote_proto::state::{ConnectionState, RememberedAddress};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::adb::CommandRunner;
use crate::scheduler::{CommandOutcome, CommandScheduler};
use crate::{BroadcastMessage, LogLine};

// ── BridgeEvent ───────────────────────────────────────────────────────────────

/// All inputs into the BridgeCore loop from the UI.
#[derive(Debug)]
pub enum BridgeEvent {
    /// Connect to `address` (verbatim) and apply the remember-me toggle.
    Connect { address: String, remember: bool },
    /// Send a media key.
    Transport(TransportKey),
    /// Set a stream to a discrete level.
    SetVolume { stream: VolumeStream, level: u32 },
    /// The UI is exiting.
    Shutdown,
}

// ── BridgeCore ────────────────────────────────────────────────────────────────

pub struct BridgeCore<R: CommandRunner> {
    state: ConnectionState,
    remembered: RememberedAddress,
    port: u16,
    scheduler: CommandScheduler<R>,
    /// Taken by `run()`.
    done_rx: Option<mpsc::Receiver<CommandOutcome>>,
    broadcast_tx: broadcast::Sender<BroadcastMessage>,
}

impl<R: CommandRunner> BridgeCore<R> {
    pub fn new(
        runner: Arc<R>,
        remembered: RememberedAddress,
        port: u16,
        address: String,
        broadcast_tx: broadcast::Sender<BroadcastMessage>,
    ) -> Self {
        let (done_tx, done_rx) = mpsc::channel::<CommandOutcome>(64);
        Self {
            state: ConnectionState::new(address),
            remembered,
            port,
            scheduler: CommandScheduler::new(runner, done_tx),
            done_rx: Some(done_rx),
            broadcast_tx,
        }
    }

    /// Run the core event loop.  Returns when a `Shutdown` event is received
    /// or the event channel is closed (TUI exited).
    pub async fn run(mut self, mut event_rx: mpsc::Receiver<BridgeEvent>) -> anyhow::Result<()> {
        let mut done_rx = self
            .done_rx
            .take()
            .ok_or_else(|| anyhow::anyhow!("BridgeCore is already running"))?;

        info!("BridgeCore: starting event loop");
        self.broadcast_state();

        loop {
            tokio::select! {
                evt = event_rx.recv() => match evt {
                    None => {
                        info!("BridgeCore: event channel closed, shutting down");
                        break;
                    }
                    Some(BridgeEvent::Shutdown) => {
                        info!("BridgeCore: shutdown requested");
                        break;
                    }
                    Some(evt) => self.handle_event(evt),
                },

                Some(outcome) = done_rx.recv() => self.handle_outcome(outcome),
            }
        }

        Ok(())
    }

    // ── request handlers ──────────────────────────────────────────────────────

    fn handle_event(&mut self, evt: BridgeEvent) {
        debug!("BridgeCore: event {:?}", evt);
        match evt {
            BridgeEvent::Connect { address, remember } => self.connect(address, remember),
            BridgeEvent::Transport(key) => self.transport(key),
            BridgeEvent::SetVolume { stream, level } => self.set_volume(stream, level),
            BridgeEvent::Shutdown => {}
        }
    }

    fn connect(&mut self, address: String, remember: bool) {
        info!("BridgeCore: connect to {} (remember={})", address, remember);

        if let Err(e) = self.remembered.apply(&address, remember) {
            warn!(
                "BridgeCore: could not update {}: {}",
                self.remembered.path().display(),
                e
            );
            self.log(LogLine::warn(format!(
                "Could not update remembered address: {}",
                e
            )));
        }

        self.state.address = address.clone();
        let command = BridgeCommand::Connect {
            address: address.clone(),
            port: self.port,
        };
        match self.scheduler.submit(command) {
            Ok(_) => {
                self.state.connecting += 1;
                self.broadcast_state();
            }
            Err(e) => {
                self.log(LogLine::error(format!("Connect not started: {}", e)));
                self.broadcast_state();
                let _ = self.broadcast_tx.send(BroadcastMessage::ConnectFinished {
                    address,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    fn transport(&mut self, key: TransportKey) {
        if !self.state.connected {
            debug!("BridgeCore: {} ignored, not connected", key.label());
            self.log(LogLine::warn(format!("{} ignored: not connected", key.label())));
            return;
        }
        if let Err(e) = self.scheduler.submit(BridgeCommand::KeyEvent(key)) {
            self.log(LogLine::error(format!("{} not sent: {}", key.label(), e)));
        }
    }

    fn set_volume(&mut self, stream: VolumeStream, level: u32) {
        if !self.state.connected {
            debug!("BridgeCore: {} volume ignored, not connected", stream);
            self.log(LogLine::warn(format!(
                "{} volume ignored: not connected",
                stream
            )));
            self.settle_volume(stream, level, false);
            return;
        }
        if let Err(e) = self
            .scheduler
            .submit(BridgeCommand::SetVolume { stream, level })
        {
            self.log(LogLine::error(format!("{} volume not sent: {}", stream, e)));
            self.settle_volume(stream, level, false);
        }
    }

    // ── completion handler ────────────────────────────────────────────────────

    fn handle_outcome(&mut self, outcome: CommandOutcome) {
        let CommandOutcome {
            id,
            command,
            result,
        } = outcome;
        debug!("BridgeCore: job #{} finished ok={}", id, result.is_ok());

        match command {
            BridgeCommand::Connect { address, .. } => {
                self.state.connecting = self.state.connecting.saturating_sub(1);
                let error = match result {
                    Ok(_) => {
                        info!("BridgeCore: connected to {}", address);
                        self.state.connected = true;
                        self.log(LogLine::info(format!("Connected to {}", address)));
                        None
                    }
                    Err(e) => {
                        warn!("BridgeCore: connect to {} failed: {}", address, e);
                        self.log(LogLine::error(format!("Connection failed: {}", e)));
                        Some(e.to_string())
                    }
                };
                self.broadcast_state();
                let _ = self
                    .broadcast_tx
                    .send(BroadcastMessage::ConnectFinished { address, error });
            }
            BridgeCommand::KeyEvent(key) => match result {
                Ok(_) => self.log(LogLine::info(key.label())),
                Err(e) => {
                    warn!("BridgeCore: {} failed: {}", key.label(), e);
                    self.log(LogLine::error(format!("{} failed: {}", key.label(), e)));
                }
            },
            BridgeCommand::SetVolume { stream, level } => {
                let applied = result.is_ok();
                match result {
                    Ok(_) => self.log(LogLine::info(format!(
                        "Set {} volume to {}",
                        stream, level
                    ))),
                    Err(e) => {
                        warn!("BridgeCore: set {} volume failed: {}", stream, e);
                        self.log(LogLine::error(format!(
                            "Set {} volume to {} failed: {}",
                            stream, level, e
                        )));
                    }
                }
                self.settle_volume(stream, level, applied);
            }
        }
    }

    // ── helpers ───────────────────────────────────────────────────────────────

    fn broadcast_state(&self) {
        let _ = self
            .broadcast_tx
            .send(BroadcastMessage::ConnectionChanged(self.state.clone()));
    }

    fn settle_volume(&self, stream: VolumeStream, level: u32, applied: bool) {
        let _ = self.broadcast_tx.send(BroadcastMessage::VolumeSettled {
            stream,
            level,
            applied,
        });
    }

    fn log(&self, line: LogLine) {
        let _ = self.broadcast_tx.send(BroadcastMessage::Log(line));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::tests::RecordingRunner;
    use crate::LogLevel;
    use std::time::Duration;

    struct Harness {
        event_tx: mpsc::Sender<BridgeEvent>,
        broadcast_rx: broadcast::Receiver<BroadcastMessage>,
        runner: Arc<RecordingRunner>,
        remembered: RememberedAddress,
        _dir: tempfile::TempDir,
    }

    fn start(runner: RecordingRunner) -> Harness {
        let dir = tempfile::tempdir().expect("tempdir");
        let remembered = RememberedAddress::new(dir.path().join("autoconnect.txt"));
        let runner = Arc::new(runner);
        let (broadcast_tx, broadcast_rx) = broadcast::channel(256);
        let (event_tx, event_rx) = mpsc::channel(16);
        let core = BridgeCore::new(
            Arc::clone(&runner),
            remembered.clone(),
            5555,
            String::new(),
            broadcast_tx,
        );
        tokio::spawn(core.run(event_rx));
        Harness {
            event_tx,
            broadcast_rx,
            runner,
            remembered,
            _dir: dir,
        }
    }

    async fn wait_for(
        rx: &mut broadcast::Receiver<BroadcastMessage>,
        pred: impl Fn(&BroadcastMessage) -> bool,
    ) -> BroadcastMessage {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                match rx.recv().await {
                    Ok(msg) if pred(&msg) => return msg,
                    Ok(_) => continue,
                    Err(e) => panic!("broadcast closed: {e}"),
                }
            }
        })
        .await
        .expect("timed out waiting for broadcast")
    }

    fn is_connected(msg: &BroadcastMessage) -> bool {
        matches!(msg, BroadcastMessage::ConnectionChanged(s) if s.connected)
    }

    fn log_contains(level: LogLevel, needle: &'static str) -> impl Fn(&BroadcastMessage) -> bool {
        move |msg| matches!(msg, BroadcastMessage::Log(l) if l.level == level && l.text.contains(needle))
    }

    async fn connect(h: &mut Harness, address: &str, remember: bool) {
        h.event_tx
            .send(BridgeEvent::Connect {
                address: address.to_string(),
                remember,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn transport_is_ignored_while_disconnected() {
        let mut h = start(RecordingRunner::ok());

        h.event_tx
            .send(BridgeEvent::Transport(TransportKey::PlayPause))
            .await
            .unwrap();
        wait_for(&mut h.broadcast_rx, log_contains(LogLevel::Warn, "not connected")).await;

        assert!(h.runner.calls().is_empty());
    }

    #[tokio::test]
    async fn connect_then_transport_reaches_adb() {
        let mut h = start(RecordingRunner::ok());

        connect(&mut h, "10.0.0.5", false).await;
        wait_for(&mut h.broadcast_rx, is_connected).await;

        h.event_tx
            .send(BridgeEvent::Transport(TransportKey::Next))
            .await
            .unwrap();
        wait_for(&mut h.broadcast_rx, log_contains(LogLevel::Info, "Next Track")).await;

        assert_eq!(
            h.runner.calls(),
            vec![
                BridgeCommand::Connect {
                    address: "10.0.0.5".to_string(),
                    port: 5555
                },
                BridgeCommand::KeyEvent(TransportKey::Next),
            ]
        );
    }

    #[tokio::test]
    async fn remember_toggle_persists_and_clears_address() {
        let mut h = start(RecordingRunner::ok());

        connect(&mut h, "192.168.1.30", true).await;
        wait_for(&mut h.broadcast_rx, is_connected).await;
        assert_eq!(h.remembered.load().as_deref(), Some("192.168.1.30"));

        connect(&mut h, "192.168.1.30", false).await;
        wait_for(&mut h.broadcast_rx, |m| {
            matches!(m, BroadcastMessage::ConnectionChanged(s) if s.connected && !s.is_connecting())
        })
        .await;
        assert_eq!(h.remembered.load(), None);
    }

    #[tokio::test]
    async fn failed_connect_leaves_device_disconnected() {
        let mut h = start(RecordingRunner::with(|cmd| match cmd {
            BridgeCommand::Connect { .. } => (
                Duration::ZERO,
                Err("failed to connect to '10.9.9.9:5555'".to_string()),
            ),
            _ => (Duration::ZERO, Ok(())),
        }));

        connect(&mut h, "10.9.9.9", false).await;
        wait_for(
            &mut h.broadcast_rx,
            log_contains(LogLevel::Error, "Connection failed"),
        )
        .await;
        let state = wait_for(&mut h.broadcast_rx, |m| {
            matches!(m, BroadcastMessage::ConnectionChanged(_))
        })
        .await;
        match state {
            BroadcastMessage::ConnectionChanged(s) => {
                assert!(!s.connected);
                assert_eq!(s.connecting, 0);
                assert_eq!(s.address, "10.9.9.9");
            }
            _ => unreachable!(),
        }

        // Still disconnected, so transport keys stay local.
        h.event_tx
            .send(BridgeEvent::Transport(TransportKey::Stop))
            .await
            .unwrap();
        wait_for(&mut h.broadcast_rx, log_contains(LogLevel::Warn, "not connected")).await;
        assert_eq!(h.runner.calls().len(), 1);
    }

    #[tokio::test]
    async fn volume_results_report_applied_flag() {
        let mut h = start(RecordingRunner::with(|cmd| match cmd {
            BridgeCommand::SetVolume { level: 3, .. } => {
                (Duration::ZERO, Err("error: closed".to_string()))
            }
            _ => (Duration::ZERO, Ok(())),
        }));

        connect(&mut h, "10.0.0.5", false).await;
        wait_for(&mut h.broadcast_rx, is_connected).await;

        for level in [7, 3] {
            h.event_tx
                .send(BridgeEvent::SetVolume {
                    stream: VolumeStream::Media,
                    level,
                })
                .await
                .unwrap();
        }

        let settled = |want: u32| {
            move |m: &BroadcastMessage| {
                matches!(m, BroadcastMessage::VolumeSettled { level, .. } if *level == want)
            }
        };
        match wait_for(&mut h.broadcast_rx, settled(7)).await {
            BroadcastMessage::VolumeSettled { applied, .. } => assert!(applied),
            _ => unreachable!(),
        }
        match wait_for(&mut h.broadcast_rx, settled(3)).await {
            BroadcastMessage::VolumeSettled { applied, .. } => assert!(!applied),
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn volume_while_disconnected_is_settled_unapplied() {
        let mut h = start(RecordingRunner::ok());

        h.event_tx
            .send(BridgeEvent::SetVolume {
                stream: VolumeStream::Ring,
                level: 5,
            })
            .await
            .unwrap();
        let msg = wait_for(&mut h.broadcast_rx, |m| {
            matches!(m, BroadcastMessage::VolumeSettled { .. })
        })
        .await;
        assert!(matches!(
            msg,
            BroadcastMessage::VolumeSettled {
                stream: VolumeStream::Ring,
                level: 5,
                applied: false
            }
        ));
        assert!(h.runner.calls().is_empty());
    }
}
