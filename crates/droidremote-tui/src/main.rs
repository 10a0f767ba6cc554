mod action;
mod adb;
mod app;
mod app_state;
mod component;
mod components;
mod core;
mod debounce;
mod focus;
mod scheduler;
mod theme;
mod widgets;

use std::sync::Arc;

use droidremote_proto::config::Config;
use droidremote_proto::protocol::VolumeStream;
use droidremote_proto::state::{ConnectionState, RememberedAddress, PLACEHOLDER_ADDRESS};
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};

/// What the BridgeCore broadcasts to the UI.
#[derive(Debug, Clone)]
pub enum BroadcastMessage {
    /// Connection bookkeeping changed (address, connected flag, attempts in flight).
    ConnectionChanged(ConnectionState),
    /// One connect attempt finished; `error` holds the failure reason.
    ConnectFinished {
        address: String,
        error: Option<String>,
    },
    /// A set-volume command finished; `applied` is false when it failed or
    /// was never sent.
    VolumeSettled {
        stream: VolumeStream,
        level: u32,
        applied: bool,
    },
    /// A line for the scrollback log panel.
    Log(LogLine),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// User-facing log entry (separate from the tracing file log).
#[derive(Debug, Clone)]
pub struct LogLine {
    pub at: chrono::DateTime<chrono::Local>,
    pub level: LogLevel,
    pub text: String,
}

impl LogLine {
    pub fn new(level: LogLevel, text: impl Into<String>) -> Self {
        Self {
            at: chrono::Local::now(),
            level,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, text)
    }

    pub fn warn(text: impl Into<String>) -> Self {
        Self::new(LogLevel::Warn, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, text)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = droidremote_proto::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;

    let log_path = data_dir.join("droidremote.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    // Print log path to stderr so the operator can tail it immediately.
    eprintln!("droidremote log: {}", log_path.display());

    info!("droidremote starting…");

    // ── Load config ──────────────────────────────────────────────────────────
    let config = Config::load().unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {}", e);
        Config::default()
    });

    let remembered = RememberedAddress::new(config.paths.remembered_address.clone());
    let saved_address = remembered.load();
    if let Some(addr) = &saved_address {
        info!("Remembered address: {}", addr);
    }

    let adb = config.bridge.adb_binary();
    info!("Using adb binary: {}", adb.display());
    let runner = Arc::new(adb::AdbRunner::new(adb, config.bridge.command_timeout()));

    // ── Broadcast channel (BridgeCore → TUI) ────────────────────────────────
    let (broadcast_tx, broadcast_rx) = broadcast::channel::<BroadcastMessage>(1024);

    // ── BridgeEvent channel (TUI → BridgeCore) ──────────────────────────────
    let (event_tx, event_rx) = mpsc::channel::<core::BridgeEvent>(256);

    let initial_address = saved_address
        .clone()
        .unwrap_or_else(|| PLACEHOLDER_ADDRESS.to_string());
    let bridge_core = core::BridgeCore::new(
        runner,
        remembered,
        config.bridge.port,
        initial_address.clone(),
        broadcast_tx,
    );

    tokio::spawn(async move {
        if let Err(e) = bridge_core.run(event_rx).await {
            error!("BridgeCore exited with error: {}", e);
        }
    });

    // ── Run TUI ──────────────────────────────────────────────────────────────
    let app = app::App::new(
        initial_address,
        saved_address.is_some(),
        config.volume.default_stream,
        config.volume.debounce(),
        log_path,
        event_tx,
    );
    app.run(broadcast_rx).await?;

    Ok(())
}
