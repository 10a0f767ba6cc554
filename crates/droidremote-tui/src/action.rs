//! Action enum — all user-initiated intents flowing from components to the App.

use droidremote_proto::protocol::{TransportKey, VolumeStream};

/// Unique identifier for a focusable component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentId {
    ConnectBar,
    VolumePanel,
    TransportPanel,
    LogPanel,
}

/// All actions that can flow through the system.
/// Components produce Actions; the App dispatches them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // ── Device ───────────────────────────────────────────────────────────────
    Connect(String), // address exactly as typed
    /// Ask the connect bar to connect with whatever its field holds.
    ConnectRequested,
    ToggleRemember,

    // ── Volume ───────────────────────────────────────────────────────────────
    SetVolume(u8), // slider percent 0..=100
    NudgeVolume(i16),
    SelectStream(VolumeStream),
    /// Typed percent; malformed text counts as 0.
    VolumeEntry(String),

    // ── Transport ────────────────────────────────────────────────────────────
    Transport(TransportKey),

    // ── Navigation ───────────────────────────────────────────────────────────
    FocusNext,
    FocusPrev,
    FocusPane(ComponentId),

    // ── Text entry ───────────────────────────────────────────────────────────
    EditAddress,
    OpenVolumeEntry,
    BeginEdit,
    EndEdit,

    // ── System ───────────────────────────────────────────────────────────────
    Quit,
}
