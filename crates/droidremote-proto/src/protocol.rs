use serde::{Deserialize, Serialize};
use std::fmt;

/// Android audio stream whose volume can be set through `adb shell media volume`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum VolumeStream {
    #[default]
    Media,
    Call,
    Ring,
    Alarm,
    System,
}

impl VolumeStream {
    /// Selector order shown in the UI.
    pub const ALL: [VolumeStream; 5] = [
        VolumeStream::Media,
        VolumeStream::Call,
        VolumeStream::Ring,
        VolumeStream::Alarm,
        VolumeStream::System,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Media => "Media",
            Self::Call => "Call",
            Self::Ring => "Ring",
            Self::Alarm => "Alarm",
            Self::System => "System",
        }
    }

    /// `AudioManager.STREAM_*` constant passed as `--stream`.
    pub fn stream_id(self) -> u8 {
        match self {
            Self::Media => 3,
            Self::Call => 0,
            Self::Ring => 2,
            Self::Alarm => 4,
            Self::System => 1,
        }
    }

    /// Number of discrete volume steps the device exposes for this stream.
    pub fn steps(self) -> u32 {
        match self {
            Self::Media => 15,
            Self::Call | Self::Ring | Self::Alarm | Self::System => 7,
        }
    }

    /// `floor(percent / 100 * steps)`, with the percent clamped to 0..=100.
    /// NaN maps to level 0.
    pub fn level_for_percent(self, percent: f64) -> u32 {
        if percent.is_nan() {
            return 0;
        }
        let p = percent.clamp(0.0, 100.0);
        // Multiply first so integral percents stay exact.
        ((p * self.steps() as f64) / 100.0).floor() as u32
    }

    /// Level for free-form text input. Anything that is not a finite number
    /// is treated as 0.
    pub fn level_for_input(self, text: &str) -> u32 {
        self.level_for_percent(parse_percent(text))
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for VolumeStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Parse a percent typed by the user, clamped to 0..=100. Malformed or
/// non-finite input is 0.
pub fn parse_percent(text: &str) -> f64 {
    let trimmed = text.trim().trim_end_matches('%').trim();
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => v.clamp(0.0, 100.0),
        _ => 0.0,
    }
}

/// Media transport keys sent with `adb shell input keyevent`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TransportKey {
    PlayPause,
    Stop,
    Next,
    Previous,
}

impl TransportKey {
    /// Button order shown in the UI.
    pub const ALL: [TransportKey; 4] = [
        TransportKey::PlayPause,
        TransportKey::Stop,
        TransportKey::Next,
        TransportKey::Previous,
    ];

    /// Android `KEYCODE_MEDIA_*` value.
    pub fn keycode(self) -> u16 {
        match self {
            Self::PlayPause => 85,
            Self::Stop => 86,
            Self::Next => 87,
            Self::Previous => 88,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::PlayPause => "Play/Pause",
            Self::Stop => "Stop",
            Self::Next => "Next Track",
            Self::Previous => "Previous Track",
        }
    }
}

/// Target a command is serialized on. Commands sharing a lane run one at a
/// time in submission order; different lanes run concurrently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lane {
    Connect,
    Transport,
    Volume(VolumeStream),
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lane::Connect => f.write_str("connect"),
            Lane::Transport => f.write_str("transport"),
            Lane::Volume(s) => write!(f, "volume/{}", s.label().to_ascii_lowercase()),
        }
    }
}

/// One invocation of the bridge tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeCommand {
    Connect { address: String, port: u16 },
    KeyEvent(TransportKey),
    SetVolume { stream: VolumeStream, level: u32 },
}

impl BridgeCommand {
    /// Arguments passed to the bridge binary (binary name excluded).
    pub fn args(&self) -> Vec<String> {
        match self {
            Self::Connect { address, port } => {
                vec!["connect".to_string(), format!("{}:{}", address, port)]
            }
            Self::KeyEvent(key) => vec![
                "shell".to_string(),
                "input".to_string(),
                "keyevent".to_string(),
                key.keycode().to_string(),
            ],
            Self::SetVolume { stream, level } => vec![
                "shell".to_string(),
                "media".to_string(),
                "volume".to_string(),
                "--stream".to_string(),
                stream.stream_id().to_string(),
                "--set".to_string(),
                level.to_string(),
            ],
        }
    }

    pub fn lane(&self) -> Lane {
        match self {
            Self::Connect { .. } => Lane::Connect,
            Self::KeyEvent(_) => Lane::Transport,
            Self::SetVolume { stream, .. } => Lane::Volume(*stream),
        }
    }

    /// Human-readable summary for the log panel.
    pub fn describe(&self) -> String {
        match self {
            Self::Connect { address, port } => format!("connect {}:{}", address, port),
            Self::KeyEvent(key) => key.label().to_string(),
            Self::SetVolume { stream, level } => format!("Set {} volume to {}", stream, level),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_boundaries() {
        for stream in VolumeStream::ALL {
            assert_eq!(stream.level_for_percent(0.0), 0);
            assert_eq!(stream.level_for_percent(100.0), stream.steps());
        }
        assert_eq!(VolumeStream::Media.level_for_percent(50.0), 7);
        assert_eq!(VolumeStream::Ring.level_for_percent(50.0), 3);
    }

    #[test]
    fn level_is_exact_on_step_edges() {
        // 60% of 15 steps is exactly 9, not 8.999…
        assert_eq!(VolumeStream::Media.level_for_percent(60.0), 9);
        // 100/7 ≈ 14.28 → 14% is still level 0, 15% is level 1
        assert_eq!(VolumeStream::Alarm.level_for_percent(14.0), 0);
        assert_eq!(VolumeStream::Alarm.level_for_percent(15.0), 1);
    }

    #[test]
    fn level_clamps_out_of_range() {
        assert_eq!(VolumeStream::Media.level_for_percent(-20.0), 0);
        assert_eq!(VolumeStream::Media.level_for_percent(250.0), 15);
        assert_eq!(VolumeStream::Media.level_for_percent(f64::NAN), 0);
    }

    #[test]
    fn malformed_input_is_level_zero() {
        assert_eq!(VolumeStream::Media.level_for_input("loud"), 0);
        assert_eq!(VolumeStream::Media.level_for_input(""), 0);
        assert_eq!(VolumeStream::Media.level_for_input("inf"), 0);
        assert_eq!(VolumeStream::Media.level_for_input(" 80% "), 12);
        assert_eq!(VolumeStream::Media.level_for_input("33.4"), 5);
    }

    #[test]
    fn typed_percent_is_clamped() {
        assert_eq!(parse_percent("300"), 100.0);
        assert_eq!(parse_percent("-20%"), 0.0);
        assert_eq!(parse_percent("100"), 100.0);
        assert_eq!(parse_percent("42.5"), 42.5);
    }

    #[test]
    fn stream_ids_match_android_constants() {
        let ids: Vec<(VolumeStream, u8)> =
            VolumeStream::ALL.iter().map(|s| (*s, s.stream_id())).collect();
        assert_eq!(
            ids,
            vec![
                (VolumeStream::Media, 3),
                (VolumeStream::Call, 0),
                (VolumeStream::Ring, 2),
                (VolumeStream::Alarm, 4),
                (VolumeStream::System, 1),
            ]
        );
    }

    #[test]
    fn stream_cycling_wraps() {
        assert_eq!(VolumeStream::System.next(), VolumeStream::Media);
        assert_eq!(VolumeStream::Media.prev(), VolumeStream::System);
    }

    #[test]
    fn command_args() {
        let connect = BridgeCommand::Connect {
            address: "192.168.1.20".to_string(),
            port: 5555,
        };
        assert_eq!(connect.args(), vec!["connect", "192.168.1.20:5555"]);
        assert_eq!(connect.lane(), Lane::Connect);

        let key = BridgeCommand::KeyEvent(TransportKey::Next);
        assert_eq!(key.args(), vec!["shell", "input", "keyevent", "87"]);
        assert_eq!(key.lane(), Lane::Transport);

        let vol = BridgeCommand::SetVolume {
            stream: VolumeStream::Alarm,
            level: 5,
        };
        assert_eq!(
            vol.args(),
            vec!["shell", "media", "volume", "--stream", "4", "--set", "5"]
        );
        assert_eq!(vol.lane(), Lane::Volume(VolumeStream::Alarm));
        assert_eq!(vol.describe(), "Set Alarm volume to 5");
    }

    #[test]
    fn transport_keycodes() {
        let codes: Vec<u16> = TransportKey::ALL.iter().map(|k| k.keycode()).collect();
        assert_eq!(codes, vec![85, 86, 87, 88]);
    }
}
