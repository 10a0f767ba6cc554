//! AppState — shared read-only data passed to all components during render/event.
//!
//! Components read this for bridge state, but never mutate it.
//! The App event-loop is the only thing that writes to AppState.

use std::collections::VecDeque;
use std::path::PathBuf;

use droidremote_proto::protocol::VolumeStream;
use droidremote_proto::state::ConnectionState;

use crate::debounce::Phase;
use crate::widgets::status_bar::InputMode;
use crate::LogLine;

/// Scrollback kept for the log panel.
pub const MAX_LOG_LINES: usize = 500;

pub struct AppState {
    /// Last state broadcast by the bridge core.
    pub connection: ConnectionState,
    pub remember: bool,
    pub stream: VolumeStream,
    /// Slider position.
    pub volume_percent: u8,
    pub volume_phase: Phase,
    /// Last level the device confirmed for `stream`.
    pub applied_level: Option<u32>,
    pub input_mode: InputMode,
    pub logs: VecDeque<LogLine>,
    pub log_path: PathBuf,
}

impl AppState {
    pub fn new(address: String, remember: bool, stream: VolumeStream, log_path: PathBuf) -> Self {
        Self {
            connection: ConnectionState::new(address),
            remember,
            stream,
            volume_percent: 0,
            volume_phase: Phase::Idle,
            applied_level: None,
            input_mode: InputMode::Normal,
            logs: VecDeque::with_capacity(MAX_LOG_LINES),
            log_path,
        }
    }

    pub fn push_log(&mut self, line: LogLine) {
        if self.logs.len() >= MAX_LOG_LINES {
            self.logs.pop_front();
        }
        self.logs.push_back(line);
    }

    /// Level the slider currently points at.
    pub fn slider_level(&self) -> u32 {
        self.stream.level_for_percent(f64::from(self.volume_percent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_is_capped_oldest_first() {
        let mut state = AppState::new(String::new(), false, VolumeStream::Media, PathBuf::new());
        for i in 0..(MAX_LOG_LINES + 3) {
            state.push_log(LogLine::info(format!("line {i}")));
        }
        assert_eq!(state.logs.len(), MAX_LOG_LINES);
        assert_eq!(state.logs.front().unwrap().text, "line 3");
        assert_eq!(
            state.logs.back().unwrap().text,
            format!("line {}", MAX_LOG_LINES + 2)
        );
    }

    #[test]
    fn slider_level_follows_stream_steps() {
        let mut state = AppState::new(String::new(), false, VolumeStream::Media, PathBuf::new());
        state.volume_percent = 50;
        assert_eq!(state.slider_level(), 7);
        state.stream = VolumeStream::Alarm;
        assert_eq!(state.slider_level(), 3);
    }
}
