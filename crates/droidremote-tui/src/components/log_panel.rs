//! LogPanel — scrollback of command results.
//!
//! Newest entries are at the bottom.  The view follows new lines while it is
//! scrolled to the end and stays put once the user scrolls up.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, MouseEvent, MouseEventKind};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{C_MUTED, C_PRIMARY, C_TOAST_ERROR, C_TOAST_WARNING},
    widgets::pane_chrome::pane_chrome,
    LogLevel, LogLine,
};

pub struct LogPanel {
    /// Index of the first visible line; `usize::MAX` means "pinned to bottom".
    scroll: usize,
    last_log_count: usize,
}

impl LogPanel {
    pub fn new() -> Self {
        Self {
            scroll: usize::MAX,
            last_log_count: 0,
        }
    }
}

impl Default for LogPanel {
    fn default() -> Self {
        Self::new()
    }
}

fn level_tag(level: LogLevel) -> (&'static str, Style) {
    match level {
        LogLevel::Info => ("INFO ", Style::default().fg(C_MUTED)),
        LogLevel::Warn => ("WARN ", Style::default().fg(C_TOAST_WARNING)),
        LogLevel::Error => ("ERROR", Style::default().fg(C_TOAST_ERROR)),
    }
}

/// "HH:MM:SS LEVEL text" as plain text.
pub fn format_log_line(line: &LogLine) -> String {
    let (tag, _) = level_tag(line.level);
    format!("{} {} {}", line.at.format("%H:%M:%S"), tag.trim_end(), line.text)
}

fn styled_log_line(line: &LogLine) -> Line<'_> {
    let (tag, tag_style) = level_tag(line.level);
    let text_style = match line.level {
        LogLevel::Info => Style::default().fg(C_PRIMARY),
        _ => tag_style,
    };
    Line::from(vec![
        Span::styled(
            format!(" {} ", line.at.format("%H:%M:%S")),
            Style::default().fg(C_MUTED),
        ),
        Span::styled(tag, tag_style),
        Span::raw(" "),
        Span::styled(line.text.as_str(), text_style),
    ])
}

impl Component for LogPanel {
    fn id(&self) -> ComponentId {
        ComponentId::LogPanel
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        let max = state.logs.len().saturating_sub(1);
        let from = self.scroll.min(max);
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.scroll = from.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => self.scroll = from + 1,
            KeyCode::PageUp => self.scroll = from.saturating_sub(10),
            KeyCode::PageDown => self.scroll = from + 10,
            KeyCode::Home | KeyCode::Char('g') => self.scroll = 0,
            KeyCode::End | KeyCode::Char('G') => self.scroll = usize::MAX,
            _ => {}
        }
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, state: &AppState) -> Vec<Action> {
        let from = self.scroll.min(state.logs.len().saturating_sub(1));
        match event.kind {
            MouseEventKind::ScrollUp => self.scroll = from.saturating_sub(3),
            MouseEventKind::ScrollDown => self.scroll = from + 3,
            _ => {}
        }
        vec![]
    }

    fn on_action(&mut self, _action: &Action, _state: &AppState) -> Vec<Action> {
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let block = pane_chrome("log", Some('4'), focused, None);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.height == 0 {
            return;
        }

        let logs = &state.logs;
        let height = inner.height as usize;
        let log_count = logs.len();
        let max_scroll = log_count.saturating_sub(height);

        // Follow new entries when the view was at (or next to) the bottom.
        if log_count != self.last_log_count {
            if self.scroll >= max_scroll.saturating_sub(1) {
                self.scroll = usize::MAX;
            }
            self.last_log_count = log_count;
        }

        if logs.is_empty() {
            frame.render_widget(
                Paragraph::new(vec![
                    Line::from(Span::styled("  no log entries yet", Style::default().fg(C_MUTED))),
                    Line::from(Span::styled(
                        format!("  debug log: {}", state.log_path.display()),
                        Style::default().fg(C_MUTED),
                    )),
                ]),
                inner,
            );
            return;
        }

        let top = self.scroll.min(max_scroll);
        if self.scroll != usize::MAX {
            self.scroll = top;
        }

        let lines: Vec<Line> = logs.iter().skip(top).take(height).map(styled_log_line).collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> chrono::DateTime<chrono::Local> {
        chrono::Local
            .with_ymd_and_hms(2024, 5, 1, h, m, s)
            .single()
            .unwrap()
    }

    #[test]
    fn formats_time_level_and_text() {
        let line = LogLine {
            at: at(9, 5, 7),
            level: LogLevel::Info,
            text: "Set Media volume to 7".to_string(),
        };
        assert_eq!(format_log_line(&line), "09:05:07 INFO Set Media volume to 7");
    }

    #[test]
    fn error_lines_carry_their_level() {
        let line = LogLine {
            at: at(23, 59, 0),
            level: LogLevel::Error,
            text: "Connection failed: timed out after 10s".to_string(),
        };
        assert_eq!(
            format_log_line(&line),
            "23:59:00 ERROR Connection failed: timed out after 10s"
        );
    }
}
