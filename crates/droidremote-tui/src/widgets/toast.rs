//! Toasts — transient notices in the top-right corner.
//!
//! A connect attempt shows a spinner until the core reports the result; the
//! result then replaces it as an expiring toast.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};

use crate::theme::{C_TOAST_ERROR, C_TOAST_INFO, C_TOAST_SUCCESS, C_TOAST_WARNING};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Warning,
    Error,
}

impl Severity {
    fn color(self) -> Color {
        match self {
            Self::Success => C_TOAST_SUCCESS,
            Self::Warning => C_TOAST_WARNING,
            Self::Error => C_TOAST_ERROR,
        }
    }

    fn icon(self) -> &'static str {
        match self {
            Self::Success => "✓",
            Self::Warning => "!",
            Self::Error => "✗",
        }
    }

    fn lifetime(self) -> Duration {
        match self {
            Self::Success => Duration::from_secs(3),
            Self::Warning => Duration::from_secs(4),
            Self::Error => Duration::from_secs(6),
        }
    }
}

struct Toast {
    message: String,
    severity: Severity,
    expires: Instant,
}

const SPINNER_FRAMES: &[&str] = &["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];
const MAX_VISIBLE: usize = 4;

#[derive(Default)]
pub struct ToastManager {
    toasts: VecDeque<Toast>,
    /// Message and animation frame of the running spinner.
    spinner: Option<(String, usize)>,
}

impl ToastManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>, severity: Severity) {
        let message = message.into();
        self.toasts.retain(|t| t.message != message);
        self.toasts.push_back(Toast {
            message,
            severity,
            expires: Instant::now() + severity.lifetime(),
        });
        while self.toasts.len() > MAX_VISIBLE * 2 {
            self.toasts.pop_front();
        }
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(message, Severity::Warning);
    }

    /// Start (or replace) the spinner. It stays until `resolve`.
    pub fn spinner(&mut self, message: impl Into<String>) {
        self.spinner = Some((message.into(), 0));
    }

    pub fn resolve(&mut self, severity: Severity, message: impl Into<String>) {
        self.spinner = None;
        self.push(message, severity);
    }

    /// Drop expired toasts and advance the spinner. Call every ~100ms.
    pub fn tick(&mut self) {
        let now = Instant::now();
        self.toasts.retain(|t| t.expires > now);
        if let Some((_, frame)) = self.spinner.as_mut() {
            *frame = (*frame + 1) % SPINNER_FRAMES.len();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty() && self.spinner.is_none()
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        if self.is_empty() || area.height < 2 {
            return;
        }
        let max_width = (area.width / 2).clamp(30, 60);
        let bottom = area.y + area.height;
        let mut y = area.y + 1;

        let spinner = self
            .spinner
            .as_ref()
            .map(|(msg, f)| (SPINNER_FRAMES[*f % SPINNER_FRAMES.len()], msg.as_str(), C_TOAST_INFO));
        let rest = self
            .toasts
            .iter()
            .rev()
            .take(MAX_VISIBLE)
            .map(|t| (t.severity.icon(), t.message.as_str(), t.severity.color()));

        for (icon, message, color) in spinner.into_iter().chain(rest) {
            if y >= bottom {
                break;
            }
            let w = (message.chars().count() as u16 + 5).min(max_width).min(area.width);
            let toast_area = Rect {
                x: area.x + area.width.saturating_sub(w + 1),
                y,
                width: w,
                height: 1,
            };
            frame.render_widget(Clear, toast_area);
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(
                    format!(" {} {} ", icon, message),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ))),
                toast_area,
            );
            y += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_replaces_spinner() {
        let mut t = ToastManager::new();
        t.spinner("Connecting to 10.0.0.2…");
        assert!(!t.is_empty());
        t.resolve(Severity::Success, "Connected to 10.0.0.2");
        assert!(t.spinner.is_none());
        assert_eq!(t.toasts.len(), 1);
    }

    #[test]
    fn duplicate_messages_collapse() {
        let mut t = ToastManager::new();
        t.warning("Not connected");
        t.warning("Not connected");
        assert_eq!(t.toasts.len(), 1);
    }
}
