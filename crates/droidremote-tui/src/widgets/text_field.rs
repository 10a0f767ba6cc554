//! TextField — single-line editable field on top of tui-input.
//!
//! Used for the device address and the typed volume percent.  While active
//! it owns the keyboard; Enter confirms, Esc restores the value it had when
//! editing began.

use ratatui::crossterm::event::{Event, KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};

use crate::theme::{style_field, C_MUTED, C_PRIMARY};

#[derive(Debug, PartialEq, Eq)]
pub enum FieldAction {
    Changed,
    Confirmed(String),
    Cancelled,
    None,
}

pub struct TextField {
    input: Input,
    active: bool,
    /// Value to restore on Esc.
    before: String,
    placeholder: String,
}

impl TextField {
    pub fn new(value: impl Into<String>, placeholder: impl Into<String>) -> Self {
        Self {
            input: Input::new(value.into()),
            active: false,
            before: String::new(),
            placeholder: placeholder.into(),
        }
    }

    pub fn activate(&mut self) {
        if !self.active {
            self.before = self.input.value().to_string();
            self.active = true;
        }
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Leave editing and put back the value from before it began.  No-op
    /// when the field is not being edited.
    pub fn cancel(&mut self) {
        if self.active {
            let before = std::mem::take(&mut self.before);
            self.input = Input::new(before);
            self.active = false;
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.input = Input::new(value.into());
    }

    pub fn value(&self) -> &str {
        self.input.value()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FieldAction {
        if !self.active {
            return FieldAction::None;
        }
        match key.code {
            KeyCode::Esc => {
                self.cancel();
                FieldAction::Cancelled
            }
            KeyCode::Enter => {
                self.active = false;
                FieldAction::Confirmed(self.input.value().to_string())
            }
            _ => {
                let old = self.input.value().to_string();
                let _ = self.input.handle_event(&Event::Key(key));
                if self.input.value() != old {
                    FieldAction::Changed
                } else {
                    FieldAction::None
                }
            }
        }
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        if area.width == 0 {
            return;
        }
        let width = area.width.saturating_sub(1) as usize;
        let scroll = self.input.visual_scroll(width);
        let value = self.input.value();

        let span = if value.is_empty() && !self.active {
            Span::styled(self.placeholder.as_str(), Style::default().fg(C_MUTED))
        } else if self.active {
            Span::styled(value.chars().skip(scroll).collect::<String>(), style_field())
        } else {
            Span::styled(value, Style::default().fg(C_PRIMARY))
        };
        let style = if self.active { style_field() } else { Style::default() };
        frame.render_widget(Paragraph::new(Line::from(span)).style(style), area);

        if self.active {
            let cursor_x = area.x + (self.input.visual_cursor().saturating_sub(scroll)) as u16;
            frame.set_cursor_position((cursor_x.min(area.x + area.width - 1), area.y));
        }
    }
}
