//! TransportPanel — the four media-key buttons.

use droidremote_proto::protocol::TransportKey;
use ratatui::crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::Span,
    widgets::Paragraph,
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    components::hit,
    theme::style_button,
    widgets::pane_chrome::pane_chrome,
};

/// Left-to-right button order.
const BUTTONS: [TransportKey; 4] = [
    TransportKey::Previous,
    TransportKey::PlayPause,
    TransportKey::Stop,
    TransportKey::Next,
];

fn glyph(key: TransportKey) -> &'static str {
    match key {
        TransportKey::PlayPause => "⏯",
        TransportKey::Stop => "⏹",
        TransportKey::Next => "⏭",
        TransportKey::Previous => "⏮",
    }
}

/// Pad `text` on both sides to fill `width` display columns.
fn centered(text: &str, width: u16) -> String {
    let w = text.width();
    let total = (width as usize).saturating_sub(w);
    let left = total / 2;
    format!("{}{}{}", " ".repeat(left), text, " ".repeat(total - left))
}

pub struct TransportPanel {
    selected: usize,
    button_areas: [Rect; 4],
}

impl TransportPanel {
    pub fn new() -> Self {
        Self {
            // Play/Pause
            selected: 1,
            button_areas: [Rect::default(); 4],
        }
    }
}

impl Default for TransportPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for TransportPanel {
    fn id(&self) -> ComponentId {
        ComponentId::TransportPanel
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => {
                self.selected = self.selected.saturating_sub(1);
                vec![]
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.selected = (self.selected + 1).min(BUTTONS.len() - 1);
                vec![]
            }
            KeyCode::Enter => vec![Action::Transport(BUTTONS[self.selected])],
            _ => vec![],
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        if event.kind != MouseEventKind::Down(MouseButton::Left) {
            return vec![];
        }
        match self
            .button_areas
            .iter()
            .position(|r| hit(*r, event.column, event.row))
        {
            Some(i) => {
                self.selected = i;
                vec![Action::Transport(BUTTONS[i])]
            }
            None => vec![],
        }
    }

    fn on_action(&mut self, _action: &Action, _state: &AppState) -> Vec<Action> {
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let block = pane_chrome("transport", Some('3'), focused, None);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.height == 0 {
            return;
        }
        let row = Rect { height: 1, ..inner };
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 4); 4])
            .spacing(1)
            .split(row);

        let enabled = state.connection.connected;
        for (i, key) in BUTTONS.iter().enumerate() {
            let r = cols[i];
            self.button_areas[i] = r;
            let text = format!("{} {}", glyph(*key), key.label());
            let style = style_button(focused && i == self.selected, enabled);
            frame.render_widget(
                Paragraph::new(Span::styled(centered(&text, r.width), style)),
                r,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_pads_by_display_width() {
        assert_eq!(centered("Stop", 10), "   Stop   ");
        assert_eq!(centered("Next", 7), " Next  ");
        assert_eq!(centered("Previous Track", 4), "Previous Track");
    }

    #[test]
    fn buttons_cover_every_key_once() {
        for key in TransportKey::ALL {
            assert_eq!(BUTTONS.iter().filter(|b| **b == key).count(), 1);
        }
    }
}
