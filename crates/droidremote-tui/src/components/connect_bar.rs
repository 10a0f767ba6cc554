//! ConnectBar — address field, Connect button and the Remember Me toggle.

use ratatui::crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    components::hit,
    theme::{style_button, C_CONNECTED, C_CONNECTING, C_MUTED, C_PRIMARY, C_SECONDARY},
    widgets::{
        pane_chrome::{pane_chrome, Badge},
        text_field::{FieldAction, TextField},
    },
};

const CONNECT_LABEL: &str = " Connect ";

pub struct ConnectBar {
    address: TextField,
    field_area: Rect,
    button_area: Rect,
    remember_area: Rect,
}

impl ConnectBar {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: TextField::new(address, "device IP"),
            field_area: Rect::default(),
            button_area: Rect::default(),
            remember_area: Rect::default(),
        }
    }

    pub fn address(&self) -> &str {
        self.address.value()
    }

    fn begin_edit(&mut self) -> Vec<Action> {
        self.address.activate();
        vec![Action::BeginEdit]
    }
}

impl Component for ConnectBar {
    fn id(&self) -> ComponentId {
        ComponentId::ConnectBar
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        if self.address.is_active() {
            return match self.address.handle_key(key) {
                FieldAction::Confirmed(address) => vec![Action::EndEdit, Action::Connect(address)],
                FieldAction::Cancelled => vec![Action::EndEdit],
                FieldAction::Changed | FieldAction::None => vec![],
            };
        }
        match key.code {
            KeyCode::Enter => vec![Action::Connect(self.address().to_string())],
            KeyCode::Char('i') | KeyCode::Char('e') => self.begin_edit(),
            _ => vec![],
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        if event.kind != MouseEventKind::Down(MouseButton::Left) {
            return vec![];
        }
        let (col, row) = (event.column, event.row);
        if hit(self.field_area, col, row) {
            return self.begin_edit();
        }
        let mut actions = Vec::new();
        if self.address.is_active() {
            self.address.deactivate();
            actions.push(Action::EndEdit);
        }
        if hit(self.button_area, col, row) {
            actions.push(Action::Connect(self.address().to_string()));
        } else if hit(self.remember_area, col, row) {
            actions.push(Action::ToggleRemember);
        }
        actions
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        match action {
            Action::EditAddress => self.begin_edit(),
            Action::ConnectRequested => vec![Action::Connect(self.address().to_string())],
            Action::EndEdit => {
                self.address.cancel();
                vec![]
            }
            _ => vec![],
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let conn = &state.connection;
        let badge = if conn.is_connecting() {
            Badge {
                text: "CONNECTING",
                color: C_CONNECTING,
            }
        } else if conn.connected {
            Badge {
                text: "CONNECTED",
                color: C_CONNECTED,
            }
        } else {
            Badge {
                text: "OFFLINE",
                color: C_MUTED,
            }
        };
        let block = pane_chrome("device", Some('1'), focused, Some(badge));
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.height == 0 {
            return;
        }
        let row = Rect { height: 1, ..inner };

        let remember_text = if state.remember {
            "[x] Remember Me"
        } else {
            "[ ] Remember Me"
        };
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(16),
                Constraint::Length(2),
                Constraint::Length(CONNECT_LABEL.len() as u16),
                Constraint::Length(2),
                Constraint::Length(remember_text.chars().count() as u16),
            ])
            .split(row);

        frame.render_widget(
            Paragraph::new(Span::styled(" IP ", Style::default().fg(C_SECONDARY))),
            cols[0],
        );

        self.field_area = cols[1];
        self.address.draw(frame, self.field_area);

        self.button_area = cols[3];
        let enabled = !conn.is_connecting();
        frame.render_widget(
            Paragraph::new(Span::styled(CONNECT_LABEL, style_button(focused, enabled))),
            self.button_area,
        );

        self.remember_area = cols[5];
        let remember_style = if state.remember {
            Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(C_SECONDARY)
        };
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(remember_text, remember_style))),
            self.remember_area,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use droidremote_proto::protocol::VolumeStream;
    use ratatui::crossterm::event::KeyModifiers;

    fn state() -> AppState {
        AppState::new(String::new(), false, VolumeStream::Media, PathBuf::new())
    }

    fn press(bar: &mut ConnectBar, code: KeyCode) -> Vec<Action> {
        bar.handle_key(KeyEvent::new(code, KeyModifiers::NONE), &state())
    }

    #[test]
    fn focus_leaving_mid_edit_discards_typed_text() {
        let mut bar = ConnectBar::new("10.0.0.5");
        assert_eq!(bar.on_action(&Action::EditAddress, &state()), vec![Action::BeginEdit]);
        press(&mut bar, KeyCode::Backspace);
        press(&mut bar, KeyCode::Char('9'));
        assert_eq!(bar.address(), "10.0.0.9");

        bar.on_action(&Action::EndEdit, &state());
        assert_eq!(bar.address(), "10.0.0.5");
    }

    #[test]
    fn confirmed_address_is_kept() {
        let mut bar = ConnectBar::new("10.0.0.");
        bar.on_action(&Action::EditAddress, &state());
        press(&mut bar, KeyCode::Char('7'));
        assert_eq!(
            press(&mut bar, KeyCode::Enter),
            vec![Action::EndEdit, Action::Connect("10.0.0.7".to_string())]
        );
        bar.on_action(&Action::EndEdit, &state());
        assert_eq!(bar.address(), "10.0.0.7");
    }

    #[test]
    fn clicks_route_to_connect_bar_focus() {
        let bar = ConnectBar::new("");
        assert_eq!(bar.id(), ComponentId::ConnectBar);
    }
}
