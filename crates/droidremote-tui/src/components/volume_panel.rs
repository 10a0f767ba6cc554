//! VolumePanel — stream selector, 0–100 slider and typed-percent entry.
//!
//! The panel only reports where the user put the slider; the App feeds that
//! into the debouncer, which decides what actually reaches the device.

use ratatui::crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    layout::Rect,
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
    debounce::Phase,
    theme::{C_CONNECTING, C_MUTED, C_PRIMARY, C_SECONDARY, C_SLIDER_FILL, C_TOAST_INFO},
    widgets::{
        pane_chrome::{pane_chrome, Badge},
        text_field::{FieldAction, TextField},
    },
};

/// Columns reserved right of the bar for the " 100%" readout.
const READOUT_WIDTH: u16 = 6;

pub struct VolumePanel {
    entry: TextField,
    prev_area: Rect,
    next_area: Rect,
    slider_area: Rect,
    /// Left button went down on the slider and has not been released.
    dragging: bool,
}

/// Map a column inside the slider bar to 0..=100.
pub fn percent_for_column(col: u16, bar: Rect) -> u8 {
    if bar.width <= 1 {
        return if col > bar.x { 100 } else { 0 };
    }
    let offset = col.saturating_sub(bar.x).min(bar.width - 1) as u32;
    let span = (bar.width - 1) as u32;
    ((offset * 100 + span / 2) / span) as u8
}

/// Filled columns of a `width`-wide bar showing `percent`.
fn filled_columns(percent: u8, width: u16) -> u16 {
    ((u32::from(percent.min(100)) * u32::from(width) + 50) / 100) as u16
}

impl VolumePanel {
    pub fn new() -> Self {
        Self {
            entry: TextField::new("", "0-100"),
            prev_area: Rect::default(),
            next_area: Rect::default(),
            slider_area: Rect::default(),
            dragging: false,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    fn open_entry(&mut self, state: &AppState) -> Vec<Action> {
        self.entry.set_value(state.volume_percent.to_string());
        self.entry.activate();
        vec![Action::BeginEdit]
    }
}

impl Default for VolumePanel {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for VolumePanel {
    fn id(&self) -> ComponentId {
        ComponentId::VolumePanel
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        if self.entry.is_active() {
            return match self.entry.handle_key(key) {
                FieldAction::Confirmed(text) => vec![Action::EndEdit, Action::VolumeEntry(text)],
                FieldAction::Cancelled => vec![Action::EndEdit],
                FieldAction::Changed | FieldAction::None => vec![],
            };
        }
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => vec![Action::NudgeVolume(-1)],
            KeyCode::Right | KeyCode::Char('l') => vec![Action::NudgeVolume(1)],
            KeyCode::PageDown => vec![Action::NudgeVolume(-10)],
            KeyCode::PageUp => vec![Action::NudgeVolume(10)],
            KeyCode::Home => vec![Action::SetVolume(0)],
            KeyCode::End => vec![Action::SetVolume(100)],
            KeyCode::Up | KeyCode::Char('k') => vec![Action::SelectStream(state.stream.prev())],
            KeyCode::Down | KeyCode::Char('j') => vec![Action::SelectStream(state.stream.next())],
            KeyCode::Enter => self.open_entry(state),
            _ => vec![],
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, state: &AppState) -> Vec<Action> {
        let (col, row) = (event.column, event.row);
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if hit(self.slider_area, col, row) {
                    self.dragging = true;
                    vec![Action::SetVolume(percent_for_column(col, self.slider_area))]
                } else if hit(self.prev_area, col, row) {
                    vec![Action::SelectStream(state.stream.prev())]
                } else if hit(self.next_area, col, row) {
                    vec![Action::SelectStream(state.stream.next())]
                } else {
                    vec![]
                }
            }
            // Drags keep tracking outside the bar so the knob pins to the ends.
            MouseEventKind::Drag(MouseButton::Left) if self.dragging => {
                vec![Action::SetVolume(percent_for_column(col, self.slider_area))]
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.dragging = false;
                vec![]
            }
            MouseEventKind::ScrollUp => vec![Action::NudgeVolume(1)],
            MouseEventKind::ScrollDown => vec![Action::NudgeVolume(-1)],
            _ => vec![],
        }
    }

    fn on_action(&mut self, action: &Action, state: &AppState) -> Vec<Action> {
        match action {
            Action::OpenVolumeEntry => self.open_entry(state),
            Action::EndEdit => {
                self.entry.cancel();
                vec![]
            }
            Action::SelectStream(_) => {
                self.dragging = false;
                vec![]
            }
            _ => vec![],
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let badge = match state.volume_phase {
            Phase::Idle => None,
            Phase::Pending => Some(Badge {
                text: "PENDING",
                color: C_CONNECTING,
            }),
            Phase::Dispatching => Some(Badge {
                text: "SENDING",
                color: C_TOAST_INFO,
            }),
        };
        let block = pane_chrome("volume", Some('2'), focused, badge);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.height == 0 || inner.width < READOUT_WIDTH + 4 {
            return;
        }

        // ── Row 0: stream selector ─────────────────────────────────────────
        let stream = state.stream;
        let label = format!(" {} ", stream.label());
        self.prev_area = Rect {
            x: inner.x + 1,
            y: inner.y,
            width: 1,
            height: 1,
        };
        self.next_area = Rect {
            x: self.prev_area.x + 1 + label.chars().count() as u16,
            ..self.prev_area
        };
        let selector = Line::from(vec![
            Span::raw(" "),
            Span::styled("◀", Style::default().fg(C_SECONDARY)),
            Span::styled(
                label,
                Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
            ),
            Span::styled("▶", Style::default().fg(C_SECONDARY)),
            Span::styled(
                format!("   stream {} · {} steps", stream.stream_id(), stream.steps()),
                Style::default().fg(C_MUTED),
            ),
        ]);
        frame.render_widget(Paragraph::new(selector), Rect { height: 1, ..inner });

        // ── Row 1: slider ──────────────────────────────────────────────────
        if inner.height < 2 {
            return;
        }
        let bar_y = inner.y + 1;
        self.slider_area = Rect {
            x: inner.x + 1,
            y: bar_y,
            width: inner.width.saturating_sub(READOUT_WIDTH + 1),
            height: 1,
        };
        let width = self.slider_area.width;
        let filled = filled_columns(state.volume_percent, width);
        let bar = Line::from(vec![
            Span::styled("━".repeat(filled as usize), Style::default().fg(C_SLIDER_FILL)),
            Span::styled(
                "─".repeat(width.saturating_sub(filled) as usize),
                Style::default().fg(C_MUTED),
            ),
        ]);
        frame.render_widget(Paragraph::new(bar), self.slider_area);
        frame.render_widget(
            Paragraph::new(Span::styled(
                format!("{:>4}%", state.volume_percent),
                Style::default().fg(C_PRIMARY),
            )),
            Rect {
                x: self.slider_area.x + width + 1,
                y: bar_y,
                width: READOUT_WIDTH - 1,
                height: 1,
            },
        );

        // ── Row 2: level info or typed entry ───────────────────────────────
        if inner.height < 3 {
            return;
        }
        let info_row = Rect {
            x: inner.x + 1,
            y: inner.y + 2,
            width: inner.width.saturating_sub(1),
            height: 1,
        };
        if self.entry.is_active() {
            let prefix = " set %: ";
            frame.render_widget(
                Paragraph::new(Span::styled(prefix, Style::default().fg(C_SECONDARY))),
                info_row,
            );
            let x = info_row.x + prefix.len() as u16;
            self.entry.draw(
                frame,
                Rect {
                    x,
                    width: 8.min(info_row.width.saturating_sub(prefix.len() as u16)),
                    ..info_row
                },
            );
            return;
        }
        let applied = state
            .applied_level
            .map_or_else(|| "–".to_string(), |l| l.to_string());
        let info = format!(
            "level {}/{} · device {}",
            state.slider_level(),
            stream.steps(),
            applied
        );
        frame.render_widget(
            Paragraph::new(Span::styled(info, Style::default().fg(C_SECONDARY))),
            info_row,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar() -> Rect {
        Rect {
            x: 10,
            y: 3,
            width: 101,
            height: 1,
        }
    }

    #[test]
    fn slider_columns_map_to_percent() {
        assert_eq!(percent_for_column(10, bar()), 0);
        assert_eq!(percent_for_column(60, bar()), 50);
        assert_eq!(percent_for_column(110, bar()), 100);
    }

    #[test]
    fn columns_outside_bar_pin_to_ends() {
        assert_eq!(percent_for_column(0, bar()), 0);
        assert_eq!(percent_for_column(300, bar()), 100);
    }

    #[test]
    fn narrow_bar_rounds_to_nearest() {
        let narrow = Rect {
            x: 0,
            y: 0,
            width: 3,
            height: 1,
        };
        assert_eq!(percent_for_column(0, narrow), 0);
        assert_eq!(percent_for_column(1, narrow), 50);
        assert_eq!(percent_for_column(2, narrow), 100);
    }

    #[test]
    fn fill_width_tracks_percent() {
        assert_eq!(filled_columns(0, 40), 0);
        assert_eq!(filled_columns(50, 40), 20);
        assert_eq!(filled_columns(100, 40), 40);
    }
}
