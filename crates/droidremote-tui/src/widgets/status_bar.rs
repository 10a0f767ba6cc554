//! Status bar — bottom line with connection dot, mode, and keybindings.

use droidremote_proto::state::ConnectionState;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme::{C_ACCENT, C_CONNECTED, C_CONNECTING, C_MODE_EDIT, C_MODE_NORMAL, C_MUTED};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    /// A text field owns the keyboard.
    Editing,
}

impl InputMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Editing => "EDIT",
        }
    }

    pub fn color(self) -> Color {
        match self {
            Self::Normal => C_MODE_NORMAL,
            Self::Editing => C_MODE_EDIT,
        }
    }
}

fn connection_dot(conn: &ConnectionState) -> Span<'static> {
    if conn.is_connecting() {
        Span::styled("◌", Style::default().fg(C_CONNECTING))
    } else if conn.connected {
        Span::styled("●", Style::default().fg(C_CONNECTED))
    } else {
        Span::styled("○", Style::default().fg(C_ACCENT))
    }
}

/// Draw the keybindings footer bar (one row).
pub fn draw_keys_bar(frame: &mut Frame, area: Rect, mode: InputMode, conn: &ConnectionState) {
    let keys = match mode {
        InputMode::Normal => {
            " Space play/pause  s stop  n/p next/prev  +/- vol  [/] stream  = type vol  e edit ip  c connect  r remember  Tab/1-4 panes  q quit"
        }
        InputMode::Editing => " type  ←→ move  Enter apply  Esc cancel  Tab next pane",
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", mode.label()),
            Style::default()
                .fg(mode.color())
                .add_modifier(Modifier::BOLD),
        ),
        connection_dot(conn),
        Span::raw(" "),
        Span::styled(keys, Style::default().fg(C_MUTED)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
