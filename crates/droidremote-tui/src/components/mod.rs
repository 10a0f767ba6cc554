pub mod connect_bar;
pub mod log_panel;
pub mod transport_panel;
pub mod volume_panel;

use ratatui::layout::Rect;

/// True when (col, row) falls inside `r`.
pub fn hit(r: Rect, col: u16, row: u16) -> bool {
    r.width > 0
        && r.height > 0
        && col >= r.x
        && col < r.x + r.width
        && row >= r.y
        && row < r.y + r.height
}
