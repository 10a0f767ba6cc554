//! FocusRing — keyboard focus cycling between panes.

use crate::action::ComponentId;

pub struct FocusRing {
    items: Vec<ComponentId>,
    current: usize,
}

impl FocusRing {
    pub fn new(items: Vec<ComponentId>) -> Self {
        Self { items, current: 0 }
    }

    pub fn current(&self) -> Option<ComponentId> {
        self.items.get(self.current).copied()
    }

    pub fn next(&mut self) -> Option<ComponentId> {
        if self.items.is_empty() {
            return None;
        }
        self.current = (self.current + 1) % self.items.len();
        self.current()
    }

    pub fn prev(&mut self) -> Option<ComponentId> {
        if self.items.is_empty() {
            return None;
        }
        self.current = self
            .current
            .checked_sub(1)
            .unwrap_or(self.items.len() - 1);
        self.current()
    }

    pub fn set(&mut self, id: ComponentId) {
        if let Some(pos) = self.items.iter().position(|&x| x == id) {
            self.current = pos;
        }
    }

    pub fn is_focused(&self, id: ComponentId) -> bool {
        self.current() == Some(id)
    }

    /// Focus the Nth pane (0-indexed). No-op if out of bounds.
    pub fn set_by_position(&mut self, pos: usize) -> Option<ComponentId> {
        if pos < self.items.len() {
            self.current = pos;
            self.current()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring() -> FocusRing {
        FocusRing::new(vec![
            ComponentId::ConnectBar,
            ComponentId::VolumePanel,
            ComponentId::TransportPanel,
        ])
    }

    #[test]
    fn cycles_both_ways() {
        let mut f = ring();
        assert_eq!(f.prev(), Some(ComponentId::TransportPanel));
        assert_eq!(f.next(), Some(ComponentId::ConnectBar));
        assert_eq!(f.next(), Some(ComponentId::VolumePanel));
    }

    #[test]
    fn set_ignores_unknown_panes() {
        let mut f = ring();
        f.set(ComponentId::TransportPanel);
        f.set(ComponentId::LogPanel);
        assert!(f.is_focused(ComponentId::TransportPanel));
        assert_eq!(f.set_by_position(7), None);
        assert!(f.is_focused(ComponentId::TransportPanel));
    }
}
