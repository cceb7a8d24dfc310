//! Notifications for the host

use super::layout::LayoutMode;

/// State changes the host may want to reflect in its chrome
#[derive(Clone, Debug, PartialEq)]
pub enum ViewerEvent {
    CurrentPageChanged(usize),
    SelectionChanged,
    ZoomChanged(f32),
    ViewModeChanged(LayoutMode),
    HighlightedTextChanged,
    DocumentLoaded { page_count: usize },
    DocumentClosed,
}

/// Pending events, drained by the host
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Vec<ViewerEvent>,
}

impl EventQueue {
    pub fn push(&mut self, event: ViewerEvent) {
        // Consecutive duplicates carry no extra information
        if self.events.last() == Some(&event) {
            return;
        }
        self.events.push(event);
    }

    pub fn take(&mut self) -> Vec<ViewerEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
