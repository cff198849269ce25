pub mod highlighting;
pub mod input;
pub mod markdown;
pub mod settings;
pub mod transcript;

use crate::tui::{styles::Theme, Frame};
use anyhow::Result;
use crossterm::event::KeyEvent;
use ratatui::layout::Rect;

/// Base trait for interactive UI components
pub trait Component {
    /// Handle keyboard input
    fn handle_key_event(&mut self, event: KeyEvent) -> Result<()> {
        let _ = event;
        Ok(())
    }

    /// Render the component
    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme);

    /// Check if component has focus
    fn has_focus(&self) -> bool {
        false
    }

    /// Set component focus
    fn set_focus(&mut self, focus: bool) {
        let _ = focus;
    }
}
