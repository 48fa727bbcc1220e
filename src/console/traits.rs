//! Core traits for the console architecture
//!
//! Every page implements [`Page`]; widgets report what they did with an
//! input through [`WidgetResponse`].

use crossterm::event::{KeyEvent, MouseEvent};
use ratatui::{layout::Rect, Frame};

use super::app::Screen;

/// Actions that can be returned from page event handling
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenAction {
    /// Navigate to a different page
    NavigateTo(Screen),
    /// Quit the application
    Quit,
    /// No action taken
    None,
}

/// Outcome of offering an input to a widget
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetResponse<T> {
    /// Not for this widget; the caller may handle it
    Ignored,
    /// Handled, nothing to report
    Consumed,
    /// Handled and a value was committed
    Selected(T),
}

impl<T> WidgetResponse<T> {
    pub fn is_ignored(&self) -> bool {
        matches!(self, WidgetResponse::Ignored)
    }

    pub fn map_selected<U>(self, f: impl FnOnce(T) -> U) -> WidgetResponse<U> {
        match self {
            WidgetResponse::Ignored => WidgetResponse::Ignored,
            WidgetResponse::Consumed => WidgetResponse::Consumed,
            WidgetResponse::Selected(value) => WidgetResponse::Selected(f(value)),
        }
    }
}

/// Core trait for all console pages
pub trait Page {
    /// Draw the page content
    fn draw(&mut self, f: &mut Frame, area: Rect);

    /// Handle keyboard input
    fn handle_key(&mut self, key: KeyEvent) -> ScreenAction;

    /// Handle mouse input
    fn handle_mouse(&mut self, _mouse: MouseEvent) -> ScreenAction {
        ScreenAction::None
    }

    /// Called when the page becomes active
    fn on_enter(&mut self) {}

    /// Called when the page becomes inactive
    fn on_exit(&mut self) {}

    /// Apply replies of background calls; called on every loop iteration
    fn poll(&mut self) {}

    /// A scheduled timer fired
    fn on_timer(&mut self, _generation: u64) {}

    /// Shortcut help for the help popup
    fn help(&self) -> &'static str;
}

/// Trait for pages with navigable lists
pub trait Navigable {
    /// Move selection up
    fn navigate_up(&mut self);

    /// Move selection down
    fn navigate_down(&mut self);

    /// Get currently selected index
    fn get_selected_index(&self) -> Option<usize>;

    /// Set selected index
    fn set_selected_index(&mut self, index: Option<usize>);

    /// Get total number of items
    fn get_item_count(&self) -> usize;

    /// Navigate to first item
    fn navigate_to_first(&mut self) {
        if self.get_item_count() > 0 {
            self.set_selected_index(Some(0));
        }
    }

    /// Navigate to last item
    fn navigate_to_last(&mut self) {
        let count = self.get_item_count();
        if count > 0 {
            self.set_selected_index(Some(count - 1));
        }
    }
}
