//! Text input with a filtered dropdown of records

use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};
use tracing::debug;

use super::form_field::dropdown_rect;
use super::option_matcher::OptionMatcher;
use crate::console::{
    operations::{PendingTimer, Scheduler},
    traits::WidgetResponse,
    ui::{contains, text_width, Styles},
};
use crate::models::Record;

const DROPDOWN_ROWS: u16 = 6;
const DEFAULT_BLUR_DELAY: Duration = Duration::from_millis(200);

/// Dropdown lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectState {
    Closed,
    /// Focus left without a selection; a clear is pending
    Blurring,
    Open,
}

/// Autocomplete select bound to an optional record.
///
/// The visible text is either the typed query or the label of the bound
/// record. Committing a candidate binds it and returns it to the caller,
/// nothing else changes the bound value except [`set_value`](Self::set_value).
pub struct AutoCompleteSelect<T> {
    pub label: String,
    pub name: String,
    matcher: OptionMatcher<T>,
    options: Vec<T>,
    value: Option<T>,
    input: String,
    cursor: usize,
    state: SelectState,
    focused: bool,
    visible: Vec<usize>,
    highlight: ListState,
    pending_clear: Option<PendingTimer>,
    blur_delay: Duration,
    required: bool,
    disabled: bool,
    area: Rect,
    dropdown_area: Rect,
}

impl<T: Record + Clone> AutoCompleteSelect<T> {
    pub fn new(label: &str, name: &str, matcher: OptionMatcher<T>) -> Self {
        Self {
            label: label.to_string(),
            name: name.to_string(),
            matcher,
            options: Vec::new(),
            value: None,
            input: String::new(),
            cursor: 0,
            state: SelectState::Closed,
            focused: false,
            visible: Vec::new(),
            highlight: ListState::default(),
            pending_clear: None,
            blur_delay: DEFAULT_BLUR_DELAY,
            required: false,
            disabled: false,
            area: Rect::default(),
            dropdown_area: Rect::default(),
        }
    }

    pub fn with_blur_delay(mut self, delay: Duration) -> Self {
        self.blur_delay = delay;
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn state(&self) -> SelectState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == SelectState::Open
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn options(&self) -> &[T] {
        &self.options
    }

    /// Candidates currently offered, in option order
    pub fn visible_options(&self) -> Vec<&T> {
        self.visible.iter().filter_map(|&i| self.options.get(i)).collect()
    }

    pub fn highlighted(&self) -> Option<&T> {
        self.highlight
            .selected()
            .and_then(|pos| self.visible.get(pos))
            .and_then(|&i| self.options.get(i))
    }

    pub fn has_pending_clear(&self) -> bool {
        self.pending_clear.is_some()
    }

    /// Bind a record (or nothing) from outside, e.g. when a form is reset or
    /// filled for editing
    pub fn set_value(&mut self, value: Option<T>) {
        self.input = value
            .as_ref()
            .map(|v| self.matcher.label(v))
            .unwrap_or_default();
        self.cursor = self.input.chars().count();
        self.value = value;
    }

    pub fn set_options(&mut self, options: Vec<T>) {
        self.options = options;
        if self.is_open() {
            self.refilter();
        }
    }

    fn bound_label(&self) -> String {
        self.value
            .as_ref()
            .map(|v| self.matcher.label(v))
            .unwrap_or_default()
    }

    fn show_all(&mut self) {
        self.visible = (0..self.options.len()).collect();
        self.reset_highlight();
    }

    fn refilter(&mut self) {
        self.visible = self.matcher.filter(&self.input, &self.options);
        self.reset_highlight();
    }

    fn reset_highlight(&mut self) {
        self.highlight = ListState::default();
        if !self.visible.is_empty() {
            self.highlight.select(Some(0));
        }
    }

    fn cancel_pending(&mut self) {
        if let Some(timer) = self.pending_clear.take() {
            debug!("Cancelled pending clear {} of {}", timer.generation(), self.name);
        }
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.input
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }

    /// Focus gained: open with every candidate visible
    pub fn focus(&mut self) {
        if self.disabled {
            return;
        }
        self.cancel_pending();
        self.focused = true;
        self.state = SelectState::Open;
        self.show_all();
    }

    /// Focus lost. The dropdown stays up for the blur delay so a click on an
    /// item still lands; after that the typed text is dropped unless a value
    /// is bound.
    pub fn blur(&mut self, scheduler: &Scheduler) {
        if !self.focused && self.state == SelectState::Closed {
            return;
        }
        self.focused = false;
        self.cancel_pending();
        if self.state == SelectState::Open {
            self.state = SelectState::Blurring;
        }
        self.pending_clear = Some(scheduler.schedule(self.blur_delay));
    }

    /// A timer fired. Returns whether it was this widget's pending clear.
    pub fn on_timer(&mut self, generation: u64) -> bool {
        let ours = matches!(&self.pending_clear, Some(timer) if timer.is(generation));
        if !ours {
            return false;
        }
        self.pending_clear = None;
        if self.state == SelectState::Blurring {
            self.state = SelectState::Closed;
        }
        if self.value.is_none() {
            self.input.clear();
            self.cursor = 0;
        }
        true
    }

    /// Pointer pressed outside the widget: close and drop unsaved typing
    pub fn click_outside(&mut self) {
        if self.state == SelectState::Closed {
            return;
        }
        self.state = SelectState::Closed;
        self.input = self.bound_label();
        self.cursor = self.input.chars().count();
    }

    /// The widget is going away; nothing scheduled may touch it afterwards
    pub fn unmount(&mut self) {
        self.cancel_pending();
        self.focused = false;
        self.state = SelectState::Closed;
        self.input = self.bound_label();
        self.cursor = self.input.chars().count();
    }

    /// Commit the candidate at `position` in the visible list
    pub fn select_visible(&mut self, position: usize) -> Option<T> {
        let chosen = self
            .visible
            .get(position)
            .and_then(|&i| self.options.get(i))
            .cloned()?;
        self.cancel_pending();
        self.input = self.matcher.label(&chosen);
        self.cursor = self.input.chars().count();
        self.value = Some(chosen.clone());
        self.state = SelectState::Closed;
        Some(chosen)
    }

    pub fn select_highlighted(&mut self) -> Option<T> {
        let position = self.highlight.selected()?;
        self.select_visible(position)
    }

    fn reopen(&mut self) {
        if self.state != SelectState::Open {
            self.cancel_pending();
            self.focused = true;
            self.state = SelectState::Open;
        }
    }

    pub fn input_char(&mut self, c: char) {
        if self.disabled {
            return;
        }
        self.reopen();
        let at = self.byte_index(self.cursor);
        self.input.insert(at, c);
        self.cursor += 1;
        self.refilter();
    }

    pub fn backspace(&mut self) {
        if self.disabled || self.cursor == 0 {
            return;
        }
        self.reopen();
        self.cursor -= 1;
        let at = self.byte_index(self.cursor);
        self.input.remove(at);
        self.refilter();
    }

    pub fn highlight_next(&mut self) {
        if self.visible.is_empty() {
            return;
        }
        let next = match self.highlight.selected() {
            Some(i) => (i + 1) % self.visible.len(),
            None => 0,
        };
        self.highlight.select(Some(next));
    }

    pub fn highlight_prev(&mut self) {
        if self.visible.is_empty() {
            return;
        }
        let prev = match self.highlight.selected() {
            Some(0) | None => self.visible.len() - 1,
            Some(i) => i - 1,
        };
        self.highlight.select(Some(prev));
    }

    /// Keys while the widget has focus
    pub fn handle_key(&mut self, key: KeyEvent) -> WidgetResponse<T> {
        if self.disabled {
            return WidgetResponse::Ignored;
        }
        match key.code {
            KeyCode::Char(c) => self.input_char(c),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Down => {
                if self.is_open() {
                    self.highlight_next();
                } else {
                    self.focus();
                }
            }
            KeyCode::Up if self.is_open() => self.highlight_prev(),
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.input.chars().count()),
            KeyCode::Enter if self.is_open() => {
                return match self.select_highlighted() {
                    Some(chosen) => WidgetResponse::Selected(chosen),
                    None => WidgetResponse::Consumed,
                };
            }
            KeyCode::Esc if self.is_open() => self.click_outside(),
            _ => return WidgetResponse::Ignored,
        }
        WidgetResponse::Consumed
    }

    /// Whether a press at this cell lands on the open dropdown
    pub fn dropdown_contains(&self, column: u16, row: u16) -> bool {
        self.state != SelectState::Closed && contains(self.dropdown_area, column, row)
    }

    /// Pointer press anywhere on the page. A press on an item commits it, a
    /// press on the input focuses it, anything else counts as outside.
    pub fn handle_click(&mut self, column: u16, row: u16) -> WidgetResponse<T> {
        if self.dropdown_contains(column, row) {
            let first = self.dropdown_area.y + 1;
            if row >= first {
                let position = (row - first) as usize + self.highlight.offset();
                if let Some(chosen) = self.select_visible(position) {
                    return WidgetResponse::Selected(chosen);
                }
            }
            return WidgetResponse::Consumed;
        }
        if contains(self.area, column, row) {
            if !self.disabled && !self.is_open() {
                self.focus();
            }
            return WidgetResponse::Consumed;
        }
        self.click_outside();
        WidgetResponse::Ignored
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect) {
        self.area = area;

        let mut title = self.label.clone();
        if self.required {
            title.push_str(" *");
        }

        let border_style = if self.disabled {
            Styles::inactive()
        } else if self.focused {
            Styles::active_border()
        } else {
            Styles::inactive_border()
        };

        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(border_style);

        let (text, style) = if self.input.is_empty() && !self.focused {
            ("Digite para buscar".to_string(), Styles::inactive())
        } else {
            (self.input.clone(), Styles::default())
        };
        f.render_widget(Paragraph::new(text).style(style).block(block), area);

        if self.focused {
            let prefix: String = self.input.chars().take(self.cursor).collect();
            let cursor_x = area.x + 1 + text_width(&prefix) as u16;
            if cursor_x < area.x + area.width.saturating_sub(1) {
                f.set_cursor(cursor_x, area.y + 1);
            }
        }
    }

    /// Draw the dropdown over whatever lies below the input
    pub fn render_dropdown(&mut self, f: &mut Frame, bounds: Rect) {
        if self.state == SelectState::Closed {
            self.dropdown_area = Rect::default();
            return;
        }

        let rows = (self.visible.len() as u16).clamp(1, DROPDOWN_ROWS);
        self.dropdown_area = dropdown_rect(self.area, rows + 2, bounds);
        f.render_widget(Clear, self.dropdown_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Styles::active_border());

        if self.visible.is_empty() {
            let empty = Paragraph::new("Nenhum resultado encontrado")
                .style(Styles::inactive())
                .block(block);
            f.render_widget(empty, self.dropdown_area);
            return;
        }

        let items: Vec<ListItem> = self
            .visible
            .iter()
            .filter_map(|&i| self.options.get(i))
            .map(|option| ListItem::new(self.matcher.label(option)))
            .collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(Styles::selected());
        f.render_stateful_widget(list, self.dropdown_area, &mut self.highlight);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::events::AppEvent;
    use crate::models::Patient;
    use crossterm::event::KeyModifiers;
    use tokio::sync::mpsc;

    fn patient(id: &str, name: &str, cpf: &str) -> Patient {
        Patient {
            id: id.to_string(),
            name: name.to_string(),
            cpf: cpf.to_string(),
            ..Default::default()
        }
    }

    fn widget() -> AutoCompleteSelect<Patient> {
        let matcher = OptionMatcher::new("name")
            .with_filter_by(&["name", "cpf"])
            .with_renderer(|p: &Patient| format!("{} ({})", p.name, p.cpf));
        let mut select = AutoCompleteSelect::new("Paciente", "patient", matcher).with_required(true);
        select.set_options(vec![patient("1", "Ana", "111"), patient("2", "Bia", "222")]);
        select
    }

    fn scheduler() -> (Scheduler, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Scheduler::new(tx), rx)
    }

    async fn next_timer(rx: &mut mpsc::UnboundedReceiver<AppEvent>) -> u64 {
        match rx.recv().await {
            Some(AppEvent::Timer(generation)) => generation,
            other => panic!("expected a timer, got {:?}", other),
        }
    }

    fn type_text(select: &mut AutoCompleteSelect<Patient>, text: &str) {
        for c in text.chars() {
            select.input_char(c);
        }
    }

    #[test]
    fn test_focus_opens_with_every_candidate() {
        let mut select = widget();
        select.focus();
        assert_eq!(select.state(), SelectState::Open);
        assert_eq!(select.visible_options().len(), 2);
    }

    #[test]
    fn test_typing_filters_and_highlights_first() {
        let mut select = widget();
        select.focus();
        type_text(&mut select, "an");
        let visible: Vec<&str> = select.visible_options().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(visible, vec!["1"]);
        assert_eq!(select.highlighted().map(|p| p.id.as_str()), Some("1"));

        select.backspace();
        select.backspace();
        assert_eq!(select.visible_options().len(), 2);
    }

    #[test]
    fn test_enter_commits_highlight() {
        let mut select = widget();
        select.focus();
        type_text(&mut select, "22");
        let response = select.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        match response {
            WidgetResponse::Selected(p) => assert_eq!(p.id, "2"),
            other => panic!("unexpected response: {:?}", other),
        }
        assert_eq!(select.input(), "Bia (222)");
        assert_eq!(select.state(), SelectState::Closed);
        assert_eq!(select.value().map(|p| p.id.as_str()), Some("2"));
    }

    #[test]
    fn test_enter_without_matches_commits_nothing() {
        let mut select = widget();
        select.focus();
        type_text(&mut select, "zzz");
        let response = select.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        assert_eq!(response, WidgetResponse::Consumed);
        assert!(select.value().is_none());
    }

    #[test]
    fn test_outside_click_restores_bound_label() {
        let mut select = widget();
        select.set_value(Some(patient("1", "Ana", "111")));
        select.focus();
        type_text(&mut select, "xyz");
        select.click_outside();
        assert_eq!(select.state(), SelectState::Closed);
        assert_eq!(select.input(), "Ana (111)");
    }

    #[test]
    fn test_set_value_none_renders_empty() {
        let mut select = widget();
        select.set_value(Some(patient("1", "Ana", "111")));
        select.set_value(None);
        assert_eq!(select.input(), "");
        assert!(select.value().is_none());
    }

    #[test]
    fn test_disabled_ignores_input() {
        let mut select = widget().with_disabled(true);
        select.focus();
        select.input_char('a');
        assert_eq!(select.state(), SelectState::Closed);
        assert_eq!(select.input(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_blur_clears_unbound_text_after_delay() {
        let (scheduler, mut rx) = scheduler();
        let mut select = widget();
        select.focus();
        type_text(&mut select, "an");
        select.blur(&scheduler);
        assert_eq!(select.state(), SelectState::Blurring);
        assert_eq!(select.input(), "an");

        let generation = next_timer(&mut rx).await;
        assert!(select.on_timer(generation));
        assert_eq!(select.state(), SelectState::Closed);
        assert_eq!(select.input(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_blur_keeps_text_when_value_bound() {
        let (scheduler, mut rx) = scheduler();
        let mut select = widget();
        select.focus();
        type_text(&mut select, "bi");
        select.select_highlighted();
        select.blur(&scheduler);

        let generation = next_timer(&mut rx).await;
        assert!(select.on_timer(generation));
        assert_eq!(select.input(), "Bia (222)");
    }

    #[tokio::test(start_paused = true)]
    async fn test_refocus_before_delay_cancels_clear() {
        let (scheduler, mut rx) = scheduler();
        let mut select = widget();
        select.focus();
        type_text(&mut select, "an");
        select.blur(&scheduler);
        tokio::time::sleep(Duration::from_millis(100)).await;
        select.focus();
        type_text(&mut select, "a");

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(select.state(), SelectState::Open);
        assert_eq!(select.input(), "ana");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_timer_is_ignored() {
        let (scheduler, mut rx) = scheduler();
        let mut select = widget();
        select.focus();
        select.blur(&scheduler);
        let stale = next_timer(&mut rx).await;

        // Blur again before the first event was handled
        select.focus();
        type_text(&mut select, "b");
        select.blur(&scheduler);
        assert!(!select.on_timer(stale));
        assert_eq!(select.input(), "b");

        let fresh = next_timer(&mut rx).await;
        assert!(select.on_timer(fresh));
        assert_eq!(select.input(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_cancels_pending_clear() {
        let (scheduler, mut rx) = scheduler();
        let mut select = widget();
        select.focus();
        type_text(&mut select, "an");
        select.blur(&scheduler);
        select.unmount();
        assert!(!select.has_pending_clear());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
    }
}
