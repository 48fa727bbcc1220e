//! Modal yes/no confirmation

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::console::ui::{contains, fixed_popup, Styles};

pub const CONFIRM_TITLE: &str = "Confirmar exclusão";
const CANCEL_LABEL: &str = "[Cancelar]";
const CONFIRM_LABEL: &str = "[Confirmar]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogResponse {
    /// Confirmed for the given target id
    Confirmed(String),
    Cancelled,
    /// Input handled by the open dialog
    Consumed,
    /// The dialog is closed
    Ignored,
}

/// Confirmation dialog for one target record. `message` may contain
/// `{itemName}`, replaced with the display name of the target.
#[derive(Debug, Clone)]
pub struct ConfirmDialog {
    title: String,
    message: String,
    target: Option<(String, String)>,
    confirm_focused: bool,
    cancel_area: Rect,
    confirm_area: Rect,
}

impl ConfirmDialog {
    pub fn new(title: &str, message: &str) -> Self {
        Self {
            title: title.to_string(),
            message: message.to_string(),
            target: None,
            confirm_focused: false,
            cancel_area: Rect::default(),
            confirm_area: Rect::default(),
        }
    }

    pub fn open(&mut self, id: &str, item_name: &str) {
        self.target = Some((id.to_string(), item_name.to_string()));
        self.confirm_focused = false;
    }

    pub fn close(&mut self) {
        self.target = None;
    }

    pub fn is_open(&self) -> bool {
        self.target.is_some()
    }

    pub fn target_id(&self) -> Option<&str> {
        self.target.as_ref().map(|(id, _)| id.as_str())
    }

    pub fn formatted_message(&self) -> String {
        let name = self.target.as_ref().map(|(_, n)| n.as_str()).unwrap_or("");
        self.message.replace("{itemName}", name)
    }

    fn confirm(&mut self) -> DialogResponse {
        match self.target.take() {
            Some((id, _)) => DialogResponse::Confirmed(id),
            None => DialogResponse::Ignored,
        }
    }

    fn cancel(&mut self) -> DialogResponse {
        self.close();
        DialogResponse::Cancelled
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> DialogResponse {
        if !self.is_open() {
            return DialogResponse::Ignored;
        }
        match key.code {
            KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::BackTab => {
                self.confirm_focused = !self.confirm_focused;
                DialogResponse::Consumed
            }
            KeyCode::Enter if self.confirm_focused => self.confirm(),
            KeyCode::Enter => self.cancel(),
            KeyCode::Char('s') | KeyCode::Char('y') => self.confirm(),
            KeyCode::Char('n') | KeyCode::Esc => self.cancel(),
            _ => DialogResponse::Consumed,
        }
    }

    pub fn handle_click(&mut self, column: u16, row: u16) -> DialogResponse {
        if !self.is_open() {
            return DialogResponse::Ignored;
        }
        if contains(self.confirm_area, column, row) {
            self.confirm()
        } else if contains(self.cancel_area, column, row) {
            self.cancel()
        } else {
            DialogResponse::Consumed
        }
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect) {
        if !self.is_open() {
            return;
        }
        let popup = fixed_popup(56, 8, area);
        f.render_widget(Clear, popup);

        let block = Block::default()
            .title(self.title.clone())
            .borders(Borders::ALL)
            .border_style(Styles::warning());
        let inner = block.inner(popup);
        f.render_widget(block, popup);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(inner);

        let message = Paragraph::new(Line::from(vec![
            Span::styled("⚠ ", Styles::warning()),
            Span::raw(self.formatted_message()),
        ]))
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center);
        f.render_widget(message, chunks[0]);

        let buttons = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[1]);
        self.cancel_area = buttons[0];
        self.confirm_area = buttons[1];

        let style_for = |focused: bool| {
            if focused {
                Styles::selected()
            } else {
                Styles::default()
            }
        };
        f.render_widget(
            Paragraph::new(CANCEL_LABEL)
                .style(style_for(!self.confirm_focused))
                .alignment(Alignment::Center),
            buttons[0],
        );
        f.render_widget(
            Paragraph::new(CONFIRM_LABEL)
                .style(style_for(self.confirm_focused))
                .alignment(Alignment::Center),
            buttons[1],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_message_embeds_item_name() {
        let mut dialog = ConfirmDialog::new(CONFIRM_TITLE, "Deseja realmente excluir {itemName}?");
        dialog.open("7", "Dr. João");
        assert_eq!(dialog.formatted_message(), "Deseja realmente excluir Dr. João?");
    }

    #[test]
    fn test_enter_defaults_to_cancel() {
        let mut dialog = ConfirmDialog::new(CONFIRM_TITLE, "{itemName}");
        dialog.open("7", "x");
        assert_eq!(dialog.handle_key(key(KeyCode::Enter)), DialogResponse::Cancelled);
        assert!(!dialog.is_open());
    }

    #[test]
    fn test_confirm_returns_target() {
        let mut dialog = ConfirmDialog::new(CONFIRM_TITLE, "{itemName}");
        dialog.open("7", "x");
        assert_eq!(dialog.handle_key(key(KeyCode::Right)), DialogResponse::Consumed);
        assert_eq!(dialog.handle_key(key(KeyCode::Enter)), DialogResponse::Confirmed("7".to_string()));
        assert_eq!(dialog.handle_key(key(KeyCode::Enter)), DialogResponse::Ignored);
    }
}
