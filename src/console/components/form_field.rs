//! Form field component for user input

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::console::{
    traits::WidgetResponse,
    ui::{contains, Styles},
};
use crate::models::{option_label, SelectOption};

/// Placeholder of an empty select
pub const SELECT_PLACEHOLDER: &str = "Selecione uma opção.";

const FIELD_HEIGHT: u16 = 3;
const DROPDOWN_ROWS: u16 = 6;

/// Type of form field
#[derive(Debug, Clone, PartialEq)]
pub enum FormFieldType {
    Text,
    Date,
    Select,
}

/// Where a click landed relative to a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldHit {
    Input,
    Option(usize),
    Outside,
}

/// Individual form field
#[derive(Debug, Clone)]
pub struct FormField {
    pub name: String,
    pub label: String,
    pub value: String,
    pub placeholder: String,
    pub field_type: FormFieldType,
    pub is_focused: bool,
    /// Cursor position in characters
    pub cursor_position: usize,
    pub options: Vec<SelectOption>,
    pub dropdown_state: ListState,
    pub show_dropdown: bool,
    pub required_message: Option<String>,
    pub validation_error: Option<String>,
    area: Rect,
    dropdown_area: Rect,
}

impl FormField {
    pub fn new(name: &str, label: &str, field_type: FormFieldType) -> Self {
        let placeholder = if field_type == FormFieldType::Select {
            SELECT_PLACEHOLDER.to_string()
        } else {
            String::new()
        };
        Self {
            name: name.to_string(),
            label: label.to_string(),
            value: String::new(),
            placeholder,
            field_type,
            is_focused: false,
            cursor_position: 0,
            options: Vec::new(),
            dropdown_state: ListState::default(),
            show_dropdown: false,
            required_message: None,
            validation_error: None,
            area: Rect::default(),
            dropdown_area: Rect::default(),
        }
    }

    pub fn text(name: &str, label: &str) -> Self {
        Self::new(name, label, FormFieldType::Text)
    }

    pub fn date(name: &str, label: &str) -> Self {
        Self::new(name, label, FormFieldType::Date).with_placeholder("AAAA-MM-DD")
    }

    pub fn select(name: &str, label: &str) -> Self {
        Self::new(name, label, FormFieldType::Select)
    }

    pub fn with_placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = placeholder.to_string();
        self
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.set_value(value);
        self
    }

    pub fn with_options(mut self, options: Vec<SelectOption>) -> Self {
        self.set_options(options);
        self
    }

    /// Mark the field as required; `message` is reported when it is left blank
    pub fn required(mut self, message: &str) -> Self {
        self.required_message = Some(message.to_string());
        self
    }

    pub fn is_required(&self) -> bool {
        self.required_message.is_some()
    }

    pub fn set_focus(&mut self, focused: bool) {
        self.is_focused = focused;
        if !focused {
            self.show_dropdown = false;
        }
    }

    pub fn set_value(&mut self, value: &str) {
        self.value = value.to_string();
        self.cursor_position = self.value.chars().count();
        self.validation_error = None;
    }

    pub fn set_options(&mut self, options: Vec<SelectOption>) {
        self.options = options;
        self.sync_dropdown_to_value();
    }

    fn sync_dropdown_to_value(&mut self) {
        let current = self.options.iter().position(|o| o.value == self.value);
        let fallback = if self.options.is_empty() { None } else { Some(0) };
        self.dropdown_state.select(current.or(fallback));
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    fn char_count(&self) -> usize {
        self.value.chars().count()
    }

    pub fn insert_char(&mut self, c: char) {
        if self.field_type == FormFieldType::Select {
            return;
        }
        let at = self.byte_index(self.cursor_position);
        self.value.insert(at, c);
        self.cursor_position += 1;
        self.validation_error = None;
    }

    pub fn delete_char(&mut self) {
        if self.field_type == FormFieldType::Select {
            self.clear();
            return;
        }
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
            let at = self.byte_index(self.cursor_position);
            self.value.remove(at);
            self.validation_error = None;
        }
    }

    pub fn delete_char_forward(&mut self) {
        if self.field_type == FormFieldType::Select {
            self.clear();
            return;
        }
        if self.cursor_position < self.char_count() {
            let at = self.byte_index(self.cursor_position);
            self.value.remove(at);
            self.validation_error = None;
        }
    }

    pub fn move_cursor_left(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
        }
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor_position < self.char_count() {
            self.cursor_position += 1;
        }
    }

    pub fn move_cursor_to_start(&mut self) {
        self.cursor_position = 0;
    }

    pub fn move_cursor_to_end(&mut self) {
        self.cursor_position = self.char_count();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor_position = 0;
        self.validation_error = None;
        self.show_dropdown = false;
    }

    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }

    pub fn open_dropdown(&mut self) {
        if self.field_type == FormFieldType::Select {
            self.sync_dropdown_to_value();
            self.show_dropdown = true;
        }
    }

    pub fn close_dropdown(&mut self) {
        self.show_dropdown = false;
    }

    /// Handle dropdown navigation
    pub fn dropdown_up(&mut self) {
        if self.options.is_empty() {
            return;
        }
        let selected = self.dropdown_state.selected().unwrap_or(0);
        let new_selected = if selected == 0 {
            self.options.len() - 1
        } else {
            selected - 1
        };
        self.dropdown_state.select(Some(new_selected));
    }

    pub fn dropdown_down(&mut self) {
        if self.options.is_empty() {
            return;
        }
        let selected = self.dropdown_state.selected().unwrap_or(0);
        let new_selected = (selected + 1) % self.options.len();
        self.dropdown_state.select(Some(new_selected));
    }

    pub fn select_dropdown_value(&mut self) {
        if let Some(selected) = self.dropdown_state.selected() {
            self.select_option_at(selected);
        }
    }

    pub fn select_option_at(&mut self, index: usize) {
        if let Some(option) = self.options.get(index) {
            self.value = option.value.clone();
            self.cursor_position = 0;
            self.show_dropdown = false;
            self.validation_error = None;
            self.dropdown_state.select(Some(index));
        }
    }

    /// Text shown for the current value; selects show the option label
    pub fn display_value(&self) -> String {
        match self.field_type {
            FormFieldType::Select if !self.value.is_empty() => {
                option_label(&self.options, &self.value)
            }
            _ => self.value.clone(),
        }
    }

    /// Required message when the field is blank
    pub fn missing(&self) -> Option<&str> {
        match &self.required_message {
            Some(message) if self.is_blank() => Some(message.as_str()),
            _ => None,
        }
    }

    /// Validate field value
    pub fn validate(&mut self) -> bool {
        self.validation_error = None;

        if self.field_type == FormFieldType::Date
            && !self.value.is_empty()
            && chrono::NaiveDate::parse_from_str(&self.value, "%Y-%m-%d").is_err()
        {
            self.validation_error = Some(format!("{}: data inválida (AAAA-MM-DD)", self.label));
            return false;
        }

        true
    }

    pub fn hit(&self, column: u16, row: u16) -> FieldHit {
        if self.show_dropdown && contains(self.dropdown_area, column, row) {
            let first = self.dropdown_area.y + 1;
            if row >= first && row < first + self.dropdown_area.height.saturating_sub(2) {
                let index = (row - first) as usize + self.dropdown_state.offset();
                if index < self.options.len() {
                    return FieldHit::Option(index);
                }
            }
            return FieldHit::Input;
        }
        if contains(self.area, column, row) {
            FieldHit::Input
        } else {
            FieldHit::Outside
        }
    }

    /// Keys for the focused field
    pub fn handle_key(&mut self, key: KeyEvent) -> WidgetResponse<()> {
        if self.field_type == FormFieldType::Select {
            return self.handle_select_key(key);
        }
        match key.code {
            KeyCode::Char(c) => self.insert_char(c),
            KeyCode::Backspace => self.delete_char(),
            KeyCode::Delete => self.delete_char_forward(),
            KeyCode::Left => self.move_cursor_left(),
            KeyCode::Right => self.move_cursor_right(),
            KeyCode::Home => self.move_cursor_to_start(),
            KeyCode::End => self.move_cursor_to_end(),
            _ => return WidgetResponse::Ignored,
        }
        WidgetResponse::Consumed
    }

    fn handle_select_key(&mut self, key: KeyEvent) -> WidgetResponse<()> {
        if self.show_dropdown {
            match key.code {
                KeyCode::Up => self.dropdown_up(),
                KeyCode::Down => self.dropdown_down(),
                KeyCode::Enter | KeyCode::Char(' ') => {
                    self.select_dropdown_value();
                    return WidgetResponse::Selected(());
                }
                KeyCode::Esc => self.close_dropdown(),
                _ => {
                    self.close_dropdown();
                    return WidgetResponse::Ignored;
                }
            }
            return WidgetResponse::Consumed;
        }
        match key.code {
            KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Down => self.open_dropdown(),
            KeyCode::Backspace | KeyCode::Delete => self.clear(),
            _ => return WidgetResponse::Ignored,
        }
        WidgetResponse::Consumed
    }

    /// Render the form field
    pub fn render(&mut self, f: &mut Frame, area: Rect) {
        self.area = area;
        let shown = self.display_value();
        let display_text = if shown.is_empty() && !self.placeholder.is_empty() {
            self.placeholder.clone()
        } else {
            shown.clone()
        };

        let border_style = if self.is_focused {
            Styles::active_border()
        } else if self.validation_error.is_some() {
            Styles::error()
        } else {
            Styles::inactive_border()
        };

        let mut title = self.label.clone();
        if self.is_required() {
            title.push_str(" *");
        }
        if self.field_type == FormFieldType::Select {
            title.push_str(" ▾");
        }

        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(border_style);

        let text_style = if shown.is_empty() {
            Styles::inactive()
        } else {
            Styles::default()
        };

        let paragraph = Paragraph::new(display_text).style(text_style).block(block);

        f.render_widget(paragraph, area);

        // Render cursor if focused and not a select
        if self.is_focused && self.field_type != FormFieldType::Select {
            let prefix: String = self.value.chars().take(self.cursor_position).collect();
            let cursor_x = area.x + 1 + crate::console::ui::text_width(&prefix) as u16;
            let cursor_y = area.y + 1;
            if cursor_x < area.x + area.width.saturating_sub(1) {
                f.set_cursor(cursor_x, cursor_y);
            }
        }
    }

    /// Render dropdown if visible, below the field when it fits, above otherwise
    pub fn render_dropdown(&mut self, f: &mut Frame, bounds: Rect) {
        if !self.show_dropdown || self.options.is_empty() {
            self.dropdown_area = Rect::default();
            return;
        }

        let height = (self.options.len() as u16).min(DROPDOWN_ROWS) + 2;
        self.dropdown_area = dropdown_rect(self.area, height, bounds);

        let items: Vec<ListItem> = self
            .options
            .iter()
            .map(|option| ListItem::new(option.label.clone()).style(Style::default()))
            .collect();

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Styles::active_border());

        let list = List::new(items)
            .block(block)
            .highlight_style(Styles::selected());

        f.render_widget(Clear, self.dropdown_area);
        f.render_stateful_widget(list, self.dropdown_area, &mut self.dropdown_state);
    }
}

/// Place a popup list of `height` rows directly under `anchor`, or above it
/// when there is no room below
pub fn dropdown_rect(anchor: Rect, height: u16, bounds: Rect) -> Rect {
    let below = anchor.y.saturating_add(anchor.height);
    let bottom = bounds.y.saturating_add(bounds.height);
    let room_below = bottom.saturating_sub(below);
    let room_above = anchor.y.saturating_sub(bounds.y);
    if room_below >= height || room_below >= room_above {
        Rect {
            x: anchor.x,
            y: below,
            width: anchor.width,
            height: height.min(room_below),
        }
    } else {
        let height = height.min(room_above);
        Rect {
            x: anchor.x,
            y: anchor.y - height,
            width: anchor.width,
            height,
        }
    }
}

/// Form container that manages multiple fields, laid out two per row
#[derive(Debug, Clone)]
pub struct FieldSet {
    pub fields: Vec<FormField>,
    pub current_field: usize,
    active: bool,
}

impl FieldSet {
    pub fn new(fields: Vec<FormField>) -> Self {
        let mut form = Self {
            fields,
            current_field: 0,
            active: false,
        };
        form.update_focus();
        form
    }

    fn update_focus(&mut self) {
        for (i, field) in self.fields.iter_mut().enumerate() {
            field.set_focus(self.active && i == self.current_field);
        }
    }

    /// Give keyboard focus to the field set (at its current field)
    pub fn activate(&mut self) {
        self.active = true;
        self.update_focus();
    }

    pub fn deactivate(&mut self) {
        self.active = false;
        self.update_focus();
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Move to the next field; false when already on the last one
    pub fn focus_next(&mut self) -> bool {
        if self.current_field + 1 < self.fields.len() {
            self.set_current_field(self.current_field + 1);
            true
        } else {
            false
        }
    }

    /// Move to the previous field; false when already on the first one
    pub fn focus_prev(&mut self) -> bool {
        if self.current_field > 0 {
            self.set_current_field(self.current_field - 1);
            true
        } else {
            false
        }
    }

    pub fn focus_first(&mut self) {
        self.current_field = 0;
        self.activate();
    }

    pub fn focus_last(&mut self) {
        self.current_field = self.fields.len().saturating_sub(1);
        self.activate();
    }

    pub fn get(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut FormField> {
        self.fields.iter_mut().find(|f| f.name == name)
    }

    /// Value of field `name`, empty when there is no such field
    pub fn value(&self, name: &str) -> String {
        self.get(name)
            .map(|f| f.value.trim().to_string())
            .unwrap_or_default()
    }

    pub fn set_value(&mut self, name: &str, value: &str) {
        if let Some(field) = self.get_mut(name) {
            field.set_value(value);
        }
    }

    pub fn set_options(&mut self, name: &str, options: Vec<SelectOption>) {
        if let Some(field) = self.get_mut(name) {
            field.set_options(options);
        }
    }

    pub fn get_current_field(&self) -> Option<&FormField> {
        self.fields.get(self.current_field)
    }

    pub fn get_current_field_mut(&mut self) -> Option<&mut FormField> {
        self.fields.get_mut(self.current_field)
    }

    /// Messages of every blank required field, in field order
    pub fn missing_required(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter_map(|f| f.missing().map(str::to_string))
            .collect()
    }

    /// Missing required fields first, then format errors
    pub fn problems(&mut self) -> Vec<String> {
        let mut problems = self.missing_required();
        for field in &mut self.fields {
            if !field.validate() {
                if let Some(error) = &field.validation_error {
                    problems.push(error.clone());
                }
            }
        }
        problems
    }

    /// Clear every value and move back to the first field
    pub fn reset(&mut self) {
        for field in &mut self.fields {
            field.clear();
        }
        self.current_field = 0;
        self.update_focus();
    }

    pub fn set_current_field(&mut self, field: usize) {
        if field < self.fields.len() {
            self.current_field = field;
            self.update_focus();
        }
    }

    pub fn has_open_dropdown(&self) -> bool {
        self.fields.iter().any(|f| f.show_dropdown)
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> WidgetResponse<()> {
        match self.get_current_field_mut() {
            Some(field) => field.handle_key(key),
            None => WidgetResponse::Ignored,
        }
    }

    /// Route a click: focus the clicked field or pick a dropdown option.
    /// Returns `Ignored` when the click landed outside every field.
    pub fn handle_click(&mut self, column: u16, row: u16) -> WidgetResponse<()> {
        // An open dropdown is drawn on top of the fields below it
        if let Some(open) = self.fields.iter().position(|f| f.show_dropdown) {
            match self.fields[open].hit(column, row) {
                FieldHit::Option(index) => {
                    self.fields[open].select_option_at(index);
                    self.current_field = open;
                    self.activate();
                    return WidgetResponse::Selected(());
                }
                FieldHit::Input => return WidgetResponse::Consumed,
                FieldHit::Outside => self.fields[open].close_dropdown(),
            }
        }

        let clicked = self
            .fields
            .iter()
            .position(|f| f.hit(column, row) == FieldHit::Input);
        match clicked {
            Some(index) => {
                self.current_field = index;
                self.activate();
                if let Some(field) = self.fields.get_mut(index) {
                    field.open_dropdown();
                }
                WidgetResponse::Consumed
            }
            None => WidgetResponse::Ignored,
        }
    }

    /// Rows needed to draw every field
    pub fn height(&self) -> u16 {
        let rows = (self.fields.len() as u16 + 1) / 2;
        rows * FIELD_HEIGHT
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect) {
        let rows = (self.fields.len() + 1) / 2;
        let row_areas = Layout::default()
            .direction(Direction::Vertical)
            .constraints(
                (0..rows)
                    .map(|_| Constraint::Length(FIELD_HEIGHT))
                    .chain(std::iter::once(Constraint::Min(0)))
                    .collect::<Vec<_>>(),
            )
            .split(area);

        for (row, pair) in self.fields.chunks_mut(2).enumerate() {
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(row_areas[row]);
            for (column, field) in pair.iter_mut().enumerate() {
                field.render(f, columns[column]);
            }
        }
    }

    /// Draw the open dropdown, if any; call after everything it may cover
    pub fn render_overlays(&mut self, f: &mut Frame, bounds: Rect) {
        for field in &mut self.fields {
            field.render_dropdown(f, bounds);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn gender_options() -> Vec<SelectOption> {
        vec![
            SelectOption::new("MALE", "Masculino"),
            SelectOption::new("FEMALE", "Feminino"),
        ]
    }

    #[test]
    fn test_text_editing_handles_multibyte_chars() {
        let mut field = FormField::text("name", "Nome");
        for c in "João".chars() {
            field.insert_char(c);
        }
        field.move_cursor_left();
        field.delete_char();
        assert_eq!(field.value, "Joo");
        field.delete_char_forward();
        assert_eq!(field.value, "Jo");
        assert_eq!(field.cursor_position, 2);
    }

    #[test]
    fn test_select_shows_label_and_stores_value() {
        let mut field = FormField::select("gender", "Gênero").with_options(gender_options());
        assert_eq!(field.display_value(), "");
        assert_eq!(field.placeholder, SELECT_PLACEHOLDER);

        field.handle_key(key(KeyCode::Enter));
        assert!(field.show_dropdown);
        field.handle_key(key(KeyCode::Down));
        assert_eq!(field.handle_key(key(KeyCode::Enter)), WidgetResponse::Selected(()));
        assert_eq!(field.value, "FEMALE");
        assert_eq!(field.display_value(), "Feminino");
        assert!(!field.show_dropdown);
    }

    #[test]
    fn test_typing_into_select_is_ignored() {
        let mut field = FormField::select("gender", "Gênero").with_options(gender_options());
        field.insert_char('x');
        assert_eq!(field.value, "");
    }

    #[test]
    fn test_missing_required_lists_every_blank_field() {
        let mut form = FieldSet::new(vec![
            FormField::text("name", "Nome").required("Nome é obrigatório"),
            FormField::text("cpf", "CPF").required("CPF é obrigatório"),
            FormField::text("phone", "Telefone"),
            FormField::select("gender", "Gênero").required("Gênero é obrigatório"),
        ]);
        form.set_value("cpf", "   ");
        assert_eq!(
            form.missing_required(),
            vec!["Nome é obrigatório", "CPF é obrigatório", "Gênero é obrigatório"]
        );

        form.set_value("name", "Ana");
        form.set_value("cpf", "123");
        form.set_value("gender", "FEMALE");
        assert!(form.missing_required().is_empty());
    }

    #[test]
    fn test_date_format_is_checked() {
        let mut form = FieldSet::new(vec![FormField::date("birthDate", "Nascimento")]);
        form.set_value("birthDate", "09/09/1999");
        assert_eq!(form.problems().len(), 1);
        form.set_value("birthDate", "1999-09-09");
        assert!(form.problems().is_empty());
    }

    #[test]
    fn test_focus_moves_within_bounds() {
        let mut form = FieldSet::new(vec![
            FormField::text("name", "Nome"),
            FormField::text("cpf", "CPF"),
        ]);
        form.focus_first();
        assert!(form.fields[0].is_focused);
        assert!(form.focus_next());
        assert!(!form.focus_next());
        assert!(form.fields[1].is_focused);
        assert!(form.focus_prev());
        form.deactivate();
        assert!(form.fields.iter().all(|f| !f.is_focused));
    }

    #[test]
    fn test_reset_clears_values() {
        let mut form = FieldSet::new(vec![FormField::text("name", "Nome").with_value("Ana")]);
        assert_eq!(form.value("name"), "Ana");
        form.reset();
        assert_eq!(form.value("name"), "");
    }

    #[test]
    fn test_dropdown_rect_flips_above_when_no_room() {
        let bounds = Rect::new(0, 0, 80, 20);
        let low = Rect::new(0, 16, 20, 3);
        let rect = dropdown_rect(low, 5, bounds);
        assert_eq!(rect, Rect::new(0, 11, 20, 5));
        let high = Rect::new(0, 2, 20, 3);
        assert_eq!(dropdown_rect(high, 5, bounds), Rect::new(0, 5, 20, 5));
    }
}
