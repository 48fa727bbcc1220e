//! Form-plus-table page shared by the person and specialty registries

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tracing::info;

use super::crud::{CrudController, CrudMessages, CrudOutcome};
use super::enums::EnumLoader;
use crate::api::{CrudService, EnumSource};
use crate::console::{
    app::Screen,
    components::{
        data_table::{select_next, select_prev, RowAction},
        Column, DataTable, DialogResponse, FieldSet, FormField, FormFieldType, TableEvent,
    },
    events::Notifier,
    traits::{Page, ScreenAction},
    ui::Styles,
};
use crate::models::{EnumKind, Record};

/// Everything that differs between the registry pages
pub trait EntitySchema: 'static {
    type Record: Record + Clone + Send + Sync + 'static;
    type Input: Send + Sync + 'static;

    const SCREEN: Screen;
    const FORM_TITLE: &'static str;
    const EDIT_TITLE: &'static str;
    const LIST_TITLE: &'static str;

    fn messages() -> CrudMessages;

    fn fields() -> Vec<FormField>;

    /// Select fields filled from an enumeration, by field name
    fn enum_fields() -> &'static [(&'static str, EnumKind)] {
        &[]
    }

    fn columns(enums: &EnumLoader) -> Vec<Column<Self::Record>>;

    fn read_form(form: &FieldSet) -> Self::Input;

    fn fill_form(record: &Self::Record, form: &mut FieldSet);

    /// Name used in the delete confirmation
    fn display_name(record: &Self::Record) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Form,
    Table,
}

pub struct FormPage<S: EntitySchema> {
    crud: CrudController<S::Record, S::Input>,
    form: FieldSet,
    table: DataTable<S::Record>,
    enums: EnumLoader,
    focus: Focus,
}

impl<S: EntitySchema> FormPage<S> {
    pub fn new(
        service: Arc<dyn CrudService<Record = S::Record, Input = S::Input>>,
        enum_source: Arc<dyn EnumSource>,
        notifier: Notifier,
    ) -> Self {
        let enums = EnumLoader::new(enum_source, notifier.clone());
        let table = DataTable::new(S::columns(&enums))
            .with_title(S::LIST_TITLE)
            .with_edit()
            .with_delete();
        Self {
            crud: CrudController::new(service, notifier, S::messages()),
            form: FieldSet::new(S::fields()),
            table,
            enums,
            focus: Focus::Form,
        }
    }

    fn enum_kinds() -> Vec<EnumKind> {
        let mut kinds: Vec<EnumKind> = S::enum_fields().iter().map(|(_, k)| *k).collect();
        kinds.dedup();
        kinds
    }

    pub fn records(&self) -> &[S::Record] {
        &self.crud.records
    }

    pub fn form(&self) -> &FieldSet {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FieldSet {
        &mut self.form
    }

    pub fn is_editing(&self) -> bool {
        self.crud.is_editing()
    }

    fn focus_form(&mut self) {
        self.focus = Focus::Form;
        self.form.activate();
    }

    fn focus_table(&mut self) {
        self.focus = Focus::Table;
        self.form.deactivate();
        if self.crud.table_state.selected().is_none() && !self.crud.records.is_empty() {
            self.crud.table_state.select(Some(0));
        }
    }

    pub fn submit(&mut self) -> bool {
        let problems = self.form.problems();
        let input = S::read_form(&self.form);
        self.crud.submit(input, problems)
    }

    /// Start editing `record`: fill the form and remember its id
    pub fn start_edit(&mut self, record: &S::Record) {
        info!("Editing {} on {}", record.id(), S::SCREEN.path());
        self.form.reset();
        S::fill_form(record, &mut self.form);
        self.crud.begin_edit(record.id());
        self.form.focus_first();
        self.focus = Focus::Form;
    }

    pub fn cancel_edit(&mut self) {
        self.crud.cancel_edit();
        self.form.reset();
    }

    fn request_delete(&mut self, record: &S::Record) {
        let name = S::display_name(record);
        self.crud.request_delete(record, &name);
    }

    fn apply_row_action(&mut self, action: Option<RowAction<S::Record>>) {
        match action {
            Some(RowAction::Edit(record)) => self.start_edit(&record),
            Some(RowAction::Delete(record)) => self.request_delete(&record),
            Some(RowAction::Open(record)) => info!("Selected {}", record.id()),
            None => {}
        }
    }

    fn handle_dialog(&mut self, response: DialogResponse) {
        if let DialogResponse::Confirmed(id) = response {
            self.crud.delete(id);
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> ScreenAction {
        let on_select = self
            .form
            .get_current_field()
            .map(|f| f.field_type == FormFieldType::Select)
            .unwrap_or(false);

        match key.code {
            KeyCode::Tab => {
                if let Some(field) = self.form.get_current_field_mut() {
                    field.close_dropdown();
                }
                if !self.form.focus_next() {
                    self.focus_table();
                }
            }
            KeyCode::BackTab => {
                if let Some(field) = self.form.get_current_field_mut() {
                    field.close_dropdown();
                }
                if !self.form.focus_prev() {
                    self.focus_table();
                }
            }
            KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.submit();
            }
            KeyCode::Enter if !on_select => {
                self.submit();
            }
            KeyCode::Esc if !self.form.has_open_dropdown() => {
                if self.crud.is_editing() {
                    self.cancel_edit();
                } else {
                    return ScreenAction::NavigateTo(Screen::Home);
                }
            }
            _ => {
                self.form.handle_key(key);
            }
        }
        ScreenAction::None
    }

    fn handle_table_key(&mut self, key: KeyEvent) -> ScreenAction {
        match key.code {
            KeyCode::Tab => self.form.focus_first(),
            KeyCode::BackTab => self.form.focus_last(),
            KeyCode::Esc => return ScreenAction::NavigateTo(Screen::Home),
            KeyCode::Char('n') => {
                self.cancel_edit();
                self.form.focus_first();
            }
            KeyCode::Char('r') | KeyCode::F(5) => self.crud.load(),
            _ => {
                let event = self
                    .table
                    .handle_key(key, &self.crud.records, &mut self.crud.table_state)
                    .map(|e| e.to_action());
                self.apply_row_action(event);
                return ScreenAction::None;
            }
        }
        if self.form.is_active() {
            self.focus = Focus::Form;
        }
        ScreenAction::None
    }
}

impl<S: EntitySchema> Page for FormPage<S> {
    fn draw(&mut self, f: &mut Frame, area: Rect) {
        let form_height = self.form.height() + 2;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(form_height),
                Constraint::Length(1),
                Constraint::Min(3),
            ])
            .split(area);

        let mut title = if self.crud.is_editing() {
            S::EDIT_TITLE.to_string()
        } else {
            S::FORM_TITLE.to_string()
        };
        if self.crud.is_saving() {
            title.push_str(" (salvando...)");
        }
        let border_style = if self.focus == Focus::Form {
            Styles::active_border()
        } else {
            Styles::inactive_border()
        };
        let block = Block::default()
            .title(Span::styled(title, Styles::title()))
            .borders(Borders::ALL)
            .border_style(border_style);
        let inner = block.inner(chunks[0]);
        f.render_widget(block, chunks[0]);
        self.form.render(f, inner);

        let hint = if self.crud.is_editing() {
            "Enter: Salvar  Esc: Cancelar edição  Tab: Próximo campo"
        } else {
            "Enter: Salvar  Tab: Próximo campo  e/d na lista: Editar/Excluir"
        };
        f.render_widget(
            Paragraph::new(Line::from(Span::styled(hint, Styles::inactive()))),
            chunks[1],
        );

        self.table.set_loading(self.crud.is_loading());
        self.table.render(
            f,
            chunks[2],
            &self.crud.records,
            &mut self.crud.table_state,
            self.focus == Focus::Table,
        );

        self.form.render_overlays(f, area);
        self.crud.confirm.render(f, area);
    }

    fn handle_key(&mut self, key: KeyEvent) -> ScreenAction {
        if self.crud.confirm.is_open() {
            let response = self.crud.confirm.handle_key(key);
            self.handle_dialog(response);
            return ScreenAction::None;
        }
        match self.focus {
            Focus::Form => self.handle_form_key(key),
            Focus::Table => self.handle_table_key(key),
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> ScreenAction {
        let (column, row) = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if self.crud.confirm.is_open() {
                    let response = self.crud.confirm.handle_click(column, row);
                    self.handle_dialog(response);
                    return ScreenAction::None;
                }
                if !self.form.handle_click(column, row).is_ignored() {
                    self.focus = Focus::Form;
                    return ScreenAction::None;
                }
                if self.table.contains(column, row) {
                    self.focus_table();
                    let event = self
                        .table
                        .hit_test(&self.crud.records, &self.crud.table_state, column, row);
                    if let Some(record) = event.as_ref().map(TableEvent::record) {
                        let index = self.crud.records.iter().position(|r| r.id() == record.id());
                        self.crud.table_state.select(index);
                    }
                    let action = event.map(|e| e.to_action());
                    self.apply_row_action(action);
                }
            }
            MouseEventKind::ScrollDown if self.table.contains(column, row) => {
                select_next(&mut self.crud.table_state, self.crud.records.len());
            }
            MouseEventKind::ScrollUp if self.table.contains(column, row) => {
                select_prev(&mut self.crud.table_state, self.crud.records.len());
            }
            _ => {}
        }
        ScreenAction::None
    }

    fn on_enter(&mut self) {
        info!("Entering {}", S::SCREEN.path());
        self.crud.mount();
        self.enums.mount(&Self::enum_kinds());
        self.form.current_field = 0;
        self.focus_form();
    }

    fn on_exit(&mut self) {
        self.crud.unmount();
        self.enums.unmount();
        self.form.deactivate();
    }

    fn poll(&mut self) {
        let updated = self.enums.poll();
        if !updated.is_empty() {
            for (name, kind) in S::enum_fields() {
                if updated.contains(kind) {
                    self.form.set_options(name, self.enums.options(*kind));
                }
            }
            self.table.set_columns(S::columns(&self.enums));
        }

        for outcome in self.crud.poll() {
            if outcome == CrudOutcome::Saved {
                self.form.reset();
            }
        }
    }

    fn help(&self) -> &'static str {
        "Cadastro:\n\
        Tab / Shift+Tab - Próximo / anterior campo (a lista vem após o último)\n\
        Enter - Salvar (em seleções: abrir / escolher)\n\
        Ctrl+S - Salvar\n\
        Esc - Cancelar edição / voltar ao início\n\n\
        Lista:\n\
        ↑/↓ - Navegar\n\
        e - Editar registro\n\
        d / Delete - Excluir registro\n\
        n - Novo registro\n\
        r / F5 - Recarregar"
    }
}
