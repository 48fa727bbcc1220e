//! Transfer request registry
//!
//! Patient and specialty are picked with autocompletes over the full lists;
//! classification is a plain select filled from `/enums/classification`.

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tracing::{info, warn};

use super::crud::{CrudController, CrudMessages, CrudOutcome};
use super::enums::EnumLoader;
use crate::api::{ApiResult, CrudService, EnumSource, ListService};
use crate::console::{
    app::Screen,
    components::{
        data_table::{select_next, select_prev},
        AutoCompleteSelect, Column, DataTable, DialogResponse, FieldSet, FormField,
        OptionMatcher, RowAction, TableEvent, ToastMessage,
    },
    events::Notifier,
    operations::{Mailbox, Scheduler},
    traits::{Page, ScreenAction, WidgetResponse},
    ui::Styles,
};
use crate::models::{
    option_label, EnumKind, Patient, Record, Specialty, TransferRequest, TransferRequestInput,
};

const PATIENT_REQUIRED: &str = "Paciente é obrigatório";
const SPECIALTY_REQUIRED: &str = "Especialidade é obrigatória";

fn messages() -> CrudMessages {
    CrudMessages {
        load_error: "Não foi possível carregar a lista de solicitações.",
        created: "Solicitação cadastrada com sucesso!",
        updated: "Solicitação atualizada com sucesso!",
        deleted_summary: "Solicitação excluída",
        deleted: "A solicitação foi excluída com sucesso.",
        save_error: "Erro ao salvar solicitação",
        delete_error: "Não foi possível excluir a solicitação.",
        confirm: "Deseja realmente excluir a solicitação do paciente {itemName}?",
    }
}

enum Lookup {
    Patients(ApiResult<Vec<Patient>>),
    Specialties(ApiResult<Vec<Specialty>>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Patient,
    Specialty,
    Classification,
    Table,
}

impl Focus {
    fn next(self) -> Focus {
        match self {
            Focus::Patient => Focus::Specialty,
            Focus::Specialty => Focus::Classification,
            Focus::Classification => Focus::Table,
            Focus::Table => Focus::Patient,
        }
    }

    fn prev(self) -> Focus {
        match self {
            Focus::Patient => Focus::Table,
            Focus::Specialty => Focus::Patient,
            Focus::Classification => Focus::Specialty,
            Focus::Table => Focus::Classification,
        }
    }
}

/// Dependencies of the request page
pub struct RequestSources {
    pub requests: Arc<dyn CrudService<Record = TransferRequest, Input = TransferRequestInput>>,
    pub patients: Arc<dyn ListService<Record = Patient>>,
    pub specialties: Arc<dyn ListService<Record = Specialty>>,
    pub enums: Arc<dyn EnumSource>,
}

pub struct RequestPage {
    crud: CrudController<TransferRequest, TransferRequestInput>,
    patients: Arc<dyn ListService<Record = Patient>>,
    specialties: Arc<dyn ListService<Record = Specialty>>,
    lookups: Mailbox<Lookup>,
    enums: EnumLoader,
    notifier: Notifier,
    scheduler: Scheduler,
    patient: AutoCompleteSelect<Patient>,
    specialty: AutoCompleteSelect<Specialty>,
    form: FieldSet,
    table: DataTable<TransferRequest>,
    focus: Focus,
}

fn patient_matcher() -> OptionMatcher<Patient> {
    OptionMatcher::new("name")
        .with_filter_by(&["name", "cpf"])
        .with_renderer(|p: &Patient| format!("{} ({})", p.name, p.cpf))
}

pub(crate) fn columns(enums: &EnumLoader) -> Vec<Column<TransferRequest>> {
    let classifications = enums.options(EnumKind::Classification);
    vec![
        Column::new("patient", "Paciente"),
        Column::new("specialty", "Especialidade"),
        Column::new("classification", "Classificação").with_render(
            move |r: &TransferRequest| option_label(&classifications, &r.classification),
        ),
    ]
}

impl RequestPage {
    pub fn new(
        sources: RequestSources,
        notifier: Notifier,
        scheduler: Scheduler,
        blur_delay: Duration,
    ) -> Self {
        let enums = EnumLoader::new(sources.enums, notifier.clone());
        let table = DataTable::new(columns(&enums))
            .with_title("Lista de Solicitações")
            .with_edit()
            .with_delete();
        let form = FieldSet::new(vec![FormField::select("classification", "Classificação")
            .required("Classificação é obrigatória")]);
        Self {
            crud: CrudController::new(sources.requests, notifier.clone(), messages()),
            patients: sources.patients,
            specialties: sources.specialties,
            lookups: Mailbox::new(),
            enums,
            notifier,
            scheduler,
            patient: AutoCompleteSelect::new("Paciente", "patient", patient_matcher())
                .with_blur_delay(blur_delay)
                .with_required(true),
            specialty: AutoCompleteSelect::new("Especialidade", "specialty", OptionMatcher::new("name"))
                .with_blur_delay(blur_delay)
                .with_required(true),
            form,
            table,
            focus: Focus::Patient,
        }
    }

    pub fn records(&self) -> &[TransferRequest] {
        &self.crud.records
    }

    pub fn patient(&self) -> &AutoCompleteSelect<Patient> {
        &self.patient
    }

    pub fn specialty(&self) -> &AutoCompleteSelect<Specialty> {
        &self.specialty
    }

    pub fn form_mut(&mut self) -> &mut FieldSet {
        &mut self.form
    }

    pub fn is_editing(&self) -> bool {
        self.crud.is_editing()
    }

    fn load_lookups(&mut self) {
        let patients = Arc::clone(&self.patients);
        self.lookups
            .spawn(async move { Lookup::Patients(patients.list().await) });
        let specialties = Arc::clone(&self.specialties);
        self.lookups
            .spawn(async move { Lookup::Specialties(specialties.list().await) });
    }

    fn apply_lookup(&mut self, lookup: Lookup) {
        match lookup {
            Lookup::Patients(Ok(patients)) => self.patient.set_options(patients),
            Lookup::Specialties(Ok(specialties)) => self.specialty.set_options(specialties),
            Lookup::Patients(Err(e)) => {
                warn!("Failed to load patients: {}", e);
                self.notifier.notify(ToastMessage::error(
                    "Erro ao carregar pacientes",
                    e.user_message("Não foi possível carregar a lista de pacientes."),
                ));
            }
            Lookup::Specialties(Err(e)) => {
                warn!("Failed to load specialties: {}", e);
                self.notifier.notify(ToastMessage::error(
                    "Erro ao carregar especialidades",
                    e.user_message("Não foi possível carregar a lista de especialidades."),
                ));
            }
        }
    }

    /// Give up the current focus target; autocompletes start their blur
    fn leave(&mut self) {
        match self.focus {
            Focus::Patient => self.patient.blur(&self.scheduler),
            Focus::Specialty => self.specialty.blur(&self.scheduler),
            Focus::Classification => {
                if let Some(field) = self.form.get_current_field_mut() {
                    field.close_dropdown();
                }
                self.form.deactivate();
            }
            Focus::Table => {}
        }
    }

    fn enter(&mut self, target: Focus) {
        self.focus = target;
        match target {
            Focus::Patient => self.patient.focus(),
            Focus::Specialty => self.specialty.focus(),
            Focus::Classification => self.form.activate(),
            Focus::Table => {
                if self.crud.table_state.selected().is_none() && !self.crud.records.is_empty() {
                    self.crud.table_state.select(Some(0));
                }
            }
        }
    }

    fn move_focus(&mut self, target: Focus) {
        if target == self.focus {
            return;
        }
        self.leave();
        self.enter(target);
    }

    fn problems(&mut self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.patient.value().is_none() {
            problems.push(PATIENT_REQUIRED.to_string());
        }
        if self.specialty.value().is_none() {
            problems.push(SPECIALTY_REQUIRED.to_string());
        }
        problems.extend(self.form.problems());
        problems
    }

    pub fn submit(&mut self) -> bool {
        let problems = self.problems();
        let input = TransferRequestInput {
            patient_id: self.patient.value().map(|p| p.id.clone()).unwrap_or_default(),
            specialty_id: self.specialty.value().map(|s| s.id.clone()).unwrap_or_default(),
            classification: self.form.value("classification"),
        };
        self.crud.submit(input, problems)
    }

    fn reset_form(&mut self) {
        self.patient.set_value(None);
        self.specialty.set_value(None);
        self.form.reset();
    }

    pub fn start_edit(&mut self, request: &TransferRequest) {
        info!("Editing request {}", request.id);
        let patient = request.patient.clone().or_else(|| {
            self.patient
                .options()
                .iter()
                .find(|p| p.id == request.patient_id)
                .cloned()
        });
        let specialty = request.specialty.clone().or_else(|| {
            self.specialty
                .options()
                .iter()
                .find(|s| s.id == request.specialty_id)
                .cloned()
        });
        self.patient.set_value(patient);
        self.specialty.set_value(specialty);
        self.form.set_value("classification", &request.classification);
        self.crud.begin_edit(&request.id);
        self.move_focus(Focus::Patient);
    }

    pub fn cancel_edit(&mut self) {
        self.crud.cancel_edit();
        self.reset_form();
    }

    fn apply_row_action(&mut self, action: Option<RowAction<TransferRequest>>) {
        match action {
            Some(RowAction::Edit(request)) => self.start_edit(&request),
            Some(RowAction::Delete(request)) => {
                let name = request.patient_name().unwrap_or(&request.patient_id).to_string();
                self.crud.request_delete(&request, &name);
            }
            Some(RowAction::Open(request)) => info!("Selected request {}", request.id),
            None => {}
        }
    }

    fn handle_dialog(&mut self, response: DialogResponse) {
        if let DialogResponse::Confirmed(id) = response {
            self.crud.delete(id);
        }
    }

    fn handle_escape(&mut self) -> ScreenAction {
        if self.crud.is_editing() {
            self.cancel_edit();
            ScreenAction::None
        } else {
            ScreenAction::NavigateTo(Screen::Home)
        }
    }

    fn handle_autocomplete_key(&mut self, key: KeyEvent) -> ScreenAction {
        let response = match self.focus {
            Focus::Patient => self.patient.handle_key(key).map_selected(|p| p.name),
            _ => self.specialty.handle_key(key).map_selected(|s| s.name),
        };
        match response {
            WidgetResponse::Selected(name) => {
                info!("Picked {}", name);
                ScreenAction::None
            }
            WidgetResponse::Consumed => ScreenAction::None,
            WidgetResponse::Ignored => match key.code {
                KeyCode::Enter => {
                    self.submit();
                    ScreenAction::None
                }
                KeyCode::Esc => self.handle_escape(),
                _ => ScreenAction::None,
            },
        }
    }

    fn handle_classification_key(&mut self, key: KeyEvent) -> ScreenAction {
        if key.code == KeyCode::Esc && !self.form.has_open_dropdown() {
            return self.handle_escape();
        }
        self.form.handle_key(key);
        ScreenAction::None
    }

    fn handle_table_key(&mut self, key: KeyEvent) -> ScreenAction {
        match key.code {
            KeyCode::Esc => ScreenAction::NavigateTo(Screen::Home),
            KeyCode::Char('n') => {
                self.cancel_edit();
                self.move_focus(Focus::Patient);
                ScreenAction::None
            }
            KeyCode::Char('r') | KeyCode::F(5) => {
                self.crud.load();
                ScreenAction::None
            }
            _ => {
                let action = self
                    .table
                    .handle_key(key, &self.crud.records, &mut self.crud.table_state)
                    .map(|e| e.to_action());
                self.apply_row_action(action);
                ScreenAction::None
            }
        }
    }

    fn handle_click(&mut self, column: u16, row: u16) {
        if self.crud.confirm.is_open() {
            let response = self.crud.confirm.handle_click(column, row);
            self.handle_dialog(response);
            return;
        }

        // An open dropdown covers the widgets drawn beneath it, so the press
        // stops there; the specialty dropdown is drawn last
        let (on_patient, on_specialty, on_form) = if self.specialty.dropdown_contains(column, row)
        {
            self.patient.click_outside();
            self.specialty.handle_click(column, row);
            (false, true, false)
        } else if self.patient.dropdown_contains(column, row) {
            self.specialty.click_outside();
            self.patient.handle_click(column, row);
            (true, false, false)
        } else {
            // Both autocompletes see every other press so the open one can close
            let on_patient = !self.patient.handle_click(column, row).is_ignored();
            let on_specialty = !self.specialty.handle_click(column, row).is_ignored();
            let on_form = !self.form.handle_click(column, row).is_ignored();
            (on_patient, on_specialty, on_form)
        };

        let target = if on_patient {
            Focus::Patient
        } else if on_specialty {
            Focus::Specialty
        } else if on_form {
            Focus::Classification
        } else if self.table.contains(column, row) {
            Focus::Table
        } else {
            return;
        };

        if target != self.focus {
            self.leave();
            self.focus = target;
            match target {
                Focus::Classification => self.form.activate(),
                Focus::Table => self.enter(Focus::Table),
                _ => {}
            }
        }

        if target == Focus::Table {
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
}

impl Page for RequestPage {
    fn draw(&mut self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(8),
                Constraint::Length(1),
                Constraint::Min(3),
            ])
            .split(area);

        let title = match (self.crud.is_editing(), self.crud.is_saving()) {
            (true, false) => "Editar Solicitação",
            (false, false) => "Cadastro de Solicitação",
            (_, true) => "Cadastro de Solicitação (salvando...)",
        };
        let block = Block::default()
            .title(Span::styled(title, Styles::title()))
            .borders(Borders::ALL)
            .border_style(if self.focus == Focus::Table {
                Styles::inactive_border()
            } else {
                Styles::active_border()
            });
        let inner = block.inner(chunks[0]);
        f.render_widget(block, chunks[0]);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Length(3)])
            .split(inner);
        let pickers = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[0]);
        self.patient.render(f, pickers[0]);
        self.specialty.render(f, pickers[1]);
        self.form.render(f, rows[1]);

        let hint = "Enter: Salvar  Tab: Próximo campo  ↑/↓: Opções  e/d na lista: Editar/Excluir";
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
        self.patient.render_dropdown(f, area);
        self.specialty.render_dropdown(f, area);
        self.crud.confirm.render(f, area);
    }

    fn handle_key(&mut self, key: KeyEvent) -> ScreenAction {
        if self.crud.confirm.is_open() {
            let response = self.crud.confirm.handle_key(key);
            self.handle_dialog(response);
            return ScreenAction::None;
        }

        match key.code {
            KeyCode::Tab => {
                self.move_focus(self.focus.next());
                return ScreenAction::None;
            }
            KeyCode::BackTab => {
                self.move_focus(self.focus.prev());
                return ScreenAction::None;
            }
            KeyCode::Char('s')
                if key.modifiers.contains(KeyModifiers::CONTROL) && self.focus != Focus::Table =>
            {
                self.submit();
                return ScreenAction::None;
            }
            _ => {}
        }

        match self.focus {
            Focus::Patient | Focus::Specialty => self.handle_autocomplete_key(key),
            Focus::Classification => self.handle_classification_key(key),
            Focus::Table => self.handle_table_key(key),
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> ScreenAction {
        let (column, row) = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => self.handle_click(column, row),
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
        info!("Entering {}", Screen::Request.path());
        self.lookups.reset();
        self.crud.mount();
        self.load_lookups();
        self.enums.mount(&[EnumKind::Classification]);
        self.form.deactivate();
        self.focus = Focus::Patient;
        self.patient.focus();
    }

    fn on_exit(&mut self) {
        self.crud.unmount();
        self.lookups.reset();
        self.enums.unmount();
        self.patient.unmount();
        self.specialty.unmount();
        self.form.deactivate();
    }

    fn poll(&mut self) {
        if self.enums.poll().contains(&EnumKind::Classification) {
            self.form.set_options(
                "classification",
                self.enums.options(EnumKind::Classification),
            );
            self.table.set_columns(columns(&self.enums));
        }

        for lookup in self.lookups.drain() {
            self.apply_lookup(lookup);
        }

        for outcome in self.crud.poll() {
            if outcome == CrudOutcome::Saved {
                self.reset_form();
            }
        }
    }

    fn on_timer(&mut self, generation: u64) {
        if !self.patient.on_timer(generation) {
            self.specialty.on_timer(generation);
        }
    }

    fn help(&self) -> &'static str {
        "Solicitações:\n\
        Digite para buscar paciente (nome ou CPF) e especialidade\n\
        ↑/↓ - Mover destaque   Enter - Escolher / Salvar\n\
        Tab / Shift+Tab - Próximo / anterior campo\n\
        Ctrl+S - Salvar\n\
        Esc - Fechar lista / cancelar edição / voltar\n\n\
        Lista:\n\
        e - Editar   d / Delete - Excluir   n - Nova   r / F5 - Recarregar"
    }
}
