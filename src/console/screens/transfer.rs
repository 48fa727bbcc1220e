//! Transfers of pending requests
//!
//! The transfer itself is only recorded on this page; nothing is sent to the
//! backend and a reload shows every request as pending again.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, TableState},
    Frame,
};
use tracing::{info, warn};

use crate::api::{ApiResult, ListService};
use crate::console::{
    app::Screen,
    components::{
        data_table::{clamp_selection, select_next, select_prev},
        Column, DataTable, TableEvent,
    },
    operations::Mailbox,
    traits::{Page, ScreenAction},
    ui::{contains, fixed_popup, Styles},
};
use crate::models::{Record, TransferRequest, Transport};

const PENDING: &str = "Pendente";
const TRANSFERRED: &str = "Transferido";

/// A request and whether it was transferred during this visit
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRow {
    pub request: TransferRequest,
    pub transferred: bool,
}

impl TransferRow {
    pub fn status(&self) -> &'static str {
        if self.transferred {
            TRANSFERRED
        } else {
            PENDING
        }
    }
}

impl Record for TransferRow {
    fn id(&self) -> &str {
        &self.request.id
    }

    fn field(&self, name: &str) -> Option<String> {
        match name {
            "status" => Some(self.status().to_string()),
            _ => self.request.field(name),
        }
    }
}

fn columns() -> Vec<Column<TransferRow>> {
    vec![
        Column::new("patient", "Paciente").with_render(|row: &TransferRow| {
            row.request.patient_name().unwrap_or("-").to_string()
        }),
        Column::new("specialty", "Especialidade").with_render(|row: &TransferRow| {
            row.request.specialty_name().unwrap_or("-").to_string()
        }),
        Column::new("classification", "Classificação"),
        Column::new("status", "Status").with_style(|row: &TransferRow| {
            if row.transferred {
                Styles::success()
            } else {
                Styles::warning()
            }
        }),
        Column::new("actions", "Ações").with_render(|row: &TransferRow| {
            if row.transferred {
                String::new()
            } else {
                "[Transferir]".to_string()
            }
        }),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalResponse {
    /// Transfer the request with this id
    Confirmed(String, Transport),
    Cancelled,
    Consumed,
}

/// "Criar Transferência" dialog
#[derive(Debug, Default)]
pub struct TransferModal {
    target: Option<(String, String)>,
    transport: Transport,
    option_areas: Vec<Rect>,
    cancel_area: Rect,
    confirm_area: Rect,
}

impl TransferModal {
    pub fn open(&mut self, row: &TransferRow) {
        let patient = row.request.patient_name().unwrap_or("-").to_string();
        self.target = Some((row.request.id.clone(), patient));
    }

    pub fn is_open(&self) -> bool {
        self.target.is_some()
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    /// Close and go back to the default transport
    pub fn close(&mut self) {
        self.target = None;
        self.transport = Transport::default();
    }

    fn step(&mut self, forward: bool) {
        let len = Transport::ALL.len();
        let current = Transport::ALL
            .iter()
            .position(|t| *t == self.transport)
            .unwrap_or(0);
        let next = if forward {
            (current + 1) % len
        } else {
            (current + len - 1) % len
        };
        self.transport = Transport::ALL[next];
    }

    fn confirm(&mut self) -> ModalResponse {
        let transport = self.transport;
        match self.target.take() {
            Some((id, _)) => {
                self.close();
                ModalResponse::Confirmed(id, transport)
            }
            None => ModalResponse::Cancelled,
        }
    }

    fn cancel(&mut self) -> ModalResponse {
        self.close();
        ModalResponse::Cancelled
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> ModalResponse {
        match key.code {
            KeyCode::Up => self.step(false),
            KeyCode::Down => self.step(true),
            KeyCode::Enter => return self.confirm(),
            KeyCode::Esc => return self.cancel(),
            _ => {}
        }
        ModalResponse::Consumed
    }

    pub fn handle_click(&mut self, column: u16, row: u16) -> ModalResponse {
        if contains(self.confirm_area, column, row) {
            return self.confirm();
        }
        if contains(self.cancel_area, column, row) {
            return self.cancel();
        }
        if let Some(index) = self
            .option_areas
            .iter()
            .position(|area| contains(*area, column, row))
        {
            self.transport = Transport::ALL[index];
        }
        ModalResponse::Consumed
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect) {
        let patient = match &self.target {
            Some((_, patient)) => patient.clone(),
            None => return,
        };
        let popup = fixed_popup(48, 11, area);
        f.render_widget(Clear, popup);
        let block = Block::default()
            .title(Span::styled("Criar Transferência", Styles::title()))
            .borders(Borders::ALL)
            .border_style(Styles::active_border());
        let inner = block.inner(popup);
        f.render_widget(block, popup);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(Transport::ALL.len() as u16),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(inner);

        f.render_widget(Paragraph::new(format!("Paciente: {}", patient)), chunks[0]);
        f.render_widget(
            Paragraph::new(Span::styled("Tipo de Transporte:", Styles::header())),
            chunks[2],
        );

        let option_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(vec![Constraint::Length(1); Transport::ALL.len()])
            .split(chunks[3]);
        self.option_areas = option_rows.to_vec();
        for (transport, row) in Transport::ALL.iter().zip(option_rows.iter()) {
            let chosen = *transport == self.transport;
            let (marker, style) = if chosen {
                ("(•) ", Styles::selected())
            } else {
                ("( ) ", Styles::default())
            };
            f.render_widget(
                Paragraph::new(Line::from(vec![
                    Span::raw(marker),
                    Span::styled(transport.label(), style),
                ])),
                *row,
            );
        }

        let buttons = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[5]);
        self.cancel_area = buttons[0];
        self.confirm_area = buttons[1];
        f.render_widget(
            Paragraph::new("[Cancelar]").alignment(Alignment::Center),
            buttons[0],
        );
        f.render_widget(
            Paragraph::new("[Confirmar]")
                .style(Styles::action())
                .alignment(Alignment::Center),
            buttons[1],
        );
    }
}

pub struct TransferPage {
    service: Arc<dyn ListService<Record = TransferRequest>>,
    rows: Vec<TransferRow>,
    table: DataTable<TransferRow>,
    table_state: TableState,
    modal: TransferModal,
    loading: bool,
    mailbox: Mailbox<ApiResult<Vec<TransferRequest>>>,
}

impl TransferPage {
    pub fn new(service: Arc<dyn ListService<Record = TransferRequest>>) -> Self {
        let table = DataTable::new(columns())
            .with_title("Transferências")
            .with_empty_message("Nenhuma solicitação encontrada")
            .with_row_click();
        Self {
            service,
            rows: Vec::new(),
            table,
            table_state: TableState::default(),
            modal: TransferModal::default(),
            loading: false,
            mailbox: Mailbox::new(),
        }
    }

    pub fn rows(&self) -> &[TransferRow] {
        &self.rows
    }

    pub fn modal(&self) -> &TransferModal {
        &self.modal
    }

    fn load(&mut self) {
        self.loading = true;
        let service = Arc::clone(&self.service);
        self.mailbox.spawn(async move { service.list().await });
    }

    /// Open the dialog for `row` unless it was already transferred
    fn open_transfer(&mut self, index: usize) {
        if let Some(row) = self.rows.get(index) {
            if !row.transferred {
                self.modal.open(row);
            }
        }
    }

    fn apply_modal(&mut self, response: ModalResponse) {
        if let ModalResponse::Confirmed(id, transport) = response {
            if let Some(row) = self.rows.iter_mut().find(|r| r.request.id == id) {
                row.transferred = true;
                info!("Request {} transferred by {}", id, transport.as_str());
            }
        }
    }

    fn row_index(&self, event: Option<TableEvent<'_, TransferRow>>) -> Option<usize> {
        let id = event?.record().id().to_string();
        self.rows.iter().position(|r| r.id() == id)
    }
}

impl Page for TransferPage {
    fn draw(&mut self, f: &mut Frame, area: Rect) {
        self.table.set_loading(self.loading);
        self.table
            .render(f, area, &self.rows, &mut self.table_state, !self.modal.is_open());
        self.modal.render(f, area);
    }

    fn handle_key(&mut self, key: KeyEvent) -> ScreenAction {
        if self.modal.is_open() {
            let response = self.modal.handle_key(key);
            self.apply_modal(response);
            return ScreenAction::None;
        }
        match key.code {
            KeyCode::Esc => return ScreenAction::NavigateTo(Screen::Home),
            KeyCode::Char('r') | KeyCode::F(5) => self.load(),
            KeyCode::Char('t') => {
                if let Some(index) = self.table_state.selected() {
                    self.open_transfer(index);
                }
            }
            _ => {
                let event = self.table.handle_key(key, &self.rows, &mut self.table_state);
                if let Some(index) = self.row_index(event) {
                    self.open_transfer(index);
                }
            }
        }
        ScreenAction::None
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> ScreenAction {
        let (column, row) = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if self.modal.is_open() {
                    let response = self.modal.handle_click(column, row);
                    self.apply_modal(response);
                } else {
                    let event = self.table.hit_test(&self.rows, &self.table_state, column, row);
                    if let Some(index) = self.row_index(event) {
                        self.table_state.select(Some(index));
                        self.open_transfer(index);
                    }
                }
            }
            MouseEventKind::ScrollDown if !self.modal.is_open() => {
                select_next(&mut self.table_state, self.rows.len())
            }
            MouseEventKind::ScrollUp if !self.modal.is_open() => {
                select_prev(&mut self.table_state, self.rows.len())
            }
            _ => {}
        }
        ScreenAction::None
    }

    fn on_enter(&mut self) {
        info!("Entering {}", Screen::Transfer.path());
        self.mailbox.reset();
        self.modal.close();
        self.load();
    }

    fn on_exit(&mut self) {
        self.mailbox.reset();
        self.modal.close();
        self.loading = false;
    }

    fn poll(&mut self) {
        for result in self.mailbox.drain() {
            self.loading = false;
            match result {
                Ok(requests) => {
                    self.rows = requests
                        .into_iter()
                        .map(|request| TransferRow {
                            request,
                            transferred: false,
                        })
                        .collect();
                    clamp_selection(&mut self.table_state, self.rows.len());
                }
                Err(e) => warn!("Failed to load requests: {}", e),
            }
        }
    }

    fn help(&self) -> &'static str {
        "Transferências:\n\
        ↑/↓ - Navegar\n\
        Enter / t / clique - Transferir solicitação pendente\n\
        Na janela: ↑/↓ - Transporte  Enter - Confirmar  Esc - Cancelar\n\
        r / F5 - Recarregar"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Patient;
    use async_trait::async_trait;
    use crossterm::event::KeyModifiers;
    use std::time::Duration;

    struct Requests(Vec<TransferRequest>);

    #[async_trait]
    impl ListService for Requests {
        type Record = TransferRequest;

        async fn list(&self) -> ApiResult<Vec<TransferRequest>> {
            Ok(self.0.clone())
        }
    }

    fn request(id: &str, patient: &str) -> TransferRequest {
        TransferRequest {
            id: id.to_string(),
            patient_id: format!("p-{}", id),
            specialty_id: "s1".to_string(),
            classification: "RED".to_string(),
            patient: Some(Patient {
                id: format!("p-{}", id),
                name: patient.to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    async fn loaded(requests: Vec<TransferRequest>) -> TransferPage {
        let mut page = TransferPage::new(Arc::new(Requests(requests)));
        page.on_enter();
        tokio::time::sleep(Duration::from_millis(10)).await;
        page.poll();
        page
    }

    #[tokio::test(start_paused = true)]
    async fn test_rows_start_pending() {
        let page = loaded(vec![request("1", "Ana"), request("2", "Bruno")]).await;
        assert_eq!(page.rows().len(), 2);
        assert!(page.rows().iter().all(|r| r.status() == "Pendente"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirm_marks_row_transferred() {
        let mut page = loaded(vec![request("1", "Ana")]).await;
        page.handle_key(key(KeyCode::Down));
        page.handle_key(key(KeyCode::Enter));
        assert!(page.modal().is_open());

        page.handle_key(key(KeyCode::Down));
        assert_eq!(page.modal().transport(), Transport::Plane);
        page.handle_key(key(KeyCode::Enter));

        assert!(!page.modal().is_open());
        assert!(page.rows()[0].transferred);
        assert_eq!(page.rows()[0].field("status").as_deref(), Some("Transferido"));
        assert_eq!(page.modal().transport(), Transport::Land);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_resets_transport_and_keeps_pending() {
        let mut page = loaded(vec![request("1", "Ana")]).await;
        page.handle_key(key(KeyCode::Down));
        page.handle_key(key(KeyCode::Char('t')));
        page.handle_key(key(KeyCode::Up));
        assert_eq!(page.modal().transport(), Transport::Helicopter);

        page.handle_key(key(KeyCode::Esc));
        assert!(!page.modal().is_open());
        assert_eq!(page.modal().transport(), Transport::Land);
        assert!(!page.rows()[0].transferred);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transferred_row_does_not_reopen() {
        let mut page = loaded(vec![request("1", "Ana")]).await;
        page.handle_key(key(KeyCode::Down));
        page.handle_key(key(KeyCode::Enter));
        page.handle_key(key(KeyCode::Enter));
        assert!(page.rows()[0].transferred);

        page.handle_key(key(KeyCode::Enter));
        assert!(!page.modal().is_open());
    }

    #[test]
    fn test_missing_patient_renders_dash() {
        let row = TransferRow {
            request: TransferRequest::default(),
            transferred: true,
        };
        let columns = columns();
        assert_eq!(columns[0].text(&row), "-");
        assert_eq!(columns[4].text(&row), "");
    }
}
