use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, MouseEvent, MouseEventKind};
use ratatui::{layout::Rect, style::Style, Frame};
use tracing::{info, warn};

use crate::api::{ApiResult, ListService};
use crate::console::{
    app::Screen,
    components::{
        data_table::{select_next, select_prev, clamp_selection},
        Column, DataTable, ToastMessage,
    },
    events::Notifier,
    operations::Mailbox,
    traits::{Navigable, Page, ScreenAction},
    ui::Styles,
};
use crate::models::Hospital;
use ratatui::widgets::TableState;

fn beds_style(hospital: &Hospital) -> Style {
    if hospital.available_beds > 0 {
        Styles::success()
    } else {
        Styles::error()
    }
}

pub(crate) fn columns() -> Vec<Column<Hospital>> {
    vec![
        Column::new("name", "Nome"),
        Column::new("phone", "Telefone"),
        Column::new("availableBeds", "Leitos Disponíveis").with_style(beds_style),
    ]
}

/// Read-only list of hospitals and their free beds
pub struct HospitalPage {
    service: Arc<dyn ListService<Record = Hospital>>,
    notifier: Notifier,
    hospitals: Vec<Hospital>,
    table: DataTable<Hospital>,
    table_state: TableState,
    loading: bool,
    mailbox: Mailbox<ApiResult<Vec<Hospital>>>,
}

impl HospitalPage {
    pub fn new(service: Arc<dyn ListService<Record = Hospital>>, notifier: Notifier) -> Self {
        Self {
            service,
            notifier,
            hospitals: Vec::new(),
            table: DataTable::new(columns()).with_title("Hospitais"),
            table_state: TableState::default(),
            loading: false,
            mailbox: Mailbox::new(),
        }
    }

    pub fn hospitals(&self) -> &[Hospital] {
        &self.hospitals
    }

    fn load(&mut self) {
        self.loading = true;
        let service = Arc::clone(&self.service);
        self.mailbox.spawn(async move { service.list().await });
    }
}

impl Navigable for HospitalPage {
    fn navigate_up(&mut self) {
        select_prev(&mut self.table_state, self.hospitals.len());
    }

    fn navigate_down(&mut self) {
        select_next(&mut self.table_state, self.hospitals.len());
    }

    fn get_selected_index(&self) -> Option<usize> {
        self.table_state.selected()
    }

    fn set_selected_index(&mut self, index: Option<usize>) {
        self.table_state.select(index);
    }

    fn get_item_count(&self) -> usize {
        self.hospitals.len()
    }
}

impl Page for HospitalPage {
    fn draw(&mut self, f: &mut Frame, area: Rect) {
        self.table.set_loading(self.loading);
        self.table
            .render(f, area, &self.hospitals, &mut self.table_state, true);
    }

    fn handle_key(&mut self, key: KeyEvent) -> ScreenAction {
        match key.code {
            KeyCode::Up => self.navigate_up(),
            KeyCode::Down => self.navigate_down(),
            KeyCode::Home => self.navigate_to_first(),
            KeyCode::End => self.navigate_to_last(),
            KeyCode::Char('r') | KeyCode::F(5) => self.load(),
            KeyCode::Esc => return ScreenAction::NavigateTo(Screen::Home),
            _ => {}
        }
        ScreenAction::None
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> ScreenAction {
        if self.table.contains(mouse.column, mouse.row) {
            match mouse.kind {
                MouseEventKind::ScrollDown => self.navigate_down(),
                MouseEventKind::ScrollUp => self.navigate_up(),
                _ => {}
            }
        }
        ScreenAction::None
    }

    fn on_enter(&mut self) {
        info!("Entering {}", Screen::Hospital.path());
        self.mailbox.reset();
        self.load();
    }

    fn on_exit(&mut self) {
        self.mailbox.reset();
        self.loading = false;
    }

    fn poll(&mut self) {
        for result in self.mailbox.drain() {
            self.loading = false;
            match result {
                Ok(hospitals) => {
                    info!("Loaded {} hospitals", hospitals.len());
                    self.hospitals = hospitals;
                    clamp_selection(&mut self.table_state, self.hospitals.len());
                }
                Err(e) => {
                    warn!("Failed to load hospitals: {}", e);
                    self.notifier.notify(ToastMessage::error(
                        "Erro",
                        e.user_message("Erro ao carregar hospitais"),
                    ));
                }
            }
        }
    }

    fn help(&self) -> &'static str {
        "Hospitais:\n\
        ↑/↓ - Navegar\n\
        r / F5 - Recarregar\n\
        Esc - Voltar ao início"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::console::events::AppEvent;
    use async_trait::async_trait;
    use ratatui::{backend::TestBackend, style::Color, Terminal};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct Fixed(Mutex<Option<ApiResult<Vec<Hospital>>>>);

    #[async_trait]
    impl ListService for Fixed {
        type Record = Hospital;

        async fn list(&self) -> ApiResult<Vec<Hospital>> {
            self.0.lock().unwrap().take().unwrap_or(Ok(Vec::new()))
        }
    }

    fn hospital(name: &str, beds: i64) -> Hospital {
        Hospital {
            id: name.to_string(),
            name: name.to_string(),
            address: None,
            phone: Some("3333-0000".to_string()),
            available_beds: beds,
        }
    }

    #[test]
    fn test_beds_color_depends_on_availability() {
        let columns = columns();
        assert_eq!(columns[2].cell_style(&hospital("A", 3)).fg, Some(Color::Green));
        assert_eq!(columns[2].cell_style(&hospital("B", 0)).fg, Some(Color::Red));
        assert_eq!(columns[2].text(&hospital("A", 3)), "3");
    }

    #[tokio::test(start_paused = true)]
    async fn test_loads_and_renders_hospitals() {
        let service = Fixed(Mutex::new(Some(Ok(vec![hospital("Santa Casa", 4)]))));
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut page = HospitalPage::new(Arc::new(service), Notifier::new(tx));
        page.on_enter();
        tokio::time::sleep(Duration::from_millis(10)).await;
        page.poll();
        assert_eq!(page.hospitals().len(), 1);

        let mut terminal = Terminal::new(TestBackend::new(80, 8)).unwrap();
        terminal.draw(|f| page.draw(f, f.size())).unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("Hospitais"));
        assert!(text.contains("Santa Casa"));
        assert!(text.contains("Leitos Disponíveis"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_failure_notifies() {
        let service = Fixed(Mutex::new(Some(Err(ApiError::Status {
            status: 503,
            message: None,
        }))));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut page = HospitalPage::new(Arc::new(service), Notifier::new(tx));
        page.on_enter();
        tokio::time::sleep(Duration::from_millis(10)).await;
        page.poll();

        assert!(page.hospitals().is_empty());
        match rx.try_recv() {
            Ok(AppEvent::Notify(message)) => {
                assert_eq!(message.detail.as_deref(), Some("Erro ao carregar hospitais"))
            }
            other => panic!("expected a toast, got {:?}", other),
        }
    }
}
