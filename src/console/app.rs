//! Main console application state and loop

use std::time::Instant;

use anyhow::Result;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

use super::components::Toast;
use super::events::{spawn_input_reader, AppEvent, Notifier};
use super::operations::Scheduler;
use super::screens::*;
use super::traits::{Page, ScreenAction};
use super::ui::centered_rect;
use crate::api::Services;
use crate::config::Config;

/// Dismissed toasts listed at the bottom of the help popup
const RECENT_TOASTS: usize = 5;

/// Pages of the console, addressed by URL-style paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Home,
    Patient,
    Doctor,
    RegulatoryDoctor,
    Specialty,
    Hospital,
    Request,
    Transfer,
}

impl Screen {
    pub const ALL: [Screen; 8] = [
        Screen::Home,
        Screen::Patient,
        Screen::Doctor,
        Screen::RegulatoryDoctor,
        Screen::Specialty,
        Screen::Hospital,
        Screen::Request,
        Screen::Transfer,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Screen::Home => "/",
            Screen::Patient => "/patient",
            Screen::Doctor => "/doctor",
            Screen::RegulatoryDoctor => "/regulatory-doctor",
            Screen::Specialty => "/specialty",
            Screen::Hospital => "/hospital",
            Screen::Request => "/request",
            Screen::Transfer => "/transfer",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Screen::Home => "Início",
            Screen::Patient => "Pacientes",
            Screen::Doctor => "Médicos",
            Screen::RegulatoryDoctor => "Médicos Reguladores",
            Screen::Specialty => "Especialidades",
            Screen::Hospital => "Hospitais",
            Screen::Request => "Solicitações",
            Screen::Transfer => "Transferências",
        }
    }

    /// Accepts paths with or without the leading or trailing slash
    pub fn from_path(path: &str) -> Option<Screen> {
        let wanted = path.trim().trim_matches('/');
        Screen::ALL
            .into_iter()
            .find(|s| s.path().trim_start_matches('/') == wanted)
    }
}

/// Main console application state
pub struct App {
    /// Current active page
    pub current_screen: Screen,
    /// Previous page for back navigation
    pub previous_screen: Option<Screen>,
    /// Application configuration
    pub config: Config,

    // Page states
    pub home: HomePage,
    pub patient: PatientPage,
    pub doctor: DoctorPage,
    pub regulatory_doctor: RegulatoryDoctorPage,
    pub specialty: SpecialtyPage,
    pub hospital: HospitalPage,
    pub request: RequestPage,
    pub transfer: TransferPage,

    // Global application state
    pub toast: Toast,
    pub should_quit: bool,
    pub show_help_popup: bool,
    mounted: bool,
    tx: UnboundedSender<AppEvent>,
    rx: UnboundedReceiver<AppEvent>,
}

impl App {
    /// Create the console with every page wired to `services`
    pub fn new(config: Config, services: Services) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let notifier = Notifier::new(tx.clone());
        let scheduler = Scheduler::new(tx.clone());

        let request = RequestPage::new(
            RequestSources {
                requests: services.requests.clone(),
                patients: services.patients.clone(),
                specialties: services.specialties.clone(),
                enums: services.enums.clone(),
            },
            notifier.clone(),
            scheduler,
            config.blur_delay(),
        );

        Self {
            current_screen: Screen::Home,
            previous_screen: None,
            toast: Toast::new(config.toast_life()),
            config,

            home: HomePage::new(),
            patient: PatientPage::new(
                services.patients.clone(),
                services.enums.clone(),
                notifier.clone(),
            ),
            doctor: DoctorPage::new(
                services.doctors.clone(),
                services.enums.clone(),
                notifier.clone(),
            ),
            regulatory_doctor: RegulatoryDoctorPage::new(
                services.regulatory_doctors.clone(),
                services.enums.clone(),
                notifier.clone(),
            ),
            specialty: SpecialtyPage::new(
                services.specialties.clone(),
                services.enums.clone(),
                notifier.clone(),
            ),
            hospital: HospitalPage::new(services.hospitals.clone(), notifier),
            request,
            transfer: TransferPage::new(services.requests),

            should_quit: false,
            show_help_popup: false,
            mounted: false,
            tx,
            rx,
        }
    }

    /// Sender into the event loop, e.g. to post a toast from outside
    pub fn sender(&self) -> UnboundedSender<AppEvent> {
        self.tx.clone()
    }

    fn page(&self, screen: Screen) -> &dyn Page {
        match screen {
            Screen::Home => &self.home,
            Screen::Patient => &self.patient,
            Screen::Doctor => &self.doctor,
            Screen::RegulatoryDoctor => &self.regulatory_doctor,
            Screen::Specialty => &self.specialty,
            Screen::Hospital => &self.hospital,
            Screen::Request => &self.request,
            Screen::Transfer => &self.transfer,
        }
    }

    fn page_mut(&mut self, screen: Screen) -> &mut dyn Page {
        match screen {
            Screen::Home => &mut self.home,
            Screen::Patient => &mut self.patient,
            Screen::Doctor => &mut self.doctor,
            Screen::RegulatoryDoctor => &mut self.regulatory_doctor,
            Screen::Specialty => &mut self.specialty,
            Screen::Hospital => &mut self.hospital,
            Screen::Request => &mut self.request,
            Screen::Transfer => &mut self.transfer,
        }
    }

    fn current_page(&mut self) -> &mut dyn Page {
        self.page_mut(self.current_screen)
    }

    /// Mount the current page once, before the first event
    pub fn start(&mut self) {
        if !self.mounted {
            self.mounted = true;
            info!("Starting at {}", self.current_screen.path());
            self.current_page().on_enter();
        }
    }

    /// Select the page shown first, before [`start`](Self::start)
    pub fn set_initial_screen(&mut self, screen: Screen) {
        if !self.mounted {
            self.current_screen = screen;
        }
    }

    /// Navigate to a specific page
    pub fn navigate_to_screen(&mut self, screen: Screen) {
        if screen == self.current_screen && self.mounted {
            return;
        }
        if self.mounted {
            self.current_page().on_exit();
        }
        info!("Navigating {} -> {}", self.current_screen.path(), screen.path());
        self.previous_screen = Some(self.current_screen);
        self.current_screen = screen;
        self.mounted = true;
        self.show_help_popup = false;
        self.current_page().on_enter();
    }

    fn apply_action(&mut self, action: ScreenAction) {
        match action {
            ScreenAction::NavigateTo(screen) => self.navigate_to_screen(screen),
            ScreenAction::Quit => self.should_quit = true,
            ScreenAction::None => {}
        }
    }

    /// Run the main application loop
    pub async fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        let _input = spawn_input_reader(self.tx.clone(), self.config.tick_rate());
        self.start();

        loop {
            terminal.draw(|f| self.draw(f))?;

            let Some(event) = self.rx.recv().await else {
                break;
            };
            self.handle_event(event);
            // Apply whatever else queued up before drawing again
            while let Ok(event) = self.rx.try_recv() {
                self.handle_event(event);
            }

            if self.should_quit {
                break;
            }
        }

        self.current_page().on_exit();
        info!("Event loop finished");
        Ok(())
    }

    /// Apply one event, then let the page pick up finished background work
    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Input(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                self.handle_key_event(key)
            }
            AppEvent::Input(Event::Mouse(mouse)) => self.handle_mouse_event(mouse),
            AppEvent::Input(_) | AppEvent::Tick => {}
            AppEvent::Timer(generation) => {
                debug!("Timer {} fired", generation);
                self.current_page().on_timer(generation);
            }
            AppEvent::Notify(message) => self.toast.show(message),
        }
        // Any event may be the first one after a toast's life ran out
        self.toast.expire(Instant::now());
        self.current_page().poll();
    }

    /// Handle keyboard input events
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') if ctrl => {
                self.should_quit = true;
                return;
            }
            KeyCode::F(1) => {
                self.show_help_popup = !self.show_help_popup;
                return;
            }
            KeyCode::F(2) => {
                self.toast.dismiss();
                return;
            }
            _ => {}
        }

        if self.show_help_popup {
            if key.code == KeyCode::Esc {
                self.show_help_popup = false;
            }
            return;
        }

        let action = self.current_page().handle_key(key);
        self.apply_action(action);
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) {
        if self.show_help_popup {
            return;
        }
        let action = self.current_page().handle_mouse(mouse);
        self.apply_action(action);
    }

    /// Draw the UI
    pub fn draw(&mut self, f: &mut Frame) {
        let size = f.size();

        // Page above, status bar at the bottom
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        let screen = self.current_screen;
        self.page_mut(screen).draw(f, chunks[0]);
        self.draw_status_bar(f, chunks[1]);
        self.toast.render(f, chunks[0]);

        if self.show_help_popup {
            self.draw_help_popup(f, size);
        }
    }

    /// Draw status bar with current page info and shortcuts
    fn draw_status_bar(&self, f: &mut Frame, area: Rect) {
        let status_text = format!(
            "DrTransfer - {} ({}) | Esc: Voltar | Ctrl+Q: Sair | F1: Ajuda | F2: Fechar aviso",
            self.current_screen.title(),
            self.current_screen.path(),
        );
        let status_bar = Paragraph::new(status_text)
            .style(Style::default().fg(Color::Gray))
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(status_bar, area);
    }

    /// Draw help popup with context-sensitive shortcuts
    fn draw_help_popup(&self, f: &mut Frame, area: Rect) {
        let popup_area = centered_rect(70, 70, area);
        f.render_widget(Clear, popup_area);

        let help_popup = Paragraph::new(self.get_context_help())
            .block(
                Block::default()
                    .title("Ajuda - Atalhos")
                    .borders(Borders::ALL)
                    .style(Style::default().fg(Color::Yellow)),
            )
            .style(Style::default().fg(Color::White))
            .wrap(Wrap { trim: false });
        f.render_widget(help_popup, popup_area);
    }

    /// Get context-sensitive help content
    fn get_context_help(&self) -> String {
        let global_help = "Atalhos globais:\n\
            Esc - Voltar ao início\n\
            Ctrl+Q / Ctrl+C - Sair\n\
            F1 - Mostrar / esconder esta ajuda\n\
            F2 - Fechar a notificação\n\n";
        let mut help = format!("{}{}", global_help, self.page(self.current_screen).help());

        let recent: Vec<String> = self
            .toast
            .history()
            .iter()
            .rev()
            .take(RECENT_TOASTS)
            .map(|m| match &m.detail {
                Some(detail) => format!(
                    "{} {} - {}",
                    m.severity.icon(),
                    m.summary,
                    detail.replace('\n', "; ")
                ),
                None => format!("{} {}", m.severity.icon(), m.summary),
            })
            .collect();
        if !recent.is_empty() {
            help.push_str("\n\nNotificações recentes:\n");
            help.push_str(&recent.join("\n"));
        }
        help
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::RestClient;
    use crate::console::components::ToastMessage;

    fn app() -> App {
        // Nothing listens on the discard port; every call fails fast
        let client = RestClient::with_client(reqwest::Client::new(), "http://127.0.0.1:9").unwrap();
        App::new(Config::default(), Services::new(client))
    }

    fn press(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
        app.handle_event(AppEvent::Input(Event::Key(KeyEvent::new(code, modifiers))));
    }

    #[test]
    fn test_paths_resolve_both_ways() {
        for screen in Screen::ALL {
            assert_eq!(Screen::from_path(screen.path()), Some(screen));
        }
        assert_eq!(Screen::from_path("regulatory-doctor/"), Some(Screen::RegulatoryDoctor));
        assert_eq!(Screen::from_path(""), Some(Screen::Home));
        assert_eq!(Screen::from_path("/patients"), None);
    }

    #[tokio::test]
    async fn test_menu_shortcut_navigates_and_escape_returns_home() {
        let mut app = app();
        app.start();
        press(&mut app, KeyCode::Char('1'), KeyModifiers::NONE);
        assert_eq!(app.current_screen, Screen::Hospital);
        assert_eq!(app.previous_screen, Some(Screen::Home));

        press(&mut app, KeyCode::Esc, KeyModifiers::NONE);
        assert_eq!(app.current_screen, Screen::Home);
        assert_eq!(app.previous_screen, Some(Screen::Hospital));
    }

    #[tokio::test]
    async fn test_help_popup_swallows_page_keys() {
        let mut app = app();
        app.start();
        press(&mut app, KeyCode::F(1), KeyModifiers::NONE);
        assert!(app.show_help_popup);
        press(&mut app, KeyCode::Char('1'), KeyModifiers::NONE);
        assert_eq!(app.current_screen, Screen::Home);
        press(&mut app, KeyCode::Esc, KeyModifiers::NONE);
        assert!(!app.show_help_popup);
        assert!(app.get_context_help().contains("Início"));
    }

    #[tokio::test]
    async fn test_help_lists_recent_notifications() {
        let mut app = app();
        assert!(!app.get_context_help().contains("Notificações recentes"));

        app.handle_event(AppEvent::Notify(ToastMessage::error("Erro", "Falha ao salvar")));
        app.handle_event(AppEvent::Notify(ToastMessage::success("Sucesso", "Paciente salvo")));
        // Only dismissed toasts are listed
        let help = app.get_context_help();
        assert!(help.contains("Falha ao salvar"));
        assert!(!help.contains("Paciente salvo"));

        press(&mut app, KeyCode::F(2), KeyModifiers::NONE);
        let help = app.get_context_help();
        let newest = help.find("Paciente salvo").unwrap();
        let oldest = help.find("Falha ao salvar").unwrap();
        assert!(newest < oldest);
    }

    #[tokio::test]
    async fn test_notify_shows_toast_and_f2_dismisses() {
        let mut app = app();
        app.handle_event(AppEvent::Notify(ToastMessage::success("Sucesso", "ok")));
        assert_eq!(app.toast.current().map(|m| m.summary.as_str()), Some("Sucesso"));
        press(&mut app, KeyCode::F(2), KeyModifiers::NONE);
        assert!(app.toast.current().is_none());
    }

    #[tokio::test]
    async fn test_toast_expires_while_mouse_keeps_moving() {
        let mut config = Config::default();
        config.ui.toast_life_ms = 30;
        let client = RestClient::with_client(reqwest::Client::new(), "http://127.0.0.1:9").unwrap();
        let mut app = App::new(config, Services::new(client));
        app.start();
        app.handle_event(AppEvent::Notify(ToastMessage::info("Aviso", "em andamento")));

        let moved = |column| {
            AppEvent::Input(Event::Mouse(MouseEvent {
                kind: crossterm::event::MouseEventKind::Moved,
                column,
                row: 1,
                modifiers: KeyModifiers::NONE,
            }))
        };
        app.handle_event(moved(1));
        assert!(app.toast.current().is_some());

        // Only motion arrives, no tick, until well past the toast life
        for column in 2..6 {
            std::thread::sleep(std::time::Duration::from_millis(10));
            app.handle_event(moved(column));
        }
        assert!(app.toast.current().is_none());
    }

    #[tokio::test]
    async fn test_ctrl_q_quits_from_any_page() {
        let mut app = app();
        app.set_initial_screen(Screen::Patient);
        app.start();
        press(&mut app, KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert!(app.should_quit);
    }
}
