//! Start page: the sidebar of the console as a menu

use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::console::{
    app::Screen,
    traits::{Navigable, Page, ScreenAction},
    ui::{contains, Styles},
};

/// Menu entries in sidebar order; the shortcut is the 1-based position
pub const MENU: [(Screen, &str); 7] = [
    (Screen::Hospital, "Hospitais"),
    (Screen::Specialty, "Especialidades"),
    (Screen::Patient, "Pacientes"),
    (Screen::Doctor, "Médicos"),
    (Screen::RegulatoryDoctor, "Médicos Reguladores"),
    (Screen::Request, "Solicitações"),
    (Screen::Transfer, "Transferências"),
];

pub struct HomePage {
    state: ListState,
    menu_area: Rect,
}

impl Default for HomePage {
    fn default() -> Self {
        Self::new()
    }
}

impl HomePage {
    pub fn new() -> Self {
        let mut state = ListState::default();
        state.select(Some(0));
        Self {
            state,
            menu_area: Rect::default(),
        }
    }

    fn open_selected(&self) -> ScreenAction {
        self.state
            .selected()
            .and_then(|i| MENU.get(i))
            .map(|(screen, _)| ScreenAction::NavigateTo(*screen))
            .unwrap_or(ScreenAction::None)
    }

    fn draw_title(&self, f: &mut Frame, area: Rect) {
        let title = Paragraph::new(vec![
            Line::from(Span::styled(
                "DrTransfer",
                Styles::title().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Regulação e transferência de pacientes",
                Styles::info(),
            )),
        ])
        .block(Block::default().borders(Borders::ALL));
        f.render_widget(title, area);
    }

    fn draw_instructions(&self, f: &mut Frame, area: Rect) {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let instructions = vec![
            Line::from(vec![
                Span::styled("Navegação: ", Styles::info()),
                Span::raw("↑/↓ para mover, "),
                Span::styled("Enter", bold),
                Span::raw(" para abrir"),
            ]),
            Line::from(vec![
                Span::styled("Atalhos: ", Styles::info()),
                Span::styled("1-7", bold),
                Span::raw(" acesso direto, "),
                Span::styled("q", bold),
                Span::raw(" para sair"),
            ]),
            Line::from(vec![
                Span::styled("Global: ", Styles::info()),
                Span::styled("F1", bold),
                Span::raw(" ajuda, "),
                Span::styled("Esc", bold),
                Span::raw(" volta ao início"),
            ]),
        ];
        let paragraph = Paragraph::new(instructions).block(
            Block::default()
                .title("Instruções")
                .borders(Borders::ALL)
                .border_style(Styles::inactive_border()),
        );
        f.render_widget(paragraph, area);
    }
}

impl Navigable for HomePage {
    fn navigate_up(&mut self) {
        let i = match self.state.selected() {
            Some(0) | None => MENU.len() - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    fn navigate_down(&mut self) {
        let i = match self.state.selected() {
            Some(i) if i + 1 < MENU.len() => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    fn get_selected_index(&self) -> Option<usize> {
        self.state.selected()
    }

    fn set_selected_index(&mut self, index: Option<usize>) {
        self.state.select(index);
    }

    fn get_item_count(&self) -> usize {
        MENU.len()
    }
}

impl Page for HomePage {
    fn draw(&mut self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(0),
                Constraint::Length(5),
            ])
            .split(area);

        self.draw_title(f, chunks[0]);

        let items: Vec<ListItem> = MENU
            .iter()
            .enumerate()
            .map(|(i, (screen, label))| {
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{} ", i + 1), Styles::action()),
                    Span::raw(format!("{:<22}", label)),
                    Span::styled(screen.path(), Styles::inactive()),
                ]))
            })
            .collect();
        let list = List::new(items)
            .block(
                Block::default()
                    .title("Menu")
                    .borders(Borders::ALL)
                    .border_style(Styles::active_border()),
            )
            .highlight_style(Styles::selected())
            .highlight_symbol("▶ ");
        self.menu_area = chunks[1];
        f.render_stateful_widget(list, chunks[1], &mut self.state);

        self.draw_instructions(f, chunks[2]);
    }

    fn handle_key(&mut self, key: KeyEvent) -> ScreenAction {
        match key.code {
            KeyCode::Up => self.navigate_up(),
            KeyCode::Down => self.navigate_down(),
            KeyCode::Home => self.navigate_to_first(),
            KeyCode::End => self.navigate_to_last(),
            KeyCode::Enter => return self.open_selected(),
            KeyCode::Char('q') => return ScreenAction::Quit,
            KeyCode::Char(c) => {
                if let Some((screen, _)) = c
                    .to_digit(10)
                    .and_then(|d| (d as usize).checked_sub(1))
                    .and_then(|i| MENU.get(i))
                {
                    return ScreenAction::NavigateTo(*screen);
                }
            }
            _ => {}
        }
        ScreenAction::None
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> ScreenAction {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left)
            || !contains(self.menu_area, mouse.column, mouse.row)
        {
            return ScreenAction::None;
        }
        let first = self.menu_area.y + 1;
        if mouse.row < first {
            return ScreenAction::None;
        }
        let index = (mouse.row - first) as usize + self.state.offset();
        if index < MENU.len() {
            self.state.select(Some(index));
            return self.open_selected();
        }
        ScreenAction::None
    }

    fn help(&self) -> &'static str {
        "Início:\n\
        ↑/↓ - Navegar\n\
        Enter / clique - Abrir página\n\
        1-7 - Abrir página pelo número\n\
        q - Sair"
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
    fn test_digit_shortcuts_follow_sidebar_order() {
        let mut home = HomePage::new();
        assert_eq!(
            home.handle_key(key(KeyCode::Char('1'))),
            ScreenAction::NavigateTo(Screen::Hospital)
        );
        assert_eq!(
            home.handle_key(key(KeyCode::Char('7'))),
            ScreenAction::NavigateTo(Screen::Transfer)
        );
        assert_eq!(home.handle_key(key(KeyCode::Char('8'))), ScreenAction::None);
        assert_eq!(home.handle_key(key(KeyCode::Char('0'))), ScreenAction::None);
    }

    #[test]
    fn test_navigation_wraps_and_enter_opens() {
        let mut home = HomePage::new();
        home.navigate_up();
        assert_eq!(home.get_selected_index(), Some(6));
        home.navigate_down();
        assert_eq!(home.get_selected_index(), Some(0));
        home.navigate_down();
        assert_eq!(
            home.handle_key(key(KeyCode::Enter)),
            ScreenAction::NavigateTo(Screen::Specialty)
        );
    }
}
