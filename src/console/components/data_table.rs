//! Tabular list of records with optional row actions

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::console::ui::{contains, pad, text_width, Styles};
use crate::models::Record;

pub const ACTIONS_HEADER: &str = "Ações";
pub const EDIT_LABEL: &str = "[Editar]";
pub const DELETE_LABEL: &str = "[Excluir]";
pub const DEFAULT_EMPTY_MESSAGE: &str = "Nenhum registro encontrado";

pub type CellRenderer<T> = Arc<dyn Fn(&T) -> String + Send + Sync>;
pub type CellStyler<T> = Arc<dyn Fn(&T) -> Style + Send + Sync>;

/// Column descriptor
pub struct Column<T> {
    pub field: String,
    pub header: String,
    render: Option<CellRenderer<T>>,
    style: Option<CellStyler<T>>,
}

impl<T> Clone for Column<T> {
    fn clone(&self) -> Self {
        Self {
            field: self.field.clone(),
            header: self.header.clone(),
            render: self.render.clone(),
            style: self.style.clone(),
        }
    }
}

impl<T: Record> Column<T> {
    pub fn new(field: &str, header: &str) -> Self {
        Self {
            field: field.to_string(),
            header: header.to_string(),
            render: None,
            style: None,
        }
    }

    pub fn with_render<F>(mut self, render: F) -> Self
    where
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        self.render = Some(Arc::new(render));
        self
    }

    pub fn with_style<F>(mut self, style: F) -> Self
    where
        F: Fn(&T) -> Style + Send + Sync + 'static,
    {
        self.style = Some(Arc::new(style));
        self
    }

    /// Cell text: the custom renderer when present, otherwise the raw field
    pub fn text(&self, row: &T) -> String {
        match &self.render {
            Some(render) => render(row),
            None => row.field(&self.field).unwrap_or_default(),
        }
    }

    pub fn cell_style(&self, row: &T) -> Style {
        self.style.as_ref().map(|s| s(row)).unwrap_or_default()
    }
}

/// One projected body row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableRow {
    Data { cells: Vec<String> },
    /// Shown instead of data when there are no rows
    Placeholder { text: String, colspan: usize },
}

/// Pure projection of rows through the column descriptors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    pub header: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl TableView {
    /// Plain-text rendering with aligned columns, used by `--cli`
    pub fn to_plain_text(&self) -> String {
        let mut widths: Vec<usize> = self.header.iter().map(|h| text_width(h)).collect();
        for row in &self.rows {
            if let TableRow::Data { cells } = row {
                for (i, cell) in cells.iter().enumerate() {
                    if let Some(w) = widths.get_mut(i) {
                        *w = (*w).max(text_width(cell)).min(40);
                    }
                }
            }
        }

        let line = |cells: &[String]| -> String {
            cells
                .iter()
                .zip(&widths)
                .map(|(c, &w)| pad(c, w))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        let total: usize = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
        let mut out = vec![line(&self.header), "-".repeat(total)];
        for row in &self.rows {
            match row {
                TableRow::Data { cells } => out.push(line(cells)),
                TableRow::Placeholder { text, .. } => out.push(text.clone()),
            }
        }
        out.join("\n")
    }
}

/// What a click or key on the table means. Exactly one per input.
#[derive(Debug, PartialEq)]
pub enum TableEvent<'a, T> {
    RowClick(&'a T),
    Edit(&'a T),
    Delete(&'a T),
}

impl<'a, T> TableEvent<'a, T> {
    pub fn record(&self) -> &'a T {
        match *self {
            TableEvent::RowClick(r) | TableEvent::Edit(r) | TableEvent::Delete(r) => r,
        }
    }
}

impl<'a, T: Clone> TableEvent<'a, T> {
    /// Detach the event from the row slice so the caller can mutate its state
    pub fn to_action(&self) -> RowAction<T> {
        match *self {
            TableEvent::RowClick(r) => RowAction::Open(r.clone()),
            TableEvent::Edit(r) => RowAction::Edit(r.clone()),
            TableEvent::Delete(r) => RowAction::Delete(r.clone()),
        }
    }
}

/// Owned counterpart of [`TableEvent`]
#[derive(Debug, Clone, PartialEq)]
pub enum RowAction<T> {
    Open(T),
    Edit(T),
    Delete(T),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActionKind {
    Edit,
    Delete,
}

/// Table component. Selection (`TableState`) belongs to the caller.
pub struct DataTable<T> {
    columns: Vec<Column<T>>,
    title: Option<String>,
    empty_message: String,
    row_click: bool,
    show_edit: bool,
    show_delete: bool,
    loading: bool,
    area: Rect,
    column_areas: Vec<Rect>,
}

impl<T: Record> DataTable<T> {
    pub fn new(columns: Vec<Column<T>>) -> Self {
        Self {
            columns,
            title: None,
            empty_message: DEFAULT_EMPTY_MESSAGE.to_string(),
            row_click: false,
            show_edit: false,
            show_delete: false,
            loading: false,
            area: Rect::default(),
            column_areas: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn with_empty_message(mut self, message: &str) -> Self {
        self.empty_message = message.to_string();
        self
    }

    pub fn with_row_click(mut self) -> Self {
        self.row_click = true;
        self
    }

    pub fn with_edit(mut self) -> Self {
        self.show_edit = true;
        self
    }

    pub fn with_delete(mut self) -> Self {
        self.show_delete = true;
        self
    }

    pub fn set_columns(&mut self, columns: Vec<Column<T>>) {
        self.columns = columns;
    }

    /// While loading the placeholder reads "Carregando..."
    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn has_actions(&self) -> bool {
        self.show_edit || self.show_delete
    }

    /// Number of rendered columns, action column included
    pub fn column_count(&self) -> usize {
        self.columns.len() + usize::from(self.has_actions())
    }

    fn actions(&self) -> Vec<ActionKind> {
        let mut actions = Vec::new();
        if self.show_edit {
            actions.push(ActionKind::Edit);
        }
        if self.show_delete {
            actions.push(ActionKind::Delete);
        }
        actions
    }

    fn action_text(&self) -> String {
        self.actions()
            .iter()
            .map(|a| match a {
                ActionKind::Edit => EDIT_LABEL,
                ActionKind::Delete => DELETE_LABEL,
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn placeholder_text(&self) -> String {
        if self.loading {
            "Carregando...".to_string()
        } else {
            self.empty_message.clone()
        }
    }

    pub fn project(&self, rows: &[T]) -> TableView {
        let mut header: Vec<String> = self.columns.iter().map(|c| c.header.clone()).collect();
        if self.has_actions() {
            header.push(ACTIONS_HEADER.to_string());
        }

        if rows.is_empty() {
            return TableView {
                header,
                rows: vec![TableRow::Placeholder {
                    text: self.placeholder_text(),
                    colspan: self.column_count(),
                }],
            };
        }

        let actions = self.action_text();
        let body = rows
            .iter()
            .map(|row| {
                let mut cells: Vec<String> = self.columns.iter().map(|c| c.text(row)).collect();
                if self.has_actions() {
                    cells.push(actions.clone());
                }
                TableRow::Data { cells }
            })
            .collect();

        TableView { header, rows: body }
    }

    /// Enter on the highlighted row
    pub fn activate<'a>(&self, rows: &'a [T], index: usize) -> Option<TableEvent<'a, T>> {
        if !self.row_click {
            return None;
        }
        rows.get(index).map(TableEvent::RowClick)
    }

    /// Keyboard shortcuts on the highlighted row
    pub fn handle_key<'a>(
        &self,
        key: KeyEvent,
        rows: &'a [T],
        state: &mut TableState,
    ) -> Option<TableEvent<'a, T>> {
        match key.code {
            KeyCode::Up => {
                select_prev(state, rows.len());
                None
            }
            KeyCode::Down => {
                select_next(state, rows.len());
                None
            }
            KeyCode::Home => {
                if !rows.is_empty() {
                    state.select(Some(0));
                }
                None
            }
            KeyCode::End => {
                if !rows.is_empty() {
                    state.select(Some(rows.len() - 1));
                }
                None
            }
            KeyCode::Enter => state.selected().and_then(|i| self.activate(rows, i)),
            KeyCode::Char('e') if self.show_edit => {
                state.selected().and_then(|i| rows.get(i)).map(TableEvent::Edit)
            }
            KeyCode::Char('d') | KeyCode::Delete if self.show_delete => {
                state.selected().and_then(|i| rows.get(i)).map(TableEvent::Delete)
            }
            _ => None,
        }
    }

    /// Whether (`column`, `row`) lies on the table as last rendered
    pub fn contains(&self, column: u16, row: u16) -> bool {
        contains(self.area, column, row)
    }

    /// Map a click at terminal cell (`column`, `row`) to a table event.
    ///
    /// A click on an action button yields only that action; a click
    /// anywhere else on a data row yields a row click when enabled.
    pub fn hit_test<'a>(
        &self,
        rows: &'a [T],
        state: &TableState,
        column: u16,
        row: u16,
    ) -> Option<TableEvent<'a, T>> {
        let inner = inner_area(self.area);
        if !contains(inner, column, row) || row <= inner.y {
            return None;
        }
        let index = (row - inner.y - 1) as usize + state.offset();
        let record = rows.get(index)?;

        if self.has_actions() {
            if let Some(actions_area) = self.column_areas.last() {
                if contains(*actions_area, column, inner.y) {
                    let offset = (column - actions_area.x) as usize;
                    return match self.action_at(offset) {
                        Some(ActionKind::Edit) => Some(TableEvent::Edit(record)),
                        Some(ActionKind::Delete) => Some(TableEvent::Delete(record)),
                        None if self.row_click => Some(TableEvent::RowClick(record)),
                        None => None,
                    };
                }
            }
        }

        if self.row_click {
            Some(TableEvent::RowClick(record))
        } else {
            None
        }
    }

    /// Which button covers the given cell offset inside the action cell
    fn action_at(&self, offset: usize) -> Option<ActionKind> {
        // Cells start with one column of padding
        let mut start = 1;
        for action in self.actions() {
            let width = match action {
                ActionKind::Edit => text_width(EDIT_LABEL),
                ActionKind::Delete => text_width(DELETE_LABEL),
            };
            if offset >= start && offset < start + width {
                return Some(action);
            }
            start += width + 1;
        }
        None
    }

    fn column_constraints(&self) -> Vec<Constraint> {
        let data = self.columns.len().max(1) as u32;
        let mut constraints: Vec<Constraint> = self
            .columns
            .iter()
            .map(|_| Constraint::Ratio(1, data))
            .collect();
        if self.has_actions() {
            constraints.push(Constraint::Length(text_width(&self.action_text()) as u16 + 2));
        }
        constraints
    }

    pub fn render(
        &mut self,
        f: &mut Frame,
        area: Rect,
        rows: &[T],
        state: &mut TableState,
        focused: bool,
    ) {
        self.area = area;
        let inner = inner_area(area);
        let constraints = self.column_constraints();
        self.column_areas = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(constraints)
            .split(inner)
            .to_vec();
        let widths: Vec<Constraint> = self
            .column_areas
            .iter()
            .map(|r| Constraint::Length(r.width))
            .collect();

        let view = self.project(rows);
        let header = Row::new(
            view.header
                .iter()
                .map(|h| Cell::from(format!(" {}", h)).style(Styles::header())),
        );

        let body: Vec<Row> = if rows.is_empty() {
            Vec::new()
        } else {
            rows.iter()
                .zip(&view.rows)
                .map(|(record, projected)| {
                    let cells = match projected {
                        TableRow::Data { cells } => cells.clone(),
                        TableRow::Placeholder { text, .. } => vec![text.clone()],
                    };
                    Row::new(cells.into_iter().enumerate().map(|(i, text)| {
                        match self.columns.get(i) {
                            Some(column) => {
                                Cell::from(format!(" {}", text)).style(column.cell_style(record))
                            }
                            None => Cell::from(Line::from(vec![
                                Span::raw(" "),
                                Span::styled(text, Styles::action()),
                            ])),
                        }
                    }))
                })
                .collect()
        };

        let border_style = if focused {
            Styles::active_border()
        } else {
            Styles::inactive_border()
        };
        let mut block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style);
        if let Some(title) = &self.title {
            block = block.title(title.clone());
        }

        let table = Table::new(body, widths)
            .header(header)
            .block(block)
            .column_spacing(0)
            .highlight_style(Styles::selected());
        f.render_stateful_widget(table, area, state);

        if rows.is_empty() && inner.height > 1 {
            let placeholder_area = Rect {
                x: inner.x,
                y: inner.y + 1,
                width: inner.width,
                height: 1,
            };
            let placeholder = Paragraph::new(self.placeholder_text())
                .style(Styles::inactive())
                .alignment(Alignment::Center);
            f.render_widget(placeholder, placeholder_area);
        }
    }
}

fn inner_area(area: Rect) -> Rect {
    Rect {
        x: area.x.saturating_add(1),
        y: area.y.saturating_add(1),
        width: area.width.saturating_sub(2),
        height: area.height.saturating_sub(2),
    }
}

pub fn select_next(state: &mut TableState, len: usize) {
    if len == 0 {
        state.select(None);
        return;
    }
    let next = match state.selected() {
        Some(i) if i + 1 < len => i + 1,
        Some(_) => 0,
        None => 0,
    };
    state.select(Some(next));
}

pub fn select_prev(state: &mut TableState, len: usize) {
    if len == 0 {
        state.select(None);
        return;
    }
    let prev = match state.selected() {
        Some(0) | None => len - 1,
        Some(i) => (i - 1).min(len - 1),
    };
    state.select(Some(prev));
}

/// Keep a selection inside `len` rows after the list changed
pub fn clamp_selection(state: &mut TableState, len: usize) {
    match state.selected() {
        _ if len == 0 => state.select(None),
        Some(i) if i >= len => state.select(Some(len - 1)),
        None => state.select(Some(0)),
        _ => {}
    }
}
