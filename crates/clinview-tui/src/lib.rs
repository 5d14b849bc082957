// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use clinview_core::{
    Collection, PageSize, Workspace, WorkspaceCommand, WorkspaceEvent, header_label,
    truncate_label, view_summary,
};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Tabs};
use std::io;
use std::time::Duration;

const PAGE_SIZE_STEPS: [usize; 3] = [10, 25, 50];
const MAX_CELL_CHARS: usize = 40;
const POLL_INTERVAL: Duration = Duration::from_millis(120);
const TAB_SEPARATOR: &str = "  ";

pub trait WorkspaceRuntime {
    /// Reloads the collection registered at `section`. `Ok(None)` means the
    /// source has nothing for it.
    fn refresh_collection(&mut self, section: &[String]) -> Result<Option<Collection>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum InputMode {
    #[default]
    Nav,
    Search,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct UiState {
    mode: InputMode,
    selected_row: usize,
    selected_col: usize,
    status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum UiCommand {
    Workspace(WorkspaceCommand),
    MoveRow(isize),
    MoveColumn(isize),
    SortColumn,
    CyclePageSize,
    StartSearch,
    Refresh,
    Quit,
}

pub fn run_app<R: WorkspaceRuntime>(workspace: &mut Workspace, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut ui = UiState::default();
    let mut result = Ok(());
    loop {
        if let Err(error) = terminal.draw(|frame| render(frame, workspace, &ui)) {
            result = Err(error).context("draw frame");
            break;
        }

        match next_key(POLL_INTERVAL) {
            Ok(Some(key)) => {
                if handle_key_event(workspace, runtime, &mut ui, key) {
                    break;
                }
            }
            Ok(None) => {}
            Err(error) => {
                result = Err(error);
                break;
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn next_key(timeout: Duration) -> Result<Option<KeyEvent>> {
    if !event::poll(timeout).context("poll event")? {
        return Ok(None);
    }
    match event::read().context("read event")? {
        Event::Key(key) if key.kind == KeyEventKind::Press => Ok(Some(key)),
        _ => Ok(None),
    }
}

/// Returns true when the app should quit.
fn handle_key_event<R: WorkspaceRuntime>(
    workspace: &mut Workspace,
    runtime: &mut R,
    ui: &mut UiState,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if ui.mode == InputMode::Search {
        handle_search_key(workspace, ui, key);
        return false;
    }

    match command_for_key(key) {
        Some(command) => apply_command(workspace, runtime, ui, command),
        None => false,
    }
}

fn command_for_key(key: KeyEvent) -> Option<UiCommand> {
    let rotate = |level, delta| UiCommand::Workspace(WorkspaceCommand::Rotate { level, delta });
    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), KeyModifiers::NONE) => Some(UiCommand::Quit),
        (KeyCode::Tab, _) => Some(rotate(0, 1)),
        (KeyCode::BackTab, _) => Some(rotate(0, -1)),
        (KeyCode::Char(']'), _) => Some(rotate(1, 1)),
        (KeyCode::Char('['), _) => Some(rotate(1, -1)),
        (KeyCode::Char('j'), _) | (KeyCode::Down, _) => Some(UiCommand::MoveRow(1)),
        (KeyCode::Char('k'), _) | (KeyCode::Up, _) => Some(UiCommand::MoveRow(-1)),
        (KeyCode::Char('h'), _) | (KeyCode::Left, _) => Some(UiCommand::MoveColumn(-1)),
        (KeyCode::Char('l'), _) | (KeyCode::Right, _) => Some(UiCommand::MoveColumn(1)),
        (KeyCode::Char('s'), KeyModifiers::NONE) => Some(UiCommand::SortColumn),
        (KeyCode::Char('S'), _) => Some(UiCommand::Workspace(WorkspaceCommand::ClearSort)),
        (KeyCode::Char('/'), _) => Some(UiCommand::StartSearch),
        (KeyCode::Char('p'), KeyModifiers::NONE) => Some(UiCommand::CyclePageSize),
        (KeyCode::Char('n'), KeyModifiers::NONE) => {
            Some(UiCommand::Workspace(WorkspaceCommand::NextPage))
        }
        (KeyCode::Char('N'), _) => Some(UiCommand::Workspace(WorkspaceCommand::PrevPage)),
        (KeyCode::Char('r'), KeyModifiers::NONE) => Some(UiCommand::Refresh),
        _ => None,
    }
}

fn apply_command<R: WorkspaceRuntime>(
    workspace: &mut Workspace,
    runtime: &mut R,
    ui: &mut UiState,
    command: UiCommand,
) -> bool {
    match command {
        UiCommand::Quit => return true,
        UiCommand::Workspace(command) => dispatch(workspace, ui, command),
        UiCommand::MoveRow(delta) => {
            ui.selected_row = step(ui.selected_row, delta, workspace.view_result().rows.len());
        }
        UiCommand::MoveColumn(delta) => {
            ui.selected_col = step(ui.selected_col, delta, workspace.active_fields().len());
        }
        UiCommand::SortColumn => {
            let key = workspace
                .active_fields()
                .get(ui.selected_col)
                .map(|field| field.key.clone());
            match key {
                Some(key) => dispatch(workspace, ui, WorkspaceCommand::SetSort(key)),
                None => ui.status = Some("no column to sort".to_owned()),
            }
        }
        UiCommand::CyclePageSize => {
            let current = workspace
                .active_controller()
                .map(|controller| controller.state().page_size());
            match current {
                Some(size) => dispatch(
                    workspace,
                    ui,
                    WorkspaceCommand::SetPageSize(next_page_size(size)),
                ),
                None => ui.status = Some("nothing to page".to_owned()),
            }
        }
        UiCommand::StartSearch => {
            if workspace.active_controller().is_some() {
                ui.mode = InputMode::Search;
            } else {
                ui.status = Some("nothing to search".to_owned());
            }
        }
        UiCommand::Refresh => refresh_active(workspace, runtime, ui),
    }
    clamp_cursor(workspace, ui);
    false
}

fn handle_search_key(workspace: &mut Workspace, ui: &mut UiState, key: KeyEvent) {
    let mut text = workspace
        .active_controller()
        .map(|controller| controller.state().search_text().to_owned())
        .unwrap_or_default();

    let command = match (key.code, key.modifiers) {
        (KeyCode::Enter, _) | (KeyCode::Esc, _) => {
            ui.mode = InputMode::Nav;
            return;
        }
        (KeyCode::Char('u'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            WorkspaceCommand::ClearSearch
        }
        (KeyCode::Backspace, _) => {
            text.pop();
            WorkspaceCommand::SetSearchText(text)
        }
        (KeyCode::Char(ch), modifiers) if !modifiers.contains(KeyModifiers::CONTROL) => {
            text.push(ch);
            WorkspaceCommand::SetSearchText(text)
        }
        _ => return,
    };

    dispatch(workspace, ui, command);
    clamp_cursor(workspace, ui);
}

fn dispatch(workspace: &mut Workspace, ui: &mut UiState, command: WorkspaceCommand) {
    match workspace.dispatch(command) {
        Ok(events) => {
            for event in &events {
                match event {
                    WorkspaceEvent::PathChanged(_) => {
                        ui.selected_row = 0;
                        ui.selected_col = 0;
                    }
                    WorkspaceEvent::SortIgnored(_) => {}
                    _ => ui.selected_row = 0,
                }
            }
            if let Some(event) = events.last() {
                ui.status = Some(event.message());
            }
        }
        Err(error) => ui.status = Some(error.to_string()),
    }
}

fn refresh_active<R: WorkspaceRuntime>(
    workspace: &mut Workspace,
    runtime: &mut R,
    ui: &mut UiState,
) {
    let Some(section) = workspace.active_section_path().cloned() else {
        ui.status = Some("nothing to refresh".to_owned());
        return;
    };
    match runtime.refresh_collection(&section) {
        Ok(Some(collection)) => match workspace.replace_collection(section, collection) {
            Ok(event) => ui.status = Some(event.message()),
            Err(error) => ui.status = Some(error.to_string()),
        },
        Ok(None) => ui.status = Some(format!("no data for {}", section.join(" / "))),
        Err(error) => {
            tracing::warn!(section = ?section, error = %format!("{error:#}"), "refresh failed");
            ui.status = Some(format!("refresh failed: {error:#}"));
        }
    }
}

fn clamp_cursor(workspace: &Workspace, ui: &mut UiState) {
    let rows = workspace.view_result().rows.len();
    let columns = workspace.active_fields().len();
    ui.selected_row = ui.selected_row.min(rows.saturating_sub(1));
    ui.selected_col = ui.selected_col.min(columns.saturating_sub(1));
}

fn step(current: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    current.saturating_add_signed(delta).min(len - 1)
}

fn next_page_size(current: PageSize) -> PageSize {
    match current.rows() {
        None => PageSize::Rows(PAGE_SIZE_STEPS[0]),
        Some(rows) => PAGE_SIZE_STEPS
            .iter()
            .copied()
            .find(|step| *step > rows)
            .map(PageSize::Rows)
            .unwrap_or(PageSize::All),
    }
}

fn level_titles(workspace: &Workspace, level: usize) -> Vec<String> {
    workspace
        .navigation()
        .siblings(level)
        .map(|nodes| nodes.iter().map(|node| node.name.clone()).collect())
        .unwrap_or_default()
}

fn render(frame: &mut ratatui::Frame<'_>, workspace: &Workspace, ui: &UiState) {
    let navigation = workspace.navigation();
    let sub_tab_height = if navigation.depth() > 1 { 1 } else { 0 };
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(sub_tab_height),
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let tabs = Tabs::new(level_titles(workspace, 0))
        .block(Block::default().title("clinview").borders(Borders::ALL))
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .select(navigation.active_index(0).unwrap_or(0));
    frame.render_widget(tabs, layout[0]);

    if sub_tab_height > 0 {
        let strip = render_tab_strip_text(&level_titles(workspace, 1), navigation.active_index(1));
        frame.render_widget(
            Paragraph::new(format!(" {strip}")).style(Style::default().fg(Color::Gray)),
            layout[1],
        );
    }

    frame.render_widget(
        Paragraph::new(search_line_text(workspace, ui)).style(Style::default().fg(Color::Cyan)),
        layout[2],
    );

    render_table(frame, layout[3], workspace, ui);

    let status_widget = Paragraph::new(status_text(ui))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status_widget, layout[4]);
}

fn render_table(frame: &mut ratatui::Frame<'_>, area: Rect, workspace: &Workspace, ui: &UiState) {
    let block = Block::default()
        .title(table_title(workspace))
        .borders(Borders::ALL);
    let Some(controller) = workspace.active_controller() else {
        frame.render_widget(Paragraph::new(String::new()).block(block), area);
        return;
    };

    let fields = controller.collection().fields();
    let state = controller.state();
    let result = controller.view_result();

    let header_cells = fields.iter().enumerate().map(|(column_index, field)| {
        let mut style = Style::default().add_modifier(Modifier::BOLD);
        style = if column_index == ui.selected_col {
            style.fg(Color::Cyan)
        } else {
            style.fg(Color::White)
        };
        Cell::from(header_label(field, state)).style(style)
    });

    let rows = result.rows.iter().enumerate().map(|(row_index, row)| {
        let selected_row = row_index == ui.selected_row;
        let cells = fields
            .iter()
            .enumerate()
            .map(|(column_index, field)| {
                let cell_text = truncate_label(&row.field_text(&field.key), MAX_CELL_CHARS);
                let mut style = Style::default();
                if selected_row {
                    style = style.bg(Color::DarkGray);
                }
                if selected_row && column_index == ui.selected_col {
                    style = Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD);
                }
                Cell::from(cell_text).style(style)
            })
            .collect::<Vec<_>>();
        Row::new(cells)
    });

    let widths = vec![Constraint::Min(8); fields.len().max(1)];
    let table = Table::new(rows, widths)
        .header(Row::new(header_cells))
        .column_spacing(1)
        .block(block);
    let mut table_state = TableState::default().with_selected(Some(ui.selected_row));
    frame.render_stateful_widget(table, area, &mut table_state);
}

fn render_tab_strip_text(names: &[String], selected: Option<usize>) -> String {
    names
        .iter()
        .enumerate()
        .map(|(index, name)| {
            if Some(index) == selected {
                format!("[{name}]")
            } else {
                name.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(TAB_SEPARATOR)
}

fn search_line_text(workspace: &Workspace, ui: &UiState) -> String {
    let text = workspace
        .active_controller()
        .map(|controller| controller.state().search_text())
        .unwrap_or_default();
    match ui.mode {
        InputMode::Search => format!("/{text}_"),
        InputMode::Nav if text.is_empty() => String::new(),
        InputMode::Nav => format!("/{text}"),
    }
}

fn table_title(workspace: &Workspace) -> String {
    let path = workspace.active_path().join(" / ");
    match workspace.active_controller() {
        Some(controller) => format!(
            "{path} | {}",
            view_summary(controller.view_result(), controller.state())
        ),
        None => format!("{path} | no data"),
    }
}

fn status_text(ui: &UiState) -> String {
    let (mode, keys) = match ui.mode {
        InputMode::Nav => (
            "NAV",
            "tab/[] sections | h/j/k/l | s/S sort | / search | p n/N pages | r refresh | q",
        ),
        InputMode::Search => ("SEARCH", "type to filter | backspace | ctrl+u clear | enter/esc"),
    };
    match &ui.status {
        Some(status) => format!("{mode} | {status} | {keys}"),
        None => format!("{mode} | {keys}"),
    }
}
