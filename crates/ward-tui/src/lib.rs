// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table};
use regex::Regex;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use time::{Date, Month};
use ward_app::{
    AppCommand, AppMode, AppState, FormKind, FormPayload, PageKind, PatientColumn,
    PatientFormInput, PatientId, PhotoColumn, PhotoImportInput,
};
use ward_grid::{
    Axis, CellRect, CellRef, CommitOutcome, DateDelegate, DateEditor, DateTimeEditor,
    EditableTable, Editor, FieldDelegate, FieldFormats, TabularSource,
};

const HALF_PAGE_ROWS: isize = 10;
const FULL_PAGE_ROWS: isize = 20;
/// Six record fields plus the panel borders.
const RECORD_PANEL_HEIGHT: u16 = 8;
const GUTTER_MIN: u16 = 2;
const GUTTER_MAX: u16 = 16;
const CELL_MIN_WIDTH: u16 = 8;

/// The three tabular surfaces the screens work over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridId {
    Patients,
    Record,
    Photos,
}

impl GridId {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Patients => "patients",
            Self::Record => "record",
            Self::Photos => "photos",
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Patients => 0,
            Self::Record => 1,
            Self::Photos => 2,
        }
    }
}

impl Default for GridId {
    fn default() -> Self {
        Self::Patients
    }
}

/// Storage-facing surface the terminal screens drive. Implementations own the
/// three tables, the per-patient filters behind the detail page, and photo
/// blob import/export.
pub trait AppRuntime {
    /// Live cell source for a grid. The record grid is served through its
    /// sideways adapter, so rows are fields and columns are records.
    fn grid(&mut self, id: GridId) -> &mut dyn TabularSource;

    /// Editable table behind a grid, for row operations and persistence. For
    /// the record grid this is the underlying table, not the adapter.
    fn table(&mut self, id: GridId) -> &mut dyn EditableTable;

    /// Points the record and photo tables at one patient and reloads them.
    fn open_patient(&mut self, patient: PatientId) -> Result<()>;

    /// Drops the per-patient filters and reloads the patient list.
    fn close_patient(&mut self) -> Result<()>;

    /// Reads an image file and stores it as a photo of the given patient.
    fn import_photo(&mut self, patient: PatientId, path: &Path) -> Result<()>;

    /// Writes one photo's bytes to a cache file and returns its path.
    fn export_photo(&mut self, row: usize) -> Result<PathBuf>;

    /// Database id of a patient row, if the row has been persisted.
    fn patient_row_id(&self, row: usize) -> Option<PatientId>;

    fn formats(&self) -> &FieldFormats;

    /// Whether the patient list banner shows the row count.
    fn show_patient_count(&self) -> bool {
        true
    }
}

enum InternalEvent {
    ClearStatus { token: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct CellCursor {
    row: usize,
    column: usize,
}

/// One live cell edit: which cell, the delegate that owns the rules, and the
/// editor state the keys feed.
#[derive(Debug, Clone)]
struct EditSession {
    grid: GridId,
    at: CellRef,
    label: String,
    delegate: FieldDelegate,
    editor: Editor,
}

#[derive(Debug, Clone)]
struct FormUiState {
    kind: FormKind,
    field_index: usize,
    values: Vec<String>,
}

#[derive(Debug, Default)]
struct ViewData {
    focus: GridId,
    cursors: [CellCursor; 3],
    edit: Option<EditSession>,
    form: Option<FormUiState>,
    help_visible: bool,
    status_token: u64,
}

impl ViewData {
    fn cursor(&self, grid: GridId) -> CellCursor {
        self.cursors[grid.index()]
    }

    fn cursor_mut(&mut self, grid: GridId) -> &mut CellCursor {
        &mut self.cursors[grid.index()]
    }
}

/// Runs the terminal frontend until the user quits. Takes over the terminal
/// in raw mode and restores it on the way out.
pub fn run_app<R: AppRuntime>(state: &mut AppState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();

    if let Err(error) = runtime.table(GridId::Patients).select() {
        state.dispatch(AppCommand::SetStatus(format!("load failed: {error:#}")));
    }

    let mut result = Ok(());
    loop {
        process_internal_events(state, &mut view_data, &internal_rx);
        if let Err(error) = terminal.draw(|frame| render(frame, state, runtime, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event {
            match event::read().context("read event")? {
                Event::Key(key) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = internal_rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(4));
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

/// Shows a status message and schedules its expiry. The token keeps an old
/// timer from wiping a newer message.
fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(AppCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn active_grid(state: &AppState, view_data: &ViewData) -> GridId {
    match state.page {
        PageKind::Patients => GridId::Patients,
        PageKind::PatientDetail => match view_data.focus {
            GridId::Photos => GridId::Photos,
            _ => GridId::Record,
        },
    }
}

/// Routes one key press. Returns true when the app should quit.
fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    // Ctrl+q quits from anywhere, overlays included.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('q') {
        return true;
    }
    if view_data.help_visible {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            view_data.help_visible = false;
        }
        return false;
    }
    // A live cell editor consumes every key until it commits or cancels.
    if view_data.edit.is_some() {
        handle_edit_key(state, runtime, view_data, internal_tx, key);
        return false;
    }
    if matches!(state.mode, AppMode::Form(_)) {
        handle_form_key(state, runtime, view_data, internal_tx, key);
        return false;
    }
    if handle_grid_key(state, runtime, view_data, key) {
        return false;
    }
    match state.mode {
        AppMode::Nav => handle_nav_key(state, runtime, view_data, internal_tx, key),
        AppMode::Edit => {
            handle_edit_mode_key(state, runtime, view_data, internal_tx, key);
            false
        }
        AppMode::Form(_) => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GridCommand {
    MoveRow(isize),
    MoveColumn(isize),
    JumpFirstRow,
    JumpLastRow,
    JumpFirstColumn,
    JumpLastColumn,
}

fn grid_command_for_key(key: KeyEvent) -> Option<GridCommand> {
    match (key.code, key.modifiers) {
        (KeyCode::Char('j'), KeyModifiers::NONE) | (KeyCode::Down, _) => {
            Some(GridCommand::MoveRow(1))
        }
        (KeyCode::Char('k'), KeyModifiers::NONE) | (KeyCode::Up, _) => {
            Some(GridCommand::MoveRow(-1))
        }
        (KeyCode::Char('h'), KeyModifiers::NONE) | (KeyCode::Left, _) => {
            Some(GridCommand::MoveColumn(-1))
        }
        (KeyCode::Char('l'), KeyModifiers::NONE) | (KeyCode::Right, _) => {
            Some(GridCommand::MoveColumn(1))
        }
        (KeyCode::Char('d'), KeyModifiers::CONTROL) => Some(GridCommand::MoveRow(HALF_PAGE_ROWS)),
        (KeyCode::Char('u'), KeyModifiers::CONTROL) => Some(GridCommand::MoveRow(-HALF_PAGE_ROWS)),
        (KeyCode::PageDown, _) => Some(GridCommand::MoveRow(FULL_PAGE_ROWS)),
        (KeyCode::PageUp, _) => Some(GridCommand::MoveRow(-FULL_PAGE_ROWS)),
        (KeyCode::Char('g'), KeyModifiers::NONE) => Some(GridCommand::JumpFirstRow),
        (KeyCode::Char('G'), _) => Some(GridCommand::JumpLastRow),
        (KeyCode::Char('^'), _) => Some(GridCommand::JumpFirstColumn),
        (KeyCode::Char('$'), _) => Some(GridCommand::JumpLastColumn),
        _ => None,
    }
}

fn handle_grid_key<R: AppRuntime>(
    state: &AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    key: KeyEvent,
) -> bool {
    let Some(command) = grid_command_for_key(key) else {
        return false;
    };
    let grid = active_grid(state, view_data);
    let source = runtime.grid(grid);
    let rows = source.row_count();
    let columns = source.column_count();
    apply_grid_command(view_data, grid, rows, columns, command);
    true
}

fn apply_grid_command(
    view_data: &mut ViewData,
    grid: GridId,
    rows: usize,
    columns: usize,
    command: GridCommand,
) {
    let last_row = rows.saturating_sub(1);
    let last_column = columns.saturating_sub(1);
    let cursor = view_data.cursor_mut(grid);
    match command {
        GridCommand::MoveRow(delta) => {
            cursor.row = if delta < 0 {
                cursor.row.saturating_sub(delta.unsigned_abs())
            } else {
                cursor.row.saturating_add(delta.unsigned_abs())
            };
        }
        GridCommand::MoveColumn(delta) => {
            cursor.column = if delta < 0 {
                cursor.column.saturating_sub(delta.unsigned_abs())
            } else {
                cursor.column.saturating_add(delta.unsigned_abs())
            };
        }
        GridCommand::JumpFirstRow => cursor.row = 0,
        GridCommand::JumpLastRow => cursor.row = last_row,
        GridCommand::JumpFirstColumn => cursor.column = 0,
        GridCommand::JumpLastColumn => cursor.column = last_column,
    }
    cursor.row = cursor.row.min(last_row);
    cursor.column = cursor.column.min(last_column);
}

fn clamp_cursor<R: AppRuntime>(runtime: &mut R, view_data: &mut ViewData, grid: GridId) {
    let source = runtime.grid(grid);
    let last_row = source.row_count().saturating_sub(1);
    let last_column = source.column_count().saturating_sub(1);
    let cursor = view_data.cursor_mut(grid);
    cursor.row = cursor.row.min(last_row);
    cursor.column = cursor.column.min(last_column);
}

fn handle_nav_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), KeyModifiers::NONE) => return true,
        (KeyCode::Char('?'), _) => view_data.help_visible = true,
        (KeyCode::Char('i'), KeyModifiers::NONE) => {
            state.dispatch(AppCommand::EnterEditMode);
        }
        (KeyCode::Tab, _) => switch_detail_focus(state, view_data),
        (KeyCode::Enter, _) => activate_selected(state, runtime, view_data, internal_tx),
        (KeyCode::Char('a'), KeyModifiers::NONE) => {
            open_form(state, runtime, view_data, internal_tx);
        }
        (KeyCode::Char('r'), KeyModifiers::NONE) => {
            reload_focused(state, runtime, view_data, internal_tx);
        }
        (KeyCode::Char('p'), KeyModifiers::NONE) | (KeyCode::Char('v'), KeyModifiers::NONE) => {
            export_selected_photo(state, runtime, view_data, internal_tx);
        }
        (KeyCode::Esc, _) => {
            if state.page == PageKind::PatientDetail {
                close_open_patient(state, runtime, view_data, internal_tx);
            } else {
                state.dispatch(AppCommand::ClearStatus);
            }
        }
        _ => {}
    }
    false
}

fn handle_edit_mode_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match (key.code, key.modifiers) {
        (KeyCode::Esc, _) => {
            state.dispatch(AppCommand::ExitToNav);
        }
        (KeyCode::Enter, _) | (KeyCode::Char('e'), KeyModifiers::NONE) => {
            open_edit_session(state, runtime, view_data, internal_tx);
        }
        (KeyCode::Char('a'), KeyModifiers::NONE) => {
            open_form(state, runtime, view_data, internal_tx);
        }
        (KeyCode::Char('x'), KeyModifiers::NONE) => {
            remove_selected_row(state, runtime, view_data, internal_tx);
        }
        (KeyCode::Char('s'), KeyModifiers::NONE) => {
            submit_focused(state, runtime, view_data, internal_tx);
        }
        (KeyCode::Char('u'), KeyModifiers::NONE) => {
            revert_focused(state, runtime, view_data, internal_tx);
        }
        (KeyCode::Char('?'), _) => view_data.help_visible = true,
        (KeyCode::Tab, _) => switch_detail_focus(state, view_data),
        _ => {}
    }
}

fn switch_detail_focus(state: &AppState, view_data: &mut ViewData) {
    if state.page != PageKind::PatientDetail {
        return;
    }
    view_data.focus = match view_data.focus {
        GridId::Photos => GridId::Record,
        _ => GridId::Photos,
    };
}

fn activate_selected<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    match active_grid(state, view_data) {
        GridId::Patients => open_patient_at_cursor(state, runtime, view_data, internal_tx),
        GridId::Photos => export_selected_photo(state, runtime, view_data, internal_tx),
        GridId::Record => {
            emit_status(state, view_data, internal_tx, "press i to edit record fields");
        }
    }
}

fn open_patient_at_cursor<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    if runtime.grid(GridId::Patients).row_count() == 0 {
        emit_status(state, view_data, internal_tx, "no patients to open");
        return;
    }
    let row = view_data.cursor(GridId::Patients).row;
    let Some(patient) = runtime.patient_row_id(row) else {
        emit_status(
            state,
            view_data,
            internal_tx,
            "save the new patient before opening it",
        );
        return;
    };
    if let Err(error) = runtime.open_patient(patient) {
        emit_status(state, view_data, internal_tx, format!("open failed: {error:#}"));
        return;
    }
    state.dispatch(AppCommand::OpenPatient(patient));
    view_data.focus = GridId::Record;
    *view_data.cursor_mut(GridId::Record) = CellCursor::default();
    *view_data.cursor_mut(GridId::Photos) = CellCursor::default();
    emit_status(
        state,
        view_data,
        internal_tx,
        format!("patient #{} open", patient.get()),
    );
}

fn close_open_patient<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    view_data.edit = None;
    if let Err(error) = runtime.close_patient() {
        emit_status(state, view_data, internal_tx, format!("close failed: {error:#}"));
        return;
    }
    state.dispatch(AppCommand::ClosePatient);
    view_data.focus = GridId::Patients;
    clamp_cursor(runtime, view_data, GridId::Patients);
    emit_status(state, view_data, internal_tx, "back to the patient list");
}

fn reload_focused<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let grid = active_grid(state, view_data);
    match runtime.table(grid).select() {
        Ok(()) => {
            clamp_cursor(runtime, view_data, grid);
            emit_status(state, view_data, internal_tx, format!("{} reloaded", grid.label()));
        }
        Err(error) => {
            emit_status(state, view_data, internal_tx, format!("reload failed: {error:#}"));
        }
    }
}

fn export_selected_photo<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    if state.page != PageKind::PatientDetail {
        emit_status(state, view_data, internal_tx, "open a patient to export photos");
        return;
    }
    if runtime.grid(GridId::Photos).row_count() == 0 {
        emit_status(state, view_data, internal_tx, "this patient has no photos");
        return;
    }
    let row = view_data.cursor(GridId::Photos).row;
    match runtime.export_photo(row) {
        Ok(path) => {
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("photo written to {}", path.display()),
            );
        }
        Err(error) => {
            emit_status(state, view_data, internal_tx, format!("export failed: {error:#}"));
        }
    }
}

fn remove_selected_row<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let grid = active_grid(state, view_data);
    if grid == GridId::Record {
        emit_status(
            state,
            view_data,
            internal_tx,
            "record fields cannot be removed; remove the patient from the list",
        );
        return;
    }
    let row = view_data.cursor(grid).row;
    if runtime.table(grid).remove_row(row) {
        clamp_cursor(runtime, view_data, grid);
        emit_status(state, view_data, internal_tx, "row removed; press s to save");
    } else {
        emit_status(state, view_data, internal_tx, "no row selected");
    }
}

fn submit_focused<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let grid = active_grid(state, view_data);
    match runtime.table(grid).submit_all() {
        Ok(()) => {
            clamp_cursor(runtime, view_data, grid);
            emit_status(state, view_data, internal_tx, "changes saved");
        }
        Err(error) => {
            // Legacy behavior: a failed batch is rolled back, not retried.
            runtime.table(grid).revert_all();
            clamp_cursor(runtime, view_data, grid);
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("save failed: {error:#}; changes reverted"),
            );
        }
    }
}

fn revert_focused<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let grid = active_grid(state, view_data);
    runtime.table(grid).revert_all();
    clamp_cursor(runtime, view_data, grid);
    emit_status(state, view_data, internal_tx, "changes reverted");
}

/// Opens the delegate editor for the selected cell, unless the cell's flags
/// or delegate mark it read-only.
fn open_edit_session<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let grid = active_grid(state, view_data);
    let cursor = view_data.cursor(grid);
    let at = CellRef::new(cursor.row, cursor.column);
    let formats = runtime.formats().clone();
    let source = runtime.grid(grid);
    if !source.contains(at) {
        emit_status(state, view_data, internal_tx, "no cell selected");
        return;
    }
    let flags = source.cell_flags(at);
    if !flags.enabled || !flags.editable {
        emit_status(state, view_data, internal_tx, "this cell is read-only");
        return;
    }
    let delegate = delegate_for(grid, at);
    let editor = delegate.create_editor(&*source, at, &formats);
    if matches!(editor, Editor::Display { .. }) {
        emit_status(state, view_data, internal_tx, "this cell is read-only");
        return;
    }
    let label = field_label(&*source, grid, at);
    view_data.edit = Some(EditSession {
        grid,
        at,
        label: label.clone(),
        delegate,
        editor,
    });
    emit_status(state, view_data, internal_tx, format!("editing {label}"));
}

fn handle_edit_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    if view_data.edit.is_none() {
        return;
    }
    if key.code == KeyCode::Esc {
        view_data.edit = None;
        emit_status(state, view_data, internal_tx, "edit canceled");
        return;
    }
    if key.code == KeyCode::Enter {
        commit_edit_session(state, runtime, view_data, internal_tx);
        return;
    }
    let Some(session) = view_data.edit.as_mut() else {
        return;
    };
    match &mut session.editor {
        Editor::Display { .. } => {}
        Editor::Text { .. } => match key.code {
            KeyCode::Char(ch) => session.editor.insert_char(ch),
            KeyCode::Backspace => session.editor.backspace(),
            _ => {}
        },
        Editor::Date(picker) => handle_date_picker_key(picker, key),
        Editor::DateTime(picker) => {
            if key.code == KeyCode::Char('n') {
                picker.set_stamp(FieldFormats::now());
            }
        }
    }
}

fn handle_date_picker_key(picker: &mut DateEditor, key: KeyEvent) {
    if key.code == KeyCode::Backspace {
        picker.clear();
        return;
    }
    let base = picker.date().unwrap_or_else(FieldFormats::today);
    let next = match (key.code, key.modifiers) {
        (KeyCode::Char('h'), KeyModifiers::NONE) | (KeyCode::Left, _) => {
            shift_date_by_days(base, -1)
        }
        (KeyCode::Char('l'), KeyModifiers::NONE) | (KeyCode::Right, _) => {
            shift_date_by_days(base, 1)
        }
        (KeyCode::Char('j'), KeyModifiers::NONE) | (KeyCode::Down, _) => {
            shift_date_by_days(base, 7)
        }
        (KeyCode::Char('k'), KeyModifiers::NONE) | (KeyCode::Up, _) => shift_date_by_days(base, -7),
        (KeyCode::Char('H'), _) => shift_date_by_months(base, -1),
        (KeyCode::Char('L'), _) => shift_date_by_months(base, 1),
        (KeyCode::Char('['), _) => shift_date_by_years(base, -1),
        (KeyCode::Char(']'), _) => shift_date_by_years(base, 1),
        _ => None,
    };
    if let Some(date) = next {
        picker.set_date(date);
    }
}

fn commit_edit_session<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let formats = runtime.formats().clone();
    let Some(session) = view_data.edit.take() else {
        return;
    };
    let source = runtime.grid(session.grid);
    match session
        .delegate
        .commit_editor(&session.editor, source, session.at, &formats)
    {
        CommitOutcome::Committed => {
            emit_status(state, view_data, internal_tx, "cell updated; press s to save");
        }
        CommitOutcome::Rejected { hint } => {
            // The editor stays open so the value can be fixed in place.
            view_data.edit = Some(session);
            emit_status(state, view_data, internal_tx, hint);
        }
        CommitOutcome::Ignored => {
            emit_status(state, view_data, internal_tx, "this cell is read-only");
        }
    }
}

fn handle_form_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match (key.code, key.modifiers) {
        (KeyCode::Esc, _) => {
            view_data.form = None;
            state.dispatch(AppCommand::ExitToNav);
            emit_status(state, view_data, internal_tx, "form canceled");
        }
        (KeyCode::Enter, _) | (KeyCode::Char('s'), KeyModifiers::CONTROL) => {
            submit_form(state, runtime, view_data, internal_tx);
        }
        (KeyCode::Tab, _) | (KeyCode::Down, _) => move_form_field(view_data, 1),
        (KeyCode::BackTab, _) | (KeyCode::Up, _) => move_form_field(view_data, -1),
        (KeyCode::Backspace, _) => {
            if let Some(form) = view_data.form.as_mut()
                && let Some(value) = form.values.get_mut(form.field_index)
            {
                value.pop();
            }
        }
        (KeyCode::Char(ch), modifiers) if !modifiers.contains(KeyModifiers::CONTROL) => {
            if let Some(form) = view_data.form.as_mut()
                && let Some(value) = form.values.get_mut(form.field_index)
            {
                value.push(ch);
            }
        }
        _ => {}
    }
}

const PATIENT_FORM_LABELS: [&str; 5] =
    ["Name", "Address", "Birth date", "Admission date", "Discharge date"];
const PHOTO_FORM_LABELS: [&str; 1] = ["File path"];

fn form_labels(kind: FormKind) -> &'static [&'static str] {
    match kind {
        FormKind::Patient => &PATIENT_FORM_LABELS,
        FormKind::PhotoImport => &PHOTO_FORM_LABELS,
    }
}

fn blank_form(kind: FormKind, formats: &FieldFormats) -> FormUiState {
    let today = formats.format_date(FieldFormats::today());
    let values = match kind {
        FormKind::Patient => {
            vec![String::new(), String::new(), String::new(), today.clone(), today]
        }
        FormKind::PhotoImport => vec![String::new()],
    };
    FormUiState {
        kind,
        field_index: 0,
        values,
    }
}

fn move_form_field(view_data: &mut ViewData, delta: isize) {
    let Some(form) = view_data.form.as_mut() else {
        return;
    };
    let fields = form_labels(form.kind).len() as isize;
    let index = form.field_index as isize + delta;
    form.field_index = index.rem_euclid(fields.max(1)) as usize;
}

fn open_form<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let kind = match state.page {
        PageKind::Patients => FormKind::Patient,
        PageKind::PatientDetail => FormKind::PhotoImport,
    };
    // Forms open from nav; leave edit mode first so the reducer accepts it.
    if state.mode == AppMode::Edit {
        state.dispatch(AppCommand::ExitToNav);
    }
    let events = state.dispatch(AppCommand::OpenForm(kind));
    if events.is_empty() {
        emit_status(state, view_data, internal_tx, "form unavailable here");
        return;
    }
    view_data.form = Some(blank_form(kind, runtime.formats()));
    let label = match kind {
        FormKind::Patient => "add patient",
        FormKind::PhotoImport => "import photo",
    };
    emit_status(state, view_data, internal_tx, format!("{label} form open"));
}

fn form_value(form: &FormUiState, index: usize) -> String {
    form.values.get(index).cloned().unwrap_or_default()
}

fn parse_form_date(text: &str, formats: &FieldFormats, label: &str) -> Result<Date> {
    formats.parse_date(text).with_context(|| {
        format!(
            "unreadable {label} {text:?}; write it like {}",
            formats.format_date(FieldFormats::today()),
        )
    })
}

fn parse_optional_form_date(
    text: &str,
    formats: &FieldFormats,
    label: &str,
) -> Result<Option<Date>> {
    if text.trim().is_empty() || formats.is_unset(text) {
        return Ok(None);
    }
    parse_form_date(text, formats, label).map(Some)
}

fn form_payload(form: &FormUiState, formats: &FieldFormats) -> Result<FormPayload> {
    match form.kind {
        FormKind::Patient => {
            let birth_date = parse_optional_form_date(&form_value(form, 2), formats, "birth date")?;
            let admission_date = parse_form_date(&form_value(form, 3), formats, "admission date")?;
            let discharge_date = parse_form_date(&form_value(form, 4), formats, "discharge date")?;
            Ok(FormPayload::Patient(PatientFormInput {
                name: form_value(form, 0),
                address: form_value(form, 1),
                birth_date,
                admission_date,
                discharge_date,
            }))
        }
        FormKind::PhotoImport => Ok(FormPayload::PhotoImport(PhotoImportInput {
            path: form_value(form, 0),
        })),
    }
}

fn submit_form<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(form) = view_data.form.clone() else {
        return;
    };
    let formats = runtime.formats().clone();
    let payload = match form_payload(&form, &formats) {
        Ok(payload) => payload,
        Err(error) => {
            emit_status(state, view_data, internal_tx, format!("form invalid: {error:#}"));
            return;
        }
    };
    if let Err(error) = payload.validate() {
        emit_status(state, view_data, internal_tx, format!("form invalid: {error:#}"));
        return;
    }
    match payload {
        FormPayload::Patient(input) => {
            stage_new_patient(state, runtime, view_data, internal_tx, input, &formats);
        }
        FormPayload::PhotoImport(input) => {
            import_photo_from_form(state, runtime, view_data, internal_tx, input);
        }
    }
}

/// Appends the drafted patient as a pending row. The row reaches storage on
/// the next submit, like any other buffered edit.
fn stage_new_patient<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    input: PatientFormInput,
    formats: &FieldFormats,
) {
    let row = input.to_row(formats);
    if !runtime.table(GridId::Patients).insert_row(row) {
        emit_status(state, view_data, internal_tx, "add failed: reload the list and retry");
        return;
    }
    let last = runtime.grid(GridId::Patients).row_count().saturating_sub(1);
    view_data.cursor_mut(GridId::Patients).row = last;
    view_data.form = None;
    state.dispatch(AppCommand::ExitToNav);
    emit_status(state, view_data, internal_tx, "patient staged; press i then s to save");
}

fn import_photo_from_form<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    input: PhotoImportInput,
) {
    let Some(patient) = state.open_patient else {
        emit_status(state, view_data, internal_tx, "open a patient before importing photos");
        return;
    };
    match runtime.import_photo(patient, Path::new(input.path.trim())) {
        Ok(()) => {
            view_data.form = None;
            state.dispatch(AppCommand::ExitToNav);
            let last = runtime.grid(GridId::Photos).row_count().saturating_sub(1);
            view_data.cursor_mut(GridId::Photos).row = last;
            emit_status(state, view_data, internal_tx, "photo imported");
        }
        // The form stays open so the path can be corrected.
        Err(error) => {
            emit_status(state, view_data, internal_tx, format!("import failed: {error:#}"));
        }
    }
}

fn non_blank_pattern() -> Regex {
    Regex::new(r"\S").expect("pattern compiles")
}

/// Editing rules for the patient list, keyed by column.
fn patients_delegate(column: Option<PatientColumn>) -> FieldDelegate {
    match column {
        Some(PatientColumn::Id) | None => FieldDelegate::ReadOnly,
        Some(PatientColumn::Name) => {
            FieldDelegate::pattern_text(non_blank_pattern(), "\"Name\" can't be empty")
        }
        Some(PatientColumn::Address) => {
            FieldDelegate::pattern_text(non_blank_pattern(), "\"Address\" can't be empty")
        }
        Some(PatientColumn::BirthDate) => FieldDelegate::date(DateDelegate::new()),
        Some(PatientColumn::AdmissionDate) => FieldDelegate::date(
            DateDelegate::new()
                .min_from_cell()
                .link_column(PatientColumn::DischargeDate.index()),
        ),
        Some(PatientColumn::DischargeDate) => {
            FieldDelegate::date(DateDelegate::new().nullable().min_from_cell())
        }
    }
}

/// Editing rules for the sideways record view, keyed by field row. The
/// admission date drags the discharge row instead of a sibling column.
fn record_delegate(row: Option<PatientColumn>) -> FieldDelegate {
    match row {
        Some(PatientColumn::Id) | None => FieldDelegate::ReadOnly,
        Some(PatientColumn::Name) => FieldDelegate::required_text("\"Name\" cannot be empty"),
        Some(PatientColumn::Address) => {
            FieldDelegate::required_text("\"Address\" cannot be empty")
        }
        Some(PatientColumn::BirthDate) => FieldDelegate::date(DateDelegate::new()),
        Some(PatientColumn::AdmissionDate) => FieldDelegate::date(
            DateDelegate::new()
                .min_from_cell()
                .link_row(PatientColumn::DischargeDate.index()),
        ),
        Some(PatientColumn::DischargeDate) => {
            FieldDelegate::date(DateDelegate::new().nullable().min_from_cell())
        }
    }
}

fn photos_delegate(column: Option<PhotoColumn>) -> FieldDelegate {
    match column {
        Some(PhotoColumn::Id) | None => FieldDelegate::ReadOnly,
        Some(PhotoColumn::TakenAt) => FieldDelegate::DateTime,
        Some(PhotoColumn::FileName) => {
            FieldDelegate::required_text("\"File name\" cannot be empty")
        }
    }
}

fn delegate_for(grid: GridId, at: CellRef) -> FieldDelegate {
    match grid {
        GridId::Patients => patients_delegate(PatientColumn::from_index(at.column)),
        GridId::Record => record_delegate(PatientColumn::from_index(at.row)),
        GridId::Photos => photos_delegate(PhotoColumn::from_index(at.column)),
    }
}

fn field_label(source: &dyn TabularSource, grid: GridId, at: CellRef) -> String {
    let header = match grid {
        GridId::Record => source.header(Axis::Vertical, at.row),
        _ => source.header(Axis::Horizontal, at.column),
    };
    header.unwrap_or_else(|| "cell".to_owned())
}

fn shift_date_by_days(date: Date, days: i64) -> Option<Date> {
    date.checked_add(time::Duration::days(days))
}

fn shift_date_by_months(date: Date, months: i32) -> Option<Date> {
    let month_index = date.month() as i32 - 1 + months;
    let year = date.year() + month_index.div_euclid(12);
    let month = Month::try_from((month_index.rem_euclid(12) + 1) as u8).ok()?;
    let day = date.day().min(last_day_of_month(year, month)?);
    Date::from_calendar_date(year, month, day).ok()
}

fn shift_date_by_years(date: Date, years: i32) -> Option<Date> {
    shift_date_by_months(date, years.saturating_mul(12))
}

fn last_day_of_month(year: i32, month: Month) -> Option<u8> {
    let (next_year, next_month) = if month == Month::December {
        (year + 1, Month::January)
    } else {
        (year, month.next())
    };
    let first_of_next = Date::from_calendar_date(next_year, next_month, 1).ok()?;
    Some(first_of_next.previous_day()?.day())
}

fn render<R: AppRuntime>(
    frame: &mut ratatui::Frame<'_>,
    state: &AppState,
    runtime: &mut R,
    view_data: &ViewData,
) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let banner = Paragraph::new(header_text(state, runtime))
        .style(Style::default().fg(Color::White))
        .block(Block::default().title("ward").borders(Borders::ALL));
    frame.render_widget(banner, layout[0]);

    let mut grid_layouts: Vec<(GridId, GridLayout)> = Vec::new();
    match state.page {
        PageKind::Patients => {
            let grid_layout =
                render_grid(frame, layout[1], runtime, view_data, GridId::Patients, true);
            grid_layouts.push((GridId::Patients, grid_layout));
        }
        PageKind::PatientDetail => {
            let panels = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(RECORD_PANEL_HEIGHT), Constraint::Min(1)])
                .split(layout[1]);
            let record_focused = active_grid(state, view_data) == GridId::Record;
            let grid_layout =
                render_grid(frame, panels[0], runtime, view_data, GridId::Record, record_focused);
            grid_layouts.push((GridId::Record, grid_layout));
            let grid_layout =
                render_grid(frame, panels[1], runtime, view_data, GridId::Photos, !record_focused);
            grid_layouts.push((GridId::Photos, grid_layout));
        }
    }

    let status = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[2]);

    let formats = runtime.formats().clone();
    if let Some(session) = &view_data.edit {
        render_edit_overlay(frame, session, &grid_layouts, &formats);
    }
    if let Some(form) = &view_data.form {
        render_form_overlay(frame, form, &formats);
    }
    if view_data.help_visible {
        let area = centered_rect(70, 70, frame.area());
        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(help_overlay_text())
                .block(Block::default().title(" keys ").borders(Borders::ALL)),
            area,
        );
    }
}

fn header_text<R: AppRuntime>(state: &AppState, runtime: &mut R) -> String {
    match state.page {
        PageKind::Patients => {
            if runtime.show_patient_count() {
                let count = runtime.grid(GridId::Patients).row_count();
                format!("{} ({count})", PageKind::Patients.title())
            } else {
                PageKind::Patients.title().to_owned()
            }
        }
        PageKind::PatientDetail => match state.open_patient {
            Some(patient) => format!("{} #{}", PageKind::PatientDetail.title(), patient.get()),
            None => PageKind::PatientDetail.title().to_owned(),
        },
    }
}

/// Cell geometry of one rendered grid: where the data cells land on screen,
/// so an editor can be drawn exactly over its cell.
#[derive(Debug, Clone)]
struct GridLayout {
    inner: Rect,
    gutter: u16,
    cell_width: u16,
    columns: usize,
    header_rows: u16,
    row_offset: usize,
    visible_rows: usize,
}

impl GridLayout {
    fn cell_rect(&self, row: usize, column: usize) -> Option<CellRect> {
        if row < self.row_offset || column >= self.columns {
            return None;
        }
        let visible_index = row - self.row_offset;
        if visible_index >= self.visible_rows {
            return None;
        }
        let x = self.inner.x + self.gutter + 1 + (self.cell_width + 1) * column as u16;
        let y = self.inner.y + self.header_rows + visible_index as u16;
        Some(CellRect {
            x,
            y,
            width: self.cell_width,
            height: 1,
        })
    }
}

fn grid_layout(
    source: &dyn TabularSource,
    area: Rect,
    cursor: CellCursor,
    with_header: bool,
) -> GridLayout {
    let inner = Rect {
        x: area.x.saturating_add(1),
        y: area.y.saturating_add(1),
        width: area.width.saturating_sub(2),
        height: area.height.saturating_sub(2),
    };
    let columns = source.column_count().max(1);
    let rows = source.row_count();
    let gutter = (0..rows)
        .filter_map(|row| source.header(Axis::Vertical, row))
        .map(|header| header.chars().count() as u16)
        .max()
        .unwrap_or(0)
        .clamp(GUTTER_MIN, GUTTER_MAX);
    // One spacing column follows the gutter and each cell column.
    let usable = inner.width.saturating_sub(gutter + columns as u16);
    let cell_width = (usable / columns as u16).max(CELL_MIN_WIDTH);
    let header_rows = u16::from(with_header);
    let visible_rows = usize::from(inner.height.saturating_sub(header_rows));
    let row_offset = cursor.row.saturating_sub(visible_rows.saturating_sub(1));
    GridLayout {
        inner,
        gutter,
        cell_width,
        columns,
        header_rows,
        row_offset,
        visible_rows,
    }
}

fn grid_title(grid: GridId, rows: usize, dirty: bool) -> String {
    if dirty {
        format!(" {} r:{rows} | edits pending ", grid.label())
    } else {
        format!(" {} r:{rows} ", grid.label())
    }
}

fn render_grid<R: AppRuntime>(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    runtime: &mut R,
    view_data: &ViewData,
    grid: GridId,
    focused: bool,
) -> GridLayout {
    let dirty = runtime.table(grid).is_dirty();
    let cursor = view_data.cursor(grid);
    let source = runtime.grid(grid);
    let with_header = grid != GridId::Record;
    let layout = grid_layout(&*source, area, cursor, with_header);

    let mut widths = vec![Constraint::Length(layout.cell_width); layout.columns + 1];
    widths[0] = Constraint::Length(layout.gutter);

    let header = with_header.then(|| {
        let mut cells = Vec::with_capacity(layout.columns + 1);
        cells.push(Cell::from(""));
        for column in 0..layout.columns {
            let title = source.header(Axis::Horizontal, column).unwrap_or_default();
            cells.push(
                Cell::from(title)
                    .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
            );
        }
        Row::new(cells)
    });

    let row_count = source.row_count();
    let last_visible = row_count.min(layout.row_offset + layout.visible_rows);
    let mut rows = Vec::new();
    for row in layout.row_offset..last_visible {
        let marker = source.header(Axis::Vertical, row).unwrap_or_default();
        let removed = marker == "!";
        let mut cells = Vec::with_capacity(layout.columns + 1);
        cells.push(Cell::from(marker).style(Style::default().fg(Color::DarkGray)));
        for column in 0..layout.columns {
            let value = source.cell(CellRef::new(row, column)).unwrap_or_default();
            let mut style = Style::default();
            if removed {
                style = style.fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT);
            }
            if focused && row == cursor.row {
                style = style.bg(Color::DarkGray);
            }
            if focused && row == cursor.row && column == cursor.column {
                style = Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD);
            }
            cells.push(Cell::from(value).style(style));
        }
        rows.push(Row::new(cells));
    }

    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let block = Block::default()
        .title(grid_title(grid, row_count, dirty))
        .borders(Borders::ALL)
        .border_style(border_style);
    let mut table = Table::new(rows, widths).column_spacing(1).block(block);
    if let Some(header) = header {
        table = table.header(header);
    }
    frame.render_widget(table, area);
    layout
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    // The help overlay replaces the key hints wholesale.
    if view_data.help_visible {
        return String::new();
    }
    let mode = match state.mode {
        AppMode::Nav => "NAV",
        AppMode::Edit => "EDIT",
        AppMode::Form(_) => "FORM",
    };
    let hint = key_hint(state, view_data);
    match &state.status_line {
        Some(status) => format!("{mode} | {status} | {hint}"),
        None => format!("{mode} | {hint}"),
    }
}

fn key_hint(state: &AppState, view_data: &ViewData) -> &'static str {
    if view_data.edit.is_some() {
        return "enter save | esc cancel";
    }
    match state.mode {
        AppMode::Nav if state.page == PageKind::Patients => {
            "enter open | a add | i edit | r reload | ? help | q quit"
        }
        AppMode::Nav => "tab focus | i edit | a photo | p export | esc back | ? help",
        AppMode::Edit => "enter/e edit cell | a add | x remove | s submit | u revert | esc done",
        AppMode::Form(_) => "tab field | enter save | esc cancel",
    }
}

fn render_edit_overlay(
    frame: &mut ratatui::Frame<'_>,
    session: &EditSession,
    grid_layouts: &[(GridId, GridLayout)],
    formats: &FieldFormats,
) {
    match &session.editor {
        Editor::Display { .. } => {}
        Editor::Text { buffer, .. } => {
            let Some(layout) = grid_layouts
                .iter()
                .find(|(grid, _)| *grid == session.grid)
                .map(|(_, layout)| layout)
            else {
                return;
            };
            let Some(cell) = layout.cell_rect(session.at.row, session.at.column) else {
                return;
            };
            let cell = session.delegate.editor_area(cell);
            let target = Rect::new(cell.x, cell.y, cell.width, cell.height.max(1))
                .intersection(frame.area());
            if target.width == 0 || target.height == 0 {
                return;
            }
            frame.render_widget(Clear, target);
            frame.render_widget(
                Paragraph::new(visible_tail(buffer, target.width))
                    .style(Style::default().fg(Color::Black).bg(Color::Yellow)),
                target,
            );
        }
        Editor::Date(picker) => {
            let area = centered_rect(48, 34, frame.area());
            frame.render_widget(Clear, area);
            frame.render_widget(
                Paragraph::new(date_picker_text(picker, formats)).block(
                    Block::default()
                        .title(format!(" {} ", session.label))
                        .borders(Borders::ALL),
                ),
                area,
            );
        }
        Editor::DateTime(picker) => {
            let area = centered_rect(48, 30, frame.area());
            frame.render_widget(Clear, area);
            frame.render_widget(
                Paragraph::new(stamp_picker_text(picker, formats)).block(
                    Block::default()
                        .title(format!(" {} ", session.label))
                        .borders(Borders::ALL),
                ),
                area,
            );
        }
    }
}

/// Last slice of the buffer that fits the cell, leaving one column free as
/// the cursor position.
fn visible_tail(buffer: &str, width: u16) -> String {
    let width = usize::from(width);
    let chars: Vec<char> = buffer.chars().collect();
    let start = chars.len().saturating_sub(width.saturating_sub(1));
    chars[start..].iter().collect()
}

fn date_picker_text(picker: &DateEditor, formats: &FieldFormats) -> String {
    let pick = match picker.date() {
        Some(date) => formats.format_date(date),
        None => formats.empty_sentinel().to_owned(),
    };
    let floor = match picker.minimum() {
        Some(date) => formats.format_date(date),
        None => "none".to_owned(),
    };
    [
        format!("pick:  {pick}"),
        format!("floor: {floor}"),
        String::new(),
        "h/l day | j/k week | H/L month | [/] year".to_owned(),
        "backspace clear | enter save | esc cancel".to_owned(),
    ]
    .join("\n")
}

fn stamp_picker_text(picker: &DateTimeEditor, formats: &FieldFormats) -> String {
    let pick = match picker.stamp() {
        Some(stamp) => formats.format_date_time(stamp),
        None => "current time at save".to_owned(),
    };
    [
        format!("pick: {pick}"),
        String::new(),
        "n now | enter save | esc cancel".to_owned(),
    ]
    .join("\n")
}

fn render_form_overlay(frame: &mut ratatui::Frame<'_>, form: &FormUiState, formats: &FieldFormats) {
    let area = centered_rect(56, 54, frame.area());
    frame.render_widget(Clear, area);
    let title = match form.kind {
        FormKind::Patient => " add patient ",
        FormKind::PhotoImport => " import photo ",
    };
    frame.render_widget(
        Paragraph::new(form_overlay_text(form, formats))
            .block(Block::default().title(title).borders(Borders::ALL)),
        area,
    );
}

fn form_overlay_text(form: &FormUiState, formats: &FieldFormats) -> String {
    let mut lines = Vec::new();
    for (index, label) in form_labels(form.kind).iter().enumerate() {
        let marker = if index == form.field_index { ">" } else { " " };
        let value = form.values.get(index).map(String::as_str).unwrap_or_default();
        lines.push(format!("{marker} {label:<16} {value}"));
    }
    lines.push(String::new());
    if form.kind == FormKind::Patient {
        lines.push(format!(
            "dates look like {}; leave the birth date blank for none",
            formats.format_date(FieldFormats::today()),
        ));
    }
    lines.push("tab next field | enter save | esc cancel".to_owned());
    lines.join("\n")
}

fn help_overlay_text() -> &'static str {
    "move: j/k/h/l or arrows | g/G first/last row | ^/$ first/last column\n\
     page: ctrl+d/ctrl+u half | pgup/pgdn full\n\
     list: enter opens the selected patient | a adds one | r reloads\n\
     detail: tab switches record/photos | p or v exports the photo | esc goes back\n\
     edit mode (i): enter/e edits the cell | a add | x remove | s submit | u revert\n\
     date editor: h/l day j/k week H/L month [/] year | backspace clears | enter saves\n\
     stamp editor: n stamps the current moment | enter saves\n\
     forms: type | tab/shift+tab fields | enter saves | esc cancels\n\
     ? or esc closes this help | q or ctrl+q quits"
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);
    horizontal[1]
}
