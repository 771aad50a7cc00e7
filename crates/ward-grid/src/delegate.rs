// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use regex::Regex;
use time::{Date, PrimitiveDateTime};

use crate::formats::FieldFormats;
use crate::source::{CellRef, TabularSource};

/// Screen rectangle of the cell being edited, in terminal cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellRect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

/// Positional input mask for text editors: '0' admits a digit, 'A' a
/// letter, 'N' a letter or digit; any other character must be typed
/// verbatim. Input beyond the mask length is refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputMask {
    slots: Vec<MaskSlot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MaskSlot {
    Digit,
    Letter,
    Alphanumeric,
    Literal(char),
}

impl InputMask {
    pub fn new(mask: &str) -> Self {
        let slots = mask
            .chars()
            .map(|ch| match ch {
                '0' => MaskSlot::Digit,
                'A' => MaskSlot::Letter,
                'N' => MaskSlot::Alphanumeric,
                other => MaskSlot::Literal(other),
            })
            .collect();
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn admits(&self, position: usize, ch: char) -> bool {
        match self.slots.get(position) {
            Some(MaskSlot::Digit) => ch.is_ascii_digit(),
            Some(MaskSlot::Letter) => ch.is_alphabetic(),
            Some(MaskSlot::Alphanumeric) => ch.is_alphanumeric(),
            Some(MaskSlot::Literal(literal)) => ch == *literal,
            None => false,
        }
    }
}

/// State of one live edit session. Produced by
/// [`FieldDelegate::create_editor`] and consumed on commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Editor {
    /// Disabled text field; shows the value, takes no input.
    Display { value: String },
    Text {
        buffer: String,
        hint: String,
        mask: Option<InputMask>,
    },
    Date(DateEditor),
    DateTime(DateTimeEditor),
}

impl Editor {
    /// Appends a character to a text editor, subject to its input mask.
    /// Other editor kinds ignore typed characters.
    pub fn insert_char(&mut self, ch: char) {
        if let Self::Text { buffer, mask, .. } = self {
            match mask {
                Some(mask) if !mask.admits(buffer.chars().count(), ch) => {}
                _ => buffer.push(ch),
            }
        }
    }

    pub fn backspace(&mut self) {
        if let Self::Text { buffer, .. } = self {
            buffer.pop();
        }
    }
}

/// Calendar-date editor state. A cleared editor holds no date; clearing is
/// only possible when the owning delegate allows unset dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateEditor {
    selected: Option<Date>,
    minimum: Option<Date>,
    nullable: bool,
}

impl DateEditor {
    fn blank(nullable: bool) -> Self {
        Self {
            selected: None,
            minimum: None,
            nullable,
        }
    }

    /// The date the editor would commit, clamped to the minimum.
    pub fn date(&self) -> Option<Date> {
        match (self.selected, self.minimum) {
            (Some(date), Some(min)) if date < min => Some(min),
            (selected, _) => selected,
        }
    }

    pub fn minimum(&self) -> Option<Date> {
        self.minimum
    }

    /// Selects a date, clamped to the minimum.
    pub fn set_date(&mut self, date: Date) {
        self.selected = Some(self.minimum.map_or(date, |min| date.max(min)));
    }

    /// Returns to the unset state. Ignored unless the editor is nullable.
    pub fn clear(&mut self) {
        if self.nullable {
            self.selected = None;
        }
    }

    pub fn is_cleared(&self) -> bool {
        self.selected.is_none()
    }
}

/// Date-time editor state. A cleared editor commits the current moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTimeEditor {
    selected: Option<PrimitiveDateTime>,
}

impl DateTimeEditor {
    pub fn stamp(&self) -> Option<PrimitiveDateTime> {
        self.selected
    }

    pub fn set_stamp(&mut self, stamp: PrimitiveDateTime) {
        self.selected = Some(stamp);
    }

    pub fn is_cleared(&self) -> bool {
        self.selected.is_none()
    }
}

/// Result of asking a delegate to commit its editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    /// Validation failed; the hint explains what the field requires. The
    /// target cell is left untouched.
    Rejected { hint: String },
    /// The delegate never writes, or the editor did not match it.
    Ignored,
}

/// Configuration of a calendar-date delegate: whether the unset sentinel is
/// a legal value, whether the cell's own value floors the editor, and which
/// sibling cells are kept no earlier than a committed date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateDelegate {
    nullable: bool,
    min_from_cell: bool,
    linked_columns: Vec<usize>,
    linked_rows: Vec<usize>,
}

impl DateDelegate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allows the editor to be cleared; a cleared commit writes the unset
    /// sentinel instead of a date.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Uses the cell's current date as the editor's minimum instead of its
    /// initial value.
    pub fn min_from_cell(mut self) -> Self {
        self.min_from_cell = true;
        self
    }

    /// Keeps the cell in the given column of the edited row from holding a
    /// date earlier than a committed one.
    pub fn link_column(mut self, column: usize) -> Self {
        self.linked_columns.push(column);
        self
    }

    /// Row-axis variant of [`Self::link_column`], for transposed views.
    pub fn link_row(mut self, row: usize) -> Self {
        self.linked_rows.push(row);
        self
    }

    fn commit(
        &self,
        state: &DateEditor,
        source: &mut dyn TabularSource,
        at: CellRef,
        formats: &FieldFormats,
    ) -> CommitOutcome {
        let committed = state.date();
        let text = match committed {
            Some(date) => formats.format_date(date),
            None if self.nullable => formats.empty_sentinel().to_owned(),
            None => return CommitOutcome::Ignored,
        };
        let _ = source.set_cell(at, &text);

        let linked_cells = self
            .linked_columns
            .iter()
            .map(|&column| CellRef::new(at.row, column))
            .chain(self.linked_rows.iter().map(|&row| CellRef::new(row, at.column)))
            .collect::<Vec<_>>();
        for cell in linked_cells {
            self.refresh_linked(cell, committed, source, formats);
        }
        CommitOutcome::Committed
    }

    fn refresh_linked(
        &self,
        cell: CellRef,
        committed: Option<Date>,
        source: &mut dyn TabularSource,
        formats: &FieldFormats,
    ) {
        if !source.contains(cell) {
            return;
        }
        let current = source.cell(cell).unwrap_or_default();

        if formats.is_unset(&current) {
            if self.nullable {
                let _ = source.set_cell(cell, formats.empty_sentinel());
            }
            return;
        }
        let Some(date) = committed else {
            return;
        };
        match formats.parse_date(&current) {
            // Later or equal linked dates already satisfy the ordering.
            Some(linked) if linked >= date => {}
            _ => {
                let _ = source.set_cell(cell, &formats.format_date(date));
            }
        }
    }
}

/// Editing strategy for one column, or one row in a transposed view. Each
/// variant owns the full edit lifecycle: build an editor for a cell, prime
/// it from the model, validate and write back on commit, and place it over
/// the cell.
#[derive(Debug, Clone)]
pub enum FieldDelegate {
    ReadOnly,
    /// Accepts any text with at least one non-blank character.
    RequiredText { hint: String },
    /// Accepts text matching a caller-supplied pattern, optionally gating
    /// keystrokes through an input mask.
    PatternText {
        pattern: Regex,
        hint: String,
        mask: Option<InputMask>,
    },
    Date(DateDelegate),
    /// Writes a date-time stamp, substituting the current moment for a
    /// cleared editor.
    DateTime,
}

impl FieldDelegate {
    pub fn required_text(hint: impl Into<String>) -> Self {
        Self::RequiredText { hint: hint.into() }
    }

    pub fn pattern_text(pattern: Regex, hint: impl Into<String>) -> Self {
        Self::PatternText {
            pattern,
            hint: hint.into(),
            mask: None,
        }
    }

    pub fn pattern_text_with_mask(
        pattern: Regex,
        mask: InputMask,
        hint: impl Into<String>,
    ) -> Self {
        Self::PatternText {
            pattern,
            hint: hint.into(),
            mask: Some(mask),
        }
    }

    pub fn date(config: DateDelegate) -> Self {
        Self::Date(config)
    }

    /// Builds an editor for the given cell, seeded from its current value.
    pub fn create_editor(
        &self,
        source: &dyn TabularSource,
        at: CellRef,
        formats: &FieldFormats,
    ) -> Editor {
        let value = source.cell(at).unwrap_or_default();
        match self {
            Self::ReadOnly => Editor::Display { value },
            Self::RequiredText { hint } => Editor::Text {
                buffer: value,
                hint: hint.clone(),
                mask: None,
            },
            Self::PatternText { hint, mask, .. } => Editor::Text {
                buffer: value,
                hint: hint.clone(),
                mask: mask.clone(),
            },
            Self::Date(config) => {
                let mut state = DateEditor::blank(config.nullable);
                match formats.parse_date(&value) {
                    Some(date) if config.min_from_cell => {
                        state.minimum = Some(date);
                        state.selected = Some(date);
                    }
                    Some(date) => state.selected = Some(date),
                    None if config.nullable => {}
                    None => state.selected = Some(FieldFormats::today()),
                }
                Editor::Date(state)
            }
            Self::DateTime => Editor::DateTime(DateTimeEditor {
                selected: formats.parse_date_time(&value),
            }),
        }
    }

    /// Re-reads the cell into an existing editor. A value the editor cannot
    /// represent leaves its state alone.
    pub fn prime_editor(
        &self,
        editor: &mut Editor,
        source: &dyn TabularSource,
        at: CellRef,
        formats: &FieldFormats,
    ) {
        let value = source.cell(at).unwrap_or_default();
        match (self, editor) {
            (Self::ReadOnly, Editor::Display { value: shown }) => *shown = value,
            (Self::RequiredText { .. } | Self::PatternText { .. }, Editor::Text { buffer, .. }) => {
                *buffer = value;
            }
            (Self::Date(config), Editor::Date(state)) => match formats.parse_date(&value) {
                Some(date) => state.set_date(date),
                None if config.nullable => state.selected = None,
                None => {}
            },
            (Self::DateTime, Editor::DateTime(state)) => {
                if let Some(stamp) = formats.parse_date_time(&value) {
                    state.selected = Some(stamp);
                }
            }
            _ => {}
        }
    }

    /// Validates the editor's value and writes it back. A rejected commit
    /// leaves the model untouched and reports the field's hint.
    pub fn commit_editor(
        &self,
        editor: &Editor,
        source: &mut dyn TabularSource,
        at: CellRef,
        formats: &FieldFormats,
    ) -> CommitOutcome {
        match (self, editor) {
            (Self::ReadOnly, _) => CommitOutcome::Ignored,
            (Self::RequiredText { hint }, Editor::Text { buffer, .. }) => {
                if formats.has_required_input(buffer) {
                    let _ = source.set_cell(at, buffer);
                    CommitOutcome::Committed
                } else {
                    CommitOutcome::Rejected { hint: hint.clone() }
                }
            }
            (Self::PatternText { pattern, hint, .. }, Editor::Text { buffer, .. }) => {
                if pattern.is_match(buffer) {
                    let _ = source.set_cell(at, buffer);
                    CommitOutcome::Committed
                } else {
                    CommitOutcome::Rejected { hint: hint.clone() }
                }
            }
            (Self::Date(config), Editor::Date(state)) => config.commit(state, source, at, formats),
            (Self::DateTime, Editor::DateTime(state)) => {
                let stamp = state.selected.unwrap_or_else(FieldFormats::now);
                let _ = source.set_cell(at, &formats.format_date_time(stamp));
                CommitOutcome::Committed
            }
            _ => CommitOutcome::Ignored,
        }
    }

    /// Screen area the editor occupies: the cell's own rectangle.
    pub fn editor_area(&self, cell: CellRect) -> CellRect {
        cell
    }
}

#[cfg(test)]
mod tests {
    use super::{CellRect, CommitOutcome, DateDelegate, Editor, FieldDelegate, InputMask};
    use crate::formats::{FieldFormats, FormatSpec};
    use crate::source::{CellRef, MemoryGrid, TabularSource};
    use regex::Regex;
    use time::{Date, Month};

    const NAME: CellRef = CellRef::new(0, 1);
    const ADMISSION: CellRef = CellRef::new(0, 4);
    const DISCHARGE: CellRef = CellRef::new(0, 5);

    fn patient_grid(admission: &str, discharge: &str) -> MemoryGrid {
        MemoryGrid::with_rows(
            ["Id", "Name", "Address", "Birth date", "Admission date", "Discharge date"],
            vec![
                [
                    "1",
                    "Jane Doe",
                    "12 Elm St",
                    "14.02.1985",
                    admission,
                    discharge,
                ]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            ],
        )
    }

    fn type_text(editor: &mut Editor, text: &str) {
        if let Editor::Text { buffer, .. } = editor {
            *buffer = text.to_owned();
        }
    }

    fn pick_date(editor: &mut Editor, year: i32, month: Month, day: u8) {
        if let Editor::Date(state) = editor {
            state.set_date(Date::from_calendar_date(year, month, day).expect("valid date"));
        }
    }

    #[test]
    fn read_only_shows_but_never_writes() {
        let formats = FieldFormats::default();
        let mut grid = patient_grid("01.05.2024", "01.05.2024");
        let delegate = FieldDelegate::ReadOnly;

        let editor = delegate.create_editor(&grid, NAME, &formats);
        assert_eq!(
            editor,
            Editor::Display {
                value: "Jane Doe".to_owned()
            }
        );

        let outcome = delegate.commit_editor(&editor, &mut grid, NAME, &formats);
        assert_eq!(outcome, CommitOutcome::Ignored);
        assert_eq!(grid.cell(NAME).as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn required_text_rejects_blank_input() {
        let formats = FieldFormats::default();
        let mut grid = patient_grid("01.05.2024", "01.05.2024");
        let delegate = FieldDelegate::required_text("\"Name\" can't be empty");

        for input in ["", "   "] {
            let mut editor = delegate.create_editor(&grid, NAME, &formats);
            type_text(&mut editor, input);
            let outcome = delegate.commit_editor(&editor, &mut grid, NAME, &formats);
            assert_eq!(
                outcome,
                CommitOutcome::Rejected {
                    hint: "\"Name\" can't be empty".to_owned()
                },
                "input {input:?}"
            );
            assert_eq!(grid.cell(NAME).as_deref(), Some("Jane Doe"), "input {input:?}");
        }
    }

    #[test]
    fn required_text_commits_the_literal_text() {
        let formats = FieldFormats::default();
        let mut grid = patient_grid("01.05.2024", "01.05.2024");
        let delegate = FieldDelegate::required_text("\"Name\" can't be empty");

        let mut editor = delegate.create_editor(&grid, NAME, &formats);
        type_text(&mut editor, "Janet Doe ");
        let outcome = delegate.commit_editor(&editor, &mut grid, NAME, &formats);
        assert_eq!(outcome, CommitOutcome::Committed);
        assert_eq!(grid.cell(NAME).as_deref(), Some("Janet Doe "));
    }

    #[test]
    fn pattern_text_applies_the_configured_pattern() {
        let formats = FieldFormats::default();
        let mut grid = patient_grid("01.05.2024", "01.05.2024");
        let pattern = Regex::new("^[0-9]{4}$").expect("pattern compiles");
        let delegate = FieldDelegate::pattern_text(pattern, "enter a four-digit code");

        let mut editor = delegate.create_editor(&grid, NAME, &formats);
        type_text(&mut editor, "abcd");
        assert!(matches!(
            delegate.commit_editor(&editor, &mut grid, NAME, &formats),
            CommitOutcome::Rejected { .. }
        ));
        assert_eq!(grid.cell(NAME).as_deref(), Some("Jane Doe"));

        type_text(&mut editor, "2024");
        assert_eq!(
            delegate.commit_editor(&editor, &mut grid, NAME, &formats),
            CommitOutcome::Committed
        );
        assert_eq!(grid.cell(NAME).as_deref(), Some("2024"));
    }

    #[test]
    fn date_commit_writes_the_display_format() {
        let formats = FieldFormats::default();
        let mut grid = patient_grid("01.05.2024", "01.05.2024");
        let delegate = FieldDelegate::date(DateDelegate::new());

        let mut editor = delegate.create_editor(&grid, ADMISSION, &formats);
        pick_date(&mut editor, 2024, Month::May, 10);
        let outcome = delegate.commit_editor(&editor, &mut grid, ADMISSION, &formats);
        assert_eq!(outcome, CommitOutcome::Committed);
        assert_eq!(grid.cell(ADMISSION).as_deref(), Some("10.05.2024"));
    }

    #[test]
    fn linked_cell_is_raised_to_a_later_commit() {
        let formats = FieldFormats::default();
        let mut grid = patient_grid("01.05.2024", "01.05.2024");
        let delegate = FieldDelegate::date(DateDelegate::new().min_from_cell().link_column(5));

        let mut editor = delegate.create_editor(&grid, ADMISSION, &formats);
        pick_date(&mut editor, 2024, Month::May, 10);
        delegate.commit_editor(&editor, &mut grid, ADMISSION, &formats);

        assert_eq!(grid.cell(ADMISSION).as_deref(), Some("10.05.2024"));
        assert_eq!(grid.cell(DISCHARGE).as_deref(), Some("10.05.2024"));
    }

    #[test]
    fn linked_cell_keeps_a_later_date() {
        let formats = FieldFormats::default();
        let mut grid = patient_grid("01.05.2024", "10.05.2024");
        let delegate = FieldDelegate::date(DateDelegate::new().link_column(5));

        let mut editor = delegate.create_editor(&grid, ADMISSION, &formats);
        pick_date(&mut editor, 2024, Month::May, 1);
        delegate.commit_editor(&editor, &mut grid, ADMISSION, &formats);

        assert_eq!(grid.cell(DISCHARGE).as_deref(), Some("10.05.2024"));
    }

    #[test]
    fn linked_cell_with_unreadable_text_is_replaced() {
        let formats = FieldFormats::default();
        let mut grid = patient_grid("01.05.2024", "pending");
        let delegate = FieldDelegate::date(DateDelegate::new().link_column(5));

        let mut editor = delegate.create_editor(&grid, ADMISSION, &formats);
        pick_date(&mut editor, 2024, Month::May, 10);
        delegate.commit_editor(&editor, &mut grid, ADMISSION, &formats);

        assert_eq!(grid.cell(DISCHARGE).as_deref(), Some("10.05.2024"));
    }

    #[test]
    fn empty_linked_cell_is_left_alone() {
        let formats = FieldFormats::default();
        let mut grid = patient_grid("01.05.2024", "");
        let delegate = FieldDelegate::date(DateDelegate::new().link_column(5));

        let mut editor = delegate.create_editor(&grid, ADMISSION, &formats);
        pick_date(&mut editor, 2024, Month::May, 10);
        delegate.commit_editor(&editor, &mut grid, ADMISSION, &formats);

        assert_eq!(grid.cell(DISCHARGE).as_deref(), Some(""));
    }

    #[test]
    fn nullable_delegate_marks_empty_linked_cells() {
        let formats = FieldFormats::default();
        let mut grid = patient_grid("01.05.2024", "");
        let delegate = FieldDelegate::date(DateDelegate::new().nullable().link_column(5));

        let mut editor = delegate.create_editor(&grid, ADMISSION, &formats);
        pick_date(&mut editor, 2024, Month::May, 10);
        delegate.commit_editor(&editor, &mut grid, ADMISSION, &formats);

        assert_eq!(grid.cell(DISCHARGE).as_deref(), Some("Not set"));
    }

    #[test]
    fn cleared_nullable_editor_commits_the_sentinel() {
        let formats = FieldFormats::default();
        let mut grid = patient_grid("01.05.2024", "10.05.2024");
        let delegate = FieldDelegate::date(DateDelegate::new().nullable().link_column(5));

        let mut editor = delegate.create_editor(&grid, ADMISSION, &formats);
        if let Editor::Date(state) = &mut editor {
            state.clear();
        }
        let outcome = delegate.commit_editor(&editor, &mut grid, ADMISSION, &formats);

        assert_eq!(outcome, CommitOutcome::Committed);
        assert_eq!(grid.cell(ADMISSION).as_deref(), Some("Not set"));
        // No date was committed, so the linked date has nothing to catch up to.
        assert_eq!(grid.cell(DISCHARGE).as_deref(), Some("10.05.2024"));
    }

    #[test]
    fn sentinel_in_a_linked_cell_counts_as_unset() {
        let formats = FieldFormats::default();
        let mut grid = patient_grid("01.05.2024", "Not set");
        let delegate = FieldDelegate::date(DateDelegate::new().link_column(5));

        let mut editor = delegate.create_editor(&grid, ADMISSION, &formats);
        pick_date(&mut editor, 2024, Month::May, 10);
        delegate.commit_editor(&editor, &mut grid, ADMISSION, &formats);

        assert_eq!(grid.cell(DISCHARGE).as_deref(), Some("Not set"));
    }

    #[test]
    fn cell_date_becomes_the_editor_floor() {
        let formats = FieldFormats::default();
        let grid = patient_grid("01.05.2024", "01.05.2024");
        let delegate = FieldDelegate::date(DateDelegate::new().min_from_cell());

        let mut editor = delegate.create_editor(&grid, ADMISSION, &formats);
        let floor = Date::from_calendar_date(2024, Month::May, 1).expect("valid date");
        if let Editor::Date(state) = &mut editor {
            assert_eq!(state.minimum(), Some(floor));
            state.set_date(Date::from_calendar_date(2024, Month::April, 20).expect("valid date"));
            assert_eq!(state.date(), Some(floor));
        } else {
            panic!("date delegate built {editor:?}");
        }
    }

    #[test]
    fn clear_is_refused_without_nullable() {
        let formats = FieldFormats::default();
        let grid = patient_grid("01.05.2024", "01.05.2024");
        let delegate = FieldDelegate::date(DateDelegate::new());

        let mut editor = delegate.create_editor(&grid, ADMISSION, &formats);
        if let Editor::Date(state) = &mut editor {
            state.clear();
            assert!(!state.is_cleared());
        }
    }

    #[test]
    fn nullable_editor_on_an_unset_cell_starts_cleared() {
        let formats = FieldFormats::default();
        let grid = patient_grid("Not set", "01.05.2024");
        let delegate = FieldDelegate::date(DateDelegate::new().nullable());

        let editor = delegate.create_editor(&grid, ADMISSION, &formats);
        if let Editor::Date(state) = editor {
            assert!(state.is_cleared());
        } else {
            panic!("date delegate built {editor:?}");
        }
    }

    #[test]
    fn editor_on_an_unreadable_cell_falls_back_to_today() {
        let formats = FieldFormats::default();
        let grid = patient_grid("garbage", "01.05.2024");
        let delegate = FieldDelegate::date(DateDelegate::new());

        let editor = delegate.create_editor(&grid, ADMISSION, &formats);
        if let Editor::Date(state) = editor {
            assert_eq!(state.date(), Some(FieldFormats::today()));
        } else {
            panic!("date delegate built {editor:?}");
        }
    }

    #[test]
    fn prime_editor_rereads_the_cell() {
        let formats = FieldFormats::default();
        let mut grid = patient_grid("01.05.2024", "01.05.2024");
        let delegate = FieldDelegate::date(DateDelegate::new());

        let mut editor = delegate.create_editor(&grid, ADMISSION, &formats);
        grid.set_cell(ADMISSION, "20.06.2024");
        delegate.prime_editor(&mut editor, &grid, ADMISSION, &formats);

        if let Editor::Date(state) = editor {
            let expected = Date::from_calendar_date(2024, Month::June, 20).expect("valid date");
            assert_eq!(state.date(), Some(expected));
        } else {
            panic!("date delegate built {editor:?}");
        }
    }

    #[test]
    fn cleared_date_time_commits_the_current_moment() {
        let formats = FieldFormats::default();
        let mut grid = MemoryGrid::with_rows(
            ["Id", "Taken at", "Title"],
            vec![vec!["1".to_owned(), "garbage".to_owned(), "x-ray".to_owned()]],
        );
        let at = CellRef::new(0, 1);
        let delegate = FieldDelegate::DateTime;

        let editor = delegate.create_editor(&grid, at, &formats);
        if let Editor::DateTime(state) = &editor {
            assert!(state.is_cleared());
        }
        let outcome = delegate.commit_editor(&editor, &mut grid, at, &formats);
        assert_eq!(outcome, CommitOutcome::Committed);

        let written = grid.cell(at).expect("cell exists");
        assert!(
            formats.parse_date_time(&written).is_some(),
            "written {written:?}"
        );
    }

    #[test]
    fn readable_date_time_round_trips() {
        let formats = FieldFormats::default();
        let mut grid = MemoryGrid::with_rows(
            ["Id", "Taken at", "Title"],
            vec![vec![
                "1".to_owned(),
                "10.05.2024 07:30".to_owned(),
                "x-ray".to_owned(),
            ]],
        );
        let at = CellRef::new(0, 1);
        let delegate = FieldDelegate::DateTime;

        let editor = delegate.create_editor(&grid, at, &formats);
        delegate.commit_editor(&editor, &mut grid, at, &formats);
        assert_eq!(grid.cell(at).as_deref(), Some("10.05.2024 07:30"));
    }

    #[test]
    fn configured_sentinel_is_what_gets_written() {
        let spec = FormatSpec {
            empty_sentinel: "n/a".to_owned(),
            ..FormatSpec::default()
        };
        let formats = FieldFormats::from_spec(&spec).expect("spec compiles");
        let mut grid = patient_grid("01.05.2024", "01.05.2024");
        let delegate = FieldDelegate::date(DateDelegate::new().nullable());

        let mut editor = delegate.create_editor(&grid, ADMISSION, &formats);
        if let Editor::Date(state) = &mut editor {
            state.clear();
        }
        delegate.commit_editor(&editor, &mut grid, ADMISSION, &formats);
        assert_eq!(grid.cell(ADMISSION).as_deref(), Some("n/a"));
    }

    #[test]
    fn text_editor_typing_appends_and_erases() {
        let formats = FieldFormats::default();
        let grid = patient_grid("01.05.2024", "01.05.2024");
        let delegate = FieldDelegate::required_text("required");

        let mut editor = delegate.create_editor(&grid, NAME, &formats);
        type_text(&mut editor, "");
        editor.insert_char('J');
        editor.insert_char('o');
        editor.backspace();
        editor.insert_char('a');
        if let Editor::Text { buffer, .. } = &editor {
            assert_eq!(buffer, "Ja");
        } else {
            panic!("text delegate built {editor:?}");
        }
    }

    #[test]
    fn input_mask_gates_keystrokes() {
        let formats = FieldFormats::default();
        let mut grid = MemoryGrid::with_rows(["Code"], vec![vec![String::new()]]);
        let at = CellRef::new(0, 0);
        let pattern = Regex::new("^[0-9]{2}-[a-z]{2}$").expect("pattern compiles");
        let delegate = FieldDelegate::pattern_text_with_mask(
            pattern,
            InputMask::new("00-AA"),
            "use the 00-aa form",
        );

        let mut editor = delegate.create_editor(&grid, at, &formats);
        for ch in ['1', 'x', '2', '-', '7', 'a', 'b', 'c'] {
            editor.insert_char(ch);
        }
        if let Editor::Text { buffer, .. } = &editor {
            assert_eq!(buffer, "12-ab");
        } else {
            panic!("text delegate built {editor:?}");
        }

        assert_eq!(
            delegate.commit_editor(&editor, &mut grid, at, &formats),
            CommitOutcome::Committed
        );
        assert_eq!(grid.cell(at).as_deref(), Some("12-ab"));
    }

    #[test]
    fn editor_takes_over_the_cell_rect() {
        let delegate = FieldDelegate::required_text("hint");
        let cell = CellRect {
            x: 4,
            y: 2,
            width: 24,
            height: 1,
        };
        assert_eq!(delegate.editor_area(cell), cell);
    }
}
