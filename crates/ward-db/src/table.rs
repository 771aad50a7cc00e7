// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Buffered table model over a store table. Cell edits, row inserts and row
//! removals stay local until `submit_all` writes them in one transaction;
//! `revert_all` throws them away. The grid sees exactly what was selected
//! plus the pending local changes.

use anyhow::{Context, Result};
use rusqlite::types::Value;
use rusqlite::{Connection, params, params_from_iter};
use ward_app::{PatientColumn, PhotoColumn};
use ward_grid::{Axis, CellRef, EditableTable, TabularSource};

use crate::value_ref_to_string;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Patients,
    Photos,
}

impl TableKind {
    pub const fn table(self) -> &'static str {
        match self {
            Self::Patients => "patients",
            Self::Photos => "photos",
        }
    }
}

/// Scopes a table to the rows of one parent key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableFilter {
    KeyEquals { column: &'static str, value: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct BufferedRow {
    id: Option<i64>,
    cells: Vec<String>,
    baseline: Option<Vec<String>>,
    removed: bool,
}

impl BufferedRow {
    fn is_insert(&self) -> bool {
        self.baseline.is_none()
    }

    fn is_modified(&self) -> bool {
        self.baseline
            .as_ref()
            .is_some_and(|baseline| *baseline != self.cells)
    }
}

pub struct SqlTable<'conn> {
    conn: &'conn Connection,
    kind: TableKind,
    // Column 0 is the integer primary key for every grid this app shows.
    columns: Vec<&'static str>,
    titles: Vec<&'static str>,
    filter: Option<TableFilter>,
    rows: Vec<BufferedRow>,
}

impl<'conn> SqlTable<'conn> {
    pub fn new(conn: &'conn Connection, kind: TableKind) -> Self {
        let (columns, titles) = match kind {
            TableKind::Patients => (
                PatientColumn::ALL
                    .iter()
                    .map(|column| column.sql_name())
                    .collect(),
                PatientColumn::ALL
                    .iter()
                    .map(|column| column.title())
                    .collect(),
            ),
            TableKind::Photos => (
                PhotoColumn::ALL
                    .iter()
                    .map(|column| column.sql_name())
                    .collect(),
                PhotoColumn::ALL
                    .iter()
                    .map(|column| column.title())
                    .collect(),
            ),
        };
        Self {
            conn,
            kind,
            columns,
            titles,
            filter: None,
            rows: Vec::new(),
        }
    }

    pub const fn kind(&self) -> TableKind {
        self.kind
    }

    pub fn set_filter(&mut self, filter: TableFilter) {
        self.filter = Some(filter);
    }

    pub fn take_filter(&mut self) -> Option<TableFilter> {
        self.filter.take()
    }

    /// Primary key of a buffered row; `None` for pending inserts.
    pub fn row_id(&self, row: usize) -> Option<i64> {
        self.rows.get(row).and_then(|row| row.id)
    }
}

impl TabularSource for SqlTable<'_> {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn cell(&self, at: CellRef) -> Option<String> {
        self.rows.get(at.row)?.cells.get(at.column).cloned()
    }

    fn set_cell(&mut self, at: CellRef, value: &str) -> bool {
        let Some(row) = self.rows.get_mut(at.row) else {
            return false;
        };
        let Some(cell) = row.cells.get_mut(at.column) else {
            return false;
        };
        *cell = value.to_owned();
        true
    }

    fn header(&self, axis: Axis, section: usize) -> Option<String> {
        match axis {
            Axis::Horizontal => self.titles.get(section).map(|title| (*title).to_owned()),
            Axis::Vertical => {
                let row = self.rows.get(section)?;
                Some(if row.is_insert() {
                    "*".to_owned()
                } else if row.removed {
                    "!".to_owned()
                } else {
                    (section + 1).to_string()
                })
            }
        }
    }
}

impl EditableTable for SqlTable<'_> {
    fn select(&mut self) -> Result<()> {
        let mut sql = format!(
            "SELECT {} FROM {}",
            self.columns.join(", "),
            self.kind.table()
        );
        let mut bindings: Vec<i64> = Vec::new();
        if let Some(TableFilter::KeyEquals { column, value }) = &self.filter {
            sql.push_str(&format!(" WHERE {column} = ?"));
            bindings.push(*value);
        }
        sql.push_str(" ORDER BY id ASC");

        let mut stmt = self
            .conn
            .prepare(&sql)
            .with_context(|| format!("prepare select for {}", self.kind.table()))?;
        let mut query = stmt
            .query(params_from_iter(bindings))
            .with_context(|| format!("select rows from {}", self.kind.table()))?;

        let mut loaded = Vec::new();
        while let Some(row) = query
            .next()
            .with_context(|| format!("scan rows from {}", self.kind.table()))?
        {
            let id: i64 = row
                .get(0)
                .with_context(|| format!("read row id from {}", self.kind.table()))?;
            let mut cells = Vec::with_capacity(self.columns.len());
            for index in 0..self.columns.len() {
                let value = row.get_ref(index).map(value_ref_to_string).with_context(
                    || format!("read column {index} from {}", self.kind.table()),
                )?;
                cells.push(value);
            }
            loaded.push(BufferedRow {
                id: Some(id),
                baseline: Some(cells.clone()),
                cells,
                removed: false,
            });
        }

        self.rows = loaded;
        Ok(())
    }

    fn submit_all(&mut self) -> Result<()> {
        let tx = self
            .conn
            .unchecked_transaction()
            .context("begin submit transaction")?;

        for row in &self.rows {
            if row.removed {
                if let Some(id) = row.id {
                    tx.execute(
                        &format!("DELETE FROM {} WHERE id = ?", self.kind.table()),
                        params![id],
                    )
                    .with_context(|| format!("delete row {id} from {}", self.kind.table()))?;
                }
                continue;
            }

            if row.is_insert() {
                // Skip the id column; carry the filter key when scoped.
                let mut columns: Vec<&str> = self.columns[1..].to_vec();
                let mut values: Vec<Value> = row.cells[1..]
                    .iter()
                    .map(|cell| Value::from(cell.clone()))
                    .collect();
                if let Some(TableFilter::KeyEquals { column, value }) = &self.filter {
                    columns.push(column);
                    values.push(Value::from(*value));
                }
                let placeholders = vec!["?"; columns.len()].join(", ");
                let sql = format!(
                    "INSERT INTO {} ({}) VALUES ({placeholders})",
                    self.kind.table(),
                    columns.join(", "),
                );
                tx.execute(&sql, params_from_iter(values))
                    .with_context(|| format!("insert row into {}", self.kind.table()))?;
                continue;
            }

            if row.is_modified() {
                let Some(id) = row.id else {
                    continue;
                };
                let assignments = self.columns[1..]
                    .iter()
                    .map(|column| format!("{column} = ?"))
                    .collect::<Vec<_>>()
                    .join(", ");
                let sql = format!(
                    "UPDATE {} SET {assignments} WHERE id = ?",
                    self.kind.table(),
                );
                let mut values: Vec<Value> = row.cells[1..]
                    .iter()
                    .map(|cell| Value::from(cell.clone()))
                    .collect();
                values.push(Value::from(id));
                tx.execute(&sql, params_from_iter(values))
                    .with_context(|| format!("update row {id} in {}", self.kind.table()))?;
            }
        }

        tx.commit().context("commit submit transaction")?;
        self.select()
    }

    fn revert_all(&mut self) {
        self.rows.retain(|row| !row.is_insert());
        for row in &mut self.rows {
            if let Some(baseline) = &row.baseline {
                row.cells.clone_from(baseline);
            }
            row.removed = false;
        }
    }

    fn insert_row(&mut self, values: Vec<String>) -> bool {
        if values.len() != self.columns.len() {
            return false;
        }
        self.rows.push(BufferedRow {
            id: None,
            cells: values,
            baseline: None,
            removed: false,
        });
        true
    }

    fn remove_row(&mut self, row: usize) -> bool {
        if row >= self.rows.len() {
            return false;
        }
        if self.rows[row].is_insert() {
            self.rows.remove(row);
        } else {
            self.rows[row].removed = true;
        }
        true
    }

    fn is_dirty(&self) -> bool {
        self.rows
            .iter()
            .any(|row| row.removed || row.is_insert() || row.is_modified())
    }
}

#[cfg(test)]
mod tests {
    use ward_grid::{Axis, CellRef, EditableTable, TabularSource};

    use super::{SqlTable, TableFilter, TableKind};
    use crate::{NewPatient, NewPhoto, Store};
    use ward_app::PatientId;

    const NAME: CellRef = CellRef::new(0, 1);

    fn demo_store() -> Store {
        let store = Store::open_memory().expect("open in-memory store");
        store.bootstrap().expect("bootstrap schema");
        store
            .insert_patient(&NewPatient {
                name: "Janet Doe".to_owned(),
                address: "12 Elm Street".to_owned(),
                birth_date: "02.03.1990".to_owned(),
                admission_date: "01.05.2024".to_owned(),
                discharge_date: "10.05.2024".to_owned(),
            })
            .expect("insert first patient");
        store
            .insert_patient(&NewPatient {
                name: "John Roe".to_owned(),
                address: "7 Oak Lane".to_owned(),
                birth_date: "Not set".to_owned(),
                admission_date: "03.05.2024".to_owned(),
                discharge_date: "03.05.2024".to_owned(),
            })
            .expect("insert second patient");
        store
    }

    #[test]
    fn select_loads_rows_in_id_order() {
        let store = demo_store();
        let mut table = SqlTable::new(store.raw_connection(), TableKind::Patients);
        table.select().expect("select patients");

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_count(), 6);
        assert_eq!(table.cell(CellRef::new(0, 0)).as_deref(), Some("1"));
        assert_eq!(table.cell(NAME).as_deref(), Some("Janet Doe"));
        assert_eq!(table.cell(CellRef::new(1, 1)).as_deref(), Some("John Roe"));
        assert_eq!(table.header(Axis::Horizontal, 1).as_deref(), Some("Name"));
        assert_eq!(table.header(Axis::Vertical, 0).as_deref(), Some("1"));
        assert!(!table.is_dirty());
    }

    #[test]
    fn cell_edits_stay_buffered_until_submitted() {
        let store = demo_store();
        let mut table = SqlTable::new(store.raw_connection(), TableKind::Patients);
        table.select().expect("select patients");

        assert!(table.set_cell(NAME, "Janet Moved"));
        assert!(table.is_dirty());
        let stored = store.get_patient(PatientId::new(1)).expect("load patient");
        assert_eq!(stored.name, "Janet Doe");

        table.submit_all().expect("submit edits");
        assert!(!table.is_dirty());
        let stored = store.get_patient(PatientId::new(1)).expect("load patient");
        assert_eq!(stored.name, "Janet Moved");
    }

    #[test]
    fn revert_restores_the_selected_snapshot() {
        let store = demo_store();
        let mut table = SqlTable::new(store.raw_connection(), TableKind::Patients);
        table.select().expect("select patients");

        table.set_cell(NAME, "scratch");
        table.insert_row(vec![String::new(); 6]);
        table.remove_row(1);
        assert!(table.is_dirty());

        table.revert_all();
        assert!(!table.is_dirty());
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.cell(NAME).as_deref(), Some("Janet Doe"));
        assert_eq!(table.header(Axis::Vertical, 1).as_deref(), Some("2"));
    }

    #[test]
    fn inserted_rows_get_a_star_header_and_an_id_on_submit() {
        let store = demo_store();
        let mut table = SqlTable::new(store.raw_connection(), TableKind::Patients);
        table.select().expect("select patients");

        assert!(!table.insert_row(vec![String::new(); 3]), "width mismatch");
        assert!(table.insert_row(vec![
            String::new(),
            "Ann Newly".to_owned(),
            "1 Birch Way".to_owned(),
            "Not set".to_owned(),
            "04.05.2024".to_owned(),
            "04.05.2024".to_owned(),
        ]));
        assert_eq!(table.header(Axis::Vertical, 2).as_deref(), Some("*"));
        assert_eq!(table.row_id(2), None);

        table.submit_all().expect("submit insert");
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.header(Axis::Vertical, 2).as_deref(), Some("3"));
        assert_eq!(table.row_id(2), Some(3));
        assert_eq!(store.count_patients().expect("count"), 3);
    }

    #[test]
    fn removing_a_pending_insert_drops_it_outright() {
        let store = demo_store();
        let mut table = SqlTable::new(store.raw_connection(), TableKind::Patients);
        table.select().expect("select patients");

        table.insert_row(vec![String::new(); 6]);
        assert_eq!(table.row_count(), 3);
        assert!(table.remove_row(2));
        assert_eq!(table.row_count(), 2);
        assert!(!table.is_dirty());
    }

    #[test]
    fn removed_rows_show_a_bang_header_and_delete_on_submit() {
        let store = demo_store();
        let mut table = SqlTable::new(store.raw_connection(), TableKind::Patients);
        table.select().expect("select patients");

        assert!(table.remove_row(0));
        assert_eq!(table.header(Axis::Vertical, 0).as_deref(), Some("!"));
        assert_eq!(table.row_count(), 2, "row stays visible until submit");
        assert!(table.is_dirty());

        table.submit_all().expect("submit removal");
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.cell(NAME).as_deref(), Some("John Roe"));
        assert_eq!(store.count_patients().expect("count"), 1);
    }

    #[test]
    fn photos_table_is_scoped_by_its_filter() {
        let store = demo_store();
        for patient in 1..=2_i64 {
            store
                .insert_photo(&NewPhoto {
                    patient_id: PatientId::new(patient),
                    taken_at: "10.05.2024 07:30".to_owned(),
                    file_name: format!("intake-{patient}.png"),
                    data: ward_testkit::png_payload(),
                })
                .expect("insert photo");
        }

        let mut table = SqlTable::new(store.raw_connection(), TableKind::Photos);
        table.set_filter(TableFilter::KeyEquals {
            column: "patient_id",
            value: 1,
        });
        table.select().expect("select photos");

        assert_eq!(table.row_count(), 1);
        assert_eq!(
            table.cell(CellRef::new(0, 2)).as_deref(),
            Some("intake-1.png")
        );

        assert!(table.take_filter().is_some());
        table.select().expect("select unfiltered");
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn photo_edits_write_back_through_the_filter() {
        let store = demo_store();
        store
            .insert_photo(&NewPhoto {
                patient_id: PatientId::new(1),
                taken_at: "10.05.2024 07:30".to_owned(),
                file_name: "wound-01.png".to_owned(),
                data: ward_testkit::png_payload(),
            })
            .expect("insert photo");

        let mut table = SqlTable::new(store.raw_connection(), TableKind::Photos);
        table.set_filter(TableFilter::KeyEquals {
            column: "patient_id",
            value: 1,
        });
        table.select().expect("select photos");

        assert!(table.set_cell(CellRef::new(0, 2), "wound-02.png"));
        table.submit_all().expect("submit rename");

        let photos = store.list_photos(PatientId::new(1)).expect("list photos");
        assert_eq!(photos.len(), 1);
        assert_eq!(photos[0].file_name, "wound-02.png");
        assert_eq!(photos[0].taken_at, "10.05.2024 07:30");
    }
}
