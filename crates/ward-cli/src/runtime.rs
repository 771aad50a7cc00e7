// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};
use time::{OffsetDateTime, PrimitiveDateTime};
use ward_app::{PatientId, PhotoId};
use ward_db::{NewPhoto, SqlTable, Store, TableFilter, TableKind};
use ward_grid::{CellFlags, CellRef, EditableTable, FieldFormats, TabularSource, Transposed};
use ward_tui::{AppRuntime, GridId};

/// Bridges the screens to a [`Store`]: each grid is a [`SqlTable`] over the
/// live connection, and the record panel sees the patient table through a
/// [`Transposed`] adapter.
pub struct DbRuntime<'a> {
    store: &'a Store,
    formats: FieldFormats,
    show_patient_count: bool,
    patients: SqlTable<'a>,
    photos: SqlTable<'a>,
    record: Transposed<SqlTable<'a>>,
}

impl<'a> DbRuntime<'a> {
    pub fn new(store: &'a Store, formats: FieldFormats, show_patient_count: bool) -> Result<Self> {
        let mut patients = SqlTable::new(store.raw_connection(), TableKind::Patients);
        patients.select()?;

        let photos = SqlTable::new(store.raw_connection(), TableKind::Photos);
        let record = Transposed::with_source(SqlTable::new(
            store.raw_connection(),
            TableKind::Patients,
        ));

        Ok(Self {
            store,
            formats,
            show_patient_count,
            patients,
            photos,
            record,
        })
    }
}

impl AppRuntime for DbRuntime<'_> {
    fn grid(&mut self, id: GridId) -> &mut dyn TabularSource {
        match id {
            GridId::Patients => &mut self.patients,
            GridId::Record => &mut self.record,
            GridId::Photos => &mut self.photos,
        }
    }

    fn table(&mut self, id: GridId) -> &mut dyn EditableTable {
        match id {
            GridId::Patients => &mut self.patients,
            // A source is attached from construction on.
            GridId::Record => self.record.source_mut().unwrap_or(&mut self.patients),
            GridId::Photos => &mut self.photos,
        }
    }

    fn open_patient(&mut self, patient: PatientId) -> Result<()> {
        let mut detail = SqlTable::new(self.store.raw_connection(), TableKind::Patients);
        detail.set_filter(TableFilter::KeyEquals {
            column: "id",
            value: patient.get(),
        });
        detail.select()?;
        if detail.row_count() == 0 {
            bail!(
                "patient {} not found -- reload the list and retry",
                patient.get()
            );
        }

        self.record.attach(detail);
        self.record
            .set_flags(CellRef::new(0, 0), CellFlags::read_only());

        self.photos.set_filter(TableFilter::KeyEquals {
            column: "patient_id",
            value: patient.get(),
        });
        self.photos.select()?;
        Ok(())
    }

    fn close_patient(&mut self) -> Result<()> {
        self.record.attach(SqlTable::new(
            self.store.raw_connection(),
            TableKind::Patients,
        ));
        self.photos.take_filter();
        self.patients.select()?;
        Ok(())
    }

    fn import_photo(&mut self, patient: PatientId, path: &Path) -> Result<()> {
        let data =
            fs::read(path).with_context(|| format!("read photo file {}", path.display()))?;
        self.store.insert_photo(&NewPhoto {
            patient_id: patient,
            taken_at: file_capture_stamp(path, &self.formats),
            file_name: photo_title(path),
            data,
        })?;
        self.photos.select()?;
        Ok(())
    }

    fn export_photo(&mut self, row: usize) -> Result<PathBuf> {
        let Some(id) = self.photos.row_id(row) else {
            bail!("save the new photo before exporting it");
        };
        self.store.export_photo(PhotoId::new(id))
    }

    fn patient_row_id(&self, row: usize) -> Option<PatientId> {
        self.patients.row_id(row).map(PatientId::new)
    }

    fn formats(&self) -> &FieldFormats {
        &self.formats
    }

    fn show_patient_count(&self) -> bool {
        self.show_patient_count
    }
}

/// Capture stamp for an imported file: its creation time when the filesystem
/// records one, otherwise the current moment.
fn file_capture_stamp(path: &Path, formats: &FieldFormats) -> String {
    let created = fs::metadata(path)
        .and_then(|meta| meta.created())
        .ok()
        .map(|stamp| {
            let stamp = OffsetDateTime::from(stamp);
            PrimitiveDateTime::new(stamp.date(), stamp.time())
        });

    formats.format_date_time(created.unwrap_or_else(FieldFormats::now))
}

/// Title for an imported photo: the file stem.
fn photo_title(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "photo".to_owned())
}

#[cfg(test)]
mod tests {
    use super::{DbRuntime, photo_title};
    use anyhow::Result;
    use std::path::Path;
    use ward_app::{PatientColumn, PatientId};
    use ward_db::{NewPatient, NewPhoto, Store};
    use ward_grid::{CellFlags, CellRef, FieldFormats};
    use ward_tui::{AppRuntime, GridId};

    fn demo_store() -> Result<Store> {
        let store = Store::open_memory()?;
        store.bootstrap()?;

        let janet = store.insert_patient(&NewPatient {
            name: "Janet Doe".to_owned(),
            address: "12 Elm St".to_owned(),
            birth_date: "14.02.1985".to_owned(),
            admission_date: "01.05.2024".to_owned(),
            discharge_date: "10.05.2024".to_owned(),
        })?;
        let john = store.insert_patient(&NewPatient {
            name: "John Roe".to_owned(),
            address: "9 Oak Ave".to_owned(),
            birth_date: "Not set".to_owned(),
            admission_date: "03.05.2024".to_owned(),
            discharge_date: "Not set".to_owned(),
        })?;

        store.insert_photo(&NewPhoto {
            patient_id: janet,
            taken_at: "19.02.2026 12:34".to_owned(),
            file_name: "intake".to_owned(),
            data: ward_testkit::png_payload(),
        })?;
        store.insert_photo(&NewPhoto {
            patient_id: john,
            taken_at: "20.02.2026 08:00".to_owned(),
            file_name: "transfer".to_owned(),
            data: ward_testkit::png_payload(),
        })?;
        Ok(store)
    }

    fn runtime(store: &Store) -> Result<DbRuntime<'_>> {
        DbRuntime::new(store, FieldFormats::default(), true)
    }

    #[test]
    fn open_patient_scopes_the_detail_tables() -> Result<()> {
        let store = demo_store()?;
        let mut runtime = runtime(&store)?;
        let patient = runtime.patient_row_id(0).expect("first row has an id");

        runtime.open_patient(patient)?;

        let record = runtime.grid(GridId::Record);
        assert_eq!(record.row_count(), PatientColumn::ALL.len());
        assert_eq!(record.column_count(), 1);
        assert_eq!(
            record.cell(CellRef::new(PatientColumn::Name.index(), 0)).as_deref(),
            Some("Janet Doe")
        );
        assert_eq!(record.cell_flags(CellRef::new(0, 0)), CellFlags::read_only());

        let photos = runtime.grid(GridId::Photos);
        assert_eq!(photos.row_count(), 1);
        assert_eq!(photos.cell(CellRef::new(0, 2)).as_deref(), Some("intake"));
        Ok(())
    }

    #[test]
    fn missing_patient_fails_to_open() -> Result<()> {
        let store = demo_store()?;
        let mut runtime = runtime(&store)?;

        let error = runtime
            .open_patient(PatientId::new(999))
            .expect_err("unknown id should fail");
        assert!(error.to_string().contains("patient 999 not found"));
        Ok(())
    }

    #[test]
    fn close_patient_unscopes_the_detail_tables() -> Result<()> {
        let store = demo_store()?;
        let mut runtime = runtime(&store)?;
        let patient = runtime.patient_row_id(0).expect("first row has an id");

        runtime.open_patient(patient)?;
        runtime.close_patient()?;

        assert_eq!(runtime.grid(GridId::Record).column_count(), 0);
        runtime.table(GridId::Photos).select()?;
        assert_eq!(runtime.grid(GridId::Photos).row_count(), 2);
        Ok(())
    }

    #[test]
    fn record_edits_submit_through_the_adapter() -> Result<()> {
        let store = demo_store()?;
        let mut runtime = runtime(&store)?;
        let patient = runtime.patient_row_id(0).expect("first row has an id");

        runtime.open_patient(patient)?;
        assert!(
            runtime
                .grid(GridId::Record)
                .set_cell(CellRef::new(PatientColumn::Name.index(), 0), "Janet Moved")
        );
        runtime.table(GridId::Record).submit_all()?;

        let stored = store.get_patient(patient)?;
        assert_eq!(stored.name, "Janet Moved");
        Ok(())
    }

    #[test]
    fn pending_patient_rows_have_no_id() -> Result<()> {
        let store = demo_store()?;
        let mut runtime = runtime(&store)?;

        assert!(runtime.table(GridId::Patients).insert_row(vec![String::new(); 6]));
        assert_eq!(runtime.patient_row_id(2), None);
        assert!(runtime.patient_row_id(0).is_some());
        Ok(())
    }

    #[test]
    fn import_photo_reads_the_file() -> Result<()> {
        let store = demo_store()?;
        let mut runtime = runtime(&store)?;
        let patient = runtime.patient_row_id(0).expect("first row has an id");
        runtime.open_patient(patient)?;

        let temp = tempfile::tempdir()?;
        let photo_path = temp.path().join("wound-03.png");
        std::fs::write(&photo_path, ward_testkit::png_payload())?;

        runtime.import_photo(patient, &photo_path)?;

        let photos = store.list_photos(patient)?;
        assert_eq!(photos.len(), 2);
        let imported = photos
            .iter()
            .find(|photo| photo.file_name == "wound-03")
            .expect("imported photo has the file stem as its title");
        assert!(
            FieldFormats::default()
                .parse_date_time(&imported.taken_at)
                .is_some(),
            "capture stamp should render in the configured format, got {:?}",
            imported.taken_at
        );
        Ok(())
    }

    #[test]
    fn export_photo_requires_a_saved_row() -> Result<()> {
        let store = demo_store()?;
        let mut runtime = runtime(&store)?;
        let patient = runtime.patient_row_id(0).expect("first row has an id");
        runtime.open_patient(patient)?;

        assert!(runtime.table(GridId::Photos).insert_row(vec![String::new(); 3]));
        let error = runtime.export_photo(1).expect_err("pending row should fail");
        assert!(error.to_string().contains("save the new photo"));

        let path = runtime.export_photo(0)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        assert!(file_name.contains("intake"), "got {file_name}");
        Ok(())
    }

    #[test]
    fn photo_title_falls_back_when_the_path_has_no_stem() {
        assert_eq!(photo_title(Path::new("/scans/bed-4.jpeg")), "bed-4");
        assert_eq!(photo_title(Path::new("/")), "photo");
    }
}
