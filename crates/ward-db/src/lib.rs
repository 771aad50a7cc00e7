// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, params};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::env;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use ward_app::{Patient, PatientId, Photo, PhotoId, PhotoRecord};
use ward_grid::FieldFormats;
use ward_testkit::PatientFaker;

pub mod table;

pub use table::{SqlTable, TableFilter, TableKind};

pub const APP_NAME: &str = "ward";
pub const MAX_PHOTO_SIZE: i64 = 20 << 20;

const DEMO_SEED: u64 = 42;
const DEMO_PATIENTS: usize = 8;

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    (
        "patients",
        &[
            "id",
            "name",
            "address",
            "birth_date",
            "admission_date",
            "discharge_date",
        ],
    ),
    (
        "photos",
        &["id", "taken_at", "file_name", "data", "patient_id"],
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RequiredIndex {
    name: &'static str,
    create_sql: &'static str,
}

const REQUIRED_INDEXES: &[RequiredIndex] = &[RequiredIndex {
    name: "idx_photos_patient_id",
    create_sql: "CREATE INDEX IF NOT EXISTS idx_photos_patient_id ON photos (patient_id);",
}];

/// A patient row ready for insertion; date fields carry display-format text
/// or the unset sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPatient {
    pub name: String,
    pub address: String,
    pub birth_date: String,
    pub admission_date: String,
    pub discharge_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPhoto {
    pub patient_id: PatientId,
    pub taken_at: String,
    pub file_name: String,
    pub data: Vec<u8>,
}

pub struct Store {
    conn: Connection,
    max_photo_size: i64,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        configure_connection(&conn)?;
        Ok(Self {
            conn,
            max_photo_size: MAX_PHOTO_SIZE,
        })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        configure_connection(&conn)?;
        Ok(Self {
            conn,
            max_photo_size: MAX_PHOTO_SIZE,
        })
    }

    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    /// Create the schema when the database is empty; otherwise check that the
    /// tables this build expects are all present.
    pub fn bootstrap(&self) -> Result<()> {
        if has_user_tables(&self.conn)? {
            validate_schema(&self.conn)?;
        } else {
            self.conn
                .execute_batch(include_str!("sql/schema.sql"))
                .context("create schema")?;
        }

        ensure_required_indexes(&self.conn)
    }

    pub fn set_max_photo_size(&mut self, value: i64) -> Result<()> {
        if value <= 0 {
            bail!("max photo size must be positive, got {value}");
        }
        self.max_photo_size = value;
        Ok(())
    }

    pub fn max_photo_size(&self) -> i64 {
        self.max_photo_size
    }

    pub fn insert_patient(&self, patient: &NewPatient) -> Result<PatientId> {
        self.conn
            .execute(
                "
                INSERT INTO patients (
                  name, address, birth_date, admission_date, discharge_date
                ) VALUES (?, ?, ?, ?, ?)
                ",
                params![
                    patient.name,
                    patient.address,
                    patient.birth_date,
                    patient.admission_date,
                    patient.discharge_date,
                ],
            )
            .context("insert patient")?;
        Ok(PatientId::new(self.conn.last_insert_rowid()))
    }

    pub fn get_patient(&self, patient_id: PatientId) -> Result<Patient> {
        self.conn
            .query_row(
                "
                SELECT id, name, address, birth_date, admission_date, discharge_date
                FROM patients
                WHERE id = ?
                ",
                params![patient_id.get()],
                |row| {
                    Ok(Patient {
                        id: PatientId::new(row.get(0)?),
                        name: row.get(1)?,
                        address: row.get(2)?,
                        birth_date: row.get(3)?,
                        admission_date: row.get(4)?,
                        discharge_date: row.get(5)?,
                    })
                },
            )
            .with_context(|| format!("load patient {}", patient_id.get()))
    }

    pub fn list_patients(&self) -> Result<Vec<Patient>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT id, name, address, birth_date, admission_date, discharge_date
                FROM patients
                ORDER BY id ASC
                ",
            )
            .context("prepare patients query")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Patient {
                    id: PatientId::new(row.get(0)?),
                    name: row.get(1)?,
                    address: row.get(2)?,
                    birth_date: row.get(3)?,
                    admission_date: row.get(4)?,
                    discharge_date: row.get(5)?,
                })
            })
            .context("query patients")?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect patients")
    }

    pub fn count_patients(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM patients", [], |row| row.get(0))
            .context("count patients")
    }

    /// Hard delete; the foreign key cascade removes the patient's photos.
    pub fn delete_patient(&self, patient_id: PatientId) -> Result<()> {
        let rows_affected = self
            .conn
            .execute(
                "DELETE FROM patients WHERE id = ?",
                params![patient_id.get()],
            )
            .context("delete patient")?;
        if rows_affected == 0 {
            bail!(
                "patient {} not found -- refresh the list and retry",
                patient_id.get()
            );
        }
        Ok(())
    }

    pub fn insert_photo(&self, photo: &NewPhoto) -> Result<PhotoId> {
        let size = i64::try_from(photo.data.len()).context("photo size overflow")?;
        if size > self.max_photo_size {
            bail!(
                "photo is {} bytes but max allowed is {}; shrink the file and retry",
                size,
                self.max_photo_size
            );
        }

        self.conn
            .execute(
                "
                INSERT INTO photos (taken_at, file_name, data, patient_id)
                VALUES (?, ?, ?, ?)
                ",
                params![
                    photo.taken_at,
                    photo.file_name,
                    photo.data,
                    photo.patient_id.get(),
                ],
            )
            .context("insert photo")?;
        Ok(PhotoId::new(self.conn.last_insert_rowid()))
    }

    pub fn list_photos(&self, patient_id: PatientId) -> Result<Vec<PhotoRecord>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT id, patient_id, taken_at, file_name, length(data)
                FROM photos
                WHERE patient_id = ?
                ORDER BY id ASC
                ",
            )
            .context("prepare photos query")?;
        let rows = stmt
            .query_map(params![patient_id.get()], |row| {
                Ok(PhotoRecord {
                    id: PhotoId::new(row.get(0)?),
                    patient_id: PatientId::new(row.get(1)?),
                    taken_at: row.get(2)?,
                    file_name: row.get(3)?,
                    size_bytes: row.get(4)?,
                })
            })
            .context("query photos")?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect photos")
    }

    pub fn get_photo(&self, photo_id: PhotoId) -> Result<Photo> {
        self.conn
            .query_row(
                "
                SELECT id, patient_id, taken_at, file_name, data
                FROM photos
                WHERE id = ?
                ",
                params![photo_id.get()],
                |row| {
                    Ok(Photo {
                        id: PhotoId::new(row.get(0)?),
                        patient_id: PatientId::new(row.get(1)?),
                        taken_at: row.get(2)?,
                        file_name: row.get(3)?,
                        data: row.get(4)?,
                    })
                },
            )
            .with_context(|| format!("load photo {}", photo_id.get()))
    }

    pub fn rename_photo(&self, photo_id: PhotoId, file_name: &str) -> Result<()> {
        let rows_affected = self
            .conn
            .execute(
                "UPDATE photos SET file_name = ? WHERE id = ?",
                params![file_name, photo_id.get()],
            )
            .context("rename photo")?;
        if rows_affected == 0 {
            bail!("photo {} not found -- refresh and retry", photo_id.get());
        }
        Ok(())
    }

    pub fn delete_photo(&self, photo_id: PhotoId) -> Result<()> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM photos WHERE id = ?", params![photo_id.get()])
            .context("delete photo")?;
        if rows_affected == 0 {
            bail!("photo {} not found -- refresh and retry", photo_id.get());
        }
        Ok(())
    }

    /// Writes the photo bytes to the cache directory under a checksum-prefixed
    /// name and returns the path, so an external viewer can open it.
    pub fn export_photo(&self, photo_id: PhotoId) -> Result<PathBuf> {
        let row = self
            .conn
            .query_row(
                "SELECT data, file_name FROM photos WHERE id = ?",
                params![photo_id.get()],
                |row| {
                    let data: Vec<u8> = row.get(0)?;
                    let file_name: String = row.get(1)?;
                    Ok((data, file_name))
                },
            )
            .with_context(|| format!("load photo content {}", photo_id.get()))?;

        let (data, file_name) = row;
        if data.is_empty() {
            bail!("photo {} has no content", photo_id.get());
        }

        let checksum = checksum_sha256(&data);
        let cache_dir = photo_cache_dir()?;
        let file_name = Path::new(&file_name)
            .file_name()
            .unwrap_or_else(|| OsStr::new("photo.bin"))
            .to_string_lossy();
        let cache_path = cache_dir.join(format!("{checksum}-{file_name}"));

        // Rewrite even on a cache hit so TTL eviction sees a fresh mtime.
        fs::write(&cache_path, &data)
            .with_context(|| format!("write cache file {}", cache_path.display()))?;
        set_private_permissions(&cache_path)?;

        Ok(cache_path)
    }

    /// Fills an empty database with deterministic sample patients and photos.
    pub fn seed_demo_data(&self, formats: &FieldFormats) -> Result<()> {
        let mut faker = PatientFaker::new(DEMO_SEED);
        for index in 0..DEMO_PATIENTS {
            let seed = faker.patient(formats);
            let patient_id = self.insert_patient(&NewPatient {
                name: seed.name,
                address: seed.address,
                birth_date: seed.birth_date,
                admission_date: seed.admission_date,
                discharge_date: seed.discharge_date,
            })?;

            for _ in 0..(index % 3) {
                self.insert_photo(&NewPhoto {
                    patient_id,
                    taken_at: faker.photo_stamp(formats),
                    file_name: faker.photo_file_name(),
                    data: ward_testkit::png_payload(),
                })?;
            }
        }
        Ok(())
    }
}

pub fn default_db_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os("WARD_DB_PATH") {
        return Ok(PathBuf::from(override_path));
    }

    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set WARD_DB_PATH to a writable database path")
    })?;

    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir.join("ward.db"))
}

pub fn photo_cache_dir() -> Result<PathBuf> {
    let cache_root = dirs::cache_dir().ok_or_else(|| {
        anyhow!("cannot resolve cache directory; set XDG_CACHE_HOME or platform equivalent")
    })?;
    let dir = cache_root.join(APP_NAME).join("photos");
    fs::create_dir_all(&dir)
        .with_context(|| format!("create cache directory {}", dir.display()))?;
    Ok(dir)
}

pub fn evict_stale_cache(dir: &Path, ttl_days: i64) -> Result<usize> {
    if ttl_days <= 0 {
        return Ok(0);
    }
    if !dir.exists() {
        return Ok(0);
    }

    let ttl_secs = u64::try_from(ttl_days)
        .ok()
        .and_then(|days| days.checked_mul(24 * 60 * 60))
        .ok_or_else(|| anyhow!("ttl_days is too large: {ttl_days}"))?;
    let ttl = Duration::from_secs(ttl_secs);
    let now = std::time::SystemTime::now();

    let mut removed = 0usize;
    for entry in fs::read_dir(dir).with_context(|| format!("read cache dir {}", dir.display()))? {
        let entry = entry?;
        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(_) => continue,
        };
        if metadata.is_dir() {
            continue;
        }
        let modified = match metadata.modified() {
            Ok(modified) => modified,
            Err(_) => continue,
        };
        if now.duration_since(modified).unwrap_or(Duration::ZERO) > ttl
            && fs::remove_file(entry.path()).is_ok()
        {
            removed += 1;
        }
    }

    Ok(removed)
}

pub fn validate_db_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("database path must not be empty");
    }
    if path == ":memory:" {
        return Ok(());
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "database path {path:?} looks like a URI ({scheme}://); pass a filesystem path instead"
            );
        }
    }

    if path.starts_with("file:") {
        bail!("database path {path:?} uses file: URI syntax; pass a plain filesystem path");
    }

    if path.contains('?') {
        bail!(
            "database path {path:?} contains '?'; remove query parameters and use a plain file path"
        );
    }

    Ok(())
}

pub(crate) fn value_ref_to_string(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(value) => value.to_string(),
        ValueRef::Real(value) => value.to_string(),
        ValueRef::Text(value) => String::from_utf8_lossy(value).into_owned(),
        ValueRef::Blob(value) => format!("{} bytes", value.len()),
    }
}

fn has_user_tables(conn: &Connection) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "
            SELECT COUNT(*)
            FROM sqlite_master
            WHERE type = 'table'
              AND name NOT LIKE 'sqlite_%'
            ",
            [],
            |row| row.get(0),
        )
        .context("count user tables")?;
    Ok(count > 0)
}

fn validate_schema(conn: &Connection) -> Result<()> {
    for (table, required_columns) in REQUIRED_SCHEMA {
        if !table_exists(conn, table)? {
            bail!(
                "database is missing required table `{table}`; use a ward-compatible database or start with a fresh file"
            );
        }

        let columns = table_columns(conn, table)?;
        let missing: Vec<&str> = required_columns
            .iter()
            .copied()
            .filter(|column| !columns.contains(*column))
            .collect();

        if !missing.is_empty() {
            bail!(
                "table `{table}` is missing required columns: {}; use a ward-compatible database or start with a fresh file",
                missing.join(", ")
            );
        }
    }

    Ok(())
}

fn ensure_required_indexes(conn: &Connection) -> Result<()> {
    for index in REQUIRED_INDEXES {
        conn.execute_batch(index.create_sql)
            .with_context(|| format!("ensure required index `{}`", index.name))?;
    }

    let existing_indexes = index_names(conn)?;
    let missing = REQUIRED_INDEXES
        .iter()
        .filter(|index| !existing_indexes.contains(index.name))
        .map(|index| index.name)
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        bail!(
            "database is missing required indexes: {}; start with a fresh file",
            missing.join(", ")
        );
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let exists = conn
        .query_row(
            "
            SELECT EXISTS(
              SELECT 1
              FROM sqlite_master
              WHERE type = 'table' AND name = ?
            )
            ",
            params![table],
            |row| row.get::<_, i64>(0),
        )
        .with_context(|| format!("check table existence for {table}"))?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .with_context(|| format!("inspect columns for {table}"))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .with_context(|| format!("query column info for {table}"))?;

    let names = rows
        .collect::<rusqlite::Result<BTreeSet<_>>>()
        .with_context(|| format!("collect columns for {table}"))?;
    Ok(names)
}

fn index_names(conn: &Connection) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(
            "
            SELECT name
            FROM sqlite_master
            WHERE type = 'index'
              AND name NOT LIKE 'sqlite_%'
            ORDER BY name ASC
            ",
        )
        .context("prepare index names query")?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .context("query index names")?;
    rows.collect::<rusqlite::Result<BTreeSet<_>>>()
        .context("collect index names")
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .context("configure sqlite pragmas")
}

fn checksum_sha256(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    let mut output = String::with_capacity(64);
    for byte in digest {
        use std::fmt::Write as _;
        let _ = write!(&mut output, "{byte:02x}");
    }
    output
}

fn set_private_permissions(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let mut permissions = fs::metadata(path)
            .with_context(|| format!("stat {}", path.display()))?
            .permissions();
        permissions.set_mode(0o600);
        fs::set_permissions(path, permissions)
            .with_context(|| format!("set permissions on {}", path.display()))?;
    }
    Ok(())
}
