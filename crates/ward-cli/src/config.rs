// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use ward_grid::{
    DEFAULT_DATE_FORMAT, DEFAULT_DATE_TIME_FORMAT, DEFAULT_EMPTY_SENTINEL,
    DEFAULT_REQUIRED_PATTERN, FieldFormats, FormatSpec,
};

const CONFIG_VERSION: i64 = 1;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub formats: Formats,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            storage: Storage::default(),
            ui: Ui::default(),
            formats: Formats::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
    pub db_path: Option<String>,
    pub max_photo_size: Option<i64>,
    pub cache_ttl_days: Option<i64>,
}

impl Default for Storage {
    fn default() -> Self {
        Self {
            db_path: None,
            max_photo_size: Some(ward_db::MAX_PHOTO_SIZE),
            cache_ttl_days: Some(30),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ui {
    pub show_patient_count: Option<bool>,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            show_patient_count: Some(true),
        }
    }
}

/// Display-format strings; compiled into [`FieldFormats`] at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct Formats {
    pub date: Option<String>,
    pub date_time: Option<String>,
    pub unset_label: Option<String>,
    pub required_pattern: Option<String>,
}

impl Default for Formats {
    fn default() -> Self {
        Self {
            date: Some(DEFAULT_DATE_FORMAT.to_owned()),
            date_time: Some(DEFAULT_DATE_TIME_FORMAT.to_owned()),
            unset_label: Some(DEFAULT_EMPTY_SENTINEL.to_owned()),
            required_pattern: Some(DEFAULT_REQUIRED_PATTERN.to_owned()),
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("WARD_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set WARD_CONFIG_PATH to the config file")
        })?;

        let app_dir = config_root.join(ward_db::APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and move values under [storage], [ui], and [formats]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if self.version != CONFIG_VERSION {
            bail!(
                "config {} has version {}; expected 1",
                path.display(),
                self.version
            );
        }

        if let Some(db_path) = &self.storage.db_path {
            ward_db::validate_db_path(db_path)?;
        }

        if let Some(max_size) = self.storage.max_photo_size
            && max_size <= 0
        {
            bail!(
                "storage.max_photo_size in {} must be positive, got {}",
                path.display(),
                max_size
            );
        }

        if let Some(ttl_days) = self.storage.cache_ttl_days
            && ttl_days < 0
        {
            bail!(
                "storage.cache_ttl_days in {} must be non-negative, got {}",
                path.display(),
                ttl_days
            );
        }

        self.field_formats()
            .with_context(|| format!("invalid [formats] in {}", path.display()))?;

        Ok(())
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.storage.db_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => ward_db::default_db_path(),
        }
    }

    pub fn show_patient_count(&self) -> bool {
        self.ui.show_patient_count.unwrap_or(true)
    }

    pub fn max_photo_size(&self) -> i64 {
        self.storage.max_photo_size.unwrap_or(ward_db::MAX_PHOTO_SIZE)
    }

    pub fn cache_ttl_days(&self) -> i64 {
        self.storage.cache_ttl_days.unwrap_or(30)
    }

    pub fn format_spec(&self) -> FormatSpec {
        FormatSpec {
            date: self
                .formats
                .date
                .clone()
                .unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_owned()),
            date_time: self
                .formats
                .date_time
                .clone()
                .unwrap_or_else(|| DEFAULT_DATE_TIME_FORMAT.to_owned()),
            required_pattern: self
                .formats
                .required_pattern
                .clone()
                .unwrap_or_else(|| DEFAULT_REQUIRED_PATTERN.to_owned()),
            empty_sentinel: self
                .formats
                .unset_label
                .clone()
                .unwrap_or_else(|| DEFAULT_EMPTY_SENTINEL.to_owned()),
        }
    }

    pub fn field_formats(&self) -> Result<FieldFormats> {
        FieldFormats::from_spec(&self.format_spec())
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# ward config\n# Place this file at: {}\n\nversion = 1\n\n[storage]\n# Optional. Default is the platform data dir (for example ~/.local/share/ward/ward.db)\n# db_path = \"/absolute/path/to/ward.db\"\nmax_photo_size = {}\ncache_ttl_days = 30\n\n[ui]\nshow_patient_count = true\n\n[formats]\ndate = \"{}\"\ndate_time = \"{}\"\nunset_label = \"{}\"\nrequired_pattern = '{}'\n",
            path.display(),
            ward_db::MAX_PHOTO_SIZE,
            DEFAULT_DATE_FORMAT,
            DEFAULT_DATE_TIME_FORMAT,
            DEFAULT_EMPTY_SENTINEL,
            DEFAULT_REQUIRED_PATTERN,
        )
    }
}
