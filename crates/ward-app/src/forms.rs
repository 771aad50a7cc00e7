// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Input payloads for the modal forms, validated before they touch a table.

use anyhow::{Result, bail};
use time::Date;
use ward_grid::FieldFormats;

use crate::model::FormKind;

/// Draft of a new patient row as collected by the add-patient form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientFormInput {
    pub name: String,
    pub address: String,
    pub birth_date: Option<Date>,
    pub admission_date: Date,
    pub discharge_date: Date,
}

impl PatientFormInput {
    pub fn blank(today: Date) -> Self {
        Self {
            name: String::new(),
            address: String::new(),
            birth_date: None,
            admission_date: today,
            discharge_date: today,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("patient name is required -- enter a name and retry");
        }
        if self.address.trim().is_empty() {
            bail!("patient address is required -- enter an address and retry");
        }
        if self.discharge_date < self.admission_date {
            bail!("discharge date must be on/after the admission date");
        }
        Ok(())
    }

    /// Renders the draft as a table row ready for `insert_row`. The id cell
    /// stays empty so the store can assign one on submit.
    pub fn to_row(&self, formats: &FieldFormats) -> Vec<String> {
        let birth = match self.birth_date {
            Some(date) => formats.format_date(date),
            None => formats.empty_sentinel().to_owned(),
        };
        vec![
            String::new(),
            self.name.trim().to_owned(),
            self.address.trim().to_owned(),
            birth,
            formats.format_date(self.admission_date),
            formats.format_date(self.discharge_date),
        ]
    }
}

/// Draft of a photo import: the file to read and the name to store it under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoImportInput {
    pub path: String,
}

impl PhotoImportInput {
    pub fn blank() -> Self {
        Self { path: String::new() }
    }

    pub fn validate(&self) -> Result<()> {
        if self.path.trim().is_empty() {
            bail!("photo path is required -- enter a file path and retry");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPayload {
    Patient(PatientFormInput),
    PhotoImport(PhotoImportInput),
}

impl FormPayload {
    pub const fn kind(&self) -> FormKind {
        match self {
            Self::Patient(_) => FormKind::Patient,
            Self::PhotoImport(_) => FormKind::PhotoImport,
        }
    }

    pub fn blank_for(kind: FormKind, today: Date) -> Self {
        match kind {
            FormKind::Patient => Self::Patient(PatientFormInput::blank(today)),
            FormKind::PhotoImport => Self::PhotoImport(PhotoImportInput::blank()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Patient(input) => input.validate(),
            Self::PhotoImport(input) => input.validate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use time::{Date, Month};
    use ward_grid::FieldFormats;

    use super::{FormPayload, PatientFormInput, PhotoImportInput};
    use crate::model::FormKind;

    fn date(year: i32, month: Month, day: u8) -> Date {
        Date::from_calendar_date(year, month, day).expect("valid date")
    }

    fn filled_patient() -> PatientFormInput {
        PatientFormInput {
            name: "Janet Doe".to_owned(),
            address: "12 Elm Street".to_owned(),
            birth_date: Some(date(1990, Month::March, 2)),
            admission_date: date(2024, Month::May, 1),
            discharge_date: date(2024, Month::May, 10),
        }
    }

    #[test]
    fn filled_patient_input_passes_validation() {
        assert!(filled_patient().validate().is_ok());
    }

    #[test]
    fn blank_name_and_address_are_rejected() {
        let mut input = filled_patient();
        input.name = "   ".to_owned();
        let error = input.validate().expect_err("name should be rejected");
        assert!(error.to_string().contains("name is required"));

        let mut input = filled_patient();
        input.address.clear();
        let error = input.validate().expect_err("address should be rejected");
        assert!(error.to_string().contains("address is required"));
    }

    #[test]
    fn discharge_before_admission_is_rejected() {
        let mut input = filled_patient();
        input.discharge_date = date(2024, Month::April, 30);
        let error = input.validate().expect_err("range should be rejected");
        assert!(error.to_string().contains("on/after"));
    }

    #[test]
    fn row_uses_sentinel_for_unknown_birth_date() {
        let formats = FieldFormats::default();
        let mut input = filled_patient();
        input.birth_date = None;
        input.name = "  Janet Doe  ".to_owned();

        let row = input.to_row(&formats);
        assert_eq!(
            row,
            vec![
                String::new(),
                "Janet Doe".to_owned(),
                "12 Elm Street".to_owned(),
                "Not set".to_owned(),
                "01.05.2024".to_owned(),
                "10.05.2024".to_owned(),
            ],
        );
    }

    #[test]
    fn blank_patient_form_defaults_both_stay_dates_to_today() {
        let today = date(2024, Month::May, 10);
        let FormPayload::Patient(input) = FormPayload::blank_for(FormKind::Patient, today) else {
            panic!("patient form expected");
        };
        assert_eq!(input.admission_date, today);
        assert_eq!(input.discharge_date, today);
        assert_eq!(input.birth_date, None);
        assert!(input.validate().is_err(), "blank names must not validate");
    }

    #[test]
    fn photo_import_requires_a_path() {
        let error = PhotoImportInput::blank()
            .validate()
            .expect_err("empty path should be rejected");
        assert!(error.to_string().contains("path is required"));

        let input = PhotoImportInput { path: "scans/wound.png".to_owned() };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn payload_reports_its_kind() {
        let today = date(2024, Month::May, 10);
        let cases = [FormKind::Patient, FormKind::PhotoImport];
        for kind in cases {
            assert_eq!(FormPayload::blank_for(kind, today).kind(), kind);
        }
    }
}
