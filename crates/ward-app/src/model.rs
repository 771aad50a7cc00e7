// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

use crate::ids::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatientColumn {
    Id,
    Name,
    Address,
    BirthDate,
    AdmissionDate,
    DischargeDate,
}

impl PatientColumn {
    pub const ALL: [Self; 6] = [
        Self::Id,
        Self::Name,
        Self::Address,
        Self::BirthDate,
        Self::AdmissionDate,
        Self::DischargeDate,
    ];

    pub const fn index(self) -> usize {
        match self {
            Self::Id => 0,
            Self::Name => 1,
            Self::Address => 2,
            Self::BirthDate => 3,
            Self::AdmissionDate => 4,
            Self::DischargeDate => 5,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub const fn sql_name(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Address => "address",
            Self::BirthDate => "birth_date",
            Self::AdmissionDate => "admission_date",
            Self::DischargeDate => "discharge_date",
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            Self::Id => "Id",
            Self::Name => "Name",
            Self::Address => "Address",
            Self::BirthDate => "Birth date",
            Self::AdmissionDate => "Admission date",
            Self::DischargeDate => "Discharge date",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhotoColumn {
    Id,
    TakenAt,
    FileName,
}

impl PhotoColumn {
    pub const ALL: [Self; 3] = [Self::Id, Self::TakenAt, Self::FileName];

    pub const fn index(self) -> usize {
        match self {
            Self::Id => 0,
            Self::TakenAt => 1,
            Self::FileName => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub const fn sql_name(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::TakenAt => "taken_at",
            Self::FileName => "file_name",
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            Self::Id => "Id",
            Self::TakenAt => "Taken at",
            Self::FileName => "File name",
        }
    }
}

/// One stored patient row. Date fields hold display-format text; the unset
/// sentinel is a legal value, so they stay strings end to end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: PatientId,
    pub name: String,
    pub address: String,
    pub birth_date: String,
    pub admission_date: String,
    pub discharge_date: String,
}

/// Photo metadata without the payload, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRecord {
    pub id: PhotoId,
    pub patient_id: PatientId,
    pub taken_at: String,
    pub file_name: String,
    pub size_bytes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub id: PhotoId,
    pub patient_id: PatientId,
    pub taken_at: String,
    pub file_name: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageKind {
    Patients,
    PatientDetail,
}

impl PageKind {
    pub const fn title(self) -> &'static str {
        match self {
            Self::Patients => "Patients",
            Self::PatientDetail => "Patient",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormKind {
    Patient,
    PhotoImport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppMode {
    Nav,
    Edit,
    Form(FormKind),
}

#[cfg(test)]
mod tests {
    use super::{PatientColumn, PhotoColumn};

    #[test]
    fn patient_column_indexes_match_declaration_order() {
        for (index, column) in PatientColumn::ALL.iter().enumerate() {
            assert_eq!(column.index(), index, "column {column:?}");
            assert_eq!(PatientColumn::from_index(index), Some(*column));
        }
        assert_eq!(PatientColumn::from_index(PatientColumn::ALL.len()), None);
    }

    #[test]
    fn photo_column_indexes_match_declaration_order() {
        for (index, column) in PhotoColumn::ALL.iter().enumerate() {
            assert_eq!(column.index(), index, "column {column:?}");
            assert_eq!(PhotoColumn::from_index(index), Some(*column));
        }
        assert_eq!(PhotoColumn::from_index(PhotoColumn::ALL.len()), None);
    }
}
