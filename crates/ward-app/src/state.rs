// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Pure navigation state for the terminal app. The reducer owns every
//! page/mode transition so the event loop stays a thin translation layer.

use crate::ids::PatientId;
use crate::model::{AppMode, FormKind, PageKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub mode: AppMode,
    pub page: PageKind,
    pub open_patient: Option<PatientId>,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            mode: AppMode::Nav,
            page: PageKind::Patients,
            open_patient: None,
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    OpenPatient(PatientId),
    ClosePatient,
    EnterEditMode,
    ExitToNav,
    OpenForm(FormKind),
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    PageChanged(PageKind),
    ModeChanged(AppMode),
    StatusUpdated(Option<String>),
}

impl AppState {
    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::OpenPatient(id) => {
                if self.page == PageKind::PatientDetail && self.open_patient == Some(id) {
                    return Vec::new();
                }
                let mut events = Vec::new();
                self.open_patient = Some(id);
                self.page = PageKind::PatientDetail;
                events.push(AppEvent::PageChanged(self.page));
                if self.mode != AppMode::Nav {
                    self.mode = AppMode::Nav;
                    events.push(AppEvent::ModeChanged(self.mode));
                }
                events
            }
            AppCommand::ClosePatient => {
                if self.page != PageKind::PatientDetail {
                    return Vec::new();
                }
                let mut events = Vec::new();
                self.open_patient = None;
                self.page = PageKind::Patients;
                events.push(AppEvent::PageChanged(self.page));
                if self.mode != AppMode::Nav {
                    self.mode = AppMode::Nav;
                    events.push(AppEvent::ModeChanged(self.mode));
                }
                events
            }
            AppCommand::EnterEditMode => {
                if self.mode != AppMode::Nav {
                    return Vec::new();
                }
                self.mode = AppMode::Edit;
                vec![AppEvent::ModeChanged(self.mode)]
            }
            AppCommand::ExitToNav => {
                if self.mode == AppMode::Nav {
                    return Vec::new();
                }
                self.mode = AppMode::Nav;
                vec![AppEvent::ModeChanged(self.mode)]
            }
            AppCommand::OpenForm(kind) => {
                if self.mode != AppMode::Nav {
                    return Vec::new();
                }
                // A photo import needs a patient to attach to.
                if kind == FormKind::PhotoImport && self.open_patient.is_none() {
                    return Vec::new();
                }
                self.mode = AppMode::Form(kind);
                vec![AppEvent::ModeChanged(self.mode)]
            }
            AppCommand::SetStatus(message) => {
                vec![self.set_status(Some(message))]
            }
            AppCommand::ClearStatus => {
                if self.status_line.is_none() {
                    return Vec::new();
                }
                vec![self.set_status(None)]
            }
        }
    }

    fn set_status(&mut self, message: Option<String>) -> AppEvent {
        self.status_line.clone_from(&message);
        AppEvent::StatusUpdated(message)
    }
}
