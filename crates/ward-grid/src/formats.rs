// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use regex::Regex;
use time::format_description::{self, OwnedFormatItem};
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time};

pub const DEFAULT_DATE_FORMAT: &str = "[day].[month].[year]";
pub const DEFAULT_DATE_TIME_FORMAT: &str = "[day].[month].[year] [hour]:[minute]";
pub const DEFAULT_REQUIRED_PATTERN: &str = r"\S";
pub const DEFAULT_EMPTY_SENTINEL: &str = "Not set";

/// Plain-string description of the display formats, as read from the config
/// file. Compiled into [`FieldFormats`] before any field editing starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSpec {
    pub date: String,
    pub date_time: String,
    pub required_pattern: String,
    pub empty_sentinel: String,
}

impl Default for FormatSpec {
    fn default() -> Self {
        Self {
            date: DEFAULT_DATE_FORMAT.to_owned(),
            date_time: DEFAULT_DATE_TIME_FORMAT.to_owned(),
            required_pattern: DEFAULT_REQUIRED_PATTERN.to_owned(),
            empty_sentinel: DEFAULT_EMPTY_SENTINEL.to_owned(),
        }
    }
}

/// Compiled display formats shared by every field delegate: the calendar-date
/// and date-time layouts, the required-input pattern, and the sentinel text
/// written for an unset date.
#[derive(Debug, Clone)]
pub struct FieldFormats {
    date: OwnedFormatItem,
    date_time: OwnedFormatItem,
    required: Regex,
    empty_sentinel: String,
}

impl FieldFormats {
    pub fn from_spec(spec: &FormatSpec) -> Result<Self> {
        let date = format_description::parse_owned::<2>(&spec.date).with_context(|| {
            format!(
                "unreadable date format {:?} -- use component syntax such as {DEFAULT_DATE_FORMAT}",
                spec.date
            )
        })?;
        let date_time = format_description::parse_owned::<2>(&spec.date_time).with_context(|| {
            format!(
                "unreadable date-time format {:?} -- use component syntax such as {DEFAULT_DATE_TIME_FORMAT}",
                spec.date_time
            )
        })?;
        let required = Regex::new(&spec.required_pattern).with_context(|| {
            format!(
                "unreadable required-input pattern {:?} -- expected a regular expression",
                spec.required_pattern
            )
        })?;

        let formats = Self {
            date,
            date_time,
            required,
            empty_sentinel: spec.empty_sentinel.clone(),
        };
        formats.probe()?;
        Ok(formats)
    }

    /// Rejects format descriptions that parse but cannot render the value
    /// kind they are used for, so the format helpers below stay infallible.
    fn probe(&self) -> Result<()> {
        let date = Date::from_calendar_date(2000, Month::January, 1).expect("probe date is valid");
        date.format(&self.date)
            .with_context(|| "date format cannot render a calendar date".to_owned())?;
        PrimitiveDateTime::new(date, Time::MIDNIGHT)
            .format(&self.date_time)
            .with_context(|| "date-time format cannot render a timestamp".to_owned())?;
        Ok(())
    }

    pub fn parse_date(&self, text: &str) -> Option<Date> {
        Date::parse(text.trim(), &self.date).ok()
    }

    pub fn format_date(&self, date: Date) -> String {
        date.format(&self.date).expect("date format is valid")
    }

    pub fn parse_date_time(&self, text: &str) -> Option<PrimitiveDateTime> {
        PrimitiveDateTime::parse(text.trim(), &self.date_time).ok()
    }

    pub fn format_date_time(&self, stamp: PrimitiveDateTime) -> String {
        stamp
            .format(&self.date_time)
            .expect("date-time format is valid")
    }

    /// True for blank text and for the unset-date sentinel.
    pub fn is_unset(&self, text: &str) -> bool {
        let trimmed = text.trim();
        trimmed.is_empty() || trimmed == self.empty_sentinel
    }

    pub fn empty_sentinel(&self) -> &str {
        &self.empty_sentinel
    }

    pub fn has_required_input(&self, text: &str) -> bool {
        self.required.is_match(text)
    }

    pub fn today() -> Date {
        OffsetDateTime::now_utc().date()
    }

    pub fn now() -> PrimitiveDateTime {
        let now = OffsetDateTime::now_utc();
        PrimitiveDateTime::new(now.date(), now.time())
    }

    /// The current moment rendered in the date-time display format.
    pub fn now_stamp(&self) -> String {
        self.format_date_time(Self::now())
    }
}

impl Default for FieldFormats {
    fn default() -> Self {
        Self::from_spec(&FormatSpec::default()).expect("default formats are valid")
    }
}
