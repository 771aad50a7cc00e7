// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use std::path::PathBuf;
use time::{Date, Duration, Month};
use ward_grid::FieldFormats;

const FIRST_NAMES: [&str; 16] = [
    "Avery", "Jordan", "Taylor", "Riley", "Morgan", "Casey", "Alex", "Quinn", "Parker", "Drew",
    "Kai", "Elliot", "Robin", "Cameron", "Hayden", "Rowan",
];
const LAST_NAMES: [&str; 18] = [
    "Walker", "Martin", "Hill", "Evans", "Lopez", "Gray", "Ward", "Young", "Diaz", "Reed",
    "Campbell", "Turner", "Flores", "Bennett", "Price", "Morris", "Foster", "Brooks",
];

const STREET_NAMES: [&str; 18] = [
    "Cedar",
    "Maple",
    "Oak",
    "Pine",
    "Willow",
    "Elm",
    "Birch",
    "Juniper",
    "Sunset",
    "Ridge",
    "Valley",
    "Lakeview",
    "Northview",
    "Hillcrest",
    "Brookside",
    "Meadow",
    "Aspen",
    "Canyon",
];
const CITIES: [&str; 14] = [
    "Austin",
    "Seattle",
    "Denver",
    "Madison",
    "Raleigh",
    "Pittsburgh",
    "Portland",
    "Boise",
    "Phoenix",
    "Nashville",
    "Columbus",
    "Minneapolis",
    "Omaha",
    "Tucson",
];

const PHOTO_SUBJECTS: [&str; 8] = [
    "intake",
    "wound",
    "sutures",
    "dressing",
    "cast",
    "rash",
    "mobility",
    "discharge-check",
];

// 1x1 RGB image, crc-correct; small enough to inline into blob tests.
const PNG_1X1: [u8; 69] = [
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x02, 0x00, 0x00, 0x00, 0x90,
    0x77, 0x53, 0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49, 0x44, 0x41, 0x54, 0x78, 0xDA, 0x63, 0x68,
    0x68, 0x68, 0x00, 0x00, 0x03, 0x04, 0x01, 0x81, 0x75, 0x2E, 0x01, 0xBC, 0x00, 0x00, 0x00,
    0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

const REFERENCE_YEAR: i32 = 2026;

/// Patient row values ready for insertion, dates already in display format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientSeed {
    pub name: String,
    pub address: String,
    pub birth_date: String,
    pub admission_date: String,
    pub discharge_date: String,
}

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

#[derive(Debug, Clone)]
pub struct PatientFaker {
    rng: DeterministicRng,
}

impl PatientFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    pub fn patient(&mut self, formats: &FieldFormats) -> PatientSeed {
        let first = self.pick(&FIRST_NAMES);
        let last = self.pick(&LAST_NAMES);
        let street = self.pick(&STREET_NAMES);
        let city = self.pick(&CITIES);

        let today = reference_date();
        let admission = self.random_date_between(today - Duration::days(60), today);
        let discharge = admission + Duration::days(i64::from(self.int_range_i32(0, 30)));
        let birth = self.random_date_between(
            today - Duration::days(90 * 365),
            today - Duration::days(18 * 365),
        );
        // Birth dates are sometimes unknown at intake.
        let birth_date = if self.int_range_i32(1, 10) <= 2 {
            formats.empty_sentinel().to_owned()
        } else {
            formats.format_date(birth)
        };

        PatientSeed {
            name: format!("{first} {last}"),
            address: format!("{} {} St, {city}", self.int_range_i32(1, 240), street),
            birth_date,
            admission_date: formats.format_date(admission),
            discharge_date: formats.format_date(discharge),
        }
    }

    pub fn photo_file_name(&mut self) -> String {
        format!(
            "{}-{:02}.png",
            self.pick(&PHOTO_SUBJECTS),
            self.int_range_i32(1, 99),
        )
    }

    pub fn photo_stamp(&mut self, formats: &FieldFormats) -> String {
        let today = reference_date();
        let date = self.random_date_between(today - Duration::days(30), today);
        let time = time::Time::from_hms(
            self.int_range_i32(7, 19) as u8,
            self.int_range_i32(0, 59) as u8,
            0,
        )
        .expect("valid time of day");
        formats.format_date_time(date.with_time(time))
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn int_range_i32(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        let span = i64::from(max) - i64::from(min) + 1;
        let offset = (self.rng.next_u64() % (span as u64)) as i64;
        (i64::from(min) + offset) as i32
    }

    fn random_date_between(&mut self, start: Date, end: Date) -> Date {
        let start_day = start.to_julian_day();
        let end_day = end.to_julian_day();
        if end_day <= start_day {
            return start;
        }
        let span = (end_day - start_day) as u64;
        let offset = (self.rng.next_u64() % (span + 1)) as i32;
        Date::from_julian_day(start_day + offset).expect("valid julian day")
    }
}

pub fn png_payload() -> Vec<u8> {
    PNG_1X1.to_vec()
}

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("ward.db");
    Ok((dir, db_path))
}

pub fn fixture_date() -> &'static str {
    "19.02.2026"
}

pub fn fixture_stamp() -> &'static str {
    "19.02.2026 12:34"
}

fn reference_date() -> Date {
    Date::from_calendar_date(REFERENCE_YEAR, Month::January, 1).expect("valid calendar date")
}
