use crate::error::{MapError, Result};
use crate::utils::{last_day_of_month, validate_month, MONTH_NAMES};
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Reporting period of a MAP file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePeriod {
    /// Last calendar day of the reporting month.
    pub file_date: NaiveDate,
    /// Reporting month, 1 through 12.
    pub month: u32,
    pub fiscal_year: i32,
}

impl FilePeriod {
    pub fn new(month: u32, fiscal_year: i32) -> Result<Self> {
        validate_month(month)?;
        let file_date =
            last_day_of_month(fiscal_year, month).ok_or(MapError::InvalidMonth(month))?;
        Ok(Self {
            file_date,
            month,
            fiscal_year,
        })
    }
}

/// Works out which month and year a MAP file reports on.
pub trait PeriodDetector {
    fn detect(&self, filename: &str) -> Result<FilePeriod>;
}

/// Reads the period from the file name, e.g. `MAP_MARZO_2025.xlsx`,
/// `map-dic-2024.csv` or `MAP_202506.csv`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilenamePeriodDetector;

/// Spanish month names and their usual abbreviations, standing alone or
/// next to digits.
const MONTH_WORD_PATTERN: &str = r"(?i)(?:^|[^a-zA-Z])(ene(?:ro)?|feb(?:rero)?|mar(?:zo)?|abr(?:il)?|may(?:o)?|jun(?:io)?|jul(?:io)?|ago(?:sto)?|sep(?:t(?:iembre)?)?|set(?:iembre)?|oct(?:ubre)?|nov(?:iembre)?|dic(?:iembre)?)(?:[^a-zA-Z]|$)";

/// A four-digit year not embedded in a longer number.
const YEAR_PATTERN: &str = r"(?:^|\D)(20\d{2})(?:\D|$)";

/// `YYYYMM`, `YYYY-MM` or `YYYY_MM`.
const YEAR_MONTH_PATTERN: &str = r"(?:^|\D)(20\d{2})[-_]?(\d{2})(?:\D|$)";

fn month_number(word: &str) -> Option<u32> {
    let prefix = word.get(..3)?.to_ascii_uppercase();
    let prefix = if prefix == "SET" { "SEP" } else { prefix.as_str() };
    MONTH_NAMES
        .iter()
        .position(|name| *name == prefix)
        .and_then(|idx| u32::try_from(idx + 1).ok())
}

fn month_and_year_from_words(stem: &str) -> Option<(u32, i32)> {
    let month_re = Regex::new(MONTH_WORD_PATTERN).ok()?;
    let year_re = Regex::new(YEAR_PATTERN).ok()?;

    let month = month_number(&month_re.captures(stem)?[1])?;
    let year = year_re.captures(stem)?[1].parse::<i32>().ok()?;
    Some((month, year))
}

fn month_and_year_from_digits(stem: &str) -> Option<(u32, i32)> {
    let re = Regex::new(YEAR_MONTH_PATTERN).ok()?;
    let caps = re.captures(stem)?;
    let year = caps[1].parse::<i32>().ok()?;
    let month = caps[2].parse::<u32>().ok().filter(|m| (1..=12).contains(m))?;
    Some((month, year))
}

impl PeriodDetector for FilenamePeriodDetector {
    fn detect(&self, filename: &str) -> Result<FilePeriod> {
        let stem = Path::new(filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(filename);

        match month_and_year_from_words(stem).or_else(|| month_and_year_from_digits(stem)) {
            Some((month, year)) => FilePeriod::new(month, year),
            None => Err(MapError::PeriodNotDetected(filename.to_string())),
        }
    }
}
