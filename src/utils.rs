use crate::error::{MapError, Result};
use chrono::{Days, NaiveDate};
use log::warn;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::ops::Range;
use std::str::FromStr;

/// Three-letter Spanish month abbreviations used as column suffixes, January first.
pub const MONTH_NAMES: [&str; 12] = [
    "ENE", "FEB", "MAR", "ABR", "MAY", "JUN", "JUL", "AGO", "SEP", "OCT", "NOV", "DIC",
];

/// Rounds half away from zero, the way spreadsheet tools do.
///
/// `2.675` rounds to `2.68` and `-2.675` to `-2.68`; banker's rounding would
/// give `2.67` for the first one.
pub fn round_like_excel(value: Decimal, decimals: u32) -> Decimal {
    value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero)
}

/// Monetary rounding applied at every derivation step.
pub fn round_money(value: Decimal) -> Decimal {
    round_like_excel(value, 2)
}

/// Adds `values`, giving 0 when the running total leaves the `Decimal` range.
pub fn checked_total<I>(values: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    let mut total = Decimal::ZERO;
    for value in values {
        match total.checked_add(value) {
            Some(next) => total = next,
            None => {
                warn!("Amount total is out of range; reporting 0");
                return Decimal::ZERO;
            }
        }
    }
    total
}

/// `minuend - subtrahend`, or 0 when the result is out of range.
pub fn checked_difference(minuend: Decimal, subtrahend: Decimal) -> Decimal {
    minuend.checked_sub(subtrahend).unwrap_or_else(|| {
        warn!(
            "Difference {} - {} is out of range; reporting 0",
            minuend, subtrahend
        );
        Decimal::ZERO
    })
}

/// Sums already-rounded amounts and rounds the result again.
pub fn sum_money<I>(values: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    round_money(checked_total(values))
}

/// Month indices (0-based) from January through `month` inclusive.
pub fn months_up_to(month: u32) -> Range<usize> {
    0..(month.min(12) as usize)
}

/// All twelve month indices.
pub fn all_months() -> Range<usize> {
    0..MONTH_NAMES.len()
}

/// A January/February file that refers to an earlier fiscal year is the
/// closing report for that year.
pub fn is_prior_year_closure(month: u32, fiscal_year: i32, reference_year: i32) -> bool {
    matches!(month, 1 | 2) && fiscal_year < reference_year
}

pub fn validate_month(month: u32) -> Result<()> {
    if !(1..=12).contains(&month) {
        return Err(MapError::InvalidMonth(month));
    }
    Ok(())
}

pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let next_month = if month == 12 { 1 } else { month + 1 };
    let next_year = if month == 12 { year + 1 } else { year };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.checked_sub_days(Days::new(1))
}

/// Parses a spreadsheet cell into a decimal.
///
/// Accepts plain and scientific notation and strips thousands separators.
/// Blank or unparseable cells yield `None`.
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }

    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()
}

/// Coerces a cell to an integer code, truncating decimals. Anything
/// non-numeric becomes 0.
pub fn coerce_integer(raw: &str) -> i64 {
    parse_decimal(raw)
        .and_then(|value| value.trunc().to_i64())
        .unwrap_or(0)
}

/// `numerator / denominator` when the denominator is positive, otherwise 0.
pub fn ratio_or_zero(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator > Decimal::ZERO {
        numerator.checked_div(denominator).unwrap_or(Decimal::ZERO)
    } else {
        Decimal::ZERO
    }
}

/// Left-pads `value` with zeros to `width` characters.
pub fn zero_pad(value: &str, width: usize) -> String {
    format!("{:0>width$}", value, width = width)
}
