//! Due-date generation for installment and recurring financial entries.
//!
//! Everything here is a pure function of its arguments. Month and year steps
//! clamp to the last day of the target month (Jan 31 + 1 month = Feb 28/29),
//! and every occurrence is computed from the anchor date rather than from the
//! previous occurrence, so one short month never shifts the rest of a series.

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;

/// Average number of weeks per month, in hundredths (4.33).
const WEEKS_PER_MONTH_CENTI: u64 = 433;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecurrenceError {
    #[error("installment count must be greater than zero")]
    InvalidCount,
    #[error("recurrence duration must be at least one month")]
    InvalidDuration,
    #[error("unknown cadence: {0}")]
    InvalidCadence(String),
    #[error("date out of range: {base} + {step} {cadence} steps")]
    OutOfRange {
        base: NaiveDate,
        cadence: Cadence,
        step: u32,
    },
}

/// Spacing between consecutive occurrences.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Cadence {
    Weekly,
    /// Every 14 days, not twice a month.
    Biweekly,
    Monthly,
    Yearly,
}

impl Cadence {
    /// Parse a cadence literal as sent by forms and API clients.
    pub fn parse(literal: &str) -> Result<Self, RecurrenceError> {
        literal
            .trim()
            .to_ascii_lowercase()
            .parse()
            .map_err(|_| RecurrenceError::InvalidCadence(literal.to_string()))
    }

    /// How many occurrences cover `duration_months`.
    ///
    /// Weekly uses 4.33 weeks per month, which is an approximation; every
    /// conversion rounds up so the series never ends short of the duration.
    pub fn occurrences_for_duration(self, duration_months: u32) -> u32 {
        let months = u64::from(duration_months);
        let occurrences = match self {
            Self::Weekly => (months * WEEKS_PER_MONTH_CENTI).div_ceil(100),
            Self::Biweekly => months * 2,
            Self::Monthly => months,
            Self::Yearly => months.div_ceil(12),
        };
        u32::try_from(occurrences).unwrap_or(u32::MAX)
    }
}

/// How long a series runs: a fixed number of installments or a span of months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum RecurrenceMode {
    Installments { count: u32 },
    Duration { months: u32 },
}

/// Input for one date-generation call. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceSpec {
    pub start_date: NaiveDate,
    pub cadence: Cadence,
    #[serde(flatten)]
    pub mode: RecurrenceMode,
}

impl RecurrenceSpec {
    pub fn installments(start_date: NaiveDate, cadence: Cadence, count: u32) -> Self {
        Self {
            start_date,
            cadence,
            mode: RecurrenceMode::Installments { count },
        }
    }

    pub fn duration(start_date: NaiveDate, cadence: Cadence, months: u32) -> Self {
        Self {
            start_date,
            cadence,
            mode: RecurrenceMode::Duration { months },
        }
    }

    pub fn generate(&self) -> Result<Vec<NaiveDate>, RecurrenceError> {
        match self.mode {
            RecurrenceMode::Installments { count } => {
                generate_installment_dates(self.start_date, self.cadence, count)
            }
            RecurrenceMode::Duration { months } => {
                generate_recurrence_dates(self.start_date, self.cadence, months)
            }
        }
    }
}

/// One installment of a split financial entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledEntry {
    /// 1-based position in the series.
    pub number: u32,
    pub total: u32,
    pub due_date: NaiveDate,
    pub amount_cents: i64,
}

/// The date `step_index` cadence periods after `base`.
pub fn next_date(
    base: NaiveDate,
    cadence: Cadence,
    step_index: u32,
) -> Result<NaiveDate, RecurrenceError> {
    let out_of_range = || RecurrenceError::OutOfRange {
        base,
        cadence,
        step: step_index,
    };
    let step = u64::from(step_index);

    match cadence {
        Cadence::Weekly => base.checked_add_days(Days::new(7 * step)),
        Cadence::Biweekly => base.checked_add_days(Days::new(14 * step)),
        Cadence::Monthly => base.checked_add_months(Months::new(step_index)),
        Cadence::Yearly => step_index
            .checked_mul(12)
            .and_then(|months| base.checked_add_months(Months::new(months))),
    }
    .ok_or_else(out_of_range)
}

/// `count` due dates starting at `base`.
pub fn generate_installment_dates(
    base: NaiveDate,
    cadence: Cadence,
    count: u32,
) -> Result<Vec<NaiveDate>, RecurrenceError> {
    if count == 0 {
        return Err(RecurrenceError::InvalidCount);
    }
    dates_for_steps(base, cadence, count)
}

/// Due dates covering `duration_months`, see [`Cadence::occurrences_for_duration`].
pub fn generate_recurrence_dates(
    base: NaiveDate,
    cadence: Cadence,
    duration_months: u32,
) -> Result<Vec<NaiveDate>, RecurrenceError> {
    if duration_months == 0 {
        return Err(RecurrenceError::InvalidDuration);
    }
    dates_for_steps(base, cadence, cadence.occurrences_for_duration(duration_months))
}

/// Split `total_cents` across `count` installments.
///
/// Cents that do not divide evenly go to the first installment, so the
/// amounts always sum to the total.
pub fn installment_schedule(
    base: NaiveDate,
    cadence: Cadence,
    count: u32,
    total_cents: i64,
) -> Result<Vec<ScheduledEntry>, RecurrenceError> {
    let dates = generate_installment_dates(base, cadence, count)?;
    let share = total_cents / i64::from(count);
    let remainder = total_cents % i64::from(count);

    Ok(dates
        .into_iter()
        .zip(1..)
        .map(|(due_date, number)| ScheduledEntry {
            number,
            total: count,
            due_date,
            amount_cents: if number == 1 { share + remainder } else { share },
        })
        .collect())
}

fn dates_for_steps(
    base: NaiveDate,
    cadence: Cadence,
    steps: u32,
) -> Result<Vec<NaiveDate>, RecurrenceError> {
    (0..steps).map(|step| next_date(base, cadence, step)).collect()
}
