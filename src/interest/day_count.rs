use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate, RoundingPolicy};
use crate::errors::{Result, ScheduleError};
use crate::interest::InterestCalculation;

/// day count basis for interest accrual
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayCountBasis {
    /// calendar days / 365, february always counted as 28 days
    #[serde(rename = "ACTUAL_365")]
    Actual365,
    /// 30 days per month / 360 days per year
    #[serde(rename = "ACTUAL_360")]
    Actual360,
    /// calendar days / 365 or 366 depending on the year
    #[serde(rename = "ACTUAL_ACTUAL")]
    ActualActual,
}

impl Default for DayCountBasis {
    fn default() -> Self {
        DayCountBasis::Actual365
    }
}

/// year and month lengths for a reference date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayBasis {
    pub days_in_year: u32,
    pub days_in_month: u32,
}

/// converts date spans into accrued interest under a day count basis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCountCalculator {
    pub basis: DayCountBasis,
}

impl DayCountCalculator {
    pub fn new(basis: DayCountBasis) -> Self {
        Self { basis }
    }

    /// year and month lengths for the month containing `reference`
    pub fn basis_for(&self, reference: NaiveDate) -> DayBasis {
        match self.basis {
            DayCountBasis::Actual360 => DayBasis {
                days_in_year: 360,
                days_in_month: 30,
            },
            DayCountBasis::Actual365 => {
                let days_in_month = if reference.month() == 2 {
                    28
                } else {
                    days_in_month(reference.year(), reference.month())
                };
                DayBasis {
                    days_in_year: 365,
                    days_in_month,
                }
            }
            DayCountBasis::ActualActual => DayBasis {
                days_in_year: if is_leap_year(reference.year()) { 366 } else { 365 },
                days_in_month: days_in_month(reference.year(), reference.month()),
            },
        }
    }

    /// days elapsed between two anchors, zero when `end` is not after `start`
    pub fn elapsed_days(&self, start: NaiveDate, end: NaiveDate) -> u32 {
        if end <= start {
            return 0;
        }

        match self.basis {
            DayCountBasis::Actual360 => days_30_360(start, end),
            DayCountBasis::Actual365 => {
                let actual = (end - start).num_days() as u32;
                actual - leap_days_between(start, end)
            }
            DayCountBasis::ActualActual => (end - start).num_days() as u32,
        }
    }

    /// days in (from, to] measured from the period start `anchor`.
    /// slices of one period taken this way add up to the whole period,
    /// which plain 30/360 counting does not guarantee around month ends
    pub fn elapsed_days_within(&self, anchor: NaiveDate, from: NaiveDate, to: NaiveDate) -> u32 {
        self.elapsed_days(anchor, to)
            .saturating_sub(self.elapsed_days(anchor, from))
    }

    /// simple interest on `principal` from `start` to `end`, rounded
    pub fn accrue(
        &self,
        principal: Money,
        annual_rate: Rate,
        start: NaiveDate,
        end: NaiveDate,
        rounding: &RoundingPolicy,
    ) -> Result<InterestCalculation> {
        self.interest_for_days(principal, annual_rate, self.elapsed_days(start, end), end, rounding)
    }

    /// simple interest for `days`, year length taken from `reference`
    pub fn interest_for_days(
        &self,
        principal: Money,
        annual_rate: Rate,
        days: u32,
        reference: NaiveDate,
        rounding: &RoundingPolicy,
    ) -> Result<InterestCalculation> {
        let basis = self.basis_for(reference);
        let year_fraction = annual_rate.as_decimal() * Decimal::from(days) / Decimal::from(basis.days_in_year);

        let interest = principal
            .as_decimal()
            .checked_mul(year_fraction)
            .ok_or_else(|| ScheduleError::CalculationError {
                message: format!("interest on {} at {} for {} days overflows", principal, annual_rate, days),
            })?;

        Ok(InterestCalculation {
            interest_amount: rounding.round_decimal(interest),
            days,
            days_in_year: basis.days_in_year,
        })
    }
}

/// 30/360 day count. a payment day clamped to the end of february keeps
/// counting as the original day so that a regular period is always 30 days
fn days_30_360(start: NaiveDate, end: NaiveDate) -> u32 {
    let y1 = start.year();
    let y2 = end.year();
    let m1 = start.month() as i32;
    let m2 = end.month() as i32;

    let mut d1 = start.day().min(30) as i32;
    if is_end_of_february(start) && end.day() > start.day() {
        d1 = end.day().min(30) as i32;
    }

    let mut d2 = if d1 == 30 { end.day().min(30) as i32 } else { end.day() as i32 };
    if is_end_of_february(end) && start.day() > end.day() {
        d2 = d1;
    }

    let days = 360 * (y2 - y1) + 30 * (m2 - m1) + (d2 - d1);
    days.max(0) as u32
}

/// february 29ths in (start, end]
fn leap_days_between(start: NaiveDate, end: NaiveDate) -> u32 {
    (start.year()..=end.year())
        .filter(|year| is_leap_year(*year))
        .filter_map(|year| NaiveDate::from_ymd_opt(year, 2, 29))
        .filter(|leap_day| *leap_day > start && *leap_day <= end)
        .count() as u32
}

fn is_end_of_february(date: NaiveDate) -> bool {
    date.month() == 2 && date.day() == days_in_month(date.year(), 2)
}

pub(crate) fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 30,
    }
}

/// check if year is a leap year
pub(crate) fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}
