use chrono::{Datelike, Duration, Months, NaiveDate, Weekday};

use crate::errors::{Result, ScheduleError};
use crate::interest::day_count::days_in_month;

/// produces successive monthly payment dates anchored to a day of month
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentDateSequencer {
    payment_day: u32,
    move_holiday_to_next_day: bool,
}

impl PaymentDateSequencer {
    pub fn new(payment_day: u32, move_holiday_to_next_day: bool) -> Self {
        Self {
            payment_day,
            move_holiday_to_next_day,
        }
    }

    /// next payment date after `date`, weekend shift applied
    pub fn next_date(&self, date: NaiveDate) -> Result<NaiveDate> {
        self.next_nominal(date).map(|nominal| self.adjust(nominal))
    }

    /// next payment date after `date` before any weekend shift.
    /// a payment day past the end of the target month lands on its last day
    pub fn next_nominal(&self, date: NaiveDate) -> Result<NaiveDate> {
        let target = date
            .with_day(1)
            .and_then(|first| first.checked_add_months(Months::new(1)))
            .ok_or_else(|| out_of_range(date))?;

        let day = self
            .payment_day
            .clamp(1, days_in_month(target.year(), target.month()));

        target.with_day(day).ok_or_else(|| out_of_range(date))
    }

    /// moves saturdays and sundays to the following monday when enabled
    pub fn adjust(&self, date: NaiveDate) -> NaiveDate {
        if !self.move_holiday_to_next_day {
            return date;
        }
        shift_weekend(date)
    }
}

/// free-standing form of [`PaymentDateSequencer::next_date`]
pub fn next_payment_date(
    date: NaiveDate,
    payment_day: u32,
    move_holiday_to_next_day: bool,
) -> Result<NaiveDate> {
    PaymentDateSequencer::new(payment_day, move_holiday_to_next_day).next_date(date)
}

/// following monday for weekend dates, otherwise the date itself
pub fn shift_weekend(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date + Duration::days(2),
        Weekday::Sun => date + Duration::days(1),
        _ => date,
    }
}

fn out_of_range(date: NaiveDate) -> ScheduleError {
    ScheduleError::InvalidDate {
        message: format!("no payment date can follow {}", date),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_next_date_keeps_day() {
        let seq = PaymentDateSequencer::new(15, false);
        assert_eq!(seq.next_date(date(2024, 1, 15)).unwrap(), date(2024, 2, 15));
        assert_eq!(seq.next_date(date(2024, 12, 15)).unwrap(), date(2025, 1, 15));
    }

    #[test]
    fn test_next_date_aligns_payment_day() {
        // issued on the 3rd, paying on the 20th
        let seq = PaymentDateSequencer::new(20, false);
        assert_eq!(seq.next_date(date(2024, 3, 3)).unwrap(), date(2024, 4, 20));

        // issued after the payment day
        let seq = PaymentDateSequencer::new(5, false);
        assert_eq!(seq.next_date(date(2024, 3, 28)).unwrap(), date(2024, 4, 5));
    }

    #[test]
    fn test_next_date_clamps_short_months() {
        let seq = PaymentDateSequencer::new(31, false);
        assert_eq!(seq.next_date(date(2024, 1, 31)).unwrap(), date(2024, 2, 29));
        assert_eq!(seq.next_date(date(2024, 2, 29)).unwrap(), date(2024, 3, 31));
        assert_eq!(seq.next_date(date(2024, 3, 31)).unwrap(), date(2024, 4, 30));
        assert_eq!(seq.next_date(date(2023, 1, 31)).unwrap(), date(2023, 2, 28));
    }

    #[test]
    fn test_weekend_shift() {
        let seq = PaymentDateSequencer::new(15, true);

        // 2024-06-15 is a saturday
        assert_eq!(seq.next_date(date(2024, 5, 15)).unwrap(), date(2024, 6, 17));
        // 2024-09-15 is a sunday
        assert_eq!(seq.next_date(date(2024, 8, 15)).unwrap(), date(2024, 9, 16));
        // 2024-07-15 is a monday
        assert_eq!(seq.next_date(date(2024, 6, 15)).unwrap(), date(2024, 7, 15));

        let no_shift = PaymentDateSequencer::new(15, false);
        assert_eq!(no_shift.next_date(date(2024, 5, 15)).unwrap(), date(2024, 6, 15));
    }

    #[test]
    fn test_input_is_not_mutated() {
        let seq = PaymentDateSequencer::new(10, true);
        let start = date(2024, 1, 25);

        let first = seq.next_date(start).unwrap();
        let again = seq.next_date(start).unwrap();

        assert_eq!(first, again);
        assert_eq!(start, date(2024, 1, 25));
    }

    #[test]
    fn test_free_function_matches_sequencer() {
        assert_eq!(
            next_payment_date(date(2024, 5, 15), 15, true).unwrap(),
            date(2024, 6, 17)
        );
    }

    #[test]
    fn test_shift_weekend() {
        assert_eq!(shift_weekend(date(2024, 6, 15)), date(2024, 6, 17));
        assert_eq!(shift_weekend(date(2024, 6, 16)), date(2024, 6, 17));
        assert_eq!(shift_weekend(date(2024, 6, 14)), date(2024, 6, 14));
    }
}
