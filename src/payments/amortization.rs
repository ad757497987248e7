use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate, RoundingPolicy};
use crate::errors::{Result, ScheduleError};

/// one line of the repayment schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub payment_date: NaiveDate,
    pub payment_amount: Money,
    pub interest_amount: Money,
    pub principal_amount: Money,
    pub remaining_principal: Money,
    pub is_early_repayment: bool,
}

/// full repayment schedule returned by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// payment shown before the schedule is walked
    pub nominal_payment: Money,
    pub entries: Vec<ScheduleEntry>,
    pub total_interest: Money,
    pub total_principal: Money,
    pub total_payment: Money,
    pub early_repayment_total: Money,
    pub regular_payment_count: u32,
    pub maturity_date: Option<NaiveDate>,
}

impl Schedule {
    /// builds totals over the produced entries
    pub fn new(nominal_payment: Money, entries: Vec<ScheduleEntry>) -> Self {
        let total_interest: Money = entries.iter().map(|e| e.interest_amount).sum();
        let total_principal: Money = entries.iter().map(|e| e.principal_amount).sum();
        let total_payment: Money = entries.iter().map(|e| e.payment_amount).sum();
        let early_repayment_total: Money = entries
            .iter()
            .filter(|e| e.is_early_repayment)
            .map(|e| e.payment_amount)
            .sum();
        let regular_payment_count = entries.iter().filter(|e| !e.is_early_repayment).count() as u32;
        let maturity_date = entries.last().map(|e| e.payment_date);

        Self {
            nominal_payment,
            entries,
            total_interest,
            total_principal,
            total_payment,
            early_repayment_total,
            regular_payment_count,
            maturity_date,
        }
    }

    pub fn final_entry(&self) -> Option<&ScheduleEntry> {
        self.entries.last()
    }

    pub fn regular_entries(&self) -> impl Iterator<Item = &ScheduleEntry> {
        self.entries.iter().filter(|e| !e.is_early_repayment)
    }

    pub fn early_repayment_entries(&self) -> impl Iterator<Item = &ScheduleEntry> {
        self.entries.iter().filter(|e| e.is_early_repayment)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// level payment over `periods` months:
/// P * r / (1 - (1 + r)^-n), or P / n when r is zero
pub fn annuity_payment(
    principal: Money,
    annual_rate: Rate,
    periods: u32,
    rounding: &RoundingPolicy,
) -> Result<Money> {
    if periods == 0 {
        return Ok(principal);
    }

    let r = annual_rate.monthly_rate().as_decimal();
    let level = principal.as_decimal() / Decimal::from(periods);

    if r.is_zero() {
        return Ok(rounding.round_decimal(level));
    }

    let interest = principal
        .as_decimal()
        .checked_mul(r)
        .ok_or_else(|| ScheduleError::CalculationError {
            message: format!("monthly interest on {} at {} overflows", principal, annual_rate),
        })?;

    // a rate too small to move (1 + r)^-n away from one behaves like zero
    let denominator = Decimal::ONE - discount_factor(Decimal::ONE / (Decimal::ONE + r), periods);
    if denominator.is_zero() {
        return Ok(rounding.round_decimal(level));
    }

    Ok(rounding.round_decimal(interest / denominator))
}

/// `v^n` by repeated squaring. `v` is in (0, 1] so nothing grows
fn discount_factor(v: Decimal, mut n: u32) -> Decimal {
    let mut base = v;
    let mut acc = Decimal::ONE;
    while n > 0 {
        if n & 1 == 1 {
            acc *= base;
        }
        base *= base;
        n >>= 1;
    }
    acc
}

/// constant principal portion when repaying `principal` evenly over `periods`
pub fn level_principal(principal: Money, periods: u32, rounding: &RoundingPolicy) -> Money {
    if periods == 0 {
        return principal;
    }
    rounding.round_decimal(principal.as_decimal() / Decimal::from(periods))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn entry(day: u32, payment: Decimal, interest: Decimal, principal: Decimal, remaining: Decimal, early: bool) -> ScheduleEntry {
        ScheduleEntry {
            payment_date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            payment_amount: Money::from_decimal(payment),
            interest_amount: Money::from_decimal(interest),
            principal_amount: Money::from_decimal(principal),
            remaining_principal: Money::from_decimal(remaining),
            is_early_repayment: early,
        }
    }

    #[test]
    fn test_annuity_payment() {
        let rounding = RoundingPolicy::new(2);
        let payment = annuity_payment(Money::from_major(100_000), Rate::from_percentage(12), 12, &rounding).unwrap();
        assert_eq!(payment, Money::from_decimal(dec!(8884.88)));
    }

    #[test]
    fn test_annuity_payment_zero_rate() {
        let rounding = RoundingPolicy::new(2);
        let payment = annuity_payment(Money::from_major(12_000), Rate::ZERO, 12, &rounding).unwrap();
        assert_eq!(payment, Money::from_major(1_000));
    }

    #[test]
    fn test_annuity_single_period_repays_with_interest() {
        let rounding = RoundingPolicy::new(2);
        let payment = annuity_payment(Money::from_major(1_000), Rate::from_percentage(12), 1, &rounding).unwrap();
        assert_eq!(payment, Money::from_major(1_010));
    }

    #[test]
    fn test_annuity_payment_high_rate_long_term() {
        let rounding = RoundingPolicy::new(2);
        // (1 + r)^n alone would be ~5.9e26 here
        let payment =
            annuity_payment(Money::from_major(1_000_000), Rate::from_percentage(200), 400, &rounding).unwrap();
        assert_eq!(payment, Money::from_decimal(dec!(166666.67)));
    }

    #[test]
    fn test_annuity_payment_huge_term_is_fast() {
        let rounding = RoundingPolicy::new(2);
        let payment =
            annuity_payment(Money::from_major(120_000), Rate::from_percentage(12), u32::MAX, &rounding).unwrap();
        assert_eq!(payment, Money::from_major(1_200));
    }

    #[test]
    fn test_annuity_payment_overflowing_interest() {
        let rounding = RoundingPolicy::new(2);
        let result = annuity_payment(Money::from_decimal(Decimal::MAX), Rate::from_percentage(2_400), 12, &rounding);
        assert!(matches!(result, Err(ScheduleError::CalculationError { .. })));
    }

    #[test]
    fn test_level_principal() {
        let rounding = RoundingPolicy::new(2);
        assert_eq!(
            level_principal(Money::from_major(100_000), 3, &rounding),
            Money::from_decimal(dec!(33333.33))
        );
        assert_eq!(level_principal(Money::from_major(500), 0, &rounding), Money::from_major(500));
    }

    #[test]
    fn test_schedule_totals() {
        let schedule = Schedule::new(
            Money::from_major(510),
            vec![
                entry(10, dec!(200), dec!(5), dec!(195), dec!(805), true),
                entry(15, dec!(510), dec!(10), dec!(500), dec!(305), false),
                entry(31, dec!(308), dec!(3), dec!(305), dec!(0), false),
            ],
        );

        assert_eq!(schedule.total_interest, Money::from_major(18));
        assert_eq!(schedule.total_principal, Money::from_major(1_000));
        assert_eq!(schedule.total_payment, Money::from_major(1_018));
        assert_eq!(schedule.early_repayment_total, Money::from_major(200));
        assert_eq!(schedule.regular_payment_count, 2);
        assert_eq!(schedule.maturity_date, NaiveDate::from_ymd_opt(2024, 1, 31));
        assert_eq!(schedule.early_repayment_entries().count(), 1);
        assert_eq!(schedule.final_entry().unwrap().remaining_principal, Money::ZERO);
    }

    #[test]
    fn test_schedule_json() {
        let schedule = Schedule::new(
            Money::from_major(100),
            vec![entry(15, dec!(100), dec!(0), dec!(100), dec!(0), false)],
        );
        let json = schedule.to_json().unwrap();
        assert!(json.contains("\"payment_date\": \"2024-01-15\""));
        assert!(json.contains("\"is_early_repayment\": false"));
    }
}
