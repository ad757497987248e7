use chrono::NaiveDate;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{Result, ScheduleError};
use crate::types::{Periodicity, RepaymentType};

/// an early repayment as requested by the borrower
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarlyRepaymentRule {
    pub start_date: NaiveDate,
    /// inclusive
    pub end_date: Option<NaiveDate>,
    pub periodicity: Periodicity,
    pub amount: Money,
    pub repayment_type: RepaymentType,
}

impl EarlyRepaymentRule {
    /// one-off repayment on `date`
    pub fn once(date: NaiveDate, amount: Money, repayment_type: RepaymentType) -> Self {
        Self {
            start_date: date,
            end_date: None,
            periodicity: Periodicity::Once,
            amount,
            repayment_type,
        }
    }

    /// repeating repayment starting on `start`, open ended until [`Self::until`] is used
    pub fn recurring(
        start: NaiveDate,
        periodicity: Periodicity,
        amount: Money,
        repayment_type: RepaymentType,
    ) -> Self {
        Self {
            start_date: start,
            end_date: None,
            periodicity,
            amount,
            repayment_type,
        }
    }

    pub fn until(mut self, end: NaiveDate) -> Self {
        self.end_date = Some(end);
        self
    }

    /// `index` is the rule's position in the request, used in error messages
    pub fn validate(&self, index: usize) -> Result<()> {
        if !self.amount.is_positive() {
            return Err(ScheduleError::InvalidEarlyRepayment {
                index,
                message: format!("amount must be positive, got {}", self.amount),
            });
        }

        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(ScheduleError::InvalidEarlyRepayment {
                    index,
                    message: format!("end date {} precedes start date {}", end, self.start_date),
                });
            }
        }

        Ok(())
    }
}

/// a rule selected for application inside a payment window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueRepayment {
    pub id: usize,
    pub due_date: NaiveDate,
    pub amount: Money,
    pub periodicity: Periodicity,
    pub repayment_type: RepaymentType,
}

#[derive(Debug, Clone)]
struct PendingRepayment {
    id: usize,
    rule: EarlyRepaymentRule,
    applications: u32,
    next_due: NaiveDate,
    active: bool,
}

impl PendingRepayment {
    fn within_bound(&self, date: NaiveDate) -> bool {
        self.rule.end_date.map_or(true, |end| date <= end)
    }

    /// moves to the following due date, deactivating one-off or exhausted rules
    fn advance(&mut self) {
        self.applications += 1;
        match self
            .rule
            .periodicity
            .nth_due(self.rule.start_date, self.applications)
        {
            Some(next) if self.within_bound(next) => self.next_due = next,
            _ => self.active = false,
        }
    }

    fn as_due(&self) -> DueRepayment {
        DueRepayment {
            id: self.id,
            due_date: self.next_due,
            amount: self.rule.amount,
            periodicity: self.rule.periodicity,
            repayment_type: self.rule.repayment_type,
        }
    }
}

/// ordered set of early repayments still waiting to be applied.
/// ids are registration positions and never change
#[derive(Debug, Clone, Default)]
pub struct EarlyRepaymentRegistry {
    pending: Vec<PendingRepayment>,
}

impl EarlyRepaymentRegistry {
    pub fn new(rules: &[EarlyRepaymentRule]) -> Self {
        let pending = rules
            .iter()
            .enumerate()
            .map(|(id, rule)| PendingRepayment {
                id,
                rule: rule.clone(),
                applications: 0,
                next_due: rule.start_date,
                active: true,
            })
            .collect();

        Self { pending }
    }

    /// number of rules still pending
    pub fn len(&self) -> usize {
        self.pending.iter().filter(|p| p.active).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: usize) -> bool {
        self.pending.iter().any(|p| p.id == id && p.active)
    }

    /// next due date of a pending rule
    pub fn next_due(&self, id: usize) -> Option<NaiveDate> {
        self.pending
            .iter()
            .find(|p| p.id == id && p.active)
            .map(|p| p.next_due)
    }

    /// rolls rules due on or before `current` forward past it.
    /// one-off rules that can no longer fire are dropped
    pub fn skip_stale(&mut self, current: NaiveDate) {
        for pending in self.pending.iter_mut().filter(|p| p.active) {
            if pending.next_due > current {
                continue;
            }

            warn!(
                "early repayment #{} due {} falls before window start {}, skipping",
                pending.id, pending.next_due, current
            );

            while pending.active && pending.next_due <= current {
                pending.advance();
            }
        }
        self.compact();
    }

    /// rules to apply inside (current, next], at most one per periodicity,
    /// ordered by due date
    pub fn due_within(&self, current: NaiveDate, next: NaiveDate) -> Vec<DueRepayment> {
        let mut due: Vec<DueRepayment> = Periodicity::ALL
            .iter()
            .filter_map(|periodicity| {
                self.pending
                    .iter()
                    .filter(|p| p.active && p.rule.periodicity == *periodicity)
                    .min_by(|a, b| a.next_due.cmp(&b.next_due).then(a.id.cmp(&b.id)))
            })
            .filter(|p| p.next_due > current && p.next_due <= next)
            .filter(|p| p.within_bound(p.next_due))
            .map(PendingRepayment::as_due)
            .collect();

        due.sort_by(|a, b| a.due_date.cmp(&b.due_date).then(a.id.cmp(&b.id)));
        due
    }

    /// records one application of rule `id`
    pub fn mark_applied(&mut self, id: usize) {
        if let Some(pending) = self.pending.iter_mut().find(|p| p.id == id && p.active) {
            pending.advance();
        }
    }

    /// drops deactivated rules, keeping registration order
    pub fn compact(&mut self) {
        self.pending.retain(|p| p.active);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_rule_validation() {
        let ok = EarlyRepaymentRule::once(date(2024, 3, 1), Money::from_major(100), RepaymentType::DecreaseTerm);
        assert!(ok.validate(0).is_ok());

        let zero = EarlyRepaymentRule::once(date(2024, 3, 1), Money::ZERO, RepaymentType::DecreaseTerm);
        assert!(matches!(
            zero.validate(2),
            Err(ScheduleError::InvalidEarlyRepayment { index: 2, .. })
        ));

        let backwards = EarlyRepaymentRule::recurring(
            date(2024, 3, 1),
            Periodicity::Monthly,
            Money::from_major(100),
            RepaymentType::DecreasePayment,
        )
        .until(date(2024, 2, 1));
        assert!(backwards.validate(0).is_err());
    }

    #[test]
    fn test_due_within_window_bounds() {
        let registry = EarlyRepaymentRegistry::new(&[EarlyRepaymentRule::once(
            date(2024, 2, 15),
            Money::from_major(500),
            RepaymentType::DecreaseTerm,
        )]);

        // due date equal to the window end is included
        assert_eq!(registry.due_within(date(2024, 1, 15), date(2024, 2, 15)).len(), 1);
        // due date equal to the window start is excluded
        assert!(registry.due_within(date(2024, 2, 15), date(2024, 3, 15)).is_empty());
        // not yet due
        assert!(registry.due_within(date(2023, 12, 15), date(2024, 1, 15)).is_empty());
    }

    #[test]
    fn test_one_candidate_per_periodicity() {
        let registry = EarlyRepaymentRegistry::new(&[
            EarlyRepaymentRule::once(date(2024, 1, 25), Money::from_major(300), RepaymentType::DecreaseTerm),
            EarlyRepaymentRule::once(date(2024, 1, 20), Money::from_major(200), RepaymentType::DecreaseTerm),
            EarlyRepaymentRule::recurring(
                date(2024, 1, 18),
                Periodicity::Monthly,
                Money::from_major(100),
                RepaymentType::DecreasePayment,
            ),
        ]);

        let due = registry.due_within(date(2024, 1, 15), date(2024, 2, 15));

        assert_eq!(due.len(), 2);
        assert_eq!(due[0].id, 2);
        assert_eq!(due[0].due_date, date(2024, 1, 18));
        assert_eq!(due[1].id, 1);
        assert_eq!(due[1].due_date, date(2024, 1, 20));
    }

    #[test]
    fn test_ties_follow_registration_order() {
        let registry = EarlyRepaymentRegistry::new(&[
            EarlyRepaymentRule::once(date(2024, 1, 20), Money::from_major(300), RepaymentType::DecreaseTerm),
            EarlyRepaymentRule::once(date(2024, 1, 20), Money::from_major(200), RepaymentType::DecreaseTerm),
        ]);

        let due = registry.due_within(date(2024, 1, 15), date(2024, 2, 15));
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, 0);
        assert_eq!(due[0].amount, Money::from_major(300));
    }

    #[test]
    fn test_once_rule_removed_after_application() {
        let mut registry = EarlyRepaymentRegistry::new(&[EarlyRepaymentRule::once(
            date(2024, 2, 1),
            Money::from_major(500),
            RepaymentType::DecreaseTerm,
        )]);

        registry.mark_applied(0);
        registry.compact();

        assert!(registry.is_empty());
        assert!(!registry.contains(0));
    }

    #[test]
    fn test_recurring_rule_advances_until_end_bound() {
        let mut registry = EarlyRepaymentRegistry::new(&[EarlyRepaymentRule::recurring(
            date(2024, 1, 31),
            Periodicity::Quarterly,
            Money::from_major(1_000),
            RepaymentType::DecreasePayment,
        )
        .until(date(2024, 7, 31))]);

        registry.mark_applied(0);
        assert_eq!(registry.next_due(0), Some(date(2024, 4, 30)));

        registry.mark_applied(0);
        assert_eq!(registry.next_due(0), Some(date(2024, 7, 31)));

        // the next quarter falls after the inclusive end bound
        registry.mark_applied(0);
        registry.compact();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_skip_stale_rolls_recurring_rules_forward() {
        let mut registry = EarlyRepaymentRegistry::new(&[
            EarlyRepaymentRule::recurring(
                date(2023, 11, 10),
                Periodicity::Monthly,
                Money::from_major(100),
                RepaymentType::DecreaseTerm,
            ),
            EarlyRepaymentRule::once(date(2023, 12, 1), Money::from_major(100), RepaymentType::DecreaseTerm),
        ]);

        registry.skip_stale(date(2024, 1, 15));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.next_due(0), Some(date(2024, 2, 10)));
        assert!(!registry.contains(1));
    }
}
