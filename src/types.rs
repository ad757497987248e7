use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// amortization regime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanType {
    /// level payment, interest share shrinks over time
    Annuity,
    /// level principal, total payment shrinks over time
    Differentiated,
}

/// how often an early repayment recurs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Periodicity {
    Once,
    Monthly,
    Quarterly,
    Yearly,
}

impl Periodicity {
    pub const ALL: [Periodicity; 4] = [
        Periodicity::Once,
        Periodicity::Monthly,
        Periodicity::Quarterly,
        Periodicity::Yearly,
    ];

    /// months between two applications, none for one-off rules
    pub fn months(&self) -> Option<u32> {
        match self {
            Periodicity::Once => None,
            Periodicity::Monthly => Some(1),
            Periodicity::Quarterly => Some(3),
            Periodicity::Yearly => Some(12),
        }
    }

    /// due date of the `n`th application counted from `start` (0 is `start`),
    /// or none when the rule does not recur.
    /// stepping from the start keeps month-end dates from drifting
    pub fn nth_due(&self, start: NaiveDate, n: u32) -> Option<NaiveDate> {
        self.months()
            .and_then(|months| months.checked_mul(n))
            .and_then(|total| start.checked_add_months(Months::new(total)))
    }
}

/// how an early repayment is absorbed by the remaining schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RepaymentType {
    /// keep the payment, finish earlier
    DecreaseTerm,
    /// keep the term, lower future payments
    DecreasePayment,
}
