pub mod day_count;

use crate::decimal::Money;

pub use day_count::{DayBasis, DayCountBasis, DayCountCalculator};

/// interest calculation result
#[derive(Debug, Clone, PartialEq)]
pub struct InterestCalculation {
    pub interest_amount: Money,
    pub days: u32,
    pub days_in_year: u32,
}
