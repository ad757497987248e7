pub mod calendar;
pub mod config;
pub mod decimal;
pub mod engine;
pub mod errors;
pub mod interest;
pub mod payments;
pub mod types;

// re-export key types
pub use calendar::{next_payment_date, shift_weekend, PaymentDateSequencer};
pub use config::{EarlyRepaymentRequest, LoanParameters, LoanParametersBuilder, LoanRequest, ScheduleProfile};
pub use decimal::{Money, Rate, RoundingPolicy};
pub use engine::{build_schedule, ScheduleEngine};
pub use errors::{Result, ScheduleError};
pub use interest::{DayBasis, DayCountBasis, DayCountCalculator, InterestCalculation};
pub use payments::{
    annuity_payment, level_principal, DueRepayment, EarlyRepaymentRegistry, EarlyRepaymentRule,
    Schedule, ScheduleEntry,
};
pub use types::{LoanType, Periodicity, RepaymentType};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
