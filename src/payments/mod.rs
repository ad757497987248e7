pub mod amortization;
pub mod early_repayment;

pub use amortization::{annuity_payment, level_principal, Schedule, ScheduleEntry};
pub use early_repayment::{DueRepayment, EarlyRepaymentRegistry, EarlyRepaymentRule};
