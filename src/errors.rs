use chrono::NaiveDate;
use thiserror::Error;

use crate::decimal::{Money, Rate};

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("invalid principal: {amount}")]
    InvalidPrincipal {
        amount: Money,
    },

    #[error("invalid term: {months} months")]
    InvalidTerm {
        months: u32,
    },

    #[error("invalid interest rate: {rate}")]
    InvalidInterestRate {
        rate: Rate,
    },

    #[error("invalid payment day: {day} is not between 1 and 31")]
    InvalidPaymentDay {
        day: u32,
    },

    #[error("first payment date {first_payment} precedes issue date {issue}")]
    FirstPaymentBeforeIssue {
        first_payment: NaiveDate,
        issue: NaiveDate,
    },

    #[error("invalid date: {message}")]
    InvalidDate {
        message: String,
    },

    #[error("invalid amount: {message}")]
    InvalidAmount {
        message: String,
    },

    #[error("invalid early repayment #{index}: {message}")]
    InvalidEarlyRepayment {
        index: usize,
        message: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("calculation error: {message}")]
    CalculationError {
        message: String,
    },

    #[error("malformed request: {0}")]
    MalformedRequest(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
