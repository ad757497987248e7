use chrono::{Datelike, Months, NaiveDate};
use hourglass_rs::{SafeTimeProvider, TimeSource};
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate, RoundingPolicy};
use crate::errors::{Result, ScheduleError};
use crate::interest::DayCountBasis;
use crate::payments::EarlyRepaymentRule;
use crate::types::{LoanType, Periodicity, RepaymentType};

/// validated loan terms consumed by the schedule engine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoanParameters {
    principal: Money,
    annual_rate: Rate,
    loan_type: LoanType,
    term_months: u32,
    issue_date: NaiveDate,
    first_payment_date: Option<NaiveDate>,
    payment_day: u32,
    interest_only_first_period: bool,
    move_holiday_to_next_day: bool,
    day_count_basis: DayCountBasis,
    rounding: RoundingPolicy,
    early_repayments: Vec<EarlyRepaymentRule>,
}

impl LoanParameters {
    pub fn builder() -> LoanParametersBuilder {
        LoanParametersBuilder::new()
    }

    pub fn principal(&self) -> Money {
        self.principal
    }

    pub fn annual_rate(&self) -> Rate {
        self.annual_rate
    }

    pub fn loan_type(&self) -> LoanType {
        self.loan_type
    }

    pub fn term_months(&self) -> u32 {
        self.term_months
    }

    pub fn issue_date(&self) -> NaiveDate {
        self.issue_date
    }

    pub fn first_payment_date(&self) -> Option<NaiveDate> {
        self.first_payment_date
    }

    pub fn payment_day(&self) -> u32 {
        self.payment_day
    }

    pub fn interest_only_first_period(&self) -> bool {
        self.interest_only_first_period
    }

    pub fn move_holiday_to_next_day(&self) -> bool {
        self.move_holiday_to_next_day
    }

    pub fn day_count_basis(&self) -> DayCountBasis {
        self.day_count_basis
    }

    pub fn rounding(&self) -> RoundingPolicy {
        self.rounding
    }

    pub fn early_repayments(&self) -> &[EarlyRepaymentRule] {
        &self.early_repayments
    }

    /// copy restricted to the features of an engine profile
    pub fn with_profile(&self, profile: ScheduleProfile) -> LoanParameters {
        let mut params = self.clone();

        if !profile.honours_payment_day() {
            params.payment_day = params.issue_date.day();
            params.first_payment_date = None;
        }
        if !profile.shifts_weekends() {
            params.move_holiday_to_next_day = false;
        }
        if !profile.applies_early_repayments() {
            params.early_repayments.clear();
        }

        params
    }

    fn validate(&self) -> Result<()> {
        if !self.principal.is_positive() {
            return Err(ScheduleError::InvalidPrincipal {
                amount: self.principal,
            });
        }

        // the last payment date must exist on the calendar
        let first_period = self.first_payment_date.unwrap_or(self.issue_date);
        if self.term_months == 0 || first_period.checked_add_months(Months::new(self.term_months)).is_none() {
            return Err(ScheduleError::InvalidTerm {
                months: self.term_months,
            });
        }

        if self.annual_rate.is_negative() {
            return Err(ScheduleError::InvalidInterestRate {
                rate: self.annual_rate,
            });
        }

        if !(1..=31).contains(&self.payment_day) {
            return Err(ScheduleError::InvalidPaymentDay {
                day: self.payment_day,
            });
        }

        if let Some(first_payment) = self.first_payment_date {
            if first_payment < self.issue_date {
                return Err(ScheduleError::FirstPaymentBeforeIssue {
                    first_payment,
                    issue: self.issue_date,
                });
            }
        }

        for (index, rule) in self.early_repayments.iter().enumerate() {
            rule.validate(index)?;
        }

        Ok(())
    }
}

/// historical engine variants expressed as feature subsets of one engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleProfile {
    /// pays on the issue day of month, no weekend shift, no early repayments
    Basic,
    /// honours the payment day number
    FixedPaymentDay,
    /// payment day plus weekend shifting
    HolidayShift,
    /// every feature, early repayments included
    Full,
}

impl ScheduleProfile {
    fn honours_payment_day(&self) -> bool {
        !matches!(self, ScheduleProfile::Basic)
    }

    fn shifts_weekends(&self) -> bool {
        matches!(self, ScheduleProfile::HolidayShift | ScheduleProfile::Full)
    }

    fn applies_early_repayments(&self) -> bool {
        matches!(self, ScheduleProfile::Full)
    }
}

/// builder for loan parameters
#[derive(Debug, Clone)]
pub struct LoanParametersBuilder {
    principal: Option<Money>,
    annual_rate: Option<Rate>,
    loan_type: LoanType,
    term_months: Option<u32>,
    issue_date: Option<NaiveDate>,
    first_payment_date: Option<NaiveDate>,
    payment_day: Option<u32>,
    interest_only_first_period: bool,
    move_holiday_to_next_day: bool,
    day_count_basis: DayCountBasis,
    rounding_decimals: u32,
    early_repayments: Vec<EarlyRepaymentRule>,
}

impl Default for LoanParametersBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LoanParametersBuilder {
    pub fn new() -> Self {
        Self {
            principal: None,
            annual_rate: None,
            loan_type: LoanType::Annuity,
            term_months: None,
            issue_date: None,
            first_payment_date: None,
            payment_day: None,
            interest_only_first_period: false,
            move_holiday_to_next_day: false,
            day_count_basis: DayCountBasis::default(),
            rounding_decimals: RoundingPolicy::DEFAULT_DECIMALS,
            early_repayments: Vec::new(),
        }
    }

    pub fn principal(mut self, amount: Money) -> Self {
        self.principal = Some(amount);
        self
    }

    pub fn rate(mut self, rate: Rate) -> Self {
        self.annual_rate = Some(rate);
        self
    }

    pub fn loan_type(mut self, loan_type: LoanType) -> Self {
        self.loan_type = loan_type;
        self
    }

    pub fn term_months(mut self, months: u32) -> Self {
        self.term_months = Some(months);
        self
    }

    pub fn issue_date(mut self, date: NaiveDate) -> Self {
        self.issue_date = Some(date);
        self
    }

    pub fn first_payment_date(mut self, date: NaiveDate) -> Self {
        self.first_payment_date = Some(date);
        self
    }

    pub fn payment_day(mut self, day: u32) -> Self {
        self.payment_day = Some(day);
        self
    }

    pub fn interest_only_first_period(mut self, enabled: bool) -> Self {
        self.interest_only_first_period = enabled;
        self
    }

    pub fn move_holiday_to_next_day(mut self, enabled: bool) -> Self {
        self.move_holiday_to_next_day = enabled;
        self
    }

    pub fn day_count_basis(mut self, basis: DayCountBasis) -> Self {
        self.day_count_basis = basis;
        self
    }

    pub fn rounding_decimals(mut self, decimals: u32) -> Self {
        self.rounding_decimals = decimals;
        self
    }

    pub fn early_repayment(mut self, rule: EarlyRepaymentRule) -> Self {
        self.early_repayments.push(rule);
        self
    }

    pub fn early_repayments(mut self, rules: impl IntoIterator<Item = EarlyRepaymentRule>) -> Self {
        self.early_repayments.extend(rules);
        self
    }

    /// Build with system time for a missing issue date
    pub fn build(self) -> Result<LoanParameters> {
        let time = SafeTimeProvider::new(TimeSource::System);
        self.build_with_time(&time)
    }

    /// Build with explicit time provider, used when no issue date was set
    pub fn build_with_time(self, time_provider: &SafeTimeProvider) -> Result<LoanParameters> {
        let principal = self.principal.ok_or(ScheduleError::InvalidConfiguration {
            message: "Principal required".to_string(),
        })?;

        let annual_rate = self.annual_rate.ok_or(ScheduleError::InvalidConfiguration {
            message: "Rate required".to_string(),
        })?;

        let term_months = self.term_months.ok_or(ScheduleError::InvalidConfiguration {
            message: "Term required".to_string(),
        })?;

        let issue_date = self
            .issue_date
            .unwrap_or_else(|| time_provider.now().date_naive());

        let payment_day = self
            .payment_day
            .or_else(|| self.first_payment_date.map(|d| d.day()))
            .unwrap_or_else(|| issue_date.day());

        let params = LoanParameters {
            principal,
            annual_rate,
            loan_type: self.loan_type,
            term_months,
            issue_date,
            first_payment_date: self.first_payment_date,
            payment_day,
            interest_only_first_period: self.interest_only_first_period,
            move_holiday_to_next_day: self.move_holiday_to_next_day,
            day_count_basis: self.day_count_basis,
            rounding: RoundingPolicy::new(self.rounding_decimals),
            early_repayments: self.early_repayments,
        };

        params.validate()?;
        Ok(params)
    }
}

/// raw loan form payload, dates as YYYY-MM-DD strings and amounts as decimal strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanRequest {
    pub principal: String,
    pub annual_interest_rate_percent: String,
    pub loan_type: LoanType,
    pub term_months: i64,
    pub issue_date: String,
    #[serde(default)]
    pub first_payment_date: Option<String>,
    #[serde(default)]
    pub payment_day_number: Option<u32>,
    #[serde(default)]
    pub interest_only_first_period: bool,
    #[serde(default)]
    pub move_holiday_to_next_day: bool,
    #[serde(default)]
    pub day_count_basis: DayCountBasis,
    #[serde(default)]
    pub rounding_decimals: Option<u32>,
    #[serde(default)]
    pub early_repayments: Vec<EarlyRepaymentRequest>,
}

/// raw early repayment entry of a [`LoanRequest`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarlyRepaymentRequest {
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    pub periodicity: Periodicity,
    pub amount: String,
    pub repayment_type: RepaymentType,
}

impl LoanRequest {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// parses and validates the request. nothing is computed on failure
    pub fn into_parameters(self) -> Result<LoanParameters> {
        let term_months = u32::try_from(self.term_months)
            .ok()
            .filter(|months| *months > 0)
            .ok_or(ScheduleError::InvalidTerm {
                months: self.term_months.clamp(0, u32::MAX as i64) as u32,
            })?;

        let principal = parse_money("principal", &self.principal)?;
        let rate_percent = parse_money("annualInterestRatePercent", &self.annual_interest_rate_percent)?;
        let issue_date = parse_date("issueDate", &self.issue_date)?;

        let mut builder = LoanParameters::builder()
            .principal(principal)
            .rate(Rate::from_percent(rate_percent.as_decimal()))
            .loan_type(self.loan_type)
            .term_months(term_months)
            .issue_date(issue_date)
            .interest_only_first_period(self.interest_only_first_period)
            .move_holiday_to_next_day(self.move_holiday_to_next_day)
            .day_count_basis(self.day_count_basis);

        if let Some(raw) = &self.first_payment_date {
            builder = builder.first_payment_date(parse_date("firstPaymentDate", raw)?);
        }
        if let Some(day) = self.payment_day_number {
            builder = builder.payment_day(day);
        }
        if let Some(decimals) = self.rounding_decimals {
            builder = builder.rounding_decimals(decimals);
        }

        for (index, raw) in self.early_repayments.iter().enumerate() {
            builder = builder.early_repayment(raw.to_rule(index)?);
        }

        builder.build()
    }
}

impl EarlyRepaymentRequest {
    fn to_rule(&self, index: usize) -> Result<EarlyRepaymentRule> {
        let invalid = |message: String| ScheduleError::InvalidEarlyRepayment { index, message };

        let start_date = parse_date("startDate", &self.start_date).map_err(|e| invalid(e.to_string()))?;
        let end_date = self
            .end_date
            .as_deref()
            .map(|raw| parse_date("endDate", raw))
            .transpose()
            .map_err(|e| invalid(e.to_string()))?;
        let amount = parse_money("amount", &self.amount).map_err(|e| invalid(e.to_string()))?;

        Ok(EarlyRepaymentRule {
            start_date,
            end_date,
            periodicity: self.periodicity,
            amount,
            repayment_type: self.repayment_type,
        })
    }
}

fn parse_date(field: &str, raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| ScheduleError::InvalidDate {
        message: format!("{}: '{}' is not a valid YYYY-MM-DD date", field, raw),
    })
}

fn parse_money(field: &str, raw: &str) -> Result<Money> {
    Money::from_str_exact(raw).map_err(|_| ScheduleError::InvalidAmount {
        message: format!("{}: '{}' is not a decimal number", field, raw),
    })
}
