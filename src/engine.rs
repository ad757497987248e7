use chrono::NaiveDate;
use log::{debug, trace};

use crate::calendar::PaymentDateSequencer;
use crate::config::LoanParameters;
use crate::decimal::{Money, Rate, RoundingPolicy};
use crate::errors::{Result, ScheduleError};
use crate::interest::DayCountCalculator;
use crate::payments::{
    annuity_payment, level_principal, DueRepayment, EarlyRepaymentRegistry, Schedule,
    ScheduleEntry,
};
use crate::types::{LoanType, RepaymentType};

/// entries reserved up front, longer loans grow the vec as they go
const PREALLOCATED_ENTRIES: u32 = 1_200;

/// where the engine is in the life of the loan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    InterestOnly,
    Amortizing,
    FinalPayment,
    Done,
}

/// running totals for one `run()`, never shared outside it
#[derive(Debug, Clone)]
struct EngineState {
    phase: Phase,
    /// last regular payment date, day counts inside a period are measured from it
    period_start: NaiveDate,
    /// interest accrues from here
    previous_date: NaiveDate,
    /// start of the current payment window
    current_date: NaiveDate,
    /// end of the current payment window, weekend shift applied
    next_date: NaiveDate,
    /// `next_date` before the weekend shift, drives the sequencer
    nominal_next: NaiveDate,
    remaining_principal: Money,
    remaining_months: u32,
    monthly_rate: Rate,
    annuity_payment: Money,
    level_principal: Money,
    /// accrued interest an early repayment did not cover
    interest_carry: Money,
}

impl EngineState {
    /// periods left to repay principal, a pending interest-only period excluded
    fn periods_to_amortize(&self) -> u32 {
        match self.phase {
            Phase::InterestOnly => self.remaining_months.saturating_sub(1),
            _ => self.remaining_months,
        }
    }
}

/// builds the repayment schedule for one set of loan parameters
pub struct ScheduleEngine<'a> {
    params: &'a LoanParameters,
    day_count: DayCountCalculator,
    sequencer: PaymentDateSequencer,
    rounding: RoundingPolicy,
}

impl<'a> ScheduleEngine<'a> {
    pub fn new(params: &'a LoanParameters) -> Self {
        Self {
            params,
            day_count: DayCountCalculator::new(params.day_count_basis()),
            sequencer: PaymentDateSequencer::new(
                params.payment_day(),
                params.move_holiday_to_next_day(),
            ),
            rounding: params.rounding(),
        }
    }

    /// walks the loan to maturity
    pub fn run(&self) -> Result<Schedule> {
        let params = self.params;
        let mut state = self.initial_state()?;
        let nominal_payment = self.nominal_payment(&state)?;
        let mut registry = EarlyRepaymentRegistry::new(params.early_repayments());
        let mut entries = Vec::with_capacity(params.term_months().min(PREALLOCATED_ENTRIES) as usize);

        debug!(
            "scheduling {:?} loan of {} at {} over {} months from {}, nominal payment {}",
            params.loan_type(),
            params.principal(),
            params.annual_rate(),
            params.term_months(),
            params.issue_date(),
            nominal_payment
        );

        while state.phase != Phase::Done {
            self.step(&mut state, &mut registry, &mut entries)?;
        }

        let schedule = Schedule::new(nominal_payment, entries);
        debug!(
            "schedule complete: {} entries, total interest {}, maturity {:?}",
            schedule.len(),
            schedule.total_interest,
            schedule.maturity_date
        );

        Ok(schedule)
    }

    fn initial_state(&self) -> Result<EngineState> {
        let params = self.params;
        let issue_date = params.issue_date();

        let nominal_next = match params.first_payment_date() {
            Some(first) => first,
            None => self.sequencer.next_nominal(issue_date)?,
        };

        // a single-month loan has no room for an interest-only period
        let interest_only = params.interest_only_first_period() && params.term_months() > 1;
        let phase = if interest_only {
            Phase::InterestOnly
        } else {
            Phase::Amortizing
        };

        let mut state = EngineState {
            phase,
            period_start: issue_date,
            previous_date: issue_date,
            current_date: issue_date,
            next_date: self.sequencer.adjust(nominal_next),
            nominal_next,
            remaining_principal: params.principal(),
            remaining_months: params.term_months(),
            monthly_rate: params.annual_rate().monthly_rate(),
            annuity_payment: Money::ZERO,
            level_principal: Money::ZERO,
            interest_carry: Money::ZERO,
        };

        let periods = state.periods_to_amortize();
        match params.loan_type() {
            LoanType::Annuity => {
                state.annuity_payment = annuity_payment(
                    state.remaining_principal,
                    params.annual_rate(),
                    periods,
                    &self.rounding,
                )?;
            }
            LoanType::Differentiated => {
                state.level_principal = level_principal(state.remaining_principal, periods, &self.rounding);
            }
        }

        Ok(state)
    }

    fn nominal_payment(&self, state: &EngineState) -> Result<Money> {
        match self.params.loan_type() {
            LoanType::Annuity => Ok(state.annuity_payment),
            LoanType::Differentiated => {
                let interest = state
                    .remaining_principal
                    .as_decimal()
                    .checked_mul(state.monthly_rate.as_decimal())
                    .ok_or_else(|| ScheduleError::CalculationError {
                        message: format!(
                            "monthly interest on {} at {} overflows",
                            state.remaining_principal,
                            self.params.annual_rate()
                        ),
                    })?;
                Ok(state.level_principal + self.rounding.round_decimal(interest))
            }
        }
    }

    /// one payment window (current, next]
    fn step(
        &self,
        state: &mut EngineState,
        registry: &mut EarlyRepaymentRegistry,
        entries: &mut Vec<ScheduleEntry>,
    ) -> Result<()> {
        registry.skip_stale(state.current_date);

        for due in registry.due_within(state.current_date, state.next_date) {
            self.apply_early_repayment(state, &due, entries)?;
            registry.mark_applied(due.id);

            if state.remaining_principal.is_zero() {
                state.phase = Phase::Done;
                break;
            }
        }
        registry.compact();

        if state.phase == Phase::Done {
            return Ok(());
        }

        let interest = self.period_interest(state)?;

        if state.phase == Phase::Amortizing && self.is_final_period(state) {
            state.phase = Phase::FinalPayment;
        }

        match state.phase {
            Phase::InterestOnly => {
                let remaining = state.remaining_principal;
                self.emit(entries, state.next_date, interest, interest, Money::ZERO, remaining, false);
                state.phase = Phase::Amortizing;
            }
            Phase::Amortizing => {
                let (payment, principal) = self.split(state, interest);
                state.remaining_principal -= principal;
                let remaining = state.remaining_principal;
                self.emit(entries, state.next_date, payment, interest, principal, remaining, false);

                if remaining.is_zero() {
                    state.phase = Phase::Done;
                    return Ok(());
                }
            }
            Phase::FinalPayment => {
                let principal = state.remaining_principal;
                state.remaining_principal = Money::ZERO;
                self.emit(
                    entries,
                    state.next_date,
                    principal + interest,
                    interest,
                    principal,
                    Money::ZERO,
                    false,
                );
                state.phase = Phase::Done;
                return Ok(());
            }
            Phase::Done => return Ok(()),
        }

        self.advance(state)
    }

    /// interest owed at the end of the window, pending carry included
    fn period_interest(&self, state: &mut EngineState) -> Result<Money> {
        let fresh = self.accrue(state, state.next_date)?;
        let carry = std::mem::take(&mut state.interest_carry);
        Ok(carry + fresh)
    }

    fn is_final_period(&self, state: &EngineState) -> bool {
        if state.remaining_months <= 1 {
            return true;
        }
        self.params.loan_type() == LoanType::Annuity
            && state.remaining_principal <= state.annuity_payment
    }

    /// (payment, principal) for a regular amortizing period
    fn split(&self, state: &EngineState, interest: Money) -> (Money, Money) {
        match self.params.loan_type() {
            LoanType::Annuity => {
                if interest >= state.annuity_payment {
                    return (interest, Money::ZERO);
                }
                let principal = self
                    .rounding
                    .round(state.annuity_payment - interest)
                    .min(state.remaining_principal);
                (state.annuity_payment, principal)
            }
            LoanType::Differentiated => {
                let principal = state.level_principal.min(state.remaining_principal);
                (principal + interest, principal)
            }
        }
    }

    fn advance(&self, state: &mut EngineState) -> Result<()> {
        state.period_start = state.next_date;
        state.previous_date = state.next_date;
        state.current_date = state.next_date;
        state.nominal_next = self.sequencer.next_nominal(state.nominal_next)?;
        state.next_date = self.sequencer.adjust(state.nominal_next);
        state.remaining_months = state.remaining_months.saturating_sub(1);

        if state.remaining_months == 0 {
            state.phase = Phase::Done;
        }
        Ok(())
    }

    /// applies one early repayment on its due date
    fn apply_early_repayment(
        &self,
        state: &mut EngineState,
        due: &DueRepayment,
        entries: &mut Vec<ScheduleEntry>,
    ) -> Result<()> {
        let amount = self.rounding.round(due.amount);
        let fresh = self.accrue(state, due.due_date)?;
        let accrued = std::mem::take(&mut state.interest_carry) + fresh;

        if amount <= accrued {
            // nothing left for principal, the rest of the interest waits for the next payment
            state.interest_carry = accrued - amount;
            let remaining = state.remaining_principal;
            self.emit(entries, due.due_date, amount, amount, Money::ZERO, remaining, true);
        } else {
            let principal = (amount - accrued).min(state.remaining_principal);
            state.remaining_principal -= principal;
            let remaining = state.remaining_principal;
            self.emit(entries, due.due_date, accrued + principal, accrued, principal, remaining, true);
        }

        debug!(
            "early repayment #{} of {} on {} ({:?}, {:?}), remaining principal {}, carry {}",
            due.id,
            amount,
            due.due_date,
            due.periodicity,
            due.repayment_type,
            state.remaining_principal,
            state.interest_carry
        );

        if !state.remaining_principal.is_zero() {
            self.recompute_after_repayment(state, due.repayment_type)?;
        }

        state.previous_date = due.due_date;
        state.current_date = due.due_date;
        Ok(())
    }

    fn recompute_after_repayment(&self, state: &mut EngineState, repayment_type: RepaymentType) -> Result<()> {
        let periods = state.periods_to_amortize();

        match (self.params.loan_type(), repayment_type) {
            (LoanType::Annuity, RepaymentType::DecreasePayment) => {
                state.annuity_payment = annuity_payment(
                    state.remaining_principal,
                    self.params.annual_rate(),
                    periods,
                    &self.rounding,
                )?;
            }
            // payment held, the term shrinks through the early final-period check
            (LoanType::Annuity, RepaymentType::DecreaseTerm) => {}
            (LoanType::Differentiated, _) => {
                state.level_principal = level_principal(state.remaining_principal, periods, &self.rounding);
            }
        }
        Ok(())
    }

    /// interest on the remaining principal from the last anchor to `to`
    fn accrue(&self, state: &EngineState, to: NaiveDate) -> Result<Money> {
        let days = self
            .day_count
            .elapsed_days_within(state.period_start, state.previous_date, to);
        let calculation = self.day_count.interest_for_days(
            state.remaining_principal,
            self.params.annual_rate(),
            days,
            state.next_date,
            &self.rounding,
        )?;
        Ok(calculation.interest_amount)
    }

    #[allow(clippy::too_many_arguments)]
    fn emit(
        &self,
        entries: &mut Vec<ScheduleEntry>,
        payment_date: NaiveDate,
        payment_amount: Money,
        interest_amount: Money,
        principal_amount: Money,
        remaining_principal: Money,
        is_early_repayment: bool,
    ) {
        let entry = ScheduleEntry {
            payment_date,
            payment_amount,
            interest_amount,
            principal_amount,
            remaining_principal,
            is_early_repayment,
        };
        trace!("{:?}", entry);
        entries.push(entry);
    }
}

/// convenience wrapper around [`ScheduleEngine::run`]
pub fn build_schedule(params: &LoanParameters) -> Result<Schedule> {
    ScheduleEngine::new(params).run()
}
