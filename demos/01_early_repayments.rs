/// early repayments - one-off and recurring extra payments, with engine logging
use chrono::NaiveDate;
use loan_scheduler_rs::{
    build_schedule, DayCountBasis, EarlyRepaymentRule, LoanParameters, LoanType, Money, Periodicity, Rate,
    RepaymentType,
};
use rust_decimal_macros::dec;
use simple_logger::SimpleLogger;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    SimpleLogger::new().with_level(log::LevelFilter::Debug).init()?;

    let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).ok_or("bad date");

    let base = LoanParameters::builder()
        .principal(Money::from_major(250_000))
        .rate(Rate::from_percent(dec!(6.75)))
        .term_months(240)
        .issue_date(date(2024, 3, 8)?)
        .payment_day(25)
        .move_holiday_to_next_day(true)
        .day_count_basis(DayCountBasis::ActualActual);

    let plain = build_schedule(&base.clone().build()?)?;

    let with_extras = base
        .clone()
        .early_repayment(EarlyRepaymentRule::once(
            date(2024, 9, 2)?,
            Money::from_major(20_000),
            RepaymentType::DecreasePayment,
        ))
        .early_repayment(
            EarlyRepaymentRule::recurring(
                date(2024, 4, 10)?,
                Periodicity::Monthly,
                Money::from_major(500),
                RepaymentType::DecreaseTerm,
            )
            .until(date(2029, 12, 31)?),
        )
        .build()?;
    let shortened = build_schedule(&with_extras)?;

    let differentiated = build_schedule(&base.loan_type(LoanType::Differentiated).build()?)?;

    println!("annuity, no extras:   {} payments, interest {}", plain.regular_payment_count, plain.total_interest);
    println!(
        "annuity, with extras: {} payments, interest {}, extra paid {}",
        shortened.regular_payment_count, shortened.total_interest, shortened.early_repayment_total
    );
    println!(
        "differentiated:       {} payments, interest {}, first payment {}",
        differentiated.regular_payment_count, differentiated.total_interest, differentiated.nominal_payment
    );

    Ok(())
}
