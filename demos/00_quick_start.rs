/// quick start - minimal example to get started
use chrono::NaiveDate;
use loan_scheduler_rs::{build_schedule, LoanParameters, Money, Rate};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // a $10,000 loan over a year at 8%
    let params = LoanParameters::builder()
        .principal(Money::from_major(10_000))
        .rate(Rate::from_percentage(8))
        .term_months(12)
        .issue_date(NaiveDate::from_ymd_opt(2024, 1, 15).ok_or("bad date")?)
        .build()?;

    let schedule = build_schedule(&params)?;

    println!("monthly payment: {}", schedule.nominal_payment);
    for entry in &schedule.entries {
        println!(
            "{}  payment {:>10}  interest {:>8}  principal {:>10}  remaining {:>10}",
            entry.payment_date,
            entry.payment_amount,
            entry.interest_amount,
            entry.principal_amount,
            entry.remaining_principal
        );
    }
    println!("total interest: {}", schedule.total_interest);

    Ok(())
}
