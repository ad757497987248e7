/// json request - build a schedule from a loan form payload
use loan_scheduler_rs::LoanRequest;

const REQUEST: &str = r#"{
    "principal": "100000",
    "annualInterestRatePercent": "12",
    "loanType": "DIFFERENTIATED",
    "termMonths": 3,
    "issueDate": "2024-01-15",
    "dayCountBasis": "ACTUAL_360",
    "roundingDecimals": 2,
    "earlyRepayments": [
        {
            "startDate": "2024-02-01",
            "periodicity": "ONCE",
            "amount": "100",
            "repaymentType": "DECREASE_TERM"
        }
    ]
}"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let params = LoanRequest::from_json(REQUEST)?.into_parameters()?;
    let schedule = loan_scheduler_rs::build_schedule(&params)?;

    println!("{}", schedule.to_json()?);

    // invalid input is reported before anything is computed
    let broken = REQUEST.replace("\"termMonths\": 3", "\"termMonths\": 0");
    match LoanRequest::from_json(&broken)?.into_parameters() {
        Ok(_) => println!("unexpectedly accepted"),
        Err(e) => println!("rejected: {}", e),
    }

    Ok(())
}
