use chrono::NaiveTime;
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("check_out ({check_out}) must not be earlier than check_in ({check_in})")]
pub struct NegativeShift {
    pub check_in: NaiveTime,
    pub check_out: NaiveTime,
}

/// Whole minutes between check-in and check-out, in hours, rounded to cents
pub fn hours_worked(check_in: NaiveTime, check_out: NaiveTime) -> Result<Decimal, NegativeShift> {
    let minutes = (check_out - check_in).num_minutes();
    if check_out < check_in {
        return Err(NegativeShift { check_in, check_out });
    }
    Ok((Decimal::from(minutes) / Decimal::from(60)).round_dp(2))
}
