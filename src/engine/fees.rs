//! Fee arithmetic. Whole-day granularity: every started day bills as a
//! full day, and a rental never bills fewer than one day.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::model::RentalTransaction;

const SECS_PER_DAY: i64 = 86_400;

/// Ceiling division for `i64` (stable stand-in for the unstable
/// `i64::div_ceil`). `b` is always positive at the call sites here.
fn div_ceil_i64(a: i64, b: i64) -> i64 {
    let d = a / b;
    let r = a % b;
    if r > 0 { d + 1 } else { d }
}

/// 20% of the daily rate, charged per overdue day on top of the base fee.
fn overdue_surcharge_rate() -> Decimal {
    Decimal::new(2, 1)
}

/// Whole billable days between start and end, rounded up, never below one.
pub fn billable_days(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let secs = end.signed_duration_since(start).num_seconds();
    div_ceil_i64(secs, SECS_PER_DAY).max(1)
}

/// Whole days past the planned return, rounded up. Zero until the deadline
/// has strictly passed.
pub fn days_overdue(planned_return: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    if now <= planned_return {
        return 0;
    }
    div_ceil_i64(
        now.signed_duration_since(planned_return).num_seconds(),
        SECS_PER_DAY,
    )
}

/// Total fee for a rental at the given daily rate. The billing window ends
/// at the actual return date once set, else the planned return date.
pub fn rental_fee(rental: &RentalTransaction, daily_rate: Decimal) -> Decimal {
    let end = rental.actual_return_date.unwrap_or(rental.return_date);
    let days = billable_days(rental.rental_date, end);
    let mut total = Decimal::from(days) * daily_rate;
    if rental.overdue_days > 0 {
        total += Decimal::from(rental.overdue_days) * daily_rate * overdue_surcharge_rate();
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RentalStatus;
    use chrono::{Duration, TimeZone};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
    }

    fn rental(start: DateTime<Utc>, planned: DateTime<Utc>) -> RentalTransaction {
        RentalTransaction {
            id: 1,
            rental_date: start,
            return_date: planned,
            actual_return_date: None,
            overdue_days: 0,
            rental_fee: Decimal::ZERO,
            status: RentalStatus::Rented,
            vehicle_id: 1,
            customer_id: 1,
        }
    }

    #[test]
    fn same_instant_bills_one_day() {
        assert_eq!(billable_days(at(1, 9), at(1, 9)), 1);
    }

    #[test]
    fn partial_day_rounds_up() {
        assert_eq!(billable_days(at(1, 9), at(2, 21)), 2); // 36h
        assert_eq!(billable_days(at(1, 9), at(3, 9)), 2); // exactly 48h
        assert_eq!(billable_days(at(1, 9), at(3, 10)), 3); // 49h
    }

    #[test]
    fn end_before_start_still_bills_one_day() {
        assert_eq!(billable_days(at(3, 9), at(1, 9)), 1);
    }

    #[test]
    fn not_overdue_until_deadline_strictly_passed() {
        assert_eq!(days_overdue(at(5, 9), at(5, 9)), 0);
        assert_eq!(days_overdue(at(5, 9), at(4, 9)), 0);
    }

    #[test]
    fn one_second_late_is_one_overdue_day() {
        let planned = at(5, 9);
        assert_eq!(days_overdue(planned, planned + Duration::seconds(1)), 1);
    }

    #[test]
    fn plain_fee_is_days_times_rate() {
        let r = rental(at(1, 9), at(3, 9));
        assert_eq!(rental_fee(&r, Decimal::from(100)), Decimal::from(200));
    }

    #[test]
    fn actual_return_overrides_planned() {
        let mut r = rental(at(1, 9), at(3, 9));
        r.actual_return_date = Some(at(5, 9)); // 4 days
        assert_eq!(rental_fee(&r, Decimal::from(100)), Decimal::from(400));
    }

    #[test]
    fn overdue_surcharge_is_twenty_percent_per_day() {
        let mut r = rental(at(1, 9), at(3, 9)); // 2 base days
        r.overdue_days = 3;
        // 200 + 3 * 100 * 0.2 = 260
        assert_eq!(rental_fee(&r, Decimal::from(100)), Decimal::from(260));
    }

    #[test]
    fn fee_monotonic_in_actual_return() {
        let rate = Decimal::from(85);
        let mut previous = Decimal::ZERO;
        for hours in 0..120 {
            let mut r = rental(at(1, 9), at(3, 9));
            r.actual_return_date = Some(at(1, 9) + Duration::hours(hours));
            let fee = rental_fee(&r, rate);
            assert!(fee >= previous, "fee dropped at +{hours}h");
            previous = fee;
        }
    }
}
