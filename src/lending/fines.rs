//! Fine accrual policy
//!
//! Pure functions only; the ledger and the overdue scanner apply the results.
//! Lost-book fines are deliberately absent: a lost amount is resolved
//! externally (market-price lookup or manual entry) and never invented here.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Whole days a loan is past due, floored at one.
///
/// A loan scanned the moment it becomes eligible still owes at least one
/// day's fine.
pub fn overdue_days(now: DateTime<Utc>, due_date: DateTime<Utc>) -> i64 {
    (now - due_date).num_days().max(1)
}

/// Overdue fine: flat per-day rate times days late.
///
/// Recomputed from scratch on every sweep; callers overwrite rather than
/// increment, which is what makes the scanner idempotent.
pub fn overdue_fine(days: i64, per_day: Decimal) -> Decimal {
    Decimal::from(days) * per_day
}

/// Borrowing limit guard: would issuing `requested` more loans exceed the cap?
pub fn within_limit(active: i64, requested: i64, max_active: i64) -> bool {
    active + requested <= max_active
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn four_days_late_owes_four_days() {
        let due = utc(2025, 1, 1);
        let now = utc(2025, 1, 5);
        assert_eq!(overdue_days(now, due), 4);
        assert_eq!(overdue_fine(4, Decimal::from(25)), Decimal::from(100));
    }

    #[test]
    fn days_floor_at_one() {
        let due = utc(2025, 1, 1);
        // Scanned the same day: timespan is under 24h but one day is owed.
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 18, 0, 0).unwrap();
        assert_eq!(overdue_days(now, due), 1);
    }

    #[test]
    fn partial_days_are_floored() {
        let due = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 1, 4, 11, 0, 0).unwrap();
        // 2 days 23 hours late floors to 2.
        assert_eq!(overdue_days(now, due), 2);
    }

    #[test]
    fn fine_is_linear_in_days() {
        let rate = Decimal::from(25);
        for days in 1..=30 {
            assert_eq!(overdue_fine(days, rate), Decimal::from(days * 25));
        }
    }

    #[test]
    fn limit_guard() {
        // Issuing the third book is fine; a fourth is not.
        assert!(within_limit(2, 1, 3));
        assert!(!within_limit(3, 1, 3));
        // A multi-book issuance counts every requested copy.
        assert!(!within_limit(1, 3, 3));
        assert!(within_limit(0, 3, 3));
    }
}
