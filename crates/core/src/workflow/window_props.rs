//! Property-based tests for the business-day edit window.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use proptest::prelude::*;

use crate::budget::Month;
use crate::workflow::window::EditWindow;

fn arb_month() -> impl Strategy<Value = Month> {
    (1u32..=12).prop_map(|n| Month::from_number(n).unwrap())
}

fn arb_holidays() -> impl Strategy<Value = Vec<NaiveDate>> {
    proptest::collection::vec((2020i32..2030, 1u32..=12, 1u32..=28), 0..20).prop_map(|days| {
        days.into_iter()
            .filter_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d))
            .collect()
    })
}

proptest! {
    /// The n-th business day is never a weekend or a holiday.
    #[test]
    fn prop_nth_business_day_is_business_day(
        year in 2020i32..2030,
        month in arb_month(),
        n in 1u32..=20,
        holidays in arb_holidays(),
    ) {
        let window = EditWindow::new(n, holidays.clone());
        let day = window.nth_business_day(year, month, n).unwrap();

        prop_assert!(!matches!(day.weekday(), Weekday::Sat | Weekday::Sun));
        prop_assert!(!holidays.contains(&day));
        prop_assert!(day >= NaiveDate::from_ymd_opt(year, month.number(), 1).unwrap());
    }

    /// More business days never give an earlier deadline.
    #[test]
    fn prop_nth_business_day_is_monotonic(
        year in 2020i32..2030,
        month in arb_month(),
        n in 1u32..=20,
    ) {
        let window = EditWindow::default();
        let a = window.nth_business_day(year, month, n).unwrap();
        let b = window.nth_business_day(year, month, n + 1).unwrap();
        prop_assert!(b > a);
    }

    /// The window is open on the deadline and closed the day after.
    #[test]
    fn prop_window_boundary(
        year in 2020i32..2030,
        month in arb_month(),
        days in 0u32..=10,
    ) {
        let window = EditWindow::new(days, []);
        let deadline = window.deadline(month, year).unwrap();

        prop_assert!(window.allows(month, year, deadline));
        prop_assert!(!window.allows(month, year, deadline + Duration::days(1)));
    }
}
