//! Business-day window for late changes to actual amounts.
//!
//! The actual amount of an approved entry for month M stays editable until
//! the end of the N-th business day of the month after M. Weekends and the
//! configured holidays are not business days.

use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::BTreeSet;

use crate::budget::Month;

/// Business-day deadline for changing `realizado` on approved entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditWindow {
    business_days: u32,
    holidays: BTreeSet<NaiveDate>,
}

impl Default for EditWindow {
    fn default() -> Self {
        Self::new(5, [])
    }
}

impl EditWindow {
    /// Creates a window of `business_days` business days.
    ///
    /// Zero closes the window at the end of the entry's own month.
    #[must_use]
    pub fn new(business_days: u32, holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            business_days,
            holidays: holidays.into_iter().collect(),
        }
    }

    /// Number of business days in the window.
    #[must_use]
    pub const fn business_days(&self) -> u32 {
        self.business_days
    }

    /// Returns true for Monday to Friday dates that are not holidays.
    #[must_use]
    pub fn is_business_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.holidays.contains(&date)
    }

    /// Returns the `n`-th business day counting from the first day of the month.
    ///
    /// Returns `None` when `n` is zero or the date is out of range.
    #[must_use]
    pub fn nth_business_day(&self, year: i32, month: Month, n: u32) -> Option<NaiveDate> {
        if n == 0 {
            return None;
        }

        let mut date = NaiveDate::from_ymd_opt(year, month.number(), 1)?;
        let mut seen = 0;
        loop {
            if self.is_business_day(date) {
                seen += 1;
                if seen == n {
                    return Some(date);
                }
            }
            date = date.succ_opt()?;
        }
    }

    /// Last day on which `realizado` of an entry for `mes`/`ano` may change.
    #[must_use]
    pub fn deadline(&self, mes: Month, ano: i32) -> Option<NaiveDate> {
        let (next, next_year) = mes.next(ano)?;
        if self.business_days == 0 {
            return NaiveDate::from_ymd_opt(next_year, next.number(), 1)?.pred_opt();
        }

        self.nth_business_day(next_year, next, self.business_days)
    }

    /// Returns true if `realizado` of an entry for `mes`/`ano` may change on `today`.
    #[must_use]
    pub fn allows(&self, mes: Month, ano: i32, today: NaiveDate) -> bool {
        self.deadline(mes, ano).is_some_and(|deadline| today <= deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    // June 2024 starts on a Saturday: business days are 3, 4, 5, 6, 7.
    #[case(2024, Month::Junho, 1, date(2024, 6, 3))]
    #[case(2024, Month::Junho, 5, date(2024, 6, 7))]
    #[case(2024, Month::Junho, 6, date(2024, 6, 10))]
    // January 2025 starts on a Wednesday.
    #[case(2025, Month::Janeiro, 3, date(2025, 1, 3))]
    #[case(2025, Month::Janeiro, 4, date(2025, 1, 6))]
    fn test_nth_business_day(
        #[case] year: i32,
        #[case] month: Month,
        #[case] n: u32,
        #[case] expected: NaiveDate,
    ) {
        let window = EditWindow::default();
        assert_eq!(window.nth_business_day(year, month, n), Some(expected));
    }

    #[test]
    fn test_holidays_are_skipped() {
        let window = EditWindow::new(1, [date(2025, 1, 1)]);
        assert_eq!(
            window.nth_business_day(2025, Month::Janeiro, 1),
            Some(date(2025, 1, 2))
        );
    }

    #[test]
    fn test_deadline_for_december_is_in_next_year() {
        let window = EditWindow::new(5, [date(2025, 1, 1)]);
        // Jan 2025 business days without New Year: 2, 3, 6, 7, 8.
        assert_eq!(
            window.deadline(Month::Dezembro, 2024),
            Some(date(2025, 1, 8))
        );
    }

    #[test]
    fn test_allows_until_deadline_inclusive() {
        let window = EditWindow::default();
        // May 2024 entries: deadline is the 5th business day of June 2024.
        assert!(window.allows(Month::Maio, 2024, date(2024, 5, 20)));
        assert!(window.allows(Month::Maio, 2024, date(2024, 6, 7)));
        assert!(!window.allows(Month::Maio, 2024, date(2024, 6, 8)));
        assert!(!window.allows(Month::Janeiro, 2024, date(2024, 6, 1)));
    }

    #[test]
    fn test_future_months_always_allowed() {
        let window = EditWindow::default();
        assert!(window.allows(Month::Dezembro, 2030, date(2024, 6, 1)));
    }

    #[test]
    fn test_zero_days_closes_at_month_end() {
        let window = EditWindow::new(0, []);
        assert_eq!(
            window.deadline(Month::Fevereiro, 2024),
            Some(date(2024, 2, 29))
        );
        assert!(!window.allows(Month::Fevereiro, 2024, date(2024, 3, 1)));
    }

    #[test]
    fn test_year_out_of_calendar_range_has_no_deadline() {
        let window = EditWindow::default();
        assert_eq!(window.deadline(Month::Dezembro, i32::MAX), None);
        assert!(!window.allows(Month::Dezembro, i32::MAX, date(2024, 6, 1)));
    }
}
