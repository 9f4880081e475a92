use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{LedgerError, Result};

/// a billing period: an inclusive range of calendar days keyed by its start month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl BillingPeriod {
    /// period spanning `months` whole months from `start`
    pub fn starting(start: NaiveDate, months: u32) -> Result<Self> {
        let end = start
            .checked_add_months(Months::new(months))
            .and_then(|d| d.checked_sub_days(Days::new(1)))
            .ok_or_else(|| LedgerError::InvalidDate {
                message: format!("period starting {start} overflows the calendar"),
            })?;
        Ok(Self { start, end })
    }

    /// the calendar month containing `date`
    pub fn month_containing(date: NaiveDate) -> Self {
        let start = date.with_day(1).unwrap_or(date);
        // a one-month span from the first of the month never overflows
        Self::starting(start, 1).unwrap_or(Self { start, end: date })
    }

    /// the calendar month containing `now`
    pub fn current_month(now: DateTime<Utc>) -> Self {
        Self::month_containing(now.date_naive())
    }

    /// the period immediately after this one, spanning `months`
    pub fn next(&self, months: u32) -> Result<Self> {
        let start = self
            .end
            .checked_add_days(Days::new(1))
            .ok_or_else(|| LedgerError::InvalidDate {
                message: format!("period ending {} overflows the calendar", self.end),
            })?;
        Self::starting(start, months)
    }

    /// string key identifying the period, e.g. "2026-03"
    pub fn key(&self) -> String {
        self.start.format("%Y-%m").to_string()
    }

    /// parse a "YYYY-MM" key back into the calendar month it names
    pub fn from_key(key: &str) -> Result<Self> {
        let first = format!("{key}-01");
        let start = NaiveDate::parse_from_str(&first, "%Y-%m-%d").map_err(|_| {
            LedgerError::InvalidDate {
                message: format!("invalid period key: {key}"),
            }
        })?;
        Self::starting(start, 1)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// whole calendar months from `from` to `to`, clamped at zero
pub fn months_between(from: NaiveDate, to: NaiveDate) -> u32 {
    let months = (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32;
    months.max(0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_containing() {
        let period = BillingPeriod::month_containing(date(2026, 2, 14));
        assert_eq!(period.start, date(2026, 2, 1));
        assert_eq!(period.end, date(2026, 2, 28));
        assert_eq!(period.key(), "2026-02");
    }

    #[test]
    fn test_quarterly_span() {
        let period = BillingPeriod::starting(date(2026, 1, 1), 3).unwrap();
        assert_eq!(period.end, date(2026, 3, 31));

        let next = period.next(3).unwrap();
        assert_eq!(next.start, date(2026, 4, 1));
        assert_eq!(next.end, date(2026, 6, 30));
        assert_eq!(next.key(), "2026-04");
    }

    #[test]
    fn test_next_monthly() {
        let period = BillingPeriod::month_containing(date(2026, 12, 5));
        let next = period.next(1).unwrap();
        assert_eq!(next.start, date(2027, 1, 1));
        assert_eq!(next.key(), "2027-01");
    }

    #[test]
    fn test_from_key_round_trip() {
        let period = BillingPeriod::from_key("2026-03").unwrap();
        assert_eq!(period.start, date(2026, 3, 1));
        assert_eq!(period.end, date(2026, 3, 31));
        assert_eq!(period.key(), "2026-03");

        assert!(BillingPeriod::from_key("march").is_err());
    }

    #[test]
    fn test_months_between() {
        assert_eq!(months_between(date(2025, 1, 1), date(2026, 3, 15)), 14);
        assert_eq!(months_between(date(2026, 3, 1), date(2026, 3, 31)), 0);
        // rent start after target clamps to zero
        assert_eq!(months_between(date(2027, 1, 1), date(2026, 3, 1)), 0);
    }
}
