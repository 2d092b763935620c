//! Shop calendar: business-day arithmetic over a holiday set.
//!
//! Build dates count backwards from the required ship date in business
//! days, skipping weekends and configured holidays.

use std::collections::BTreeSet;

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Holiday set plus weekday logic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShopCalendar {
    /// Company closure dates.
    pub holidays: BTreeSet<NaiveDate>,
}

impl ShopCalendar {
    /// Creates a calendar with no holidays.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a holiday.
    pub fn with_holiday(mut self, date: NaiveDate) -> Self {
        self.holidays.insert(date);
        self
    }

    /// Whether the date is a holiday.
    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }

    /// Whether the date is a weekday and not a holiday.
    pub fn is_business_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.is_holiday(date)
    }

    /// Steps back `days` business days from `from`.
    ///
    /// `days <= 0` returns `from` unchanged.
    pub fn subtract_business_days(&self, from: NaiveDate, days: i64) -> NaiveDate {
        let mut result = from;
        let mut remaining = days;
        while remaining > 0 {
            result = result - Days::new(1);
            if self.is_business_day(result) {
                remaining -= 1;
            }
        }
        result
    }

    /// Steps forward `days` business days from `from`.
    pub fn add_business_days(&self, from: NaiveDate, days: i64) -> NaiveDate {
        let mut result = from;
        let mut remaining = days;
        while remaining > 0 {
            result = result + Days::new(1);
            if self.is_business_day(result) {
                remaining -= 1;
            }
        }
        result
    }

    /// Counts business days strictly between two dates.
    pub fn business_days_between(&self, start: NaiveDate, end: NaiveDate) -> i64 {
        if start >= end {
            return 0;
        }
        let mut count = 0;
        let mut current = start + Days::new(1);
        while current < end {
            if self.is_business_day(current) {
                count += 1;
            }
            current = current + Days::new(1);
        }
        count
    }
}
