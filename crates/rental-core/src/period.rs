//! # Rental Periods
//!
//! A validated `[start, end)` timestamp range and the day-granularity
//! duration used for pricing.

use crate::error::{RentalError, RentalResult};
use crate::money::Amount;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Number of billable days between two instants, rounding any partial day up.
///
/// Returns 0 when `end <= start`.
pub fn rental_days(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let millis = (end - start).num_milliseconds();
    if millis <= 0 {
        return 0;
    }
    (millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
}

/// Price of a rental: `price_per_day * ceil(days)`
pub fn rental_price(price_per_day: Amount, start: DateTime<Utc>, end: DateTime<Utc>) -> Amount {
    price_per_day * rental_days(start, end)
}

/// A rental date range where `end > start` always holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPeriod")]
pub struct RentalPeriod {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawPeriod {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<RawPeriod> for RentalPeriod {
    type Error = RentalError;

    fn try_from(raw: RawPeriod) -> Result<Self, Self::Error> {
        RentalPeriod::new(raw.start, raw.end)
    }
}

impl RentalPeriod {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> RentalResult<Self> {
        if end <= start {
            return Err(RentalError::InvalidRequest(
                "End date must be after start date".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn days(&self) -> i64 {
        rental_days(self.start, self.end)
    }

    pub fn price(&self, price_per_day: Amount) -> Amount {
        rental_price(price_per_day, self.start, self.end)
    }

    /// Calendar day (UTC) the rental starts on
    pub fn start_date(&self) -> NaiveDate {
        self.start.date_naive()
    }

    /// Calendar day (UTC) the rental ends on
    pub fn end_date(&self) -> NaiveDate {
        self.end.date_naive()
    }
}
