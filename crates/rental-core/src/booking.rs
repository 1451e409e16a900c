//! # Booking Conflict Checker
//!
//! Derives the calendar days on which a car is unavailable from its existing
//! rentals, and decides whether a candidate date range can be booked.
//!
//! Days are UTC calendar dates. A rental blocks every day from its start date
//! to its end date inclusive. In the default [`CheckMode::Endpoints`] mode
//! only the candidate's first and last day are looked up, so a range that
//! straddles a booked span without touching it at either end is accepted.

use crate::error::{RentalError, RentalResult};
use crate::period::RentalPeriod;
use crate::records::{Rental, RentalStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Which existing rentals make their days unavailable
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockingPolicy {
    /// Every rental blocks, whatever its status
    #[default]
    AllRentals,
    /// Cancelled rentals free their days
    ExcludeCancelled,
}

impl BlockingPolicy {
    fn blocks(&self, rental: &Rental) -> bool {
        match self {
            BlockingPolicy::AllRentals => true,
            BlockingPolicy::ExcludeCancelled => rental.status != RentalStatus::Cancelled,
        }
    }
}

impl FromStr for BlockingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" | "all-rentals" => Ok(BlockingPolicy::AllRentals),
            "exclude-cancelled" => Ok(BlockingPolicy::ExcludeCancelled),
            other => Err(format!("unknown blocking policy: {}", other)),
        }
    }
}

/// Which days of a candidate range are compared against unavailable days
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckMode {
    /// First and last day only
    #[default]
    Endpoints,
    /// Every day in the range
    FullRange,
}

impl FromStr for CheckMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "endpoints" => Ok(CheckMode::Endpoints),
            "full-range" | "full" => Ok(CheckMode::FullRange),
            other => Err(format!("unknown check mode: {}", other)),
        }
    }
}

/// Result of checking a candidate range
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub available: bool,
    /// Candidate days found in the unavailable set
    pub conflicts: Vec<NaiveDate>,
}

/// Stateless checker configured with a policy and mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BookingChecker {
    pub policy: BlockingPolicy,
    pub mode: CheckMode,
}

impl BookingChecker {
    pub fn new(policy: BlockingPolicy, mode: CheckMode) -> Self {
        Self { policy, mode }
    }

    /// Every day covered by a blocking rental of `car_id`. Rentals for other
    /// cars are ignored.
    pub fn unavailable_dates<'a, I>(&self, car_id: &str, rentals: I) -> BTreeSet<NaiveDate>
    where
        I: IntoIterator<Item = &'a Rental>,
    {
        let mut days = BTreeSet::new();
        for rental in rentals {
            if rental.car_id() != car_id || !self.policy.blocks(rental) {
                continue;
            }
            let last = rental.end_date.date_naive();
            let mut day = rental.start_date.date_naive();
            while day <= last {
                days.insert(day);
                match day.succ_opt() {
                    Some(next) => day = next,
                    None => break,
                }
            }
        }
        days
    }

    /// Check a candidate range against a precomputed unavailable set
    pub fn check(&self, unavailable: &BTreeSet<NaiveDate>, candidate: &RentalPeriod) -> Availability {
        let first = candidate.start_date();
        let last = candidate.end_date();

        let conflicts: Vec<NaiveDate> = match self.mode {
            CheckMode::Endpoints => {
                let mut hits: Vec<NaiveDate> = [first, last]
                    .into_iter()
                    .filter(|d| unavailable.contains(d))
                    .collect();
                hits.dedup();
                hits
            }
            CheckMode::FullRange => unavailable.range(first..=last).copied().collect(),
        };

        Availability {
            available: conflicts.is_empty(),
            conflicts,
        }
    }

    /// Check a candidate range directly against a car's rentals
    pub fn check_rentals<'a, I>(&self, car_id: &str, rentals: I, candidate: &RentalPeriod) -> Availability
    where
        I: IntoIterator<Item = &'a Rental>,
    {
        let unavailable = self.unavailable_dates(car_id, rentals);
        self.check(&unavailable, candidate)
    }

    /// Like [`BookingChecker::check_rentals`] but turns a conflict into an error
    pub fn ensure_available<'a, I>(&self, car_id: &str, rentals: I, candidate: &RentalPeriod) -> RentalResult<()>
    where
        I: IntoIterator<Item = &'a Rental>,
    {
        if self.check_rentals(car_id, rentals, candidate).available {
            Ok(())
        } else {
            Err(RentalError::InvalidRequest(
                "Selected dates are not available".to_string(),
            ))
        }
    }
}
