//! # Money Types
//!
//! Currency and amount types. Amounts are held in the smallest currency unit
//! and written to documents as decimal major units (`pricePerDay: 120.5`).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::ops::{Add, Mul};
use std::str::FromStr;

/// Supported currencies (ISO 4217)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    #[default]
    USD,
    EUR,
    GBP,
    JPY,
    CAD,
    AUD,
    PKR,
}

impl Currency {
    /// Returns the ISO 4217 currency code
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::USD => "usd",
            Currency::EUR => "eur",
            Currency::GBP => "gbp",
            Currency::JPY => "jpy",
            Currency::CAD => "cad",
            Currency::AUD => "aud",
            Currency::PKR => "pkr",
        }
    }

    /// Returns the number of decimal places for this currency
    /// (JPY has 0 decimals, most others have 2)
    pub fn decimal_places(&self) -> u8 {
        match self {
            Currency::JPY => 0,
            _ => 2,
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Currency::USD => "$",
            Currency::EUR => "€",
            Currency::GBP => "£",
            Currency::JPY => "¥",
            Currency::CAD => "C$",
            Currency::AUD => "A$",
            Currency::PKR => "Rs ",
        }
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "usd" => Ok(Currency::USD),
            "eur" => Ok(Currency::EUR),
            "gbp" => Ok(Currency::GBP),
            "jpy" => Ok(Currency::JPY),
            "cad" => Ok(Currency::CAD),
            "aud" => Ok(Currency::AUD),
            "pkr" => Ok(Currency::PKR),
            other => Err(format!("unsupported currency: {}", other)),
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

/// Amount in the smallest currency unit (cents for two-decimal currencies).
///
/// Serialized as a decimal number of major units, which is how the document
/// store and the browser cart hold prices. All arithmetic happens on the
/// integer value so per-day pricing stays exact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    /// Create from smallest unit (cents)
    pub const fn from_cents(cents: i64) -> Self {
        Amount(cents)
    }

    /// Create from a decimal amount of major units, rounded to the nearest cent
    pub fn from_major(amount: f64) -> Self {
        Amount((amount * 100.0).round() as i64)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    pub fn as_major(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Convert to the gateway's smallest unit for `currency`
    pub fn to_minor_units(&self, currency: Currency) -> i64 {
        match currency.decimal_places() {
            0 => (self.0 as f64 / 100.0).round() as i64,
            _ => self.0,
        }
    }

    /// Inverse of [`Amount::to_minor_units`]
    pub fn from_minor_units(amount: i64, currency: Currency) -> Self {
        match currency.decimal_places() {
            0 => Amount(amount * 100),
            _ => Amount(amount),
        }
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0 + rhs.0)
    }
}

impl Mul<i64> for Amount {
    type Output = Amount;

    fn mul(self, rhs: i64) -> Amount {
        Amount(self.0 * rhs)
    }
}

impl std::iter::Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, Add::add)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % 100 == 0 {
            serializer.serialize_i64(self.0 / 100)
        } else {
            serializer.serialize_f64(self.as_major())
        }
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let major = f64::deserialize(deserializer)?;
        if !major.is_finite() {
            return Err(serde::de::Error::custom("amount must be a finite number"));
        }
        Ok(Amount::from_major(major))
    }
}

/// Price with an amount and currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub amount: Amount,
    pub currency: Currency,
}

impl Price {
    pub fn new(amount: Amount, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Format for display (e.g., "$10.00")
    pub fn display(&self) -> String {
        let symbol = self.currency.symbol();
        if self.currency.decimal_places() == 0 {
            format!("{}{}", symbol, self.amount.to_minor_units(self.currency))
        } else {
            format!("{}{:.2}", symbol, self.amount.as_major())
        }
    }
}
