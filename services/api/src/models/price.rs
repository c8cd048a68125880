//! Fixed-point recipe price stored as `NUMERIC(5, 2)`

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Digits allowed before the decimal point
const MAX_INTEGER_DIGITS: usize = 3;
/// Digits allowed after the decimal point
const MAX_DECIMAL_PLACES: usize = 2;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    #[error("A valid number is required")]
    Invalid,

    #[error("Ensure that there are no more than 3 digits before the decimal point")]
    TooManyIntegerDigits,

    #[error("Ensure that there are no more than 2 decimal places")]
    TooManyDecimalPlaces,
}

/// A non-negative price with at most five digits, two of them decimals.
///
/// Held as a whole number of cents so arithmetic and comparison are exact.
/// Serialized as a string with exactly two decimals, e.g. `"5.99"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price {
    cents: u32,
}

impl Price {
    pub fn from_cents(cents: u32) -> Result<Self, PriceError> {
        if cents > 99_999 {
            return Err(PriceError::TooManyIntegerDigits);
        }
        Ok(Self { cents })
    }

    pub fn cents(&self) -> u32 {
        self.cents
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (integer, fraction) = match s.split_once('.') {
            Some((integer, fraction)) => (integer, fraction),
            None => (s, ""),
        };

        if integer.is_empty() && fraction.is_empty() {
            return Err(PriceError::Invalid);
        }
        if !integer.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err(PriceError::Invalid);
        }

        let integer = integer.trim_start_matches('0');
        if integer.len() > MAX_INTEGER_DIGITS {
            return Err(PriceError::TooManyIntegerDigits);
        }

        // Trailing zeros do not count as decimal places ("5.990" == "5.99")
        let fraction = fraction.trim_end_matches('0');
        if fraction.len() > MAX_DECIMAL_PLACES {
            return Err(PriceError::TooManyDecimalPlaces);
        }

        let whole: u32 = if integer.is_empty() {
            0
        } else {
            integer.parse().map_err(|_| PriceError::Invalid)?
        };
        let fractional: u32 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<u32>().map_err(|_| PriceError::Invalid)? * 10,
            _ => fraction.parse().map_err(|_| PriceError::Invalid)?,
        };

        Price::from_cents(whole * 100 + fractional)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.cents / 100, self.cents % 100)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(serde_json::Number),
        }

        let raw = match Raw::deserialize(deserializer)? {
            Raw::Text(text) => text,
            Raw::Number(number) => number.to_string(),
        };

        raw.parse().map_err(serde::de::Error::custom)
    }
}
