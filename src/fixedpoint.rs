/**
 * Money as a fixed point integer of cents.
 *
 * Amounts are parsed straight from what the user types (or what the
 * snapshot CSV holds) and are never negative: parsing rejects a sign and
 * subtraction refuses to go below zero, so a balance built from these can
 * not become negative by construction.
 */
use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BankError;

const FIXED_POINT_MAGNITUDE: i64 = 100;
const EXPECTED_PRECISION: usize = 2;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub fn from_cents(cents: i64) -> Result<Self, BankError> {
        if cents < 0 {
            return Err(BankError::InvalidAmount(format!(
                "{} cents is negative",
                cents
            )));
        }
        Ok(Amount(cents))
    }

    pub fn cents(self) -> i64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    /// `None` when the result would be negative.
    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        match self.0 - other.0 {
            rest if rest >= 0 => Some(Amount(rest)),
            _ => None,
        }
    }
}

pub fn string_to_fixed_point(string: &str) -> Result<Amount, BankError> {
    let invalid = |reason: &str| BankError::InvalidAmount(format!("'{}' {}", string, reason));

    let trimmed = string.trim();
    let trimmed = trimmed.strip_prefix('$').unwrap_or(trimmed);

    if trimmed.starts_with('-') {
        return Err(invalid("is negative"));
    }

    let split_amount: Vec<&str> = trimmed.split('.').collect();
    if split_amount.len() > 2 {
        return Err(invalid("contains more than one dot"));
    }

    // ".5" reads as "0.5", a bare "." is still rejected below.
    let units_text = match split_amount[0] {
        "" if split_amount.len() == 2 => "0",
        units_text => units_text,
    };
    if units_text.is_empty() || !units_text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("is not a number"));
    }
    let units: i64 = units_text.parse().map_err(|_| invalid("is too large"))?;

    let hundredths = match split_amount.get(1) {
        None => 0,
        Some(decimals) => {
            let digits = decimals.len();
            if digits == 0 || !decimals.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid("is not a number"));
            }
            if digits > EXPECTED_PRECISION {
                return Err(invalid("has more than 2 digits past the point"));
            }
            let decimal_multiplier = 10i64.pow((EXPECTED_PRECISION - digits) as u32);
            let value: i64 = decimals.parse().map_err(|_| invalid("is not a number"))?;
            value * decimal_multiplier
        }
    };

    let cents = units
        .checked_mul(FIXED_POINT_MAGNITUDE)
        .and_then(|cents| cents.checked_add(hundredths))
        .ok_or_else(|| invalid("is too large"))?;
    Amount::from_cents(cents)
}

pub fn fixed_point_to_string(fixed_point: Amount) -> String {
    format!(
        "{}.{:02}",
        fixed_point.cents() / FIXED_POINT_MAGNITUDE,
        fixed_point.cents() % FIXED_POINT_MAGNITUDE
    )
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&fixed_point_to_string(*self))
    }
}

impl FromStr for Amount {
    type Err = BankError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        string_to_fixed_point(s)
    }
}

impl TryFrom<String> for Amount {
    type Error = BankError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        string_to_fixed_point(&value)
    }
}

impl From<Amount> for String {
    fn from(amount: Amount) -> Self {
        fixed_point_to_string(amount)
    }
}
