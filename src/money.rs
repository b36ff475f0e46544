//! Exact money type and the numeric normalizer.
//!
//! Captured amounts arrive as raw text such as `"2,450.00"`. The normalizer
//! strips thousands separators, picks the first numeric token out of any
//! surrounding noise and parses it exactly with `rust_decimal`.

use log::debug;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

fn numeric_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[-+]?\d+(?:\.\d+)?").expect("invalid numeric token regex"))
}

/// An exact decimal amount, shown with at least 2 decimal places.
///
/// Values are never rounded; a capture such as `0.125` keeps all its digits.
///
/// # Examples
///
/// ```
/// use sms_txn_engine::Money;
///
/// let amount = Money::normalize("12,345.5");
/// assert_eq!(amount.to_string(), "12345.50");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(Decimal);

impl Money {
    /// The minimum number of decimal places kept for display.
    pub const SCALE: u32 = 2;

    /// Zero value.
    pub const ZERO: Self = Money(Decimal::ZERO);

    /// Creates a new `Money` from a `Decimal`.
    ///
    /// The scale is only ever raised to 2, so no digits are lost.
    pub fn new(value: Decimal) -> Self {
        let mut padded = value;
        if padded.scale() < Self::SCALE {
            padded.rescale(Self::SCALE);
        }
        Money(padded)
    }

    /// Normalizes captured text into an amount, or `None` when the text holds
    /// no parseable number.
    ///
    /// Commas are treated as thousands separators and dropped. The first
    /// token made of an optional sign, digits and at most one decimal point
    /// is parsed; anything around it is ignored.
    pub fn try_normalize(raw: &str) -> Option<Self> {
        let cleaned = raw.replace(',', "");
        let token = numeric_token_re().find(&cleaned)?.as_str();
        let token = token.strip_prefix('+').unwrap_or(token);
        Decimal::from_str(token).ok().map(Money::new)
    }

    /// Normalizes captured text into an amount, falling back to zero.
    pub fn normalize(raw: &str) -> Self {
        match Self::try_normalize(raw) {
            Some(value) => value,
            None => {
                debug!("Malformed numeric capture {:?}, using 0", raw);
                Money::ZERO
            }
        }
    }

    /// Returns the magnitude of this amount.
    pub fn abs(self) -> Self {
        Money(self.0.abs())
    }

    /// Returns `true` if this value is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns `true` if this value is below zero.
    pub fn is_sign_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// The underlying decimal.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Money::new(value)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let decimal = Decimal::from_str(s.trim())?;
        Ok(Money::new(decimal))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut shown = self.0;
        if shown.scale() < Self::SCALE {
            shown.rescale(Self::SCALE);
        }
        write!(f, "{}", shown)
    }
}

impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Money::from_str(&s).map_err(serde::de::Error::custom)
    }
}
