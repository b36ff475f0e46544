//! Transaction record produced by the engine.

use crate::money::Money;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Whether funds were received or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Funds received.
    Credit,

    /// Funds spent.
    Debit,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Credit => f.write_str("credit"),
            Direction::Debit => f.write_str("debit"),
        }
    }
}

/// Review state of a record.
///
/// The engine only ever produces `Pending`; confirming is the caller's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Confirmed,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Pending => f.write_str("pending"),
            Status::Confirmed => f.write_str("confirmed"),
        }
    }
}

/// A transaction extracted from one message.
///
/// # Invariants
///
/// - `amount` is a magnitude and never negative; the sign lives in `direction`
/// - Optional fields are `None` when the text did not carry them, never zero
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Generated at build time.
    pub id: Uuid,

    /// Extraction time. Message bodies carry no reliable date.
    pub timestamp: DateTime<Utc>,

    pub amount: Money,

    /// Currency code of the matched source.
    pub currency: String,

    pub direction: Direction,

    /// Name of the matched source template.
    pub source: String,

    /// Best-effort name, or `"Unknown Counterparty"`.
    pub counterparty: String,

    /// Always unset by the engine.
    pub category: Option<String>,

    pub status: Status,

    /// Masked account number, if present.
    pub account: Option<String>,

    /// Running balance after the transaction, if present.
    pub balance: Option<Money>,

    /// Transaction reference or receipt id, if present.
    pub reference: Option<String>,

    pub vat: Option<Money>,

    /// Service charge, if present.
    pub fee: Option<Money>,

    /// The original message, verbatim.
    pub raw_text: String,

    /// Subject line when the message arrived by email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

impl TransactionRecord {
    /// Amount with the direction applied: negative for debits.
    pub fn signed_amount(&self) -> Money {
        match self.direction {
            Direction::Credit => self.amount,
            Direction::Debit => Money::new(-self.amount.as_decimal()),
        }
    }

    /// VAT plus fee, zero when neither is present.
    ///
    /// Saturates at the largest representable amount instead of overflowing.
    pub fn total_charges(&self) -> Money {
        let extra = [self.vat, self.fee]
            .into_iter()
            .flatten()
            .fold(Decimal::ZERO, |acc, m| acc.saturating_add(m.as_decimal()));
        Money::new(extra)
    }
}
