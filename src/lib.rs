//! # SMS Transaction Engine
//!
//! Extracts structured financial transactions from bank and mobile-money SMS
//! notifications.
//!
//! ## Design Principles
//!
//! - **Template registry**: each known source is an immutable template of
//!   markers and ordered field rules; the first registered match wins
//! - **Fallback chains**: for every field the first rule yielding a
//!   non-empty capture wins
//! - **Exact amounts**: captured numbers go through `rust_decimal`, never floats
//! - **Magnitude plus direction**: `amount` is never negative
//! - **No record is not an error**: unrecognized text yields `None`
//! - **Email input**: the inline `text/plain` body of an `.eml` message is
//!   parsed like an SMS, with its subject kept on the record
//!
//! ## Example
//!
//! ```
//! use sms_txn_engine::{Direction, Engine};
//!
//! let engine = Engine::new();
//! let record = engine
//!     .parse("Your account has been debited with ETB 2,450.00. Current Balance is ETB 10,000.00")
//!     .unwrap();
//! assert_eq!(record.source, "CBE");
//! assert_eq!(record.amount.to_string(), "2450.00");
//! assert_eq!(record.direction, Direction::Debit);
//!
//! assert!(engine.parse("Hello, how are you?").is_none());
//! ```

pub mod config;
pub mod email;
pub mod engine;
pub mod error;
pub mod extract;
pub mod money;
pub mod registry;
pub mod template;
pub mod transaction;

pub use config::{EngineConfig, MessageSplit, OnAmountMissing};
pub use email::{collect_eml_files, EmailMessage};
pub use engine::{BatchReport, Engine};
pub use error::{EngineError, Result};
pub use extract::UNKNOWN_COUNTERPARTY;
pub use money::Money;
pub use registry::{Registry, RegistryBuilder};
pub use template::{Field, FieldRuleSet, PatternRules, SourceTemplate, TemplateDef, DEC_AMOUNT};
pub use transaction::{Direction, Status, TransactionRecord};
