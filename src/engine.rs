//! Record builder and batch front end.
//!
//! [`Engine::parse`] turns one message into a record. It is a pure function of
//! its input: no I/O, no shared mutable state, safe to call from many threads.
//! [`Engine::parse_stream`] splits a reader into messages and parses each;
//! [`Engine::parse_emails`] does the same for raw email messages.

use crate::config::{EngineConfig, MessageSplit, OnAmountMissing};
use crate::email::EmailMessage;
use crate::error::Result;
use crate::extract;
use crate::money::Money;
use crate::registry::Registry;
use crate::transaction::{Status, TransactionRecord};
use chrono::Utc;
use log::{debug, info, warn};
use std::io::{BufRead, Write};
use std::sync::Arc;
use uuid::Uuid;

/// The transaction extraction engine.
///
/// Holds a shared, immutable template registry. Replacing the registry means
/// building a new engine; in-flight parses keep their own snapshot.
#[derive(Debug, Clone)]
pub struct Engine {
    registry: Arc<Registry>,
    config: EngineConfig,
}

impl Engine {
    /// Creates an engine over the built-in sources with default settings.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self::with_registry(Registry::builtin(), config)
    }

    pub fn with_registry(registry: Arc<Registry>, config: EngineConfig) -> Self {
        Engine { registry, config }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Parses one message.
    ///
    /// Returns `None` when no source template recognizes the text, or when
    /// the amount is missing and the policy is [`OnAmountMissing::NoRecord`].
    /// Absent optional fields never prevent a record.
    pub fn parse(&self, text: &str) -> Option<TransactionRecord> {
        let template = match self.registry.identify(text) {
            Some(t) => t,
            None => {
                debug!("No known source in message");
                return None;
            }
        };

        let amount = match extract::amount(text, template) {
            Some(amount) => amount,
            None => match self.config.on_amount_missing {
                OnAmountMissing::ZeroRecord => {
                    debug!("{}: no amount found, recording 0", template.name());
                    Money::ZERO
                }
                OnAmountMissing::NoRecord => {
                    debug!("{}: no amount found, skipping", template.name());
                    return None;
                }
            },
        };

        Some(TransactionRecord {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            amount,
            currency: template.currency().to_string(),
            direction: extract::direction(text),
            source: template.name().to_string(),
            counterparty: extract::counterparty(text),
            category: None,
            status: Status::Pending,
            account: extract::account(text, template),
            balance: extract::balance(text, template),
            reference: extract::reference(text, template),
            vat: extract::vat(text, template),
            fee: extract::fee(text, template),
            raw_text: text.to_string(),
            subject: None,
        })
    }

    /// Parses the body of one raw email and keeps its subject on the record.
    ///
    /// Fails only when the message itself cannot be parsed.
    pub fn parse_email(&self, raw: &[u8]) -> Result<Option<TransactionRecord>> {
        let email = EmailMessage::parse(raw)?;
        Ok(self.parse(&email.body).map(|record| TransactionRecord {
            subject: email.subject,
            ..record
        }))
    }

    /// Parses each raw email in order, one message per item.
    pub fn parse_emails<I, B>(&self, emails: I) -> Result<BatchReport>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let mut report = BatchReport::default();
        for raw in emails {
            let parsed = self.parse_email(raw.as_ref())?;
            self.record_outcome(&mut report, parsed);
        }
        log_summary(&report);
        Ok(report)
    }

    /// Reads messages from `reader` and parses each one in order.
    ///
    /// Unrecognized messages are logged at warn level and counted.
    pub fn parse_stream<R: BufRead>(&self, reader: R, split: MessageSplit) -> Result<BatchReport> {
        let mut report = BatchReport::default();
        let mut block: Vec<String> = Vec::new();

        for line in reader.lines() {
            let line = line?;
            match split {
                MessageSplit::Line => {
                    if !line.trim().is_empty() {
                        self.record_message(&mut report, line.trim());
                    }
                }
                MessageSplit::BlankLine => {
                    if line.trim().is_empty() {
                        self.flush_block(&mut report, &mut block);
                    } else {
                        block.push(line);
                    }
                }
            }
        }
        self.flush_block(&mut report, &mut block);

        log_summary(&report);
        Ok(report)
    }

    fn flush_block(&self, report: &mut BatchReport, block: &mut Vec<String>) {
        if block.is_empty() {
            return;
        }
        let message = block.join("\n");
        block.clear();
        self.record_message(report, message.trim());
    }

    fn record_message(&self, report: &mut BatchReport, message: &str) {
        let parsed = self.parse(message);
        self.record_outcome(report, parsed);
    }

    fn record_outcome(&self, report: &mut BatchReport, parsed: Option<TransactionRecord>) {
        report.messages += 1;
        let number = report.messages;

        match parsed {
            Some(record) => {
                debug!(
                    "Message {}: {} {} {} {}",
                    number, record.source, record.direction, record.amount, record.currency
                );
                report.records.push(record);
            }
            None => {
                warn!("Message {}: no transaction recognized", number);
                report.unrecognized.push(number);
            }
        }
    }
}

fn log_summary(report: &BatchReport) {
    info!(
        "Parsed {} of {} messages ({} unrecognized)",
        report.records.len(),
        report.messages,
        report.unrecognized.len()
    );
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Records in input order.
    pub records: Vec<TransactionRecord>,

    /// Number of messages read.
    pub messages: usize,

    /// 1-based positions of messages that produced no record.
    pub unrecognized: Vec<usize>,
}

impl BatchReport {
    /// Writes the records as a pretty-printed JSON array.
    pub fn write_json<W: Write>(&self, mut writer: W) -> Result<()> {
        serde_json::to_writer_pretty(&mut writer, &self.records)?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Writes the records as CSV. Absent optional fields are empty cells;
    /// the raw message text is left out. `subject` is the last column.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "id",
            "timestamp",
            "source",
            "direction",
            "amount",
            "currency",
            "counterparty",
            "account",
            "balance",
            "reference",
            "vat",
            "fee",
            "status",
            "subject",
        ])?;

        for record in &self.records {
            csv_writer.write_record([
                record.id.to_string(),
                record.timestamp.to_rfc3339(),
                record.source.clone(),
                record.direction.to_string(),
                record.amount.to_string(),
                record.currency.clone(),
                record.counterparty.clone(),
                record.account.clone().unwrap_or_default(),
                optional_money(record.balance),
                record.reference.clone().unwrap_or_default(),
                optional_money(record.vat),
                optional_money(record.fee),
                record.status.to_string(),
                record.subject.clone().unwrap_or_default(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

fn optional_money(value: Option<Money>) -> String {
    value.map(|m| m.to_string()).unwrap_or_default()
}
