//! Per-source templates: identifying markers plus field rule chains.
//!
//! A template is declared as a [`TemplateDef`] and compiled once into a
//! [`SourceTemplate`]. Field lookups go through the [`FieldRuleSet`] trait so
//! extractor code never needs to know which source it is working on.

use crate::error::{EngineError, Result};
use regex::{Regex, RegexBuilder};
use std::fmt;

/// Pattern fragment matching a decimal amount with optional thousands separators.
///
/// Comma-grouped numbers are tried first; otherwise the whole digit run is
/// taken, so `2450.00` is never cut short at three digits.
pub const DEC_AMOUNT: &str = r"((?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?)";

/// Number fragment used by the VAT and fee patterns.
const CHARGE_AMOUNT: &str = r"([0-9,]+(?:\.\d+)?)";

/// The template-specific fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Amount,
    Account,
    Balance,
    Reference,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::Amount, Field::Account, Field::Balance, Field::Reference];
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Amount => "amount",
            Field::Account => "account",
            Field::Balance => "balance",
            Field::Reference => "reference",
        };
        f.write_str(name)
    }
}

/// Strategy for pulling one field out of a message.
///
/// Implementations must apply fallback-chain semantics: rules are tried in
/// order and the first one yielding a non-empty capture wins.
pub trait FieldRuleSet: fmt::Debug + Send + Sync {
    /// Returns the winning capture for `field`, or `None` when no rule matches.
    fn first_capture<'t>(&self, field: Field, text: &'t str) -> Option<&'t str>;
}

/// Declarative template definition, compiled by [`SourceTemplate::compile`].
///
/// Patterns are matched case-insensitively and must contain a capture group;
/// group 1 is the captured value.
#[derive(Debug, Clone, Default)]
pub struct TemplateDef {
    pub name: String,
    pub markers: Vec<String>,
    pub currency: String,
    pub amount: Vec<String>,
    pub account: Vec<String>,
    pub balance: Vec<String>,
    pub reference: Vec<String>,
}

impl TemplateDef {
    pub fn new(name: impl Into<String>, currency: impl Into<String>) -> Self {
        TemplateDef {
            name: name.into(),
            currency: currency.into(),
            ..Default::default()
        }
    }

    pub fn markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.markers.extend(markers.into_iter().map(Into::into));
        self
    }

    /// Appends a rule to the chain for `field`.
    pub fn rule(mut self, field: Field, pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        match field {
            Field::Amount => self.amount.push(pattern),
            Field::Account => self.account.push(pattern),
            Field::Balance => self.balance.push(pattern),
            Field::Reference => self.reference.push(pattern),
        }
        self
    }

    fn patterns(&self, field: Field) -> &[String] {
        match field {
            Field::Amount => &self.amount,
            Field::Account => &self.account,
            Field::Balance => &self.balance,
            Field::Reference => &self.reference,
        }
    }
}

/// Regex-backed [`FieldRuleSet`].
#[derive(Debug, Clone, Default)]
pub struct PatternRules {
    amount: Vec<Regex>,
    account: Vec<Regex>,
    balance: Vec<Regex>,
    reference: Vec<Regex>,
}

impl PatternRules {
    fn chain(&self, field: Field) -> &[Regex] {
        match field {
            Field::Amount => &self.amount,
            Field::Account => &self.account,
            Field::Balance => &self.balance,
            Field::Reference => &self.reference,
        }
    }

    fn chain_mut(&mut self, field: Field) -> &mut Vec<Regex> {
        match field {
            Field::Amount => &mut self.amount,
            Field::Account => &mut self.account,
            Field::Balance => &mut self.balance,
            Field::Reference => &mut self.reference,
        }
    }
}

impl FieldRuleSet for PatternRules {
    fn first_capture<'t>(&self, field: Field, text: &'t str) -> Option<&'t str> {
        first_capture(self.chain(field), text)
    }
}

/// Runs a fallback chain: first rule whose group 1 is non-empty wins.
pub(crate) fn first_capture<'t>(rules: &[Regex], text: &'t str) -> Option<&'t str> {
    rules.iter().find_map(|re| {
        re.captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
            .filter(|s| !s.is_empty())
    })
}

/// Compiles a case-insensitive pattern.
pub(crate) fn compile(pattern: &str) -> std::result::Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

/// An immutable, compiled per-source template.
#[derive(Debug)]
pub struct SourceTemplate {
    name: String,
    markers: Vec<String>,
    /// Lowercased copies of `markers`, used for matching.
    needles: Vec<String>,
    currency: String,
    /// Generic `<currency> <number>` pattern used when the amount chain fails.
    currency_amount: Regex,
    /// `VAT [of] [<currency>] <number>`
    vat: Regex,
    /// `(Service charge|fee) [<currency>] <number>`
    fee: Regex,
    rules: Box<dyn FieldRuleSet>,
}

impl SourceTemplate {
    /// Compiles a definition into a regex-backed template.
    pub fn compile(def: TemplateDef) -> Result<Self> {
        let mut rules = PatternRules::default();
        for field in Field::ALL {
            for pattern in def.patterns(field) {
                let re = compile(pattern).map_err(|source| EngineError::Pattern {
                    template: def.name.clone(),
                    source,
                })?;
                if re.captures_len() < 2 {
                    return Err(EngineError::InvalidTemplate {
                        template: def.name.clone(),
                        message: format!("{} rule {:?} has no capture group", field, pattern),
                    });
                }
                rules.chain_mut(field).push(re);
            }
        }
        Self::with_rules(def.name, def.markers, def.currency, Box::new(rules))
    }

    /// Builds a template around a custom rule strategy.
    pub fn with_rules(
        name: impl Into<String>,
        markers: Vec<String>,
        currency: impl Into<String>,
        rules: Box<dyn FieldRuleSet>,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(EngineError::InvalidTemplate {
                template: name,
                message: "name is empty".to_string(),
            });
        }

        let markers: Vec<String> = markers
            .into_iter()
            .filter(|m| !m.trim().is_empty())
            .collect();
        if markers.is_empty() {
            return Err(EngineError::InvalidTemplate {
                template: name,
                message: "at least one non-blank marker is required".to_string(),
            });
        }

        let currency = currency.into();
        if currency.trim().is_empty() {
            return Err(EngineError::InvalidTemplate {
                template: name,
                message: "currency is empty".to_string(),
            });
        }

        let code = regex::escape(&currency);
        let pattern_error = |source: regex::Error| EngineError::Pattern {
            template: name.clone(),
            source,
        };
        let currency_amount =
            compile(&format!(r"{}\s*{}", code, DEC_AMOUNT)).map_err(pattern_error)?;
        let vat = compile(&format!(
            r"VAT(?:\s*(?:of)?)\s*(?:{})?\s*{}",
            code, CHARGE_AMOUNT
        ))
        .map_err(pattern_error)?;
        let fee = compile(&format!(
            r"(?:Service charge|fee)\s*(?:{})?\s*{}",
            code, CHARGE_AMOUNT
        ))
        .map_err(pattern_error)?;

        let needles = markers.iter().map(|m| m.to_lowercase()).collect();
        Ok(SourceTemplate {
            name,
            markers,
            needles,
            currency,
            currency_amount,
            vat,
            fee,
            rules,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Returns `true` if any marker occurs in the already-lowercased text.
    ///
    /// Matching is plain substring search, so a short numeric marker can hit
    /// inside an unrelated digit run.
    pub fn matches_lowercase(&self, lowered: &str) -> bool {
        self.needles.iter().any(|needle| lowered.contains(needle.as_str()))
    }

    /// Case-insensitive marker check.
    pub fn matches(&self, text: &str) -> bool {
        self.matches_lowercase(&text.to_lowercase())
    }

    /// Winning capture of this template's chain for `field`.
    pub fn capture<'t>(&self, field: Field, text: &'t str) -> Option<&'t str> {
        self.rules.first_capture(field, text)
    }

    /// First number following this template's currency code anywhere in `text`.
    pub fn capture_currency_amount<'t>(&self, text: &'t str) -> Option<&'t str> {
        first_capture(std::slice::from_ref(&self.currency_amount), text)
    }

    /// VAT amount, optionally preceded by this template's currency code.
    pub fn capture_vat<'t>(&self, text: &'t str) -> Option<&'t str> {
        first_capture(std::slice::from_ref(&self.vat), text)
    }

    /// Service charge or fee, optionally preceded by this template's currency code.
    pub fn capture_fee<'t>(&self, text: &'t str) -> Option<&'t str> {
        first_capture(std::slice::from_ref(&self.fee), text)
    }
}
