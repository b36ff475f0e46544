//! Field extractors.
//!
//! Each extractor is independent of the others. Template-specific fields go
//! through the selected [`SourceTemplate`]. Counterparty patterns are shared
//! by every source; VAT and fee share one shape keyed on the source currency.

use crate::money::Money;
use crate::template::{compile, first_capture, Field, SourceTemplate};
use crate::transaction::Direction;
use log::debug;
use regex::Regex;
use std::sync::OnceLock;

/// Counterparty value used when no relational phrase matches.
pub const UNKNOWN_COUNTERPARTY: &str = "Unknown Counterparty";

const CREDIT_KEYWORDS: [&str; 3] = ["credit", "received", "deposit"];
const DEBIT_KEYWORDS: [&str; 3] = ["debit", "withdraw", "transfer"];

fn counterparty_rules() -> &'static [Regex] {
    static RULES: OnceLock<Vec<Regex>> = OnceLock::new();
    RULES.get_or_init(|| {
        [
            r"to\s+([A-Z][A-Za-z.'\-\s]{1,80}?)\s+on",
            r"from\s+([A-Z][A-Za-z.'\-\s]{1,80}?)\s+on",
            r"credited by\s+([A-Z][A-Za-z.'\-\s]{1,80}?)\b",
            r"by\s+([A-Z][A-Za-z.'\-\s]{1,80}?)\s*\.",
            r"to\s+(.+?)\s+account number",
        ]
        .iter()
        .map(|p| compile(p).expect("invalid counterparty regex"))
        .collect()
    })
}

/// Extracts the transaction amount.
///
/// The template chain is tried first, then a generic `<currency> <number>`
/// pattern over the whole text. `None` means both failed.
pub fn amount(text: &str, template: &SourceTemplate) -> Option<Money> {
    template
        .capture(Field::Amount, text)
        .or_else(|| template.capture_currency_amount(text))
        .map(|raw| Money::normalize(raw).abs())
}

/// Classifies the direction from keywords anywhere in the text.
///
/// Credit keywords are checked before debit keywords. Text with neither is
/// treated as a debit; this is a conservative heuristic, not a business rule.
pub fn direction(text: &str) -> Direction {
    let lowered = text.to_lowercase();
    if CREDIT_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        return Direction::Credit;
    }
    if !DEBIT_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        debug!("No direction keyword found, defaulting to debit");
    }
    Direction::Debit
}

/// Best-effort counterparty name, or [`UNKNOWN_COUNTERPARTY`].
pub fn counterparty(text: &str) -> String {
    first_capture(counterparty_rules(), text)
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN_COUNTERPARTY.to_string())
}

pub fn account(text: &str, template: &SourceTemplate) -> Option<String> {
    template.capture(Field::Account, text).map(str::to_string)
}

/// Running balance, absent when the template has no matching rule.
pub fn balance(text: &str, template: &SourceTemplate) -> Option<Money> {
    template.capture(Field::Balance, text).map(Money::normalize)
}

pub fn reference(text: &str, template: &SourceTemplate) -> Option<String> {
    template.capture(Field::Reference, text).map(str::to_string)
}

/// VAT charged, with or without the source's currency code.
pub fn vat(text: &str, template: &SourceTemplate) -> Option<Money> {
    template.capture_vat(text).map(|raw| Money::normalize(raw).abs())
}

/// Service charge or fee, with or without the source's currency code.
pub fn fee(text: &str, template: &SourceTemplate) -> Option<Money> {
    template.capture_fee(text).map(|raw| Money::normalize(raw).abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;

    const CBE_DEBIT: &str = "Dear Customer, your Account 1***234 has been debited with ETB 2,450.00 to Ethio Telecom on 01/01/2024. Current Balance is ETB 10,000.00.";

    #[test]
    fn test_amount_from_template_rule() {
        let registry = Registry::builtin();
        let cbe = registry.get("CBE").unwrap();
        assert_eq!(amount(CBE_DEBIT, cbe).unwrap().to_string(), "2450.00");
    }

    #[test]
    fn test_amount_transfer_rule_precedes_credit_rule() {
        let registry = Registry::builtin();
        let cbe = registry.get("CBE").unwrap();
        let text = "CBE: You have transfered ETB 300.00 and your account was credited with ETB 5.00";
        assert_eq!(amount(text, cbe).unwrap().to_string(), "300.00");
    }

    #[test]
    fn test_amount_generic_fallback() {
        let registry = Registry::builtin();
        let boa = registry.get("BOA").unwrap();
        // No BOA-specific phrase, but a currency amount is present.
        let text = "BoA: payment of ETB 1,250.75 processed";
        assert_eq!(amount(text, boa).unwrap().to_string(), "1250.75");
    }

    #[test]
    fn test_amount_missing() {
        let registry = Registry::builtin();
        let boa = registry.get("BOA").unwrap();
        assert_eq!(amount("BoA: your card is ready", boa), None);
    }

    #[test]
    fn test_direction_keywords() {
        assert_eq!(direction("credited with ETB 500"), Direction::Credit);
        assert_eq!(direction("debited with ETB 500"), Direction::Debit);
        assert_eq!(direction("You have RECEIVED ETB 20"), Direction::Credit);
        assert_eq!(direction("A Withdrawal of 100 ETB"), Direction::Debit);
        assert_eq!(direction("You have transferred ETB 20"), Direction::Debit);
        assert_eq!(direction("Payment of ETB 20"), Direction::Debit);
    }

    #[test]
    fn test_direction_credit_checked_first() {
        assert_eq!(direction("debited from savings, credited to checking"), Direction::Credit);
    }

    #[test]
    fn test_counterparty_patterns() {
        assert_eq!(counterparty(CBE_DEBIT), "Ethio Telecom");
        assert_eq!(
            counterparty("You have received ETB 50 from Abebe Kebede on 12/03/2024"),
            "Abebe Kebede"
        );
        // The lazy group stops at the first word boundary.
        assert_eq!(
            counterparty("Your account has been credited by Abebe with ETB 10"),
            "Abebe"
        );
        assert_eq!(counterparty("Paid ETB 30 by Almaz."), "Almaz");
        assert_eq!(
            counterparty("Sent ETB 30 to 0911-22 account number 1000"),
            "0911-22"
        );
    }

    #[test]
    fn test_counterparty_unknown() {
        assert_eq!(counterparty("ETB 30 paid"), UNKNOWN_COUNTERPARTY);
    }

    #[test]
    fn test_balance_and_account() {
        let registry = Registry::builtin();
        let cbe = registry.get("CBE").unwrap();
        assert_eq!(balance(CBE_DEBIT, cbe).unwrap().to_string(), "10000.00");
        assert_eq!(account(CBE_DEBIT, cbe).as_deref(), Some("1***234"));
    }

    #[test]
    fn test_balance_absent_without_rule() {
        let registry = Registry::builtin();
        let telebirr = registry.get("Telebirr").unwrap();
        assert_eq!(balance("telebirr balance is ETB 10", telebirr), None);
    }

    #[test]
    fn test_reference_chain() {
        let registry = Registry::builtin();
        let cbe = registry.get("CBE").unwrap();
        assert_eq!(
            reference("CBE receipt https://apps.cbe.com.et/?id=FT24001ABC", cbe).as_deref(),
            Some("FT24001ABC")
        );
        assert_eq!(
            reference("CBE transfer Ref No FT2400XYZ done", cbe).as_deref(),
            Some("FT2400XYZ")
        );
        assert_eq!(reference("CBE transfer done", cbe), None);
    }

    #[test]
    fn test_vat_and_fee() {
        let registry = Registry::builtin();
        let cbe = registry.get("CBE").unwrap();
        let text = "debited with ETB 100.00 with Service charge ETB 2.50 and VAT of ETB 0.38";
        assert_eq!(fee(text, cbe).unwrap().to_string(), "2.50");
        assert_eq!(vat(text, cbe).unwrap().to_string(), "0.38");
    }

    #[test]
    fn test_vat_and_fee_absent() {
        let registry = Registry::builtin();
        let cbe = registry.get("CBE").unwrap();
        let text = "debited with ETB 100.00";
        assert_eq!(fee(text, cbe), None);
        assert_eq!(vat(text, cbe), None);
    }

    #[test]
    fn test_amounts_without_separators() {
        let registry = Registry::builtin();
        let cbe = registry.get("CBE").unwrap();
        let text = "CBE: your account has been debited with ETB 2450.00. Current Balance is ETB 10000.00";
        assert_eq!(amount(text, cbe).unwrap().to_string(), "2450.00");
        assert_eq!(balance(text, cbe).unwrap().to_string(), "10000.00");

        let telebirr = registry.get("Telebirr").unwrap();
        let text = "telebirr: You have received ETB 1500 from Hana on 01/03/2024";
        assert_eq!(amount(text, telebirr).unwrap().to_string(), "1500.00");
    }
}
