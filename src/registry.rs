//! The ordered source registry and source identification.
//!
//! Templates are kept in priority order. A registry is built once and never
//! mutated; extending it means building a new one with [`RegistryBuilder`].

use crate::error::{EngineError, Result};
use crate::template::{Field, SourceTemplate, TemplateDef, DEC_AMOUNT};
use log::debug;
use std::sync::{Arc, OnceLock};

/// Account number pattern shared by most templates.
const ACCOUNT_RULE: &str = r"account\s*([0-9\*\-]+)";

/// Immutable, priority-ordered collection of source templates.
#[derive(Debug)]
pub struct Registry {
    templates: Vec<SourceTemplate>,
}

impl Registry {
    /// Starts an empty builder.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// The process-wide registry of built-in sources, compiled on first use.
    pub fn builtin() -> Arc<Registry> {
        static BUILTIN: OnceLock<Arc<Registry>> = OnceLock::new();
        BUILTIN
            .get_or_init(|| {
                // Built-in patterns are constants covered by tests
                let registry = RegistryBuilder::with_builtins()
                    .expect("built-in templates compile")
                    .build();
                Arc::new(registry)
            })
            .clone()
    }

    /// Selects the first template, in priority order, with a marker present
    /// in `text`. `None` means the source is not recognized.
    pub fn identify(&self, text: &str) -> Option<&SourceTemplate> {
        let lowered = text.to_lowercase();
        let found = self
            .templates
            .iter()
            .find(|template| template.matches_lowercase(&lowered));
        if let Some(template) = found {
            debug!("Identified source {}", template.name());
        }
        found
    }

    pub fn get(&self, name: &str) -> Option<&SourceTemplate> {
        self.templates.iter().find(|t| t.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceTemplate> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Collects templates in priority order, rejecting duplicates.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    templates: Vec<SourceTemplate>,
}

impl RegistryBuilder {
    /// A builder pre-loaded with the built-in sources.
    pub fn with_builtins() -> Result<Self> {
        let mut builder = RegistryBuilder::default();
        for def in builtin_defs() {
            builder = builder.define(def)?;
        }
        Ok(builder)
    }

    /// Compiles and appends a definition at the lowest priority.
    pub fn define(self, def: TemplateDef) -> Result<Self> {
        let template = SourceTemplate::compile(def)?;
        self.register(template)
    }

    /// Appends a compiled template at the lowest priority.
    pub fn register(mut self, template: SourceTemplate) -> Result<Self> {
        if self.templates.iter().any(|t| t.name() == template.name()) {
            return Err(EngineError::DuplicateTemplate(template.name().to_string()));
        }
        self.templates.push(template);
        Ok(self)
    }

    pub fn build(self) -> Registry {
        Registry {
            templates: self.templates,
        }
    }
}

fn amount_after(prefix: &str) -> String {
    format!(r"{}\s*{}", prefix, DEC_AMOUNT)
}

fn amount_before(prefix: &str, suffix: &str) -> String {
    format!(r"{}\s*{}\s*{}", prefix, DEC_AMOUNT, suffix)
}

/// Built-in sources, highest priority first.
fn builtin_defs() -> Vec<TemplateDef> {
    vec![
        TemplateDef::new("CBE", "ETB")
            .markers(["CBE", "Commercial Bank of Ethiopia", "Current Balance is ETB"])
            .rule(Field::Amount, amount_after("You have transfer(?:ed|red) ETB"))
            .rule(Field::Amount, amount_after("credited with ETB"))
            .rule(Field::Amount, amount_after("debited with ETB"))
            .rule(Field::Account, ACCOUNT_RULE)
            .rule(Field::Balance, amount_after("Current Balance is ETB"))
            .rule(Field::Reference, r"id=([A-Za-z0-9\-_&=]+)")
            .rule(Field::Reference, r"Ref No\s*([A-Z0-9]+)"),
        TemplateDef::new("Telebirr", "ETB")
            .markers(["127", "telebirr", "ethio telecom"])
            .rule(Field::Amount, amount_after("ETB"))
            .rule(Field::Account, ACCOUNT_RULE)
            .rule(Field::Reference, r"transaction number is\s*([A-Z0-9\-]+)"),
        TemplateDef::new("BOA", "ETB")
            .markers(["Bank of Abyssinia", "boa"])
            .rule(Field::Amount, amount_after("was (?:credited|debited) with ETB"))
            .rule(Field::Amount, amount_after("has been (?:credited|debited) with ETB"))
            .rule(Field::Account, ACCOUNT_RULE)
            .rule(Field::Reference, r"trx=([A-Z0-9]+)"),
        TemplateDef::new("Dashen", "ETB")
            .markers(["Dashen", "Dashen Super App"])
            .rule(Field::Amount, amount_after("is credited with ETB"))
            .rule(Field::Amount, amount_after("has been debited with ETB"))
            .rule(Field::Amount, amount_after("ETB"))
            .rule(Field::Account, r#"account\s*['"]?([0-9\*\-]+)['"]?"#)
            .rule(Field::Reference, r"receipt/([A-Za-z0-9/_\-=]+)"),
        TemplateDef::new("Bunna", "ETB")
            .markers(["Bunna Bank"])
            .rule(Field::Amount, amount_before("Withdrawal of", "ETB"))
            .rule(Field::Amount, amount_before("A Withdrawal of", "ETB"))
            .rule(Field::Amount, amount_before("A Deposit of", "ETB"))
            .rule(Field::Amount, amount_after("has been debited with ETB"))
            .rule(Field::Account, ACCOUNT_RULE)
            .rule(Field::Reference, r"receipt.*trx=([A-Z0-9]+)"),
    ]
}
