//! Email notification input.
//!
//! Some banks send the same notification text by email. A raw RFC 822
//! message is reduced to its subject and the first inline `text/plain`
//! body, which is then parsed like an SMS.

use crate::error::{EngineError, Result};
use log::debug;
use mailparse::{parse_mail, DispositionType, MailHeaderMap, ParsedMail};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// The parts of an email the engine reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// Decoded `Subject` header, if present.
    pub subject: Option<String>,

    /// First inline `text/plain` body, trimmed. Empty when the message has none.
    pub body: String,
}

impl EmailMessage {
    /// Parses a raw message.
    ///
    /// Parts marked as attachments are skipped, so a forwarded statement
    /// attached to a notification is never read as the notification itself.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let mail = parse_mail(raw)?;
        let subject = mail
            .headers
            .get_first_value("Subject")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let body = match plain_body(&mail) {
            Some(body) => body.trim().to_string(),
            None => {
                debug!("No inline text/plain part in email {:?}", subject);
                String::new()
            }
        };

        Ok(EmailMessage { subject, body })
    }
}

fn plain_body(mail: &ParsedMail) -> Option<String> {
    if matches!(
        mail.get_content_disposition().disposition,
        DispositionType::Attachment
    ) {
        return None;
    }
    if mail.subparts.is_empty() {
        if !mail.ctype.mimetype.eq_ignore_ascii_case("text/plain") {
            return None;
        }
        return mail.get_body().ok();
    }
    mail.subparts.iter().find_map(plain_body)
}

fn is_eml(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.eq_ignore_ascii_case("eml"))
        .unwrap_or(false)
}

/// Lists the `.eml` files at `path`: the file itself, or every `.eml` file
/// under a directory in sorted order.
pub fn collect_eml_files(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        if !is_eml(path) {
            return Err(EngineError::NotEmail(path.to_path_buf()));
        }
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path) {
        let entry = entry?;
        if entry.file_type().is_file() && is_eml(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort();

    if files.is_empty() {
        return Err(EngineError::NotEmail(path.to_path_buf()));
    }
    debug!("Found {} email files under {}", files.len(), path.display());
    Ok(files)
}
