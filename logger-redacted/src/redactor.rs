use base64::{engine::general_purpose, Engine as _};
use lazy_static::lazy_static;
use regex::Regex;
use sha2::{Digest, Sha256};

mod patterns {
    #![allow(clippy::unwrap_used)]
    use lazy_static::lazy_static;
    use regex::Regex;

    lazy_static! {
        pub static ref EMAIL: Regex = Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap();
        pub static ref PHONE: Regex = Regex::new(r"(?:\+1[-.\s]?)?\(?\b[0-9]{3}\)?[-.\s]?[0-9]{3}[-.\s]?[0-9]{4}\b").unwrap();
        pub static ref SSN: Regex = Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap();
        pub static ref DATE: Regex = Regex::new(r"\b\d{4}-\d{2}-\d{2}\b").unwrap();
    }
}

lazy_static! {
    static ref DEFAULT_REDACTOR: PiiRedactor = PiiRedactor::new(RedactionConfig::default());
}

/// PII redaction configuration
#[derive(Debug, Clone)]
pub struct RedactionConfig {
    pub redact_emails: bool,
    pub redact_phones: bool,
    pub redact_ssn: bool,
    /// ISO dates, which in this system are mostly dates of birth.
    pub redact_dates: bool,
    pub hash_for_correlation: bool,
    pub custom_patterns: Vec<(Regex, String)>,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            redact_emails: true,
            redact_phones: true,
            redact_ssn: true,
            redact_dates: true,
            hash_for_correlation: true,
            custom_patterns: Vec::new(),
        }
    }
}

/// PII redactor for free-text log values
pub struct PiiRedactor {
    config: RedactionConfig,
}

impl PiiRedactor {
    pub fn new(config: RedactionConfig) -> Self {
        Self { config }
    }

    pub fn redact(&self, text: &str) -> String {
        let mut result = text.to_string();

        if self.config.redact_emails {
            result = self.replace(&patterns::EMAIL, &result, "EMAIL", |email| {
                let (user, domain) = email.split_once('@').unwrap_or((email, ""));
                format!("{}***@{}***", first_char(user), first_char(domain))
            });
        }

        if self.config.redact_ssn {
            result = self.replace(&patterns::SSN, &result, "SSN", |_| "***-**-****".to_string());
        }

        if self.config.redact_dates {
            result = self.replace(&patterns::DATE, &result, "DATE", |_| "****-**-**".to_string());
        }

        if self.config.redact_phones {
            result = self.replace(&patterns::PHONE, &result, "PHONE", |_| "(***) ***-****".to_string());
        }

        for (pattern, replacement) in &self.config.custom_patterns {
            result = pattern.replace_all(&result, replacement.as_str()).to_string();
        }

        result
    }

    fn replace(
        &self,
        pattern: &Regex,
        text: &str,
        tag: &str,
        mask: impl Fn(&str) -> String,
    ) -> String {
        pattern
            .replace_all(text, |caps: &regex::Captures| {
                let matched = caps.get(0).map_or("", |m| m.as_str());
                if self.config.hash_for_correlation {
                    format!("{tag}[{}]", hash_value(matched))
                } else {
                    mask(matched)
                }
            })
            .to_string()
    }
}

/// Redact free text with the default rules.
pub fn redact(text: &str) -> String {
    DEFAULT_REDACTOR.redact(text)
}

/// Stable, non-reversible stand-in for an identifying value such as a
/// patient content key. Equal inputs give equal fingerprints, so log lines
/// can still be correlated.
pub fn fingerprint(value: &str) -> String {
    format!("KEY[{}]", hash_value(value))
}

fn first_char(value: &str) -> &str {
    value
        .char_indices()
        .nth(1)
        .map_or(value, |(end, _)| value.get(..end).unwrap_or(value))
}

fn hash_value(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    general_purpose::STANDARD.encode(digest.get(..8).unwrap_or_default()) // first 8 bytes keep it short
}
