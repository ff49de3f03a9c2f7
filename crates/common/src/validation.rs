//! Centralized field validation.
//!
//! Every secret kind validates through these helpers so the rules live in
//! one place. The daemon runs them authoritatively before touching storage;
//! the client may run the same checks as a pre-flight.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Required length of a card verification value.
pub const CVV_LEN: usize = 3;

const CARD_NUMBER_MIN_DIGITS: usize = 12;
const CARD_NUMBER_MAX_DIGITS: usize = 19;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("{field} is required")]
    Missing { field: String },

    #[error("{field} is malformed: {detail}")]
    Malformed { field: String, detail: String },
}

impl ValidationError {
    pub fn missing(field: &str) -> Self {
        Self::Missing {
            field: field.to_string(),
        }
    }

    pub fn malformed(field: &str, detail: impl Into<String>) -> Self {
        Self::Malformed {
            field: field.to_string(),
            detail: detail.into(),
        }
    }

    /// Name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            Self::Missing { field } | Self::Malformed { field, .. } => field,
        }
    }
}

/// A required field must be present and not blank.
pub fn required(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::missing(field));
    }
    Ok(())
}

/// A required field inside a partial update: absent is fine, blank is not.
pub fn required_if_present(field: &str, value: Option<&String>) -> Result<(), ValidationError> {
    match value {
        Some(v) => required(field, v),
        None => Ok(()),
    }
}

/// Card numbers: 12 to 19 digits (spaces and dashes allowed as separators)
/// that pass the Luhn checksum.
pub fn card_number(field: &str, value: &str) -> Result<(), ValidationError> {
    required(field, value)?;

    let mut digits = Vec::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '0'..='9' => digits.push(c as u8 - b'0'),
            ' ' | '-' => continue,
            _ => return Err(ValidationError::malformed(field, "must contain only digits")),
        }
    }

    if !(CARD_NUMBER_MIN_DIGITS..=CARD_NUMBER_MAX_DIGITS).contains(&digits.len()) {
        return Err(ValidationError::malformed(
            field,
            format!(
                "must have between {} and {} digits",
                CARD_NUMBER_MIN_DIGITS, CARD_NUMBER_MAX_DIGITS
            ),
        ));
    }

    if !luhn(&digits) {
        return Err(ValidationError::malformed(field, "failed checksum"));
    }
    Ok(())
}

fn luhn(digits: &[u8]) -> bool {
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            let d = d as u32;
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

fn expiration_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]{2}/[0-9]{2}$").expect("static pattern compiles"))
}

/// Expiration dates are checked for shape only (`MM/YY`). A format-valid
/// but impossible date such as `13/99` is accepted.
pub fn expiration(field: &str, value: &str) -> Result<(), ValidationError> {
    required(field, value)?;
    if !expiration_pattern().is_match(value) {
        return Err(ValidationError::malformed(field, "expected MM/YY"));
    }
    Ok(())
}

pub fn cvv(field: &str, value: &str) -> Result<(), ValidationError> {
    required(field, value)?;
    if value.chars().count() != CVV_LEN {
        return Err(ValidationError::malformed(
            field,
            format!("must be exactly {} characters", CVV_LEN),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required() {
        assert!(required("name", "x").is_ok());
        assert_eq!(required("name", ""), Err(ValidationError::missing("name")));
        assert_eq!(required("name", "   "), Err(ValidationError::missing("name")));
    }

    #[test]
    fn test_required_if_present() {
        assert!(required_if_present("login", None).is_ok());
        assert!(required_if_present("login", Some(&"bob".to_string())).is_ok());
        assert!(required_if_present("login", Some(&String::new())).is_err());
    }

    #[test]
    fn test_card_number() {
        assert!(card_number("number", "4111111111111111").is_ok());
        assert!(card_number("number", "4111 1111 1111 1111").is_ok());
        assert!(card_number("number", "5500-0000-0000-0004").is_ok());

        // checksum
        assert!(card_number("number", "4111111111111112").is_err());
        // letters
        assert!(card_number("number", "4111a11111111111").is_err());
        // too short
        assert!(card_number("number", "42").is_err());
        assert_eq!(
            card_number("number", ""),
            Err(ValidationError::missing("number"))
        );
    }

    #[test]
    fn test_expiration_is_format_only() {
        assert!(expiration("expiration", "09/27").is_ok());
        assert!(expiration("expiration", "13/99").is_ok());
        assert!(expiration("expiration", "9/27").is_err());
        assert!(expiration("expiration", "09/2027").is_err());
        assert!(expiration("expiration", "09-27").is_err());
        assert!(expiration("expiration", "\u{0660}\u{0669}/\u{0662}\u{0667}").is_err());
    }

    #[test]
    fn test_cvv() {
        assert!(cvv("cvv", "123").is_ok());
        let err = cvv("cvv", "12").unwrap_err();
        assert_eq!(err.field(), "cvv");
        assert!(cvv("cvv", "1234").is_err());
    }
}
