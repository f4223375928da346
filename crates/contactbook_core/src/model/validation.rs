//! Field validation rules shared by person/event records.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{Alphabetic}\p{N}]+( [\p{Alphabetic}\p{N}]+)*$").expect("valid name regex"));
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{3,}$").expect("valid phone regex"));
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+$").expect("valid email regex")
});
static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{Alphabetic}\p{N}]+$").expect("valid tag regex"));
static PORTRAIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\S.*\.(png|jpe?g)$").expect("valid portrait regex"));

/// Record-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    InvalidName(String),
    InvalidPhone(String),
    InvalidEmail(String),
    EmptyAddress,
    InvalidPortrait(String),
    InvalidTag(String),
    EmptyTitle,
    /// Text with leading/trailing or repeated inner whitespace.
    UnnormalizedText { field: &'static str, value: String },
    InvalidEventWindow { start: i64, end: i64 },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName(value) => write!(
                f,
                "invalid name `{value}`: names contain only letters, digits and single spaces"
            ),
            Self::InvalidPhone(value) => write!(
                f,
                "invalid phone `{value}`: phone numbers contain at least 3 digits and nothing else"
            ),
            Self::InvalidEmail(value) => {
                write!(f, "invalid email `{value}`: expected local-part@domain")
            }
            Self::EmptyAddress => write!(f, "address must not be blank"),
            Self::InvalidPortrait(value) => write!(
                f,
                "invalid portrait path `{value}`: expected a .png, .jpg or .jpeg file"
            ),
            Self::InvalidTag(value) => {
                write!(f, "invalid tag `{value}`: tags are a single alphanumeric word")
            }
            Self::EmptyTitle => write!(f, "event title must not be blank"),
            Self::UnnormalizedText { field, value } => write!(
                f,
                "{field} `{value}` has stray whitespace; expected `{}`",
                normalize_spaces(value)
            ),
            Self::InvalidEventWindow { start, end } => {
                write!(f, "event end_ms ({end}) must be >= start_ms ({start})")
            }
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn check_name(value: &str) -> Result<(), ValidationError> {
    if NAME_RE.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidName(value.to_string()))
    }
}

pub(crate) fn check_phone(value: &str) -> Result<(), ValidationError> {
    if PHONE_RE.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidPhone(value.to_string()))
    }
}

pub(crate) fn check_email(value: &str) -> Result<(), ValidationError> {
    if EMAIL_RE.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail(value.to_string()))
    }
}

pub(crate) fn check_address(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyAddress);
    }
    check_collapsed("address", value)
}

pub(crate) fn check_title(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    check_collapsed("title", value)
}

/// Descriptions keep inner spacing but must be trimmed.
pub(crate) fn check_description(value: &str) -> Result<(), ValidationError> {
    if value.trim() != value {
        return Err(ValidationError::UnnormalizedText {
            field: "description",
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Stored text must already be in the form the constructors produce.
fn check_collapsed(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if normalize_spaces(value) != value {
        return Err(ValidationError::UnnormalizedText {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

pub(crate) fn check_portrait(value: &str) -> Result<(), ValidationError> {
    if PORTRAIT_RE.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidPortrait(value.to_string()))
    }
}

pub(crate) fn check_tag(value: &str) -> Result<(), ValidationError> {
    if TAG_RE.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidTag(value.to_string()))
    }
}

/// Collapses inner whitespace runs and trims both ends.
pub(crate) fn normalize_spaces(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::{
        check_address, check_description, check_email, check_name, check_phone, check_portrait,
        check_title, normalize_spaces, ValidationError,
    };

    #[test]
    fn name_rule_rejects_symbols_and_double_spaces() {
        assert!(check_name("Carl Kurz").is_ok());
        assert!(check_name("R2 D2").is_ok());
        assert!(check_name("Carl  Kurz").is_err());
        assert!(check_name("Carl*").is_err());
        assert!(check_name("").is_err());
    }

    #[test]
    fn phone_and_email_rules() {
        assert!(check_phone("911").is_ok());
        assert!(check_phone("91").is_err());
        assert!(check_phone("9a11").is_err());
        assert!(check_email("heinz@example.com").is_ok());
        assert!(check_email("heinz.example.com").is_err());
    }

    #[test]
    fn portrait_rule_accepts_image_extensions_only() {
        assert!(check_portrait("img/carl.PNG").is_ok());
        assert!(check_portrait("carl.jpeg").is_ok());
        assert!(check_portrait("carl.gif").is_err());
    }

    #[test]
    fn stored_text_must_already_be_normalized() {
        assert!(check_address("Block 5").is_ok());
        assert_eq!(check_address("  "), Err(ValidationError::EmptyAddress));
        assert!(matches!(
            check_address("Block  5"),
            Err(ValidationError::UnnormalizedText { field: "address", .. })
        ));
        assert!(check_title("Party Time").is_ok());
        assert!(check_title(" Party Time").is_err());
        assert!(check_title("Party  Time").is_err());
        assert!(check_description("bring  food").is_ok());
        assert!(check_description(" x ").is_err());
    }

    #[test]
    fn normalize_spaces_collapses_runs() {
        assert_eq!(normalize_spaces("  Carl \t Kurz "), "Carl Kurz");
    }
}
