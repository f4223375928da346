//! Tag value type.
//!
//! # Invariants
//! - Tag names are trimmed and lowercased before validation.
//! - A tag is one alphanumeric word.

use crate::model::validation::{check_tag, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

/// Normalized person tag.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tag(String);

impl Tag {
    /// Normalizes and validates one tag value.
    pub fn new(value: &str) -> Result<Self, ValidationError> {
        let normalized = value.trim().to_lowercase();
        check_tag(&normalized)?;
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.0)
    }
}

impl TryFrom<String> for Tag {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Tag> for String {
    fn from(value: Tag) -> Self {
        value.0
    }
}

/// Parses and deduplicates raw tag values, failing on the first invalid one.
pub fn parse_tags<I, S>(values: I) -> Result<BTreeSet<Tag>, ValidationError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .map(|value| Tag::new(value.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{parse_tags, Tag};

    #[test]
    fn tags_normalize_to_lowercase_and_dedupe() {
        let tags = parse_tags(["Friends", " friends ", "OWESMONEY"]).unwrap();
        let names: Vec<&str> = tags.iter().map(Tag::as_str).collect();
        assert_eq!(names, vec!["friends", "owesmoney"]);
    }

    #[test]
    fn tag_rejects_multiple_words() {
        assert!(Tag::new("best friend").is_err());
        assert!(Tag::new("   ").is_err());
    }
}
