//! Person domain record.
//!
//! # Responsibility
//! - Define the contact record owned by the entity store.
//! - Normalize and validate contact fields on construction.
//!
//! # Invariants
//! - Identity is the name, compared case-insensitively (`identity_key`).
//! - Every field passes `validate()` for records accepted by the store.

use crate::model::tag::Tag;
use crate::model::validation::{
    check_address, check_email, check_name, check_phone, check_portrait, normalize_spaces,
    ValidationError,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

/// Contact record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PersonWire")]
pub struct Person {
    /// Display name; also the identity key.
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    /// Optional path to a portrait image.
    pub portrait: Option<String>,
    pub tags: BTreeSet<Tag>,
}

#[derive(Deserialize)]
struct PersonWire {
    name: String,
    phone: String,
    email: String,
    address: String,
    #[serde(default)]
    portrait: Option<String>,
    #[serde(default)]
    tags: BTreeSet<Tag>,
}

impl TryFrom<PersonWire> for Person {
    type Error = ValidationError;

    fn try_from(value: PersonWire) -> Result<Self, Self::Error> {
        let person = Person {
            name: value.name,
            phone: value.phone,
            email: value.email,
            address: value.address,
            portrait: value.portrait,
            tags: value.tags,
        };
        person.validate()?;
        Ok(person)
    }
}

impl Person {
    /// Creates a person with no tags and no portrait.
    ///
    /// Whitespace runs in `name` and `address` are collapsed; phone and
    /// email are trimmed.
    pub fn new(
        name: &str,
        phone: &str,
        email: &str,
        address: &str,
    ) -> Result<Self, ValidationError> {
        let person = Self {
            name: normalize_spaces(name),
            phone: phone.trim().to_string(),
            email: email.trim().to_string(),
            address: normalize_spaces(address),
            portrait: None,
            tags: BTreeSet::new(),
        };
        person.validate()?;
        Ok(person)
    }

    /// Replaces the tag set.
    pub fn with_tags(mut self, tags: BTreeSet<Tag>) -> Self {
        self.tags = tags;
        self
    }

    /// Sets the portrait path; `None` clears it.
    pub fn with_portrait(mut self, path: Option<&str>) -> Result<Self, ValidationError> {
        self.portrait = match path.map(str::trim) {
            Some(value) if !value.is_empty() => {
                check_portrait(value)?;
                Some(value.to_string())
            }
            _ => None,
        };
        Ok(self)
    }

    /// Checks every field rule.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_name(&self.name)?;
        check_phone(&self.phone)?;
        check_email(&self.email)?;
        check_address(&self.address)?;
        if let Some(portrait) = self.portrait.as_deref() {
            check_portrait(portrait)?;
        }
        Ok(())
    }

    /// Key used for duplicate detection.
    pub fn identity_key(&self) -> String {
        person_key(&self.name)
    }

    /// Returns whether both records denote the same person.
    pub fn is_same_person(&self, other: &Person) -> bool {
        self.identity_key() == other.identity_key()
    }

    pub fn has_tag(&self, tag: &Tag) -> bool {
        self.tags.contains(tag)
    }
}

/// Normalizes a person name into its identity key.
pub fn person_key(name: &str) -> String {
    normalize_spaces(name).to_lowercase()
}

impl Display for Person {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} Phone: {} Email: {} Address: {}",
            self.name, self.phone, self.email, self.address
        )?;
        if !self.tags.is_empty() {
            write!(f, " Tags: ")?;
            for tag in &self.tags {
                write!(f, "{tag}")?;
            }
        }
        Ok(())
    }
}
