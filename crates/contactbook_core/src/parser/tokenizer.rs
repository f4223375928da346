//! Prefix tokenizer for `word PREAMBLE p1/value p2/value ...` input.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\s)(pt|n|p|e|a|t|d|s|f)/").expect("valid prefix regex"));

pub const PREFIX_NAME: &str = "n";
pub const PREFIX_PHONE: &str = "p";
pub const PREFIX_EMAIL: &str = "e";
pub const PREFIX_ADDRESS: &str = "a";
pub const PREFIX_TAG: &str = "t";
pub const PREFIX_PORTRAIT: &str = "pt";
pub const PREFIX_DESCRIPTION: &str = "d";
pub const PREFIX_START: &str = "s";
pub const PREFIX_FINISH: &str = "f";

/// Arguments split by prefix. Repeated prefixes keep every value in order.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ArgumentMultimap {
    preamble: String,
    values: HashMap<&'static str, Vec<String>>,
}

impl ArgumentMultimap {
    pub fn preamble(&self) -> &str {
        &self.preamble
    }

    /// Last value given for `prefix`.
    pub fn value(&self, prefix: &str) -> Option<&str> {
        self.values
            .get(prefix)
            .and_then(|values| values.last())
            .map(String::as_str)
    }

    pub fn all_values(&self, prefix: &str) -> &[String] {
        self.values.get(prefix).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has(&self, prefix: &str) -> bool {
        self.values.contains_key(prefix)
    }
}

/// Splits `args` on the given prefixes. Prefix-like text for prefixes not in
/// `allowed` stays part of the surrounding value.
pub fn tokenize(args: &str, allowed: &[&'static str]) -> ArgumentMultimap {
    let markers: Vec<(usize, usize, &'static str)> = PREFIX_RE
        .captures_iter(args)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let prefix = caps.get(1)?;
            let allowed_prefix = allowed.iter().find(|value| **value == prefix.as_str())?;
            Some((prefix.start(), whole.end(), *allowed_prefix))
        })
        .collect();

    let mut multimap = ArgumentMultimap::default();
    let preamble_end = markers.first().map_or(args.len(), |marker| marker.0);
    multimap.preamble = args[..preamble_end].trim().to_string();

    for (index, (_, value_start, prefix)) in markers.iter().enumerate() {
        let value_end = markers
            .get(index + 1)
            .map_or(args.len(), |next| next.0);
        multimap
            .values
            .entry(*prefix)
            .or_default()
            .push(args[*value_start..value_end].trim().to_string());
    }
    multimap
}
