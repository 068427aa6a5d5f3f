//! Fingerprints
//!
//! A fingerprint is the natural key of a cart line: a SHA-256 digest over the
//! menu item id and its normalized option selections. Two selections that
//! differ only in the order they were entered produce the same fingerprint, so
//! adding the same configuration twice merges into one line.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::{Display, Formatter, Result as FmtResult},
};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::menu::SelectedOption;

/// Hex-encoded SHA-256 content fingerprint of a configured menu item.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap an existing fingerprint string, e.g. one received from a caller.
    #[must_use]
    pub fn from_string(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the fingerprint is empty, which only happens for malformed input.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for Fingerprint {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Serialize)]
struct CanonicalSelection<'a> {
    menu_item_id: &'a str,
    options: Vec<CanonicalOption<'a>>,
}

#[derive(Serialize)]
struct CanonicalOption<'a> {
    option_id: &'a str,
    choice_ids: Vec<&'a str>,
}

/// Derive the fingerprint of a menu item configured with `selected` options.
///
/// Choice ids are sorted and de-duplicated, options are sorted by id, repeated
/// option ids are merged, and options with no choices are dropped before the
/// canonical form is hashed.
pub fn fingerprint(menu_item_id: &str, selected: &[SelectedOption]) -> Fingerprint {
    let canonical = CanonicalSelection {
        menu_item_id,
        options: normalize(selected)
            .into_iter()
            .map(|(option_id, choices)| CanonicalOption {
                option_id,
                choice_ids: choices.into_iter().collect(),
            })
            .collect(),
    };

    // Serializing borrowed strings and vectors cannot fail.
    let encoded = serde_json::to_vec(&canonical).unwrap_or_default();

    Fingerprint(format!("{:x}", Sha256::digest(&encoded)))
}

/// Selections as the set the fingerprint sees: options keyed by id, each with
/// its distinct choice ids. Options without choices are left out.
pub(crate) fn normalize(selected: &[SelectedOption]) -> BTreeMap<&str, BTreeSet<&str>> {
    let mut normalized: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();

    for option in selected {
        normalized
            .entry(option.option_id.as_str())
            .or_default()
            .extend(option.choice_ids.iter().map(String::as_str));
    }

    normalized.retain(|_, choices| !choices.is_empty());
    normalized
}
