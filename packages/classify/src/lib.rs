#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Store classification.
//!
//! Maps a [`RawRecord`] with an arbitrary tag bag to a [`StoreRecord`] with
//! a normalized category and a heuristic [`SizeTier`]. Every source names
//! its tags differently, so classification is keyword driven and always
//! succeeds with best-effort defaults.
//!
//! The keyword tables live in `rules/default.toml`, embedded at compile
//! time. Callers can supply their own table through
//! [`ClassifierRules::from_toml_str`].

use std::sync::LazyLock;

use retail_radar_store_models::{RawRecord, SizeTier, StoreRecord};
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_RULES_TOML: &str = include_str!("../rules/default.toml");

static DEFAULT_RULES: LazyLock<ClassifierRules> = LazyLock::new(ClassifierRules::default);

/// Errors from loading classification rules.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// The rules document is not valid TOML or is missing fields.
    #[error("Invalid classifier rules: {0}")]
    Rules(#[from] toml::de::Error),
}

/// Keyword tables driving [`ClassifierRules::classify`].
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierRules {
    /// Category used when none of `category_keys` is present.
    pub fallback_category: String,
    /// Display name used when none of `name_keys` is present.
    pub unnamed_placeholder: String,
    /// Tag keys holding the display name, in priority order.
    pub name_keys: Vec<String>,
    /// Tag keys holding the category, in priority order.
    pub category_keys: Vec<String>,
    /// Keywords that mark a store as [`SizeTier::Large`].
    pub large_keywords: Vec<String>,
    /// Keywords that mark a store as [`SizeTier::Medium`].
    pub medium_keywords: Vec<String>,
    /// Raise areal geometries (ways, relations) to at least medium.
    #[serde(default = "default_true")]
    pub areal_upgrade: bool,
}

const fn default_true() -> bool {
    true
}

impl Default for ClassifierRules {
    /// Loads the embedded default rule table.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed (checked by the tests).
    fn default() -> Self {
        Self::from_toml_str(DEFAULT_RULES_TOML)
            .unwrap_or_else(|e| panic!("Failed to parse embedded classifier rules: {e}"))
    }
}

impl ClassifierRules {
    /// Parses a rules document, lowercasing every keyword.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError::Rules`] if the document is not valid TOML
    /// or lacks a required field.
    pub fn from_toml_str(s: &str) -> Result<Self, ClassifyError> {
        let mut rules: Self = toml::de::from_str(s)?;
        for kw in rules
            .large_keywords
            .iter_mut()
            .chain(rules.medium_keywords.iter_mut())
        {
            *kw = kw.to_lowercase();
        }
        Ok(rules)
    }

    /// Classifies one raw record.
    #[must_use]
    pub fn classify(&self, raw: &RawRecord) -> StoreRecord {
        let name = first_present(raw, &self.name_keys)
            .map_or_else(|| self.unnamed_placeholder.clone(), str::to_string);

        let category = first_present(raw, &self.category_keys)
            .map_or_else(|| self.fallback_category.clone(), str::to_lowercase);

        let mut size_tier = self.size_from_tags(raw);
        if self.areal_upgrade && raw.geometry.is_areal() && size_tier == SizeTier::Small {
            size_tier = SizeTier::Medium;
        }

        StoreRecord {
            id: raw.id.clone(),
            name,
            location: raw.location,
            category,
            size_tier,
        }
    }

    /// Classifies a batch of records, preserving order.
    #[must_use]
    pub fn classify_all(&self, raws: &[RawRecord]) -> Vec<StoreRecord> {
        let stores: Vec<StoreRecord> = raws.iter().map(|r| self.classify(r)).collect();
        log::debug!("Classified {} stores", stores.len());
        stores
    }

    fn size_from_tags(&self, raw: &RawRecord) -> SizeTier {
        let all_values = raw
            .tags
            .values()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        if contains_any(&all_values, &self.large_keywords) {
            SizeTier::Large
        } else if contains_any(&all_values, &self.medium_keywords) {
            SizeTier::Medium
        } else {
            SizeTier::Small
        }
    }
}

/// Classifies a record with the embedded default rules.
#[must_use]
pub fn classify(raw: &RawRecord) -> StoreRecord {
    DEFAULT_RULES.classify(raw)
}

/// Returns the first tag among `keys` with a non-blank value.
fn first_present<'a>(raw: &'a RawRecord, keys: &[String]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| raw.tags.get(k))
        .map(|v| v.trim())
        .find(|v| !v.is_empty())
}

/// Checks if `haystack` contains any of the given `needles`.
fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle.as_str()))
}
