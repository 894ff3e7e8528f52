#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Population reference data keyed by state and local government area.
//!
//! The table is a JSON object of `state -> { lga -> population }`, loaded
//! once at startup and shared read-only. Addresses are matched to a state
//! by case-insensitive substring, which is enough to give the insight
//! prompt some demographic context.
//!
//! A table for the Nigerian states the service targets is embedded from
//! `data/population.json`; deployments can point at a different file.

use std::collections::BTreeMap;
use std::path::Path;

use thiserror::Error;

const BUNDLED_JSON: &str = include_str!("../data/population.json");

/// Errors from loading a population table.
#[derive(Debug, Error)]
pub enum PopulationError {
    /// Reading the data file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The data file is not a `state -> { lga -> population }` object.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Immutable state/LGA population lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopulationTable {
    states: BTreeMap<String, BTreeMap<String, u64>>,
}

impl PopulationTable {
    /// The embedded table from `data/population.json`.
    ///
    /// # Panics
    ///
    /// Panics if the embedded JSON is malformed (checked by the tests).
    #[must_use]
    pub fn bundled() -> Self {
        Self::from_json_str(BUNDLED_JSON)
            .unwrap_or_else(|e| panic!("Failed to parse embedded population data: {e}"))
    }

    /// Reads and parses a population file.
    ///
    /// # Errors
    ///
    /// * [`PopulationError::Io`] if the file cannot be read
    /// * [`PopulationError::Json`] if its contents are malformed
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PopulationError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let table = Self::from_json_str(&contents)?;
        log::info!(
            "Loaded population data for {} states from {}",
            table.states.len(),
            path.display()
        );
        Ok(table)
    }

    /// Parses a population table from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`PopulationError::Json`] if `s` is not a
    /// `state -> { lga -> population }` object.
    pub fn from_json_str(s: &str) -> Result<Self, PopulationError> {
        Ok(Self {
            states: serde_json::from_str(s)?,
        })
    }

    /// Number of states in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether the table has no states.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Finds the state whose name appears in `address`.
    ///
    /// Matching is case-insensitive. When several names match, the longest
    /// wins and ties go to the alphabetically first name.
    #[must_use]
    pub fn match_address(&self, address: &str) -> Option<&str> {
        let address = address.to_lowercase();

        // Keys iterate alphabetically; keep the first of equal-length names.
        self.states
            .keys()
            .filter(|state| !state.is_empty() && address.contains(&state.to_lowercase()))
            .fold(None, |best: Option<&String>, state| match best {
                Some(b) if b.len() >= state.len() => Some(b),
                _ => Some(state),
            })
            .map(String::as_str)
    }

    /// Population of one LGA, if both the state and LGA are known.
    #[must_use]
    pub fn population(&self, state: &str, lga: &str) -> Option<u64> {
        self.states.get(state)?.get(lga).copied()
    }

    /// LGA populations of one state.
    #[must_use]
    pub fn lgas(&self, state: &str) -> Option<&BTreeMap<String, u64>> {
        self.states.get(state)
    }

    /// Renders the prompt line describing the state matched by `address`.
    ///
    /// Returns `None` when no state matches.
    #[must_use]
    pub fn context_for(&self, address: &str) -> Option<String> {
        let state = self.match_address(address)?;
        let lgas = self.states.get(state)?;
        let json = serde_json::to_string(lgas).ok()?;
        Some(format!("Population data for {state}: {json}"))
    }
}
