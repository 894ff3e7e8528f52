//! Compile-time registry of geocoding service configurations.
//!
//! Each geocoding provider is defined in a TOML file under `services/`.
//! The registry embeds these at compile time and exposes them via
//! [`all_services`] and [`enabled_services`].

use serde::Deserialize;

/// A geocoding service configuration loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingService {
    /// Unique identifier (e.g., `"nominatim"`, `"photon"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Whether this service is active in the geocoding pipeline.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Execution order, lower values run first.
    pub priority: u32,
    /// Provider-specific configuration.
    pub provider: ProviderConfig,
}

/// Provider-specific configuration, tagged by `type` in TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Nominatim / `OpenStreetMap` search.
    Nominatim {
        /// Search endpoint (e.g., `"https://nominatim.openstreetmap.org/search"`).
        base_url: String,
        /// Comma-separated ISO country codes to restrict results to.
        #[serde(default)]
        country_codes: Option<String>,
        /// Terms searched for in `display_name`, in order of preference.
        #[serde(default)]
        preferred_terms: Vec<String>,
        /// Maximum results requested.
        #[serde(default = "default_limit")]
        limit: u32,
    },
    /// Komoot Photon search.
    Photon {
        /// Search endpoint (e.g., `"https://photon.komoot.io/api/"`).
        base_url: String,
        /// Maximum results requested.
        #[serde(default = "default_limit")]
        limit: u32,
    },
}

const fn default_true() -> bool {
    true
}

const fn default_limit() -> u32 {
    5
}

impl GeocodingService {
    /// Returns the provider's base URL regardless of variant.
    #[must_use]
    pub fn base_url(&self) -> &str {
        match &self.provider {
            ProviderConfig::Nominatim { base_url, .. }
            | ProviderConfig::Photon { base_url, .. } => base_url,
        }
    }
}

// ── Compile-time embedded TOML files ────────────────────────────────

const SERVICE_TOMLS: &[(&str, &str)] = &[
    ("nominatim", include_str!("../services/nominatim.toml")),
    ("photon", include_str!("../services/photon.toml")),
];

#[cfg(test)]
const EXPECTED_SERVICE_COUNT: usize = 2;

/// Returns all geocoding service configurations (enabled and disabled).
///
/// # Panics
///
/// Panics if any embedded TOML config is malformed.
#[must_use]
pub fn all_services() -> Vec<GeocodingService> {
    SERVICE_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse geocoding service '{name}': {e}"))
        })
        .collect()
}

/// Returns only enabled services, sorted by priority (ascending).
#[must_use]
pub fn enabled_services() -> Vec<GeocodingService> {
    let mut services: Vec<GeocodingService> =
        all_services().into_iter().filter(|s| s.enabled).collect();
    services.sort_by_key(|s| s.priority);
    services
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn loads_all_services() {
        assert_eq!(all_services().len(), EXPECTED_SERVICE_COUNT);
    }

    #[test]
    fn service_ids_are_unique() {
        let mut seen = BTreeSet::new();
        for svc in &all_services() {
            assert!(seen.insert(svc.id.clone()), "Duplicate service ID: {}", svc.id);
        }
    }

    #[test]
    fn all_services_have_required_fields() {
        for svc in &all_services() {
            assert!(!svc.id.is_empty(), "Service has empty id");
            assert!(!svc.name.is_empty(), "Service {} has empty name", svc.id);
            assert!(!svc.base_url().is_empty(), "Service {} has empty base_url", svc.id);
        }
    }

    #[test]
    fn nominatim_runs_before_photon() {
        let ids: Vec<String> = enabled_services().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, ["nominatim", "photon"]);
    }

    #[test]
    fn nominatim_prefers_lagos_then_nigeria() {
        let svc = all_services()
            .into_iter()
            .find(|s| s.id == "nominatim")
            .unwrap();
        let ProviderConfig::Nominatim {
            preferred_terms,
            country_codes,
            limit,
            ..
        } = svc.provider
        else {
            panic!("nominatim service has wrong provider type");
        };
        assert_eq!(preferred_terms, ["Lagos", "Nigeria"]);
        assert_eq!(country_codes.as_deref(), Some("ng"));
        assert_eq!(limit, 5);
    }

    #[test]
    fn missing_limit_uses_default() {
        let svc: GeocodingService = toml::de::from_str(
            r#"
            id = "p"
            name = "P"
            priority = 1
            [provider]
            type = "photon"
            base_url = "http://localhost:2322/api"
            "#,
        )
        .unwrap();
        assert!(svc.enabled);
        assert!(matches!(svc.provider, ProviderConfig::Photon { limit: 5, .. }));
    }
}
