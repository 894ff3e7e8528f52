#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Address geocoding for the retail radar scan.
//!
//! Turns a free-form address into a coordinate using a multi-provider
//! strategy configured via TOML files in `services/`:
//!
//! 1. **Nominatim / OpenStreetMap** (priority 1): prefers results that
//!    mention the configured region terms.
//! 2. **Photon** (priority 2): fallback when Nominatim fails or finds
//!    nothing.
//!
//! Providers are loaded from the [`service_registry`] and executed in
//! priority order.

pub mod nominatim;
pub mod photon;
pub mod service_registry;

use serde::Serialize;
use strum_macros::{AsRefStr, Display};
use thiserror::Error;

use crate::service_registry::{GeocodingService, ProviderConfig};

/// `User-Agent` sent to public geocoders, which reject anonymous clients.
pub const USER_AGENT: &str = concat!("retail-radar/", env!("CARGO_PKG_VERSION"));

/// A geocoding result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodedLocation {
    /// Latitude (WGS84).
    pub lat: f64,
    /// Longitude (WGS84).
    pub lon: f64,
    /// Place name returned by the provider.
    pub display_name: Option<String>,
    /// Which provider resolved the query.
    pub provider: GeocodingProvider,
}

/// Which geocoding provider resolved a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GeocodingProvider {
    /// Nominatim / `OpenStreetMap`.
    Nominatim,
    /// Komoot Photon.
    Photon,
}

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,
}

/// Runs the configured geocoding services in priority order.
#[derive(Debug, Clone)]
pub struct Geocoder {
    client: reqwest::Client,
    services: Vec<GeocodingService>,
}

impl Geocoder {
    /// Creates a geocoder over every enabled embedded service.
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_services(client, service_registry::enabled_services())
    }

    /// Creates a geocoder over an explicit service list, run in the given
    /// order.
    #[must_use]
    pub const fn with_services(client: reqwest::Client, services: Vec<GeocodingService>) -> Self {
        Self { client, services }
    }

    /// The services this geocoder consults, in order.
    #[must_use]
    pub fn services(&self) -> &[GeocodingService] {
        &self.services
    }

    /// Geocodes a free-form address.
    ///
    /// A failing provider is logged and the next one is tried. Returns
    /// `Ok(None)` when every provider answered but none found the address.
    ///
    /// # Errors
    ///
    /// Returns the last provider's [`GeocodeError`] if every provider
    /// failed.
    pub async fn geocode(&self, query: &str) -> Result<Option<GeocodedLocation>, GeocodeError> {
        let mut last_error = None;
        let mut any_answered = false;

        for service in &self.services {
            log::debug!("Geocoding '{query}' with {}", service.name);

            match self.geocode_with(service, query).await {
                Ok(Some(location)) => {
                    log::info!(
                        "Geocoded '{query}' to ({}, {}) via {}",
                        location.lat,
                        location.lon,
                        service.id
                    );
                    return Ok(Some(location));
                }
                Ok(None) => {
                    any_answered = true;
                    log::debug!("{} found no match for '{query}'", service.name);
                }
                Err(e) => {
                    log::warn!("{} failed for '{query}': {e}", service.name);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if !any_answered => Err(e),
            _ => Ok(None),
        }
    }

    async fn geocode_with(
        &self,
        service: &GeocodingService,
        query: &str,
    ) -> Result<Option<GeocodedLocation>, GeocodeError> {
        match &service.provider {
            ProviderConfig::Nominatim {
                base_url,
                country_codes,
                preferred_terms,
                limit,
            } => {
                nominatim::geocode_freeform(
                    &self.client,
                    base_url,
                    query,
                    country_codes.as_deref(),
                    preferred_terms,
                    *limit,
                )
                .await
            }
            ProviderConfig::Photon { base_url, limit } => {
                photon::geocode_freeform(&self.client, base_url, query, *limit).await
            }
        }
    }
}
