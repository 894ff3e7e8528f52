//! Komoot Photon geocoder client.
//!
//! Photon is an OSM-backed search engine returning `GeoJSON`. It tolerates
//! typos better than Nominatim, so it serves as the fallback.
//!
//! See <https://photon.komoot.io/>

use serde_json::Value;

use crate::{GeocodeError, GeocodedLocation, GeocodingProvider, USER_AGENT};

/// Geocodes a free-form query, returning the first feature.
///
/// # Errors
///
/// Returns [`GeocodeError`] if the HTTP request or response parsing fails.
pub async fn geocode_freeform(
    client: &reqwest::Client,
    base_url: &str,
    query: &str,
    limit: u32,
) -> Result<Option<GeocodedLocation>, GeocodeError> {
    let limit = limit.to_string();
    let resp = client
        .get(base_url)
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .query(&[("q", query), ("limit", limit.as_str())])
        .send()
        .await?;

    if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(GeocodeError::RateLimited);
    }

    if !resp.status().is_success() {
        return Err(GeocodeError::Parse {
            message: format!("Photon returned status {}", resp.status()),
        });
    }

    let body: Value = resp.json().await?;
    parse_response(&body)
}

/// Parses a Photon `GeoJSON` `FeatureCollection` response.
fn parse_response(body: &Value) -> Result<Option<GeocodedLocation>, GeocodeError> {
    let features = body
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| GeocodeError::Parse {
            message: "Photon response missing 'features' array".to_string(),
        })?;

    let Some(first) = features.first() else {
        return Ok(None);
    };

    let coords = first
        .pointer("/geometry/coordinates")
        .and_then(Value::as_array)
        .ok_or_else(|| GeocodeError::Parse {
            message: "Feature missing geometry.coordinates".to_string(),
        })?;

    if coords.len() < 2 {
        return Err(GeocodeError::Parse {
            message: "coordinates array has fewer than 2 elements".to_string(),
        });
    }

    let lon = coords[0].as_f64().ok_or_else(|| GeocodeError::Parse {
        message: "longitude is not a number".to_string(),
    })?;
    let lat = coords[1].as_f64().ok_or_else(|| GeocodeError::Parse {
        message: "latitude is not a number".to_string(),
    })?;

    Ok(Some(GeocodedLocation {
        lat,
        lon,
        display_name: label(first),
        provider: GeocodingProvider::Photon,
    }))
}

/// Joins the feature's place name parts, e.g. `"Ikeja, Lagos, Nigeria"`.
fn label(feature: &Value) -> Option<String> {
    let props = feature.get("properties")?;
    let parts: Vec<&str> = ["name", "city", "state", "country"]
        .iter()
        .filter_map(|key| props.get(*key).and_then(Value::as_str))
        .filter(|s| !s.is_empty())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}
