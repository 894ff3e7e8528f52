//! Nominatim / OpenStreetMap geocoder client.
//!
//! The public instance allows one request per second and requires a
//! descriptive `User-Agent`.
//!
//! See <https://nominatim.org/release-docs/develop/api/Search/>

use crate::{GeocodeError, GeocodedLocation, GeocodingProvider, USER_AGENT};

/// Geocodes a free-form query, preferring results that mention one of
/// `preferred_terms`.
///
/// # Errors
///
/// Returns [`GeocodeError`] if the HTTP request or response parsing fails.
pub async fn geocode_freeform(
    client: &reqwest::Client,
    base_url: &str,
    query: &str,
    country_codes: Option<&str>,
    preferred_terms: &[String],
    limit: u32,
) -> Result<Option<GeocodedLocation>, GeocodeError> {
    let limit = limit.to_string();
    let mut params = vec![("q", query), ("format", "json"), ("limit", limit.as_str())];
    if let Some(codes) = country_codes {
        params.push(("countrycodes", codes));
    }

    let resp = client
        .get(base_url)
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .query(&params)
        .send()
        .await?;

    if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(GeocodeError::RateLimited);
    }

    if !resp.status().is_success() {
        return Err(GeocodeError::Parse {
            message: format!("Nominatim returned status {}", resp.status()),
        });
    }

    let body: serde_json::Value = resp.json().await?;
    parse_response(&body, preferred_terms)
}

/// Parses a Nominatim JSON response.
///
/// Picks the first result whose `display_name` contains the first
/// preferred term, then the second, and so on, falling back to the first
/// result.
fn parse_response(
    body: &serde_json::Value,
    preferred_terms: &[String],
) -> Result<Option<GeocodedLocation>, GeocodeError> {
    let results = body.as_array().ok_or_else(|| GeocodeError::Parse {
        message: "Nominatim response is not an array".to_string(),
    })?;

    let chosen = preferred_terms
        .iter()
        .find_map(|term| {
            results
                .iter()
                .find(|r| display_name(r).contains(term.as_str()))
        })
        .or_else(|| results.first());

    let Some(chosen) = chosen else {
        return Ok(None);
    };

    let lat = parse_coordinate(&chosen["lat"]).ok_or_else(|| GeocodeError::Parse {
        message: "Missing lat in Nominatim response".to_string(),
    })?;

    let lon = parse_coordinate(&chosen["lon"]).ok_or_else(|| GeocodeError::Parse {
        message: "Missing lon in Nominatim response".to_string(),
    })?;

    Ok(Some(GeocodedLocation {
        lat,
        lon,
        display_name: chosen["display_name"].as_str().map(String::from),
        provider: GeocodingProvider::Nominatim,
    }))
}

fn display_name(result: &serde_json::Value) -> &str {
    result["display_name"].as_str().unwrap_or_default()
}

/// Nominatim returns coordinates as strings; accept numbers too.
fn parse_coordinate(v: &serde_json::Value) -> Option<f64> {
    v.as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .or_else(|| v.as_f64())
}
