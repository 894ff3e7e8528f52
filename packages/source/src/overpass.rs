//! Overpass QL query building and response parsing.

use std::collections::BTreeMap;

use retail_radar_store_models::{GeoPoint, GeometryKind, RawRecord};
use serde_json::Value;

use crate::{SourceError, retry};

/// Public Overpass endpoint used when `OVERPASS_URL` is unset.
pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

/// Search radius used when the caller does not supply one.
pub const DEFAULT_RADIUS_METERS: f64 = 5_000.0;

/// Builds the Overpass QL query selecting shops and marketplaces within
/// `radius_meters` of `center`.
#[must_use]
pub fn build_query(center: GeoPoint, radius_meters: f64) -> String {
    let around = format!("around:{radius_meters},{},{}", center.lat, center.lng);
    format!(
        "[out:json][timeout:25];\n\
         (\n  \
           node[\"shop\"]({around});\n  \
           node[\"amenity\"=\"marketplace\"]({around});\n  \
           way[\"shop\"]({around});\n\
         );\n\
         out center tags;"
    )
}

/// Converts an Overpass JSON response into raw records.
///
/// Nodes use their own `lat`/`lon`; ways and relations use the `center`
/// computed by `out center`. Elements with no usable coordinate are
/// skipped. Ids are `<type>/<id>` so nodes and ways never collide.
///
/// # Errors
///
/// Returns [`SourceError::Parse`] if the response has no `elements` array.
pub fn parse_elements(json: &Value) -> Result<Vec<RawRecord>, SourceError> {
    let elements = json
        .get("elements")
        .and_then(Value::as_array)
        .ok_or_else(|| SourceError::Parse {
            message: "response has no \"elements\" array".to_string(),
        })?;

    let records: Vec<RawRecord> = elements.iter().filter_map(parse_element).collect();

    log::debug!(
        "Parsed {} of {} Overpass elements",
        records.len(),
        elements.len()
    );

    Ok(records)
}

fn parse_element(el: &Value) -> Option<RawRecord> {
    let kind = el.get("type").and_then(Value::as_str).unwrap_or("node");
    let geometry = match kind {
        "way" => GeometryKind::Way,
        "relation" => GeometryKind::Relation,
        _ => GeometryKind::Node,
    };

    let id = el.get("id").map_or_else(String::new, |v| match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    });

    let coords = if geometry.is_areal() {
        el.get("center")
    } else {
        Some(el)
    };
    let lat = coords.and_then(|c| c.get("lat")).and_then(Value::as_f64);
    let lon = coords.and_then(|c| c.get("lon")).and_then(Value::as_f64);

    let (Some(lat), Some(lon)) = (lat, lon) else {
        log::debug!("Skipping {kind}/{id}: no coordinate");
        return None;
    };

    let location = GeoPoint::new(lat, lon);
    if !location.is_valid() {
        log::debug!("Skipping {kind}/{id}: coordinate out of range");
        return None;
    }

    let tags: BTreeMap<String, String> = el
        .get("tags")
        .and_then(Value::as_object)
        .map(|obj| {
            obj.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default();

    Some(RawRecord {
        id: format!("{kind}/{id}"),
        location,
        geometry,
        tags,
    })
}

/// Overpass API client.
#[derive(Debug, Clone)]
pub struct OverpassClient {
    client: reqwest::Client,
    url: String,
}

impl OverpassClient {
    /// Creates a client for the given interpreter endpoint.
    #[must_use]
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Creates a client for `OVERPASS_URL`, or the public endpoint when
    /// unset.
    #[must_use]
    pub fn from_env(client: reqwest::Client) -> Self {
        let url = std::env::var("OVERPASS_URL")
            .ok()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_OVERPASS_URL.to_string());
        Self::new(client, url)
    }

    /// The interpreter endpoint this client posts to.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetches every shop and marketplace within `radius_meters` of
    /// `center`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the request fails, the server answers
    /// with an error status, or the response is malformed.
    pub async fn fetch_stores(
        &self,
        center: GeoPoint,
        radius_meters: f64,
    ) -> Result<Vec<RawRecord>, SourceError> {
        let query = build_query(center, radius_meters);
        log::info!(
            "Fetching stores within {radius_meters} m of ({}, {})",
            center.lat,
            center.lng
        );

        let body =
            retry::send_json(|| self.client.post(&self.url).form(&[("data", query.as_str())]))
                .await?;
        let records = parse_elements(&body)?;

        log::info!("Overpass returned {} stores", records.len());
        Ok(records)
    }
}
