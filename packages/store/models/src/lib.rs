#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Point-of-interest record types shared across the retail radar system.
//!
//! Raw records arrive from the point-of-interest source as a coordinate plus
//! a free-form tag bag. The classifier turns each one into a [`StoreRecord`]
//! with a normalized category and a coarse [`SizeTier`], which is what the
//! clustering and summarization stages operate on.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A geographic coordinate in decimal degrees (WGS-84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl GeoPoint {
    /// Creates a point from a latitude/longitude pair.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether both components are finite and inside the valid WGS-84 range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// The geometry a raw record was sourced from.
///
/// Areal geometries (ways, relations) are reduced to a center point before
/// they reach the classifier, but the classifier still uses the original
/// kind as a size hint.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GeometryKind {
    /// A single tagged point.
    #[default]
    Node,
    /// A closed or open way (usually a building footprint).
    Way,
    /// A multipolygon or other relation.
    Relation,
}

impl GeometryKind {
    /// Whether this geometry describes an area rather than a point.
    #[must_use]
    pub const fn is_areal(self) -> bool {
        matches!(self, Self::Way | Self::Relation)
    }
}

/// A point of interest exactly as the upstream source described it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Source identifier, unique within one analysis run.
    pub id: String,
    /// Resolved location of the record.
    pub location: GeoPoint,
    /// Source geometry kind.
    #[serde(default)]
    pub geometry: GeometryKind,
    /// Heterogeneous key/value tags (e.g. `shop=bakery`, `name=...`).
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl RawRecord {
    /// Creates a point record with an empty tag bag.
    #[must_use]
    pub fn new(id: impl Into<String>, location: GeoPoint) -> Self {
        Self {
            id: id.into(),
            location,
            geometry: GeometryKind::Node,
            tags: BTreeMap::new(),
        }
    }

    /// Adds a tag, returning the record for chaining.
    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Sets the geometry kind, returning the record for chaining.
    #[must_use]
    pub const fn with_geometry(mut self, geometry: GeometryKind) -> Self {
        self.geometry = geometry;
        self
    }
}

/// Coarse store size tier derived from tag keywords.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SizeTier {
    /// Kiosks, small shops, and anything unrecognized.
    Small,
    /// Groceries, pharmacies, bakeries and similar.
    Medium,
    /// Supermarkets, department stores, malls.
    Large,
}

impl SizeTier {
    /// Intensity weight used when the store is drawn on a heatmap.
    #[must_use]
    pub const fn heat_weight(self) -> f64 {
        match self {
            Self::Small => 0.4,
            Self::Medium => 0.7,
            Self::Large => 1.0,
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Small, Self::Medium, Self::Large]
    }
}

/// A classified point of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreRecord {
    /// Source identifier, unique within one analysis run.
    pub id: String,
    /// Display name (`"Unnamed"` when the source had none).
    pub name: String,
    /// Store location.
    pub location: GeoPoint,
    /// Normalized category (e.g. `"supermarket"`, `"bakery"`).
    pub category: String,
    /// Heuristic size tier.
    pub size_tier: SizeTier,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_tier_string_forms() {
        for tier in SizeTier::all() {
            let parsed: SizeTier = tier.to_string().parse().unwrap();
            assert_eq!(parsed, *tier);
        }
        assert_eq!(SizeTier::Large.as_ref(), "large");
    }

    #[test]
    fn heat_weight_increases_with_tier() {
        assert!(SizeTier::Small.heat_weight() < SizeTier::Medium.heat_weight());
        assert!(SizeTier::Medium.heat_weight() < SizeTier::Large.heat_weight());
    }

    #[test]
    fn raw_record_defaults_geometry_and_tags() {
        let raw: RawRecord = serde_json::from_str(
            r#"{"id":"n1","location":{"lat":6.5,"lng":3.3}}"#,
        )
        .unwrap();
        assert_eq!(raw.geometry, GeometryKind::Node);
        assert!(raw.tags.is_empty());
    }

    #[test]
    fn geo_point_validity() {
        assert!(GeoPoint::new(6.5244, 3.3792).is_valid());
        assert!(!GeoPoint::new(91.0, 0.0).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    }
}
