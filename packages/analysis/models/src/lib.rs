#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Cluster summary types and analysis parameters.
//!
//! [`ClusterSummary`] is the output contract of the analysis pipeline: it
//! feeds the map front-end directly, and its compact [`ClusterBrief`]
//! projection is what the AI summarization service sees.

use std::collections::BTreeMap;

use retail_radar_store_models::{GeoPoint, SizeTier};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Default DBSCAN neighborhood radius in meters.
pub const DEFAULT_EPS_METERS: f64 = 500.0;

/// Default DBSCAN minimum points per dense neighborhood.
pub const DEFAULT_MIN_PTS: usize = 3;

/// Smallest radius reported for a cluster, in meters.
pub const MIN_RADIUS_METERS: f64 = 100.0;

/// Smallest area used when computing density, in square kilometers.
pub const MIN_AREA_KM2: f64 = 0.0001;

/// How neighborhood queries are answered during clustering.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NeighborSearchKind {
    /// Full O(n²) scan.
    #[default]
    BruteForce,
    /// R-tree candidate pruning. Same results, faster on large inputs.
    Rtree,
}

/// Parameters for one analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisParams {
    /// Neighborhood radius in meters.
    #[serde(default = "default_eps")]
    pub eps_meters: f64,
    /// Minimum points (including the point itself) for a core point.
    #[serde(default = "default_min_pts")]
    pub min_pts: usize,
    /// Neighborhood query strategy.
    #[serde(default)]
    pub neighbor_search: NeighborSearchKind,
}

const fn default_eps() -> f64 {
    DEFAULT_EPS_METERS
}

const fn default_min_pts() -> usize {
    DEFAULT_MIN_PTS
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            eps_meters: DEFAULT_EPS_METERS,
            min_pts: DEFAULT_MIN_PTS,
            neighbor_search: NeighborSearchKind::BruteForce,
        }
    }
}

/// Descriptive statistics for one cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSummary {
    /// 1-based ordinal in cluster discovery order.
    pub id: usize,
    /// Arithmetic mean of member coordinates.
    pub centroid: GeoPoint,
    /// Largest centroid-to-member distance, never below
    /// [`MIN_RADIUS_METERS`].
    pub radius_meters: f64,
    /// Number of member stores.
    pub store_count: usize,
    /// Stores per square kilometer of the cluster circle.
    pub density_per_km2: f64,
    /// `density_per_km2 × 10`, capped at 100 and rounded.
    pub density_score: u8,
    /// Member count per category.
    pub type_histogram: BTreeMap<String, usize>,
    /// Member count per size tier.
    pub size_histogram: BTreeMap<SizeTier, usize>,
    /// Member store ids in input order.
    pub member_ids: Vec<String>,
}

impl ClusterSummary {
    /// Compact projection sent to the summarization service.
    #[must_use]
    pub fn brief(&self) -> ClusterBrief {
        ClusterBrief {
            id: self.id,
            centroid: self.centroid,
            store_count: self.store_count,
            types: self.type_histogram.clone(),
            sizes: self.size_histogram.clone(),
        }
    }
}

/// The subset of a [`ClusterSummary`] the AI summarization service needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterBrief {
    /// Cluster ordinal.
    pub id: usize,
    /// Cluster centroid.
    pub centroid: GeoPoint,
    /// Number of member stores.
    pub store_count: usize,
    /// Member count per category.
    pub types: BTreeMap<String, usize>,
    /// Member count per size tier.
    pub sizes: BTreeMap<SizeTier, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_fill_defaults() {
        let params: AnalysisParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params, AnalysisParams::default());

        let params: AnalysisParams =
            serde_json::from_str(r#"{"epsMeters":250,"neighborSearch":"rtree"}"#).unwrap();
        assert!((params.eps_meters - 250.0).abs() < f64::EPSILON);
        assert_eq!(params.min_pts, DEFAULT_MIN_PTS);
        assert_eq!(params.neighbor_search, NeighborSearchKind::Rtree);
    }

    #[test]
    fn brief_serializes_histograms_by_name() {
        let brief = ClusterBrief {
            id: 1,
            centroid: GeoPoint::new(6.5, 3.3),
            store_count: 3,
            types: BTreeMap::from([("bakery".to_string(), 3)]),
            sizes: BTreeMap::from([(SizeTier::Medium, 3)]),
        };
        let json = serde_json::to_value(&brief).unwrap();
        assert_eq!(json["storeCount"], 3);
        assert_eq!(json["types"]["bakery"], 3);
        assert_eq!(json["sizes"]["medium"], 3);
    }
}
