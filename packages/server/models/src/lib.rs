#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the retail radar server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the pipeline types so the API contract can evolve independently.

use retail_radar_analysis_models::{ClusterBrief, ClusterSummary, NeighborSearchKind};
use retail_radar_store_models::{GeoPoint, RawRecord, StoreRecord};
use serde::{Deserialize, Serialize};

/// `GET /api/health` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Always `true` when the server answers.
    pub healthy: bool,
    /// Server crate version.
    pub version: String,
}

/// Error body returned with every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Short description of what failed.
    pub error: String,
    /// Underlying error message, when there is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Error without details.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    /// Error with the underlying cause attached.
    #[must_use]
    pub fn with_details(error: impl Into<String>, details: impl ToString) -> Self {
        Self {
            error: error.into(),
            details: Some(details.to_string()),
        }
    }
}

/// Query parameters for `GET /api/geocode`.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeParams {
    /// Free-form address.
    pub q: Option<String>,
}

/// `GET /api/geocode` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGeocode {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lon: f64,
    /// Place name returned by the provider.
    pub display_name: Option<String>,
    /// Provider that resolved the address.
    pub provider: String,
}

/// Clustering parameters shared by the clustering endpoints. Missing
/// values fall back to the pipeline defaults.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterParams {
    /// Neighborhood radius in meters.
    pub eps: Option<f64>,
    /// Minimum points per dense neighborhood.
    pub min_pts: Option<usize>,
    /// Neighborhood query strategy.
    pub neighbor_search: Option<NeighborSearchKind>,
}

/// `POST /api/clusters` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClustersRequest {
    /// Records to classify and cluster.
    pub records: Vec<RawRecord>,
    /// Clustering parameters.
    #[serde(flatten)]
    pub params: ClusterParams,
}

/// `POST /api/clusters` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClustersResponse {
    /// One summary per cluster, in discovery order.
    pub clusters: Vec<ClusterSummary>,
    /// Ids of records that belong to no cluster.
    pub noise: Vec<String>,
}

/// `POST /api/scan` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    /// Address to center the scan on.
    pub address: String,
    /// Search radius in meters.
    pub radius_meters: Option<f64>,
    /// Clustering parameters.
    #[serde(flatten)]
    pub params: ClusterParams,
}

/// `POST /api/scan` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    /// Geocoded scan center.
    pub center: GeoPoint,
    /// Every classified store found.
    pub stores: Vec<StoreRecord>,
    /// One summary per cluster, in discovery order.
    pub clusters: Vec<ClusterSummary>,
    /// Ids of stores that belong to no cluster.
    pub noise: Vec<String>,
}

/// Location block of an analyze request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeLocation {
    /// Address the clusters were computed around.
    pub address: String,
    /// Scan center, if known.
    pub center: Option<GeoPoint>,
    /// Scan radius, if known.
    pub radius_meters: Option<f64>,
}

/// `POST /api/analyze` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    /// Where the clusters are.
    pub location: Option<AnalyzeLocation>,
    /// Cluster briefs to describe.
    pub clusters: Option<Vec<ClusterBrief>>,
}

/// One headed section of an insight.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiInsightSection {
    /// Section heading, `None` for a preamble.
    pub heading: Option<String>,
    /// Section text.
    pub body: String,
}

/// `POST /api/analyze` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    /// Raw model reply.
    pub insight: String,
    /// The reply split into headed sections.
    pub sections: Vec<ApiInsightSection>,
}
