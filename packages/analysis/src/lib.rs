#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Store clustering pipeline.
//!
//! [`analyze`] composes the three core stages over a batch of raw
//! point-of-interest records:
//!
//! 1. classification ([`retail_radar_classify`]),
//! 2. DBSCAN clustering ([`retail_radar_cluster`]),
//! 3. per-cluster summarization ([`summary::summarize`]).
//!
//! Everything here is synchronous and owns its inputs; concurrent callers
//! each run their own pipeline.

pub mod map;
pub mod summary;

use retail_radar_analysis_models::{AnalysisParams, ClusterSummary, NeighborSearchKind};
use retail_radar_classify::ClassifierRules;
use retail_radar_cluster::{ClusterAssignment, ClusterError};
use retail_radar_store_models::{GeoPoint, RawRecord, StoreRecord};
use serde::Serialize;
use thiserror::Error;

pub use summary::summarize;

/// Errors that can occur during an analysis run.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Clustering parameters were rejected.
    #[error(transparent)]
    Cluster(#[from] ClusterError),
    /// A record's coordinate is not finite or lies outside the WGS-84 range.
    #[error("Record {id} has an invalid location ({lat}, {lng})")]
    InvalidLocation {
        /// Offending record id.
        id: String,
        /// Latitude as given.
        lat: f64,
        /// Longitude as given.
        lng: f64,
    },
}

/// Everything one analysis run produced.
///
/// Unlike the bare summary list this keeps the classified stores and the
/// raw assignment, so callers can show noise points.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    /// Classified stores, in input order.
    pub stores: Vec<StoreRecord>,
    /// Cluster/noise partition over `stores` indices.
    pub assignment: ClusterAssignment,
    /// One summary per cluster, in discovery order.
    pub summaries: Vec<ClusterSummary>,
}

impl AnalysisReport {
    /// Ids of stores that belong to no cluster.
    #[must_use]
    pub fn noise_ids(&self) -> Vec<&str> {
        self.assignment
            .noise
            .iter()
            .map(|&i| self.stores[i].id.as_str())
            .collect()
    }
}

/// Classifies, clusters, and summarizes `records` with the default
/// classifier rules.
///
/// # Errors
///
/// Returns [`AnalysisError::Cluster`] if `params` are out of range, or
/// [`AnalysisError::InvalidLocation`] if a record's coordinate is invalid.
pub fn analyze(
    records: &[RawRecord],
    params: &AnalysisParams,
) -> Result<Vec<ClusterSummary>, AnalysisError> {
    Ok(analyze_report(records, params, &ClassifierRules::default())?.summaries)
}

/// Runs the full pipeline and keeps every intermediate result.
///
/// # Errors
///
/// Returns [`AnalysisError::Cluster`] if `params` are out of range, or
/// [`AnalysisError::InvalidLocation`] for the first record whose
/// coordinate is invalid. Nothing is computed in either case.
pub fn analyze_report(
    records: &[RawRecord],
    params: &AnalysisParams,
    rules: &ClassifierRules,
) -> Result<AnalysisReport, AnalysisError> {
    retail_radar_cluster::validate_params(params.eps_meters, params.min_pts)?;

    if let Some(bad) = records.iter().find(|r| !r.location.is_valid()) {
        return Err(AnalysisError::InvalidLocation {
            id: bad.id.clone(),
            lat: bad.location.lat,
            lng: bad.location.lng,
        });
    }

    let stores = rules.classify_all(records);
    let points: Vec<GeoPoint> = stores.iter().map(|s| s.location).collect();

    let assignment = match params.neighbor_search {
        NeighborSearchKind::BruteForce => {
            retail_radar_cluster::cluster(&points, params.eps_meters, params.min_pts)?
        }
        NeighborSearchKind::Rtree => {
            retail_radar_cluster::cluster_indexed(&points, params.eps_meters, params.min_pts)?
        }
    };

    let summaries = summarize(&stores, &assignment);

    log::info!(
        "Analyzed {} stores: {} clusters, {} noise",
        stores.len(),
        summaries.len(),
        assignment.noise.len()
    );

    Ok(AnalysisReport {
        stores,
        assignment,
        summaries,
    })
}
