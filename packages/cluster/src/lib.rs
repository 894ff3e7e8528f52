#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! DBSCAN density clustering over store coordinates.
//!
//! A point is *core* when at least `min_pts` points (itself included) lie
//! within `eps` meters of it. Clusters grow from unvisited core points by
//! density-reachability; everything unreachable is noise. Points are
//! visited in input order, so a border point reachable from two clusters
//! always lands in the one discovered first.
//!
//! Distances are great-circle meters from [`retail_radar_spatial`]. The
//! neighborhood query is pluggable through [`NeighborSearch`]; the
//! brute-force and R-tree searches produce identical assignments.

use std::collections::VecDeque;

use retail_radar_spatial::{BruteForce, NeighborIndex, NeighborSearch};
use retail_radar_store_models::GeoPoint;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from cluster parameter validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClusterError {
    /// A clustering parameter is out of range.
    #[error("Invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

/// Partition of input indices into clusters and noise.
///
/// Every index in `0..len()` appears exactly once, either in one cluster
/// or in `noise`. Clusters are in discovery order; indices inside each
/// cluster and inside `noise` are ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterAssignment {
    /// Member indices of each cluster.
    pub clusters: Vec<Vec<usize>>,
    /// Indices not density-reachable from any core point.
    pub noise: Vec<usize>,
}

impl ClusterAssignment {
    /// Number of clusters found.
    #[must_use]
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    /// Total number of points partitioned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.noise.len() + self.clusters.iter().map(Vec::len).sum::<usize>()
    }

    /// Whether no points were partitioned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Per-point cluster position (`None` for noise), indexed like the input.
    #[must_use]
    pub fn labels(&self) -> Vec<Option<usize>> {
        let mut labels = vec![None; self.len()];
        for (cluster, members) in self.clusters.iter().enumerate() {
            for &idx in members {
                labels[idx] = Some(cluster);
            }
        }
        labels
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Label {
    Unvisited,
    Noise,
    Member(usize),
}

/// Validates DBSCAN parameters.
///
/// # Errors
///
/// Returns [`ClusterError::InvalidParameter`] if `eps` is negative or not
/// finite, or `min_pts` is zero.
pub fn validate_params(eps: f64, min_pts: usize) -> Result<(), ClusterError> {
    if !eps.is_finite() {
        return Err(ClusterError::InvalidParameter {
            name: "eps",
            message: format!("must be finite, got {eps}"),
        });
    }
    if eps < 0.0 {
        return Err(ClusterError::InvalidParameter {
            name: "eps",
            message: format!("must be non-negative, got {eps}"),
        });
    }
    if min_pts < 1 {
        return Err(ClusterError::InvalidParameter {
            name: "min_pts",
            message: "must be at least 1".to_string(),
        });
    }
    Ok(())
}

/// Clusters `points` with a brute-force O(n²) neighborhood scan.
///
/// # Errors
///
/// Returns [`ClusterError::InvalidParameter`] for out-of-range parameters;
/// nothing is computed in that case.
pub fn cluster(
    points: &[GeoPoint],
    eps: f64,
    min_pts: usize,
) -> Result<ClusterAssignment, ClusterError> {
    validate_params(eps, min_pts)?;
    Ok(run(&BruteForce::new(points), eps, min_pts))
}

/// Clusters `points` using an R-tree to prune neighborhood candidates.
///
/// Produces exactly the same assignment as [`cluster`].
///
/// # Errors
///
/// Returns [`ClusterError::InvalidParameter`] for out-of-range parameters.
pub fn cluster_indexed(
    points: &[GeoPoint],
    eps: f64,
    min_pts: usize,
) -> Result<ClusterAssignment, ClusterError> {
    validate_params(eps, min_pts)?;
    Ok(run(&NeighborIndex::new(points), eps, min_pts))
}

/// Clusters the points behind an arbitrary [`NeighborSearch`].
///
/// # Errors
///
/// Returns [`ClusterError::InvalidParameter`] for out-of-range parameters.
pub fn cluster_with<S: NeighborSearch>(
    search: &S,
    eps: f64,
    min_pts: usize,
) -> Result<ClusterAssignment, ClusterError> {
    validate_params(eps, min_pts)?;
    Ok(run(search, eps, min_pts))
}

fn run<S: NeighborSearch>(search: &S, eps: f64, min_pts: usize) -> ClusterAssignment {
    let n = search.len();
    let mut labels = vec![Label::Unvisited; n];
    let mut clusters: Vec<Vec<usize>> = Vec::new();

    for idx in 0..n {
        if labels[idx] != Label::Unvisited {
            continue;
        }

        let neighbors = search.neighbors(idx, eps);
        if neighbors.len() < min_pts {
            // May still be claimed as a border point by a later cluster.
            labels[idx] = Label::Noise;
            continue;
        }

        let cluster_id = clusters.len();
        labels[idx] = Label::Member(cluster_id);
        let mut members = vec![idx];
        let mut queue: VecDeque<usize> = neighbors.into();

        while let Some(next) = queue.pop_front() {
            match labels[next] {
                Label::Member(_) => {}
                Label::Noise => {
                    // Already known not to be core: border point only.
                    labels[next] = Label::Member(cluster_id);
                    members.push(next);
                }
                Label::Unvisited => {
                    labels[next] = Label::Member(cluster_id);
                    members.push(next);

                    let next_neighbors = search.neighbors(next, eps);
                    if next_neighbors.len() >= min_pts {
                        queue.extend(
                            next_neighbors
                                .into_iter()
                                .filter(|&i| !matches!(labels[i], Label::Member(_))),
                        );
                    }
                }
            }
        }

        members.sort_unstable();
        clusters.push(members);
    }

    let noise: Vec<usize> = labels
        .iter()
        .enumerate()
        .filter(|(_, l)| **l == Label::Noise)
        .map(|(i, _)| i)
        .collect();

    log::debug!(
        "DBSCAN over {n} points (eps={eps}m, min_pts={min_pts}): {} clusters, {} noise",
        clusters.len(),
        noise.len()
    );

    ClusterAssignment { clusters, noise }
}
