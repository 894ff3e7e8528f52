//! Per-cluster geometric and categorical statistics.

use std::collections::BTreeMap;

use geo::{Centroid, MultiPoint, Point};
use retail_radar_analysis_models::{ClusterSummary, MIN_AREA_KM2, MIN_RADIUS_METERS};
use retail_radar_cluster::ClusterAssignment;
use retail_radar_spatial::distance;
use retail_radar_store_models::{GeoPoint, StoreRecord};

/// Builds one [`ClusterSummary`] per cluster in `assignment`, in discovery
/// order. Noise points produce nothing.
///
/// # Panics
///
/// Panics if `assignment` references an index outside `records`; the
/// assignment must have been computed over the same record list.
#[must_use]
pub fn summarize(records: &[StoreRecord], assignment: &ClusterAssignment) -> Vec<ClusterSummary> {
    assignment
        .clusters
        .iter()
        .enumerate()
        .map(|(pos, members)| {
            let stores: Vec<&StoreRecord> = members.iter().map(|&i| &records[i]).collect();
            summarize_cluster(pos + 1, &stores)
        })
        .collect()
}

fn summarize_cluster(id: usize, stores: &[&StoreRecord]) -> ClusterSummary {
    let centroid = centroid(stores);

    let max_dist = stores
        .iter()
        .map(|s| distance(centroid, s.location))
        .fold(0.0_f64, f64::max);
    let radius_meters = max_dist.max(MIN_RADIUS_METERS);

    let area_km2 = (std::f64::consts::PI * (radius_meters / 1000.0).powi(2)).max(MIN_AREA_KM2);
    #[allow(clippy::cast_precision_loss)]
    let density_per_km2 = stores.len() as f64 / area_km2;

    let mut type_histogram = BTreeMap::new();
    let mut size_histogram = BTreeMap::new();
    for store in stores {
        *type_histogram.entry(store.category.clone()).or_insert(0) += 1;
        *size_histogram.entry(store.size_tier).or_insert(0) += 1;
    }

    ClusterSummary {
        id,
        centroid,
        radius_meters,
        store_count: stores.len(),
        density_per_km2,
        density_score: density_score(density_per_km2),
        type_histogram,
        size_histogram,
        member_ids: stores.iter().map(|s| s.id.clone()).collect(),
    }
}

/// Flat arithmetic mean of member latitudes and longitudes.
fn centroid(stores: &[&StoreRecord]) -> GeoPoint {
    let points: MultiPoint<f64> = stores
        .iter()
        .map(|s| Point::new(s.location.lng, s.location.lat))
        .collect();

    points
        .centroid()
        .map_or(GeoPoint::new(f64::NAN, f64::NAN), |c| GeoPoint::new(c.y(), c.x()))
}

/// `round(min(100, density × 10))`, clamped to the displayable range.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn density_score(density_per_km2: f64) -> u8 {
    (density_per_km2 * 10.0).clamp(0.0, 100.0).round() as u8
}
