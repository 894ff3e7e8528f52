//! `GeoJSON` output for the map front-end.
//!
//! One point feature per store (with its heatmap weight and cluster) and
//! one point feature per cluster centroid (with the circle radius to draw).

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue};
use retail_radar_store_models::GeoPoint;

use crate::AnalysisReport;

fn point_geometry(p: GeoPoint) -> Geometry {
    Geometry::new(geojson::Value::from(&geo::Point::new(p.lng, p.lat)))
}

fn feature(location: GeoPoint, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(point_geometry(location)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Renders a report as a `GeoJSON` `FeatureCollection`.
///
/// Store features carry `kind = "store"`, `id`, `name`, `category`,
/// `size`, `heatWeight` and `clusterId` (`null` for noise). Cluster
/// features carry `kind = "cluster"`, `clusterId`, `radiusMeters`,
/// `storeCount` and `densityScore`.
#[must_use]
pub fn to_feature_collection(report: &AnalysisReport) -> FeatureCollection {
    let labels = report.assignment.labels();

    let stores = report.stores.iter().enumerate().map(|(i, store)| {
        let cluster_id = labels
            .get(i)
            .copied()
            .flatten()
            .and_then(|pos| report.summaries.get(pos))
            .map(|s| s.id);

        let mut props = JsonObject::new();
        props.insert("kind".to_string(), JsonValue::from("store"));
        props.insert("id".to_string(), JsonValue::from(store.id.clone()));
        props.insert("name".to_string(), JsonValue::from(store.name.clone()));
        props.insert("category".to_string(), JsonValue::from(store.category.clone()));
        props.insert("size".to_string(), JsonValue::from(store.size_tier.as_ref()));
        props.insert(
            "heatWeight".to_string(),
            JsonValue::from(store.size_tier.heat_weight()),
        );
        props.insert("clusterId".to_string(), JsonValue::from(cluster_id));
        feature(store.location, props)
    });

    let clusters = report.summaries.iter().map(|summary| {
        let mut props = JsonObject::new();
        props.insert("kind".to_string(), JsonValue::from("cluster"));
        props.insert("clusterId".to_string(), JsonValue::from(summary.id));
        props.insert(
            "radiusMeters".to_string(),
            JsonValue::from(summary.radius_meters),
        );
        props.insert("storeCount".to_string(), JsonValue::from(summary.store_count));
        props.insert(
            "densityScore".to_string(),
            JsonValue::from(summary.density_score),
        );
        feature(summary.centroid, props)
    });

    FeatureCollection {
        bbox: None,
        features: stores.chain(clusters).collect(),
        foreign_members: None,
    }
}
