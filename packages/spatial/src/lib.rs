#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Great-circle distance and neighborhood queries over store coordinates.
//!
//! [`distance`] is the haversine metric used everywhere in the system.
//! Neighborhood queries ("every point within `eps` meters of point `i`")
//! go through the [`NeighborSearch`] trait, which has a brute-force
//! implementation and an R-tree backed one. Both return identical,
//! ascending index lists so callers can swap them freely.

use retail_radar_store_models::GeoPoint;
use rstar::primitives::GeomWithData;
use rstar::{AABB, RTree};

/// Mean Earth radius used by the haversine formula, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Relative slack applied to query envelopes so rounding never drops a
/// point that the exact haversine check would accept.
const ENVELOPE_SLACK: f64 = 1e-9;

/// Haversine great-circle distance between two coordinates, in meters.
///
/// Symmetric and zero for identical points. Non-finite input produces
/// `NaN`; callers are expected to validate coordinates first.
#[must_use]
pub fn distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);

    EARTH_RADIUS_METERS * 2.0 * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Answers "which points lie within `eps` meters of point `idx`".
pub trait NeighborSearch {
    /// Number of indexed points.
    fn len(&self) -> usize;

    /// Whether the search holds no points.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Indices of all points whose distance to point `idx` is at most
    /// `eps` meters, in ascending order. Includes `idx` itself when its
    /// coordinate is finite.
    fn neighbors(&self, idx: usize, eps: f64) -> Vec<usize>;
}

/// Linear scan over every point: O(n) distance evaluations per query.
pub struct BruteForce<'a> {
    points: &'a [GeoPoint],
}

impl<'a> BruteForce<'a> {
    /// Wraps a point slice.
    #[must_use]
    pub const fn new(points: &'a [GeoPoint]) -> Self {
        Self { points }
    }
}

impl NeighborSearch for BruteForce<'_> {
    fn len(&self) -> usize {
        self.points.len()
    }

    fn neighbors(&self, idx: usize, eps: f64) -> Vec<usize> {
        scan(self.points, idx, eps)
    }
}

fn scan(points: &[GeoPoint], idx: usize, eps: f64) -> Vec<usize> {
    let origin = points[idx];
    points
        .iter()
        .enumerate()
        .filter(|(_, p)| distance(origin, **p) <= eps)
        .map(|(i, _)| i)
        .collect()
}

type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// R-tree over `[lng, lat]` used to prune candidates before the exact
/// haversine check.
///
/// Queries use a conservative angular bounding box around the origin.
/// When that box would wrap the antimeridian or reach a pole the query
/// falls back to a full scan, so results never differ from [`BruteForce`].
/// Points outside the WGS-84 range are kept out of the tree and checked
/// against every query directly.
pub struct NeighborIndex {
    points: Vec<GeoPoint>,
    tree: RTree<IndexedPoint>,
    out_of_range: Vec<usize>,
}

impl NeighborIndex {
    /// Bulk-loads every in-range point into the tree.
    #[must_use]
    pub fn new(points: &[GeoPoint]) -> Self {
        let (valid, out_of_range): (Vec<usize>, Vec<usize>) =
            (0..points.len()).partition(|&i| points[i].is_valid());

        if !out_of_range.is_empty() {
            log::warn!(
                "{} coordinates outside the WGS-84 range are not indexed",
                out_of_range.len()
            );
        }

        let entries: Vec<IndexedPoint> = valid
            .into_iter()
            .map(|i| GeomWithData::new([points[i].lng, points[i].lat], i))
            .collect();

        Self {
            points: points.to_vec(),
            tree: RTree::bulk_load(entries),
            out_of_range,
        }
    }

    /// Bounding box (in degrees) guaranteed to contain every point within
    /// `eps` meters of `origin`, or `None` if no such box exists without
    /// wrapping.
    fn search_envelope(origin: GeoPoint, eps: f64) -> Option<AABB<[f64; 2]>> {
        if !origin.lat.is_finite() || !origin.lng.is_finite() {
            return None;
        }

        let angular = eps / EARTH_RADIUS_METERS;
        if angular >= std::f64::consts::FRAC_PI_2 {
            return None;
        }

        let d_lat = angular.to_degrees().mul_add(ENVELOPE_SLACK, angular.to_degrees());
        if origin.lat.abs() + d_lat >= 90.0 {
            return None;
        }

        // Exact longitudinal half-width of a spherical cap.
        let ratio = angular.sin() / origin.lat.to_radians().cos();
        if ratio >= 1.0 {
            return None;
        }
        let d_lng = ratio.asin().to_degrees();
        let d_lng = d_lng.mul_add(ENVELOPE_SLACK, d_lng);

        let (min_lng, max_lng) = (origin.lng - d_lng, origin.lng + d_lng);
        if min_lng < -180.0 || max_lng > 180.0 {
            return None;
        }

        Some(AABB::from_corners(
            [min_lng, origin.lat - d_lat],
            [max_lng, origin.lat + d_lat],
        ))
    }
}

impl NeighborSearch for NeighborIndex {
    fn len(&self) -> usize {
        self.points.len()
    }

    fn neighbors(&self, idx: usize, eps: f64) -> Vec<usize> {
        let origin = self.points[idx];

        let envelope = if origin.is_valid() {
            Self::search_envelope(origin, eps)
        } else {
            None
        };
        let Some(envelope) = envelope else {
            return scan(&self.points, idx, eps);
        };

        let mut found: Vec<usize> = self
            .tree
            .locate_in_envelope(&envelope)
            .map(|entry| entry.data)
            .chain(self.out_of_range.iter().copied())
            .filter(|&i| distance(origin, self.points[i]) <= eps)
            .collect();
        found.sort_unstable();
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lagos() -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(6.5244, 3.3792),
            GeoPoint::new(6.5246, 3.3793),
            GeoPoint::new(6.5245, 3.3791),
            GeoPoint::new(6.6018, 3.3515),
            GeoPoint::new(6.4550, 3.3941),
        ]
    }

    #[test]
    fn zero_distance_for_same_point() {
        for p in lagos() {
            assert!(distance(p, p).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn distance_is_symmetric() {
        let pts = lagos();
        for a in &pts {
            for b in &pts {
                let ab = distance(*a, *b);
                let ba = distance(*b, *a);
                assert!((ab - ba).abs() <= 1e-6 * ab.max(1.0), "{ab} != {ba}");
            }
        }
    }

    #[test]
    fn triangle_inequality_holds() {
        let pts = lagos();
        for a in &pts {
            for b in &pts {
                for c in &pts {
                    assert!(distance(*a, *c) <= distance(*a, *b) + distance(*b, *c) + 1e-6);
                }
            }
        }
    }

    #[test]
    fn one_degree_of_latitude() {
        let d = distance(GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 0.0));
        assert!((d - 111_194.93).abs() < 1.0, "got {d}");
    }

    #[test]
    fn nan_input_propagates() {
        let d = distance(GeoPoint::new(f64::NAN, 0.0), GeoPoint::new(0.0, 0.0));
        assert!(d.is_nan());
    }

    #[test]
    fn brute_force_includes_self() {
        let pts = lagos();
        let search = BruteForce::new(&pts);
        assert_eq!(search.neighbors(0, 500.0), vec![0, 1, 2]);
        assert_eq!(search.neighbors(3, 500.0), vec![3]);
    }

    #[test]
    fn index_matches_brute_force() {
        let pts = lagos();
        let brute = BruteForce::new(&pts);
        let index = NeighborIndex::new(&pts);
        for eps in [0.0, 25.0, 500.0, 10_000.0, 50_000.0] {
            for i in 0..pts.len() {
                assert_eq!(index.neighbors(i, eps), brute.neighbors(i, eps), "eps={eps} i={i}");
            }
        }
    }

    #[test]
    fn index_handles_antimeridian_and_poles() {
        let pts = vec![
            GeoPoint::new(10.0, 179.999),
            GeoPoint::new(10.0, -179.999),
            GeoPoint::new(89.9999, 0.0),
            GeoPoint::new(89.9999, 180.0),
        ];
        let brute = BruteForce::new(&pts);
        let index = NeighborIndex::new(&pts);
        for i in 0..pts.len() {
            assert_eq!(index.neighbors(i, 1_000.0), brute.neighbors(i, 1_000.0));
        }
        assert_eq!(index.neighbors(0, 1_000.0), vec![0, 1]);
    }

    #[test]
    fn index_matches_brute_force_for_out_of_range_points() {
        // Latitude 200 wraps over the pole to within meters of (-20, 0).
        let pts = vec![
            GeoPoint::new(-20.0, 0.0),
            GeoPoint::new(-20.000_01, 0.0),
            GeoPoint::new(200.0, 179.999_95),
            GeoPoint::new(f64::NAN, 0.0),
        ];
        let brute = BruteForce::new(&pts);
        let index = NeighborIndex::new(&pts);
        for i in 0..pts.len() {
            assert_eq!(index.neighbors(i, 10.0), brute.neighbors(i, 10.0), "i={i}");
        }
    }
}
