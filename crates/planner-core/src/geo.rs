//! Geo primitives: haversine distance, travel-time estimation, bounding diameter.

/// Mean earth radius in miles.
const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Assumed average ground speed (mph) used to convert distance into drive time.
pub const AVG_SPEED_MPH: f64 = 35.0;

/// A point on the globe, WGS-84 degrees.
pub type LatLon = (f64, f64);

/// Great-circle distance between two `(lat, lon)` points, in miles.
///
/// Symmetric and satisfies the triangle inequality (haversine is a true metric
/// on the sphere), so callers may rely on it for clustering and tie-breaking.
pub fn distance_miles(a: LatLon, b: LatLon) -> f64 {
    if a == b {
        return 0.0;
    }
    let (lat1, lon1) = (a.0.to_radians(), a.1.to_radians());
    let (lat2, lon2) = (b.0.to_radians(), b.1.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let sin_dlat = (dlat * 0.5).sin();
    let sin_dlon = (dlon * 0.5).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_MILES * c
}

/// Travel time in minutes for a straight-line distance, at [`AVG_SPEED_MPH`].
///
/// Monotone non-decreasing in distance; inherits the triangle inequality from
/// [`distance_miles`] since it is a fixed positive scaling of it.
pub fn travel_minutes_for_distance(miles: f64) -> f64 {
    (miles / AVG_SPEED_MPH) * 60.0
}

/// Travel time in minutes between two points under the default (haversine)
/// estimate. Solvers should prefer a [`crate::oracle::TimeOracle`] so the
/// estimate can be swapped for a routed/cached one without touching call sites.
pub fn travel_minutes(a: LatLon, b: LatLon) -> f64 {
    travel_minutes_for_distance(distance_miles(a, b))
}

/// Bounding diameter of a point set: the maximum pairwise distance.
///
/// Computed exactly (all pairs) for small sets. For sets larger than
/// [`EXACT_DIAMETER_LIMIT`] points, falls back to a farthest-point
/// approximation: pick an arbitrary point, find its farthest point `p`, then
/// find `p`'s farthest point `q`; `distance(p, q)` approximates the true
/// diameter and is always a lower bound on it.
pub fn bounding_diameter(points: &[LatLon]) -> f64 {
    const EXACT_DIAMETER_LIMIT: usize = 64;

    if points.len() < 2 {
        return 0.0;
    }
    if points.len() <= EXACT_DIAMETER_LIMIT {
        let mut max = 0.0_f64;
        for i in 0..points.len() {
            for j in (i + 1)..points.len() {
                let d = distance_miles(points[i], points[j]);
                if d > max {
                    max = d;
                }
            }
        }
        return max;
    }

    let farthest_from = |origin: LatLon| -> LatLon {
        points
            .iter()
            .copied()
            .max_by(|a, b| {
                distance_miles(origin, *a)
                    .partial_cmp(&distance_miles(origin, *b))
                    .unwrap()
            })
            .unwrap()
    };

    let p = farthest_from(points[0]);
    let q = farthest_from(p);
    distance_miles(p, q)
}

/// Centroid (arithmetic mean of lat/lon) of a point set.
pub fn centroid(points: &[LatLon]) -> LatLon {
    let n = points.len() as f64;
    let (sum_lat, sum_lon) = points
        .iter()
        .fold((0.0, 0.0), |(sa, so), (lat, lon)| (sa + lat, so + lon));
    (sum_lat / n, sum_lon / n)
}
