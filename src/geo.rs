//! Geographic primitives: coordinates, bounding boxes, and great-circle
//! distance.
//!
//! Distances use the haversine formula on a spherical Earth with
//! R = 6,371,000 m, which is well within consumer-GPS error for the
//! sub-kilometer ranges the classifier cares about.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters used for haversine distances.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS84 position in decimal degrees, with optional GPS altitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
    /// Device-reported altitude in meters, when the fix includes one.
    pub altitude_m: Option<f64>,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude_m: None,
        }
    }

    pub fn with_altitude(latitude: f64, longitude: f64, altitude_m: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude_m: Some(altitude_m),
        }
    }
}

/// Axis-aligned latitude/longitude rectangle used to prune catalog
/// candidates before exact distance computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Build a box centered on `center` extending `half_width_deg` in both
    /// axes. At mid-latitudes 0.01° is roughly ±1.1 km.
    pub fn around(center: &Coordinate, half_width_deg: f64) -> Self {
        Self {
            min_lat: center.latitude - half_width_deg,
            max_lat: center.latitude + half_width_deg,
            min_lon: center.longitude - half_width_deg,
            max_lon: center.longitude + half_width_deg,
        }
    }

    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        latitude >= self.min_lat
            && latitude <= self.max_lat
            && longitude >= self.min_lon
            && longitude <= self.max_lon
    }
}

/// Great-circle distance between two points in meters.
///
/// `a = sin²(Δlat/2) + cos(lat1)·cos(lat2)·sin²(Δlon/2)`,
/// `d = 2R·atan2(√a, √(1−a))`, angles in radians.
pub fn haversine_m(from: &Coordinate, to: &Coordinate) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let dlat = (to.latitude - from.latitude).to_radians();
    let dlon = (to.longitude - from.longitude).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    EARTH_RADIUS_M * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn haversine_near_summit_is_a_few_meters() {
        // ~4.4 m north-south plus ~4.3 m east-west at 40°N
        let peak = Coordinate::new(40.0000, -105.0000);
        let user = Coordinate::new(40.00004, -105.00005);
        let d = haversine_m(&user, &peak);
        assert!(d > 4.0 && d < 10.0, "expected ~6 m, got {d}");
    }

    #[test]
    fn haversine_quarter_degree_lat_is_about_300m() {
        let peak = Coordinate::new(40.0000, -105.0000);
        let user = Coordinate::new(40.0027, -105.0000);
        let d = haversine_m(&user, &peak);
        assert_relative_eq!(d, 300.0, max_relative = 0.02);
    }

    #[test]
    fn haversine_zero_for_identical_points() {
        let p = Coordinate::new(37.9140, -107.5049);
        assert_eq!(haversine_m(&p, &p), 0.0);
    }

    #[test]
    fn haversine_is_symmetric() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let a = Coordinate::new(rng.gen_range(-89.0..89.0), rng.gen_range(-180.0..180.0));
            let b = Coordinate::new(rng.gen_range(-89.0..89.0), rng.gen_range(-180.0..180.0));
            let ab = haversine_m(&a, &b);
            let ba = haversine_m(&b, &a);
            assert_relative_eq!(ab, ba, max_relative = 1e-12);
        }
    }

    #[test]
    fn bounding_box_contains_edges() {
        let b = BoundingBox::around(&Coordinate::new(40.0, -105.0), 0.01);
        assert!(b.contains(40.01, -105.0));
        assert!(b.contains(39.99, -105.01));
        assert!(!b.contains(40.0101, -105.0));
        assert!(!b.contains(40.0, -105.0101));
    }
}
