//! Peak proximity classification.
//!
//! Given a position fix, decide whether the user is at a summit, climbing
//! toward one, or nowhere near a mountain:
//!
//! 1. Build a bounding box around the fix (±0.01° in both axes).
//! 2. Query the catalog for candidates inside the box.
//! 3. Compute haversine distance to each candidate.
//! 4. Take the minimum-distance candidate; ties break by lowest peak id.
//! 5. Map the distance against the summit/climbing radii.

use tracing::debug;

use crate::catalog::PeakCatalog;
use crate::geo::{haversine_m, BoundingBox, Coordinate};
use crate::peak::Peak;

// ── Configuration ───────────────────────────────────────────────────────────

/// Classification thresholds. These are fixed configuration constants, not
/// derived values.
#[derive(Debug, Clone)]
pub struct ProximityConfig {
    /// Within this distance of a peak the user has summited. Default 50 m.
    pub summit_radius_m: f64,
    /// Within this distance the user is climbing. Default 500 m.
    pub climbing_radius_m: f64,
    /// Half-width of the candidate bounding box in degrees. Default 0.01°
    /// (~1.1 km at mid-latitudes).
    pub box_half_width_deg: f64,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            summit_radius_m: 50.0,
            climbing_radius_m: 500.0,
            box_half_width_deg: 0.01,
        }
    }
}

// ── Outcome types ───────────────────────────────────────────────────────────

/// Tri-state proximity classification.
///
/// The idle/reset "none" state of a detection session is represented by the
/// session holding no outcome at all; the classifier always produces one of
/// these three.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    /// Within the summit radius of the nearest peak.
    Summited,
    /// Past the summit radius but within the climbing radius.
    Climbing,
    /// No candidate peaks, or the nearest is beyond the climbing radius.
    NoMountain,
}

/// The nearest catalog peak and its distance from the fix.
#[derive(Debug, Clone, PartialEq)]
pub struct NearestPeak {
    pub peak: Peak,
    pub distance_m: f64,
}

/// Result of one classification.
///
/// `nearest` is present whenever a candidate peak was found, including the
/// `NoMountain` case where the nearest peak is beyond the climbing radius,
/// so callers can still tell the user what the closest peak was.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationOutcome {
    pub kind: OutcomeKind,
    pub nearest: Option<NearestPeak>,
}

impl ClassificationOutcome {
    fn no_candidates() -> Self {
        Self {
            kind: OutcomeKind::NoMountain,
            nearest: None,
        }
    }
}

// ── Classifier ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct PeakProximityClassifier {
    pub config: ProximityConfig,
}

impl PeakProximityClassifier {
    pub fn new(config: ProximityConfig) -> Self {
        Self { config }
    }

    /// Classify a position fix against the catalog.
    ///
    /// Deterministic: the same fix and catalog always produce the same
    /// outcome and distance.
    pub fn classify(&self, catalog: &PeakCatalog, current: &Coordinate) -> ClassificationOutcome {
        let bbox = BoundingBox::around(current, self.config.box_half_width_deg);
        let candidates = catalog.query(&bbox);
        debug!(
            "classify: {} candidate peaks within ±{}° of ({:.5}, {:.5})",
            candidates.len(),
            self.config.box_half_width_deg,
            current.latitude,
            current.longitude,
        );

        // Nearest candidate; equal distances resolve to the lowest peak id
        // so the result never depends on catalog iteration order.
        let nearest = candidates
            .into_iter()
            .map(|peak| {
                let target = Coordinate::new(peak.latitude, peak.longitude);
                (haversine_m(current, &target), peak)
            })
            .min_by(|(da, pa), (db, pb)| da.total_cmp(db).then_with(|| pa.id.cmp(&pb.id)));

        let Some((distance_m, peak)) = nearest else {
            return ClassificationOutcome::no_candidates();
        };

        let kind = self.kind_for_distance(distance_m);
        debug!(
            "classify: nearest peak {} ({}) at {:.1} m -> {:?}",
            peak.id, peak.name, distance_m, kind
        );

        ClassificationOutcome {
            kind,
            nearest: Some(NearestPeak {
                peak: peak.clone(),
                distance_m,
            }),
        }
    }

    /// Threshold mapping, boundary-exact: a distance of exactly
    /// `summit_radius_m` is still a summit, exactly `climbing_radius_m`
    /// still climbing.
    pub fn kind_for_distance(&self, distance_m: f64) -> OutcomeKind {
        if distance_m <= self.config.summit_radius_m {
            OutcomeKind::Summited
        } else if distance_m <= self.config.climbing_radius_m {
            OutcomeKind::Climbing
        } else {
            OutcomeKind::NoMountain
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peak(id: u64, lat: f64, lon: f64) -> Peak {
        Peak {
            id,
            name: format!("Peak {id}"),
            latitude: lat,
            longitude: lon,
            elevation: "14000".to_string(),
            state: None,
        }
    }

    fn single_peak_catalog() -> PeakCatalog {
        PeakCatalog::from_peaks(vec![peak(1, 40.0000, -105.0000)])
    }

    #[test]
    fn a_few_meters_from_the_peak_is_summited() {
        let classifier = PeakProximityClassifier::default();
        let outcome = classifier.classify(
            &single_peak_catalog(),
            &Coordinate::new(40.00004, -105.00005),
        );
        assert_eq!(outcome.kind, OutcomeKind::Summited);
        let nearest = outcome.nearest.expect("peak attached");
        assert_eq!(nearest.peak.id, 1);
        assert!(nearest.distance_m < 10.0);
    }

    #[test]
    fn three_hundred_meters_out_is_climbing() {
        let classifier = PeakProximityClassifier::default();
        let outcome =
            classifier.classify(&single_peak_catalog(), &Coordinate::new(40.0027, -105.0000));
        assert_eq!(outcome.kind, OutcomeKind::Climbing);
        let nearest = outcome.nearest.expect("peak attached");
        assert!((250.0..350.0).contains(&nearest.distance_m));
    }

    #[test]
    fn outside_the_bounding_box_is_no_mountain_without_a_peak() {
        let classifier = PeakProximityClassifier::default();
        let outcome =
            classifier.classify(&single_peak_catalog(), &Coordinate::new(40.01, -105.01));
        assert_eq!(outcome.kind, OutcomeKind::NoMountain);
        assert!(outcome.nearest.is_none());
    }

    #[test]
    fn inside_the_box_but_far_attaches_the_peak_for_feedback() {
        // ~890 m north: inside the ±0.01° box, past the climbing radius.
        let classifier = PeakProximityClassifier::default();
        let outcome =
            classifier.classify(&single_peak_catalog(), &Coordinate::new(40.008, -105.0000));
        assert_eq!(outcome.kind, OutcomeKind::NoMountain);
        let nearest = outcome.nearest.expect("peak attached for user feedback");
        assert!(nearest.distance_m > 500.0);
    }

    #[test]
    fn empty_catalog_is_no_mountain_without_a_peak() {
        let classifier = PeakProximityClassifier::default();
        let outcome =
            classifier.classify(&PeakCatalog::empty(), &Coordinate::new(40.0, -105.0));
        assert_eq!(outcome.kind, OutcomeKind::NoMountain);
        assert!(outcome.nearest.is_none());
    }

    #[test]
    fn thresholds_are_boundary_exact() {
        let classifier = PeakProximityClassifier::default();
        assert_eq!(classifier.kind_for_distance(50.0), OutcomeKind::Summited);
        assert_eq!(classifier.kind_for_distance(50.001), OutcomeKind::Climbing);
        assert_eq!(classifier.kind_for_distance(500.0), OutcomeKind::Climbing);
        assert_eq!(
            classifier.kind_for_distance(500.001),
            OutcomeKind::NoMountain
        );
    }

    #[test]
    fn equidistant_peaks_resolve_to_the_lowest_id() {
        // Two peaks the same distance north and south of the fix; the
        // higher-id peak is listed first in the document.
        let catalog = PeakCatalog::from_peaks(vec![
            peak(9, 40.002, -105.0),
            peak(3, 39.998, -105.0),
        ]);
        let classifier = PeakProximityClassifier::default();
        let outcome = classifier.classify(&catalog, &Coordinate::new(40.0, -105.0));
        assert_eq!(outcome.nearest.expect("peak attached").peak.id, 3);
    }

    #[test]
    fn classification_is_deterministic() {
        let classifier = PeakProximityClassifier::default();
        let catalog = single_peak_catalog();
        let fix = Coordinate::new(40.0012, -105.0008);
        let first = classifier.classify(&catalog, &fix);
        for _ in 0..10 {
            assert_eq!(classifier.classify(&catalog, &fix), first);
        }
    }
}
