//! Evidence accumulator for geographic pad hypotheses (spec.md §4.2).

use crate::geometry::local_dist;
use crate::types::{LocationDetection, PadType};

/// An unordered collection of [`LocationDetection`]s plus an
/// `optimistic` flag.
///
/// Invariant: no two entries of the same [`PadType`] are within
/// `pad_blobbing_dist` meters of each other (testable property 6).
#[derive(Clone, Debug, Default)]
pub struct Conductor {
    detections: Vec<LocationDetection>,
    /// When set, [`Conductor::get_best_guess`] ignores `PadType` and
    /// returns the overall highest-confidence detection.
    pub optimistic: bool,
}

impl Conductor {
    /// A fresh, empty Conductor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct pad hypotheses currently tracked.
    pub fn len(&self) -> usize {
        self.detections.len()
    }

    /// Whether the Conductor holds no hypotheses yet.
    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    /// Adds a batch of detections, blobbing any that land within
    /// `pad_blobbing_dist` meters of an existing same-class entry.
    ///
    /// Order of consideration is insertion order; first match wins.
    /// Blobbing replaces the matched entry's location with the
    /// component-wise mean of the two locations and adds the
    /// confidences.
    ///
    /// Note: this "mean" is `det.lat = (det.lat + new.lat) / 2`, which
    /// is not the mean of the full cluster but a running exponential
    /// bias toward the earliest insertion (spec.md §9) — preserved to
    /// match observed field behavior, not fixed here.
    pub fn add_detections(&mut self, new: impl IntoIterator<Item = LocationDetection>, pad_blobbing_dist: f64) {
        for det_new in new {
            let mut blobbed = false;
            for det in self.detections.iter_mut() {
                if det.pad_type == det_new.pad_type
                    && local_dist(det_new.location, det.location) <= pad_blobbing_dist
                {
                    det.location.lat = (det.location.lat + det_new.location.lat) / 2.0;
                    det.location.lon = (det.location.lon + det_new.location.lon) / 2.0;
                    det.confidence += det_new.confidence;
                    blobbed = true;
                    break;
                }
            }
            if !blobbed {
                self.detections.push(det_new);
            }
        }
    }

    /// Returns the detection with maximum cumulative confidence whose
    /// `PadType` equals `pad_type`. In optimistic mode, `pad_type` is
    /// ignored and the overall best is returned. `None` if empty (or,
    /// outside optimistic mode, if no entry matches `pad_type`).
    pub fn get_best_guess(&self, pad_type: PadType) -> Option<LocationDetection> {
        self.detections
            .iter()
            .filter(|det| self.optimistic || det.pad_type == pad_type)
            .copied()
            .max_by(|a, b| a.confidence.partial_cmp(&b.confidence).unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GeoLocation;

    const BLOB_DIST: f64 = 8.0;

    #[test]
    fn blobbing_averages_and_sums_confidence() {
        let mut c = Conductor::new();
        c.add_detections(
            [LocationDetection::new(
                PadType::SmoresDropoff,
                GeoLocation::new(20.0, -30.0, 0.0),
                0.2,
            )],
            BLOB_DIST,
        );
        c.add_detections(
            [LocationDetection::new(
                PadType::SmoresDropoff,
                GeoLocation::new(20.0, -30.0, 0.0),
                0.3,
            )],
            BLOB_DIST,
        );

        assert_eq!(c.len(), 1);
        let best = c.get_best_guess(PadType::SmoresDropoff).unwrap();
        assert!((best.confidence - 0.5).abs() < 1e-9);
        assert!((best.location.lat - 20.0).abs() < 1e-9);
        assert!((best.location.lon - (-30.0)).abs() < 1e-9);
    }

    #[test]
    fn distinct_pad_types_never_blob() {
        let mut c = Conductor::new();
        c.add_detections(
            [
                LocationDetection::new(PadType::SmoresDropoff, GeoLocation::new(20.0, -30.0, 0.0), 0.2),
                LocationDetection::new(PadType::MedkitDropoff, GeoLocation::new(20.0, -30.0, 0.0), 0.6),
            ],
            BLOB_DIST,
        );
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn far_apart_detections_of_same_type_do_not_blob() {
        let mut c = Conductor::new();
        c.add_detections(
            [
                LocationDetection::new(PadType::SmoresDropoff, GeoLocation::new(20.0, -30.0, 0.0), 0.2),
                LocationDetection::new(PadType::SmoresDropoff, GeoLocation::new(21.0, -31.0, 0.0), 0.9),
            ],
            BLOB_DIST,
        );
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn full_scenario_from_original_test_suite() {
        let mut c = Conductor::new();
        c.add_detections(
            [
                LocationDetection::new(PadType::SmoresDropoff, GeoLocation::new(20.0, -30.0, 0.0), 0.2),
                LocationDetection::new(PadType::SmoresDropoff, GeoLocation::new(20.0, -30.0, 0.0), 0.3),
                LocationDetection::new(PadType::SmoresDropoff, GeoLocation::new(21.0, -31.0, 0.0), 0.9),
                LocationDetection::new(PadType::MedkitDropoff, GeoLocation::new(20.0, -30.0, 0.0), 0.6),
            ],
            BLOB_DIST,
        );
        c.add_detections(
            [LocationDetection::new(
                PadType::SmoresDropoff,
                GeoLocation::new(20.0, -30.0, 0.0),
                0.1,
            )],
            BLOB_DIST,
        );

        assert_eq!(c.len(), 3);
        assert!((c.get_best_guess(PadType::SmoresDropoff).unwrap().confidence - 0.9).abs() < 1e-9);
        assert!((c.get_best_guess(PadType::MedkitDropoff).unwrap().confidence - 0.6).abs() < 1e-9);
    }

    #[test]
    fn optimistic_mode_ignores_pad_type() {
        let mut c = Conductor::new();
        c.add_detections(
            [
                LocationDetection::new(PadType::SmoresDropoff, GeoLocation::new(1.0, 1.0, 0.0), 0.1),
                LocationDetection::new(PadType::BottlePickup, GeoLocation::new(2.0, 2.0, 0.0), 0.9),
            ],
            BLOB_DIST,
        );
        c.optimistic = true;
        let best = c.get_best_guess(PadType::PadCenter).unwrap();
        assert_eq!(best.pad_type, PadType::BottlePickup);
    }

    #[test]
    fn empty_conductor_has_no_guess() {
        let c = Conductor::new();
        assert!(c.get_best_guess(PadType::BottlePickup).is_none());
    }
}
