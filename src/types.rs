//! Shared data model (spec.md §3): pad identity, pixel and geographic
//! detections, and the per-tick [`Resolve`] action.

/// One of the seven pad roles a mission item can request.
///
/// Integer encoding 0..6 is part of the external mission contract
/// (spec.md §6): any other integer is invalid and silently dropped by
/// the adapter that decodes it (see [`PadType::from_mission_param`]).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum PadType {
    /// `0`
    BottleDropoff,
    /// `1`
    BottlePickup,
    /// `2`
    MedkitDropoff,
    /// `3`
    MedkitPickup,
    /// `4`
    SmoresDropoff,
    /// `5`
    SmoresPickup,
    /// `6`
    PadCenter,
}

impl PadType {
    /// Decodes a GUIDED_ENABLE mission item's `z` parameter into a
    /// `PadType`. Returns `None` for anything outside `0..=6`
    /// (testable property 9).
    pub fn from_mission_param(param: i32) -> Option<Self> {
        use PadType::*;
        match param {
            0 => Some(BottleDropoff),
            1 => Some(BottlePickup),
            2 => Some(MedkitDropoff),
            3 => Some(MedkitPickup),
            4 => Some(SmoresDropoff),
            5 => Some(SmoresPickup),
            6 => Some(PadCenter),
            _ => None,
        }
    }
}

/// Normalized camera-preview pixel coordinates, origin at top-left,
/// x right, y down. Both components lie in `[0.0, 1.0]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelCoords {
    /// Horizontal position, 0.0 = left edge, 1.0 = right edge.
    pub x: f64,
    /// Vertical position, 0.0 = top edge, 1.0 = bottom edge.
    pub y: f64,
}

impl PixelCoords {
    /// Convenience constructor.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A single neural-network detection in camera-preview space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelDetection {
    /// Which pad role this detection claims to be.
    pub pad_type: PadType,
    /// Midpoint of the detector's bounding box.
    pub center: PixelCoords,
    /// Detector confidence, `[0.0, 1.0]`.
    pub confidence: f64,
}

/// A geographic fix: latitude/longitude in degrees, altitude in
/// meters above home. Altitude may be GPS-relative or
/// rangefinder-derived depending on context (spec.md §4.1 `get_agl`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoLocation {
    /// Latitude, degrees.
    pub lat: f64,
    /// Longitude, degrees.
    pub lon: f64,
    /// Altitude, meters above home.
    pub alt: f64,
}

impl GeoLocation {
    /// Convenience constructor.
    pub fn new(lat: f64, lon: f64, alt: f64) -> Self {
        Self { lat, lon, alt }
    }
}

/// A pad detection projected into geographic space, with cumulative
/// (additive, not probabilistic) confidence.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocationDetection {
    /// Which pad role this detection claims to be.
    pub pad_type: PadType,
    /// Where the pad is believed to be.
    pub location: GeoLocation,
    /// Cumulative confidence: additive under blobbing.
    pub confidence: f64,
}

impl LocationDetection {
    /// Convenience constructor.
    pub fn new(pad_type: PadType, location: GeoLocation, confidence: f64) -> Self {
        Self {
            pad_type,
            location,
            confidence,
        }
    }
}

/// A velocity setpoint in the NED frame, meters/second. `+z` is down.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NedVelocity {
    /// North component, m/s.
    pub north: f64,
    /// East component, m/s.
    pub east: f64,
    /// Down component, m/s. Positive is downward.
    pub down: f64,
}

impl NedVelocity {
    /// Convenience constructor.
    pub fn new(north: f64, east: f64, down: f64) -> Self {
        Self { north, east, down }
    }
}

/// The desired action for one tick, produced by a stage's `tick()`.
///
/// At most one of `position`/`velocity` is meaningful; if both are
/// present, `velocity` wins (spec.md §3).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Resolve {
    /// Absolute yaw, degrees. Produced but currently never consumed
    /// by the controller loop — see spec.md §9 on dead yaw actuation.
    pub yaw: Option<f64>,
    /// A geographic point to fly toward, plus the horizontal airspeed
    /// to use getting there.
    pub position: Option<(GeoLocation, f64)>,
    /// An NED velocity setpoint.
    pub velocity: Option<NedVelocity>,
    /// Whether the current stage is ready to transition to the next.
    pub transition_available: bool,
    /// Set only by `Idle`, to publish the newly requested pad class.
    pub pad_type: Option<PadType>,
}

impl Resolve {
    /// A Resolve that holds position (no actuation, no transition).
    pub fn hold() -> Self {
        Self::default()
    }

    /// A Resolve that signals a transition is available.
    pub fn transition() -> Self {
        Self {
            transition_available: true,
            ..Self::default()
        }
    }

    /// A Resolve publishing a newly requested pad type and signaling
    /// transition (Idle's success path).
    pub fn idle_activate(pad_type: PadType) -> Self {
        Self {
            transition_available: true,
            pad_type: Some(pad_type),
            ..Self::default()
        }
    }

    /// A Resolve commanding a position setpoint.
    pub fn goto(position: GeoLocation, airspeed: f64, yaw: f64) -> Self {
        Self {
            yaw: Some(yaw),
            position: Some((position, airspeed)),
            ..Self::default()
        }
    }

    /// A Resolve commanding an NED velocity setpoint.
    pub fn velocity(velocity: NedVelocity) -> Self {
        Self {
            velocity: Some(velocity),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mission_contract_decoding() {
        assert_eq!(PadType::from_mission_param(0), Some(PadType::BottleDropoff));
        assert_eq!(PadType::from_mission_param(1), Some(PadType::BottlePickup));
        assert_eq!(PadType::from_mission_param(2), Some(PadType::MedkitDropoff));
        assert_eq!(PadType::from_mission_param(3), Some(PadType::MedkitPickup));
        assert_eq!(PadType::from_mission_param(4), Some(PadType::SmoresDropoff));
        assert_eq!(PadType::from_mission_param(5), Some(PadType::SmoresPickup));
        assert_eq!(PadType::from_mission_param(6), Some(PadType::PadCenter));
        assert_eq!(PadType::from_mission_param(7), None);
        assert_eq!(PadType::from_mission_param(-1), None);
    }
}
