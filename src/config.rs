//! Global, immutable tunables (spec.md §6), assembled once at startup
//! and shared by reference with the controller loop and every stage.

/// All tunables named in spec.md §6, as a single `Copy` value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// Controller loop rate, Hz.
    pub tps: f64,
    /// Consecutive tick failures before commanding RTL and exiting.
    pub max_failures: u32,
    /// Radius within which same-class detections are blobbed, meters.
    pub pad_blobbing_dist: f64,
    /// Downward step per Descent tick when centered over the pad, m/s.
    pub descent_speed: f64,
    /// Constant downward speed during Touchdown, m/s.
    pub touchdown_speed: f64,
    /// Horizontal correction speed during Align, m/s.
    pub align_airspeed: f64,
    /// Horizontal travel speed used for `simple_goto` and Touchdown
    /// pad-center steering, m/s.
    pub airspeed: f64,
    /// Minimum relative altitude, meters, to consider the vehicle
    /// airborne in Idle.
    pub min_alt_for_flight: f64,
    /// Minimum seconds between informational status log lines.
    pub status_update_freq: f64,
    /// Seconds spent in Align before forcing a transition.
    pub align_time: f64,
    /// AGL altitude, meters, at which Descent hands off to Align.
    pub align_alt: f64,
    /// Seconds in Descent with no pad guess before the Conductor
    /// becomes optimistic. Defaults to 999s, effectively disabling
    /// optimism (spec.md §9 — preserved as intentional).
    pub optimism_time: f64,
    /// Maximum look-down angle error, degrees, tolerated while still
    /// descending (rather than leveling off to travel to the pad).
    pub max_angle_diff: f64,
    /// AGL altitude, meters, below which Touchdown is complete.
    pub landed_alt_lidar: f64,
}

// Camera field-of-view angles (`WIDTH_FOV`/`HEIGHT_FOV`) are not
// listed here: like the original implementation's `optics.py`, they
// live as fixed constants alongside the geometry that uses them (see
// `geometry::WIDTH_FOV_DEG`/`HEIGHT_FOV_DEG`), not in the tunable
// config assembled at startup.

impl Default for Config {
    fn default() -> Self {
        Self {
            tps: 15.0,
            max_failures: 30,
            pad_blobbing_dist: 8.0,
            descent_speed: 1.0,
            touchdown_speed: 0.3,
            align_airspeed: 0.3,
            airspeed: 0.8,
            min_alt_for_flight: 5.0,
            status_update_freq: 1.0,
            align_time: 25.0,
            align_alt: 3.0,
            optimism_time: 999.0,
            max_angle_diff: 25.0,
            landed_alt_lidar: 0.5,
        }
    }
}

/// MAV command id for a GUIDED_ENABLE mission item (spec.md §6).
pub const GUIDED_ENABLE_CMD: u16 = 92;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = Config::default();
        assert_eq!(cfg.tps, 15.0);
        assert_eq!(cfg.max_failures, 30);
        assert_eq!(cfg.optimism_time, 999.0);
    }
}
