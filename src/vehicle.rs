//! Vehicle port: abstracts the autopilot link (spec.md §4.6).
//!
//! The concrete MAVLink implementation lives in `venusd`, alongside
//! the real camera/detector implementation — this crate only depends
//! on the trait, the same boundary the teacher draws between its
//! protocol library and its per-transport binary.

use crate::error::Result;
use crate::types::{GeoLocation, NedVelocity};

/// Flight modes relevant to the landing controller. Other ArduCopter
/// modes exist but are treated uniformly as "not AUTO, not GUIDED".
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FlightMode {
    /// Executing the autopilot mission.
    Auto,
    /// Under direct external control — this controller's own mode
    /// while flying a cycle.
    Guided,
    /// Holding position.
    Loiter,
    /// Descending to land in place.
    Land,
    /// Returning to the launch point.
    Rtl,
    /// Any mode this controller does not otherwise distinguish.
    Other,
}

/// A single mission item as relevant to this controller: its MAV
/// command id and its `z` parameter (used to smuggle the requested
/// `PadType` through a GUIDED_ENABLE item).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MissionItem {
    /// MAVLink command id, e.g. `92` for `MAV_CMD_DO_GUIDED_ENABLE`.
    pub command: u16,
    /// The item's `z` parameter.
    pub z: i32,
}

/// Abstracts the autopilot link: reading telemetry, and issuing mode,
/// arm, goto, velocity, yaw and mission commands (spec.md §4.6).
///
/// Implementors must not block except where explicitly documented
/// (`download_mission`, `wait_until_disarmed`, `wait_until_armable`) —
/// see spec.md §5.
pub trait VehiclePort {
    /// Whether the vehicle is currently armed.
    fn armed(&self) -> bool;

    /// Current flight mode.
    fn mode(&self) -> FlightMode;

    /// Current yaw, degrees.
    fn yaw(&self) -> f64;

    /// Current global position (lat, lon, GPS-relative altitude is
    /// read separately via [`VehiclePort::relative_altitude`]).
    fn global_location(&self) -> GeoLocation;

    /// Altitude above home, meters, from the GPS-relative frame.
    fn relative_altitude(&self) -> f64;

    /// Rangefinder distance, meters, or `None` if no rangefinder is
    /// attached or it has not reported a reading yet.
    fn rangefinder_distance(&self) -> Option<f64>;

    /// Current commanded/ground airspeed, m/s.
    fn airspeed(&self) -> f64;

    /// Whether the vehicle currently satisfies the autopilot's
    /// pre-arm checks.
    fn is_armable(&self) -> bool;

    /// Index of the next mission item to be executed.
    fn next_command_index(&self) -> usize;

    /// Returns the mission item at `index`, if the mission has been
    /// downloaded and `index` is in range.
    fn mission_item(&self, index: usize) -> Option<MissionItem>;

    /// Downloads the current mission from the autopilot, bounded by a
    /// timeout. The sole intentional long-blocking point outside the
    /// post-touchdown re-arm sequence (spec.md §5).
    fn download_mission(&mut self, timeout: std::time::Duration) -> Result<()>;

    /// Sets the flight mode.
    fn set_mode(&mut self, mode: FlightMode) -> Result<()>;

    /// Arms the vehicle, blocking until the autopilot acknowledges.
    fn arm(&mut self) -> Result<()>;

    /// Commands the vehicle to fly to `location` at `airspeed`.
    fn simple_goto(&mut self, location: GeoLocation, airspeed: f64) -> Result<()>;

    /// Sends an NED velocity setpoint
    /// (`SET_POSITION_TARGET_LOCAL_NED`, velocity-only type mask).
    fn send_velocity(&mut self, velocity: NedVelocity) -> Result<()>;

    /// Sends an absolute yaw setpoint (`CONDITION_YAW`, 1 deg/s, CW).
    /// Currently unused by the controller loop (spec.md §9) but part
    /// of the port's contract.
    fn send_yaw(&mut self, heading_deg: f64) -> Result<()>;

    /// Advances the mission pointer to `index`.
    fn set_next_command_index(&mut self, index: usize) -> Result<()>;

    /// Sends `MAV_CMD_MISSION_START`.
    fn start_mission(&mut self) -> Result<()>;

    /// Blocks (polling) until the vehicle reports disarmed.
    fn wait_until_disarmed(&mut self) -> Result<()>;

    /// Blocks (polling) until the vehicle reports armable.
    fn wait_until_armable(&mut self) -> Result<()>;
}
