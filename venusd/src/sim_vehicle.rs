//! In-memory `VehiclePort` fake for `venusd sim` (SPEC_FULL.md §6.4),
//! generalizing the shape of `state::tests::FakeVehicle` into a small
//! vehicle simulator good enough to exercise the full Idle → Descent →
//! Align → Touchdown → Idle cycle against a scripted detector, with no
//! MAVLink link or autopilot attached.
//!
//! Position and altitude are integrated from the commanded
//! velocity/goto each tick using wall-clock elapsed time, the same way
//! the real autopilot would fly a setpoint over time — good enough for
//! local development, not a flight-dynamics model.

use std::time::Instant;

use venus::error::Result;
use venus::geometry::distance_to_location;
use venus::types::{GeoLocation, NedVelocity};
use venus::vehicle::{FlightMode, MissionItem, VehiclePort};

/// A single-item mission: one GUIDED_ENABLE encoding the requested pad
/// type, already "reached" (`next_command_index` past it) so `Idle`
/// activates on the first tick.
pub struct SimVehicle {
    armed: bool,
    mode: FlightMode,
    yaw: f64,
    location: GeoLocation,
    home_alt_amsl: f64,
    relative_alt: f64,
    airspeed: f64,
    is_armable: bool,
    mission: Vec<MissionItem>,
    next_command: usize,
    last_tick: Instant,
}

impl SimVehicle {
    /// Spawns a vehicle already armed, in AUTO, hovering at
    /// `start_alt` meters above home, having just reached a
    /// GUIDED_ENABLE item requesting `pad_type_param` (spec.md §6).
    pub fn new(pad_type_param: i32, start_alt: f64) -> Self {
        let home_alt_amsl = 0.0;
        Self {
            armed: true,
            mode: FlightMode::Auto,
            yaw: 0.0,
            location: GeoLocation::new(37.422, -122.084, home_alt_amsl + start_alt),
            home_alt_amsl,
            relative_alt: start_alt,
            airspeed: 0.0,
            is_armable: true,
            mission: vec![MissionItem {
                command: 92,
                z: pad_type_param,
            }],
            next_command: 1,
            last_tick: Instant::now(),
        }
    }

    fn elapsed_reset(&mut self) -> f64 {
        let dt = self.last_tick.elapsed().as_secs_f64();
        self.last_tick = Instant::now();
        dt
    }
}

impl VehiclePort for SimVehicle {
    fn armed(&self) -> bool {
        self.armed
    }

    fn mode(&self) -> FlightMode {
        self.mode
    }

    fn yaw(&self) -> f64 {
        self.yaw
    }

    fn global_location(&self) -> GeoLocation {
        self.location
    }

    fn relative_altitude(&self) -> f64 {
        self.relative_alt
    }

    fn rangefinder_distance(&self) -> Option<f64> {
        Some(self.relative_alt)
    }

    fn airspeed(&self) -> f64 {
        self.airspeed
    }

    fn is_armable(&self) -> bool {
        self.is_armable
    }

    fn next_command_index(&self) -> usize {
        self.next_command
    }

    fn mission_item(&self, index: usize) -> Option<MissionItem> {
        self.mission.get(index).copied()
    }

    fn download_mission(&mut self, _timeout: std::time::Duration) -> Result<()> {
        Ok(())
    }

    fn set_mode(&mut self, mode: FlightMode) -> Result<()> {
        self.mode = mode;
        Ok(())
    }

    fn arm(&mut self) -> Result<()> {
        self.armed = true;
        Ok(())
    }

    fn simple_goto(&mut self, location: GeoLocation, airspeed: f64) -> Result<()> {
        self.elapsed_reset();
        self.location = location;
        self.relative_alt = location.alt - self.home_alt_amsl;
        self.airspeed = airspeed;
        Ok(())
    }

    fn send_velocity(&mut self, velocity: NedVelocity) -> Result<()> {
        let dt = self.elapsed_reset();
        self.location = distance_to_location(self.location, (velocity.east * dt, velocity.north * dt));
        self.relative_alt = (self.relative_alt - velocity.down * dt).max(0.0);
        self.location.alt = self.home_alt_amsl + self.relative_alt;
        self.airspeed = (velocity.east * velocity.east + velocity.north * velocity.north).sqrt();
        Ok(())
    }

    fn send_yaw(&mut self, heading_deg: f64) -> Result<()> {
        self.yaw = heading_deg;
        Ok(())
    }

    fn set_next_command_index(&mut self, index: usize) -> Result<()> {
        self.next_command = index;
        Ok(())
    }

    fn start_mission(&mut self) -> Result<()> {
        Ok(())
    }

    /// Simulated disarm is instantaneous — no real ESCs to wait on.
    fn wait_until_disarmed(&mut self) -> Result<()> {
        self.armed = false;
        Ok(())
    }

    /// Simulated arming checks always pass.
    fn wait_until_armable(&mut self) -> Result<()> {
        self.is_armable = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle_activatable() {
        let vehicle = SimVehicle::new(1, 10.0);
        assert!(vehicle.armed());
        assert_eq!(vehicle.mode(), FlightMode::Auto);
        assert_eq!(vehicle.relative_altitude(), 10.0);
        assert_eq!(vehicle.next_command_index(), 1);
        assert_eq!(vehicle.mission_item(0), Some(MissionItem { command: 92, z: 1 }));
    }

    #[test]
    fn downward_velocity_reduces_altitude() {
        let mut vehicle = SimVehicle::new(1, 10.0);
        std::thread::sleep(std::time::Duration::from_millis(20));
        vehicle.send_velocity(NedVelocity::new(0.0, 0.0, 1.0)).unwrap();
        assert!(vehicle.relative_altitude() < 10.0);
    }

    #[test]
    fn touchdown_handoff_disarms_and_rearms() {
        let mut vehicle = SimVehicle::new(1, 10.0);
        vehicle.set_mode(FlightMode::Land).unwrap();
        vehicle.wait_until_disarmed().unwrap();
        assert!(!vehicle.armed());
        vehicle.set_mode(FlightMode::Loiter).unwrap();
        vehicle.wait_until_armable().unwrap();
        vehicle.arm().unwrap();
        assert!(vehicle.armed());
    }
}
