//! The four-state landing state machine (spec.md §4.3).
//!
//! Each stage is a tagged variant that dispatches statically; its
//! per-stage scratch state (entry timestamp, `commandId`, the shared
//! Conductor) lives inside the variant itself, not behind a
//! back-reference (spec.md §9).

use std::time::Instant;

use crate::conductor::Conductor;
use crate::config::{Config, GUIDED_ENABLE_CMD};
use crate::detector::DetectorPort;
use crate::error::Result;
use crate::geometry::{angle_diff, change_magnitude, distance_to_location, get_agl, individual_dist, relative_distance};
use crate::types::{GeoLocation, LocationDetection, NedVelocity, PadType, Resolve};
use crate::vehicle::{FlightMode, VehiclePort};

/// Observes the vehicle and decides whether the landing sequence
/// should begin (spec.md §4.3).
#[derive(Debug)]
pub struct Idle {
    since_status_update: Instant,
}

impl Idle {
    /// Enters Idle now.
    pub fn new() -> Self {
        Self {
            since_status_update: Instant::now(),
        }
    }

    fn tick(&mut self, vehicle: &dyn VehiclePort, cfg: &Config) -> Result<Resolve> {
        let armed = vehicle.armed();
        let auto = vehicle.mode() == FlightMode::Auto;
        let relative_alt = vehicle.relative_altitude();
        let in_air = relative_alt >= cfg.min_alt_for_flight;

        // The autopilot silently advances `next` past a GUIDED_ENABLE
        // the moment it's reached, so inspect `next - 1` to see
        // whether we're currently sitting on one.
        let next = vehicle.next_command_index();
        let inspect_index = if next > 0 { next - 1 } else { next };
        let item = vehicle.mission_item(inspect_index);

        let guided = item.map(|i| i.command == GUIDED_ENABLE_CMD).unwrap_or(false);
        let requested_pad = item.and_then(|i| PadType::from_mission_param(i.z));

        if self.since_status_update.elapsed().as_secs_f64() >= cfg.status_update_freq {
            log::info!(
                "Vehicle is idling. in_air: {}, armed: {}, auto: {}, alt: {}, command_index: {}",
                in_air,
                armed,
                auto,
                relative_alt,
                inspect_index,
            );
            self.since_status_update = Instant::now();
        }

        if in_air && armed && auto && guided {
            if let Some(pad_type) = requested_pad {
                return Ok(Resolve::idle_activate(pad_type));
            }
        }
        Ok(Resolve::hold())
    }
}

impl Default for Idle {
    fn default() -> Self {
        Self::new()
    }
}

/// Descends toward the requested pad, fusing detections into the
/// shared [`Conductor`] (spec.md §4.3).
#[derive(Debug)]
pub struct Descent {
    conductor: Conductor,
    pad_type: Option<PadType>,
    command_id: usize,
    since_status_update: Instant,
    since_enter: Instant,
}

impl Descent {
    /// Enters Descent now, owning a fresh `conductor` and remembering
    /// `command_id`, the mission item that triggered this cycle.
    pub fn new(conductor: Conductor, pad_type: Option<PadType>, command_id: usize) -> Self {
        Self {
            conductor,
            pad_type,
            command_id,
            since_status_update: Instant::now(),
            since_enter: Instant::now(),
        }
    }

    /// The mission item id that triggered this cycle, threaded
    /// through to the eventual Touchdown -> Idle mission advance.
    pub fn command_id(&self) -> usize {
        self.command_id
    }

    /// Hands the Conductor to the next stage (Align), consuming self.
    pub fn into_conductor(self) -> Conductor {
        self.conductor
    }

    fn tick(&mut self, vehicle: &dyn VehiclePort, detector: &mut dyn DetectorPort, cfg: &Config) -> Result<Resolve> {
        let alt_guess = get_agl(vehicle);
        let yaw = vehicle.yaw();
        let origin = vehicle.global_location();

        if let Some(detections) = detector.tick().map_err(|e| e.in_stage("Descending"))? {
            let located = detections.into_iter().map(|d| {
                let offset = relative_distance(alt_guess, d.center, yaw);
                let loc = distance_to_location(origin, offset);
                LocationDetection::new(d.pad_type, loc, d.confidence)
            });
            self.conductor.add_detections(located, cfg.pad_blobbing_dist);
        }

        // Fall back to bottlePickup when no pad type was specified
        // (spec.md §9 — preserved default).
        let query_type = self.pad_type.unwrap_or(PadType::BottlePickup);
        let best_guess = self.conductor.get_best_guess(query_type);

        if self.since_status_update.elapsed().as_secs_f64() >= cfg.status_update_freq {
            log::info!(
                "Vehicle is descending! cache_size: {}, guess: {:?}, airspeed: {}, command_index: {}",
                self.conductor.len(),
                best_guess,
                vehicle.airspeed(),
                vehicle.next_command_index(),
            );
            self.since_status_update = Instant::now();
        }

        if alt_guess <= cfg.align_alt {
            return Ok(Resolve::transition());
        }

        if let Some(guess) = best_guess {
            let dists = individual_dist(guess.location, origin);
            let angle = angle_diff(dists, alt_guess);

            if angle.0 <= cfg.max_angle_diff && angle.1 <= cfg.max_angle_diff {
                let target = GeoLocation::new(guess.location.lat, guess.location.lon, origin.alt - cfg.descent_speed);
                return Ok(Resolve::goto(target, cfg.airspeed, 0.0));
            }

            let target = GeoLocation::new(guess.location.lat, guess.location.lon, origin.alt);
            return Ok(Resolve::goto(target, cfg.airspeed, 0.0));
        } else if self.since_enter.elapsed().as_secs_f64() >= cfg.optimism_time && !self.conductor.optimistic {
            self.conductor.optimistic = true;
            log::warn!("Conductor became optimistic!");
        }

        Ok(Resolve::hold())
    }
}

/// Short, low-level velocity phase that steers directly off raw
/// detections, bypassing the Conductor (spec.md §4.3).
#[derive(Debug)]
pub struct Align {
    conductor: Conductor,
    command_id: usize,
    since_enter: Instant,
}

impl Align {
    /// Enters Align now, reusing Descent's Conductor.
    pub fn new(conductor: Conductor, command_id: usize) -> Self {
        Self {
            conductor,
            command_id,
            since_enter: Instant::now(),
        }
    }

    /// The mission item id threaded through from Descent.
    pub fn command_id(&self) -> usize {
        self.command_id
    }

    fn tick(&mut self, vehicle: &dyn VehiclePort, detector: &mut dyn DetectorPort, cfg: &Config) -> Result<Resolve> {
        if self.since_enter.elapsed().as_secs_f64() >= cfg.align_time {
            return Ok(Resolve::transition());
        }

        let alt_guess = get_agl(vehicle);
        let yaw = vehicle.yaw();

        if let Some(detections) = detector.tick().map_err(|e| e.in_stage("Aligning"))? {
            if let Some(first) = detections.into_iter().next() {
                let offset = relative_distance(alt_guess, first.center, yaw);
                let (east, north) = change_magnitude(offset, cfg.align_airspeed);
                return Ok(Resolve::velocity(NedVelocity::new(north, east, 0.0)));
            }
        }

        Ok(Resolve::velocity(NedVelocity::new(0.0, 0.0, 0.0)))
    }
}

/// Closes the loop directly over a `padCenter` detection while
/// descending at a constant rate (spec.md §4.3).
#[derive(Debug)]
pub struct Touchdown {
    command_id: usize,
}

impl Touchdown {
    /// Enters Touchdown now.
    pub fn new(command_id: usize) -> Self {
        Self { command_id }
    }

    /// The mission item id threaded through from Align, consumed on
    /// the eventual Touchdown -> Idle mission advance.
    pub fn command_id(&self) -> usize {
        self.command_id
    }

    fn tick(&mut self, vehicle: &dyn VehiclePort, detector: &mut dyn DetectorPort, cfg: &Config) -> Result<Resolve> {
        let alt_guess = get_agl(vehicle);
        if alt_guess <= cfg.landed_alt_lidar {
            return Ok(Resolve::transition());
        }

        let yaw = vehicle.yaw();
        if let Some(detections) = detector.tick().map_err(|e| e.in_stage("Touching down"))? {
            for d in detections {
                if d.pad_type == PadType::PadCenter {
                    let offset = relative_distance(alt_guess, d.center, yaw);
                    let (east, north) = change_magnitude(offset, cfg.airspeed);
                    return Ok(Resolve::velocity(NedVelocity::new(north, east, cfg.touchdown_speed)));
                }
            }
        }

        Ok(Resolve::velocity(NedVelocity::new(0.0, 0.0, cfg.touchdown_speed)))
    }
}

/// Tagged union of the four stages. Created on entry to a stage,
/// destroyed on transition out.
#[derive(Debug)]
pub enum State {
    /// Waiting for the autopilot mission to hand off control.
    Idle(Idle),
    /// Descending toward the requested pad.
    Descent(Descent),
    /// Fine-aligning directly over the pad.
    Align(Align),
    /// Touching down, steering over `padCenter` if visible.
    Touchdown(Touchdown),
}

impl State {
    /// The stage's name, used in status logging and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            State::Idle(_) => "Idle",
            State::Descent(_) => "Descending",
            State::Align(_) => "Aligning",
            State::Touchdown(_) => "Touching down",
        }
    }
}

/// Owns the current [`State`] and the pad type latched from Idle's
/// last activation, and performs the transitions between stages.
#[derive(Debug)]
pub struct LandingMachine {
    state: State,
    pad_type: Option<PadType>,
}

impl LandingMachine {
    /// A fresh machine, starting in Idle.
    pub fn new() -> Self {
        Self {
            state: State::Idle(Idle::new()),
            pad_type: None,
        }
    }

    /// The current stage's name.
    pub fn state_name(&self) -> &'static str {
        self.state.name()
    }

    /// Whether the machine is currently Idle.
    pub fn is_idle(&self) -> bool {
        matches!(self.state, State::Idle(_))
    }

    /// Forces the machine back to Idle immediately — used by the
    /// controller loop when the vehicle disarms or leaves
    /// AUTO/GUIDED (spec.md §4.3, §4.4).
    pub fn force_idle(&mut self) {
        if !self.is_idle() {
            self.state = State::Idle(Idle::new());
        }
    }

    /// Latches a newly requested pad type, published by Idle on
    /// activation.
    pub fn latch_pad_type(&mut self, pad_type: PadType) {
        self.pad_type = Some(pad_type);
    }

    /// Ticks the current stage.
    pub fn tick(&mut self, vehicle: &dyn VehiclePort, detector: &mut dyn DetectorPort, cfg: &Config) -> Result<Resolve> {
        match &mut self.state {
            State::Idle(s) => s.tick(vehicle, cfg),
            State::Descent(s) => s.tick(vehicle, detector, cfg),
            State::Align(s) => s.tick(vehicle, detector, cfg),
            State::Touchdown(s) => s.tick(vehicle, detector, cfg),
        }
    }

    /// Transitions into the next stage: Idle -> Descent -> Align ->
    /// Touchdown -> Idle. The Touchdown -> Idle leg runs the
    /// post-landing re-arm sequence and advances the mission pointer
    /// to `commandId + 1` (spec.md §4.3).
    pub fn transition(&mut self, vehicle: &mut dyn VehiclePort) -> Result<()> {
        let current = std::mem::replace(&mut self.state, State::Idle(Idle::new()));
        self.state = match current {
            State::Idle(_) => {
                let command_id = vehicle.next_command_index();
                log::info!("Transition into Descent...");
                if let Some(pad_type) = self.pad_type {
                    log::info!("Tracking a {}", pad_type);
                }
                State::Descent(Descent::new(Conductor::new(), self.pad_type, command_id))
            }
            State::Descent(descent) => {
                log::info!("Transition into Align.");
                let command_id = descent.command_id();
                State::Align(Align::new(descent.into_conductor(), command_id))
            }
            State::Align(align) => {
                log::info!("Transition into Touchdown...");
                State::Touchdown(Touchdown::new(align.command_id()))
            }
            State::Touchdown(touchdown) => {
                log::info!("Touchdown finished!");
                run_touchdown_handoff(vehicle, touchdown.command_id())?;
                log::info!("Transition back into Idle...");
                State::Idle(Idle::new())
            }
        };
        Ok(())
    }
}

impl Default for LandingMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// The Touchdown -> Idle re-arming and mission-advance sequence
/// (spec.md §4.3). This is the loop's one intentional
/// sleep-polling stretch outside the top-of-tick sleep.
fn run_touchdown_handoff(vehicle: &mut dyn VehiclePort, command_id: usize) -> Result<()> {
    vehicle.set_mode(FlightMode::Land)?;
    vehicle.wait_until_disarmed()?;
    log::info!("Vehicle disarmed!");

    // LAND isn't armable; LOITER is required before re-arming.
    vehicle.set_mode(FlightMode::Loiter)?;
    vehicle.wait_until_armable()?;
    std::thread::sleep(std::time::Duration::from_millis(1500));

    vehicle.arm()?;
    vehicle.set_mode(FlightMode::Auto)?;
    vehicle.start_mission()?;
    vehicle.set_next_command_index(command_id + 1)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GeoLocation, NedVelocity, PixelCoords, PixelDetection};
    use crate::vehicle::MissionItem;
    use std::cell::RefCell;

    struct FakeVehicle {
        armed: bool,
        mode: FlightMode,
        yaw: f64,
        location: GeoLocation,
        relative_alt: f64,
        rangefinder: Option<f64>,
        airspeed: f64,
        is_armable: bool,
        next_command: usize,
        mission: Vec<MissionItem>,
        disarm_after_land: RefCell<u32>,
        mode_log: RefCell<Vec<FlightMode>>,
        next_index_log: RefCell<Vec<usize>>,
        mission_started: RefCell<bool>,
    }

    impl FakeVehicle {
        fn new() -> Self {
            Self {
                armed: true,
                mode: FlightMode::Auto,
                yaw: 0.0,
                location: GeoLocation::new(10.0, 20.0, 30.0),
                relative_alt: 10.0,
                rangefinder: None,
                airspeed: 5.0,
                is_armable: true,
                next_command: 3,
                mission: vec![
                    MissionItem { command: 16, z: 0 },
                    MissionItem { command: 16, z: 0 },
                    MissionItem { command: 92, z: 1 },
                ],
                disarm_after_land: RefCell::new(1),
                mode_log: RefCell::new(Vec::new()),
                next_index_log: RefCell::new(Vec::new()),
                mission_started: RefCell::new(false),
            }
        }
    }

    impl VehiclePort for FakeVehicle {
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
            self.rangefinder
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
            self.mode_log.borrow_mut().push(mode);
            if mode == FlightMode::Land {
                *self.disarm_after_land.borrow_mut() = 0;
                self.armed = false;
            }
            Ok(())
        }
        fn arm(&mut self) -> Result<()> {
            self.armed = true;
            Ok(())
        }
        fn simple_goto(&mut self, _location: GeoLocation, _airspeed: f64) -> Result<()> {
            Ok(())
        }
        fn send_velocity(&mut self, _velocity: NedVelocity) -> Result<()> {
            Ok(())
        }
        fn send_yaw(&mut self, _heading_deg: f64) -> Result<()> {
            Ok(())
        }
        fn set_next_command_index(&mut self, index: usize) -> Result<()> {
            self.next_command = index;
            self.next_index_log.borrow_mut().push(index);
            Ok(())
        }
        fn start_mission(&mut self) -> Result<()> {
            *self.mission_started.borrow_mut() = true;
            Ok(())
        }
        fn wait_until_disarmed(&mut self) -> Result<()> {
            self.armed = false;
            Ok(())
        }
        fn wait_until_armable(&mut self) -> Result<()> {
            self.is_armable = true;
            Ok(())
        }
    }

    struct FakeDetector {
        batches: Vec<Option<Vec<PixelDetection>>>,
    }

    impl DetectorPort for FakeDetector {
        fn tick(&mut self) -> Result<Option<Vec<PixelDetection>>> {
            if self.batches.is_empty() {
                Ok(None)
            } else {
                Ok(self.batches.remove(0))
            }
        }
        fn update_video_tape(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn s1_idle_activation() {
        let vehicle = FakeVehicle::new();
        let cfg = Config::default();
        let mut idle = Idle::new();
        let resolve = idle.tick(&vehicle, &cfg).unwrap();
        assert!(resolve.transition_available);
        assert_eq!(resolve.pad_type, Some(PadType::BottlePickup));
    }

    #[test]
    fn s2_descent_centered() {
        let vehicle = FakeVehicle::new();
        let cfg = Config::default();
        let mut descent = Descent::new(Conductor::new(), Some(PadType::BottlePickup), 3);
        // Seed the conductor with a guess exactly at the vehicle's location.
        descent.conductor.add_detections(
            [LocationDetection::new(PadType::BottlePickup, vehicle.location, 0.9)],
            cfg.pad_blobbing_dist,
        );
        let mut detector = FakeDetector { batches: vec![None] };
        let resolve = descent.tick(&vehicle, &mut detector, &cfg).unwrap();
        let (pos, _airspeed) = resolve.position.unwrap();
        assert!((pos.lat - vehicle.location.lat).abs() < 1e-9);
        assert!((pos.lon - vehicle.location.lon).abs() < 1e-9);
        assert!((pos.alt - (vehicle.location.alt - cfg.descent_speed)).abs() < 1e-9);
    }

    #[test]
    fn s3_descent_off_axis_travels_flat() {
        let mut vehicle = FakeVehicle::new();
        vehicle.relative_alt = 20.0;
        let cfg = Config::default();
        let mut descent = Descent::new(Conductor::new(), Some(PadType::BottlePickup), 3);
        let far = GeoLocation::new(vehicle.location.lat + 1.0, vehicle.location.lon, vehicle.location.alt);
        descent.conductor.add_detections([LocationDetection::new(PadType::BottlePickup, far, 0.9)], cfg.pad_blobbing_dist);
        let mut detector = FakeDetector { batches: vec![None] };
        let resolve = descent.tick(&vehicle, &mut detector, &cfg).unwrap();
        let (pos, _airspeed) = resolve.position.unwrap();
        assert!((pos.alt - vehicle.location.alt).abs() < 1e-9);
    }

    #[test]
    fn s4_align_velocity_is_east_positive() {
        let mut vehicle = FakeVehicle::new();
        vehicle.relative_alt = 3.0;
        let cfg = Config::default();
        let mut align = Align::new(Conductor::new(), 3);
        let mut detector = FakeDetector {
            batches: vec![Some(vec![PixelDetection {
                pad_type: PadType::BottlePickup,
                center: PixelCoords::new(0.75, 0.5),
                confidence: 0.8,
            }])],
        };
        let resolve = align.tick(&vehicle, &mut detector, &cfg).unwrap();
        let v = resolve.velocity.unwrap();
        assert!(v.east > 0.0);
        assert!((v.north).abs() < 1e-9);
        let magnitude = (v.east * v.east + v.north * v.north).sqrt();
        assert!((magnitude - cfg.align_airspeed).abs() < 1e-9);
    }

    #[test]
    fn s5_touchdown_with_pad_center() {
        let mut vehicle = FakeVehicle::new();
        vehicle.relative_alt = 1.0;
        let cfg = Config::default();
        let mut touchdown = Touchdown::new(3);
        let mut detector = FakeDetector {
            batches: vec![Some(vec![PixelDetection {
                pad_type: PadType::PadCenter,
                center: PixelCoords::new(0.5, 0.5),
                confidence: 0.95,
            }])],
        };
        let resolve = touchdown.tick(&vehicle, &mut detector, &cfg).unwrap();
        let v = resolve.velocity.unwrap();
        assert!((v.east).abs() < 1e-9);
        assert!((v.north).abs() < 1e-9);
        assert!((v.down - cfg.touchdown_speed).abs() < 1e-9);
    }

    #[test]
    fn s6_touchdown_completion_and_mission_advance() {
        let mut vehicle = FakeVehicle::new();
        vehicle.relative_alt = 0.4;
        let cfg = Config::default();
        let mut touchdown = Touchdown::new(3);
        let mut detector = FakeDetector { batches: vec![None] };
        let resolve = touchdown.tick(&vehicle, &mut detector, &cfg).unwrap();
        assert!(resolve.transition_available);

        let mut machine = LandingMachine {
            state: State::Touchdown(touchdown),
            pad_type: Some(PadType::BottlePickup),
        };
        machine.transition(&mut vehicle).unwrap();
        assert!(machine.is_idle());
        assert_eq!(vehicle.next_command, 4);
        assert_eq!(vehicle.mode, FlightMode::Auto);
        assert!(*vehicle.mission_started.borrow());
        assert_eq!(
            *vehicle.mode_log.borrow(),
            vec![FlightMode::Land, FlightMode::Loiter, FlightMode::Auto]
        );
    }

    #[test]
    fn force_idle_replaces_non_idle_state() {
        let mut machine = LandingMachine::new();
        machine.transition(&mut FakeVehicle::new()).unwrap();
        assert!(!machine.is_idle());
        machine.force_idle();
        assert!(machine.is_idle());
    }
}
