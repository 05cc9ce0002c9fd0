//! MAVLink implementation of [`venus::vehicle::VehiclePort`]
//! (SPEC_FULL.md §4.7), over the `mavlink` crate's `ardupilotmega`
//! dialect.
//!
//! Mirrors the shape of `dronekit.Vehicle` the original implementation
//! drove: a background thread folds every incoming message into a
//! shared telemetry cache, so the controller loop only ever reads that
//! cache or sends a command — it never blocks on `recv()` itself. This
//! keeps the non-blocking contract of spec.md §5 without needing an
//! async runtime in `venus` itself.

use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use mavlink::ardupilotmega::{
    MavCmd, MavFrame, MavMessage, MavMissionType, MavState, COMMAND_LONG_DATA, MISSION_ACK_DATA, MISSION_REQUEST_INT_DATA,
    MISSION_REQUEST_LIST_DATA, MISSION_SET_CURRENT_DATA, SET_POSITION_TARGET_GLOBAL_INT_DATA, SET_POSITION_TARGET_LOCAL_NED_DATA,
};
use mavlink::{MavConnection, MavHeader};

use venus::error::{Result, VenusError};
use venus::types::{GeoLocation, NedVelocity};
use venus::vehicle::{FlightMode, MissionItem, VehiclePort};

/// ArduCopter `custom_mode` integers this controller cares about
/// (spec.md §4.7); other modes are folded to [`FlightMode::Other`].
const CUSTOM_MODE_AUTO: u32 = 3;
const CUSTOM_MODE_GUIDED: u32 = 4;
const CUSTOM_MODE_LOITER: u32 = 5;
const CUSTOM_MODE_RTL: u32 = 6;
const CUSTOM_MODE_LAND: u32 = 9;

const MAV_MODE_FLAG_SAFETY_ARMED: u8 = 0x80;
const MAV_MODE_FLAG_CUSTOM_MODE_ENABLED: f32 = 1.0;

/// `SET_POSITION_TARGET_LOCAL_NED` type_mask for a velocity-only
/// setpoint (spec.md §6).
const TYPE_MASK_VELOCITY_ONLY: u16 = 0b0000_1111_1100_0111;
/// `SET_POSITION_TARGET_GLOBAL_INT` type_mask for a position-only
/// setpoint (velocity, acceleration and yaw-rate ignored).
const TYPE_MASK_POSITION_ONLY: u16 = 0b0000_1111_1111_1000;

fn custom_mode_to_flight_mode(mode: u32) -> FlightMode {
    match mode {
        CUSTOM_MODE_AUTO => FlightMode::Auto,
        CUSTOM_MODE_GUIDED => FlightMode::Guided,
        CUSTOM_MODE_LOITER => FlightMode::Loiter,
        CUSTOM_MODE_LAND => FlightMode::Land,
        CUSTOM_MODE_RTL => FlightMode::Rtl,
        _ => FlightMode::Other,
    }
}

fn flight_mode_to_custom_mode(mode: FlightMode) -> u32 {
    match mode {
        FlightMode::Auto => CUSTOM_MODE_AUTO,
        FlightMode::Guided => CUSTOM_MODE_GUIDED,
        FlightMode::Loiter => CUSTOM_MODE_LOITER,
        FlightMode::Land => CUSTOM_MODE_LAND,
        FlightMode::Rtl => CUSTOM_MODE_RTL,
        FlightMode::Other => 0,
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Telemetry {
    armed: bool,
    custom_mode: u32,
    yaw_deg: f64,
    lat: f64,
    lon: f64,
    relative_alt: f64,
    alt_amsl: f64,
    rangefinder_distance: Option<f64>,
    airspeed: f64,
    is_armable: bool,
}

impl Telemetry {
    /// Folds one incoming message into the cache, the same way
    /// `dronekit.Vehicle` lazily reflects the last-seen value of each
    /// of these streams (SPEC_FULL.md §4.7).
    fn fold(&mut self, msg: &MavMessage) {
        match msg {
            MavMessage::HEARTBEAT(hb) => {
                self.armed = hb.base_mode.bits() & MAV_MODE_FLAG_SAFETY_ARMED != 0;
                self.custom_mode = hb.custom_mode;
                self.is_armable = matches!(hb.system_status, MavState::MAV_STATE_STANDBY | MavState::MAV_STATE_ACTIVE);
            }
            MavMessage::ATTITUDE(att) => {
                self.yaw_deg = ((att.yaw.to_degrees() as f64) + 360.0) % 360.0;
            }
            MavMessage::GLOBAL_POSITION_INT(pos) => {
                self.lat = pos.lat as f64 / 1e7;
                self.lon = pos.lon as f64 / 1e7;
                self.relative_alt = pos.relative_alt as f64 / 1000.0;
                self.alt_amsl = pos.alt as f64 / 1000.0;
            }
            MavMessage::VFR_HUD(hud) => {
                self.airspeed = hud.airspeed as f64;
            }
            MavMessage::DISTANCE_SENSOR(ds) => {
                self.rangefinder_distance = Some(ds.current_distance as f64 / 100.0);
            }
            _ => {}
        }
    }
}

/// Drives a vehicle over a live MAVLink link.
pub struct MavlinkVehicle {
    conn: Arc<dyn MavConnection<MavMessage> + Send + Sync>,
    telemetry: Arc<Mutex<Telemetry>>,
    mission_rx: Receiver<MavMessage>,
    header: MavHeader,
    target_system: u8,
    target_component: u8,
    mission: Vec<MissionItem>,
    next_command_index: usize,
}

impl MavlinkVehicle {
    /// Connects to `address` (e.g. `serial:/dev/ttyAMA1:115200` or
    /// `udpin:127.0.0.1:14550`) and starts the background telemetry
    /// thread. Connection failure is cold-start fatal (spec.md §7).
    pub fn connect(address: &str, target_system: u8, target_component: u8) -> Result<Self> {
        let conn: Arc<dyn MavConnection<MavMessage> + Send + Sync> = mavlink::connect::<MavMessage>(address)
            .map_err(|e| VenusError::ColdStartFatal(format!("connecting to {address}: {e}")))?
            .into();

        let telemetry = Arc::new(Mutex::new(Telemetry::default()));
        let (mission_tx, mission_rx) = mpsc::channel();

        {
            let conn = Arc::clone(&conn);
            let telemetry = Arc::clone(&telemetry);
            thread::spawn(move || loop {
                match conn.recv() {
                    Ok((_header, msg)) => {
                        if let Ok(mut t) = telemetry.lock() {
                            t.fold(&msg);
                        }
                        if is_mission_message(&msg) && mission_tx.send(msg).is_err() {
                            return;
                        }
                    }
                    Err(_) => thread::sleep(Duration::from_millis(10)),
                }
            });
        }

        Ok(Self {
            conn,
            telemetry,
            mission_rx,
            header: MavHeader {
                system_id: 255,
                component_id: 0,
                sequence: 0,
            },
            target_system,
            target_component,
            mission: Vec::new(),
            next_command_index: 0,
        })
    }

    fn telemetry(&self) -> Telemetry {
        *self.telemetry.lock().expect("telemetry lock poisoned")
    }

    fn send(&self, msg: MavMessage) -> Result<()> {
        self.conn
            .send(&self.header, &msg)
            .map(|_| ())
            .map_err(|e| VenusError::TransientLink(e.to_string()))
    }

    fn command_long(&self, command: MavCmd, params: [f32; 7]) -> Result<()> {
        self.send(MavMessage::COMMAND_LONG(COMMAND_LONG_DATA {
            target_system: self.target_system,
            target_component: self.target_component,
            command,
            confirmation: 0,
            param1: params[0],
            param2: params[1],
            param3: params[2],
            param4: params[3],
            param5: params[4],
            param6: params[5],
            param7: params[6],
        }))
    }
}

fn is_mission_message(msg: &MavMessage) -> bool {
    matches!(msg, MavMessage::MISSION_COUNT(_) | MavMessage::MISSION_ITEM_INT(_))
}

impl VehiclePort for MavlinkVehicle {
    fn armed(&self) -> bool {
        self.telemetry().armed
    }

    fn mode(&self) -> FlightMode {
        custom_mode_to_flight_mode(self.telemetry().custom_mode)
    }

    fn yaw(&self) -> f64 {
        self.telemetry().yaw_deg
    }

    /// AMSL, not GPS-relative — matches the original implementation's
    /// `vehicle.location.global_frame` (as opposed to
    /// `global_relative_frame`, which `relative_altitude()` reports).
    fn global_location(&self) -> GeoLocation {
        let t = self.telemetry();
        GeoLocation::new(t.lat, t.lon, t.alt_amsl)
    }

    fn relative_altitude(&self) -> f64 {
        self.telemetry().relative_alt
    }

    fn rangefinder_distance(&self) -> Option<f64> {
        self.telemetry().rangefinder_distance
    }

    fn airspeed(&self) -> f64 {
        self.telemetry().airspeed
    }

    fn is_armable(&self) -> bool {
        self.telemetry().is_armable
    }

    fn next_command_index(&self) -> usize {
        self.next_command_index
    }

    fn mission_item(&self, index: usize) -> Option<MissionItem> {
        self.mission.get(index).copied()
    }

    /// Downloads the mission via `MISSION_REQUEST_LIST` /
    /// `MISSION_COUNT` / `MISSION_REQUEST_INT` / `MISSION_ITEM_INT` /
    /// `MISSION_ACK`, bounded by `timeout` (spec.md §5).
    fn download_mission(&mut self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;

        self.send(MavMessage::MISSION_REQUEST_LIST(MISSION_REQUEST_LIST_DATA {
            target_system: self.target_system,
            target_component: self.target_component,
            mission_type: MavMissionType::MAV_MISSION_TYPE_MISSION,
        }))?;

        let count = loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(VenusError::TransientLink("timed out waiting for MISSION_COUNT".into()));
            }
            match self.mission_rx.recv_timeout(remaining) {
                Ok(MavMessage::MISSION_COUNT(data)) => break data.count,
                Ok(_) => continue,
                Err(_) => return Err(VenusError::TransientLink("timed out waiting for MISSION_COUNT".into())),
            }
        };

        let mut items = Vec::with_capacity(count as usize);
        for seq in 0..count {
            self.send(MavMessage::MISSION_REQUEST_INT(MISSION_REQUEST_INT_DATA {
                target_system: self.target_system,
                target_component: self.target_component,
                seq,
                mission_type: MavMissionType::MAV_MISSION_TYPE_MISSION,
            }))?;

            loop {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return Err(VenusError::TransientLink("timed out waiting for MISSION_ITEM_INT".into()));
                }
                match self.mission_rx.recv_timeout(remaining) {
                    Ok(MavMessage::MISSION_ITEM_INT(item)) if item.seq == seq => {
                        items.push(MissionItem {
                            command: item.command as u16,
                            z: item.z as i32,
                        });
                        break;
                    }
                    Ok(_) => continue,
                    Err(_) => return Err(VenusError::TransientLink("timed out waiting for MISSION_ITEM_INT".into())),
                }
            }
        }

        self.send(MavMessage::MISSION_ACK(MISSION_ACK_DATA {
            target_system: self.target_system,
            target_component: self.target_component,
            mav_type: Default::default(),
            mission_type: MavMissionType::MAV_MISSION_TYPE_MISSION,
        }))?;

        self.mission = items;
        Ok(())
    }

    fn set_mode(&mut self, mode: FlightMode) -> Result<()> {
        let custom_mode = flight_mode_to_custom_mode(mode);
        self.command_long(
            MavCmd::MAV_CMD_DO_SET_MODE,
            [MAV_MODE_FLAG_CUSTOM_MODE_ENABLED, custom_mode as f32, 0.0, 0.0, 0.0, 0.0, 0.0],
        )
    }

    fn arm(&mut self) -> Result<()> {
        self.command_long(MavCmd::MAV_CMD_COMPONENT_ARM_DISARM, [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0])
    }

    fn simple_goto(&mut self, location: GeoLocation, airspeed: f64) -> Result<()> {
        self.command_long(MavCmd::MAV_CMD_DO_CHANGE_SPEED, [1.0, airspeed as f32, -1.0, 0.0, 0.0, 0.0, 0.0])?;
        // `location.alt` comes from `global_location()`, which reports
        // AMSL (matching the original implementation's
        // `global_frame`, not `global_relative_frame`) — the frame
        // here must agree with that altitude basis.
        self.send(MavMessage::SET_POSITION_TARGET_GLOBAL_INT(SET_POSITION_TARGET_GLOBAL_INT_DATA {
            time_boot_ms: 0,
            target_system: self.target_system,
            target_component: self.target_component,
            coordinate_frame: MavFrame::MAV_FRAME_GLOBAL,
            type_mask: TYPE_MASK_POSITION_ONLY,
            lat_int: (location.lat * 1e7) as i32,
            lon_int: (location.lon * 1e7) as i32,
            alt: location.alt as f32,
            vx: 0.0,
            vy: 0.0,
            vz: 0.0,
            afx: 0.0,
            afy: 0.0,
            afz: 0.0,
            yaw: 0.0,
            yaw_rate: 0.0,
        }))
    }

    /// `SET_POSITION_TARGET_LOCAL_NED`, frame LOCAL_NED, velocity-only
    /// type_mask `0b0000111111000111` (spec.md §6).
    fn send_velocity(&mut self, velocity: NedVelocity) -> Result<()> {
        self.send(MavMessage::SET_POSITION_TARGET_LOCAL_NED(SET_POSITION_TARGET_LOCAL_NED_DATA {
            time_boot_ms: 0,
            target_system: self.target_system,
            target_component: self.target_component,
            coordinate_frame: MavFrame::MAV_FRAME_LOCAL_NED,
            type_mask: TYPE_MASK_VELOCITY_ONLY,
            x: 0.0,
            y: 0.0,
            z: 0.0,
            vx: velocity.north as f32,
            vy: velocity.east as f32,
            vz: velocity.down as f32,
            afx: 0.0,
            afy: 0.0,
            afz: 0.0,
            yaw: 0.0,
            yaw_rate: 0.0,
        }))
    }

    /// CONDITION_YAW, absolute, 1 deg/s, direction CW (spec.md §6).
    /// Unused by the controller loop pending calibration (spec.md §9)
    /// but implemented as part of the port's contract.
    fn send_yaw(&mut self, heading_deg: f64) -> Result<()> {
        self.command_long(MavCmd::MAV_CMD_CONDITION_YAW, [heading_deg as f32, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0])
    }

    fn set_next_command_index(&mut self, index: usize) -> Result<()> {
        self.next_command_index = index;
        self.send(MavMessage::MISSION_SET_CURRENT(MISSION_SET_CURRENT_DATA {
            target_system: self.target_system,
            target_component: self.target_component,
            seq: index as u16,
        }))
    }

    fn start_mission(&mut self) -> Result<()> {
        self.command_long(MavCmd::MAV_CMD_MISSION_START, [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0])
    }

    fn wait_until_disarmed(&mut self) -> Result<()> {
        loop {
            if !self.telemetry().armed {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(100));
        }
    }

    fn wait_until_armable(&mut self) -> Result<()> {
        loop {
            if self.telemetry().is_armable {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(500));
        }
    }
}
