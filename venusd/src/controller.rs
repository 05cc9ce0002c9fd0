//! Fixed-rate controller loop (spec.md §4.4), generalizing the
//! teacher's per-transport polling loops (`cmd_uart::uart_loop`,
//! `cmd_i2c::i2c_loop`) into the landing controller's periodic tick.
//!
//! Mirrors the original implementation's `main.py` loop body: sleep,
//! check the failure budget, periodically re-download the mission
//! while idle, force-idle on disarm/mode-change, tick the state
//! machine and apply its `Resolve`, then flush the video tape.

use std::thread;
use std::time::{Duration, Instant};

use venus::config::Config;
use venus::detector::DetectorPort;
use venus::error::VenusError;
use venus::state::LandingMachine;
use venus::types::Resolve;
use venus::vehicle::{FlightMode, VehiclePort};

use crate::error::Result;

const MISSION_REDOWNLOAD_PERIOD: Duration = Duration::from_secs(5);
const MISSION_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(5);

/// Drives `vehicle`/`detector` through the landing state machine at
/// `cfg.tps` Hz. Returns only once the failure budget (spec.md §7) is
/// exceeded, having already commanded RTL; the caller (`main`) treats
/// that `Err` as the process's nonzero exit (testable property 10).
pub fn run(mut vehicle: Box<dyn VehiclePort>, mut detector: Box<dyn DetectorPort>, cfg: &Config) -> Result<()> {
    let mut machine = LandingMachine::new();
    let mut failures: u32 = 0;
    let tick_period = Duration::from_secs_f64(1.0 / cfg.tps);

    vehicle.download_mission(MISSION_DOWNLOAD_TIMEOUT)?;
    vehicle.set_mode(FlightMode::Loiter)?;
    let mut since_mission_download = Instant::now();

    loop {
        thread::sleep(tick_period);

        if failures >= cfg.max_failures {
            log::error!("reached the maximum failures! commanding RTL");
            vehicle.set_mode(FlightMode::Rtl).ok();
            thread::sleep(Duration::from_secs(1));
            return Err(VenusError::BudgetExceeded.into());
        }

        if machine.is_idle() && since_mission_download.elapsed() >= MISSION_REDOWNLOAD_PERIOD {
            log::info!("downloading mission...");
            if let Err(e) = vehicle.download_mission(MISSION_DOWNLOAD_TIMEOUT) {
                log::error!("failed downloading mission: {e}");
            }
            since_mission_download = Instant::now();
        }

        failures += step(&mut machine, vehicle.as_mut(), detector.as_mut(), cfg)?;
    }
}

/// One tick's worth of work past the sleep/budget/mission-redownload
/// bookkeeping in [`run`]: force-idle on disarm/mode-change, tick the
/// state machine and apply its `Resolve`, then flush the video tape.
/// Returns how many failures this tick contributed (0 or 1 per
/// fallible step, spec.md §7), so callers can fold it into their own
/// counter without re-deriving the ordering spec.md §5 requires
/// (detection ingestion, then Conductor query, then Resolve, then
/// actuation).
pub fn step(
    machine: &mut LandingMachine,
    vehicle: &mut dyn VehiclePort,
    detector: &mut dyn DetectorPort,
    cfg: &Config,
) -> Result<u32> {
    let mut failures = 0;

    if (!vehicle.armed() || !matches!(vehicle.mode(), FlightMode::Auto | FlightMode::Guided)) && !machine.is_idle() {
        log::info!("current mode: {:?}; killing, going back into Idle", vehicle.mode());
        machine.force_idle();
    }

    match machine.tick(vehicle, detector, cfg) {
        Ok(resolve) => apply_resolve(machine, vehicle, resolve)?,
        Err(e) => {
            log::error!("an error occurred while in {} stage: {e}", machine.state_name());
            failures += 1;
        }
    }

    if let Err(e) = detector.update_video_tape() {
        log::error!("saving video tape failed this tick: {e}");
        failures += 1;
    }

    Ok(failures)
}

/// Applies one tick's [`Resolve`] to the vehicle port: latches a
/// newly-requested pad type, performs a state transition if one is
/// available, then actuates at most one of velocity/position (velocity
/// wins if both are present, spec.md §3). Yaw is produced but never
/// sent — dead pending calibration (spec.md §9).
fn apply_resolve(machine: &mut LandingMachine, vehicle: &mut dyn VehiclePort, resolve: Resolve) -> Result<()> {
    if let Some(pad_type) = resolve.pad_type {
        machine.latch_pad_type(pad_type);
    }
    if resolve.transition_available {
        machine.transition(vehicle)?;
    }
    if let Some(velocity) = resolve.velocity {
        vehicle.send_velocity(velocity)?;
    } else if let Some((position, airspeed)) = resolve.position {
        vehicle.simple_goto(position, airspeed)?;
    }
    Ok(())
}
