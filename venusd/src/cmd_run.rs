//! `venusd run` subcommand (SPEC_FULL.md §6.4): connects to a live
//! MAVLink vehicle and drives the controller loop against it, the way
//! the teacher's `cmd_uart::uart_loop` opens a transport and loops.

use std::path::PathBuf;

use venus::config::Config;

use crate::detector::{parse_script, SimDetector};
use crate::error::Result;
use crate::logging;
use crate::mavlink_vehicle::MavlinkVehicle;

/// `serial:/dev/ttyAMA1:115200`, the production UART link (spec.md §6).
const DEFAULT_SERIAL_CONNECTION: &str = "serial:/dev/ttyAMA1:115200";
/// `udpin:127.0.0.1:14550`, the SITL endpoint used under `--dev`.
const DEFAULT_SITL_CONNECTION: &str = "udpin:127.0.0.1:14550";

/// MAVLink system/component id this controller presents as — matches
/// a ground-station-style companion computer.
const TARGET_SYSTEM: u8 = 1;
const TARGET_COMPONENT: u8 = 1;

/// Runs the `run` subcommand: set up logging, connect to the vehicle,
/// build the detector (scripted if `--script` was given, otherwise
/// one that never reports a fresh frame — the real neural detector is
/// an external accelerator outside this repo's scope, spec.md §1),
/// and hand both to the controller loop.
pub fn run(
    connection: Option<String>,
    dev: bool,
    logs_dir: PathBuf,
    video_tape: Option<PathBuf>,
    script: Option<PathBuf>,
) -> Result<()> {
    let paths = logging::init(dev, &logs_dir, video_tape)?;

    let address = connection.unwrap_or_else(|| {
        if dev {
            DEFAULT_SITL_CONNECTION.to_string()
        } else {
            DEFAULT_SERIAL_CONNECTION.to_string()
        }
    });

    log::info!("connecting to vehicle at {address}");
    let vehicle = MavlinkVehicle::connect(&address, TARGET_SYSTEM, TARGET_COMPONENT)?;

    let detector = match &script {
        Some(path) => SimDetector::new(parse_script(path)?, paths.video_tape.as_deref())?,
        None => SimDetector::empty(paths.video_tape.as_deref())?,
    };

    crate::controller::run(Box::new(vehicle), Box::new(detector), &Config::default())
}
